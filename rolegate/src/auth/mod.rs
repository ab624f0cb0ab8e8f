//! Authentication and authorization.
//!
//! Every request goes through the same linear decision:
//!
//! 1. Extract HTTP Basic credentials from the `Authorization` header ([`basic`]).
//! 2. Verify them against the in-memory [`credentials::CredentialStore`]. Missing credentials,
//!    unknown users and wrong passwords all end here with a `401` and a Basic challenge.
//! 3. Find the governing rule in the ordered [`rules::RouteRuleTable`]; paths no rule matches
//!    only require authentication.
//! 4. Allow the request if the caller holds any of the rule's roles, otherwise `403`.
//!
//! Steps 1 to 4 live in [`policy::AccessPolicy::decide`], which knows nothing about HTTP beyond a
//! path and a pair of credentials. [`middleware`] wires it into axum and [`current_user`] gives
//! handlers access to the verified caller.
//!
//! # Modules
//!
//! - [`basic`]: HTTP Basic header parsing
//! - [`credentials`]: Seed users and password verification
//! - [`current_user`]: Extractor for the authenticated user in handlers
//! - [`middleware`]: Route protection middleware
//! - [`password`]: Prefixed password hashes (Argon2id, bcrypt)
//! - [`policy`]: The access decision
//! - [`rules`]: Path pattern to required roles

pub mod basic;
pub mod credentials;
pub mod current_user;
pub mod middleware;
pub mod password;
pub mod policy;
pub mod rules;
