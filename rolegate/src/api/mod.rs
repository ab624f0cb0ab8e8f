//! HTTP surface: the three role-gated pages.
//!
//! | Route            | Required roles    |
//! |------------------|-------------------|
//! | `GET /everyone`  | any authenticated |
//! | `GET /admin`     | `ADMIN`           |
//! | `GET /managers`  | `MANAGER`, `ADMIN`|
//!
//! The role requirements live in the route rule table, not here; handlers only run once the
//! access-control middleware has allowed the request.

pub mod handlers;
