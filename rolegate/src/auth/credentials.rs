//! In-memory credential store.
//!
//! Users are loaded once at startup and never change afterwards. Plaintext passwords from the
//! config file are hashed during loading; only hashes are kept.

use std::{cmp::Ordering, collections::HashMap};

use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;
use tracing::{debug, error, info, instrument, warn};

use crate::{
    auth::password::{PasswordEncoder, Scheme},
    errors::Error,
    types::{Role, RoleSet},
};

/// Hashed at startup; only used so that lookups of unknown users cost as much as lookups of known
/// ones. The dummy uses the scheme most stored users are on, so users on a minority scheme still
/// answer in a different time than unknown usernames do.
const TIMING_DUMMY_PASSWORD: &str = "rolegate-unknown-user";

/// A seed user as written in the config file. Exactly one of `password` and `password_hash`
/// must be set.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UserConfig {
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Pre-computed hash including its `{id}` prefix
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_hash: Option<String>,
    pub roles: Vec<Role>,
}

impl std::fmt::Debug for UserConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserConfig")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("password_hash", &self.password_hash)
            .field("roles", &self.roles)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub username: String,
    pub password_hash: String,
    pub roles: RoleSet,
}

impl User {
    pub fn new(username: impl Into<String>, password_hash: impl Into<String>, roles: RoleSet) -> Result<Self, Error> {
        let username = username.into();
        if username.trim().is_empty() {
            return Err(Error::invalid_config("username must not be empty"));
        }
        if username.contains(':') {
            return Err(Error::invalid_config(format!("username '{username}' must not contain ':'")));
        }
        if roles.is_empty() {
            return Err(Error::invalid_config(format!("user '{username}' has no roles")));
        }

        Ok(Self {
            username,
            password_hash: password_hash.into(),
            roles,
        })
    }
}

/// Why a credential check failed. Both variants must look the same to the caller.
#[derive(ThisError, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailure {
    #[error("unknown user")]
    UnknownUser,
    #[error("bad credential")]
    BadCredential,
}

#[derive(Debug, Clone)]
pub struct CredentialStore {
    users: HashMap<String, User>,
    encoder: PasswordEncoder,
    dummy_hash: String,
}

impl CredentialStore {
    pub fn new(users: Vec<User>, encoder: PasswordEncoder) -> Result<Self, Error> {
        let mut by_name = HashMap::with_capacity(users.len());
        let mut bcrypt_users = 0;
        for user in users {
            let scheme = encoder
                .validate(&user.password_hash)
                .map_err(|e| Error::invalid_config(format!("user '{}': {e}", user.username)))?;
            if scheme == Scheme::Bcrypt {
                bcrypt_users += 1;
            }

            if by_name.contains_key(&user.username) {
                return Err(Error::invalid_config(format!("duplicate username '{}'", user.username)));
            }
            by_name.insert(user.username.clone(), user);
        }

        if by_name.is_empty() {
            warn!("Credential store is empty, every request will be rejected");
        }

        let dummy_scheme = match bcrypt_users.cmp(&(by_name.len() - bcrypt_users)) {
            Ordering::Greater => Scheme::Bcrypt,
            Ordering::Less => Scheme::Argon2,
            Ordering::Equal => encoder.scheme(),
        };
        let dummy_hash = encoder.encode_as(dummy_scheme, TIMING_DUMMY_PASSWORD)?;

        Ok(Self {
            users: by_name,
            encoder,
            dummy_hash,
        })
    }

    /// Build the store from seed users, hashing any plaintext passwords with `encoder`.
    pub fn from_config(seeds: &[UserConfig], encoder: PasswordEncoder) -> Result<Self, Error> {
        let mut users = Vec::with_capacity(seeds.len());
        for seed in seeds {
            let password_hash = match (&seed.password, &seed.password_hash) {
                (Some(password), None) => encoder.encode(password)?,
                (None, Some(hash)) => hash.clone(),
                (Some(_), Some(_)) => {
                    return Err(Error::invalid_config(format!(
                        "user '{}' sets both password and password_hash",
                        seed.username
                    )));
                }
                (None, None) => {
                    return Err(Error::invalid_config(format!(
                        "user '{}' needs a password or a password_hash",
                        seed.username
                    )));
                }
            };

            let user = User::new(seed.username.clone(), password_hash, seed.roles.iter().cloned().collect())?;
            debug!("{}'s password: {}", user.username, user.password_hash);
            users.push(user);
        }

        let store = Self::new(users, encoder)?;
        info!("Loaded {} users into the credential store", store.len());
        Ok(store)
    }

    /// Look up `username` and check `password` against its stored hash.
    #[instrument(skip(self, password))]
    pub fn verify(&self, username: &str, password: &str) -> Result<&User, AuthFailure> {
        let Some(user) = self.users.get(username) else {
            // Spend the same effort as a real check before answering
            let _ = self.encoder.matches(password, &self.dummy_hash);
            return Err(AuthFailure::UnknownUser);
        };

        match self.encoder.matches(password, &user.password_hash) {
            Ok(true) => Ok(user),
            Ok(false) => Err(AuthFailure::BadCredential),
            Err(e) => {
                error!("Stored hash for user {} could not be checked: {}", username, e);
                Err(AuthFailure::BadCredential)
            }
        }
    }

    pub fn get(&self, username: &str) -> Option<&User> {
        self.users.get(username)
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}
