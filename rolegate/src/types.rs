//! Common value types for the access-control model.
//!
//! A [`Role`] is a named permission group assigned to a user (`USER`, `ADMIN`, `MANAGER`, ...).
//! Role names are normalized to upper case when parsed, so `admin` in a config file and `ADMIN`
//! in a route rule refer to the same role.

use serde::{Deserialize, Serialize};
use std::{collections::BTreeSet, fmt};

use crate::errors::Error;

/// Prefix some frameworks prepend to role names internally. Names carrying it are rejected.
const LEGACY_ROLE_PREFIX: &str = "ROLE_";

/// A set of roles. Ordered so that logs and error messages are stable.
pub type RoleSet = BTreeSet<Role>;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Role(String);

impl Role {
    pub fn new(name: &str) -> Result<Self, Error> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::invalid_config("role name must not be empty"));
        }

        let normalized = name.to_ascii_uppercase();
        if normalized.starts_with(LEGACY_ROLE_PREFIX) {
            return Err(Error::invalid_config(format!(
                "role '{name}' must not start with '{LEGACY_ROLE_PREFIX}'"
            )));
        }
        if !normalized.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(Error::invalid_config(format!(
                "role '{name}' may only contain letters, digits and underscores"
            )));
        }

        Ok(Self(normalized))
    }

    /// Build a role from a name known to be valid at compile time.
    pub(crate) fn from_static(name: &'static str) -> Self {
        debug_assert!(Self::new(name).is_ok_and(|r| r.0 == name), "invalid static role {name}");
        Self(name.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Role {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        role.0
    }
}

/// Collect role names into a [`RoleSet`], failing on the first invalid name.
pub fn parse_roles<'a>(names: impl IntoIterator<Item = &'a str>) -> Result<RoleSet, Error> {
    names.into_iter().map(Role::new).collect()
}
