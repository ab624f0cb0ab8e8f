//! Password hashing and verification.
//!
//! Stored hashes carry an algorithm identifier in braces ahead of the encoded hash, e.g.
//! `{argon2}$argon2id$v=19$m=19456,t=2,p=1$...` or `{bcrypt}$2b$12$...`. New hashes are produced
//! with the configured default scheme; verification dispatches on the prefix, so hashes made by
//! either scheme can live in the same credential store.

use std::str::FromStr;

use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use base64::Engine;
use bcrypt::HashParts;
use serde::{Deserialize, Serialize};

use crate::errors::Error;

/// Hashing algorithm families understood by [`PasswordEncoder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    #[default]
    Argon2,
    Bcrypt,
}

impl Scheme {
    pub fn id(self) -> &'static str {
        match self {
            Scheme::Argon2 => "argon2",
            Scheme::Bcrypt => "bcrypt",
        }
    }

    fn from_id(id: &str) -> Option<Self> {
        match id {
            "argon2" => Some(Scheme::Argon2),
            "bcrypt" => Some(Scheme::Bcrypt),
            _ => None,
        }
    }
}

/// Argon2 hashing parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Argon2Params {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Argon2Params {
    /// Create Argon2 instance with these parameters.
    fn to_argon2(self) -> Result<Argon2<'static>, Error> {
        let params = Params::new(self.memory_kib, self.iterations, self.parallelism, None).map_err(|e| Error::Internal {
            operation: format!("create argon2 params: {e}"),
        })?;

        Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }
}

impl Default for Argon2Params {
    /// Argon2id RFC recommendations
    fn default() -> Self {
        Self {
            memory_kib: 19456, // 19 MB
            iterations: 2,
            parallelism: 1,
        }
    }
}

/// Password hashing settings, as loaded from the `password` config section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PasswordConfig {
    /// Scheme used for hashes produced at startup
    pub encoder: Scheme,
    pub argon2: Argon2Params,
    pub bcrypt_cost: u32,
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self {
            encoder: Scheme::Argon2,
            argon2: Argon2Params::default(),
            bcrypt_cost: bcrypt::DEFAULT_COST,
        }
    }
}

/// Delegating password encoder.
#[derive(Debug, Clone)]
pub struct PasswordEncoder {
    scheme: Scheme,
    argon2: Argon2Params,
    bcrypt_cost: u32,
}

impl PasswordEncoder {
    pub fn new(config: &PasswordConfig) -> Result<Self, Error> {
        config.argon2.to_argon2()?;
        if !(4..=31).contains(&config.bcrypt_cost) {
            return Err(Error::invalid_config(format!(
                "bcrypt_cost must be between 4 and 31, got {}",
                config.bcrypt_cost
            )));
        }

        Ok(Self {
            scheme: config.encoder,
            argon2: config.argon2,
            bcrypt_cost: config.bcrypt_cost,
        })
    }

    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    /// Hash `raw` with the default scheme and a fresh random salt.
    pub fn encode(&self, raw: &str) -> Result<String, Error> {
        self.encode_as(self.scheme, raw)
    }

    /// Hash `raw` with `scheme`, using this encoder's cost settings.
    pub fn encode_as(&self, scheme: Scheme, raw: &str) -> Result<String, Error> {
        let encoded = match scheme {
            Scheme::Argon2 => {
                let salt = SaltString::generate(&mut OsRng);
                self.argon2
                    .to_argon2()?
                    .hash_password(raw.as_bytes(), &salt)
                    .map_err(|e| Error::Internal {
                        operation: format!("hash password: {e}"),
                    })?
                    .to_string()
            }
            Scheme::Bcrypt => bcrypt::hash(raw, self.bcrypt_cost).map_err(|e| Error::Internal {
                operation: format!("hash password: {e}"),
            })?,
        };

        Ok(format!("{{{}}}{encoded}", scheme.id()))
    }

    /// Check `raw` against a stored, prefixed hash.
    ///
    /// A wrong password is `Ok(false)`. A hash that cannot be interpreted is an error.
    pub fn matches(&self, raw: &str, stored: &str) -> Result<bool, Error> {
        let (scheme, encoded) = split_prefix(stored)?;
        match scheme {
            Scheme::Argon2 => {
                let parsed_hash = PasswordHash::new(encoded).map_err(|e| Error::Internal {
                    operation: format!("parse hash: {e}"),
                })?;
                // Verification always uses params from the hash
                Ok(Argon2::default().verify_password(raw.as_bytes(), &parsed_hash).is_ok())
            }
            Scheme::Bcrypt => bcrypt::verify(raw, encoded).map_err(|e| Error::Internal {
                operation: format!("verify bcrypt hash: {e}"),
            }),
        }
    }

    /// Check that `stored` is a hash this encoder can later verify, without doing any hashing.
    pub fn validate(&self, stored: &str) -> Result<Scheme, Error> {
        let (scheme, encoded) = split_prefix(stored)?;
        match scheme {
            Scheme::Argon2 => validate_argon2(encoded)?,
            Scheme::Bcrypt => validate_bcrypt(encoded)?,
        }
        Ok(scheme)
    }
}

/// The PHC string must name an Argon2 variant and carry usable parameters.
fn validate_argon2(encoded: &str) -> Result<(), Error> {
    let hash = PasswordHash::new(encoded).map_err(|e| Error::invalid_config(format!("malformed argon2 hash: {e}")))?;
    Algorithm::try_from(hash.algorithm)
        .map_err(|_| Error::invalid_config(format!("'{}' is not an argon2 algorithm", hash.algorithm)))?;
    Params::try_from(&hash).map_err(|e| Error::invalid_config(format!("invalid argon2 parameters: {e}")))?;
    Ok(())
}

/// Version, cost and the bcrypt-base64 salt and digest must all be readable.
fn validate_bcrypt(encoded: &str) -> Result<(), Error> {
    let parts = HashParts::from_str(encoded).map_err(|e| Error::invalid_config(format!("malformed bcrypt hash: {e}")))?;
    if !(4..=31).contains(&parts.get_cost()) {
        return Err(Error::invalid_config(format!("bcrypt cost {} is out of range", parts.get_cost())));
    }

    // Salt and digest share the last segment: 22 characters, then 31
    let salt = parts.get_salt();
    let digest = encoded
        .split('$')
        .filter(|s| !s.is_empty())
        .next_back()
        .and_then(|body| body.get(salt.len()..))
        .unwrap_or_default();
    for segment in [salt.as_str(), digest] {
        bcrypt::BASE_64
            .decode(segment)
            .map_err(|e| Error::invalid_config(format!("malformed bcrypt hash: {e}")))?;
    }
    Ok(())
}

/// Split `{id}encoded` into its scheme and encoded hash.
fn split_prefix(stored: &str) -> Result<(Scheme, &str), Error> {
    let rest = stored
        .strip_prefix('{')
        .ok_or_else(|| Error::invalid_config("password hash has no {id} prefix"))?;
    let (id, encoded) = rest
        .split_once('}')
        .ok_or_else(|| Error::invalid_config("password hash has no {id} prefix"))?;
    let scheme = Scheme::from_id(id).ok_or_else(|| Error::invalid_config(format!("unknown password hash scheme '{id}'")))?;
    Ok((scheme, encoded))
}
