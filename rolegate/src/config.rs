//! Application configuration management.
//!
//! Configuration is loaded from a YAML file with environment variable overrides. The configuration
//! file path defaults to `config.yaml` but can be specified via `-f` flag or `ROLEGATE_CONFIG`
//! environment variable. A missing file is not an error: every field has a default, and the
//! defaults describe the stock deployment (three seed users, an admin area and a managers page).
//!
//! ## Loading Priority
//!
//! 1. **Built-in defaults**
//! 2. **YAML config file** (default: `config.yaml`)
//! 3. **Environment variables** prefixed with `ROLEGATE_`. Use double underscores for nested
//!    values, e.g. `ROLEGATE_PASSWORD__ENCODER=bcrypt`.
//!
//! ## Example
//!
//! ```yaml
//! host: 127.0.0.1
//! port: 8080
//! realm: rolegate
//! log_format: json
//! users:
//!   - username: paul
//!     password: password
//!     roles: [USER]
//!   - username: artemas
//!     password_hash: "{bcrypt}$2b$12$..."
//!     roles: [USER, ADMIN]
//! rules:
//!   - pattern: /admin/**
//!     roles: [ADMIN]
//!   - pattern: /managers
//!     roles: [MANAGER, ADMIN]
//! password:
//!   encoder: argon2
//!   argon2:
//!     memory_kib: 19456
//!     iterations: 2
//!     parallelism: 1
//! ```
//!
//! Rules are matched in the order written; see [`crate::auth::rules`].

use clap::Parser;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Yaml},
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::auth::{credentials::UserConfig, password::PasswordConfig, rules::RouteRuleConfig};
use crate::errors::Error;
use crate::types::Role;

/// Simple CLI args - just for specifying config file
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file
    #[arg(short = 'f', long, env = "ROLEGATE_CONFIG", default_value = "config.yaml")]
    pub config: String,

    /// Validate configuration and exit without starting the server.
    #[arg(long)]
    pub validate: bool,
}

/// Console log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Main application configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// HTTP server host to bind to (e.g., "0.0.0.0" for all interfaces)
    pub host: String,
    /// HTTP server port to bind to
    pub port: u16,
    /// Realm announced in `WWW-Authenticate` challenges
    pub realm: String,
    pub log_format: LogFormat,
    /// Seed users for the credential store. Replaces the default users entirely when set.
    pub users: Vec<UserConfig>,
    /// Ordered route rules. Replaces the default rules entirely when set.
    pub rules: Vec<RouteRuleConfig>,
    pub password: PasswordConfig,
}

impl Default for Config {
    fn default() -> Self {
        let user = |username: &str, password: &str, roles: &[&'static str]| UserConfig {
            username: username.to_string(),
            password: Some(password.to_string()),
            password_hash: None,
            roles: roles.iter().copied().map(Role::from_static).collect(),
        };

        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            realm: "rolegate".to_string(),
            log_format: LogFormat::Text,
            users: vec![
                user("paul", "password", &["USER"]),
                user("artemas", "StrongPassword!", &["USER", "ADMIN"]),
                user("james", "James1234", &["USER", "MANAGER"]),
            ],
            rules: vec![
                RouteRuleConfig {
                    pattern: "/admin/**".to_string(),
                    roles: vec![Role::from_static("ADMIN")],
                },
                RouteRuleConfig {
                    pattern: "/managers".to_string(),
                    roles: vec![Role::from_static("MANAGER"), Role::from_static("ADMIN")],
                },
            ],
            password: PasswordConfig::default(),
        }
    }
}

impl Config {
    pub fn load(args: &Args) -> Result<Self, figment::Error> {
        let config: Self = Self::figment(args).extract()?;
        config.validate().map_err(|e| figment::Error::from(e.to_string()))?;
        Ok(config)
    }

    pub fn figment(args: &Args) -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Yaml::file(&args.config))
            .merge(Env::prefixed("ROLEGATE_").ignore(&["config"]).split("__"))
    }

    /// Structural checks that do not require hashing anything. Password hashes and route patterns
    /// are checked again, in full, when the access policy is built.
    pub fn validate(&self) -> Result<(), Error> {
        if self.host.trim().is_empty() {
            return Err(Error::invalid_config("host must not be empty"));
        }

        if self.realm.is_empty() || self.realm.contains('"') || self.realm.chars().any(char::is_control) {
            return Err(Error::invalid_config(
                "realm must be non-empty and must not contain quotes or control characters",
            ));
        }

        if self.rules.is_empty() {
            return Err(Error::invalid_config("at least one route rule is required"));
        }
        for rule in &self.rules {
            crate::auth::rules::RoutePattern::parse(&rule.pattern)?;
        }

        let mut seen = HashSet::new();
        for user in &self.users {
            if !seen.insert(user.username.as_str()) {
                return Err(Error::invalid_config(format!("duplicate username '{}'", user.username)));
            }
            if user.roles.is_empty() {
                return Err(Error::invalid_config(format!("user '{}' has no roles", user.username)));
            }
            if user.password.is_some() == user.password_hash.is_some() {
                return Err(Error::invalid_config(format!(
                    "user '{}' must set exactly one of password and password_hash",
                    user.username
                )));
            }
        }

        // Rejects impossible hashing parameters before anything is hashed
        crate::auth::password::PasswordEncoder::new(&self.password)?;

        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Value of the `WWW-Authenticate` header sent with 401 responses
    pub fn challenge(&self) -> String {
        format!("Basic realm=\"{}\"", self.realm)
    }
}
