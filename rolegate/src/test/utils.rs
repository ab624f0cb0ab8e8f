//! Test helpers. Everything here uses cheap hashing parameters so the suite stays fast; the
//! users and rules are the stock defaults.

use axum_test::TestServer;

use crate::{
    AppState, Application,
    auth::{
        credentials::CredentialStore,
        password::{Argon2Params, PasswordConfig, PasswordEncoder, Scheme},
        policy::AccessPolicy,
    },
    config::Config,
};

pub fn fast_password_config() -> PasswordConfig {
    PasswordConfig {
        encoder: Scheme::Argon2,
        argon2: Argon2Params {
            memory_kib: 64,
            iterations: 1,
            parallelism: 1,
        },
        bcrypt_cost: 4,
    }
}

pub fn fast_encoder() -> PasswordEncoder {
    PasswordEncoder::new(&fast_password_config()).expect("test password config is valid")
}

pub fn create_test_config() -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        password: fast_password_config(),
        ..Config::default()
    }
}

pub fn create_test_credential_store() -> CredentialStore {
    CredentialStore::from_config(&create_test_config().users, fast_encoder()).expect("Failed to create credential store")
}

pub fn create_test_policy() -> AccessPolicy {
    AccessPolicy::from_config(&create_test_config()).expect("Failed to create access policy")
}

pub fn create_test_app_state() -> AppState {
    let config = create_test_config();
    AppState::new(create_test_policy(), config)
}

pub fn create_test_server(config: Config) -> TestServer {
    Application::new(config)
        .expect("Failed to create application")
        .into_test_server()
}
