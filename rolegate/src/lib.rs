//! # rolegate: role-based access control for a handful of HTTP endpoints
//!
//! `rolegate` serves three pages and decides, per request, whether the caller may see them. Users
//! live in memory, loaded once from configuration; passwords are stored only as salted,
//! algorithm-prefixed hashes; every route is governed by an ordered table of path patterns and
//! role requirements.
//!
//! ## Request Flow
//!
//! Every request passes through the access-control middleware before routing:
//!
//! 1. HTTP Basic credentials are extracted from the `Authorization` header.
//! 2. The immutable [`auth::policy::AccessPolicy`] verifies the password and matches the path
//!    against the rule table. Password verification runs on tokio's blocking pool.
//! 3. Unauthenticated callers get `401` with a `WWW-Authenticate: Basic` challenge, callers
//!    without a required role get `403`, everyone else reaches the handler with a
//!    [`auth::current_user::CurrentUser`] in the request extensions.
//!
//! Unknown paths are gated too: an anonymous request for a missing page gets `401`, an
//! authenticated one `404`.
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use rolegate::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = rolegate::config::Args::parse();
//!     let config = Config::load(&args)?;
//!     rolegate::telemetry::init_telemetry(config.log_format)?;
//!
//!     let app = Application::new(config)?;
//!     app.serve(async {
//!         tokio::signal::ctrl_c().await.expect("Failed to listen for Ctrl+C");
//!     })
//!     .await
//! }
//! ```
//!
//! ## Configuration
//!
//! See the [`config`] module for configuration options.

pub mod api;
pub mod auth;
pub mod config;
pub mod errors;
pub mod telemetry;
pub mod types;

#[cfg(test)]
mod test;

use std::sync::Arc;

use axum::{Router, middleware::from_fn_with_state, routing::get};
use tokio::net::TcpListener;
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::{Level, debug, info};

use crate::auth::{middleware::access_control_middleware, policy::AccessPolicy};
pub use config::Config;

/// Shared state handed to the middleware and handlers. Both fields are immutable after startup.
#[derive(Clone)]
pub struct AppState {
    pub policy: Arc<AccessPolicy>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(policy: AccessPolicy, config: Config) -> Self {
        Self {
            policy: Arc::new(policy),
            config: Arc::new(config),
        }
    }
}

/// Build the application router with access control and tracing applied.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/everyone", get(api::handlers::everyone))
        .route("/admin", get(api::handlers::admin))
        .route("/managers", get(api::handlers::managers))
        // `layer` (not `route_layer`) so unmatched paths are gated as well
        .layer(from_fn_with_state(state.clone(), access_control_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}

pub struct Application {
    router: Router,
    config: Arc<Config>,
}

impl Application {
    /// Build the access policy from `config` and the router around it.
    ///
    /// Fails if the configured users, rules or hashing parameters are invalid. Plaintext seed
    /// passwords are hashed here, so this takes a moment with production Argon2 parameters.
    pub fn new(config: Config) -> anyhow::Result<Self> {
        debug!("Starting rolegate with configuration: {:#?}", config);
        config.validate()?;

        let policy = AccessPolicy::from_config(&config)?;
        info!(
            "Access policy ready: {} users, {} route rules",
            policy.credentials().len(),
            policy.rules().rules().len()
        );

        let state = AppState::new(policy, config);
        let config = state.config.clone();
        let router = build_router(state);

        Ok(Self { router, config })
    }

    #[cfg(test)]
    pub fn into_test_server(self) -> axum_test::TestServer {
        axum_test::TestServer::new(self.router.into_make_service()).expect("Failed to create test server")
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!("rolegate listening on http://{}", bind_addr);

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("Server stopped");
        Ok(())
    }
}
