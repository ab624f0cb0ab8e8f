use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tracing::{debug, instrument, trace};

use crate::{
    AppState,
    auth::{
        basic::extract_basic_credentials,
        policy::{AccessRequest, AuthOutcome},
    },
    errors::Error,
};

/// Run the access policy for `request`. On success the verified caller is attached to the request
/// extensions and the request is handed back for further processing.
#[instrument(skip_all, fields(path = %request.uri().path()))]
pub(crate) async fn enforce_access(state: AppState, mut request: Request) -> Result<Request, Error> {
    let access_request = AccessRequest {
        path: request.uri().path().to_string(),
        credentials: extract_basic_credentials(request.headers()),
    };
    trace!("Evaluating {:?}", access_request);

    // Password verification is CPU-heavy, keep it off the async workers
    let policy = state.policy.clone();
    let decision = tokio::task::spawn_blocking(move || policy.decide(&access_request))
        .await
        .map_err(|e| Error::Internal {
            operation: format!("spawn access decision task: {e}"),
        })?;

    match decision.outcome {
        AuthOutcome::Allow => {
            if let Some(user) = decision.principal {
                debug!("Allowed {} for user {}", request.uri().path(), user.username);
                request.extensions_mut().insert(user);
            }
            Ok(request)
        }
        AuthOutcome::DenyUnauthenticated => Err(Error::Unauthenticated {
            challenge: Some(state.config.challenge()),
        }),
        AuthOutcome::DenyForbidden => Err(Error::InsufficientPermissions {
            required: decision.matched_rule.map(|rule| rule.required_roles).unwrap_or_default(),
            resource: request.uri().path().to_string(),
        }),
    }
}

/// Middleware that authenticates every request with HTTP Basic credentials and checks the caller's
/// roles against the route rule table before any handler runs.
pub async fn access_control_middleware(State(state): State<AppState>, request: Request, next: Next) -> Result<Response, Error> {
    let request = enforce_access(state, request).await?;
    Ok(next.run(request).await)
}
