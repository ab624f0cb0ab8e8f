use crate::types::RoleSet;
use axum::{
    http::{HeaderValue, StatusCode, header::WWW_AUTHENTICATE},
    response::{IntoResponse, Response},
};
use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum Error {
    /// Authentication required but missing or invalid. `challenge` is the value sent back in the
    /// `WWW-Authenticate` header, if any.
    #[error("Not authenticated")]
    Unauthenticated { challenge: Option<String> },

    /// Caller is authenticated but holds none of the roles the route requires
    #[error("Insufficient permissions to access {resource} (requires any of {})", display_roles(.required))]
    InsufficientPermissions { required: RoleSet, resource: String },

    /// Static configuration rejected at startup
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// Generic internal service error
    #[error("Failed to {operation}")]
    Internal { operation: String },
}

fn display_roles(roles: &RoleSet) -> String {
    roles.iter().map(|r| r.as_str()).collect::<Vec<_>>().join(", ")
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Error::InvalidConfig { message: message.into() }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Unauthenticated { .. } => StatusCode::UNAUTHORIZED,
            Error::InsufficientPermissions { .. } => StatusCode::FORBIDDEN,
            Error::InvalidConfig { .. } | Error::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns a user-safe error message, without leaking internal implementation details.
    ///
    /// Unknown users and wrong passwords produce the same message.
    pub fn user_message(&self) -> String {
        match self {
            Error::Unauthenticated { .. } => "Authentication required".to_string(),
            Error::InsufficientPermissions { .. } => "Access denied".to_string(),
            Error::InvalidConfig { .. } | Error::Internal { .. } => "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match &self {
            Error::InvalidConfig { .. } | Error::Internal { .. } => {
                tracing::error!("Internal service error: {:#}", self);
            }
            Error::Unauthenticated { .. } | Error::InsufficientPermissions { .. } => {
                tracing::info!("Authorization error: {}", self);
            }
        }

        let status = self.status_code();
        let mut response = (status, self.user_message()).into_response();

        if let Error::Unauthenticated { challenge: Some(challenge) } = &self {
            match HeaderValue::from_str(challenge) {
                Ok(value) => {
                    response.headers_mut().insert(WWW_AUTHENTICATE, value);
                }
                Err(e) => tracing::warn!("Dropping unrepresentable WWW-Authenticate challenge: {e}"),
            }
        }

        response
    }
}
