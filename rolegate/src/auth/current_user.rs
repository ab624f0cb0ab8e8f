use axum::{extract::FromRequestParts, http::request::Parts};
use tracing::trace;

use crate::{
    auth::credentials::User,
    errors::{Error, Result},
    types::RoleSet,
};

/// The verified caller of a request.
///
/// Inserted into the request extensions by the access-control middleware once a request has been
/// allowed, and extracted by handlers that want to know who is calling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub username: String,
    pub roles: RoleSet,
}

impl From<&User> for CurrentUser {
    fn from(user: &User) -> Self {
        Self {
            username: user.username.clone(),
            roles: user.roles.clone(),
        }
    }
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self> {
        match parts.extensions.get::<CurrentUser>() {
            Some(user) => Ok(user.clone()),
            None => {
                // Only reachable for routes mounted outside the access-control layer
                trace!("No authenticated user in request extensions");
                Err(Error::Unauthenticated { challenge: None })
            }
        }
    }
}
