use axum::response::Html;

use crate::auth::current_user::CurrentUser;

#[tracing::instrument(skip_all, fields(user = %user.username))]
pub async fn everyone(user: CurrentUser) -> &'static str {
    tracing::debug!("Serving everyone page");
    "Hello Everyone"
}

#[tracing::instrument(skip_all, fields(user = %user.username))]
pub async fn admin(user: CurrentUser) -> Html<&'static str> {
    tracing::debug!("Serving administrator page");
    Html("<h1>Administrator Page</h1> Greetings Admin!")
}

#[tracing::instrument(skip_all, fields(user = %user.username))]
pub async fn managers(user: CurrentUser) -> Html<&'static str> {
    tracing::debug!("Serving managers page");
    Html("<h1>Managers Page</h1> Greetings Manager!")
}
