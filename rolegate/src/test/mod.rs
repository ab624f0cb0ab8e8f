pub mod utils;

use axum::http::{
    StatusCode,
    header::{AUTHORIZATION, CONTENT_TYPE, WWW_AUTHENTICATE},
};
use axum_test::TestServer;

use crate::{
    auth::{basic::basic_auth_header, rules::RouteRuleConfig},
    types::Role,
};
use utils::{create_test_config, create_test_server, fast_encoder};

const PAUL: (&str, &str) = ("paul", "password");
const ARTEMAS: (&str, &str) = ("artemas", "StrongPassword!");
const JAMES: (&str, &str) = ("james", "James1234");

async fn get_as(server: &TestServer, path: &str, (username, password): (&str, &str)) -> axum_test::TestResponse {
    server
        .get(path)
        .add_header(AUTHORIZATION, basic_auth_header(username, password))
        .await
}

#[test_log::test(tokio::test)]
async fn test_anonymous_requests_are_challenged() {
    let server = create_test_server(create_test_config());

    for path in ["/everyone", "/admin", "/managers"] {
        let response = server.get(path).await;
        response.assert_status(StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get(WWW_AUTHENTICATE).unwrap(),
            "Basic realm=\"rolegate\"",
            "path {path}"
        );
    }
}

#[tokio::test]
async fn test_everyone_page() {
    let server = create_test_server(create_test_config());

    for user in [PAUL, ARTEMAS, JAMES] {
        let response = get_as(&server, "/everyone", user).await;
        response.assert_status(StatusCode::OK);
        response.assert_text("Hello Everyone");
    }
}

#[tokio::test]
async fn test_admin_page() {
    let server = create_test_server(create_test_config());

    let response = get_as(&server, "/admin", ARTEMAS).await;
    response.assert_status(StatusCode::OK);
    response.assert_text("<h1>Administrator Page</h1> Greetings Admin!");
    assert!(
        response
            .headers()
            .get(CONTENT_TYPE)
            .unwrap()
            .to_str()
            .unwrap()
            .starts_with("text/html")
    );

    get_as(&server, "/admin", PAUL).await.assert_status(StatusCode::FORBIDDEN);
    get_as(&server, "/admin", JAMES).await.assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_managers_page() {
    let server = create_test_server(create_test_config());

    for user in [JAMES, ARTEMAS] {
        let response = get_as(&server, "/managers", user).await;
        response.assert_status(StatusCode::OK);
        response.assert_text("<h1>Managers Page</h1> Greetings Manager!");
    }

    get_as(&server, "/managers", PAUL).await.assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_bad_credentials_are_indistinguishable() {
    let server = create_test_server(create_test_config());

    let unknown = get_as(&server, "/everyone", ("mallory", "password")).await;
    let wrong_password = get_as(&server, "/everyone", ("paul", "Password")).await;

    unknown.assert_status(StatusCode::UNAUTHORIZED);
    wrong_password.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(unknown.text(), wrong_password.text());
    assert!(unknown.headers().contains_key(WWW_AUTHENTICATE));
    assert!(wrong_password.headers().contains_key(WWW_AUTHENTICATE));
}

#[tokio::test]
async fn test_malformed_authorization_is_treated_as_anonymous() {
    let server = create_test_server(create_test_config());

    let response = server
        .get("/everyone")
        .add_header(AUTHORIZATION, "Basic not-base64!")
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);

    let response = server.get("/everyone").add_header(AUTHORIZATION, "Bearer token").await;
    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_unknown_paths_are_gated() {
    let server = create_test_server(create_test_config());

    server.get("/nope").await.assert_status(StatusCode::UNAUTHORIZED);
    get_as(&server, "/nope", PAUL).await.assert_status(StatusCode::NOT_FOUND);

    // The admin subtree is checked before routing, even for pages that do not exist
    get_as(&server, "/admin/reports", PAUL).await.assert_status(StatusCode::FORBIDDEN);
    get_as(&server, "/admin/reports", ARTEMAS).await.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_custom_rules_and_users() {
    let mut config = create_test_config();
    config.realm = "staff".to_string();
    config.users.push(crate::auth::credentials::UserConfig {
        username: "olga".to_string(),
        password: None,
        password_hash: Some(fast_encoder().encode("olga-pass").unwrap()),
        roles: vec![Role::from_static("AUDITOR")],
    });
    config.rules.insert(
        0,
        RouteRuleConfig {
            pattern: "/everyone".to_string(),
            roles: vec![Role::from_static("AUDITOR")],
        },
    );
    let server = create_test_server(config);

    get_as(&server, "/everyone", ("olga", "olga-pass"))
        .await
        .assert_status(StatusCode::OK);
    get_as(&server, "/everyone", PAUL).await.assert_status(StatusCode::FORBIDDEN);

    let response = server.get("/everyone").await;
    assert_eq!(response.headers().get(WWW_AUTHENTICATE).unwrap(), "Basic realm=\"staff\"");
}

#[test]
fn test_application_rejects_invalid_config() {
    let mut config = create_test_config();
    config.rules.clear();
    assert!(crate::Application::new(config).is_err());

    let mut config = create_test_config();
    config.users[0].password = None;
    config.users[0].password_hash = Some("{plain}password".to_string());
    assert!(crate::Application::new(config).is_err());

    // A realm that cannot be sent back in a challenge header
    let mut config = create_test_config();
    config.realm = "staff \"only\"".to_string();
    assert!(crate::Application::new(config).is_err());
}
