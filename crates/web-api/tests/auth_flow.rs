mod support;

use axum::http::{Method, StatusCode};
use serde_json::json;

use support::spawn_app;

#[tokio::test]
async fn health_check_is_ok() {
    let app = spawn_app();
    let (status, _) = app.send(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn register_confirm_and_login() {
    let app = spawn_app();

    let (status, body) = app
        .send(
            Method::POST,
            "/register",
            Some(json!({
                "username": "alice",
                "email": "alice@example.com",
                "password": "secret-password",
            })),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["confirmation_sent"], true);
    let user_id = body["user_id"].as_i64().unwrap();

    let token = app.mailer.token_for("alice@example.com").unwrap();
    let (status, body) = app
        .send(Method::GET, &format!("/confirm-email/{token}"), None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "You have confirmed your account. Thanks!");

    // 重复确认不是错误
    let (status, body) = app
        .send(Method::GET, &format!("/confirm-email/{token}"), None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Account already confirmed.");

    let (status, body) = app
        .send(
            Method::POST,
            "/login",
            Some(json!({ "email": "alice@example.com", "password": "secret-password" })),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user_id"], user_id);
    assert_eq!(body["username"], "alice");
    assert_eq!(body["role"], "user");
    assert!(body["access_token"].as_str().is_some());

    let (_, profile) = app.send(Method::GET, "/profile/alice", None, None).await;
    assert_eq!(profile["is_confirmed"], true);
}

#[tokio::test]
async fn duplicate_registration_is_rejected() {
    let app = spawn_app();
    app.register("bob").await;

    let (status, body) = app
        .send(
            Method::POST,
            "/register",
            Some(json!({
                "username": "bobby",
                "email": "bob@example.com",
                "password": "pw",
            })),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "DUPLICATE_EMAIL");

    let (status, body) = app
        .send(
            Method::POST,
            "/register",
            Some(json!({
                "username": "bob",
                "email": "other@example.com",
                "password": "pw",
            })),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "DUPLICATE_USERNAME");
}

#[tokio::test]
async fn login_failures_are_distinguished() {
    let app = spawn_app();
    app.register("carol").await;

    let (status, body) = app
        .send(
            Method::POST,
            "/login",
            Some(json!({ "email": "carol@example.com", "password": "wrong" })),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "INVALID_CREDENTIALS");

    let (status, body) = app
        .send(
            Method::POST,
            "/login",
            Some(json!({ "email": "nobody@example.com", "password": "pw" })),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "USER_NOT_FOUND");

    let (status, body) = app
        .send(
            Method::POST,
            "/login",
            Some(json!({ "email": "ghost", "password": "pw" })),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "USER_NOT_FOUND");
}

#[tokio::test]
async fn invalid_confirmation_token_is_a_bad_request() {
    let app = spawn_app();
    let (status, body) = app
        .send(Method::GET, "/confirm-email/not-a-token", None, None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_TOKEN");
}

#[tokio::test]
async fn resend_confirmation_rules() {
    let app = spawn_app();
    app.register("dave").await;
    assert_eq!(app.mailer.sent_count(), 1);

    let (status, _) = app
        .send(
            Method::POST,
            "/resend-confirmation",
            Some(json!({ "email": "dave@example.com" })),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.mailer.sent_count(), 2);

    let (status, _) = app
        .send(
            Method::POST,
            "/resend-confirmation",
            Some(json!({ "email": "ghost@example.com" })),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = app
        .send(
            Method::POST,
            "/resend-confirmation",
            Some(json!({ "email": "ghost" })),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "USER_NOT_FOUND");

    let token = app.mailer.token_for("dave@example.com").unwrap();
    app.send(Method::GET, &format!("/confirm-email/{token}"), None, None)
        .await;
    let (status, body) = app
        .send(
            Method::POST,
            "/resend-confirmation",
            Some(json!({ "email": "dave@example.com" })),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "ALREADY_CONFIRMED");
}

#[tokio::test]
async fn protected_routes_require_a_session_token() {
    let app = spawn_app();

    let (status, body) = app.send(Method::GET, "/notifications", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");

    let (status, body) = app
        .send(Method::GET, "/notifications", None, Some("garbage"))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "INVALID_TOKEN");

    // 确认令牌不能当作会话令牌
    app.register("erin").await;
    let confirmation = app.mailer.token_for("erin@example.com").unwrap();
    let (status, _) = app
        .send(Method::GET, "/notifications", None, Some(&confirmation))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn malformed_bodies_are_validation_errors() {
    let app = spawn_app();

    let (status, body) = app
        .send(
            Method::POST,
            "/register",
            Some(json!({ "username": "frank" })),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let (status, body) = app
        .send(
            Method::POST,
            "/register",
            Some(json!({ "username": "frank", "email": "no-at-sign", "password": "pw" })),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}
