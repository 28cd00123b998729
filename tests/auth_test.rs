mod common;

use sea_orm::{ConnectionTrait, Statement};
use serde_json::{json, Value};

#[tokio::test]
async fn register_returns_tokens_and_user() {
    let app = common::spawn_app().await;

    let resp = app
        .client
        .post(app.url("/auth/register"))
        .json(&json!({
            "username": "newcomer",
            "email": "newcomer@test.com",
            "password": "test_password_123"
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert!(body["success"].as_bool().unwrap());
    assert!(body["data"]["access_token"].as_str().is_some());
    assert!(body["data"]["refresh_token"].as_str().is_some());
    assert_eq!(body["data"]["user"]["username"], "newcomer");
    assert_eq!(body["data"]["user"]["email"], "newcomer@test.com");
    assert!(body["data"]["user"]["profile"].is_null());
}

#[tokio::test]
async fn register_rejects_invalid_fields() {
    let app = common::spawn_app().await;

    let resp = app
        .client
        .post(app.url("/auth/register"))
        .json(&json!({
            "username": "ab",
            "email": "not-an-email",
            "password": "short"
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert!(body["fields"]["username"].is_array());
    assert!(body["fields"]["email"].is_array());
    assert!(body["fields"]["password"].is_array());
}

#[tokio::test]
async fn duplicate_registration_conflicts() {
    let app = common::spawn_app().await;
    let user = common::create_test_user(&app, "dup").await;

    let resp = app
        .client
        .post(app.url("/auth/register"))
        .json(&json!({
            "username": user.username,
            "email": "someone_else@test.com",
            "password": "test_password_123"
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 409);
}

#[tokio::test]
async fn login_by_username_or_email() {
    let app = common::spawn_app().await;
    let user = common::create_test_user(&app, "login").await;

    for login in [user.username.clone(), format!("{}@test.com", user.username)] {
        let resp = app
            .client
            .post(app.url("/auth/login"))
            .json(&json!({ "login": login, "password": "test_password_123" }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["data"]["user"]["id"].as_i64().unwrap() as i32, user.id);
    }
}

#[tokio::test]
async fn login_with_wrong_password_fails() {
    let app = common::spawn_app().await;
    let user = common::create_test_user(&app, "wrongpw").await;

    let resp = app
        .client
        .post(app.url("/auth/login"))
        .json(&json!({ "login": user.username, "password": "nope_nope_nope" }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 401);
}

#[tokio::test]
async fn me_requires_a_token() {
    let app = common::spawn_app().await;

    let resp = app.client.get(app.url("/auth/me")).send().await.unwrap();
    assert_eq!(resp.status(), 401);

    let user = common::create_test_user(&app, "me").await;
    let resp = app
        .client
        .get(app.url("/auth/me"))
        .bearer_auth(&user.token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["username"], user.username);
}

#[tokio::test]
async fn refresh_issues_a_new_pair() {
    let app = common::spawn_app().await;

    let resp = app
        .client
        .post(app.url("/auth/register"))
        .json(&json!({
            "username": "refresher",
            "email": "refresher@test.com",
            "password": "test_password_123"
        }))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    let refresh = body["data"]["refresh_token"].as_str().unwrap().to_string();
    let access = body["data"]["access_token"].as_str().unwrap().to_string();

    let resp = app
        .client
        .post(app.url("/auth/refresh"))
        .json(&json!({ "refresh_token": refresh }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert!(body["data"]["access_token"].as_str().is_some());

    // An access token cannot be used as a refresh token.
    let resp = app
        .client
        .post(app.url("/auth/refresh"))
        .json(&json!({ "refresh_token": access }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
}

#[tokio::test]
async fn forgot_password_is_silent_for_unknown_email() {
    let app = common::spawn_app().await;

    let resp = app
        .client
        .post(app.url("/auth/forgot-password"))
        .json(&json!({ "email": "ghost@test.com" }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn password_reset_flow() {
    let app = common::spawn_app().await;
    let user = common::create_test_user(&app, "reset").await;

    let resp = app
        .client
        .post(app.url("/auth/forgot-password"))
        .json(&json!({ "email": format!("{}@test.com", user.username) }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let row = app
        .db
        .query_one(Statement::from_sql_and_values(
            sea_orm::DatabaseBackend::Postgres,
            "SELECT token FROM password_reset_tokens WHERE user_id = $1",
            vec![user.id.into()],
        ))
        .await
        .unwrap()
        .expect("reset token stored");
    let token: String = row.try_get("", "token").unwrap();

    let resp = app
        .client
        .post(app.url("/auth/reset-password"))
        .json(&json!({ "token": token, "new_password": "brand_new_password" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = app
        .client
        .post(app.url("/auth/login"))
        .json(&json!({ "login": user.username, "password": "brand_new_password" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    // Tokens are single use.
    let resp = app
        .client
        .post(app.url("/auth/reset-password"))
        .json(&json!({ "token": token, "new_password": "another_password" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn verify_email_rejects_unknown_token() {
    let app = common::spawn_app().await;

    let resp = app
        .client
        .post(app.url("/auth/verify-email"))
        .json(&json!({ "token": "not-a-real-token" }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 400);
}
