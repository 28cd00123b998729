#![allow(dead_code)]

use reqwest::Client;
use sea_orm::{ConnectionTrait, DatabaseConnection, Statement};
use sea_orm_migration::MigratorTrait;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Once,
};

static INIT: Once = Once::new();
static MIGRATIONS_RAN: AtomicBool = AtomicBool::new(false);
static USER_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// Smallest PNG header the upload endpoint accepts.
pub const PNG_BYTES: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];

fn init_env() {
    INIT.call_once(|| {
        dotenv::dotenv().ok();
        std::env::set_var(
            "JWT_SECRET",
            "integration_test_secret_that_is_at_least_32_characters_long",
        );
        std::env::set_var("RATE_LIMIT_ENABLED", "false");
        std::env::set_var("REQUIRE_EMAIL_VERIFICATION", "false");
        let config = inkpost::config::jwt::JwtConfig::from_env().unwrap();
        let _ = inkpost::utils::jwt::init_jwt_config(config);
    });
}

pub struct TestApp {
    pub addr: String,
    pub db: DatabaseConnection,
    pub client: Client,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.addr, path)
    }
}

pub struct TestUser {
    pub id: i32,
    pub username: String,
    pub token: String,
}

pub async fn spawn_app() -> TestApp {
    init_env();

    let database_url = std::env::var("TEST_DATABASE_URL")
        .unwrap_or_else(|_| std::env::var("DATABASE_URL").expect("DATABASE_URL must be set"));

    let db = sea_orm::Database::connect(&database_url)
        .await
        .expect("Failed to connect to test database");

    if !MIGRATIONS_RAN.swap(true, Ordering::SeqCst) {
        inkpost::migration::Migrator::up(&db, None)
            .await
            .expect("Failed to run migrations");
    }

    cleanup_tables(&db).await;

    let upload_config = inkpost::config::upload::UploadConfig::with_dir("./test_uploads");
    let email_service =
        inkpost::services::email::EmailService::disabled("http://localhost:5173".to_string());

    let app = axum::Router::new()
        .route("/", axum::routing::get(|| async { "ok" }))
        .merge(inkpost::routes::create_routes())
        .layer(axum::extract::Extension(db.clone()))
        .layer(axum::extract::Extension(upload_config))
        .layer(axum::extract::Extension(email_service));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });

    TestApp {
        addr: format!("http://{}", addr),
        db,
        client: Client::new(),
    }
}

async fn cleanup_tables(db: &DatabaseConnection) {
    let tables = [
        "verification_tokens",
        "password_reset_tokens",
        "blog_tags",
        "tags",
        "likes",
        "favorites",
        "comments",
        "blog_images",
        "blogs",
        "follows",
        "profiles",
        "users",
    ];

    for table in tables {
        let sql = format!("TRUNCATE TABLE {} CASCADE", table);
        let _ = db
            .execute(Statement::from_string(
                sea_orm::DatabaseBackend::Postgres,
                sql,
            ))
            .await;
    }
}

/// Register a user with a unique name derived from `prefix`.
pub async fn create_test_user(app: &TestApp, prefix: &str) -> TestUser {
    let counter = USER_COUNTER.fetch_add(1, Ordering::SeqCst);
    let username = format!("{}_{}", prefix, counter);

    let resp = app
        .client
        .post(app.url("/auth/register"))
        .json(&json!({
            "username": username,
            "email": format!("{}@test.com", username),
            "password": "test_password_123"
        }))
        .send()
        .await
        .expect("Failed to register user");

    let status = resp.status();
    let body: Value = resp.json().await.unwrap_or_else(|e| {
        panic!(
            "Failed to parse register response for '{}': status={}, error={}",
            username, status, e
        )
    });

    if !body["success"].as_bool().unwrap_or(false) {
        panic!(
            "Failed to register '{}': status={}, body={}",
            username, status, body
        );
    }

    let id = body["data"]["user"]["id"]
        .as_i64()
        .unwrap_or_else(|| panic!("Response missing user id: {}", body)) as i32;
    let token = body["data"]["access_token"]
        .as_str()
        .unwrap_or_else(|| panic!("Response missing access token: {}", body))
        .to_string();

    TestUser {
        id,
        username,
        token,
    }
}

/// Upload a tiny PNG as `user` and return its URL.
pub async fn upload_png(app: &TestApp, user: &TestUser, kind: &str) -> String {
    let part = reqwest::multipart::Part::bytes(PNG_BYTES.to_vec())
        .file_name("tiny.png")
        .mime_str("image/png")
        .unwrap();
    let form = reqwest::multipart::Form::new()
        .part("file", part)
        .text("type", kind.to_string());

    let resp = app
        .client
        .post(app.url("/upload"))
        .bearer_auth(&user.token)
        .header("x-user-id", user.id.to_string())
        .header("x-user-username", &user.username)
        .multipart(form)
        .send()
        .await
        .expect("Failed to upload");

    let body: Value = resp.json().await.expect("Failed to parse upload response");
    body["data"]["url"]
        .as_str()
        .unwrap_or_else(|| panic!("Upload response missing url: {}", body))
        .to_string()
}

/// Create a blog and return its id.
pub async fn create_test_blog(app: &TestApp, user: &TestUser, visibility: &str) -> i32 {
    let resp = app
        .client
        .post(app.url("/blogs"))
        .bearer_auth(&user.token)
        .json(&json!({
            "title": format!("A {} post", visibility.to_lowercase()),
            "content": "# Hello\n\nSome *markdown* body text.",
            "visibility": visibility,
            "images": ["/uploads/blogs/one.png"],
            "tags": ["rust"]
        }))
        .send()
        .await
        .expect("Failed to create blog");

    let status = resp.status();
    let body: Value = resp.json().await.expect("Failed to parse blog response");
    if !body["success"].as_bool().unwrap_or(false) {
        panic!("Failed to create blog: status={}, body={}", status, body);
    }
    body["data"]["id"].as_i64().expect("Blog response missing id") as i32
}
