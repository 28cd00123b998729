use axum::{extract::Extension, response::IntoResponse, routing::get, Json, Router};
use inkpost::{
    config, migration, routes,
    services::{cache::CacheService, email::EmailService},
    utils,
};
use sea_orm::{ConnectionTrait, DatabaseConnection, Statement};
use sea_orm_migration::MigratorTrait;
use serde_json::json;
use std::env;
use std::net::SocketAddr;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        health_check,
        // Auth
        inkpost::handlers::auth::register,
        inkpost::handlers::auth::login,
        inkpost::handlers::auth::refresh_token,
        inkpost::handlers::auth::get_current_user,
        inkpost::handlers::auth::verify_email,
        inkpost::handlers::auth::resend_verification,
        inkpost::handlers::auth::forgot_password,
        inkpost::handlers::auth::reset_password,
        // Users
        inkpost::handlers::user::get_user_profile,
        inkpost::handlers::user::update_profile,
        // Follows
        inkpost::handlers::follow::toggle_follow,
        inkpost::handlers::follow::list_followers,
        inkpost::handlers::follow::list_following,
        // Blogs
        inkpost::handlers::blog::list_blogs,
        inkpost::handlers::blog::list_user_blogs,
        inkpost::handlers::blog::get_blog,
        inkpost::handlers::blog::create_blog,
        inkpost::handlers::blog::update_blog,
        inkpost::handlers::blog::delete_blog,
        // Reactions
        inkpost::handlers::reaction::toggle_like,
        inkpost::handlers::reaction::toggle_favorite,
        inkpost::handlers::reaction::list_favorites,
        // Comments
        inkpost::handlers::comment::list_comments,
        inkpost::handlers::comment::create_comment,
        inkpost::handlers::comment::update_comment,
        inkpost::handlers::comment::delete_comment,
        // Tags
        inkpost::handlers::tag::list_tags,
        inkpost::handlers::tag::list_blogs_by_tag,
        // Uploads
        inkpost::handlers::upload::upload_image,
    ),
    components(
        schemas(
            inkpost::response::PaginationQuery,
            inkpost::error::ErrorResponse,
            inkpost::models::Visibility,
            inkpost::handlers::auth::RegisterRequest,
            inkpost::handlers::auth::LoginRequest,
            inkpost::handlers::auth::AuthResponse,
            inkpost::handlers::auth::RefreshTokenRequest,
            inkpost::handlers::auth::TokenResponse,
            inkpost::handlers::auth::VerifyEmailRequest,
            inkpost::handlers::auth::ForgotPasswordRequest,
            inkpost::handlers::auth::ResetPasswordRequest,
            inkpost::handlers::user::UserResponse,
            inkpost::handlers::user::ProfileResponse,
            inkpost::handlers::user::PublicUserResponse,
            inkpost::services::profile::UpdateProfileRequest,
            inkpost::services::profile::ProfilePatch,
            inkpost::handlers::follow::FollowToggleResponse,
            inkpost::handlers::blog::BlogRequest,
            inkpost::handlers::blog::BlogResponse,
            inkpost::handlers::blog::BlogSummaryResponse,
            inkpost::handlers::reaction::LikeToggleResponse,
            inkpost::handlers::reaction::FavoriteToggleResponse,
            inkpost::handlers::comment::CommentRequest,
            inkpost::handlers::comment::CommentResponse,
            inkpost::handlers::tag::TagResponse,
            inkpost::handlers::upload::UploadResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "Registration, login and account tokens"),
        (name = "users", description = "Profiles"),
        (name = "follows", description = "Follow graph"),
        (name = "blogs", description = "Blog posts"),
        (name = "reactions", description = "Likes and favorites"),
        (name = "comments", description = "Comments on blogs"),
        (name = "tags", description = "Tags"),
        (name = "uploads", description = "Image uploads"),
    )
)]
struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "jwt_token",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "inkpost=debug,tower_http=debug,axum=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let (jwt_config, upload_config) = validate_config()?;
    utils::jwt::init_jwt_config(jwt_config)?;

    tracing::info!("Starting Inkpost v{}...", env!("CARGO_PKG_VERSION"));

    let db = config::database::get_database().await?;
    tracing::info!("Database connected successfully");

    migration::Migrator::up(&db, None).await?;
    tracing::info!("Database migrations applied successfully");

    let cache = match config::redis::get_redis().await {
        Ok(conn) => {
            tracing::info!("Redis connected successfully");
            Some(CacheService::new(conn))
        }
        Err(e) => {
            tracing::warn!("Redis unavailable, running without cache: {}", e);
            None
        }
    };

    let email_service = EmailService::from_env();
    if email_service.is_configured() {
        tracing::info!("SMTP email service configured");
    } else {
        tracing::warn!("SMTP not configured, emails will be skipped");
    }

    let mut app = create_app(&upload_config.upload_dir)
        .layer(Extension(db))
        .layer(Extension(upload_config))
        .layer(Extension(email_service));

    if let Some(cache) = cache {
        app = app.layer(Extension(cache));
    }

    let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port = env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let addr = format!("{}:{}", host, port);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui/", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Server shut down gracefully");
    Ok(())
}

/// Fail fast on missing or invalid settings.
fn validate_config() -> anyhow::Result<(config::jwt::JwtConfig, config::upload::UploadConfig)> {
    let jwt_config = config::jwt::JwtConfig::from_env()?;

    if env::var("DATABASE_URL").is_err() {
        return Err(anyhow::anyhow!(
            "DATABASE_URL environment variable must be set"
        ));
    }

    let upload_config = config::upload::UploadConfig::from_env();
    std::fs::create_dir_all(&upload_config.upload_dir).map_err(|e| {
        anyhow::anyhow!(
            "Failed to create upload directory '{}': {}",
            upload_config.upload_dir,
            e
        )
    })?;

    Ok((jwt_config, upload_config))
}

fn build_cors_layer() -> CorsLayer {
    use axum::http::{header, HeaderName, HeaderValue, Method};

    let origins_str = env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string());

    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            HeaderName::from_static(inkpost::handlers::upload::USER_ID_HEADER),
            HeaderName::from_static(inkpost::handlers::upload::USERNAME_HEADER),
        ]);

    if origins_str == "*" {
        cors.allow_origin(tower_http::cors::Any)
    } else {
        let origins: Vec<HeaderValue> = origins_str
            .split(',')
            .filter_map(|s| s.trim().parse().ok())
            .collect();
        cors.allow_origin(origins)
    }
}

fn create_app(upload_dir: &str) -> Router {
    Router::new()
        .route("/", get(health_check))
        .merge(routes::create_routes())
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .nest_service("/uploads", ServeDir::new(upload_dir))
        .layer(TraceLayer::new_for_http())
        .layer(build_cors_layer())
}

#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Service and database status", body = serde_json::Value)
    )
)]
async fn health_check(Extension(db): Extension<DatabaseConnection>) -> impl IntoResponse {
    let db_ok = db
        .query_one(Statement::from_string(
            sea_orm::DatabaseBackend::Postgres,
            "SELECT 1".to_string(),
        ))
        .await
        .is_ok();

    let status = if db_ok { "ok" } else { "degraded" };

    Json(json!({
        "status": status,
        "service": "Inkpost",
        "version": env!("CARGO_PKG_VERSION"),
        "database": db_ok,
    }))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
        return;
    }
    tracing::info!("Shutdown signal received, gracefully shutting down...");
}
