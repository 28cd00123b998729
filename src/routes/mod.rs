use crate::config::rate_limit::{RateLimitConfig, RateLimitRule, RouteGroup};
use crate::config::upload::UploadConfig;
use crate::handlers;
use crate::middleware::auth::{auth_middleware, optional_auth_middleware};
use axum::{extract::DefaultBodyLimit, middleware, routing, Router};
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};

/// Room for multipart boundaries and the `type` field on top of the file.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

pub fn create_routes() -> Router {
    Router::new().nest("/api", api_routes())
}

fn api_routes() -> Router {
    let rate_limit_config = RateLimitConfig::from_env();
    let upload_config = UploadConfig::from_env();

    let auth = auth_routes(&rate_limit_config);
    let public_read = public_read_routes(&rate_limit_config)
        .layer(middleware::from_fn(optional_auth_middleware));
    let protected =
        protected_routes(&rate_limit_config).layer(middleware::from_fn(auth_middleware));
    let upload = upload_routes(&rate_limit_config, &upload_config)
        .layer(middleware::from_fn(auth_middleware));

    auth.merge(public_read).merge(protected).merge(upload)
}

fn auth_routes(config: &RateLimitConfig) -> Router {
    let router = Router::new()
        .route("/auth/register", routing::post(handlers::register))
        .route("/auth/login", routing::post(handlers::login))
        .route("/auth/refresh", routing::post(handlers::refresh_token))
        .route("/auth/verify-email", routing::post(handlers::verify_email))
        .route(
            "/auth/forgot-password",
            routing::post(handlers::forgot_password),
        )
        .route(
            "/auth/reset-password",
            routing::post(handlers::reset_password),
        );

    with_optional_rate_limit(router, config, RouteGroup::Auth)
}

/// Reads. The caller is attached when a valid token is sent, which
/// widens blog visibility.
fn public_read_routes(config: &RateLimitConfig) -> Router {
    let router = Router::new()
        // Users
        .route(
            "/users/{id}",
            routing::get(handlers::user::get_user_profile),
        )
        .route(
            "/users/{id}/followers",
            routing::get(handlers::follow::list_followers),
        )
        .route(
            "/users/{id}/following",
            routing::get(handlers::follow::list_following),
        )
        .route(
            "/users/{id}/blogs",
            routing::get(handlers::blog::list_user_blogs),
        )
        // Blogs
        .route("/blogs", routing::get(handlers::blog::list_blogs))
        .route("/blogs/{id}", routing::get(handlers::blog::get_blog))
        .route(
            "/blogs/{id}/comments",
            routing::get(handlers::comment::list_comments),
        )
        // Tags
        .route("/tags", routing::get(handlers::tag::list_tags))
        .route(
            "/tags/{name}/blogs",
            routing::get(handlers::tag::list_blogs_by_tag),
        );

    with_optional_rate_limit(router, config, RouteGroup::PublicRead)
}

fn protected_routes(config: &RateLimitConfig) -> Router {
    let router = Router::new()
        // Auth
        .route("/auth/me", routing::get(handlers::get_current_user))
        .route(
            "/auth/resend-verification",
            routing::post(handlers::resend_verification),
        )
        // Users
        .route(
            "/users/{id}",
            routing::patch(handlers::user::update_profile),
        )
        .route(
            "/users/{id}/follow",
            routing::post(handlers::follow::toggle_follow),
        )
        // Blogs
        .route("/blogs", routing::post(handlers::blog::create_blog))
        .route(
            "/blogs/{id}",
            routing::put(handlers::blog::update_blog).delete(handlers::blog::delete_blog),
        )
        .route(
            "/blogs/{id}/like",
            routing::post(handlers::reaction::toggle_like),
        )
        .route(
            "/blogs/{id}/favorite",
            routing::post(handlers::reaction::toggle_favorite),
        )
        .route(
            "/favorites",
            routing::get(handlers::reaction::list_favorites),
        )
        // Comments
        .route(
            "/blogs/{id}/comments",
            routing::post(handlers::comment::create_comment),
        )
        .route(
            "/comments/{id}",
            routing::put(handlers::comment::update_comment)
                .delete(handlers::comment::delete_comment),
        );

    with_optional_rate_limit(router, config, RouteGroup::Protected)
}

fn upload_routes(config: &RateLimitConfig, upload: &UploadConfig) -> Router {
    let router = Router::new()
        .route("/upload", routing::post(handlers::upload::upload_image))
        .layer(DefaultBodyLimit::max(
            upload.max_bytes + MULTIPART_OVERHEAD_BYTES,
        ));

    with_optional_rate_limit(router, config, RouteGroup::Upload)
}

fn with_optional_rate_limit(router: Router, config: &RateLimitConfig, group: RouteGroup) -> Router {
    if !config.enabled {
        return router;
    }

    let RateLimitRule {
        per_second,
        burst_size,
    } = config.rule(group);

    match GovernorConfigBuilder::default()
        .per_second(per_second)
        .burst_size(burst_size)
        .finish()
    {
        Some(governor_conf) => router.layer(GovernorLayer::new(governor_conf)),
        None => {
            tracing::warn!(?group, "Invalid rate limit rule, limiter disabled for group");
            router
        }
    }
}
