use crate::error::{AppResult, ErrorResponse};
use crate::handlers::blog::{summarize, BlogSummaryResponse};
use crate::middleware::AuthUser;
use crate::response::{ApiResponse, PaginatedResponse, PaginationQuery};
use crate::services::blog::BlogService;
use crate::services::reaction::{ReactionKind, ReactionService};
use axum::{extract::Path, extract::Query, response::IntoResponse, Extension};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct LikeToggleResponse {
    pub liked: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct FavoriteToggleResponse {
    pub favorited: bool,
}

async fn toggle(
    db: DatabaseConnection,
    kind: ReactionKind,
    user_id: i32,
    blog_id: i32,
) -> AppResult<bool> {
    BlogService::new(db.clone())
        .get_visible(blog_id, Some(user_id))
        .await?;
    ReactionService::new(db).toggle(kind, user_id, blog_id).await
}

#[utoipa::path(
    post,
    path = "/api/blogs/{id}/like",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Blog ID")),
    responses(
        (status = 200, description = "Like toggled", body = LikeToggleResponse),
        (status = 404, description = "Blog not found", body = ErrorResponse),
    ),
    tag = "reactions"
)]
pub async fn toggle_like(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(blog_id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let liked = toggle(db, ReactionKind::Like, auth_user.user_id, blog_id).await?;
    Ok(ApiResponse::ok(LikeToggleResponse { liked }))
}

#[utoipa::path(
    post,
    path = "/api/blogs/{id}/favorite",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Blog ID")),
    responses(
        (status = 200, description = "Favorite toggled", body = FavoriteToggleResponse),
        (status = 404, description = "Blog not found", body = ErrorResponse),
    ),
    tag = "reactions"
)]
pub async fn toggle_favorite(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(blog_id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let favorited = toggle(db, ReactionKind::Favorite, auth_user.user_id, blog_id).await?;
    Ok(ApiResponse::ok(FavoriteToggleResponse { favorited }))
}

#[utoipa::path(
    get,
    path = "/api/favorites",
    security(("jwt_token" = [])),
    params(
        ("page" = Option<u64>, Query, description = "Page number"),
        ("per_page" = Option<u64>, Query, description = "Items per page"),
    ),
    responses(
        (status = 200, description = "The caller's favorite blogs", body = PaginatedResponse<BlogSummaryResponse>),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
    ),
    tag = "reactions"
)]
pub async fn list_favorites(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Query(params): Query<PaginationQuery>,
) -> AppResult<impl IntoResponse> {
    let (page, per_page) = params.resolve();
    let (blogs, total) = ReactionService::new(db.clone())
        .list_favorites(auth_user.user_id, page, per_page)
        .await?;
    Ok(ApiResponse::ok(
        summarize(db, blogs, total, page, per_page).await?,
    ))
}
