use crate::error::{AppResult, ErrorResponse};
use crate::handlers::user::UserResponse;
use crate::middleware::AuthUser;
use crate::response::{ApiResponse, PaginatedResponse, PaginationQuery};
use crate::services::follow::{FollowDirection, FollowService};
use axum::{extract::Path, extract::Query, response::IntoResponse, Extension};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct FollowToggleResponse {
    pub following: bool,
}

#[utoipa::path(
    post,
    path = "/api/users/{id}/follow",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "User to follow or unfollow")),
    responses(
        (status = 200, description = "Follow toggled", body = FollowToggleResponse),
        (status = 400, description = "Cannot follow yourself", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
    ),
    tag = "follows"
)]
pub async fn toggle_follow(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(user_id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let following = FollowService::new(db)
        .toggle(auth_user.user_id, user_id)
        .await?;
    Ok(ApiResponse::ok(FollowToggleResponse { following }))
}

async fn list(
    db: DatabaseConnection,
    user_id: i32,
    direction: FollowDirection,
    params: PaginationQuery,
) -> AppResult<PaginatedResponse<UserResponse>> {
    let (page, per_page) = params.resolve();
    let (users, total) = FollowService::new(db)
        .list(user_id, direction, page, per_page)
        .await?;
    let items = users
        .into_iter()
        .map(|u| UserResponse::public(u, None))
        .collect();
    Ok(PaginatedResponse::new(items, total, page, per_page))
}

#[utoipa::path(
    get,
    path = "/api/users/{id}/followers",
    params(
        ("id" = i32, Path, description = "User ID"),
        ("page" = Option<u64>, Query, description = "Page number"),
        ("per_page" = Option<u64>, Query, description = "Items per page"),
    ),
    responses(
        (status = 200, description = "Users following this user", body = PaginatedResponse<UserResponse>),
    ),
    tag = "follows"
)]
pub async fn list_followers(
    Extension(db): Extension<DatabaseConnection>,
    Path(user_id): Path<i32>,
    Query(params): Query<PaginationQuery>,
) -> AppResult<impl IntoResponse> {
    Ok(ApiResponse::ok(
        list(db, user_id, FollowDirection::Followers, params).await?,
    ))
}

#[utoipa::path(
    get,
    path = "/api/users/{id}/following",
    params(
        ("id" = i32, Path, description = "User ID"),
        ("page" = Option<u64>, Query, description = "Page number"),
        ("per_page" = Option<u64>, Query, description = "Items per page"),
    ),
    responses(
        (status = 200, description = "Users this user follows", body = PaginatedResponse<UserResponse>),
    ),
    tag = "follows"
)]
pub async fn list_following(
    Extension(db): Extension<DatabaseConnection>,
    Path(user_id): Path<i32>,
    Query(params): Query<PaginationQuery>,
) -> AppResult<impl IntoResponse> {
    Ok(ApiResponse::ok(
        list(db, user_id, FollowDirection::Following, params).await?,
    ))
}
