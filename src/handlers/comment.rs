use crate::error::{AppResult, ErrorResponse};
use crate::middleware::AuthUser;
use crate::models::{CommentModel, UserModel};
use crate::response::{ApiResponse, PaginatedResponse, PaginationQuery};
use crate::services::blog::BlogService;
use crate::services::comment::CommentService;
use axum::{extract::Path, extract::Query, response::IntoResponse, Extension, Json};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CommentRequest {
    /// 1-2000 characters
    pub content: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CommentResponse {
    pub id: i32,
    pub blog_id: i32,
    pub user_id: i32,
    pub username: Option<String>,
    pub content: String,
    pub created_at: String,
    pub updated_at: String,
}

impl CommentResponse {
    fn new(c: CommentModel, author: Option<UserModel>) -> Self {
        Self {
            id: c.id,
            blog_id: c.blog_id,
            user_id: c.user_id,
            username: author.map(|u| u.username),
            content: c.content,
            created_at: c.created_at.and_utc().to_rfc3339(),
            updated_at: c.updated_at.and_utc().to_rfc3339(),
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/blogs/{id}/comments",
    params(
        ("id" = i32, Path, description = "Blog ID"),
        ("page" = Option<u64>, Query, description = "Page number"),
        ("per_page" = Option<u64>, Query, description = "Items per page"),
    ),
    responses(
        (status = 200, description = "Comments, oldest first", body = PaginatedResponse<CommentResponse>),
        (status = 404, description = "Blog not found", body = ErrorResponse),
    ),
    tag = "comments"
)]
pub async fn list_comments(
    Extension(db): Extension<DatabaseConnection>,
    viewer: Option<AuthUser>,
    Path(blog_id): Path<i32>,
    Query(params): Query<PaginationQuery>,
) -> AppResult<impl IntoResponse> {
    BlogService::new(db.clone())
        .get_visible(blog_id, viewer.map(|v| v.user_id))
        .await?;

    let (page, per_page) = params.resolve();
    let (rows, total) = CommentService::new(db)
        .list_by_blog(blog_id, page, per_page)
        .await?;
    let items = rows
        .into_iter()
        .map(|(c, author)| CommentResponse::new(c, author))
        .collect();
    Ok(ApiResponse::ok(PaginatedResponse::new(
        items, total, page, per_page,
    )))
}

#[utoipa::path(
    post,
    path = "/api/blogs/{id}/comments",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Blog ID")),
    request_body = CommentRequest,
    responses(
        (status = 200, description = "Comment created", body = CommentResponse),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 404, description = "Blog not found", body = ErrorResponse),
    ),
    tag = "comments"
)]
pub async fn create_comment(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(blog_id): Path<i32>,
    Json(payload): Json<CommentRequest>,
) -> AppResult<impl IntoResponse> {
    BlogService::new(db.clone())
        .get_visible(blog_id, Some(auth_user.user_id))
        .await?;

    let comment = CommentService::new(db)
        .create(blog_id, auth_user.user_id, &payload.content)
        .await?;
    Ok(ApiResponse::ok(CommentResponse {
        username: Some(auth_user.username),
        ..CommentResponse::new(comment, None)
    }))
}

#[utoipa::path(
    put,
    path = "/api/comments/{id}",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Comment ID")),
    request_body = CommentRequest,
    responses(
        (status = 200, description = "Comment updated", body = CommentResponse),
        (status = 403, description = "Not the author", body = ErrorResponse),
        (status = 404, description = "Comment not found", body = ErrorResponse),
    ),
    tag = "comments"
)]
pub async fn update_comment(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
    Json(payload): Json<CommentRequest>,
) -> AppResult<impl IntoResponse> {
    let comment = CommentService::new(db)
        .update(id, auth_user.user_id, &payload.content)
        .await?;
    Ok(ApiResponse::ok(CommentResponse {
        username: Some(auth_user.username),
        ..CommentResponse::new(comment, None)
    }))
}

#[utoipa::path(
    delete,
    path = "/api/comments/{id}",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Comment ID")),
    responses(
        (status = 200, description = "Comment deleted", body = serde_json::Value),
        (status = 403, description = "Not the author", body = ErrorResponse),
        (status = 404, description = "Comment not found", body = ErrorResponse),
    ),
    tag = "comments"
)]
pub async fn delete_comment(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    CommentService::new(db).delete(id, auth_user.user_id).await?;
    Ok(ApiResponse::ok(serde_json::json!({ "deleted": id })))
}
