use crate::error::{AppResult, ErrorResponse};
use crate::handlers::blog::{summarize, BlogSummaryResponse};
use crate::models::TagModel;
use crate::response::{ApiResponse, PaginatedResponse, PaginationQuery};
use crate::services::blog::BlogService;
use crate::services::tag::TagService;
use axum::{extract::Path, extract::Query, response::IntoResponse, Extension};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct TagResponse {
    pub id: i32,
    pub name: String,
}

impl From<TagModel> for TagResponse {
    fn from(t: TagModel) -> Self {
        Self {
            id: t.id,
            name: t.name,
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/tags",
    responses(
        (status = 200, description = "All tags by name", body = Vec<TagResponse>),
    ),
    tag = "tags"
)]
pub async fn list_tags(
    Extension(db): Extension<DatabaseConnection>,
) -> AppResult<impl IntoResponse> {
    let tags = TagService::new(db).list_tags().await?;
    let items: Vec<TagResponse> = tags.into_iter().map(TagResponse::from).collect();
    Ok(ApiResponse::ok(items))
}

#[utoipa::path(
    get,
    path = "/api/tags/{name}/blogs",
    params(
        ("name" = String, Path, description = "Tag name"),
        ("page" = Option<u64>, Query, description = "Page number"),
        ("per_page" = Option<u64>, Query, description = "Items per page"),
    ),
    responses(
        (status = 200, description = "Public blogs with this tag", body = PaginatedResponse<BlogSummaryResponse>),
        (status = 404, description = "Tag not found", body = ErrorResponse),
    ),
    tag = "tags"
)]
pub async fn list_blogs_by_tag(
    Extension(db): Extension<DatabaseConnection>,
    Path(name): Path<String>,
    Query(params): Query<PaginationQuery>,
) -> AppResult<impl IntoResponse> {
    let (page, per_page) = params.resolve();
    let (blogs, total) = BlogService::new(db.clone())
        .list_by_tag(&name, page, per_page)
        .await?;
    Ok(ApiResponse::ok(
        summarize(db, blogs, total, page, per_page).await?,
    ))
}
