use crate::error::{AppResult, ErrorResponse};
use crate::middleware::AuthUser;
use crate::models::{BlogModel, Visibility};
use crate::response::{ApiResponse, PaginatedResponse, PaginationQuery};
use crate::services::blog::{BlogDetail, BlogInput, BlogService};
use crate::services::tag::TagService;
use crate::utils::render_markdown;
use axum::{extract::Path, extract::Query, response::IntoResponse, Extension, Json};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct BlogRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(max = 200))]
    pub subtitle: Option<String>,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
    /// Markdown
    #[validate(length(min = 1))]
    pub content: String,
    /// Derived from the content when omitted
    #[validate(length(max = 500))]
    pub excerpt: Option<String>,
    /// Defaults to the first image
    pub featured_image: Option<String>,
    #[serde(default)]
    pub visibility: Visibility,
    /// 1 to 5 image URLs, as returned by the upload endpoint
    pub images: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl From<BlogRequest> for BlogInput {
    fn from(r: BlogRequest) -> Self {
        Self {
            title: r.title.trim().to_string(),
            subtitle: r.subtitle,
            description: r.description,
            content: r.content,
            excerpt: r.excerpt,
            featured_image: r.featured_image,
            visibility: r.visibility,
            images: r.images,
            tags: r.tags,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BlogSummaryResponse {
    pub id: i32,
    pub author_id: i32,
    pub title: String,
    pub subtitle: Option<String>,
    pub excerpt: String,
    pub featured_image: Option<String>,
    pub reading_time: i32,
    pub visibility: Visibility,
    pub tags: Vec<String>,
    pub created_at: String,
}

impl BlogSummaryResponse {
    pub fn with_tags(b: BlogModel, tags: Vec<String>) -> Self {
        Self {
            id: b.id,
            author_id: b.author_id,
            title: b.title,
            subtitle: b.subtitle,
            excerpt: b.excerpt,
            featured_image: b.featured_image,
            reading_time: b.reading_time,
            visibility: b.visibility,
            tags,
            created_at: b.created_at.and_utc().to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BlogResponse {
    pub id: i32,
    pub author_id: i32,
    pub title: String,
    pub subtitle: Option<String>,
    pub description: Option<String>,
    /// Markdown source
    pub content: String,
    /// Sanitized HTML
    pub content_html: String,
    pub excerpt: String,
    pub featured_image: Option<String>,
    pub reading_time: i32,
    pub visibility: Visibility,
    pub images: Vec<String>,
    pub tags: Vec<String>,
    pub like_count: u64,
    pub favorite_count: u64,
    pub comment_count: u64,
    pub created_at: String,
    pub updated_at: String,
}

impl From<BlogDetail> for BlogResponse {
    fn from(d: BlogDetail) -> Self {
        let b = d.blog;
        Self {
            id: b.id,
            author_id: b.author_id,
            title: b.title,
            subtitle: b.subtitle,
            description: b.description,
            content_html: render_markdown(&b.content),
            content: b.content,
            excerpt: b.excerpt,
            featured_image: b.featured_image,
            reading_time: b.reading_time,
            visibility: b.visibility,
            images: d.images.into_iter().map(|i| i.url).collect(),
            tags: d.tags.into_iter().map(|t| t.name).collect(),
            like_count: d.like_count,
            favorite_count: d.favorite_count,
            comment_count: d.comment_count,
            created_at: b.created_at.and_utc().to_rfc3339(),
            updated_at: b.updated_at.and_utc().to_rfc3339(),
        }
    }
}

/// Attach tag names to a page of blogs.
pub(crate) async fn summarize(
    db: DatabaseConnection,
    blogs: Vec<BlogModel>,
    total: u64,
    page: u64,
    per_page: u64,
) -> AppResult<PaginatedResponse<BlogSummaryResponse>> {
    let ids: Vec<i32> = blogs.iter().map(|b| b.id).collect();
    let mut tags = TagService::new(db).get_tags_for_blogs(&ids).await?;
    let items = blogs
        .into_iter()
        .map(|b| {
            let blog_tags = tags.remove(&b.id).unwrap_or_default();
            BlogSummaryResponse::with_tags(b, blog_tags)
        })
        .collect();
    Ok(PaginatedResponse::new(items, total, page, per_page))
}

#[utoipa::path(
    get,
    path = "/api/blogs",
    params(
        ("page" = Option<u64>, Query, description = "Page number"),
        ("per_page" = Option<u64>, Query, description = "Items per page"),
    ),
    responses(
        (status = 200, description = "Newest public blogs", body = PaginatedResponse<BlogSummaryResponse>),
    ),
    tag = "blogs"
)]
pub async fn list_blogs(
    Extension(db): Extension<DatabaseConnection>,
    Query(params): Query<PaginationQuery>,
) -> AppResult<impl IntoResponse> {
    let (page, per_page) = params.resolve();
    let (blogs, total) = BlogService::new(db.clone())
        .list_feed(page, per_page)
        .await?;
    Ok(ApiResponse::ok(
        summarize(db, blogs, total, page, per_page).await?,
    ))
}

#[utoipa::path(
    get,
    path = "/api/users/{id}/blogs",
    params(
        ("id" = i32, Path, description = "Author user ID"),
        ("page" = Option<u64>, Query, description = "Page number"),
        ("per_page" = Option<u64>, Query, description = "Items per page"),
    ),
    responses(
        (status = 200, description = "Blogs by the author that the caller may read", body = PaginatedResponse<BlogSummaryResponse>),
    ),
    tag = "blogs"
)]
pub async fn list_user_blogs(
    Extension(db): Extension<DatabaseConnection>,
    viewer: Option<AuthUser>,
    Path(author_id): Path<i32>,
    Query(params): Query<PaginationQuery>,
) -> AppResult<impl IntoResponse> {
    let (page, per_page) = params.resolve();
    let (blogs, total) = BlogService::new(db.clone())
        .list_by_author(author_id, viewer.map(|v| v.user_id), page, per_page)
        .await?;
    Ok(ApiResponse::ok(
        summarize(db, blogs, total, page, per_page).await?,
    ))
}

#[utoipa::path(
    get,
    path = "/api/blogs/{id}",
    params(("id" = i32, Path, description = "Blog ID")),
    responses(
        (status = 200, description = "Blog", body = BlogResponse),
        (status = 404, description = "Missing or not visible to the caller", body = ErrorResponse),
    ),
    tag = "blogs"
)]
pub async fn get_blog(
    Extension(db): Extension<DatabaseConnection>,
    viewer: Option<AuthUser>,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let detail = BlogService::new(db)
        .get_detail(id, viewer.map(|v| v.user_id))
        .await?;
    Ok(ApiResponse::ok(BlogResponse::from(detail)))
}

#[utoipa::path(
    post,
    path = "/api/blogs",
    security(("jwt_token" = [])),
    request_body = BlogRequest,
    responses(
        (status = 200, description = "Blog created", body = BlogResponse),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
    ),
    tag = "blogs"
)]
pub async fn create_blog(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Json(payload): Json<BlogRequest>,
) -> AppResult<impl IntoResponse> {
    payload.validate()?;
    let detail = BlogService::new(db)
        .create(auth_user.user_id, payload.into())
        .await?;
    Ok(ApiResponse::ok(BlogResponse::from(detail)))
}

#[utoipa::path(
    put,
    path = "/api/blogs/{id}",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Blog ID")),
    request_body = BlogRequest,
    responses(
        (status = 200, description = "Blog updated", body = BlogResponse),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 403, description = "Not the author", body = ErrorResponse),
        (status = 404, description = "Blog not found", body = ErrorResponse),
    ),
    tag = "blogs"
)]
pub async fn update_blog(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
    Json(payload): Json<BlogRequest>,
) -> AppResult<impl IntoResponse> {
    payload.validate()?;
    let detail = BlogService::new(db)
        .update(id, auth_user.user_id, payload.into())
        .await?;
    Ok(ApiResponse::ok(BlogResponse::from(detail)))
}

#[utoipa::path(
    delete,
    path = "/api/blogs/{id}",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Blog ID")),
    responses(
        (status = 200, description = "Blog deleted", body = serde_json::Value),
        (status = 403, description = "Not the author", body = ErrorResponse),
        (status = 404, description = "Blog not found", body = ErrorResponse),
    ),
    tag = "blogs"
)]
pub async fn delete_blog(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    BlogService::new(db).delete(id, auth_user.user_id).await?;
    Ok(ApiResponse::ok(serde_json::json!({ "deleted": id })))
}
