use crate::error::{AppError, AppResult, ErrorResponse};
use crate::middleware::AuthUser;
use crate::models::{ProfileModel, UserModel};
use crate::response::ApiResponse;
use crate::services::cache::CacheService;
use crate::services::profile::{ProfileService, UpdateProfileRequest};
use crate::services::user::{PublicProfile, UserService, UserWithProfile};
use axum::{extract::Path, response::IntoResponse, Extension, Json};
use chrono::NaiveDateTime;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

fn rfc3339(ts: NaiveDateTime) -> String {
    ts.and_utc().to_rfc3339()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ProfileResponse {
    pub bio: Option<String>,
    pub website: Option<String>,
    /// RFC 3339 timestamp
    pub birthdate: Option<String>,
    pub profile_picture: Option<String>,
}

impl From<ProfileModel> for ProfileResponse {
    fn from(p: ProfileModel) -> Self {
        Self {
            bio: p.bio,
            website: p.website,
            birthdate: p.birthdate.map(rfc3339),
            profile_picture: p.profile_picture,
        }
    }
}

/// The user entity as the API and the profile editor see it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: i32,
    pub username: String,
    /// Only present when the caller is the user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub verified: bool,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub location: Option<String>,
    pub about: Option<String>,
    pub created_at: String,
    pub profile: Option<ProfileResponse>,
}

impl UserResponse {
    pub fn new(user: UserModel, profile: Option<ProfileModel>) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: Some(user.email),
            verified: user.verified,
            first_name: user.first_name,
            last_name: user.last_name,
            location: user.location,
            about: user.about,
            created_at: rfc3339(user.created_at),
            profile: profile.map(ProfileResponse::from),
        }
    }

    /// Same view without private fields.
    pub fn public(user: UserModel, profile: Option<ProfileModel>) -> Self {
        Self {
            email: None,
            ..Self::new(user, profile)
        }
    }
}

impl From<UserWithProfile> for UserResponse {
    fn from(u: UserWithProfile) -> Self {
        Self::new(u.user, u.profile)
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PublicUserResponse {
    #[serde(flatten)]
    pub user: UserResponse,
    pub followers_count: u64,
    pub following_count: u64,
    pub blog_count: u64,
}

impl From<PublicProfile> for PublicUserResponse {
    fn from(p: PublicProfile) -> Self {
        Self {
            user: UserResponse::public(p.user, p.profile),
            followers_count: p.followers_count,
            following_count: p.following_count,
            blog_count: p.blog_count,
        }
    }
}

fn make_user_service(db: DatabaseConnection, cache: Option<CacheService>) -> UserService {
    let service = UserService::new(db);
    match cache {
        Some(c) => service.with_cache(c),
        None => service,
    }
}

#[utoipa::path(
    get,
    path = "/api/users/{id}",
    params(("id" = String, Path, description = "Username")),
    responses(
        (status = 200, description = "Public profile", body = PublicUserResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
    ),
    tag = "users"
)]
pub async fn get_user_profile(
    Extension(db): Extension<DatabaseConnection>,
    cache: Option<Extension<CacheService>>,
    Path(username): Path<String>,
) -> AppResult<impl IntoResponse> {
    let service = make_user_service(db, cache.map(|c| c.0));
    let profile = service.get_public_profile(&username).await?;
    Ok(ApiResponse::ok(PublicUserResponse::from(profile)))
}

/// Partial update of the caller's own user and nested profile.
#[utoipa::path(
    patch,
    path = "/api/users/{id}",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "User ID")),
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Updated user with profile", body = UserResponse),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Not the caller's account", body = ErrorResponse),
        (status = 409, description = "Username taken", body = ErrorResponse),
    ),
    tag = "users"
)]
pub async fn update_profile(
    Extension(db): Extension<DatabaseConnection>,
    cache: Option<Extension<CacheService>>,
    auth_user: AuthUser,
    Path(user_id): Path<i32>,
    Json(payload): Json<UpdateProfileRequest>,
) -> AppResult<impl IntoResponse> {
    if auth_user.user_id != user_id {
        return Err(AppError::Forbidden);
    }

    let updated = ProfileService::new(db.clone())
        .update_profile(user_id, payload)
        .await?;

    make_user_service(db, cache.map(|c| c.0))
        .invalidate_profile(&[auth_user.username.as_str(), updated.user.username.as_str()])
        .await;

    Ok(ApiResponse::ok(UserResponse::from(updated)))
}
