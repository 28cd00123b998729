use crate::config::upload::UploadConfig;
use crate::error::{AppError, AppResult, ErrorResponse};
use crate::middleware::AuthUser;
use crate::response::ApiResponse;
use crate::services::upload::{UploadKind, UploadService};
use axum::{extract::Multipart, http::HeaderMap, response::IntoResponse, Extension};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USERNAME_HEADER: &str = "x-user-username";

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UploadResponse {
    pub url: String,
}

/// Multipart body accepted by the upload endpoint.
#[allow(dead_code)]
#[derive(ToSchema)]
pub struct UploadForm {
    #[schema(format = Binary, value_type = String)]
    pub file: Vec<u8>,
    /// `profile` or `blog`
    #[schema(rename = "type")]
    pub kind: String,
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> AppResult<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::Validation(format!("Missing {name} header")))
}

/// The identity headers must name the same user as the bearer token.
fn check_identity(headers: &HeaderMap, auth_user: &AuthUser) -> AppResult<()> {
    let user_id = header(headers, USER_ID_HEADER)?;
    let username = header(headers, USERNAME_HEADER)?;

    if user_id.parse::<i32>().ok() != Some(auth_user.user_id) || username != auth_user.username {
        tracing::warn!(
            user_id = auth_user.user_id,
            claimed_id = user_id,
            "upload identity headers do not match token"
        );
        return Err(AppError::Forbidden);
    }
    Ok(())
}

#[utoipa::path(
    post,
    path = "/api/upload",
    security(("jwt_token" = [])),
    params(
        ("x-user-id" = i32, Header, description = "Acting user ID"),
        ("x-user-username" = String, Header, description = "Acting username"),
    ),
    request_body(content = UploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Stored image URL", body = UploadResponse),
        (status = 400, description = "Missing file or unsupported type", body = ErrorResponse),
        (status = 403, description = "Identity headers do not match the token", body = ErrorResponse),
        (status = 413, description = "File too large", body = ErrorResponse),
    ),
    tag = "uploads"
)]
pub async fn upload_image(
    Extension(config): Extension<UploadConfig>,
    auth_user: AuthUser,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    check_identity(&headers, &auth_user)?;

    let mut file: Option<(String, Vec<u8>)> = None;
    let mut kind = UploadKind::Profile;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Failed to read upload: {e}")))?
    {
        match field.name() {
            Some("file") => {
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let data = field.bytes().await.map_err(|e| {
                    AppError::Validation(format!("Failed to read file data: {e}"))
                })?;
                if data.len() > config.max_bytes {
                    return Err(AppError::PayloadTooLarge);
                }
                file = Some((content_type, data.to_vec()));
            }
            Some("type") => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("Failed to read type: {e}")))?;
                kind = value.parse()?;
            }
            _ => {}
        }
    }

    let (content_type, data) =
        file.ok_or_else(|| AppError::Validation("No file provided".to_string()))?;

    let url = UploadService::save_image(&config, kind, &data, &content_type).await?;
    Ok(ApiResponse::ok(UploadResponse { url }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn alice() -> AuthUser {
        AuthUser {
            user_id: 7,
            username: "alice".into(),
        }
    }

    fn headers(id: &'static str, name: &'static str) -> HeaderMap {
        let mut h = HeaderMap::new();
        h.insert(USER_ID_HEADER, HeaderValue::from_static(id));
        h.insert(USERNAME_HEADER, HeaderValue::from_static(name));
        h
    }

    #[test]
    fn matching_identity_passes() {
        assert!(check_identity(&headers("7", "alice"), &alice()).is_ok());
    }

    #[test]
    fn mismatched_identity_forbidden() {
        assert!(matches!(
            check_identity(&headers("8", "alice"), &alice()),
            Err(AppError::Forbidden)
        ));
        assert!(matches!(
            check_identity(&headers("7", "mallory"), &alice()),
            Err(AppError::Forbidden)
        ));
    }

    #[test]
    fn missing_identity_is_a_validation_error() {
        assert!(matches!(
            check_identity(&HeaderMap::new(), &alice()),
            Err(AppError::Validation(_))
        ));
    }
}
