use super::error::{server_error, ClientError};
use crate::handlers::user::UserResponse;
use crate::response::ApiResponse;
use crate::services::profile::UpdateProfileRequest;
use async_trait::async_trait;
use reqwest::Client;

#[async_trait]
pub trait UserController: Send + Sync {
    /// Apply a partial update and return the refreshed user with profile.
    async fn update_profile(
        &self,
        user_id: i32,
        data: &UpdateProfileRequest,
    ) -> Result<UserResponse, ClientError>;
}

/// `PATCH {base_url}/api/users/{id}` with a bearer token.
#[derive(Clone)]
pub struct HttpUserController {
    client: Client,
    base_url: String,
    token: String,
}

impl HttpUserController {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }
}

#[async_trait]
impl UserController for HttpUserController {
    async fn update_profile(
        &self,
        user_id: i32,
        data: &UpdateProfileRequest,
    ) -> Result<UserResponse, ClientError> {
        let response = self
            .client
            .patch(format!("{}/api/users/{}", self.base_url, user_id))
            .bearer_auth(&self.token)
            .json(data)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(server_error(response).await);
        }

        let body: ApiResponse<UserResponse> = response.json().await?;
        body.data.ok_or(ClientError::EmptyResponse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn user_json() -> serde_json::Value {
        json!({
            "id": 7,
            "username": "alice123",
            "email": "alice@example.com",
            "verified": true,
            "first_name": null,
            "last_name": null,
            "location": null,
            "about": null,
            "created_at": "2026-01-01T00:00:00+00:00",
            "profile": {
                "bio": "hi",
                "website": null,
                "birthdate": null,
                "profile_picture": null
            }
        })
    }

    fn request() -> UpdateProfileRequest {
        UpdateProfileRequest {
            username: Some("alice123".into()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn patches_and_returns_user() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/api/users/7"))
            .and(header("authorization", "Bearer tok"))
            .and(body_partial_json(json!({ "username": "alice123" })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "success": true, "data": user_json() })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let controller = HttpUserController::new(server.uri(), "tok");
        let user = controller.update_profile(7, &request()).await.unwrap();
        assert_eq!(user.username, "alice123");
        assert_eq!(user.profile.and_then(|p| p.bio).as_deref(), Some("hi"));
    }

    #[tokio::test]
    async fn missing_data_is_a_failure() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "success": true, "data": null })),
            )
            .mount(&server)
            .await;

        let err = HttpUserController::new(server.uri(), "tok")
            .update_profile(7, &request())
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::EmptyResponse));
    }

    #[tokio::test]
    async fn conflict_carries_server_message() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .respond_with(
                ResponseTemplate::new(409)
                    .set_body_json(json!({ "error": "Username is already taken" })),
            )
            .mount(&server)
            .await;

        let err = HttpUserController::new(server.uri(), "tok")
            .update_profile(7, &request())
            .await
            .unwrap_err();
        match err {
            ClientError::Server { status, message } => {
                assert_eq!(status, 409);
                assert_eq!(message, "Username is already taken");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
