use super::error::{server_error, ClientError};
use crate::handlers::upload::{USERNAME_HEADER, USER_ID_HEADER};
use crate::services::upload::UploadKind;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde_json::Value;

pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// A file the viewer picked, held in memory until it is uploaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedImage {
    pub name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl SelectedImage {
    pub fn new(name: impl Into<String>, mime: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime: mime.into(),
            bytes,
        }
    }

    /// Checks that run before any network call.
    pub fn check(&self) -> Result<(), ClientError> {
        if self.bytes.len() > MAX_IMAGE_BYTES {
            return Err(ClientError::FileTooLarge);
        }
        if !self.mime.starts_with("image/") {
            return Err(ClientError::UnsupportedFileType);
        }
        Ok(())
    }

    /// Local preview handle shown until the server URL is known.
    pub fn preview_url(&self) -> String {
        format!("blob:inkpost/{}", uuid::Uuid::new_v4())
    }
}

/// Previews made by [`SelectedImage::preview_url`] are never sent to the server.
pub fn is_local_preview(url: &str) -> bool {
    url.starts_with("blob:")
}

#[async_trait]
pub trait ImageUploader: Send + Sync {
    /// Store the image as the acting user and return its public URL.
    async fn upload(
        &self,
        image: &SelectedImage,
        user_id: i32,
        username: &str,
    ) -> Result<String, ClientError>;
}

/// `POST {base_url}/api/upload` as multipart.
#[derive(Clone)]
pub struct HttpImageUploader {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpImageUploader {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }
}

/// The URL may sit at the top level or inside the `data` envelope.
fn uploaded_url(body: &Value) -> Option<String> {
    body.get("url")
        .or_else(|| body.get("data").and_then(|d| d.get("url")))
        .and_then(Value::as_str)
        .filter(|url| !url.is_empty())
        .map(str::to_string)
}

#[async_trait]
impl ImageUploader for HttpImageUploader {
    async fn upload(
        &self,
        image: &SelectedImage,
        user_id: i32,
        username: &str,
    ) -> Result<String, ClientError> {
        let part = Part::bytes(image.bytes.clone())
            .file_name(image.name.clone())
            .mime_str(&image.mime)?;
        let form = Form::new()
            .part("file", part)
            .text("type", UploadKind::Profile.as_str());

        let mut request = self
            .client
            .post(format!("{}/api/upload", self.base_url))
            .header(USER_ID_HEADER, user_id.to_string())
            .header(USERNAME_HEADER, username)
            .multipart(form);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(server_error(response).await);
        }

        let body: Value = response.json().await?;
        uploaded_url(&body).ok_or(ClientError::EmptyResponse)
    }
}
