use crate::config::upload::UploadConfig;
use crate::error::{AppError, AppResult};
use anyhow::Context;
use std::path::Path;
use std::str::FromStr;
use tokio::fs;
use uuid::Uuid;

/// What an uploaded image is for. Decides the storage subdirectory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    Profile,
    Blog,
}

impl UploadKind {
    pub fn as_str(self) -> &'static str {
        match self {
            UploadKind::Profile => "profile",
            UploadKind::Blog => "blog",
        }
    }

    fn subdirectory(self) -> &'static str {
        match self {
            UploadKind::Profile => "profiles",
            UploadKind::Blog => "blogs",
        }
    }
}

impl FromStr for UploadKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "profile" => Ok(UploadKind::Profile),
            "blog" => Ok(UploadKind::Blog),
            other => Err(AppError::Validation(format!(
                "Unknown upload type '{other}', expected 'profile' or 'blog'"
            ))),
        }
    }
}

const ALLOWED_CONTENT_TYPES: &[(&str, &str)] = &[
    ("image/jpeg", "jpg"),
    ("image/png", "png"),
    ("image/gif", "gif"),
    ("image/webp", "webp"),
];

fn extension_for(content_type: &str) -> Option<&'static str> {
    ALLOWED_CONTENT_TYPES
        .iter()
        .find(|(ct, _)| *ct == content_type)
        .map(|(_, ext)| *ext)
}

/// Does the payload start with the signature of the declared type?
fn validate_magic_bytes(data: &[u8], content_type: &str) -> bool {
    match content_type {
        "image/jpeg" => data.starts_with(&[0xFF, 0xD8, 0xFF]),
        "image/png" => data.starts_with(&[0x89, 0x50, 0x4E, 0x47]),
        "image/gif" => data.starts_with(b"GIF8"),
        "image/webp" => data.len() >= 12 && data.starts_with(b"RIFF") && &data[8..12] == b"WEBP",
        _ => false,
    }
}

/// Size, type and signature checks, in that order.
pub fn check_image(config: &UploadConfig, data: &[u8], content_type: &str) -> AppResult<&'static str> {
    if data.len() > config.max_bytes {
        return Err(AppError::PayloadTooLarge);
    }
    if data.is_empty() {
        return Err(AppError::Validation("Uploaded file is empty".to_string()));
    }

    let ext = extension_for(content_type).ok_or_else(|| {
        AppError::Validation(format!(
            "Unsupported file type: {content_type}. Allowed: jpeg, png, gif, webp"
        ))
    })?;

    if !validate_magic_bytes(data, content_type) {
        return Err(AppError::Validation(
            "File content does not match declared content type".to_string(),
        ));
    }
    Ok(ext)
}

pub struct UploadService;

impl UploadService {
    /// Store an image and return its public path, e.g.
    /// `/uploads/profiles/<uuid>.png`.
    pub async fn save_image(
        config: &UploadConfig,
        kind: UploadKind,
        data: &[u8],
        content_type: &str,
    ) -> AppResult<String> {
        let ext = check_image(config, data, content_type)?;

        let filename = format!("{}.{}", Uuid::new_v4(), ext);
        let dir = Path::new(&config.upload_dir).join(kind.subdirectory());

        fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("Failed to create upload directory {}", dir.display()))?;
        fs::write(dir.join(&filename), data)
            .await
            .context("Failed to write uploaded file")?;

        tracing::info!(kind = kind.as_str(), %filename, bytes = data.len(), "image stored");
        Ok(format!("/uploads/{}/{}", kind.subdirectory(), filename))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

    fn config() -> UploadConfig {
        UploadConfig::with_dir(std::env::temp_dir().join("inkpost-upload-tests").display().to_string())
    }

    #[test]
    fn upload_kind_parses() {
        assert_eq!("profile".parse::<UploadKind>().unwrap(), UploadKind::Profile);
        assert_eq!("blog".parse::<UploadKind>().unwrap(), UploadKind::Blog);
        assert!("avatar".parse::<UploadKind>().is_err());
    }

    #[test]
    fn magic_bytes_per_type() {
        assert!(validate_magic_bytes(&[0xFF, 0xD8, 0xFF, 0xE0], "image/jpeg"));
        assert!(validate_magic_bytes(PNG, "image/png"));
        assert!(validate_magic_bytes(b"GIF89a", "image/gif"));
        assert!(validate_magic_bytes(b"RIFF\0\0\0\0WEBPVP8 ", "image/webp"));
        assert!(!validate_magic_bytes(PNG, "image/jpeg"));
        assert!(!validate_magic_bytes(&[0xFF, 0xD8], "image/jpeg"));
    }

    #[test]
    fn oversized_payload_rejected_first() {
        let mut cfg = config();
        cfg.max_bytes = 4;
        assert!(matches!(
            check_image(&cfg, PNG, "text/plain"),
            Err(AppError::PayloadTooLarge)
        ));
    }

    #[test]
    fn non_image_type_rejected() {
        assert!(matches!(
            check_image(&config(), b"%PDF-1.7", "application/pdf"),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn mismatched_signature_rejected() {
        assert!(check_image(&config(), PNG, "image/gif").is_err());
        assert_eq!(check_image(&config(), PNG, "image/png").unwrap(), "png");
    }

    #[tokio::test]
    async fn saved_image_lands_in_kind_directory() {
        let cfg = config();
        let url = UploadService::save_image(&cfg, UploadKind::Blog, PNG, "image/png")
            .await
            .unwrap();
        assert!(url.starts_with("/uploads/blogs/"));
        assert!(url.ends_with(".png"));

        let filename = url.rsplit('/').next().unwrap();
        let stored = Path::new(&cfg.upload_dir).join("blogs").join(filename);
        assert_eq!(std::fs::read(&stored).unwrap(), PNG);
        std::fs::remove_file(stored).unwrap();
    }
}
