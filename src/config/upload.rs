use super::parse_env_or;
use std::env;

pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct UploadConfig {
    /// Directory served under `/uploads`
    pub upload_dir: String,
    pub max_bytes: usize,
}

impl UploadConfig {
    pub fn from_env() -> Self {
        Self {
            upload_dir: env::var("UPLOAD_DIR").unwrap_or_else(|_| "./uploads".to_string()),
            max_bytes: parse_env_or("UPLOAD_MAX_BYTES", DEFAULT_MAX_UPLOAD_BYTES),
        }
    }

    pub fn with_dir(upload_dir: impl Into<String>) -> Self {
        Self {
            upload_dir: upload_dir.into(),
            max_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}
