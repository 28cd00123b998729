use super::parse_env_or;
use anyhow::Result;
use std::env;

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    /// Seconds, default 15 minutes
    pub access_token_expiry: u64,
    /// Seconds, default 7 days
    pub refresh_token_expiry: u64,
}

impl JwtConfig {
    pub fn from_env() -> Result<Self> {
        let secret = env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET environment variable must be set"))?;

        if secret.len() < 32 {
            return Err(anyhow::anyhow!(
                "JWT_SECRET must be at least 32 characters"
            ));
        }

        Ok(Self {
            secret,
            access_token_expiry: parse_env_or("JWT_ACCESS_EXPIRATION", 900),
            refresh_token_expiry: parse_env_or("JWT_REFRESH_EXPIRATION", 604_800),
        })
    }
}
