use super::{parse_bool_env, parse_env_or};

#[derive(Debug, Clone, Copy)]
pub struct AuthConfig {
    pub require_email_verification: bool,
    pub verification_token_ttl_hours: i64,
    pub password_reset_ttl_minutes: i64,
}

impl AuthConfig {
    pub fn from_env() -> Self {
        Self {
            require_email_verification: parse_bool_env("REQUIRE_EMAIL_VERIFICATION", false),
            verification_token_ttl_hours: parse_env_or("VERIFICATION_TOKEN_TTL_HOURS", 24),
            password_reset_ttl_minutes: parse_env_or("PASSWORD_RESET_TTL_MINUTES", 60),
        }
    }
}
