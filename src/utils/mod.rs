pub mod jwt;
pub mod markdown;
pub mod password;

pub use jwt::{encode_access_token, encode_refresh_token};
pub use markdown::{excerpt, reading_time_minutes, render_markdown};
pub use password::{hash_password, verify_password};
