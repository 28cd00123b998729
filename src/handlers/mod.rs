pub mod auth;
pub mod blog;
pub mod comment;
pub mod follow;
pub mod reaction;
pub mod tag;
pub mod upload;
pub mod user;

pub use auth::*;
