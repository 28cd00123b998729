pub mod auth;
pub mod blog;
pub mod cache;
pub mod comment;
pub mod email;
pub mod follow;
pub mod profile;
pub mod reaction;
pub mod tag;
pub mod upload;
pub mod user;
