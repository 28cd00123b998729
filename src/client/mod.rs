//! Profile edit form as state plus operations, and the HTTP clients it
//! drives.
//!
//! [`ProfileEditor`] owns the form values and both state machines (form
//! and image upload). It reaches the server only through the
//! [`UserController`] and [`ImageUploader`] traits, so tests swap in
//! in-memory fakes.

pub mod controller;
pub mod editor;
pub mod error;
pub mod form;
pub mod upload;

pub use controller::{HttpUserController, UserController};
pub use editor::{FormStatus, Notice, ProfileEditor, UploadState, UploadTicket};
pub use error::{ClientError, FieldError};
pub use form::ProfileForm;
pub use upload::{HttpImageUploader, ImageUploader, SelectedImage, MAX_IMAGE_BYTES};
