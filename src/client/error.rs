use serde::Deserialize;
use thiserror::Error;
use validator::ValidationErrors;

/// One failed rule on one form field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub code: String,
    pub message: String,
}

/// Flatten validator output, sorted by field so the list is stable.
pub fn field_errors(errors: &ValidationErrors) -> Vec<FieldError> {
    let mut list: Vec<FieldError> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| FieldError {
                field: field.to_string(),
                code: e.code.to_string(),
                message: e
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("Invalid {field}")),
            })
        })
        .collect();
    list.sort_by(|a, b| a.field.cmp(&b.field));
    list
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("No user is loaded")]
    MissingUser,

    #[error("Image must be 5 MB or smaller")]
    FileTooLarge,

    #[error("Only image files can be uploaded")]
    UnsupportedFileType,

    #[error("{} field(s) failed validation", .0.len())]
    Validation(Vec<FieldError>),

    #[error("An image upload is still in progress")]
    UploadPending,

    #[error("No image selected")]
    NoImageSelected,

    #[error("The form is not open for editing")]
    NotEditing,

    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Server returned {status}: {message}")]
    Server { status: u16, message: String },

    #[error("Server response had no data")]
    EmptyResponse,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// Build a [`ClientError::Server`] from a non-success response, preferring
/// the server's `{ "error": ... }` message.
pub(crate) async fn server_error(response: reqwest::Response) -> ClientError {
    let status = response.status();
    let message = match response.json::<ErrorBody>().await {
        Ok(body) => body.error,
        Err(_) => status
            .canonical_reason()
            .unwrap_or("Unexpected response")
            .to_string(),
    };
    ClientError::Server {
        status: status.as_u16(),
        message,
    }
}
