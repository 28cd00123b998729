//! Field rules shared by the server's profile update and the client-side
//! profile form, so both sides accept exactly the same input.

use chrono::NaiveDate;
use std::borrow::Cow;
use validator::{ValidateUrl, ValidationError};

pub const USERNAME_MIN_CHARS: usize = 3;
pub const USERNAME_MAX_CHARS: usize = 30;
pub const BIO_MAX_CHARS: usize = 160;
pub const NAME_MAX_CHARS: usize = 100;

/// Earliest birthdate a viewer may pick.
pub fn min_birthdate() -> NaiveDate {
    NaiveDate::from_ymd_opt(1900, 1, 1).unwrap_or(NaiveDate::MIN)
}

fn error(code: &'static str, message: String) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(Cow::Owned(message));
    err
}

/// Surrounding whitespace is ignored; it is trimmed before storing.
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    let len = username.trim().chars().count();
    if !(USERNAME_MIN_CHARS..=USERNAME_MAX_CHARS).contains(&len) {
        return Err(error(
            "length",
            format!(
                "Username must be between {} and {} characters",
                USERNAME_MIN_CHARS, USERNAME_MAX_CHARS
            ),
        ));
    }
    Ok(())
}

pub fn validate_bio(bio: &str) -> Result<(), ValidationError> {
    if bio.chars().count() > BIO_MAX_CHARS {
        return Err(error(
            "length",
            format!("Bio must be at most {} characters", BIO_MAX_CHARS),
        ));
    }
    Ok(())
}

pub fn validate_name_part(value: &str) -> Result<(), ValidationError> {
    if value.chars().count() > NAME_MAX_CHARS {
        return Err(error(
            "length",
            format!("Must be at most {} characters", NAME_MAX_CHARS),
        ));
    }
    Ok(())
}

/// An empty string means "no website" and passes.
pub fn validate_website(website: &str) -> Result<(), ValidationError> {
    let website = website.trim();
    if website.is_empty() {
        return Ok(());
    }
    let has_web_scheme = website.starts_with("http://") || website.starts_with("https://");
    if !has_web_scheme || !website.validate_url() {
        return Err(error("url", "Website must be a valid URL".to_string()));
    }
    Ok(())
}

/// Dates outside `[1900-01-01, today]` are not offered by the date picker.
pub fn is_birthdate_selectable(date: NaiveDate, today: NaiveDate) -> bool {
    date >= min_birthdate() && date <= today
}

/// Server-side counterpart of [`is_birthdate_selectable`].
pub fn validate_birthdate(date: NaiveDate, today: NaiveDate) -> Result<(), ValidationError> {
    if !is_birthdate_selectable(date, today) {
        return Err(error(
            "range",
            "Birthdate must be between 1900-01-01 and today".to_string(),
        ));
    }
    Ok(())
}
