use super::error::{field_errors, FieldError};
use crate::handlers::user::UserResponse;
use crate::services::profile::{ProfilePatch, UpdateProfileRequest};
use crate::validation;
use chrono::{DateTime, NaiveDate, NaiveTime};
use validator::Validate;

pub use crate::validation::is_birthdate_selectable;

/// Editable values, one per input. Text inputs hold `""` when empty.
#[derive(Debug, Clone, Default, PartialEq, Validate)]
pub struct ProfileForm {
    #[validate(custom(function = "crate::validation::validate_username"))]
    pub username: String,
    #[validate(custom(function = "crate::validation::validate_name_part"))]
    pub first_name: String,
    #[validate(custom(function = "crate::validation::validate_name_part"))]
    pub last_name: String,
    #[validate(custom(function = "crate::validation::validate_name_part"))]
    pub location: String,
    pub about: String,
    #[validate(custom(function = "crate::validation::validate_bio"))]
    pub bio: String,
    #[validate(custom(function = "crate::validation::validate_website"))]
    pub website: String,
    birthdate: Option<NaiveDate>,
}

fn text(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

/// `""` is sent as an explicit clear.
fn optional(value: &str) -> Option<Option<String>> {
    let value = value.trim();
    Some((!value.is_empty()).then(|| value.to_string()))
}

impl ProfileForm {
    pub fn from_user(user: &UserResponse) -> Self {
        let profile = user.profile.as_ref();
        Self {
            username: user.username.clone(),
            first_name: text(&user.first_name),
            last_name: text(&user.last_name),
            location: text(&user.location),
            about: text(&user.about),
            bio: profile.map(|p| text(&p.bio)).unwrap_or_default(),
            website: profile.map(|p| text(&p.website)).unwrap_or_default(),
            birthdate: profile
                .and_then(|p| p.birthdate.as_deref())
                .and_then(|b| DateTime::parse_from_rfc3339(b).ok())
                .map(|b| b.date_naive()),
        }
    }

    pub fn birthdate(&self) -> Option<NaiveDate> {
        self.birthdate
    }

    /// Pick a birthdate the way the date picker would. Dates it does not
    /// offer are ignored and `false` is returned.
    pub fn select_birthdate(&mut self, date: NaiveDate, today: NaiveDate) -> bool {
        if !validation::is_birthdate_selectable(date, today) {
            return false;
        }
        self.birthdate = Some(date);
        true
    }

    pub fn clear_birthdate(&mut self) {
        self.birthdate = None;
    }

    pub fn check(&self) -> Result<(), Vec<FieldError>> {
        self.validate().map_err(|e| field_errors(&e))
    }

    /// Build the partial update. Every field the form shows is sent, so
    /// emptying an input clears the stored value.
    pub fn to_payload(&self, profile_picture: Option<String>) -> UpdateProfileRequest {
        UpdateProfileRequest {
            username: Some(self.username.trim().to_string()),
            first_name: optional(&self.first_name),
            last_name: optional(&self.last_name),
            location: optional(&self.location),
            about: optional(&self.about),
            profile: Some(ProfilePatch {
                bio: optional(&self.bio),
                website: optional(&self.website),
                birthdate: Some(
                    self.birthdate
                        .map(|d| d.and_time(NaiveTime::MIN).and_utc()),
                ),
                profile_picture: Some(profile_picture),
            }),
        }
    }
}
