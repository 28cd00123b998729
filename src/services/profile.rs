//! Partial profile updates.
//!
//! Every optional field is tri-state on the wire:
//!
//! * absent: keep the stored value
//! * `null`: clear the stored value
//! * a value: overwrite the stored value
//!
//! `username` is required on the user row, so `null` and absent both keep it.

use crate::{
    error::{AppError, AppResult},
    models::{profile, user, Profile, ProfileModel, User, UserModel},
    services::user::UserWithProfile,
    validation,
};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
    TransactionTrait,
};
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;
use validator::{ValidationError, ValidationErrors};

/// Keeps `null` distinguishable from an absent field.
fn nullable<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Resolve one tri-state field against the stored value.
fn merge_field<T>(current: Option<T>, incoming: Option<Option<T>>) -> Option<T> {
    match incoming {
        None => current,
        Some(value) => value,
    }
}

/// Trim, and turn blank strings into an explicit clear.
fn normalize_text(field: Option<Option<String>>) -> Option<Option<String>> {
    field.map(|value| {
        value
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    })
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ProfilePatch {
    #[serde(
        default,
        deserialize_with = "nullable",
        skip_serializing_if = "Option::is_none"
    )]
    #[schema(value_type = Option<String>)]
    pub bio: Option<Option<String>>,
    #[serde(
        default,
        deserialize_with = "nullable",
        skip_serializing_if = "Option::is_none"
    )]
    #[schema(value_type = Option<String>)]
    pub website: Option<Option<String>>,
    /// RFC 3339 timestamp
    #[serde(
        default,
        deserialize_with = "nullable",
        skip_serializing_if = "Option::is_none"
    )]
    #[schema(value_type = Option<String>, format = DateTime)]
    pub birthdate: Option<Option<DateTime<Utc>>>,
    #[serde(
        default,
        deserialize_with = "nullable",
        skip_serializing_if = "Option::is_none"
    )]
    #[schema(value_type = Option<String>)]
    pub profile_picture: Option<Option<String>>,
}

/// Profile columns after a patch has been merged in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileValues {
    pub bio: Option<String>,
    pub website: Option<String>,
    pub birthdate: Option<NaiveDateTime>,
    pub profile_picture: Option<String>,
}

impl ProfilePatch {
    fn normalized(self) -> Self {
        Self {
            bio: normalize_text(self.bio),
            website: normalize_text(self.website),
            birthdate: self.birthdate,
            profile_picture: normalize_text(self.profile_picture),
        }
    }

    /// Merge onto the stored profile, or onto an empty one when the user
    /// has none yet.
    pub fn merge(&self, existing: Option<&ProfileModel>) -> ProfileValues {
        let current = existing
            .map(|p| ProfileValues {
                bio: p.bio.clone(),
                website: p.website.clone(),
                birthdate: p.birthdate,
                profile_picture: p.profile_picture.clone(),
            })
            .unwrap_or_default();

        ProfileValues {
            bio: merge_field(current.bio, self.bio.clone()),
            website: merge_field(current.website, self.website.clone()),
            birthdate: merge_field(
                current.birthdate,
                self.birthdate.map(|d| d.map(|d| d.naive_utc())),
            ),
            profile_picture: merge_field(current.profile_picture, self.profile_picture.clone()),
        }
    }

    fn validate_into(&self, today: NaiveDate, errors: &mut ValidationErrors) {
        if let Some(Some(bio)) = &self.bio {
            push(errors, "bio", validation::validate_bio(bio));
        }
        if let Some(Some(website)) = &self.website {
            push(errors, "website", validation::validate_website(website));
        }
        if let Some(Some(birthdate)) = &self.birthdate {
            push(
                errors,
                "birthdate",
                validation::validate_birthdate(birthdate.date_naive(), today),
            );
        }
    }
}

fn push(errors: &mut ValidationErrors, field: &'static str, result: Result<(), ValidationError>) {
    if let Err(err) = result {
        errors.add(field, err);
    }
}

/// Body of `updateProfile`: top-level user fields plus a nested profile patch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct UpdateProfileRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(
        default,
        deserialize_with = "nullable",
        skip_serializing_if = "Option::is_none"
    )]
    #[schema(value_type = Option<String>)]
    pub first_name: Option<Option<String>>,
    #[serde(
        default,
        deserialize_with = "nullable",
        skip_serializing_if = "Option::is_none"
    )]
    #[schema(value_type = Option<String>)]
    pub last_name: Option<Option<String>>,
    #[serde(
        default,
        deserialize_with = "nullable",
        skip_serializing_if = "Option::is_none"
    )]
    #[schema(value_type = Option<String>)]
    pub location: Option<Option<String>>,
    #[serde(
        default,
        deserialize_with = "nullable",
        skip_serializing_if = "Option::is_none"
    )]
    #[schema(value_type = Option<String>)]
    pub about: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<ProfilePatch>,
}

impl UpdateProfileRequest {
    pub fn normalized(self) -> Self {
        Self {
            username: self.username.map(|u| u.trim().to_string()),
            first_name: normalize_text(self.first_name),
            last_name: normalize_text(self.last_name),
            location: normalize_text(self.location),
            about: normalize_text(self.about),
            profile: self.profile.map(ProfilePatch::normalized),
        }
    }

    pub fn validate(&self, today: NaiveDate) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if let Some(username) = &self.username {
            push(&mut errors, "username", validation::validate_username(username));
        }
        for (field, value) in [
            ("first_name", &self.first_name),
            ("last_name", &self.last_name),
            ("location", &self.location),
        ] {
            if let Some(Some(value)) = value {
                push(&mut errors, field, validation::validate_name_part(value));
            }
        }
        if let Some(profile) = &self.profile {
            profile.validate_into(today, &mut errors);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    fn apply_to_user(&self, existing: UserModel, now: NaiveDateTime) -> user::ActiveModel {
        let first_name = merge_field(existing.first_name.clone(), self.first_name.clone());
        let last_name = merge_field(existing.last_name.clone(), self.last_name.clone());
        let location = merge_field(existing.location.clone(), self.location.clone());
        let about = merge_field(existing.about.clone(), self.about.clone());
        let username = self.username.clone();

        let mut active: user::ActiveModel = existing.into();
        if let Some(username) = username {
            active.username = Set(username);
        }
        active.first_name = Set(first_name);
        active.last_name = Set(last_name);
        active.location = Set(location);
        active.about = Set(about);
        active.updated_at = Set(now);
        active
    }
}

pub struct ProfileService {
    db: DatabaseConnection,
}

impl ProfileService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Apply a partial update to a user and their profile in one transaction.
    /// The profile row is created here the first time a patch touches it.
    pub async fn update_profile(
        &self,
        user_id: i32,
        request: UpdateProfileRequest,
    ) -> AppResult<UserWithProfile> {
        let request = request.normalized();
        request.validate(Utc::now().date_naive())?;

        let txn = self.db.begin().await?;

        let existing = User::find_by_id(user_id)
            .one(&txn)
            .await?
            .ok_or(AppError::NotFound)?;

        if let Some(username) = &request.username {
            if username != &existing.username {
                let taken = User::find()
                    .filter(user::Column::Username.eq(username.as_str()))
                    .filter(user::Column::Id.ne(user_id))
                    .one(&txn)
                    .await?
                    .is_some();
                if taken {
                    return Err(AppError::Conflict("Username is already taken".to_string()));
                }
            }
        }

        let existing_profile = Profile::find()
            .filter(profile::Column::UserId.eq(user_id))
            .one(&txn)
            .await?;

        let now = Utc::now().naive_utc();
        let user = request.apply_to_user(existing, now).update(&txn).await?;

        let profile = match (&request.profile, existing_profile) {
            (Some(patch), Some(stored)) => {
                let values = patch.merge(Some(&stored));
                let mut active: profile::ActiveModel = stored.into();
                active.bio = Set(values.bio);
                active.website = Set(values.website);
                active.birthdate = Set(values.birthdate);
                active.profile_picture = Set(values.profile_picture);
                active.updated_at = Set(now);
                Some(active.update(&txn).await?)
            }
            (Some(patch), None) => {
                let values = patch.merge(None);
                let created = profile::ActiveModel {
                    user_id: Set(user_id),
                    bio: Set(values.bio),
                    website: Set(values.website),
                    birthdate: Set(values.birthdate),
                    profile_picture: Set(values.profile_picture),
                    created_at: Set(now),
                    updated_at: Set(now),
                    ..Default::default()
                };
                Some(created.insert(&txn).await?)
            }
            (None, stored) => stored,
        };

        txn.commit().await?;

        tracing::info!(user_id, "profile updated");
        Ok(UserWithProfile { user, profile })
    }
}
