use crate::{
    error::{AppError, AppResult},
    models::{blog, follow, user, Blog, Follow, Profile, ProfileModel, User, UserModel},
    services::cache::CacheService,
};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter};
use serde::{Deserialize, Serialize};

const CACHE_TTL_PROFILE: u64 = 300;

fn profile_cache_key(username: &str) -> String {
    format!("users:profile:{}", username)
}

/// A user row joined with its (possibly not yet created) profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserWithProfile {
    pub user: UserModel,
    pub profile: Option<ProfileModel>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicProfile {
    pub user: UserModel,
    pub profile: Option<ProfileModel>,
    pub followers_count: u64,
    pub following_count: u64,
    pub blog_count: u64,
}

pub struct UserService {
    db: DatabaseConnection,
    cache: Option<CacheService>,
}

impl UserService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db, cache: None }
    }

    pub fn with_cache(mut self, cache: CacheService) -> Self {
        self.cache = Some(cache);
        self
    }

    pub async fn get_by_id(&self, user_id: i32) -> AppResult<UserModel> {
        User::find_by_id(user_id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)
    }

    pub async fn get_with_profile(&self, user_id: i32) -> AppResult<UserWithProfile> {
        let (user, profile) = User::find_by_id(user_id)
            .find_also_related(Profile)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)?;
        Ok(UserWithProfile { user, profile })
    }

    pub async fn get_public_profile(&self, username: &str) -> AppResult<PublicProfile> {
        let key = profile_cache_key(username);
        if let Some(cache) = &self.cache {
            if let Some(cached) = cache.get::<PublicProfile>(&key).await {
                return Ok(cached);
            }
        }

        let (user, profile) = User::find()
            .filter(user::Column::Username.eq(username))
            .find_also_related(Profile)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)?;

        let followers_count = Follow::find()
            .filter(follow::Column::FollowingId.eq(user.id))
            .count(&self.db)
            .await?;
        let following_count = Follow::find()
            .filter(follow::Column::FollowerId.eq(user.id))
            .count(&self.db)
            .await?;
        let blog_count = Blog::find()
            .filter(blog::Column::AuthorId.eq(user.id))
            .filter(blog::Column::Visibility.eq(blog::Visibility::Public))
            .count(&self.db)
            .await?;

        let public = PublicProfile {
            user,
            profile,
            followers_count,
            following_count,
            blog_count,
        };

        if let Some(cache) = &self.cache {
            cache.set(&key, &public, CACHE_TTL_PROFILE).await;
        }

        Ok(public)
    }

    /// Drop cached public profiles after a profile change. Both names are
    /// cleared when the username itself changed.
    pub async fn invalidate_profile(&self, usernames: &[&str]) {
        if let Some(cache) = &self.cache {
            for username in usernames {
                cache.invalidate(&profile_cache_key(username)).await;
            }
        }
    }
}
