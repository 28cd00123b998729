use crate::{
    error::{AppError, AppResult},
    models::{follow, user, Follow, User, UserModel},
};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Statement,
};
use std::collections::HashMap;

/// Which side of the follow edge to list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowDirection {
    /// Users following the given user.
    Followers,
    /// Users the given user follows.
    Following,
}

pub struct FollowService {
    db: DatabaseConnection,
}

impl FollowService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Returns true if now following, false if unfollowed.
    pub async fn toggle(&self, follower_id: i32, following_id: i32) -> AppResult<bool> {
        if follower_id == following_id {
            return Err(AppError::Validation("Cannot follow yourself".to_string()));
        }

        User::find_by_id(following_id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)?;

        let removed = Follow::delete_many()
            .filter(follow::Column::FollowerId.eq(follower_id))
            .filter(follow::Column::FollowingId.eq(following_id))
            .exec(&self.db)
            .await?
            .rows_affected;
        if removed > 0 {
            tracing::info!(follower_id, following_id, "unfollowed");
            return Ok(false);
        }

        self.db
            .execute(Statement::from_sql_and_values(
                sea_orm::DatabaseBackend::Postgres,
                "INSERT INTO follows (follower_id, following_id, created_at) \
                    VALUES ($1, $2, NOW()) \
                    ON CONFLICT (follower_id, following_id) DO NOTHING",
                vec![follower_id.into(), following_id.into()],
            ))
            .await?;
        tracing::info!(follower_id, following_id, "followed");
        Ok(true)
    }

    /// Most recent edges first.
    pub async fn list(
        &self,
        user_id: i32,
        direction: FollowDirection,
        page: u64,
        per_page: u64,
    ) -> AppResult<(Vec<UserModel>, u64)> {
        let (filter_col, other_side): (follow::Column, fn(&follow::Model) -> i32) = match direction
        {
            FollowDirection::Followers => (follow::Column::FollowingId, |f| f.follower_id),
            FollowDirection::Following => (follow::Column::FollowerId, |f| f.following_id),
        };

        let paginator = Follow::find()
            .filter(filter_col.eq(user_id))
            .order_by_desc(follow::Column::CreatedAt)
            .paginate(&self.db, per_page);

        let total = paginator.num_items().await?;
        let edges = paginator.fetch_page(page.saturating_sub(1)).await?;

        let user_ids: Vec<i32> = edges.iter().map(other_side).collect();
        if user_ids.is_empty() {
            return Ok((vec![], total));
        }

        let users = User::find()
            .filter(user::Column::Id.is_in(user_ids.clone()))
            .all(&self.db)
            .await?;

        let mut by_id: HashMap<i32, UserModel> = users.into_iter().map(|u| (u.id, u)).collect();
        let ordered = user_ids
            .into_iter()
            .filter_map(|id| by_id.remove(&id))
            .collect();

        Ok((ordered, total))
    }
}
