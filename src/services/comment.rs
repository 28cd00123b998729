use crate::{
    error::{AppError, AppResult},
    models::{comment, Comment, CommentModel, User, UserModel},
};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder,
};

pub const COMMENT_MAX_CHARS: usize = 2000;

pub fn check_comment_content(content: &str) -> AppResult<String> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation("Comment cannot be empty".to_string()));
    }
    if trimmed.chars().count() > COMMENT_MAX_CHARS {
        return Err(AppError::Validation(format!(
            "Comment must be at most {COMMENT_MAX_CHARS} characters"
        )));
    }
    Ok(trimmed.to_string())
}

pub struct CommentService {
    db: DatabaseConnection,
}

impl CommentService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Oldest first, each with its author.
    pub async fn list_by_blog(
        &self,
        blog_id: i32,
        page: u64,
        per_page: u64,
    ) -> AppResult<(Vec<(CommentModel, Option<UserModel>)>, u64)> {
        let paginator = Comment::find()
            .filter(comment::Column::BlogId.eq(blog_id))
            .order_by_asc(comment::Column::CreatedAt)
            .find_also_related(User)
            .paginate(&self.db, per_page);

        let total = paginator.num_items().await?;
        let rows = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((rows, total))
    }

    /// The caller checks that the blog is readable by `user_id`.
    pub async fn create(&self, blog_id: i32, user_id: i32, content: &str) -> AppResult<CommentModel> {
        let content = check_comment_content(content)?;
        let now = chrono::Utc::now().naive_utc();

        let comment = comment::ActiveModel {
            blog_id: Set(blog_id),
            user_id: Set(user_id),
            content: Set(content),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.db)
        .await?;
        Ok(comment)
    }

    pub async fn update(&self, id: i32, user_id: i32, content: &str) -> AppResult<CommentModel> {
        let content = check_comment_content(content)?;
        let existing = self.get_by_id(id).await?;
        if existing.user_id != user_id {
            return Err(AppError::Forbidden);
        }

        let mut active: comment::ActiveModel = existing.into();
        active.content = Set(content);
        active.updated_at = Set(chrono::Utc::now().naive_utc());
        Ok(active.update(&self.db).await?)
    }

    pub async fn delete(&self, id: i32, user_id: i32) -> AppResult<()> {
        let existing = self.get_by_id(id).await?;
        if existing.user_id != user_id {
            return Err(AppError::Forbidden);
        }
        Comment::delete_by_id(id).exec(&self.db).await?;
        Ok(())
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<CommentModel> {
        Comment::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)
    }
}
