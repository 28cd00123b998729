use crate::{
    error::AppResult,
    models::{blog, favorite, Blog, BlogModel, Favorite},
    services::blog::visible_to,
};
use sea_orm::{
    sea_query::Query, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Statement,
};

/// Per-user set membership on a blog. Both kinds share one table shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactionKind {
    Like,
    Favorite,
}

impl ReactionKind {
    fn table(self) -> &'static str {
        match self {
            ReactionKind::Like => "likes",
            ReactionKind::Favorite => "favorites",
        }
    }
}

pub struct ReactionService {
    db: DatabaseConnection,
}

impl ReactionService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Adding an existing pair is a no-op.
    pub async fn add(&self, kind: ReactionKind, user_id: i32, blog_id: i32) -> AppResult<()> {
        let sql = format!(
            "INSERT INTO {} (blog_id, user_id, created_at) VALUES ($1, $2, NOW()) \
                ON CONFLICT (blog_id, user_id) DO NOTHING",
            kind.table()
        );
        self.db
            .execute(Statement::from_sql_and_values(
                sea_orm::DatabaseBackend::Postgres,
                &sql,
                vec![blog_id.into(), user_id.into()],
            ))
            .await?;
        Ok(())
    }

    pub async fn remove(&self, kind: ReactionKind, user_id: i32, blog_id: i32) -> AppResult<()> {
        let sql = format!(
            "DELETE FROM {} WHERE blog_id = $1 AND user_id = $2",
            kind.table()
        );
        self.db
            .execute(Statement::from_sql_and_values(
                sea_orm::DatabaseBackend::Postgres,
                &sql,
                vec![blog_id.into(), user_id.into()],
            ))
            .await?;
        Ok(())
    }

    pub async fn exists(&self, kind: ReactionKind, user_id: i32, blog_id: i32) -> AppResult<bool> {
        let sql = format!(
            "SELECT EXISTS (SELECT 1 FROM {} WHERE blog_id = $1 AND user_id = $2)",
            kind.table()
        );
        let row = self
            .db
            .query_one(Statement::from_sql_and_values(
                sea_orm::DatabaseBackend::Postgres,
                &sql,
                vec![blog_id.into(), user_id.into()],
            ))
            .await?;
        match row {
            Some(row) => Ok(row.try_get_by_index(0)?),
            None => Ok(false),
        }
    }

    /// Flip membership. Returns true when the pair is now present.
    /// The caller checks that the blog is readable by `user_id`.
    pub async fn toggle(&self, kind: ReactionKind, user_id: i32, blog_id: i32) -> AppResult<bool> {
        if self.exists(kind, user_id, blog_id).await? {
            self.remove(kind, user_id, blog_id).await?;
            Ok(false)
        } else {
            self.add(kind, user_id, blog_id).await?;
            Ok(true)
        }
    }

    /// Favorited blogs the user can still read, newest first.
    pub async fn list_favorites(
        &self,
        user_id: i32,
        page: u64,
        per_page: u64,
    ) -> AppResult<(Vec<BlogModel>, u64)> {
        let favorited = Query::select()
            .column(favorite::Column::BlogId)
            .from(Favorite)
            .and_where(favorite::Column::UserId.eq(user_id))
            .to_owned();

        let paginator = Blog::find()
            .filter(blog::Column::Id.in_subquery(favorited))
            .filter(visible_to(Some(user_id)))
            .order_by_desc(blog::Column::CreatedAt)
            .paginate(&self.db, per_page);

        let total = paginator.num_items().await?;
        let blogs = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((blogs, total))
    }
}
