use crate::error::{AppError, AppResult};
use crate::models::{blog_tag, tag, Tag, TagModel};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set, Statement,
};
use std::collections::{BTreeSet, HashMap};

pub const TAG_MAX_CHARS: usize = 30;
pub const MAX_TAGS_PER_BLOG: usize = 10;

/// Lowercase, trim and dedupe tag names, dropping blank and overlong ones.
pub fn normalize_tag_names(names: &[String]) -> Vec<String> {
    let mut seen = BTreeSet::new();
    names
        .iter()
        .map(|n| n.trim().to_lowercase())
        .filter(|n| !n.is_empty() && n.chars().count() <= TAG_MAX_CHARS)
        .filter(|n| seen.insert(n.clone()))
        .take(MAX_TAGS_PER_BLOG)
        .collect()
}

pub struct TagService {
    db: DatabaseConnection,
}

impl TagService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Look up each tag by name, creating the missing ones.
    pub async fn get_or_create_tags<C: ConnectionTrait>(
        conn: &C,
        names: &[String],
    ) -> AppResult<Vec<TagModel>> {
        let mut result = Vec::new();
        for name in normalize_tag_names(names) {
            conn.execute(Statement::from_sql_and_values(
                sea_orm::DatabaseBackend::Postgres,
                "INSERT INTO tags (name) VALUES ($1) ON CONFLICT (name) DO NOTHING",
                vec![name.clone().into()],
            ))
            .await?;

            let tag = Tag::find()
                .filter(tag::Column::Name.eq(&name))
                .one(conn)
                .await?
                .ok_or_else(|| AppError::Internal(anyhow::anyhow!("tag '{name}' vanished")))?;
            result.push(tag);
        }
        Ok(result)
    }

    /// Replace the tag set of a blog.
    pub async fn set_blog_tags<C: ConnectionTrait>(
        conn: &C,
        blog_id: i32,
        names: &[String],
    ) -> AppResult<Vec<TagModel>> {
        let tags = Self::get_or_create_tags(conn, names).await?;

        blog_tag::Entity::delete_many()
            .filter(blog_tag::Column::BlogId.eq(blog_id))
            .exec(conn)
            .await?;

        for tag in &tags {
            blog_tag::ActiveModel {
                blog_id: Set(blog_id),
                tag_id: Set(tag.id),
                ..Default::default()
            }
            .insert(conn)
            .await?;
        }
        Ok(tags)
    }

    /// Tag names per blog, for list views.
    pub async fn get_tags_for_blogs(&self, blog_ids: &[i32]) -> AppResult<HashMap<i32, Vec<String>>> {
        if blog_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let placeholders: Vec<String> = (1..=blog_ids.len()).map(|i| format!("${i}")).collect();
        let sql = format!(
            "SELECT bt.blog_id, t.name \
                FROM blog_tags bt \
                INNER JOIN tags t ON t.id = bt.tag_id \
                WHERE bt.blog_id IN ({}) \
                ORDER BY t.name",
            placeholders.join(", ")
        );
        let values: Vec<sea_orm::Value> = blog_ids.iter().map(|&id| id.into()).collect();

        let rows = self
            .db
            .query_all(Statement::from_sql_and_values(
                sea_orm::DatabaseBackend::Postgres,
                &sql,
                values,
            ))
            .await?;

        let mut map: HashMap<i32, Vec<String>> = HashMap::new();
        for row in rows {
            let blog_id: i32 = row.try_get_by_index(0)?;
            let name: String = row.try_get_by_index(1)?;
            map.entry(blog_id).or_default().push(name);
        }
        Ok(map)
    }

    pub async fn list_tags(&self) -> AppResult<Vec<TagModel>> {
        Ok(Tag::find()
            .order_by_asc(tag::Column::Name)
            .all(&self.db)
            .await?)
    }

    pub async fn get_by_name(&self, name: &str) -> AppResult<TagModel> {
        Tag::find()
            .filter(tag::Column::Name.eq(name.trim().to_lowercase()))
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)
    }
}
