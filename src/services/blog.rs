use crate::{
    error::{AppError, AppResult},
    models::{
        blog, blog_image, blog_tag, comment, favorite, follow, like, tag, Blog, BlogImage,
        BlogImageModel, BlogModel, Comment, Favorite, Follow, Like, Tag, TagModel, Visibility,
    },
    services::tag::TagService,
    utils::{excerpt, reading_time_minutes},
};
use sea_orm::{
    sea_query::Query, ActiveModelTrait, ActiveValue::Set, ColumnTrait, Condition, ConnectionTrait,
    DatabaseConnection, EntityTrait, ModelTrait, PaginatorTrait, QueryFilter, QueryOrder,
    TransactionTrait,
};

pub const MIN_BLOG_IMAGES: usize = 1;
pub const MAX_BLOG_IMAGES: usize = 5;

/// Fields accepted on create and full update.
#[derive(Debug, Clone)]
pub struct BlogInput {
    pub title: String,
    pub subtitle: Option<String>,
    pub description: Option<String>,
    pub content: String,
    pub excerpt: Option<String>,
    pub featured_image: Option<String>,
    pub visibility: Visibility,
    pub images: Vec<String>,
    pub tags: Vec<String>,
}

impl BlogInput {
    fn resolved_excerpt(&self) -> String {
        match self.excerpt.as_deref().map(str::trim) {
            Some(e) if !e.is_empty() => e.to_string(),
            _ => excerpt(&self.content),
        }
    }

    /// The featured image falls back to the first attached image.
    fn resolved_featured_image(&self) -> Option<String> {
        self.featured_image
            .clone()
            .or_else(|| self.images.first().cloned())
    }
}

pub fn check_image_count(images: &[String]) -> AppResult<()> {
    if (MIN_BLOG_IMAGES..=MAX_BLOG_IMAGES).contains(&images.len()) {
        Ok(())
    } else {
        Err(AppError::Validation(format!(
            "A blog needs between {MIN_BLOG_IMAGES} and {MAX_BLOG_IMAGES} images, got {}",
            images.len()
        )))
    }
}

/// Whether `viewer` may read a blog with this visibility.
pub fn can_view(
    visibility: Visibility,
    author_id: i32,
    viewer: Option<i32>,
    viewer_follows_author: bool,
) -> bool {
    match visibility {
        Visibility::Public => true,
        _ if viewer == Some(author_id) => true,
        Visibility::Followers => viewer.is_some() && viewer_follows_author,
        Visibility::OnlyMe => false,
    }
}

/// Row filter equivalent of [`can_view`].
pub(crate) fn visible_to(viewer: Option<i32>) -> Condition {
    let public = blog::Column::Visibility.eq(Visibility::Public);
    let Some(viewer_id) = viewer else {
        return Condition::all().add(public);
    };

    let followed_authors = Query::select()
        .column(follow::Column::FollowingId)
        .from(Follow)
        .and_where(follow::Column::FollowerId.eq(viewer_id))
        .to_owned();

    Condition::any()
        .add(public)
        .add(blog::Column::AuthorId.eq(viewer_id))
        .add(
            Condition::all()
                .add(blog::Column::Visibility.eq(Visibility::Followers))
                .add(blog::Column::AuthorId.in_subquery(followed_authors)),
        )
}

#[derive(Debug, Clone)]
pub struct BlogDetail {
    pub blog: BlogModel,
    pub images: Vec<BlogImageModel>,
    pub tags: Vec<TagModel>,
    pub like_count: u64,
    pub favorite_count: u64,
    pub comment_count: u64,
}

pub struct BlogService {
    db: DatabaseConnection,
}

impl BlogService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn create(&self, author_id: i32, input: BlogInput) -> AppResult<BlogDetail> {
        check_image_count(&input.images)?;
        let now = chrono::Utc::now().naive_utc();

        let txn = self.db.begin().await?;
        let blog = blog::ActiveModel {
            author_id: Set(author_id),
            title: Set(input.title.clone()),
            subtitle: Set(input.subtitle.clone()),
            description: Set(input.description.clone()),
            content: Set(input.content.clone()),
            excerpt: Set(input.resolved_excerpt()),
            featured_image: Set(input.resolved_featured_image()),
            reading_time: Set(reading_time_minutes(&input.content)),
            visibility: Set(input.visibility),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        let images = Self::replace_images(&txn, blog.id, &input.images).await?;
        let tags = TagService::set_blog_tags(&txn, blog.id, &input.tags).await?;
        txn.commit().await?;

        tracing::info!(blog_id = blog.id, author_id, "blog created");
        Ok(BlogDetail {
            blog,
            images,
            tags,
            like_count: 0,
            favorite_count: 0,
            comment_count: 0,
        })
    }

    /// Full replacement of an owned blog, images and tags included.
    pub async fn update(&self, id: i32, user_id: i32, input: BlogInput) -> AppResult<BlogDetail> {
        check_image_count(&input.images)?;
        let existing = self.get_by_id(id).await?;
        if existing.author_id != user_id {
            return Err(AppError::Forbidden);
        }

        let txn = self.db.begin().await?;
        let mut active: blog::ActiveModel = existing.into();
        active.title = Set(input.title.clone());
        active.subtitle = Set(input.subtitle.clone());
        active.description = Set(input.description.clone());
        active.content = Set(input.content.clone());
        active.excerpt = Set(input.resolved_excerpt());
        active.featured_image = Set(input.resolved_featured_image());
        active.reading_time = Set(reading_time_minutes(&input.content));
        active.visibility = Set(input.visibility);
        active.updated_at = Set(chrono::Utc::now().naive_utc());
        let blog = active.update(&txn).await?;

        Self::replace_images(&txn, id, &input.images).await?;
        TagService::set_blog_tags(&txn, id, &input.tags).await?;
        txn.commit().await?;

        self.detail(blog).await
    }

    pub async fn delete(&self, id: i32, user_id: i32) -> AppResult<()> {
        let existing = self.get_by_id(id).await?;
        if existing.author_id != user_id {
            return Err(AppError::Forbidden);
        }
        existing.delete(&self.db).await?;
        tracing::info!(blog_id = id, "blog deleted");
        Ok(())
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<BlogModel> {
        Blog::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)
    }

    /// A blog the viewer may not read is reported as missing.
    pub async fn get_visible(&self, id: i32, viewer: Option<i32>) -> AppResult<BlogModel> {
        let blog = self.get_by_id(id).await?;
        let follows = match viewer {
            Some(viewer_id) if blog.visibility == Visibility::Followers => {
                self.is_following(viewer_id, blog.author_id).await?
            }
            _ => false,
        };
        if can_view(blog.visibility, blog.author_id, viewer, follows) {
            Ok(blog)
        } else {
            Err(AppError::NotFound)
        }
    }

    pub async fn get_detail(&self, id: i32, viewer: Option<i32>) -> AppResult<BlogDetail> {
        let blog = self.get_visible(id, viewer).await?;
        self.detail(blog).await
    }

    /// Newest public blogs.
    pub async fn list_feed(&self, page: u64, per_page: u64) -> AppResult<(Vec<BlogModel>, u64)> {
        let paginator = Blog::find()
            .filter(visible_to(None))
            .order_by_desc(blog::Column::CreatedAt)
            .paginate(&self.db, per_page);

        let total = paginator.num_items().await?;
        let blogs = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((blogs, total))
    }

    pub async fn list_by_author(
        &self,
        author_id: i32,
        viewer: Option<i32>,
        page: u64,
        per_page: u64,
    ) -> AppResult<(Vec<BlogModel>, u64)> {
        let paginator = Blog::find()
            .filter(blog::Column::AuthorId.eq(author_id))
            .filter(visible_to(viewer))
            .order_by_desc(blog::Column::CreatedAt)
            .paginate(&self.db, per_page);

        let total = paginator.num_items().await?;
        let blogs = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((blogs, total))
    }

    /// Public blogs carrying the tag.
    pub async fn list_by_tag(
        &self,
        tag_name: &str,
        page: u64,
        per_page: u64,
    ) -> AppResult<(Vec<BlogModel>, u64)> {
        let tag = TagService::new(self.db.clone()).get_by_name(tag_name).await?;

        let tagged = Query::select()
            .column(blog_tag::Column::BlogId)
            .from(blog_tag::Entity)
            .and_where(blog_tag::Column::TagId.eq(tag.id))
            .to_owned();

        let paginator = Blog::find()
            .filter(blog::Column::Id.in_subquery(tagged))
            .filter(visible_to(None))
            .order_by_desc(blog::Column::CreatedAt)
            .paginate(&self.db, per_page);

        let total = paginator.num_items().await?;
        let blogs = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((blogs, total))
    }

    pub async fn is_following(&self, follower_id: i32, following_id: i32) -> AppResult<bool> {
        let count = Follow::find()
            .filter(follow::Column::FollowerId.eq(follower_id))
            .filter(follow::Column::FollowingId.eq(following_id))
            .count(&self.db)
            .await?;
        Ok(count > 0)
    }

    async fn detail(&self, blog: BlogModel) -> AppResult<BlogDetail> {
        let images = blog
            .find_related(BlogImage)
            .order_by_asc(blog_image::Column::Id)
            .all(&self.db)
            .await?;
        let tags = blog
            .find_related(Tag)
            .order_by_asc(tag::Column::Name)
            .all(&self.db)
            .await?;
        let like_count = Like::find()
            .filter(like::Column::BlogId.eq(blog.id))
            .count(&self.db)
            .await?;
        let favorite_count = Favorite::find()
            .filter(favorite::Column::BlogId.eq(blog.id))
            .count(&self.db)
            .await?;
        let comment_count = Comment::find()
            .filter(comment::Column::BlogId.eq(blog.id))
            .count(&self.db)
            .await?;

        Ok(BlogDetail {
            blog,
            images,
            tags,
            like_count,
            favorite_count,
            comment_count,
        })
    }

    async fn replace_images<C: ConnectionTrait>(
        conn: &C,
        blog_id: i32,
        urls: &[String],
    ) -> AppResult<Vec<BlogImageModel>> {
        BlogImage::delete_many()
            .filter(blog_image::Column::BlogId.eq(blog_id))
            .exec(conn)
            .await?;

        let mut images = Vec::with_capacity(urls.len());
        for url in urls {
            let image = blog_image::ActiveModel {
                blog_id: Set(blog_id),
                url: Set(url.clone()),
                ..Default::default()
            }
            .insert(conn)
            .await?;
            images.push(image);
        }
        Ok(images)
    }
}
