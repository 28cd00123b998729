use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        db.execute_unprepared(
            "CREATE TABLE IF NOT EXISTS blogs (
                id SERIAL PRIMARY KEY,
                author_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                title VARCHAR(200) NOT NULL,
                subtitle VARCHAR(300),
                description TEXT,
                content TEXT NOT NULL,
                excerpt TEXT NOT NULL DEFAULT '',
                featured_image VARCHAR(500),
                reading_time INTEGER NOT NULL DEFAULT 1,
                visibility VARCHAR(16) NOT NULL DEFAULT 'PUBLIC'
                    CHECK (visibility IN ('ONLY_ME', 'FOLLOWERS', 'PUBLIC')),
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            )",
        )
        .await?;

        db.execute_unprepared("CREATE INDEX IF NOT EXISTS idx_blogs_author ON blogs(author_id)")
            .await?;

        db.execute_unprepared(
            "CREATE INDEX IF NOT EXISTS idx_blogs_visibility_created ON blogs(visibility, created_at DESC)",
        )
        .await?;

        db.execute_unprepared(
            "CREATE TABLE IF NOT EXISTS blog_images (
                id SERIAL PRIMARY KEY,
                blog_id INTEGER NOT NULL REFERENCES blogs(id) ON DELETE CASCADE,
                url VARCHAR(500) NOT NULL
            )",
        )
        .await?;

        db.execute_unprepared(
            "CREATE INDEX IF NOT EXISTS idx_blog_images_blog ON blog_images(blog_id)",
        )
        .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared("DROP TABLE IF EXISTS blog_images")
            .await?;
        db.execute_unprepared("DROP TABLE IF EXISTS blogs").await?;
        Ok(())
    }
}
