use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        for table in ["likes", "favorites"] {
            db.execute_unprepared(&format!(
                "CREATE TABLE IF NOT EXISTS {table} (
                    id SERIAL PRIMARY KEY,
                    blog_id INTEGER NOT NULL REFERENCES blogs(id) ON DELETE CASCADE,
                    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                    created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
                )"
            ))
            .await?;

            db.execute_unprepared(&format!(
                "CREATE UNIQUE INDEX IF NOT EXISTS idx_{table}_pair ON {table}(blog_id, user_id)"
            ))
            .await?;

            db.execute_unprepared(&format!(
                "CREATE INDEX IF NOT EXISTS idx_{table}_user ON {table}(user_id)"
            ))
            .await?;
        }

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared("DROP TABLE IF EXISTS favorites")
            .await?;
        db.execute_unprepared("DROP TABLE IF EXISTS likes").await?;
        Ok(())
    }
}
