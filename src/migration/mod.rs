use sea_orm_migration::prelude::*;

mod m20240101_000001_create_users_table;
mod m20240101_000002_create_profiles_table;
mod m20240101_000003_create_blogs_tables;
mod m20240101_000004_create_tags_tables;
mod m20240101_000005_create_comments_table;
mod m20240101_000006_create_likes_favorites_tables;
mod m20240101_000007_create_follows_table;
mod m20240101_000008_create_token_tables;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_users_table::Migration),
            Box::new(m20240101_000002_create_profiles_table::Migration),
            Box::new(m20240101_000003_create_blogs_tables::Migration),
            Box::new(m20240101_000004_create_tags_tables::Migration),
            Box::new(m20240101_000005_create_comments_table::Migration),
            Box::new(m20240101_000006_create_likes_favorites_tables::Migration),
            Box::new(m20240101_000007_create_follows_table::Migration),
            Box::new(m20240101_000008_create_token_tables::Migration),
        ]
    }
}
