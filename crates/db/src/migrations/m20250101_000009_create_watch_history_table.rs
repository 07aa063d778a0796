//! Create watch_history table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(WatchHistory::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(WatchHistory::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(WatchHistory::WatchedById)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(ColumnDef::new(WatchHistory::VideoId).string_len(32).not_null())
                    .col(
                        ColumnDef::new(WatchHistory::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_watch_history_watched_by")
                            .from(WatchHistory::Table, WatchHistory::WatchedById)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: (watched_by_id, created_at) - history listing, newest first
        manager
            .create_index(
                Index::create()
                    .name("idx_watch_history_watched_by_created_at")
                    .table(WatchHistory::Table)
                    .col(WatchHistory::WatchedById)
                    .col(WatchHistory::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(WatchHistory::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum WatchHistory {
    Table,
    Id,
    WatchedById,
    VideoId,
    CreatedAt,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
