//! Create like table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Like::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Like::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Like::LikedById).string_len(32).not_null())
                    .col(ColumnDef::new(Like::VideoId).string_len(32))
                    .col(ColumnDef::new(Like::CommentId).string_len(32))
                    .col(ColumnDef::new(Like::TweetId).string_len(32))
                    .col(
                        ColumnDef::new(Like::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_like_liked_by")
                            .from(Like::Table, Like::LikedById)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Exactly one target reference per like.
        manager
            .get_connection()
            .execute_unprepared(
                "ALTER TABLE \"like\" ADD CONSTRAINT chk_like_single_target \
                 CHECK (num_nonnulls(video_id, comment_id, tweet_id) = 1)",
            )
            .await?;

        // Unique per-target pairs; partial so NULL targets do not collide
        manager
            .get_connection()
            .execute_unprepared(
                "CREATE UNIQUE INDEX IF NOT EXISTS idx_like_video_pair \
                 ON \"like\" (liked_by_id, video_id) WHERE video_id IS NOT NULL",
            )
            .await?;

        manager
            .get_connection()
            .execute_unprepared(
                "CREATE UNIQUE INDEX IF NOT EXISTS idx_like_comment_pair \
                 ON \"like\" (liked_by_id, comment_id) WHERE comment_id IS NOT NULL",
            )
            .await?;

        manager
            .get_connection()
            .execute_unprepared(
                "CREATE UNIQUE INDEX IF NOT EXISTS idx_like_tweet_pair \
                 ON \"like\" (liked_by_id, tweet_id) WHERE tweet_id IS NOT NULL",
            )
            .await?;

        // Index: video_id (counting a video's likes)
        manager
            .create_index(
                Index::create()
                    .name("idx_like_video_id")
                    .table(Like::Table)
                    .col(Like::VideoId)
                    .to_owned(),
            )
            .await?;

        // Index: liked_by_id (liked-video listings)
        manager
            .create_index(
                Index::create()
                    .name("idx_like_liked_by_id")
                    .table(Like::Table)
                    .col(Like::LikedById)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Like::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Like {
    Table,
    Id,
    LikedById,
    VideoId,
    CommentId,
    TweetId,
    CreatedAt,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
