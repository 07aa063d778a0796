//! Create comment table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Comment::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Comment::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Comment::Content).text().not_null())
                    .col(ColumnDef::new(Comment::VideoId).string_len(32))
                    .col(ColumnDef::new(Comment::TweetId).string_len(32))
                    .col(ColumnDef::new(Comment::OwnerId).string_len(32).not_null())
                    .col(
                        ColumnDef::new(Comment::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Comment::UpdatedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_comment_owner")
                            .from(Comment::Table, Comment::OwnerId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_comment_video")
                            .from(Comment::Table, Comment::VideoId)
                            .to(Video::Table, Video::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_comment_tweet")
                            .from(Comment::Table, Comment::TweetId)
                            .to(Tweet::Table, Tweet::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // Exactly one parent reference per comment.
        manager
            .get_connection()
            .execute_unprepared(
                "ALTER TABLE comment ADD CONSTRAINT chk_comment_single_parent \
                 CHECK (num_nonnulls(video_id, tweet_id) = 1)",
            )
            .await?;

        // Index: video_id (listing a video's comments)
        manager
            .create_index(
                Index::create()
                    .name("idx_comment_video_id")
                    .table(Comment::Table)
                    .col(Comment::VideoId)
                    .to_owned(),
            )
            .await?;

        // Index: tweet_id (listing a tweet's comments)
        manager
            .create_index(
                Index::create()
                    .name("idx_comment_tweet_id")
                    .table(Comment::Table)
                    .col(Comment::TweetId)
                    .to_owned(),
            )
            .await?;

        // Index: created_at (pagination)
        manager
            .create_index(
                Index::create()
                    .name("idx_comment_created_at")
                    .table(Comment::Table)
                    .col(Comment::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Comment::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Comment {
    Table,
    Id,
    Content,
    VideoId,
    TweetId,
    OwnerId,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}

#[derive(Iden)]
enum Video {
    Table,
    Id,
}

#[derive(Iden)]
enum Tweet {
    Table,
    Id,
}
