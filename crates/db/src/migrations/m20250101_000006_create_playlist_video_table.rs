//! Create playlist_video table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PlaylistVideo::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PlaylistVideo::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(PlaylistVideo::PlaylistId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PlaylistVideo::VideoId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(ColumnDef::new(PlaylistVideo::Position).integer().not_null())
                    .col(
                        ColumnDef::new(PlaylistVideo::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_playlist_video_playlist")
                            .from(PlaylistVideo::Table, PlaylistVideo::PlaylistId)
                            .to(Playlist::Table, Playlist::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_playlist_video_video")
                            .from(PlaylistVideo::Table, PlaylistVideo::VideoId)
                            .to(Video::Table, Video::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: (playlist_id, video_id) - a video appears at most once
        manager
            .create_index(
                Index::create()
                    .name("idx_playlist_video_pair")
                    .table(PlaylistVideo::Table)
                    .col(PlaylistVideo::PlaylistId)
                    .col(PlaylistVideo::VideoId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PlaylistVideo::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum PlaylistVideo {
    Table,
    Id,
    PlaylistId,
    VideoId,
    Position,
    CreatedAt,
}

#[derive(Iden)]
enum Playlist {
    Table,
    Id,
}

#[derive(Iden)]
enum Video {
    Table,
    Id,
}
