//! Create playlist table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Playlist::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Playlist::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Playlist::Name).string_len(100).not_null())
                    .col(ColumnDef::new(Playlist::Description).text().not_null())
                    .col(
                        ColumnDef::new(Playlist::Visibility)
                            .string_len(16)
                            .not_null()
                            .default("private"),
                    )
                    .col(ColumnDef::new(Playlist::OwnerId).string_len(32).not_null())
                    .col(
                        ColumnDef::new(Playlist::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Playlist::UpdatedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_playlist_owner")
                            .from(Playlist::Table, Playlist::OwnerId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: owner_id (listing a user's playlists)
        manager
            .create_index(
                Index::create()
                    .name("idx_playlist_owner_id")
                    .table(Playlist::Table)
                    .col(Playlist::OwnerId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Playlist::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Playlist {
    Table,
    Id,
    Name,
    Description,
    Visibility,
    OwnerId,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
