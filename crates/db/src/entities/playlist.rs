//! Playlist entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Who may read a playlist. Private playlists are visible to their
/// owner only; everyone else sees them as nonexistent.
#[derive(Clone, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[sea_orm(string_value = "public")]
    Public,
    #[sea_orm(string_value = "private")]
    Private,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "playlist")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// At most 100 characters
    pub name: String,

    /// At most 2000 characters
    #[sea_orm(column_type = "Text")]
    pub description: String,

    pub visibility: Visibility,

    pub owner_id: String,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::OwnerId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Owner,

    #[sea_orm(has_many = "super::playlist_video::Entity")]
    PlaylistVideo,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Owner.def()
    }
}

impl Related<super::playlist_video::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PlaylistVideo.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
