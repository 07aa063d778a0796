//! Video entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "video")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Public URL of the media asset
    pub video_url: String,

    /// Storage key of the media asset
    pub video_key: String,

    /// Public URL of the thumbnail
    pub thumbnail_url: String,

    /// Storage key of the thumbnail
    pub thumbnail_key: String,

    pub title: String,

    #[sea_orm(column_type = "Text")]
    pub description: String,

    /// Duration in seconds
    pub duration_secs: f64,

    /// Stored view counter; the one denormalized count in the schema.
    /// Incremented by one on every successful fetch-by-id.
    #[sea_orm(default_value = 0)]
    pub views: i64,

    #[sea_orm(default_value = true)]
    pub is_published: bool,

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

    #[sea_orm(has_many = "super::comment::Entity")]
    Comment,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Owner.def()
    }
}

impl Related<super::comment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Comment.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
