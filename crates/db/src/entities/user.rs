//! User entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Unique handle, stored lowercase.
    #[sea_orm(unique)]
    pub username: String,

    #[sea_orm(unique)]
    pub email: String,

    /// Display name
    pub full_name: String,

    /// Argon2 credential hash
    pub password_hash: String,

    /// Avatar URL
    #[sea_orm(nullable)]
    pub avatar_url: Option<String>,

    /// Storage key of the avatar asset (needed to delete it)
    #[sea_orm(nullable)]
    pub avatar_key: Option<String>,

    /// Cover image URL
    #[sea_orm(nullable)]
    pub cover_url: Option<String>,

    /// Storage key of the cover asset
    #[sea_orm(nullable)]
    pub cover_key: Option<String>,

    /// Whether fetching a video records a watch-history entry
    #[sea_orm(default_value = true)]
    pub watch_history_enabled: bool,

    /// Current session-refresh credential; NULL = logged out
    #[sea_orm(nullable)]
    pub refresh_token: Option<String>,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::video::Entity")]
    Video,

    #[sea_orm(has_many = "super::tweet::Entity")]
    Tweet,

    #[sea_orm(has_many = "super::comment::Entity")]
    Comment,

    #[sea_orm(has_many = "super::playlist::Entity")]
    Playlist,
}

impl Related<super::video::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Video.def()
    }
}

impl Related<super::tweet::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Tweet.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
