//! Watch-history entity.
//!
//! One row per watch event; repeat views of the same video create new
//! rows. Kept when the watched video is deleted, filtered out at read.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "watch_history")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub watched_by_id: String,

    pub video_id: String,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::WatchedById",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    WatchedBy,

    #[sea_orm(
        belongs_to = "super::video::Entity",
        from = "Column::VideoId",
        to = "super::video::Column::Id"
    )]
    Video,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::WatchedBy.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
