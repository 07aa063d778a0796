//! Like entity.
//!
//! A like targets exactly one of a video, a comment, or a tweet.
//! Each (liker, target) pair is unique, enforced by partial indexes,
//! so a toggle can insert blindly with conflict-do-nothing.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "like")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub liked_by_id: String,

    #[sea_orm(nullable)]
    pub video_id: Option<String>,

    #[sea_orm(nullable)]
    pub comment_id: Option<String>,

    #[sea_orm(nullable)]
    pub tweet_id: Option<String>,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::LikedById",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    LikedBy,

    #[sea_orm(
        belongs_to = "super::video::Entity",
        from = "Column::VideoId",
        to = "super::video::Column::Id"
    )]
    Video,

    #[sea_orm(
        belongs_to = "super::comment::Entity",
        from = "Column::CommentId",
        to = "super::comment::Column::Id"
    )]
    Comment,

    #[sea_orm(
        belongs_to = "super::tweet::Entity",
        from = "Column::TweetId",
        to = "super::tweet::Column::Id"
    )]
    Tweet,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LikedBy.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
