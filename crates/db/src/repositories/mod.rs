//! Repository layer.
//!
//! Each repository wraps the shared [`sea_orm::DatabaseConnection`] and
//! exposes the queries one domain needs. Nothing above this layer builds
//! queries directly.

pub mod comment;
pub mod like;
pub mod playlist;
pub mod subscription;
pub mod tweet;
pub mod user;
pub mod video;
pub mod watch_history;

pub use comment::CommentRepository;
pub use like::LikeRepository;
pub use playlist::PlaylistRepository;
pub use subscription::SubscriptionRepository;
pub use tweet::TweetRepository;
pub use user::UserRepository;
pub use video::VideoRepository;
pub use watch_history::WatchHistoryRepository;
