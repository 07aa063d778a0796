//! Domain services.
//!
//! One service per domain. Services own their repositories and an
//! [`IdGenerator`]; they never touch the connection directly.

pub mod comment;
pub mod dashboard;
pub mod like;
pub mod playlist;
pub mod subscription;
pub mod tweet;
pub mod user;
pub mod video;
pub mod watch_history;

pub use comment::CommentService;
pub use dashboard::DashboardService;
pub use like::LikeService;
pub use playlist::PlaylistService;
pub use subscription::SubscriptionService;
pub use tweet::TweetService;
pub use user::{SessionTokens, UserService};
pub use video::{StagedFile, VideoService};
pub use watch_history::WatchHistoryService;

use vidtube_common::{AppError, AppResult};

/// Ownership gate applied before every mutation of an owned resource.
pub fn assert_owner(owner_id: &str, viewer_id: &str) -> AppResult<()> {
    if owner_id == viewer_id {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "You do not own this resource".to_string(),
        ))
    }
}
