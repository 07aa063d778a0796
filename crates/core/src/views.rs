//! Read-model projections returned by the services.
//!
//! Viewer-relative fields (`is_liked`, `is_subscribed`) are always
//! present; an anonymous viewer sees `false`, never a missing field.
//! Counts other than `views` are computed at query time.

use chrono::{DateTime, FixedOffset};
use serde::Serialize;
use vidtube_db::entities::{comment, playlist, tweet, user, video};

fn rfc3339(ts: &DateTime<FixedOffset>) -> String {
    ts.to_rfc3339()
}

/// Minimal owner profile embedded in listings.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerInfo {
    pub id: String,
    pub username: String,
    pub full_name: String,
    pub avatar_url: Option<String>,
}

impl From<&user::Model> for OwnerInfo {
    fn from(u: &user::Model) -> Self {
        Self {
            id: u.id.clone(),
            username: u.username.clone(),
            full_name: u.full_name.clone(),
            avatar_url: u.avatar_url.clone(),
        }
    }
}

/// Owner block on the video detail view, enriched with channel stats
/// relative to the viewer.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoOwner {
    pub id: String,
    pub username: String,
    pub full_name: String,
    pub avatar_url: Option<String>,
    pub subscribers_count: u64,
    pub subscribed_to_count: u64,
    pub is_subscribed: bool,
}

/// Full video detail.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoDetail {
    pub id: String,
    pub video_url: String,
    pub thumbnail_url: String,
    pub title: String,
    pub description: String,
    pub duration_secs: f64,
    pub views: i64,
    pub is_published: bool,
    pub created_at: String,
    pub owner: VideoOwner,
    pub likes_count: u64,
    pub is_liked: bool,
}

/// Compact video row for listings (liked videos, watch history,
/// playlist contents).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoCard {
    pub id: String,
    pub thumbnail_url: String,
    pub title: String,
    pub description: String,
    pub duration_secs: f64,
    pub views: i64,
    pub created_at: String,
    pub owner: OwnerInfo,
}

impl VideoCard {
    /// Build a card from a video row and its owner.
    #[must_use]
    pub fn new(v: &video::Model, owner: &user::Model) -> Self {
        Self {
            id: v.id.clone(),
            thumbnail_url: v.thumbnail_url.clone(),
            title: v.title.clone(),
            description: v.description.clone(),
            duration_secs: v.duration_secs,
            views: v.views,
            created_at: rfc3339(&v.created_at),
            owner: OwnerInfo::from(owner),
        }
    }
}

/// Comment with owner and viewer-relative like state.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
    pub id: String,
    pub content: String,
    pub created_at: String,
    pub owner: OwnerInfo,
    pub likes_count: u64,
    pub is_liked: bool,
}

impl CommentView {
    /// Build a view from a comment row, its owner, and like state.
    #[must_use]
    pub fn new(c: &comment::Model, owner: &user::Model, likes_count: u64, is_liked: bool) -> Self {
        Self {
            id: c.id.clone(),
            content: c.content.clone(),
            created_at: rfc3339(&c.created_at),
            owner: OwnerInfo::from(owner),
            likes_count,
            is_liked,
        }
    }
}

/// Tweet with owner and viewer-relative like state.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TweetView {
    pub id: String,
    pub content: String,
    pub created_at: String,
    pub owner: OwnerInfo,
    pub likes_count: u64,
    pub is_liked: bool,
}

impl TweetView {
    /// Build a view from a tweet row, its owner, and like state.
    #[must_use]
    pub fn new(t: &tweet::Model, owner: &user::Model, likes_count: u64, is_liked: bool) -> Self {
        Self {
            id: t.id.clone(),
            content: t.content.clone(),
            created_at: rfc3339(&t.created_at),
            owner: OwnerInfo::from(owner),
            likes_count,
            is_liked,
        }
    }
}

/// One user in a subscribers / subscribed-channels listing.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriberView {
    pub id: String,
    pub username: String,
    pub full_name: String,
    pub avatar_url: Option<String>,
    pub subscribers_count: u64,
    pub is_subscribed: bool,
}

/// Playlist row in a user's playlist listing.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistSummary {
    pub id: String,
    pub name: String,
    pub description: String,
    pub visibility: playlist::Visibility,
    pub created_at: String,
    pub total_videos: u64,
    /// Thumbnail of the first published video, if any.
    pub thumbnail_url: Option<String>,
}

/// Playlist detail: metadata plus one page of its videos.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistDetail {
    pub id: String,
    pub name: String,
    pub description: String,
    pub visibility: playlist::Visibility,
    pub created_at: String,
    pub owner: OwnerInfo,
    pub videos: vidtube_common::Page<VideoCard>,
}

/// One watch event joined to its (still published) video.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchHistoryEntry {
    pub id: String,
    pub watched_at: String,
    pub video: VideoCard,
}

impl WatchHistoryEntry {
    /// Build an entry from a history row and the resolved video card.
    #[must_use]
    pub fn new(id: String, watched_at: &DateTime<FixedOffset>, video: VideoCard) -> Self {
        Self {
            id,
            watched_at: rfc3339(watched_at),
            video,
        }
    }
}

/// Public channel profile, viewer-relative.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelProfile {
    pub id: String,
    pub username: String,
    pub full_name: String,
    pub avatar_url: Option<String>,
    pub cover_url: Option<String>,
    pub subscribers_count: u64,
    pub subscribed_to_count: u64,
    pub is_subscribed: bool,
}

/// Channel subscription counters.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionCounts {
    pub subscribers_count: u64,
    pub subscribed_to_count: u64,
    pub is_subscribed: bool,
}

/// Owner dashboard totals.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelStats {
    pub total_subscribers: u64,
    pub total_videos: u64,
    pub total_views: i64,
    pub total_likes: u64,
}

/// Owner dashboard video row, published or not.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardVideo {
    pub id: String,
    pub thumbnail_url: String,
    pub title: String,
    pub views: i64,
    pub is_published: bool,
    pub created_at: String,
    pub likes_count: u64,
    pub comments_count: u64,
}

impl DashboardVideo {
    /// Build a dashboard row from a video and its query-time counts.
    #[must_use]
    pub fn new(v: &video::Model, likes_count: u64, comments_count: u64) -> Self {
        Self {
            id: v.id.clone(),
            thumbnail_url: v.thumbnail_url.clone(),
            title: v.title.clone(),
            views: v.views,
            is_published: v.is_published,
            created_at: rfc3339(&v.created_at),
            likes_count,
            comments_count,
        }
    }
}

/// Authenticated user's own profile.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub avatar_url: Option<String>,
    pub cover_url: Option<String>,
    pub watch_history_enabled: bool,
    pub created_at: String,
}

impl From<&user::Model> for UserProfile {
    fn from(u: &user::Model) -> Self {
        Self {
            id: u.id.clone(),
            username: u.username.clone(),
            email: u.email.clone(),
            full_name: u.full_name.clone(),
            avatar_url: u.avatar_url.clone(),
            cover_url: u.cover_url.clone(),
            watch_history_enabled: u.watch_history_enabled,
            created_at: rfc3339(&u.created_at),
        }
    }
}
