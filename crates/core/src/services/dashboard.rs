//! Dashboard service: the owner's own channel, unpublished rows
//! included.

use vidtube_common::{AppResult, Page, PageRequest};
use vidtube_db::repositories::{
    CommentRepository, LikeRepository, SubscriptionRepository, VideoRepository,
};

use crate::views::{ChannelStats, DashboardVideo};

/// Dashboard service for business logic.
#[derive(Clone)]
pub struct DashboardService {
    video_repo: VideoRepository,
    like_repo: LikeRepository,
    comment_repo: CommentRepository,
    subscription_repo: SubscriptionRepository,
}

impl DashboardService {
    /// Create a new dashboard service.
    #[must_use]
    pub const fn new(
        video_repo: VideoRepository,
        like_repo: LikeRepository,
        comment_repo: CommentRepository,
        subscription_repo: SubscriptionRepository,
    ) -> Self {
        Self {
            video_repo,
            like_repo,
            comment_repo,
            subscription_repo,
        }
    }

    /// Channel totals: subscribers, videos, stored views, and likes
    /// across all of the owner's videos.
    pub async fn stats(&self, owner_id: &str) -> AppResult<ChannelStats> {
        let total_subscribers = self.subscription_repo.count_subscribers(owner_id).await?;
        let total_videos = self.video_repo.count_by_owner(owner_id).await?;
        let total_views = self.video_repo.sum_views_by_owner(owner_id).await?;

        let video_ids = self.video_repo.ids_by_owner(owner_id).await?;
        let total_likes = self.like_repo.count_for_videos_total(&video_ids).await?;

        Ok(ChannelStats {
            total_subscribers,
            total_videos,
            total_views,
            total_likes,
        })
    }

    /// Page of the owner's videos, newest first, published or not, each
    /// with query-time like and comment counts.
    pub async fn videos(
        &self,
        owner_id: &str,
        request: PageRequest,
    ) -> AppResult<Page<DashboardVideo>> {
        let request = request.normalized();
        let videos = self
            .video_repo
            .page_by_owner(owner_id, request.limit, request.offset())
            .await?;
        let total = self.video_repo.count_by_owner(owner_id).await?;

        let video_ids: Vec<String> = videos.iter().map(|v| v.id.clone()).collect();
        let like_counts = self.like_repo.counts_for_videos(&video_ids).await?;
        let comment_counts = self.comment_repo.counts_for_videos(&video_ids).await?;

        let items = videos
            .iter()
            .map(|v| {
                DashboardVideo::new(
                    v,
                    like_counts.get(&v.id).copied().unwrap_or(0),
                    comment_counts.get(&v.id).copied().unwrap_or(0),
                )
            })
            .collect();

        Ok(Page::new(items, request, total))
    }
}
