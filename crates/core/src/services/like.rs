//! Like service: one toggle state machine for three target kinds, plus
//! the viewer's liked listings.

use std::collections::HashMap;

use chrono::Utc;
use sea_orm::Set;
use vidtube_common::{validate_id, AppError, AppResult, IdGenerator, Page, PageRequest};
use vidtube_db::{
    entities::{like, user},
    repositories::{
        CommentRepository, LikeRepository, TweetRepository, UserRepository, VideoRepository,
    },
};

use crate::views::{CommentView, TweetView, VideoCard};

/// Like service for business logic.
#[derive(Clone)]
pub struct LikeService {
    like_repo: LikeRepository,
    video_repo: VideoRepository,
    comment_repo: CommentRepository,
    tweet_repo: TweetRepository,
    user_repo: UserRepository,
    id_gen: IdGenerator,
}

impl LikeService {
    /// Create a new like service.
    #[must_use]
    pub fn new(
        like_repo: LikeRepository,
        video_repo: VideoRepository,
        comment_repo: CommentRepository,
        tweet_repo: TweetRepository,
        user_repo: UserRepository,
    ) -> Self {
        Self {
            like_repo,
            video_repo,
            comment_repo,
            tweet_repo,
            user_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Toggle the viewer's like on a video; returns the new state.
    pub async fn toggle_video(&self, viewer_id: &str, video_id: &str) -> AppResult<bool> {
        validate_id(video_id, "video")?;

        self.video_repo
            .find_by_id(video_id)
            .await?
            .ok_or_else(|| AppError::VideoNotFound(video_id.to_string()))?;

        if let Some(existing) = self.like_repo.find_video_like(viewer_id, video_id).await? {
            self.like_repo.delete(existing).await?;
            return Ok(false);
        }

        let mut model = self.blank_like(viewer_id);
        model.video_id = Set(Some(video_id.to_string()));
        self.like_repo.create_video_like(model).await?;
        Ok(true)
    }

    /// Toggle the viewer's like on a comment; returns the new state.
    pub async fn toggle_comment(&self, viewer_id: &str, comment_id: &str) -> AppResult<bool> {
        validate_id(comment_id, "comment")?;

        self.comment_repo
            .find_by_id(comment_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Comment {comment_id}")))?;

        if let Some(existing) = self.like_repo.find_comment_like(viewer_id, comment_id).await? {
            self.like_repo.delete(existing).await?;
            return Ok(false);
        }

        let mut model = self.blank_like(viewer_id);
        model.comment_id = Set(Some(comment_id.to_string()));
        self.like_repo.create_comment_like(model).await?;
        Ok(true)
    }

    /// Toggle the viewer's like on a tweet; returns the new state.
    pub async fn toggle_tweet(&self, viewer_id: &str, tweet_id: &str) -> AppResult<bool> {
        validate_id(tweet_id, "tweet")?;

        self.tweet_repo
            .find_by_id(tweet_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Tweet {tweet_id}")))?;

        if let Some(existing) = self.like_repo.find_tweet_like(viewer_id, tweet_id).await? {
            self.like_repo.delete(existing).await?;
            return Ok(false);
        }

        let mut model = self.blank_like(viewer_id);
        model.tweet_id = Set(Some(tweet_id.to_string()));
        self.like_repo.create_tweet_like(model).await?;
        Ok(true)
    }

    /// Page of the viewer's liked videos, newest like first. Likes whose
    /// video has been deleted or unpublished are filtered out here;
    /// `total_items` counts the like rows, so garbage rows may make it
    /// run slightly ahead of the visible items.
    pub async fn liked_videos(
        &self,
        viewer_id: &str,
        request: PageRequest,
    ) -> AppResult<Page<VideoCard>> {
        let request = request.normalized();
        let likes = self
            .like_repo
            .video_likes_page(viewer_id, request.limit, request.offset())
            .await?;
        let total = self.like_repo.count_video_likes(viewer_id).await?;

        let video_ids: Vec<String> = likes.iter().filter_map(|l| l.video_id.clone()).collect();
        let videos = self.video_repo.find_published_by_ids(&video_ids).await?;

        let owner_ids: Vec<String> = videos.iter().map(|v| v.owner_id.clone()).collect();
        let owners: HashMap<String, user::Model> = self
            .user_repo
            .find_by_ids(&owner_ids)
            .await?
            .into_iter()
            .map(|u| (u.id.clone(), u))
            .collect();

        let by_id: HashMap<&str, &vidtube_db::entities::video::Model> =
            videos.iter().map(|v| (v.id.as_str(), v)).collect();

        let items = likes
            .iter()
            .filter_map(|l| {
                let video = by_id.get(l.video_id.as_deref()?)?;
                let owner = owners.get(&video.owner_id)?;
                Some(VideoCard::new(video, owner))
            })
            .collect();

        Ok(Page::new(items, request, total))
    }

    /// Page of the viewer's liked tweets, newest like first.
    pub async fn liked_tweets(
        &self,
        viewer_id: &str,
        request: PageRequest,
    ) -> AppResult<Page<TweetView>> {
        let request = request.normalized();
        let likes = self
            .like_repo
            .tweet_likes_page(viewer_id, request.limit, request.offset())
            .await?;
        let total = self.like_repo.count_tweet_likes(viewer_id).await?;

        let tweet_ids: Vec<String> = likes.iter().filter_map(|l| l.tweet_id.clone()).collect();
        let tweets = self.tweet_repo.find_by_ids(&tweet_ids).await?;
        let counts = self.like_repo.counts_for_tweets(&tweet_ids).await?;

        let owner_ids: Vec<String> = tweets.iter().map(|t| t.owner_id.clone()).collect();
        let owners: HashMap<String, user::Model> = self
            .user_repo
            .find_by_ids(&owner_ids)
            .await?
            .into_iter()
            .map(|u| (u.id.clone(), u))
            .collect();

        let by_id: HashMap<&str, &vidtube_db::entities::tweet::Model> =
            tweets.iter().map(|t| (t.id.as_str(), t)).collect();

        let items = likes
            .iter()
            .filter_map(|l| {
                let tweet = by_id.get(l.tweet_id.as_deref()?)?;
                let owner = owners.get(&tweet.owner_id)?;
                let count = counts.get(&tweet.id).copied().unwrap_or(0);
                Some(TweetView::new(tweet, owner, count, true))
            })
            .collect();

        Ok(Page::new(items, request, total))
    }

    /// Page of the viewer's liked comments, newest like first.
    pub async fn liked_comments(
        &self,
        viewer_id: &str,
        request: PageRequest,
    ) -> AppResult<Page<CommentView>> {
        let request = request.normalized();
        let likes = self
            .like_repo
            .comment_likes_page(viewer_id, request.limit, request.offset())
            .await?;
        let total = self.like_repo.count_comment_likes(viewer_id).await?;

        let comment_ids: Vec<String> = likes.iter().filter_map(|l| l.comment_id.clone()).collect();
        let comments = self.comment_repo.find_by_ids(&comment_ids).await?;
        let counts = self.like_repo.counts_for_comments(&comment_ids).await?;

        let owner_ids: Vec<String> = comments.iter().map(|c| c.owner_id.clone()).collect();
        let owners: HashMap<String, user::Model> = self
            .user_repo
            .find_by_ids(&owner_ids)
            .await?
            .into_iter()
            .map(|u| (u.id.clone(), u))
            .collect();

        let by_id: HashMap<&str, &vidtube_db::entities::comment::Model> =
            comments.iter().map(|c| (c.id.as_str(), c)).collect();

        let items = likes
            .iter()
            .filter_map(|l| {
                let comment = by_id.get(l.comment_id.as_deref()?)?;
                let owner = owners.get(&comment.owner_id)?;
                let count = counts.get(&comment.id).copied().unwrap_or(0);
                Some(CommentView::new(comment, owner, count, true))
            })
            .collect();

        Ok(Page::new(items, request, total))
    }

    fn blank_like(&self, viewer_id: &str) -> like::ActiveModel {
        like::ActiveModel {
            id: Set(self.id_gen.generate()),
            liked_by_id: Set(viewer_id.to_string()),
            video_id: Set(None),
            comment_id: Set(None),
            tweet_id: Set(None),
            created_at: Set(Utc::now().into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use maplit::btreemap;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, Value};
    use std::collections::BTreeMap;
    use std::sync::Arc;
    use vidtube_db::entities::video;

    fn test_service(db: Arc<sea_orm::DatabaseConnection>) -> LikeService {
        LikeService::new(
            LikeRepository::new(db.clone()),
            VideoRepository::new(db.clone()),
            CommentRepository::new(db.clone()),
            TweetRepository::new(db.clone()),
            UserRepository::new(db),
        )
    }

    fn count_row(n: i64) -> Vec<BTreeMap<&'static str, Value>> {
        vec![btreemap! { "num_items" => Value::BigInt(Some(n)) }]
    }

    fn create_test_user(id: &str) -> user::Model {
        user::Model {
            id: id.to_string(),
            username: format!("user_{id}"),
            email: format!("{id}@example.com"),
            full_name: "Test User".to_string(),
            password_hash: "hash".to_string(),
            avatar_url: None,
            avatar_key: None,
            cover_url: None,
            cover_key: None,
            watch_history_enabled: true,
            refresh_token: None,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn create_test_video(id: &str, owner_id: &str, published: bool) -> video::Model {
        video::Model {
            id: id.to_string(),
            video_url: "https://files.example/v.mp4".to_string(),
            video_key: "v.mp4".to_string(),
            thumbnail_url: "https://files.example/t.jpg".to_string(),
            thumbnail_key: "t.jpg".to_string(),
            title: "Test".to_string(),
            description: String::new(),
            duration_secs: 10.0,
            views: 0,
            is_published: published,
            owner_id: owner_id.to_string(),
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn create_video_like(id: &str, liked_by_id: &str, video_id: &str) -> like::Model {
        like::Model {
            id: id.to_string(),
            liked_by_id: liked_by_id.to_string(),
            video_id: Some(video_id.to_string()),
            comment_id: None,
            tweet_id: None,
            created_at: Utc::now().into(),
        }
    }

    const VIDEO_ID: &str = "01arz3ndektsv4rrffq69g5fav";

    #[tokio::test]
    async fn test_toggle_video_removes_existing_like() {
        let video = create_test_video(VIDEO_ID, "u1", true);
        let existing = create_video_like("l1", "u2", VIDEO_ID);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[video]])
                .append_query_results([[existing]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );

        let service = test_service(db);
        let liked = service.toggle_video("u2", VIDEO_ID).await.unwrap();

        assert!(!liked);
    }

    #[tokio::test]
    async fn test_toggle_video_creates_when_absent() {
        let video = create_test_video(VIDEO_ID, "u1", true);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[video]])
                .append_query_results([Vec::<like::Model>::new()])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );

        let service = test_service(db);
        let liked = service.toggle_video("u2", VIDEO_ID).await.unwrap();

        assert!(liked);
    }

    #[tokio::test]
    async fn test_toggle_video_missing_target() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<video::Model>::new()])
                .into_connection(),
        );

        let service = test_service(db);
        let err = service.toggle_video("u2", VIDEO_ID).await.unwrap_err();

        assert!(matches!(err, AppError::VideoNotFound(_)));
    }

    #[tokio::test]
    async fn test_liked_videos_filters_unpublished_but_counts_rows() {
        let likes = vec![
            create_video_like("l2", "u9", "v2"),
            create_video_like("l1", "u9", "v1"),
        ];
        // v1 has been unpublished since it was liked: the published-only
        // batch fetch only returns v2.
        let videos = vec![create_test_video("v2", "u1", true)];
        let owners = vec![create_test_user("u1")];

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([likes])
                .append_query_results([count_row(2)])
                .append_query_results([videos])
                .append_query_results([owners])
                .into_connection(),
        );

        let service = test_service(db);
        let page = service
            .liked_videos("u9", PageRequest::default())
            .await
            .unwrap();

        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].id, "v2");
        assert_eq!(page.total_items, 2);
    }
}
