//! Like repository.
//!
//! A like row targets exactly one of video / comment / tweet. Inserts go
//! through `ON CONFLICT DO NOTHING` against the per-target unique
//! indexes, so a racing duplicate toggle degrades to "already present".

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::entities::{like, Like};
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect,
};
use vidtube_common::{AppError, AppResult};

/// Like repository for database operations.
#[derive(Clone)]
pub struct LikeRepository {
    db: Arc<DatabaseConnection>,
}

impl LikeRepository {
    /// Create a new like repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a user's like on a video.
    pub async fn find_video_like(
        &self,
        liked_by_id: &str,
        video_id: &str,
    ) -> AppResult<Option<like::Model>> {
        Like::find()
            .filter(like::Column::LikedById.eq(liked_by_id))
            .filter(like::Column::VideoId.eq(video_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a user's like on a comment.
    pub async fn find_comment_like(
        &self,
        liked_by_id: &str,
        comment_id: &str,
    ) -> AppResult<Option<like::Model>> {
        Like::find()
            .filter(like::Column::LikedById.eq(liked_by_id))
            .filter(like::Column::CommentId.eq(comment_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a user's like on a tweet.
    pub async fn find_tweet_like(
        &self,
        liked_by_id: &str,
        tweet_id: &str,
    ) -> AppResult<Option<like::Model>> {
        Like::find()
            .filter(like::Column::LikedById.eq(liked_by_id))
            .filter(like::Column::TweetId.eq(tweet_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Insert a video like; a concurrent duplicate is a no-op.
    pub async fn create_video_like(&self, model: like::ActiveModel) -> AppResult<()> {
        Like::insert(model)
            .on_conflict(
                OnConflict::columns([like::Column::LikedById, like::Column::VideoId])
                    .target_and_where(Expr::col(like::Column::VideoId).is_not_null())
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Insert a comment like; a concurrent duplicate is a no-op.
    pub async fn create_comment_like(&self, model: like::ActiveModel) -> AppResult<()> {
        Like::insert(model)
            .on_conflict(
                OnConflict::columns([like::Column::LikedById, like::Column::CommentId])
                    .target_and_where(Expr::col(like::Column::CommentId).is_not_null())
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Insert a tweet like; a concurrent duplicate is a no-op.
    pub async fn create_tweet_like(&self, model: like::ActiveModel) -> AppResult<()> {
        Like::insert(model)
            .on_conflict(
                OnConflict::columns([like::Column::LikedById, like::Column::TweetId])
                    .target_and_where(Expr::col(like::Column::TweetId).is_not_null())
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Delete a like row.
    pub async fn delete(&self, model: like::Model) -> AppResult<()> {
        model
            .delete(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Count likes on a single video.
    pub async fn count_for_video(&self, video_id: &str) -> AppResult<u64> {
        Like::find()
            .filter(like::Column::VideoId.eq(video_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Like counts per video, grouped.
    pub async fn counts_for_videos(&self, video_ids: &[String]) -> AppResult<HashMap<String, u64>> {
        self.grouped_counts(like::Column::VideoId, video_ids).await
    }

    /// Like counts per comment, grouped.
    pub async fn counts_for_comments(
        &self,
        comment_ids: &[String],
    ) -> AppResult<HashMap<String, u64>> {
        self.grouped_counts(like::Column::CommentId, comment_ids).await
    }

    /// Like counts per tweet, grouped.
    pub async fn counts_for_tweets(&self, tweet_ids: &[String]) -> AppResult<HashMap<String, u64>> {
        self.grouped_counts(like::Column::TweetId, tweet_ids).await
    }

    /// Total likes across a set of videos (dashboard).
    pub async fn count_for_videos_total(&self, video_ids: &[String]) -> AppResult<u64> {
        if video_ids.is_empty() {
            return Ok(0);
        }
        Like::find()
            .filter(like::Column::VideoId.is_in(video_ids.iter().map(String::as_str)))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Which of `video_ids` the viewer has liked.
    pub async fn liked_video_ids(
        &self,
        liked_by_id: &str,
        video_ids: &[String],
    ) -> AppResult<HashSet<String>> {
        self.liked_target_ids(like::Column::VideoId, liked_by_id, video_ids)
            .await
    }

    /// Which of `comment_ids` the viewer has liked.
    pub async fn liked_comment_ids(
        &self,
        liked_by_id: &str,
        comment_ids: &[String],
    ) -> AppResult<HashSet<String>> {
        self.liked_target_ids(like::Column::CommentId, liked_by_id, comment_ids)
            .await
    }

    /// Which of `tweet_ids` the viewer has liked.
    pub async fn liked_tweet_ids(
        &self,
        liked_by_id: &str,
        tweet_ids: &[String],
    ) -> AppResult<HashSet<String>> {
        self.liked_target_ids(like::Column::TweetId, liked_by_id, tweet_ids)
            .await
    }

    /// Page of the viewer's video likes, newest first.
    pub async fn video_likes_page(
        &self,
        liked_by_id: &str,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<like::Model>> {
        self.likes_page(like::Column::VideoId, liked_by_id, limit, offset)
            .await
    }

    /// Count of the viewer's video likes.
    pub async fn count_video_likes(&self, liked_by_id: &str) -> AppResult<u64> {
        self.count_likes(like::Column::VideoId, liked_by_id).await
    }

    /// Page of the viewer's comment likes, newest first.
    pub async fn comment_likes_page(
        &self,
        liked_by_id: &str,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<like::Model>> {
        self.likes_page(like::Column::CommentId, liked_by_id, limit, offset)
            .await
    }

    /// Count of the viewer's comment likes.
    pub async fn count_comment_likes(&self, liked_by_id: &str) -> AppResult<u64> {
        self.count_likes(like::Column::CommentId, liked_by_id).await
    }

    /// Page of the viewer's tweet likes, newest first.
    pub async fn tweet_likes_page(
        &self,
        liked_by_id: &str,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<like::Model>> {
        self.likes_page(like::Column::TweetId, liked_by_id, limit, offset)
            .await
    }

    /// Count of the viewer's tweet likes.
    pub async fn count_tweet_likes(&self, liked_by_id: &str) -> AppResult<u64> {
        self.count_likes(like::Column::TweetId, liked_by_id).await
    }

    /// Delete all likes on a video (cascade).
    pub async fn delete_by_video(&self, video_id: &str) -> AppResult<()> {
        Like::delete_many()
            .filter(like::Column::VideoId.eq(video_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Delete all likes on a comment (cascade).
    pub async fn delete_by_comment(&self, comment_id: &str) -> AppResult<()> {
        Like::delete_many()
            .filter(like::Column::CommentId.eq(comment_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Delete all likes on a set of comments (cascade).
    pub async fn delete_by_comments(&self, comment_ids: &[String]) -> AppResult<()> {
        if comment_ids.is_empty() {
            return Ok(());
        }
        Like::delete_many()
            .filter(like::Column::CommentId.is_in(comment_ids.iter().map(String::as_str)))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Delete all likes on a tweet (cascade).
    pub async fn delete_by_tweet(&self, tweet_id: &str) -> AppResult<()> {
        Like::delete_many()
            .filter(like::Column::TweetId.eq(tweet_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    async fn grouped_counts(
        &self,
        target: like::Column,
        ids: &[String],
    ) -> AppResult<HashMap<String, u64>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows: Vec<(Option<String>, i64)> = Like::find()
            .select_only()
            .column(target)
            .column_as(like::Column::Id.count(), "count")
            .filter(target.is_in(ids.iter().map(String::as_str)))
            .group_by(target)
            .into_tuple()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(rows
            .into_iter()
            .filter_map(|(id, count)| id.map(|id| (id, count.max(0) as u64)))
            .collect())
    }

    async fn liked_target_ids(
        &self,
        target: like::Column,
        liked_by_id: &str,
        ids: &[String],
    ) -> AppResult<HashSet<String>> {
        if ids.is_empty() {
            return Ok(HashSet::new());
        }

        let rows: Vec<Option<String>> = Like::find()
            .select_only()
            .column(target)
            .filter(like::Column::LikedById.eq(liked_by_id))
            .filter(target.is_in(ids.iter().map(String::as_str)))
            .into_tuple()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(rows.into_iter().flatten().collect())
    }

    async fn likes_page(
        &self,
        target: like::Column,
        liked_by_id: &str,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<like::Model>> {
        Like::find()
            .filter(like::Column::LikedById.eq(liked_by_id))
            .filter(target.is_not_null())
            .order_by_desc(like::Column::CreatedAt)
            .limit(limit)
            .offset(offset)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn count_likes(&self, target: like::Column, liked_by_id: &str) -> AppResult<u64> {
        Like::find()
            .filter(like::Column::LikedById.eq(liked_by_id))
            .filter(target.is_not_null())
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn create_video_like_model(id: &str, liked_by_id: &str, video_id: &str) -> like::Model {
        like::Model {
            id: id.to_string(),
            liked_by_id: liked_by_id.to_string(),
            video_id: Some(video_id.to_string()),
            comment_id: None,
            tweet_id: None,
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_find_video_like_found() {
        let like = create_video_like_model("l1", "u1", "v1");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[like.clone()]])
                .into_connection(),
        );

        let repo = LikeRepository::new(db);
        let result = repo.find_video_like("u1", "v1").await.unwrap();

        assert!(result.is_some());
        assert_eq!(result.unwrap().video_id.as_deref(), Some("v1"));
    }

    #[tokio::test]
    async fn test_find_video_like_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<like::Model>::new()])
                .into_connection(),
        );

        let repo = LikeRepository::new(db);
        let result = repo.find_video_like("u1", "v9").await.unwrap();

        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_counts_for_videos_empty_input_skips_query() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres).into_connection(),
        );

        let repo = LikeRepository::new(db);
        let result = repo.counts_for_videos(&[]).await.unwrap();

        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_liked_video_ids_empty_input_skips_query() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres).into_connection(),
        );

        let repo = LikeRepository::new(db);
        let result = repo.liked_video_ids("u1", &[]).await.unwrap();

        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_count_for_videos_total_empty_input() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres).into_connection(),
        );

        let repo = LikeRepository::new(db);
        let result = repo.count_for_videos_total(&[]).await.unwrap();

        assert_eq!(result, 0);
    }
}
