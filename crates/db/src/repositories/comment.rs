//! Comment repository.

use std::collections::HashMap;
use std::sync::Arc;

use crate::entities::{comment, Comment};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect,
};
use vidtube_common::{AppError, AppResult};

/// Comment repository for database operations.
#[derive(Clone)]
pub struct CommentRepository {
    db: Arc<DatabaseConnection>,
}

impl CommentRepository {
    /// Create a new comment repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a comment by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<comment::Model>> {
        Comment::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Batch-fetch comments by ID.
    pub async fn find_by_ids(&self, ids: &[String]) -> AppResult<Vec<comment::Model>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        Comment::find()
            .filter(comment::Column::Id.is_in(ids.iter().map(String::as_str)))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new comment.
    pub async fn create(&self, model: comment::ActiveModel) -> AppResult<comment::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Apply an update to a comment.
    pub async fn update(&self, model: comment::ActiveModel) -> AppResult<comment::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a comment row.
    pub async fn delete(&self, model: comment::Model) -> AppResult<()> {
        model
            .delete(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Page of a video's comments, newest first.
    pub async fn page_by_video(
        &self,
        video_id: &str,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<comment::Model>> {
        Comment::find()
            .filter(comment::Column::VideoId.eq(video_id))
            .order_by_desc(comment::Column::CreatedAt)
            .limit(limit)
            .offset(offset)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count a video's comments.
    pub async fn count_by_video(&self, video_id: &str) -> AppResult<u64> {
        Comment::find()
            .filter(comment::Column::VideoId.eq(video_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// IDs of all comments on a video (cascade prelude).
    pub async fn ids_by_video(&self, video_id: &str) -> AppResult<Vec<String>> {
        Comment::find()
            .select_only()
            .column(comment::Column::Id)
            .filter(comment::Column::VideoId.eq(video_id))
            .into_tuple()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete all comments on a video (cascade).
    pub async fn delete_by_video(&self, video_id: &str) -> AppResult<()> {
        Comment::delete_many()
            .filter(comment::Column::VideoId.eq(video_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Comment counts per video, grouped (dashboard).
    pub async fn counts_for_videos(&self, video_ids: &[String]) -> AppResult<HashMap<String, u64>> {
        if video_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows: Vec<(String, i64)> = Comment::find()
            .select_only()
            .column(comment::Column::VideoId)
            .column_as(comment::Column::Id.count(), "count")
            .filter(comment::Column::VideoId.is_in(video_ids.iter().map(String::as_str)))
            .group_by(comment::Column::VideoId)
            .into_tuple()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(rows
            .into_iter()
            .map(|(id, count)| (id, count.max(0) as u64))
            .collect())
    }
}
