//! Video repository.

use std::sync::Arc;

use crate::entities::{video, Video};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect,
};
use vidtube_common::{AppError, AppResult};

/// Video repository for database operations.
#[derive(Clone)]
pub struct VideoRepository {
    db: Arc<DatabaseConnection>,
}

impl VideoRepository {
    /// Create a new video repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a video by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<video::Model>> {
        Video::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Batch-fetch videos by ID, published or not.
    pub async fn find_by_ids(&self, ids: &[String]) -> AppResult<Vec<video::Model>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        Video::find()
            .filter(video::Column::Id.is_in(ids.iter().map(String::as_str)))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Batch-fetch published videos by ID.
    pub async fn find_published_by_ids(&self, ids: &[String]) -> AppResult<Vec<video::Model>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        Video::find()
            .filter(video::Column::Id.is_in(ids.iter().map(String::as_str)))
            .filter(video::Column::IsPublished.eq(true))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new video.
    pub async fn create(&self, model: video::ActiveModel) -> AppResult<video::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Apply an update to a video.
    pub async fn update(&self, model: video::ActiveModel) -> AppResult<video::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a video row.
    pub async fn delete(&self, model: video::Model) -> AppResult<()> {
        model
            .delete(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Bump the stored view counter by one.
    pub async fn increment_views(&self, id: &str) -> AppResult<()> {
        Video::update_many()
            .col_expr(
                video::Column::Views,
                Expr::col(video::Column::Views).add(1),
            )
            .filter(video::Column::Id.eq(id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Page of an owner's videos, published or not, newest first.
    pub async fn page_by_owner(
        &self,
        owner_id: &str,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<video::Model>> {
        Video::find()
            .filter(video::Column::OwnerId.eq(owner_id))
            .order_by_desc(video::Column::CreatedAt)
            .limit(limit)
            .offset(offset)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count an owner's videos, published or not.
    pub async fn count_by_owner(&self, owner_id: &str) -> AppResult<u64> {
        Video::find()
            .filter(video::Column::OwnerId.eq(owner_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Sum of stored view counters across an owner's videos.
    pub async fn sum_views_by_owner(&self, owner_id: &str) -> AppResult<i64> {
        let total: Option<i64> = Video::find()
            .select_only()
            .column_as(video::Column::Views.sum(), "total")
            .filter(video::Column::OwnerId.eq(owner_id))
            .into_tuple()
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
            .flatten();

        Ok(total.unwrap_or(0))
    }

    /// IDs of all of an owner's videos.
    pub async fn ids_by_owner(&self, owner_id: &str) -> AppResult<Vec<String>> {
        Video::find()
            .select_only()
            .column(video::Column::Id)
            .filter(video::Column::OwnerId.eq(owner_id))
            .into_tuple()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn create_test_video(id: &str, owner_id: &str, published: bool) -> video::Model {
        video::Model {
            id: id.to_string(),
            video_url: format!("https://files.example/{id}.mp4"),
            video_key: format!("{id}.mp4"),
            thumbnail_url: format!("https://files.example/{id}.jpg"),
            thumbnail_key: format!("{id}.jpg"),
            title: "Test Video".to_string(),
            description: "A test video".to_string(),
            duration_secs: 12.5,
            views: 0,
            is_published: published,
            owner_id: owner_id.to_string(),
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_find_by_id_found() {
        let video = create_test_video("v1", "u1", true);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[video.clone()]])
                .into_connection(),
        );

        let repo = VideoRepository::new(db);
        let result = repo.find_by_id("v1").await.unwrap();

        assert!(result.is_some());
        assert_eq!(result.unwrap().owner_id, "u1");
    }

    #[tokio::test]
    async fn test_find_published_by_ids_empty_input_skips_query() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres).into_connection(),
        );

        let repo = VideoRepository::new(db);
        let result = repo.find_published_by_ids(&[]).await.unwrap();

        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_page_by_owner() {
        let videos = vec![
            create_test_video("v2", "u1", true),
            create_test_video("v1", "u1", false),
        ];

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([videos])
                .into_connection(),
        );

        let repo = VideoRepository::new(db);
        let result = repo.page_by_owner("u1", 10, 0).await.unwrap();

        assert_eq!(result.len(), 2);
        // Unpublished rows are included; the dashboard needs them.
        assert!(!result[1].is_published);
    }
}
