//! Watch-history repository.

use std::sync::Arc;

use crate::entities::{watch_history, WatchHistory};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect,
};
use vidtube_common::{AppError, AppResult};

/// Watch-history repository for database operations.
#[derive(Clone)]
pub struct WatchHistoryRepository {
    db: Arc<DatabaseConnection>,
}

impl WatchHistoryRepository {
    /// Create a new watch-history repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a watch-history entry by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<watch_history::Model>> {
        WatchHistory::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Record a watch event.
    pub async fn create(&self, model: watch_history::ActiveModel) -> AppResult<watch_history::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a single entry.
    pub async fn delete(&self, model: watch_history::Model) -> AppResult<()> {
        model
            .delete(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Delete all of a user's entries.
    pub async fn delete_by_user(&self, watched_by_id: &str) -> AppResult<()> {
        WatchHistory::delete_many()
            .filter(watch_history::Column::WatchedById.eq(watched_by_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Page of a user's watch events, newest first.
    pub async fn page_by_user(
        &self,
        watched_by_id: &str,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<watch_history::Model>> {
        WatchHistory::find()
            .filter(watch_history::Column::WatchedById.eq(watched_by_id))
            .order_by_desc(watch_history::Column::CreatedAt)
            .limit(limit)
            .offset(offset)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count a user's watch events.
    pub async fn count_by_user(&self, watched_by_id: &str) -> AppResult<u64> {
        WatchHistory::find()
            .filter(watch_history::Column::WatchedById.eq(watched_by_id))
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

    fn create_test_entry(id: &str, watched_by_id: &str, video_id: &str) -> watch_history::Model {
        watch_history::Model {
            id: id.to_string(),
            watched_by_id: watched_by_id.to_string(),
            video_id: video_id.to_string(),
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_find_by_id_found() {
        let entry = create_test_entry("w1", "u1", "v1");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[entry.clone()]])
                .into_connection(),
        );

        let repo = WatchHistoryRepository::new(db);
        let result = repo.find_by_id("w1").await.unwrap();

        assert!(result.is_some());
        assert_eq!(result.unwrap().watched_by_id, "u1");
    }

    #[tokio::test]
    async fn test_page_by_user() {
        let entries = vec![
            create_test_entry("w2", "u1", "v2"),
            create_test_entry("w1", "u1", "v1"),
        ];

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([entries])
                .into_connection(),
        );

        let repo = WatchHistoryRepository::new(db);
        let result = repo.page_by_user("u1", 10, 0).await.unwrap();

        assert_eq!(result.len(), 2);
    }
}
