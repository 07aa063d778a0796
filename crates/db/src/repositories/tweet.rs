//! Tweet repository.

use std::sync::Arc;

use crate::entities::{tweet, Tweet};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect,
};
use vidtube_common::{AppError, AppResult};

/// Tweet repository for database operations.
#[derive(Clone)]
pub struct TweetRepository {
    db: Arc<DatabaseConnection>,
}

impl TweetRepository {
    /// Create a new tweet repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a tweet by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<tweet::Model>> {
        Tweet::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Batch-fetch tweets by ID.
    pub async fn find_by_ids(&self, ids: &[String]) -> AppResult<Vec<tweet::Model>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        Tweet::find()
            .filter(tweet::Column::Id.is_in(ids.iter().map(String::as_str)))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new tweet.
    pub async fn create(&self, model: tweet::ActiveModel) -> AppResult<tweet::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Apply an update to a tweet.
    pub async fn update(&self, model: tweet::ActiveModel) -> AppResult<tweet::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a tweet row.
    pub async fn delete(&self, model: tweet::Model) -> AppResult<()> {
        model
            .delete(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Page of a user's tweets, newest first.
    pub async fn page_by_owner(
        &self,
        owner_id: &str,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<tweet::Model>> {
        Tweet::find()
            .filter(tweet::Column::OwnerId.eq(owner_id))
            .order_by_desc(tweet::Column::CreatedAt)
            .limit(limit)
            .offset(offset)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count a user's tweets.
    pub async fn count_by_owner(&self, owner_id: &str) -> AppResult<u64> {
        Tweet::find()
            .filter(tweet::Column::OwnerId.eq(owner_id))
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

    fn create_test_tweet(id: &str, owner_id: &str) -> tweet::Model {
        tweet::Model {
            id: id.to_string(),
            content: "hello world".to_string(),
            owner_id: owner_id.to_string(),
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_find_by_id_found() {
        let tweet = create_test_tweet("t1", "u1");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[tweet.clone()]])
                .into_connection(),
        );

        let repo = TweetRepository::new(db);
        let result = repo.find_by_id("t1").await.unwrap();

        assert!(result.is_some());
        assert_eq!(result.unwrap().owner_id, "u1");
    }

    #[tokio::test]
    async fn test_page_by_owner() {
        let tweets = vec![create_test_tweet("t2", "u1"), create_test_tweet("t1", "u1")];

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([tweets])
                .into_connection(),
        );

        let repo = TweetRepository::new(db);
        let result = repo.page_by_owner("u1", 10, 0).await.unwrap();

        assert_eq!(result.len(), 2);
    }
}
