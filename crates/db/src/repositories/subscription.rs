//! Subscription repository.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::entities::{subscription, Subscription};
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect,
};
use vidtube_common::{AppError, AppResult};

/// Subscription repository for database operations.
#[derive(Clone)]
pub struct SubscriptionRepository {
    db: Arc<DatabaseConnection>,
}

impl SubscriptionRepository {
    /// Create a new subscription repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a subscription by subscriber and channel.
    pub async fn find_pair(
        &self,
        subscriber_id: &str,
        channel_id: &str,
    ) -> AppResult<Option<subscription::Model>> {
        Subscription::find()
            .filter(subscription::Column::SubscriberId.eq(subscriber_id))
            .filter(subscription::Column::ChannelId.eq(channel_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Insert a subscription; a concurrent duplicate is a no-op.
    pub async fn create(&self, model: subscription::ActiveModel) -> AppResult<()> {
        Subscription::insert(model)
            .on_conflict(
                OnConflict::columns([
                    subscription::Column::SubscriberId,
                    subscription::Column::ChannelId,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Delete a subscription row.
    pub async fn delete(&self, model: subscription::Model) -> AppResult<()> {
        model
            .delete(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Count subscribers of a channel.
    pub async fn count_subscribers(&self, channel_id: &str) -> AppResult<u64> {
        Subscription::find()
            .filter(subscription::Column::ChannelId.eq(channel_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count channels a user subscribes to.
    pub async fn count_subscriptions(&self, subscriber_id: &str) -> AppResult<u64> {
        Subscription::find()
            .filter(subscription::Column::SubscriberId.eq(subscriber_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Page of a channel's subscriber rows, newest first.
    pub async fn subscribers_page(
        &self,
        channel_id: &str,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<subscription::Model>> {
        Subscription::find()
            .filter(subscription::Column::ChannelId.eq(channel_id))
            .order_by_desc(subscription::Column::CreatedAt)
            .limit(limit)
            .offset(offset)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Page of a user's subscribed-channel rows, newest first.
    pub async fn channels_page(
        &self,
        subscriber_id: &str,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<subscription::Model>> {
        Subscription::find()
            .filter(subscription::Column::SubscriberId.eq(subscriber_id))
            .order_by_desc(subscription::Column::CreatedAt)
            .limit(limit)
            .offset(offset)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Subscriber counts per channel, grouped.
    pub async fn counts_for_channels(
        &self,
        channel_ids: &[String],
    ) -> AppResult<HashMap<String, u64>> {
        if channel_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows: Vec<(String, i64)> = Subscription::find()
            .select_only()
            .column(subscription::Column::ChannelId)
            .column_as(subscription::Column::Id.count(), "count")
            .filter(subscription::Column::ChannelId.is_in(channel_ids.iter().map(String::as_str)))
            .group_by(subscription::Column::ChannelId)
            .into_tuple()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(rows
            .into_iter()
            .map(|(id, count)| (id, count.max(0) as u64))
            .collect())
    }

    /// Which of `channel_ids` the viewer subscribes to.
    pub async fn subscribed_channel_ids(
        &self,
        subscriber_id: &str,
        channel_ids: &[String],
    ) -> AppResult<HashSet<String>> {
        if channel_ids.is_empty() {
            return Ok(HashSet::new());
        }

        let rows: Vec<String> = Subscription::find()
            .select_only()
            .column(subscription::Column::ChannelId)
            .filter(subscription::Column::SubscriberId.eq(subscriber_id))
            .filter(subscription::Column::ChannelId.is_in(channel_ids.iter().map(String::as_str)))
            .into_tuple()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(rows.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn create_test_subscription(id: &str, subscriber_id: &str, channel_id: &str) -> subscription::Model {
        subscription::Model {
            id: id.to_string(),
            subscriber_id: subscriber_id.to_string(),
            channel_id: channel_id.to_string(),
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_find_pair_found() {
        let sub = create_test_subscription("s1", "u1", "u2");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[sub.clone()]])
                .into_connection(),
        );

        let repo = SubscriptionRepository::new(db);
        let result = repo.find_pair("u1", "u2").await.unwrap();

        assert!(result.is_some());
        assert_eq!(result.unwrap().channel_id, "u2");
    }

    #[tokio::test]
    async fn test_find_pair_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<subscription::Model>::new()])
                .into_connection(),
        );

        let repo = SubscriptionRepository::new(db);
        let result = repo.find_pair("u1", "u3").await.unwrap();

        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_counts_for_channels_empty_input_skips_query() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres).into_connection(),
        );

        let repo = SubscriptionRepository::new(db);
        let result = repo.counts_for_channels(&[]).await.unwrap();

        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_subscribed_channel_ids_empty_input_skips_query() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres).into_connection(),
        );

        let repo = SubscriptionRepository::new(db);
        let result = repo.subscribed_channel_ids("u1", &[]).await.unwrap();

        assert!(result.is_empty());
    }
}
