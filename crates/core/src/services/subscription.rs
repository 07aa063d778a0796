//! Subscription service.

use std::collections::HashMap;

use chrono::Utc;
use sea_orm::Set;
use vidtube_common::{validate_id, AppError, AppResult, IdGenerator, Page, PageRequest};
use vidtube_db::{
    entities::{subscription, user},
    repositories::{SubscriptionRepository, UserRepository},
};

use crate::views::{SubscriberView, SubscriptionCounts};

/// Subscription service for business logic.
#[derive(Clone)]
pub struct SubscriptionService {
    subscription_repo: SubscriptionRepository,
    user_repo: UserRepository,
    id_gen: IdGenerator,
}

impl SubscriptionService {
    /// Create a new subscription service.
    #[must_use]
    pub fn new(subscription_repo: SubscriptionRepository, user_repo: UserRepository) -> Self {
        Self {
            subscription_repo,
            user_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Toggle the viewer's subscription to a channel; returns the new
    /// state.
    pub async fn toggle(&self, viewer_id: &str, channel_id: &str) -> AppResult<bool> {
        validate_id(channel_id, "channel")?;

        self.user_repo
            .find_by_id(channel_id)
            .await?
            .ok_or_else(|| AppError::UserNotFound(channel_id.to_string()))?;

        if let Some(existing) = self.subscription_repo.find_pair(viewer_id, channel_id).await? {
            self.subscription_repo.delete(existing).await?;
            return Ok(false);
        }

        let model = subscription::ActiveModel {
            id: Set(self.id_gen.generate()),
            subscriber_id: Set(viewer_id.to_string()),
            channel_id: Set(channel_id.to_string()),
            created_at: Set(Utc::now().into()),
        };
        self.subscription_repo.create(model).await?;
        Ok(true)
    }

    /// Page of a channel's subscribers, newest first, each enriched with
    /// their own subscriber count and the viewer's subscription state.
    pub async fn subscribers(
        &self,
        channel_id: &str,
        viewer_id: Option<&str>,
        request: PageRequest,
    ) -> AppResult<Page<SubscriberView>> {
        validate_id(channel_id, "channel")?;

        self.user_repo
            .find_by_id(channel_id)
            .await?
            .ok_or_else(|| AppError::UserNotFound(channel_id.to_string()))?;

        let request = request.normalized();
        let rows = self
            .subscription_repo
            .subscribers_page(channel_id, request.limit, request.offset())
            .await?;
        let total = self.subscription_repo.count_subscribers(channel_id).await?;

        let user_ids: Vec<String> = rows.iter().map(|r| r.subscriber_id.clone()).collect();
        let items = self.enrich_users(&user_ids, viewer_id).await?;

        Ok(Page::new(items, request, total))
    }

    /// Page of the channels a user subscribes to, newest first.
    pub async fn subscribed_channels(
        &self,
        subscriber_id: &str,
        viewer_id: Option<&str>,
        request: PageRequest,
    ) -> AppResult<Page<SubscriberView>> {
        validate_id(subscriber_id, "user")?;

        self.user_repo
            .find_by_id(subscriber_id)
            .await?
            .ok_or_else(|| AppError::UserNotFound(subscriber_id.to_string()))?;

        let request = request.normalized();
        let rows = self
            .subscription_repo
            .channels_page(subscriber_id, request.limit, request.offset())
            .await?;
        let total = self
            .subscription_repo
            .count_subscriptions(subscriber_id)
            .await?;

        let user_ids: Vec<String> = rows.iter().map(|r| r.channel_id.clone()).collect();
        let items = self.enrich_users(&user_ids, viewer_id).await?;

        Ok(Page::new(items, request, total))
    }

    /// A channel's subscription counters, viewer-relative.
    pub async fn counts(
        &self,
        channel_id: &str,
        viewer_id: Option<&str>,
    ) -> AppResult<SubscriptionCounts> {
        validate_id(channel_id, "channel")?;

        self.user_repo
            .find_by_id(channel_id)
            .await?
            .ok_or_else(|| AppError::UserNotFound(channel_id.to_string()))?;

        let subscribers_count = self.subscription_repo.count_subscribers(channel_id).await?;
        let subscribed_to_count = self
            .subscription_repo
            .count_subscriptions(channel_id)
            .await?;
        let is_subscribed = match viewer_id {
            Some(viewer_id) => self
                .subscription_repo
                .find_pair(viewer_id, channel_id)
                .await?
                .is_some(),
            None => false,
        };

        Ok(SubscriptionCounts {
            subscribers_count,
            subscribed_to_count,
            is_subscribed,
        })
    }

    /// `user_ids` is parallel to the subscription rows it was projected
    /// from, so iterating it preserves row order.
    async fn enrich_users(
        &self,
        user_ids: &[String],
        viewer_id: Option<&str>,
    ) -> AppResult<Vec<SubscriberView>> {
        let users: HashMap<String, user::Model> = self
            .user_repo
            .find_by_ids(user_ids)
            .await?
            .into_iter()
            .map(|u| (u.id.clone(), u))
            .collect();
        let counts = self.subscription_repo.counts_for_channels(user_ids).await?;
        let subscribed = match viewer_id {
            Some(viewer_id) => self
                .subscription_repo
                .subscribed_channel_ids(viewer_id, user_ids)
                .await?,
            None => std::collections::HashSet::new(),
        };

        // Rows pointing at deleted users drop out.
        Ok(user_ids
            .iter()
            .filter_map(|id| {
                let user = users.get(id)?;
                Some(SubscriberView {
                    id: user.id.clone(),
                    username: user.username.clone(),
                    full_name: user.full_name.clone(),
                    avatar_url: user.avatar_url.clone(),
                    subscribers_count: counts.get(&user.id).copied().unwrap_or(0),
                    is_subscribed: subscribed.contains(&user.id),
                })
            })
            .collect())
    }
}
