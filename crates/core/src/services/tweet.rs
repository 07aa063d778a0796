//! Tweet service.

use std::collections::HashMap;

use chrono::Utc;
use sea_orm::Set;
use vidtube_common::{validate_id, AppError, AppResult, IdGenerator, Page, PageRequest};
use vidtube_db::{
    entities::{tweet, user},
    repositories::{LikeRepository, TweetRepository, UserRepository},
};

use crate::services::assert_owner;
use crate::views::TweetView;

/// Tweet service for business logic.
#[derive(Clone)]
pub struct TweetService {
    tweet_repo: TweetRepository,
    user_repo: UserRepository,
    like_repo: LikeRepository,
    id_gen: IdGenerator,
}

impl TweetService {
    /// Create a new tweet service.
    #[must_use]
    pub fn new(
        tweet_repo: TweetRepository,
        user_repo: UserRepository,
        like_repo: LikeRepository,
    ) -> Self {
        Self {
            tweet_repo,
            user_repo,
            like_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Post a tweet.
    pub async fn create(&self, viewer: &user::Model, content: &str) -> AppResult<tweet::Model> {
        let model = tweet::ActiveModel {
            id: Set(self.id_gen.generate()),
            content: Set(content.to_string()),
            owner_id: Set(viewer.id.clone()),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        };
        self.tweet_repo.create(model).await
    }

    /// Page of a user's tweets, newest first, with like counts and the
    /// viewer's like state.
    pub async fn by_user(
        &self,
        user_id: &str,
        viewer_id: Option<&str>,
        request: PageRequest,
    ) -> AppResult<Page<TweetView>> {
        validate_id(user_id, "user")?;

        let owner = self
            .user_repo
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::UserNotFound(user_id.to_string()))?;

        let request = request.normalized();
        let tweets = self
            .tweet_repo
            .page_by_owner(user_id, request.limit, request.offset())
            .await?;
        let total = self.tweet_repo.count_by_owner(user_id).await?;

        let tweet_ids: Vec<String> = tweets.iter().map(|t| t.id.clone()).collect();
        let counts = self.like_repo.counts_for_tweets(&tweet_ids).await?;
        let liked = match viewer_id {
            Some(viewer_id) => self.like_repo.liked_tweet_ids(viewer_id, &tweet_ids).await?,
            None => std::collections::HashSet::new(),
        };

        let owners: HashMap<String, &user::Model> =
            std::iter::once((owner.id.clone(), &owner)).collect();

        let items = tweets
            .iter()
            .filter_map(|t| {
                owners.get(&t.owner_id).map(|o| {
                    TweetView::new(
                        t,
                        o,
                        counts.get(&t.id).copied().unwrap_or(0),
                        liked.contains(&t.id),
                    )
                })
            })
            .collect();

        Ok(Page::new(items, request, total))
    }

    /// Edit a tweet's content. Owner only.
    pub async fn update(
        &self,
        viewer_id: &str,
        tweet_id: &str,
        content: &str,
    ) -> AppResult<tweet::Model> {
        validate_id(tweet_id, "tweet")?;

        let tweet = self
            .tweet_repo
            .find_by_id(tweet_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Tweet {tweet_id}")))?;

        assert_owner(&tweet.owner_id, viewer_id)?;

        let mut active: tweet::ActiveModel = tweet.into();
        active.content = Set(content.to_string());
        active.updated_at = Set(Some(Utc::now().into()));
        self.tweet_repo.update(active).await
    }

    /// Delete a tweet and its likes, children first. Owner only.
    pub async fn delete(&self, viewer_id: &str, tweet_id: &str) -> AppResult<()> {
        validate_id(tweet_id, "tweet")?;

        let tweet = self
            .tweet_repo
            .find_by_id(tweet_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Tweet {tweet_id}")))?;

        assert_owner(&tweet.owner_id, viewer_id)?;

        self.like_repo.delete_by_tweet(&tweet.id).await?;
        self.tweet_repo.delete(tweet).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use maplit::btreemap;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, Value};
    use std::collections::BTreeMap;
    use std::sync::Arc;

    fn test_service(db: Arc<sea_orm::DatabaseConnection>) -> TweetService {
        TweetService::new(
            TweetRepository::new(db.clone()),
            UserRepository::new(db.clone()),
            LikeRepository::new(db),
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

    fn create_test_tweet(id: &str, owner_id: &str) -> tweet::Model {
        tweet::Model {
            id: id.to_string(),
            content: "hello".to_string(),
            owner_id: owner_id.to_string(),
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    const USER_ID: &str = "01arz3ndektsv4rrffq69g5fav";
    const TWEET_ID: &str = "01arz3ndektsv4rrffq69g5fb0";

    #[tokio::test]
    async fn test_by_user_composes_like_state() {
        let owner = create_test_user(USER_ID);
        let tweets = vec![
            create_test_tweet("t2", USER_ID),
            create_test_tweet("t1", USER_ID),
        ];

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[owner]])
                .append_query_results([tweets])
                .append_query_results([count_row(2)])
                // MockRow hands values back in key order, so the count
                // key must sort after the id key.
                .append_query_results([vec![btreemap! {
                    "tweet_id" => Value::String(Some(Box::new("t2".to_string()))),
                    "tweet_likes" => Value::BigInt(Some(3)),
                }]])
                .append_query_results([vec![btreemap! {
                    "tweet_id" => Value::String(Some(Box::new("t2".to_string()))),
                }]])
                .into_connection(),
        );

        let service = test_service(db);
        let page = service
            .by_user(USER_ID, Some("u9"), PageRequest::default())
            .await
            .unwrap();

        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[0].likes_count, 3);
        assert!(page.items[0].is_liked);
        assert!(!page.items[1].is_liked);
    }

    #[tokio::test]
    async fn test_update_rejects_non_owner() {
        let tweet = create_test_tweet(TWEET_ID, "u1");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[tweet]])
                .into_connection(),
        );

        let service = test_service(db);
        let err = service.update("u2", TWEET_ID, "edit").await.unwrap_err();

        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_delete_cascades_likes_first() {
        let tweet = create_test_tweet(TWEET_ID, "u1");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[tweet]])
                .append_exec_results([
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 2,
                    },
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 1,
                    },
                ])
                .into_connection(),
        );

        let service = test_service(db);
        service.delete("u1", TWEET_ID).await.unwrap();
    }
}
