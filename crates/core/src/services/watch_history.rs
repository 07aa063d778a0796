//! Watch-history service.
//!
//! Appending happens inside the video fetch (see the video service);
//! this service covers listing and deletion.

use std::collections::HashMap;

use vidtube_common::{validate_id, AppError, AppResult, Page, PageRequest};
use vidtube_db::{
    entities::user,
    repositories::{UserRepository, VideoRepository, WatchHistoryRepository},
};

use crate::views::{VideoCard, WatchHistoryEntry};

/// Watch-history service for business logic.
#[derive(Clone)]
pub struct WatchHistoryService {
    watch_history_repo: WatchHistoryRepository,
    video_repo: VideoRepository,
    user_repo: UserRepository,
}

impl WatchHistoryService {
    /// Create a new watch-history service.
    #[must_use]
    pub const fn new(
        watch_history_repo: WatchHistoryRepository,
        video_repo: VideoRepository,
        user_repo: UserRepository,
    ) -> Self {
        Self {
            watch_history_repo,
            video_repo,
            user_repo,
        }
    }

    /// Page of the viewer's watch events, newest first, joined to the
    /// videos that are still published. Events for deleted or
    /// unpublished videos are filtered out; `total_items` counts the
    /// raw event rows.
    pub async fn list(
        &self,
        viewer_id: &str,
        request: PageRequest,
    ) -> AppResult<Page<WatchHistoryEntry>> {
        let request = request.normalized();
        let events = self
            .watch_history_repo
            .page_by_user(viewer_id, request.limit, request.offset())
            .await?;
        let total = self.watch_history_repo.count_by_user(viewer_id).await?;

        let video_ids: Vec<String> = events.iter().map(|e| e.video_id.clone()).collect();
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

        let items = events
            .iter()
            .filter_map(|e| {
                let video = by_id.get(e.video_id.as_str())?;
                let owner = owners.get(&video.owner_id)?;
                Some(WatchHistoryEntry::new(
                    e.id.clone(),
                    &e.created_at,
                    VideoCard::new(video, owner),
                ))
            })
            .collect();

        Ok(Page::new(items, request, total))
    }

    /// Delete one watch event. Only its owner may remove it.
    pub async fn delete_one(&self, viewer_id: &str, entry_id: &str) -> AppResult<()> {
        validate_id(entry_id, "watch history entry")?;

        let entry = self
            .watch_history_repo
            .find_by_id(entry_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Watch history entry {entry_id}")))?;

        if entry.watched_by_id != viewer_id {
            return Err(AppError::Forbidden(
                "You do not own this watch history entry".to_string(),
            ));
        }

        self.watch_history_repo.delete(entry).await
    }

    /// Clear the viewer's entire history.
    pub async fn clear(&self, viewer_id: &str) -> AppResult<()> {
        self.watch_history_repo.delete_by_user(viewer_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use maplit::btreemap;
    use sea_orm::{DatabaseBackend, MockDatabase, Value};
    use std::collections::BTreeMap;
    use std::sync::Arc;
    use vidtube_db::entities::{video, watch_history};

    fn test_service(db: Arc<sea_orm::DatabaseConnection>) -> WatchHistoryService {
        WatchHistoryService::new(
            WatchHistoryRepository::new(db.clone()),
            VideoRepository::new(db.clone()),
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

    fn create_test_event(id: &str, watched_by_id: &str, video_id: &str) -> watch_history::Model {
        watch_history::Model {
            id: id.to_string(),
            watched_by_id: watched_by_id.to_string(),
            video_id: video_id.to_string(),
            created_at: Utc::now().into(),
        }
    }

    const ENTRY_ID: &str = "01arz3ndektsv4rrffq69g5fav";

    #[tokio::test]
    async fn test_list_filters_deleted_videos() {
        let events = vec![
            create_test_event("w2", "u1", "v2"),
            create_test_event("w1", "u1", "v1"),
        ];
        // v1 was deleted after being watched.
        let videos = vec![create_test_video("v2", "u9", true)];
        let owners = vec![create_test_user("u9")];

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([events])
                .append_query_results([count_row(2)])
                .append_query_results([videos])
                .append_query_results([owners])
                .into_connection(),
        );

        let service = test_service(db);
        let page = service.list("u1", PageRequest::default()).await.unwrap();

        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].video.id, "v2");
        assert_eq!(page.total_items, 2);
    }

    #[tokio::test]
    async fn test_delete_one_rejects_other_users_entry() {
        let entry = create_test_event(ENTRY_ID, "u1", "v1");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[entry]])
                .into_connection(),
        );

        let service = test_service(db);
        let err = service.delete_one("u2", ENTRY_ID).await.unwrap_err();

        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_delete_one_missing_entry() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<watch_history::Model>::new()])
                .into_connection(),
        );

        let service = test_service(db);
        let err = service.delete_one("u1", ENTRY_ID).await.unwrap_err();

        assert!(matches!(err, AppError::NotFound(_)));
    }
}
