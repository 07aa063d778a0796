//! Comment service.

use std::collections::HashMap;

use chrono::Utc;
use sea_orm::Set;
use vidtube_common::{validate_id, AppError, AppResult, IdGenerator, Page, PageRequest};
use vidtube_db::{
    entities::{comment, user},
    repositories::{CommentRepository, LikeRepository, UserRepository, VideoRepository},
};

use crate::services::assert_owner;
use crate::views::CommentView;

/// Comment service for business logic.
#[derive(Clone)]
pub struct CommentService {
    comment_repo: CommentRepository,
    video_repo: VideoRepository,
    user_repo: UserRepository,
    like_repo: LikeRepository,
    id_gen: IdGenerator,
}

impl CommentService {
    /// Create a new comment service.
    #[must_use]
    pub fn new(
        comment_repo: CommentRepository,
        video_repo: VideoRepository,
        user_repo: UserRepository,
        like_repo: LikeRepository,
    ) -> Self {
        Self {
            comment_repo,
            video_repo,
            user_repo,
            like_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Add a comment to an existing video.
    pub async fn add(
        &self,
        viewer: &user::Model,
        video_id: &str,
        content: &str,
    ) -> AppResult<comment::Model> {
        validate_id(video_id, "video")?;

        self.video_repo
            .find_by_id(video_id)
            .await?
            .ok_or_else(|| AppError::VideoNotFound(video_id.to_string()))?;

        let model = comment::ActiveModel {
            id: Set(self.id_gen.generate()),
            content: Set(content.to_string()),
            video_id: Set(Some(video_id.to_string())),
            tweet_id: Set(None),
            owner_id: Set(viewer.id.clone()),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        };

        self.comment_repo.create(model).await
    }

    /// Page of a video's comments, newest first, each with its owner
    /// profile and viewer-relative like state.
    pub async fn list(
        &self,
        video_id: &str,
        viewer_id: Option<&str>,
        request: PageRequest,
    ) -> AppResult<Page<CommentView>> {
        validate_id(video_id, "video")?;

        self.video_repo
            .find_by_id(video_id)
            .await?
            .ok_or_else(|| AppError::VideoNotFound(video_id.to_string()))?;

        let request = request.normalized();
        let comments = self
            .comment_repo
            .page_by_video(video_id, request.limit, request.offset())
            .await?;
        let total = self.comment_repo.count_by_video(video_id).await?;

        let comment_ids: Vec<String> = comments.iter().map(|c| c.id.clone()).collect();
        let owner_ids: Vec<String> = comments.iter().map(|c| c.owner_id.clone()).collect();

        let owners: HashMap<String, user::Model> = self
            .user_repo
            .find_by_ids(&owner_ids)
            .await?
            .into_iter()
            .map(|u| (u.id.clone(), u))
            .collect();
        let like_counts = self.like_repo.counts_for_comments(&comment_ids).await?;
        let liked = match viewer_id {
            Some(viewer_id) => self.like_repo.liked_comment_ids(viewer_id, &comment_ids).await?,
            None => std::collections::HashSet::new(),
        };

        let items = comments
            .iter()
            .filter_map(|c| {
                owners.get(&c.owner_id).map(|owner| {
                    CommentView::new(
                        c,
                        owner,
                        like_counts.get(&c.id).copied().unwrap_or(0),
                        liked.contains(&c.id),
                    )
                })
            })
            .collect();

        Ok(Page::new(items, request, total))
    }

    /// Edit a comment's content. Owner only.
    pub async fn update(
        &self,
        viewer_id: &str,
        comment_id: &str,
        content: &str,
    ) -> AppResult<comment::Model> {
        validate_id(comment_id, "comment")?;

        let comment = self
            .comment_repo
            .find_by_id(comment_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Comment {comment_id}")))?;

        assert_owner(&comment.owner_id, viewer_id)?;

        let mut active: comment::ActiveModel = comment.into();
        active.content = Set(content.to_string());
        active.updated_at = Set(Some(Utc::now().into()));
        self.comment_repo.update(active).await
    }

    /// Delete a comment and its likes, children first. Owner only.
    pub async fn delete(&self, viewer_id: &str, comment_id: &str) -> AppResult<()> {
        validate_id(comment_id, "comment")?;

        let comment = self
            .comment_repo
            .find_by_id(comment_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Comment {comment_id}")))?;

        assert_owner(&comment.owner_id, viewer_id)?;

        self.like_repo.delete_by_comment(&comment.id).await?;
        self.comment_repo.delete(comment).await?;
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
    use vidtube_db::entities::video;

    fn test_service(db: Arc<sea_orm::DatabaseConnection>) -> CommentService {
        CommentService::new(
            CommentRepository::new(db.clone()),
            VideoRepository::new(db.clone()),
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

    fn create_test_video(id: &str, owner_id: &str) -> video::Model {
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
            is_published: true,
            owner_id: owner_id.to_string(),
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn create_test_comment(id: &str, video_id: &str, owner_id: &str) -> comment::Model {
        comment::Model {
            id: id.to_string(),
            content: "Nice".to_string(),
            video_id: Some(video_id.to_string()),
            tweet_id: None,
            owner_id: owner_id.to_string(),
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    const VIDEO_ID: &str = "01arz3ndektsv4rrffq69g5fav";
    const COMMENT_ID: &str = "01arz3ndektsv4rrffq69g5fb0";

    #[tokio::test]
    async fn test_add_missing_video() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<video::Model>::new()])
                .into_connection(),
        );

        let service = test_service(db);
        let viewer = create_test_user("u1");
        let err = service.add(&viewer, VIDEO_ID, "hi").await.unwrap_err();

        assert!(matches!(err, AppError::VideoNotFound(_)));
    }

    #[tokio::test]
    async fn test_list_composes_like_state() {
        let video = create_test_video(VIDEO_ID, "u1");
        let comments = vec![
            create_test_comment("c1", VIDEO_ID, "u2"),
            create_test_comment("c2", VIDEO_ID, "u3"),
        ];
        let owners = vec![create_test_user("u2"), create_test_user("u3")];

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[video]])
                .append_query_results([comments])
                .append_query_results([count_row(2)])
                .append_query_results([owners])
                .append_query_results([vec![btreemap! {
                    "comment_id" => Value::String(Some(Box::new("c1".to_string()))),
                    "count" => Value::BigInt(Some(4)),
                }]]) // like counts
                .append_query_results([vec![btreemap! {
                    "comment_id" => Value::String(Some(Box::new("c1".to_string()))),
                }]]) // viewer's liked set
                .into_connection(),
        );

        let service = test_service(db);
        let page = service
            .list(VIDEO_ID, Some("u9"), PageRequest::default())
            .await
            .unwrap();

        assert_eq!(page.items.len(), 2);
        assert_eq!(page.total_items, 2);
        assert_eq!(page.items[0].likes_count, 4);
        assert!(page.items[0].is_liked);
        assert_eq!(page.items[1].likes_count, 0);
        assert!(!page.items[1].is_liked);
    }

    #[tokio::test]
    async fn test_update_rejects_non_owner() {
        let comment = create_test_comment(COMMENT_ID, VIDEO_ID, "u1");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[comment]])
                .into_connection(),
        );

        let service = test_service(db);
        let err = service.update("u2", COMMENT_ID, "edit").await.unwrap_err();

        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_delete_cascades_likes_first() {
        let comment = create_test_comment(COMMENT_ID, VIDEO_ID, "u1");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[comment]])
                .append_exec_results([
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 3,
                    }, // likes
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 1,
                    }, // comment row
                ])
                .into_connection(),
        );

        let service = test_service(db);
        service.delete("u1", COMMENT_ID).await.unwrap();
    }
}
