//! Video service: publishing, the composed detail view, updates,
//! cascaded deletion.

use std::sync::Arc;

use chrono::Utc;
use sea_orm::Set;
use tracing::{info, warn};
use validator::Validate;
use vidtube_common::storage::generate_storage_key;
use vidtube_common::{validate_id, AppError, AppResult, IdGenerator, StorageBackend, UploadedFile};
use vidtube_db::{
    entities::{user, video, watch_history},
    repositories::{
        CommentRepository, LikeRepository, SubscriptionRepository, UserRepository, VideoRepository,
        WatchHistoryRepository,
    },
};

use crate::services::assert_owner;
use crate::views::{VideoDetail, VideoOwner};

/// A staged multipart upload handed down from the API layer.
#[derive(Debug, Clone)]
pub struct StagedFile {
    /// Original client-side filename.
    pub file_name: String,
    /// MIME content type.
    pub content_type: String,
    /// File bytes.
    pub data: Vec<u8>,
}

/// Length limits on the multipart text fields, which bypass the JSON
/// request structs.
#[derive(Debug, Validate)]
struct VideoMeta {
    #[validate(length(min = 1, max = 100))]
    title: Option<String>,
    #[validate(length(max = 2000))]
    description: Option<String>,
}

/// Video service for business logic.
#[derive(Clone)]
pub struct VideoService {
    video_repo: VideoRepository,
    user_repo: UserRepository,
    like_repo: LikeRepository,
    comment_repo: CommentRepository,
    subscription_repo: SubscriptionRepository,
    watch_history_repo: WatchHistoryRepository,
    storage: Arc<dyn StorageBackend>,
    id_gen: IdGenerator,
}

impl VideoService {
    /// Create a new video service.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        video_repo: VideoRepository,
        user_repo: UserRepository,
        like_repo: LikeRepository,
        comment_repo: CommentRepository,
        subscription_repo: SubscriptionRepository,
        watch_history_repo: WatchHistoryRepository,
        storage: Arc<dyn StorageBackend>,
    ) -> Self {
        Self {
            video_repo,
            user_repo,
            like_repo,
            comment_repo,
            subscription_repo,
            watch_history_repo,
            storage,
            id_gen: IdGenerator::new(),
        }
    }

    /// Upload and publish a new video.
    pub async fn publish(
        &self,
        owner: &user::Model,
        title: &str,
        description: &str,
        duration_secs: f64,
        video_file: StagedFile,
        thumbnail: StagedFile,
    ) -> AppResult<video::Model> {
        VideoMeta {
            title: Some(title.to_string()),
            description: Some(description.to_string()),
        }
        .validate()?;

        let video_key = generate_storage_key(&owner.id, &video_file.file_name);
        let uploaded_video = self
            .storage
            .upload(&video_key, &video_file.data, &video_file.content_type)
            .await?;

        let thumb_key = generate_storage_key(&owner.id, &thumbnail.file_name);
        let uploaded_thumb = match self
            .storage
            .upload(&thumb_key, &thumbnail.data, &thumbnail.content_type)
            .await
        {
            Ok(uploaded) => uploaded,
            Err(e) => {
                // Do not leave the video asset orphaned.
                self.storage.delete(&uploaded_video.key).await.ok();
                return Err(e);
            }
        };

        let model = video::ActiveModel {
            id: Set(self.id_gen.generate()),
            video_url: Set(uploaded_video.url),
            video_key: Set(uploaded_video.key),
            thumbnail_url: Set(uploaded_thumb.url),
            thumbnail_key: Set(uploaded_thumb.key),
            title: Set(title.to_string()),
            description: Set(description.to_string()),
            duration_secs: Set(duration_secs),
            views: Set(0),
            is_published: Set(true),
            owner_id: Set(owner.id.clone()),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        };

        let created = self.video_repo.create(model).await?;
        info!(video_id = %created.id, owner_id = %created.owner_id, "Video published");
        Ok(created)
    }

    /// Composed video detail. Every successful fetch increments `views`
    /// and, for viewers with history enabled, appends a watch event.
    pub async fn get_video(
        &self,
        id: &str,
        viewer: Option<&user::Model>,
    ) -> AppResult<VideoDetail> {
        validate_id(id, "video")?;

        let video = self
            .video_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::VideoNotFound(id.to_string()))?;

        // Unpublished videos do not exist for anyone but their owner.
        if !video.is_published && viewer.map(|v| v.id.as_str()) != Some(video.owner_id.as_str()) {
            return Err(AppError::VideoNotFound(id.to_string()));
        }

        let owner = self
            .user_repo
            .find_by_id(&video.owner_id)
            .await?
            .ok_or_else(|| AppError::Internal(format!("Video {id} has no owner row")))?;

        let subscribers_count = self.subscription_repo.count_subscribers(&owner.id).await?;
        let subscribed_to_count = self.subscription_repo.count_subscriptions(&owner.id).await?;

        let is_subscribed = match viewer {
            Some(viewer) => self
                .subscription_repo
                .find_pair(&viewer.id, &owner.id)
                .await?
                .is_some(),
            None => false,
        };

        let likes_count = self.like_repo.count_for_video(&video.id).await?;
        let is_liked = match viewer {
            Some(viewer) => self
                .like_repo
                .find_video_like(&viewer.id, &video.id)
                .await?
                .is_some(),
            None => false,
        };

        self.video_repo.increment_views(&video.id).await?;

        if let Some(viewer) = viewer {
            if viewer.watch_history_enabled {
                let entry = watch_history::ActiveModel {
                    id: Set(self.id_gen.generate()),
                    watched_by_id: Set(viewer.id.clone()),
                    video_id: Set(video.id.clone()),
                    created_at: Set(Utc::now().into()),
                };
                self.watch_history_repo.create(entry).await?;
            }
        }

        Ok(VideoDetail {
            id: video.id,
            video_url: video.video_url,
            thumbnail_url: video.thumbnail_url,
            title: video.title,
            description: video.description,
            duration_secs: video.duration_secs,
            views: video.views + 1,
            is_published: video.is_published,
            created_at: video.created_at.to_rfc3339(),
            owner: VideoOwner {
                id: owner.id,
                username: owner.username,
                full_name: owner.full_name,
                avatar_url: owner.avatar_url,
                subscribers_count,
                subscribed_to_count,
                is_subscribed,
            },
            likes_count,
            is_liked,
        })
    }

    /// Update title, description, or thumbnail. Owner only.
    pub async fn update(
        &self,
        viewer_id: &str,
        id: &str,
        title: Option<String>,
        description: Option<String>,
        thumbnail: Option<StagedFile>,
    ) -> AppResult<video::Model> {
        validate_id(id, "video")?;

        let meta = VideoMeta { title, description };
        meta.validate()?;
        let VideoMeta { title, description } = meta;

        let video = self
            .video_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::VideoNotFound(id.to_string()))?;

        assert_owner(&video.owner_id, viewer_id)?;

        let mut new_thumb: Option<UploadedFile> = None;
        if let Some(thumbnail) = thumbnail {
            let key = generate_storage_key(viewer_id, &thumbnail.file_name);
            new_thumb = Some(
                self.storage
                    .upload(&key, &thumbnail.data, &thumbnail.content_type)
                    .await?,
            );
        }

        let old_thumb_key = video.thumbnail_key.clone();
        let mut active: video::ActiveModel = video.into();
        if let Some(title) = title {
            active.title = Set(title);
        }
        if let Some(description) = description {
            active.description = Set(description);
        }
        let swapped = new_thumb.is_some();
        if let Some(thumb) = new_thumb {
            active.thumbnail_url = Set(thumb.url);
            active.thumbnail_key = Set(thumb.key);
        }
        active.updated_at = Set(Some(Utc::now().into()));
        let updated = self.video_repo.update(active).await?;

        // The record already points at the new asset; a failed delete
        // leaks the old file rather than failing the update.
        if swapped {
            if let Err(e) = self.storage.delete(&old_thumb_key).await {
                warn!(key = %old_thumb_key, error = %e, "Failed to delete replaced thumbnail");
            }
        }

        Ok(updated)
    }

    /// Delete a video and everything hanging off it, children first:
    /// likes of its comments, its comments, its likes, then the row.
    /// Watch-history and playlist rows are left behind and filtered at
    /// read time.
    pub async fn delete(&self, viewer_id: &str, id: &str) -> AppResult<()> {
        validate_id(id, "video")?;

        let video = self
            .video_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::VideoNotFound(id.to_string()))?;

        assert_owner(&video.owner_id, viewer_id)?;

        let comment_ids = self.comment_repo.ids_by_video(&video.id).await?;
        self.like_repo.delete_by_comments(&comment_ids).await?;
        self.comment_repo.delete_by_video(&video.id).await?;
        self.like_repo.delete_by_video(&video.id).await?;

        let video_key = video.video_key.clone();
        let thumb_key = video.thumbnail_key.clone();
        self.video_repo.delete(video).await?;

        // Rows are already gone; failed asset deletes only leak files.
        for key in [&video_key, &thumb_key] {
            if let Err(e) = self.storage.delete(key).await {
                warn!(key = %key, error = %e, "Failed to delete video asset");
            }
        }

        info!(video_id = %id, "Video deleted");
        Ok(())
    }

    /// Flip the publish state; returns the new state. Owner only.
    pub async fn toggle_publish(&self, viewer_id: &str, id: &str) -> AppResult<bool> {
        validate_id(id, "video")?;

        let video = self
            .video_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::VideoNotFound(id.to_string()))?;

        assert_owner(&video.owner_id, viewer_id)?;

        let new_state = !video.is_published;
        let mut active: video::ActiveModel = video.into();
        active.is_published = Set(new_state);
        active.updated_at = Set(Some(Utc::now().into()));
        self.video_repo.update(active).await?;

        Ok(new_state)
    }
}
