//! Playlist service.
//!
//! Playlists are private by default. A private playlist read by anyone
//! but its owner behaves as nonexistent.

use std::collections::HashMap;

use chrono::Utc;
use sea_orm::Set;
use vidtube_common::{validate_id, AppError, AppResult, IdGenerator, Page, PageRequest};
use vidtube_db::{
    entities::{playlist, playlist_video, user, video},
    repositories::{PlaylistRepository, UserRepository, VideoRepository},
};

use crate::services::assert_owner;
use crate::views::{PlaylistDetail, PlaylistSummary, VideoCard};

/// Playlist service for business logic.
#[derive(Clone)]
pub struct PlaylistService {
    playlist_repo: PlaylistRepository,
    video_repo: VideoRepository,
    user_repo: UserRepository,
    id_gen: IdGenerator,
}

impl PlaylistService {
    /// Create a new playlist service.
    #[must_use]
    pub fn new(
        playlist_repo: PlaylistRepository,
        video_repo: VideoRepository,
        user_repo: UserRepository,
    ) -> Self {
        Self {
            playlist_repo,
            video_repo,
            user_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Create a playlist; private until its owner flips it.
    pub async fn create(
        &self,
        owner: &user::Model,
        name: &str,
        description: &str,
    ) -> AppResult<playlist::Model> {
        let model = playlist::ActiveModel {
            id: Set(self.id_gen.generate()),
            name: Set(name.to_string()),
            description: Set(description.to_string()),
            visibility: Set(playlist::Visibility::Private),
            owner_id: Set(owner.id.clone()),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        };
        self.playlist_repo.create(model).await
    }

    /// Rename or re-describe a playlist. Owner only.
    pub async fn update(
        &self,
        viewer_id: &str,
        playlist_id: &str,
        name: Option<String>,
        description: Option<String>,
    ) -> AppResult<playlist::Model> {
        let playlist = self.owned_playlist(viewer_id, playlist_id).await?;

        let mut active: playlist::ActiveModel = playlist.into();
        if let Some(name) = name {
            active.name = Set(name);
        }
        if let Some(description) = description {
            active.description = Set(description);
        }
        active.updated_at = Set(Some(Utc::now().into()));
        self.playlist_repo.update(active).await
    }

    /// Delete a playlist. Owner only. Membership rows go with it.
    pub async fn delete(&self, viewer_id: &str, playlist_id: &str) -> AppResult<()> {
        let playlist = self.owned_playlist(viewer_id, playlist_id).await?;
        self.playlist_repo.delete(playlist).await
    }

    /// Flip public/private; returns the new visibility. Owner only.
    pub async fn toggle_visibility(
        &self,
        viewer_id: &str,
        playlist_id: &str,
    ) -> AppResult<playlist::Visibility> {
        let playlist = self.owned_playlist(viewer_id, playlist_id).await?;

        let new_visibility = match playlist.visibility {
            playlist::Visibility::Public => playlist::Visibility::Private,
            playlist::Visibility::Private => playlist::Visibility::Public,
        };

        let mut active: playlist::ActiveModel = playlist.into();
        active.visibility = Set(new_visibility.clone());
        active.updated_at = Set(Some(Utc::now().into()));
        self.playlist_repo.update(active).await?;

        Ok(new_visibility)
    }

    /// Add a published video to a playlist. Owner only.
    pub async fn add_video(
        &self,
        viewer_id: &str,
        playlist_id: &str,
        video_id: &str,
    ) -> AppResult<()> {
        validate_id(video_id, "video")?;
        let playlist = self.owned_playlist(viewer_id, playlist_id).await?;

        let video = self
            .video_repo
            .find_by_id(video_id)
            .await?
            .ok_or_else(|| AppError::VideoNotFound(video_id.to_string()))?;
        if !video.is_published {
            return Err(AppError::VideoNotFound(video_id.to_string()));
        }

        if self.playlist_repo.contains_video(&playlist.id, video_id).await? {
            return Err(AppError::BadRequest(
                "Video already in playlist".to_string(),
            ));
        }

        let position = self.playlist_repo.next_position(&playlist.id).await?;
        let entry = playlist_video::ActiveModel {
            id: Set(self.id_gen.generate()),
            playlist_id: Set(playlist.id),
            video_id: Set(video_id.to_string()),
            position: Set(position),
            created_at: Set(Utc::now().into()),
        };
        self.playlist_repo.add_video(entry).await
    }

    /// Remove a video from a playlist. Owner only.
    pub async fn remove_video(
        &self,
        viewer_id: &str,
        playlist_id: &str,
        video_id: &str,
    ) -> AppResult<()> {
        validate_id(video_id, "video")?;
        let playlist = self.owned_playlist(viewer_id, playlist_id).await?;

        if !self.playlist_repo.contains_video(&playlist.id, video_id).await? {
            return Err(AppError::NotFound(format!(
                "Video {video_id} is not in this playlist"
            )));
        }

        self.playlist_repo.remove_video(&playlist.id, video_id).await
    }

    /// Playlist detail with one page of its videos in insertion order.
    /// Private playlists are visible to their owner only; entries whose
    /// video is gone or unpublished are filtered out.
    pub async fn get(
        &self,
        playlist_id: &str,
        viewer_id: Option<&str>,
        request: PageRequest,
    ) -> AppResult<PlaylistDetail> {
        validate_id(playlist_id, "playlist")?;

        let playlist = self
            .playlist_repo
            .find_by_id(playlist_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Playlist {playlist_id}")))?;

        if playlist.visibility == playlist::Visibility::Private
            && viewer_id != Some(playlist.owner_id.as_str())
        {
            // Existence hidden from everyone but the owner.
            return Err(AppError::NotFound(format!("Playlist {playlist_id}")));
        }

        let owner = self
            .user_repo
            .find_by_id(&playlist.owner_id)
            .await?
            .ok_or_else(|| {
                AppError::Internal(format!("Playlist {playlist_id} has no owner row"))
            })?;

        let request = request.normalized();
        let entries = self
            .playlist_repo
            .entries_page(&playlist.id, request.limit, request.offset())
            .await?;
        let total = self.playlist_repo.count_entries(&playlist.id).await?;

        let video_ids: Vec<String> = entries.iter().map(|e| e.video_id.clone()).collect();
        let videos = self.video_repo.find_published_by_ids(&video_ids).await?;

        let owner_ids: Vec<String> = videos.iter().map(|v| v.owner_id.clone()).collect();
        let owners: HashMap<String, user::Model> = self
            .user_repo
            .find_by_ids(&owner_ids)
            .await?
            .into_iter()
            .map(|u| (u.id.clone(), u))
            .collect();

        let by_id: HashMap<&str, &video::Model> =
            videos.iter().map(|v| (v.id.as_str(), v)).collect();

        let items: Vec<VideoCard> = entries
            .iter()
            .filter_map(|e| {
                let video = by_id.get(e.video_id.as_str())?;
                let video_owner = owners.get(&video.owner_id)?;
                Some(VideoCard::new(video, video_owner))
            })
            .collect();

        Ok(PlaylistDetail {
            id: playlist.id,
            name: playlist.name,
            description: playlist.description,
            visibility: playlist.visibility,
            created_at: playlist.created_at.to_rfc3339(),
            owner: (&owner).into(),
            videos: Page::new(items, request, total),
        })
    }

    /// Page of a user's playlists, newest first, with entry counts and
    /// the first published video's thumbnail. Private playlists appear
    /// only in the owner's own listing.
    pub async fn by_user(
        &self,
        user_id: &str,
        viewer_id: Option<&str>,
        request: PageRequest,
    ) -> AppResult<Page<PlaylistSummary>> {
        validate_id(user_id, "user")?;

        self.user_repo
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::UserNotFound(user_id.to_string()))?;

        let include_private = viewer_id == Some(user_id);
        let request = request.normalized();
        let playlists = self
            .playlist_repo
            .page_by_owner(user_id, include_private, request.limit, request.offset())
            .await?;
        let total = self
            .playlist_repo
            .count_by_owner(user_id, include_private)
            .await?;

        let playlist_ids: Vec<String> = playlists.iter().map(|p| p.id.clone()).collect();
        let counts = self.playlist_repo.counts_for_playlists(&playlist_ids).await?;
        let entries = self.playlist_repo.entries_for_playlists(&playlist_ids).await?;

        let entry_video_ids: Vec<String> = entries.iter().map(|e| e.video_id.clone()).collect();
        let thumbs: HashMap<String, String> = self
            .video_repo
            .find_published_by_ids(&entry_video_ids)
            .await?
            .into_iter()
            .map(|v| (v.id, v.thumbnail_url))
            .collect();

        // First published video per playlist, in insertion order.
        let mut first_thumb: HashMap<&str, &str> = HashMap::new();
        for entry in &entries {
            if first_thumb.contains_key(entry.playlist_id.as_str()) {
                continue;
            }
            if let Some(url) = thumbs.get(&entry.video_id) {
                first_thumb.insert(entry.playlist_id.as_str(), url.as_str());
            }
        }

        let items = playlists
            .iter()
            .map(|p| PlaylistSummary {
                id: p.id.clone(),
                name: p.name.clone(),
                description: p.description.clone(),
                visibility: p.visibility.clone(),
                created_at: p.created_at.to_rfc3339(),
                total_videos: counts.get(&p.id).copied().unwrap_or(0),
                thumbnail_url: first_thumb.get(p.id.as_str()).map(ToString::to_string),
            })
            .collect();

        Ok(Page::new(items, request, total))
    }

    async fn owned_playlist(
        &self,
        viewer_id: &str,
        playlist_id: &str,
    ) -> AppResult<playlist::Model> {
        validate_id(playlist_id, "playlist")?;

        let playlist = self
            .playlist_repo
            .find_by_id(playlist_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Playlist {playlist_id}")))?;

        assert_owner(&playlist.owner_id, viewer_id)?;
        Ok(playlist)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use std::sync::Arc;

    fn test_service(db: Arc<sea_orm::DatabaseConnection>) -> PlaylistService {
        PlaylistService::new(
            PlaylistRepository::new(db.clone()),
            VideoRepository::new(db.clone()),
            UserRepository::new(db),
        )
    }

    fn create_test_playlist(id: &str, owner_id: &str, visibility: playlist::Visibility) -> playlist::Model {
        playlist::Model {
            id: id.to_string(),
            name: "Favorites".to_string(),
            description: String::new(),
            visibility,
            owner_id: owner_id.to_string(),
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

    const PLAYLIST_ID: &str = "01arz3ndektsv4rrffq69g5fav";
    const VIDEO_ID: &str = "01arz3ndektsv4rrffq69g5fb0";

    #[tokio::test]
    async fn test_get_private_hidden_from_non_owner() {
        let playlist = create_test_playlist(PLAYLIST_ID, "u1", playlist::Visibility::Private);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[playlist]])
                .into_connection(),
        );

        let service = test_service(db);
        let err = service
            .get(PLAYLIST_ID, Some("u2"), PageRequest::default())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_get_private_hidden_from_anonymous() {
        let playlist = create_test_playlist(PLAYLIST_ID, "u1", playlist::Visibility::Private);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[playlist]])
                .into_connection(),
        );

        let service = test_service(db);
        let err = service
            .get(PLAYLIST_ID, None, PageRequest::default())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_add_video_rejects_unpublished() {
        let playlist = create_test_playlist(PLAYLIST_ID, "u1", playlist::Visibility::Private);
        let video = create_test_video(VIDEO_ID, "u2", false);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[playlist]])
                .append_query_results([[video]])
                .into_connection(),
        );

        let service = test_service(db);
        let err = service
            .add_video("u1", PLAYLIST_ID, VIDEO_ID)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::VideoNotFound(_)));
    }

    #[tokio::test]
    async fn test_add_video_rejects_duplicate() {
        let playlist = create_test_playlist(PLAYLIST_ID, "u1", playlist::Visibility::Private);
        let video = create_test_video(VIDEO_ID, "u2", true);
        let entry = playlist_video::Model {
            id: "pv1".to_string(),
            playlist_id: PLAYLIST_ID.to_string(),
            video_id: VIDEO_ID.to_string(),
            position: 0,
            created_at: Utc::now().into(),
        };

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[playlist]])
                .append_query_results([[video]])
                .append_query_results([[entry]])
                .into_connection(),
        );

        let service = test_service(db);
        let err = service
            .add_video("u1", PLAYLIST_ID, VIDEO_ID)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_remove_video_missing_entry() {
        let playlist = create_test_playlist(PLAYLIST_ID, "u1", playlist::Visibility::Private);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[playlist]])
                .append_query_results([Vec::<playlist_video::Model>::new()])
                .into_connection(),
        );

        let service = test_service(db);
        let err = service
            .remove_video("u1", PLAYLIST_ID, VIDEO_ID)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_toggle_visibility_flips() {
        let playlist = create_test_playlist(PLAYLIST_ID, "u1", playlist::Visibility::Private);
        let mut flipped = playlist.clone();
        flipped.visibility = playlist::Visibility::Public;

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[playlist]])
                .append_query_results([[flipped]])
                .into_connection(),
        );

        let service = test_service(db);
        let visibility = service
            .toggle_visibility("u1", PLAYLIST_ID)
            .await
            .unwrap();

        assert_eq!(visibility, playlist::Visibility::Public);
    }

    #[tokio::test]
    async fn test_delete_rejects_non_owner() {
        let playlist = create_test_playlist(PLAYLIST_ID, "u1", playlist::Visibility::Public);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[playlist]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .into_connection(),
        );

        let service = test_service(db);
        let err = service.delete("u2", PLAYLIST_ID).await.unwrap_err();

        assert!(matches!(err, AppError::Forbidden(_)));
    }
}
