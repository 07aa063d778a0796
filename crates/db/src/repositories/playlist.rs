//! Playlist repository.

use std::collections::HashMap;
use std::sync::Arc;

use crate::entities::{playlist, playlist_video, Playlist, PlaylistVideo};
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect,
};
use vidtube_common::{AppError, AppResult};

/// Playlist repository for database operations.
#[derive(Clone)]
pub struct PlaylistRepository {
    db: Arc<DatabaseConnection>,
}

impl PlaylistRepository {
    /// Create a new playlist repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a playlist by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<playlist::Model>> {
        Playlist::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new playlist.
    pub async fn create(&self, model: playlist::ActiveModel) -> AppResult<playlist::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Apply an update to a playlist.
    pub async fn update(&self, model: playlist::ActiveModel) -> AppResult<playlist::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a playlist row (membership rows cascade via FK).
    pub async fn delete(&self, model: playlist::Model) -> AppResult<()> {
        model
            .delete(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Page of a user's playlists, newest first. `include_private` is
    /// true only when the owner is listing their own.
    pub async fn page_by_owner(
        &self,
        owner_id: &str,
        include_private: bool,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<playlist::Model>> {
        let mut query = Playlist::find().filter(playlist::Column::OwnerId.eq(owner_id));

        if !include_private {
            query = query.filter(playlist::Column::Visibility.eq(playlist::Visibility::Public));
        }

        query
            .order_by_desc(playlist::Column::CreatedAt)
            .limit(limit)
            .offset(offset)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count a user's playlists.
    pub async fn count_by_owner(&self, owner_id: &str, include_private: bool) -> AppResult<u64> {
        let mut query = Playlist::find().filter(playlist::Column::OwnerId.eq(owner_id));

        if !include_private {
            query = query.filter(playlist::Column::Visibility.eq(playlist::Visibility::Public));
        }

        query
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Check whether a video is already in a playlist.
    pub async fn contains_video(&self, playlist_id: &str, video_id: &str) -> AppResult<bool> {
        let row = PlaylistVideo::find()
            .filter(playlist_video::Column::PlaylistId.eq(playlist_id))
            .filter(playlist_video::Column::VideoId.eq(video_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(row.is_some())
    }

    /// Next insertion position within a playlist.
    pub async fn next_position(&self, playlist_id: &str) -> AppResult<i32> {
        let max: Option<i32> = PlaylistVideo::find()
            .select_only()
            .column_as(playlist_video::Column::Position.max(), "max_position")
            .filter(playlist_video::Column::PlaylistId.eq(playlist_id))
            .into_tuple()
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
            .flatten();

        Ok(max.map_or(0, |p| p + 1))
    }

    /// Insert a membership row; a concurrent duplicate is a no-op.
    pub async fn add_video(&self, model: playlist_video::ActiveModel) -> AppResult<()> {
        PlaylistVideo::insert(model)
            .on_conflict(
                OnConflict::columns([
                    playlist_video::Column::PlaylistId,
                    playlist_video::Column::VideoId,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Remove a video from a playlist.
    pub async fn remove_video(&self, playlist_id: &str, video_id: &str) -> AppResult<()> {
        PlaylistVideo::delete_many()
            .filter(playlist_video::Column::PlaylistId.eq(playlist_id))
            .filter(playlist_video::Column::VideoId.eq(video_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Page of a playlist's membership rows in insertion order.
    pub async fn entries_page(
        &self,
        playlist_id: &str,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<playlist_video::Model>> {
        PlaylistVideo::find()
            .filter(playlist_video::Column::PlaylistId.eq(playlist_id))
            .order_by_asc(playlist_video::Column::Position)
            .limit(limit)
            .offset(offset)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count a playlist's membership rows.
    pub async fn count_entries(&self, playlist_id: &str) -> AppResult<u64> {
        PlaylistVideo::find()
            .filter(playlist_video::Column::PlaylistId.eq(playlist_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// All membership rows for a set of playlists, in insertion order
    /// (summary counts and first-thumbnail lookups).
    pub async fn entries_for_playlists(
        &self,
        playlist_ids: &[String],
    ) -> AppResult<Vec<playlist_video::Model>> {
        if playlist_ids.is_empty() {
            return Ok(Vec::new());
        }
        PlaylistVideo::find()
            .filter(
                playlist_video::Column::PlaylistId.is_in(playlist_ids.iter().map(String::as_str)),
            )
            .order_by_asc(playlist_video::Column::PlaylistId)
            .order_by_asc(playlist_video::Column::Position)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Membership counts per playlist, grouped.
    pub async fn counts_for_playlists(
        &self,
        playlist_ids: &[String],
    ) -> AppResult<HashMap<String, u64>> {
        if playlist_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows: Vec<(String, i64)> = PlaylistVideo::find()
            .select_only()
            .column(playlist_video::Column::PlaylistId)
            .column_as(playlist_video::Column::Id.count(), "count")
            .filter(
                playlist_video::Column::PlaylistId.is_in(playlist_ids.iter().map(String::as_str)),
            )
            .group_by(playlist_video::Column::PlaylistId)
            .into_tuple()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(rows
            .into_iter()
            .map(|(id, count)| (id, count.max(0) as u64))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};

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

    fn create_test_entry(id: &str, playlist_id: &str, video_id: &str, position: i32) -> playlist_video::Model {
        playlist_video::Model {
            id: id.to_string(),
            playlist_id: playlist_id.to_string(),
            video_id: video_id.to_string(),
            position,
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_find_by_id_found() {
        let playlist = create_test_playlist("p1", "u1", playlist::Visibility::Private);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[playlist.clone()]])
                .into_connection(),
        );

        let repo = PlaylistRepository::new(db);
        let result = repo.find_by_id("p1").await.unwrap();

        assert!(result.is_some());
        assert_eq!(result.unwrap().visibility, playlist::Visibility::Private);
    }

    #[tokio::test]
    async fn test_contains_video_true() {
        let entry = create_test_entry("pv1", "p1", "v1", 0);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[entry]])
                .into_connection(),
        );

        let repo = PlaylistRepository::new(db);
        assert!(repo.contains_video("p1", "v1").await.unwrap());
    }

    #[tokio::test]
    async fn test_contains_video_false() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<playlist_video::Model>::new()])
                .into_connection(),
        );

        let repo = PlaylistRepository::new(db);
        assert!(!repo.contains_video("p1", "v9").await.unwrap());
    }

    #[tokio::test]
    async fn test_entries_for_playlists_empty_input_skips_query() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres).into_connection(),
        );

        let repo = PlaylistRepository::new(db);
        let result = repo.entries_for_playlists(&[]).await.unwrap();

        assert!(result.is_empty());
    }
}
