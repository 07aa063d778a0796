//! Playlist endpoints.

use axum::{
    extract::{Path, Query, State},
    response::Response,
    routing::{get, patch, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use validator::Validate;
use vidtube_common::{AppResult, Page, PageRequest};
use vidtube_core::views::{PlaylistDetail, PlaylistSummary};
use vidtube_db::entities::playlist;

use crate::{
    extractors::{AuthUser, MaybeAuthUser},
    middleware::AppState,
    response::{created, ApiResponse},
};

/// Playlist creation request.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePlaylistRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,

    #[validate(length(max = 2000))]
    #[serde(default)]
    pub description: String,
}

/// Playlist edit request; absent fields are left untouched.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePlaylistRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,

    #[validate(length(max = 2000))]
    pub description: Option<String>,
}

/// Playlist row response for mutations.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistResponse {
    pub id: String,
    pub name: String,
    pub description: String,
    pub visibility: playlist::Visibility,
    pub owner_id: String,
    pub created_at: String,
}

impl From<playlist::Model> for PlaylistResponse {
    fn from(p: playlist::Model) -> Self {
        Self {
            id: p.id,
            name: p.name,
            description: p.description,
            visibility: p.visibility,
            owner_id: p.owner_id,
            created_at: p.created_at.to_rfc3339(),
        }
    }
}

/// Create a playlist. Starts private.
async fn create_playlist(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<CreatePlaylistRequest>,
) -> AppResult<Response> {
    req.validate()?;

    let playlist = state
        .playlist_service
        .create(&user, &req.name, &req.description)
        .await?;

    Ok(created("Playlist created", PlaylistResponse::from(playlist)))
}

/// Playlist detail with one page of its videos.
async fn get_playlist(
    viewer: MaybeAuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(page): Query<PageRequest>,
) -> AppResult<ApiResponse<PlaylistDetail>> {
    let detail = state
        .playlist_service
        .get(&id, viewer.viewer_id(), page)
        .await?;

    Ok(ApiResponse::ok("OK", detail))
}

/// Rename or re-describe a playlist. Owner only.
async fn update_playlist(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdatePlaylistRequest>,
) -> AppResult<ApiResponse<PlaylistResponse>> {
    req.validate()?;

    let updated = state
        .playlist_service
        .update(&user.id, &id, req.name, req.description)
        .await?;

    Ok(ApiResponse::ok("Playlist updated", PlaylistResponse::from(updated)))
}

/// Delete a playlist and its membership rows. Owner only.
async fn delete_playlist(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<()>> {
    state.playlist_service.delete(&user.id, &id).await?;
    Ok(ApiResponse::<()>::message("Playlist deleted"))
}

/// Visibility toggle response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisibilityResponse {
    pub visibility: playlist::Visibility,
}

/// Flip public/private. Owner only.
async fn toggle_visibility(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<VisibilityResponse>> {
    let visibility = state
        .playlist_service
        .toggle_visibility(&user.id, &id)
        .await?;

    Ok(ApiResponse::ok(
        "Visibility updated",
        VisibilityResponse { visibility },
    ))
}

/// Append a published video to the playlist. Owner only.
async fn add_video(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path((id, video_id)): Path<(String, String)>,
) -> AppResult<ApiResponse<()>> {
    state
        .playlist_service
        .add_video(&user.id, &id, &video_id)
        .await?;

    Ok(ApiResponse::<()>::message("Video added to playlist"))
}

/// Remove a video from the playlist. Owner only.
async fn remove_video(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path((id, video_id)): Path<(String, String)>,
) -> AppResult<ApiResponse<()>> {
    state
        .playlist_service
        .remove_video(&user.id, &id, &video_id)
        .await?;

    Ok(ApiResponse::<()>::message("Video removed from playlist"))
}

/// Page of a user's playlists; private ones only in the owner's own
/// listing.
async fn user_playlists(
    viewer: MaybeAuthUser,
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(page): Query<PageRequest>,
) -> AppResult<ApiResponse<Page<PlaylistSummary>>> {
    let playlists = state
        .playlist_service
        .by_user(&user_id, viewer.viewer_id(), page)
        .await?;

    Ok(ApiResponse::ok("OK", playlists))
}

/// Playlist routes.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_playlist))
        .route("/user/{userId}", get(user_playlists))
        .route(
            "/{id}",
            get(get_playlist).patch(update_playlist).delete(delete_playlist),
        )
        .route("/{id}/visibility", patch(toggle_visibility))
        .route("/{id}/videos/{videoId}", post(add_video).delete(remove_video))
}
