//! Video endpoints, with the comment collection nested under a video.

use axum::{
    extract::{Multipart, Path, Query, State},
    response::Response,
    routing::{get, patch, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use validator::Validate;
use vidtube_common::{AppError, AppResult, Page, PageRequest};
use vidtube_core::views::{CommentView, VideoDetail};
use vidtube_db::entities::video;

use crate::{
    endpoints::upload::MultipartForm,
    extractors::{AuthUser, MaybeAuthUser},
    middleware::AppState,
    response::{created, ApiResponse},
};

/// Video row response for mutations.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoResponse {
    pub id: String,
    pub video_url: String,
    pub thumbnail_url: String,
    pub title: String,
    pub description: String,
    pub duration_secs: f64,
    pub views: i64,
    pub is_published: bool,
    pub owner_id: String,
    pub created_at: String,
}

impl From<video::Model> for VideoResponse {
    fn from(v: video::Model) -> Self {
        Self {
            id: v.id,
            video_url: v.video_url,
            thumbnail_url: v.thumbnail_url,
            title: v.title,
            description: v.description,
            duration_secs: v.duration_secs,
            views: v.views,
            is_published: v.is_published,
            owner_id: v.owner_id,
            created_at: v.created_at.to_rfc3339(),
        }
    }
}

/// Upload and publish a new video.
///
/// Multipart fields: `videoFile`, `thumbnail`, `title`, `description`
/// (optional), `durationSecs`.
async fn publish(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    multipart: Multipart,
) -> AppResult<Response> {
    let mut form = MultipartForm::stage(multipart).await?;

    let title = form.require_text("title")?.to_string();
    let description = form.text("description").unwrap_or("").to_string();
    let duration_secs: f64 = form
        .require_text("durationSecs")?
        .parse()
        .map_err(|_| AppError::BadRequest("durationSecs must be a number".to_string()))?;
    let video_file = form.require_file("videoFile")?;
    let thumbnail = form.require_file("thumbnail")?;

    let video = state
        .video_service
        .publish(&user, &title, &description, duration_secs, video_file, thumbnail)
        .await?;

    Ok(created("Video published", VideoResponse::from(video)))
}

/// Composed video detail; increments views and may append a watch event.
async fn get_video(
    viewer: MaybeAuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<VideoDetail>> {
    let detail = state.video_service.get_video(&id, viewer.0.as_ref()).await?;
    Ok(ApiResponse::ok("OK", detail))
}

/// Update title, description, or thumbnail. Owner only.
///
/// Multipart fields, all optional: `title`, `description`, `thumbnail`.
async fn update_video(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    multipart: Multipart,
) -> AppResult<ApiResponse<VideoResponse>> {
    let mut form = MultipartForm::stage(multipart).await?;

    let title = form.text("title").map(ToString::to_string);
    let description = form.text("description").map(ToString::to_string);
    let thumbnail = form.take_file("thumbnail");

    let updated = state
        .video_service
        .update(&user.id, &id, title, description, thumbnail)
        .await?;

    Ok(ApiResponse::ok("Video updated", VideoResponse::from(updated)))
}

/// Delete a video and everything referencing it. Owner only.
async fn delete_video(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<()>> {
    state.video_service.delete(&user.id, &id).await?;
    Ok(ApiResponse::<()>::message("Video deleted"))
}

/// Publish-status toggle response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishStatusResponse {
    pub is_published: bool,
}

/// Flip the publish flag. Owner only.
async fn toggle_publish(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<PublishStatusResponse>> {
    let is_published = state.video_service.toggle_publish(&user.id, &id).await?;

    Ok(ApiResponse::ok(
        "Publish status updated",
        PublishStatusResponse { is_published },
    ))
}

/// Comment creation request.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AddCommentRequest {
    #[validate(length(min = 1, max = 1000))]
    pub content: String,
}

/// Comment row response for mutations.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentResponse {
    pub id: String,
    pub content: String,
    pub video_id: Option<String>,
    pub owner_id: String,
    pub created_at: String,
}

impl From<vidtube_db::entities::comment::Model> for CommentResponse {
    fn from(c: vidtube_db::entities::comment::Model) -> Self {
        Self {
            id: c.id,
            content: c.content,
            video_id: c.video_id,
            owner_id: c.owner_id,
            created_at: c.created_at.to_rfc3339(),
        }
    }
}

/// Add a comment to a video.
async fn add_comment(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(video_id): Path<String>,
    Json(req): Json<AddCommentRequest>,
) -> AppResult<Response> {
    req.validate()?;

    let comment = state
        .comment_service
        .add(&user, &video_id, &req.content)
        .await?;

    Ok(created("Comment added", CommentResponse::from(comment)))
}

/// Page of a video's comments, newest first.
async fn list_comments(
    viewer: MaybeAuthUser,
    State(state): State<AppState>,
    Path(video_id): Path<String>,
    Query(page): Query<PageRequest>,
) -> AppResult<ApiResponse<Page<CommentView>>> {
    let comments = state
        .comment_service
        .list(&video_id, viewer.viewer_id(), page)
        .await?;

    Ok(ApiResponse::ok("OK", comments))
}

/// Video routes.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(publish))
        .route("/{id}", get(get_video).patch(update_video).delete(delete_video))
        .route("/{id}/status", patch(toggle_publish))
        .route("/{id}/comments", post(add_comment).get(list_comments))
}
