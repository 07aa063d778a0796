//! Like toggle and liked-listing endpoints.

use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Router,
};
use serde::Serialize;
use vidtube_common::{AppResult, Page, PageRequest};
use vidtube_core::views::{CommentView, TweetView, VideoCard};

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// Toggle outcome: the new like state.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleResponse {
    pub is_liked: bool,
}

/// Toggle the viewer's like on a video.
async fn toggle_video(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(video_id): Path<String>,
) -> AppResult<ApiResponse<ToggleResponse>> {
    let is_liked = state.like_service.toggle_video(&user.id, &video_id).await?;
    Ok(ApiResponse::ok("Like toggled", ToggleResponse { is_liked }))
}

/// Toggle the viewer's like on a comment.
async fn toggle_comment(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(comment_id): Path<String>,
) -> AppResult<ApiResponse<ToggleResponse>> {
    let is_liked = state
        .like_service
        .toggle_comment(&user.id, &comment_id)
        .await?;
    Ok(ApiResponse::ok("Like toggled", ToggleResponse { is_liked }))
}

/// Toggle the viewer's like on a tweet.
async fn toggle_tweet(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(tweet_id): Path<String>,
) -> AppResult<ApiResponse<ToggleResponse>> {
    let is_liked = state.like_service.toggle_tweet(&user.id, &tweet_id).await?;
    Ok(ApiResponse::ok("Like toggled", ToggleResponse { is_liked }))
}

/// Page of the viewer's liked videos, newest like first.
async fn liked_videos(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Query(page): Query<PageRequest>,
) -> AppResult<ApiResponse<Page<VideoCard>>> {
    let videos = state.like_service.liked_videos(&user.id, page).await?;
    Ok(ApiResponse::ok("OK", videos))
}

/// Page of the viewer's liked tweets, newest like first.
async fn liked_tweets(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Query(page): Query<PageRequest>,
) -> AppResult<ApiResponse<Page<TweetView>>> {
    let tweets = state.like_service.liked_tweets(&user.id, page).await?;
    Ok(ApiResponse::ok("OK", tweets))
}

/// Page of the viewer's liked comments, newest like first.
async fn liked_comments(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Query(page): Query<PageRequest>,
) -> AppResult<ApiResponse<Page<CommentView>>> {
    let comments = state.like_service.liked_comments(&user.id, page).await?;
    Ok(ApiResponse::ok("OK", comments))
}

/// Like routes.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/video/{videoId}", post(toggle_video))
        .route("/comment/{commentId}", post(toggle_comment))
        .route("/tweet/{tweetId}", post(toggle_tweet))
        .route("/videos", get(liked_videos))
        .route("/tweets", get(liked_tweets))
        .route("/comments", get(liked_comments))
}
