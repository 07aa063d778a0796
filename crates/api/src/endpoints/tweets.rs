//! Tweet endpoints.

use axum::{
    extract::{Path, Query, State},
    response::Response,
    routing::{get, patch, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use validator::Validate;
use vidtube_common::{AppResult, Page, PageRequest};
use vidtube_core::views::TweetView;
use vidtube_db::entities::tweet;

use crate::{
    extractors::{AuthUser, MaybeAuthUser},
    middleware::AppState,
    response::{created, ApiResponse},
};

/// Tweet creation or edit request.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TweetRequest {
    #[validate(length(min = 1, max = 280))]
    pub content: String,
}

/// Tweet row response for mutations.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TweetResponse {
    pub id: String,
    pub content: String,
    pub owner_id: String,
    pub created_at: String,
}

impl From<tweet::Model> for TweetResponse {
    fn from(t: tweet::Model) -> Self {
        Self {
            id: t.id,
            content: t.content,
            owner_id: t.owner_id,
            created_at: t.created_at.to_rfc3339(),
        }
    }
}

/// Post a tweet.
async fn create_tweet(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<TweetRequest>,
) -> AppResult<Response> {
    req.validate()?;

    let tweet = state.tweet_service.create(&user, &req.content).await?;

    Ok(created("Tweet posted", TweetResponse::from(tweet)))
}

/// Page of a user's tweets, newest first.
async fn user_tweets(
    viewer: MaybeAuthUser,
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(page): Query<PageRequest>,
) -> AppResult<ApiResponse<Page<TweetView>>> {
    let tweets = state
        .tweet_service
        .by_user(&user_id, viewer.viewer_id(), page)
        .await?;

    Ok(ApiResponse::ok("OK", tweets))
}

/// Edit a tweet. Owner only.
async fn update_tweet(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(tweet_id): Path<String>,
    Json(req): Json<TweetRequest>,
) -> AppResult<ApiResponse<TweetResponse>> {
    req.validate()?;

    let updated = state
        .tweet_service
        .update(&user.id, &tweet_id, &req.content)
        .await?;

    Ok(ApiResponse::ok("Tweet updated", TweetResponse::from(updated)))
}

/// Delete a tweet and its likes. Owner only.
async fn delete_tweet(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(tweet_id): Path<String>,
) -> AppResult<ApiResponse<()>> {
    state.tweet_service.delete(&user.id, &tweet_id).await?;
    Ok(ApiResponse::<()>::message("Tweet deleted"))
}

/// Tweet routes.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_tweet))
        .route("/user/{userId}", get(user_tweets))
        .route("/{tweetId}", patch(update_tweet).delete(delete_tweet))
}
