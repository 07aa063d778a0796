//! API middleware.

#![allow(missing_docs)]

use axum::{body::Body, extract::State, http::Request, middleware::Next, response::Response};
use vidtube_core::{
    CommentService, DashboardService, LikeService, PlaylistService, SubscriptionService,
    TweetService, UserService, VideoService, WatchHistoryService,
};

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub user_service: UserService,
    pub video_service: VideoService,
    pub comment_service: CommentService,
    pub like_service: LikeService,
    pub subscription_service: SubscriptionService,
    pub tweet_service: TweetService,
    pub playlist_service: PlaylistService,
    pub watch_history_service: WatchHistoryService,
    pub dashboard_service: DashboardService,
}

/// Pull a bearer token from the `Authorization` header, or fall back to
/// the `accessToken` cookie.
fn extract_token(req: &Request<Body>) -> Option<String> {
    if let Some(auth_header) = req.headers().get("Authorization") {
        if let Ok(auth_str) = auth_header.to_str() {
            if let Some(token) = auth_str.strip_prefix("Bearer ") {
                return Some(token.to_string());
            }
        }
    }

    let cookies = req.headers().get("Cookie")?.to_str().ok()?;
    cookies.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        (name == "accessToken").then(|| value.to_string())
    })
}

/// Authentication middleware. Resolves the token to a user row and
/// stashes it in request extensions; handlers decide whether a missing
/// user is an error.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if let Some(token) = extract_token(&req) {
        if let Ok(user) = state.user_service.authenticate_by_access_token(&token).await {
            req.extensions_mut().insert(user);
        }
    }

    next.run(req).await
}
