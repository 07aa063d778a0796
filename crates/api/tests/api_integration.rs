//! API integration tests.
//!
//! These drive the router end to end with mock database connections,
//! checking routing, auth gating, and input validation.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use axum::{
    body::Body,
    http::{Request, StatusCode},
    middleware as axum_middleware, Router,
};
use http_body_util::BodyExt;
use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase};
use std::path::PathBuf;
use std::sync::Arc;
use tower::ServiceExt;
use vidtube_api::{middleware::AppState, router as api_router};
use vidtube_common::{config::AuthConfig, LocalStorage, TokenIssuer};
use vidtube_core::{
    CommentService, DashboardService, LikeService, PlaylistService, SubscriptionService,
    TweetService, UserService, VideoService, WatchHistoryService,
};
use vidtube_db::repositories::{
    CommentRepository, LikeRepository, PlaylistRepository, SubscriptionRepository,
    TweetRepository, UserRepository, VideoRepository, WatchHistoryRepository,
};

fn mock_db() -> Arc<DatabaseConnection> {
    Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection())
}

fn test_auth_config() -> AuthConfig {
    AuthConfig {
        access_token_secret: "test-access-secret".to_string(),
        access_token_ttl_secs: 900,
        refresh_token_secret: "test-refresh-secret".to_string(),
        refresh_token_ttl_secs: 2_592_000,
    }
}

fn create_test_state() -> AppState {
    let db = mock_db();
    let storage = Arc::new(LocalStorage::new(
        PathBuf::from("/tmp/vidtube-test-files"),
        "/files".to_string(),
    ));
    let tokens = TokenIssuer::new(&test_auth_config());

    let user_repo = UserRepository::new(Arc::clone(&db));
    let video_repo = VideoRepository::new(Arc::clone(&db));
    let comment_repo = CommentRepository::new(Arc::clone(&db));
    let like_repo = LikeRepository::new(Arc::clone(&db));
    let tweet_repo = TweetRepository::new(Arc::clone(&db));
    let subscription_repo = SubscriptionRepository::new(Arc::clone(&db));
    let playlist_repo = PlaylistRepository::new(Arc::clone(&db));
    let watch_history_repo = WatchHistoryRepository::new(Arc::clone(&db));

    AppState {
        user_service: UserService::new(
            user_repo.clone(),
            subscription_repo.clone(),
            storage.clone(),
            tokens,
        ),
        video_service: VideoService::new(
            video_repo.clone(),
            user_repo.clone(),
            like_repo.clone(),
            comment_repo.clone(),
            subscription_repo.clone(),
            watch_history_repo.clone(),
            storage,
        ),
        comment_service: CommentService::new(
            comment_repo.clone(),
            video_repo.clone(),
            user_repo.clone(),
            like_repo.clone(),
        ),
        like_service: LikeService::new(
            like_repo.clone(),
            video_repo.clone(),
            comment_repo.clone(),
            tweet_repo.clone(),
            user_repo.clone(),
        ),
        subscription_service: SubscriptionService::new(
            subscription_repo.clone(),
            user_repo.clone(),
        ),
        tweet_service: TweetService::new(tweet_repo, user_repo.clone(), like_repo.clone()),
        playlist_service: PlaylistService::new(playlist_repo, video_repo.clone(), user_repo.clone()),
        watch_history_service: WatchHistoryService::new(
            watch_history_repo,
            video_repo.clone(),
            user_repo.clone(),
        ),
        dashboard_service: DashboardService::new(
            video_repo,
            like_repo,
            comment_repo,
            subscription_repo,
        ),
    }
}

fn test_app() -> Router {
    let state = create_test_state();
    api_router()
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            vidtube_api::middleware::auth_middleware,
        ))
        .with_state(state)
}

#[tokio::test]
async fn test_healthcheck() {
    let app = test_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/healthcheck")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["success"], true);
}

#[tokio::test]
async fn test_me_requires_auth() {
    let app = test_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/users/me")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_watch_history_requires_auth() {
    let app = test_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/watch-history")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_register_rejects_short_password() {
    let app = test_app();

    let body = serde_json::json!({
        "username": "alice",
        "email": "alice@example.com",
        "fullName": "Alice",
        "password": "short",
    });

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/users/register")
                .header("Content-Type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_get_video_rejects_malformed_id() {
    let app = test_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/videos/not-a-valid-id")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["success"], false);
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let app = test_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/nope")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
