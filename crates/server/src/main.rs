//! Vidtube server entry point.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{middleware, Router};
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vidtube_api::{middleware::AppState, router as api_router};
use vidtube_common::{Config, LocalStorage, TokenIssuer};
use vidtube_core::{
    CommentService, DashboardService, LikeService, PlaylistService, SubscriptionService,
    TweetService, UserService, VideoService, WatchHistoryService,
};
use vidtube_db::repositories::{
    CommentRepository, LikeRepository, PlaylistRepository, SubscriptionRepository,
    TweetRepository, UserRepository, VideoRepository, WatchHistoryRepository,
};

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vidtube=debug,tower_http=debug".into()),
        )
        .init();

    info!("Starting vidtube server...");

    let config = Config::load()?;

    let db = vidtube_db::init(&config).await?;
    info!("Connected to database");

    info!("Running database migrations...");
    vidtube_db::migrate(&db).await?;
    info!("Migrations completed");

    let storage_path = PathBuf::from(&config.storage.base_path);
    let storage = Arc::new(LocalStorage::new(
        storage_path.clone(),
        config.storage.base_url.clone(),
    ));
    let tokens = TokenIssuer::new(&config.auth);

    let db = Arc::new(db);
    let user_repo = UserRepository::new(Arc::clone(&db));
    let video_repo = VideoRepository::new(Arc::clone(&db));
    let comment_repo = CommentRepository::new(Arc::clone(&db));
    let like_repo = LikeRepository::new(Arc::clone(&db));
    let tweet_repo = TweetRepository::new(Arc::clone(&db));
    let subscription_repo = SubscriptionRepository::new(Arc::clone(&db));
    let playlist_repo = PlaylistRepository::new(Arc::clone(&db));
    let watch_history_repo = WatchHistoryRepository::new(Arc::clone(&db));

    let state = AppState {
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
        playlist_service: PlaylistService::new(
            playlist_repo,
            video_repo.clone(),
            user_repo.clone(),
        ),
        watch_history_service: WatchHistoryService::new(
            watch_history_repo,
            video_repo.clone(),
            user_repo,
        ),
        dashboard_service: DashboardService::new(
            video_repo,
            like_repo,
            comment_repo,
            subscription_repo,
        ),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .merge(api_router())
        .nest_service("/files", ServeDir::new(storage_path))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            vidtube_api::middleware::auth_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state);

    let addr = SocketAddr::new(config.server.host.parse()?, config.server.port);
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");
    Ok(())
}
