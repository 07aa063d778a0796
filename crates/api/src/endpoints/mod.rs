//! API endpoints.

mod comments;
mod dashboard;
mod healthcheck;
mod likes;
mod playlists;
mod subscriptions;
mod tweets;
mod upload;
mod users;
mod videos;
mod watch_history;

use axum::Router;

use crate::middleware::AppState;

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/healthcheck", healthcheck::router())
        .nest("/users", users::router())
        .nest("/videos", videos::router())
        .nest("/comments", comments::router())
        .nest("/likes", likes::router())
        .nest("/subscriptions", subscriptions::router())
        .nest("/tweets", tweets::router())
        .nest("/playlists", playlists::router())
        .nest("/watch-history", watch_history::router())
        .nest("/dashboard", dashboard::router())
}
