//! Watch-history endpoints.

use axum::{
    extract::{Path, Query, State},
    routing::{delete, get},
    Router,
};
use vidtube_common::{AppResult, Page, PageRequest};
use vidtube_core::views::WatchHistoryEntry;

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// Page of the viewer's watch history, newest first.
async fn list(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Query(page): Query<PageRequest>,
) -> AppResult<ApiResponse<Page<WatchHistoryEntry>>> {
    let history = state.watch_history_service.list(&user.id, page).await?;
    Ok(ApiResponse::ok("OK", history))
}

/// Delete one watch event.
async fn delete_one(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<()>> {
    state.watch_history_service.delete_one(&user.id, &id).await?;
    Ok(ApiResponse::<()>::message("Watch history entry deleted"))
}

/// Clear the viewer's entire history.
async fn clear(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<()>> {
    state.watch_history_service.clear(&user.id).await?;
    Ok(ApiResponse::<()>::message("Watch history cleared"))
}

/// Watch-history routes.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).delete(clear))
        .route("/{id}", delete(delete_one))
}
