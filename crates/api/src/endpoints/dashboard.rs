//! Owner dashboard endpoints.

use axum::{
    extract::{Query, State},
    routing::get,
    Router,
};
use vidtube_common::{AppResult, Page, PageRequest};
use vidtube_core::views::{ChannelStats, DashboardVideo};

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// The authenticated channel's totals.
async fn stats(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<ChannelStats>> {
    let stats = state.dashboard_service.stats(&user.id).await?;
    Ok(ApiResponse::ok("OK", stats))
}

/// Page of the channel's own videos, unpublished included.
async fn videos(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Query(page): Query<PageRequest>,
) -> AppResult<ApiResponse<Page<DashboardVideo>>> {
    let videos = state.dashboard_service.videos(&user.id, page).await?;
    Ok(ApiResponse::ok("OK", videos))
}

/// Dashboard routes.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/stats", get(stats))
        .route("/videos", get(videos))
}
