//! Subscription endpoints.

use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Router,
};
use serde::Serialize;
use vidtube_common::{AppResult, Page, PageRequest};
use vidtube_core::views::{SubscriberView, SubscriptionCounts};

use crate::{
    extractors::{AuthUser, MaybeAuthUser},
    middleware::AppState,
    response::ApiResponse,
};

/// Toggle outcome: the new subscription state.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleResponse {
    pub is_subscribed: bool,
}

/// Toggle the viewer's subscription to a channel.
async fn toggle(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(channel_id): Path<String>,
) -> AppResult<ApiResponse<ToggleResponse>> {
    let is_subscribed = state
        .subscription_service
        .toggle(&user.id, &channel_id)
        .await?;

    Ok(ApiResponse::ok(
        "Subscription toggled",
        ToggleResponse { is_subscribed },
    ))
}

/// Page of a channel's subscribers.
async fn subscribers(
    viewer: MaybeAuthUser,
    State(state): State<AppState>,
    Path(channel_id): Path<String>,
    Query(page): Query<PageRequest>,
) -> AppResult<ApiResponse<Page<SubscriberView>>> {
    let subscribers = state
        .subscription_service
        .subscribers(&channel_id, viewer.viewer_id(), page)
        .await?;

    Ok(ApiResponse::ok("OK", subscribers))
}

/// Page of the channels a user subscribes to.
async fn subscribed_channels(
    viewer: MaybeAuthUser,
    State(state): State<AppState>,
    Path(channel_id): Path<String>,
    Query(page): Query<PageRequest>,
) -> AppResult<ApiResponse<Page<SubscriberView>>> {
    let channels = state
        .subscription_service
        .subscribed_channels(&channel_id, viewer.viewer_id(), page)
        .await?;

    Ok(ApiResponse::ok("OK", channels))
}

/// A channel's subscription counters, viewer-relative.
async fn counts(
    viewer: MaybeAuthUser,
    State(state): State<AppState>,
    Path(channel_id): Path<String>,
) -> AppResult<ApiResponse<SubscriptionCounts>> {
    let counts = state
        .subscription_service
        .counts(&channel_id, viewer.viewer_id())
        .await?;

    Ok(ApiResponse::ok("OK", counts))
}

/// Subscription routes.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{channelId}", post(toggle))
        .route("/{channelId}/counts", get(counts))
        .route("/subscribers/{channelId}", get(subscribers))
        .route("/subscribed/{channelId}", get(subscribed_channels))
}
