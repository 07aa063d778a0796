//! Healthcheck endpoint.

use axum::{routing::get, Router};

use crate::{middleware::AppState, response::ApiResponse};

async fn healthcheck() -> ApiResponse<()> {
    ApiResponse::<()>::message("OK")
}

/// Healthcheck routes.
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(healthcheck))
}
