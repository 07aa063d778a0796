//! Comment mutation endpoints. Creation and listing live under the
//! video routes.

use axum::{
    extract::{Path, State},
    routing::patch,
    Json, Router,
};
use serde::Deserialize;
use validator::Validate;
use vidtube_common::AppResult;

use crate::{
    endpoints::videos::CommentResponse, extractors::AuthUser, middleware::AppState,
    response::ApiResponse,
};

/// Comment edit request.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCommentRequest {
    #[validate(length(min = 1, max = 1000))]
    pub content: String,
}

/// Edit a comment. Owner only.
async fn update_comment(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(comment_id): Path<String>,
    Json(req): Json<UpdateCommentRequest>,
) -> AppResult<ApiResponse<CommentResponse>> {
    req.validate()?;

    let updated = state
        .comment_service
        .update(&user.id, &comment_id, &req.content)
        .await?;

    Ok(ApiResponse::ok("Comment updated", CommentResponse::from(updated)))
}

/// Delete a comment and its likes. Owner only.
async fn delete_comment(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(comment_id): Path<String>,
) -> AppResult<ApiResponse<()>> {
    state.comment_service.delete(&user.id, &comment_id).await?;
    Ok(ApiResponse::<()>::message("Comment deleted"))
}

/// Comment routes.
pub fn router() -> Router<AppState> {
    Router::new().route("/{commentId}", patch(update_comment).delete(delete_comment))
}
