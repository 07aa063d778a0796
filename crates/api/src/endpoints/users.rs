//! User and auth endpoints.

use axum::{
    extract::{Multipart, Path, State},
    response::Response,
    routing::{get, patch, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use validator::Validate;
use vidtube_common::AppResult;
use vidtube_core::views::{ChannelProfile, UserProfile};

use crate::{
    endpoints::upload::MultipartForm,
    extractors::{AuthUser, MaybeAuthUser},
    middleware::AppState,
    response::{created, ApiResponse},
};

/// Registration request.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[validate(length(min = 3, max = 30))]
    pub username: String,

    #[validate(email)]
    pub email: String,

    #[validate(length(min = 1, max = 100))]
    pub full_name: String,

    #[validate(length(min = 8, max = 128))]
    pub password: String,
}

/// Register a new account.
async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> AppResult<Response> {
    req.validate()?;

    let user = state
        .user_service
        .register(&req.username, &req.email, &req.full_name, &req.password)
        .await?;

    Ok(created("User registered", UserProfile::from(&user)))
}

/// Login request. `identifier` is a username or email.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub identifier: String,
    pub password: String,
}

/// Login response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub user: UserProfile,
    pub access_token: String,
    pub refresh_token: String,
}

/// Log in and receive a token pair.
async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> AppResult<ApiResponse<LoginResponse>> {
    let (user, tokens) = state
        .user_service
        .login(&req.identifier, &req.password)
        .await?;

    Ok(ApiResponse::ok(
        "Logged in",
        LoginResponse {
            user: UserProfile::from(&user),
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
        },
    ))
}

/// Log out: invalidate the stored refresh token.
async fn logout(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<()>> {
    state.user_service.logout(user).await?;
    Ok(ApiResponse::<()>::message("Logged out"))
}

/// Refresh request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Token pair response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPairResponse {
    pub access_token: String,
    pub refresh_token: String,
}

/// Rotate the session against a stored refresh token.
async fn refresh_token(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> AppResult<ApiResponse<TokenPairResponse>> {
    let tokens = state.user_service.refresh_session(&req.refresh_token).await?;

    Ok(ApiResponse::ok(
        "Session refreshed",
        TokenPairResponse {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
        },
    ))
}

/// Password change request.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: String,

    #[validate(length(min = 8, max = 128))]
    pub new_password: String,
}

/// Change the password; the current one must verify.
async fn change_password(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<ChangePasswordRequest>,
) -> AppResult<ApiResponse<()>> {
    req.validate()?;

    state
        .user_service
        .change_password(user, &req.current_password, &req.new_password)
        .await?;

    Ok(ApiResponse::<()>::message("Password changed"))
}

/// The authenticated user's own profile.
async fn me(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<UserProfile>> {
    Ok(ApiResponse::ok("OK", state.user_service.profile(&user)))
}

/// Profile update request; absent fields are left untouched.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDetailsRequest {
    #[validate(length(min = 1, max = 100))]
    pub full_name: Option<String>,

    #[validate(email)]
    pub email: Option<String>,
}

/// Update display details.
async fn update_me(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<UpdateDetailsRequest>,
) -> AppResult<ApiResponse<UserProfile>> {
    req.validate()?;

    let updated = state
        .user_service
        .update_details(user, req.full_name, req.email)
        .await?;

    Ok(ApiResponse::ok("Details updated", UserProfile::from(&updated)))
}

/// Replace the avatar image.
async fn update_avatar(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    multipart: Multipart,
) -> AppResult<ApiResponse<UserProfile>> {
    let mut form = MultipartForm::stage(multipart).await?;
    let file = form.require_file("avatar")?;

    let updated = state
        .user_service
        .update_avatar(user, &file.data, &file.content_type, &file.file_name)
        .await?;

    Ok(ApiResponse::ok("Avatar updated", UserProfile::from(&updated)))
}

/// Replace the cover image.
async fn update_cover(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    multipart: Multipart,
) -> AppResult<ApiResponse<UserProfile>> {
    let mut form = MultipartForm::stage(multipart).await?;
    let file = form.require_file("coverImage")?;

    let updated = state
        .user_service
        .update_cover(user, &file.data, &file.content_type, &file.file_name)
        .await?;

    Ok(ApiResponse::ok("Cover updated", UserProfile::from(&updated)))
}

/// Watch-history toggle response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchHistoryToggleResponse {
    pub watch_history_enabled: bool,
}

/// Flip watch-history recording.
async fn toggle_watch_history(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<WatchHistoryToggleResponse>> {
    let enabled = state.user_service.toggle_watch_history(user).await?;

    Ok(ApiResponse::ok(
        "Watch history preference updated",
        WatchHistoryToggleResponse {
            watch_history_enabled: enabled,
        },
    ))
}

/// Public channel profile by username.
async fn channel_profile(
    MaybeAuthUser(viewer): MaybeAuthUser,
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> AppResult<ApiResponse<ChannelProfile>> {
    let profile = state
        .user_service
        .channel_profile(&username, viewer.as_ref().map(|u| u.id.as_str()))
        .await?;

    Ok(ApiResponse::ok("OK", profile))
}

/// User and auth routes.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/refresh-token", post(refresh_token))
        .route("/change-password", post(change_password))
        .route("/me", get(me).patch(update_me))
        .route("/avatar", patch(update_avatar))
        .route("/cover", patch(update_cover))
        .route("/watch-history", patch(toggle_watch_history))
        .route("/channel/{username}", get(channel_profile))
}
