//! User service: accounts, sessions, profile assets, channel profiles.

use std::sync::Arc;

use argon2::password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::Utc;
use sea_orm::Set;
use tracing::{info, warn};
use vidtube_common::storage::generate_storage_key;
use vidtube_common::{AppError, AppResult, IdGenerator, StorageBackend, TokenIssuer};
use vidtube_db::{
    entities::user,
    repositories::{SubscriptionRepository, UserRepository},
};

use crate::views::{ChannelProfile, UserProfile};

/// A freshly issued session token pair.
#[derive(Debug, Clone)]
pub struct SessionTokens {
    /// Short-lived bearer token.
    pub access_token: String,
    /// Long-lived rotating token, persisted on the user row.
    pub refresh_token: String,
}

/// User service for business logic.
#[derive(Clone)]
pub struct UserService {
    user_repo: UserRepository,
    subscription_repo: SubscriptionRepository,
    storage: Arc<dyn StorageBackend>,
    tokens: TokenIssuer,
    id_gen: IdGenerator,
}

impl UserService {
    /// Create a new user service.
    #[must_use]
    pub fn new(
        user_repo: UserRepository,
        subscription_repo: SubscriptionRepository,
        storage: Arc<dyn StorageBackend>,
        tokens: TokenIssuer,
    ) -> Self {
        Self {
            user_repo,
            subscription_repo,
            storage,
            tokens,
            id_gen: IdGenerator::new(),
        }
    }

    /// Register a new account. Username is stored lowercase.
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        full_name: &str,
        password: &str,
    ) -> AppResult<user::Model> {
        if self.user_repo.find_by_username(username).await?.is_some() {
            return Err(AppError::BadRequest("Username already taken".to_string()));
        }
        if self.user_repo.find_by_email(email).await?.is_some() {
            return Err(AppError::BadRequest("Email already registered".to_string()));
        }

        let model = user::ActiveModel {
            id: Set(self.id_gen.generate()),
            username: Set(username.to_lowercase()),
            email: Set(email.to_string()),
            full_name: Set(full_name.to_string()),
            password_hash: Set(hash_password(password)?),
            avatar_url: Set(None),
            avatar_key: Set(None),
            cover_url: Set(None),
            cover_key: Set(None),
            watch_history_enabled: Set(true),
            refresh_token: Set(None),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        };

        let created = self.user_repo.create(model).await?;
        info!(user_id = %created.id, username = %created.username, "User registered");
        Ok(created)
    }

    /// Log in with a username or email. Issues a token pair and persists
    /// the refresh token on the user row.
    pub async fn login(
        &self,
        identifier: &str,
        password: &str,
    ) -> AppResult<(user::Model, SessionTokens)> {
        let found = self
            .user_repo
            .find_by_username_or_email(identifier, identifier)
            .await?;

        let Some(found) = found else {
            return Err(AppError::Unauthorized);
        };

        if !verify_password(password, &found.password_hash) {
            return Err(AppError::Unauthorized);
        }

        let tokens = self.issue_session(&found.id)?;

        let mut active: user::ActiveModel = found.into();
        active.refresh_token = Set(Some(tokens.refresh_token.clone()));
        let updated = self.user_repo.update(active).await?;

        Ok((updated, tokens))
    }

    /// Rotate the session: verify the presented refresh token against the
    /// stored one, then issue and persist a fresh pair.
    pub async fn refresh_session(&self, refresh_token: &str) -> AppResult<SessionTokens> {
        let user_id = self.tokens.verify_refresh_token(refresh_token)?;

        let user = self
            .user_repo
            .find_by_id(&user_id)
            .await?
            .ok_or(AppError::Unauthorized)?;

        if user.refresh_token.as_deref() != Some(refresh_token) {
            return Err(AppError::Unauthorized);
        }

        let tokens = self.issue_session(&user.id)?;

        let mut active: user::ActiveModel = user.into();
        active.refresh_token = Set(Some(tokens.refresh_token.clone()));
        self.user_repo.update(active).await?;

        Ok(tokens)
    }

    /// Resolve a bearer access token to its user row.
    pub async fn authenticate_by_access_token(&self, token: &str) -> AppResult<user::Model> {
        let user_id = self.tokens.verify_access_token(token)?;
        self.user_repo
            .find_by_id(&user_id)
            .await?
            .ok_or(AppError::Unauthorized)
    }

    /// Log out: clear the stored refresh token.
    pub async fn logout(&self, user: user::Model) -> AppResult<()> {
        let mut active: user::ActiveModel = user.into();
        active.refresh_token = Set(None);
        self.user_repo.update(active).await?;
        Ok(())
    }

    /// Change the password; the current one must verify.
    pub async fn change_password(
        &self,
        user: user::Model,
        current_password: &str,
        new_password: &str,
    ) -> AppResult<()> {
        if !verify_password(current_password, &user.password_hash) {
            return Err(AppError::BadRequest(
                "Current password is incorrect".to_string(),
            ));
        }

        let mut active: user::ActiveModel = user.into();
        active.password_hash = Set(hash_password(new_password)?);
        active.updated_at = Set(Some(Utc::now().into()));
        self.user_repo.update(active).await?;
        Ok(())
    }

    /// The authenticated user's own profile.
    #[must_use]
    pub fn profile(&self, user: &user::Model) -> UserProfile {
        UserProfile::from(user)
    }

    /// Update display details.
    pub async fn update_details(
        &self,
        user: user::Model,
        full_name: Option<String>,
        email: Option<String>,
    ) -> AppResult<user::Model> {
        if let Some(ref email) = email {
            if let Some(existing) = self.user_repo.find_by_email(email).await? {
                if existing.id != user.id {
                    return Err(AppError::BadRequest("Email already registered".to_string()));
                }
            }
        }

        let mut active: user::ActiveModel = user.into();
        if let Some(full_name) = full_name {
            active.full_name = Set(full_name);
        }
        if let Some(email) = email {
            active.email = Set(email);
        }
        active.updated_at = Set(Some(Utc::now().into()));
        self.user_repo.update(active).await
    }

    /// Replace the avatar: upload the new asset, swap the record, then
    /// delete the old asset.
    pub async fn update_avatar(
        &self,
        user: user::Model,
        data: &[u8],
        content_type: &str,
        original_name: &str,
    ) -> AppResult<user::Model> {
        let key = generate_storage_key(&user.id, original_name);
        let uploaded = self.storage.upload(&key, data, content_type).await?;

        let old_key = user.avatar_key.clone();
        let mut active: user::ActiveModel = user.into();
        active.avatar_url = Set(Some(uploaded.url));
        active.avatar_key = Set(Some(uploaded.key));
        active.updated_at = Set(Some(Utc::now().into()));
        let updated = self.user_repo.update(active).await?;

        // The record already points at the new asset; a failed delete
        // leaks the old file rather than failing the swap.
        if let Some(old_key) = old_key {
            if let Err(e) = self.storage.delete(&old_key).await {
                warn!(key = %old_key, error = %e, "Failed to delete replaced avatar");
            }
        }

        Ok(updated)
    }

    /// Replace the cover image; same ordering as the avatar swap.
    pub async fn update_cover(
        &self,
        user: user::Model,
        data: &[u8],
        content_type: &str,
        original_name: &str,
    ) -> AppResult<user::Model> {
        let key = generate_storage_key(&user.id, original_name);
        let uploaded = self.storage.upload(&key, data, content_type).await?;

        let old_key = user.cover_key.clone();
        let mut active: user::ActiveModel = user.into();
        active.cover_url = Set(Some(uploaded.url));
        active.cover_key = Set(Some(uploaded.key));
        active.updated_at = Set(Some(Utc::now().into()));
        let updated = self.user_repo.update(active).await?;

        if let Some(old_key) = old_key {
            if let Err(e) = self.storage.delete(&old_key).await {
                warn!(key = %old_key, error = %e, "Failed to delete replaced cover image");
            }
        }

        Ok(updated)
    }

    /// Flip watch-history recording; returns the new state.
    pub async fn toggle_watch_history(&self, user: user::Model) -> AppResult<bool> {
        let new_state = !user.watch_history_enabled;
        let mut active: user::ActiveModel = user.into();
        active.watch_history_enabled = Set(new_state);
        active.updated_at = Set(Some(Utc::now().into()));
        self.user_repo.update(active).await?;
        Ok(new_state)
    }

    /// Public channel profile, viewer-relative.
    pub async fn channel_profile(
        &self,
        username: &str,
        viewer_id: Option<&str>,
    ) -> AppResult<ChannelProfile> {
        let channel = self
            .user_repo
            .find_by_username(username)
            .await?
            .ok_or_else(|| AppError::UserNotFound(username.to_string()))?;

        let subscribers_count = self.subscription_repo.count_subscribers(&channel.id).await?;
        let subscribed_to_count = self
            .subscription_repo
            .count_subscriptions(&channel.id)
            .await?;

        let is_subscribed = match viewer_id {
            Some(viewer_id) => self
                .subscription_repo
                .find_pair(viewer_id, &channel.id)
                .await?
                .is_some(),
            None => false,
        };

        Ok(ChannelProfile {
            id: channel.id,
            username: channel.username,
            full_name: channel.full_name,
            avatar_url: channel.avatar_url,
            cover_url: channel.cover_url,
            subscribers_count,
            subscribed_to_count,
            is_subscribed,
        })
    }

    fn issue_session(&self, user_id: &str) -> AppResult<SessionTokens> {
        Ok(SessionTokens {
            access_token: self.tokens.issue_access_token(user_id)?,
            refresh_token: self.tokens.issue_refresh_token(user_id)?,
        })
    }
}

fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {e}")))
}

fn verify_password(password: &str, hash: &str) -> bool {
    PasswordHash::new(hash).is_ok_and(|parsed| {
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use vidtube_common::config::AuthConfig;
    use vidtube_common::LocalStorage;

    fn test_service(db: Arc<sea_orm::DatabaseConnection>) -> UserService {
        let auth = AuthConfig {
            access_token_secret: "test-access-secret".to_string(),
            access_token_ttl_secs: 900,
            refresh_token_secret: "test-refresh-secret".to_string(),
            refresh_token_ttl_secs: 3600,
        };
        UserService::new(
            UserRepository::new(db.clone()),
            SubscriptionRepository::new(db),
            Arc::new(LocalStorage::new(
                std::env::temp_dir(),
                "http://localhost/files".to_string(),
            )),
            TokenIssuer::new(&auth),
        )
    }

    fn create_test_user(id: &str, username: &str, password: &str) -> user::Model {
        user::Model {
            id: id.to_string(),
            username: username.to_string(),
            email: format!("{username}@example.com"),
            full_name: "Test User".to_string(),
            password_hash: hash_password(password).unwrap(),
            avatar_url: None,
            avatar_key: None,
            cover_url: None,
            cover_key: None,
            watch_history_enabled: true,
            refresh_token: None,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    #[test]
    fn test_password_hash_round_trip() {
        let hash = hash_password("hunter2").unwrap();
        assert!(verify_password("hunter2", &hash));
        assert!(!verify_password("hunter3", &hash));
    }

    #[tokio::test]
    async fn test_register_duplicate_username() {
        let existing = create_test_user("u1", "alice", "pw");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[existing]])
                .into_connection(),
        );

        let service = test_service(db);
        let err = service
            .register("alice", "new@example.com", "Alice", "pw")
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_login_wrong_password() {
        let user = create_test_user("u1", "alice", "correct");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[user]])
                .into_connection(),
        );

        let service = test_service(db);
        let err = service.login("alice", "wrong").await.unwrap_err();

        assert!(matches!(err, AppError::Unauthorized));
    }

    #[tokio::test]
    async fn test_login_unknown_user() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<user::Model>::new()])
                .into_connection(),
        );

        let service = test_service(db);
        let err = service.login("ghost", "pw").await.unwrap_err();

        assert!(matches!(err, AppError::Unauthorized));
    }

    #[tokio::test]
    async fn test_channel_profile_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<user::Model>::new()])
                .into_connection(),
        );

        let service = test_service(db);
        let err = service.channel_profile("ghost", None).await.unwrap_err();

        assert!(matches!(err, AppError::UserNotFound(_)));
    }

    /// In-memory backend whose deletes always fail.
    struct RefusingDeleteStorage;

    #[async_trait::async_trait]
    impl StorageBackend for RefusingDeleteStorage {
        async fn upload(
            &self,
            key: &str,
            data: &[u8],
            content_type: &str,
        ) -> AppResult<vidtube_common::UploadedFile> {
            Ok(vidtube_common::UploadedFile {
                key: key.to_string(),
                url: format!("/files/{key}"),
                size: data.len() as u64,
                content_type: content_type.to_string(),
                md5: String::new(),
            })
        }

        async fn delete(&self, _key: &str) -> AppResult<()> {
            Err(AppError::Storage("delete refused".to_string()))
        }

        fn public_url(&self, key: &str) -> String {
            format!("/files/{key}")
        }

        async fn exists(&self, _key: &str) -> AppResult<bool> {
            Ok(true)
        }
    }

    #[tokio::test]
    async fn test_update_avatar_tolerates_failed_old_delete() {
        let mut user = create_test_user("u1", "alice", "pw");
        user.avatar_key = Some("old.png".to_string());

        let mut updated = user.clone();
        updated.avatar_key = Some("new.png".to_string());

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[updated]])
                .into_connection(),
        );

        let auth = AuthConfig {
            access_token_secret: "test-access-secret".to_string(),
            access_token_ttl_secs: 900,
            refresh_token_secret: "test-refresh-secret".to_string(),
            refresh_token_ttl_secs: 3600,
        };
        let service = UserService::new(
            UserRepository::new(db.clone()),
            SubscriptionRepository::new(db),
            Arc::new(RefusingDeleteStorage),
            TokenIssuer::new(&auth),
        );

        let result = service
            .update_avatar(user, &[1, 2, 3], "image/png", "new.png")
            .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_refresh_session_rejects_stale_token() {
        let auth = AuthConfig {
            access_token_secret: "test-access-secret".to_string(),
            access_token_ttl_secs: 900,
            refresh_token_secret: "test-refresh-secret".to_string(),
            refresh_token_ttl_secs: 3600,
        };
        let issuer = TokenIssuer::new(&auth);
        let presented = issuer.issue_refresh_token("u1").unwrap();

        // Stored token differs from the presented one: rotation happened
        // elsewhere, so this session is stale.
        let mut user = create_test_user("u1", "alice", "pw");
        user.refresh_token = Some("something-else".to_string());

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[user]])
                .into_connection(),
        );

        let service = test_service(db);
        let err = service.refresh_session(&presented).await.unwrap_err();

        assert!(matches!(err, AppError::Unauthorized));
    }
}
