//! Registration, login and bearer-token resolution.

use crate::error::AppError;
use crate::models::User;
use crate::store::Store;
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use regex::Regex;

const USERNAME_PATTERN: &str = r"^[A-Za-z0-9_.@-]{1,64}$";

/// Token from an `Authorization` value: `Bearer <token>` or the bare token.
pub fn bearer_token(header_value: &str) -> &str {
    header_value
        .strip_prefix("Bearer ")
        .unwrap_or(header_value)
        .trim()
}

pub struct AuthService;

impl AuthService {
    /// Create a user with a hashed password. Duplicate usernames are a conflict.
    pub async fn register(store: &dyn Store, username: &str, password: &str) -> Result<User, AppError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(AppError::Validation("username is required".into()));
        }
        if password.is_empty() {
            return Err(AppError::Validation("password is required".into()));
        }
        let re = Regex::new(USERNAME_PATTERN)
            .map_err(|_| AppError::Internal("invalid username pattern".into()))?;
        if !re.is_match(username) {
            return Err(AppError::Validation(
                "username may only contain letters, digits, '_', '.', '@' and '-' (max 64)".into(),
            ));
        }
        let hash = hash_password(password.to_string()).await?;
        let user = store.create_user(username, &hash).await?;
        tracing::info!(user_id = user.id, username = %user.username, "user registered");
        Ok(user)
    }

    /// Verify credentials and issue a fresh token, replacing any previous one.
    pub async fn login(store: &dyn Store, username: &str, password: &str) -> Result<String, AppError> {
        let invalid = || AppError::Unauthorized("invalid username or password".into());
        let user = store
            .find_user_by_username(username.trim())
            .await?
            .ok_or_else(invalid)?;
        if !verify_password(password.to_string(), user.password_hash.clone()).await? {
            tracing::info!(user_id = user.id, "login rejected");
            return Err(invalid());
        }
        let token = uuid::Uuid::new_v4().simple().to_string();
        store.set_user_token(user.id, &token).await?;
        tracing::info!(user_id = user.id, "user logged in");
        Ok(token)
    }

    /// Resolve a session token to its user.
    pub async fn authenticate(store: &dyn Store, token: &str) -> Result<User, AppError> {
        if token.is_empty() {
            return Err(AppError::Unauthorized("token is required".into()));
        }
        store
            .find_user_by_token(token)
            .await?
            .ok_or_else(|| AppError::Unauthorized("invalid token".into()))
    }

    pub async fn list_users(store: &dyn Store) -> Result<Vec<User>, AppError> {
        store.list_users().await
    }
}

/// Argon2id hash in PHC string form. Runs on the blocking pool.
async fn hash_password(password: String) -> Result<String, AppError> {
    tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AppError::Internal(format!("password hash: {}", e)))
    })
    .await
    .map_err(|e| AppError::Internal(format!("password hash task: {}", e)))?
}

async fn verify_password(password: String, hash: String) -> Result<bool, AppError> {
    tokio::task::spawn_blocking(move || match PasswordHash::new(&hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            tracing::warn!(error = %e, "stored password hash is malformed");
            false
        }
    })
    .await
    .map_err(|e| AppError::Internal(format!("password verify task: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn bearer_prefix_is_optional() {
        assert_eq!(bearer_token("Bearer abc"), "abc");
        assert_eq!(bearer_token("abc"), "abc");
        assert_eq!(bearer_token("  abc  "), "abc");
        assert_eq!(bearer_token("Bearer "), "");
    }

    #[tokio::test]
    async fn register_hashes_password() {
        let store = MemoryStore::new();
        let user = AuthService::register(&store, "alice", "pw1234567").await.unwrap();
        assert_eq!(user.username, "alice");
        assert_ne!(user.password_hash, "pw1234567");
        assert!(user.password_hash.starts_with("$argon2"));
    }

    #[tokio::test]
    async fn register_rejects_duplicates_and_blank_fields() {
        let store = MemoryStore::new();
        AuthService::register(&store, "alice", "pw1234567").await.unwrap();
        let err = AuthService::register(&store, "alice", "other").await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        let err = AuthService::register(&store, "  ", "pw").await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        let err = AuthService::register(&store, "bob", "").await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        let err = AuthService::register(&store, "bob smith", "pw").await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn login_issues_new_token_each_time() {
        let store = MemoryStore::new();
        AuthService::register(&store, "alice", "pw1234567").await.unwrap();

        let first = AuthService::login(&store, "alice", "pw1234567").await.unwrap();
        let second = AuthService::login(&store, "alice", "pw1234567").await.unwrap();
        assert!(!first.is_empty());
        assert_ne!(first, second);

        let err = AuthService::authenticate(&store, &first).await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
        let user = AuthService::authenticate(&store, &second).await.unwrap();
        assert_eq!(user.username, "alice");
    }

    #[tokio::test]
    async fn login_rejects_wrong_password_and_unknown_user() {
        let store = MemoryStore::new();
        AuthService::register(&store, "alice", "pw1234567").await.unwrap();

        let err = AuthService::login(&store, "alice", "wrong").await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
        let err = AuthService::login(&store, "nobody", "pw1234567").await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn empty_token_is_unauthorized() {
        let store = MemoryStore::new();
        let err = AuthService::authenticate(&store, "").await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }
}
