//! Email/password identity and bearer sessions
//!
//! Accounts hold an Argon2 hash; sign-in issues a random token of which only
//! the SHA-256 digest is stored, so a leaked database cannot be replayed.

pub mod password;

use crate::config::AuthConfig;
use crate::error::{PathwiseError, Result, StoreErrorKind};
use crate::storage::StorageBackend;
use crate::types::{Account, AuthSession, UserId};
use chrono::{DateTime, Duration, Utc};
use once_cell::sync::Lazy;
use rand::distributions::Alphanumeric;
use rand::Rng;
use regex::Regex;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tracing::{debug, info};

pub use password::{hash_password, verify_password};

pub const MIN_PASSWORD_LEN: usize = 6;

const TOKEN_LEN: usize = 48;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid")
});

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email.trim())
}

/// Hex SHA-256 of a session token
pub fn hash_token(token: &str) -> String {
    format!("{:x}", Sha256::digest(token.as_bytes()))
}

fn generate_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LEN)
        .map(char::from)
        .collect()
}

/// Token handed to the client after sign-in
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignedIn {
    pub token: String,
    pub user_id: UserId,
    pub expires_at: DateTime<Utc>,
}

pub struct AuthService {
    storage: Arc<dyn StorageBackend>,
    session_ttl: Duration,
}

impl AuthService {
    pub fn new(storage: Arc<dyn StorageBackend>, config: &AuthConfig) -> Self {
        Self {
            storage,
            session_ttl: Duration::hours(config.session_ttl_hours.max(1)),
        }
    }

    /// Create an account. The email is lower-cased and must be unused.
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<Account> {
        let email = email.trim().to_lowercase();
        if !is_valid_email(&email) {
            return Err(PathwiseError::validation("Please enter a valid email address"));
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(PathwiseError::validation(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }
        if self.storage.get_account_by_email(&email).await?.is_some() {
            return Err(PathwiseError::validation("Email is already registered"));
        }

        let account = Account {
            id: UserId::new(),
            email,
            password_hash: hash_password(password)?,
            created_at: Utc::now(),
        };
        match self.storage.create_account(&account).await {
            Ok(()) => {}
            Err(PathwiseError::Store {
                kind: StoreErrorKind::Constraint,
                ..
            }) => return Err(PathwiseError::validation("Email is already registered")),
            Err(e) => return Err(e),
        }
        info!("Registered account {}", account.id);
        Ok(account)
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<SignedIn> {
        let email = email.trim().to_lowercase();
        let account = self
            .storage
            .get_account_by_email(&email)
            .await?
            .ok_or(PathwiseError::InvalidCredentials)?;
        if !verify_password(password, &account.password_hash)? {
            debug!("Password mismatch for {}", account.id);
            return Err(PathwiseError::InvalidCredentials);
        }

        let token = generate_token();
        let now = Utc::now();
        let session = AuthSession {
            token_hash: hash_token(&token),
            user_id: account.id,
            created_at: now,
            expires_at: now + self.session_ttl,
        };
        self.storage.create_auth_session(&session).await?;
        info!("{} signed in", account.id);
        Ok(SignedIn {
            token,
            user_id: account.id,
            expires_at: session.expires_at,
        })
    }

    /// Resolve a token to its user; unknown or expired tokens are unauthorized
    pub async fn get_user(&self, token: &str) -> Result<UserId> {
        let token_hash = hash_token(token.trim());
        let session = self
            .storage
            .get_auth_session(&token_hash)
            .await?
            .ok_or(PathwiseError::Unauthorized)?;
        if session.is_expired(Utc::now()) {
            debug!("Session of {} expired at {}", session.user_id, session.expires_at);
            self.storage.delete_auth_session(&token_hash).await?;
            return Err(PathwiseError::Unauthorized);
        }
        Ok(session.user_id)
    }

    pub async fn sign_out(&self, token: &str) -> Result<()> {
        self.storage
            .delete_auth_session(&hash_token(token.trim()))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::test_utils::create_test_storage;

    fn config() -> AuthConfig {
        AuthConfig {
            session_ttl_hours: 1,
        }
    }

    #[test]
    fn test_email_format() {
        assert!(is_valid_email("ada@example.com"));
        assert!(is_valid_email("  grace.hopper@navy.mil "));
        assert!(!is_valid_email("ada@example"));
        assert!(!is_valid_email("ada example@x.com"));
        assert!(!is_valid_email("@example.com"));
    }

    #[test]
    fn test_token_hash_is_hex_sha256() {
        let hash = hash_token("abc");
        assert_eq!(hash.len(), 64);
        assert_eq!(
            hash,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[tokio::test]
    async fn test_sign_up_rules() {
        let (storage, _dir) = create_test_storage().await.unwrap();
        let auth = AuthService::new(storage, &config());

        let err = auth.sign_up("not-an-email", "secret1").await.unwrap_err();
        assert!(matches!(err, PathwiseError::Validation(_)));
        let err = auth.sign_up("ada@example.com", "12345").await.unwrap_err();
        assert!(matches!(err, PathwiseError::Validation(_)));

        let account = auth.sign_up("Ada@Example.com", "123456").await.unwrap();
        assert_eq!(account.email, "ada@example.com");
        assert_ne!(account.password_hash, "123456");

        let err = auth.sign_up("ada@example.com", "abcdef").await.unwrap_err();
        assert!(matches!(err, PathwiseError::Validation(_)));
    }

    #[tokio::test]
    async fn test_sign_in_and_out() {
        let (storage, _dir) = create_test_storage().await.unwrap();
        let auth = AuthService::new(storage, &config());
        let account = auth.sign_up("ada@example.com", "lovelace").await.unwrap();

        let err = auth.sign_in("ada@example.com", "babbage").await.unwrap_err();
        assert!(matches!(err, PathwiseError::InvalidCredentials));
        let err = auth.sign_in("nobody@example.com", "lovelace").await.unwrap_err();
        assert!(matches!(err, PathwiseError::InvalidCredentials));

        let signed_in = auth.sign_in("ADA@example.com", "lovelace").await.unwrap();
        assert_eq!(signed_in.user_id, account.id);
        assert_eq!(auth.get_user(&signed_in.token).await.unwrap(), account.id);

        auth.sign_out(&signed_in.token).await.unwrap();
        let err = auth.get_user(&signed_in.token).await.unwrap_err();
        assert!(matches!(err, PathwiseError::Unauthorized));
    }

    #[tokio::test]
    async fn test_expired_session_is_unauthorized() {
        let (storage, _dir) = create_test_storage().await.unwrap();
        let token = "stale-token";
        let past = Utc::now() - Duration::hours(2);
        storage
            .create_auth_session(&AuthSession {
                token_hash: hash_token(token),
                user_id: UserId::new(),
                created_at: past,
                expires_at: past + Duration::hours(1),
            })
            .await
            .unwrap();

        let auth = AuthService::new(storage.clone(), &config());
        let err = auth.get_user(token).await.unwrap_err();
        assert!(matches!(err, PathwiseError::Unauthorized));
        assert!(storage.get_auth_session(&hash_token(token)).await.unwrap().is_none());
    }
}
