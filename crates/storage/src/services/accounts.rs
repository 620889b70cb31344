use argon2::password_hash::SaltString;
use argon2::password_hash::rand_core::OsRng;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use thiserror::Error;

use crate::dto::user::RegisterRequest;
use crate::error::StorageError;
use crate::models::{AuthProvider, NewUser, Role, User, normalize_email};
use crate::traits::UserDirectory;

#[derive(Debug, Error)]
pub enum AccountError {
    #[error("An account with this email already exists")]
    EmailTaken,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Password hashing failed: {0}")]
    Hashing(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

pub type Result<T> = std::result::Result<T, AccountError>;

pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AccountError::Hashing(e.to_string()))
}

pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            tracing::error!("Stored password hash is malformed: {}", e);
            false
        }
    }
}

/// Create a credentials account with the default `user` role.
pub async fn register<D>(directory: &D, request: &RegisterRequest) -> Result<User>
where
    D: UserDirectory + ?Sized,
{
    let email = normalize_email(&request.email);

    if directory.find_by_email(&email).await?.is_some() {
        return Err(AccountError::EmailTaken);
    }

    let password_hash = hash_password(&request.password)?;

    let user = directory
        .insert(NewUser {
            name: request.name.trim().to_string(),
            email,
            password_hash: Some(password_hash),
            auth_provider: AuthProvider::Credentials,
            role: Role::User,
        })
        .await
        .map_err(|e| match e {
            StorageError::ConstraintViolation(_) => AccountError::EmailTaken,
            other => AccountError::Storage(other),
        })?;

    tracing::info!(user_id = %user.id, "Registered new account");

    Ok(user)
}

/// Check an email/password pair. Every failure reason yields `InvalidCredentials`.
pub async fn verify_credentials<D>(directory: &D, email: &str, password: &str) -> Result<User>
where
    D: UserDirectory + ?Sized,
{
    let email = normalize_email(email);

    let user = directory
        .find_by_email(&email)
        .await?
        .ok_or(AccountError::InvalidCredentials)?;

    if !user.active || user.auth_provider != AuthProvider::Credentials {
        return Err(AccountError::InvalidCredentials);
    }

    let Some(stored_hash) = user.password_hash.as_deref() else {
        return Err(AccountError::InvalidCredentials);
    };

    if !verify_password(password, stored_hash) {
        return Err(AccountError::InvalidCredentials);
    }

    Ok(user)
}

/// Find or create the account behind an externally verified OAuth identity.
///
/// New accounts get the `google` provider, no password and the `user` role.
/// When a concurrent sign-in creates the account first, that account is returned.
pub async fn provision_oauth_user<D>(directory: &D, email: &str, name: &str) -> Result<User>
where
    D: UserDirectory + ?Sized,
{
    let email = normalize_email(email);

    if let Some(existing) = directory.find_by_email(&email).await? {
        tracing::debug!(user_id = %existing.id, "OAuth account already exists");
        return Ok(existing);
    }

    let inserted = directory
        .insert(NewUser {
            name: name.trim().to_string(),
            email: email.clone(),
            password_hash: None,
            auth_provider: AuthProvider::Google,
            role: Role::User,
        })
        .await;

    match inserted {
        Ok(user) => {
            tracing::info!(user_id = %user.id, "Provisioned OAuth account");
            Ok(user)
        }
        Err(StorageError::ConstraintViolation(_)) => {
            let existing = directory
                .find_by_email(&email)
                .await?
                .ok_or(AccountError::EmailTaken)?;
            tracing::debug!(user_id = %existing.id, "OAuth account created concurrently");
            Ok(existing)
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryUserDirectory;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};
    use uuid::Uuid;

    fn register_request(email: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            name: " Maria Ionescu ".to_string(),
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("parola123").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("parola123", &hash));
        assert!(!verify_password("parola124", &hash));
        assert!(!verify_password("parola123", "not-a-hash"));
    }

    #[tokio::test]
    async fn test_register_normalizes_and_defaults() {
        let directory = InMemoryUserDirectory::new();
        let user = register(&directory, &register_request(" Maria@Example.RO ", "secret1"))
            .await
            .unwrap();

        assert_eq!(user.email, "maria@example.ro");
        assert_eq!(user.name, "Maria Ionescu");
        assert_eq!(user.role, Role::User);
        assert_eq!(user.auth_provider, AuthProvider::Credentials);
        assert_ne!(user.password_hash.as_deref(), Some("secret1"));
    }

    #[tokio::test]
    async fn test_register_duplicate_email() {
        let directory = InMemoryUserDirectory::new();
        register(&directory, &register_request("maria@example.ro", "secret1"))
            .await
            .unwrap();

        let err = register(&directory, &register_request("MARIA@example.ro", "other12"))
            .await
            .unwrap_err();
        assert!(matches!(err, AccountError::EmailTaken));
    }

    #[tokio::test]
    async fn test_verify_credentials() {
        let directory = InMemoryUserDirectory::new();
        register(&directory, &register_request("maria@example.ro", "secret1"))
            .await
            .unwrap();

        let user = verify_credentials(&directory, "Maria@Example.ro", "secret1")
            .await
            .unwrap();
        assert_eq!(user.email, "maria@example.ro");

        let err = verify_credentials(&directory, "maria@example.ro", "wrong")
            .await
            .unwrap_err();
        assert!(matches!(err, AccountError::InvalidCredentials));

        let err = verify_credentials(&directory, "nobody@example.ro", "secret1")
            .await
            .unwrap_err();
        assert!(matches!(err, AccountError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_oauth_account_cannot_use_password_login() {
        let directory = InMemoryUserDirectory::new();
        provision_oauth_user(&directory, "g@example.ro", "G User")
            .await
            .unwrap();

        let err = verify_credentials(&directory, "g@example.ro", "google-auth")
            .await
            .unwrap_err();
        assert!(matches!(err, AccountError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_provision_oauth_user_is_idempotent() {
        let directory = InMemoryUserDirectory::new();
        let first = provision_oauth_user(&directory, "G@Example.ro", "G User")
            .await
            .unwrap();
        let second = provision_oauth_user(&directory, "g@example.ro", "Other Name")
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(first.auth_provider, AuthProvider::Google);
        assert!(first.password_hash.is_none());
    }

    #[tokio::test]
    async fn test_provision_keeps_existing_credentials_account() {
        let directory = InMemoryUserDirectory::new();
        let registered = register(&directory, &register_request("maria@example.ro", "secret1"))
            .await
            .unwrap();

        let user = provision_oauth_user(&directory, "maria@example.ro", "Maria")
            .await
            .unwrap();
        assert_eq!(user.id, registered.id);
        assert_eq!(user.auth_provider, AuthProvider::Credentials);
    }

    /// Hides accounts from the first email lookup, as if another sign-in
    /// inserted the account right after it.
    struct LateInsertDirectory {
        inner: InMemoryUserDirectory,
        hide_next_lookup: AtomicBool,
    }

    #[async_trait]
    impl UserDirectory for LateInsertDirectory {
        async fn find_by_id(&self, id: Uuid) -> crate::error::Result<Option<User>> {
            self.inner.find_by_id(id).await
        }

        async fn find_by_email(&self, email: &str) -> crate::error::Result<Option<User>> {
            if self.hide_next_lookup.swap(false, Ordering::SeqCst) {
                return Ok(None);
            }
            self.inner.find_by_email(email).await
        }

        async fn insert(&self, user: NewUser) -> crate::error::Result<User> {
            self.inner.insert(user).await
        }
    }

    #[tokio::test]
    async fn test_provision_returns_account_created_concurrently() {
        let directory = LateInsertDirectory {
            inner: InMemoryUserDirectory::new(),
            hide_next_lookup: AtomicBool::new(true),
        };
        let winner = directory
            .inner
            .insert(NewUser {
                name: "G User".to_string(),
                email: "g@example.ro".to_string(),
                password_hash: None,
                auth_provider: AuthProvider::Google,
                role: Role::User,
            })
            .await
            .unwrap();

        let user = provision_oauth_user(&directory, "G@example.ro", "G User")
            .await
            .unwrap();
        assert_eq!(user.id, winner.id);
    }

    #[tokio::test]
    async fn test_provision_propagates_directory_failure() {
        let directory = InMemoryUserDirectory::new();
        directory.set_unavailable(true);

        let err = provision_oauth_user(&directory, "g@example.ro", "G User")
            .await
            .unwrap_err();
        assert!(matches!(err, AccountError::Storage(StorageError::Database(_))));
    }
}
