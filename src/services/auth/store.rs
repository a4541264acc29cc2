use async_trait::async_trait;
use tracing::error;

use crate::repos::refresh_token_repo::RefreshTokenRepo;
use crate::repos::user_repo::UserRepo;
use crate::services::auth::error::AuthError;

/// A user as resolved by the directory (credentials already checked).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub user_name: String,
    pub role: String,
    pub customer_id: Option<String>,
    /// Comma-joined account numbers, as aggregated by the directory.
    pub accounts: Option<String>,
}

/// Username + password -> user record.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// `Err(CredentialInvalid)` when no user matches.
    async fn find_user(&self, user_name: &str, password: &str) -> Result<User, AuthError>;
}

/// Registry of issued refresh tokens.
///
/// A token registered by `register` must be visible to a later `exists`.
/// Registering a token that is already present succeeds.
#[async_trait]
pub trait RefreshTokenStore: Send + Sync {
    async fn register(&self, refresh_token: &str) -> Result<(), AuthError>;

    async fn exists(&self, refresh_token: &str) -> Result<bool, AuthError>;
}

#[async_trait]
impl UserDirectory for UserRepo {
    async fn find_user(&self, user_name: &str, password: &str) -> Result<User, AuthError> {
        let row = self.find_by_credentials(user_name, password).await.map_err(|e| {
            error!(user_name = %user_name, error = %e, "Failed to look up user");
            AuthError::PersistenceFailure
        })?;

        let row = row.ok_or(AuthError::CredentialInvalid)?;

        // A customer without accounts still gets the customer shape.
        let accounts = match row.customer_id {
            Some(_) => Some(row.account_numbers.unwrap_or_default()),
            None => None,
        };

        Ok(User {
            user_name: row.username,
            role: row.role,
            customer_id: row.customer_id,
            accounts,
        })
    }
}

#[async_trait]
impl RefreshTokenStore for RefreshTokenRepo {
    async fn register(&self, refresh_token: &str) -> Result<(), AuthError> {
        self.insert(refresh_token).await.map_err(|e| {
            error!(error = %e, "Failed to insert refresh token");
            AuthError::PersistenceFailure
        })
    }

    async fn exists(&self, refresh_token: &str) -> Result<bool, AuthError> {
        self.contains(refresh_token).await.map_err(|e| {
            error!(error = %e, "Failed to look up refresh token");
            AuthError::PersistenceFailure
        })
    }
}
