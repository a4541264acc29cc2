use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::{debug, info};

use crate::services::auth::claims::{AccessClaims, ClaimSet};
use crate::services::auth::error::AuthError;
use crate::services::auth::jwt::TokenCodec;
use crate::services::auth::store::{RefreshTokenStore, User};

/// Result of a login: both tokens plus the issuance instant for display.
#[derive(Clone, Debug)]
pub struct IssuedTokens {
    pub access_token: String,
    pub refresh_token: String,
    pub issued_at: DateTime<Utc>,
}

/// Builds and signs access/refresh token pairs for verified users.
#[derive(Clone)]
pub struct TokenIssuer {
    codec: Arc<dyn TokenCodec>,
    store: Arc<dyn RefreshTokenStore>,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish()
    }
}

impl TokenIssuer {
    pub fn new(
        codec: Arc<dyn TokenCodec>,
        store: Arc<dyn RefreshTokenStore>,
        access_ttl: Duration,
        refresh_ttl: Duration,
    ) -> Self {
        Self {
            codec,
            store,
            access_ttl,
            refresh_ttl,
        }
    }

    /// Issue an access token and a registered refresh token for `user`.
    ///
    /// Nothing is returned unless the refresh token was persisted.
    pub async fn issue(&self, user: &User, now: DateTime<Utc>) -> Result<IssuedTokens, AuthError> {
        let access = self.access_claims(user, now);
        let access_token = self.sign_access(&access)?;

        let refresh = access.to_refresh_claims(now + self.refresh_ttl);
        let refresh_token = self.codec.sign(&ClaimSet::Refresh(refresh))?;

        self.store.register(&refresh_token).await?;

        info!(
            user_name = %user.user_name,
            role = %user.role,
            expires_at = %access.expires_at,
            "Issued token pair"
        );

        Ok(IssuedTokens {
            access_token,
            refresh_token,
            issued_at: now,
        })
    }

    /// Customer shape when the user has both a customer id and an account list,
    /// admin shape otherwise.
    pub fn access_claims(&self, user: &User, now: DateTime<Utc>) -> AccessClaims {
        let expires_at = now + self.access_ttl;

        match (&user.customer_id, &user.accounts) {
            (Some(customer_id), Some(accounts)) => AccessClaims::customer(
                user.user_name.clone(),
                user.role.clone(),
                customer_id.clone(),
                parse_accounts(accounts),
                expires_at,
            ),
            _ => {
                debug!(user_name = %user.user_name, "No customer scope, issuing admin claims");
                AccessClaims::admin(user.user_name.clone(), user.role.clone(), expires_at)
            }
        }
    }

    pub fn sign_access(&self, claims: &AccessClaims) -> Result<String, AuthError> {
        self.codec.sign(&ClaimSet::Access(claims.clone()))
    }

    pub fn access_ttl(&self) -> Duration {
        self.access_ttl
    }
}

fn parse_accounts(joined: &str) -> Vec<String> {
    joined
        .split(',')
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .map(str::to_string)
        .collect()
}
