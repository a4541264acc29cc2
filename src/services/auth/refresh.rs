use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::services::auth::claims::{AccessClaims, ClaimSet};
use crate::services::auth::error::AuthError;
use crate::services::auth::jwt::TokenCodec;
use crate::services::auth::store::RefreshTokenStore;
use crate::services::auth::token_issuer::TokenIssuer;

/// New access token paired with the unchanged refresh token.
#[derive(Clone, Debug)]
pub struct RefreshedTokens {
    pub access_token: String,
    pub refresh_token: String,
}

/// Trades an expired access token plus its registered refresh token for a new
/// access token.
///
/// A live access token is never refreshed, so refresh cannot extend a session
/// that has not ended yet. The refresh token is reused, not rotated.
#[derive(Clone)]
pub struct RefreshCoordinator {
    codec: Arc<dyn TokenCodec>,
    store: Arc<dyn RefreshTokenStore>,
    issuer: TokenIssuer,
}

impl std::fmt::Debug for RefreshCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshCoordinator")
            .field("issuer", &self.issuer)
            .finish()
    }
}

impl RefreshCoordinator {
    pub fn new(
        codec: Arc<dyn TokenCodec>,
        store: Arc<dyn RefreshTokenStore>,
        issuer: TokenIssuer,
    ) -> Self {
        Self {
            codec,
            store,
            issuer,
        }
    }

    pub async fn refresh(
        &self,
        access_token: &str,
        refresh_token: &str,
        now: DateTime<Utc>,
    ) -> Result<RefreshedTokens, AuthError> {
        // Signature only; expiry is decided below.
        let access = ClaimSet::decode(self.codec.verify(access_token)?)?.into_access()?;

        if !access.is_expired(now) {
            debug!(user_name = %access.user_name, expires_at = %access.expires_at, "access token still live");
            return Err(AuthError::RefreshNotExpiredYet);
        }

        if !self.store.exists(refresh_token).await? {
            warn!(user_name = %access.user_name, "refresh token not registered");
            return Err(AuthError::RefreshTokenUnregistered);
        }

        self.check_refresh_token(refresh_token, &access, now)?;

        let renewed = access.reissue(now + self.issuer.access_ttl());
        let access_token = self.issuer.sign_access(&renewed)?;

        info!(
            user_name = %renewed.user_name,
            expires_at = %renewed.expires_at,
            "Refreshed access token"
        );

        Ok(RefreshedTokens {
            access_token,
            refresh_token: refresh_token.to_string(),
        })
    }

    // The registered refresh token must itself be valid and belong to the same holder.
    fn check_refresh_token(
        &self,
        refresh_token: &str,
        access: &AccessClaims,
        now: DateTime<Utc>,
    ) -> Result<(), AuthError> {
        let claims = self
            .codec
            .verify(refresh_token)
            .and_then(ClaimSet::decode)
            .and_then(ClaimSet::into_refresh)
            .map_err(|e| {
                debug!(error = %e, "refresh token rejected");
                AuthError::RefreshTokenInvalid
            })?;

        if claims.is_expired(now) || !claims.same_identity(access) {
            debug!(user_name = %access.user_name, "refresh token expired or issued to someone else");
            return Err(AuthError::RefreshTokenInvalid);
        }

        Ok(())
    }
}
