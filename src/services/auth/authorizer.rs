use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::{debug, info};

use crate::services::auth::claims::{AccessClaims, ClaimSet};
use crate::services::auth::error::AuthError;
use crate::services::auth::jwt::TokenCodec;
use crate::services::auth::roles::RolePermissions;

/// What a downstream banking API asks to be checked.
#[derive(Debug, Clone, Default)]
pub struct VerifyParams {
    pub operation: String,
    pub customer_id: Option<String>,
    /// Target account id.
    pub id: Option<String>,
}

/// Checks an access token against a requested operation on a resource.
#[derive(Clone)]
pub struct RequestAuthorizer {
    codec: Arc<dyn TokenCodec>,
    roles: Arc<RolePermissions>,
    customer_grace: Duration,
}

impl std::fmt::Debug for RequestAuthorizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestAuthorizer")
            .field("roles", &self.roles)
            .field("customer_grace", &self.customer_grace)
            .finish()
    }
}

impl RequestAuthorizer {
    pub fn new(
        codec: Arc<dyn TokenCodec>,
        roles: Arc<RolePermissions>,
        customer_grace: Duration,
    ) -> Self {
        Self {
            codec,
            roles,
            customer_grace,
        }
    }

    /// Allow/deny decision.
    ///
    /// - `Ok(true)`: allowed
    /// - `Ok(false)`: valid token, request denied (ownership, expiry or role)
    /// - `Err(_)`: the token itself is unusable (signature, claim shape, token type)
    pub fn verify(
        &self,
        token: &str,
        params: &VerifyParams,
        now: DateTime<Utc>,
    ) -> Result<bool, AuthError> {
        match self.authorize(token, params, now) {
            Ok(_) => Ok(true),
            Err(e) if e.is_denial() => {
                info!(operation = %params.operation, reason = %e, "request denied");
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    /// Same checks as `verify`, reporting the denial reason as an error.
    ///
    /// Order: signature, claim decode, ownership + grace expiry (customer role only),
    /// then the role permission matrix.
    pub fn authorize(
        &self,
        token: &str,
        params: &VerifyParams,
        now: DateTime<Utc>,
    ) -> Result<AccessClaims, AuthError> {
        let opaque = self.codec.verify(token)?;
        let claims = ClaimSet::decode(opaque)?.into_access()?;

        if claims.is_customer_role() {
            let customer_id = params.customer_id.as_deref().unwrap_or_default();
            let account = params.id.as_deref().unwrap_or_default();

            if !claims.owns(customer_id, account) {
                debug!(user_name = %claims.user_name, "customer/account does not belong to token holder");
                return Err(AuthError::OwnershipMismatch);
            }

            if claims.expired_beyond_grace(now, self.customer_grace) {
                debug!(user_name = %claims.user_name, expires_at = %claims.expires_at, "customer token past grace window");
                return Err(AuthError::TokenExpired);
            }
        }

        if !self.roles.is_authorized(&claims.role, &params.operation) {
            return Err(AuthError::PermissionDenied {
                role: claims.role,
                operation: params.operation.trim().to_string(),
            });
        }

        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::auth::jwt::JwtCodec;
    use chrono::TimeZone;

    const SECRET: &[u8] = b"authorizer-test-secret";

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    fn authorizer() -> RequestAuthorizer {
        RequestAuthorizer::new(
            Arc::new(JwtCodec::hs256(SECRET)),
            Arc::new(RolePermissions::banking()),
            Duration::hours(1),
        )
    }

    fn sign(claims: ClaimSet) -> String {
        JwtCodec::hs256(SECRET).sign(&claims).unwrap()
    }

    fn alice_token(expires_at: DateTime<Utc>) -> String {
        sign(ClaimSet::Access(AccessClaims::customer(
            "alice".into(),
            "user".into(),
            "42".into(),
            vec!["100".into(), "101".into()],
            expires_at,
        )))
    }

    fn admin_token(expires_at: DateTime<Utc>) -> String {
        sign(ClaimSet::Access(AccessClaims::admin(
            "root".into(),
            "admin".into(),
            expires_at,
        )))
    }

    fn params(operation: &str, customer_id: &str, id: &str) -> VerifyParams {
        VerifyParams {
            operation: operation.into(),
            customer_id: Some(customer_id.into()),
            id: Some(id.into()),
        }
    }

    #[test]
    fn customer_on_own_account_is_allowed() {
        let token = alice_token(now() + Duration::hours(1));
        let allowed = authorizer()
            .verify(&token, &params("NewTransaction", "42", "100"), now())
            .unwrap();
        assert!(allowed);
    }

    #[test]
    fn customer_on_foreign_account_is_denied() {
        let token = alice_token(now() + Duration::hours(1));
        let authorizer = authorizer();
        let p = params("NewTransaction", "42", "999");

        assert!(matches!(
            authorizer.authorize(&token, &p, now()),
            Err(AuthError::OwnershipMismatch)
        ));
        assert!(!authorizer.verify(&token, &p, now()).unwrap());
    }

    #[test]
    fn customer_with_foreign_customer_id_is_denied() {
        let token = alice_token(now() + Duration::hours(1));
        let p = params("GetCustomer", "7", "100");

        assert!(matches!(
            authorizer().authorize(&token, &p, now()),
            Err(AuthError::OwnershipMismatch)
        ));
    }

    #[test]
    fn ownership_is_checked_before_role_permissions() {
        let token = alice_token(now() + Duration::hours(1));
        let p = params("NewAccount", "42", "999");

        assert!(matches!(
            authorizer().authorize(&token, &p, now()),
            Err(AuthError::OwnershipMismatch)
        ));
    }

    #[test]
    fn customer_without_params_is_denied() {
        let token = alice_token(now() + Duration::hours(1));
        let p = VerifyParams {
            operation: "GetCustomer".into(),
            ..VerifyParams::default()
        };

        assert!(!authorizer().verify(&token, &p, now()).unwrap());
    }

    #[test]
    fn customer_grace_window_boundary() {
        let authorizer = authorizer();
        let p = params("NewTransaction", "42", "100");

        let expired_59_minutes_ago = alice_token(now() - Duration::minutes(59));
        assert!(authorizer.verify(&expired_59_minutes_ago, &p, now()).unwrap());

        let expired_61_minutes_ago = alice_token(now() - Duration::minutes(61));
        assert!(matches!(
            authorizer.authorize(&expired_61_minutes_ago, &p, now()),
            Err(AuthError::TokenExpired)
        ));
        assert!(!authorizer.verify(&expired_61_minutes_ago, &p, now()).unwrap());
    }

    #[test]
    fn customer_role_lacks_admin_operations() {
        let token = alice_token(now() + Duration::hours(1));
        let p = params("NewAccount", "42", "100");

        assert!(matches!(
            authorizer().authorize(&token, &p, now()),
            Err(AuthError::PermissionDenied { .. })
        ));
    }

    #[test]
    fn admin_skips_ownership_and_expiry() {
        let authorizer = authorizer();
        let p = VerifyParams {
            operation: "GetAllCustomer".into(),
            ..VerifyParams::default()
        };

        let fresh = admin_token(now() + Duration::hours(1));
        assert!(authorizer.verify(&fresh, &p, now()).unwrap());

        let long_expired = admin_token(now() - Duration::days(2));
        assert!(authorizer.verify(&long_expired, &p, now()).unwrap());
    }

    #[test]
    fn admin_is_still_bound_by_the_matrix() {
        let token = admin_token(now() + Duration::hours(1));
        let p = VerifyParams {
            operation: "CloseBank".into(),
            ..VerifyParams::default()
        };

        assert!(!authorizer().verify(&token, &p, now()).unwrap());
    }

    #[test]
    fn operation_whitespace_is_ignored() {
        let token = admin_token(now() + Duration::hours(1));
        let p = VerifyParams {
            operation: " GetAllCustomer ".into(),
            ..VerifyParams::default()
        };

        assert!(authorizer().verify(&token, &p, now()).unwrap());
    }

    #[test]
    fn corrupted_signature_is_an_error_not_a_denial() {
        let token = alice_token(now() + Duration::hours(1));
        let corrupted = format!("{}x", token);

        let result = authorizer().verify(&corrupted, &params("NewTransaction", "42", "100"), now());
        assert!(matches!(result, Err(AuthError::SignatureInvalid)));
    }

    #[test]
    fn foreign_secret_is_an_error() {
        let token = JwtCodec::hs256(b"other")
            .sign(&ClaimSet::Access(AccessClaims::admin(
                "root".into(),
                "admin".into(),
                now() + Duration::hours(1),
            )))
            .unwrap();
        let p = VerifyParams {
            operation: "GetAllCustomer".into(),
            ..VerifyParams::default()
        };

        assert!(matches!(
            authorizer().verify(&token, &p, now()),
            Err(AuthError::SignatureInvalid)
        ));
    }

    #[test]
    fn refresh_token_cannot_authorize_requests() {
        let access = AccessClaims::customer(
            "alice".into(),
            "user".into(),
            "42".into(),
            vec!["100".into()],
            now(),
        );
        let refresh = sign(ClaimSet::Refresh(
            access.to_refresh_claims(now() + Duration::days(30)),
        ));

        let result = authorizer().verify(&refresh, &params("NewTransaction", "42", "100"), now());
        assert!(matches!(result, Err(AuthError::WrongTokenType { .. })));
    }
}
