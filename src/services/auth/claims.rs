use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::services::auth::error::AuthError;

/// Untyped claim bag as produced by signature verification.
pub type OpaqueClaims = serde_json::Map<String, serde_json::Value>;

/// Role that carries account ownership and is subject to the expiry grace check.
pub const CUSTOMER_ROLE: &str = "user";

/// Claim payload of a signed token.
///
/// On the wire the variant is the `token_type` claim (`"access"` | `"refresh"`),
/// sitting next to the other claims in one flat record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "token_type", rename_all = "lowercase")]
pub enum ClaimSet {
    Access(AccessClaims),
    Refresh(RefreshClaims),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    #[serde(rename = "userName")]
    pub user_name: String,
    pub role: String,
    // customer_id and accounts are present together (customer) or absent together (admin)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accounts: Option<Vec<String>>,
    #[serde(rename = "expiresAt", with = "chrono::serde::ts_seconds")]
    pub expires_at: DateTime<Utc>,
}

/// Refresh tokens identify the holder only; they never carry account scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshClaims {
    #[serde(rename = "userName")]
    pub user_name: String,
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
    #[serde(rename = "expiresAt", with = "chrono::serde::ts_seconds")]
    pub expires_at: DateTime<Utc>,
}

impl ClaimSet {
    /// Typed decode of a verified claim bag.
    ///
    /// Rejects missing or mistyped `token_type`, `userName`, `role`, `expiresAt`,
    /// and an access payload that carries only one of `customer_id` / `accounts`.
    pub fn decode(claims: OpaqueClaims) -> Result<Self, AuthError> {
        let decoded: ClaimSet = serde_json::from_value(serde_json::Value::Object(claims))
            .map_err(|e| {
                debug!(error = %e, "claim payload does not match claim set shape");
                AuthError::ClaimDecode(e.to_string())
            })?;

        if let ClaimSet::Access(access) = &decoded
            && access.customer_id.is_some() != access.accounts.is_some()
        {
            return Err(AuthError::ClaimDecode(
                "customer_id and accounts must be present together".to_string(),
            ));
        }

        Ok(decoded)
    }

    pub fn token_type(&self) -> &'static str {
        match self {
            ClaimSet::Access(_) => "access",
            ClaimSet::Refresh(_) => "refresh",
        }
    }

    pub fn into_access(self) -> Result<AccessClaims, AuthError> {
        match self {
            ClaimSet::Access(c) => Ok(c),
            other => Err(AuthError::WrongTokenType {
                expected: "access",
                found: other.token_type(),
            }),
        }
    }

    pub fn into_refresh(self) -> Result<RefreshClaims, AuthError> {
        match self {
            ClaimSet::Refresh(c) => Ok(c),
            other => Err(AuthError::WrongTokenType {
                expected: "refresh",
                found: other.token_type(),
            }),
        }
    }
}

impl AccessClaims {
    /// Admin shape: role only, no customer scope.
    pub fn admin(user_name: String, role: String, expires_at: DateTime<Utc>) -> Self {
        Self {
            user_name,
            role,
            customer_id: None,
            accounts: None,
            expires_at,
        }
    }

    pub fn customer(
        user_name: String,
        role: String,
        customer_id: String,
        accounts: Vec<String>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            user_name,
            role,
            customer_id: Some(customer_id),
            accounts: Some(accounts),
            expires_at,
        }
    }

    pub fn is_customer_role(&self) -> bool {
        self.role == CUSTOMER_ROLE
    }

    /// True when `customer_id` is the token's customer and `account` one of its accounts.
    pub fn owns(&self, customer_id: &str, account: &str) -> bool {
        match (&self.customer_id, &self.accounts) {
            (Some(own_id), Some(accounts)) => {
                own_id == customer_id && accounts.iter().any(|a| a == account)
            }
            _ => false,
        }
    }

    /// Expired past the grace window, counted in whole minutes since `expiresAt`.
    pub fn expired_beyond_grace(&self, now: DateTime<Utc>, grace: Duration) -> bool {
        (now - self.expires_at).num_minutes() > grace.num_minutes()
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Identity part of this token as refresh claims (accounts dropped).
    pub fn to_refresh_claims(&self, expires_at: DateTime<Utc>) -> RefreshClaims {
        RefreshClaims {
            user_name: self.user_name.clone(),
            role: self.role.clone(),
            customer_id: self.customer_id.clone(),
            expires_at,
        }
    }

    /// Same identity and scope, new expiry.
    pub fn reissue(&self, expires_at: DateTime<Utc>) -> Self {
        Self {
            expires_at,
            ..self.clone()
        }
    }
}

impl RefreshClaims {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    pub fn same_identity(&self, access: &AccessClaims) -> bool {
        self.user_name == access.user_name
            && self.role == access.role
            && self.customer_id == access.customer_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn bag(value: serde_json::Value) -> OpaqueClaims {
        match value {
            serde_json::Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    fn alice(expires_at: DateTime<Utc>) -> AccessClaims {
        AccessClaims::customer(
            "alice".into(),
            "user".into(),
            "42".into(),
            vec!["100".into(), "101".into()],
            expires_at,
        )
    }

    #[test]
    fn access_claims_use_wire_keys() {
        let claims = ClaimSet::Access(alice(at(1_700_000_000)));
        let value = serde_json::to_value(&claims).unwrap();

        assert_eq!(
            value,
            json!({
                "token_type": "access",
                "userName": "alice",
                "role": "user",
                "customer_id": "42",
                "accounts": ["100", "101"],
                "expiresAt": 1_700_000_000
            })
        );
    }

    #[test]
    fn admin_claims_omit_customer_scope() {
        let claims = ClaimSet::Access(AccessClaims::admin(
            "root".into(),
            "admin".into(),
            at(1_700_000_000),
        ));
        let value = serde_json::to_value(&claims).unwrap();

        assert!(value.get("customer_id").is_none());
        assert!(value.get("accounts").is_none());
    }

    #[test]
    fn decode_restores_both_shapes() {
        let access = ClaimSet::Access(alice(at(1_700_000_000)));
        let refresh = ClaimSet::Refresh(alice(at(0)).to_refresh_claims(at(1_702_592_000)));

        for claims in [access, refresh] {
            let value = serde_json::to_value(&claims).unwrap();
            assert_eq!(ClaimSet::decode(bag(value)).unwrap(), claims);
        }
    }

    #[test]
    fn decode_keeps_optional_fields_absent() {
        let decoded = ClaimSet::decode(bag(json!({
            "token_type": "access",
            "userName": "root",
            "role": "admin",
            "expiresAt": 1_700_000_000
        })))
        .unwrap()
        .into_access()
        .unwrap();

        assert_eq!(decoded.customer_id, None);
        assert_eq!(decoded.accounts, None);
    }

    #[test]
    fn decode_rejects_missing_required_fields() {
        let missing = [
            json!({"userName": "a", "role": "user", "expiresAt": 1}),
            json!({"token_type": "access", "role": "user", "expiresAt": 1}),
            json!({"token_type": "access", "userName": "a", "expiresAt": 1}),
            json!({"token_type": "access", "userName": "a", "role": "user"}),
        ];

        for claims in missing {
            assert!(matches!(
                ClaimSet::decode(bag(claims)),
                Err(AuthError::ClaimDecode(_))
            ));
        }
    }

    #[test]
    fn decode_rejects_mistyped_fields() {
        let mistyped = [
            json!({"token_type": "session", "userName": "a", "role": "user", "expiresAt": 1}),
            json!({"token_type": "access", "userName": 7, "role": "user", "expiresAt": 1}),
            json!({"token_type": "access", "userName": "a", "role": "user", "expiresAt": "soon"}),
            json!({"token_type": "access", "userName": "a", "role": "user", "expiresAt": 1,
                   "customer_id": "42", "accounts": "100,101"}),
        ];

        for claims in mistyped {
            assert!(matches!(
                ClaimSet::decode(bag(claims)),
                Err(AuthError::ClaimDecode(_))
            ));
        }
    }

    #[test]
    fn decode_rejects_half_customer_scope() {
        let result = ClaimSet::decode(bag(json!({
            "token_type": "access",
            "userName": "alice",
            "role": "user",
            "customer_id": "42",
            "expiresAt": 1
        })));

        assert!(matches!(result, Err(AuthError::ClaimDecode(_))));
    }

    #[test]
    fn token_type_separation() {
        let refresh = ClaimSet::Refresh(alice(at(0)).to_refresh_claims(at(10)));
        assert!(matches!(
            refresh.into_access(),
            Err(AuthError::WrongTokenType {
                expected: "access",
                found: "refresh"
            })
        ));
    }

    #[test]
    fn ownership_requires_customer_and_account() {
        let claims = alice(at(0));

        assert!(claims.owns("42", "100"));
        assert!(claims.owns("42", "101"));
        assert!(!claims.owns("42", "999"));
        assert!(!claims.owns("43", "100"));

        let admin = AccessClaims::admin("root".into(), "admin".into(), at(0));
        assert!(!admin.owns("42", "100"));
    }

    #[test]
    fn grace_window_counts_whole_minutes_past_expiry() {
        let expires_at = at(1_700_000_000);
        let claims = alice(expires_at);
        let grace = Duration::hours(1);

        assert!(!claims.expired_beyond_grace(expires_at - Duration::minutes(30), grace));
        assert!(!claims.expired_beyond_grace(expires_at + Duration::minutes(59), grace));
        assert!(!claims.expired_beyond_grace(expires_at + Duration::seconds(60 * 60 + 30), grace));
        assert!(claims.expired_beyond_grace(expires_at + Duration::minutes(61), grace));
    }

    #[test]
    fn refresh_claims_drop_accounts_and_match_identity() {
        let access = alice(at(100));
        let refresh = access.to_refresh_claims(at(200));

        assert_eq!(refresh.customer_id.as_deref(), Some("42"));
        assert!(refresh.same_identity(&access));

        let other = AccessClaims::customer(
            "bob".into(),
            "user".into(),
            "42".into(),
            vec![],
            at(100),
        );
        assert!(!refresh.same_identity(&other));
    }
}
