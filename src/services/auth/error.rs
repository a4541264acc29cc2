use thiserror::Error;

/// Typed outcomes of the token lifecycle.
///
/// Variants fall into three families that the HTTP layer maps differently:
/// - forbidden: the credential itself cannot be trusted or used
/// - denial (`is_denial`): the credential is fine, the request is not allowed
/// - internal: a collaborator failed
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid user credentials")]
    CredentialInvalid,

    #[error("invalid token signature")]
    SignatureInvalid,

    #[error("unable to decode token claims: {0}")]
    ClaimDecode(String),

    #[error("expected {expected} token, got {found}")]
    WrongTokenType {
        expected: &'static str,
        found: &'static str,
    },

    #[error("token has expired")]
    TokenExpired,

    #[error("request does not match token owner")]
    OwnershipMismatch,

    #[error("role '{role}' is not permitted to perform '{operation}'")]
    PermissionDenied { role: String, operation: String },

    #[error("cannot refresh until current token expires")]
    RefreshNotExpiredYet,

    #[error("refresh token not registered")]
    RefreshTokenUnregistered,

    #[error("invalid or expired refresh token")]
    RefreshTokenInvalid,

    #[error("failed to sign token")]
    Signing,

    #[error("persistence failure")]
    PersistenceFailure,
}

impl AuthError {
    /// Valid credential, denied request.
    pub fn is_denial(&self) -> bool {
        matches!(
            self,
            Self::TokenExpired | Self::OwnershipMismatch | Self::PermissionDenied { .. }
        )
    }
}
