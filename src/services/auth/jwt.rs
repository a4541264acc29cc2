use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use tracing::{debug, error};

use crate::services::auth::claims::{ClaimSet, OpaqueClaims};
use crate::services::auth::error::AuthError;

/// Wire format for claim sets.
///
/// Callers only see `sign` and `verify`; the algorithm lives behind this seam.
/// `verify` checks the signature only. Expiry is a caller policy because the
/// refresh protocol has to accept signature-valid but expired access tokens.
pub trait TokenCodec: Send + Sync {
    fn sign(&self, claims: &ClaimSet) -> Result<String, AuthError>;

    fn verify(&self, token: &str) -> Result<OpaqueClaims, AuthError>;
}

/// HS256 JWT codec keyed by a shared secret.
#[derive(Clone)]
pub struct JwtCodec {
    header: Header,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for JwtCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Do not print key material
        f.debug_struct("JwtCodec")
            .field("alg", &self.header.alg)
            .finish()
    }
}

impl JwtCodec {
    pub fn hs256(secret: &[u8]) -> Self {
        let mut header = Header::new(Algorithm::HS256);
        header.typ = Some("JWT".to_string());

        // Signature only: `expiresAt` is ours, and no registered claim is required.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        Self {
            header,
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
        }
    }
}

impl TokenCodec for JwtCodec {
    fn sign(&self, claims: &ClaimSet) -> Result<String, AuthError> {
        jsonwebtoken::encode(&self.header, claims, &self.encoding_key).map_err(|e| {
            error!(error = %e, token_type = claims.token_type(), "failed to sign JWT");
            AuthError::Signing
        })
    }

    fn verify(&self, token: &str) -> Result<OpaqueClaims, AuthError> {
        let data = jsonwebtoken::decode::<OpaqueClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| {
                debug!(error = %e, "token verification failed");
                AuthError::SignatureInvalid
            })?;

        Ok(data.claims)
    }
}
