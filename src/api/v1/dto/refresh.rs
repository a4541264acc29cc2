use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct RefreshRequest {
    /// The expired access token.
    pub access_token: String,
    pub refresh_token: String,
}
