use serde::Serialize;

/// Body of login and refresh responses.
///
/// Refresh responses carry no `user_name` / `access_time`.
#[derive(Debug, Clone, Serialize)]
pub struct TokenResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,

    /// RFC 3339 login instant.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_time: Option<String>,

    pub access_token: String,
    pub refresh_token: String,
}
