use serde::Deserialize;

use crate::services::auth::VerifyParams;

/// Query string of `/auth/verify`, as sent by the banking API.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VerifyQuery {
    pub token: Option<String>,
    pub operation: Option<String>,
    pub customer_id: Option<String>,
    /// Account id the request targets.
    pub id: Option<String>,
}

impl VerifyQuery {
    pub fn params(&self) -> VerifyParams {
        VerifyParams {
            operation: self.operation.clone().unwrap_or_default(),
            customer_id: self.customer_id.clone(),
            id: self.id.clone(),
        }
    }
}
