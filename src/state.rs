use std::sync::Arc;

use crate::services::auth::store::UserDirectory;
use crate::services::auth::{RefreshCoordinator, RequestAuthorizer, TokenIssuer};

#[derive(Clone)]
pub struct AppState {
    pub directory: Arc<dyn UserDirectory>,
    pub issuer: Arc<TokenIssuer>,
    pub authorizer: Arc<RequestAuthorizer>,
    pub refresher: Arc<RefreshCoordinator>,
}

impl AppState {
    pub fn new(
        directory: Arc<dyn UserDirectory>,
        issuer: Arc<TokenIssuer>,
        authorizer: Arc<RequestAuthorizer>,
        refresher: Arc<RefreshCoordinator>,
    ) -> Self {
        Self {
            directory,
            issuer,
            authorizer,
            refresher,
        }
    }
}
