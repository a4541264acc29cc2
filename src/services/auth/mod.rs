pub mod authorizer;
pub mod claims;
pub mod error;
pub mod jwt;
pub mod refresh;
pub mod roles;
pub mod store;
pub mod token_issuer;

pub use authorizer::{RequestAuthorizer, VerifyParams};
pub use error::AuthError;
pub use refresh::RefreshCoordinator;
pub use token_issuer::TokenIssuer;
