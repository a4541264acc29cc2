use axum::{
    Router,
    routing::{get, post},
};

use crate::api::v1::handlers::auth::{login, refresh, verify};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/customers/login", post(login))
        .route("/auth/verify", get(verify))
        .route("/auth/refresh", post(refresh))
}
