use axum::{Router, routing::get};
use sqlx::postgres::PgPoolOptions;
use std::{panic, process, sync::Arc};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::api;
use crate::config::Config;
use crate::error::AppError;
use crate::middleware;
use crate::repos::{refresh_token_repo::RefreshTokenRepo, user_repo::UserRepo};
use crate::services::auth::{
    RefreshCoordinator, RequestAuthorizer, TokenIssuer, jwt::JwtCodec, roles::RolePermissions,
};
use crate::state::AppState;

fn init_tracing() {
    // Prefer RUST_LOG if set; otherwise use a sensible default.
    // Ex:
    // RUST_LOG=info,banking_auth=debug,tower_http=debug cargo run
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn init_panic_hook(abort_on_panic: bool) {
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        // Always surface panics via tracing; stderr may not be collected.
        tracing::error!(?info, "panic");

        // Development: fail fast. Production: default hook, keep serving.
        if abort_on_panic {
            process::abort();
        } else {
            default_hook(info);
        }
    }))
}

pub async fn run() -> Result<(), AppError> {
    init_tracing();
    let config = Config::from_env()?;

    init_panic_hook(!config.app_env.is_production());

    tracing::info!(
        "starting banking auth in {:?} mode on {}",
        config.app_env,
        config.addr
    );

    let state = build_state(&config).await?;
    let app = build_router(state, &config);
    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, addr = %config.addr, "failed to bind");
            AppError::Internal
        })?;
    axum::serve(listener, app).await.map_err(|e| {
        tracing::error!(error = %e, "server error");
        AppError::Internal
    })?;

    Ok(())
}

async fn build_state(config: &Config) -> Result<AppState, AppError> {
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .max_lifetime(config.db_conn_max_lifetime)
        .connect(&config.database_url)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "failed to connect to database");
            AppError::Internal
        })?;

    // Process-wide, read-only after this point: the signing secret and the role matrix.
    let codec = Arc::new(JwtCodec::hs256(config.token_secret.as_bytes()));
    let roles = Arc::new(RolePermissions::banking());

    let directory = Arc::new(UserRepo::new(pool.clone()));
    let refresh_store = Arc::new(RefreshTokenRepo::new(pool));

    let issuer = TokenIssuer::new(
        codec.clone(),
        refresh_store.clone(),
        config.access_token_ttl,
        config.refresh_token_ttl,
    );
    let authorizer = RequestAuthorizer::new(
        codec.clone(),
        roles,
        config.customer_expiry_grace,
    );
    let refresher = RefreshCoordinator::new(codec, refresh_store, issuer.clone());

    Ok(AppState::new(
        directory,
        Arc::new(issuer),
        Arc::new(authorizer),
        Arc::new(refresher),
    ))
}

fn build_router(state: AppState, config: &Config) -> Router {
    async fn health() -> &'static str {
        "ok"
    }

    let router = Router::new()
        .route("/health", get(health))
        .nest("/api/v1", api::v1::routes())
        .with_state(state);

    middleware::http::apply(
        router,
        config.request_timeout,
        config.request_body_limit_bytes,
    )
}
