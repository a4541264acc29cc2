use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use chrono::Utc;
use tracing::warn;

use crate::api::v1::dto::{
    login::LoginRequest, refresh::RefreshRequest, token_response::TokenResponse,
    verify::VerifyQuery,
};
use crate::error::AppError;
use crate::state::AppState;

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<(StatusCode, Json<TokenResponse>), AppError> {
    req.validate()
        .map_err(|msg| AppError::InvalidRequest(msg.to_string()))?;

    let user = state
        .directory
        .find_user(req.username.trim(), &req.password)
        .await
        .inspect_err(|e| warn!(user_name = %req.username, error = %e, "login rejected"))?;

    let issued = state.issuer.issue(&user, Utc::now()).await?;

    Ok((
        StatusCode::OK,
        Json(TokenResponse {
            user_name: Some(user.user_name),
            access_time: Some(issued.issued_at.to_rfc3339()),
            access_token: issued.access_token,
            refresh_token: issued.refresh_token,
        }),
    ))
}

/// `200 true` when allowed, `401 false` when denied, `403` when the token is unusable.
pub async fn verify(
    State(state): State<AppState>,
    Query(query): Query<VerifyQuery>,
) -> Result<(StatusCode, Json<bool>), AppError> {
    let token = query
        .token
        .as_deref()
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::Forbidden("missing jwt token".to_string()))?;

    let allowed = state
        .authorizer
        .verify(token, &query.params(), Utc::now())
        .inspect_err(|e| warn!(error = %e, "token rejected"))?;

    let status = if allowed {
        StatusCode::OK
    } else {
        StatusCode::UNAUTHORIZED
    };

    Ok((status, Json(allowed)))
}

pub async fn refresh(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> Result<(StatusCode, Json<TokenResponse>), AppError> {
    let out = state
        .refresher
        .refresh(&req.access_token, &req.refresh_token, Utc::now())
        .await
        .inspect_err(|e| warn!(error = %e, "refresh rejected"))?;

    Ok((
        StatusCode::OK,
        Json(TokenResponse {
            user_name: None,
            access_time: None,
            access_token: out.access_token,
            refresh_token: out.refresh_token,
        }),
    ))
}
