use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};

use shop_core::extract::JsonBody;

use crate::error::ShopError;
use crate::state::AppState;
use crate::usecase::token::{ObtainTokenUseCase, RefreshTokenUseCase};

#[derive(Deserialize)]
pub struct TokenRequest {
    pub username: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct TokenPairResponse {
    pub access: String,
    pub refresh: String,
}

#[derive(Deserialize)]
pub struct RefreshRequest {
    pub refresh: String,
}

#[derive(Serialize)]
pub struct AccessResponse {
    pub access: String,
}

// ── POST /api/token/ ─────────────────────────────────────────────────────────

pub async fn obtain_token(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<TokenRequest>,
) -> Result<Json<TokenPairResponse>, ShopError> {
    let pair = ObtainTokenUseCase {
        users: state.user_repo(),
        jwt_secret: state.jwt_secret.0.to_string(),
    }
    .execute(&body.username, &body.password)
    .await?;
    Ok(Json(TokenPairResponse {
        access: pair.access,
        refresh: pair.refresh,
    }))
}

// ── POST /api/token/refresh/ ─────────────────────────────────────────────────

pub async fn refresh_token(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<RefreshRequest>,
) -> Result<Json<AccessResponse>, ShopError> {
    let access = RefreshTokenUseCase {
        users: state.user_repo(),
        jwt_secret: state.jwt_secret.0.to_string(),
    }
    .execute(&body.refresh)
    .await?;
    Ok(Json(AccessResponse { access }))
}
