//! Endpoint handlers. Each one parses, delegates, and wraps the result.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Response;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::AppState;
use super::envelope::{ApiError, ErrorCode, respond};
use crate::discovery::ListQuery;
use crate::protocol::SignedRequest;
use crate::types::{CasinoStatus, GameType};

type ApiResult = Result<Response, ApiError>;

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub status: Option<CasinoStatus>,
    /// Comma-separated game tags.
    pub games: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct HistoryParams {
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize)]
struct HealthStatus {
    status: &'static str,
    version: &'static str,
}

fn parse_games(raw: Option<&str>) -> Result<Vec<GameType>, ApiError> {
    raw.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(|tag| {
            tag.parse()
                .map_err(|e: crate::types::UnknownVariant| ApiError::invalid_request(e.to_string()))
        })
        .collect()
}

fn signed<T: serde::de::DeserializeOwned>(
    body: Result<Json<Value>, JsonRejection>,
) -> Result<SignedRequest<T>, ApiError> {
    let Json(raw) = body?;
    Ok(SignedRequest::from_value(raw)?)
}

/// `GET /health`
pub async fn health() -> Response {
    respond(
        StatusCode::OK,
        HealthStatus {
            status: "ok",
            version: env!("CARGO_PKG_VERSION"),
        },
    )
}

/// `GET /health/ready`
pub async fn ready(State(state): State<Arc<AppState>>) -> ApiResult {
    state.store.ping().await.map_err(|e| {
        tracing::warn!(error = %e, "Readiness check failed");
        ApiError::new(ErrorCode::InternalError, "Store unavailable")
            .with_status(StatusCode::SERVICE_UNAVAILABLE)
    })?;
    Ok(respond(
        StatusCode::OK,
        HealthStatus {
            status: "ready",
            version: env!("CARGO_PKG_VERSION"),
        },
    ))
}

/// `POST /api/v1/casinos`
pub async fn register(
    State(state): State<Arc<AppState>>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult {
    let casino = state.registration.register(signed(body)?).await?;
    Ok(respond(StatusCode::CREATED, casino))
}

/// `GET /api/v1/casinos`
pub async fn list(
    State(state): State<Arc<AppState>>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> ApiResult {
    let Query(params) = params?;
    let query = ListQuery {
        status: params.status,
        games: parse_games(params.games.as_deref())?,
        limit: params.limit,
        offset: params.offset,
    };
    let list = state.discovery.list(query).await?;
    Ok(respond(StatusCode::OK, list))
}

/// `GET /api/v1/casinos/{id}`
pub async fn get(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> ApiResult {
    let casino = state.discovery.get(&id).await?;
    Ok(respond(StatusCode::OK, casino))
}

/// `GET /api/v1/casinos/by-key/{public_key}`
pub async fn get_by_public_key(
    State(state): State<Arc<AppState>>,
    Path(public_key): Path<String>,
) -> ApiResult {
    let casino = state.discovery.get_by_public_key(&public_key).await?;
    Ok(respond(StatusCode::OK, casino))
}

/// `PATCH /api/v1/casinos/{id}`
pub async fn update(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult {
    let casino = state.update.update(&id, signed(body)?).await?;
    Ok(respond(StatusCode::OK, casino))
}

/// `POST /api/v1/casinos/{id}/heartbeat`
pub async fn heartbeat(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult {
    let ack = state.heartbeat.heartbeat(&id, signed(body)?).await?;
    Ok(respond(StatusCode::OK, ack))
}

/// `GET /api/v1/casinos/{id}/heartbeats`
pub async fn heartbeats(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    params: Result<Query<HistoryParams>, QueryRejection>,
) -> ApiResult {
    let Query(params) = params?;
    let history = state.discovery.heartbeats(&id, params.limit).await?;
    Ok(respond(StatusCode::OK, history))
}

/// `GET /api/v1/stats`
pub async fn stats(State(state): State<Arc<AppState>>) -> ApiResult {
    let stats = state.discovery.stats().await?;
    Ok(respond(StatusCode::OK, stats))
}

/// Unknown routes still answer with an envelope.
pub async fn fallback() -> ApiError {
    ApiError::not_found("No such endpoint")
}
