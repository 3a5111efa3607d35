//! HTTP surface exposed to the frontend.

use std::{any::Any, sync::Arc};

use axum::{
    extract::{rejection::JsonRejection, Extension, Query},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tower_http::{catch_panic::CatchPanicLayer, cors::CorsLayer};
use tracing::error;

use crate::{
    config::Config,
    logicware::{self, auth::TokenManager, Lead},
    mantra::{self, Contact},
    relay::Relayed,
};

pub mod error;

use error::ApiError;

pub struct AppState {
    pub config: Config,
    pub tokens: Arc<TokenManager>,
    pub logicware: logicware::Client,
    pub mantra: mantra::Client,
}

pub fn routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/auth/external/token", get(token).post(token))
        .route("/api/units/stock", get(units_stock))
        .route("/api/leads/create", post(create_lead))
        .route("/api/mantra/contact", post(mantra_contact))
        .layer(Extension(state))
        .layer(CorsLayer::permissive())
        .layer(CatchPanicLayer::custom(handle_panic))
}

async fn root(Extension(state): Extension<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": "Casa Bonita Proxy API",
        "version": env!("CARGO_PKG_VERSION"),
        "api_key_configured": state.config.api_key_configured(),
        "subdomain_configured": state.config.subdomain_configured(),
    }))
}

async fn health(Extension(state): Extension<Arc<AppState>>) -> Json<Value> {
    let cache = state.tokens.status().await;
    let subdomain = (!state.config.subdomain.is_empty()).then_some(&state.config.subdomain);

    Json(json!({
        "status": "healthy",
        "timestamp": state.tokens.now().to_rfc3339(),
        "config": {
            "api_key_configured": state.config.api_key_configured(),
            "subdomain_configured": state.config.subdomain_configured(),
            "subdomain": subdomain,
        },
        "token_cache": {
            "status": cache.state.as_str(),
            "expires_at": cache.expires_at.map(|at| at.to_rfc3339()),
        },
    }))
}

async fn token(
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<Value>, ApiError> {
    let record = state.tokens.get_token().await?;
    Ok(Json(json!({
        "succeeded": true,
        "data": { "accessToken": record.access_token },
    })))
}

#[derive(Debug, Deserialize)]
struct StockQuery {
    #[serde(rename = "projectCode", default = "default_project_code")]
    project_code: String,
}

fn default_project_code() -> String {
    logicware::DEFAULT_PROJECT_CODE.to_owned()
}

async fn units_stock(
    Extension(state): Extension<Arc<AppState>>,
    Query(query): Query<StockQuery>,
) -> Result<Response, ApiError> {
    let relayed = state.logicware.units_stock(&query.project_code).await?;
    Ok(relayed_response(relayed))
}

async fn create_lead(
    Extension(state): Extension<Arc<AppState>>,
    payload: Result<Json<Lead>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(lead) = payload.map_err(validation_error)?;
    let relayed = state.logicware.create_lead(&lead).await?;
    Ok(relayed_response(relayed))
}

async fn mantra_contact(
    Extension(state): Extension<Arc<AppState>>,
    payload: Result<Json<Contact>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(contact) = payload.map_err(validation_error)?;
    let relayed = state.mantra.send_contact(&contact).await?;
    Ok(relayed_response(relayed))
}

fn validation_error(rejection: JsonRejection) -> ApiError {
    ApiError::Validation(rejection.to_string())
}

/// The upstream's status code and body, forwarded unchanged.
fn relayed_response(relayed: Relayed) -> Response {
    let status =
        StatusCode::from_u16(relayed.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(relayed.body)).into_response()
}

/// Last-resort conversion of a handler panic into the generic 500 envelope,
/// so one bad request cannot take the process down.
fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let details = if let Some(text) = err.downcast_ref::<String>() {
        text.clone()
    } else if let Some(text) = err.downcast_ref::<&str>() {
        (*text).to_owned()
    } else {
        "unknown panic".to_owned()
    };

    error!(message = "Unhandled panic in request handler", details = %details);

    let body = json!({
        "succeeded": false,
        "error": "Internal server error",
        "details": details,
        "statusCode": 500,
    });
    (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
}
