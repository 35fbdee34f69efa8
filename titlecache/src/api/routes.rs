//! API routes for the title cache server

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Form, Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use titlecache_core::{ActionRequest, Envelope, HealthCheckResult, TitleCache};

/// Application state
pub struct AppState {
    pub service: TitleCache,
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub store: HealthCheckResult,
}

/// Action parameters, from the query string or a form body
#[derive(Debug, Default, Deserialize)]
pub struct ActionParams {
    pub action: Option<String>,
    pub graph: Option<String>,
    /// Comma separated
    pub uris: Option<String>,
    pub lang: Option<String>,
}

impl From<ActionParams> for ActionRequest {
    fn from(params: ActionParams) -> Self {
        ActionRequest {
            action: params.action,
            graph: params.graph,
            uris: params
                .uris
                .as_deref()
                .map(ActionRequest::parse_uris)
                .unwrap_or_default(),
            lang: params.lang,
            ..Default::default()
        }
    }
}

/// `GET /?action=...`
pub async fn action_query(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ActionParams>,
) -> Json<Vec<Envelope>> {
    Json(vec![state.service.run(params.into()).await])
}

/// `POST /` with a form-encoded body
pub async fn action_form(
    State(state): State<Arc<AppState>>,
    Form(params): Form<ActionParams>,
) -> Json<Vec<Envelope>> {
    Json(vec![state.service.run(params.into()).await])
}

/// Health check endpoint, probing the default triple store
pub async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let store = state.service.store_health().await;
    let code = StatusCode::from_u16(store.status.to_http_status_code())
        .unwrap_or(StatusCode::SERVICE_UNAVAILABLE);
    let status = if store.status.is_operational() {
        "healthy"
    } else {
        "unhealthy"
    };

    (
        code,
        Json(HealthResponse {
            status: status.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            store,
        }),
    )
}
