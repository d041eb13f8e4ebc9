use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde_json::json;
use tower_http::cors::CorsLayer;

use super::service::{LeadRelayError, LeadRelayService};
use super::sink::LeadSink;
use crate::config::{ConfigError, CorsConfig};

pub const LEADS_PATH: &str = "/api/v1/leads";

/// Router builder exposing the lead intake endpoint.
pub fn lead_router<S>(service: Arc<LeadRelayService<S>>, cors: CorsLayer) -> Router
where
    S: LeadSink + 'static,
{
    Router::new()
        .route(
            LEADS_PATH,
            post(submit_handler::<S>).fallback(method_not_allowed),
        )
        .layer(cors)
        .with_state(service)
}

/// CORS policy: one origin, POST only, JSON bodies.
pub fn cors_layer(config: &CorsConfig) -> Result<CorsLayer, ConfigError> {
    let origin =
        HeaderValue::from_str(&config.allowed_origin).map_err(|_| ConfigError::InvalidOrigin)?;

    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::POST])
        .allow_headers([header::CONTENT_TYPE]))
}

pub(crate) async fn submit_handler<S>(
    State(service): State<Arc<LeadRelayService<S>>>,
    body: Bytes,
) -> Response
where
    S: LeadSink + 'static,
{
    match service.relay(&body).await {
        Ok(_) => (StatusCode::OK, Json(json!({ "success": true }))).into_response(),
        Err(error) => error.into_response(),
    }
}

/// Every relay failure is a 500 carrying only the public message.
impl IntoResponse for LeadRelayError {
    fn into_response(self) -> Response {
        let body = Json(json!({ "error": self.public_message() }));
        (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
    }
}

pub(crate) async fn method_not_allowed() -> Response {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        [(header::ALLOW, "POST")],
        Json(json!({ "error": "Method not allowed" })),
    )
        .into_response()
}
