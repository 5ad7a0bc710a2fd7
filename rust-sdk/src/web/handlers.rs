//! Agent endpoint handlers.
//!
//! `POST /query` runs each request through the same pipeline:
//! 1. Authenticate the raw body against `x-mt-signature` (when present)
//! 2. Normalize the body into a canonical [`Query`]
//! 3. Invoke the registered handler and time it
//! 4. Shape the outcome into a [`ResponseEnvelope`]
//!
//! Every failure is converted to a response here; nothing propagates out of
//! the endpoint.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::error::Error;
use crate::handler::{self, SharedHandler};
use crate::query::{now_rfc3339, Query, ResponseEnvelope};
use crate::web::signature::{is_signature_verification_enabled, verify, SIGNATURE_HEADER};
use crate::Config;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub handler: Option<SharedHandler>,
}

impl AppState {
    pub fn new(config: Config, handler: Option<SharedHandler>) -> Self {
        Self {
            config: Arc::new(config),
            handler,
        }
    }
}

// =============================================================================
// Health Check
// =============================================================================

/// Health check response.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub agent: String,
    pub timestamp: String,
}

/// Health check endpoint.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        agent: state.config.agent_id.clone(),
        timestamp: now_rfc3339(),
    })
}

// =============================================================================
// Query Webhook
// =============================================================================

/// Query webhook endpoint.
pub async fn query(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    // A header that is not valid UTF-8 still counts as present.
    let signature = headers
        .get(SIGNATURE_HEADER)
        .map(|v| v.to_str().unwrap_or_default());

    info!(
        body_length = body.len(),
        has_signature = signature.is_some(),
        "query_webhook_received"
    );

    if let Err(e) = authenticate(&state.config, signature, &body) {
        return reject(e);
    }

    let query = Query::from_body(&body);
    let query_id = query.query_id.clone();

    info!(
        query_id = %query_id,
        text_length = query.text.len(),
        capabilities = query.capabilities.len(),
        "query_normalized"
    );

    let Some(query_handler) = state.handler.as_ref() else {
        error!(query_id = %query_id, "query_handler_missing");
        return reject(Error::NoHandlerRegistered);
    };

    let started = Instant::now();
    let outcome = handler::invoke(query_handler, query).await;
    let duration_ms = started.elapsed().as_millis() as u64;

    match outcome {
        Ok(result) => {
            info!(
                query_id = %query_id,
                duration_ms = duration_ms,
                response_length = result.response.len(),
                "query_handled"
            );
            (
                StatusCode::OK,
                Json(ResponseEnvelope::success(result, duration_ms)),
            )
                .into_response()
        }
        Err(e) => {
            error!(
                query_id = %query_id,
                duration_ms = duration_ms,
                error = %e,
                "query_handler_failed"
            );
            (
                e.status_code(),
                Json(ResponseEnvelope::failure(e.to_string(), duration_ms)),
            )
                .into_response()
        }
    }
}

/// Check the webhook signature over the raw body.
///
/// Unsigned requests pass unless the configuration requires a signature.
fn authenticate(config: &Config, signature: Option<&str>, body: &[u8]) -> Result<(), Error> {
    let secret_enabled = is_signature_verification_enabled(&config.webhook_secret);

    match (signature, config.webhook_secret.as_deref()) {
        (Some(provided), Some(secret)) if secret_enabled => {
            if verify(body, provided, secret) {
                debug!("webhook_signature_valid");
                Ok(())
            } else {
                warn!("webhook_signature_invalid");
                Err(Error::Unauthenticated)
            }
        }
        (Some(_), _) => {
            warn!("webhook_signature_secret_not_configured");
            Err(Error::Unauthenticated)
        }
        (None, _) if config.require_signature => {
            warn!("webhook_signature_missing");
            Err(Error::Unauthenticated)
        }
        (None, _) => {
            debug!("webhook_signature_absent");
            Ok(())
        }
    }
}

/// Response for a request stopped before the handler ran.
fn reject(err: Error) -> Response {
    (
        err.status_code(),
        Json(ResponseEnvelope::rejected(err.to_string())),
    )
        .into_response()
}
