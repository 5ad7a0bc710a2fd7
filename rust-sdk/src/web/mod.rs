//! HTTP surface of the agent.
//!
//! This module provides:
//! - `GET /health`: liveness check reporting the agent id
//! - `POST /query`: signed webhook through which the coordinator forwards tasks
//! - HMAC-SHA256 signing and verification of webhook bodies

pub mod handlers;
pub mod signature;

pub use handlers::{health, query, AppState, HealthResponse};
pub use signature::{is_signature_verification_enabled, sign, verify, SIGNATURE_HEADER};
