//! Marketplace Agent SDK.
//!
//! Build an agent that answers tasks forwarded by the marketplace
//! coordinator, and query the coordinator's REST API:
//! - [`AgentServer`]: webhook server exposing `/health` and `/query`
//! - [`web::signature`]: HMAC-SHA256 signing and verification of webhook bodies
//! - [`MarketplaceClient`]: typed client for health, stats, reputation,
//!   agent listing and dashboard endpoints
//!
//! ## Request flow
//!
//! ```text
//! Coordinator → POST /query → verify x-mt-signature → Query → handler → ResponseEnvelope
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod handler;
pub mod logging;
pub mod query;
pub mod server;
pub mod web;

// Re-export commonly used types
pub use client::{
    AgentReputation, AgentStats, AgentSummary, CoordinatorHealth, DashboardAnalytics,
    MarketplaceClient,
};
pub use config::Config;
pub use error::{Error, Result};
pub use handler::QueryHandler;
pub use query::{Metadata, Query, QueryResult, ResponseEnvelope};
pub use server::AgentServer;
pub use web::signature::{sign, verify};
