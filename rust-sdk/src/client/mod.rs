//! Typed client for the marketplace coordinator REST API.
//!
//! Every request carries the configured API key in `x-api-key`. Failures are
//! returned to the caller as-is; the client never retries.

pub mod types;

use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{Error, Result};
use crate::Config;

use self::types::{
    AgentListWire, AgentStatsWire, DashboardWire, ErrorWire, HealthWire, ReputationWire,
};
pub use self::types::{
    AgentReputation, AgentStats, AgentSummary, CoordinatorHealth, DashboardAnalytics,
};

/// Header carrying the API key on coordinator requests.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Client for the coordinator's health, stats, reputation, listing and
/// analytics endpoints.
#[derive(Clone)]
pub struct MarketplaceClient {
    http: Client,
    base_url: Url,
    api_key: String,
}

impl MarketplaceClient {
    /// Create a client from the SDK configuration.
    pub fn new(config: &Config) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()?;
        Self::with_http_client(config, http)
    }

    /// Create a client that reuses an existing `reqwest::Client`.
    pub fn with_http_client(config: &Config, http: Client) -> Result<Self> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| Error::Config(format!("invalid base URL {:?}: {}", config.base_url, e)))?;

        if base_url.cannot_be_a_base() {
            return Err(Error::Config(format!(
                "base URL {:?} cannot carry a path",
                config.base_url
            )));
        }

        info!(
            base_url = %base_url,
            api_key_configured = !config.api_key.is_empty(),
            "marketplace_client_created"
        );

        Ok(Self {
            http,
            base_url,
            api_key: config.api_key.clone(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// `GET /health`
    pub async fn health(&self) -> Result<CoordinatorHealth> {
        let wire: HealthWire = self.get(&["health"]).await?;
        Ok(wire.into())
    }

    /// `GET /agents/{id}/stats`
    pub async fn agent_stats(&self, agent_id: &str) -> Result<AgentStats> {
        let wire: AgentStatsWire = self.get(&["agents", agent_id, "stats"]).await?;
        Ok(wire.into())
    }

    /// `GET /agents/{id}/reputation`
    pub async fn agent_reputation(&self, agent_id: &str) -> Result<AgentReputation> {
        let wire: ReputationWire = self.get(&["agents", agent_id, "reputation"]).await?;
        Ok(wire.into())
    }

    /// `GET /agents`
    pub async fn list_agents(&self) -> Result<Vec<AgentSummary>> {
        let wire: AgentListWire = self.get(&["agents"]).await?;
        Ok(wire.into_agents())
    }

    /// `GET /analytics/dashboard`
    pub async fn dashboard(&self) -> Result<DashboardAnalytics> {
        let wire: DashboardWire = self.get(&["analytics", "dashboard"]).await?;
        Ok(wire.into())
    }

    /// Resolve path segments against the base URL, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| Error::Config(format!("base URL {} cannot carry a path", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get<W: DeserializeOwned>(&self, segments: &[&str]) -> Result<W> {
        let url = self.endpoint(segments)?;
        debug!(url = %url, "marketplace_request_starting");

        let response = self
            .http
            .get(url.clone())
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await
            .map_err(|e| {
                warn!(url = %url, error = %e, is_timeout = e.is_timeout(), "marketplace_request_failed");
                Error::Transport(e)
            })?;

        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            let body = response.bytes().await.unwrap_or_default();
            let message = serde_json::from_slice::<ErrorWire>(&body)
                .ok()
                .and_then(|e| e.error.or(e.message))
                .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));

            warn!(
                url = %url,
                status_code = status.as_u16(),
                error = %message,
                "marketplace_request_rejected"
            );

            return Err(Error::Api {
                status: status.as_u16(),
                message,
            });
        }

        let wire = response.json::<W>().await?;
        debug!(url = %url, status_code = status.as_u16(), "marketplace_request_complete");

        Ok(wire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn client(server: &mockito::ServerGuard) -> MarketplaceClient {
        let config = Config::new("test-key", "agent-1").with_base_url(server.url());
        MarketplaceClient::new(&config).unwrap()
    }

    #[test]
    fn test_invalid_base_url() {
        let config = Config::new("k", "a").with_base_url("not a url");
        assert!(matches!(MarketplaceClient::new(&config), Err(Error::Config(_))));

        let config = Config::new("k", "a").with_base_url("mailto:ops@example.com");
        assert!(matches!(MarketplaceClient::new(&config), Err(Error::Config(_))));
    }

    #[test]
    fn test_endpoint_keeps_base_path_and_encodes_segments() {
        let config = Config::new("k", "a").with_base_url("https://example.com/api/v1/");
        let client = MarketplaceClient::new(&config).unwrap();

        let url = client.endpoint(&["agents", "team/a b", "stats"]).unwrap();
        assert_eq!(url.as_str(), "https://example.com/api/v1/agents/team%2Fa%20b/stats");
    }

    #[tokio::test]
    async fn test_health_sends_api_key() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/health")
            .match_header(API_KEY_HEADER, "test-key")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"status":"ok","version":"2.1.0"}"#)
            .create_async()
            .await;

        let health = client(&server).health().await.unwrap();

        assert_eq!(health.status, "ok");
        assert_eq!(health.version.as_deref(), Some("2.1.0"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_agent_stats() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/agents/a1/stats")
            .with_status(200)
            .with_body(
                r#"{"agent_id":"a1","total_queries":4,"successful_queries":3,
                   "failed_queries":1,"avg_response_time_ms":42.0,"total_earnings":1.5}"#,
            )
            .create_async()
            .await;

        let stats = client(&server).agent_stats("a1").await.unwrap();

        assert_eq!(stats.agent_id, "a1");
        assert_eq!(stats.total_queries, 4);
        assert_eq!(stats.average_response_time_ms, 42.0);
    }

    #[tokio::test]
    async fn test_agent_stats_with_null_fields() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/agents/new-agent/stats")
            .with_status(200)
            .with_body(
                r#"{"agent_id":"new-agent","total_queries":0,"successful_queries":0,
                   "failed_queries":0,"avg_response_time_ms":null,"total_earnings":null,
                   "last_active":null}"#,
            )
            .create_async()
            .await;

        let stats = client(&server).agent_stats("new-agent").await.unwrap();

        assert_eq!(stats.agent_id, "new-agent");
        assert_eq!(stats.average_response_time_ms, 0.0);
        assert_eq!(stats.total_earnings, 0.0);
        assert_eq!(stats.success_rate(), 0.0);
    }

    #[tokio::test]
    async fn test_agent_reputation() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/agents/a1/reputation")
            .with_status(200)
            .with_body(r#"{"agent_id":"a1","reputation_score":4.5,"total_ratings":12,"rank":3}"#)
            .create_async()
            .await;

        let reputation = client(&server).agent_reputation("a1").await.unwrap();

        assert_eq!(reputation.score, 4.5);
        assert_eq!(reputation.rank, Some(3));
    }

    #[tokio::test]
    async fn test_list_agents() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/agents")
            .with_status(200)
            .with_body(r#"{"agents":[{"id":"a1","name":"Echo","capabilities":["echo"]},{"id":"a2","name":"Search"}]}"#)
            .create_async()
            .await;

        let agents = client(&server).list_agents().await.unwrap();

        assert_eq!(agents.len(), 2);
        assert_eq!(agents[0].capabilities, vec!["echo"]);
        assert!(agents[1].capabilities.is_empty());
    }

    #[tokio::test]
    async fn test_dashboard() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/analytics/dashboard")
            .match_header(API_KEY_HEADER, Matcher::Any)
            .with_status(200)
            .with_body(
                r#"{"total_agents":9,"active_agents":4,"total_queries":100,
                   "queries_today":7,"avg_response_time_ms":88.0,"success_rate":0.97,
                   "top_agents":[{"id":"a1","name":"Echo"}]}"#,
            )
            .create_async()
            .await;

        let dashboard = client(&server).dashboard().await.unwrap();

        assert_eq!(dashboard.total_agents, 9);
        assert_eq!(dashboard.queries_today, 7);
        assert_eq!(dashboard.top_agents[0].name, "Echo");
    }

    #[tokio::test]
    async fn test_http_error_carries_remote_message() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/agents/missing/stats")
            .with_status(404)
            .with_body(r#"{"error":"Agent not found"}"#)
            .create_async()
            .await;

        match client(&server).agent_stats("missing").await {
            Err(Error::Api { status, message }) => {
                assert_eq!(status, 404);
                assert_eq!(message, "Agent not found");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_http_error_without_body_uses_status() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/health")
            .with_status(503)
            .create_async()
            .await;

        match client(&server).health().await {
            Err(Error::Api { status, message }) => {
                assert_eq!(status, 503);
                assert_eq!(message, "HTTP 503");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_undecodable_body_is_transport_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/health")
            .with_status(200)
            .with_body("<html>maintenance</html>")
            .create_async()
            .await;

        assert!(matches!(
            client(&server).health().await,
            Err(Error::Transport(_))
        ));
    }
}
