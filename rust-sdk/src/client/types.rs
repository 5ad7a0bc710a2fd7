//! Coordinator record types.
//!
//! The coordinator answers in snake_case. Each endpoint has a wire struct
//! mirroring that shape (lenient: every field defaults) and a canonical
//! record exposed to SDK callers, serialized in camelCase. A field sent as
//! `null` decodes the same as a missing one.

use serde::{Deserialize, Deserializer, Serialize};

use crate::query::Metadata;

/// Decode `null` as the type's default instead of failing.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

// =============================================================================
// Health
// =============================================================================

#[derive(Debug, Deserialize)]
pub(crate) struct HealthWire {
    #[serde(default, deserialize_with = "null_as_default")]
    status: String,
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    timestamp: Option<String>,
}

/// Coordinator liveness report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoordinatorHealth {
    pub status: String,
    pub version: Option<String>,
    pub timestamp: Option<String>,
}

impl From<HealthWire> for CoordinatorHealth {
    fn from(w: HealthWire) -> Self {
        Self {
            status: w.status,
            version: w.version,
            timestamp: w.timestamp,
        }
    }
}

// =============================================================================
// Agent stats
// =============================================================================

#[derive(Debug, Deserialize)]
pub(crate) struct AgentStatsWire {
    #[serde(default, deserialize_with = "null_as_default")]
    agent_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    total_queries: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    successful_queries: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    failed_queries: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    avg_response_time_ms: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    total_earnings: f64,
    #[serde(default)]
    last_active: Option<String>,
}

/// Query volume and earnings for one agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentStats {
    pub agent_id: String,
    pub total_queries: u64,
    pub successful_queries: u64,
    pub failed_queries: u64,
    pub average_response_time_ms: f64,
    pub total_earnings: f64,
    pub last_active: Option<String>,
}

impl AgentStats {
    /// Fraction of queries that succeeded, 0.0 when none were handled.
    pub fn success_rate(&self) -> f64 {
        if self.total_queries == 0 {
            0.0
        } else {
            self.successful_queries as f64 / self.total_queries as f64
        }
    }
}

impl From<AgentStatsWire> for AgentStats {
    fn from(w: AgentStatsWire) -> Self {
        Self {
            agent_id: w.agent_id,
            total_queries: w.total_queries,
            successful_queries: w.successful_queries,
            failed_queries: w.failed_queries,
            average_response_time_ms: w.avg_response_time_ms,
            total_earnings: w.total_earnings,
            last_active: w.last_active,
        }
    }
}

// =============================================================================
// Reputation
// =============================================================================

#[derive(Debug, Deserialize)]
pub(crate) struct ReputationWire {
    #[serde(default, deserialize_with = "null_as_default")]
    agent_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    reputation_score: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    total_ratings: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    average_rating: f64,
    #[serde(default)]
    rank: Option<u64>,
}

/// Reputation the marketplace holds for one agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentReputation {
    pub agent_id: String,
    pub score: f64,
    pub total_ratings: u64,
    pub average_rating: f64,
    pub rank: Option<u64>,
}

impl From<ReputationWire> for AgentReputation {
    fn from(w: ReputationWire) -> Self {
        Self {
            agent_id: w.agent_id,
            score: w.reputation_score,
            total_ratings: w.total_ratings,
            average_rating: w.average_rating,
            rank: w.rank,
        }
    }
}

// =============================================================================
// Agent listing
// =============================================================================

#[derive(Debug, Deserialize)]
pub(crate) struct AgentWire {
    #[serde(default, alias = "agent_id", deserialize_with = "null_as_default")]
    id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    capabilities: Vec<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    reputation_score: Option<f64>,
    #[serde(default)]
    webhook_url: Option<String>,
    #[serde(default)]
    created_at: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    metadata: Metadata,
}

/// `GET /agents` answers either a bare array or `{"agents": [...]}`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum AgentListWire {
    Bare(Vec<AgentWire>),
    Wrapped {
        #[serde(deserialize_with = "null_as_default")]
        agents: Vec<AgentWire>,
    },
}

impl AgentListWire {
    pub(crate) fn into_agents(self) -> Vec<AgentSummary> {
        let agents = match self {
            AgentListWire::Bare(agents) => agents,
            AgentListWire::Wrapped { agents } => agents,
        };
        agents.into_iter().map(AgentSummary::from).collect()
    }
}

/// An agent registered with the marketplace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentSummary {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub capabilities: Vec<String>,
    pub status: Option<String>,
    pub reputation_score: Option<f64>,
    pub webhook_url: Option<String>,
    pub created_at: Option<String>,
    pub metadata: Metadata,
}

impl From<AgentWire> for AgentSummary {
    fn from(w: AgentWire) -> Self {
        Self {
            id: w.id,
            name: w.name,
            description: w.description,
            capabilities: w.capabilities,
            status: w.status,
            reputation_score: w.reputation_score,
            webhook_url: w.webhook_url,
            created_at: w.created_at,
            metadata: w.metadata,
        }
    }
}

// =============================================================================
// Dashboard
// =============================================================================

#[derive(Debug, Deserialize)]
pub(crate) struct DashboardWire {
    #[serde(default, deserialize_with = "null_as_default")]
    total_agents: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    active_agents: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    total_queries: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    queries_today: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    avg_response_time_ms: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    success_rate: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    top_agents: Vec<AgentWire>,
}

/// Marketplace-wide analytics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardAnalytics {
    pub total_agents: u64,
    pub active_agents: u64,
    pub total_queries: u64,
    pub queries_today: u64,
    pub average_response_time_ms: f64,
    pub success_rate: f64,
    pub top_agents: Vec<AgentSummary>,
}

impl From<DashboardWire> for DashboardAnalytics {
    fn from(w: DashboardWire) -> Self {
        Self {
            total_agents: w.total_agents,
            active_agents: w.active_agents,
            total_queries: w.total_queries,
            queries_today: w.queries_today,
            average_response_time_ms: w.avg_response_time_ms,
            success_rate: w.success_rate,
            top_agents: w.top_agents.into_iter().map(AgentSummary::from).collect(),
        }
    }
}

/// Error body the coordinator sends with HTTP errors.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ErrorWire {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_stats_maps_snake_case_to_camel_case() {
        let wire: AgentStatsWire = serde_json::from_value(json!({
            "agent_id": "a1",
            "total_queries": 10,
            "successful_queries": 8,
            "failed_queries": 2,
            "avg_response_time_ms": 120.5,
            "total_earnings": 3.25
        }))
        .unwrap();
        let stats = AgentStats::from(wire);

        assert_eq!(stats.average_response_time_ms, 120.5);
        assert!((stats.success_rate() - 0.8).abs() < f64::EPSILON);

        let value = serde_json::to_value(&stats).unwrap();
        assert_eq!(value["agentId"], "a1");
        assert_eq!(value["averageResponseTimeMs"], 120.5);
    }

    #[test]
    fn test_success_rate_without_queries() {
        let stats = AgentStats::from(serde_json::from_value::<AgentStatsWire>(json!({})).unwrap());
        assert_eq!(stats.success_rate(), 0.0);
    }

    #[test]
    fn test_agent_list_accepts_both_shapes() {
        let bare: AgentListWire =
            serde_json::from_value(json!([{"id": "a1", "name": "one"}])).unwrap();
        assert_eq!(bare.into_agents()[0].id, "a1");

        let wrapped: AgentListWire = serde_json::from_value(json!({
            "agents": [{"agent_id": "a2", "name": "two", "capabilities": ["search"]}]
        }))
        .unwrap();
        let agents = wrapped.into_agents();
        assert_eq!(agents[0].id, "a2");
        assert_eq!(agents[0].capabilities, vec!["search"]);
    }

    #[test]
    fn test_reputation_score_is_renamed() {
        let wire: ReputationWire = serde_json::from_value(json!({
            "agent_id": "a1",
            "reputation_score": 4.7,
            "total_ratings": 31
        }))
        .unwrap();
        let reputation = AgentReputation::from(wire);
        assert_eq!(reputation.score, 4.7);
        assert_eq!(reputation.total_ratings, 31);
        assert_eq!(reputation.rank, None);
    }

    #[test]
    fn test_null_fields_decode_as_defaults() {
        let stats: AgentStatsWire = serde_json::from_value(json!({
            "agent_id": null,
            "total_queries": 3,
            "successful_queries": null,
            "failed_queries": null,
            "avg_response_time_ms": null,
            "total_earnings": null,
            "last_active": null
        }))
        .unwrap();
        let stats = AgentStats::from(stats);
        assert_eq!(stats.agent_id, "");
        assert_eq!(stats.total_queries, 3);
        assert_eq!(stats.average_response_time_ms, 0.0);
        assert_eq!(stats.last_active, None);

        let health: HealthWire =
            serde_json::from_value(json!({"status": null, "version": null})).unwrap();
        assert_eq!(CoordinatorHealth::from(health).status, "");

        let reputation: ReputationWire = serde_json::from_value(json!({
            "agent_id": "a1",
            "reputation_score": null,
            "total_ratings": null,
            "average_rating": null,
            "rank": null
        }))
        .unwrap();
        assert_eq!(AgentReputation::from(reputation).score, 0.0);

        let agents: AgentListWire = serde_json::from_value(json!([{
            "id": "a1",
            "name": null,
            "capabilities": null,
            "metadata": null
        }]))
        .unwrap();
        let agents = agents.into_agents();
        assert_eq!(agents[0].name, "");
        assert!(agents[0].capabilities.is_empty());
        assert!(agents[0].metadata.is_empty());

        let wrapped: AgentListWire = serde_json::from_value(json!({"agents": null})).unwrap();
        assert!(wrapped.into_agents().is_empty());

        let dashboard: DashboardWire = serde_json::from_value(json!({
            "total_agents": 2,
            "active_agents": null,
            "total_queries": null,
            "queries_today": null,
            "avg_response_time_ms": null,
            "success_rate": null,
            "top_agents": null
        }))
        .unwrap();
        let dashboard = DashboardAnalytics::from(dashboard);
        assert_eq!(dashboard.total_agents, 2);
        assert_eq!(dashboard.success_rate, 0.0);
        assert!(dashboard.top_agents.is_empty());
    }
}
