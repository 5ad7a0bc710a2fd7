//! Canonical query and response records.
//!
//! The coordinator and older SDK clients name the same logical field in
//! several ways (`query`/`text`/`prompt`, `query_id`/`queryId`, ...). Inbound
//! bodies are folded into a single [`Query`] using an explicit precedence
//! list per field, and handler outcomes are shaped into a [`ResponseEnvelope`].

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;
use uuid::Uuid;

/// Open-ended metadata, passed through without validation.
pub type Metadata = Map<String, Value>;

// =============================================================================
// Field aliases, highest precedence first
// =============================================================================

pub const TEXT_ALIASES: &[&str] = &["query", "text", "prompt"];
pub const QUERY_ID_ALIASES: &[&str] = &["query_id", "queryId"];
pub const CAPABILITY_ALIASES: &[&str] = &["capabilities", "capabilities_needed"];

// =============================================================================
// Query
// =============================================================================

/// A task forwarded by the coordinator, normalized for the handler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Query {
    /// Unique per inbound request, generated when the sender omits it
    pub query_id: String,
    /// Task payload; may be empty
    pub text: String,
    /// Capabilities the sender asked for, in the order given
    #[serde(default)]
    pub capabilities: Vec<String>,
    #[serde(default)]
    pub metadata: Metadata,
    /// RFC 3339 timestamp, receipt time when the sender omits it
    pub timestamp: String,
}

impl Query {
    /// Build a canonical query from the raw request body.
    ///
    /// Never fails: a body that is not a JSON object yields an empty query
    /// with a fresh id and the current time.
    pub fn from_body(body: &[u8]) -> Self {
        let value = if body.is_empty() {
            Value::Null
        } else {
            match serde_json::from_slice::<Value>(body) {
                Ok(v) => v,
                Err(e) => {
                    warn!(error = %e, body_length = body.len(), "query_body_malformed");
                    Value::Null
                }
            }
        };

        let empty = Map::new();
        let fields = match &value {
            Value::Object(map) => map,
            Value::Null => &empty,
            _ => {
                warn!("query_body_not_an_object");
                &empty
            }
        };

        Self::from_fields(fields)
    }

    /// Build a canonical query from already-parsed body fields.
    pub fn from_fields(fields: &Map<String, Value>) -> Self {
        Query {
            query_id: first_id(fields, QUERY_ID_ALIASES)
                .unwrap_or_else(|| Uuid::new_v4().to_string()),
            text: first_string(fields, TEXT_ALIASES).unwrap_or_default(),
            capabilities: first_string_list(fields, CAPABILITY_ALIASES).unwrap_or_default(),
            metadata: match fields.get("metadata") {
                Some(Value::Object(map)) => map.clone(),
                _ => Metadata::new(),
            },
            timestamp: first_string(fields, &["timestamp"]).unwrap_or_else(now_rfc3339),
        }
    }
}

/// Value of the first alias holding a non-empty string.
fn first_string(fields: &Map<String, Value>, aliases: &[&str]) -> Option<String> {
    aliases.iter().find_map(|name| match fields.get(*name) {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        _ => None,
    })
}

/// Like [`first_string`], but a numeric id is accepted in its decimal form.
fn first_id(fields: &Map<String, Value>, aliases: &[&str]) -> Option<String> {
    aliases.iter().find_map(|name| match fields.get(*name) {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// String elements of the first alias holding an array with at least one
/// string; non-string elements are skipped.
fn first_string_list(fields: &Map<String, Value>, aliases: &[&str]) -> Option<Vec<String>> {
    aliases.iter().find_map(|name| match fields.get(*name) {
        Some(Value::Array(items)) => {
            let list: Vec<String> = items
                .iter()
                .filter_map(|item| item.as_str().map(str::to_string))
                .collect();
            (!list.is_empty()).then_some(list)
        }
        _ => None,
    })
}

/// Current UTC time as RFC 3339 with millisecond precision.
pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

// =============================================================================
// Handler result and response envelope
// =============================================================================

/// What a query handler returns on success.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub response: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

impl QueryResult {
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            metadata: None,
        }
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

impl From<String> for QueryResult {
    fn from(response: String) -> Self {
        Self::new(response)
    }
}

impl From<&str> for QueryResult {
    fn from(response: &str) -> Self {
        Self::new(response)
    }
}

/// Body returned by `POST /query`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ResponseEnvelope {
    /// Envelope for a handler that completed.
    pub fn success(result: QueryResult, duration_ms: u64) -> Self {
        Self {
            success: true,
            response: Some(result.response),
            metadata: result.metadata,
            duration_ms: Some(duration_ms),
            error: None,
        }
    }

    /// Envelope for a handler that failed after `duration_ms`.
    pub fn failure(error: impl Into<String>, duration_ms: u64) -> Self {
        Self {
            success: false,
            response: None,
            metadata: None,
            duration_ms: Some(duration_ms),
            error: Some(error.into()),
        }
    }

    /// Envelope for a request rejected before the handler ran.
    pub fn rejected(error: impl Into<String>) -> Self {
        Self {
            success: false,
            response: None,
            metadata: None,
            duration_ms: None,
            error: Some(error.into()),
        }
    }
}
