//! Configuration module for the agent server and marketplace client.
//!
//! Configuration is supplied once at construction, either programmatically
//! through [`Config::new`] and the `with_*` builders, or from environment
//! variables via [`Config::from_env`]. There is no hot-reload.

use std::env;
use std::fmt;

use tracing::warn;

/// Production coordinator endpoint used when no base URL is configured.
pub const DEFAULT_BASE_URL: &str = "https://api.mt-marketplace.com";

/// Port the agent server listens on by default.
pub const DEFAULT_PORT: u16 = 3000;

/// Default timeout for outbound coordinator requests.
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;

/// SDK configuration.
#[derive(Clone)]
pub struct Config {
    /// API key sent as `x-api-key` on every coordinator request
    pub api_key: String,

    /// Identifier reported by the `/health` endpoint
    pub agent_id: String,

    /// Shared secret used to verify `x-mt-signature` on inbound webhooks
    pub webhook_secret: Option<String>,

    /// Reject `/query` requests that carry no signature header
    pub require_signature: bool,

    /// Port for the agent server to listen on
    pub port: u16,

    /// Coordinator base URL
    pub base_url: String,

    /// HTTP request timeout in milliseconds for the coordinator client
    pub request_timeout_ms: u64,
}

impl Config {
    /// Create a configuration with defaults for everything but the credentials.
    pub fn new(api_key: impl Into<String>, agent_id: impl Into<String>) -> Self {
        Config {
            api_key: api_key.into(),
            agent_id: agent_id.into(),
            webhook_secret: None,
            require_signature: false,
            port: DEFAULT_PORT,
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Config {
            api_key: env::var("MT_API_KEY").unwrap_or_default(),

            agent_id: env::var("MT_AGENT_ID").unwrap_or_else(|_| "agent".to_string()),

            webhook_secret: env::var("MT_WEBHOOK_SECRET").ok(),

            require_signature: parse_bool("MT_REQUIRE_SIGNATURE", false),

            port: parse_number("PORT", DEFAULT_PORT),

            base_url: env::var("MT_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),

            request_timeout_ms: parse_number("REQUEST_TIMEOUT_MS", DEFAULT_REQUEST_TIMEOUT_MS),
        }
    }

    pub fn with_webhook_secret(mut self, secret: impl Into<String>) -> Self {
        self.webhook_secret = Some(secret.into());
        self
    }

    pub fn with_require_signature(mut self, require: bool) -> Self {
        self.require_signature = require;
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_request_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.request_timeout_ms = timeout_ms;
        self
    }
}

// Credentials never reach log output.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &redact(Some(&self.api_key)))
            .field("agent_id", &self.agent_id)
            .field("webhook_secret", &redact(self.webhook_secret.as_ref()))
            .field("require_signature", &self.require_signature)
            .field("port", &self.port)
            .field("base_url", &self.base_url)
            .field("request_timeout_ms", &self.request_timeout_ms)
            .finish()
    }
}

fn redact(value: Option<&String>) -> &'static str {
    match value {
        Some(v) if !v.is_empty() => "<redacted>",
        _ => "<unset>",
    }
}

/// Parse a numeric environment variable, falling back to `default`.
fn parse_number<T: std::str::FromStr>(name: &str, default: T) -> T {
    let raw = match env::var(name) {
        Ok(v) => v,
        Err(_) => return default,
    };

    match raw.trim().parse() {
        Ok(v) => v,
        Err(_) => {
            warn!(env_var = name, value = %raw, "Invalid numeric value, using default");
            default
        }
    }
}

/// Parse a boolean environment variable ("true"/"false"/"1"/"0"/"yes"/"no").
fn parse_bool(name: &str, default: bool) -> bool {
    let raw = match env::var(name) {
        Ok(v) => v,
        Err(_) => return default,
    };

    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => {
            warn!(env_var = name, value = %raw, "Invalid boolean value, using default");
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_uses_defaults() {
        let config = Config::new("key", "agent-1");
        assert_eq!(config.port, 3000);
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert!(config.webhook_secret.is_none());
        assert!(!config.require_signature);
    }

    #[test]
    fn test_builders() {
        let config = Config::new("key", "agent-1")
            .with_webhook_secret("s1")
            .with_port(8081)
            .with_base_url("http://localhost:9000")
            .with_require_signature(true);
        assert_eq!(config.webhook_secret.as_deref(), Some("s1"));
        assert_eq!(config.port, 8081);
        assert_eq!(config.base_url, "http://localhost:9000");
        assert!(config.require_signature);
    }

    #[test]
    fn test_parse_number_valid() {
        env::set_var("TEST_SDK_NUMBER", "4242");
        assert_eq!(parse_number::<u16>("TEST_SDK_NUMBER", 1), 4242);
        env::remove_var("TEST_SDK_NUMBER");
    }

    #[test]
    fn test_parse_number_invalid_falls_back() {
        env::set_var("TEST_SDK_NUMBER_BAD", "not-a-port");
        assert_eq!(parse_number::<u16>("TEST_SDK_NUMBER_BAD", 3000), 3000);
        env::remove_var("TEST_SDK_NUMBER_BAD");
    }

    #[test]
    fn test_parse_bool() {
        env::set_var("TEST_SDK_BOOL", "Yes");
        assert!(parse_bool("TEST_SDK_BOOL", false));
        env::set_var("TEST_SDK_BOOL", "maybe");
        assert!(!parse_bool("TEST_SDK_BOOL", false));
        env::remove_var("TEST_SDK_BOOL");
        assert!(parse_bool("TEST_SDK_BOOL", true));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = Config::new("super-secret-key", "agent-1").with_webhook_secret("hmac-secret");
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("super-secret-key"));
        assert!(!rendered.contains("hmac-secret"));
        assert!(rendered.contains("agent-1"));
    }
}
