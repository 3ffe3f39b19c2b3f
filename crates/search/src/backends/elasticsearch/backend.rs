//! Elasticsearch engine configuration and client construction.

use std::fmt::Debug;
use std::time::Duration;

use elasticsearch::Elasticsearch;
use elasticsearch::auth::Credentials;
use elasticsearch::cert::CertificateValidation;
use elasticsearch::http::transport::{SingleNodeConnectionPool, TransportBuilder};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{EngineError, EngineResult};

use super::response::transport_error;

/// Authentication configuration for Elasticsearch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ElasticsearchAuth {
    /// Basic username/password authentication.
    Basic {
        /// The username for basic auth.
        username: String,
        /// The password for basic auth.
        password: String,
    },
    /// Bearer token authentication.
    Bearer {
        /// The bearer token.
        token: String,
    },
}

/// Configuration for the Elasticsearch engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElasticsearchConfig {
    /// Elasticsearch node URLs (e.g., `["http://localhost:9200"]`).
    /// Currently uses the first node (single-node connection pool).
    pub nodes: Vec<String>,

    /// Transport timeout in milliseconds (default: 60000).
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Optional authentication.
    #[serde(default)]
    pub auth: Option<ElasticsearchAuth>,

    /// Whether to disable certificate validation (default: false).
    /// Only use for development/testing.
    #[serde(default)]
    pub disable_certificate_validation: bool,
}

fn default_request_timeout_ms() -> u64 {
    60_000
}

impl Default for ElasticsearchConfig {
    fn default() -> Self {
        Self {
            nodes: vec!["http://localhost:9200".to_string()],
            request_timeout_ms: default_request_timeout_ms(),
            auth: None,
            disable_certificate_validation: false,
        }
    }
}

impl ElasticsearchConfig {
    /// Creates a configuration for a single node.
    pub fn single_node(url: impl Into<String>) -> Self {
        Self {
            nodes: vec![url.into()],
            ..Self::default()
        }
    }

    /// Validates the configuration, returning every problem found.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        match self.nodes.first() {
            None => errors.push("at least one Elasticsearch node is required".to_string()),
            Some(url) => {
                if let Err(e) = url.parse::<elasticsearch::http::Url>() {
                    errors.push(format!("invalid Elasticsearch URL '{}': {}", url, e));
                }
            }
        }
        if self.request_timeout_ms == 0 {
            errors.push("Elasticsearch request_timeout_ms must be greater than 0".to_string());
        }
        errors
    }
}

/// A [`SearchEngineClient`](crate::engine::SearchEngineClient) backed by Elasticsearch.
pub struct ElasticsearchEngine {
    client: Elasticsearch,
    config: ElasticsearchConfig,
}

impl Debug for ElasticsearchEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElasticsearchEngine")
            .field("nodes", &self.config.nodes)
            .field("request_timeout_ms", &self.config.request_timeout_ms)
            .finish_non_exhaustive()
    }
}

impl ElasticsearchEngine {
    /// Creates a new engine client with the given configuration.
    pub fn new(config: ElasticsearchConfig) -> EngineResult<Self> {
        let client = Self::build_client(&config)?;
        Ok(Self { client, config })
    }

    /// Builds the Elasticsearch client from configuration.
    fn build_client(config: &ElasticsearchConfig) -> EngineResult<Elasticsearch> {
        let url = config
            .nodes
            .first()
            .cloned()
            .unwrap_or_else(|| "http://localhost:9200".to_string());

        let parsed_url: elasticsearch::http::Url =
            url.parse().map_err(|e| EngineError::Unavailable {
                message: format!("Invalid URL '{}': {}", url, e),
            })?;

        let conn_pool = SingleNodeConnectionPool::new(parsed_url);

        let mut builder = TransportBuilder::new(conn_pool)
            .timeout(Duration::from_millis(config.request_timeout_ms));

        if config.disable_certificate_validation {
            builder = builder.cert_validation(CertificateValidation::None);
        }

        if let Some(ref auth) = config.auth {
            builder = match auth {
                ElasticsearchAuth::Basic { username, password } => {
                    builder.auth(Credentials::Basic(username.clone(), password.clone()))
                }
                ElasticsearchAuth::Bearer { token } => {
                    builder.auth(Credentials::Bearer(token.clone()))
                }
            };
        }

        let transport = builder.build().map_err(|e| EngineError::Unavailable {
            message: format!("Failed to build transport: {}", e),
        })?;

        Ok(Elasticsearch::new(transport))
    }

    /// Returns the Elasticsearch client.
    pub(crate) fn client(&self) -> &Elasticsearch {
        &self.client
    }

    /// Returns the engine configuration.
    pub fn config(&self) -> &ElasticsearchConfig {
        &self.config
    }

    /// Returns the transport timeout in milliseconds.
    pub(crate) fn timeout_ms(&self) -> u64 {
        self.config.request_timeout_ms
    }

    /// Checks that the cluster answers and is not red.
    pub async fn health_check(&self) -> EngineResult<()> {
        let response = self
            .client
            .cluster()
            .health(elasticsearch::cluster::ClusterHealthParts::None)
            .send()
            .await
            .map_err(|e| transport_error(&e, self.timeout_ms()))?;

        let status = response.status_code();
        if !status.is_success() {
            return Err(EngineError::Unavailable {
                message: format!("Cluster health returned status {}", status),
            });
        }

        let body = response
            .json::<Value>()
            .await
            .map_err(|e| EngineError::internal(format!("Failed to parse health response: {}", e)))?;

        let cluster_status = body
            .get("status")
            .and_then(|s| s.as_str())
            .unwrap_or("unknown");

        if cluster_status == "red" {
            return Err(EngineError::Unavailable {
                message: "Cluster status is red".to_string(),
            });
        }

        tracing::debug!(status = cluster_status, "Elasticsearch cluster is reachable");
        Ok(())
    }
}
