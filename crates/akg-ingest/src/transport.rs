//! SPARQL endpoint transport

use async_trait::async_trait;
use reqwest::Client;

use akg_core::{AkgError, FetcherConfig, Result};

use crate::SparqlQuery;

/// Media type requested from the endpoint
pub const SPARQL_RESULTS_JSON: &str = "application/sparql-results+json";

/// Executes a query and returns the raw response body
#[async_trait]
pub trait QueryTransport: Send + Sync {
    async fn execute(&self, query: &SparqlQuery) -> Result<String>;
}

// ============================================================================
// HTTP transport
// ============================================================================

/// Issues queries as HTTP GET requests against a SPARQL endpoint
pub struct HttpTransport {
    client: Client,
    endpoint: String,
}

impl HttpTransport {
    /// Create a transport with a default client
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
        }
    }

    /// Create a transport whose requests time out after the query timeout
    pub fn from_config(config: &FetcherConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.query_timeout())
            .build()
            .map_err(|e| AkgError::Transport(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl QueryTransport for HttpTransport {
    async fn execute(&self, query: &SparqlQuery) -> Result<String> {
        let mut params = vec![
            ("query", query.text().to_string()),
            ("format", SPARQL_RESULTS_JSON.to_string()),
            ("timeout", query.endpoint_timeout_ms().to_string()),
        ];
        if let Some(graph) = query.default_graph() {
            params.push(("default-graph-uri", graph.to_string()));
        }

        let response = self
            .client
            .get(&self.endpoint)
            .header("Accept", SPARQL_RESULTS_JSON)
            .query(&params)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AkgError::Timeout(format!("Query for {} timed out: {e}", query.category()))
                } else {
                    AkgError::Transport(format!("Request to {} failed: {e}", self.endpoint))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(AkgError::Transport(format!(
                "Endpoint returned {status}: {error_text}"
            )));
        }

        response
            .text()
            .await
            .map_err(|e| AkgError::Transport(format!("Failed to read response body: {e}")))
    }
}
