//! AKG Ingest - Remote article fetching and extraction workers
//!
//! For a category such as `Scientist` the [`RemoteFetcher`] queries a SPARQL
//! endpoint for every entity of that class together with its abstract, then
//! hands each abstract to a worker from a bounded [`WorkerPool`]. Workers
//! extract candidate triples and deliver them to the shared
//! [`PoolRegistry`]; nothing is returned to the caller except a report.
//!
//! Dispatch order within a category follows the response order. Completion
//! order is unconstrained.

pub mod pool;
pub mod query;
pub mod registry;
pub mod response;
pub mod transport;

pub use pool::WorkerPool;
pub use query::SparqlQuery;
pub use registry::{PoolRegistry, RegistryStats, WorkerId, WorkerRecord, WorkerStatus};
pub use response::parse_response;
pub use transport::{HttpTransport, QueryTransport};

use std::sync::Arc;

use akg_core::{AkgError, FetcherConfig, Result};
use serde::Serialize;

/// Summary of one category fetch
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FetchReport {
    pub category: String,
    /// Articles in the response
    pub articles: usize,
    /// Workers spawned
    pub dispatched: usize,
}

/// Fetches article abstracts per category and dispatches extraction workers
#[derive(Clone)]
pub struct RemoteFetcher {
    transport: Arc<dyn QueryTransport>,
    pool: Arc<WorkerPool>,
    config: FetcherConfig,
}

impl RemoteFetcher {
    pub fn new(
        transport: Arc<dyn QueryTransport>,
        pool: Arc<WorkerPool>,
        config: FetcherConfig,
    ) -> Self {
        Self {
            transport,
            pool,
            config,
        }
    }

    pub fn pool(&self) -> &Arc<WorkerPool> {
        &self.pool
    }

    /// Fetch one category and dispatch one worker per article
    ///
    /// Nothing is queried once the pool has been cancelled. A transport or
    /// parse failure aborts before any worker is spawned. A
    /// failed slot acquisition aborts the remaining dispatch; workers already
    /// spawned keep running.
    pub async fn fetch(&self, category: &str) -> Result<FetchReport> {
        let query = SparqlQuery::for_category(category, &self.config)?;
        if self.pool.is_cancelled() {
            return Err(AkgError::Cancelled(format!("fetch for {category} not started")));
        }
        tracing::info!("Fetching abstracts for category {category}");

        let limit = self.config.query_timeout();
        let body = tokio::time::timeout(limit, self.transport.execute(&query))
            .await
            .map_err(|_| {
                AkgError::Timeout(format!("Query for {category} exceeded {limit:?}"))
            })?
            .inspect_err(|e| tracing::error!("Fetch for {category} failed: {e}"))?;

        let articles = parse_response(&body)
            .inspect_err(|e| tracing::error!("Fetch for {category} failed: {e}"))?;
        tracing::info!("Received {} articles for {category}", articles.len());

        let total = articles.len();
        let mut dispatched = 0;
        for article in articles {
            if let Err(e) = self.pool.submit(article).await {
                tracing::error!(
                    "Dispatch for {category} stopped after {dispatched} of {total} workers: {e}"
                );
                return Err(e);
            }
            dispatched += 1;
        }

        Ok(FetchReport {
            category: category.to_string(),
            articles: total,
            dispatched,
        })
    }

    /// Fetch every category in its own task, returning results in input order
    pub async fn fetch_all(&self, categories: &[String]) -> Vec<(String, Result<FetchReport>)> {
        let tasks = categories.iter().map(|category| {
            let fetcher = self.clone();
            let category = category.clone();
            tokio::spawn(async move { fetcher.fetch(&category).await })
        });
        let joined = futures::future::join_all(tasks).await;

        categories
            .iter()
            .cloned()
            .zip(joined)
            .map(|(category, joined)| {
                let result = joined.unwrap_or_else(|e| {
                    Err(AkgError::Other(anyhow::anyhow!("fetch task failed: {e}")))
                });
                (category, result)
            })
            .collect()
    }
}
