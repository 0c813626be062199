//! Bounded pool of extraction workers
//!
//! Each submitted article gets one worker. A worker holds a pool slot from
//! before it is registered until its extraction has finished, whichever way
//! it finishes, so at most `capacity` workers are ever running.

use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use akg_core::{AkgError, Article, PoolConfig, Result, TripleExtractor};

use crate::registry::{PoolRegistry, WorkerId};

/// Fixed-capacity pool running extraction workers on the blocking thread pool
pub struct WorkerPool {
    semaphore: Arc<Semaphore>,
    capacity: usize,
    registry: Arc<PoolRegistry>,
    extractor: Arc<dyn TripleExtractor>,
    acquire_timeout: Option<Duration>,
    cancel: CancellationToken,
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl WorkerPool {
    /// Create a pool with `capacity` slots (at least one)
    pub fn new(
        capacity: usize,
        extractor: Arc<dyn TripleExtractor>,
        registry: Arc<PoolRegistry>,
    ) -> Self {
        let capacity = capacity.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
            registry,
            extractor,
            acquire_timeout: None,
            cancel: CancellationToken::new(),
            handles: Mutex::new(Vec::new()),
        }
    }

    /// Create a pool from configuration
    pub fn from_config(
        config: &PoolConfig,
        extractor: Arc<dyn TripleExtractor>,
        registry: Arc<PoolRegistry>,
    ) -> Self {
        Self::new(config.capacity, extractor, registry).with_acquire_timeout(config.acquire_timeout())
    }

    /// Bound how long `submit` waits for a free slot
    pub fn with_acquire_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    pub fn registry(&self) -> &Arc<PoolRegistry> {
        &self.registry
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Slots currently free
    pub fn available_slots(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Fail pending and future slot acquisitions; running workers finish
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Wait for a free slot, then register and spawn a worker for `article`
    pub async fn submit(&self, article: Article) -> Result<WorkerId> {
        let permit = self.acquire().await?;
        let id = self.registry.register(&article.entity_id);
        tracing::debug!("Spawning worker {id} for {}", article.entity_id);

        let registry = Arc::clone(&self.registry);
        let extractor = Arc::clone(&self.extractor);
        let handle = tokio::spawn(async move {
            // Released when this task ends
            let _permit = permit;
            let entity_id = article.entity_id.clone();
            let name = extractor.name().to_string();
            let outcome = tokio::task::spawn_blocking(move || extractor.extract(&article)).await;

            match outcome {
                Ok(Ok(triples)) => {
                    tracing::debug!(
                        "Worker {id} extracted {} triples with {name}",
                        triples.len()
                    );
                    registry.complete(id, triples);
                }
                Ok(Err(e)) => {
                    tracing::warn!("Worker {id} failed on {entity_id}: {e}");
                    registry.fail(id, e.to_string());
                }
                Err(e) => {
                    tracing::warn!("Worker {id} aborted on {entity_id}: {e}");
                    registry.fail(id, format!("worker aborted: {e}"));
                }
            }
        });

        let mut handles = self.handles.lock().unwrap_or_else(PoisonError::into_inner);
        handles.retain(|handle| !handle.is_finished());
        handles.push(handle);
        Ok(id)
    }

    async fn acquire(&self) -> Result<OwnedSemaphorePermit> {
        let acquire = Arc::clone(&self.semaphore).acquire_owned();
        let acquired = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                return Err(AkgError::Cancelled("slot acquisition cancelled".to_string()));
            }
            result = with_deadline(self.acquire_timeout, acquire) => result?,
        };
        acquired.map_err(|_| AkgError::Cancelled("worker pool closed".to_string()))
    }

    /// Handles of workers that may still be running
    fn tracked_workers(&self) -> usize {
        self.handles
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Wait until every spawned worker has finished
    pub async fn wait_idle(&self) {
        loop {
            let handles = std::mem::take(
                &mut *self.handles.lock().unwrap_or_else(PoisonError::into_inner),
            );
            if handles.is_empty() {
                break;
            }
            for handle in handles {
                if let Err(e) = handle.await {
                    tracing::warn!("Worker task ended abnormally: {e}");
                }
            }
        }
    }
}

async fn with_deadline<F: Future>(limit: Option<Duration>, future: F) -> Result<F::Output> {
    match limit {
        Some(limit) => tokio::time::timeout(limit, future)
            .await
            .map_err(|_| AkgError::Timeout(format!("no worker slot free within {limit:?}"))),
        None => Ok(future.await),
    }
}
