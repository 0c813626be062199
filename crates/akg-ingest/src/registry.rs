//! Shared record of extraction workers and their results

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use akg_core::Triple;

/// Worker identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkerId(Uuid);

impl WorkerId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for WorkerId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for WorkerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle state of a worker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum WorkerStatus {
    Running,
    Completed { triples: usize },
    Failed { reason: String },
}

impl WorkerStatus {
    pub fn is_finished(&self) -> bool {
        !matches!(self, Self::Running)
    }
}

/// One registered worker
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerRecord {
    pub id: WorkerId,
    /// Entity whose article the worker processes
    pub entity_id: String,
    pub status: WorkerStatus,
    pub registered_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

/// Registry counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RegistryStats {
    pub registered: usize,
    pub running: usize,
    pub completed: usize,
    pub failed: usize,
    /// Triples collected from completed workers
    pub triples: usize,
}

#[derive(Debug, Default)]
struct RegistryState {
    /// Records in registration order
    workers: Vec<WorkerRecord>,
    index: HashMap<WorkerId, usize>,
    triples: Vec<Triple>,
}

/// Internally synchronized worker registry
///
/// A single mutex guards both the records and the collected triples, so a
/// registration is never observed half-done and a completion appends its
/// triples in one step.
#[derive(Debug, Default)]
pub struct PoolRegistry {
    state: Mutex<RegistryState>,
}

impl PoolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // Every update is applied in full before the guard drops, so a poisoned
    // lock still holds a consistent state.
    fn lock(&self) -> MutexGuard<'_, RegistryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record a new running worker for `entity_id`
    pub fn register(&self, entity_id: &str) -> WorkerId {
        let id = WorkerId::new();
        let mut state = self.lock();
        let position = state.workers.len();
        state.workers.push(WorkerRecord {
            id,
            entity_id: entity_id.to_string(),
            status: WorkerStatus::Running,
            registered_at: Utc::now(),
            finished_at: None,
        });
        state.index.insert(id, position);
        id
    }

    /// Mark a worker as completed and collect its triples
    ///
    /// Returns `false` if the worker is unknown or already finished.
    pub fn complete(&self, id: WorkerId, triples: Vec<Triple>) -> bool {
        let mut state = self.lock();
        let Some(record) = running_record(&mut state, id) else {
            tracing::warn!("Ignoring completion of unknown or finished worker {id}");
            return false;
        };
        record.status = WorkerStatus::Completed {
            triples: triples.len(),
        };
        record.finished_at = Some(Utc::now());
        state.triples.extend(triples);
        true
    }

    /// Mark a worker as failed
    pub fn fail(&self, id: WorkerId, reason: impl Into<String>) -> bool {
        let mut state = self.lock();
        let Some(record) = running_record(&mut state, id) else {
            tracing::warn!("Ignoring failure of unknown or finished worker {id}");
            return false;
        };
        record.status = WorkerStatus::Failed {
            reason: reason.into(),
        };
        record.finished_at = Some(Utc::now());
        true
    }

    /// Number of registered workers
    pub fn len(&self) -> usize {
        self.lock().workers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of workers still running
    pub fn running(&self) -> usize {
        self.lock()
            .workers
            .iter()
            .filter(|w| !w.status.is_finished())
            .count()
    }

    pub fn get(&self, id: WorkerId) -> Option<WorkerRecord> {
        let state = self.lock();
        state.index.get(&id).map(|&i| state.workers[i].clone())
    }

    /// Copy of every record, in registration order
    pub fn snapshot(&self) -> Vec<WorkerRecord> {
        self.lock().workers.clone()
    }

    /// Copy of all collected triples
    pub fn triples(&self) -> Vec<Triple> {
        self.lock().triples.clone()
    }

    /// Drain the collected triples
    pub fn take_triples(&self) -> Vec<Triple> {
        std::mem::take(&mut self.lock().triples)
    }

    pub fn stats(&self) -> RegistryStats {
        let state = self.lock();
        let mut stats = RegistryStats {
            registered: state.workers.len(),
            triples: state.triples.len(),
            ..Default::default()
        };
        for worker in &state.workers {
            match worker.status {
                WorkerStatus::Running => stats.running += 1,
                WorkerStatus::Completed { .. } => stats.completed += 1,
                WorkerStatus::Failed { .. } => stats.failed += 1,
            }
        }
        stats
    }
}

fn running_record(state: &mut RegistryState, id: WorkerId) -> Option<&mut WorkerRecord> {
    let position = *state.index.get(&id)?;
    let record = &mut state.workers[position];
    (!record.status.is_finished()).then_some(record)
}
