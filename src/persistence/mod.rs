//! The persistence port: an abstract interface consumed by storage adapters.
//!
//! Mirrors the shape of the teacher's `CheckpointSaver` trait: one small capability
//! interface plus an in-memory reference implementation ([`memory::InMemoryWorkflowStore`])
//! that real adapters are not expected to use in production but that the engine's own
//! tests run against.

pub mod memory;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::dump::Dump;
use crate::error::Result;

/// A persisted checklist step, matching the recommended `workflow_steps` row shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepRecord {
    /// Dotted path of the owning state.
    pub state: String,
    /// Step name.
    pub name: String,
    /// Position among the state's steps.
    pub order: u32,
    /// Role tag, if any.
    pub participant: Option<String>,
    /// Decision tag, if recorded.
    pub decision: Option<String>,
    /// Whether the step is complete.
    pub is_complete: bool,
    /// When the step was completed, if it is.
    pub completed_at: Option<DateTime<Utc>>,
    /// Host-supplied metadata recorded at completion time (`opts` passed to `update`).
    pub completed_metadata: Option<Value>,
}

/// A persisted workflow, matching the recommended `workflows` row shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowRecord {
    /// Primary key.
    pub id: Uuid,
    /// Chart name.
    pub name: String,
    /// Dotted path of the current state.
    pub state: String,
    /// Whether the current state is a `final` leaf.
    pub is_complete: bool,
    /// Optimistic-lock version, incremented on every `update`.
    pub lock_version: u64,
    /// Flattened step rows.
    pub steps: Vec<StepRecord>,
}

impl WorkflowRecord {
    fn from_dump(id: Uuid, dump: &Dump, lock_version: u64) -> Self {
        Self {
            id,
            name: dump.name.clone(),
            state: dump.state.clone(),
            is_complete: dump.complete,
            lock_version,
            steps: dump
                .steps
                .iter()
                .map(|s| StepRecord {
                    state: s.state.clone(),
                    name: s.name.clone(),
                    order: s.order,
                    participant: s.participant.clone(),
                    decision: s.decision.clone(),
                    is_complete: s.complete,
                    completed_at: None,
                    completed_metadata: None,
                })
                .collect(),
        }
    }
}

/// The storage adapter contract. Implementations are expected to run `load`/`update`
/// inside one transaction and enforce the optimistic-lock check themselves; the engine
/// only supplies the `lock_version` it last observed.
pub trait WorkflowStore {
    /// Load a previously created record by id, if one exists.
    fn load(&self, id: Uuid) -> Result<Option<WorkflowRecord>>;

    /// Create a new record from a fresh dump.
    fn create(&self, dump: &Dump) -> Result<WorkflowRecord>;

    /// Write back `dump` against `record`'s observed `lock_version`, incrementing it.
    /// `metadata` is stamped onto any step that transitioned from incomplete to
    /// complete since `record` was loaded, as `completed_metadata`.
    ///
    /// Fails with [`crate::error::EngineError::PersistenceConflict`] if the stored
    /// version no longer matches `record.lock_version`.
    fn update(&self, record: &WorkflowRecord, dump: &Dump, metadata: Value) -> Result<WorkflowRecord>;
}
