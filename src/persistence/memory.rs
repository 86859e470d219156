//! An in-memory [`WorkflowStore`], analogous to the teacher's `InMemoryCheckpointSaver`.
//!
//! Exists for tests and examples; not durable across process restarts.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::Utc;
use serde_json::Value;
use uuid::Uuid;

use super::{StepRecord, WorkflowRecord, WorkflowStore};
use crate::dump::Dump;
use crate::error::{EngineError, Result};

/// An in-memory, process-local [`WorkflowStore`] backed by a mutex-guarded map.
#[derive(Default)]
pub struct InMemoryWorkflowStore {
    records: Mutex<HashMap<Uuid, WorkflowRecord>>,
}

impl InMemoryWorkflowStore {
    /// Construct an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl WorkflowStore for InMemoryWorkflowStore {
    fn load(&self, id: Uuid) -> Result<Option<WorkflowRecord>> {
        Ok(self.records.lock().unwrap().get(&id).cloned())
    }

    fn create(&self, dump: &Dump) -> Result<WorkflowRecord> {
        let id = Uuid::new_v4();
        let record = WorkflowRecord::from_dump(id, dump, 0);
        self.records.lock().unwrap().insert(id, record.clone());
        Ok(record)
    }

    fn update(&self, record: &WorkflowRecord, dump: &Dump, metadata: Value) -> Result<WorkflowRecord> {
        let mut store = self.records.lock().unwrap();
        let current = store
            .get(&record.id)
            .ok_or_else(|| EngineError::NotFound { subject: record.id.to_string() })?;

        if current.lock_version != record.lock_version {
            return Err(EngineError::PersistenceConflict {
                expected: record.lock_version,
                found: current.lock_version,
            });
        }

        let mut updated = WorkflowRecord::from_dump(record.id, dump, current.lock_version + 1);
        for step in &mut updated.steps {
            let previous: Option<&StepRecord> = current
                .steps
                .iter()
                .find(|s| s.state == step.state && s.name == step.name);
            match previous {
                Some(prev) if !prev.is_complete && step.is_complete => {
                    step.completed_at = Some(Utc::now());
                    step.completed_metadata = Some(metadata.clone());
                }
                Some(prev) => {
                    step.completed_at = prev.completed_at;
                    step.completed_metadata = prev.completed_metadata.clone();
                }
                None => {}
            }
        }

        store.insert(record.id, updated.clone());
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dump::StepDump;

    fn dump_with_state(state: &str, confirm_complete: bool) -> Dump {
        Dump {
            name: "sale".to_string(),
            state: state.to_string(),
            complete: false,
            participants: Vec::new(),
            subject_key: None,
            steps: vec![StepDump {
                state: state.to_string(),
                order: 1,
                name: "confirm".to_string(),
                complete: confirm_complete,
                decision: None,
                participant: None,
            }],
        }
    }

    #[test]
    fn create_then_update_stamps_completed_at() {
        let store = InMemoryWorkflowStore::new();
        let record = store.create(&dump_with_state("pending", false)).unwrap();
        assert_eq!(record.lock_version, 0);

        let updated = store
            .update(&record, &dump_with_state("pending", true), Value::Null)
            .unwrap();
        assert_eq!(updated.lock_version, 1);
        assert!(updated.steps[0].completed_at.is_some());
    }

    #[test]
    fn stale_lock_version_is_rejected() {
        let store = InMemoryWorkflowStore::new();
        let record = store.create(&dump_with_state("pending", false)).unwrap();
        store
            .update(&record, &dump_with_state("pending", true), Value::Null)
            .unwrap();

        let err = store
            .update(&record, &dump_with_state("sent", true), Value::Null)
            .unwrap_err();
        assert!(matches!(err, EngineError::PersistenceConflict { .. }));
    }
}
