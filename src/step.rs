//! Checklist steps: ordered work items inside an atomic state.

use serde::{Deserialize, Serialize};

/// A single checklist item inside an atomic [`crate::state::State`].
///
/// Identity inside a state is `name`. Steps with the same `order` are *parallel*: either
/// may be completed first, in any order, and completing one does not unblock the other.
/// Steps with distinct orders are sequential: the lowest-order group among incomplete
/// steps is the only group eligible for completion (see
/// [`crate::execution::Execution::complete`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    /// Name of the step, unique within its state.
    pub name: String,
    /// Optional role tag naming who is expected to complete this step.
    pub participant: Option<String>,
    /// Position among the state's steps. Ties denote parallel peers.
    pub order: u32,
    /// Whether this step has been completed.
    pub complete: bool,
    /// Optional decision tag recorded by `decision(step, choice)`.
    pub decision: Option<String>,
}

impl Step {
    /// Construct a fresh, incomplete step.
    pub fn new(name: impl Into<String>, order: u32) -> Self {
        Self {
            name: name.into(),
            participant: None,
            order,
            complete: false,
            decision: None,
        }
    }

    /// Builder-style setter for `participant`.
    pub fn with_participant(mut self, participant: impl Into<String>) -> Self {
        self.participant = Some(participant.into());
        self
    }

    /// Mark the step complete, optionally recording a decision tag.
    pub fn mark_complete(&mut self, decision: Option<String>) {
        self.complete = true;
        if decision.is_some() {
            self.decision = decision;
        }
    }

    /// Reset the step back to incomplete, clearing any recorded decision.
    pub fn reset(&mut self) {
        self.complete = false;
        self.decision = None;
    }
}
