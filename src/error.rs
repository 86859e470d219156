//! Error types for the chart compiler and execution interpreter.
//!
//! All fallible operations in this crate return [`Result<T>`], a thin alias over
//! `std::result::Result<T, EngineError>`. `EngineError` is a single flat enum, in the
//! style of a `thiserror`-derived error hierarchy: one variant per distinct failure the
//! spec names, each carrying just enough context to let a caller decide what to do next.

use thiserror::Error;

/// Convenience result type for the engine's public API.
pub type Result<T> = std::result::Result<T, EngineError>;

/// All errors the chart compiler and execution interpreter can surface.
///
/// `Builder::build` only ever returns [`EngineError::InvalidChart`]. Every other
/// variant is surfaced by [`crate::execution::Execution`] methods.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    /// No transition handler for `event` was found on `from` or any of its ancestors.
    #[error("no transition for event {event:?} from state '{from}'")]
    NoTransition {
        /// Dotted path of the state the dispatch started from.
        from: String,
        /// Debug-formatted event that had no handler.
        event: String,
    },

    /// A transition's target does not resolve to a known state.
    ///
    /// Indicates a malformed chart; after `Builder::build` validation this should be
    /// unreachable, but the interpreter checks it anyway rather than trusting the chart.
    #[error("transition targets unknown state '{target}'")]
    NoState {
        /// The unresolved/unknown target name.
        target: String,
    },

    /// The host's `guard` callback rejected a transition.
    #[error("guard rejected transition: {reason}")]
    GuardRejected {
        /// Reason string returned by the guard.
        reason: String,
    },

    /// `complete`/`decision` was called for a step outside the current next-step set.
    #[error("next step {}: {}", if next_steps.len() > 1 { "are" } else { "is" }, next_steps.join(", "))]
    StepOutOfOrder {
        /// Names of the steps that may currently be completed.
        next_steps: Vec<String>,
    },

    /// `complete`/`decision` was called for a step not present in the current state.
    #[error("unknown step '{name}'")]
    UnknownStep {
        /// The step name that was not found.
        name: String,
    },

    /// Action-queue drain hit a tag the callback does not implement.
    #[error("unknown action '{tag}'")]
    UnknownAction {
        /// The unresolved action tag.
        tag: String,
    },

    /// Raised by the builder when a chart fails validation.
    #[error("invalid chart: {reason}")]
    InvalidChart {
        /// Human-readable reason the chart was rejected.
        reason: String,
    },

    /// Surfaced by a persistence adapter on an optimistic-lock conflict.
    #[error("persistence conflict: expected lock_version {expected}, found {found}")]
    PersistenceConflict {
        /// The lock version the caller expected to update.
        expected: u64,
        /// The lock version actually stored.
        found: u64,
    },

    /// Surfaced by a persistence adapter when the subject has no stored record.
    #[error("no workflow record for subject '{subject}'")]
    NotFound {
        /// The subject key that was looked up.
        subject: String,
    },
}

impl EngineError {
    /// Build a [`EngineError::NoTransition`] from a state path and a debug-formatted event.
    pub fn no_transition(from: impl Into<String>, event: impl std::fmt::Debug) -> Self {
        Self::NoTransition {
            from: from.into(),
            event: format!("{:?}", event),
        }
    }

    /// Build an [`EngineError::InvalidChart`].
    pub fn invalid_chart(reason: impl Into<String>) -> Self {
        Self::InvalidChart {
            reason: reason.into(),
        }
    }
}
