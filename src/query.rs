//! Predicates adapters expose to hosts for filtering persisted workflows.

use crate::dump::Dump;

/// A predicate over a [`Dump`]'s state path or step completion.
///
/// The dotted path convention is the wire form of a state: `state_has_prefix` matches a
/// state and every one of its descendants (`"working"` matches `"working"` and
/// `"working.waiting"`, not `"working2"`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// Current state equals exactly this dotted path.
    StateEquals(String),
    /// Current state is one of these dotted paths.
    StateIn(Vec<String>),
    /// Current state is this path or a descendant of it.
    StateHasPrefix(String),
    /// Some step with this name is complete, in any state.
    StepComplete(String),
}

impl Predicate {
    /// `state_equals(id)`.
    pub fn state_equals(id: impl Into<String>) -> Self {
        Predicate::StateEquals(id.into())
    }

    /// `state_in(ids)`.
    pub fn state_in<S: Into<String>>(ids: Vec<S>) -> Self {
        Predicate::StateIn(ids.into_iter().map(Into::into).collect())
    }

    /// `state_has_prefix(prefix)`.
    pub fn state_has_prefix(prefix: impl Into<String>) -> Self {
        Predicate::StateHasPrefix(prefix.into())
    }

    /// `step_complete(name)`.
    pub fn step_complete(name: impl Into<String>) -> Self {
        Predicate::StepComplete(name.into())
    }

    /// Evaluate this predicate against a dump.
    pub fn matches(&self, dump: &Dump) -> bool {
        match self {
            Predicate::StateEquals(id) => dump.state == *id,
            Predicate::StateIn(ids) => ids.iter().any(|id| *id == dump.state),
            Predicate::StateHasPrefix(prefix) => {
                dump.state == *prefix || dump.state.starts_with(&format!("{prefix}."))
            }
            Predicate::StepComplete(name) => dump.steps.iter().any(|s| s.name == *name && s.complete),
        }
    }
}
