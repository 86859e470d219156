//! The host capability set: actions, guards, and step visibility.
//!
//! Mirrors the teacher's `CheckpointSaver` trait shape (one required method, several
//! optional methods with sensible defaults) rather than dispatching by string-matched
//! method name: unknown action tags are a defined [`crate::error::EngineError::UnknownAction`],
//! never a silent no-op.

use serde_json::Value;

use crate::error::Result;

/// The outcome of executing a single action.
///
/// Mirrors the action-result contract of §4.4: an action may no-op, record a value
/// under its own tag, replace the whole context, or patch one context key. Errors are
/// reported through the surrounding `Result`, not as a variant here.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionOutcome {
    /// No effect on context or results.
    Ok,
    /// Record `value` in the per-call result map under the action's own tag.
    OkValue(Value),
    /// Replace the execution's context wholesale.
    UpdatedContext(Value),
    /// Patch a single key of the execution's context.
    UpdatedKey(String, Value),
}

/// The object a host implements to drive chart execution.
///
/// Only [`Callback::action`] is required. `use_step`, `guard`, and `participant_id` all
/// have defaults matching the spec's stated defaults (keep every step; accept every
/// transition; no participant resolution).
pub trait Callback {
    /// Execute the named action against the given context, returning its outcome.
    ///
    /// Must fail with [`crate::error::EngineError::UnknownAction`] (or propagate one) if
    /// `tag` is not a tag this host implements. Never silently ignore an unknown tag.
    fn action(&mut self, tag: &str, ctx: &Value) -> Result<ActionOutcome>;

    /// Whether `step` should be shown in the current context. Defaults to `true`.
    fn use_step(&self, _step: &str, _ctx: &Value) -> bool {
        true
    }

    /// Whether a transition from `from` to `to` is permitted. Defaults to accepting.
    ///
    /// Returning `Err(reason)` rejects the transition with
    /// [`crate::error::EngineError::GuardRejected`].
    fn guard(&self, _from: &str, _to: &str, _ctx: &Value) -> std::result::Result<(), String> {
        Ok(())
    }

    /// Resolve a role tag to a host-defined participant identifier, for use by `dump`.
    /// Defaults to no resolution.
    fn participant_id(&self, _ctx: &Value, _role: &str) -> Option<Value> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Minimal;

    impl Callback for Minimal {
        fn action(&mut self, tag: &str, _ctx: &Value) -> Result<ActionOutcome> {
            Err(crate::error::EngineError::UnknownAction { tag: tag.to_string() })
        }
    }

    #[test]
    fn defaults_keep_steps_and_accept_transitions() {
        let cb = Minimal;
        assert!(cb.use_step("anything", &Value::Null));
        assert!(cb.guard("a", "b", &Value::Null).is_ok());
        assert_eq!(cb.participant_id(&Value::Null, "owner"), None);
    }
}
