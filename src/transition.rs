//! Events and transitions: the handlers attached to a [`crate::state::State`].

use std::fmt;

/// An event dispatched to the interpreter, or raised synthetically by it.
///
/// Event lookup on a state is exact. `Completed("close")` does not match a handler
/// registered for a different step, and there is no wildcard matching on the variant
/// alone. `Null`, `Final`, and `NoSteps` are never dispatched by a caller; the
/// interpreter raises them itself during state entry (see
/// [`crate::execution::Execution`]'s entry algorithm).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Event {
    /// An arbitrary named event, dispatched by a caller via `transition`.
    Named(String),
    /// Raised when a step is completed via `complete`.
    Completed(String),
    /// Raised when a decision is recorded via `decision`.
    Decision(String, String),
    /// Synthetic: raised immediately on entering any state, to drive dynamic routing.
    Null,
    /// Synthetic: raised on entering a `final` leaf.
    Final,
    /// Synthetic: raised on entering an atomic leaf whose surviving step list is empty.
    NoSteps,
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::Named(tag) => write!(f, "{tag}"),
            Event::Completed(step) => write!(f, "completed({step})"),
            Event::Decision(step, choice) => write!(f, "decision({step}, {choice})"),
            Event::Null => write!(f, "<null>"),
            Event::Final => write!(f, "<final>"),
            Event::NoSteps => write!(f, "<no_steps>"),
        }
    }
}

/// The target of a [`Transition`]: a single state, or an ordered fallthrough list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// Target a single, already-resolved dotted state path.
    One(String),
    /// Try each candidate in order; the first whose guard accepts wins.
    List(Vec<String>),
}

impl Target {
    /// Iterate the candidate state paths in resolution order.
    pub fn candidates(&self) -> Vec<&str> {
        match self {
            Target::One(name) => vec![name.as_str()],
            Target::List(names) => names.iter().map(String::as_str).collect(),
        }
    }
}

/// A transition handler registered on a state for a single [`Event`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    /// The event this handler responds to.
    pub event: Event,
    /// Where the transition goes.
    pub target: Target,
    /// Whether re-targeting the current state fully re-enters it (steps reset) or only
    /// queues actions. Ignored when `target` does not resolve to the current state.
    pub reset: bool,
    /// Action tags queued when this transition is taken.
    pub actions: Vec<String>,
}

impl Transition {
    /// Construct a transition with a single target and `reset: true`.
    pub fn new(event: Event, target: impl Into<String>) -> Self {
        Self {
            event,
            target: Target::One(target.into()),
            reset: true,
            actions: Vec::new(),
        }
    }

    /// Construct a transition with an ordered fallthrough target list.
    pub fn with_fallthrough(event: Event, targets: Vec<String>) -> Self {
        Self {
            event,
            target: Target::List(targets),
            reset: true,
            actions: Vec::new(),
        }
    }

    /// Builder-style setter for `reset`.
    pub fn reset(mut self, reset: bool) -> Self {
        self.reset = reset;
        self
    }

    /// Builder-style setter for `actions`.
    pub fn with_actions(mut self, actions: Vec<String>) -> Self {
        self.actions = actions;
        self
    }
}
