//! `Execution`: the mutable interpreter over a compiled [`Chart`].
//!
//! Construction enters the chart's `initial_state`; afterwards the only ways to move are
//! [`Execution::transition`], [`Execution::complete`], and [`Execution::decision`]. Actions
//! queued along the way sit in [`Execution`] until [`Execution::execute_actions`] drains
//! them against the host [`Callback`]. Nothing here suspends: every method returns before
//! control goes back to the caller, per the single-threaded, synchronous scheduling model.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::callback::{ActionOutcome, Callback};
use crate::chart::Chart;
use crate::error::{EngineError, Result};
use crate::state::{State, StateKind};
use crate::transition::{Event, Target, Transition};

enum AcceptOutcome {
    Idempotent,
    Marked,
}

/// A mutable interpreter over a shared, immutable [`Chart`].
///
/// Owns its own `context`, current `state`, `history`, `transitions_log`, and action
/// queue. Every call either succeeds and mutates `self` in place, or fails and leaves
/// `self` exactly as it was (§7's error propagation policy).
pub struct Execution {
    /// The compiled chart this execution runs over.
    pub chart: Arc<Chart>,
    /// Host-managed free-form state, threaded through every guard/action call.
    pub context: Value,
    /// The current state snapshot: the chart's template for `state.name`, with
    /// step-completion and `ignored_steps` filtering overlaid.
    pub state: State,
    /// Prior state snapshots, most-recent first.
    pub history: Vec<State>,
    /// Taken transitions, most-recent first.
    pub transitions_log: Vec<Transition>,
    /// Scratch map for adapters, e.g. to stash a loaded persistence record.
    pub meta: Value,
    actions: Vec<String>,
}

impl Execution {
    /// Start a fresh execution, entering `chart.initial_state`.
    #[instrument(skip(chart, context, callback), fields(chart = %chart.name))]
    pub fn new(chart: Arc<Chart>, context: Value, callback: &mut dyn Callback) -> Result<Self> {
        let initial = chart.initial_state.clone();
        let placeholder = chart
            .state(&initial)
            .cloned()
            .ok_or_else(|| EngineError::NoState { target: initial.clone() })?;
        let mut exec = Self {
            chart,
            context,
            state: placeholder,
            history: Vec::new(),
            transitions_log: Vec::new(),
            meta: Value::Null,
            actions: Vec::new(),
        };
        exec.enter_target(&initial, Vec::new(), false, callback)?;
        Ok(exec)
    }

    /// Rehydrate an execution from a previously persisted snapshot, without running any
    /// entry side effects. Used by persistence adapters on `load`.
    pub fn resume(
        chart: Arc<Chart>,
        state: State,
        history: Vec<State>,
        transitions_log: Vec<Transition>,
        context: Value,
        meta: Value,
    ) -> Self {
        Self {
            chart,
            context,
            state,
            history,
            transitions_log,
            meta,
            actions: Vec::new(),
        }
    }

    /// Actions currently queued, in the order [`Execution::execute_actions`] would run
    /// them. Does not drain the queue.
    pub fn pending_actions(&self) -> Vec<&str> {
        self.actions.iter().rev().map(String::as_str).collect()
    }

    fn queue(&mut self, tag: String) {
        self.actions.insert(0, tag);
    }

    /// Dispatch a caller-supplied event against the current state, bubbling through
    /// ancestors until a handler is found.
    #[instrument(skip(self, callback), fields(from = %self.state.name, event = %event))]
    pub fn transition(&mut self, event: Event, callback: &mut dyn Callback) -> Result<()> {
        self.dispatch(event, callback)
    }

    /// Complete `step_id` in the current state. `NoTransition` from the resulting
    /// `Completed` dispatch is swallowed: the step still completes, the state is
    /// unchanged.
    #[instrument(skip(self, callback), fields(state = %self.state.name, step = %step_id))]
    pub fn complete(&mut self, step_id: &str, callback: &mut dyn Callback) -> Result<()> {
        match self.accept_step(step_id, None)? {
            AcceptOutcome::Idempotent => Ok(()),
            AcceptOutcome::Marked => {
                match self.dispatch(Event::Completed(step_id.to_string()), callback) {
                    Ok(()) => Ok(()),
                    Err(EngineError::NoTransition { .. }) => Ok(()),
                    Err(other) => Err(other),
                }
            }
        }
    }

    /// Record `choice` against `step_id` and complete it. Unlike [`Execution::complete`],
    /// a `NoTransition` from the resulting `Decision` dispatch is surfaced as an error.
    #[instrument(skip(self, callback), fields(state = %self.state.name, step = %step_id))]
    pub fn decision(
        &mut self,
        step_id: &str,
        choice: impl Into<String>,
        callback: &mut dyn Callback,
    ) -> Result<()> {
        let choice = choice.into();
        match self.accept_step(step_id, Some(choice.clone()))? {
            AcceptOutcome::Idempotent => Ok(()),
            AcceptOutcome::Marked => self.dispatch(Event::Decision(step_id.to_string(), choice), callback),
        }
    }

    fn accept_step(&mut self, step_id: &str, decision: Option<String>) -> Result<AcceptOutcome> {
        let kept = self.state.steps.iter().find(|s| s.name == step_id);
        let Some(kept) = kept else {
            return Err(EngineError::UnknownStep {
                name: step_id.to_string(),
            });
        };
        let repeatable = self.state.repeatable_steps.contains(step_id);
        if kept.complete {
            if repeatable {
                return Ok(AcceptOutcome::Idempotent);
            }
            return Err(self.step_out_of_order());
        }
        let in_group = self.state.next_step_group().iter().any(|s| s.name == step_id);
        if !in_group && !repeatable {
            return Err(self.step_out_of_order());
        }
        self.state
            .find_kept_step_mut(step_id)
            .expect("looked up above")
            .mark_complete(decision);
        Ok(AcceptOutcome::Marked)
    }

    fn step_out_of_order(&self) -> EngineError {
        EngineError::StepOutOfOrder {
            next_steps: self
                .state
                .next_step_group()
                .iter()
                .map(|s| s.name.clone())
                .collect(),
        }
    }

    fn dispatch(&mut self, event: Event, callback: &mut dyn Callback) -> Result<()> {
        let transition = self.resolve(&event)?;
        self.apply_transition(event, transition, callback)
    }

    /// Walk from the current state up through ancestors for an exact handler match.
    fn resolve(&self, event: &Event) -> Result<Transition> {
        let mut current: &str = &self.state.name;
        loop {
            let state = self
                .chart
                .state(current)
                .ok_or_else(|| EngineError::NoState { target: current.to_string() })?;
            if let Some(t) = state.transitions.get(event) {
                return Ok(t.clone());
            }
            match parent_in_chart(&self.chart, current) {
                Some(parent) => current = parent,
                None => {
                    return Err(EngineError::NoTransition {
                        from: self.state.name.clone(),
                        event: event.to_string(),
                    })
                }
            }
        }
    }

    fn apply_transition(
        &mut self,
        event: Event,
        transition: Transition,
        callback: &mut dyn Callback,
    ) -> Result<()> {
        match &transition.target {
            Target::One(name) if *name == self.state.name && !transition.reset => {
                for action in transition.actions.clone() {
                    self.queue(action);
                }
                Ok(())
            }
            Target::One(name) => self.use_target(name.clone(), &transition, callback),
            Target::List(names) => {
                for name in names {
                    match self.use_target(name.clone(), &transition, callback) {
                        Ok(()) => return Ok(()),
                        Err(EngineError::GuardRejected { .. }) | Err(EngineError::NoState { .. }) => continue,
                        Err(other) => return Err(other),
                    }
                }
                Err(EngineError::NoTransition {
                    from: self.state.name.clone(),
                    event: event.to_string(),
                })
            }
        }
    }

    fn use_target(&mut self, target: String, transition: &Transition, callback: &mut dyn Callback) -> Result<()> {
        if !self.chart.states.contains_key(&target) {
            return Err(EngineError::NoState { target });
        }
        if let Err(reason) = callback.guard(&self.state.name, &target, &self.context) {
            return Err(EngineError::GuardRejected { reason });
        }
        self.transitions_log.insert(0, transition.clone());
        self.enter_target(&target, transition.actions.clone(), true, callback)
    }

    /// Entry point for one "move": queues exit actions (if there's a previous state) and
    /// transition actions, then recursively enters `target` and its `initial_child` chain.
    fn enter_target(
        &mut self,
        target: &str,
        transition_actions: Vec<String>,
        has_previous: bool,
        callback: &mut dyn Callback,
    ) -> Result<()> {
        if has_previous {
            let previous_name = self.state.name.clone();
            self.history.insert(0, self.state.clone());

            let lca = if previous_name == target {
                parent_in_chart(&self.chart, target).map(str::to_string)
            } else {
                Chart::lowest_common_ancestor(&previous_name, target)
            };
            for state_name in ancestor_chain_above(&previous_name, lca.as_deref()) {
                if let Some(s) = self.chart.state(&state_name) {
                    for action in s.exit_actions.clone() {
                        self.queue(action);
                    }
                }
            }
        }
        for action in transition_actions {
            self.queue(action);
        }
        self.enter_recursive(target, callback)
    }

    fn enter_recursive(&mut self, target: &str, callback: &mut dyn Callback) -> Result<()> {
        let mut fresh = self
            .chart
            .state(target)
            .cloned()
            .ok_or_else(|| EngineError::NoState { target: target.to_string() })?;
        let (kept, ignored) = fresh
            .steps
            .drain(..)
            .partition(|step| callback.use_step(&step.name, &self.context));
        fresh.steps = kept;
        fresh.ignored_steps = ignored;
        self.state = fresh;

        for action in self.state.entry_actions.clone() {
            self.queue(action);
        }

        match self.state.initial_child.clone() {
            Some(child) => self.enter_recursive(&child, callback),
            None => {
                if self.state.kind == StateKind::Final {
                    self.raise_synthetic(Event::Final, callback)?;
                }
                self.raise_synthetic(Event::Null, callback)?;
                if self.state.kind == StateKind::Atomic && self.state.steps.is_empty() {
                    self.raise_synthetic(Event::NoSteps, callback)?;
                }
                Ok(())
            }
        }
    }

    fn raise_synthetic(&mut self, event: Event, callback: &mut dyn Callback) -> Result<()> {
        match self.dispatch(event, callback) {
            Ok(()) => Ok(()),
            Err(EngineError::NoTransition { .. }) => Ok(()),
            Err(other) => Err(other),
        }
    }

    /// Drain the action queue in FIFO order against `callback`. Stops at the first
    /// error, leaving the remaining (unexecuted) actions queued for a future call.
    #[instrument(skip(self, callback), fields(state = %self.state.name, count = self.actions.len()))]
    pub fn execute_actions(&mut self, callback: &mut dyn Callback) -> (HashMap<String, Value>, Option<EngineError>) {
        let ordered: Vec<String> = self.actions.drain(..).rev().collect();
        let mut results = HashMap::new();
        for (i, tag) in ordered.iter().enumerate() {
            match callback.action(tag, &self.context) {
                Ok(ActionOutcome::Ok) => {
                    debug!(action = %tag, "action ok");
                }
                Ok(ActionOutcome::OkValue(value)) => {
                    results.insert(tag.clone(), value);
                }
                Ok(ActionOutcome::UpdatedContext(value)) => {
                    self.context = value;
                }
                Ok(ActionOutcome::UpdatedKey(key, value)) => {
                    if let Value::Object(map) = &mut self.context {
                        map.insert(key, value);
                    }
                }
                Err(err) => {
                    warn!(action = %tag, error = %err, "action drain aborted");
                    let mut remaining: Vec<String> = ordered[i..].to_vec();
                    remaining.reverse();
                    self.actions = remaining;
                    return (results, Some(err));
                }
            }
        }
        (results, None)
    }
}

fn parent_in_chart<'a>(chart: &Chart, name: &'a str) -> Option<&'a str> {
    Chart::parent_name(name).filter(|p| chart.state(p).is_some())
}

fn ancestor_chain_above(name: &str, lca: Option<&str>) -> Vec<String> {
    let mut chain = Vec::new();
    let mut cur = Some(name.to_string());
    loop {
        match cur {
            Some(c) if Some(c.as_str()) != lca => {
                chain.push(c.clone());
                cur = Chart::parent_name(&c).map(str::to_string);
            }
            _ => break,
        }
    }
    chain
}
