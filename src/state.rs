//! `State`: a single node in a chart's hierarchy.

use std::collections::{HashMap, HashSet};

use crate::step::Step;
use crate::transition::{Event, Transition};

/// What kind of node a [`State`] is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateKind {
    /// A leaf with an ordered checklist of steps.
    Atomic,
    /// A branch node with an `initial_child` descendant.
    Compound,
    /// A terminal leaf. Raises the synthetic `Final` event on entry and accepts no
    /// outgoing transitions besides whatever handles that event.
    Final,
}

/// Which action list (`entry` or `exit`) a lookup addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionSlot {
    /// Actions queued when entering the state.
    Entry,
    /// Actions queued when leaving the state.
    Exit,
}

/// A node in a chart's hierarchy, keyed by its dotted path.
///
/// The same `State` type serves two roles: as a pristine, immutable template living in
/// [`crate::chart::Chart::states`], and as a live or historical snapshot living on
/// [`crate::execution::Execution`] (`state` and each entry of `history`). The two differ
/// only in how far `steps`/`ignored_steps` have been filtered and completed: the shape
/// is identical, which is what lets [`crate::execution::Execution::enter`] produce a
/// snapshot by cloning the chart's template and mutating the clone.
#[derive(Debug, Clone, PartialEq)]
pub struct State {
    /// Dot-separated path, unique within its chart.
    pub name: String,
    /// Atomic, compound, or final.
    pub kind: StateKind,
    /// For compound states, the absolute path of the child entered by default.
    pub initial_child: Option<String>,
    /// Steps kept after `use_step?` filtering (or all of them, on a pristine template).
    pub steps: Vec<Step>,
    /// Steps hidden by `use_step?` during entry. Always empty on a pristine template.
    pub ignored_steps: Vec<Step>,
    /// Names of steps that may be idempotently re-completed once already complete.
    pub repeatable_steps: HashSet<String>,
    /// Transition handlers, keyed by the exact event they respond to.
    pub transitions: HashMap<Event, Transition>,
    /// Action tags queued on entry.
    pub entry_actions: Vec<String>,
    /// Action tags queued on exit.
    pub exit_actions: Vec<String>,
}

impl State {
    /// Construct an empty atomic state with no steps or transitions.
    pub fn atomic(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: StateKind::Atomic,
            initial_child: None,
            steps: Vec::new(),
            ignored_steps: Vec::new(),
            repeatable_steps: HashSet::new(),
            transitions: HashMap::new(),
            entry_actions: Vec::new(),
            exit_actions: Vec::new(),
        }
    }

    /// Construct a compound state with the given initial child path.
    pub fn compound(name: impl Into<String>, initial_child: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: StateKind::Compound,
            initial_child: Some(initial_child.into()),
            steps: Vec::new(),
            ignored_steps: Vec::new(),
            repeatable_steps: HashSet::new(),
            transitions: HashMap::new(),
            entry_actions: Vec::new(),
            exit_actions: Vec::new(),
        }
    }

    /// Construct a final state.
    pub fn final_state(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: StateKind::Final,
            initial_child: None,
            steps: Vec::new(),
            ignored_steps: Vec::new(),
            repeatable_steps: HashSet::new(),
            transitions: HashMap::new(),
            entry_actions: Vec::new(),
            exit_actions: Vec::new(),
        }
    }

    /// Action tags for the given slot.
    pub fn actions(&self, slot: ActionSlot) -> &[String] {
        match slot {
            ActionSlot::Entry => &self.entry_actions,
            ActionSlot::Exit => &self.exit_actions,
        }
    }

    /// All steps the state was declared with, in chart order: kept steps followed by
    /// ignored ones, re-sorted by `order`. Used by [`crate::dump`] and by invariant
    /// checks that the filtered partition is a permutation of the original.
    pub fn all_steps(&self) -> Vec<&Step> {
        let mut all: Vec<&Step> = self.steps.iter().chain(self.ignored_steps.iter()).collect();
        all.sort_by_key(|s| s.order);
        all
    }

    /// The lowest-order group of incomplete steps among the kept (non-ignored) steps,
    /// the "next step set" from the completion algorithm.
    pub fn next_step_group(&self) -> Vec<&Step> {
        let lowest = self
            .steps
            .iter()
            .filter(|s| !s.complete)
            .map(|s| s.order)
            .min();
        match lowest {
            Some(order) => self
                .steps
                .iter()
                .filter(|s| !s.complete && s.order == order)
                .collect(),
            None => Vec::new(),
        }
    }

    /// Find a step by name among kept or ignored steps.
    pub fn find_step(&self, name: &str) -> Option<&Step> {
        self.steps
            .iter()
            .chain(self.ignored_steps.iter())
            .find(|s| s.name == name)
    }

    /// Find a mutable step by name among the kept steps only (ignored steps are never
    /// completed (they were excluded from the checklist by `use_step?`).
    pub fn find_kept_step_mut(&mut self, name: &str) -> Option<&mut Step> {
        self.steps.iter_mut().find(|s| s.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_state() -> State {
        let mut s = State::atomic("not_done");
        s.steps.push(Step::new("do_one_thing", 1));
        s.steps.push(Step::new("do_another_thing", 1));
        s.steps.push(Step::new("do_last_thing", 2));
        s
    }

    #[test]
    fn next_step_group_picks_lowest_order_incomplete() {
        let state = sample_state();
        let group: Vec<&str> = state.next_step_group().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(group, vec!["do_one_thing", "do_another_thing"]);
    }

    #[test]
    fn next_step_group_advances_once_parallel_group_completes() {
        let mut state = sample_state();
        state.find_kept_step_mut("do_one_thing").unwrap().mark_complete(None);
        state.find_kept_step_mut("do_another_thing").unwrap().mark_complete(None);
        let group: Vec<&str> = state.next_step_group().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(group, vec!["do_last_thing"]);
    }

    #[test]
    fn next_step_group_empty_when_all_complete() {
        let mut state = sample_state();
        for step in state.steps.iter_mut() {
            step.mark_complete(None);
        }
        assert!(state.next_step_group().is_empty());
    }

    #[test]
    fn all_steps_recombines_kept_and_ignored_in_order() {
        let mut state = sample_state();
        let ignored = state.steps.remove(0);
        state.ignored_steps.push(ignored);
        let names: Vec<&str> = state.all_steps().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["do_one_thing", "do_another_thing", "do_last_thing"]);
    }
}
