//! Programmatic chart construction.
//!
//! [`ChartBuilder`] is the entry point: a fluent, validating constructor that mirrors the
//! teacher's `StateGraph` builder (`add_node`/`add_edge`/`compile`) but shaped for a
//! hierarchy instead of a flat node graph. Nested [`StateBuilder`]s describe one state
//! each; calling [`StateBuilder::state`] recursively opens a child. Declaration order
//! inside a state body drives step ordering: sequential `step` calls get strictly
//! increasing `order`s, a `parallel` block gives every step inside it the same order.
//!
//! Targets passed to `on`/`on_completed`/etc. are *relative* to the state they're
//! declared on and are resolved to absolute dotted paths while the body runs; see
//! [`TargetAtom`] for the three resolution rules and [`ChartBuilder::build`] for the
//! validation pass that runs once the whole tree has been declared.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use crate::chart::{Chart, SubjectBinding};
use crate::error::{EngineError, Result};
use crate::state::{State, StateKind};
use crate::step::Step;
use crate::transition::{Event, Target, Transition};

/// One atom of a (possibly multi-candidate) transition target, as written by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetAtom {
    /// `:_`, the current state (a self-loop).
    Current,
    /// A plain name, sibling of the current state (last path segment replaced).
    Sibling(String),
    /// `(UP, x)`, sibling of the current state's parent.
    ParentSibling(String),
}

impl TargetAtom {
    /// Construct a [`TargetAtom::ParentSibling`], the `(UP, x)` form.
    pub fn up(name: impl Into<String>) -> Self {
        TargetAtom::ParentSibling(name.into())
    }

    fn resolve(&self, current: &str) -> String {
        match self {
            TargetAtom::Current => current.to_string(),
            TargetAtom::Sibling(name) => match current.rsplit_once('.') {
                Some((prefix, _)) => format!("{prefix}.{name}"),
                None => name.clone(),
            },
            TargetAtom::ParentSibling(name) => {
                let segments: Vec<&str> = current.split('.').collect();
                if segments.len() <= 2 {
                    name.clone()
                } else {
                    let prefix = segments[..segments.len() - 2].join(".");
                    format!("{prefix}.{name}")
                }
            }
        }
    }
}

impl From<&str> for TargetAtom {
    fn from(s: &str) -> Self {
        if s == "_" {
            TargetAtom::Current
        } else {
            TargetAtom::Sibling(s.to_string())
        }
    }
}

/// A transition target as written by the caller: one atom, or an ordered fallthrough list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetSpec {
    /// A single candidate.
    Single(TargetAtom),
    /// An ordered list of candidates, tried in order at dispatch time.
    List(Vec<TargetAtom>),
}

impl From<TargetAtom> for TargetSpec {
    fn from(atom: TargetAtom) -> Self {
        TargetSpec::Single(atom)
    }
}

impl From<&str> for TargetSpec {
    fn from(s: &str) -> Self {
        TargetSpec::Single(TargetAtom::from(s))
    }
}

impl From<Vec<TargetAtom>> for TargetSpec {
    fn from(atoms: Vec<TargetAtom>) -> Self {
        TargetSpec::List(atoms)
    }
}

/// Options accepted by `on`/`on_completed`/`on_decision`/`on_no_steps`/`on_final`.
#[derive(Debug, Clone)]
pub struct OnOpts {
    /// Whether re-targeting the current state fully re-enters it. Defaults to `true`.
    pub reset: bool,
    /// Action tags queued when the transition is taken.
    pub actions: Vec<String>,
}

impl Default for OnOpts {
    fn default() -> Self {
        Self {
            reset: true,
            actions: Vec::new(),
        }
    }
}

impl OnOpts {
    /// Start from the defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter for `reset`.
    pub fn reset(mut self, reset: bool) -> Self {
        self.reset = reset;
        self
    }

    /// Builder-style setter for `actions`.
    pub fn actions<S: Into<String>>(mut self, actions: Vec<S>) -> Self {
        self.actions = actions.into_iter().map(Into::into).collect();
        self
    }
}

/// Options accepted by `step`.
#[derive(Debug, Clone, Default)]
pub struct StepOpts {
    /// Optional role tag for the step.
    pub participant: Option<String>,
    /// Shorthand for also calling `repeatable(id)`.
    pub repeatable: bool,
}

impl StepOpts {
    /// Start from the defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter for `participant`.
    pub fn participant(mut self, participant: impl Into<String>) -> Self {
        self.participant = Some(participant.into());
        self
    }

    /// Builder-style setter for `repeatable`.
    pub fn repeatable(mut self, repeatable: bool) -> Self {
        self.repeatable = repeatable;
        self
    }
}

type VirtualTemplate = Rc<dyn Fn(&mut StateBuilder)>;
type SharedStates = Rc<RefCell<HashMap<String, State>>>;
type SharedVirtuals = Rc<RefCell<HashMap<String, VirtualTemplate>>>;
type SharedErrors = Rc<RefCell<Vec<String>>>;

/// Builds one [`State`], including any nested child states.
///
/// Obtained via [`ChartBuilder::state`] or [`StateBuilder::state`]; never constructed
/// directly. Every method borrows `&mut self` and returns `&mut Self` so calls chain.
pub struct StateBuilder {
    path: String,
    kind: StateKind,
    initial_child: Option<String>,
    steps: Vec<Step>,
    next_order: u32,
    repeatable: HashSet<String>,
    transitions: HashMap<Event, Transition>,
    entry_actions: Vec<String>,
    exit_actions: Vec<String>,
    states: SharedStates,
    virtuals: SharedVirtuals,
    errors: SharedErrors,
}

impl StateBuilder {
    fn new(path: String, states: SharedStates, virtuals: SharedVirtuals, errors: SharedErrors) -> Self {
        Self {
            path,
            kind: StateKind::Atomic,
            initial_child: None,
            steps: Vec::new(),
            next_order: 0,
            repeatable: HashSet::new(),
            transitions: HashMap::new(),
            entry_actions: Vec::new(),
            exit_actions: Vec::new(),
            states,
            virtuals,
            errors,
        }
    }

    /// Mark this state compound, with `child_id` (relative to this state) as the
    /// descendant entered by default.
    pub fn initial_state(&mut self, child_id: impl Into<String>) -> &mut Self {
        self.kind = StateKind::Compound;
        self.initial_child = Some(format!("{}.{}", self.path, child_id.into()));
        self
    }

    /// Mark this state final.
    pub fn final_state(&mut self) -> &mut Self {
        self.kind = StateKind::Final;
        self
    }

    /// Declare a sequential step, receiving the next monotonically increasing order.
    pub fn step(&mut self, id: impl Into<String>) -> &mut Self {
        self.step_with(id, StepOpts::default())
    }

    /// Declare a sequential step with options (participant, repeatable shorthand).
    pub fn step_with(&mut self, id: impl Into<String>, opts: StepOpts) -> &mut Self {
        self.next_order += 1;
        let order = self.next_order;
        self.push_step(id.into(), order, opts);
        self
    }

    fn push_step(&mut self, name: String, order: u32, opts: StepOpts) {
        if self.steps.iter().any(|s| s.name == name) {
            self.errors
                .borrow_mut()
                .push(format!("duplicate step '{name}' in state '{}'", self.path));
            return;
        }
        if opts.repeatable {
            self.repeatable.insert(name.clone());
        }
        let mut step = Step::new(name, order);
        if let Some(p) = opts.participant {
            step = step.with_participant(p);
        }
        self.steps.push(step);
    }

    /// Declare a block of parallel steps: every step inside shares one order number.
    pub fn parallel(&mut self, f: impl FnOnce(&mut ParallelBuilder)) -> &mut Self {
        self.next_order += 1;
        let order = self.next_order;
        let mut pb = ParallelBuilder { items: Vec::new() };
        f(&mut pb);
        for (name, opts) in pb.items {
            self.push_step(name, order, opts);
        }
        self
    }

    /// Add `id` to this state's repeatable-step set.
    pub fn repeatable(&mut self, id: impl Into<String>) -> &mut Self {
        self.repeatable.insert(id.into());
        self
    }

    /// Queue `action` on entry to this state.
    pub fn on_entry(&mut self, action: impl Into<String>) -> &mut Self {
        self.entry_actions.push(action.into());
        self
    }

    /// Queue `action` on exit from this state.
    pub fn on_exit(&mut self, action: impl Into<String>) -> &mut Self {
        self.exit_actions.push(action.into());
        self
    }

    /// Register a transition handler for `event`.
    pub fn on(&mut self, event: Event, target: impl Into<TargetSpec>, opts: OnOpts) -> &mut Self {
        let target = self.resolve_target(target.into());
        let transition = match target {
            Target::One(name) => Transition::new(event.clone(), name),
            Target::List(names) => Transition::with_fallthrough(event.clone(), names),
        }
        .reset(opts.reset)
        .with_actions(opts.actions);
        self.transitions.insert(event, transition);
        self
    }

    /// Sugar for `on(Event::Completed(step), target, opts)`.
    pub fn on_completed(
        &mut self,
        step: impl Into<String>,
        target: impl Into<TargetSpec>,
        opts: OnOpts,
    ) -> &mut Self {
        self.on(Event::Completed(step.into()), target, opts)
    }

    /// Sugar for `on(Event::Decision(step, choice), target, opts)`.
    pub fn on_decision(
        &mut self,
        step: impl Into<String>,
        choice: impl Into<String>,
        target: impl Into<TargetSpec>,
        opts: OnOpts,
    ) -> &mut Self {
        self.on(Event::Decision(step.into(), choice.into()), target, opts)
    }

    /// Sugar for `on(Event::NoSteps, target, opts)`.
    pub fn on_no_steps(&mut self, target: impl Into<TargetSpec>, opts: OnOpts) -> &mut Self {
        self.on(Event::NoSteps, target, opts)
    }

    /// Sugar for `on(Event::Final, target, opts)`.
    pub fn on_final(&mut self, target: impl Into<TargetSpec>, opts: OnOpts) -> &mut Self {
        self.on(Event::Final, target, opts)
    }

    fn resolve_target(&self, spec: TargetSpec) -> Target {
        match spec {
            TargetSpec::Single(atom) => Target::One(atom.resolve(&self.path)),
            TargetSpec::List(atoms) => {
                Target::List(atoms.iter().map(|a| a.resolve(&self.path)).collect())
            }
        }
    }

    /// Declare a nested child state. The child's absolute path is `"{self.path}.{id}"`.
    pub fn state(&mut self, id: impl Into<String>, f: impl FnOnce(&mut StateBuilder)) -> &mut Self {
        let child_path = format!("{}.{}", self.path, id.into());
        let mut child = StateBuilder::new(
            child_path,
            self.states.clone(),
            self.virtuals.clone(),
            self.errors.clone(),
        );
        f(&mut child);
        child.finish();
        self
    }

    /// Inject a previously registered `virtual_state` template into this state body.
    pub fn using(&mut self, name: &str) -> &mut Self {
        let template = self.virtuals.borrow().get(name).cloned();
        match template {
            Some(template) => template(self),
            None => self
                .errors
                .borrow_mut()
                .push(format!("unknown virtual template '{name}'")),
        }
        self
    }

    fn finish(mut self) {
        if self.initial_child.is_some() && !self.steps.is_empty() {
            self.errors.borrow_mut().push(format!(
                "compound state '{}' must not declare steps",
                self.path
            ));
        }
        let state = State {
            name: self.path.clone(),
            kind: self.kind,
            initial_child: self.initial_child,
            steps: self.steps,
            ignored_steps: Vec::new(),
            repeatable_steps: self.repeatable,
            transitions: self.transitions,
            entry_actions: self.entry_actions,
            exit_actions: self.exit_actions,
        };
        self.states.borrow_mut().insert(self.path.clone(), state);
    }
}

/// A scoped helper passed to the closure given to [`StateBuilder::parallel`].
///
/// Every step declared through it receives the same `order` once the block closes.
pub struct ParallelBuilder {
    items: Vec<(String, StepOpts)>,
}

impl ParallelBuilder {
    /// Declare one of the parallel steps.
    pub fn step(&mut self, id: impl Into<String>) -> &mut Self {
        self.step_with(id, StepOpts::default())
    }

    /// Declare one of the parallel steps with options.
    pub fn step_with(&mut self, id: impl Into<String>, opts: StepOpts) -> &mut Self {
        self.items.push((id.into(), opts));
        self
    }
}

/// Fluent, validating constructor for a [`Chart`].
pub struct ChartBuilder {
    name: String,
    subject_binding: Option<SubjectBinding>,
    participants: Vec<String>,
    initial_state: Option<String>,
    states: SharedStates,
    virtuals: SharedVirtuals,
    errors: SharedErrors,
}

impl ChartBuilder {
    /// Start building a chart named `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            subject_binding: None,
            participants: Vec::new(),
            initial_state: None,
            states: Rc::new(RefCell::new(HashMap::new())),
            virtuals: Rc::new(RefCell::new(HashMap::new())),
            errors: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// Bind this chart to a host entity, e.g. `subject("sale_id", "Sale")`.
    pub fn subject(&mut self, key: impl Into<String>, type_name: impl Into<String>) -> &mut Self {
        self.subject_binding = Some(SubjectBinding {
            key: key.into(),
            type_name: type_name.into(),
        });
        self
    }

    /// Declare a known participant role tag.
    pub fn participant(&mut self, tag: impl Into<String>) -> &mut Self {
        self.participants.push(tag.into());
        self
    }

    /// Set the chart's top-level initial state.
    pub fn initial_state(&mut self, id: impl Into<String>) -> &mut Self {
        self.initial_state = Some(id.into());
        self
    }

    /// Declare a top-level state.
    pub fn state(&mut self, id: impl Into<String>, f: impl FnOnce(&mut StateBuilder)) -> &mut Self {
        let mut child = StateBuilder::new(
            id.into(),
            self.states.clone(),
            self.virtuals.clone(),
            self.errors.clone(),
        );
        f(&mut child);
        child.finish();
        self
    }

    /// Register a reusable body template invoked later via [`StateBuilder::using`].
    pub fn virtual_state(&mut self, name: impl Into<String>, f: impl Fn(&mut StateBuilder) + 'static) -> &mut Self {
        self.virtuals.borrow_mut().insert(name.into(), Rc::new(f));
        self
    }

    /// Validate and compile the declared states into an immutable [`Chart`].
    pub fn build(&self) -> Result<Chart> {
        let states = self.states.borrow().clone();
        let mut errors = self.errors.borrow().clone();

        let initial_state = match &self.initial_state {
            Some(id) => id.clone(),
            None => {
                return Err(EngineError::invalid_chart("initial_state was never set"));
            }
        };

        if !states.contains_key(&initial_state) {
            errors.push(format!("initial_state '{initial_state}' does not exist"));
        }

        for state in states.values() {
            if let Some(child) = &state.initial_child {
                let is_descendant =
                    states.contains_key(child) && child.starts_with(&format!("{}.", state.name));
                if !is_descendant {
                    errors.push(format!(
                        "state '{}' initial_state '{}' is not a descendant",
                        state.name, child
                    ));
                }
            }
            for transition in state.transitions.values() {
                for target in transition.target.candidates() {
                    if !states.contains_key(target) {
                        errors.push(format!(
                            "state '{}' targets unknown state '{}'",
                            state.name, target
                        ));
                    }
                }
            }
        }

        if !errors.is_empty() {
            return Err(EngineError::invalid_chart(errors.join("; ")));
        }

        Ok(Chart {
            name: self.name.clone(),
            subject_binding: self.subject_binding.clone(),
            initial_state,
            states,
            participants: self.participants.clone(),
        })
    }
}
