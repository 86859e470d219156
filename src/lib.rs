//! # workchart: hierarchical-statechart workflow engine
//!
//! Long-lived business processes attached to domain entities ("subjects") modeled as
//! compiled statecharts. A [`builder::ChartBuilder`] declares states, steps, and
//! transitions and compiles them into an immutable [`chart::Chart`]; an
//! [`execution::Execution`] interprets events against it, queueing actions that run
//! through a host-supplied [`callback::Callback`].
//!
//! ## Core concepts
//!
//! ### 1. Chart, the compiled statechart
//!
//! A [`chart::Chart`] is a flat map of dotted-path [`state::State`]s. States nest by
//! path (`"working.waiting"` is a child of `"working"`); a compound state names an
//! `initial_child` descendant entered by default. Leaves carry an ordered checklist of
//! [`step::Step`]s.
//!
//! ### 2. Execution, the interpreter
//!
//! [`execution::Execution`] is mutable and single-threaded: `transition`, `complete`,
//! and `decision` resolve events against the current state (bubbling to parents on a
//! miss), update `state`/`history`, and queue action tags. Nothing suspends mid-call.
//!
//! ### 3. Persistence and query ports
//!
//! [`dump::dump`] serializes an execution to a wire-friendly snapshot.
//! [`persistence::WorkflowStore`] is the storage adapter contract a host implements
//! (an in-memory reference lives at [`persistence::memory::InMemoryWorkflowStore`]).
//! [`query::Predicate`] lets adapters filter persisted workflows by state or step
//! completion.
//!
//! ## Quick start
//!
//! ```
//! use serde_json::Value;
//! use std::sync::Arc;
//! use workchart::builder::{ChartBuilder, OnOpts};
//! use workchart::callback::{ActionOutcome, Callback};
//! use workchart::error::Result;
//! use workchart::execution::Execution;
//! use workchart::transition::Event;
//!
//! struct Host;
//! impl Callback for Host {
//!     fn action(&mut self, _tag: &str, _ctx: &Value) -> Result<ActionOutcome> {
//!         Ok(ActionOutcome::Ok)
//!     }
//! }
//!
//! let mut builder = ChartBuilder::new("sale");
//! builder.initial_state("pending");
//! builder.state("pending", |s| {
//!     s.on(Event::Named("send".into()), "sent", OnOpts::default());
//! });
//! builder.state("sent", |s| {
//!     s.step("close");
//!     s.on_completed("close", "closed", OnOpts::default());
//! });
//! builder.state("closed", |s| {
//!     s.final_state();
//! });
//! let chart = Arc::new(builder.build().unwrap());
//!
//! let mut host = Host;
//! let mut exec = Execution::new(chart, Value::Null, &mut host).unwrap();
//! exec.transition(Event::Named("send".into()), &mut host).unwrap();
//! exec.complete("close", &mut host).unwrap();
//! assert_eq!(exec.state.name, "closed");
//! ```

pub mod builder;
pub mod callback;
pub mod chart;
pub mod dump;
pub mod error;
pub mod execution;
pub mod persistence;
pub mod query;
pub mod state;
pub mod step;
pub mod transition;

pub use chart::Chart;
pub use error::{EngineError, Result};
pub use execution::Execution;
