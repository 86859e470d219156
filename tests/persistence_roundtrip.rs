//! Integration coverage for the dump → persist → reload round trip (invariant 4) and
//! for query predicates evaluated against a live execution's dump.

use std::sync::Arc;

use serde_json::{json, Value};
use workchart::builder::{ChartBuilder, OnOpts};
use workchart::callback::{ActionOutcome, Callback};
use workchart::dump::dump;
use workchart::error::Result;
use workchart::execution::Execution;
use workchart::persistence::memory::InMemoryWorkflowStore;
use workchart::persistence::WorkflowStore;
use workchart::query::Predicate;
use workchart::transition::Event;

struct NoopCallback;
impl Callback for NoopCallback {
    fn action(&mut self, _tag: &str, _ctx: &Value) -> Result<ActionOutcome> {
        Ok(ActionOutcome::Ok)
    }
}

fn sale_chart() -> Arc<workchart::Chart> {
    let mut builder = ChartBuilder::new("sale");
    builder.subject("sale_id", "Sale");
    builder.initial_state("pending");
    builder.state("pending", |s| {
        s.step("confirm");
        s.on_completed("confirm", "sent", OnOpts::default());
    });
    builder.state("sent", |s| {
        s.step("close");
        s.on_completed("close", "closed", OnOpts::default());
    });
    builder.state("closed", |s| {
        s.final_state();
    });
    Arc::new(builder.build().unwrap())
}

#[test]
fn dump_persist_load_round_trip_preserves_state_and_steps() {
    let chart = sale_chart();
    let mut cb = NoopCallback;
    let mut exec = Execution::new(chart.clone(), json!({"sale_id": "s-42"}), &mut cb).unwrap();

    let store = InMemoryWorkflowStore::new();
    let created = store.create(&dump(&exec)).unwrap();
    assert_eq!(created.lock_version, 0);
    assert_eq!(created.state, "pending");

    exec.complete("confirm", &mut cb).unwrap();
    assert_eq!(exec.state.name, "sent");

    let updated = store
        .update(&created, &dump(&exec), json!({"by": "alice"}))
        .unwrap();
    assert_eq!(updated.lock_version, 1);
    assert_eq!(updated.state, "sent");

    let confirm = updated.steps.iter().find(|s| s.name == "confirm").unwrap();
    assert!(confirm.is_complete);
    assert!(confirm.completed_at.is_some());
    assert_eq!(confirm.completed_metadata, Some(json!({"by": "alice"})));

    let reloaded = store.load(created.id).unwrap().unwrap();
    assert_eq!(reloaded, updated);

    let close = reloaded.steps.iter().find(|s| s.name == "close").unwrap();
    assert!(!close.is_complete);
    assert!(close.completed_at.is_none());
}

#[test]
fn query_predicates_match_a_live_executions_dump() {
    let chart = sale_chart();
    let mut cb = NoopCallback;
    let mut exec = Execution::new(chart, json!({"sale_id": "s-7"}), &mut cb).unwrap();

    let before = dump(&exec);
    assert!(Predicate::state_equals("pending").matches(&before));
    assert!(!Predicate::step_complete("confirm").matches(&before));

    exec.complete("confirm", &mut cb).unwrap();
    exec.complete("close", &mut cb).unwrap();
    assert_eq!(exec.state.name, "closed");

    let after = dump(&exec);
    assert!(Predicate::state_has_prefix("sent").matches(&after) == false);
    assert!(Predicate::state_in(vec!["closed", "cancelled"]).matches(&after));
    assert!(Predicate::step_complete("confirm").matches(&after));
    assert!(Predicate::step_complete("close").matches(&after));
    assert!(after.complete);
}
