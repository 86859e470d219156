//! Integration-level coverage of `ChartBuilder::build`'s validation failures.

use workchart::builder::{ChartBuilder, OnOpts};
use workchart::error::EngineError;
use workchart::transition::Event;

#[test]
fn rejects_missing_initial_state() {
    let builder = ChartBuilder::new("broken");
    let err = builder.build().unwrap_err();
    assert!(matches!(err, EngineError::InvalidChart { .. }));
}

#[test]
fn rejects_target_that_does_not_exist() {
    let mut builder = ChartBuilder::new("broken");
    builder.initial_state("a");
    builder.state("a", |s| {
        s.on(Event::Named("go".into()), "nowhere", OnOpts::default());
    });
    let err = builder.build().unwrap_err();
    assert!(matches!(err, EngineError::InvalidChart { .. }));
}

#[test]
fn rejects_initial_child_outside_its_parent() {
    let mut builder = ChartBuilder::new("broken");
    builder.initial_state("a");
    builder.state("a", |s| {
        s.initial_state("b");
        s.state("b", |_| {});
    });
    builder.state("b", |_| {});
    let err = builder.build().unwrap_err();
    assert!(matches!(err, EngineError::InvalidChart { .. }));
}

#[test]
fn rejects_duplicate_steps_across_a_parallel_block_and_a_sequential_step() {
    let mut builder = ChartBuilder::new("broken");
    builder.initial_state("a");
    builder.state("a", |s| {
        s.parallel(|p| {
            p.step("close");
        });
        s.step("close");
    });
    let err = builder.build().unwrap_err();
    assert!(matches!(err, EngineError::InvalidChart { .. }));
}

#[test]
fn accepts_a_well_formed_chart() {
    let mut builder = ChartBuilder::new("ok");
    builder.initial_state("a");
    builder.state("a", |s| {
        s.step("close");
        s.on_completed("close", "b", OnOpts::default());
    });
    builder.state("b", |s| {
        s.final_state();
    });
    assert!(builder.build().is_ok());
}
