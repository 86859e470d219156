//! Property tests for the engine's state-membership and step-permutation invariants
//! (spec §8, invariants 1 and 3), run over random action sequences against a fixed chart.

use std::sync::Arc;

use proptest::prelude::*;
use serde_json::Value;
use workchart::builder::{ChartBuilder, OnOpts};
use workchart::callback::{ActionOutcome, Callback};
use workchart::error::Result;
use workchart::execution::Execution;
use workchart::transition::Event;

struct NoopCallback;
impl Callback for NoopCallback {
    fn action(&mut self, _tag: &str, _ctx: &Value) -> Result<ActionOutcome> {
        Ok(ActionOutcome::Ok)
    }
}

fn sale_chart() -> Arc<workchart::Chart> {
    let mut builder = ChartBuilder::new("sale");
    builder.initial_state("pending");
    builder.state("pending", |s| {
        s.on(Event::Named("send".into()), "sent", OnOpts::default());
    });
    builder.state("sent", |s| {
        s.step("confirm");
        s.step("close");
        s.on_completed("close", "closed", OnOpts::default());
    });
    builder.state("closed", |s| {
        s.final_state();
    });
    Arc::new(builder.build().unwrap())
}

#[derive(Debug, Clone, Copy)]
enum Op {
    Send,
    Confirm,
    Close,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![Just(Op::Send), Just(Op::Confirm), Just(Op::Close)]
}

proptest! {
    /// After any sequence of actions (errors ignored), the current state's name is
    /// always a key in the chart, and its kept/ignored steps are a permutation of the
    /// chart template's declared steps for that same state.
    #[test]
    fn current_state_stays_in_chart_and_steps_stay_a_permutation(ops in proptest::collection::vec(op_strategy(), 0..20)) {
        let chart = sale_chart();
        let mut cb = NoopCallback;
        let mut exec = Execution::new(chart.clone(), Value::Null, &mut cb).unwrap();

        for op in ops {
            let _ = match op {
                Op::Send => exec.transition(Event::Named("send".into()), &mut cb),
                Op::Confirm => exec.complete("confirm", &mut cb),
                Op::Close => exec.complete("close", &mut cb),
            };

            prop_assert!(chart.state(&exec.state.name).is_some());

            let template = chart.state(&exec.state.name).unwrap();
            let mut live_names: Vec<&str> = exec.state.all_steps().iter().map(|s| s.name.as_str()).collect();
            let mut template_names: Vec<&str> = template.steps.iter().map(|s| s.name.as_str()).collect();
            live_names.sort();
            template_names.sort();
            prop_assert_eq!(live_names, template_names);
        }
    }
}
