//! Serialization of execution snapshots for persistence and display.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::execution::Execution;
use crate::state::StateKind;

/// One flattened step entry in a [`Dump`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepDump {
    /// Dotted path of the state the step belongs to.
    pub state: String,
    /// Position among the state's steps.
    pub order: u32,
    /// Step name.
    pub name: String,
    /// Whether the step is complete.
    pub complete: bool,
    /// Decision tag, if recorded.
    pub decision: Option<String>,
    /// Role tag, if any.
    pub participant: Option<String>,
}

/// A serializable snapshot of an [`Execution`], suitable for handing to a persistence
/// adapter or rendering to a host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dump {
    /// Chart name.
    pub name: String,
    /// Dotted path of the current state.
    pub state: String,
    /// Whether the current state is a `final` leaf.
    pub complete: bool,
    /// The chart's known participant role tags.
    pub participants: Vec<String>,
    /// The subject's identifier, if the chart declares a `subject_binding` and the
    /// context holds a value under its key.
    pub subject_key: Option<Value>,
    /// Every step across every state in the chart, flattened.
    pub steps: Vec<StepDump>,
}

/// Produce a [`Dump`] of `execution`.
///
/// For each state in the chart, the step list comes from the current state if it
/// matches, else the most recent `history` snapshot for that state, else the chart's
/// pristine template. The execution only ever has a live view of the states it has
/// actually visited.
pub fn dump(execution: &Execution) -> Dump {
    let mut steps = Vec::new();
    for path in execution.chart.states.keys() {
        let effective = if path == &execution.state.name {
            &execution.state
        } else if let Some(snapshot) = execution.history.iter().find(|h| &h.name == path) {
            snapshot
        } else {
            execution.chart.state(path).expect("path came from chart.states")
        };
        for step in effective.all_steps() {
            steps.push(StepDump {
                state: path.clone(),
                order: step.order,
                name: step.name.clone(),
                complete: step.complete,
                decision: step.decision.clone(),
                participant: step.participant.clone(),
            });
        }
    }
    steps.sort_by(|a, b| a.state.cmp(&b.state).then(a.order.cmp(&b.order)).then(a.name.cmp(&b.name)));

    let subject_key = execution
        .chart
        .subject_binding
        .as_ref()
        .and_then(|binding| execution.context.get(&binding.key).cloned());

    Dump {
        name: execution.chart.name.clone(),
        state: execution.state.name.clone(),
        complete: execution.state.kind == StateKind::Final,
        participants: execution.chart.participants.clone(),
        subject_key,
        steps,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{ChartBuilder, OnOpts};
    use crate::callback::{ActionOutcome, Callback};
    use crate::error::Result;
    use crate::transition::Event;
    use std::sync::Arc;

    struct NoopCallback;
    impl Callback for NoopCallback {
        fn action(&mut self, _tag: &str, _ctx: &Value) -> Result<ActionOutcome> {
            Ok(ActionOutcome::Ok)
        }
    }

    #[test]
    fn dump_reflects_current_and_historical_step_state() {
        let mut builder = ChartBuilder::new("sale");
        builder.subject("sale_id", "Sale");
        builder.initial_state("pending");
        builder.state("pending", |s| {
            s.step("confirm");
            s.on_completed("confirm", "sent", OnOpts::default());
        });
        builder.state("sent", |s| {
            s.step("close");
        });
        let chart = Arc::new(builder.build().unwrap());

        let mut cb = NoopCallback;
        let mut exec = Execution::new(chart, serde_json::json!({"sale_id": "abc"}), &mut cb).unwrap();
        exec.complete("confirm", &mut cb).unwrap();
        assert_eq!(exec.state.name, "sent");

        let snapshot = dump(&exec);
        assert_eq!(snapshot.state, "sent");
        assert!(!snapshot.complete);
        assert_eq!(snapshot.subject_key, Some(Value::String("abc".to_string())));

        let confirm = snapshot.steps.iter().find(|s| s.name == "confirm").unwrap();
        assert_eq!(confirm.state, "pending");
        assert!(confirm.complete);

        let close = snapshot.steps.iter().find(|s| s.name == "close").unwrap();
        assert_eq!(close.state, "sent");
        assert!(!close.complete);
    }
}
