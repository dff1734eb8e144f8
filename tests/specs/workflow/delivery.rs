//! Delivery order and cancellation specs

use crate::prelude::*;
use similar_asserts::assert_eq;

fn recorder_workflow(id: &str, priority: i32, ignore_cancelled: bool) -> WorkflowDefinition {
    WorkflowDefinition::new(id, "1")
        .with_binding(
            BindingDefinition::new(id, "t")
                .with_priority(priority)
                .with_ignore_cancelled(ignore_cancelled),
        )
        .with_action(ActionDefinition::new("test.record").with_arg("label", id))
}

#[tokio::test]
async fn higher_priority_runs_first_and_ties_keep_insertion_order() {
    let (engine, recorder) = engine(EngineConfig::default());
    let interpreter = engine.interpreter();
    for (id, priority) in [("low", 1), ("first-mid", 5), ("high", 9), ("second-mid", 5)] {
        interpreter.add_workflow(recorder_workflow(id, priority, false));
    }

    engine.publish("t", &engine.payload());

    assert_eq!(
        recorder.events(),
        vec!["high", "first-mid", "second-mid", "low"]
    );
}

#[tokio::test]
async fn cancelling_skips_only_subscribers_that_respect_it() {
    let (engine, recorder) = engine(EngineConfig::default());
    let interpreter = engine.interpreter();
    interpreter.add_workflow(
        WorkflowDefinition::new("stopper", "1")
            .with_binding(BindingDefinition::new("stop", "t").with_priority(10))
            .with_action(ActionDefinition::new("payload.cancel")),
    );
    interpreter.add_workflow(recorder_workflow("skipped", 5, false));
    interpreter.add_workflow(recorder_workflow("auditor", 1, true));

    let payload = engine.payload();
    engine.publish("t", &payload);

    assert!(payload.is_cancelled());
    assert_eq!(recorder.events(), vec!["auditor"]);
}
