//! Workflow end-to-end specs
//!
//! A bound workflow runs its chain on publish and stops once removed.

use crate::prelude::*;
use similar_asserts::assert_eq;

fn writer() -> WorkflowDefinition {
    WorkflowDefinition::new("writer", "1")
        .with_binding(BindingDefinition::new("on-t", "t"))
        .with_condition(ConditionDefinition::new("test.true"))
        .with_action(
            ActionDefinition::new("registry.set")
                .with_arg("key", "written")
                .with_arg("value", "yes"),
        )
        .with_action(ActionDefinition::new("test.record").with_arg("label", "wrote"))
}

fn written(engine: &Engine) -> Option<String> {
    let value = engine.registry().get_as::<String>("written")?;
    Some(value.to_string())
}

#[tokio::test]
async fn publish_runs_the_bound_chain_until_the_workflow_is_removed() {
    let (engine, recorder) = engine(EngineConfig::default());
    engine.interpreter().add_workflow(writer());

    engine.publish("t", &engine.payload());
    assert_eq!(written(&engine).as_deref(), Some("yes"));

    engine.registry().set("written", "reset".to_string());
    engine.interpreter().remove_workflow("writer");
    engine.publish("t", &engine.payload());

    assert_eq!(written(&engine).as_deref(), Some("reset"));
    assert_eq!(recorder.events(), vec!["wrote"]);
    assert_eq!(engine.bus().subscriber_count("t"), 0);
}

#[tokio::test]
async fn failing_condition_keeps_actions_from_running() {
    let (engine, recorder) = engine(EngineConfig::default());
    engine.interpreter().add_workflow(
        WorkflowDefinition::new("gated", "1")
            .with_binding(BindingDefinition::new("b", "t"))
            .with_condition(ConditionDefinition::new("registry.contains").with_arg("key", "armed"))
            .with_action(ActionDefinition::new("test.record").with_arg("label", "fired")),
    );

    engine.publish("t", &engine.payload());
    engine.registry().set("armed", true);
    engine.publish("t", &engine.payload());

    assert_eq!(recorder.events(), vec!["fired"]);
}

#[tokio::test]
async fn misbehaving_plugins_do_not_stop_other_workflows() {
    let (engine, recorder) = engine(EngineConfig::default());
    engine.interpreter().add_workflow(
        WorkflowDefinition::new("noisy", "1")
            .with_binding(BindingDefinition::new("b", "t").with_priority(10))
            .with_action(ActionDefinition::new("test.panic"))
            .with_action(ActionDefinition::new("test.fail").with_arg("label", "x"))
            .with_action(ActionDefinition::new("test.record").with_arg("label", "noisy")),
    );
    engine.interpreter().add_workflow(
        WorkflowDefinition::new("quiet", "1")
            .with_binding(BindingDefinition::new("b", "t"))
            .with_action(ActionDefinition::new("test.record").with_arg("label", "quiet")),
    );

    engine.publish("t", &engine.payload());

    assert_eq!(recorder.events(), vec!["fail:x", "noisy", "quiet"]);
}
