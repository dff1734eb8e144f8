// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::behavior::{ConstructionError, ExecutionError};
use crate::config::EngineConfig;
use crate::factory::BindingFactory;
use crate::testing::Recorder;
use crate::workflow::args;
use std::sync::mpsc;
use std::thread;

fn engine(recorder: &Recorder, config: EngineConfig) -> Engine {
    let recorder = recorder.clone();
    Engine::builder(config)
        .with_plugins(move |plugins| {
            recorder.install(plugins);
            plugins.register_action("test.remove-workflow", |_, def| {
                let id = args::require_string(&def.args, "id")?;
                let action = move |payload: &Payload| -> Result<(), ExecutionError> {
                    let engine = payload.engine().ok_or(ExecutionError::Detached)?;
                    engine.interpreter().remove_workflow(&id);
                    Ok(())
                };
                Ok(Arc::new(action) as Arc<dyn Action>)
            });
        })
        .build()
        .unwrap()
}

fn recording_workflow(id: &str, topic: &str, label: &str) -> WorkflowDefinition {
    WorkflowDefinition::new(id, "1")
        .with_condition(ConditionDefinition::new("test.true"))
        .with_action(ActionDefinition::new("test.record").with_arg("label", label))
        .with_binding(BindingDefinition::new(format!("{id}-binding"), topic))
}

#[tokio::test]
async fn added_workflow_runs_on_its_topic_and_stops_after_removal() {
    let recorder = Recorder::new();
    let engine = engine(&recorder, EngineConfig::default());

    engine
        .interpreter()
        .add_workflow(recording_workflow("wf", "t", "ran"));
    engine.publish("t", &engine.payload());
    assert_eq!(recorder.events(), vec!["ran"]);

    engine.interpreter().remove_workflow("wf");
    engine.publish("t", &engine.payload());

    assert_eq!(recorder.events(), vec!["ran"]);
    assert!(!engine.interpreter().workflow_exists("wf"));
    assert_eq!(engine.bus().subscriber_count("t"), 0);
}

#[tokio::test]
async fn bindings_are_subscribed_exactly_while_loaded() {
    let engine = engine(&Recorder::new(), EngineConfig::default());
    let workflow =
        recording_workflow("wf", "a", "x").with_binding(BindingDefinition::new("second", "b"));

    engine.interpreter().add_workflow(workflow);

    assert_eq!(engine.bus().subscriber_count("a"), 1);
    assert_eq!(engine.bus().subscriber_count("b"), 1);
    let loaded = engine.interpreter().workflow("wf").unwrap();
    let recorded = loaded.bindings[0].subscriber().unwrap();
    assert_eq!(engine.bus().list_subscribers("a"), vec![recorded]);

    engine.interpreter().remove_workflow("wf");

    assert_eq!(engine.bus().subscriber_count("a"), 0);
    assert_eq!(engine.bus().subscriber_count("b"), 0);
    assert_eq!(loaded.bindings[0].subscriber(), None);
}

#[tokio::test]
async fn re_adding_an_id_replaces_the_previous_version() {
    let recorder = Recorder::new();
    let engine = engine(&recorder, EngineConfig::default());

    engine
        .interpreter()
        .add_workflow(recording_workflow("wf", "t", "v1"));
    engine
        .interpreter()
        .add_workflow(recording_workflow("wf", "t", "v2"));
    engine.publish("t", &engine.payload());

    assert_eq!(recorder.events(), vec!["v2"]);
    assert_eq!(engine.bus().subscriber_count("t"), 1);
    assert_eq!(engine.interpreter().workflows().len(), 1);
}

#[tokio::test]
async fn first_false_condition_short_circuits() {
    let recorder = Recorder::new();
    let engine = engine(&recorder, EngineConfig::default());
    let workflow = WorkflowDefinition::new("wf", "1")
        .with_condition(ConditionDefinition::new("test.check").with_arg("label", "a"))
        .with_condition(
            ConditionDefinition::new("test.check")
                .with_arg("label", "b")
                .with_arg("result", false),
        )
        .with_condition(ConditionDefinition::new("test.check").with_arg("label", "c"))
        .with_action(ActionDefinition::new("test.record"))
        .with_binding(BindingDefinition::new("b", "t"));

    engine.interpreter().add_workflow(workflow);
    engine.publish("t", &engine.payload());

    assert_eq!(recorder.events(), vec!["check:a", "check:b"]);
}

#[tokio::test]
async fn erroring_condition_aborts_and_unresolvable_condition_is_skipped() {
    let recorder = Recorder::new();
    let engine = engine(&recorder, EngineConfig::default());
    let skipped = WorkflowDefinition::new("unknown", "1")
        .with_condition(ConditionDefinition::new("no.such.condition"))
        .with_action(ActionDefinition::new("test.record").with_arg("label", "unknown-ran"))
        .with_binding(BindingDefinition::new("b", "t"));
    let broken = WorkflowDefinition::new("broken", "1")
        .with_condition(ConditionDefinition::new("test.broken"))
        .with_action(ActionDefinition::new("test.record").with_arg("label", "broken-ran"))
        .with_binding(BindingDefinition::new("b", "t"));

    engine.interpreter().add_workflow(skipped);
    engine.interpreter().add_workflow(broken);
    engine.publish("t", &engine.payload());

    assert_eq!(recorder.events(), vec!["unknown-ran"]);
}

#[tokio::test]
async fn failing_actions_do_not_stop_the_chain() {
    let recorder = Recorder::new();
    let engine = engine(&recorder, EngineConfig::default());
    let workflow = WorkflowDefinition::new("wf", "1")
        .with_action(ActionDefinition::new("test.fail").with_arg("label", "first"))
        .with_action(ActionDefinition::new("test.panic"))
        .with_action(ActionDefinition::new("no.such.action"))
        .with_action(ActionDefinition::new("test.record").with_arg("label", "last"))
        .with_binding(BindingDefinition::new("b", "t"));

    engine.interpreter().add_workflow(workflow);
    engine.publish("t", &engine.payload());

    assert_eq!(recorder.events(), vec!["fail:first", "last"]);
}

#[tokio::test]
async fn binding_priority_and_cancellation_apply_to_workflows() {
    let recorder = Recorder::new();
    let engine = engine(&recorder, EngineConfig::default());
    let canceller = WorkflowDefinition::new("canceller", "1")
        .with_action(ActionDefinition::new("test.record").with_arg("label", "canceller"))
        .with_action(ActionDefinition::new("test.cancel"))
        .with_binding(BindingDefinition::new("b", "t").with_priority(10));
    let skipped = recording_workflow("skipped", "t", "skipped");
    let watcher = WorkflowDefinition::new("watcher", "1")
        .with_action(ActionDefinition::new("test.record").with_arg("label", "watcher"))
        .with_binding(
            BindingDefinition::new("b", "t")
                .with_priority(-1)
                .with_ignore_cancelled(true),
        );

    engine.interpreter().add_workflow(watcher);
    engine.interpreter().add_workflow(skipped);
    engine.interpreter().add_workflow(canceller);
    let payload = engine.payload();
    engine.publish("t", &payload);

    assert_eq!(recorder.events(), vec!["canceller", "watcher"]);
    assert!(payload.is_cancelled());
}

#[tokio::test]
async fn removal_is_not_blocked_by_a_cancelled_payload() {
    let engine = engine(&Recorder::new(), EngineConfig::default());
    engine
        .interpreter()
        .add_workflow(recording_workflow("wf", "t", "x"));

    let payload = engine.payload().with(WORKFLOW_ID, "wf".to_string());
    payload.cancel();
    engine.publish(WORKFLOW_REMOVED, &payload);

    assert_eq!(engine.bus().subscriber_count("t"), 0);
}

#[tokio::test]
async fn disabled_bindings_subscribe_unless_honored() {
    let disabled = || {
        WorkflowDefinition::new("wf", "1")
            .with_binding(BindingDefinition::new("off", "t").with_enabled(false))
            .with_binding(BindingDefinition::new("on", "u"))
    };

    let literal = engine(&Recorder::new(), EngineConfig::default());
    literal.interpreter().add_workflow(disabled());
    assert_eq!(literal.bus().subscriber_count("t"), 1);

    let mut config = EngineConfig::default();
    config.bindings.honor_enabled = true;
    let honoring = engine(&Recorder::new(), config);
    honoring.interpreter().add_workflow(disabled());
    assert_eq!(honoring.bus().subscriber_count("t"), 0);
    assert_eq!(honoring.bus().subscriber_count("u"), 1);

    honoring.interpreter().remove_workflow("wf");
    assert_eq!(honoring.bus().subscriber_count("u"), 0);
}

struct EnvironmentFilter(&'static str);

impl BindingFactory for EnvironmentFilter {
    fn create(
        &self,
        definition: &BindingDefinition,
    ) -> Result<BindingDefinition, ConstructionError> {
        if definition.environment == self.0 {
            Ok(definition.clone())
        } else {
            Err(ConstructionError::Failed(format!("not in {}", self.0)))
        }
    }
}

#[tokio::test]
async fn binding_factory_decides_what_gets_subscribed() {
    let engine = Engine::builder(EngineConfig::default())
        .with_binding_factory(Arc::new(EnvironmentFilter("prod")))
        .build()
        .unwrap();
    let workflow = WorkflowDefinition::new("wf", "1")
        .with_binding(BindingDefinition::new("p", "prod-topic").with_environment("prod"))
        .with_binding(BindingDefinition::new("d", "dev-topic").with_environment("dev"));

    engine.interpreter().add_workflow(workflow);

    assert_eq!(engine.bus().subscriber_count("prod-topic"), 1);
    assert_eq!(engine.bus().subscriber_count("dev-topic"), 0);
    assert!(engine
        .interpreter()
        .binding(&BindingDefinition::new("x", "t"))
        .is_none());
}

#[tokio::test]
async fn action_may_remove_its_own_workflow_mid_delivery() {
    let recorder = Recorder::new();
    let engine = engine(&recorder, EngineConfig::default());
    let workflow = WorkflowDefinition::new("once", "1")
        .with_action(ActionDefinition::new("test.record").with_arg("label", "fired"))
        .with_action(ActionDefinition::new("test.remove-workflow").with_arg("id", "once"))
        .with_binding(BindingDefinition::new("b", "t"));

    engine.interpreter().add_workflow(workflow);
    engine.publish("t", &engine.payload());
    engine.publish("t", &engine.payload());

    assert_eq!(recorder.events(), vec!["fired"]);
    assert!(!engine.interpreter().workflow_exists("once"));
}

#[tokio::test]
async fn internal_handlers_run_first_on_lifecycle_topics() {
    let engine = engine(&Recorder::new(), EngineConfig::default());
    engine
        .bus()
        .subscribe(WORKFLOW_ADDED, i32::MAX, false, |_| Ok(()));

    let handlers = engine.interpreter().handler_ids();
    let added = handlers
        .iter()
        .find(|(topic, _)| *topic == WORKFLOW_ADDED)
        .map(|(_, id)| id.clone())
        .unwrap();

    assert_eq!(engine.bus().list_subscribers(WORKFLOW_ADDED)[0], added);
}

#[tokio::test]
async fn pass_throughs_return_empty_on_failure() {
    let engine = engine(&Recorder::new(), EngineConfig::default());

    let interpreter = engine.interpreter();
    let known = ConditionDefinition::new("test.true");
    let unknown = ConditionDefinition::new("missing");
    let wrong_kind = ActionDefinition::new("test.true");
    let binding = BindingDefinition::new("b", "t");

    assert!(interpreter.condition(&known).is_some());
    assert!(interpreter.condition(&unknown).is_none());
    assert!(interpreter.action(&wrong_kind).is_none());
    assert!(interpreter.binding(&binding).is_some());
}

/// Stalls the first `create` until the test releases it
struct Gate {
    reached: Mutex<Option<mpsc::Sender<()>>>,
    release: Mutex<Option<mpsc::Receiver<()>>>,
}

impl BindingFactory for Gate {
    fn create(
        &self,
        definition: &BindingDefinition,
    ) -> Result<BindingDefinition, ConstructionError> {
        let reached = self.reached.lock().unwrap().take();
        if let Some(reached) = reached {
            reached.send(()).unwrap();
            if let Some(release) = self.release.lock().unwrap().take() {
                release.recv().unwrap();
            }
        }
        Ok(definition.clone())
    }
}

fn gated_engine(recorder: &Recorder) -> (Engine, mpsc::Receiver<()>, mpsc::Sender<()>) {
    let (reached_tx, reached_rx) = mpsc::channel();
    let (release_tx, release_rx) = mpsc::channel();
    let gate = Gate {
        reached: Mutex::new(Some(reached_tx)),
        release: Mutex::new(Some(release_rx)),
    };
    let recorder = recorder.clone();
    let engine = Engine::builder(EngineConfig::default())
        .with_plugins(move |plugins| recorder.install(plugins))
        .with_binding_factory(Arc::new(gate))
        .build()
        .unwrap();
    (engine, reached_rx, release_tx)
}

#[tokio::test(flavor = "multi_thread")]
async fn removal_while_binding_leaves_no_subscription() {
    let recorder = Recorder::new();
    let (engine, reached, release) = gated_engine(&recorder);

    let adder = {
        let engine = engine.clone();
        thread::spawn(move || {
            engine
                .interpreter()
                .add_workflow(recording_workflow("wf", "t", "ran"))
        })
    };
    reached.recv().unwrap();
    engine.interpreter().remove_workflow("wf");
    release.send(()).unwrap();
    adder.join().unwrap();

    assert!(!engine.interpreter().workflow_exists("wf"));
    assert_eq!(engine.bus().subscriber_count("t"), 0);
    engine.publish("t", &engine.payload());
    assert!(recorder.events().is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn replacement_while_binding_keeps_only_the_newer_version() {
    let recorder = Recorder::new();
    let (engine, reached, release) = gated_engine(&recorder);

    let adder = {
        let engine = engine.clone();
        thread::spawn(move || {
            engine
                .interpreter()
                .add_workflow(recording_workflow("wf", "t", "v1"))
        })
    };
    reached.recv().unwrap();
    engine
        .interpreter()
        .add_workflow(recording_workflow("wf", "t", "v2"));
    release.send(()).unwrap();
    adder.join().unwrap();

    assert_eq!(engine.bus().subscriber_count("t"), 1);
    let loaded = engine.interpreter().workflow("wf").unwrap();
    assert_eq!(
        engine.bus().list_subscribers("t"),
        vec![loaded.bindings[0].subscriber().unwrap()]
    );
    engine.publish("t", &engine.payload());
    assert_eq!(recorder.events(), vec!["v2"]);

    engine.interpreter().remove_workflow("wf");
    assert_eq!(engine.bus().subscriber_count("t"), 0);
}

const IDS: [&str; 3] = ["a", "b", "c"];

#[tokio::test(flavor = "multi_thread")]
async fn concurrent_adds_removes_and_publishes_stay_consistent() {
    let recorder = Recorder::new();
    let engine = engine(&recorder, EngineConfig::default());

    let workers: Vec<_> = (0..4)
        .map(|worker| {
            let engine = engine.clone();
            thread::spawn(move || {
                for round in 0..200 {
                    let id = IDS[(worker + round) % IDS.len()];
                    if (worker + round) % 3 == 0 {
                        engine.interpreter().remove_workflow(id);
                    } else {
                        engine
                            .interpreter()
                            .add_workflow(recording_workflow(id, id, id));
                    }
                    engine.publish(id, &engine.payload());
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }

    for id in IDS {
        let loaded = usize::from(engine.interpreter().workflow_exists(id));
        assert_eq!(engine.bus().subscriber_count(id), loaded, "topic {id}");
    }
    for id in IDS {
        engine.interpreter().remove_workflow(id);
        assert_eq!(engine.bus().subscriber_count(id), 0, "topic {id}");
    }
    assert!(engine.interpreter().workflow_ids().is_empty());
}
