// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::behavior::EvaluationError;
use crate::config::EngineConfig;
use crate::payload::Payload;
use crate::testing::Recorder;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};

fn engine_with(recorder: &Recorder) -> Engine {
    let recorder = recorder.clone();
    Engine::builder(EngineConfig::default())
        .with_plugins(move |plugins| recorder.install(plugins))
        .build()
        .unwrap()
}

#[tokio::test]
async fn equal_definitions_share_one_instance() {
    let recorder = Recorder::new();
    let engine = engine_with(&recorder);
    let a = ConditionDefinition::new("test.check")
        .with_arg("label", "x")
        .with_arg("result", true);
    let b = ConditionDefinition::new("test.check")
        .with_arg("result", true)
        .with_arg("label", "x");

    let first = engine.conditions().create(&a).unwrap();
    let second = engine.conditions().create(&b).unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(recorder.constructions(), 1);
    assert_eq!(engine.conditions().len(), 1);
}

#[tokio::test]
async fn different_definitions_never_share() {
    let recorder = Recorder::new();
    let engine = engine_with(&recorder);
    let base = ConditionDefinition::new("test.check").with_arg("label", "x");
    let other_args = ConditionDefinition::new("test.check").with_arg("label", "y");
    let other_children = base
        .clone()
        .with_child(ConditionDefinition::new("test.true"));

    let a = engine.conditions().create(&base).unwrap();
    let b = engine.conditions().create(&other_args).unwrap();
    let c = engine.conditions().create(&other_children).unwrap();

    assert!(!Arc::ptr_eq(&a, &b));
    assert!(!Arc::ptr_eq(&a, &c));
    assert_eq!(recorder.constructions(), 3);
}

#[tokio::test]
async fn actions_are_memoized_separately() {
    let recorder = Recorder::new();
    let engine = engine_with(&recorder);
    let def = ActionDefinition::new("test.record").with_arg("label", "once");

    let first = engine.actions().create(&def).unwrap();
    let second = engine.actions().create(&def.clone()).unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert!(engine.conditions().is_empty());
}

#[tokio::test]
async fn unknown_type_is_empty() {
    let engine = engine_with(&Recorder::new());
    let def = ConditionDefinition::new("no.such.type");

    assert!(engine.conditions().create(&def).is_none());
    assert!(matches!(
        engine.conditions().try_create(&def),
        Err(CreateError::Resolution(ResolutionError::Unknown(_)))
    ));
}

#[tokio::test]
async fn wrong_kind_fails_closed() {
    let engine = engine_with(&Recorder::new());

    let as_condition = engine
        .conditions()
        .try_create(&ConditionDefinition::new("test.record"));
    let as_action = engine
        .actions()
        .try_create(&ActionDefinition::new("test.true"));

    assert!(matches!(
        as_condition,
        Err(CreateError::WrongKind { expected: "condition", found: "action", .. })
    ));
    assert!(matches!(
        as_action,
        Err(CreateError::WrongKind { expected: "action", found: "condition", .. })
    ));
}

#[tokio::test]
async fn construction_failures_are_not_memoized() {
    let attempts = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&attempts);
    let engine = Engine::builder(EngineConfig::default())
        .with_plugins(move |plugins| {
            plugins.register_condition("needs.key", move |_, def| {
                counter.fetch_add(1, Ordering::SeqCst);
                crate::workflow::args::require_string(&def.args, "key")?;
                let condition = |_: &Payload| -> Result<bool, EvaluationError> { Ok(true) };
                Ok(Arc::new(condition) as Arc<dyn Condition>)
            });
        })
        .build()
        .unwrap();
    let missing = ConditionDefinition::new("needs.key");

    assert!(matches!(
        engine.conditions().try_create(&missing),
        Err(CreateError::Construction { source: ConstructionError::MissingArgument(_), .. })
    ));
    assert!(engine.conditions().create(&missing).is_none());
    assert_eq!(attempts.load(Ordering::SeqCst), 2);

    let complete = missing.with_arg("key", json!("k"));
    assert!(engine.conditions().create(&complete).is_some());
}

#[tokio::test]
async fn panicking_factory_is_contained() {
    let engine = Engine::builder(EngineConfig::default())
        .with_plugins(|plugins| {
            plugins.register_action("explodes", |_, _| panic!("factory exploded"));
        })
        .build()
        .unwrap();

    let result = engine
        .actions()
        .try_create(&ActionDefinition::new("explodes"));

    assert!(matches!(
        result,
        Err(CreateError::Panicked { message, .. }) if message == "factory exploded"
    ));
}

#[tokio::test]
async fn composite_factories_can_build_children_through_the_cache() {
    let engine = Engine::builder(EngineConfig::default())
        .with_plugins(|plugins| {
            Recorder::new().install(plugins);
            plugins.register_condition("first.child", |engine, def| {
                let child = def
                    .children
                    .first()
                    .and_then(|child| engine.conditions().create(child))
                    .ok_or_else(|| ConstructionError::Failed("no child".into()))?;
                Ok(child)
            });
        })
        .build()
        .unwrap();
    let child = ConditionDefinition::new("test.false");
    let parent = ConditionDefinition::new("first.child").with_child(child.clone());

    let built = engine.conditions().create(&parent).unwrap();

    assert!(Arc::ptr_eq(&built, &engine.conditions().create(&child).unwrap()));
    assert_eq!(engine.conditions().len(), 2);
}

#[tokio::test]
async fn binding_factory_shares_the_subscriber_slot() {
    let definition = crate::workflow::BindingDefinition::new("b", "t");
    let binding = DefaultBindingFactory.create(&definition).unwrap();

    binding.set_subscriber(Some(crate::events::SubscriberId("s".into())));

    assert_eq!(definition.subscriber(), binding.subscriber());
}
