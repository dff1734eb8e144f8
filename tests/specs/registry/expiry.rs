//! Registry expiry specs

use crate::prelude::*;
use similar_asserts::assert_eq;

#[tokio::test]
async fn entry_is_visible_until_its_ttl_elapses() {
    let (engine, _) = engine(EngineConfig::default());

    engine
        .registry()
        .set_with_ttl("k", "v".to_string(), Duration::from_millis(100))
        .unwrap();
    assert!(engine.registry().contains_key("k"));

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(!engine.registry().contains_key("k"));
}

#[tokio::test]
async fn replacing_an_entry_outlives_the_old_ttl() {
    let (engine, _) = engine(EngineConfig::default());

    engine
        .registry()
        .set_with_ttl("k", 1_i64, Duration::from_millis(50))
        .unwrap();
    engine.registry().set("k", 2_i64);
    tokio::time::sleep(Duration::from_millis(150)).await;

    assert_eq!(engine.registry().get_as::<i64>("k").as_deref(), Some(&2));
}

#[tokio::test]
async fn workflow_ttl_argument_expires_what_it_wrote() {
    let (engine, _) = engine(EngineConfig::default());
    engine.interpreter().add_workflow(
        WorkflowDefinition::new("lease", "1")
            .with_binding(BindingDefinition::new("b", "lease.take"))
            .with_action(
                ActionDefinition::new("registry.set")
                    .with_arg("key", "lease")
                    .with_arg("value", "held")
                    .with_arg("ttl", "80ms"),
            ),
    );

    engine.publish("lease.take", &engine.payload());
    assert!(engine.registry().contains_key("lease"));

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(!engine.registry().contains_key("lease"));
}
