//! JSON-file source and reconciliation specs

use crate::prelude::*;
use similar_asserts::assert_eq;
use tempfile::tempdir;

fn counter(version: &str) -> WorkflowDefinition {
    WorkflowDefinition::new("counter", version)
        .with_binding(BindingDefinition::new("b", "tick"))
        .with_action(ActionDefinition::new("test.record").with_arg("label", version))
}

#[tokio::test]
async fn authoritative_monitor_loads_updates_and_unloads_files() {
    let dir = tempdir().unwrap();
    let files = JsonFileSource::open(dir.path()).unwrap();
    files.save(&counter("1")).unwrap();
    let (engine, recorder) = engine(json_config(
        "files",
        dir.path(),
        ReconcileStrategy::SourceAuthoritative,
    ));
    engine
        .monitor_source(&engine.sources().configs()[0], Duration::from_millis(20))
        .unwrap();

    assert!(eventually(|| engine.interpreter().workflow_exists("counter")).await);
    engine.publish("tick", &engine.payload());

    files.save(&counter("2")).unwrap();
    let version = |id: &str| engine.interpreter().workflow(id).map(|w| w.version.clone());
    assert!(eventually(|| version("counter").as_deref() == Some("2")).await);
    engine.publish("tick", &engine.payload());

    std::fs::remove_file(dir.path().join("counter.json")).unwrap();
    assert!(eventually(|| !engine.interpreter().workflow_exists("counter")).await);
    engine.publish("tick", &engine.payload());

    assert_eq!(recorder.events(), vec!["1", "2"]);
    engine.shutdown();
}

#[tokio::test]
async fn initialize_bootstraps_the_default_monitor() {
    let dir = tempdir().unwrap();
    let (engine, _) = engine(json_config("files", dir.path(), ReconcileStrategy::Literal));

    engine.initialize();

    let written = std::fs::read_to_string(dir.path().join("initializers/default.json")).unwrap();
    let initializer: serde_json::Value = serde_json::from_str(&written).unwrap();
    assert_eq!(initializer["conditions"][0]["type"], "source.available");
    assert_eq!(initializer["actions"][0]["type"], "source.monitor");
    assert_eq!(initializer["actions"][0]["args"]["interval"], 5000);
    assert_eq!(engine.monitored_sources(), vec!["files".to_string()]);
    engine.shutdown();
}

#[tokio::test]
async fn literal_pairing_leaves_new_files_unloaded() {
    let dir = tempdir().unwrap();
    JsonFileSource::open(dir.path())
        .unwrap()
        .save(&counter("1"))
        .unwrap();
    let (engine, _) = engine(json_config("files", dir.path(), ReconcileStrategy::Literal));
    let monitor = composer_core::SourceMonitor::new(
        engine.downgrade(),
        engine.sources().configs()[0].clone(),
        ReconcileStrategy::Literal,
    );

    let report = monitor.tick();

    assert_eq!(report.removed, vec!["counter".to_string()]);
    assert!(report.added.is_empty());
    assert!(!engine.interpreter().workflow_exists("counter"));
}
