//! Shared helpers for the behavioral specs

use std::path::Path;

pub use composer_core::testing::Recorder;
pub use composer_core::{
    ActionDefinition, BindingDefinition, ConditionDefinition, DefinitionSource, Engine,
    EngineConfig, ReconcileStrategy, WorkflowDefinition, WorkflowSourceConfig,
};
pub use composer_storage::{JsonFileSource, JSON_FILE_KIND};
pub use std::time::Duration;

/// Engine with the built-in catalog, the recording test behaviors, and the
/// JSON-file source kind
pub fn engine(config: EngineConfig) -> (Engine, Recorder) {
    let recorder = Recorder::new();
    let builder = Engine::builder(config).with_plugins(|resolver| {
        composer_plugins::install(resolver);
        recorder.install(resolver);
    });
    let engine = composer_storage::register(builder).build().unwrap();
    (engine, recorder)
}

/// Config with one JSON-file source rooted at `dir`
pub fn json_config(id: &str, dir: &Path, strategy: ReconcileStrategy) -> EngineConfig {
    let mut config = EngineConfig::default().with_source(WorkflowSourceConfig::new(
        id,
        JSON_FILE_KIND,
        dir.to_string_lossy(),
    ));
    config.reconcile.strategy = strategy;
    config
}

/// Poll `check` until it holds or a second passes
pub async fn eventually(mut check: impl FnMut() -> bool) -> bool {
    for _ in 0..100 {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    check()
}
