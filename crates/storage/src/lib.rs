// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! composer-storage: file-backed definition sources

mod json;

pub use json::{JsonFileSource, StorageError, JSON_FILE_KIND};

use composer_core::{DefinitionSource, EngineBuilder};
use std::sync::Arc;

/// Make the `json-file` source kind available to an engine
pub fn register(builder: EngineBuilder) -> EngineBuilder {
    builder.with_source_kind(JSON_FILE_KIND, |config| {
        let source = JsonFileSource::open(&config.uri)?;
        Ok(Arc::new(source) as Arc<dyn DefinitionSource>)
    })
}
