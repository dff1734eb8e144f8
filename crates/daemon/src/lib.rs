// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! composer-daemon: hosts a Composer engine in a long-running process

pub mod lifecycle;

pub use lifecycle::{
    default_config, load_config, load_or_create_config, shutdown, startup, summary,
    LifecycleError,
};
