// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Priority-ordered, cancellation-aware publish/subscribe
//!
//! This module provides:
//! - `EventBus` - Topic table with synchronous, ordered delivery
//! - `Subscriber` - One handler with its priority and cancellation visibility

mod bus;
mod subscription;

pub use bus::EventBus;
pub use subscription::{Handler, HandlerError, Subscriber, SubscriberId};
