// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Subscribers and their handles

use crate::payload::Payload;
use std::fmt;
use std::sync::Arc;

/// Error a handler may return; logged by the bus, never propagated
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// Callback invoked for each delivered payload
pub type Handler = Arc<dyn Fn(&Payload) -> Result<(), HandlerError> + Send + Sync>;

/// Subscriber handle for unsubscribing
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SubscriberId(pub String);

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single entry in a topic's delivery list
#[derive(Clone)]
pub struct Subscriber {
    pub id: SubscriberId,
    /// Higher is delivered first
    pub priority: i32,
    /// Deliver even after an earlier handler cancelled the payload
    pub ignore_cancelled: bool,
    pub handler: Handler,
}

impl Subscriber {
    /// Whether this subscriber should see the payload in its current state
    pub fn accepts(&self, payload: &Payload) -> bool {
        self.ignore_cancelled || !payload.is_cancelled()
    }
}

impl fmt::Debug for Subscriber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscriber")
            .field("id", &self.id)
            .field("priority", &self.priority)
            .field("ignore_cancelled", &self.ignore_cancelled)
            .finish_non_exhaustive()
    }
}
