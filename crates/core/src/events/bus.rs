// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event bus for routing payloads to subscribers

use super::subscription::{Handler, HandlerError, Subscriber, SubscriberId};
use crate::id::{IdGen, UuidIdGen};
use crate::payload::Payload;
use crate::unwind;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// The event bus delivers payloads to a topic's subscribers in priority order
///
/// Delivery is synchronous on the publishing thread. Each topic's list is
/// kept sorted by descending priority with ties in subscription order, and
/// `publish` iterates a snapshot so handlers may subscribe or unsubscribe
/// while it runs.
pub struct EventBus<G: IdGen = UuidIdGen> {
    topics: Arc<RwLock<HashMap<String, Vec<Subscriber>>>>,
    ids: G,
}

impl EventBus<UuidIdGen> {
    pub fn new() -> Self {
        Self::with_id_gen(UuidIdGen)
    }
}

impl<G: IdGen> EventBus<G> {
    pub fn with_id_gen(ids: G) -> Self {
        Self {
            topics: Arc::new(RwLock::new(HashMap::new())),
            ids,
        }
    }

    /// Subscribe `handler` to `topic`
    pub fn subscribe<F>(
        &self,
        topic: &str,
        priority: i32,
        ignore_cancelled: bool,
        handler: F,
    ) -> SubscriberId
    where
        F: Fn(&Payload) -> Result<(), HandlerError> + Send + Sync + 'static,
    {
        self.subscribe_handler(topic, priority, ignore_cancelled, Arc::new(handler))
    }

    pub fn subscribe_handler(
        &self,
        topic: &str,
        priority: i32,
        ignore_cancelled: bool,
        handler: Handler,
    ) -> SubscriberId {
        let id = SubscriberId(self.ids.next());
        let subscriber = Subscriber {
            id: id.clone(),
            priority,
            ignore_cancelled,
            handler,
        };

        let mut topics = self.topics.write().unwrap_or_else(|e| e.into_inner());
        let list = topics.entry(topic.to_string()).or_default();
        // After every existing entry of equal or higher priority
        let at = list.partition_point(|s| s.priority >= priority);
        list.insert(at, subscriber);

        tracing::debug!(topic, subscriber = %id, priority, ignore_cancelled, "subscribed");
        id
    }

    /// Remove exactly one subscriber. Unknown topics and ids are ignored.
    pub fn unsubscribe(&self, topic: &str, id: &SubscriberId) {
        let mut topics = self.topics.write().unwrap_or_else(|e| e.into_inner());
        let Some(list) = topics.get_mut(topic) else {
            return;
        };
        let before = list.len();
        list.retain(|s| &s.id != id);
        if list.len() != before {
            tracing::debug!(topic, subscriber = %id, "unsubscribed");
        }
        if list.is_empty() {
            topics.remove(topic);
        }
    }

    /// Deliver `payload` to every eligible subscriber of `topic`
    ///
    /// A subscriber is skipped when the payload is cancelled and it does not
    /// ignore cancellation. Handler errors and panics are logged and
    /// delivery continues.
    pub fn publish(&self, topic: &str, payload: &Payload) {
        let snapshot: Vec<Subscriber> = {
            let topics = self.topics.read().unwrap_or_else(|e| e.into_inner());
            match topics.get(topic) {
                Some(list) => list.clone(),
                None => {
                    tracing::trace!(topic, "no subscribers");
                    return;
                }
            }
        };

        for subscriber in &snapshot {
            if !subscriber.accepts(payload) {
                tracing::trace!(topic, subscriber = %subscriber.id, "skipped cancelled payload");
                continue;
            }
            match unwind::contain(|| (subscriber.handler)(payload)) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    tracing::error!(
                        topic,
                        subscriber = %subscriber.id,
                        error = %e,
                        "handler failed"
                    );
                }
                Err(panic) => {
                    tracing::error!(
                        topic,
                        subscriber = %subscriber.id,
                        panic = %panic,
                        "handler panicked"
                    );
                }
            }
        }
    }

    /// Number of subscribers on `topic`
    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.topics
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(topic)
            .map_or(0, Vec::len)
    }

    /// Topics that currently have at least one subscriber
    pub fn topics(&self) -> Vec<String> {
        self.topics
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .keys()
            .cloned()
            .collect()
    }

    /// Subscriber ids on `topic` in delivery order
    pub fn list_subscribers(&self, topic: &str) -> Vec<SubscriberId> {
        self.topics
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(topic)
            .map(|list| list.iter().map(|s| s.id.clone()).collect())
            .unwrap_or_default()
    }
}

impl Default for EventBus<UuidIdGen> {
    fn default() -> Self {
        Self::new()
    }
}

impl<G: IdGen> Clone for EventBus<G> {
    fn clone(&self) -> Self {
        Self {
            topics: Arc::clone(&self.topics),
            ids: self.ids.clone(),
        }
    }
}

#[cfg(test)]
#[path = "bus_tests.rs"]
mod tests;
