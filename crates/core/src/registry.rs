// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! TTL-scoped key/value store shared by every behavior of an engine
//!
//! Entries with a TTL expire two ways: a one-shot scheduler timer removes
//! them proactively, and reads evict them lazily once the clock passes the
//! deadline. Each entry carries a serial number so a timer that fires after
//! its entry was replaced leaves the replacement alone.

use crate::clock::{Clock, SystemClock};
use crate::payload::AnyValue;
use crate::scheduler::{Scheduler, TimerHandle};
use std::any::Any;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::time::{Duration, Instant};
use thiserror::Error;

/// Errors from registry operations
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("ttl for '{key}' must be positive")]
    InvalidTtl { key: String },
    #[error("value under '{key}' is not a {expected}")]
    TypeMismatch { key: String, expected: &'static str },
}

struct Entry {
    serial: u64,
    value: AnyValue,
    expires_at: Option<Instant>,
    timer: Option<TimerHandle>,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }

    fn discard(self) {
        if let Some(timer) = self.timer {
            timer.cancel();
        }
    }
}

type Entries = Mutex<HashMap<String, Entry>>;

/// Engine-wide key/value store with optional per-entry TTL
pub struct Registry<C: Clock = SystemClock> {
    entries: Arc<Entries>,
    serial: Arc<AtomicU64>,
    scheduler: Scheduler,
    clock: C,
}

impl Registry<SystemClock> {
    pub fn new(scheduler: Scheduler) -> Self {
        Self::with_clock(scheduler, SystemClock)
    }
}

impl<C: Clock> Registry<C> {
    pub fn with_clock(scheduler: Scheduler, clock: C) -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            serial: Arc::new(AtomicU64::new(1)),
            scheduler,
            clock,
        }
    }

    /// Store `value` under `key` with no expiry
    pub fn set<T: Any + Send + Sync>(&self, key: &str, value: T) {
        self.insert(key, Arc::new(value), None);
    }

    /// Store `value` under `key`, expiring after `ttl`
    ///
    /// A zero TTL is rejected and any existing entry is left untouched.
    pub fn set_with_ttl<T: Any + Send + Sync>(
        &self,
        key: &str,
        value: T,
        ttl: Duration,
    ) -> Result<(), RegistryError> {
        self.set_entry(key, Some(Arc::new(value)), Some(ttl))
    }

    /// Untyped form of `set`/`set_with_ttl`; an absent value removes the key
    pub fn set_entry(
        &self,
        key: &str,
        value: Option<AnyValue>,
        ttl: Option<Duration>,
    ) -> Result<(), RegistryError> {
        if ttl.is_some_and(|ttl| ttl.is_zero()) {
            tracing::warn!(key, "rejected registry entry with non-positive ttl");
            return Err(RegistryError::InvalidTtl {
                key: key.to_string(),
            });
        }
        match value {
            Some(value) => self.insert(key, value, ttl),
            None => {
                self.remove(key);
            }
        }
        Ok(())
    }

    fn insert(&self, key: &str, value: AnyValue, ttl: Option<Duration>) {
        let serial = self.serial.fetch_add(1, Ordering::SeqCst);
        let expires_at = ttl.and_then(|ttl| self.clock.deadline(ttl));

        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(previous) = entries.remove(key) {
            previous.discard();
        }
        // Scheduled under the map lock so the timer is recorded before any
        // other writer can see or replace the entry
        let timer = match (ttl, expires_at) {
            (Some(ttl), Some(_)) => Some(self.schedule_expiry(key, serial, ttl)),
            _ => None,
        };
        entries.insert(
            key.to_string(),
            Entry {
                serial,
                value,
                expires_at,
                timer,
            },
        );
        tracing::trace!(key, ttl = ?ttl, "registry set");
    }

    fn schedule_expiry(&self, key: &str, serial: u64, ttl: Duration) -> TimerHandle {
        let entries: Weak<Entries> = Arc::downgrade(&self.entries);
        let key = key.to_string();
        self.scheduler.schedule(ttl, move || {
            let Some(entries) = entries.upgrade() else {
                return;
            };
            let mut entries = entries.lock().unwrap_or_else(|e| e.into_inner());
            if entries.get(&key).is_some_and(|e| e.serial == serial) {
                entries.remove(&key);
                tracing::debug!(key = %key, "registry entry expired");
            }
        })
    }

    /// Current value under `key`, evicting it first if its TTL has passed
    pub fn get(&self, key: &str) -> Option<AnyValue> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let expired = entries.get(key)?.is_expired(self.clock.now());
        if expired {
            if let Some(entry) = entries.remove(key) {
                entry.discard();
            }
            tracing::debug!(key, "registry entry expired on read");
            return None;
        }
        entries.get(key).map(|entry| Arc::clone(&entry.value))
    }

    /// Typed read that reports a mismatch as an error
    pub fn try_get_as<T: Any + Send + Sync>(
        &self,
        key: &str,
    ) -> Result<Option<Arc<T>>, RegistryError> {
        let Some(value) = self.get(key) else {
            return Ok(None);
        };
        value
            .downcast::<T>()
            .map(Some)
            .map_err(|_| RegistryError::TypeMismatch {
                key: key.to_string(),
                expected: std::any::type_name::<T>(),
            })
    }

    /// Typed read; a mismatch is logged and reads as absent
    pub fn get_as<T: Any + Send + Sync>(&self, key: &str) -> Option<Arc<T>> {
        match self.try_get_as::<T>(key) {
            Ok(value) => value,
            Err(e) => {
                tracing::error!(key, error = %e, "registry type mismatch");
                None
            }
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Remove `key`, returning whether a live entry was present
    pub fn remove(&self, key: &str) -> bool {
        let removed = self
            .entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(key);
        match removed {
            Some(entry) => {
                let live = !entry.is_expired(self.clock.now());
                entry.discard();
                tracing::trace!(key, live, "registry remove");
                live
            }
            None => false,
        }
    }

    /// Remove every entry and cancel every pending expiration
    pub fn clear(&self) {
        let drained: Vec<Entry> = {
            let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
            entries.drain().map(|(_, entry)| entry).collect()
        };
        tracing::debug!(count = drained.len(), "registry cleared");
        for entry in drained {
            entry.discard();
        }
    }

    /// Number of stored entries, including expired ones not yet evicted
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn keys(&self) -> Vec<String> {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .keys()
            .cloned()
            .collect()
    }
}

impl<C: Clock> Clone for Registry<C> {
    fn clone(&self) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
            serial: Arc::clone(&self.serial),
            scheduler: self.scheduler.clone(),
            clock: self.clock.clone(),
        }
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
