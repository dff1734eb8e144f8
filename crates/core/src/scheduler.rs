// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared timer facility for deferred and repeating work
//!
//! Timers sleep on the tokio runtime and run their bodies on the blocking
//! pool, so registry expirations and reconciliation ticks never execute on
//! the thread that issued a publish. Repeating timers never overlap: the
//! next tick waits for the previous body to return.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::task::AbortHandle;
use tokio::time::MissedTickBehavior;

/// Errors from scheduling
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("repeating interval must be greater than zero")]
    ZeroInterval,
    #[error("no tokio runtime available: {0}")]
    NoRuntime(#[from] tokio::runtime::TryCurrentError),
}

type ActiveTimers = Mutex<HashMap<u64, AbortHandle>>;

/// Cancellable handle to a scheduled task
#[derive(Debug)]
pub struct TimerHandle {
    id: u64,
    abort: AbortHandle,
    active: Weak<ActiveTimers>,
}

impl TimerHandle {
    /// Cancel the timer. A body that is already running finishes, but no
    /// further run starts.
    pub fn cancel(&self) {
        self.abort.abort();
        forget(&self.active, self.id);
    }

    pub fn is_finished(&self) -> bool {
        self.abort.is_finished()
    }
}

/// Runtime-backed timer facility, cheap to clone
#[derive(Clone, Debug)]
pub struct Scheduler {
    handle: Handle,
    active: Arc<ActiveTimers>,
    next_id: Arc<AtomicU64>,
}

impl Scheduler {
    pub fn new(handle: Handle) -> Self {
        Self {
            handle,
            active: Arc::new(Mutex::new(HashMap::new())),
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Scheduler on the runtime the caller is running in
    pub fn current() -> Result<Self, SchedulerError> {
        Ok(Self::new(Handle::try_current()?))
    }

    /// Run `task` once after `delay`
    pub fn schedule<F>(&self, delay: Duration, task: F) -> TimerHandle
    where
        F: FnOnce() + Send + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let active = Arc::downgrade(&self.active);

        // Held across spawn so the task cannot forget itself before it is recorded
        let mut timers = self.active.lock().unwrap_or_else(|e| e.into_inner());
        let join = self.handle.spawn(async move {
            tokio::time::sleep(delay).await;
            if let Err(e) = tokio::task::spawn_blocking(task).await {
                tracing::error!(timer = id, error = %e, "scheduled task failed");
            }
            forget(&active, id);
        });
        let abort = join.abort_handle();
        timers.insert(id, abort.clone());

        TimerHandle {
            id,
            abort,
            active: Arc::downgrade(&self.active),
        }
    }

    /// Run `task` after `delay`, then every `interval` until cancelled
    pub fn schedule_repeating<F>(
        &self,
        delay: Duration,
        interval: Duration,
        task: F,
    ) -> Result<TimerHandle, SchedulerError>
    where
        F: Fn() + Send + Sync + 'static,
    {
        if interval.is_zero() {
            return Err(SchedulerError::ZeroInterval);
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let task = Arc::new(task);

        let mut timers = self.active.lock().unwrap_or_else(|e| e.into_inner());
        let join = self.handle.spawn(async move {
            let start = tokio::time::Instant::now() + delay;
            let mut ticks = tokio::time::interval_at(start, interval);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticks.tick().await;
                let task = Arc::clone(&task);
                if let Err(e) = tokio::task::spawn_blocking(move || task()).await {
                    tracing::error!(timer = id, error = %e, "repeating task failed");
                }
            }
        });
        let abort = join.abort_handle();
        timers.insert(id, abort.clone());

        Ok(TimerHandle {
            id,
            abort,
            active: Arc::downgrade(&self.active),
        })
    }

    /// Number of timers that have not fired or been cancelled
    pub fn active_count(&self) -> usize {
        self.active.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Cancel every outstanding timer
    pub fn shutdown(&self) {
        let mut timers = self.active.lock().unwrap_or_else(|e| e.into_inner());
        tracing::debug!(count = timers.len(), "cancelling scheduled timers");
        for (_, abort) in timers.drain() {
            abort.abort();
        }
    }
}

fn forget(active: &Weak<ActiveTimers>, id: u64) {
    if let Some(active) = active.upgrade() {
        active
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&id);
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
