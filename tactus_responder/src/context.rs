// Copyright 2025 the Tactus Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The surface context: everything dispatch lanes share.
//!
//! Built once at start-up and handed to every [`Dispatcher`](crate::dispatcher::Dispatcher)
//! as an `Arc`. Dropping the last reference tears the surface down; there is no global.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tactus_gesture::types::PenSample;
use tokio::time::Instant;
use tracing::debug;

use crate::config::DispatchConfig;
use crate::error::ConfigError;
use crate::lock::LockArbiter;
use crate::registry::Registry;
use crate::task::ScheduledTask;
use crate::types::ComponentId;

/// Suppresses touches while a pen is in use, so a resting palm does not claim anything.
#[derive(Debug)]
pub struct PenGate {
    window: Option<Duration>,
    last: Mutex<Option<Instant>>,
}

impl PenGate {
    /// Gate with the given window; `None` never rejects.
    pub fn new(window: Option<Duration>) -> Self {
        Self {
            window,
            last: Mutex::new(None),
        }
    }

    /// Record pen activity. Lifting the pen does not extend the window.
    pub fn note(&self, sample: &PenSample) {
        if !sample.is_pen_up() {
            self.note_at(Instant::now());
        }
    }

    /// Record pen activity at `at`.
    pub fn note_at(&self, at: Instant) {
        let mut last = self.last.lock().unwrap_or_else(PoisonError::into_inner);
        if last.is_none_or(|l| l < at) {
            *last = Some(at);
        }
    }

    /// Whether touches are currently suppressed.
    pub fn is_active(&self) -> bool {
        self.is_active_at(Instant::now())
    }

    /// Whether touches are suppressed at `now`.
    pub fn is_active_at(&self, now: Instant) -> bool {
        let Some(window) = self.window else {
            return false;
        };
        let last = *self.last.lock().unwrap_or_else(PoisonError::into_inner);
        last.is_some_and(|l| now.saturating_duration_since(l) < window)
    }
}

/// Shared state of one interactive surface.
#[derive(Debug)]
pub struct SurfaceContext {
    config: DispatchConfig,
    arbiter: Arc<LockArbiter>,
    registry: Registry,
    pen_gate: PenGate,
}

impl SurfaceContext {
    /// Build a context after validating `config`.
    pub fn new(config: DispatchConfig) -> Result<Arc<Self>, ConfigError> {
        config.validate()?;
        let arbiter = Arc::new(LockArbiter::new());
        let pen_gate = PenGate::new(config.palm_rejection());
        Ok(Arc::new(Self {
            registry: Registry::new(Arc::clone(&arbiter)),
            arbiter,
            pen_gate,
            config,
        }))
    }

    /// Configuration.
    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Lock arbiter.
    pub fn arbiter(&self) -> &LockArbiter {
        &self.arbiter
    }

    /// Component registry.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Palm rejection gate.
    pub fn pen_gate(&self) -> &PenGate {
        &self.pen_gate
    }

    /// Unregister `id` once `delay` has elapsed, unless the returned task is cancelled.
    ///
    /// Used to detach a closed panel with a grace period in which it may reopen.
    ///
    /// # Panics
    ///
    /// Panics when called outside a Tokio runtime.
    pub fn unregister_after(self: &Arc<Self>, id: ComponentId, delay: Duration) -> ScheduledTask {
        let ctx = Arc::clone(self);
        ScheduledTask::spawn(delay, move || {
            if ctx.registry.unregister(id).is_some() {
                debug!(component = %id, "detached after delay");
            }
        })
    }

    /// [`unregister_after`](Self::unregister_after) with the configured detach delay.
    ///
    /// # Panics
    ///
    /// Panics when called outside a Tokio runtime.
    pub fn detach(self: &Arc<Self>, id: ComponentId) -> ScheduledTask {
        self.unregister_after(id, self.config.detach_delay())
    }
}
