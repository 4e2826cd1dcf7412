// Copyright 2025 the Tactus Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Task queues for handing callbacks to the thread that owns a component's state.
//!
//! A [`TaskQueue`] is the sending half; the owning thread keeps the [`TaskReceiver`]
//! and drains it, either from its own loop with [`TaskReceiver::run_pending`] or as an
//! async task with [`TaskReceiver::run`]. Tasks run in the order they were posted.
//!
//! [`ScheduledTask`] is a delayed action that can be cancelled until it fires.

use core::fmt;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::trace;

/// A unit of work posted to a queue.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Sending half of a task queue. Cheap to clone.
#[derive(Clone)]
pub struct TaskQueue {
    tx: mpsc::UnboundedSender<Task>,
}

impl fmt::Debug for TaskQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskQueue")
            .field("closed", &self.tx.is_closed())
            .finish_non_exhaustive()
    }
}

/// Receiving half of a task queue.
pub struct TaskReceiver {
    rx: mpsc::UnboundedReceiver<Task>,
}

impl fmt::Debug for TaskReceiver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskReceiver")
            .field("pending", &self.rx.len())
            .finish()
    }
}

impl TaskQueue {
    /// Create a queue and its receiver.
    pub fn new() -> (Self, TaskReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, TaskReceiver { rx })
    }

    /// Post a task. Returns `false` if the receiver is gone; the task is dropped.
    pub fn post(&self, task: impl FnOnce() + Send + 'static) -> bool {
        self.tx.send(Box::new(task)).is_ok()
    }

    /// Post `task` once `delay` has elapsed, unless cancelled first.
    ///
    /// # Panics
    ///
    /// Panics when called outside a Tokio runtime.
    pub fn post_after(
        &self,
        delay: Duration,
        task: impl FnOnce() + Send + 'static,
    ) -> ScheduledTask {
        let queue = self.clone();
        ScheduledTask::spawn(delay, move || {
            if !queue.post(task) {
                trace!("delayed task dropped: queue closed");
            }
        })
    }

    /// Whether the receiver is gone.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

impl TaskReceiver {
    /// Run every task already queued, without waiting. Returns how many ran.
    pub fn run_pending(&mut self) -> usize {
        let mut ran = 0;
        while let Ok(task) = self.rx.try_recv() {
            task();
            ran += 1;
        }
        ran
    }

    /// Wait for the next task and run it. Returns `false` once every sender is gone.
    pub async fn run_next(&mut self) -> bool {
        match self.rx.recv().await {
            Some(task) => {
                task();
                true
            }
            None => false,
        }
    }

    /// Run tasks until every sender is gone.
    pub async fn run(mut self) {
        while self.run_next().await {}
    }

    /// Number of queued tasks.
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    /// Whether nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

/// A delayed action that can be cancelled until it fires.
///
/// Dropping the handle does not cancel the action.
#[derive(Debug)]
pub struct ScheduledTask {
    cancel: CancellationToken,
    handle: JoinHandle<bool>,
}

impl ScheduledTask {
    /// Run `action` on the Tokio runtime after `delay`, unless cancelled first.
    ///
    /// # Panics
    ///
    /// Panics when called outside a Tokio runtime.
    pub fn spawn(delay: Duration, action: impl FnOnce() + Send + 'static) -> Self {
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let handle = tokio::spawn(async move {
            tokio::select! {
                biased;
                () = token.cancelled() => false,
                () = tokio::time::sleep(delay) => {
                    action();
                    true
                }
            }
        });
        Self { cancel, handle }
    }

    /// Cancel the action if it has not fired yet.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Whether [`cancel`](Self::cancel) was called.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// A token that cancels this action when cancelled.
    pub fn token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Whether the action fired or was cancelled.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait until the action fires or is cancelled. Returns `true` if it fired.
    pub async fn join(self) -> bool {
        self.handle.await.unwrap_or(false)
    }
}
