// Copyright 2025 the Tactus Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dispatch pool: serial lanes over a shared surface.
//!
//! Events are partitioned so that everything about one touch lands on one lane, in
//! submission order, while different touches proceed in parallel:
//!
//! - touch samples by `touch % lanes`;
//! - gestures by their lead touch, so a drag follows its finger's samples and a
//!   pair stays on one lane whichever order its touches are reported in;
//! - pen samples, handwriting and shapes by pen device.
//!
//! A pair's state lives on the lane of its lower touch id, which need not be the lane
//! of the other touch. When a touch dies, the other lanes are told so they can drop
//! any pair it was part of.
//!
//! Submitting never blocks. Each lane is a Tokio task owning one
//! [`Dispatcher`]; component callbacks with inline delivery run on that task.

use core::fmt;
use std::sync::Arc;

use tactus_gesture::types::{
    GestureInput, HandwritingResult, PenSample, ShapeResult, TouchId, TouchSample, TouchState,
};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use crate::context::SurfaceContext;
use crate::dispatcher::Dispatcher;
use crate::error::PoolError;

/// Any inbound event.
#[derive(Clone, Debug, PartialEq)]
pub enum InputEvent {
    /// Finger sample.
    Touch(TouchSample),
    /// Device-reported gesture.
    Gesture(GestureInput),
    /// Pen ink sample.
    Pen(PenSample),
    /// Handwriting recognition result.
    Handwriting(HandwritingResult),
    /// Shape recognition result.
    Shape(ShapeResult),
}

impl InputEvent {
    /// Key that decides the lane.
    pub fn partition_key(&self) -> u32 {
        match self {
            Self::Touch(s) => s.touch.0,
            Self::Gesture(g) => g.lead_touch().0,
            Self::Pen(p) => p.device.0,
            Self::Handwriting(h) => h.device.0,
            Self::Shape(s) => s.device.0,
        }
    }
}

impl From<TouchSample> for InputEvent {
    fn from(s: TouchSample) -> Self {
        Self::Touch(s)
    }
}

impl From<GestureInput> for InputEvent {
    fn from(g: GestureInput) -> Self {
        Self::Gesture(g)
    }
}

impl From<PenSample> for InputEvent {
    fn from(p: PenSample) -> Self {
        Self::Pen(p)
    }
}

impl From<HandwritingResult> for InputEvent {
    fn from(h: HandwritingResult) -> Self {
        Self::Handwriting(h)
    }
}

impl From<ShapeResult> for InputEvent {
    fn from(s: ShapeResult) -> Self {
        Self::Shape(s)
    }
}

enum LaneMsg {
    Event(InputEvent),
    Batch(Vec<TouchSample>),
    Ended(TouchId),
    Flush(oneshot::Sender<()>),
}

/// Serial dispatch lanes running on Tokio.
pub struct DispatchPool {
    ctx: Arc<SurfaceContext>,
    lanes: Vec<mpsc::UnboundedSender<LaneMsg>>,
    workers: Vec<JoinHandle<()>>,
}

impl fmt::Debug for DispatchPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchPool")
            .field("lanes", &self.lanes.len())
            .finish_non_exhaustive()
    }
}

impl DispatchPool {
    /// Spawn `ctx.config().lanes` lanes (at least one) on the current runtime.
    ///
    /// # Panics
    ///
    /// Panics when called outside a Tokio runtime.
    pub fn new(ctx: Arc<SurfaceContext>) -> Self {
        let count = ctx.config().lanes.max(1);
        let (lanes, workers) = (0..count)
            .map(|lane| {
                let (tx, mut rx) = mpsc::unbounded_channel::<LaneMsg>();
                let mut dispatcher = Dispatcher::new(Arc::clone(&ctx));
                let worker = tokio::spawn(async move {
                    while let Some(msg) = rx.recv().await {
                        match msg {
                            LaneMsg::Event(event) => {
                                let routed = dispatcher.handle(event);
                                trace!(lane, ?routed, "event routed");
                            }
                            LaneMsg::Batch(samples) => {
                                let routed = dispatcher.handle_batch(&samples);
                                trace!(lane, count = routed.len(), "batch routed");
                            }
                            LaneMsg::Ended(touch) => dispatcher.forget_pairs(touch),
                            LaneMsg::Flush(done) => {
                                let _ = done.send(());
                            }
                        }
                    }
                    debug!(lane, "dispatch lane stopped");
                });
                (tx, worker)
            })
            .unzip();
        debug!(lanes = count, "dispatch pool started");
        Self {
            ctx,
            lanes,
            workers,
        }
    }

    /// Shared surface context.
    pub fn context(&self) -> &Arc<SurfaceContext> {
        &self.ctx
    }

    /// Number of lanes.
    pub fn lanes(&self) -> usize {
        self.lanes.len()
    }

    /// Lane an event is routed to.
    pub fn lane_of(&self, event: &InputEvent) -> usize {
        lane_for(event.partition_key(), self.lanes.len())
    }

    fn send(&self, lane: usize, msg: LaneMsg) -> Result<(), PoolError> {
        self.lanes[lane]
            .send(msg)
            .map_err(|_| PoolError::LaneClosed { lane })
    }

    /// Queue one event on its lane.
    pub fn submit(&self, event: impl Into<InputEvent>) -> Result<(), PoolError> {
        let event = event.into();
        let lane = self.lane_of(&event);
        let ended = match &event {
            InputEvent::Touch(s) if s.state == TouchState::Dead => Some(s.touch),
            _ => None,
        };
        self.send(lane, LaneMsg::Event(event))?;
        if let Some(touch) = ended {
            self.announce_end(touch, lane)?;
        }
        Ok(())
    }

    /// Queue a device batch, split per lane with each lane's share kept in order.
    pub fn submit_batch(&self, samples: &[TouchSample]) -> Result<(), PoolError> {
        let mut split: Vec<Vec<TouchSample>> = vec![Vec::new(); self.lanes.len()];
        for s in samples {
            split[lane_for(s.touch.0, self.lanes.len())].push(*s);
        }
        for (lane, part) in split.into_iter().enumerate() {
            if !part.is_empty() {
                self.send(lane, LaneMsg::Batch(part))?;
            }
        }
        for s in samples.iter().filter(|s| s.state == TouchState::Dead) {
            self.announce_end(s.touch, lane_for(s.touch.0, self.lanes.len()))?;
        }
        Ok(())
    }

    /// Tell every lane but `home` that `touch` is gone.
    fn announce_end(&self, touch: TouchId, home: usize) -> Result<(), PoolError> {
        for lane in (0..self.lanes.len()).filter(|&l| l != home) {
            self.send(lane, LaneMsg::Ended(touch))?;
        }
        Ok(())
    }

    /// Wait until every lane has processed everything submitted before this call.
    pub async fn flush(&self) -> Result<(), PoolError> {
        let mut pending = Vec::with_capacity(self.lanes.len());
        for lane in 0..self.lanes.len() {
            let (tx, rx) = oneshot::channel();
            self.send(lane, LaneMsg::Flush(tx))?;
            pending.push((lane, rx));
        }
        for (lane, rx) in pending {
            rx.await.map_err(|_| PoolError::LaneClosed { lane })?;
        }
        Ok(())
    }

    /// Close every lane after its queued events and wait for the lanes to stop.
    pub async fn shutdown(self) {
        drop(self.lanes);
        for (lane, worker) in self.workers.into_iter().enumerate() {
            if let Err(e) = worker.await {
                warn!(lane, error = %e, "dispatch lane failed");
            }
        }
    }
}

fn lane_for(key: u32, lanes: usize) -> usize {
    // `u32` always fits in `usize` on supported targets.
    usize::try_from(key).unwrap_or(usize::MAX) % lanes.max(1)
}
