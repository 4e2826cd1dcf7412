// Copyright 2025 the Tactus Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Event dispatcher: one serial lane of the input core.
//!
//! ## Overview
//!
//! A [`Dispatcher`] takes raw input for the touches partitioned to it, consults the
//! shared [`LockArbiter`](crate::lock::LockArbiter) and registry snapshot, drives its
//! own [`Classifier`] and [`Escalator`], and finally invokes the matching capability
//! on exactly one component. Errors never leave it: every call returns a [`Routed`]
//! saying where the event went, or why it was dropped.
//!
//! ## Touches
//!
//! - Birth: offered to components in dispatch order (always-on-top first, then
//!   nearest first). The first one that is touchable, contains the point, and accepts
//!   the touch claims it; lower components never see it. A Birth whose group is
//!   already owned goes straight to the group owner.
//! - Living: goes to the owner only, without hit testing, so a held touch may wander
//!   outside its component. Feeds the escalator.
//! - Dead: releases the lock, closes any open drag, evaluates the escalator, and tells
//!   the owner.
//!
//! Lock and escalator transitions always complete before the component is called,
//! which matters for components with queued delivery.
//!
//! ## Gestures
//!
//! Gestures run downstream of ownership: a gesture reaches a component only if it owns
//! every contributing touch and, except for a terminal report, its bounds contain every
//! contributing position.
//!
//! ## Pen
//!
//! Pen input bypasses the arbiter. Pen Down binds the device to the nearest drawable
//! component under the tip without drawing; Move draws and Up ends the stroke, both
//! following the binding. Any pen activity also opens the palm rejection window of the
//! surface, during which new touches are ignored.
//!
//! Handwriting goes to the nearest drawable component under the center of the strokes.
//! Recognized shapes go to the nearest drawable component containing any of their
//! points.

use std::collections::HashMap;
use std::sync::Arc;

use kurbo::Point;
use tactus_gesture::classify::Classifier;
use tactus_gesture::escalate::{Escalator, Finish};
use tactus_gesture::types::{
    DragEvent, GestureEvent, GestureInput, GesturePhase, HandwritingResult, PenDevice, PenPhase,
    PenSample, ShapeResult, TouchId, TouchSample, TouchState,
};
use tracing::{debug, trace, warn};

use crate::component::ComponentFlags;
use crate::context::SurfaceContext;
use crate::lock::ClaimError;
use crate::pool::InputEvent;
use crate::registry::{ComponentHandle, Snapshot};
use crate::types::{ComponentId, DropReason, Routed};

/// One serial dispatch lane.
#[derive(Debug)]
pub struct Dispatcher {
    ctx: Arc<SurfaceContext>,
    classifier: Classifier,
    escalator: Escalator<ComponentId>,
    pens: HashMap<PenDevice, ComponentId>,
}

impl Dispatcher {
    /// Create a lane over `ctx`.
    pub fn new(ctx: Arc<SurfaceContext>) -> Self {
        let classifier = Classifier::new(ctx.config().thresholds());
        let escalator = Escalator::new(ctx.config().escalation());
        Self {
            ctx,
            classifier,
            escalator,
            pens: HashMap::new(),
        }
    }

    /// Shared surface context.
    pub fn context(&self) -> &Arc<SurfaceContext> {
        &self.ctx
    }

    /// Escalation state of this lane.
    pub fn escalator(&self) -> &Escalator<ComponentId> {
        &self.escalator
    }

    /// Component the pen is bound to.
    pub fn pen_binding(&self, device: PenDevice) -> Option<ComponentId> {
        self.pens.get(&device).copied()
    }

    /// Route any input event.
    pub fn handle(&mut self, event: InputEvent) -> Routed {
        match event {
            InputEvent::Touch(s) => self.handle_sample(s),
            InputEvent::Gesture(g) => self.handle_gesture(g),
            InputEvent::Pen(p) => self.handle_pen(p),
            InputEvent::Handwriting(h) => self.handle_handwriting(&h),
            InputEvent::Shape(s) => self.handle_shape(&s),
        }
    }

    /// Drop pair state involving a touch whose samples are handled on another lane.
    pub fn forget_pairs(&mut self, touch: TouchId) {
        self.classifier.forget_pairs(touch);
    }

    /// Route a batch of touch samples in order.
    pub fn handle_batch(&mut self, samples: &[TouchSample]) -> Vec<Routed> {
        samples.iter().map(|s| self.handle_sample(*s)).collect()
    }

    /// Route one touch sample.
    pub fn handle_sample(&mut self, sample: TouchSample) -> Routed {
        // A Dead is never suppressed: it is what releases the lock.
        if sample.state != TouchState::Dead && self.ctx.pen_gate().is_active() {
            debug!(touch = %sample.touch, state = ?sample.state, "pen active; touch ignored");
            return Routed::Dropped(DropReason::PalmRejected);
        }
        match sample.state {
            TouchState::Birth => self.birth(sample),
            TouchState::Living => self.living(sample),
            TouchState::Dead => self.dead(sample),
        }
    }

    fn birth(&mut self, sample: TouchSample) -> Routed {
        let touch = sample.touch;
        // Identifiers are recycled by devices; nothing from an earlier touch survives.
        self.classifier.forget(touch);
        self.escalator.discard(touch);

        let snapshot = self.ctx.registry().snapshot();
        if let Some(owner) = self.ctx.arbiter().group_owner(sample.group) {
            let Some(h) = snapshot.get(owner) else {
                debug!(
                    touch = %touch,
                    group = %sample.group,
                    component = %owner,
                    "group owner is gone"
                );
                return Routed::Dropped(DropReason::OwnerGone);
            };
            let Some(local) = h.localizer().map(|l| l.point(sample.position)) else {
                warn!(
                    touch = %touch,
                    component = %owner,
                    "group owner has an unusable display size"
                );
                return Routed::Dropped(DropReason::Unmappable);
            };
            return match self.claim(h, sample, local) {
                Ok(id) => Routed::Delivered(id),
                Err(e) => {
                    warn!(touch = %touch, group = %sample.group, error = %e, "group claim lost");
                    Routed::Dropped(DropReason::Claim(e))
                }
            };
        }

        for h in snapshot.in_dispatch_order() {
            if !h.flags().contains(ComponentFlags::TOUCHABLE) {
                continue;
            }
            let Some(local) = h.hit_test(sample.position) else {
                continue;
            };
            if !h.component().accepts_touch(touch, local) {
                trace!(touch = %touch, component = %h.id(), "touch refused");
                continue;
            }
            match self.claim(h, sample, local) {
                Ok(id) => return Routed::Delivered(id),
                // Unregistered since the snapshot was taken; the next one down may take it.
                Err(ClaimError::Unregistered(_)) => continue,
                Err(e) => {
                    warn!(
                        touch = %touch,
                        component = %h.id(),
                        error = %e,
                        "claim race; birth dropped"
                    );
                    return Routed::Dropped(DropReason::Claim(e));
                }
            }
        }
        debug!(touch = %touch, "birth hit no component");
        Routed::Dropped(DropReason::NoHit)
    }

    fn claim(
        &mut self,
        h: &ComponentHandle,
        sample: TouchSample,
        local: Point,
    ) -> Result<ComponentId, ClaimError> {
        let id = h.id();
        let touch = sample.touch;
        self.ctx.arbiter().try_claim(touch, sample.group, id)?;
        self.escalator.arm(touch, id);
        if h.flags().contains(ComponentFlags::RAISE_ON_TOUCH) {
            self.ctx.registry().raise(id);
        }
        trace!(touch = %touch, component = %id, "birth claimed");
        h.deliver(move |c| c.touch_birth(touch, local));
        Ok(id)
    }

    /// Registered owner of `touch`. Drops its accumulator when there is none.
    fn owned(&mut self, touch: TouchId, snapshot: &Snapshot) -> Result<ComponentId, DropReason> {
        let Some(owner) = self.ctx.arbiter().owner(touch) else {
            self.escalator.discard(touch);
            return Err(DropReason::Unowned);
        };
        if snapshot.get(owner).is_none() {
            self.escalator.discard(touch);
            return Err(DropReason::OwnerGone);
        }
        Ok(owner)
    }

    fn living(&mut self, sample: TouchSample) -> Routed {
        let touch = sample.touch;
        let snapshot = self.ctx.registry().snapshot();
        let owner = match self.owned(touch, &snapshot) {
            Ok(owner) => owner,
            Err(reason) => {
                debug!(touch = %touch, %reason, "living sample dropped");
                return Routed::Dropped(reason);
            }
        };
        let Some(h) = snapshot.get(owner) else {
            return Routed::Dropped(DropReason::OwnerGone);
        };
        let Some(local) = h.localizer().map(|l| l.point(sample.position)) else {
            warn!(touch = %touch, component = %owner, "owner has an unusable display size");
            return Routed::Dropped(DropReason::Unmappable);
        };
        if self.escalator.owner_of(touch) != Some(owner) {
            self.escalator.arm(touch, owner);
        }
        let tier = self.escalator.record(touch, sample.position);
        h.deliver(move |c| c.touch_alive(touch, local));
        if let Some(tier) = tier {
            trace!(touch = %touch, component = %owner, tier = tier.get(), "escalation tier");
            h.deliver(move |c| c.escalation_tier(touch, tier));
        }
        Routed::Delivered(owner)
    }

    fn dead(&mut self, sample: TouchSample) -> Routed {
        let touch = sample.touch;
        let drag_end = self.classifier.touch_ended(touch);
        let snapshot = self.ctx.registry().snapshot();
        let owner = match self.owned(touch, &snapshot) {
            Ok(owner) => owner,
            Err(reason) => {
                self.ctx.arbiter().release(touch);
                debug!(touch = %touch, %reason, "dead sample dropped");
                return Routed::Dropped(reason);
            }
        };
        let finish = if self.escalator.owner_of(touch) == Some(owner) {
            self.escalator.finish(touch)
        } else {
            self.escalator.discard(touch);
            Finish::Discarded
        };
        self.ctx.arbiter().release(touch);

        let Some(h) = snapshot.get(owner) else {
            return Routed::Dropped(DropReason::OwnerGone);
        };
        let Some(l) = h.localizer() else {
            warn!(touch = %touch, component = %owner, "owner has an unusable display size");
            return Routed::Dropped(DropReason::Unmappable);
        };
        let local = l.point(sample.position);
        h.deliver(move |c| c.touch_dead(touch, local));
        if let Some(DragEvent {
            origin,
            translation,
            ..
        }) = drag_end
        {
            let (origin, delta) = (l.point(origin), l.vec(translation));
            h.deliver(move |c| c.drag_end(touch, origin, delta));
        }
        match finish {
            Finish::Fired(gesture) => {
                debug!(
                    touch = %touch,
                    component = %owner,
                    samples = gesture.samples,
                    "sustained gesture"
                );
                h.deliver(move |c| c.sustained_gesture(touch, &gesture));
            }
            Finish::Abandoned { tier } => {
                trace!(
                    touch = %touch,
                    component = %owner,
                    tier = tier.get(),
                    "escalation abandoned"
                );
                h.deliver(move |c| c.escalation_abandoned(touch));
            }
            Finish::Discarded => {}
        }
        trace!(touch = %touch, component = %owner, "touch released");
        Routed::Delivered(owner)
    }

    /// Re-derive and route a device-reported gesture.
    pub fn handle_gesture(&mut self, input: GestureInput) -> Routed {
        let event = match self.classifier.classify(input) {
            Ok(event) => event,
            Err(rejection) => {
                trace!(touch = %input.lead_touch(), %rejection, "gesture rejected");
                return Routed::Dropped(DropReason::Rejected(rejection));
            }
        };
        let snapshot = self.ctx.registry().snapshot();
        let arbiter = self.ctx.arbiter();
        let mut owner = None;
        for touch in event.touch_ids() {
            match (arbiter.owner(touch), owner) {
                (None, _) => {
                    debug!(touch = %touch, "gesture touch has no owner; dropped");
                    return Routed::Dropped(DropReason::Unowned);
                }
                (Some(o), None) => owner = Some(o),
                (Some(o), Some(prev)) if o != prev => {
                    debug!(touch = %touch, "gesture touches have different owners; dropped");
                    return Routed::Dropped(DropReason::SplitOwnership);
                }
                (Some(_), Some(_)) => {}
            }
        }
        let Some(owner) = owner else {
            return Routed::Dropped(DropReason::Unowned);
        };
        let Some(h) = snapshot.get(owner) else {
            return Routed::Dropped(DropReason::OwnerGone);
        };
        if event.phase() != GesturePhase::End && !h.contains_all(&event.positions()) {
            trace!(component = %owner, "gesture outside owner bounds");
            return Routed::Dropped(DropReason::OutOfBounds);
        }
        let Some(l) = h.localizer() else {
            warn!(component = %owner, "owner has an unusable display size");
            return Routed::Dropped(DropReason::Unmappable);
        };
        match l.gesture(&event) {
            GestureEvent::Pan(e) => h.deliver(move |c| c.pan(&e)),
            GestureEvent::Zoom(e) => h.deliver(move |c| c.zoom(&e)),
            GestureEvent::Rotate(e) => h.deliver(move |c| c.rotate(&e)),
            GestureEvent::Drag(e) if e.phase == GesturePhase::End => {
                h.deliver(move |c| c.drag_end(e.touch, e.origin, e.translation));
            }
            GestureEvent::Drag(e) => h.deliver(move |c| c.drag(e.touch, e.origin, e.translation)),
        }
        Routed::Delivered(owner)
    }

    /// Route a pen sample.
    pub fn handle_pen(&mut self, sample: PenSample) -> Routed {
        self.ctx.pen_gate().note(&sample);
        let snapshot = self.ctx.registry().snapshot();
        let device = sample.device;
        if sample.phase == PenPhase::Down {
            let Some((h, _)) = topmost_drawable(&snapshot, sample.position) else {
                self.pens.remove(&device);
                debug!(pen = %device, "pen down on no drawable component");
                return Routed::Dropped(DropReason::NoDrawable);
            };
            // Down only binds; ink starts with the first Move.
            let id = h.id();
            self.pens.insert(device, id);
            trace!(pen = %device, component = %id, "pen bound");
            return Routed::Delivered(id);
        }

        let bound = if sample.is_pen_up() {
            self.pens.remove(&device)
        } else {
            self.pens.get(&device).copied()
        };
        let Some(id) = bound else {
            debug!(pen = %device, phase = ?sample.phase, "pen is not bound; dropped");
            return Routed::Dropped(DropReason::Unbound);
        };
        let Some(h) = snapshot.get(id) else {
            self.pens.remove(&device);
            return Routed::Dropped(DropReason::OwnerGone);
        };
        let Some(local) = h.localizer().map(|l| l.point(sample.position)) else {
            warn!(pen = %device, component = %id, "owner has an unusable display size");
            return Routed::Dropped(DropReason::Unmappable);
        };
        if sample.is_pen_up() {
            h.deliver(move |c| c.draw_end(local));
        } else {
            h.deliver(move |c| c.draw(local));
        }
        Routed::Delivered(id)
    }

    /// Route a handwriting recognition result.
    pub fn handle_handwriting(&mut self, result: &HandwritingResult) -> Routed {
        let snapshot = self.ctx.registry().snapshot();
        let Some((h, _)) = topmost_drawable(&snapshot, result.center) else {
            debug!(pen = %result.device, "handwriting on no drawable component");
            return Routed::Dropped(DropReason::NoDrawable);
        };
        let text = result.text.clone();
        h.deliver(move |c| c.handwriting(&text));
        Routed::Delivered(h.id())
    }

    /// Route recognized shapes to the nearest drawable component containing any of
    /// their points.
    pub fn handle_shape(&mut self, result: &ShapeResult) -> Routed {
        let snapshot = self.ctx.registry().snapshot();
        let hit = snapshot
            .in_dispatch_order()
            .filter(|h| h.flags().contains(ComponentFlags::DRAWABLE))
            .find(|h| h.contains_any(result.points()));
        let Some(h) = hit else {
            debug!(
                pen = %result.device,
                shapes = result.shapes.len(),
                "shapes on no drawable component"
            );
            return Routed::Dropped(DropReason::NoDrawable);
        };
        let Some(l) = h.localizer() else {
            warn!(component = %h.id(), "owner has an unusable display size");
            return Routed::Dropped(DropReason::Unmappable);
        };
        let local = l.shapes(result);
        h.deliver(move |c| c.shape(&local));
        Routed::Delivered(h.id())
    }

    /// Drop lane state that refers to components no longer registered.
    ///
    /// Stale state is also dropped lazily when its touch next shows up; this only
    /// reclaims it early. Returns how many entries were dropped.
    pub fn prune(&mut self) -> usize {
        let snapshot = self.ctx.registry().snapshot();
        let before = self.pens.len();
        self.pens.retain(|_, id| snapshot.get(*id).is_some());
        let pens = before - self.pens.len();
        let touches = self
            .escalator
            .discard_where(|id| snapshot.get(*id).is_none());
        pens + touches.len()
    }
}

fn topmost_drawable(snapshot: &Snapshot, position: Point) -> Option<(&ComponentHandle, Point)> {
    snapshot
        .in_dispatch_order()
        .filter(|h| h.flags().contains(ComponentFlags::DRAWABLE))
        .find_map(|h| h.hit_test(position).map(|local| (h, local)))
}
