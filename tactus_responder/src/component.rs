// Copyright 2025 the Tactus Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The capability set every interactive component implements.
//!
//! ## Overview
//!
//! A component is anything that occupies a region of the surface and may react to
//! touches, gestures, or pen input: a video, a search field, a clipboard, a button,
//! a drawing board. The dispatcher only ever talks to components through
//! [`Component`]; there is no base type to inherit from.
//!
//! ## Coordinates
//!
//! Every point handed to a component is in its own display space: the
//! device-normalized position scaled by [`Component::display_size`]. Bounds tests
//! use the same space.
//!
//! ## Threading
//!
//! Components are shared between dispatch lanes, so every method takes `&self` and
//! the trait requires `Send + Sync`. A component whose reactions must run on a
//! specific thread registers with [`Delivery::Queue`](crate::registry::Delivery::Queue)
//! and receives its callbacks through a [`TaskQueue`](crate::task::TaskQueue).
//!
//! Every event method defaults to a no-op.

use kurbo::{Point, Size, Vec2};
use tactus_gesture::escalate::{SustainedGesture, Tier};
use tactus_gesture::types::{PanEvent, RotateEvent, ShapeResult, TouchId, ZoomEvent};

bitflags::bitflags! {
    /// Capability and stacking flags of a component.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct ComponentFlags: u8 {
        /// Takes part in touch arbitration.
        const TOUCHABLE      = 1 << 0;
        /// Accepts pen ink and handwriting.
        const DRAWABLE       = 1 << 1;
        /// Offered every event before any component without this flag.
        const ALWAYS_ON_TOP  = 1 << 2;
        /// Brought to the front of its priority band when it claims a touch.
        const RAISE_ON_TOUCH = 1 << 3;
    }
}

impl Default for ComponentFlags {
    fn default() -> Self {
        Self::TOUCHABLE
    }
}

/// An interactive region of the surface.
pub trait Component: Send + Sync {
    /// Whether `point` (display space) lies inside the current interactive bounds.
    fn bounds_contains(&self, point: Point) -> bool;

    /// Size of the component's display coordinate space.
    ///
    /// A non-finite or non-positive size makes every hit test on the component miss.
    fn display_size(&self) -> Size;

    /// Capability flags.
    fn flags(&self) -> ComponentFlags {
        ComponentFlags::default()
    }

    /// Business rule consulted after a successful hit test on Birth.
    fn accepts_touch(&self, touch: TouchId, point: Point) -> bool {
        let _ = (touch, point);
        true
    }

    /// A claimed touch went down.
    fn touch_birth(&self, touch: TouchId, point: Point) {
        let _ = (touch, point);
    }

    /// A claimed touch moved or held.
    fn touch_alive(&self, touch: TouchId, point: Point) {
        let _ = (touch, point);
    }

    /// A claimed touch went up. The lock is already released.
    fn touch_dead(&self, touch: TouchId, point: Point) {
        let _ = (touch, point);
    }

    /// Running single-finger drag.
    fn drag(&self, touch: TouchId, origin: Point, delta: Vec2) {
        let _ = (touch, origin, delta);
    }

    /// Terminal drag carrying the final delta.
    fn drag_end(&self, touch: TouchId, origin: Point, delta: Vec2) {
        let _ = (touch, origin, delta);
    }

    /// Two-finger translation, in display space.
    fn pan(&self, event: &PanEvent) {
        let _ = event;
    }

    /// Two-finger pinch, in display space.
    fn zoom(&self, event: &ZoomEvent) {
        let _ = event;
    }

    /// Two-finger twist, in display space.
    fn rotate(&self, event: &RotateEvent) {
        let _ = event;
    }

    /// Recognized handwriting.
    fn handwriting(&self, text: &str) {
        let _ = text;
    }

    /// Recognized shapes, with every point in display space.
    fn shape(&self, result: &ShapeResult) {
        let _ = result;
    }

    /// Pen ink point.
    fn draw(&self, point: Point) {
        let _ = point;
    }

    /// Pen lifted.
    fn draw_end(&self, point: Point) {
        let _ = point;
    }

    /// An owned touch crossed an escalation tier.
    fn escalation_tier(&self, touch: TouchId, tier: Tier) {
        let _ = (touch, tier);
    }

    /// An owned touch died after reaching a tier without completing.
    fn escalation_abandoned(&self, touch: TouchId) {
        let _ = touch;
    }

    /// An owned touch completed a sustained gesture.
    fn sustained_gesture(&self, touch: TouchId, gesture: &SustainedGesture) {
        let _ = (touch, gesture);
    }
}
