// Copyright 2025 the Tactus Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Core types for the responder: identifiers, localization, and routing outcomes.

use core::fmt;

use kurbo::{Point, Size, Vec2};
use tactus_gesture::classify::Rejection;
use tactus_gesture::types::{GestureEvent, ShapeResult, TouchSample};

use crate::lock::ClaimError;

/// Opaque identifier of a registered component.
///
/// Allocated by the [`Registry`](crate::registry::Registry) and never reused within a
/// process, so a stale id can never alias a newer component.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct ComponentId(u64);

impl ComponentId {
    pub(crate) const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw value, for logging and diagnostics.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "c{}", self.0)
    }
}

/// Device-normalized to display-space conversion for one component.
///
/// Built from [`Component::display_size`](crate::component::Component::display_size).
/// Construction fails for a size that is non-finite or not strictly positive, which
/// the dispatcher treats as "does not contain the point".
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Localizer {
    size: Size,
}

impl Localizer {
    /// Localizer for a display space of `size`, if the size is usable.
    pub fn new(size: Size) -> Option<Self> {
        let ok = size.width.is_finite()
            && size.height.is_finite()
            && size.width > 0.0
            && size.height > 0.0;
        ok.then_some(Self { size })
    }

    /// Display size.
    pub fn size(&self) -> Size {
        self.size
    }

    /// Map a normalized point.
    pub fn point(&self, p: Point) -> Point {
        Point::new(p.x * self.size.width, p.y * self.size.height)
    }

    /// Map a normalized displacement.
    pub fn vec(&self, v: Vec2) -> Vec2 {
        Vec2::new(v.x * self.size.width, v.y * self.size.height)
    }

    /// Map a touch sample.
    pub fn sample(&self, s: TouchSample) -> TouchSample {
        s.mapped(self.size)
    }

    /// Map a gesture event.
    pub fn gesture(&self, e: &GestureEvent) -> GestureEvent {
        e.mapped(self.size)
    }

    /// Map recognized shapes.
    pub fn shapes(&self, r: &ShapeResult) -> ShapeResult {
        r.mapped(self.size)
    }
}

/// Why an event reached no component.
#[derive(Clone, Debug, PartialEq)]
pub enum DropReason {
    /// Birth landed on no accepting component.
    NoHit,
    /// Living, Dead, or gesture for a touch nobody owns.
    Unowned,
    /// The owner recorded in the arbiter is no longer registered.
    OwnerGone,
    /// Touch ignored because a pen was active.
    PalmRejected,
    /// Claim refused by the arbiter.
    Claim(ClaimError),
    /// Gesture the classifier cannot measure, such as a pair naming one touch twice.
    Rejected(Rejection),
    /// Gesture touches are not all owned by one component.
    SplitOwnership,
    /// Gesture positions are not all inside the owner's bounds.
    OutOfBounds,
    /// The owner's display size is unusable, so the event cannot be localized.
    Unmappable,
    /// Pen Move or Up for a pen that is not bound to a component.
    Unbound,
    /// Pen Down, handwriting or shapes landed on no drawable component.
    NoDrawable,
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoHit => f.write_str("no accepting component under the touch"),
            Self::Unowned => f.write_str("touch has no owner"),
            Self::OwnerGone => f.write_str("owner is no longer registered"),
            Self::PalmRejected => f.write_str("pen is active"),
            Self::Claim(e) => write!(f, "claim refused: {e}"),
            Self::Rejected(r) => write!(f, "gesture rejected: {r}"),
            Self::SplitOwnership => f.write_str("gesture touches have different owners"),
            Self::OutOfBounds => f.write_str("gesture left the owner's bounds"),
            Self::Unmappable => f.write_str("owner has an unusable display size"),
            Self::Unbound => f.write_str("pen is not bound"),
            Self::NoDrawable => f.write_str("no drawable component under the pen"),
        }
    }
}

/// Result of routing one event.
#[derive(Clone, Debug, PartialEq)]
pub enum Routed {
    /// The event reached this component.
    Delivered(ComponentId),
    /// The event was dropped.
    Dropped(DropReason),
}

impl Routed {
    /// Receiving component, if delivered.
    pub fn target(&self) -> Option<ComponentId> {
        match self {
            Self::Delivered(id) => Some(*id),
            Self::Dropped(_) => None,
        }
    }

    /// Whether the event reached a component.
    pub fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered(_))
    }
}
