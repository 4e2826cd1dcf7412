// Copyright 2025 the Tactus Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Input data model: touch samples, gesture inputs and events, pen and recognizer output.
//!
//! ## Coordinates
//!
//! Every position carried by these types is device-normalized: `(0, 0)` is the
//! top-left corner of the surface and `(1, 1)` the bottom-right one. Use
//! [`GestureEvent::mapped`] (or scale by a component's display size yourself) to
//! move into a component's own coordinate space.

use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;
use core::fmt;

use kurbo::{Point, Size, Vec2};

/// Identifier of a single finger contact.
///
/// Unique only while the touch is live; devices recycle identifiers.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct TouchId(pub u32);

impl fmt::Display for TouchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t{}", self.0)
    }
}

/// Identifier of a logical interaction spanning one or more touches.
///
/// Devices that do not group touches report the touch id as the group id.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct GroupId(pub u32);

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "g{}", self.0)
    }
}

/// Lifecycle state of a touch sample.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum TouchState {
    /// Finger went down.
    Birth,
    /// Finger is still down (moved or held).
    Living,
    /// Finger went up.
    Dead,
}

/// One reported finger-contact state update.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TouchSample {
    /// Touch identifier.
    pub touch: TouchId,
    /// Logical group the touch belongs to.
    pub group: GroupId,
    /// Device-normalized position.
    pub position: Point,
    /// Lifecycle state.
    pub state: TouchState,
}

impl TouchSample {
    /// Create a sample with an explicit group.
    pub fn new(touch: u32, group: u32, x: f64, y: f64, state: TouchState) -> Self {
        Self {
            touch: TouchId(touch),
            group: GroupId(group),
            position: Point::new(x, y),
            state,
        }
    }

    /// A [`TouchState::Birth`] sample whose group is the touch itself.
    pub fn birth(touch: u32, x: f64, y: f64) -> Self {
        Self::new(touch, touch, x, y, TouchState::Birth)
    }

    /// A [`TouchState::Living`] sample whose group is the touch itself.
    pub fn living(touch: u32, x: f64, y: f64) -> Self {
        Self::new(touch, touch, x, y, TouchState::Living)
    }

    /// A [`TouchState::Dead`] sample whose group is the touch itself.
    pub fn dead(touch: u32, x: f64, y: f64) -> Self {
        Self::new(touch, touch, x, y, TouchState::Dead)
    }

    /// Same sample, with every coordinate scaled into a space of `size`.
    pub fn mapped(&self, size: Size) -> Self {
        Self {
            position: scale_point(self.position, size),
            ..*self
        }
    }
}

/// Phase of a multi-sample gesture.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum GesturePhase {
    /// First report of the gesture.
    Begin,
    /// Intermediate report.
    Update,
    /// Terminal report.
    End,
}

/// Two-finger translation.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PanEvent {
    /// First contributing touch.
    pub first: TouchSample,
    /// Second contributing touch.
    pub second: TouchSample,
    /// Gesture phase.
    pub phase: GesturePhase,
    /// Mean displacement of both touches since the gesture began.
    pub translation: Vec2,
}

/// Two-finger pinch.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ZoomEvent {
    /// First contributing touch.
    pub first: TouchSample,
    /// Second contributing touch.
    pub second: TouchSample,
    /// Gesture phase.
    pub phase: GesturePhase,
    /// Current separation of the touches, in surface units.
    pub distance: f64,
    /// Current separation divided by the separation at gesture begin.
    pub ratio: f64,
}

/// Two-finger twist.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RotateEvent {
    /// First contributing touch.
    pub first: TouchSample,
    /// Second contributing touch.
    pub second: TouchSample,
    /// Gesture phase.
    pub phase: GesturePhase,
    /// Signed angle in radians between the begin vector and the current vector.
    pub angle: f64,
}

/// Single-finger drag.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct DragEvent {
    /// Dragging touch.
    pub touch: TouchId,
    /// Position where the drag began.
    pub origin: Point,
    /// Running delta from `origin`.
    pub translation: Vec2,
    /// Gesture phase; `End` carries the final delta.
    pub phase: GesturePhase,
}

/// A classified gesture, ready for delivery.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum GestureEvent {
    /// See [`PanEvent`].
    Pan(PanEvent),
    /// See [`ZoomEvent`].
    Zoom(ZoomEvent),
    /// See [`RotateEvent`].
    Rotate(RotateEvent),
    /// See [`DragEvent`].
    Drag(DragEvent),
}

impl GestureEvent {
    /// Phase of the gesture.
    pub fn phase(&self) -> GesturePhase {
        match self {
            Self::Pan(e) => e.phase,
            Self::Zoom(e) => e.phase,
            Self::Rotate(e) => e.phase,
            Self::Drag(e) => e.phase,
        }
    }

    /// Identifiers of the contributing touches, lead touch first.
    pub fn touch_ids(&self) -> Vec<TouchId> {
        match self {
            Self::Pan(PanEvent { first, second, .. })
            | Self::Zoom(ZoomEvent { first, second, .. })
            | Self::Rotate(RotateEvent { first, second, .. }) => vec![first.touch, second.touch],
            Self::Drag(e) => vec![e.touch],
        }
    }

    /// Current positions of the contributing touches, lead touch first.
    ///
    /// For a drag this is `origin + translation`.
    pub fn positions(&self) -> Vec<Point> {
        match self {
            Self::Pan(PanEvent { first, second, .. })
            | Self::Zoom(ZoomEvent { first, second, .. })
            | Self::Rotate(RotateEvent { first, second, .. }) => {
                vec![first.position, second.position]
            }
            Self::Drag(e) => vec![e.origin + e.translation],
        }
    }

    /// Same event with positions and translations scaled into a space of `size`.
    ///
    /// Scalars that are independent of scale (`ratio`, `angle`) are kept.
    /// `distance` is kept as well: it is measured in surface units.
    pub fn mapped(&self, size: Size) -> Self {
        match *self {
            Self::Pan(e) => Self::Pan(PanEvent {
                first: e.first.mapped(size),
                second: e.second.mapped(size),
                translation: scale_vec(e.translation, size),
                ..e
            }),
            Self::Zoom(e) => Self::Zoom(ZoomEvent {
                first: e.first.mapped(size),
                second: e.second.mapped(size),
                ..e
            }),
            Self::Rotate(e) => Self::Rotate(RotateEvent {
                first: e.first.mapped(size),
                second: e.second.mapped(size),
                ..e
            }),
            Self::Drag(e) => Self::Drag(DragEvent {
                origin: scale_point(e.origin, size),
                translation: scale_vec(e.translation, size),
                ..e
            }),
        }
    }
}

/// A gesture as reported by the device layer, before re-validation.
///
/// The device pre-classifies two-finger gestures; the
/// [`Classifier`](crate::classify::Classifier) re-derives the scalars and
/// thresholds instead of trusting them.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum GestureInput {
    /// Device believes both touches translate together.
    Pan {
        /// First touch.
        first: TouchSample,
        /// Second touch.
        second: TouchSample,
        /// Phase reported by the device.
        phase: GesturePhase,
    },
    /// Device believes the touches pinch.
    Zoom {
        /// First touch.
        first: TouchSample,
        /// Second touch.
        second: TouchSample,
        /// Phase reported by the device.
        phase: GesturePhase,
    },
    /// Device believes the touches twist.
    Rotate {
        /// First touch.
        first: TouchSample,
        /// Second touch.
        second: TouchSample,
        /// Phase reported by the device.
        phase: GesturePhase,
    },
    /// Single-finger drag.
    Drag {
        /// Dragging touch.
        touch: TouchId,
        /// Origin reported by the device.
        origin: Point,
        /// Translation reported by the device.
        translation: Vec2,
        /// Phase reported by the device.
        phase: GesturePhase,
    },
}

impl GestureInput {
    /// The touch used to order this input with the touch samples of the same finger.
    ///
    /// For a pair this is the lower of the two ids, so a pair reported in either order
    /// has the same lead.
    pub fn lead_touch(&self) -> TouchId {
        match self {
            Self::Pan { first, second, .. }
            | Self::Zoom { first, second, .. }
            | Self::Rotate { first, second, .. } => first.touch.min(second.touch),
            Self::Drag { touch, .. } => *touch,
        }
    }
}

/// Identifier of a pen device.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct PenDevice(pub u32);

impl fmt::Display for PenDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pen{}", self.0)
    }
}

/// Pen contact phase.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum PenPhase {
    /// Tip touched the surface.
    Down,
    /// Tip moved while down.
    Move,
    /// Tip lifted.
    Up,
}

/// One pen ink sample.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PenSample {
    /// Reporting pen.
    pub device: PenDevice,
    /// Device-normalized position.
    pub position: Point,
    /// Tip pressure in `[0, 1]`.
    pub pressure: f32,
    /// Contact phase.
    pub phase: PenPhase,
}

impl PenSample {
    /// True for the sample that lifts the pen.
    pub fn is_pen_up(&self) -> bool {
        self.phase == PenPhase::Up
    }
}

/// Text recognized from a handwritten stroke set.
#[derive(Clone, Debug, PartialEq)]
pub struct HandwritingResult {
    /// Pen that wrote the strokes.
    pub device: PenDevice,
    /// Best recognition candidate.
    pub text: String,
    /// Device-normalized center of the strokes' bounding box.
    pub center: Point,
}

/// One shape recognized from a pen stroke set.
#[derive(Clone, Debug, PartialEq)]
pub struct Shape {
    /// Recognizer label, such as `"circle"` or `"line"`.
    pub name: String,
    /// Device-normalized outline points.
    pub points: Vec<Point>,
}

/// Shapes recognized from one stroke set.
#[derive(Clone, Debug, PartialEq)]
pub struct ShapeResult {
    /// Pen that drew the strokes.
    pub device: PenDevice,
    /// Every shape detected in the strokes.
    pub shapes: Vec<Shape>,
}

impl ShapeResult {
    /// Every outline point of every shape, in order.
    pub fn points(&self) -> impl Iterator<Item = Point> + '_ {
        self.shapes.iter().flat_map(|s| s.points.iter().copied())
    }

    /// The same result with points scaled from normalized units into `size`.
    pub fn mapped(&self, size: Size) -> Self {
        Self {
            device: self.device,
            shapes: self
                .shapes
                .iter()
                .map(|s| Shape {
                    name: s.name.clone(),
                    points: s.points.iter().map(|p| scale_point(*p, size)).collect(),
                })
                .collect(),
        }
    }
}

pub(crate) fn scale_point(p: Point, size: Size) -> Point {
    Point::new(p.x * size.width, p.y * size.height)
}

pub(crate) fn scale_vec(v: Vec2, size: Size) -> Vec2 {
    Vec2::new(v.x * size.width, v.y * size.height)
}
