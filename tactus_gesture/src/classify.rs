// Copyright 2025 the Tactus Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Gesture classification: re-derive pan, zoom, rotate and drag from raw samples.
//!
//! ## Overview
//!
//! The device layer reports two-finger gestures already labelled, but its scalars
//! are not trusted. The free functions here recompute them from touch positions,
//! and [`Classifier`] keeps the begin state each gesture is measured against.
//!
//! ## Surface space
//!
//! Thresholds are physical: positions are scaled by [`Thresholds::surface`] before
//! a distance or an angle is measured, so a pinch of 100 units means the same thing
//! on every axis regardless of the surface's aspect ratio.
//!
//! ## Rejections
//!
//! A pair whose separation does not exceed [`Thresholds::min_zoom_distance`] is not
//! promoted to a zoom for that update, and a twist smaller than
//! [`Thresholds::min_rotation`] is not promoted to a rotation. The pure [`zoom`] and
//! [`rotate`] report this as a [`Rejection`]. [`Classifier`] then reports the pair's
//! shared translation as a pan instead. Pan and drag have no threshold.

use alloc::collections::BTreeMap;
use alloc::vec::Vec;
use core::fmt;

use kurbo::{Point, Size, Vec2};

use crate::types::{
    DragEvent, GestureEvent, GestureInput, GesturePhase, PanEvent, RotateEvent, TouchId,
    TouchSample, ZoomEvent, scale_point,
};

/// Geometric guards applied while classifying.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Thresholds {
    /// Physical size of the input surface.
    pub surface: Size,
    /// A pair must be strictly farther apart than this to zoom.
    pub min_zoom_distance: f64,
    /// A twist must be at least this many radians to rotate.
    pub min_rotation: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            surface: Size::new(1920.0, 1080.0),
            min_zoom_distance: 0.0,
            min_rotation: 0.0,
        }
    }
}

/// Why a gesture input was not promoted to an event.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Rejection {
    /// Touches too close to be a pinch.
    BelowZoomDistance {
        /// Measured separation in surface units.
        distance: f64,
        /// Configured minimum.
        min: f64,
    },
    /// Twist too small to be a rotation.
    BelowRotation {
        /// Measured angle in radians.
        angle: f64,
        /// Configured minimum.
        min: f64,
    },
    /// Both halves of a pair name the same touch.
    SameTouch(TouchId),
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BelowZoomDistance { distance, min } => {
                write!(f, "pinch distance {distance} does not exceed {min}")
            }
            Self::BelowRotation { angle, min } => {
                write!(f, "rotation {angle} rad is below {min} rad")
            }
            Self::SameTouch(t) => write!(f, "pair uses touch {t} twice"),
        }
    }
}

impl core::error::Error for Rejection {}

/// Euclidean distance between two normalized points, measured in surface space.
pub fn distance(a: Point, b: Point, surface: Size) -> f64 {
    scale_point(a, surface).distance(scale_point(b, surface))
}

/// Signed angle in radians that turns `from` onto `to`, in `(-π, π]`.
///
/// Positive is clockwise on screen (y grows downward). Zero if either vector is zero.
pub fn signed_angle(from: Vec2, to: Vec2) -> f64 {
    if from == Vec2::ZERO || to == Vec2::ZERO {
        return 0.0;
    }
    Vec2::new(from.dot(to), from.cross(to)).atan2()
}

/// Mean displacement of two touches between `begin` and `now`.
pub fn shared_translation(begin: [Point; 2], now: [Point; 2]) -> Vec2 {
    ((now[0] - begin[0]) + (now[1] - begin[1])) * 0.5
}

/// Classify a pinch against the separation measured when it began.
pub fn zoom(
    first: TouchSample,
    second: TouchSample,
    phase: GesturePhase,
    begin_distance: f64,
    thresholds: &Thresholds,
) -> Result<ZoomEvent, Rejection> {
    let d = distance(first.position, second.position, thresholds.surface);
    // NaN separations are never active.
    let active = d > thresholds.min_zoom_distance;
    if !active {
        return Err(Rejection::BelowZoomDistance {
            distance: d,
            min: thresholds.min_zoom_distance,
        });
    }
    let ratio = if begin_distance > 0.0 {
        d / begin_distance
    } else {
        1.0
    };
    Ok(ZoomEvent {
        first,
        second,
        phase,
        distance: d,
        ratio,
    })
}

/// Classify a twist against the surface-space vector joining the touches at begin.
pub fn rotate(
    first: TouchSample,
    second: TouchSample,
    phase: GesturePhase,
    begin_vector: Vec2,
    thresholds: &Thresholds,
) -> Result<RotateEvent, Rejection> {
    let now = pair_vector(first.position, second.position, thresholds.surface);
    let angle = signed_angle(begin_vector, now);
    if angle.abs() < thresholds.min_rotation {
        return Err(Rejection::BelowRotation {
            angle,
            min: thresholds.min_rotation,
        });
    }
    Ok(RotateEvent {
        first,
        second,
        phase,
        angle,
    })
}

/// Classify a two-finger translation against the positions at begin.
pub fn pan(
    first: TouchSample,
    second: TouchSample,
    phase: GesturePhase,
    begin: [Point; 2],
) -> PanEvent {
    PanEvent {
        first,
        second,
        phase,
        translation: shared_translation(begin, [first.position, second.position]),
    }
}

/// A drag of `touch` from `origin` to `current`.
pub fn drag(touch: TouchId, origin: Point, current: Point, phase: GesturePhase) -> DragEvent {
    DragEvent {
        touch,
        origin,
        translation: current - origin,
        phase,
    }
}

fn pair_vector(a: Point, b: Point, surface: Size) -> Vec2 {
    scale_point(b, surface) - scale_point(a, surface)
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd)]
enum PairKind {
    Pan,
    Zoom,
    Rotate,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd)]
struct PairKey {
    kind: PairKind,
    lo: TouchId,
    hi: TouchId,
}

impl PairKey {
    fn new(kind: PairKind, a: TouchId, b: TouchId) -> Self {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        Self { kind, lo, hi }
    }

    fn involves(&self, touch: TouchId) -> bool {
        self.lo == touch || self.hi == touch
    }
}

/// Positions of both touches when the pair began, keyed by touch.
#[derive(Copy, Clone, Debug)]
struct PairBegin {
    at: [(TouchId, Point); 2],
}

impl PairBegin {
    fn position_of(&self, touch: TouchId) -> Point {
        if self.at[0].0 == touch {
            self.at[0].1
        } else {
            self.at[1].1
        }
    }
}

#[derive(Copy, Clone, Debug)]
struct DragTrack {
    origin: Point,
    translation: Vec2,
}

/// Stateful classifier for one serial stream of gesture inputs.
///
/// Tracks where each pair and each drag began. Inputs for a gesture that was never
/// seen to begin are measured from their first appearance.
#[derive(Clone, Debug, Default)]
pub struct Classifier {
    thresholds: Thresholds,
    pairs: BTreeMap<PairKey, PairBegin>,
    drags: BTreeMap<TouchId, DragTrack>,
}

impl Classifier {
    /// Create a classifier with the given thresholds.
    pub fn new(thresholds: Thresholds) -> Self {
        Self {
            thresholds,
            pairs: BTreeMap::new(),
            drags: BTreeMap::new(),
        }
    }

    /// Thresholds in effect.
    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    /// Re-derive a device-reported gesture.
    ///
    /// A zoom or rotation below its threshold comes back as a [`GestureEvent::Pan`]
    /// measured from the same begin positions. Begin state is recorded whatever the
    /// outcome, so later updates are still measured from where the gesture started.
    /// An `End` input clears the state. Only a pair naming one touch twice is
    /// rejected.
    pub fn classify(&mut self, input: GestureInput) -> Result<GestureEvent, Rejection> {
        match input {
            GestureInput::Pan {
                first,
                second,
                phase,
            } => {
                let begin = self.pair_begin(PairKind::Pan, first, second, phase)?;
                let begin = [
                    begin.position_of(first.touch),
                    begin.position_of(second.touch),
                ];
                Ok(GestureEvent::Pan(pan(first, second, phase, begin)))
            }
            GestureInput::Zoom {
                first,
                second,
                phase,
            } => {
                let begin = self.pair_begin(PairKind::Zoom, first, second, phase)?;
                let at = [
                    begin.position_of(first.touch),
                    begin.position_of(second.touch),
                ];
                let begin_distance = distance(at[0], at[1], self.thresholds.surface);
                let event = match zoom(first, second, phase, begin_distance, &self.thresholds) {
                    Ok(event) => GestureEvent::Zoom(event),
                    Err(_) => GestureEvent::Pan(pan(first, second, phase, at)),
                };
                Ok(event)
            }
            GestureInput::Rotate {
                first,
                second,
                phase,
            } => {
                let begin = self.pair_begin(PairKind::Rotate, first, second, phase)?;
                let at = [
                    begin.position_of(first.touch),
                    begin.position_of(second.touch),
                ];
                let begin_vector = pair_vector(at[0], at[1], self.thresholds.surface);
                let event = match rotate(first, second, phase, begin_vector, &self.thresholds) {
                    Ok(event) => GestureEvent::Rotate(event),
                    Err(_) => GestureEvent::Pan(pan(first, second, phase, at)),
                };
                Ok(event)
            }
            GestureInput::Drag {
                touch,
                origin,
                translation,
                phase,
            } => {
                let current = origin + translation;
                let track = match phase {
                    GesturePhase::Begin => DragTrack {
                        origin,
                        translation: Vec2::ZERO,
                    },
                    _ => self.drags.get(&touch).copied().unwrap_or(DragTrack {
                        origin,
                        translation: Vec2::ZERO,
                    }),
                };
                let event = drag(touch, track.origin, current, phase);
                if phase == GesturePhase::End {
                    self.drags.remove(&touch);
                } else {
                    self.drags.insert(
                        touch,
                        DragTrack {
                            origin: track.origin,
                            translation: event.translation,
                        },
                    );
                }
                Ok(GestureEvent::Drag(event))
            }
        }
    }

    /// The touch died: forget its pairs and close an open drag.
    ///
    /// Returns the terminal drag carrying the last delta when the device never sent
    /// one.
    pub fn touch_ended(&mut self, touch: TouchId) -> Option<DragEvent> {
        self.pairs.retain(|k, _| !k.involves(touch));
        self.drags.remove(&touch).map(|track| DragEvent {
            touch,
            origin: track.origin,
            translation: track.translation,
            phase: GesturePhase::End,
        })
    }

    /// Drop every piece of state mentioning `touch` without synthesizing anything.
    pub fn forget(&mut self, touch: TouchId) {
        self.pairs.retain(|k, _| !k.involves(touch));
        self.drags.remove(&touch);
    }

    /// Drop pair state involving `touch`, leaving its drag alone.
    pub fn forget_pairs(&mut self, touch: TouchId) {
        self.pairs.retain(|k, _| !k.involves(touch));
    }

    /// Touches with an open drag.
    pub fn dragging(&self) -> Vec<TouchId> {
        self.drags.keys().copied().collect()
    }

    /// Whether any pair or drag state mentions `touch`.
    pub fn is_tracking(&self, touch: TouchId) -> bool {
        self.drags.contains_key(&touch) || self.pairs.keys().any(|k| k.involves(touch))
    }

    fn pair_begin(
        &mut self,
        kind: PairKind,
        first: TouchSample,
        second: TouchSample,
        phase: GesturePhase,
    ) -> Result<PairBegin, Rejection> {
        if first.touch == second.touch {
            return Err(Rejection::SameTouch(first.touch));
        }
        let key = PairKey::new(kind, first.touch, second.touch);
        let fresh = PairBegin {
            at: [
                (first.touch, first.position),
                (second.touch, second.position),
            ],
        };
        let begin = match phase {
            GesturePhase::Begin => {
                self.pairs.insert(key, fresh);
                fresh
            }
            GesturePhase::Update => *self.pairs.entry(key).or_insert(fresh),
            GesturePhase::End => self.pairs.remove(&key).unwrap_or(fresh),
        };
        Ok(begin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TouchState;
    use core::f64::consts::FRAC_PI_2;

    fn square(side: f64) -> Thresholds {
        Thresholds {
            surface: Size::new(side, side),
            ..Thresholds::default()
        }
    }

    fn live(id: u32, x: f64, y: f64) -> TouchSample {
        TouchSample::new(id, id, x, y, TouchState::Living)
    }

    #[test]
    fn distance_is_measured_in_surface_space() {
        let d = distance(
            Point::new(0.25, 0.5),
            Point::new(0.375, 0.5),
            Size::new(800.0, 400.0),
        );
        assert_eq!(d, 100.0);
    }

    #[test]
    fn zoom_below_minimum_is_rejected() {
        let th = Thresholds {
            min_zoom_distance: 150.0,
            ..square(800.0)
        };
        let r = zoom(
            live(1, 0.25, 0.5),
            live(2, 0.375, 0.5),
            GesturePhase::Update,
            100.0,
            &th,
        );
        assert_eq!(
            r,
            Err(Rejection::BelowZoomDistance {
                distance: 100.0,
                min: 150.0
            })
        );
    }

    #[test]
    fn zoom_above_minimum_reports_ratio() {
        let th = Thresholds {
            min_zoom_distance: 150.0,
            ..square(800.0)
        };
        let e = zoom(
            live(1, 0.25, 0.5),
            live(2, 0.5, 0.5),
            GesturePhase::Update,
            100.0,
            &th,
        )
        .unwrap();
        assert_eq!(e.distance, 200.0);
        assert_eq!(e.ratio, 2.0);
    }

    #[test]
    fn zoom_at_exact_minimum_is_not_active() {
        let th = Thresholds {
            min_zoom_distance: 200.0,
            ..square(800.0)
        };
        let r = zoom(
            live(1, 0.25, 0.5),
            live(2, 0.5, 0.5),
            GesturePhase::Begin,
            200.0,
            &th,
        );
        assert!(matches!(r, Err(Rejection::BelowZoomDistance { .. })));
    }

    #[test]
    fn signed_angle_quarter_turns() {
        let right = Vec2::new(1.0, 0.0);
        let down = Vec2::new(0.0, 1.0);
        assert_eq!(signed_angle(right, down), FRAC_PI_2);
        assert_eq!(signed_angle(down, right), -FRAC_PI_2);
        assert_eq!(signed_angle(Vec2::ZERO, down), 0.0);
    }

    #[test]
    fn shared_translation_is_mean_displacement() {
        let t = shared_translation(
            [Point::new(0.0, 0.0), Point::new(1.0, 0.0)],
            [Point::new(0.5, 0.25), Point::new(1.0, 0.25)],
        );
        assert_eq!(t, Vec2::new(0.25, 0.25));
    }

    #[test]
    fn classifier_measures_zoom_from_begin() {
        let mut c = Classifier::new(square(800.0));
        let begin = c
            .classify(GestureInput::Zoom {
                first: live(1, 0.25, 0.5),
                second: live(2, 0.375, 0.5),
                phase: GesturePhase::Begin,
            })
            .unwrap();
        let GestureEvent::Zoom(b) = begin else {
            panic!("expected zoom");
        };
        assert_eq!(b.ratio, 1.0);

        let upd = c
            .classify(GestureInput::Zoom {
                first: live(1, 0.125, 0.5),
                second: live(2, 0.375, 0.5),
                phase: GesturePhase::Update,
            })
            .unwrap();
        let GestureEvent::Zoom(u) = upd else {
            panic!("expected zoom");
        };
        assert_eq!(u.distance, 200.0);
        assert_eq!(u.ratio, 2.0);
        assert!(c.is_tracking(TouchId(1)));

        c.classify(GestureInput::Zoom {
            first: live(1, 0.125, 0.5),
            second: live(2, 0.375, 0.5),
            phase: GesturePhase::End,
        })
        .unwrap();
        assert!(!c.is_tracking(TouchId(1)));
    }

    #[test]
    fn rejected_begin_still_anchors_the_pair() {
        let th = Thresholds {
            min_zoom_distance: 150.0,
            ..square(800.0)
        };
        let mut c = Classifier::new(th);
        let r = c.classify(GestureInput::Zoom {
            first: live(1, 0.25, 0.5),
            second: live(2, 0.375, 0.5),
            phase: GesturePhase::Begin,
        });
        assert!(matches!(r, Ok(GestureEvent::Pan(_))), "{r:?}");
        let GestureEvent::Zoom(u) = c
            .classify(GestureInput::Zoom {
                first: live(1, 0.125, 0.5),
                second: live(2, 0.375, 0.5),
                phase: GesturePhase::Update,
            })
            .unwrap()
        else {
            panic!("expected zoom");
        };
        assert_eq!(u.ratio, 2.0);
    }

    #[test]
    fn rotation_is_relative_to_begin_vector() {
        let mut c = Classifier::new(square(800.0));
        c.classify(GestureInput::Rotate {
            first: live(1, 0.5, 0.5),
            second: live(2, 0.75, 0.5),
            phase: GesturePhase::Begin,
        })
        .unwrap();
        let GestureEvent::Rotate(r) = c
            .classify(GestureInput::Rotate {
                first: live(1, 0.5, 0.5),
                second: live(2, 0.5, 0.75),
                phase: GesturePhase::Update,
            })
            .unwrap()
        else {
            panic!("expected rotate");
        };
        assert_eq!(r.angle, FRAC_PI_2);
    }

    #[test]
    fn small_twist_moves_as_a_pan() {
        let th = Thresholds {
            min_rotation: 0.5,
            ..square(800.0)
        };
        let mut c = Classifier::new(th);
        let r = c.classify(GestureInput::Rotate {
            first: live(1, 0.5, 0.5),
            second: live(2, 0.75, 0.5),
            phase: GesturePhase::Begin,
        });
        assert!(matches!(r, Ok(GestureEvent::Pan(_))), "{r:?}");
        let GestureEvent::Pan(p) = c
            .classify(GestureInput::Rotate {
                first: live(1, 0.625, 0.5),
                second: live(2, 0.875, 0.5),
                phase: GesturePhase::Update,
            })
            .unwrap()
        else {
            panic!("expected pan");
        };
        assert_eq!(p.translation, Vec2::new(0.125, 0.0));
    }

    #[test]
    fn close_pair_moving_together_pans() {
        let th = Thresholds {
            min_zoom_distance: 150.0,
            ..square(800.0)
        };
        let mut c = Classifier::new(th);
        c.classify(GestureInput::Zoom {
            first: live(1, 0.25, 0.25),
            second: live(2, 0.375, 0.25),
            phase: GesturePhase::Begin,
        })
        .unwrap();
        let GestureEvent::Pan(p) = c
            .classify(GestureInput::Zoom {
                first: live(1, 0.25, 0.5),
                second: live(2, 0.375, 0.5),
                phase: GesturePhase::Update,
            })
            .unwrap()
        else {
            panic!("a pair under the zoom minimum must not zoom");
        };
        assert_eq!(p.translation, Vec2::new(0.0, 0.25));
        assert_eq!(p.phase, GesturePhase::Update);
    }

    #[test]
    fn pan_ignores_swapped_order() {
        let mut c = Classifier::new(square(800.0));
        c.classify(GestureInput::Pan {
            first: live(1, 0.25, 0.25),
            second: live(2, 0.5, 0.25),
            phase: GesturePhase::Begin,
        })
        .unwrap();
        let GestureEvent::Pan(p) = c
            .classify(GestureInput::Pan {
                first: live(2, 0.5, 0.5),
                second: live(1, 0.25, 0.5),
                phase: GesturePhase::Update,
            })
            .unwrap()
        else {
            panic!("expected pan");
        };
        assert_eq!(p.translation, Vec2::new(0.0, 0.25));
    }

    #[test]
    fn pair_with_one_touch_is_rejected() {
        let mut c = Classifier::default();
        let r = c.classify(GestureInput::Pan {
            first: live(3, 0.25, 0.25),
            second: live(3, 0.5, 0.25),
            phase: GesturePhase::Begin,
        });
        assert_eq!(r, Err(Rejection::SameTouch(TouchId(3))));
    }

    #[test]
    fn drag_uses_tracked_origin() {
        let mut c = Classifier::default();
        let t = TouchId(4);
        c.classify(GestureInput::Drag {
            touch: t,
            origin: Point::new(0.25, 0.25),
            translation: Vec2::ZERO,
            phase: GesturePhase::Begin,
        })
        .unwrap();
        // The device re-anchored its origin; the running delta stays relative to begin.
        let GestureEvent::Drag(d) = c
            .classify(GestureInput::Drag {
                touch: t,
                origin: Point::new(0.5, 0.25),
                translation: Vec2::new(0.125, 0.0),
                phase: GesturePhase::Update,
            })
            .unwrap()
        else {
            panic!("expected drag");
        };
        assert_eq!(d.origin, Point::new(0.25, 0.25));
        assert_eq!(d.translation, Vec2::new(0.375, 0.0));
        assert_eq!(c.dragging(), alloc::vec![t]);
    }

    #[test]
    fn touch_end_synthesizes_drag_end() {
        let mut c = Classifier::default();
        let t = TouchId(5);
        c.classify(GestureInput::Drag {
            touch: t,
            origin: Point::new(0.5, 0.5),
            translation: Vec2::new(0.25, 0.0),
            phase: GesturePhase::Update,
        })
        .unwrap();
        let end = c.touch_ended(t).unwrap();
        assert_eq!(end.phase, GesturePhase::End);
        assert_eq!(end.translation, Vec2::new(0.25, 0.0));
        assert!(c.touch_ended(t).is_none());
    }

    #[test]
    fn device_drag_end_leaves_nothing_to_synthesize() {
        let mut c = Classifier::default();
        let t = TouchId(6);
        for phase in [GesturePhase::Begin, GesturePhase::End] {
            c.classify(GestureInput::Drag {
                touch: t,
                origin: Point::new(0.5, 0.5),
                translation: Vec2::new(0.125, 0.0),
                phase,
            })
            .unwrap();
        }
        assert!(c.touch_ended(t).is_none());
    }

    #[test]
    fn forget_drops_pairs_of_a_touch() {
        let mut c = Classifier::default();
        c.classify(GestureInput::Pan {
            first: live(1, 0.25, 0.25),
            second: live(2, 0.5, 0.25),
            phase: GesturePhase::Begin,
        })
        .unwrap();
        c.forget(TouchId(2));
        assert!(!c.is_tracking(TouchId(1)));
    }

    #[test]
    fn forget_pairs_keeps_the_drag() {
        let mut c = Classifier::default();
        c.classify(GestureInput::Drag {
            touch: TouchId(1),
            origin: Point::new(0.25, 0.25),
            translation: Vec2::ZERO,
            phase: GesturePhase::Begin,
        })
        .unwrap();
        c.classify(GestureInput::Pan {
            first: live(2, 0.5, 0.25),
            second: live(1, 0.25, 0.25),
            phase: GesturePhase::Begin,
        })
        .unwrap();
        c.forget_pairs(TouchId(1));
        assert!(!c.is_tracking(TouchId(2)));
        assert_eq!(c.dragging(), alloc::vec![TouchId(1)]);
    }
}
