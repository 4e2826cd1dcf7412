// Copyright 2025 the Tactus Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Sustained-gesture escalation: gate destructive actions behind long, deliberate motion.
//!
//! ## Overview
//!
//! Every claimed touch gets a [`GestureAccumulator`] that counts its Living samples
//! and keeps the path they trace. Crossing `k × T` samples (for `k` in `1..=5`)
//! reports a [`Tier`] once, which is meant to drive a progress indicator. When the
//! touch dies, [`evaluate`] decides whether the motion was long enough and traveled
//! far enough to count as a [`SustainedGesture`].
//!
//! The decision is a pure function of the sample count and the path; it does not
//! care which component owns the touch. The owner is carried along only so that a
//! component going away can drop its accumulators.

use alloc::collections::BTreeMap;
use alloc::vec::Vec;

use kurbo::{Point, Size, Vec2};

use crate::classify::signed_angle;
use crate::types::{TouchId, scale_point};

/// Number of escalation tiers.
pub const TIERS: u8 = 5;

/// Parameters of the escalation rule.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct EscalationConfig {
    /// Base sample threshold `T`. Tiers sit at `1×T` through `5×T`.
    pub threshold: u32,
    /// Minimum net travel from origin, required on both axes, in surface units.
    pub min_travel: f64,
    /// Physical size of the surface the travel is measured in.
    pub surface: Size,
}

impl Default for EscalationConfig {
    fn default() -> Self {
        Self {
            threshold: 3,
            min_travel: 0.0,
            surface: Size::new(1920.0, 1080.0),
        }
    }
}

impl EscalationConfig {
    fn base(&self) -> u32 {
        self.threshold.max(1)
    }
}

/// An escalation tier, `1..=TIERS`.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct Tier(u8);

impl Tier {
    /// Tier number `k`, if it is in `1..=TIERS`.
    pub fn new(k: u8) -> Option<Self> {
        (1..=TIERS).contains(&k).then_some(Self(k))
    }

    /// Tier number, `1..=TIERS`.
    pub fn get(self) -> u8 {
        self.0
    }

    /// Sample count at which this tier fires.
    pub fn samples(self, threshold: u32) -> u32 {
        u32::from(self.0) * threshold
    }

    fn bit(self) -> u8 {
        1 << (self.0 - 1)
    }
}

/// A completed sustained gesture.
#[derive(Clone, Debug, PartialEq)]
pub struct SustainedGesture {
    /// First recorded position (normalized).
    pub origin: Point,
    /// Last recorded position (normalized).
    pub end: Point,
    /// Number of Living samples recorded.
    pub samples: u32,
    /// Signed angle from screen-up to the surface-space displacement, in radians.
    pub angle: f64,
}

/// Outcome of a touch's accumulator when the touch dies.
#[derive(Clone, Debug, PartialEq)]
pub enum Finish {
    /// Long and far enough: fire the sustained action.
    Fired(SustainedGesture),
    /// Ordinary short touch; nothing to report.
    Discarded,
    /// Past the first tier but never completed.
    Abandoned {
        /// Highest tier reached.
        tier: Tier,
    },
}

/// Per-touch escalation state.
#[derive(Clone, Debug, PartialEq)]
pub struct GestureAccumulator<O> {
    sample_count: u32,
    path: Vec<Point>,
    origin_component: Option<O>,
    tiers_fired: u8,
}

impl<O> GestureAccumulator<O> {
    fn new(origin_component: Option<O>) -> Self {
        Self {
            sample_count: 0,
            path: Vec::new(),
            origin_component,
            tiers_fired: 0,
        }
    }

    /// Living samples recorded so far.
    pub fn sample_count(&self) -> u32 {
        self.sample_count
    }

    /// Recorded positions, origin first.
    pub fn path(&self) -> &[Point] {
        &self.path
    }

    /// First recorded position.
    pub fn origin(&self) -> Option<Point> {
        self.path.first().copied()
    }

    /// Component that owned the touch when it was armed.
    pub fn origin_component(&self) -> Option<&O> {
        self.origin_component.as_ref()
    }

    /// Whether `tier` has already been reported.
    pub fn has_fired(&self, tier: Tier) -> bool {
        self.tiers_fired & tier.bit() != 0
    }

    /// Highest tier reported, if any.
    pub fn highest_tier(&self) -> Option<Tier> {
        (1..=TIERS)
            .rev()
            .filter_map(Tier::new)
            .find(|t| self.has_fired(*t))
    }
}

/// The terminal rule.
///
/// `Fired` iff `sample_count > 5×T` and the net displacement from the first to the
/// last point of `path` reaches `min_travel` on both axes. `Discarded` iff
/// `sample_count <= T`. Anything else is `Abandoned` at the highest tier reached.
pub fn evaluate(sample_count: u32, path: &[Point], config: &EscalationConfig) -> Finish {
    let t = config.base();
    if sample_count <= t {
        return Finish::Discarded;
    }
    let reached = (sample_count / t).min(u32::from(TIERS));
    let tier = u8::try_from(reached).map_or(Tier(TIERS), Tier);
    let (Some(&origin), Some(&end)) = (path.first(), path.last()) else {
        return Finish::Abandoned { tier };
    };
    let travel = scale_point(end, config.surface) - scale_point(origin, config.surface);
    let far_enough = travel.x.abs() >= config.min_travel && travel.y.abs() >= config.min_travel;
    if sample_count > u32::from(TIERS) * t && far_enough {
        Finish::Fired(SustainedGesture {
            origin,
            end,
            samples: sample_count,
            angle: signed_angle(Vec2::new(0.0, -1.0), travel),
        })
    } else {
        Finish::Abandoned { tier }
    }
}

/// Accumulators for every live touch of one serial stream.
///
/// `O` identifies the owning component.
#[derive(Clone, Debug)]
pub struct Escalator<O> {
    config: EscalationConfig,
    live: BTreeMap<TouchId, GestureAccumulator<O>>,
}

impl<O> Default for Escalator<O> {
    fn default() -> Self {
        Self::new(EscalationConfig::default())
    }
}

impl<O> Escalator<O> {
    /// Create an escalator.
    pub fn new(config: EscalationConfig) -> Self {
        Self {
            config,
            live: BTreeMap::new(),
        }
    }

    /// Configuration in effect.
    pub fn config(&self) -> &EscalationConfig {
        &self.config
    }

    /// Start tracking `touch` for `owner`, replacing any stale state.
    pub fn arm(&mut self, touch: TouchId, owner: O) {
        self.live.insert(touch, GestureAccumulator::new(Some(owner)));
    }

    /// Record a Living sample. Returns the tier crossed by this sample, if any.
    ///
    /// A touch that was never armed starts an ownerless accumulator.
    pub fn record(&mut self, touch: TouchId, position: Point) -> Option<Tier> {
        let t = self.config.base();
        let acc = self
            .live
            .entry(touch)
            .or_insert_with(|| GestureAccumulator::new(None));
        acc.path.push(position);
        acc.sample_count = acc.sample_count.saturating_add(1);
        if acc.sample_count % t != 0 {
            return None;
        }
        let k = u8::try_from(acc.sample_count / t).ok()?;
        let tier = Tier::new(k)?;
        if acc.has_fired(tier) {
            return None;
        }
        acc.tiers_fired |= tier.bit();
        Some(tier)
    }

    /// The touch died: evaluate and drop its accumulator.
    ///
    /// An untracked touch finishes as [`Finish::Discarded`].
    pub fn finish(&mut self, touch: TouchId) -> Finish {
        match self.live.remove(&touch) {
            Some(acc) => evaluate(acc.sample_count, &acc.path, &self.config),
            None => Finish::Discarded,
        }
    }

    /// Drop the accumulator of `touch` without evaluating it.
    pub fn discard(&mut self, touch: TouchId) -> Option<GestureAccumulator<O>> {
        self.live.remove(&touch)
    }

    /// Accumulator of `touch`, if tracked.
    pub fn accumulator(&self, touch: TouchId) -> Option<&GestureAccumulator<O>> {
        self.live.get(&touch)
    }

    /// Number of tracked touches.
    pub fn len(&self) -> usize {
        self.live.len()
    }

    /// Whether no touch is tracked.
    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }
}

impl<O: PartialEq + Clone> Escalator<O> {
    /// Owner recorded when `touch` was armed.
    pub fn owner_of(&self, touch: TouchId) -> Option<O> {
        self.live
            .get(&touch)
            .and_then(|a| a.origin_component.clone())
    }

    /// Drop every accumulator armed for `owner`. Returns the affected touches.
    pub fn discard_owned_by(&mut self, owner: &O) -> Vec<TouchId> {
        self.discard_where(|o| o == owner)
    }
}

impl<O> Escalator<O> {
    /// Drop every accumulator whose owner matches `stale`. Ownerless ones are kept.
    ///
    /// Returns the affected touches in ascending order.
    pub fn discard_where(&mut self, mut stale: impl FnMut(&O) -> bool) -> Vec<TouchId> {
        let mut gone = Vec::new();
        self.live.retain(|t, a| match &a.origin_component {
            Some(o) if stale(o) => {
                gone.push(*t);
                false
            }
            _ => true,
        });
        gone
    }
}
