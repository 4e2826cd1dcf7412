// Copyright 2025 the Tactus Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tactus Responder: arbitration and dispatch of multi-touch and pen input.
//!
//! ## Overview
//!
//! An interactive surface hosts many independent components: panels, clips, toolbars,
//! drawing boards. Several people touch it at once. This crate decides, for every
//! touch sample, gesture report and pen sample, which single component receives it.
//!
//! The crate does not talk to hardware. Feed it [`TouchSample`], [`GestureInput`],
//! [`PenSample`], [`HandwritingResult`] and [`ShapeResult`] values in device-normalized
//! coordinates (`[0, 1]` on both axes) and it calls back into the [`Component`] that
//! should see them, in that component's own display space.
//!
//! ## Ownership
//!
//! A touch is owned by at most one component, from its Birth to its Dead. The
//! [`LockArbiter`](crate::lock::LockArbiter) grants the first claim and refuses every
//! later one. Touches that share a group are owned together. Unregistering a component
//! force-releases its locks, and samples still in flight for those touches are dropped
//! instead of reaching the departed component.
//!
//! ## Selection
//!
//! At Birth, candidates are offered the touch in dispatch order:
//!
//! 1) components flagged [`ALWAYS_ON_TOP`](ComponentFlags::ALWAYS_ON_TOP), nearest first;
//! 2) all other components, nearest first.
//!
//! Nearness is decided by [`Stacking`](crate::registry::Stacking): a priority, then
//! registration or raise order. A component must be touchable, contain the point, and
//! accept the touch to claim it. Living and Dead samples skip hit testing and follow
//! the lock.
//!
//! ## Gestures and escalation
//!
//! Gesture reports from the device are re-derived and thresholded by
//! [`tactus_gesture::classify`], then delivered only when one component owns every
//! touch involved. Each owned touch also feeds a sustained-gesture accumulator
//! ([`tactus_gesture::escalate`]): the owner hears about each escalation tier as it is
//! reached, and about the sustained gesture itself when a long enough sweep ends.
//!
//! ## Concurrency
//!
//! [`Dispatcher`](crate::dispatcher::Dispatcher) is one serial lane.
//! [`DispatchPool`](crate::pool::DispatchPool) runs several lanes on Tokio and
//! partitions events so each touch is always handled by the same lane, in order.
//! Components that must not be called from a lane register with a
//! [`TaskQueue`](crate::task::TaskQueue) and receive their callbacks there.
//!
//! ## Example
//!
//! ```
//! # fn main() -> Result<(), tactus_responder::error::ConfigError> {
//! use std::sync::Arc;
//!
//! use kurbo::{Point, Rect, Size};
//! use tactus_gesture::types::TouchSample;
//! use tactus_responder::config::DispatchConfig;
//! use tactus_responder::context::SurfaceContext;
//! use tactus_responder::dispatcher::Dispatcher;
//! use tactus_responder::{Component, Routed};
//!
//! #[derive(Debug)]
//! struct Panel(Rect);
//!
//! impl Component for Panel {
//!     fn bounds_contains(&self, point: Point) -> bool {
//!         self.0.contains(point)
//!     }
//!     fn display_size(&self) -> Size {
//!         Size::new(800.0, 600.0)
//!     }
//! }
//!
//! let ctx = SurfaceContext::new(DispatchConfig::default())?;
//! let left = ctx.registry().register(Arc::new(Panel(Rect::new(0.0, 0.0, 400.0, 600.0))));
//! let mut lane = Dispatcher::new(Arc::clone(&ctx));
//!
//! let routed = lane.handle_sample(TouchSample::birth(1, 0.25, 0.5));
//! assert_eq!(routed, Routed::Delivered(left));
//! assert_eq!(ctx.arbiter().owner(tactus_gesture::types::TouchId(1)), Some(left));
//! # Ok(())
//! # }
//! ```
//!
//! [`TouchSample`]: tactus_gesture::types::TouchSample
//! [`GestureInput`]: tactus_gesture::types::GestureInput
//! [`PenSample`]: tactus_gesture::types::PenSample
//! [`HandwritingResult`]: tactus_gesture::types::HandwritingResult
//! [`ShapeResult`]: tactus_gesture::types::ShapeResult

pub mod component;
pub mod config;
pub mod context;
pub mod dispatcher;
pub mod error;
pub mod lock;
pub mod pool;
pub mod registry;
pub mod task;
pub mod types;

#[cfg(test)]
mod test_support;

pub use component::{Component, ComponentFlags};
pub use types::{ComponentId, DropReason, Routed};
