// Copyright 2025 the Tactus Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tactus Gesture: touch samples, gesture classification and sustained-gesture escalation.
//!
//! ## Overview
//!
//! This crate holds the pure half of a multi-touch input core. It knows nothing about
//! components, locks or threads; the `tactus_responder` crate drives it from one
//! serial dispatch lane per touch partition.
//!
//! - [`types`]: the input data model. Touch samples, device-reported gesture inputs,
//!   classified gesture events, pen samples and handwriting results.
//! - [`classify`]: re-derives pan, zoom, rotate and drag from raw positions and
//!   applies the geometric thresholds.
//! - [`escalate`]: per-touch accumulators that report escalation tiers and decide,
//!   when the touch dies, whether a sustained gesture happened.
//!
//! ## Example
//!
//! ```
//! use kurbo::Point;
//! use tactus_gesture::escalate::{EscalationConfig, Escalator, Finish};
//! use tactus_gesture::types::TouchId;
//!
//! let mut esc = Escalator::new(EscalationConfig { threshold: 2, ..Default::default() });
//! let touch = TouchId(1);
//! esc.arm(touch, "board");
//! for i in 0..11 {
//!     esc.record(touch, Point::new(0.1 + f64::from(i) * 0.05, 0.5));
//! }
//! assert!(matches!(esc.finish(touch), Finish::Fired(_)));
//! ```
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

pub mod classify;
pub mod escalate;
pub mod types;
