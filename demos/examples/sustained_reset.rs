// Copyright 2025 the Tactus Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Sustained gestures.
//!
//! A long diagonal sweep over the surface reports five escalation tiers and then,
//! when the finger lifts, the sustained gesture with its direction. A short wiggle
//! reaches a tier or two and is abandoned.
//!
//! Run:
//! - `cargo run -p tactus_demos --example sustained_reset`

use std::sync::Arc;

use kurbo::{Point, Size};
use tactus_gesture::escalate::{SustainedGesture, Tier};
use tactus_gesture::types::{TouchId, TouchSample};
use tactus_responder::Component;
use tactus_responder::config::DispatchConfig;
use tactus_responder::context::SurfaceContext;
use tactus_responder::dispatcher::Dispatcher;
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
struct Backdrop;

impl Component for Backdrop {
    fn bounds_contains(&self, _point: Point) -> bool {
        true
    }

    fn display_size(&self) -> Size {
        Size::new(1920.0, 1080.0)
    }

    fn escalation_tier(&self, touch: TouchId, tier: Tier) {
        println!("{touch}: tier {}", tier.get());
    }

    fn escalation_abandoned(&self, touch: TouchId) {
        println!("{touch}: abandoned");
    }

    fn sustained_gesture(&self, touch: TouchId, gesture: &SustainedGesture) {
        println!(
            "{touch}: sustained over {} samples, {:.0} degrees from up",
            gesture.samples,
            gesture.angle.to_degrees()
        );
    }
}

const CONFIG: &str = r#"
escalation_threshold = 30
min_travel = 100.0
"#;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let ctx = match DispatchConfig::from_toml_str(CONFIG).and_then(SurfaceContext::new) {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("bad config: {e}");
            return;
        }
    };
    ctx.registry().register(Arc::new(Backdrop));
    let mut lane = Dispatcher::new(Arc::clone(&ctx));

    lane.handle_sample(TouchSample::birth(1, 0.1, 0.1));
    for i in 1..=160_u32 {
        let t = 0.1 + f64::from(i) * 0.005;
        lane.handle_sample(TouchSample::living(1, t, t));
    }
    lane.handle_sample(TouchSample::dead(1, 0.9, 0.9));

    lane.handle_sample(TouchSample::birth(2, 0.5, 0.5));
    for i in 0..70_u32 {
        let x = if i % 2 == 0 { 0.5 } else { 0.51 };
        lane.handle_sample(TouchSample::living(2, x, 0.5));
    }
    lane.handle_sample(TouchSample::dead(2, 0.5, 0.5));
}
