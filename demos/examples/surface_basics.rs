// Copyright 2025 the Tactus Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Surface basics.
//!
//! Two panels share a surface. A touch is claimed by the panel under its Birth and
//! keeps going there even after it wanders across to the other one. A pen stroke binds
//! to the drawing board it went down on.
//!
//! Run:
//! - `RUST_LOG=tactus_responder=trace cargo run -p tactus_demos --example surface_basics`

use std::sync::Arc;

use kurbo::{Point, Rect, Size};
use tactus_gesture::types::{PenDevice, PenPhase, PenSample, TouchId, TouchSample};
use tactus_responder::config::DispatchConfig;
use tactus_responder::context::SurfaceContext;
use tactus_responder::dispatcher::Dispatcher;
use tactus_responder::{Component, ComponentFlags};
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
struct Panel {
    name: &'static str,
    bounds: Rect,
    flags: ComponentFlags,
}

impl Component for Panel {
    fn bounds_contains(&self, point: Point) -> bool {
        self.bounds.contains(point)
    }

    fn display_size(&self) -> Size {
        Size::new(1920.0, 1080.0)
    }

    fn flags(&self) -> ComponentFlags {
        self.flags
    }

    fn touch_birth(&self, touch: TouchId, point: Point) {
        println!("{:>6}: {touch} born at {point:?}", self.name);
    }

    fn touch_alive(&self, touch: TouchId, point: Point) {
        println!("{:>6}: {touch} moved to {point:?}", self.name);
    }

    fn touch_dead(&self, touch: TouchId, point: Point) {
        println!("{:>6}: {touch} lifted at {point:?}", self.name);
    }

    fn draw(&self, point: Point) {
        println!("{:>6}: ink at {point:?}", self.name);
    }

    fn draw_end(&self, point: Point) {
        println!("{:>6}: stroke ends at {point:?}", self.name);
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let ctx = match SurfaceContext::new(DispatchConfig::default()) {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("bad config: {e}");
            return;
        }
    };
    let registry = ctx.registry();
    registry.register(Arc::new(Panel {
        name: "video",
        bounds: Rect::new(0.0, 0.0, 960.0, 1080.0),
        flags: ComponentFlags::TOUCHABLE,
    }));
    registry.register(Arc::new(Panel {
        name: "board",
        bounds: Rect::new(960.0, 0.0, 1920.0, 1080.0),
        flags: ComponentFlags::TOUCHABLE | ComponentFlags::DRAWABLE,
    }));

    let mut lane = Dispatcher::new(Arc::clone(&ctx));
    for sample in [
        TouchSample::birth(1, 0.25, 0.5),
        TouchSample::living(1, 0.5, 0.5),
        // Now over the board, but still owned by the video panel.
        TouchSample::living(1, 0.75, 0.5),
        TouchSample::dead(1, 0.75, 0.5),
    ] {
        let routed = lane.handle_sample(sample);
        println!("  -> {routed:?}");
    }

    for (x, phase) in [(0.6, PenPhase::Down), (0.7, PenPhase::Move), (0.7, PenPhase::Up)] {
        let routed = lane.handle_pen(PenSample {
            device: PenDevice(0),
            position: Point::new(x, 0.25),
            pressure: 0.8,
            phase,
        });
        println!("  -> {routed:?}");
    }

    // The pen was just active: a palm resting on the board is ignored.
    let routed = lane.handle_sample(TouchSample::birth(2, 0.8, 0.8));
    println!("palm: {routed:?}");
}
