// Copyright 2025 the Tactus Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dispatch pool.
//!
//! Several producers feed touches into a pool of serial lanes. Each touch is handled
//! by one lane in order, so every panel sees Birth, then Living, then Dead. Halfway
//! through, a panel is detached with a grace period and its in-flight touches are
//! dropped once it leaves.
//!
//! Run:
//! - `RUST_LOG=debug cargo run -p tactus_demos --example lane_pool`

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use kurbo::{Point, Rect, Size};
use tactus_gesture::types::{TouchId, TouchSample};
use tactus_responder::Component;
use tactus_responder::config::DispatchConfig;
use tactus_responder::context::SurfaceContext;
use tactus_responder::pool::DispatchPool;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
struct Counter {
    bounds: Rect,
    births: AtomicUsize,
    moves: AtomicUsize,
    deaths: AtomicUsize,
}

impl Counter {
    fn new(bounds: Rect) -> Arc<Self> {
        Arc::new(Self {
            bounds,
            births: AtomicUsize::new(0),
            moves: AtomicUsize::new(0),
            deaths: AtomicUsize::new(0),
        })
    }
}

impl Component for Counter {
    fn bounds_contains(&self, point: Point) -> bool {
        self.bounds.contains(point)
    }

    fn display_size(&self) -> Size {
        Size::new(100.0, 100.0)
    }

    fn touch_birth(&self, _touch: TouchId, _point: Point) {
        self.births.fetch_add(1, Ordering::Relaxed);
    }

    fn touch_alive(&self, _touch: TouchId, _point: Point) {
        self.moves.fetch_add(1, Ordering::Relaxed);
    }

    fn touch_dead(&self, _touch: TouchId, _point: Point) {
        self.deaths.fetch_add(1, Ordering::Relaxed);
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let ctx = match SurfaceContext::new(DispatchConfig {
        lanes: 4,
        detach_delay_ms: 50,
        ..DispatchConfig::default()
    }) {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("bad config: {e}");
            return;
        }
    };
    let left = Counter::new(Rect::new(0.0, 0.0, 50.0, 100.0));
    let right = Counter::new(Rect::new(50.0, 0.0, 100.0, 100.0));
    ctx.registry().register(left.clone());
    let right_id = ctx.registry().register(right.clone());

    let pool = Arc::new(DispatchPool::new(Arc::clone(&ctx)));
    let producers: Vec<_> = (0..16_u32)
        .map(|touch| {
            let pool = Arc::clone(&pool);
            tokio::spawn(async move {
                let x = 0.03125 + f64::from(touch) / 16.0;
                let mut ok = pool.submit(TouchSample::birth(touch, x, 0.5)).is_ok();
                for step in 0..50_u32 {
                    let y = 0.5 + f64::from(step) * 0.005;
                    ok &= pool.submit(TouchSample::living(touch, x, y)).is_ok();
                    tokio::time::sleep(Duration::from_millis(2)).await;
                }
                ok &= pool.submit(TouchSample::dead(touch, x, 0.75)).is_ok();
                ok
            })
        })
        .collect();

    let detach = ctx.detach(right_id);

    for p in producers {
        match p.await {
            Ok(true) => {}
            Ok(false) => eprintln!("a lane closed early"),
            Err(e) => eprintln!("producer failed: {e}"),
        }
    }
    if let Err(e) = pool.flush().await {
        eprintln!("flush failed: {e}");
    }
    info!(detached = detach.join().await, "right panel detach finished");

    for (name, c) in [("left", &left), ("right", &right)] {
        println!(
            "{name:>5}: {} births, {} moves, {} deaths",
            c.births.load(Ordering::Relaxed),
            c.moves.load(Ordering::Relaxed),
            c.deaths.load(Ordering::Relaxed),
        );
    }
    println!("locks left: {}", ctx.arbiter().len());

    if let Some(pool) = Arc::into_inner(pool) {
        pool.shutdown().await;
    }
}
