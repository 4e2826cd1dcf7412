// Copyright 2025 the Tactus Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::sync::Arc;

use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use kurbo::{Point, Rect, Size};
use tactus_gesture::types::TouchSample;
use tactus_responder::Component;
use tactus_responder::config::DispatchConfig;
use tactus_responder::context::SurfaceContext;
use tactus_responder::dispatcher::Dispatcher;

#[derive(Debug)]
struct Tile(Rect);

impl Component for Tile {
    fn bounds_contains(&self, point: Point) -> bool {
        self.0.contains(point)
    }

    fn display_size(&self) -> Size {
        Size::new(1920.0, 1080.0)
    }
}

/// `n`×`n` tiles covering the display, plus one full-screen backdrop at the bottom.
fn gen_surface(n: usize) -> Arc<SurfaceContext> {
    let ctx = SurfaceContext::new(DispatchConfig {
        pen_palm_rejection_ms: 0,
        ..DispatchConfig::default()
    })
    .unwrap();
    ctx.registry()
        .register(Arc::new(Tile(Rect::new(0.0, 0.0, 1920.0, 1080.0))));
    let (w, h) = (1920.0 / n as f64, 1080.0 / n as f64);
    for y in 0..n {
        for x in 0..n {
            let r = Rect::new(x as f64 * w, y as f64 * h, (x + 1) as f64 * w, (y + 1) as f64 * h);
            ctx.registry().register(Arc::new(Tile(r)));
        }
    }
    ctx
}

#[derive(Clone)]
struct Rng(u64);

impl Rng {
    fn next_f64(&mut self) -> f64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        ((x >> 11) as f64) / ((1_u64 << 53) as f64)
    }
}

fn gen_strokes(count: u32, len: usize) -> Vec<TouchSample> {
    let mut rng = Rng(0xCAFE_F00D_DEAD_BEEF);
    let mut out = Vec::with_capacity(count as usize * (len + 2));
    for touch in 0..count {
        let (x, y) = (rng.next_f64() * 0.9, rng.next_f64() * 0.9);
        out.push(TouchSample::birth(touch, x, y));
        for i in 0..len {
            let d = i as f64 * 0.001;
            out.push(TouchSample::living(touch, x + d, y + d));
        }
        out.push(TouchSample::dead(touch, x, y));
    }
    out
}

fn bench_birth(c: &mut Criterion) {
    let mut group = c.benchmark_group("birth");
    for &n in &[4_usize, 16, 32] {
        let ctx = gen_surface(n);
        let births: Vec<_> = gen_strokes(64, 0)
            .into_iter()
            .filter(|s| s.state == tactus_gesture::types::TouchState::Birth)
            .collect();
        group.throughput(Throughput::Elements(births.len() as u64));
        group.bench_function(format!("claim_release_n{}", n * n), |b| {
            b.iter_batched(
                || Dispatcher::new(Arc::clone(&ctx)),
                |mut lane| {
                    for s in &births {
                        black_box(lane.handle_sample(*s));
                        ctx.arbiter().release(s.touch);
                    }
                },
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

fn bench_strokes(c: &mut Criterion) {
    let mut group = c.benchmark_group("strokes");
    let ctx = gen_surface(16);
    for &len in &[8_usize, 64, 256] {
        let samples = gen_strokes(16, len);
        group.throughput(Throughput::Elements(samples.len() as u64));
        group.bench_function(format!("lifecycle_len{len}"), |b| {
            b.iter_batched(
                || Dispatcher::new(Arc::clone(&ctx)),
                |mut lane| black_box(lane.handle_batch(&samples)),
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

criterion_group!(benches, bench_birth, bench_strokes);
criterion_main!(benches);
