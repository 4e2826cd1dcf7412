// Copyright 2025 the Tactus Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use kurbo::{Point, Vec2};
use tactus_gesture::classify::{Classifier, Thresholds};
use tactus_gesture::escalate::{EscalationConfig, Escalator};
use tactus_gesture::types::{GestureInput, GesturePhase, TouchId, TouchSample};

fn bench_record(c: &mut Criterion) {
    let mut group = c.benchmark_group("escalator");
    for &threshold in &[3_u32, 30] {
        let config = EscalationConfig {
            threshold,
            ..EscalationConfig::default()
        };
        let count = threshold * 6;
        group.throughput(Throughput::Elements(u64::from(count)));
        group.bench_function(format!("record_finish_t{threshold}"), |b| {
            b.iter_batched(
                || Escalator::new(config),
                |mut esc| {
                    let touch = TouchId(1);
                    esc.arm(touch, 0_u32);
                    for i in 0..count {
                        let p = Point::new(0.1 + f64::from(i) * 0.001, 0.5);
                        black_box(esc.record(touch, p));
                    }
                    black_box(esc.finish(touch))
                },
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

fn bench_classify(c: &mut Criterion) {
    let mut group = c.benchmark_group("classifier");
    let steps = 128_u32;
    group.throughput(Throughput::Elements(u64::from(steps)));
    group.bench_function("zoom_stream", |b| {
        b.iter_batched(
            || Classifier::new(Thresholds::default()),
            |mut cls| {
                for i in 0..steps {
                    let phase = match i {
                        0 => GesturePhase::Begin,
                        _ if i + 1 == steps => GesturePhase::End,
                        _ => GesturePhase::Update,
                    };
                    let d = f64::from(i) * 0.001;
                    let _ = black_box(cls.classify(GestureInput::Zoom {
                        first: TouchSample::living(1, 0.4 - d, 0.5),
                        second: TouchSample::living(2, 0.6 + d, 0.5),
                        phase,
                    }));
                }
            },
            BatchSize::SmallInput,
        );
    });
    group.bench_function("drag_stream", |b| {
        b.iter_batched(
            || Classifier::new(Thresholds::default()),
            |mut cls| {
                for i in 0..steps {
                    let phase = if i == 0 {
                        GesturePhase::Begin
                    } else {
                        GesturePhase::Update
                    };
                    let _ = black_box(cls.classify(GestureInput::Drag {
                        touch: TouchId(1),
                        origin: Point::new(0.2, 0.2),
                        translation: Vec2::new(f64::from(i) * 0.001, 0.0),
                        phase,
                    }));
                }
                black_box(cls.touch_ended(TouchId(1)))
            },
            BatchSize::SmallInput,
        );
    });
    group.finish();
}

criterion_group!(benches, bench_record, bench_classify);
criterion_main!(benches);
