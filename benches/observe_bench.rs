/// Aggregator benchmarks
///
/// Measures per-frame cost of `observe` across window lengths.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use sign_aggregator::{AggregatorConfig, FrameObservation, SignAggregator, DEFAULT_LABELS};

/// Classifier-like output peaking on `index`
fn generate_frame(index: usize) -> FrameObservation {
    let len = DEFAULT_LABELS.len();
    let mut confidences = vec![0.05 / (len - 1) as f32; len];
    confidences[index % len] = 0.95;
    FrameObservation::Present(confidences)
}

fn bench_observe_window_lengths(c: &mut Criterion) {
    let mut group = c.benchmark_group("observe");

    // Mostly-stable stream with occasional jitter to a neighbouring class
    let frames: Vec<FrameObservation> = (0..256)
        .map(|i| generate_frame(if i % 7 == 0 { 4 } else { 3 }))
        .collect();

    for &window_length in &[4usize, 8, 16, 32] {
        let config = AggregatorConfig {
            window_length,
            ..Default::default()
        };

        group.bench_with_input(
            BenchmarkId::new("window", window_length),
            &frames,
            |b, frames| {
                let mut aggregator = SignAggregator::with_config(config.clone()).unwrap();
                b.iter(|| {
                    for frame in frames {
                        let result = aggregator.observe(black_box(frame)).unwrap();
                        black_box(result);
                    }
                });
            },
        );
    }

    group.finish();
}

fn bench_presence_toggling(c: &mut Criterion) {
    let frames: Vec<FrameObservation> = (0..256)
        .map(|i| {
            if i % 16 == 15 {
                FrameObservation::Absent
            } else {
                generate_frame(i / 16)
            }
        })
        .collect();

    c.bench_function("observe_with_absent_frames", |b| {
        let mut aggregator = SignAggregator::new();
        b.iter(|| {
            for frame in &frames {
                black_box(aggregator.observe(black_box(frame)).unwrap());
            }
            aggregator.clear_sentence();
        });
    });
}

criterion_group!(benches, bench_observe_window_lengths, bench_presence_toggling);
criterion_main!(benches);
