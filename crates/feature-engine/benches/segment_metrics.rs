use chrono::{Duration, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use feature_engine::{shannon_entropy, SegmentMetricEngine};
use telemetry_loader::SignalFrame;
use track_map::{segment_lap, LapSample, TrackPoint};

fn synthetic_lap(count: usize) -> Vec<LapSample> {
    let start = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
    (0..count)
        .map(|i| {
            let t = i as f64 * 0.05;
            LapSample {
                signals: SignalFrame {
                    timestamp: start + Duration::milliseconds(50 * i as i64),
                    steering_angle: (t * 0.7).sin() * 0.4,
                    throttle: (t * 0.3).cos().abs(),
                    brake_pressure: (t * 0.2).sin().max(0.0),
                    lat_accel: (t * 0.7).sin() * 1.2,
                    long_accel: (t * 0.3).cos() * 0.8,
                    speed: 40.0,
                },
                track: TrackPoint {
                    distance: i as f64 * 2.0,
                    ..Default::default()
                },
            }
        })
        .collect()
}

fn bench_segment_metrics(c: &mut Criterion) {
    let lap = segment_lap(synthetic_lap(2_400), 60).unwrap();
    let engine = SegmentMetricEngine::default();
    c.bench_function("segment_metrics_60", |b| b.iter(|| engine.compute(black_box(&lap))));

    let steering: Vec<f64> = (0..400).map(|i| (i as f64 * 0.1).sin()).collect();
    c.bench_function("steering_entropy_400", |b| {
        b.iter(|| shannon_entropy(black_box(&steering), 20))
    });
}

criterion_group!(benches, bench_segment_metrics);
criterion_main!(benches);
