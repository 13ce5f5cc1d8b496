//! Benchmarks for the swing analysis pipeline.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use swing_core::{Anthropometry, KinematicDeriver};
use swing_engine::{CapacityCalculator, EventDetector, SwingPipeline};

#[path = "../tests/common/mod.rs"]
mod common;

fn benchmark_pipeline(c: &mut Criterion) {
    let pipeline = SwingPipeline::default();
    let athlete = Anthropometry::new(72.0, 200.0, 75.0, 19.0, 31.0);

    let swing_30hz = common::capture(30.0, common::coiling_pelvis);
    let swing_240hz = common::capture(240.0, common::coiling_pelvis);

    c.bench_function("analyze_30hz", |b| {
        b.iter(|| pipeline.analyze(black_box(&swing_30hz), None))
    });

    c.bench_function("analyze_240hz", |b| {
        b.iter(|| pipeline.analyze(black_box(&swing_240hz), None))
    });

    c.bench_function("analyze_240hz_with_athlete", |b| {
        b.iter(|| pipeline.analyze(black_box(&swing_240hz), Some(&athlete)))
    });
}

fn benchmark_stages(c: &mut Criterion) {
    let deriver = KinematicDeriver::default();
    let detector = EventDetector::default();
    let frames = common::capture(240.0, common::coiling_pelvis);
    let series = match deriver.derive(&frames, None) {
        Ok(series) => series,
        Err(e) => panic!("synthetic swing failed to derive: {}", e),
    };

    c.bench_function("derive_240hz", |b| {
        b.iter(|| deriver.derive(black_box(&frames), None))
    });

    c.bench_function("detect_events_240hz", |b| {
        b.iter(|| detector.detect(black_box(&series)))
    });
}

fn benchmark_capacity(c: &mut Criterion) {
    let calculator = CapacityCalculator::default();
    let athlete = Anthropometry::new(71.5, 193.0, 74.0, 27.0, 32.0);

    c.bench_function("capacity_interpolated", |b| {
        b.iter(|| calculator.calculate(black_box(&athlete)))
    });
}

criterion_group!(benches, benchmark_pipeline, benchmark_stages, benchmark_capacity);
criterion_main!(benches);
