//! # Gate Benchmarks
//!
//! Throughput of the access gate reducer, page classification and the stage
//! calculator.
//!
//! Run with: `cargo bench -p hiloch-core`

use chrono::{Days, NaiveDate};
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use hiloch_core::{AccessGate, CountdownReport, GatePolicy, NavigationObservation};
use std::hint::black_box;

/// A navigation trace of `size` course visits, each a redirect burst
/// followed by a load.
fn create_trace(size: usize) -> Vec<NavigationObservation> {
    let mut trace = Vec::with_capacity(size * 4);
    for i in 0..size {
        let verdict = if i % 5 == 0 { "denied" } else { "granted" };
        let url = format!("https://hiloch100.co.il/course/{i}?mobileapp={verdict}");
        trace.push(NavigationObservation::load_start(url.clone()));
        trace.push(NavigationObservation::nav(format!(
            "https://hiloch100.co.il/course/{i}"
        )));
        trace.push(NavigationObservation::nav(url.clone()));
        trace.push(NavigationObservation::load_end(url));
    }
    trace
}

// =============================================================================
// BENCHMARKS
// =============================================================================

fn bench_gate_replay(c: &mut Criterion) {
    let mut group = c.benchmark_group("gate_replay");

    for size in [100, 1000, 10000].iter() {
        let trace = create_trace(*size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &trace, |b, trace| {
            b.iter(|| {
                let mut gate = AccessGate::default();
                for obs in trace {
                    gate.observe(obs);
                }
                black_box(gate.chrome_visible())
            });
        });
    }

    group.finish();
}

fn bench_classify(c: &mut Criterion) {
    let policy = GatePolicy::default();
    let urls = [
        "https://hiloch100.co.il/",
        "https://hiloch100.co.il/login?next=/course",
        "https://hiloch100.co.il/course/lesson-12?mobileapp=granted",
        "/course?mobileapp=denied",
    ];

    c.bench_function("classify", |b| {
        b.iter(|| {
            for url in &urls {
                black_box(policy.classify(black_box(url)));
                black_box(policy.verdict(black_box(url)));
            }
        });
    });
}

fn bench_countdown(c: &mut Criterion) {
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).expect("valid date");
    let days: Vec<NaiveDate> = (0..200)
        .filter_map(|n| start.checked_add_days(Days::new(n)))
        .collect();

    c.bench_function("countdown_200_days", |b| {
        b.iter(|| {
            for today in &days {
                black_box(CountdownReport::evaluate(start, *today));
            }
        });
    });
}

criterion_group!(benches, bench_gate_replay, bench_classify, bench_countdown);
criterion_main!(benches);
