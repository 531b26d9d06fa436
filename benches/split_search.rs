//! Benchmarks for binning, model fitting, and the breakpoint search.

use chrono::{Duration, NaiveDate};
use epicurve::core::IncidenceSeries;
use epicurve::fit::{fit, FitConfig};
use epicurve::peak::{estimate_peak, PeakConfig};
use epicurve::split::{find_optimal_split, SplitConfig};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

fn origin() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
}

fn generate_line_list(n: usize) -> Vec<NaiveDate> {
    (0..n)
        .map(|i| origin() + Duration::days((i * 37 % 120) as i64))
        .collect()
}

fn weekly_series(counts: Vec<u64>) -> IncidenceSeries {
    let starts: Vec<NaiveDate> = (0..counts.len())
        .map(|i| origin() + Duration::days(7 * i as i64))
        .collect();
    IncidenceSeries::new(starts, 7, vec![counts], Vec::new()).unwrap()
}

fn generate_growth_series(bins: usize) -> IncidenceSeries {
    let counts = (0..bins)
        .map(|i| (10.0 * (0.01 * (7 * i) as f64).exp()).round() as u64)
        .collect();
    weekly_series(counts)
}

fn generate_two_phase_series(bins: usize) -> IncidenceSeries {
    let peak = bins / 2;
    let counts = (0..bins)
        .map(|i| {
            let distance = if i <= peak { peak - i } else { i - peak } as f64;
            (200.0 * (-0.35 * distance).exp()).round() as u64 + 1
        })
        .collect();
    weekly_series(counts)
}

fn bench_binning(c: &mut Criterion) {
    let mut group = c.benchmark_group("binning");

    for size in [500, 1000, 5000, 10000].iter() {
        let dates = generate_line_list(*size);

        group.bench_with_input(BenchmarkId::new("daily", size), size, |b, _| {
            b.iter(|| IncidenceSeries::from_dates(black_box(&dates), 1))
        });

        group.bench_with_input(BenchmarkId::new("weekly", size), size, |b, _| {
            b.iter(|| IncidenceSeries::from_dates(black_box(&dates), 7))
        });
    }

    group.finish();
}

fn bench_fitting(c: &mut Criterion) {
    let mut group = c.benchmark_group("growth_fit");
    let config = FitConfig::default();

    for bins in [20, 50, 100, 200].iter() {
        let series = generate_growth_series(*bins);

        group.bench_with_input(BenchmarkId::new("fit", bins), bins, |b, _| {
            b.iter(|| fit(black_box(&series), &config))
        });
    }

    group.finish();
}

fn bench_split_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("split_search");
    let config = SplitConfig::default();

    for bins in [20, 40, 60, 80].iter() {
        let series = generate_two_phase_series(*bins);

        group.bench_with_input(BenchmarkId::new("exhaustive", bins), bins, |b, _| {
            b.iter(|| find_optimal_split(black_box(&series), &config))
        });
    }

    group.finish();
}

fn bench_peak_bootstrap(c: &mut Criterion) {
    let mut group = c.benchmark_group("peak_bootstrap");

    let series = generate_two_phase_series(40);

    for samples in [100, 500, 1000].iter() {
        let config = PeakConfig::new(*samples).with_seed(7);

        group.bench_with_input(BenchmarkId::new("estimate", samples), samples, |b, _| {
            b.iter(|| estimate_peak(black_box(&series), &config))
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_binning,
    bench_fitting,
    bench_split_search,
    bench_peak_bootstrap
);
criterion_main!(benches);
