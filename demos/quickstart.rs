//! Quickstart example demonstrating basic usage of epicurve.
//!
//! Run with: cargo run --example quickstart

use chrono::{Duration, NaiveDate};
use epicurve::core::{bin_events, BinConfig, Event};
use epicurve::fit::{fit, fit_range, FitConfig, GrowthRegime};
use epicurve::peak::{estimate_peak, find_peak, PeakConfig};
use epicurve::split::{find_optimal_split, SplitConfig};

fn main() {
    println!("=== epicurve Quickstart ===\n");

    // 1. Simulate a line list of onset dates
    let outbreak_start = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
    let weekly_pattern: [u64; 9] = [2, 4, 8, 16, 32, 16, 8, 4, 2];
    let wards = ["north", "south"];

    let mut events: Vec<Event> = Vec::new();
    for (week, &cases) in weekly_pattern.iter().enumerate() {
        for case in 0..cases {
            let onset = outbreak_start + Duration::days(7 * week as i64 + (case % 7) as i64);
            events.push(Event::new(onset).with_group(wards[(case % 2) as usize]));
        }
    }
    // A few records with no onset date, as real line lists have
    events.push(Event {
        date: None,
        group: Some("north".to_string()),
    });
    events.push(Event {
        date: None,
        group: None,
    });
    println!("Line list: {} case records", events.len());

    // 2. Bin onsets into weekly incidence
    println!("\n--- Weekly Incidence ---");
    let config = BinConfig::new().with_interval_days(7);
    let series = bin_events(&events, &config).unwrap();

    println!(
        "{} bins of {} days, {} to {}",
        series.n_bins(),
        series.interval_days(),
        series.first_date(),
        series.last_date()
    );
    println!(
        "{} cases kept, {} dropped for missing dates",
        series.total_count(),
        series.dropped().missing_date
    );

    let pooled = series.pool();
    println!("\n{:>12} {:>8}", "Week of", "Cases");
    println!("{:-<21}", "");
    for row in pooled.to_table() {
        println!("{:>12} {:>8}", row.bin_start.to_string(), row.count);
    }

    // 3. Fit a log-linear model to the growth phase
    println!("\n--- Growth Phase Fit (first 5 weeks) ---");
    let growth = fit_range(&pooled, 0..5, &FitConfig::default()).unwrap();

    println!("Growth rate:  {:.4} per day", growth.rate);
    println!(
        "95% interval: [{:.4}, {:.4}]",
        growth.rate_interval.0, growth.rate_interval.1
    );
    println!("R-squared:    {:.4}", growth.r_squared);
    if let GrowthRegime::Growth { doubling_days, .. } = growth.regime {
        println!("Doubling time: {:.1} days", doubling_days);
    }

    println!("\n{:>12} {:>10} {:>10} {:>10}", "Week of", "Lower", "Fit", "Upper");
    println!("{:-<45}", "");
    for prediction in &growth.predictions {
        println!(
            "{:>12} {:>10.1} {:>10.1} {:>10.1}",
            prediction.date.to_string(),
            prediction.lower,
            prediction.fit,
            prediction.upper
        );
    }

    // 4. Project the growth model two weeks past its window
    println!("\n--- Projection (2 weeks ahead) ---");
    for prediction in growth.project(2).unwrap() {
        println!(
            "Week of {}: {:.0} cases expected [{:.0}, {:.0}]",
            prediction.date, prediction.fit, prediction.lower, prediction.upper
        );
    }

    // 5. Locate the split between growth and decay
    println!("\n--- Optimal Split ---");
    let split = find_optimal_split(&pooled, &SplitConfig::default()).unwrap();

    println!(
        "Split at bin {} (week of {}), score {:.4}",
        split.split_bin, split.split_date, split.score
    );
    println!(
        "Before: rate {:+.4}/day, R² {:.4}",
        split.before.rate, split.before.r_squared
    );
    println!(
        "After:  rate {:+.4}/day, R² {:.4}",
        split.after.rate, split.after.r_squared
    );
    if let GrowthRegime::Decay { halving_days, .. } = split.after.regime {
        println!("Halving time after the peak: {:.1} days", halving_days);
    }

    // 6. Estimate the peak with a bootstrap interval
    println!("\n--- Peak Estimate ---");
    let peak = find_peak(&pooled).unwrap();
    println!(
        "Observed peak: week of {} with {} cases",
        peak.date, peak.count
    );

    let estimate = estimate_peak(&pooled, &PeakConfig::new(1000).with_seed(42)).unwrap();
    println!(
        "{}% bootstrap interval: {} to {}",
        (estimate.confidence * 100.0).round(),
        estimate.lower_date,
        estimate.upper_date
    );

    // 7. Whole-curve fit for contrast
    println!("\n--- Single Model over the Whole Curve ---");
    let whole = fit(&pooled, &FitConfig::default()).unwrap();
    println!(
        "R² {:.4} vs {:.4} on the growth phase alone; one exponential",
        whole.r_squared, growth.r_squared
    );
    println!("cannot describe a curve that rises and then falls.");

    println!("\n=== Quickstart Complete ===");
}
