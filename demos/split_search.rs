//! Breakpoint search example: locating the growth-to-decay transition.
//!
//! Run with: cargo run --example split_search

use chrono::{Duration, NaiveDate};
use epicurve::core::IncidenceSeries;
use epicurve::fit::{fit, FitConfig};
use epicurve::split::{
    find_optimal_split, find_optimal_split_per_group, find_optimal_split_shared, fit_split,
    fit_split_date, SplitConfig,
};

fn weekly_series(counts: &[u64]) -> IncidenceSeries {
    weekly_grouped(vec![counts.to_vec()], Vec::new())
}

fn weekly_grouped(columns: Vec<Vec<u64>>, groups: Vec<String>) -> IncidenceSeries {
    let start = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
    let starts: Vec<NaiveDate> = (0..columns[0].len())
        .map(|i| start + Duration::days(7 * i as i64))
        .collect();
    IncidenceSeries::new(starts, 7, columns, groups).unwrap()
}

fn main() {
    println!("=== Breakpoint Search Example ===\n");

    println!("An epidemic curve rises exponentially, peaks, and falls.");
    println!("The split search finds the bin where one log-linear model");
    println!("should hand over to the next.\n");

    // 1. A curve with a known peak
    println!("--- Known Peak ---");

    let counts: Vec<u64> = vec![1, 2, 4, 8, 16, 32, 64, 128, 64, 32, 16, 8];
    let series = weekly_series(&counts);

    println!("Weekly counts: {:?}", counts);
    println!("Doubling to week 7, halving after. True split: bin 7\n");

    let whole = fit(&series, &FitConfig::default()).unwrap();
    println!(
        "One model over the whole curve: rate {:+.4}/day, R² {:.4}",
        whole.rate, whole.r_squared
    );
    println!("The low R² is the sign a single exponential is wrong here.");

    // 2. Score every candidate
    println!("\n--- Candidate Scores ---");

    let config = SplitConfig::default();
    println!(
        "{:<6} {:>12} {:>11} {:>11} {:>9}",
        "Bin", "Week of", "R² before", "R² after", "Score"
    );
    println!("{:-<52}", "");
    for bin in 1..=series.n_bins() - 2 {
        let candidate = fit_split(&series, bin, &config).unwrap();
        println!(
            "{:<6} {:>12} {:>11.4} {:>11.4} {:>9.4}",
            bin,
            candidate.split_date.to_string(),
            candidate.before.r_squared,
            candidate.after.r_squared,
            candidate.score
        );
    }

    let best = find_optimal_split(&series, &config).unwrap();
    println!(
        "\nBest split: bin {} (week of {}), score {:.4}",
        best.split_bin, best.split_date, best.score
    );
    println!(
        "Growth {:+.4}/day, decay {:+.4}/day",
        best.before.rate, best.after.rate
    );

    // 3. Effect of the minimum side width
    println!("\n--- Effect of min_side_bins ---");

    println!("{:<15} {:>12} {:>12}", "min_side_bins", "Candidates", "Split");
    println!("{:-<41}", "");
    for min_side in [2, 3, 4, 5] {
        let config = SplitConfig::new().with_min_side_bins(min_side);
        let candidates = series.n_bins() + 2 - 2 * min_side;
        match find_optimal_split(&series, &config) {
            Ok(split) => println!("{:<15} {:>12} {:>12}", min_side, candidates, split.split_bin),
            Err(e) => println!("{:<15} {:>12} {:>12}", min_side, candidates, e.to_string()),
        }
    }

    // 4. Imposing a split instead of searching
    println!("\n--- Explicit Split ---");

    let imposed = fit_split(&series, 5, &config).unwrap();
    println!(
        "Imposed bin 5: score {:.4} (search found {:.4} at bin {})",
        imposed.score, best.score, best.split_bin
    );

    let by_date = fit_split_date(&series, NaiveDate::from_ymd_opt(2024, 4, 25).unwrap(), &config)
        .unwrap();
    println!(
        "2024-04-25 falls in bin {} (week of {})",
        by_date.split_bin, by_date.split_date
    );

    // 5. Grouped series: independent split per group
    println!("\n--- Per-Group Splits ---");

    let north: Vec<u64> = vec![2, 8, 32, 128, 32, 8, 2, 1, 1];
    let south: Vec<u64> = vec![1, 1, 2, 8, 32, 128, 32, 8, 2];
    let sparse: Vec<u64> = vec![0, 0, 1, 0, 0, 0, 0, 0, 0];

    println!("north peaks in week 3, south in week 5, sparse has one case\n");

    let wards = weekly_grouped(
        vec![north.clone(), south.clone(), sparse],
        vec!["north".to_string(), "south".to_string(), "sparse".to_string()],
    );

    let per_group = find_optimal_split_per_group(&wards, &config).unwrap();
    for (group, split) in per_group.found() {
        println!(
            "{:<8} split at bin {} (week of {}), score {:.4}",
            group, split.split_bin, split.split_date, split.score
        );
    }
    for (group, error) in per_group.failures() {
        println!("{:<8} no split: {}", group, error);
    }

    // 6. One split shared by all groups
    println!("\n--- Shared Split ---");

    let two_wards = wards.slice_groups(&["north", "south"]).unwrap();
    let shared = find_optimal_split_shared(&two_wards, &config).unwrap();

    println!(
        "Shared split at bin {} (week of {}), score {:.4}",
        shared.split_bin, shared.split_date, shared.score
    );
    println!("Per-group rates at the shared bin:");
    for (group, model) in shared.before.models() {
        println!("  {:<8} growth {:+.4}/day", group, model.rate);
    }
    for (group, model) in shared.after.models() {
        println!("  {:<8} decay  {:+.4}/day", group, model.rate);
    }

    match find_optimal_split_shared(&wards, &config) {
        Ok(_) => println!("\nWith the sparse ward included: unexpectedly found a split"),
        Err(e) => println!("\nWith the sparse ward included: {}", e),
    }

    // 7. When no split exists
    println!("\n--- No Valid Split ---");

    let short = weekly_series(&[3, 5]);
    match find_optimal_split(&short, &config) {
        Ok(_) => println!("Unexpectedly found a split"),
        Err(e) => println!("Two bins: {}", e),
    }

    // 8. Practical Guidance
    println!("\n--- Practical Guidance ---");
    println!(
        "
Choosing min_side_bins:
  - 2 is the floor: a fit needs two positive bins per side
  - Raise it when edge bins are noisy or incomplete
  - The last bin often undercounts (reporting delay): consider
    slicing it off before searching

Reading the score:
  - Score is the mean log-scale R² of the two segments
  - Near 1.0: clean two-phase curve
  - Well below 1.0 everywhere: the curve may have more than one
    wave, or no exponential phases at all

Grouped series:
  - Per-group search when groups peak at different times
  - Shared search when one intervention affected all groups
  - A group too sparse to fit fails alone in the per-group
    search but disqualifies every candidate in the shared one
"
    );

    println!("=== Breakpoint Search Example Complete ===");
}
