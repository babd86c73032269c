// Microbe Bench Runner: headless autopilot-vs-AI matches
// Monte Carlo (N=30 by default), seeded ChaCha8Rng, invariant audit every tick
//
// Usage:
//   cargo run --release --bin bench                     # Run all scenarios (30 runs each)
//   cargo run --release --bin bench -- --runs 5         # Quick mode (5 runs each)
//   cargo run --release --bin bench -- STD_APEX         # Filter by name, label, or category
//   cargo run --release --bin bench -- --json           # Write benchmark-results/bench-<ts>.json
//   cargo run --release --bin bench -- --seed 42        # Custom base seed
//   RUST_LOG=microbe_engine=info cargo run --bin bench  # Engine logs

mod monte_carlo;
mod report;
mod scenarios;

use clap::Parser;
use report::*;
use scenarios::*;
use std::time::{Instant, SystemTime, UNIX_EPOCH};
use tracing_subscriber::EnvFilter;

// ─── CLI ────────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "bench", about = "Headless microbe match benchmarks")]
struct Cli {
    /// Runs per scenario
    #[arg(long, default_value_t = 30)]
    runs: usize,

    /// Base seed; run i uses seed + i
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Write the full report as JSON under benchmark-results/
    #[arg(long)]
    json: bool,

    /// Only run scenarios whose name, label, or category contains this
    filter: Option<String>,
}

// ─── Main ───────────────────────────────────────────────────────────────────

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let all_scenarios = scenarios();

    let to_run: Vec<&Scenario> = match &cli.filter {
        Some(f) => {
            let f_lower = f.to_lowercase();
            all_scenarios.iter()
                .filter(|s| s.name.to_lowercase().contains(&f_lower)
                          || s.label.to_lowercase().contains(&f_lower)
                          || s.category.to_lowercase().contains(&f_lower))
                .collect()
        }
        None => all_scenarios.iter().collect(),
    };

    if to_run.is_empty() {
        eprintln!("No scenarios match filter: {:?}", cli.filter);
        std::process::exit(1);
    }

    println!("\n  Microbe Bench Runner v{}", env!("CARGO_PKG_VERSION"));
    println!("  PRNG: ChaCha8Rng | Runs/scenario: {} | Base seed: {}", cli.runs, cli.seed);
    println!("  Running {} scenario(s)...\n", to_run.len());
    println!("  {:<32} {:>5} {:>6} {:>6} {:>12} {:>9} {:>9} {:>7}",
        "Scenario", "Pass%", "Done%", "Win%", "Ticks", "Captures", "Collide", "Time");
    println!("  {}", "-".repeat(96));

    let suite_start = Instant::now();
    let mut mc_reports = Vec::new();

    for scenario in &to_run {
        let report = monte_carlo::run_monte_carlo(scenario, cli.runs, cli.seed);

        let pass_pct = report.pass_rate * 100.0;
        let status = if report.pass_rate >= 1.0 { "PASS" } else { "FAIL" };

        println!("  {:<32} {:>4}% {:>5.0}% {:>5.0}% {:>7.0}±{:<4.0} {:>9.1} {:>9.1} {:>5.0}ms  {}",
            report.label,
            pass_pct as u32,
            report.finish_rate * 100.0,
            report.player_win_rate * 100.0,
            report.match_ticks.mean, report.match_ticks.half_width(),
            report.captures.mean,
            report.collisions.mean,
            report.elapsed_ms.mean,
            status,
        );

        mc_reports.push(report);
    }

    let suite_elapsed = suite_start.elapsed();

    // ─── Summary ────────────────────────────────────────────────────────

    let total = mc_reports.len();
    let passed = mc_reports.iter().filter(|r| r.pass_rate >= 1.0).count();
    let failed = total - passed;

    println!("  {}", "-".repeat(96));
    println!("  Total: {}  Passed: {}  Failed: {}  Suite time: {:.1}s\n",
        total, passed, failed, suite_elapsed.as_secs_f64());

    // ─── Write JSON Report ──────────────────────────────────────────────

    if cli.json {
        let ts = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();
        let timestamp = format!("{}", ts);

        let report = BenchReport {
            timestamp: timestamp.clone(),
            version: env!("CARGO_PKG_VERSION"),
            prng: "ChaCha8Rng",
            n_runs_per_scenario: cli.runs,
            summary: Summary {
                total,
                passed,
                failed,
                pass_rate: passed as f64 / total as f64,
            },
            scenarios: mc_reports,
        };

        if let Err(err) = write_report(&report, &timestamp) {
            eprintln!("Failed to write benchmark report: {}", err);
            std::process::exit(2);
        }
    }

    if failed > 0 {
        std::process::exit(1);
    }
}

fn write_report(report: &BenchReport, timestamp: &str) -> std::io::Result<()> {
    let dir = std::path::Path::new("benchmark-results");
    std::fs::create_dir_all(dir)?;
    let path = dir.join(format!("bench-{}.json", timestamp));
    let json = serde_json::to_string_pretty(report)?;
    std::fs::write(&path, json)?;
    println!("  Results saved to: {}\n", path.display());
    Ok(())
}
