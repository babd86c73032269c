// Monte Carlo Infrastructure: N seeded matches per scenario with statistical aggregation
// Each scenario runs N times with seeds base..base+N, computing mean ± 95% CI

use microbe_engine::topology::is_connected;
use microbe_engine::*;

use crate::report::*;
use crate::scenarios::Scenario;

use std::time::Instant;

/// Run a single scenario iteration with a specific seed.
pub fn run_single(scenario: &Scenario, seed: u64) -> MatchResult {
    let start = Instant::now();
    let mut sim = MicrobeSimulation::with_config(seed, SimConfig::default());
    sim.start_match(scenario.mode, Faction::Crimson, 0.0);
    sim.set_difficulty_level(scenario.difficulty);
    sim.set_autopilot_mode(true);

    if let Some(setup) = scenario.setup {
        setup(&mut sim);
    }

    let mut captures = 0u32;
    let mut collisions = 0u32;
    let mut impacts = 0u32;
    let mut peak_payloads = 0usize;
    let mut negative_count_violations = 0u32;
    let mut connectivity_violations = 0u32;
    let mut ticks = 0u64;
    let mut now = 0.0;

    for tick in 0..scenario.max_ticks {
        if let Some(event) = scenario.mid_event {
            event(&mut sim, tick, now);
        }
        now += scenario.tick_ms;
        let frame = sim.tick_core(now);
        ticks = tick + 1;

        for event in &frame.events {
            match event {
                SimEvent::Capture { .. } => captures += 1,
                SimEvent::Collision { .. } => collisions += 1,
                SimEvent::Impact { .. } => impacts += 1,
            }
        }

        let world = sim.world();
        peak_payloads = peak_payloads.max(world.payloads.len());
        negative_count_violations += world
            .nodes
            .iter()
            .filter(|n| n.count < 0.0 || !n.count.is_finite())
            .count() as u32;
        if scenario.criteria.require_connectivity && !is_connected(world) {
            connectivity_violations += 1;
        }

        if matches!(sim.phase(), Phase::Victory | Phase::Defeat) {
            break;
        }
    }

    let finished = matches!(sim.phase(), Phase::Victory | Phase::Defeat);
    let player_won = sim.phase() == Phase::Victory;
    let leader = faction_summaries(sim.world())
        .into_iter()
        .max_by_key(|s| s.nodes)
        .map(|s| format!("{:?}", s.faction));

    let pass = negative_count_violations == 0
        && connectivity_violations == 0
        && (!scenario.criteria.require_finish || finished);

    tracing::debug!(scenario = scenario.name, seed, ticks, captures, collisions, pass, "run complete");

    MatchResult {
        scenario: scenario.name.to_string(),
        seed,
        pass,
        finished,
        player_won,
        leader,
        ticks,
        captures,
        collisions,
        impacts,
        peak_payloads,
        negative_count_violations,
        connectivity_violations,
        elapsed_ms: start.elapsed().as_millis(),
    }
}

/// Run Monte Carlo: N runs of a scenario, aggregate stats.
pub fn run_monte_carlo(scenario: &Scenario, n_runs: usize, base_seed: u64) -> MonteCarloReport {
    let results: Vec<MatchResult> = (0..n_runs)
        .map(|i| run_single(scenario, base_seed + i as u64))
        .collect();
    aggregate(scenario, results)
}

fn rate(results: &[MatchResult], pred: impl Fn(&MatchResult) -> bool) -> f64 {
    if results.is_empty() {
        return 0.0;
    }
    results.iter().filter(|r| pred(r)).count() as f64 / results.len() as f64
}

/// Aggregate individual runs into a MonteCarloReport.
fn aggregate(scenario: &Scenario, results: Vec<MatchResult>) -> MonteCarloReport {
    let sample = |f: fn(&MatchResult) -> f64| -> Stats {
        Stats::from_samples(&results.iter().map(f).collect::<Vec<_>>())
    };

    MonteCarloReport {
        scenario_name: scenario.name.to_string(),
        label: scenario.label.to_string(),
        category: scenario.category.to_string(),
        n_runs: results.len(),
        pass_rate: rate(&results, |r| r.pass),
        finish_rate: rate(&results, |r| r.finished),
        player_win_rate: rate(&results, |r| r.player_won),
        match_ticks: sample(|r| r.ticks as f64),
        captures: sample(|r| r.captures as f64),
        collisions: sample(|r| r.collisions as f64),
        peak_payloads: sample(|r| r.peak_payloads as f64),
        elapsed_ms: sample(|r| r.elapsed_ms as f64),
        individual_runs: results,
    }
}
