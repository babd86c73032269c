// Scenario Definitions: headless autopilot matches across modes and difficulties
// Scenario logic lives in setup/event hooks; the engine is driven exactly as a browser would.

use microbe_engine::{Difficulty, MapMode, MicrobeSimulation};

// ─── Scenario Configuration ─────────────────────────────────────────────────

pub struct Scenario {
    pub name: &'static str,
    pub label: &'static str,
    pub category: &'static str,
    pub mode: MapMode,
    pub difficulty: Difficulty,
    pub max_ticks: u64,
    /// Simulated milliseconds between ticks.
    pub tick_ms: f64,
    pub criteria: PassCriteria,
    /// Pre-run setup after the map is built
    pub setup: Option<fn(&mut MicrobeSimulation)>,
    /// Hook invoked before every tick with (sim, tick, now)
    pub mid_event: Option<fn(&mut MicrobeSimulation, u64, f64)>,
}

pub struct PassCriteria {
    /// The match must reach Victory or Defeat within `max_ticks`.
    pub require_finish: bool,
    /// Every topology seen must stay connected.
    pub require_connectivity: bool,
}

impl Default for PassCriteria {
    fn default() -> Self {
        Self {
            require_finish: false,
            require_connectivity: true,
        }
    }
}

// ─── Hooks ──────────────────────────────────────────────────────────────────

fn skip_tutorial_lessons(sim: &mut MicrobeSimulation) {
    while let Some(step) = sim.advance_tutorial_step() {
        if step.ai_enabled() {
            break;
        }
    }
}

/// Pause for ten simulated seconds every thousand ticks.
fn pause_storm(sim: &mut MicrobeSimulation, tick: u64, now: f64) {
    if tick > 0 && tick % 1000 == 0 {
        sim.pause_at(now);
        sim.resume_at(now + 10_000.0);
    }
}

// ─── Catalogue ──────────────────────────────────────────────────────────────

const FRAME_MS: f64 = 1000.0 / 60.0;

pub fn scenarios() -> Vec<Scenario> {
    let mut out = Vec::new();

    for difficulty in Difficulty::ALL {
        out.push(Scenario {
            name: match difficulty {
                Difficulty::Novice => "STD_NOVICE",
                Difficulty::Standard => "STD_STANDARD",
                Difficulty::Veteran => "STD_VETERAN",
                Difficulty::Elite => "STD_ELITE",
                Difficulty::Apex => "STD_APEX",
            },
            label: match difficulty {
                Difficulty::Novice => "Standard map / Novice",
                Difficulty::Standard => "Standard map / Standard",
                Difficulty::Veteran => "Standard map / Veteran",
                Difficulty::Elite => "Standard map / Elite",
                Difficulty::Apex => "Standard map / Apex",
            },
            category: "standard",
            mode: MapMode::Standard,
            difficulty,
            max_ticks: 36_000,
            tick_ms: FRAME_MS,
            criteria: PassCriteria::default(),
            setup: None,
            mid_event: None,
        });
    }

    out.push(Scenario {
        name: "LATTICE_VETERAN",
        label: "Lattice map / Veteran",
        category: "lattice",
        mode: MapMode::Lattice,
        difficulty: Difficulty::Veteran,
        max_ticks: 36_000,
        tick_ms: FRAME_MS,
        criteria: PassCriteria::default(),
        setup: None,
        mid_event: None,
    });

    out.push(Scenario {
        name: "APEX_BLITZ",
        label: "Apex AI must resolve quickly",
        category: "standard",
        mode: MapMode::Standard,
        difficulty: Difficulty::Apex,
        max_ticks: 72_000,
        tick_ms: FRAME_MS,
        criteria: PassCriteria {
            require_finish: true,
            ..PassCriteria::default()
        },
        setup: None,
        mid_event: None,
    });

    out.push(Scenario {
        name: "PAUSE_STORM",
        label: "Frequent pause/resume cycles",
        category: "timing",
        mode: MapMode::Standard,
        difficulty: Difficulty::Elite,
        max_ticks: 20_000,
        tick_ms: FRAME_MS,
        criteria: PassCriteria::default(),
        setup: None,
        mid_event: Some(pause_storm),
    });

    out.push(Scenario {
        name: "TUTORIAL_FREEPLAY",
        label: "Tutorial map after the lessons",
        category: "tutorial",
        mode: MapMode::Tutorial,
        difficulty: Difficulty::Standard,
        max_ticks: 36_000,
        tick_ms: FRAME_MS,
        criteria: PassCriteria::default(),
        setup: Some(skip_tutorial_lessons),
        mid_event: None,
    });

    out
}
