// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Microbe Arena Simulation Engine - Simulation Core

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;

use crate::ai;
use crate::config::{Difficulty, SimConfig};
use crate::growth;
use crate::outcome;
use crate::physics;
use crate::topology;
use crate::transfer::{self, AttackOrder, CommandError};
use crate::types::*;

// ─── Pure tick ───────────────────────────────────────────────────────────────

/// One discrete step of the world.
///
/// Order: current shift (unless frozen) → growth → spawning → AI (on its
/// cadence) → movement, collisions, arrivals → win check. Nothing happens
/// outside the Tutorial/Playing phases or if the clock ran backwards.
pub fn advance_tick<R: Rng>(
    mut world: GameWorld,
    ctx: &TickContext,
    config: &SimConfig,
    rng: &mut R,
) -> TickOutcome {
    let mut last_ai_time = ctx.last_ai_time;
    let mut next_event_time = ctx.next_event_time;
    let mut events = Vec::new();

    if !ctx.phase.is_running() || ctx.now < ctx.last_tick {
        let status = outcome::check_win_condition(&world, ctx.player);
        return TickOutcome { world, last_ai_time, next_event_time, has_changes: false, events, status };
    }
    let tutorial = ctx.phase == Phase::Tutorial;
    let mut changed = false;

    // 1. Ocean current (topology frozen in the tutorial)
    if !tutorial {
        if next_event_time <= 0.0 {
            next_event_time = ctx.now + config.topology_shift_interval_ms;
        } else if ctx.now >= next_event_time {
            topology::regenerate_random_edges(&mut world, config, rng);
            next_event_time = ctx.now + config.topology_shift_interval_ms;
            changed = true;
        }
    }

    // 2. Growth
    changed |= growth::apply_growth(&mut world.nodes, config);
    changed |= growth::advance_capture_progress(&mut world.nodes, config.capture_progress_step);

    // 3. Spawning
    let transfers_before = world.transfers.len();
    changed |= transfer::spawn_payloads(&mut world, ctx.now, config) > 0;
    changed |= world.transfers.len() != transfers_before;

    // 4. AI
    let ai_enabled = !tutorial || ctx.tutorial_step.map_or(false, |s| s.ai_enabled());
    let profile = ctx.difficulty.profile();
    if ai_enabled && ctx.now - last_ai_time >= profile.action_interval_ms {
        let orders = ai::run_ai(&mut world, ctx.player, ctx.autopilot, &profile, rng);
        last_ai_time = ctx.now;
        changed |= !orders.is_empty();
    }

    // 5. Payload physics
    let report = physics::step_payloads(&mut world, config, &mut events);
    changed |= report.any() || !world.payloads.is_empty();

    // 6. Advisory win check
    let status = outcome::check_win_condition(&world, ctx.player);

    tracing::trace!(
        now = ctx.now,
        payloads = world.payloads.len(),
        transfers = world.transfers.len(),
        collisions = report.collisions,
        arrivals = report.arrivals,
        "tick"
    );

    TickOutcome {
        world,
        last_ai_time,
        next_event_time,
        has_changes: changed,
        events,
        status,
    }
}

// ─── Timers ──────────────────────────────────────────────────────────────────

/// Absolute-time bookkeeping carried between ticks, in milliseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Timers {
    pub last_tick: f64,
    pub last_ai_time: f64,
    pub next_event_time: f64,
}

/// Push every absolute-time timer forward by `paused_for` so throttled events
/// resume on their original rhythm instead of all firing at once.
pub fn shift_timers(world: &mut GameWorld, timers: &mut Timers, paused_for: f64) {
    let d = paused_for.max(0.0);
    timers.last_tick += d;
    timers.last_ai_time += d;
    timers.next_event_time += d;
    for t in world.transfers.iter_mut() {
        t.last_spawn_time += d;
    }
}

// ─── MicrobeSimulation (scheduler) ───────────────────────────────────────────

/// Owns the authoritative world between ticks and publishes snapshots.
#[wasm_bindgen]
pub struct MicrobeSimulation {
    pub(crate) world: GameWorld,
    pub(crate) config: SimConfig,
    pub(crate) rng: ChaCha8Rng,
    pub(crate) timers: Timers,

    pub(crate) phase: Phase,
    pub(crate) resume_phase: Phase,
    pub(crate) paused_at: Option<f64>,

    pub(crate) player: Faction,
    pub(crate) difficulty: Difficulty,
    pub(crate) autopilot: bool,
    pub(crate) tutorial_step: Option<TutorialStep>,

    pub(crate) tick_count: u64,
    pub(crate) status: WinState,
}

impl MicrobeSimulation {
    pub fn with_config(seed: u64, config: SimConfig) -> Self {
        Self {
            world: GameWorld::default(),
            config,
            rng: ChaCha8Rng::seed_from_u64(seed),
            timers: Timers::default(),
            phase: Phase::Menu,
            resume_phase: Phase::Playing,
            paused_at: None,
            player: Faction::Crimson,
            difficulty: Difficulty::default(),
            autopilot: false,
            tutorial_step: None,
            tick_count: 0,
            status: WinState::default(),
        }
    }

    /// Discard the current match and build a fresh map.
    pub fn start_match(&mut self, mode: MapMode, player: Faction, now: f64) {
        let player = if player.is_neutral() { Faction::Crimson } else { player };
        self.world = match mode {
            MapMode::Standard => topology::generate_map(player, &self.config, &mut self.rng),
            MapMode::Lattice => topology::generate_alt_mode_map(player, &self.config, &mut self.rng),
            MapMode::Tutorial => topology::generate_tutorial_map(player, &self.config),
        };
        self.player = player;
        self.phase = if mode == MapMode::Tutorial { Phase::Tutorial } else { Phase::Playing };
        self.resume_phase = self.phase;
        self.paused_at = None;
        self.tutorial_step = (mode == MapMode::Tutorial).then_some(TutorialStep::Select);
        self.tick_count = 0;
        self.status = WinState::default();
        self.timers = Timers {
            last_tick: now,
            last_ai_time: now,
            next_event_time: now + self.config.topology_shift_interval_ms,
        };
        tracing::info!(?mode, ?player, nodes = self.world.nodes.len(), edges = self.world.edges.len(), "match started");
    }

    /// Return to the menu, dropping the world and every timer.
    pub fn reset(&mut self) {
        self.world = GameWorld::default();
        self.timers = Timers::default();
        self.phase = Phase::Menu;
        self.paused_at = None;
        self.tutorial_step = None;
        self.tick_count = 0;
        self.status = WinState::default();
    }

    pub fn tick_core(&mut self, now: f64) -> FrameUpdate {
        let ctx = self.context(now);
        let world = std::mem::take(&mut self.world);
        let out = advance_tick(world, &ctx, &self.config, &mut self.rng);

        self.world = out.world;
        if ctx.phase.is_running() && now >= ctx.last_tick {
            self.tick_count += 1;
            self.timers = Timers {
                last_tick: now,
                last_ai_time: out.last_ai_time,
                next_event_time: out.next_event_time,
            };
            self.status = out.status;
            self.apply_status();
        }

        FrameUpdate {
            tick: self.tick_count,
            phase: self.phase,
            has_changes: out.has_changes,
            world: out.has_changes.then(|| self.world.clone()),
            events: out.events,
            status: self.status,
        }
    }

    fn context(&self, now: f64) -> TickContext {
        TickContext {
            now,
            last_tick: self.timers.last_tick,
            last_ai_time: self.timers.last_ai_time,
            next_event_time: self.timers.next_event_time,
            player: self.player,
            phase: self.phase,
            difficulty: self.difficulty,
            autopilot: self.autopilot,
            tutorial_step: self.tutorial_step,
        }
    }

    fn apply_status(&mut self) {
        if !self.status.is_game_over || !self.phase.is_running() {
            return;
        }
        self.phase = if self.status.winner == Some(self.player) {
            Phase::Victory
        } else {
            Phase::Defeat
        };
        tracing::info!(phase = ?self.phase, tick = self.tick_count, "match over");
    }

    pub fn pause_at(&mut self, now: f64) {
        if !self.phase.is_running() {
            return;
        }
        self.resume_phase = self.phase;
        self.phase = Phase::Paused;
        self.paused_at = Some(now);
    }

    pub fn resume_at(&mut self, now: f64) {
        if self.phase != Phase::Paused {
            return;
        }
        if let Some(started) = self.paused_at.take() {
            shift_timers(&mut self.world, &mut self.timers, now - started);
        }
        self.phase = self.resume_phase;
    }

    /// Player order on behalf of the reference colour.
    pub fn order(&mut self, from: u32, to: u32, continuous: bool) -> Result<u64, CommandError> {
        let order = AttackOrder { issuer: self.player, from, to, continuous };
        transfer::issue_attack(&mut self.world, order)
    }

    pub fn cancel_orders(&mut self, from: u32, to: Option<u32>) -> usize {
        transfer::cancel_transfers(&mut self.world, self.player, from, to)
    }

    pub fn advance_tutorial_step(&mut self) -> Option<TutorialStep> {
        self.tutorial_step = self.tutorial_step.map(|s| s.next());
        self.tutorial_step
    }

    pub fn world(&self) -> &GameWorld {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut GameWorld {
        &mut self.world
    }

    pub fn timers(&self) -> Timers {
        self.timers
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn status(&self) -> WinState {
        self.status
    }

    pub fn player(&self) -> Faction {
        self.player
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn set_difficulty_level(&mut self, difficulty: Difficulty) {
        self.difficulty = difficulty;
    }

    pub fn set_autopilot_mode(&mut self, on: bool) {
        self.autopilot = on;
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }
}
