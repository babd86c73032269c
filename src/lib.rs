// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Microbe Arena Simulation Engine

pub mod types;
pub mod config;
pub mod topology;
pub mod growth;
pub mod transfer;
pub mod physics;
pub mod ai;
pub mod outcome;
pub mod simulation;

pub use types::*;
pub use config::{Difficulty, DifficultyProfile, SimConfig};
pub use outcome::{check_win_condition, faction_summaries};
pub use simulation::{advance_tick, shift_timers, MicrobeSimulation, Timers};
pub use transfer::{cancel_transfers, issue_attack, AttackOrder, CommandError};

use wasm_bindgen::prelude::*;

// ─── WASM Interface ──────────────────────────────────────────────────────────

#[wasm_bindgen]
impl MicrobeSimulation {
    #[wasm_bindgen(constructor)]
    pub fn new(seed: u32) -> Self {
        #[cfg(target_arch = "wasm32")]
        std::panic::set_hook(Box::new(console_error_panic_hook::hook));

        MicrobeSimulation::with_config(seed as u64, SimConfig::default())
    }

    /// Build with a partial tuning object; missing fields keep their defaults.
    pub fn configured(seed: u32, config: JsValue) -> Result<MicrobeSimulation, JsValue> {
        #[cfg(target_arch = "wasm32")]
        std::panic::set_hook(Box::new(console_error_panic_hook::hook));

        let config: SimConfig = if config.is_undefined() || config.is_null() {
            SimConfig::default()
        } else {
            serde_wasm_bindgen::from_value(config)?
        };
        Ok(MicrobeSimulation::with_config(seed as u64, config))
    }

    /// `mode`: 0 standard, 1 lattice, 2 tutorial. `color`: 1..=4.
    pub fn start(&mut self, mode: u8, color: u8, now: f64) {
        let mode = match mode {
            1 => MapMode::Lattice,
            2 => MapMode::Tutorial,
            _ => MapMode::Standard,
        };
        let player = Faction::from_index(color).unwrap_or(Faction::Crimson);
        self.start_match(mode, player, now);
    }

    pub fn tick(&mut self, now: f64) -> JsValue {
        let frame = self.tick_core(now);
        serde_wasm_bindgen::to_value(&frame).unwrap_or(JsValue::NULL)
    }

    /// Invalid orders are ignored; returns whether the order was accepted.
    pub fn attack(&mut self, from: u32, to: u32, continuous: bool) -> bool {
        match self.order(from, to, continuous) {
            Ok(_) => true,
            Err(err) => {
                tracing::debug!(%err, from, to, "order ignored");
                false
            }
        }
    }

    pub fn cancel(&mut self, from: u32, to: Option<u32>) -> u32 {
        self.cancel_orders(from, to) as u32
    }

    pub fn pause(&mut self, now: f64) {
        self.pause_at(now);
    }

    pub fn resume(&mut self, now: f64) {
        self.resume_at(now);
    }

    pub fn set_difficulty(&mut self, level: u8) {
        if let Some(difficulty) = Difficulty::from_level(level) {
            self.set_difficulty_level(difficulty);
        }
    }

    pub fn set_autopilot(&mut self, on: bool) {
        self.set_autopilot_mode(on);
    }

    /// Returns the new step index, or -1 outside the tutorial.
    pub fn next_tutorial_step(&mut self) -> i32 {
        self.advance_tutorial_step().map_or(-1, |s| s as i32)
    }

    pub fn get_world(&self) -> JsValue {
        serde_wasm_bindgen::to_value(self.world()).unwrap_or(JsValue::NULL)
    }

    pub fn get_summaries(&self) -> JsValue {
        serde_wasm_bindgen::to_value(&faction_summaries(self.world())).unwrap_or(JsValue::NULL)
    }

    pub fn get_phase(&self) -> u8 {
        self.phase() as u8
    }

    pub fn check_win(&self, color: u8) -> JsValue {
        let color = Faction::from_index(color).unwrap_or(self.player());
        serde_wasm_bindgen::to_value(&check_win_condition(self.world(), color)).unwrap_or(JsValue::NULL)
    }

    pub fn get_tick(&self) -> f64 {
        self.tick_count() as f64
    }

    /// Back to the menu; the next `start` builds a new world.
    pub fn quit(&mut self) {
        self.reset();
    }
}
