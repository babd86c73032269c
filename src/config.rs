// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Microbe Arena Simulation Engine - Tuning Parameters

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// SimConfig
// ---------------------------------------------------------------------------

/// Every numeric tunable of the simulation. Distances are pixels, times are
/// milliseconds, rates are per tick.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub world_width: f64,
    pub world_height: f64,
    /// Keeps node centres away from the world border.
    pub margin: f64,
    pub standard_node_count: u32,
    pub lattice_columns: u32,
    pub lattice_rows: u32,
    /// Force-directed relaxation passes after scattering.
    pub relaxation_iterations: u32,
    pub min_node_spacing: f64,

    /// Random edges per node (0.5 = half as many random edges as nodes).
    pub random_edge_ratio: f64,
    pub max_edge_distance: f64,
    pub topology_shift_interval_ms: f64,

    pub starting_count: f64,
    pub neutral_count_min: u32,
    pub neutral_count_max: u32,
    pub node_capacity: f64,
    pub fortress_count: u32,
    pub hive_count: u32,

    pub base_growth_per_tick: f64,
    pub capture_progress_step: f64,

    pub base_spawn_interval_ms: f64,
    pub min_spawn_interval_ms: f64,
    pub base_unit_speed: f64,
    pub unit_count: f64,

    pub collision_radius: f64,
    pub impact_force: f64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            world_width: 1200.0,
            world_height: 800.0,
            margin: 60.0,
            standard_node_count: 24,
            lattice_columns: 6,
            lattice_rows: 4,
            relaxation_iterations: 60,
            min_node_spacing: 140.0,

            random_edge_ratio: 0.5,
            max_edge_distance: 320.0,
            topology_shift_interval_ms: 20_000.0,

            starting_count: 20.0,
            neutral_count_min: 10,
            neutral_count_max: 30,
            node_capacity: 100.0,
            fortress_count: 2,
            hive_count: 2,

            base_growth_per_tick: 0.04,
            capture_progress_step: 0.05,

            base_spawn_interval_ms: 400.0,
            min_spawn_interval_ms: 60.0,
            base_unit_speed: 2.5,
            unit_count: 1.0,

            collision_radius: 15.0,
            impact_force: 12.0,
        }
    }
}

impl SimConfig {
    /// Random edge quota for a map of `node_count` nodes.
    pub fn random_edge_quota(&self, node_count: usize) -> usize {
        (node_count as f64 * self.random_edge_ratio).floor().max(0.0) as usize
    }
}

// ---------------------------------------------------------------------------
// Difficulty
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DifficultyProfile {
    /// Minimum time between AI decision passes.
    pub action_interval_ms: f64,
    /// Cap on orders issued per pass, `None` for unlimited.
    pub max_actions_per_tick: Option<u32>,
    /// Probability that a node is skipped for a whole pass.
    pub hesitation_chance: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum Difficulty {
    Novice = 1,
    #[default]
    Standard = 2,
    Veteran = 3,
    Elite = 4,
    Apex = 5,
}

impl Difficulty {
    pub const ALL: [Difficulty; 5] = [
        Difficulty::Novice,
        Difficulty::Standard,
        Difficulty::Veteran,
        Difficulty::Elite,
        Difficulty::Apex,
    ];

    pub fn profile(&self) -> DifficultyProfile {
        match self {
            Self::Novice => DifficultyProfile {
                action_interval_ms: 3000.0,
                max_actions_per_tick: Some(1),
                hesitation_chance: 0.6,
            },
            Self::Standard => DifficultyProfile {
                action_interval_ms: 1800.0,
                max_actions_per_tick: Some(2),
                hesitation_chance: 0.35,
            },
            Self::Veteran => DifficultyProfile {
                action_interval_ms: 1100.0,
                max_actions_per_tick: Some(4),
                hesitation_chance: 0.2,
            },
            Self::Elite => DifficultyProfile {
                action_interval_ms: 600.0,
                max_actions_per_tick: Some(8),
                hesitation_chance: 0.08,
            },
            Self::Apex => DifficultyProfile {
                action_interval_ms: 150.0,
                max_actions_per_tick: None,
                hesitation_chance: 0.0,
            },
        }
    }

    pub fn from_level(level: u8) -> Option<Self> {
        match level {
            1 => Some(Self::Novice),
            2 => Some(Self::Standard),
            3 => Some(Self::Veteran),
            4 => Some(Self::Elite),
            5 => Some(Self::Apex),
            _ => None,
        }
    }
}
