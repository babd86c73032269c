// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Microbe Arena Simulation Engine - Type Definitions

use serde::{Deserialize, Serialize};

use crate::config::Difficulty;

// ─── Faction ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum Faction {
    #[default]
    Neutral = 0,
    Crimson = 1,
    Azure = 2,
    Verdant = 3,
    Amber = 4,
}

impl Faction {
    /// Every colour a human or an AI can play.
    pub const PLAYABLE: [Faction; 4] = [
        Faction::Crimson,
        Faction::Azure,
        Faction::Verdant,
        Faction::Amber,
    ];

    pub fn is_neutral(&self) -> bool {
        *self == Faction::Neutral
    }

    pub fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(Self::Neutral),
            1 => Some(Self::Crimson),
            2 => Some(Self::Azure),
            3 => Some(Self::Verdant),
            4 => Some(Self::Amber),
            _ => None,
        }
    }
}

// ─── Node Kind ───────────────────────────────────────────────────────────────

/// Per-kind combat and growth modifiers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KindModifiers {
    /// Multiplier applied to incoming hostile damage.
    pub damage_taken: f64,
    /// Multiplier applied to the per-tick growth increment.
    pub growth: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum NodeKind {
    #[default]
    Standard = 0,
    Fortress = 1,
    Hive = 2,
}

impl NodeKind {
    pub fn modifiers(&self) -> KindModifiers {
        match self {
            Self::Standard => KindModifiers { damage_taken: 1.0, growth: 1.0 },
            Self::Fortress => KindModifiers { damage_taken: 0.5, growth: 1.0 },
            Self::Hive => KindModifiers { damage_taken: 1.0, growth: 1.6 },
        }
    }
}

// ─── Node ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub id: u32,
    pub x: f64,
    pub y: f64,
    pub owner: Faction,
    pub count: f64,
    /// Soft baseline for saturation heuristics, never enforced as a ceiling.
    pub capacity: f64,
    pub growth_accumulator: f64,
    pub kind: NodeKind,
    // Ownership-change animation state (cosmetic)
    #[serde(default)]
    pub capture_progress: f64,
    #[serde(default)]
    pub prev_owner: Option<Faction>,
}

impl Node {
    pub fn new(id: u32, x: f64, y: f64, owner: Faction, count: f64, capacity: f64) -> Self {
        Self {
            id,
            x,
            y,
            owner,
            count,
            capacity,
            growth_accumulator: 0.0,
            kind: NodeKind::Standard,
            capture_progress: 1.0,
            prev_owner: None,
        }
    }

    pub fn saturation(&self) -> f64 {
        if self.capacity > 0.0 {
            self.count / self.capacity
        } else {
            0.0
        }
    }

    pub fn distance_to(&self, other: &Node) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

// ─── Edge ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum EdgeKind {
    /// Spanning-tree edge, survives every topology shift.
    Permanent = 0,
    /// Replaced on each topology shift.
    Random = 1,
}

/// Order-independent pair of node ids.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeKey(pub u32, pub u32);

impl EdgeKey {
    pub fn new(a: u32, b: u32) -> Self {
        if a <= b { Self(a, b) } else { Self(b, a) }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Edge {
    pub source: u32,
    pub target: u32,
    pub kind: EdgeKind,
}

impl Edge {
    pub fn new(source: u32, target: u32, kind: EdgeKind) -> Self {
        Self { source, target, kind }
    }

    pub fn key(&self) -> EdgeKey {
        EdgeKey::new(self.source, self.target)
    }

    /// The far end of this edge as seen from `node_id`.
    pub fn other(&self, node_id: u32) -> Option<u32> {
        if self.source == node_id {
            Some(self.target)
        } else if self.target == node_id {
            Some(self.source)
        } else {
            None
        }
    }
}

// ─── Quota ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Quota {
    Finite(u32),
    Continuous,
}

impl Quota {
    pub fn has_remaining(&self, sent: u32) -> bool {
        match self {
            Self::Finite(total) => sent < *total,
            Self::Continuous => true,
        }
    }

    pub fn is_exhausted(&self, sent: u32) -> bool {
        !self.has_remaining(sent)
    }

    /// Continuous wins; finite goals add up.
    pub fn merge(self, other: Quota) -> Quota {
        match (self, other) {
            (Self::Finite(a), Self::Finite(b)) => Self::Finite(a.saturating_add(b)),
            _ => Self::Continuous,
        }
    }
}

// ─── ActiveTransfer ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActiveTransfer {
    pub id: u64,
    pub source_id: u32,
    pub target_id: u32,
    pub owner: Faction,
    pub quota: Quota,
    pub sent_count: u32,
    pub last_spawn_time: f64,
}

impl ActiveTransfer {
    pub fn edge_key(&self) -> EdgeKey {
        EdgeKey::new(self.source_id, self.target_id)
    }
}

// ─── TravelPayload ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TravelPayload {
    pub id: u64,
    pub owner: Faction,
    pub source_id: u32,
    pub target_id: u32,
    pub count: f64,
    /// 0..1 along the straight line from start to end.
    pub progress: f64,
    /// Progress gained per tick.
    pub speed: f64,
    // Endpoints captured at spawn
    pub start_x: f64,
    pub start_y: f64,
    pub end_x: f64,
    pub end_y: f64,
}

impl TravelPayload {
    pub fn edge_key(&self) -> EdgeKey {
        EdgeKey::new(self.source_id, self.target_id)
    }

    pub fn path_length(&self) -> f64 {
        ((self.end_x - self.start_x).powi(2) + (self.end_y - self.start_y).powi(2)).sqrt()
    }

    pub fn position(&self) -> (f64, f64) {
        let t = self.progress.clamp(0.0, 1.0);
        (
            self.start_x + (self.end_x - self.start_x) * t,
            self.start_y + (self.end_y - self.start_y) * t,
        )
    }

    /// Direction of travel in radians.
    pub fn heading(&self) -> f64 {
        (self.end_y - self.start_y).atan2(self.end_x - self.start_x)
    }

    /// Position on the shared 0..1 axis of `key`, running from `key.0` to `key.1`.
    pub fn axis_position(&self, key: EdgeKey) -> f64 {
        if self.source_id == key.0 {
            self.progress
        } else {
            1.0 - self.progress
        }
    }
}

// ─── Transient Events ────────────────────────────────────────────────────────

/// Presentation-only events produced by a single tick.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum SimEvent {
    Impact {
        node_id: u32,
        angle: f64,
        force: f64,
        color: Faction,
    },
    Collision {
        x: f64,
        y: f64,
        edge: EdgeKey,
        first: Faction,
        second: Faction,
    },
    Capture {
        node_id: u32,
        from: Faction,
        to: Faction,
    },
}

// ─── GameWorld ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GameWorld {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    pub payloads: Vec<TravelPayload>,
    pub transfers: Vec<ActiveTransfer>,
    #[serde(default)]
    pub next_entity_id: u64,
}

impl GameWorld {
    pub fn new(nodes: Vec<Node>, edges: Vec<Edge>) -> Self {
        Self {
            nodes,
            edges,
            payloads: Vec::new(),
            transfers: Vec::new(),
            next_entity_id: 0,
        }
    }

    pub fn node(&self, id: u32) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn node_mut(&mut self, id: u32) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }

    pub fn node_index(&self, id: u32) -> Option<usize> {
        self.nodes.iter().position(|n| n.id == id)
    }

    pub fn has_edge(&self, a: u32, b: u32) -> bool {
        let key = EdgeKey::new(a, b);
        self.edges.iter().any(|e| e.key() == key)
    }

    pub fn neighbors(&self, node_id: u32) -> Vec<u32> {
        self.edges.iter().filter_map(|e| e.other(node_id)).collect()
    }

    pub(crate) fn alloc_id(&mut self) -> u64 {
        let id = self.next_entity_id;
        self.next_entity_id += 1;
        id
    }
}

// ─── Phase / Tutorial ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Menu = 0,
    Tutorial = 1,
    Playing = 2,
    Paused = 3,
    Victory = 4,
    Defeat = 5,
}

impl Phase {
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Tutorial | Self::Playing)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub enum TutorialStep {
    Select = 0,
    Attack = 1,
    Reinforce = 2,
    Contest = 3,
    Freeplay = 4,
}

impl TutorialStep {
    /// The opponent only wakes up once the player has learned the basics.
    pub fn ai_enabled(&self) -> bool {
        *self >= Self::Contest
    }

    pub fn next(&self) -> Self {
        match self {
            Self::Select => Self::Attack,
            Self::Attack => Self::Reinforce,
            Self::Reinforce => Self::Contest,
            Self::Contest | Self::Freeplay => Self::Freeplay,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum MapMode {
    #[default]
    Standard = 0,
    Lattice = 1,
    Tutorial = 2,
}

// ─── Tick Context / Outcome ──────────────────────────────────────────────────

/// Timing and control inputs for one tick. Times are milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickContext {
    pub now: f64,
    pub last_tick: f64,
    pub last_ai_time: f64,
    pub next_event_time: f64,
    pub player: Faction,
    pub phase: Phase,
    pub difficulty: Difficulty,
    #[serde(default)]
    pub autopilot: bool,
    #[serde(default)]
    pub tutorial_step: Option<TutorialStep>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct WinState {
    pub winner: Option<Faction>,
    pub is_game_over: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct TickOutcome {
    pub world: GameWorld,
    pub last_ai_time: f64,
    pub next_event_time: f64,
    pub has_changes: bool,
    /// Drained by the presentation layer in the same frame.
    pub events: Vec<SimEvent>,
    pub status: WinState,
}

// ─── FactionSummary ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FactionSummary {
    pub faction: Faction,
    pub nodes: u32,
    pub biomass: f64,
    pub payloads: u32,
    pub transfers: u32,
}

impl FactionSummary {
    pub fn total_assets(&self) -> u32 {
        self.nodes + self.payloads + self.transfers
    }
}

// ─── FrameUpdate ─────────────────────────────────────────────────────────────

/// What the scheduler publishes to the presentation layer after each tick.
#[derive(Debug, Clone, Serialize)]
pub struct FrameUpdate {
    pub tick: u64,
    pub phase: Phase,
    pub has_changes: bool,
    /// Present only when something visible changed.
    pub world: Option<GameWorld>,
    pub events: Vec<SimEvent>,
    pub status: WinState,
}
