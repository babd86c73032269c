// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Microbe Arena Simulation Engine - Topology Generation & Current Shifts
//
// Maps are built from a minimum spanning tree over Euclidean distance (the
// permanent backbone, so the graph is always connected) plus a quota of
// short random edges that the "ocean current" reshuffles periodically.

use std::collections::{HashMap, HashSet};

use petgraph::algo::{connected_components, min_spanning_tree};
use petgraph::data::Element;
use petgraph::graph::{NodeIndex, UnGraph};
use rand::seq::SliceRandom;
use rand::Rng;

use crate::config::SimConfig;
use crate::types::{Edge, EdgeKey, EdgeKind, Faction, GameWorld, Node, NodeKind};

// ---------------------------------------------------------------------------
// Map constructors
// ---------------------------------------------------------------------------

/// Standard mode: scattered nodes relaxed into even spacing.
pub fn generate_map<R: Rng>(player: Faction, config: &SimConfig, rng: &mut R) -> GameWorld {
    let count = config.standard_node_count.max(2) as usize;
    let mut points = scatter(count, config, rng);
    relax(&mut points, config);
    build_world(points, player, config, rng)
}

/// Alternate mode: a regular lattice.
pub fn generate_alt_mode_map<R: Rng>(player: Faction, config: &SimConfig, rng: &mut R) -> GameWorld {
    let cols = config.lattice_columns.max(2);
    let rows = config.lattice_rows.max(1);
    let usable_w = config.world_width - 2.0 * config.margin;
    let usable_h = config.world_height - 2.0 * config.margin;
    let step_x = usable_w / (cols - 1) as f64;
    let step_y = if rows > 1 { usable_h / (rows - 1) as f64 } else { 0.0 };

    let mut points = Vec::with_capacity((cols * rows) as usize);
    for row in 0..rows {
        for col in 0..cols {
            let y = if rows > 1 {
                config.margin + row as f64 * step_y
            } else {
                config.world_height / 2.0
            };
            points.push((config.margin + col as f64 * step_x, y));
        }
    }
    build_world(points, player, config, rng)
}

/// Fixed five-node teaching map. Every edge is permanent since topology is
/// frozen during the tutorial.
pub fn generate_tutorial_map(player: Faction, config: &SimConfig) -> GameWorld {
    let opponent = Faction::PLAYABLE
        .iter()
        .copied()
        .find(|f| *f != player)
        .unwrap_or(Faction::Azure);
    let cx = config.world_width / 2.0;
    let cy = config.world_height / 2.0;
    let cap = config.node_capacity;

    let home = Node::new(0, cx - 400.0, cy, player, config.starting_count, cap);
    let upper = Node::new(1, cx - 150.0, cy - 150.0, Faction::Neutral, 10.0, cap);
    let mut lower = Node::new(2, cx - 150.0, cy + 150.0, Faction::Neutral, 12.0, cap);
    lower.kind = NodeKind::Hive;
    let mut gate = Node::new(3, cx + 150.0, cy, Faction::Neutral, 25.0, cap);
    gate.kind = NodeKind::Fortress;
    let rival = Node::new(4, cx + 400.0, cy, opponent, 15.0, cap);

    let edges = [(0, 1), (0, 2), (1, 2), (1, 3), (2, 3), (3, 4)]
        .iter()
        .map(|&(a, b)| Edge::new(a, b, EdgeKind::Permanent))
        .collect();

    GameWorld::new(vec![home, upper, lower, gate, rival], edges)
}

fn build_world<R: Rng>(
    points: Vec<(f64, f64)>,
    player: Faction,
    config: &SimConfig,
    rng: &mut R,
) -> GameWorld {
    let lo = config.neutral_count_min.min(config.neutral_count_max);
    let hi = config.neutral_count_min.max(config.neutral_count_max);
    let mut nodes: Vec<Node> = points
        .into_iter()
        .enumerate()
        .map(|(i, (x, y))| {
            let count = rng.gen_range(lo..=hi) as f64;
            Node::new(i as u32, x, y, Faction::Neutral, count, config.node_capacity)
        })
        .collect();

    seed_factions(&mut nodes, player, config, rng);
    assign_special_kinds(&mut nodes, config, rng);
    let edges = build_edges(&nodes, config);
    GameWorld::new(nodes, edges)
}

/// The player's colour plus every other playable colour get one random node.
fn seed_factions<R: Rng>(nodes: &mut [Node], player: Faction, config: &SimConfig, rng: &mut R) {
    let mut order: Vec<Faction> = vec![player];
    order.extend(Faction::PLAYABLE.iter().copied().filter(|f| *f != player));

    let mut indices: Vec<usize> = (0..nodes.len()).collect();
    indices.shuffle(rng);
    for (faction, idx) in order.into_iter().zip(indices) {
        let node = &mut nodes[idx];
        node.owner = faction;
        node.count = config.starting_count;
    }
}

fn assign_special_kinds<R: Rng>(nodes: &mut [Node], config: &SimConfig, rng: &mut R) {
    let mut neutral: Vec<usize> = nodes
        .iter()
        .enumerate()
        .filter(|(_, n)| n.owner.is_neutral())
        .map(|(i, _)| i)
        .collect();
    neutral.shuffle(rng);

    let kinds = std::iter::repeat(NodeKind::Fortress)
        .take(config.fortress_count as usize)
        .chain(std::iter::repeat(NodeKind::Hive).take(config.hive_count as usize));
    for (idx, kind) in neutral.into_iter().zip(kinds) {
        nodes[idx].kind = kind;
    }
}

// ---------------------------------------------------------------------------
// Placement
// ---------------------------------------------------------------------------

fn scatter<R: Rng>(count: usize, config: &SimConfig, rng: &mut R) -> Vec<(f64, f64)> {
    let (x_lo, x_hi) = axis_bounds(config.world_width, config.margin);
    let (y_lo, y_hi) = axis_bounds(config.world_height, config.margin);
    (0..count)
        .map(|_| (rng.gen_range(x_lo..=x_hi), rng.gen_range(y_lo..=y_hi)))
        .collect()
}

fn axis_bounds(extent: f64, margin: f64) -> (f64, f64) {
    let lo = margin.min(extent / 2.0);
    let hi = (extent - margin).max(lo);
    (lo, hi)
}

/// Pairwise repulsion until nodes sit at least `min_node_spacing` apart or the
/// iteration budget runs out.
fn relax(points: &mut [(f64, f64)], config: &SimConfig) {
    let (x_lo, x_hi) = axis_bounds(config.world_width, config.margin);
    let (y_lo, y_hi) = axis_bounds(config.world_height, config.margin);
    let spacing = config.min_node_spacing;

    for _ in 0..config.relaxation_iterations {
        let mut moved = false;
        for i in 0..points.len() {
            for j in (i + 1)..points.len() {
                let dx = points[j].0 - points[i].0;
                let dy = points[j].1 - points[i].1;
                let dist = (dx * dx + dy * dy).sqrt();
                if dist >= spacing {
                    continue;
                }
                // Coincident points: split along a fixed per-pair direction.
                let (ux, uy) = if dist < 1e-6 {
                    let angle = (i * 31 + j * 17) as f64;
                    (angle.cos(), angle.sin())
                } else {
                    (dx / dist, dy / dist)
                };
                let push = (spacing - dist) / 2.0;
                points[i].0 -= ux * push;
                points[i].1 -= uy * push;
                points[j].0 += ux * push;
                points[j].1 += uy * push;
                moved = true;
            }
        }
        for p in points.iter_mut() {
            p.0 = p.0.clamp(x_lo, x_hi);
            p.1 = p.1.clamp(y_lo, y_hi);
        }
        if !moved {
            break;
        }
    }
}

// ---------------------------------------------------------------------------
// Edges
// ---------------------------------------------------------------------------

/// Spanning-tree edges (permanent) plus the shortest remaining pairs under the
/// distance threshold (random), up to the quota.
pub fn build_edges(nodes: &[Node], config: &SimConfig) -> Vec<Edge> {
    let mut graph = UnGraph::<u32, f64>::with_capacity(nodes.len(), nodes.len() * nodes.len() / 2);
    let indices: Vec<NodeIndex> = nodes.iter().map(|n| graph.add_node(n.id)).collect();
    for i in 0..nodes.len() {
        for j in (i + 1)..nodes.len() {
            graph.add_edge(indices[i], indices[j], nodes[i].distance_to(&nodes[j]));
        }
    }

    let mut edges: Vec<Edge> = Vec::with_capacity(nodes.len() * 2);
    for element in min_spanning_tree(&graph) {
        if let Element::Edge { source, target, .. } = element {
            edges.push(Edge::new(nodes[source].id, nodes[target].id, EdgeKind::Permanent));
        }
    }

    let taken: HashSet<EdgeKey> = edges.iter().map(|e| e.key()).collect();
    let mut candidates = candidate_pairs(nodes, config, &taken);
    candidates.sort_by(|a, b| a.2.total_cmp(&b.2));
    edges.extend(
        candidates
            .into_iter()
            .take(config.random_edge_quota(nodes.len()))
            .map(|(a, b, _)| Edge::new(a, b, EdgeKind::Random)),
    );
    edges
}

fn candidate_pairs(nodes: &[Node], config: &SimConfig, taken: &HashSet<EdgeKey>) -> Vec<(u32, u32, f64)> {
    let mut out = Vec::new();
    for i in 0..nodes.len() {
        for j in (i + 1)..nodes.len() {
            let (a, b) = (&nodes[i], &nodes[j]);
            let dist = a.distance_to(b);
            if dist <= config.max_edge_distance && !taken.contains(&EdgeKey::new(a.id, b.id)) {
                out.push((a.id, b.id, dist));
            }
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Current shift
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ShiftReport {
    pub random_edges: usize,
    pub dropped_payloads: usize,
    pub dropped_transfers: usize,
}

/// Replace every random edge with a freshly shuffled set and drop anything
/// travelling on a connection that no longer exists.
pub fn regenerate_random_edges<R: Rng>(world: &mut GameWorld, config: &SimConfig, rng: &mut R) -> ShiftReport {
    world.edges.retain(|e| e.kind == EdgeKind::Permanent);
    let taken: HashSet<EdgeKey> = world.edges.iter().map(|e| e.key()).collect();

    let mut candidates = candidate_pairs(&world.nodes, config, &taken);
    candidates.shuffle(rng);
    let quota = config.random_edge_quota(world.nodes.len());
    let mut added = 0;
    for (a, b, _) in candidates.into_iter().take(quota) {
        world.edges.push(Edge::new(a, b, EdgeKind::Random));
        added += 1;
    }

    let (dropped_payloads, dropped_transfers) = prune_severed(world);
    let report = ShiftReport {
        random_edges: added,
        dropped_payloads,
        dropped_transfers,
    };
    tracing::debug!(?report, "topology shift");
    report
}

/// Remove payloads and transfers whose endpoints are no longer joined by any
/// edge. Returns (payloads dropped, transfers dropped).
pub fn prune_severed(world: &mut GameWorld) -> (usize, usize) {
    let live: HashSet<EdgeKey> = world.edges.iter().map(|e| e.key()).collect();
    let payloads_before = world.payloads.len();
    let transfers_before = world.transfers.len();
    world.payloads.retain(|p| live.contains(&p.edge_key()));
    world.transfers.retain(|t| live.contains(&t.edge_key()));
    (
        payloads_before - world.payloads.len(),
        transfers_before - world.transfers.len(),
    )
}

/// True when every node can reach every other node.
pub fn is_connected(world: &GameWorld) -> bool {
    if world.nodes.len() <= 1 {
        return true;
    }
    let mut graph = UnGraph::<u32, ()>::with_capacity(world.nodes.len(), world.edges.len());
    let index: HashMap<u32, NodeIndex> = world
        .nodes
        .iter()
        .map(|n| (n.id, graph.add_node(n.id)))
        .collect();
    for edge in &world.edges {
        if let (Some(&a), Some(&b)) = (index.get(&edge.source), index.get(&edge.target)) {
            graph.add_edge(a, b, ());
        }
    }
    connected_components(&graph) == 1
}
