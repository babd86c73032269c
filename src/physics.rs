// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Microbe Arena Simulation Engine - Payload Movement, Collisions & Arrivals

use std::collections::BTreeMap;

use crate::config::SimConfig;
use crate::types::{EdgeKey, Faction, GameWorld, Node, SimEvent, TravelPayload};

// ---------------------------------------------------------------------------
// Movement
// ---------------------------------------------------------------------------

/// Advance every payload by its own speed. Returns true if anything moved.
pub fn move_payloads(payloads: &mut [TravelPayload]) -> bool {
    for p in payloads.iter_mut() {
        p.progress += p.speed;
    }
    !payloads.is_empty()
}

// ---------------------------------------------------------------------------
// Collisions
// ---------------------------------------------------------------------------

/// Progress-space width of the collision window on a path of `length` pixels.
pub fn collision_threshold(radius: f64, length: f64) -> f64 {
    radius / length.max(1.0)
}

fn can_collide(a: &TravelPayload, b: &TravelPayload) -> bool {
    a.owner != b.owner && a.source_id != b.source_id
}

/// Find head-on pairs and return, per payload index, whether it was
/// annihilated, plus one event per collision.
///
/// Payloads are bucketed by undirected edge so only those sharing a
/// connection are compared. Each payload is consumed by at most one collision;
/// earlier-spawned payloads pair first.
pub fn detect_collisions(payloads: &[TravelPayload], radius: f64) -> (Vec<bool>, Vec<SimEvent>) {
    let mut removed = vec![false; payloads.len()];
    let mut events = Vec::new();

    let mut by_edge: BTreeMap<EdgeKey, Vec<usize>> = BTreeMap::new();
    for (i, p) in payloads.iter().enumerate() {
        by_edge.entry(p.edge_key()).or_default().push(i);
    }

    for (key, group) in &by_edge {
        if group.len() < 2 {
            continue;
        }
        for (gi, &i) in group.iter().enumerate() {
            if removed[i] {
                continue;
            }
            for &j in &group[gi + 1..] {
                if removed[j] {
                    continue;
                }
                let (a, b) = (&payloads[i], &payloads[j]);
                if !can_collide(a, b) {
                    continue;
                }
                let threshold = collision_threshold(radius, a.path_length());
                let gap = (a.axis_position(*key) - b.axis_position(*key)).abs();
                if gap < threshold {
                    removed[i] = true;
                    removed[j] = true;
                    let (ax, ay) = a.position();
                    let (bx, by) = b.position();
                    events.push(SimEvent::Collision {
                        x: (ax + bx) / 2.0,
                        y: (ay + by) / 2.0,
                        edge: *key,
                        first: a.owner,
                        second: b.owner,
                    });
                    break;
                }
            }
        }
    }

    (removed, events)
}

// ---------------------------------------------------------------------------
// Arrivals
// ---------------------------------------------------------------------------

/// Apply one arriving payload of `count` from `attacker` to `node`.
/// Returns the previous owner when the node was captured.
pub fn resolve_hit(node: &mut Node, attacker: Faction, count: f64) -> Option<Faction> {
    if node.owner == attacker {
        node.count += count;
        return None;
    }
    let damage = count * node.kind.modifiers().damage_taken;
    let result = node.count - damage;
    if result < 0.0 {
        let previous = node.owner;
        node.owner = attacker;
        node.count = result.abs();
        node.prev_owner = Some(previous);
        node.capture_progress = 0.0;
        Some(previous)
    } else {
        node.count = result;
        None
    }
}

fn impact_force(base: f64, target_count: f64) -> f64 {
    base / target_count.max(1.0).sqrt()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PhysicsReport {
    pub collisions: usize,
    pub arrivals: usize,
    pub captures: usize,
    pub dropped: usize,
}

impl PhysicsReport {
    pub fn any(&self) -> bool {
        self.collisions + self.arrivals + self.dropped > 0
    }
}

/// Move, collide and land every payload in `world`, appending presentation
/// events to `events`.
///
/// Arrivals are applied strictly in payload order against the running node
/// state, so several hits in one tick compound.
pub fn step_payloads(world: &mut GameWorld, config: &SimConfig, events: &mut Vec<SimEvent>) -> PhysicsReport {
    let mut report = PhysicsReport::default();

    let before = world.payloads.len();
    let nodes = &world.nodes;
    world
        .payloads
        .retain(|p| nodes.iter().any(|n| n.id == p.source_id) && nodes.iter().any(|n| n.id == p.target_id));
    report.dropped = before - world.payloads.len();

    move_payloads(&mut world.payloads);

    let (removed, collision_events) = detect_collisions(&world.payloads, config.collision_radius);
    report.collisions = collision_events.len();
    events.extend(collision_events);

    let mut survivors = Vec::with_capacity(world.payloads.len());
    for (payload, gone) in std::mem::take(&mut world.payloads).into_iter().zip(removed) {
        if gone {
            continue;
        }
        if payload.progress < 1.0 {
            survivors.push(payload);
            continue;
        }

        let Some(target) = world.node_mut(payload.target_id) else {
            report.dropped += 1;
            continue;
        };
        let force = impact_force(config.impact_force, target.count);
        let captured = resolve_hit(target, payload.owner, payload.count);
        report.arrivals += 1;
        events.push(SimEvent::Impact {
            node_id: payload.target_id,
            angle: payload.heading(),
            force,
            color: payload.owner,
        });
        if let Some(previous) = captured {
            report.captures += 1;
            tracing::info!(node = payload.target_id, from = ?previous, to = ?payload.owner, "node captured");
            events.push(SimEvent::Capture {
                node_id: payload.target_id,
                from: previous,
                to: payload.owner,
            });
        }
    }
    world.payloads = survivors;

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Edge, EdgeKind, NodeKind};

    fn line_world() -> GameWorld {
        let nodes = vec![
            Node::new(0, 0.0, 0.0, Faction::Crimson, 20.0, 100.0),
            Node::new(1, 300.0, 0.0, Faction::Azure, 20.0, 100.0),
        ];
        GameWorld::new(nodes, vec![Edge::new(0, 1, EdgeKind::Permanent)])
    }

    fn payload(id: u64, owner: Faction, source_id: u32, target_id: u32, progress: f64, speed: f64) -> TravelPayload {
        let (sx, ex) = if source_id == 0 { (0.0, 300.0) } else { (300.0, 0.0) };
        TravelPayload {
            id,
            owner,
            source_id,
            target_id,
            count: 1.0,
            progress,
            speed,
            start_x: sx,
            start_y: 0.0,
            end_x: ex,
            end_y: 0.0,
        }
    }

    #[test]
    fn test_head_on_opponents_annihilate_together() {
        // Axis positions 0.48 and 1 - 0.5 = 0.50; threshold 15/300 = 0.05
        let payloads = vec![
            payload(1, Faction::Crimson, 0, 1, 0.48, 0.0),
            payload(2, Faction::Azure, 1, 0, 0.50, 0.0),
        ];
        let (removed, events) = detect_collisions(&payloads, 15.0);
        assert_eq!(removed, vec![true, true]);
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn test_same_owner_never_collides() {
        let payloads = vec![
            payload(1, Faction::Crimson, 0, 1, 0.5, 0.0),
            payload(2, Faction::Crimson, 1, 0, 0.5, 0.0),
        ];
        let (removed, events) = detect_collisions(&payloads, 15.0);
        assert_eq!(removed, vec![false, false]);
        assert!(events.is_empty());
    }

    #[test]
    fn test_same_direction_opponents_pass() {
        let payloads = vec![
            payload(1, Faction::Crimson, 0, 1, 0.5, 0.0),
            payload(2, Faction::Azure, 0, 1, 0.5, 0.0),
        ];
        let (removed, _) = detect_collisions(&payloads, 15.0);
        assert_eq!(removed, vec![false, false]);
    }

    #[test]
    fn test_far_apart_opponents_do_not_collide() {
        let payloads = vec![
            payload(1, Faction::Crimson, 0, 1, 0.2, 0.0),
            payload(2, Faction::Azure, 1, 0, 0.2, 0.0),
        ];
        let (removed, _) = detect_collisions(&payloads, 15.0);
        assert_eq!(removed, vec![false, false]);
    }

    #[test]
    fn test_each_payload_consumed_once() {
        let payloads = vec![
            payload(1, Faction::Crimson, 0, 1, 0.5, 0.0),
            payload(2, Faction::Azure, 1, 0, 0.5, 0.0),
            payload(3, Faction::Azure, 1, 0, 0.5, 0.0),
        ];
        let (removed, events) = detect_collisions(&payloads, 15.0);
        assert_eq!(removed, vec![true, true, false]);
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn test_fortress_capture_arithmetic() {
        let mut node = Node::new(0, 0.0, 0.0, Faction::Azure, 5.0, 100.0);
        node.kind = NodeKind::Fortress;
        let previous = resolve_hit(&mut node, Faction::Crimson, 12.0);
        assert_eq!(previous, Some(Faction::Azure));
        assert_eq!(node.owner, Faction::Crimson);
        assert_eq!(node.count, 1.0);
        assert_eq!(node.prev_owner, Some(Faction::Azure));
        assert_eq!(node.capture_progress, 0.0);
        assert_eq!(node.kind, NodeKind::Fortress);
    }

    #[test]
    fn test_damage_without_capture_and_reinforcement() {
        let mut node = Node::new(0, 0.0, 0.0, Faction::Azure, 5.0, 100.0);
        assert_eq!(resolve_hit(&mut node, Faction::Crimson, 5.0), None);
        assert_eq!(node.count, 0.0);
        assert_eq!(node.owner, Faction::Azure);
        assert_eq!(resolve_hit(&mut node, Faction::Azure, 3.0), None);
        assert_eq!(node.count, 3.0);
    }

    #[test]
    fn test_arrivals_compound_within_a_tick() {
        let cfg = SimConfig::default();
        let mut world = line_world();
        world.nodes[1].count = 1.5;
        world.payloads = vec![
            payload(1, Faction::Crimson, 0, 1, 0.999, 0.01),
            payload(2, Faction::Crimson, 0, 1, 0.995, 0.01),
        ];
        let mut events = Vec::new();
        let report = step_payloads(&mut world, &cfg, &mut events);
        assert_eq!(report.arrivals, 2);
        assert_eq!(report.captures, 1);
        assert_eq!(world.nodes[1].owner, Faction::Crimson);
        assert!((world.nodes[1].count - 0.5).abs() < 1e-12);
        assert!(world.payloads.is_empty());
        let impacts = events.iter().filter(|e| matches!(e, SimEvent::Impact { .. })).count();
        assert_eq!(impacts, 2);
    }

    #[test]
    fn test_collided_payloads_never_arrive() {
        let cfg = SimConfig::default();
        let mut world = line_world();
        world.payloads = vec![
            payload(1, Faction::Crimson, 0, 1, 0.49, 0.0),
            payload(2, Faction::Azure, 1, 0, 0.5, 0.0),
            payload(3, Faction::Crimson, 0, 1, 0.1, 0.05),
        ];
        let mut events = Vec::new();
        let report = step_payloads(&mut world, &cfg, &mut events);
        assert_eq!(report.collisions, 1);
        assert_eq!(world.payloads.len(), 1);
        assert_eq!(world.payloads[0].id, 3);
        assert!((world.payloads[0].progress - 0.15).abs() < 1e-12);
        assert_eq!(world.nodes[0].count, 20.0);
        assert_eq!(world.nodes[1].count, 20.0);
    }

    #[test]
    fn test_orphaned_payload_dropped() {
        let cfg = SimConfig::default();
        let mut world = line_world();
        world.payloads = vec![payload(1, Faction::Crimson, 0, 7, 0.99, 0.1)];
        let mut events = Vec::new();
        let report = step_payloads(&mut world, &cfg, &mut events);
        assert_eq!(report.dropped, 1);
        assert!(world.payloads.is_empty());
        assert!(events.is_empty());
    }

    #[test]
    fn test_impact_force_falls_with_mass() {
        assert!(impact_force(12.0, 100.0) < impact_force(12.0, 4.0));
        assert_eq!(impact_force(12.0, 0.0), 12.0);
    }
}
