// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Microbe Arena Simulation Engine - Attack Orders & Payload Spawning

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::config::SimConfig;
use crate::types::{ActiveTransfer, EdgeKey, Faction, GameWorld, Quota, TravelPayload};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Rejected orders. These are input mistakes, never engine faults, and leave
/// the world untouched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("neutral cannot issue orders")]
    NeutralIssuer,
    #[error("node {0} does not exist")]
    UnknownNode(u32),
    #[error("source and target are the same node ({0})")]
    SameNode(u32),
    #[error("node {node} is not owned by {issuer:?}")]
    NotOwner { node: u32, issuer: Faction },
    #[error("nodes {0} and {1} are not connected")]
    NotConnected(u32, u32),
    #[error("node {0} has too few units to send")]
    InsufficientUnits(u32),
}

// ---------------------------------------------------------------------------
// Orders
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackOrder {
    pub issuer: Faction,
    pub from: u32,
    pub to: u32,
    /// Standing stream instead of a one-shot half of the source.
    pub continuous: bool,
}

/// Create a transfer for `order`, or merge it into the one already running on
/// the same source→target pair. Returns the id of the affected transfer.
///
/// One-shot orders send `floor(source.count / 2)` units. Merging keeps the
/// existing spawn rhythm: continuous wins, finite goals are added.
pub fn issue_attack(world: &mut GameWorld, order: AttackOrder) -> Result<u64, CommandError> {
    if order.issuer.is_neutral() {
        return Err(CommandError::NeutralIssuer);
    }
    if order.from == order.to {
        return Err(CommandError::SameNode(order.from));
    }
    let source = world.node(order.from).ok_or(CommandError::UnknownNode(order.from))?;
    if world.node(order.to).is_none() {
        return Err(CommandError::UnknownNode(order.to));
    }
    if source.owner != order.issuer {
        return Err(CommandError::NotOwner { node: order.from, issuer: order.issuer });
    }
    if !world.has_edge(order.from, order.to) {
        return Err(CommandError::NotConnected(order.from, order.to));
    }

    let quota = if order.continuous {
        Quota::Continuous
    } else {
        let amount = (source.count / 2.0).floor();
        if amount < 1.0 {
            return Err(CommandError::InsufficientUnits(order.from));
        }
        Quota::Finite(amount as u32)
    };

    let existing = world
        .transfers
        .iter_mut()
        .find(|t| t.source_id == order.from && t.target_id == order.to);
    if let Some(transfer) = existing {
        if transfer.owner == order.issuer {
            transfer.quota = transfer.quota.merge(quota);
        } else {
            // Left over from a previous owner of the source; start afresh.
            transfer.owner = order.issuer;
            transfer.quota = quota;
            transfer.sent_count = 0;
        }
        return Ok(transfer.id);
    }

    let id = world.alloc_id();
    world.transfers.push(ActiveTransfer {
        id,
        source_id: order.from,
        target_id: order.to,
        owner: order.issuer,
        quota,
        sent_count: 0,
        last_spawn_time: 0.0,
    });
    Ok(id)
}

/// Drop the issuer's transfers leaving `from`, or only the one towards `to`.
/// Returns how many were removed.
pub fn cancel_transfers(world: &mut GameWorld, issuer: Faction, from: u32, to: Option<u32>) -> usize {
    let before = world.transfers.len();
    world.transfers.retain(|t| {
        let matches = t.owner == issuer
            && t.source_id == from
            && to.map_or(true, |target| t.target_id == target);
        !matches
    });
    before - world.transfers.len()
}

// ---------------------------------------------------------------------------
// Spawn rhythm
// ---------------------------------------------------------------------------

/// Milliseconds between spawns: larger sources fire faster, down to a floor.
pub fn dynamic_spawn_interval(source_count: f64, config: &SimConfig) -> f64 {
    let interval = config.base_spawn_interval_ms / (1.0 + source_count.max(1.0).ln());
    interval.max(config.min_spawn_interval_ms)
}

/// Pixel speed per tick of a unit leaving a source of `source_count`.
pub fn calculate_unit_speed(source_count: f64, base_pixel_speed: f64) -> f64 {
    base_pixel_speed * (1.0 + 0.2 * source_count.max(1.0).ln())
}

/// Spawn at most one payload per transfer whose interval has elapsed, and drop
/// transfers that are invalid or have sent their full quota.
/// Returns the number of payloads spawned.
pub fn spawn_payloads(world: &mut GameWorld, now: f64, config: &SimConfig) -> usize {
    let live: HashSet<EdgeKey> = world.edges.iter().map(|e| e.key()).collect();
    let mut spawned = 0;
    let mut kept = Vec::with_capacity(world.transfers.len());

    for mut transfer in std::mem::take(&mut world.transfers) {
        let (Some(si), Some(ti)) = (world.node_index(transfer.source_id), world.node_index(transfer.target_id)) else {
            tracing::debug!(transfer = transfer.id, "dropping transfer with missing endpoint");
            continue;
        };
        if world.nodes[si].owner != transfer.owner || !live.contains(&transfer.edge_key()) {
            continue;
        }
        if transfer.quota.is_exhausted(transfer.sent_count) {
            continue;
        }

        let source_count = world.nodes[si].count;
        let interval = dynamic_spawn_interval(source_count, config);
        if now - transfer.last_spawn_time > interval && source_count >= config.unit_count {
            let (start_x, start_y) = (world.nodes[si].x, world.nodes[si].y);
            let (end_x, end_y) = (world.nodes[ti].x, world.nodes[ti].y);
            let length = ((end_x - start_x).powi(2) + (end_y - start_y).powi(2)).sqrt().max(1.0);
            let speed = calculate_unit_speed(source_count, config.base_unit_speed) / length;

            world.nodes[si].count -= config.unit_count;
            let id = world.alloc_id();
            world.payloads.push(TravelPayload {
                id,
                owner: transfer.owner,
                source_id: transfer.source_id,
                target_id: transfer.target_id,
                count: config.unit_count,
                progress: 0.0,
                speed,
                start_x,
                start_y,
                end_x,
                end_y,
            });
            transfer.sent_count += 1;
            transfer.last_spawn_time = now;
            spawned += 1;
        }

        if transfer.quota.has_remaining(transfer.sent_count) {
            kept.push(transfer);
        }
    }

    world.transfers = kept;
    spawned
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Edge, EdgeKind, Node};

    fn two_node_world(source_count: f64) -> GameWorld {
        let nodes = vec![
            Node::new(0, 0.0, 0.0, Faction::Crimson, source_count, 100.0),
            Node::new(1, 200.0, 0.0, Faction::Neutral, 10.0, 100.0),
            Node::new(2, 0.0, 300.0, Faction::Neutral, 10.0, 100.0),
        ];
        GameWorld::new(nodes, vec![Edge::new(0, 1, EdgeKind::Permanent)])
    }

    fn order(from: u32, to: u32, continuous: bool) -> AttackOrder {
        AttackOrder { issuer: Faction::Crimson, from, to, continuous }
    }

    #[test]
    fn test_one_shot_sends_half_rounded_down() {
        let mut world = two_node_world(21.0);
        issue_attack(&mut world, order(0, 1, false)).unwrap();
        assert_eq!(world.transfers.len(), 1);
        assert_eq!(world.transfers[0].quota, Quota::Finite(10));
        assert_eq!(world.transfers[0].sent_count, 0);
    }

    #[test]
    fn test_invalid_orders_are_rejected_without_mutation() {
        let mut world = two_node_world(20.0);
        assert_eq!(issue_attack(&mut world, order(0, 2, false)), Err(CommandError::NotConnected(0, 2)));
        assert_eq!(
            issue_attack(&mut world, order(1, 0, false)),
            Err(CommandError::NotOwner { node: 1, issuer: Faction::Crimson })
        );
        assert_eq!(issue_attack(&mut world, order(0, 9, false)), Err(CommandError::UnknownNode(9)));
        assert_eq!(issue_attack(&mut world, order(0, 0, false)), Err(CommandError::SameNode(0)));
        let neutral = AttackOrder { issuer: Faction::Neutral, from: 1, to: 0, continuous: true };
        assert_eq!(issue_attack(&mut world, neutral), Err(CommandError::NeutralIssuer));
        assert!(world.transfers.is_empty());

        let mut weak = two_node_world(1.0);
        assert_eq!(issue_attack(&mut weak, order(0, 1, false)), Err(CommandError::InsufficientUnits(0)));
        assert!(weak.transfers.is_empty());
    }

    #[test]
    fn test_finite_merge_adds_to_goal_and_keeps_rhythm() {
        let mut world = two_node_world(20.0);
        world.transfers.push(ActiveTransfer {
            id: 99,
            source_id: 0,
            target_id: 1,
            owner: Faction::Crimson,
            quota: Quota::Finite(8),
            sent_count: 3,
            last_spawn_time: 1234.0,
        });
        let id = issue_attack(&mut world, order(0, 1, false)).unwrap();
        assert_eq!(id, 99);
        assert_eq!(world.transfers.len(), 1);
        assert_eq!(world.transfers[0].quota, Quota::Finite(18));
        assert_eq!(world.transfers[0].sent_count, 3);
        assert_eq!(world.transfers[0].last_spawn_time, 1234.0);
    }

    #[test]
    fn test_continuous_wins_merge() {
        let mut world = two_node_world(20.0);
        issue_attack(&mut world, order(0, 1, false)).unwrap();
        issue_attack(&mut world, order(0, 1, true)).unwrap();
        assert_eq!(world.transfers[0].quota, Quota::Continuous);
        issue_attack(&mut world, order(0, 1, false)).unwrap();
        assert_eq!(world.transfers.len(), 1);
        assert_eq!(world.transfers[0].quota, Quota::Continuous);
    }

    #[test]
    fn test_spawn_interval_shrinks_to_floor() {
        let cfg = SimConfig::default();
        assert_eq!(dynamic_spawn_interval(0.0, &cfg), cfg.base_spawn_interval_ms);
        assert_eq!(dynamic_spawn_interval(1.0, &cfg), cfg.base_spawn_interval_ms);
        let mid = dynamic_spawn_interval(20.0, &cfg);
        assert!(mid < cfg.base_spawn_interval_ms && mid > cfg.min_spawn_interval_ms);
        assert_eq!(dynamic_spawn_interval(1e9, &cfg), cfg.min_spawn_interval_ms);
    }

    #[test]
    fn test_unit_speed_grows_logarithmically() {
        assert_eq!(calculate_unit_speed(1.0, 2.5), 2.5);
        assert_eq!(calculate_unit_speed(0.0, 2.5), 2.5);
        assert!(calculate_unit_speed(100.0, 2.5) > calculate_unit_speed(10.0, 2.5));
        assert!(calculate_unit_speed(100.0, 2.5) < 2.0 * 2.5);
    }

    #[test]
    fn test_spawn_drains_source_and_respects_interval() {
        let cfg = SimConfig::default();
        let mut world = two_node_world(20.0);
        issue_attack(&mut world, order(0, 1, false)).unwrap();

        assert_eq!(spawn_payloads(&mut world, 1000.0, &cfg), 1);
        assert_eq!(world.nodes[0].count, 19.0);
        let p = &world.payloads[0];
        assert_eq!(p.progress, 0.0);
        assert_eq!((p.end_x, p.end_y), (200.0, 0.0));
        assert!((p.speed - calculate_unit_speed(20.0, cfg.base_unit_speed) / 200.0).abs() < 1e-12);

        // Too soon for another unit
        assert_eq!(spawn_payloads(&mut world, 1001.0, &cfg), 0);
        assert_eq!(spawn_payloads(&mut world, 1000.0 + cfg.base_spawn_interval_ms, &cfg), 1);
        assert_eq!(world.transfers[0].sent_count, 2);
    }

    #[test]
    fn test_finite_transfer_discarded_once_quota_sent() {
        let cfg = SimConfig::default();
        let mut world = two_node_world(4.0);
        issue_attack(&mut world, order(0, 1, false)).unwrap();
        let mut now = 0.0;
        for _ in 0..10 {
            now += 1000.0;
            spawn_payloads(&mut world, now, &cfg);
        }
        assert_eq!(world.payloads.len(), 2);
        assert!(world.transfers.is_empty());
        assert_eq!(world.nodes[0].count, 2.0);
    }

    #[test]
    fn test_continuous_transfer_waits_for_units() {
        let cfg = SimConfig::default();
        let mut world = two_node_world(0.0);
        issue_attack(&mut world, order(0, 1, true)).unwrap();
        assert_eq!(spawn_payloads(&mut world, 5000.0, &cfg), 0);
        assert_eq!(world.transfers.len(), 1);
        assert_eq!(world.nodes[0].count, 0.0);
    }

    #[test]
    fn test_transfer_dropped_when_source_changes_hands() {
        let cfg = SimConfig::default();
        let mut world = two_node_world(20.0);
        issue_attack(&mut world, order(0, 1, true)).unwrap();
        world.nodes[0].owner = Faction::Azure;
        assert_eq!(spawn_payloads(&mut world, 5000.0, &cfg), 0);
        assert!(world.transfers.is_empty());
        assert_eq!(world.nodes[0].count, 20.0);
    }

    #[test]
    fn test_cancel_only_touches_issuer_transfers() {
        let mut world = two_node_world(20.0);
        world.edges.push(Edge::new(0, 2, EdgeKind::Random));
        issue_attack(&mut world, order(0, 1, true)).unwrap();
        issue_attack(&mut world, order(0, 2, true)).unwrap();
        assert_eq!(cancel_transfers(&mut world, Faction::Azure, 0, None), 0);
        assert_eq!(cancel_transfers(&mut world, Faction::Crimson, 0, Some(2)), 1);
        assert_eq!(world.transfers.len(), 1);
        assert_eq!(world.transfers[0].target_id, 1);
        assert_eq!(cancel_transfers(&mut world, Faction::Crimson, 0, None), 1);
        assert!(world.transfers.is_empty());
    }
}
