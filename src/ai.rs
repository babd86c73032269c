// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Microbe Arena Simulation Engine - Opponent Decision Making
//
// Every controlled node scores its neighbours (expand / attack / reinforce),
// picks the best, and issues the same order a human would. Scores carry a
// random jitter and a final coin-flip so play is not mechanically predictable.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::config::DifficultyProfile;
use crate::transfer::{issue_attack, AttackOrder};
use crate::types::{Faction, GameWorld, Node, NodeKind};

const MIN_ACTING_COUNT: f64 = 10.0;
const MIN_SEND_COUNT: f64 = 2.0;
const SATURATED: f64 = 0.8;
const BERSERK: f64 = 0.9;
const JITTER: f64 = 20.0;

const NEUTRAL_BASE: f64 = 100.0;
const VENT_BONUS: f64 = 50.0;
const HIVE_BONUS: f64 = 40.0;
const FORTRESS_BONUS: f64 = 30.0;

const FORTRESS_ASSAULT_BASE: f64 = 30.0;
const FORTRESS_PENALTY: f64 = -500.0;
const BERSERK_BASE: f64 = 100.0;
const WINNABLE_BASE: f64 = 50.0;
const CALCULATED_RISK: f64 = -20.0;
const RISK_MARGIN: f64 = 10.0;
const FORBIDDEN: f64 = -1000.0;

const WEAK_ALLY_COUNT: f64 = 15.0;
const WEAK_ALLY_BASE: f64 = 40.0;
const WEAK_ALLY_PER_UNIT: f64 = 3.0;
const THIN_ALLY_SCORE: f64 = 15.0;
const CLUSTER_PENALTY: f64 = -40.0;

const SATURATED_THRESHOLD: f64 = 10.0;
const CALM_THRESHOLD: f64 = 30.0;
const SURE_THING: f64 = 50.0;
const FOLLOW_THROUGH: f64 = 0.7;

/// Deterministic part of a candidate's score, before jitter.
pub fn score_target(source: &Node, target: &Node) -> f64 {
    let saturation = source.saturation();

    if target.owner.is_neutral() {
        let mut score = NEUTRAL_BASE - target.count;
        if saturation > SATURATED {
            score += VENT_BONUS;
        }
        score += match target.kind {
            NodeKind::Hive => HIVE_BONUS,
            NodeKind::Fortress => FORTRESS_BONUS,
            NodeKind::Standard => 0.0,
        };
        return score;
    }

    if target.owner == source.owner {
        if target.count < WEAK_ALLY_COUNT {
            return WEAK_ALLY_BASE + (WEAK_ALLY_COUNT - target.count) * WEAK_ALLY_PER_UNIT;
        }
        if target.count < target.capacity * 0.5 {
            return THIN_ALLY_SCORE;
        }
        if saturation > SATURATED && target.saturation() > SATURATED {
            return CLUSTER_PENALTY * 2.0;
        }
        return CLUSTER_PENALTY;
    }

    if target.kind == NodeKind::Fortress {
        let margin = source.count - 2.0 * target.count;
        return if margin > 0.0 {
            FORTRESS_ASSAULT_BASE + margin
        } else {
            FORTRESS_PENALTY
        };
    }

    let diff = source.count - target.count;
    if saturation > BERSERK {
        // Idling while overflowing is worse than a costly attack.
        BERSERK_BASE + 0.1 * diff
    } else if diff > 0.0 {
        WINNABLE_BASE + diff
    } else if -diff <= RISK_MARGIN {
        CALCULATED_RISK
    } else {
        FORBIDDEN
    }
}

/// Run one decision pass and issue the resulting orders.
/// Returns the orders that were accepted.
pub fn run_ai<R: Rng>(
    world: &mut GameWorld,
    player: Faction,
    autopilot: bool,
    profile: &DifficultyProfile,
    rng: &mut R,
) -> Vec<AttackOrder> {
    let orders = plan_actions(world, player, autopilot, profile, rng);
    orders
        .into_iter()
        .filter(|order| match issue_attack(world, *order) {
            Ok(_) => true,
            Err(err) => {
                tracing::debug!(%err, ?order, "ai order rejected");
                false
            }
        })
        .collect()
}

/// Decide orders against a fixed snapshot of `world`.
pub fn plan_actions<R: Rng>(
    world: &GameWorld,
    player: Faction,
    autopilot: bool,
    profile: &DifficultyProfile,
    rng: &mut R,
) -> Vec<AttackOrder> {
    let mut controlled: Vec<&Node> = world
        .nodes
        .iter()
        .filter(|n| !n.owner.is_neutral() && (n.owner != player || autopilot))
        .collect();
    controlled.shuffle(rng);

    let mut orders = Vec::new();
    for source in controlled {
        if profile.max_actions_per_tick.map_or(false, |cap| orders.len() >= cap as usize) {
            break;
        }
        if rng.gen::<f64>() < profile.hesitation_chance {
            continue;
        }
        if source.count < MIN_ACTING_COUNT {
            continue;
        }

        let mut best: Option<(u32, f64)> = None;
        for neighbor_id in world.neighbors(source.id) {
            let Some(target) = world.node(neighbor_id) else {
                continue;
            };
            let score = score_target(source, target) + rng.gen::<f64>() * JITTER;
            if best.map_or(true, |(_, s)| score > s) {
                best = Some((neighbor_id, score));
            }
        }
        let Some((target_id, score)) = best else {
            continue;
        };

        let threshold = if source.saturation() > SATURATED {
            SATURATED_THRESHOLD
        } else {
            CALM_THRESHOLD
        };
        if score <= threshold {
            continue;
        }
        if score <= SURE_THING && rng.gen::<f64>() >= FOLLOW_THROUGH {
            continue;
        }
        if source.count <= MIN_SEND_COUNT {
            continue;
        }
        orders.push(AttackOrder {
            issuer: source.owner,
            from: source.id,
            to: target_id,
            continuous: false,
        });
    }
    orders
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Difficulty;
    use crate::types::{Edge, EdgeKind, Quota};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn node(id: u32, owner: Faction, count: f64) -> Node {
        Node::new(id, 0.0, 0.0, owner, count, 100.0)
    }

    #[test]
    fn test_neutral_scoring() {
        let source = node(0, Faction::Azure, 40.0);
        assert_eq!(score_target(&source, &node(1, Faction::Neutral, 20.0)), 80.0);

        let mut hive = node(1, Faction::Neutral, 20.0);
        hive.kind = NodeKind::Hive;
        assert_eq!(score_target(&source, &hive), 120.0);

        let mut fortress = node(1, Faction::Neutral, 20.0);
        fortress.kind = NodeKind::Fortress;
        assert_eq!(score_target(&source, &fortress), 110.0);

        let full = node(0, Faction::Azure, 85.0);
        assert_eq!(score_target(&full, &node(1, Faction::Neutral, 20.0)), 130.0);
    }

    #[test]
    fn test_enemy_scoring() {
        let source = node(0, Faction::Azure, 40.0);
        assert_eq!(score_target(&source, &node(1, Faction::Crimson, 30.0)), 60.0);
        assert_eq!(score_target(&source, &node(1, Faction::Crimson, 45.0)), -20.0);
        assert_eq!(score_target(&source, &node(1, Faction::Crimson, 60.0)), -1000.0);

        let berserk = node(0, Faction::Azure, 95.0);
        let score = score_target(&berserk, &node(1, Faction::Crimson, 200.0));
        assert!((score - (100.0 + 0.1 * -105.0)).abs() < 1e-9);
    }

    #[test]
    fn test_enemy_fortress_scoring() {
        let source = node(0, Faction::Azure, 40.0);
        let mut fortress = node(1, Faction::Crimson, 15.0);
        fortress.kind = NodeKind::Fortress;
        assert_eq!(score_target(&source, &fortress), 40.0);
        fortress.count = 20.0;
        assert_eq!(score_target(&source, &fortress), -500.0);
    }

    #[test]
    fn test_friendly_scoring() {
        let source = node(0, Faction::Azure, 40.0);
        assert_eq!(score_target(&source, &node(1, Faction::Azure, 5.0)), 70.0);
        assert_eq!(score_target(&source, &node(1, Faction::Azure, 30.0)), 15.0);
        assert_eq!(score_target(&source, &node(1, Faction::Azure, 60.0)), -40.0);

        let full = node(0, Faction::Azure, 90.0);
        assert_eq!(score_target(&full, &node(1, Faction::Azure, 85.0)), -80.0);
    }

    fn duel_world() -> GameWorld {
        let nodes = vec![
            node(0, Faction::Crimson, 20.0),
            node(1, Faction::Azure, 60.0),
            node(2, Faction::Neutral, 5.0),
        ];
        let edges = vec![
            Edge::new(0, 1, EdgeKind::Permanent),
            Edge::new(1, 2, EdgeKind::Permanent),
        ];
        GameWorld::new(nodes, edges)
    }

    #[test]
    fn test_apex_ai_expands_into_cheap_neutral() {
        let mut world = duel_world();
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let profile = Difficulty::Apex.profile();
        let orders = run_ai(&mut world, Faction::Crimson, false, &profile, &mut rng);
        // Both neighbours clear the sure-thing bar; the player's node is left alone.
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].from, 1);
        assert_eq!(world.transfers.len(), 1);
        assert_eq!(world.transfers[0].quota, Quota::Finite(30));
        assert_eq!(world.transfers[0].owner, Faction::Azure);
    }

    #[test]
    fn test_autopilot_drives_player_nodes() {
        let mut world = duel_world();
        world.nodes[1].count = 5.0;
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let profile = Difficulty::Apex.profile();
        let orders = run_ai(&mut world, Faction::Crimson, true, &profile, &mut rng);
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].issuer, Faction::Crimson);
        assert_eq!(orders[0].to, 1);
    }

    #[test]
    fn test_weak_nodes_stay_idle() {
        let mut world = duel_world();
        world.nodes[1].count = 9.0;
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let profile = Difficulty::Apex.profile();
        assert!(run_ai(&mut world, Faction::Crimson, false, &profile, &mut rng).is_empty());
        assert!(world.transfers.is_empty());
    }

    #[test]
    fn test_total_hesitation_never_acts() {
        let world = duel_world();
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let profile = DifficultyProfile {
            action_interval_ms: 0.0,
            max_actions_per_tick: None,
            hesitation_chance: 1.0,
        };
        for _ in 0..50 {
            assert!(plan_actions(&world, Faction::Crimson, false, &profile, &mut rng).is_empty());
        }
    }

    #[test]
    fn test_action_cap_is_respected() {
        let mut nodes = vec![node(0, Faction::Neutral, 1.0)];
        let mut edges = Vec::new();
        for id in 1..=6 {
            nodes.push(node(id, Faction::Azure, 40.0));
            edges.push(Edge::new(0, id, EdgeKind::Permanent));
        }
        let world = GameWorld::new(nodes, edges);
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let profile = DifficultyProfile {
            action_interval_ms: 0.0,
            max_actions_per_tick: Some(2),
            hesitation_chance: 0.0,
        };
        let orders = plan_actions(&world, Faction::Crimson, false, &profile, &mut rng);
        assert_eq!(orders.len(), 2);
    }
}
