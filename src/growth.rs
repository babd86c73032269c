// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Microbe Arena Simulation Engine - Biomass Growth

use crate::config::SimConfig;
use crate::types::{Node, NodeKind};

/// Fractional growth credited to a node of `count` biomass in one tick.
///
/// `base * (1 + 0.5 * log10(count))`, with `count` clamped to at least 1 so the
/// logarithm never goes negative, times the kind's growth modifier.
pub fn growth_increment(count: f64, kind: NodeKind, base_rate: f64) -> f64 {
    let scale = 1.0 + 0.5 * count.max(1.0).log10();
    base_rate * scale * kind.modifiers().growth
}

/// Advance every owned node's accumulator and credit whole units to `count`.
/// Returns true when any node gained biomass.
pub fn apply_growth(nodes: &mut [Node], config: &SimConfig) -> bool {
    let mut credited = false;
    for node in nodes.iter_mut().filter(|n| !n.owner.is_neutral()) {
        node.growth_accumulator += growth_increment(node.count, node.kind, config.base_growth_per_tick);
        if node.growth_accumulator >= 1.0 {
            let whole = node.growth_accumulator.floor();
            node.count += whole;
            node.growth_accumulator -= whole;
            credited = true;
        }
    }
    credited
}

/// Step the cosmetic capture animation towards completion.
/// Returns true while any node is still animating.
pub fn advance_capture_progress(nodes: &mut [Node], step: f64) -> bool {
    let mut animating = false;
    for node in nodes.iter_mut().filter(|n| n.capture_progress < 1.0) {
        node.capture_progress = (node.capture_progress + step).min(1.0);
        animating = true;
    }
    animating
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Faction;

    #[test]
    fn test_increment_at_unit_count_is_base_rate() {
        assert!((growth_increment(1.0, NodeKind::Standard, 0.04) - 0.04).abs() < 1e-12);
        // Clamped: empty nodes grow like a single unit
        assert!((growth_increment(0.0, NodeKind::Standard, 0.04) - 0.04).abs() < 1e-12);
    }

    #[test]
    fn test_increment_strictly_increases_above_one() {
        let mut last = growth_increment(1.0, NodeKind::Standard, 0.04);
        for c in [1.5, 2.0, 5.0, 10.0, 100.0, 1000.0] {
            let inc = growth_increment(c, NodeKind::Standard, 0.04);
            assert!(inc > last, "increment at {} not above previous", c);
            last = inc;
        }
        // log10(100) = 2 -> scale 2.0
        assert!((growth_increment(100.0, NodeKind::Standard, 0.04) - 0.08).abs() < 1e-12);
    }

    #[test]
    fn test_hive_multiplier() {
        let plain = growth_increment(50.0, NodeKind::Standard, 0.04);
        let hive = growth_increment(50.0, NodeKind::Hive, 0.04);
        assert!((hive / plain - 1.6).abs() < 1e-12);
        assert_eq!(growth_increment(50.0, NodeKind::Fortress, 0.04), plain);
    }

    #[test]
    fn test_accumulator_credits_whole_units_only() {
        let cfg = SimConfig { base_growth_per_tick: 0.3, ..SimConfig::default() };
        let mut nodes = vec![Node::new(0, 0.0, 0.0, Faction::Crimson, 1.0, 100.0)];
        // 0.3 per tick at count 1: credit on the 4th tick
        for _ in 0..3 {
            assert!(!apply_growth(&mut nodes, &cfg));
        }
        assert_eq!(nodes[0].count, 1.0);
        assert!(apply_growth(&mut nodes, &cfg));
        assert_eq!(nodes[0].count, 2.0);
        assert!(nodes[0].growth_accumulator < 1.0);
        assert!(nodes[0].growth_accumulator >= 0.0);
    }

    #[test]
    fn test_neutral_nodes_never_grow() {
        let cfg = SimConfig::default();
        let mut nodes = vec![Node::new(0, 0.0, 0.0, Faction::Neutral, 20.0, 100.0)];
        for _ in 0..500 {
            apply_growth(&mut nodes, &cfg);
        }
        assert_eq!(nodes[0].count, 20.0);
        assert_eq!(nodes[0].growth_accumulator, 0.0);
    }

    #[test]
    fn test_capture_progress_clamps_at_one() {
        let mut nodes = vec![Node::new(0, 0.0, 0.0, Faction::Crimson, 5.0, 100.0)];
        nodes[0].capture_progress = 0.0;
        let mut ticks = 0;
        while advance_capture_progress(&mut nodes, 0.3) {
            ticks += 1;
        }
        assert_eq!(ticks, 4);
        assert_eq!(nodes[0].capture_progress, 1.0);
    }
}
