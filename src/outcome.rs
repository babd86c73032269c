// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Microbe Arena Simulation Engine - Victory / Defeat Detection

use std::collections::BTreeMap;

use crate::types::{Faction, FactionSummary, GameWorld, WinState};

/// Advisory end-of-match check from `color`'s point of view.
///
/// Victory: no enemy-owned node remains and `color` still holds a node.
/// Defeat: `color` has no node, no payload in flight and no standing transfer.
pub fn check_win_condition(world: &GameWorld, color: Faction) -> WinState {
    let owned = world.nodes.iter().filter(|n| n.owner == color).count();
    let enemies = world
        .nodes
        .iter()
        .filter(|n| !n.owner.is_neutral() && n.owner != color)
        .count();

    if enemies == 0 && owned > 0 {
        return WinState { winner: Some(color), is_game_over: true };
    }

    let assets = owned
        + world.payloads.iter().filter(|p| p.owner == color).count()
        + world.transfers.iter().filter(|t| t.owner == color).count();
    if assets == 0 {
        return WinState { winner: None, is_game_over: true };
    }

    WinState::default()
}

/// Per-faction totals for every non-neutral colour with any presence.
pub fn faction_summaries(world: &GameWorld) -> Vec<FactionSummary> {
    let mut by_faction: BTreeMap<Faction, FactionSummary> = BTreeMap::new();
    for node in world.nodes.iter().filter(|n| !n.owner.is_neutral()) {
        let s = summary_for(&mut by_faction, node.owner);
        s.nodes += 1;
        s.biomass += node.count;
    }
    for payload in &world.payloads {
        let s = summary_for(&mut by_faction, payload.owner);
        s.payloads += 1;
        s.biomass += payload.count;
    }
    for transfer in &world.transfers {
        summary_for(&mut by_faction, transfer.owner).transfers += 1;
    }
    by_faction.into_values().collect()
}

fn summary_for(map: &mut BTreeMap<Faction, FactionSummary>, faction: Faction) -> &mut FactionSummary {
    map.entry(faction).or_insert_with(|| FactionSummary {
        faction,
        nodes: 0,
        biomass: 0.0,
        payloads: 0,
        transfers: 0,
    })
}
