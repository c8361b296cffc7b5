//! Danger fields: expected hostile damage per second at every cell
//!
//! One field per player, with separate ground and air layers. Values are
//! purely additive over contributing defensive structures. Fields are
//! recomputed from scratch when structures change; nothing decays.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::battle::structures::Structure;
use crate::battle::world::PlayerRoster;
use crate::core::types::{Cell, PlayerId};
use crate::spatial::Grid;

/// Which kind of unit a danger layer applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DangerLayer {
    Ground,
    Air,
}

/// Danger grids for a single player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DangerField {
    ground: Grid<f64>,
    air: Grid<f64>,
}

impl DangerField {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            ground: Grid::new(width, height),
            air: Grid::new(width, height),
        }
    }

    pub fn layer(&self, layer: DangerLayer) -> &Grid<f64> {
        match layer {
            DangerLayer::Ground => &self.ground,
            DangerLayer::Air => &self.air,
        }
    }

    /// Ground danger at a cell, zero outside the map
    pub fn value(&self, cell: Cell) -> f64 {
        self.ground.value(cell)
    }

    /// Air danger at a cell, zero outside the map
    pub fn air_value(&self, cell: Cell) -> f64 {
        self.air.value(cell)
    }
}

/// Danger fields for every player
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DangerFields {
    fields: AHashMap<PlayerId, DangerField>,
    sources: usize,
}

impl DangerFields {
    /// Compute every player's danger field from the structure collection
    ///
    /// A structure contributes damage × burst / cooldown to every cell whose
    /// center lies within [min_range, range] of the structure center, for each
    /// player hostile to its owner. Dead, power-starved or rangeless
    /// structures contribute nothing.
    pub fn compute(
        structures: &[Structure],
        roster: &PlayerRoster,
        width: usize,
        height: usize,
    ) -> Self {
        let mut fields: AHashMap<PlayerId, DangerField> = roster
            .players()
            .map(|p| (p, DangerField::new(width, height)))
            .collect();

        let mut sources = 0;
        for structure in structures {
            let Some(defense) = structure.active_defense() else {
                continue;
            };
            let dps = defense.dps() as f64;
            let victims: Vec<PlayerId> = roster
                .players()
                .filter(|p| roster.are_hostile(*p, structure.owner))
                .collect();
            if victims.is_empty() {
                continue;
            }
            sources += 1;

            let center = structure.center();
            let reach = defense.range.ceil() as i32 + 1;
            let (cx, cy) = (center.x.floor() as i32, center.y.floor() as i32);

            for y in (cy - reach)..=(cy + reach) {
                for x in (cx - reach)..=(cx + reach) {
                    let cell = Cell::new(x, y);
                    if !defense.covers(structure.distance_to(cell)) {
                        continue;
                    }
                    for victim in &victims {
                        if let Some(field) = fields.get_mut(victim) {
                            if defense.hits_ground {
                                field.ground.add(cell, dps);
                            }
                            if defense.hits_air {
                                field.air.add(cell, dps);
                            }
                        }
                    }
                }
            }
        }

        info!(
            sources,
            players = fields.len(),
            "Danger fields recomputed"
        );

        Self { fields, sources }
    }

    pub fn get(&self, player: PlayerId) -> Option<&DangerField> {
        self.fields.get(&player)
    }

    /// Ground danger a player faces at a cell
    pub fn danger_at(&self, player: PlayerId, cell: Cell) -> f64 {
        self.get(player).map(|f| f.value(cell)).unwrap_or(0.0)
    }

    /// Air danger a player faces at a cell
    pub fn air_danger_at(&self, player: PlayerId, cell: Cell) -> f64 {
        self.get(player).map(|f| f.air_value(cell)).unwrap_or(0.0)
    }

    /// Number of structures that contributed on the last compute
    pub fn source_count(&self) -> usize {
        self.sources
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::structures::{DefenseStats, StructureKind};
    use crate::core::types::StructureId;

    fn turret(id: u32, owner: u8, x: i32, y: i32, defense: DefenseStats) -> Structure {
        Structure::new(StructureId(id), PlayerId(owner), StructureKind::GunTurret, x, y)
            .with_defense(defense)
    }

    #[test]
    fn test_single_turret_scenario() {
        let roster = PlayerRoster::new(2, None);
        let structures = vec![turret(1, 0, 5, 5, DefenseStats::new(5.0, 10.0, 1000))];
        let fields = DangerFields::compute(&structures, &roster, 30, 30);

        assert_eq!(fields.danger_at(PlayerId(1), Cell::new(5, 5)), 10.0);
        assert_eq!(fields.danger_at(PlayerId(1), Cell::new(20, 20)), 0.0);
        // Owner is never endangered by its own defenses
        assert_eq!(fields.danger_at(PlayerId(0), Cell::new(5, 5)), 0.0);
    }

    #[test]
    fn test_range_is_measured_between_centers() {
        let roster = PlayerRoster::new(2, None);
        let structures = vec![turret(1, 0, 5, 5, DefenseStats::new(5.0, 10.0, 1000))];
        let fields = DangerFields::compute(&structures, &roster, 30, 30);

        assert_eq!(fields.danger_at(PlayerId(1), Cell::new(10, 5)), 10.0);
        assert_eq!(fields.danger_at(PlayerId(1), Cell::new(11, 5)), 0.0);
        // (9,8): distance 5.0 exactly
        assert_eq!(fields.danger_at(PlayerId(1), Cell::new(9, 8)), 10.0);
        // (9,9): distance ~5.66
        assert_eq!(fields.danger_at(PlayerId(1), Cell::new(9, 9)), 0.0);
    }

    #[test]
    fn test_blind_spot_excluded() {
        let roster = PlayerRoster::new(2, None);
        let mut stats = DefenseStats::new(8.0, 10.0, 1000);
        stats.min_range = 3.0;
        let fields = DangerFields::compute(&[turret(1, 0, 10, 10, stats)], &roster, 30, 30);
        assert_eq!(fields.danger_at(PlayerId(1), Cell::new(10, 10)), 0.0);
        assert_eq!(fields.danger_at(PlayerId(1), Cell::new(14, 10)), 10.0);
    }

    #[test]
    fn test_inactive_structures_contribute_nothing() {
        let roster = PlayerRoster::new(2, None);
        let mut dead = turret(1, 0, 5, 5, DefenseStats::new(5.0, 10.0, 1000));
        dead.health = 0.0;
        let unpowered = Structure::new(StructureId(2), PlayerId(0), StructureKind::RocketTurret, 5, 5)
            .with_power(false);
        let rangeless = turret(3, 0, 5, 5, DefenseStats::new(0.0, 10.0, 1000));

        let fields = DangerFields::compute(&[dead, unpowered, rangeless], &roster, 20, 20);
        assert_eq!(fields.source_count(), 0);
        for x in 0..20 {
            for y in 0..20 {
                assert_eq!(fields.danger_at(PlayerId(1), Cell::new(x, y)), 0.0);
                assert_eq!(fields.air_danger_at(PlayerId(1), Cell::new(x, y)), 0.0);
            }
        }
    }

    #[test]
    fn test_overlapping_structures_add() {
        let roster = PlayerRoster::new(2, None);
        let structures = vec![
            turret(1, 0, 5, 5, DefenseStats::new(5.0, 10.0, 1000)),
            turret(2, 0, 7, 5, DefenseStats::new(5.0, 20.0, 2000)),
        ];
        let fields = DangerFields::compute(&structures, &roster, 30, 30);
        assert_eq!(fields.danger_at(PlayerId(1), Cell::new(6, 5)), 20.0);
    }

    #[test]
    fn test_allies_are_not_endangered() {
        let roster = PlayerRoster::new(3, None).with_teams(vec![0, 0, 1]);
        let structures = vec![turret(1, 0, 5, 5, DefenseStats::new(5.0, 10.0, 1000))];
        let fields = DangerFields::compute(&structures, &roster, 20, 20);
        assert_eq!(fields.danger_at(PlayerId(1), Cell::new(5, 5)), 0.0);
        assert_eq!(fields.danger_at(PlayerId(2), Cell::new(5, 5)), 10.0);
    }

    #[test]
    fn test_air_layer_separate() {
        let roster = PlayerRoster::new(2, None);
        let aa = Structure::new(StructureId(1), PlayerId(0), StructureKind::AntiAirSite, 5, 5);
        let fields = DangerFields::compute(&[aa], &roster, 30, 30);
        assert_eq!(fields.danger_at(PlayerId(1), Cell::new(5, 5)), 0.0);
        assert!(fields.air_danger_at(PlayerId(1), Cell::new(5, 5)) > 0.0);
    }
}
