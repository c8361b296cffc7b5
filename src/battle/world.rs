//! World snapshot handed to the tactical core each tick
//!
//! The surrounding game owns these collections; the core reads everything
//! and writes only unit intent fields and the wreck pool.

use serde::{Deserialize, Serialize};

use crate::battle::occupancy::OccupancyMap;
use crate::battle::structures::{Structure, StructureKind};
use crate::battle::terrain::TerrainMap;
use crate::battle::unit_type::UnitType;
use crate::battle::units::{TargetRef, Unit};
use crate::core::types::{Cell, GameTime, PlayerId, StructureId, UnitId, WreckId};

/// Participants and their alliances
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerRoster {
    pub player_count: u8,
    /// Human-controlled player; the AI never decides for it
    pub human_player: Option<PlayerId>,
    /// Team of each player, indexed by player id
    teams: Vec<u8>,
}

impl PlayerRoster {
    /// Every player on its own team
    pub fn new(player_count: u8, human_player: Option<PlayerId>) -> Self {
        Self {
            player_count,
            human_player,
            teams: (0..player_count).collect(),
        }
    }

    /// Explicit team assignment, one entry per player
    pub fn with_teams(mut self, teams: Vec<u8>) -> Self {
        self.player_count = teams.len() as u8;
        self.teams = teams;
        self
    }

    pub fn team_of(&self, player: PlayerId) -> u8 {
        self.teams.get(player.0 as usize).copied().unwrap_or(player.0)
    }

    /// Different team means hostile
    pub fn are_hostile(&self, a: PlayerId, b: PlayerId) -> bool {
        self.team_of(a) != self.team_of(b)
    }

    pub fn is_ai(&self, player: PlayerId) -> bool {
        self.human_player != Some(player)
    }

    pub fn players(&self) -> impl Iterator<Item = PlayerId> {
        (0..self.player_count).map(PlayerId)
    }
}

/// Salvageable remains of a destroyed unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wreck {
    pub id: WreckId,
    pub owner: PlayerId,
    pub cell: Cell,
    pub unit_type: UnitType,
}

/// A hostile projectile in flight with its predicted impact
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IncomingFire {
    pub owner: PlayerId,
    pub impact: Cell,
    pub impact_time: GameTime,
}

/// Everything the tactical core can see this tick
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BattleWorld {
    pub terrain: TerrainMap,
    pub occupancy: OccupancyMap,
    pub units: Vec<Unit>,
    pub structures: Vec<Structure>,
    pub wrecks: Vec<Wreck>,
    pub incoming_fire: Vec<IncomingFire>,
    pub roster: PlayerRoster,
    pub now: GameTime,
}

impl BattleWorld {
    pub fn new(terrain: TerrainMap, roster: PlayerRoster) -> Self {
        Self {
            terrain,
            occupancy: OccupancyMap::new(),
            units: Vec::new(),
            structures: Vec::new(),
            wrecks: Vec::new(),
            incoming_fire: Vec::new(),
            roster,
            now: 0,
        }
    }

    /// Add a unit and mark its cell occupied (ground units only)
    pub fn add_unit(&mut self, unit: Unit) {
        if !unit.is_aerial() {
            self.occupancy.occupy(unit.cell, unit.id);
        }
        self.units.push(unit);
    }

    /// Add a structure and stamp its footprint on the terrain
    pub fn add_structure(&mut self, structure: Structure) {
        self.terrain.place_structure(
            structure.id,
            structure.x,
            structure.y,
            structure.width,
            structure.height,
        );
        self.structures.push(structure);
    }

    pub fn add_wreck(&mut self, wreck: Wreck) {
        self.wrecks.push(wreck);
    }

    /// Rebuild occupancy from current unit cells
    pub fn rebuild_occupancy(&mut self) {
        self.occupancy = OccupancyMap::from_positions(
            self.units
                .iter()
                .filter(|u| u.is_alive() && !u.is_aerial())
                .map(|u| (u.id, u.cell)),
        );
    }

    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.units.iter().find(|u| u.id == id)
    }

    pub fn unit_mut(&mut self, id: UnitId) -> Option<&mut Unit> {
        self.units.iter_mut().find(|u| u.id == id)
    }

    pub fn unit_index(&self, id: UnitId) -> Option<usize> {
        self.units.iter().position(|u| u.id == id)
    }

    pub fn structure(&self, id: StructureId) -> Option<&Structure> {
        self.structures.iter().find(|s| s.id == id)
    }

    pub fn wreck(&self, id: WreckId) -> Option<&Wreck> {
        self.wrecks.iter().find(|w| w.id == id)
    }

    pub fn is_hostile(&self, a: PlayerId, b: PlayerId) -> bool {
        self.roster.are_hostile(a, b)
    }

    /// Living units belonging to `owner`
    pub fn own_units(&self, owner: PlayerId) -> impl Iterator<Item = &Unit> {
        self.units
            .iter()
            .filter(move |u| u.owner == owner && u.is_alive())
    }

    /// Living units hostile to `owner`
    pub fn hostile_units(&self, owner: PlayerId) -> impl Iterator<Item = &Unit> {
        self.units
            .iter()
            .filter(move |u| u.is_alive() && self.roster.are_hostile(owner, u.owner))
    }

    /// Living structures belonging to `owner`
    pub fn own_structures(&self, owner: PlayerId) -> impl Iterator<Item = &Structure> {
        self.structures
            .iter()
            .filter(move |s| s.owner == owner && s.is_alive())
    }

    /// Living structures hostile to `owner`
    pub fn hostile_structures(&self, owner: PlayerId) -> impl Iterator<Item = &Structure> {
        self.structures
            .iter()
            .filter(move |s| s.is_alive() && self.roster.are_hostile(owner, s.owner))
    }

    /// Nearest living own structure of a given kind
    pub fn nearest_own_structure(
        &self,
        owner: PlayerId,
        kind: StructureKind,
        from: Cell,
    ) -> Option<&Structure> {
        self.own_structures(owner)
            .filter(|s| s.kind == kind)
            .min_by(|a, b| a.distance_to(from).total_cmp(&b.distance_to(from)))
    }

    /// Position of a target, if it still exists and is alive
    pub fn target_cell(&self, target: TargetRef) -> Option<Cell> {
        match target {
            TargetRef::Unit(id) => self.unit(id).filter(|u| u.is_alive()).map(|u| u.cell),
            TargetRef::Structure(id) => self
                .structure(id)
                .filter(|s| s.is_alive())
                .map(|s| s.center_cell()),
        }
    }

    pub fn target_alive(&self, target: TargetRef) -> bool {
        self.target_cell(target).is_some()
    }

    pub fn target_health_ratio(&self, target: TargetRef) -> Option<f32> {
        match target {
            TargetRef::Unit(id) => self.unit(id).map(|u| u.health_ratio()),
            TargetRef::Structure(id) => self.structure(id).map(|s| s.health_ratio()),
        }
    }

    /// Distance from a cell to a target (structure center for buildings)
    pub fn distance_to_target(&self, from: Cell, target: TargetRef) -> Option<f32> {
        match target {
            TargetRef::Unit(id) => self
                .unit(id)
                .filter(|u| u.is_alive())
                .map(|u| from.distance(&u.cell)),
            TargetRef::Structure(id) => self
                .structure(id)
                .filter(|s| s.is_alive())
                .map(|s| s.distance_to(from)),
        }
    }

    /// A ground unit could stop here: walkable and not taken by another unit
    pub fn is_free_cell(&self, cell: Cell, unit: UnitId) -> bool {
        self.terrain.is_walkable(cell) && !self.occupancy.is_blocked_for(cell, unit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world() -> BattleWorld {
        BattleWorld::new(TerrainMap::new(20, 20), PlayerRoster::new(3, Some(PlayerId(0))))
    }

    fn snapshot<T: Serialize + for<'de> Deserialize<'de>>(_: &T) {}

    #[test]
    fn test_world_is_serializable() {
        let mut w = world();
        w.occupancy.occupy(Cell::new(1, 1), UnitId(4));
        snapshot(&w);
        snapshot(&w.occupancy);
    }

    #[test]
    fn test_roster_hostility() {
        let roster = PlayerRoster::new(3, None).with_teams(vec![0, 0, 1]);
        assert!(!roster.are_hostile(PlayerId(0), PlayerId(1)));
        assert!(roster.are_hostile(PlayerId(0), PlayerId(2)));
        assert!(!roster.are_hostile(PlayerId(2), PlayerId(2)));
    }

    #[test]
    fn test_human_player_is_not_ai() {
        let roster = PlayerRoster::new(2, Some(PlayerId(0)));
        assert!(!roster.is_ai(PlayerId(0)));
        assert!(roster.is_ai(PlayerId(1)));
        assert_eq!(roster.players().count(), 2);
    }

    #[test]
    fn test_add_unit_occupies_cell() {
        let mut w = world();
        w.add_unit(Unit::new(UnitId(1), PlayerId(1), UnitType::LightTank, Cell::new(3, 3)));
        w.add_unit(Unit::new(UnitId(2), PlayerId(1), UnitType::Helicopter, Cell::new(4, 4)));
        assert_eq!(w.occupancy.occupant(Cell::new(3, 3)), Some(UnitId(1)));
        assert!(!w.occupancy.is_occupied(Cell::new(4, 4)));
        assert!(!w.is_free_cell(Cell::new(3, 3), UnitId(2)));
        assert!(w.is_free_cell(Cell::new(3, 3), UnitId(1)));
    }

    #[test]
    fn test_add_structure_blocks_terrain() {
        let mut w = world();
        w.add_structure(Structure::new(StructureId(1), PlayerId(1), StructureKind::PowerPlant, 5, 5));
        assert!(!w.terrain.is_walkable(Cell::new(6, 6)));
        assert_eq!(w.own_structures(PlayerId(1)).count(), 1);
        assert_eq!(w.hostile_structures(PlayerId(2)).count(), 1);
        assert_eq!(w.hostile_structures(PlayerId(1)).count(), 0);
    }

    #[test]
    fn test_target_queries() {
        let mut w = world();
        w.add_unit(Unit::new(UnitId(1), PlayerId(1), UnitType::LightTank, Cell::new(0, 0)));
        w.add_structure(Structure::new(StructureId(9), PlayerId(2), StructureKind::GunTurret, 3, 4));

        let target = TargetRef::Structure(StructureId(9));
        assert_eq!(w.target_cell(target), Some(Cell::new(3, 4)));
        assert!((w.distance_to_target(Cell::new(0, 0), target).unwrap() - 5.0).abs() < 0.001);

        if let Some(u) = w.unit_mut(UnitId(1)) {
            u.health = 0.0;
        }
        assert!(!w.target_alive(TargetRef::Unit(UnitId(1))));
    }
}
