//! Tactical execution loop
//!
//! Each tick: structure check -> danger fields -> upkeep -> unit decisions
//! -> logistics

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::battle::ai::{AiCommander, BattleAI, DecisionContext};
use crate::battle::attack::formation::FormationRegistry;
use crate::battle::danger::DangerFields;
use crate::battle::logistics::LogisticsDispatcher;
use crate::battle::navigation::{nearest_free_cell, Navigator};
use crate::battle::path_cache::PathCache;
use crate::battle::pathfinding::{GridAStar, PathOptions, Pathfinder};
use crate::battle::structures::{Structure, StructureKind};
use crate::battle::throttle::DecisionThrottle;
use crate::battle::units::{DecisionState, ServiceTarget};
use crate::battle::world::BattleWorld;
use crate::core::config::TacticalConfig;
use crate::core::error::{Result, TacticalError};
use crate::core::types::{Cell, FormationGroupId, GameTime, PlayerId, StructureId, UnitId, WreckId};

/// Rings searched around a formation slot for a free cell
const SLOT_SEARCH_RINGS: u32 = 3;

/// Log entry for tactical events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TacticalEvent {
    pub time: GameTime,
    pub kind: TacticalEventKind,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TacticalEventKind {
    DangerRecomputed { sources: usize },
    StateChanged { unit: UnitId, from: DecisionState, to: DecisionState },
    ServiceAssigned { vehicle: UnitId, target: ServiceTarget, critical: bool },
    ServiceInterrupted { vehicle: UnitId, target: ServiceTarget },
    ServiceQueued { vehicle: UnitId, target: ServiceTarget },
    ServiceCompleted { vehicle: UnitId, target: ServiceTarget },
    WreckRecovered { vehicle: UnitId, wreck: WreckId },
    FormationDisbanded { group: FormationGroupId },
}

/// Log of events from a single tick
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TacticalEventLog {
    pub events: Vec<TacticalEvent>,
}

impl TacticalEventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, kind: TacticalEventKind, description: String, time: GameTime) {
        self.events.push(TacticalEvent {
            time,
            kind,
            description,
        });
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn extend(&mut self, other: TacticalEventLog) {
        self.events.extend(other.events);
    }
}

/// Everything about a structure that changes danger or passability
type StructureKey = (StructureId, PlayerId, StructureKind, i32, i32, u32, u32, bool, bool);

fn structure_signature(structures: &[Structure]) -> Vec<StructureKey> {
    structures
        .iter()
        .map(|s| {
            (
                s.id,
                s.owner,
                s.kind,
                s.x,
                s.y,
                s.width,
                s.height,
                s.is_alive(),
                s.powered,
            )
        })
        .collect()
}

/// Owned tactical state: danger fields, path cache, AI and logistics
pub struct TacticalCore<P: Pathfinder = GridAStar> {
    config: TacticalConfig,
    throttle: DecisionThrottle,
    danger: DangerFields,
    path_cache: PathCache,
    pathfinder: P,
    commander: AiCommander,
    formations: FormationRegistry,
    logistics: LogisticsDispatcher,
    signature: Option<Vec<StructureKey>>,
}

impl TacticalCore<GridAStar> {
    /// Core with the built-in grid A*
    pub fn new(config: TacticalConfig) -> Result<Self> {
        Self::with_pathfinder(config, GridAStar::new())
    }
}

impl<P: Pathfinder> TacticalCore<P> {
    /// Core with a caller-supplied pathfinding primitive
    pub fn with_pathfinder(config: TacticalConfig, pathfinder: P) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            throttle: DecisionThrottle::new(&config.throttle),
            path_cache: PathCache::new(config.throttle.path_recalc_interval_ms),
            logistics: LogisticsDispatcher::new(&config.logistics),
            danger: DangerFields::default(),
            pathfinder,
            commander: AiCommander::new(),
            formations: FormationRegistry::new(),
            signature: None,
            config,
        })
    }

    pub fn config(&self) -> &TacticalConfig {
        &self.config
    }

    pub fn danger_fields(&self) -> &DangerFields {
        &self.danger
    }

    pub fn path_cache(&self) -> &PathCache {
        &self.path_cache
    }

    pub fn formations(&self) -> &FormationRegistry {
        &self.formations
    }

    /// Run one tick against the world snapshot
    pub fn update(&mut self, world: &mut BattleWorld) -> TacticalEventLog {
        let mut events = TacticalEventLog::new();
        if world.terrain.width() == 0 || world.terrain.height() == 0 {
            warn!("Empty terrain grid, skipping tactical update");
            return events;
        }

        self.refresh_structures(world, &mut events);
        self.upkeep(world, &mut events);
        self.decide_units(world, &mut events);

        let players: Vec<PlayerId> = world.roster.players().filter(|p| world.roster.is_ai(*p)).collect();
        for player in players {
            let mut nav = Navigator::new(&mut self.path_cache, &self.pathfinder, &self.throttle);
            self.logistics
                .update(world, &mut nav, &self.config.logistics, player, &mut events);
        }
        events
    }

    /// Recompute danger and drop cached paths when structures changed
    fn refresh_structures(&mut self, world: &BattleWorld, events: &mut TacticalEventLog) {
        let signature = structure_signature(&world.structures);
        if self.signature.as_ref() == Some(&signature) {
            return;
        }

        self.danger = DangerFields::compute(
            &world.structures,
            &world.roster,
            world.terrain.width(),
            world.terrain.height(),
        );
        self.path_cache.clear();
        self.signature = Some(signature);

        let alive: Vec<StructureId> = world
            .structures
            .iter()
            .filter(|s| s.is_alive())
            .map(|s| s.id)
            .collect();
        self.commander
            .siege_mut()
            .retain_targets(|id| alive.contains(&id));

        let sources = self.danger.source_count();
        events.push(
            TacticalEventKind::DangerRecomputed { sources },
            format!("Danger fields recomputed from {} defenses", sources),
            world.now,
        );
    }

    /// Release bookkeeping held by dead or removed units
    fn upkeep(&mut self, world: &mut BattleWorld, events: &mut TacticalEventLog) {
        for unit in world.units.iter().filter(|u| !u.is_alive()) {
            self.commander.forget_unit(unit);
        }
        let living: Vec<UnitId> = world.units.iter().filter(|u| u.is_alive()).map(|u| u.id).collect();
        self.commander
            .siege_mut()
            .retain_units(|id| living.contains(&id));

        for group in self.formations.prune(world) {
            events.push(
                TacticalEventKind::FormationDisbanded { group },
                format!("Formation group {} disbanded", group.0),
                world.now,
            );
        }
    }

    /// Each AI unit in collection order: decide on a copy, write it back
    fn decide_units(&mut self, world: &mut BattleWorld, events: &mut TacticalEventLog) {
        for i in 0..world.units.len() {
            let owner = world.units[i].owner;
            if !world.roster.is_ai(owner) || !world.units[i].is_alive() {
                continue;
            }

            let mut unit = world.units[i].clone();
            let decided = {
                let ctx = DecisionContext::new(world, &self.danger, &self.config, &self.throttle, owner);
                let mut nav = Navigator::new(&mut self.path_cache, &self.pathfinder, &self.throttle);
                self.commander.decide_unit(&ctx, &mut nav, &mut unit)
            };
            if !decided {
                continue;
            }

            let before = world.units[i].state;
            if unit.state != before {
                events.push(
                    TacticalEventKind::StateChanged {
                        unit: unit.id,
                        from: before,
                        to: unit.state,
                    },
                    format!("Unit {} {:?} -> {:?}", unit.id.0, before, unit.state),
                    world.now,
                );
            }
            world.units[i] = unit;
        }
    }

    /// Put units into formation mode around the first of them
    pub fn form_group(&mut self, world: &mut BattleWorld, ids: &[UnitId]) -> Result<FormationGroupId> {
        if let Some(missing) = ids.iter().find(|id| world.unit(**id).is_none()) {
            return Err(TacticalError::UnitNotFound(*missing));
        }
        let id = self.formations.form_group(world, ids).ok_or_else(|| {
            TacticalError::InvalidOrder("a formation needs two living units of one owner".into())
        })?;
        debug!(group = id.0, members = ids.len(), "Formation group formed");
        Ok(id)
    }

    pub fn disband_group(&mut self, world: &mut BattleWorld, id: FormationGroupId) -> Result<()> {
        if self.formations.disband_group(world, id) {
            Ok(())
        } else {
            Err(TacticalError::GroupNotFound(id))
        }
    }

    /// Route every member to its slot around `dest`; returns how many
    /// members got a path
    pub fn move_group(&mut self, world: &mut BattleWorld, id: FormationGroupId, dest: Cell) -> Result<usize> {
        if !world.terrain.in_bounds(dest) {
            return Err(TacticalError::InvalidOrder(format!("destination {:?} is off the map", dest)));
        }
        let group = self.formations.get(id).ok_or(TacticalError::GroupNotFound(id))?;
        let slots: Vec<(UnitId, Cell)> = group
            .members
            .iter()
            .filter_map(|m| group.slot_for(m.unit, dest).map(|slot| (m.unit, slot)))
            .collect();

        let now = world.now;
        let mut routed = 0;
        for (member, slot) in slots {
            let Some(index) = world.unit_index(member) else {
                continue;
            };
            let Some(cell) = nearest_free_cell(world, slot, slot, member, SLOT_SEARCH_RINGS) else {
                continue;
            };
            let mut unit = world.units[index].clone();
            let mut nav = Navigator::new(&mut self.path_cache, &self.pathfinder, &self.throttle);
            if nav.move_to(world, &mut unit, cell, PathOptions::combat(), false, now) {
                routed += 1;
            }
            world.units[index] = unit;
        }
        Ok(routed)
    }

    /// Reject snapshots the core cannot reason about
    pub fn check_world(&self, world: &BattleWorld) -> Result<()> {
        if world.terrain.is_empty() {
            return Err(TacticalError::MapError("terrain grid is empty".into()));
        }
        for structure in &world.structures {
            let corner = Cell::new(
                structure.x + structure.width as i32 - 1,
                structure.y + structure.height as i32 - 1,
            );
            if !world.terrain.in_bounds(Cell::new(structure.x, structure.y)) || !world.terrain.in_bounds(corner) {
                return Err(TacticalError::MapError(format!(
                    "structure {} lies outside the {}x{} map",
                    structure.id.0,
                    world.terrain.width(),
                    world.terrain.height()
                )));
            }
        }
        if let Some(unit) = world.units.iter().find(|u| !world.terrain.in_bounds(u.cell)) {
            return Err(TacticalError::MapError(format!(
                "unit {} stands outside the map at {:?}",
                unit.id.0, unit.cell
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::structures::DefenseStats;
    use crate::battle::terrain::TerrainMap;
    use crate::battle::unit_type::UnitType;
    use crate::battle::units::Unit;
    use crate::battle::world::PlayerRoster;

    fn world() -> BattleWorld {
        BattleWorld::new(TerrainMap::new(30, 30), PlayerRoster::new(2, Some(PlayerId(0))))
    }

    #[test]
    fn test_event_log_push() {
        let mut log = TacticalEventLog::new();
        log.push(
            TacticalEventKind::FormationDisbanded { group: FormationGroupId(1) },
            "gone".to_string(),
            5,
        );
        assert_eq!(log.len(), 1);
        assert_eq!(log.events[0].time, 5);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = TacticalConfig::new();
        config.throttle.immediate_response_window_ms = config.throttle.decision_interval_ms;
        assert!(TacticalCore::new(config).is_err());
    }

    #[test]
    fn test_danger_recomputed_only_on_change() {
        let mut world = world();
        world.add_structure(
            Structure::new(StructureId(1), PlayerId(1), StructureKind::GunTurret, 5, 5)
                .with_defense(DefenseStats::new(5.0, 10.0, 1000)),
        );
        let mut core = TacticalCore::new(TacticalConfig::new()).unwrap();

        let first = core.update(&mut world);
        assert!(first
            .events
            .iter()
            .any(|e| e.kind == TacticalEventKind::DangerRecomputed { sources: 1 }));
        assert_eq!(core.danger_fields().danger_at(PlayerId(0), Cell::new(5, 5)), 10.0);

        world.now = 100;
        let second = core.update(&mut world);
        assert!(!second
            .events
            .iter()
            .any(|e| matches!(e.kind, TacticalEventKind::DangerRecomputed { .. })));

        world.structures[0].health = 0.0;
        world.now = 200;
        core.update(&mut world);
        assert_eq!(core.danger_fields().danger_at(PlayerId(0), Cell::new(5, 5)), 0.0);
    }

    #[test]
    fn test_human_units_are_left_alone() {
        let mut world = world();
        world.add_unit(Unit::new(UnitId(1), PlayerId(0), UnitType::MediumTank, Cell::new(5, 5)));
        world.add_unit(Unit::new(UnitId(2), PlayerId(1), UnitType::MediumTank, Cell::new(8, 5)));
        let mut core = TacticalCore::new(TacticalConfig::new()).unwrap();
        core.update(&mut world);

        assert_eq!(world.unit(UnitId(1)).unwrap().timers.last_decision, None);
        assert_eq!(
            world.unit(UnitId(2)).unwrap().state,
            DecisionState::Attacking(crate::battle::units::TargetRef::Unit(UnitId(1)))
        );
    }

    #[test]
    fn test_empty_terrain_is_skipped() {
        let mut world = BattleWorld::new(TerrainMap::new(0, 0), PlayerRoster::new(2, None));
        let mut core = TacticalCore::new(TacticalConfig::new()).unwrap();
        assert!(core.update(&mut world).is_empty());
    }

    #[test]
    fn test_move_group_keeps_offsets() {
        let mut world = world();
        world.add_unit(Unit::new(UnitId(1), PlayerId(0), UnitType::MediumTank, Cell::new(2, 2)));
        world.add_unit(Unit::new(UnitId(2), PlayerId(0), UnitType::MediumTank, Cell::new(3, 2)));
        let mut core = TacticalCore::new(TacticalConfig::new()).unwrap();

        let group = core.form_group(&mut world, &[UnitId(1), UnitId(2)]).unwrap();
        assert_eq!(core.move_group(&mut world, group, Cell::new(20, 20)).unwrap(), 2);
        assert_eq!(world.unit(UnitId(1)).unwrap().move_target, Some(Cell::new(20, 20)));
        assert_eq!(world.unit(UnitId(2)).unwrap().move_target, Some(Cell::new(21, 20)));
        assert_eq!(core.formations().get(group).map(|g| g.len()), Some(2));

        assert!(core.disband_group(&mut world, group).is_ok());
        assert!(world.unit(UnitId(2)).unwrap().formation.is_none());
        assert!(core.formations().get(group).is_none());
        assert!(matches!(
            core.move_group(&mut world, group, Cell::new(5, 5)),
            Err(TacticalError::GroupNotFound(_))
        ));
    }

    #[test]
    fn test_group_orders_reject_bad_input() {
        let mut world = world();
        world.add_unit(Unit::new(UnitId(1), PlayerId(0), UnitType::MediumTank, Cell::new(2, 2)));
        let mut core = TacticalCore::new(TacticalConfig::new()).unwrap();

        assert!(matches!(
            core.form_group(&mut world, &[UnitId(1), UnitId(9)]),
            Err(TacticalError::UnitNotFound(UnitId(9)))
        ));
        assert!(matches!(
            core.form_group(&mut world, &[UnitId(1)]),
            Err(TacticalError::InvalidOrder(_))
        ));
    }

    #[test]
    fn test_check_world() {
        let core = TacticalCore::new(TacticalConfig::new()).unwrap();
        let mut world = world();
        world.add_structure(Structure::new(StructureId(1), PlayerId(0), StructureKind::Workshop, 3, 3));
        assert!(core.check_world(&world).is_ok());

        world.add_structure(Structure::new(StructureId(2), PlayerId(0), StructureKind::ConstructionYard, 28, 28));
        assert!(matches!(core.check_world(&world), Err(TacticalError::MapError(_))));

        let empty = BattleWorld::new(TerrainMap::new(0, 0), PlayerRoster::new(2, None));
        assert!(core.check_world(&empty).is_err());
    }
}
