//! Aircraft behavior
//!
//! Aircraft never fly into known anti-air cover. Inside it they run home to
//! their own territory; outside it they pick harvesters, then the most
//! valuable structures, that no air defense protects.

use tracing::debug;

use crate::battle::ai::decision_context::DecisionContext;
use crate::battle::navigation::Navigator;
use crate::battle::pathfinding::Pathfinder;
use crate::battle::structures::Structure;
use crate::battle::units::{DecisionState, TargetRef, Unit};
use crate::core::types::Cell;

/// Is this cell covered by static or mobile air defense?
pub fn air_defended(ctx: &DecisionContext, cell: Cell) -> bool {
    ctx.air_danger_at(cell) > 0.0 || ctx.mobile_air_defense_covers(cell)
}

/// Cell in own territory to fall back to: the nearest own structure center
pub fn home_cell(ctx: &DecisionContext, unit: &Unit) -> Option<Cell> {
    ctx.own_structures()
        .min_by(|a, b| {
            a.distance_to(unit.cell)
                .total_cmp(&b.distance_to(unit.cell))
                .then_with(|| a.id.cmp(&b.id))
        })
        .map(Structure::center_cell)
}

/// Best uncovered target: harvesters first, then priority structures
pub fn air_target(ctx: &DecisionContext, unit: &Unit) -> Option<TargetRef> {
    if unit.weapon().map(|w| !w.hits_ground).unwrap_or(true) {
        return None;
    }

    if let Some(harvester) = ctx.nearest_hostile(unit.cell, |h| {
        h.is_harvester() && !air_defended(ctx, h.cell)
    }) {
        return Some(TargetRef::Unit(harvester.id));
    }

    ctx.hostile_structures()
        .filter(|s| s.kind.priority_rank().is_some())
        .filter(|s| !air_defended(ctx, s.center_cell()))
        .min_by(|a, b| {
            a.kind
                .priority_rank()
                .cmp(&b.kind.priority_rank())
                .then_with(|| a.distance_to(unit.cell).total_cmp(&b.distance_to(unit.cell)))
                .then_with(|| a.id.cmp(&b.id))
        })
        .map(|s| TargetRef::Structure(s.id))
}

/// Decide for an aircraft
pub fn fly_mission<P: Pathfinder + ?Sized>(
    ctx: &DecisionContext,
    nav: &mut Navigator<P>,
    unit: &mut Unit,
) -> DecisionState {
    if air_defended(ctx, unit.cell) {
        if !unit.flags.evading_air_defense {
            debug!(unit = unit.id.0, cell = ?unit.cell, "Evading air defense");
        }
        unit.target = None;
        unit.flags.allowed_to_attack = false;
        unit.flags.evading_air_defense = true;
        match home_cell(ctx, unit) {
            Some(home) => {
                nav.fly_to(unit, home, ctx.now);
            }
            None => unit.halt(),
        }
        return DecisionState::AerialEvading;
    }
    unit.flags.evading_air_defense = false;

    let target = match unit.target {
        Some(current) if !ctx.throttle.can_retarget(unit, ctx.now) && ctx.world.target_alive(current) => {
            Some(current)
        }
        _ => air_target(ctx, unit),
    };
    let Some(target) = target else {
        unit.target = None;
        unit.flags.allowed_to_attack = false;
        unit.halt();
        return DecisionState::Idle;
    };

    unit.target = Some(target);
    unit.flags.allowed_to_attack = true;
    let in_range = ctx
        .world
        .distance_to_target(unit.cell, target)
        .zip(unit.weapon())
        .map(|(d, w)| w.in_range(d))
        .unwrap_or(false);
    if in_range {
        unit.halt();
    } else if let Some(cell) = ctx.world.target_cell(target) {
        nav.fly_to(unit, cell, ctx.now);
    }
    DecisionState::Attacking(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::danger::DangerFields;
    use crate::battle::path_cache::PathCache;
    use crate::battle::pathfinding::GridAStar;
    use crate::battle::structures::StructureKind;
    use crate::battle::terrain::TerrainMap;
    use crate::battle::throttle::DecisionThrottle;
    use crate::battle::unit_type::UnitType;
    use crate::battle::world::{BattleWorld, PlayerRoster};
    use crate::core::config::TacticalConfig;
    use crate::core::types::{PlayerId, StructureId, UnitId};

    fn world() -> BattleWorld {
        let mut world = BattleWorld::new(TerrainMap::new(50, 50), PlayerRoster::new(2, None));
        world.add_structure(Structure::new(StructureId(1), PlayerId(0), StructureKind::ConstructionYard, 2, 2));
        world.add_structure(Structure::new(StructureId(10), PlayerId(1), StructureKind::ConstructionYard, 40, 40));
        world.add_structure(Structure::new(StructureId(11), PlayerId(1), StructureKind::AntiAirSite, 42, 44));
        world.add_structure(Structure::new(StructureId(12), PlayerId(1), StructureKind::Refinery, 20, 40));
        world
    }

    fn run(world: &BattleWorld, unit: &mut Unit) -> DecisionState {
        let config = TacticalConfig::new();
        let throttle = DecisionThrottle::new(&config.throttle);
        let danger = DangerFields::compute(&world.structures, &world.roster, 50, 50);
        let ctx = DecisionContext::new(world, &danger, &config, &throttle, unit.owner);
        let mut cache = PathCache::new(2000);
        let finder = GridAStar::new();
        let mut nav = Navigator::new(&mut cache, &finder, &throttle);
        fly_mission(&ctx, &mut nav, unit)
    }

    fn helicopter(x: i32, y: i32) -> Unit {
        Unit::new(UnitId(1), PlayerId(0), UnitType::Helicopter, Cell::new(x, y))
    }

    #[test]
    fn test_skips_covered_structures() {
        let world = world();
        let mut unit = helicopter(10, 10);
        let state = run(&world, &mut unit);
        assert_eq!(state, DecisionState::Attacking(TargetRef::Structure(StructureId(12))));
        assert!(!unit.path.is_empty());
    }

    #[test]
    fn test_prefers_undefended_harvesters() {
        let mut world = world();
        world.add_unit(Unit::new(UnitId(5), PlayerId(1), UnitType::Harvester, Cell::new(25, 10)));
        let mut unit = helicopter(10, 10);
        assert_eq!(
            run(&world, &mut unit),
            DecisionState::Attacking(TargetRef::Unit(UnitId(5)))
        );
    }

    #[test]
    fn test_evades_inside_air_cover() {
        let world = world();
        let mut unit = helicopter(41, 42);
        assert_eq!(run(&world, &mut unit), DecisionState::AerialEvading);
        assert!(unit.flags.evading_air_defense);
        assert_eq!(unit.target, None);
        assert_eq!(unit.move_target, Some(Cell::new(3, 3)));
    }

    #[test]
    fn test_evades_mobile_anti_air() {
        let mut world = world();
        world.add_unit(Unit::new(UnitId(9), PlayerId(1), UnitType::RocketTank, Cell::new(14, 10)));
        let mut unit = helicopter(10, 10);
        assert_eq!(run(&world, &mut unit), DecisionState::AerialEvading);
    }
}
