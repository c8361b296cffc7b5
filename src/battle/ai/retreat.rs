//! Withdrawal behaviors: retreat, evacuation, harvester flight and dodging

use tracing::debug;

use crate::battle::ai::decision_context::DecisionContext;
use crate::battle::navigation::{nearest_free_cell, Navigator};
use crate::battle::pathfinding::{PathOptions, Pathfinder};
use crate::battle::structures::{Structure, StructureKind};
use crate::battle::unit_type::ServiceRole;
use crate::battle::units::{DecisionState, Unit, UnitKind};
use crate::core::types::Cell;

/// Withdrawal routes cross open ground and skip known enemy mines
pub const WITHDRAW_PATH: PathOptions = PathOptions {
    respect_occupancy: false,
    avoid_mines: true,
};

/// Defensive structures count as this much closer when picking a rally point
const DEFENSE_PREFERENCE: f32 = 0.5;

/// Should this unit pull back?
///
/// Health at or below the retreat ratio, a withdrawal still short of the
/// resume ratio, or an armed unit with empty magazines.
pub fn needs_retreat(ctx: &DecisionContext, unit: &Unit) -> bool {
    let combat = &ctx.config.combat;
    let ratio = unit.health_ratio();
    if ratio <= combat.retreat_health_ratio {
        return true;
    }

    let withdrawing = match unit.state {
        DecisionState::EvacuatingToWorkshop => true,
        DecisionState::Retreating | DecisionState::AerialEvading => !unit.is_harvester(),
        _ => false,
    };
    if withdrawing && unit.flags.is_retreating && ratio < combat.resume_health_ratio {
        return true;
    }

    unit.combat().is_some() && !unit.has_ammo()
}

/// Free cell next to a structure, closest to the unit
pub fn vicinity(ctx: &DecisionContext, unit: &Unit, structure: &Structure) -> Option<Cell> {
    structure
        .adjacent_cells()
        .into_iter()
        .filter(|c| ctx.world.is_free_cell(*c, unit.id))
        .min_by(|a, b| {
            a.distance(&unit.cell)
                .total_cmp(&b.distance(&unit.cell))
                .then_with(|| (a.y, a.x).cmp(&(b.y, b.x)))
        })
        .or_else(|| nearest_free_cell(ctx.world, structure.center_cell(), unit.cell, unit.id, 4))
}

/// Rally point near the owner's structures, preferring defenses and
/// weighted toward closer ones
pub fn safe_position(ctx: &DecisionContext, unit: &Unit) -> Option<Cell> {
    let anchor = ctx.own_structures().min_by(|a, b| {
        rally_score(a, unit.cell)
            .total_cmp(&rally_score(b, unit.cell))
            .then_with(|| a.id.cmp(&b.id))
    })?;
    vicinity(ctx, unit, anchor)
}

fn rally_score(structure: &Structure, from: Cell) -> f32 {
    let distance = structure.distance_to(from);
    if structure.kind.is_defense() {
        distance * DEFENSE_PREFERENCE
    } else {
        distance
    }
}

fn drop_combat_intent(unit: &mut Unit) {
    unit.target = None;
    unit.flags.allowed_to_attack = false;
    unit.flags.defending_base = false;
    unit.flags.hunting_harvesters = false;
    unit.flags.is_retreating = true;
}

/// Pull back to a workshop if one is reachable, otherwise to a rally point
pub fn retreat<P: Pathfinder + ?Sized>(
    ctx: &DecisionContext,
    nav: &mut Navigator<P>,
    unit: &mut Unit,
) -> DecisionState {
    drop_combat_intent(unit);

    if let Some(workshop) = ctx
        .world
        .nearest_own_structure(unit.owner, StructureKind::Workshop, unit.cell)
    {
        if let Some(dest) = vicinity(ctx, unit, workshop) {
            if nav.move_to(ctx.world, unit, dest, WITHDRAW_PATH, false, ctx.now) {
                debug!(unit = unit.id.0, ?dest, "Evacuating to workshop");
                return DecisionState::EvacuatingToWorkshop;
            }
        }
    }

    match safe_position(ctx, unit) {
        Some(dest) => {
            nav.move_to(ctx.world, unit, dest, WITHDRAW_PATH, false, ctx.now);
        }
        None => unit.halt(),
    }
    DecisionState::Retreating
}

/// Enough crew lost, a hospital exists and no ambulance is coming
pub fn needs_hospital(ctx: &DecisionContext, unit: &Unit) -> bool {
    unit.can_move()
        && unit.crew.losses() >= ctx.config.combat.hospital_crew_losses
        && !ctx.service_claimed(ServiceRole::Medical, unit.id)
        && ctx
            .world
            .nearest_own_structure(unit.owner, StructureKind::Hospital, unit.cell)
            .is_some()
}

/// Head to the nearest hospital; None when none is reachable
pub fn evacuate_to_hospital<P: Pathfinder + ?Sized>(
    ctx: &DecisionContext,
    nav: &mut Navigator<P>,
    unit: &mut Unit,
) -> Option<DecisionState> {
    let hospital = ctx
        .world
        .nearest_own_structure(unit.owner, StructureKind::Hospital, unit.cell)?;
    let dest = vicinity(ctx, unit, hospital)?;
    if !nav.move_to(ctx.world, unit, dest, WITHDRAW_PATH, false, ctx.now) {
        return None;
    }
    drop_combat_intent(unit);
    Some(DecisionState::EvacuatingToHospital)
}

/// Harvester under threat or recently hit runs for the defended area
pub fn harvester_flight<P: Pathfinder + ?Sized>(
    ctx: &DecisionContext,
    nav: &mut Navigator<P>,
    unit: &mut Unit,
) -> Option<DecisionState> {
    let radius = ctx.config.combat.harvester_threat_radius;
    let threatened = ctx
        .hostile_units()
        .any(|h| (h.is_combat() || h.is_aerial()) && h.cell.distance(&unit.cell) <= radius)
        || ctx.throttle.recently_damaged(unit, ctx.now);
    if !threatened {
        return None;
    }

    if let UnitKind::Harvester(payload) = &mut unit.kind {
        payload.gathering = None;
    }
    unit.flags.is_retreating = true;
    match safe_position(ctx, unit) {
        Some(dest) => {
            nav.move_to(ctx.world, unit, dest, WITHDRAW_PATH, false, ctx.now);
        }
        None => unit.halt(),
    }
    Some(DecisionState::Retreating)
}

/// Adjacent free cell away from an imminent hostile impact, if any
pub fn dodge_cell(ctx: &DecisionContext, unit: &Unit) -> Option<Cell> {
    let combat = &ctx.config.combat;
    let impact = ctx
        .world
        .incoming_fire
        .iter()
        .filter(|f| ctx.world.is_hostile(unit.owner, f.owner))
        .filter(|f| f.impact_time >= ctx.now && f.impact_time - ctx.now <= combat.dodge_window_ms)
        .filter(|f| f.impact.distance(&unit.cell) <= combat.dodge_radius)
        .min_by_key(|f| f.impact_time)?
        .impact;

    let current = unit.cell.distance(&impact);
    unit.cell
        .neighbors()
        .into_iter()
        .filter(|c| ctx.world.is_free_cell(*c, unit.id))
        .filter(|c| c.distance(&impact) > current)
        .max_by(|a, b| {
            a.distance(&impact)
                .total_cmp(&b.distance(&impact))
                .then_with(|| (b.y, b.x).cmp(&(a.y, a.x)))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::danger::DangerFields;
    use crate::battle::path_cache::PathCache;
    use crate::battle::pathfinding::GridAStar;
    use crate::battle::terrain::TerrainMap;
    use crate::battle::throttle::DecisionThrottle;
    use crate::battle::unit_type::UnitType;
    use crate::battle::units::CrewRole;
    use crate::battle::world::{BattleWorld, IncomingFire, PlayerRoster};
    use crate::core::config::TacticalConfig;
    use crate::core::types::{PlayerId, StructureId, UnitId};

    fn base_world() -> BattleWorld {
        let mut world = BattleWorld::new(TerrainMap::new(30, 30), PlayerRoster::new(2, None));
        world.add_structure(Structure::new(StructureId(1), PlayerId(0), StructureKind::Refinery, 2, 2));
        world.add_structure(Structure::new(StructureId(2), PlayerId(0), StructureKind::GunTurret, 20, 10));
        world
    }

    #[test]
    fn test_needs_retreat_thresholds() {
        let world = base_world();
        let config = TacticalConfig::new();
        let throttle = DecisionThrottle::new(&config.throttle);
        let danger = DangerFields::default();
        let ctx = DecisionContext::new(&world, &danger, &config, &throttle, PlayerId(0));

        let mut tank = Unit::new(UnitId(1), PlayerId(0), UnitType::MediumTank, Cell::new(10, 10));
        assert!(!needs_retreat(&ctx, &tank));
        tank.health = tank.max_health * 0.25;
        assert!(needs_retreat(&ctx, &tank));

        // Hysteresis: still withdrawing at 50%
        tank.health = tank.max_health * 0.5;
        tank.state = DecisionState::Retreating;
        tank.flags.is_retreating = true;
        assert!(needs_retreat(&ctx, &tank));
        tank.health = tank.max_health * 0.7;
        assert!(!needs_retreat(&ctx, &tank));

        if let Some(ammo) = tank.ammo_mut() {
            ammo.current = 0.0;
        }
        assert!(needs_retreat(&ctx, &tank));
    }

    #[test]
    fn test_safe_position_prefers_defenses() {
        let world = base_world();
        let config = TacticalConfig::new();
        let throttle = DecisionThrottle::new(&config.throttle);
        let danger = DangerFields::default();
        let ctx = DecisionContext::new(&world, &danger, &config, &throttle, PlayerId(0));

        // Refinery is ~9 away, the turret ~10 but counts half
        let tank = Unit::new(UnitId(1), PlayerId(0), UnitType::MediumTank, Cell::new(10, 8));
        let dest = safe_position(&ctx, &tank).unwrap();
        assert!(dest.distance(&Cell::new(20, 10)) < 2.0);
    }

    #[test]
    fn test_retreat_without_workshop_falls_back() {
        let world = base_world();
        let config = TacticalConfig::new();
        let throttle = DecisionThrottle::new(&config.throttle);
        let danger = DangerFields::default();
        let ctx = DecisionContext::new(&world, &danger, &config, &throttle, PlayerId(0));
        let mut cache = PathCache::new(2000);
        let finder = GridAStar::new();
        let mut nav = Navigator::new(&mut cache, &finder, &throttle);

        let mut tank = Unit::new(UnitId(1), PlayerId(0), UnitType::MediumTank, Cell::new(10, 8));
        tank.flags.allowed_to_attack = true;
        let state = retreat(&ctx, &mut nav, &mut tank);
        assert_eq!(state, DecisionState::Retreating);
        assert!(tank.flags.is_retreating);
        assert!(!tank.flags.allowed_to_attack);
        assert!(!tank.path.is_empty());
    }

    #[test]
    fn test_hospital_evacuation() {
        let mut world = base_world();
        world.add_structure(Structure::new(StructureId(3), PlayerId(0), StructureKind::Hospital, 10, 20));
        let config = TacticalConfig::new();
        let throttle = DecisionThrottle::new(&config.throttle);
        let danger = DangerFields::default();
        let ctx = DecisionContext::new(&world, &danger, &config, &throttle, PlayerId(0));
        let mut cache = PathCache::new(2000);
        let finder = GridAStar::new();
        let mut nav = Navigator::new(&mut cache, &finder, &throttle);

        let mut tank = Unit::new(UnitId(1), PlayerId(0), UnitType::MediumTank, Cell::new(10, 10));
        tank.crew.disable(CrewRole::Aiming);
        assert!(!needs_hospital(&ctx, &tank));
        tank.crew.disable(CrewRole::Firing);
        assert!(needs_hospital(&ctx, &tank));
        assert_eq!(
            evacuate_to_hospital(&ctx, &mut nav, &mut tank),
            Some(DecisionState::EvacuatingToHospital)
        );
        assert!(tank.flags.is_retreating);
    }

    #[test]
    fn test_dodge_moves_away_from_impact() {
        let mut world = base_world();
        world.now = 1000;
        world.incoming_fire.push(IncomingFire {
            owner: PlayerId(1),
            impact: Cell::new(10, 10),
            impact_time: 1300,
        });
        let config = TacticalConfig::new();
        let throttle = DecisionThrottle::new(&config.throttle);
        let danger = DangerFields::default();
        let ctx = DecisionContext::new(&world, &danger, &config, &throttle, PlayerId(0));

        let tank = Unit::new(UnitId(1), PlayerId(0), UnitType::MediumTank, Cell::new(11, 10));
        let cell = dodge_cell(&ctx, &tank).unwrap();
        assert!(cell.distance(&Cell::new(10, 10)) > 1.0);

        let far = Unit::new(UnitId(2), PlayerId(0), UnitType::MediumTank, Cell::new(15, 15));
        assert!(dodge_cell(&ctx, &far).is_none());
    }
}
