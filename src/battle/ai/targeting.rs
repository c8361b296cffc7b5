//! Target selection for line combat units
//!
//! A current target is kept while it is alive, reasonably close and
//! reachable. Otherwise the first match wins: the last attacker, a raider
//! threatening an own harvester, an enemy harvester, then (if the attack gate
//! allows) the nearest enemy combat unit or the most important enemy
//! structure. Lone units and pairs only take targets already close by.

use crate::battle::ai::decision_context::DecisionContext;
use crate::battle::attack::engagement::should_engage;
use crate::battle::structures::Structure;
use crate::battle::units::{TargetRef, Unit};

/// Why a target was picked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetReason {
    Retained,
    Retaliation,
    HarvesterDefense,
    EnemyHarvester,
    CloseTarget,
    CombatUnit,
    PriorityStructure,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetChoice {
    pub target: TargetRef,
    pub reason: TargetReason,
}

impl TargetChoice {
    fn new(target: TargetRef, reason: TargetReason) -> Self {
        Self { target, reason }
    }
}

/// Is the current target still worth keeping?
pub fn retained_target(ctx: &DecisionContext, unit: &Unit) -> Option<TargetRef> {
    let target = unit.target?;
    if ctx.throttle.has_fresh_damage(unit, ctx.now) {
        return None;
    }
    let distance = ctx.world.distance_to_target(unit.cell, target)?;
    if let TargetRef::Unit(id) = target {
        let victim = ctx.world.unit(id)?;
        if !ctx.world.is_hostile(unit.owner, victim.owner) || !ctx.can_hit(unit, victim) {
            return None;
        }
    }

    if !ctx.throttle.can_retarget(unit, ctx.now) {
        return Some(target);
    }

    let weapon = unit.weapon()?;
    let extended = weapon.range * ctx.config.combat.engagement_range_factor;
    let usable = weapon.in_range(distance) || !unit.path.is_empty();
    (distance <= extended && usable).then_some(target)
}

fn nearest_structure<'a>(
    structures: impl Iterator<Item = &'a Structure>,
    unit: &Unit,
) -> Option<&'a Structure> {
    structures.min_by(|a, b| {
        a.distance_to(unit.cell)
            .total_cmp(&b.distance_to(unit.cell))
            .then_with(|| a.id.cmp(&b.id))
    })
}

/// Pick a target for a line unit, or None to stay idle
pub fn select_target(ctx: &DecisionContext, unit: &Unit) -> Option<TargetChoice> {
    if let Some(target) = retained_target(ctx, unit) {
        return Some(TargetChoice::new(target, TargetReason::Retained));
    }

    let weapon = *unit.weapon()?;
    let combat = &ctx.config.combat;

    // Retaliation
    if let Some(attacker) = unit.last_attacker.and_then(|id| ctx.world.unit(id)) {
        if attacker.is_alive()
            && ctx.world.is_hostile(unit.owner, attacker.owner)
            && ctx.can_hit(unit, attacker)
            && attacker.cell.distance(&unit.cell) <= combat.retaliation_radius
        {
            return Some(TargetChoice::new(
                TargetRef::Unit(attacker.id),
                TargetReason::Retaliation,
            ));
        }
    }

    // Protect own harvesters
    let guarded = ctx
        .own_units()
        .filter(|h| h.is_harvester() && h.cell.distance(&unit.cell) <= combat.harvester_guard_radius);
    let mut best_raider: Option<(f32, &Unit)> = None;
    for harvester in guarded {
        let raider = ctx.nearest_hostile(harvester.cell, |h| {
            (h.is_combat() || h.is_aerial())
                && ctx.can_hit(unit, h)
                && h.cell.distance(&harvester.cell) <= combat.harvester_threat_radius
        });
        if let Some(raider) = raider {
            let d = raider.cell.distance(&unit.cell);
            if best_raider.map(|(bd, _)| d < bd).unwrap_or(true) {
                best_raider = Some((d, raider));
            }
        }
    }
    if let Some((_, raider)) = best_raider {
        return Some(TargetChoice::new(
            TargetRef::Unit(raider.id),
            TargetReason::HarvesterDefense,
        ));
    }

    // Enemy harvesters
    if weapon.hits_ground {
        if let Some(harvester) = ctx.nearest_hostile(unit.cell, |h| {
            h.is_harvester() && h.cell.distance(&unit.cell) <= combat.harvester_engage_range
        }) {
            return Some(TargetChoice::new(
                TargetRef::Unit(harvester.id),
                TargetReason::EnemyHarvester,
            ));
        }
    }

    let is_fighter = |h: &Unit| (h.is_combat() || h.is_aerial()) && ctx.can_hit(unit, h);
    let allies = ctx.allies_near(unit, ctx.config.attack.formation_radius);

    // Lone units and pairs stay conservative
    if allies.len() < 2 {
        let reach = weapon.range + combat.close_engage_margin;
        if let Some(enemy) = ctx.nearest_hostile(unit.cell, is_fighter) {
            if enemy.cell.distance(&unit.cell) <= reach {
                return Some(TargetChoice::new(
                    TargetRef::Unit(enemy.id),
                    TargetReason::CloseTarget,
                ));
            }
        }
        if weapon.hits_ground {
            if let Some(structure) = nearest_structure(ctx.hostile_structures(), unit) {
                if structure.distance_to(unit.cell) <= reach {
                    return Some(TargetChoice::new(
                        TargetRef::Structure(structure.id),
                        TargetReason::CloseTarget,
                    ));
                }
            }
        }
        return None;
    }

    if let Some(enemy) = ctx.nearest_hostile(unit.cell, is_fighter) {
        let target = TargetRef::Unit(enemy.id);
        if should_engage(ctx, unit, &allies, target) {
            return Some(TargetChoice::new(target, TargetReason::CombatUnit));
        }
    }

    if !weapon.hits_ground {
        return None;
    }

    let mut ranked: Vec<&Structure> = ctx
        .hostile_structures()
        .filter(|s| s.kind.priority_rank().is_some())
        .collect();
    ranked.sort_by(|a, b| {
        a.kind
            .priority_rank()
            .cmp(&b.kind.priority_rank())
            .then_with(|| a.distance_to(unit.cell).total_cmp(&b.distance_to(unit.cell)))
            .then_with(|| a.id.cmp(&b.id))
    });
    if ranked.is_empty() {
        ranked.extend(nearest_structure(ctx.hostile_structures(), unit));
    }

    ranked
        .into_iter()
        .map(|s| TargetRef::Structure(s.id))
        .find(|target| should_engage(ctx, unit, &allies, *target))
        .map(|target| TargetChoice::new(target, TargetReason::PriorityStructure))
}
