//! Harvester-hunter role
//!
//! Hunters skip the line unit's priorities. They defend themselves against
//! close combat units, back out of defensive fire, and otherwise stalk the
//! nearest enemy harvester that is working outside the enemy's defenses.

use tracing::debug;

use crate::battle::ai::decision_context::DecisionContext;
use crate::battle::ai::retreat::WITHDRAW_PATH;
use crate::battle::navigation::Navigator;
use crate::battle::pathfinding::{PathOptions, Pathfinder};
use crate::battle::units::{DecisionState, TargetRef, Unit};
use crate::core::types::Cell;

/// Nearest free cell outside defensive fire, within the standoff radius
pub fn standoff_cell(ctx: &DecisionContext, unit: &Unit) -> Option<Cell> {
    for radius in 1..=ctx.config.hunter.standoff_search_radius {
        let best = unit
            .cell
            .ring(radius)
            .into_iter()
            .filter(|c| ctx.danger_at(*c) <= 0.0 && ctx.world.is_free_cell(*c, unit.id))
            .min_by(|a, b| {
                a.distance(&unit.cell)
                    .total_cmp(&b.distance(&unit.cell))
                    .then_with(|| (a.y, a.x).cmp(&(b.y, b.x)))
            });
        if best.is_some() {
            return best;
        }
    }
    None
}

/// Nearest gathering enemy harvester outside enemy defensive fire
pub fn prey<'a>(ctx: &DecisionContext<'a>, unit: &Unit) -> Option<&'a Unit> {
    ctx.nearest_hostile(unit.cell, |h| {
        h.is_harvester() && h.is_gathering() && ctx.danger_at(h.cell) <= 0.0
    })
}

fn engage<P: Pathfinder + ?Sized>(
    ctx: &DecisionContext,
    nav: &mut Navigator<P>,
    unit: &mut Unit,
    victim: &Unit,
) {
    unit.target = Some(TargetRef::Unit(victim.id));
    unit.flags.allowed_to_attack = true;
    let in_range = unit
        .weapon()
        .map(|w| w.in_range(unit.cell.distance(&victim.cell)))
        .unwrap_or(false);
    if in_range {
        unit.halt();
    } else {
        nav.move_to(ctx.world, unit, victim.cell, PathOptions::combat(), true, ctx.now);
    }
}

/// Run the hunter routine; None when there is nothing to hunt
pub fn hunt<P: Pathfinder + ?Sized>(
    ctx: &DecisionContext,
    nav: &mut Navigator<P>,
    unit: &mut Unit,
) -> Option<DecisionState> {
    let radius = ctx.config.hunter.self_defense_radius;
    let attacker = ctx.nearest_hostile(unit.cell, |h| {
        h.is_combat() && ctx.can_hit(unit, h) && h.cell.distance(&unit.cell) <= radius
    });
    if let Some(attacker) = attacker {
        debug!(unit = unit.id.0, attacker = attacker.id.0, "Hunter defending itself");
        unit.flags.hunting_harvesters = false;
        engage(ctx, nav, unit, attacker);
        return Some(DecisionState::Attacking(TargetRef::Unit(attacker.id)));
    }

    if ctx.danger_at(unit.cell) > 0.0 {
        unit.target = None;
        unit.flags.allowed_to_attack = false;
        unit.flags.hunting_harvesters = true;
        match standoff_cell(ctx, unit) {
            Some(cell) => {
                nav.move_to(ctx.world, unit, cell, WITHDRAW_PATH, false, ctx.now);
            }
            None => unit.halt(),
        }
        return Some(DecisionState::HuntingHarvesters);
    }

    let Some(harvester) = prey(ctx, unit) else {
        unit.flags.hunting_harvesters = false;
        return None;
    };
    unit.flags.hunting_harvesters = true;
    engage(ctx, nav, unit, harvester);
    Some(DecisionState::HuntingHarvesters)
}
