//! Base defense: recruit nearby units against raiders
//!
//! Hostiles near any own structure raise a defender cap of
//! `min(defenders_per_threat × threats, max_base_defenders)`. Idle or
//! attacking units near the base join until the cap is reached; defenders
//! beyond a shrinking cap are released.

use tracing::debug;

use crate::battle::ai::decision_context::DecisionContext;
use crate::battle::navigation::Navigator;
use crate::battle::pathfinding::{PathOptions, Pathfinder};
use crate::battle::units::{DecisionState, TargetRef, Unit};
use crate::core::config::CombatConfig;

/// How many defenders `threat_count` raiders justify
pub fn defender_cap(threat_count: usize, config: &CombatConfig) -> usize {
    (config.defenders_per_threat as usize * threat_count).min(config.max_base_defenders as usize)
}

fn recruitable(state: DecisionState) -> bool {
    matches!(
        state,
        DecisionState::Idle | DecisionState::Attacking(_) | DecisionState::DefendingBase
    )
}

/// Join or continue base defense; None when this unit is not needed
pub fn defend_base<P: Pathfinder + ?Sized>(
    ctx: &DecisionContext,
    nav: &mut Navigator<P>,
    unit: &mut Unit,
) -> Option<DecisionState> {
    let combat = &ctx.config.combat;
    let threats: Vec<&Unit> = ctx
        .base_threats()
        .into_iter()
        .filter(|t| ctx.can_hit(unit, t))
        .collect();

    if threats.is_empty() {
        unit.flags.defending_base = false;
        return None;
    }

    let cap = defender_cap(threats.len(), combat);
    let others = ctx.defenders_assigned(unit.id);
    if others >= cap {
        if unit.flags.defending_base {
            debug!(unit = unit.id.0, cap, "Released from base defense");
        }
        unit.flags.defending_base = false;
        return None;
    }

    if !unit.flags.defending_base {
        if !recruitable(unit.state) {
            return None;
        }
        let near_base = ctx
            .own_structures()
            .any(|s| s.distance_to(unit.cell) <= combat.defender_recruit_radius);
        if !near_base {
            return None;
        }
    }

    let current = unit.target.and_then(|t| match t {
        TargetRef::Unit(id) => threats.iter().find(|u| u.id == id).copied(),
        TargetRef::Structure(_) => None,
    });
    let threat = match current {
        Some(t) if !ctx.throttle.can_retarget(unit, ctx.now) => t,
        _ => threats
            .iter()
            .copied()
            .min_by(|a, b| {
                a.cell
                    .distance(&unit.cell)
                    .total_cmp(&b.cell.distance(&unit.cell))
                    .then_with(|| a.id.cmp(&b.id))
            })?,
    };

    if !unit.flags.defending_base {
        debug!(unit = unit.id.0, threat = threat.id.0, "Recruited for base defense");
    }
    unit.target = Some(TargetRef::Unit(threat.id));
    unit.flags.defending_base = true;
    unit.flags.allowed_to_attack = true;
    unit.flags.is_retreating = false;

    let in_range = unit
        .weapon()
        .map(|w| w.in_range(unit.cell.distance(&threat.cell)))
        .unwrap_or(false);
    if in_range {
        unit.halt();
    } else {
        nav.move_to(ctx.world, unit, threat.cell, PathOptions::combat(), true, ctx.now);
    }
    Some(DecisionState::DefendingBase)
}
