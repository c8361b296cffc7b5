//! Engagement gate: is a unit (with its local group) strong enough to attack?
//!
//! Units always engage when they are already able to shoot, defending home,
//! reacting to damage, or going after soft or nearly dead targets. Otherwise
//! the local group must be large enough for the danger around the target.

use crate::battle::ai::decision_context::DecisionContext;
use crate::battle::units::{TargetRef, Unit};

/// Reason an engagement was allowed (or why the group was large enough)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngageReason {
    InBasePerimeter,
    InFiringRange,
    RecentlyDamaged,
    SoftTarget,
    HeavilyDamagedTarget,
    GroupStrength,
}

/// Group size needed to push into `danger` DPS with the given average DPS
pub fn required_group_size(danger: f64, average_dps: f32, min_group: u32) -> u32 {
    if danger <= 0.0 {
        return min_group;
    }
    if average_dps <= 0.0 {
        return u32::MAX;
    }
    let needed = (danger / average_dps as f64).ceil() as u32;
    needed.max(min_group)
}

/// Why `unit` may engage `target`, or None if it should hold back
pub fn engage_reason(
    ctx: &DecisionContext,
    unit: &Unit,
    allies: &[&Unit],
    target: TargetRef,
) -> Option<EngageReason> {
    let attack = &ctx.config.attack;

    if ctx.near_own_base(unit.cell, attack.base_perimeter_radius) {
        return Some(EngageReason::InBasePerimeter);
    }

    let distance = ctx.world.distance_to_target(unit.cell, target)?;
    if unit.weapon().map(|w| w.in_range(distance)).unwrap_or(false) {
        return Some(EngageReason::InFiringRange);
    }

    if ctx.throttle.recently_damaged(unit, ctx.now) {
        return Some(EngageReason::RecentlyDamaged);
    }

    if let TargetRef::Unit(id) = target {
        if ctx.world.unit(id).map(|u| u.is_harvester()).unwrap_or(false) {
            return Some(EngageReason::SoftTarget);
        }
    }

    if ctx
        .world
        .target_health_ratio(target)
        .map(|r| r <= attack.heavily_damaged_ratio)
        .unwrap_or(false)
    {
        return Some(EngageReason::HeavilyDamagedTarget);
    }

    let group: Vec<&Unit> = std::iter::once(unit)
        .chain(
            allies
                .iter()
                .copied()
                .filter(|a| a.id != unit.id && a.cell.distance(&unit.cell) <= attack.formation_radius),
        )
        .collect();
    let average_dps = group.iter().map(|u| u.dps()).sum::<f32>() / group.len() as f32;
    let target_cell = ctx.world.target_cell(target)?;
    let danger = ctx.danger_at(target_cell);
    let required = required_group_size(danger, average_dps, attack.min_group_size);

    if group.len() as u32 >= required {
        Some(EngageReason::GroupStrength)
    } else {
        None
    }
}

/// Gate used by target selection for units cleared to attack
pub fn should_engage(
    ctx: &DecisionContext,
    unit: &Unit,
    allies: &[&Unit],
    target: TargetRef,
) -> bool {
    engage_reason(ctx, unit, allies, target).is_some()
}
