//! AI Commander - per-unit decision state machine
//!
//! Runs each permitted unit through its priority list and writes the
//! resulting intent (state, target, path, flags) back onto the unit.

use tracing::debug;

use crate::battle::ai::aerial::fly_mission;
use crate::battle::ai::base_defense::defend_base;
use crate::battle::ai::decision_context::DecisionContext;
use crate::battle::ai::hunter::hunt;
use crate::battle::ai::retreat::{
    dodge_cell, evacuate_to_hospital, harvester_flight, needs_hospital, needs_retreat, retreat,
    vicinity,
};
use crate::battle::ai::targeting::select_target;
use crate::battle::ai::BattleAI;
use crate::battle::attack::siege::SiegePlanner;
use crate::battle::navigation::Navigator;
use crate::battle::pathfinding::{PathOptions, Pathfinder};
use crate::battle::units::{DecisionState, TargetRef, Unit, UnitKind};

/// AI Commander implementing BattleAI
#[derive(Debug, Clone, Default)]
pub struct AiCommander {
    siege: SiegePlanner,
}

impl AiCommander {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn siege(&self) -> &SiegePlanner {
        &self.siege
    }

    pub fn siege_mut(&mut self) -> &mut SiegePlanner {
        &mut self.siege
    }

    /// Mobility and command are gone: stay put, shoot back if possible
    fn hold_position(&self, ctx: &DecisionContext, unit: &mut Unit) -> DecisionState {
        unit.halt();
        let attacker = unit
            .last_attacker
            .and_then(|id| ctx.world.unit(id))
            .filter(|a| a.is_alive() && ctx.world.is_hostile(unit.owner, a.owner));
        let in_range = attacker
            .zip(unit.weapon())
            .map(|(a, w)| ctx.can_hit(unit, a) && w.in_range(unit.cell.distance(&a.cell)))
            .unwrap_or(false);

        match attacker {
            Some(a) if in_range && unit.crew.can_fire() => {
                let target = TargetRef::Unit(a.id);
                unit.target = Some(target);
                unit.flags.allowed_to_attack = true;
                DecisionState::Attacking(target)
            }
            _ => {
                unit.target = None;
                unit.flags.allowed_to_attack = false;
                DecisionState::Idle
            }
        }
    }

    fn dodge(&self, ctx: &DecisionContext, unit: &mut Unit) -> Option<DecisionState> {
        let cell = dodge_cell(ctx, unit)?;
        debug!(unit = unit.id.0, ?cell, "Dodging incoming fire");
        unit.path = vec![unit.cell, cell];
        unit.move_target = Some(cell);
        Some(DecisionState::Dodging)
    }

    fn stand_down(&self, unit: &mut Unit) -> DecisionState {
        unit.target = None;
        unit.flags.allowed_to_attack = false;
        DecisionState::Idle
    }

    /// Close in on a chosen target; structures get a siege position
    fn attack<P: Pathfinder + ?Sized>(
        &mut self,
        ctx: &DecisionContext,
        nav: &mut Navigator<P>,
        unit: &mut Unit,
        target: TargetRef,
    ) -> DecisionState {
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
            return DecisionState::Attacking(target);
        }

        match target {
            TargetRef::Unit(id) => {
                if let Some(victim) = ctx.world.unit(id) {
                    nav.move_to(ctx.world, unit, victim.cell, PathOptions::combat(), true, ctx.now);
                }
            }
            TargetRef::Structure(id) => {
                if let Some(structure) = ctx.world.structure(id) {
                    let dest = self
                        .siege
                        .plan(ctx, unit, structure)
                        .map(|p| p.cell)
                        .or_else(|| vicinity(ctx, unit, structure));
                    match dest {
                        Some(cell) => {
                            nav.move_to(ctx.world, unit, cell, PathOptions::combat(), false, ctx.now);
                        }
                        None => unit.halt(),
                    }
                }
            }
        }
        DecisionState::Attacking(target)
    }

    fn decide_combat<P: Pathfinder + ?Sized>(
        &mut self,
        ctx: &DecisionContext,
        nav: &mut Navigator<P>,
        unit: &mut Unit,
    ) -> DecisionState {
        if !unit.can_move() {
            return self.hold_position(ctx, unit);
        }
        if let Some(state) = self.dodge(ctx, unit) {
            return state;
        }
        if needs_retreat(ctx, unit) {
            return retreat(ctx, nav, unit);
        }
        if needs_hospital(ctx, unit) {
            if let Some(state) = evacuate_to_hospital(ctx, nav, unit) {
                return state;
            }
        }
        if unit.is_hunter() {
            if let Some(state) = hunt(ctx, nav, unit) {
                return state;
            }
        }
        if let Some(state) = defend_base(ctx, nav, unit) {
            return state;
        }
        match select_target(ctx, unit) {
            Some(choice) => {
                debug!(unit = unit.id.0, target = ?choice.target, reason = ?choice.reason, "Target selected");
                self.attack(ctx, nav, unit, choice.target)
            }
            None => self.stand_down(unit),
        }
    }

    fn decide_harvester<P: Pathfinder + ?Sized>(
        &mut self,
        ctx: &DecisionContext,
        nav: &mut Navigator<P>,
        unit: &mut Unit,
    ) -> DecisionState {
        if !unit.can_move() {
            unit.halt();
            return DecisionState::Idle;
        }
        harvester_flight(ctx, nav, unit).unwrap_or(DecisionState::Idle)
    }

    /// Service vehicles only look after themselves here; tasks come from
    /// the logistics dispatcher
    fn decide_service<P: Pathfinder + ?Sized>(
        &mut self,
        ctx: &DecisionContext,
        nav: &mut Navigator<P>,
        unit: &mut Unit,
    ) -> DecisionState {
        if !unit.can_move() {
            unit.halt();
            return DecisionState::Idle;
        }
        if let Some(state) = self.dodge(ctx, unit) {
            return state;
        }
        if needs_retreat(ctx, unit) {
            return retreat(ctx, nav, unit);
        }
        DecisionState::Idle
    }

    fn decide_aerial<P: Pathfinder + ?Sized>(
        &mut self,
        ctx: &DecisionContext,
        nav: &mut Navigator<P>,
        unit: &mut Unit,
    ) -> DecisionState {
        if !unit.can_move() {
            return self.hold_position(ctx, unit);
        }
        if needs_retreat(ctx, unit) {
            unit.flags.evading_air_defense = false;
            return retreat(ctx, nav, unit);
        }
        fly_mission(ctx, nav, unit)
    }
}

impl BattleAI for AiCommander {
    fn decide_unit<P: Pathfinder + ?Sized>(
        &mut self,
        ctx: &DecisionContext,
        nav: &mut Navigator<P>,
        unit: &mut Unit,
    ) -> bool {
        if !unit.is_alive() || !ctx.throttle.can_decide(unit, ctx.now) {
            return false;
        }

        let previous_target = unit.target;
        let previous_state = unit.state;
        let state = match unit.kind {
            UnitKind::Combat(_) => self.decide_combat(ctx, nav, unit),
            UnitKind::Harvester(_) => self.decide_harvester(ctx, nav, unit),
            UnitKind::Service(_) => self.decide_service(ctx, nav, unit),
            UnitKind::Aerial(_) => self.decide_aerial(ctx, nav, unit),
        };

        unit.flags.is_retreating = matches!(
            state,
            DecisionState::Retreating
                | DecisionState::EvacuatingToHospital
                | DecisionState::EvacuatingToWorkshop
        );
        unit.flags.being_attacked = ctx.throttle.recently_damaged(unit, ctx.now);
        if state != DecisionState::DefendingBase {
            unit.flags.defending_base = false;
        }

        if unit.target != previous_target {
            if let Some(TargetRef::Structure(old)) = previous_target {
                self.siege.release(old, unit.id);
            }
            if unit.target.is_some() {
                ctx.throttle.mark_retargeted(unit, ctx.now);
            }
        }
        if state != previous_state {
            debug!(unit = unit.id.0, from = ?previous_state, to = ?state, "State change");
        }

        unit.state = state;
        ctx.throttle.mark_decided(unit, ctx.now);
        true
    }

    fn forget_unit(&mut self, unit: &Unit) {
        if let Some(TargetRef::Structure(target)) = unit.target {
            self.siege.release(target, unit.id);
        }
    }
}
