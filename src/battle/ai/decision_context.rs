//! A player's read-only view of the battle for one decision
//!
//! Bundles the world snapshot with the danger fields, configuration and
//! throttle, plus the spatial queries every behavior needs.

use crate::battle::danger::DangerFields;
use crate::battle::structures::Structure;
use crate::battle::throttle::DecisionThrottle;
use crate::battle::unit_type::ServiceRole;
use crate::battle::units::{ServiceTarget, Unit};
use crate::battle::world::BattleWorld;
use crate::core::config::TacticalConfig;
use crate::core::types::{Cell, GameTime, PlayerId, UnitId};

/// Decision-making context for one player
pub struct DecisionContext<'a> {
    pub world: &'a BattleWorld,
    pub danger: &'a DangerFields,
    pub config: &'a TacticalConfig,
    pub throttle: &'a DecisionThrottle,
    pub owner: PlayerId,
    pub now: GameTime,
}

impl<'a> DecisionContext<'a> {
    pub fn new(
        world: &'a BattleWorld,
        danger: &'a DangerFields,
        config: &'a TacticalConfig,
        throttle: &'a DecisionThrottle,
        owner: PlayerId,
    ) -> Self {
        Self {
            world,
            danger,
            config,
            throttle,
            owner,
            now: world.now,
        }
    }

    /// Ground danger this player faces at a cell
    pub fn danger_at(&self, cell: Cell) -> f64 {
        self.danger.danger_at(self.owner, cell)
    }

    /// Air danger this player faces at a cell
    pub fn air_danger_at(&self, cell: Cell) -> f64 {
        self.danger.air_danger_at(self.owner, cell)
    }

    pub fn hostile_units(&self) -> impl Iterator<Item = &'a Unit> + '_ {
        self.world.hostile_units(self.owner)
    }

    pub fn own_units(&self) -> impl Iterator<Item = &'a Unit> + '_ {
        self.world.own_units(self.owner)
    }

    pub fn own_structures(&self) -> impl Iterator<Item = &'a Structure> + '_ {
        self.world.own_structures(self.owner)
    }

    pub fn hostile_structures(&self) -> impl Iterator<Item = &'a Structure> + '_ {
        self.world.hostile_structures(self.owner)
    }

    /// Can `attacker`'s weapon engage `target` at all (ignoring range)?
    pub fn can_hit(&self, attacker: &Unit, target: &Unit) -> bool {
        match attacker.weapon() {
            Some(w) if target.is_aerial() => w.hits_air,
            Some(w) => w.hits_ground,
            None => false,
        }
    }

    /// Nearest hostile unit to `from` matching a predicate
    pub fn nearest_hostile(
        &self,
        from: Cell,
        predicate: impl Fn(&Unit) -> bool,
    ) -> Option<&'a Unit> {
        self.hostile_units()
            .filter(|u| predicate(*u))
            .min_by(|a, b| {
                from.distance(&a.cell)
                    .total_cmp(&from.distance(&b.cell))
                    .then_with(|| a.id.cmp(&b.id))
            })
    }

    /// Is `cell` within `radius` of any own structure center?
    pub fn near_own_base(&self, cell: Cell, radius: f32) -> bool {
        self.own_structures().any(|s| s.distance_to(cell) <= radius)
    }

    /// Own armed ground units within `radius` of `unit`, excluding itself
    pub fn allies_near(&self, unit: &Unit, radius: f32) -> Vec<&'a Unit> {
        self.own_units()
            .filter(|u| u.id != unit.id && u.is_combat() && u.cell.distance(&unit.cell) <= radius)
            .collect()
    }

    /// Hostile units inside the base defense radius of any own structure
    pub fn base_threats(&self) -> Vec<&'a Unit> {
        let radius = self.config.combat.base_defense_radius;
        let structures: Vec<&Structure> = self.own_structures().collect();
        if structures.is_empty() {
            return Vec::new();
        }
        self.hostile_units()
            .filter(|u| u.is_combat() || u.is_aerial())
            .filter(|u| structures.iter().any(|s| s.distance_to(u.cell) <= radius))
            .collect()
    }

    /// Own units currently flagged as base defenders, excluding `except`
    pub fn defenders_assigned(&self, except: UnitId) -> usize {
        self.own_units()
            .filter(|u| u.id != except && u.flags.defending_base)
            .count()
    }

    /// Does an own service vehicle of `role` hold `unit` as task or queued?
    pub fn service_claimed(&self, role: ServiceRole, unit: UnitId) -> bool {
        self.own_units()
            .filter_map(|u| u.service())
            .filter(|s| s.role == role)
            .any(|s| s.claimed().any(|t| t == ServiceTarget::Unit(unit)))
    }

    /// Is `cell` inside the reach of a hostile mobile anti-air weapon?
    pub fn mobile_air_defense_covers(&self, cell: Cell) -> bool {
        let margin = self.config.aerial.air_defense_margin;
        self.hostile_units().any(|u| match u.weapon() {
            Some(w) if w.hits_air && u.crew.can_fire() => u.cell.distance(&cell) <= w.range + margin,
            _ => false,
        })
    }
}
