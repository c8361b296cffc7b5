//! Movement intent: turns a destination into a unit path
//!
//! Ground units route through the shared path cache; aircraft fly straight.
//! A repeated request for the same destination only searches again once the
//! unit's path interval has elapsed, so unreachable goals are not retried
//! every tick.

use crate::battle::path_cache::PathCache;
use crate::battle::pathfinding::{PathOptions, Pathfinder};
use crate::battle::throttle::DecisionThrottle;
use crate::battle::units::Unit;
use crate::battle::world::BattleWorld;
use crate::core::types::{Cell, GameTime, UnitId};

/// Mutable routing state borrowed for one decision
pub struct Navigator<'a, P: Pathfinder + ?Sized> {
    pub cache: &'a mut PathCache,
    pub pathfinder: &'a P,
    pub throttle: &'a DecisionThrottle,
}

impl<'a, P: Pathfinder + ?Sized> Navigator<'a, P> {
    pub fn new(cache: &'a mut PathCache, pathfinder: &'a P, throttle: &'a DecisionThrottle) -> Self {
        Self {
            cache,
            pathfinder,
            throttle,
        }
    }

    /// Route a ground unit to `dest`; returns whether it has a usable path
    ///
    /// `chasing` selects the shorter recalculation interval used for moving
    /// targets.
    pub fn move_to(
        &mut self,
        world: &BattleWorld,
        unit: &mut Unit,
        dest: Cell,
        options: PathOptions,
        chasing: bool,
        now: GameTime,
    ) -> bool {
        if unit.is_aerial() {
            return self.fly_to(unit, dest, now);
        }

        let same_dest = unit.move_target == Some(dest);
        if same_dest && !self.throttle.path_due(unit, now, chasing) {
            return !unit.path.is_empty();
        }

        let path = self.cache.get_path(
            self.pathfinder,
            unit.cell,
            dest,
            &world.terrain,
            &world.occupancy,
            unit.owner,
            options,
            now,
        );
        self.throttle.mark_path(unit, now);
        unit.move_target = Some(dest);
        unit.path = path;
        !unit.path.is_empty()
    }

    /// Straight-line flight path for aircraft
    pub fn fly_to(&mut self, unit: &mut Unit, dest: Cell, now: GameTime) -> bool {
        if unit.move_target != Some(dest) || unit.path.is_empty() {
            unit.path = unit.cell.line_to(&dest);
            unit.move_target = Some(dest);
            self.throttle.mark_path(unit, now);
        }
        true
    }
}

/// Nearest cell to `around` (by distance to `prefer`) a ground unit could
/// stop on, searching square rings out to `max_ring`
pub fn nearest_free_cell(
    world: &BattleWorld,
    around: Cell,
    prefer: Cell,
    unit: UnitId,
    max_ring: u32,
) -> Option<Cell> {
    for radius in 0..=max_ring {
        let best = around
            .ring(radius)
            .into_iter()
            .filter(|c| world.is_free_cell(*c, unit))
            .min_by(|a, b| {
                a.distance(&prefer)
                    .total_cmp(&b.distance(&prefer))
                    .then_with(|| (a.y, a.x).cmp(&(b.y, b.x)))
            });
        if best.is_some() {
            return best;
        }
    }
    None
}
