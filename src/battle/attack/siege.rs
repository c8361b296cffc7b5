//! Siege placement around enemy structures
//!
//! Each attacker approaching a structure gets one of eight compass headings
//! from a rotating per-target counter, so a group spreads around the target
//! and repeated sieges come from new sides. The standoff distance shrinks
//! toward the weapon's full range as the target's nearby defenses grow.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::battle::ai::decision_context::DecisionContext;
use crate::battle::structures::Structure;
use crate::battle::units::Unit;
use crate::core::types::{Cell, PlayerId, StructureId, UnitId, Vec2};

/// Approach heading around a target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompassDirection {
    North,
    NorthEast,
    East,
    SouthEast,
    South,
    SouthWest,
    West,
    NorthWest,
}

impl CompassDirection {
    pub const ALL: [CompassDirection; 8] = [
        CompassDirection::North,
        CompassDirection::NorthEast,
        CompassDirection::East,
        CompassDirection::SouthEast,
        CompassDirection::South,
        CompassDirection::SouthWest,
        CompassDirection::West,
        CompassDirection::NorthWest,
    ];

    /// Unit vector pointing away from the target (y grows southward)
    pub fn vector(&self) -> Vec2 {
        let (x, y) = match self {
            CompassDirection::North => (0.0, -1.0),
            CompassDirection::NorthEast => (1.0, -1.0),
            CompassDirection::East => (1.0, 0.0),
            CompassDirection::SouthEast => (1.0, 1.0),
            CompassDirection::South => (0.0, 1.0),
            CompassDirection::SouthWest => (-1.0, 1.0),
            CompassDirection::West => (-1.0, 0.0),
            CompassDirection::NorthWest => (-1.0, -1.0),
        };
        Vec2::new(x, y).normalize()
    }
}

/// Where a sieging unit should stand
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SiegePosition {
    pub direction: CompassDirection,
    pub cell: Cell,
    /// True when the global attack point replaced the directional cell
    pub global: bool,
}

/// Siege bookkeeping shared by all AI players
#[derive(Debug, Clone, Default)]
pub struct SiegePlanner {
    counters: AHashMap<StructureId, usize>,
    assignments: AHashMap<(StructureId, UnitId), CompassDirection>,
    reserved: AHashMap<(StructureId, UnitId), Cell>,
}

impl SiegePlanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Heading for `unit` against `target`; sticky once assigned
    pub fn assign_direction(&mut self, target: StructureId, unit: UnitId) -> CompassDirection {
        if let Some(dir) = self.assignments.get(&(target, unit)) {
            return *dir;
        }
        let counter = self.counters.entry(target).or_insert(0);
        let dir = CompassDirection::ALL[*counter % CompassDirection::ALL.len()];
        *counter += 1;
        self.assignments.insert((target, unit), dir);
        dir
    }

    pub fn direction_of(&self, target: StructureId, unit: UnitId) -> Option<CompassDirection> {
        self.assignments.get(&(target, unit)).copied()
    }

    /// Forget a unit's heading and reserved cell for a target
    pub fn release(&mut self, target: StructureId, unit: UnitId) {
        self.assignments.remove(&(target, unit));
        self.reserved.remove(&(target, unit));
    }

    /// Drop everything held for targets that no longer exist. Counters are
    /// kept so a rebuilt structure is approached from a fresh side.
    pub fn retain_targets(&mut self, alive: impl Fn(StructureId) -> bool) {
        self.assignments.retain(|(target, _), _| alive(*target));
        self.reserved.retain(|(target, _), _| alive(*target));
    }

    /// Drop everything held by units that no longer exist
    pub fn retain_units(&mut self, alive: impl Fn(UnitId) -> bool) {
        self.assignments.retain(|(_, unit), _| alive(*unit));
        self.reserved.retain(|(_, unit), _| alive(*unit));
    }

    pub fn assignment_count(&self) -> usize {
        self.assignments.len()
    }

    fn is_reserved(&self, cell: Cell, unit: UnitId) -> bool {
        self.reserved
            .iter()
            .any(|((_, holder), reserved)| *holder != unit && *reserved == cell)
    }

    /// Pick the standing cell for `unit` sieging `target`
    pub fn plan(
        &mut self,
        ctx: &DecisionContext,
        unit: &Unit,
        target: &Structure,
    ) -> Option<SiegePosition> {
        let direction = self.assign_direction(target.id, unit.id);
        let weapon = unit.weapon()?;

        let strength = defensive_strength(ctx, target);
        let scale = 0.6 + 0.4 * strength / (strength + 2.0);
        let standoff = (weapon.range * scale).max(weapon.min_range + 0.5);
        let ideal = target.center() + direction.vector() * standoff;

        let mut cell = self.find_standing_cell(ctx, unit, ideal);
        let mut global = false;

        if ctx.config.attack.use_global_attack_point {
            if let Some(point) = global_attack_point(ctx, target.owner) {
                let reachable = weapon.in_range(target.distance_to(point));
                let safer = cell
                    .map(|c| ctx.danger_at(point) < ctx.danger_at(c))
                    .unwrap_or(true);
                if reachable && safer && !self.is_reserved(point, unit.id) {
                    cell = Some(point);
                    global = true;
                }
            }
        }

        let cell = cell?;
        self.reserved.insert((target.id, unit.id), cell);
        Some(SiegePosition {
            direction,
            cell,
            global,
        })
    }

    /// Nearest free, unreserved cell to `ideal`, searching outward in rings
    fn find_standing_cell(&self, ctx: &DecisionContext, unit: &Unit, ideal: Vec2) -> Option<Cell> {
        let center = ideal.cell();
        for radius in 0..=ctx.config.attack.siege_ring_max {
            let best = center
                .ring(radius)
                .into_iter()
                .filter(|c| ctx.world.is_free_cell(*c, unit.id) && !self.is_reserved(*c, unit.id))
                .min_by(|a, b| {
                    a.center()
                        .distance(&ideal)
                        .total_cmp(&b.center().distance(&ideal))
                        .then_with(|| (a.y, a.x).cmp(&(b.y, b.x)))
                });
            if best.is_some() {
                return best;
            }
        }
        None
    }
}

/// Weighted sum of defenses around a target, in medium-turret equivalents
///
/// Each defense counts its DPS relative to 25, scaled down linearly with
/// distance from the target out to the scan radius.
pub fn defensive_strength(ctx: &DecisionContext, target: &Structure) -> f32 {
    let radius = ctx.config.attack.siege_scan_radius;
    let center = target.center();
    ctx.world
        .structures
        .iter()
        .filter(|s| !ctx.world.is_hostile(s.owner, target.owner))
        .filter_map(|s| {
            let defense = s.active_defense()?;
            let d = s.center().distance(&center);
            if d > radius {
                return None;
            }
            Some(defense.dps() / 25.0 * (1.0 - d / radius).max(0.1))
        })
        .sum()
}

/// Lowest-danger walkable cell bordering any structure of `enemy`
pub fn global_attack_point(ctx: &DecisionContext, enemy: PlayerId) -> Option<Cell> {
    let mut best: Option<(f64, Cell)> = None;
    for structure in ctx.world.structures.iter().filter(|s| s.owner == enemy && s.is_alive()) {
        for cell in structure.adjacent_cells() {
            if !ctx.world.terrain.is_walkable(cell) {
                continue;
            }
            let danger = ctx.danger_at(cell);
            let better = match best {
                None => true,
                Some((d, c)) => danger < d || (danger == d && (cell.y, cell.x) < (c.y, c.x)),
            };
            if better {
                best = Some((danger, cell));
            }
        }
    }
    best.map(|(_, cell)| cell)
}
