//! Service requests: which own units need which vehicle, and how badly

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::battle::unit_type::ServiceRole;
use crate::battle::units::{ServiceTarget, Unit};
use crate::battle::world::BattleWorld;
use crate::core::config::LogisticsConfig;
use crate::core::types::{Cell, PlayerId};

/// Crew roles a unit carries
const CREW_ROLES: f32 = 4.0;

/// Request tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Urgency {
    /// Exhausted supply or an immobilized crew; served immediately
    Critical,
    /// Running low; served when a vehicle is available
    Low,
}

/// A recipient waiting for a service vehicle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ServiceRequest {
    pub target: ServiceTarget,
    pub role: ServiceRole,
    pub urgency: Urgency,
    /// Remaining supply (or crew) fraction; lower is served first
    pub ratio: f32,
    pub cell: Cell,
}

/// Remaining fraction of what `role` replenishes, if the unit uses it
pub fn supply_ratio(unit: &Unit, role: ServiceRole) -> Option<f32> {
    match role {
        ServiceRole::Fuel => unit.fuel().filter(|s| s.capacity > 0.0).map(|s| s.ratio()),
        ServiceRole::Ammunition => unit.ammo().filter(|s| s.capacity > 0.0).map(|s| s.ratio()),
        ServiceRole::Medical => Some(1.0 - unit.crew.losses() as f32 / CREW_ROLES),
        ServiceRole::Recovery => None,
    }
}

/// Tier of a unit's need for `role`, or None when it needs nothing
pub fn classify(unit: &Unit, role: ServiceRole, config: &LogisticsConfig) -> Option<Urgency> {
    match role {
        ServiceRole::Fuel | ServiceRole::Ammunition => {
            let supply = match role {
                ServiceRole::Fuel => unit.fuel(),
                _ => unit.ammo(),
            }?;
            if supply.is_exhausted() {
                Some(Urgency::Critical)
            } else if supply.capacity > 0.0 && supply.ratio() < config.low_supply_ratio {
                Some(Urgency::Low)
            } else {
                None
            }
        }
        ServiceRole::Medical => {
            if !unit.can_move() {
                Some(Urgency::Critical)
            } else if unit.crew.losses() > 0 {
                Some(Urgency::Low)
            } else {
                None
            }
        }
        ServiceRole::Recovery => None,
    }
}

/// Does the recipient still need what `role` provides?
pub fn still_needs(world: &BattleWorld, target: ServiceTarget, role: ServiceRole) -> bool {
    match target {
        ServiceTarget::Wreck(id) => role == ServiceRole::Recovery && world.wreck(id).is_some(),
        ServiceTarget::Unit(id) => world
            .unit(id)
            .filter(|u| u.is_alive())
            .and_then(|u| supply_ratio(u, role))
            .map(|ratio| ratio < 1.0)
            .unwrap_or(false),
    }
}

/// Every current request of `owner` for `role`
pub fn collect_requests(
    world: &BattleWorld,
    owner: PlayerId,
    role: ServiceRole,
    config: &LogisticsConfig,
) -> Vec<ServiceRequest> {
    if role == ServiceRole::Recovery {
        return world
            .wrecks
            .iter()
            .filter(|w| w.owner == owner)
            .map(|w| ServiceRequest {
                target: ServiceTarget::Wreck(w.id),
                role,
                urgency: Urgency::Low,
                ratio: 0.0,
                cell: w.cell,
            })
            .collect();
    }

    world
        .own_units(owner)
        .filter(|u| u.service().map(|s| s.role != role).unwrap_or(true))
        .filter_map(|u| {
            let urgency = classify(u, role, config)?;
            Some(ServiceRequest {
                target: ServiceTarget::Unit(u.id),
                role,
                urgency,
                ratio: supply_ratio(u, role).unwrap_or(0.0),
                cell: u.cell,
            })
        })
        .collect()
}

/// Min-heap of requests: lowest ratio first, then shortest distance
#[derive(Debug, Default)]
pub struct RequestQueue {
    requests: Vec<ServiceRequest>,
    heap: BinaryHeap<Reverse<(OrderedFloat<f32>, OrderedFloat<f32>, usize)>>,
}

impl RequestQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// `distance` is to the nearest vehicle that could take the request
    pub fn push(&mut self, request: ServiceRequest, distance: f32) {
        let index = self.requests.len();
        self.requests.push(request);
        self.heap.push(Reverse((
            OrderedFloat(request.ratio),
            OrderedFloat(distance),
            index,
        )));
    }

    pub fn pop(&mut self) -> Option<ServiceRequest> {
        let Reverse((_, _, index)) = self.heap.pop()?;
        self.requests.get(index).copied()
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::terrain::TerrainMap;
    use crate::battle::unit_type::UnitType;
    use crate::battle::units::CrewRole;
    use crate::battle::world::{PlayerRoster, Wreck};
    use crate::core::types::{UnitId, WreckId};

    fn tank(id: u32) -> Unit {
        Unit::new(UnitId(id), PlayerId(0), UnitType::MediumTank, Cell::new(id as i32, 0))
    }

    #[test]
    fn test_fuel_tiers() {
        let config = LogisticsConfig::default();
        let mut unit = tank(1);
        assert_eq!(classify(&unit, ServiceRole::Fuel, &config), None);

        unit.fuel_mut().unwrap().current = unit.fuel().unwrap().capacity * 0.2;
        assert_eq!(classify(&unit, ServiceRole::Fuel, &config), Some(Urgency::Low));

        unit.fuel_mut().unwrap().current = 0.0;
        assert_eq!(classify(&unit, ServiceRole::Fuel, &config), Some(Urgency::Critical));
    }

    #[test]
    fn test_medical_tiers() {
        let config = LogisticsConfig::default();
        let mut unit = tank(1);
        unit.crew.disable(CrewRole::Aiming);
        assert_eq!(classify(&unit, ServiceRole::Medical, &config), Some(Urgency::Low));
        unit.crew.disable(CrewRole::Mobility);
        unit.crew.disable(CrewRole::Command);
        assert_eq!(classify(&unit, ServiceRole::Medical, &config), Some(Urgency::Critical));
    }

    #[test]
    fn test_harvesters_need_no_ammo() {
        let config = LogisticsConfig::default();
        let harvester = Unit::new(UnitId(1), PlayerId(0), UnitType::Harvester, Cell::new(0, 0));
        assert_eq!(classify(&harvester, ServiceRole::Ammunition, &config), None);
        assert_eq!(supply_ratio(&harvester, ServiceRole::Ammunition), None);
    }

    #[test]
    fn test_collect_skips_own_role_vehicles() {
        let mut world = BattleWorld::new(TerrainMap::new(10, 10), PlayerRoster::new(2, None));
        let mut tanker = Unit::new(UnitId(1), PlayerId(0), UnitType::FuelTanker, Cell::new(0, 0));
        tanker.fuel_mut().unwrap().current = 0.0;
        let mut thirsty = tank(2);
        thirsty.fuel_mut().unwrap().current = 0.0;
        world.add_unit(tanker);
        world.add_unit(thirsty);
        world.add_wreck(Wreck {
            id: WreckId(1),
            owner: PlayerId(0),
            cell: Cell::new(5, 5),
            unit_type: UnitType::LightTank,
        });

        let config = LogisticsConfig::default();
        let fuel = collect_requests(&world, PlayerId(0), ServiceRole::Fuel, &config);
        assert_eq!(fuel.len(), 1);
        assert_eq!(fuel[0].target, ServiceTarget::Unit(UnitId(2)));

        let wrecks = collect_requests(&world, PlayerId(0), ServiceRole::Recovery, &config);
        assert_eq!(wrecks.len(), 1);
        assert!(collect_requests(&world, PlayerId(1), ServiceRole::Recovery, &config).is_empty());
    }

    #[test]
    fn test_queue_orders_by_ratio_then_distance() {
        let request = |id: u32, ratio: f32| ServiceRequest {
            target: ServiceTarget::Unit(UnitId(id)),
            role: ServiceRole::Fuel,
            urgency: Urgency::Low,
            ratio,
            cell: Cell::new(0, 0),
        };
        let mut queue = RequestQueue::new();
        queue.push(request(1, 0.2), 1.0);
        queue.push(request(2, 0.1), 9.0);
        queue.push(request(3, 0.2), 0.5);

        let order: Vec<ServiceTarget> = std::iter::from_fn(|| queue.pop()).map(|r| r.target).collect();
        assert_eq!(
            order,
            vec![
                ServiceTarget::Unit(UnitId(2)),
                ServiceTarget::Unit(UnitId(3)),
                ServiceTarget::Unit(UnitId(1)),
            ]
        );
    }

    #[test]
    fn test_still_needs() {
        let mut world = BattleWorld::new(TerrainMap::new(10, 10), PlayerRoster::new(2, None));
        let mut unit = tank(1);
        unit.ammo_mut().unwrap().current = 1.0;
        world.add_unit(unit);
        let target = ServiceTarget::Unit(UnitId(1));
        assert!(still_needs(&world, target, ServiceRole::Ammunition));
        assert!(!still_needs(&world, target, ServiceRole::Fuel));
        assert!(!still_needs(&world, ServiceTarget::Wreck(WreckId(3)), ServiceRole::Recovery));
    }
}
