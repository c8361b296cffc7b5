//! Logistics dispatcher: pairs service vehicles with recipients
//!
//! Per owner and tick: finish services whose vehicle has arrived, hand out
//! critical requests (a free vehicle, else interrupting a non-critical task,
//! else a queue slot), hand out low requests when the scan cooldown allows,
//! then route every busy vehicle toward its recipient. A recipient is held
//! by at most one vehicle of its owner at a time, active or queued. A held
//! recipient that turns critical is escalated rather than left waiting.

use std::collections::VecDeque;

use ahash::{AHashMap, AHashSet};
use tracing::debug;

use crate::battle::execution::{TacticalEventKind, TacticalEventLog};
use crate::battle::logistics::needs::{collect_requests, still_needs, RequestQueue, ServiceRequest, Urgency};
use crate::battle::navigation::Navigator;
use crate::battle::pathfinding::{PathOptions, Pathfinder};
use crate::battle::throttle::Cooldown;
use crate::battle::unit_type::ServiceRole;
use crate::battle::units::{ServiceTarget, ServiceTask, Unit};
use crate::battle::world::BattleWorld;
use crate::core::config::LogisticsConfig;
use crate::core::types::{Cell, GameTime, PlayerId};

/// Every recipient claimed by any vehicle of `owner`
pub fn owner_claims(world: &BattleWorld, owner: PlayerId) -> AHashSet<ServiceTarget> {
    world
        .own_units(owner)
        .filter_map(Unit::service)
        .flat_map(|s| s.claimed())
        .collect()
}

fn target_cell(world: &BattleWorld, target: ServiceTarget) -> Option<Cell> {
    match target {
        ServiceTarget::Unit(id) => world.unit(id).filter(|u| u.is_alive()).map(|u| u.cell),
        ServiceTarget::Wreck(id) => world.wreck(id).map(|w| w.cell),
    }
}

/// Can take a new task right now
fn available(unit: &Unit) -> bool {
    unit.is_alive() && unit.can_move() && !unit.state.is_withdrawing()
}

/// Refill or treat a recipient
fn perform(recipient: &mut Unit, role: ServiceRole) {
    match role {
        ServiceRole::Fuel => {
            if let Some(fuel) = recipient.fuel_mut() {
                fuel.refill();
            }
        }
        ServiceRole::Ammunition => {
            if let Some(ammo) = recipient.ammo_mut() {
                ammo.refill();
            }
        }
        ServiceRole::Medical => recipient.crew.restore(),
        ServiceRole::Recovery => {}
    }
}

/// Drop the current task and take the next queued one
fn advance(vehicle: &mut Unit) {
    if let Some(service) = vehicle.service_mut() {
        service.task = service.queue.pop_front();
    }
    vehicle.halt();
}

/// Service vehicle bookkeeping across ticks
#[derive(Debug, Clone)]
pub struct LogisticsDispatcher {
    low_scan: Cooldown,
    last_low_scan: AHashMap<(PlayerId, ServiceRole), GameTime>,
}

impl LogisticsDispatcher {
    pub fn new(config: &LogisticsConfig) -> Self {
        Self {
            low_scan: Cooldown::new(config.low_scan_cooldown_ms),
            last_low_scan: AHashMap::new(),
        }
    }

    /// Run one logistics pass for `owner`
    pub fn update<P: Pathfinder + ?Sized>(
        &mut self,
        world: &mut BattleWorld,
        nav: &mut Navigator<P>,
        config: &LogisticsConfig,
        owner: PlayerId,
        events: &mut TacticalEventLog,
    ) {
        self.complete_services(world, owner, config, events);
        let mut claims = owner_claims(world, owner);
        for role in ServiceRole::all() {
            self.dispatch_role(world, owner, role, config, &mut claims, events);
        }
        self.move_vehicles(world, nav, owner, config);
    }

    /// Serve recipients in range, drop stale work, promote queued tasks
    fn complete_services(
        &mut self,
        world: &mut BattleWorld,
        owner: PlayerId,
        config: &LogisticsConfig,
        events: &mut TacticalEventLog,
    ) {
        let now = world.now;
        for i in 0..world.units.len() {
            let vehicle = &world.units[i];
            if vehicle.owner != owner || !vehicle.is_alive() {
                continue;
            }
            let Some(service) = vehicle.service() else {
                continue;
            };
            let (id, role, cell) = (vehicle.id, service.role, vehicle.cell);
            let stale: Vec<ServiceTarget> = service
                .claimed()
                .filter(|t| !still_needs(world, *t, role))
                .collect();

            if let Some(service) = world.units[i].service_mut() {
                service.queue.retain(|t| !stale.contains(&t.target));
                if service.task.is_none() {
                    service.task = service.queue.pop_front();
                }
            }

            let Some(task) = world.units[i].service().and_then(|s| s.task) else {
                continue;
            };
            if stale.contains(&task.target) {
                debug!(vehicle = id.0, target = ?task.target, "Service no longer needed");
                advance(&mut world.units[i]);
                continue;
            }
            let Some(dest) = target_cell(world, task.target) else {
                advance(&mut world.units[i]);
                continue;
            };
            if cell.distance(&dest) > config.service_range {
                continue;
            }

            match task.target {
                ServiceTarget::Unit(recipient) => {
                    if let Some(unit) = world.unit_mut(recipient) {
                        perform(unit, role);
                    }
                    events.push(
                        TacticalEventKind::ServiceCompleted {
                            vehicle: id,
                            target: task.target,
                        },
                        format!("{:?} vehicle {} served unit {}", role, id.0, recipient.0),
                        now,
                    );
                }
                ServiceTarget::Wreck(wreck) => {
                    world.wrecks.retain(|w| w.id != wreck);
                    events.push(
                        TacticalEventKind::WreckRecovered { vehicle: id, wreck },
                        format!("Vehicle {} recovered wreck {}", id.0, wreck.0),
                        now,
                    );
                }
            }
            advance(&mut world.units[i]);
        }
    }

    fn dispatch_role(
        &mut self,
        world: &mut BattleWorld,
        owner: PlayerId,
        role: ServiceRole,
        config: &LogisticsConfig,
        claims: &mut AHashSet<ServiceTarget>,
        events: &mut TacticalEventLog,
    ) {
        let fleet: Vec<usize> = world
            .units
            .iter()
            .enumerate()
            .filter(|(_, u)| u.owner == owner && u.is_alive())
            .filter(|(_, u)| u.service().map(|s| s.role == role).unwrap_or(false))
            .map(|(i, _)| i)
            .collect();
        if fleet.is_empty() {
            return;
        }

        let mut critical = RequestQueue::new();
        let mut low = RequestQueue::new();
        for request in collect_requests(world, owner, role, config) {
            if claims.contains(&request.target) {
                let escalate = request.urgency == Urgency::Critical
                    && release_for_escalation(world, &fleet, request.target);
                if !escalate {
                    continue;
                }
                claims.remove(&request.target);
            }
            let distance = fleet
                .iter()
                .map(|&i| world.units[i].cell.distance(&request.cell))
                .fold(f32::INFINITY, f32::min);
            match request.urgency {
                Urgency::Critical => critical.push(request, distance),
                Urgency::Low => low.push(request, distance),
            }
        }

        while let Some(request) = critical.pop() {
            if assign(world, &fleet, request, true, config, events) {
                claims.insert(request.target);
            }
        }

        let now = world.now;
        let key = (owner, role);
        if low.is_empty() || !self.low_scan.ready(self.last_low_scan.get(&key).copied(), now) {
            return;
        }
        self.last_low_scan.insert(key, now);
        while let Some(request) = low.pop() {
            if assign(world, &fleet, request, false, config, events) {
                claims.insert(request.target);
            }
        }
    }

    fn move_vehicles<P: Pathfinder + ?Sized>(
        &mut self,
        world: &mut BattleWorld,
        nav: &mut Navigator<P>,
        owner: PlayerId,
        config: &LogisticsConfig,
    ) {
        let now = world.now;
        for i in 0..world.units.len() {
            let unit = &world.units[i];
            if unit.owner != owner || !available(unit) {
                continue;
            }
            let Some(task) = unit.service().and_then(|s| s.task) else {
                continue;
            };
            let Some(dest) = target_cell(world, task.target) else {
                continue;
            };
            if unit.cell.distance(&dest) <= config.service_range {
                world.units[i].halt();
                continue;
            }

            let mut vehicle = world.units[i].clone();
            let chasing = matches!(task.target, ServiceTarget::Unit(_));
            nav.move_to(world, &mut vehicle, dest, PathOptions::combat(), chasing, now);
            world.units[i] = vehicle;
        }
    }
}

/// Nearest fleet member passing `eligible`, by distance to `cell`
fn nearest(
    world: &BattleWorld,
    fleet: &[usize],
    cell: Cell,
    eligible: impl Fn(&Unit) -> bool,
) -> Option<usize> {
    fleet
        .iter()
        .copied()
        .filter(|&i| eligible(&world.units[i]))
        .min_by(|&a, &b| {
            let (ua, ub) = (&world.units[a], &world.units[b]);
            ua.cell
                .distance(&cell)
                .total_cmp(&ub.cell.distance(&cell))
                .then_with(|| ua.id.cmp(&ub.id))
        })
}

/// Free vehicle other than the recipient itself
fn free_vehicle(world: &BattleWorld, fleet: &[usize], target: ServiceTarget) -> bool {
    fleet.iter().any(|&i| {
        let u = &world.units[i];
        ServiceTarget::Unit(u.id) != target
            && available(u)
            && u.service().map(|s| s.is_free()).unwrap_or(false)
    })
}

/// Take a critical recipient back out of the queue it waits in
///
/// An active task for it is upgraded in place and kept. A queued entry is
/// released when it waits as non-critical, or when a vehicle is free now.
/// Returns true when the caller must place the request again.
fn release_for_escalation(world: &mut BattleWorld, fleet: &[usize], target: ServiceTarget) -> bool {
    let free_now = free_vehicle(world, fleet, target);
    for &i in fleet {
        let vehicle_id = world.units[i].id;
        let Some(service) = world.units[i].service_mut() else {
            continue;
        };
        if let Some(task) = service.task.as_mut().filter(|t| t.target == target) {
            task.critical = true;
            return false;
        }
        let Some(position) = service.queue.iter().position(|t| t.target == target) else {
            continue;
        };
        if service.queue[position].critical && !free_now {
            return false;
        }
        service.queue.remove(position);
        debug!(vehicle = vehicle_id.0, ?target, "Queued request escalated to critical");
        return true;
    }
    false
}

/// Queue index for a task: critical work ahead of non-critical
fn queue_position(queue: &VecDeque<ServiceTask>, critical: bool) -> usize {
    if critical {
        queue.iter().position(|t| !t.critical).unwrap_or(queue.len())
    } else {
        queue.len()
    }
}

/// Pair one request with a vehicle; returns whether it was placed
fn assign(
    world: &mut BattleWorld,
    fleet: &[usize],
    request: ServiceRequest,
    critical: bool,
    config: &LogisticsConfig,
    events: &mut TacticalEventLog,
) -> bool {
    let now = world.now;
    let task = ServiceTask {
        target: request.target,
        critical,
    };
    let not_self = |u: &Unit| ServiceTarget::Unit(u.id) != request.target;

    let free = nearest(world, fleet, request.cell, |u| {
        not_self(u) && available(u) && u.service().map(|s| s.is_free()).unwrap_or(false)
    });
    if let Some(i) = free {
        let vehicle = &mut world.units[i];
        if let Some(service) = vehicle.service_mut() {
            service.task = Some(task);
        }
        debug!(vehicle = vehicle.id.0, target = ?request.target, critical, "Service assigned");
        events.push(
            TacticalEventKind::ServiceAssigned {
                vehicle: vehicle.id,
                target: request.target,
                critical,
            },
            format!("{:?} vehicle {} assigned", request.role, vehicle.id.0),
            now,
        );
        return true;
    }

    if critical {
        let interruptible = nearest(world, fleet, request.cell, |u| {
            not_self(u)
                && available(u)
                && u.service()
                    .filter(|s| s.queue.len() < config.max_queue_len)
                    .and_then(|s| s.task)
                    .map(|t| !t.critical)
                    .unwrap_or(false)
        });
        if let Some(i) = interruptible {
            let vehicle = &mut world.units[i];
            if let Some(service) = vehicle.service_mut() {
                if let Some(previous) = service.task.replace(task) {
                    // Interrupted work resumes first among non-critical tasks
                    let position = queue_position(&service.queue, true);
                    service.queue.insert(position, previous);
                }
            }
            vehicle.halt();
            debug!(vehicle = vehicle.id.0, target = ?request.target, "Non-critical service interrupted");
            events.push(
                TacticalEventKind::ServiceInterrupted {
                    vehicle: vehicle.id,
                    target: request.target,
                },
                format!("{:?} vehicle {} diverted to a critical request", request.role, vehicle.id.0),
                now,
            );
            return true;
        }
    }

    let queue_slot = nearest(world, fleet, request.cell, |u| {
        not_self(u)
            && u.can_move()
            && u.service()
                .map(|s| s.queue.len() < config.max_queue_len)
                .unwrap_or(false)
    });
    let Some(i) = queue_slot else {
        debug!(target = ?request.target, role = ?request.role, "No vehicle can take request");
        return false;
    };
    let vehicle = &mut world.units[i];
    if let Some(service) = vehicle.service_mut() {
        let position = queue_position(&service.queue, critical);
        service.queue.insert(position, task);
    }
    debug!(vehicle = vehicle.id.0, target = ?request.target, critical, "Service queued");
    events.push(
        TacticalEventKind::ServiceQueued {
            vehicle: vehicle.id,
            target: request.target,
        },
        format!("{:?} request queued on vehicle {}", request.role, vehicle.id.0),
        now,
    );
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::path_cache::PathCache;
    use crate::battle::pathfinding::GridAStar;
    use crate::battle::terrain::TerrainMap;
    use crate::battle::throttle::DecisionThrottle;
    use crate::battle::unit_type::UnitType;
    use crate::battle::world::{PlayerRoster, Wreck};
    use crate::core::config::TacticalConfig;
    use crate::core::types::{UnitId, WreckId};

    struct Harness {
        config: TacticalConfig,
        throttle: DecisionThrottle,
        cache: PathCache,
        finder: GridAStar,
        dispatcher: LogisticsDispatcher,
        events: TacticalEventLog,
    }

    impl Harness {
        fn new() -> Self {
            let config = TacticalConfig::new();
            Self {
                throttle: DecisionThrottle::new(&config.throttle),
                dispatcher: LogisticsDispatcher::new(&config.logistics),
                cache: PathCache::new(2000),
                finder: GridAStar::new(),
                events: TacticalEventLog::new(),
                config,
            }
        }

        fn run(&mut self, world: &mut BattleWorld) {
            let mut nav = Navigator::new(&mut self.cache, &self.finder, &self.throttle);
            self.dispatcher
                .update(world, &mut nav, &self.config.logistics, PlayerId(0), &mut self.events);
        }
    }

    fn world() -> BattleWorld {
        BattleWorld::new(TerrainMap::new(30, 30), PlayerRoster::new(2, None))
    }

    fn empty_tank(id: u32, x: i32, y: i32) -> Unit {
        let mut unit = Unit::new(UnitId(id), PlayerId(0), UnitType::MediumTank, Cell::new(x, y));
        unit.fuel_mut().unwrap().current = 0.0;
        unit
    }

    fn tanker(id: u32, x: i32, y: i32) -> Unit {
        Unit::new(UnitId(id), PlayerId(0), UnitType::FuelTanker, Cell::new(x, y))
    }

    fn task_of(world: &BattleWorld, id: u32) -> Option<ServiceTask> {
        world.unit(UnitId(id)).and_then(|u| u.service()).and_then(|s| s.task)
    }

    fn queue_of(world: &BattleWorld, id: u32) -> Vec<ServiceTarget> {
        world
            .unit(UnitId(id))
            .and_then(|u| u.service())
            .map(|s| s.queue.iter().map(|t| t.target).collect())
            .unwrap_or_default()
    }

    #[test]
    fn test_nearest_free_vehicle_takes_critical_request() {
        let mut world = world();
        world.add_unit(tanker(10, 25, 25));
        world.add_unit(tanker(11, 6, 5));
        world.add_unit(empty_tank(1, 5, 10));

        let mut harness = Harness::new();
        harness.run(&mut world);

        assert_eq!(task_of(&world, 10), None);
        let task = task_of(&world, 11).unwrap();
        assert_eq!(task.target, ServiceTarget::Unit(UnitId(1)));
        assert!(task.critical);
        assert!(!world.unit(UnitId(11)).unwrap().path.is_empty());
    }

    #[test]
    fn test_critical_request_interrupts_low_task() {
        let mut world = world();
        let mut low = Unit::new(UnitId(1), PlayerId(0), UnitType::MediumTank, Cell::new(20, 20));
        low.fuel_mut().unwrap().current = 10.0;
        world.add_unit(low);
        world.add_unit(tanker(10, 10, 10));

        let mut harness = Harness::new();
        harness.run(&mut world);
        assert!(!task_of(&world, 10).unwrap().critical);

        world.add_unit(empty_tank(2, 8, 8));
        world.now = 100;
        harness.run(&mut world);

        let task = task_of(&world, 10).unwrap();
        assert_eq!(task.target, ServiceTarget::Unit(UnitId(2)));
        assert!(task.critical);
        assert_eq!(queue_of(&world, 10), vec![ServiceTarget::Unit(UnitId(1))]);
    }

    #[test]
    fn test_busy_fleet_queues_critical_request_once() {
        let mut world = world();
        world.add_unit(empty_tank(1, 20, 20));
        world.add_unit(empty_tank(2, 4, 4));
        world.add_unit(tanker(10, 10, 10));
        world.add_unit(tanker(11, 12, 12));
        world.add_unit(empty_tank(3, 11, 11));

        let mut harness = Harness::new();
        harness.run(&mut world);

        let active: Vec<ServiceTarget> = [10, 11]
            .iter()
            .filter_map(|id| task_of(&world, *id))
            .map(|t| t.target)
            .collect();
        let queued: Vec<ServiceTarget> = [10, 11].iter().flat_map(|id| queue_of(&world, *id)).collect();
        assert_eq!(active.len(), 2);
        assert_eq!(queued.len(), 1);
        assert!(!active.contains(&queued[0]));

        world.now = 100;
        harness.run(&mut world);
        let queued_again: Vec<ServiceTarget> =
            [10, 11].iter().flat_map(|id| queue_of(&world, *id)).collect();
        assert_eq!(queued_again, queued, "no duplicate queue entries");
    }

    #[test]
    fn test_low_requests_wait_for_scan_cooldown() {
        let mut world = world();
        let mut low = Unit::new(UnitId(1), PlayerId(0), UnitType::MediumTank, Cell::new(20, 20));
        low.fuel_mut().unwrap().current = 10.0;
        world.add_unit(low);
        world.add_unit(tanker(10, 10, 10));

        let mut harness = Harness::new();
        harness.run(&mut world);
        assert!(task_of(&world, 10).is_some());

        world.unit_mut(UnitId(10)).unwrap().service_mut().unwrap().task = None;
        world.now = 1000;
        harness.run(&mut world);
        assert!(task_of(&world, 10).is_none());

        world.now = 3000;
        harness.run(&mut world);
        assert!(task_of(&world, 10).is_some());
    }

    #[test]
    fn test_service_completes_in_range() {
        let mut world = world();
        world.add_unit(empty_tank(1, 5, 5));
        world.add_unit(tanker(10, 6, 5));

        let mut harness = Harness::new();
        harness.run(&mut world);
        assert!(task_of(&world, 10).is_some());

        world.now = 100;
        harness.run(&mut world);
        let fuel = world.unit(UnitId(1)).unwrap().fuel().unwrap();
        assert_eq!(fuel.current, fuel.capacity);
        assert_eq!(task_of(&world, 10), None);
        assert!(harness
            .events
            .events
            .iter()
            .any(|e| matches!(e.kind, TacticalEventKind::ServiceCompleted { .. })));
    }

    #[test]
    fn test_wreck_recovery_removes_wreck() {
        let mut world = world();
        world.add_unit(Unit::new(UnitId(10), PlayerId(0), UnitType::RecoveryTank, Cell::new(10, 10)));
        world.add_wreck(Wreck {
            id: WreckId(1),
            owner: PlayerId(0),
            cell: Cell::new(10, 11),
            unit_type: UnitType::LightTank,
        });

        let mut harness = Harness::new();
        harness.run(&mut world);
        assert_eq!(
            world.unit(UnitId(10)).unwrap().recovery_task(),
            Some(WreckId(1))
        );

        world.now = 100;
        harness.run(&mut world);
        assert!(world.wrecks.is_empty());
        assert!(harness
            .events
            .events
            .iter()
            .any(|e| matches!(e.kind, TacticalEventKind::WreckRecovered { .. })));
    }

    #[test]
    fn test_dead_recipient_frees_vehicle() {
        let mut world = world();
        world.add_unit(empty_tank(1, 20, 20));
        world.add_unit(tanker(10, 5, 5));

        let mut harness = Harness::new();
        harness.run(&mut world);
        world.unit_mut(UnitId(1)).unwrap().health = 0.0;
        world.now = 100;
        harness.run(&mut world);
        assert_eq!(task_of(&world, 10), None);
    }

    fn low_tank(id: u32, x: i32, y: i32) -> Unit {
        let mut unit = Unit::new(UnitId(id), PlayerId(0), UnitType::MediumTank, Cell::new(x, y));
        unit.fuel_mut().unwrap().current = 10.0;
        unit
    }

    fn give(world: &mut BattleWorld, vehicle: u32, task: u32, queue: &[u32]) {
        let service = world.unit_mut(UnitId(vehicle)).unwrap().service_mut().unwrap();
        service.task = Some(ServiceTask {
            target: ServiceTarget::Unit(UnitId(task)),
            critical: false,
        });
        service.queue = queue
            .iter()
            .map(|id| ServiceTask {
                target: ServiceTarget::Unit(UnitId(*id)),
                critical: false,
            })
            .collect();
    }

    #[test]
    fn test_queued_request_turning_critical_moves_to_free_vehicle() {
        let mut world = world();
        world.add_unit(tanker(10, 10, 10));
        world.add_unit(low_tank(1, 20, 20));
        world.add_unit(low_tank(2, 25, 25));

        let mut harness = Harness::new();
        harness.run(&mut world);
        assert_eq!(task_of(&world, 10).map(|t| t.target), Some(ServiceTarget::Unit(UnitId(1))));
        assert_eq!(queue_of(&world, 10), vec![ServiceTarget::Unit(UnitId(2))]);

        world.unit_mut(UnitId(2)).unwrap().fuel_mut().unwrap().current = 0.0;
        world.add_unit(tanker(11, 24, 25));
        world.now = 100;
        harness.run(&mut world);

        let task = task_of(&world, 11).unwrap();
        assert_eq!(task.target, ServiceTarget::Unit(UnitId(2)));
        assert!(task.critical);
        assert!(queue_of(&world, 10).is_empty());
        assert_eq!(task_of(&world, 10).map(|t| t.target), Some(ServiceTarget::Unit(UnitId(1))));
    }

    #[test]
    fn test_queued_request_turning_critical_interrupts_its_vehicle() {
        let mut world = world();
        world.add_unit(tanker(10, 10, 10));
        world.add_unit(low_tank(1, 20, 20));
        world.add_unit(low_tank(2, 22, 22));
        world.add_unit(low_tank(3, 26, 26));
        give(&mut world, 10, 1, &[2, 3]);

        world.unit_mut(UnitId(3)).unwrap().fuel_mut().unwrap().current = 0.0;
        let mut harness = Harness::new();
        harness.run(&mut world);

        let task = task_of(&world, 10).unwrap();
        assert_eq!(task.target, ServiceTarget::Unit(UnitId(3)));
        assert!(task.critical);
        assert_eq!(
            queue_of(&world, 10),
            vec![ServiceTarget::Unit(UnitId(1)), ServiceTarget::Unit(UnitId(2))]
        );
    }

    #[test]
    fn test_active_task_is_upgraded_in_place() {
        let mut world = world();
        world.add_unit(tanker(10, 10, 10));
        world.add_unit(low_tank(1, 20, 20));
        give(&mut world, 10, 1, &[]);

        world.unit_mut(UnitId(1)).unwrap().fuel_mut().unwrap().current = 0.0;
        let mut harness = Harness::new();
        harness.run(&mut world);

        let task = task_of(&world, 10).unwrap();
        assert_eq!(task.target, ServiceTarget::Unit(UnitId(1)));
        assert!(task.critical);
        assert!(queue_of(&world, 10).is_empty());
    }

    #[test]
    fn test_interrupt_skips_vehicle_with_full_queue() {
        let mut world = world();
        world.add_unit(tanker(10, 10, 10));
        world.add_unit(tanker(11, 28, 28));
        for id in 1..=5 {
            world.add_unit(low_tank(id, 20, 14 + id as i32));
        }
        world.add_unit(low_tank(7, 5, 25));
        give(&mut world, 10, 1, &[2, 3, 4, 5]);
        give(&mut world, 11, 7, &[]);
        world.add_unit(empty_tank(6, 11, 11));

        let mut harness = Harness::new();
        harness.run(&mut world);

        let full: Vec<ServiceTarget> = (2..=5).map(|id| ServiceTarget::Unit(UnitId(id))).collect();
        assert_eq!(queue_of(&world, 10), full);
        assert_eq!(task_of(&world, 10).map(|t| t.target), Some(ServiceTarget::Unit(UnitId(1))));

        let task = task_of(&world, 11).unwrap();
        assert_eq!(task.target, ServiceTarget::Unit(UnitId(6)));
        assert!(task.critical);
        assert_eq!(queue_of(&world, 11), vec![ServiceTarget::Unit(UnitId(7))]);
    }
}
