//! Unit records: a common core plus a kind-specific payload
//!
//! Combat units carry weapons and supplies, harvesters carry gathering state,
//! service vehicles carry their current task and pending queue.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::battle::unit_type::{ServiceRole, UnitCategory, UnitType, Weapon};
use crate::core::types::{
    Cell, FormationGroupId, GameTime, PlayerId, StructureId, UnitId, Vec2, WreckId,
};

/// Something a unit can shoot at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetRef {
    Unit(UnitId),
    Structure(StructureId),
}

/// Behavior selected by the decision state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DecisionState {
    #[default]
    Idle,
    Retreating,
    EvacuatingToHospital,
    EvacuatingToWorkshop,
    DefendingBase,
    HuntingHarvesters,
    Attacking(TargetRef),
    Dodging,
    AerialEvading,
}

impl DecisionState {
    /// Any state that moves the unit away from combat
    pub fn is_withdrawing(&self) -> bool {
        matches!(
            self,
            DecisionState::Retreating
                | DecisionState::EvacuatingToHospital
                | DecisionState::EvacuatingToWorkshop
                | DecisionState::AerialEvading
        )
    }
}

/// Crew role that can be knocked out independently
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CrewRole {
    Mobility, // Driver
    Command,  // Commander
    Aiming,   // Gunner
    Firing,   // Loader
}

/// Four independently failable crew roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Crew {
    pub mobility: bool,
    pub command: bool,
    pub aiming: bool,
    pub firing: bool,
}

impl Default for Crew {
    fn default() -> Self {
        Self {
            mobility: true,
            command: true,
            aiming: true,
            firing: true,
        }
    }
}

impl Crew {
    /// A unit relocates unless both mobility and command are down
    pub fn can_move(&self) -> bool {
        self.mobility || self.command
    }

    /// Firing needs both the aiming and firing roles
    pub fn can_fire(&self) -> bool {
        self.aiming && self.firing
    }

    pub fn losses(&self) -> u32 {
        [self.mobility, self.command, self.aiming, self.firing]
            .iter()
            .filter(|ok| !**ok)
            .count() as u32
    }

    pub fn disable(&mut self, role: CrewRole) {
        match role {
            CrewRole::Mobility => self.mobility = false,
            CrewRole::Command => self.command = false,
            CrewRole::Aiming => self.aiming = false,
            CrewRole::Firing => self.firing = false,
        }
    }

    pub fn restore(&mut self) {
        *self = Crew::default();
    }
}

/// Consumable supply (fuel or ammunition)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Supply {
    pub current: f32,
    pub capacity: f32,
}

impl Supply {
    pub fn full(capacity: f32) -> Self {
        Self {
            current: capacity,
            capacity,
        }
    }

    /// Fill ratio; a zero-capacity supply is never in need
    pub fn ratio(&self) -> f32 {
        if self.capacity <= 0.0 {
            return 1.0;
        }
        (self.current / self.capacity).clamp(0.0, 1.0)
    }

    pub fn is_exhausted(&self) -> bool {
        self.capacity > 0.0 && self.current <= 0.0
    }

    pub fn refill(&mut self) {
        self.current = self.capacity;
    }
}

/// Role of an armed ground unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CombatRole {
    #[default]
    Line,
    HarvesterHunter,
}

/// Payload of armed units (ground and air)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombatPayload {
    pub weapon: Weapon,
    pub fuel: Supply,
    pub ammo: Supply,
    pub role: CombatRole,
}

/// Payload of harvesters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HarvesterPayload {
    /// Deposit currently being worked, if any
    pub gathering: Option<Cell>,
    pub fuel: Supply,
}

/// What a service vehicle is working on or waiting to work on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ServiceTarget {
    Unit(UnitId),
    Wreck(WreckId),
}

/// Active pairing of a service vehicle with one recipient
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceTask {
    pub target: ServiceTarget,
    pub critical: bool,
}

/// Payload of service vehicles
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServicePayload {
    pub role: ServiceRole,
    pub task: Option<ServiceTask>,
    pub queue: VecDeque<ServiceTask>,
    pub fuel: Supply,
}

impl ServicePayload {
    pub fn is_free(&self) -> bool {
        self.task.is_none()
    }

    /// Every target this vehicle is serving or holding in its queue
    pub fn claimed(&self) -> impl Iterator<Item = ServiceTarget> + '_ {
        self.task
            .iter()
            .map(|t| t.target)
            .chain(self.queue.iter().map(|t| t.target))
    }
}

/// Kind-specific payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum UnitKind {
    Combat(CombatPayload),
    Harvester(HarvesterPayload),
    Service(ServicePayload),
    Aerial(CombatPayload),
}

/// Role flags read by movement, combat and rendering collaborators
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitFlags {
    pub is_retreating: bool,
    pub being_attacked: bool,
    pub allowed_to_attack: bool,
    pub defending_base: bool,
    pub hunting_harvesters: bool,
    pub evading_air_defense: bool,
}

/// Timestamps used by the decision throttle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitTimers {
    pub last_decision: Option<GameTime>,
    pub last_retarget: Option<GameTime>,
    pub last_path_calc: Option<GameTime>,
    pub last_damaged: Option<GameTime>,
}

/// Membership in an active formation group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormationSlot {
    pub group: FormationGroupId,
    /// Offset in cells from the group's reference unit
    pub offset: (i32, i32),
}

/// A unit record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Unit {
    pub id: UnitId,
    pub owner: PlayerId,
    pub unit_type: UnitType,

    // Position
    pub cell: Cell,
    pub position: Vec2,

    // Condition
    pub health: f32,
    pub max_health: f32,
    pub crew: Crew,

    // Intent
    pub state: DecisionState,
    pub target: Option<TargetRef>,
    pub path: Vec<Cell>,
    pub move_target: Option<Cell>,

    pub flags: UnitFlags,
    pub timers: UnitTimers,
    pub last_attacker: Option<UnitId>,
    pub formation: Option<FormationSlot>,

    pub kind: UnitKind,
}

impl Unit {
    /// Create a unit at full health with the type's default payload
    pub fn new(id: UnitId, owner: PlayerId, unit_type: UnitType, cell: Cell) -> Self {
        let props = unit_type.default_properties();
        let fuel = Supply::full(props.fuel_capacity);
        let kind = match (props.category, props.weapon) {
            (UnitCategory::Combat, Some(weapon)) => UnitKind::Combat(CombatPayload {
                weapon,
                fuel,
                ammo: Supply::full(props.ammo_capacity as f32),
                role: CombatRole::Line,
            }),
            (UnitCategory::Aerial, Some(weapon)) => UnitKind::Aerial(CombatPayload {
                weapon,
                fuel,
                ammo: Supply::full(props.ammo_capacity as f32),
                role: CombatRole::Line,
            }),
            (UnitCategory::Service(role), _) => UnitKind::Service(ServicePayload {
                role,
                task: None,
                queue: VecDeque::new(),
                fuel,
            }),
            _ => UnitKind::Harvester(HarvesterPayload {
                gathering: None,
                fuel,
            }),
        };

        Self {
            id,
            owner,
            unit_type,
            cell,
            position: cell.center(),
            health: props.max_health,
            max_health: props.max_health,
            crew: Crew::default(),
            state: DecisionState::Idle,
            target: None,
            path: Vec::new(),
            move_target: None,
            flags: UnitFlags::default(),
            timers: UnitTimers::default(),
            last_attacker: None,
            formation: None,
            kind,
        }
    }

    /// Same unit with the harvester-hunter role
    pub fn as_hunter(mut self) -> Self {
        if let UnitKind::Combat(payload) = &mut self.kind {
            payload.role = CombatRole::HarvesterHunter;
        }
        self
    }

    pub fn is_alive(&self) -> bool {
        self.health > 0.0
    }

    pub fn health_ratio(&self) -> f32 {
        if self.max_health <= 0.0 {
            return 0.0;
        }
        (self.health / self.max_health).clamp(0.0, 1.0)
    }

    /// Can this unit relocate at all?
    pub fn can_move(&self) -> bool {
        self.crew.can_move()
    }

    pub fn is_aerial(&self) -> bool {
        matches!(self.kind, UnitKind::Aerial(_))
    }

    pub fn is_harvester(&self) -> bool {
        matches!(self.kind, UnitKind::Harvester(_))
    }

    /// Armed ground unit
    pub fn is_combat(&self) -> bool {
        matches!(self.kind, UnitKind::Combat(_))
    }

    pub fn combat(&self) -> Option<&CombatPayload> {
        match &self.kind {
            UnitKind::Combat(p) | UnitKind::Aerial(p) => Some(p),
            _ => None,
        }
    }

    pub fn combat_mut(&mut self) -> Option<&mut CombatPayload> {
        match &mut self.kind {
            UnitKind::Combat(p) | UnitKind::Aerial(p) => Some(p),
            _ => None,
        }
    }

    pub fn weapon(&self) -> Option<&Weapon> {
        self.combat().map(|p| &p.weapon)
    }

    pub fn weapon_range(&self) -> f32 {
        self.weapon().map(|w| w.range).unwrap_or(0.0)
    }

    pub fn dps(&self) -> f32 {
        self.weapon().map(|w| w.dps()).unwrap_or(0.0)
    }

    pub fn is_hunter(&self) -> bool {
        matches!(&self.kind, UnitKind::Combat(p) if p.role == CombatRole::HarvesterHunter)
    }

    pub fn has_ammo(&self) -> bool {
        self.combat().map(|p| !p.ammo.is_exhausted()).unwrap_or(false)
    }

    pub fn fuel(&self) -> Option<&Supply> {
        match &self.kind {
            UnitKind::Combat(p) | UnitKind::Aerial(p) => Some(&p.fuel),
            UnitKind::Harvester(p) => Some(&p.fuel),
            UnitKind::Service(p) => Some(&p.fuel),
        }
    }

    pub fn fuel_mut(&mut self) -> Option<&mut Supply> {
        match &mut self.kind {
            UnitKind::Combat(p) | UnitKind::Aerial(p) => Some(&mut p.fuel),
            UnitKind::Harvester(p) => Some(&mut p.fuel),
            UnitKind::Service(p) => Some(&mut p.fuel),
        }
    }

    pub fn ammo(&self) -> Option<&Supply> {
        self.combat().map(|p| &p.ammo)
    }

    pub fn ammo_mut(&mut self) -> Option<&mut Supply> {
        self.combat_mut().map(|p| &mut p.ammo)
    }

    pub fn service(&self) -> Option<&ServicePayload> {
        match &self.kind {
            UnitKind::Service(p) => Some(p),
            _ => None,
        }
    }

    pub fn service_mut(&mut self) -> Option<&mut ServicePayload> {
        match &mut self.kind {
            UnitKind::Service(p) => Some(p),
            _ => None,
        }
    }

    fn service_unit_target(&self, role: ServiceRole) -> Option<UnitId> {
        let payload = self.service().filter(|p| p.role == role)?;
        match payload.task?.target {
            ServiceTarget::Unit(id) => Some(id),
            ServiceTarget::Wreck(_) => None,
        }
    }

    /// Unit an ambulance is currently treating
    pub fn healing_target(&self) -> Option<UnitId> {
        self.service_unit_target(ServiceRole::Medical)
    }

    /// Unit a fuel tanker is currently refuelling
    pub fn refuel_target(&self) -> Option<UnitId> {
        self.service_unit_target(ServiceRole::Fuel)
    }

    /// Unit an ammo truck is currently rearming
    pub fn ammo_resupply_target(&self) -> Option<UnitId> {
        self.service_unit_target(ServiceRole::Ammunition)
    }

    /// Wreck a recovery tank is currently heading for
    pub fn recovery_task(&self) -> Option<WreckId> {
        let payload = self.service().filter(|p| p.role == ServiceRole::Recovery)?;
        match payload.task?.target {
            ServiceTarget::Wreck(id) => Some(id),
            ServiceTarget::Unit(_) => None,
        }
    }

    /// Harvester is actively working a deposit
    pub fn is_gathering(&self) -> bool {
        matches!(&self.kind, UnitKind::Harvester(p) if p.gathering.is_some())
    }

    /// Was this unit hit within `window` ms of `now`?
    pub fn damaged_within(&self, now: GameTime, window: GameTime) -> bool {
        self.timers
            .last_damaged
            .map(|t| now.saturating_sub(t) <= window)
            .unwrap_or(false)
    }

    /// Record a hit; called by the combat collaborator
    pub fn record_damage(&mut self, amount: f32, attacker: Option<UnitId>, now: GameTime) {
        self.health = (self.health - amount).max(0.0);
        self.timers.last_damaged = Some(now);
        self.flags.being_attacked = true;
        if attacker.is_some() {
            self.last_attacker = attacker;
        }
    }

    /// Drop path and movement intent
    pub fn halt(&mut self) {
        self.path.clear();
        self.move_target = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_unit_payloads() {
        let tank = Unit::new(UnitId(1), PlayerId(0), UnitType::MediumTank, Cell::new(1, 1));
        assert!(tank.is_combat());
        assert!(tank.has_ammo());
        assert_eq!(tank.health_ratio(), 1.0);

        let harvester = Unit::new(UnitId(2), PlayerId(0), UnitType::Harvester, Cell::new(1, 1));
        assert!(harvester.is_harvester());
        assert!(harvester.weapon().is_none());

        let tanker = Unit::new(UnitId(3), PlayerId(0), UnitType::FuelTanker, Cell::new(1, 1));
        assert_eq!(tanker.service().map(|s| s.role), Some(ServiceRole::Fuel));

        let heli = Unit::new(UnitId(4), PlayerId(0), UnitType::Helicopter, Cell::new(1, 1));
        assert!(heli.is_aerial());
        assert!(!heli.is_combat());
    }

    #[test]
    fn test_crew_mobility_rules() {
        let mut crew = Crew::default();
        crew.disable(CrewRole::Mobility);
        assert!(crew.can_move(), "commander alone can still drive");
        crew.disable(CrewRole::Command);
        assert!(!crew.can_move());
        assert!(crew.can_fire());
        crew.disable(CrewRole::Firing);
        assert!(!crew.can_fire());
        assert_eq!(crew.losses(), 3);
        crew.restore();
        assert_eq!(crew.losses(), 0);
    }

    #[test]
    fn test_supply_ratio() {
        let mut supply = Supply::full(100.0);
        supply.current = 25.0;
        assert!((supply.ratio() - 0.25).abs() < 0.001);
        supply.current = 0.0;
        assert!(supply.is_exhausted());
        supply.refill();
        assert_eq!(supply.ratio(), 1.0);

        let none = Supply::full(0.0);
        assert!(!none.is_exhausted());
        assert_eq!(none.ratio(), 1.0);
    }

    #[test]
    fn test_record_damage() {
        let mut tank = Unit::new(UnitId(1), PlayerId(0), UnitType::LightTank, Cell::new(0, 0));
        tank.record_damage(100.0, Some(UnitId(9)), 1_000);
        assert_eq!(tank.health, 200.0);
        assert_eq!(tank.last_attacker, Some(UnitId(9)));
        assert!(tank.damaged_within(1_200, 250));
        assert!(!tank.damaged_within(2_000, 250));
    }

    #[test]
    fn test_hunter_role() {
        let hunter = Unit::new(UnitId(1), PlayerId(0), UnitType::LightTank, Cell::new(0, 0)).as_hunter();
        assert!(hunter.is_hunter());
    }

    #[test]
    fn test_service_accessors() {
        let mut ambulance = Unit::new(UnitId(5), PlayerId(0), UnitType::Ambulance, Cell::new(0, 0));
        assert_eq!(ambulance.healing_target(), None);
        if let Some(service) = ambulance.service_mut() {
            service.task = Some(ServiceTask {
                target: ServiceTarget::Unit(UnitId(8)),
                critical: true,
            });
        }
        assert_eq!(ambulance.healing_target(), Some(UnitId(8)));
        assert_eq!(ambulance.refuel_target(), None);

        let mut truck = Unit::new(UnitId(6), PlayerId(0), UnitType::AmmoTruck, Cell::new(0, 0));
        if let Some(service) = truck.service_mut() {
            service.task = Some(ServiceTask {
                target: ServiceTarget::Unit(UnitId(9)),
                critical: false,
            });
        }
        assert_eq!(truck.ammo_resupply_target(), Some(UnitId(9)));
        assert_eq!(truck.healing_target(), None);
    }
}
