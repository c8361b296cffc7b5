//! Unit types and their default properties
//!
//! The taxonomy is closed: every unit the AI controls is one of these.

use serde::{Deserialize, Serialize};

use crate::core::types::GameTime;

/// Type of unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitType {
    // Combat
    LightTank,  // Fast, fragile
    MediumTank, // Standard line unit
    HeavyTank,  // Slow, tough
    RocketTank, // Long range, also hits aircraft
    Artillery,  // Very long range, blind spot up close

    // Economy
    Harvester, // Gathers resources, unarmed

    // Service
    FuelTanker,
    AmmoTruck,
    RecoveryTank, // Recovers wrecks
    Ambulance,    // Restores crew

    // Air
    Helicopter,
}

/// Which service a support vehicle provides
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ServiceRole {
    Fuel,
    Ammunition,
    Recovery,
    Medical,
}

impl ServiceRole {
    pub fn all() -> [ServiceRole; 4] {
        [
            ServiceRole::Fuel,
            ServiceRole::Ammunition,
            ServiceRole::Recovery,
            ServiceRole::Medical,
        ]
    }
}

/// Broad category deciding which payload a unit carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnitCategory {
    Combat,
    Harvester,
    Service(ServiceRole),
    Aerial,
}

/// Weapon statistics (distances in cells)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Weapon {
    pub range: f32,
    /// Blind spot: targets closer than this cannot be hit
    pub min_range: f32,
    pub damage: f32,
    pub cooldown_ms: GameTime,
    pub hits_ground: bool,
    pub hits_air: bool,
}

impl Weapon {
    /// Expected damage per second
    pub fn dps(&self) -> f32 {
        if self.cooldown_ms == 0 {
            return 0.0;
        }
        self.damage / (self.cooldown_ms as f32 / 1000.0)
    }

    /// Is a target at `distance` inside the firing band?
    pub fn in_range(&self, distance: f32) -> bool {
        distance >= self.min_range && distance <= self.range
    }
}

/// Default properties for a unit type
#[derive(Debug, Clone)]
pub struct UnitProperties {
    pub category: UnitCategory,
    pub max_health: f32,
    pub speed: f32, // Cells per second
    pub weapon: Option<Weapon>,
    pub fuel_capacity: f32,
    pub ammo_capacity: u32,
}

impl UnitType {
    /// Get default properties for this unit type
    pub fn default_properties(&self) -> UnitProperties {
        match self {
            UnitType::LightTank => UnitProperties {
                category: UnitCategory::Combat,
                max_health: 300.0,
                speed: 3.0,
                weapon: Some(Weapon {
                    range: 5.0,
                    min_range: 0.0,
                    damage: 15.0,
                    cooldown_ms: 800,
                    hits_ground: true,
                    hits_air: false,
                }),
                fuel_capacity: 100.0,
                ammo_capacity: 40,
            },

            UnitType::MediumTank => UnitProperties {
                category: UnitCategory::Combat,
                max_health: 500.0,
                speed: 2.2,
                weapon: Some(Weapon {
                    range: 6.0,
                    min_range: 0.0,
                    damage: 30.0,
                    cooldown_ms: 1200,
                    hits_ground: true,
                    hits_air: false,
                }),
                fuel_capacity: 120.0,
                ammo_capacity: 30,
            },

            UnitType::HeavyTank => UnitProperties {
                category: UnitCategory::Combat,
                max_health: 900.0,
                speed: 1.5,
                weapon: Some(Weapon {
                    range: 6.5,
                    min_range: 0.0,
                    damage: 55.0,
                    cooldown_ms: 1800,
                    hits_ground: true,
                    hits_air: false,
                }),
                fuel_capacity: 150.0,
                ammo_capacity: 24,
            },

            UnitType::RocketTank => UnitProperties {
                category: UnitCategory::Combat,
                max_health: 350.0,
                speed: 2.0,
                weapon: Some(Weapon {
                    range: 8.0,
                    min_range: 1.0,
                    damage: 40.0,
                    cooldown_ms: 2000,
                    hits_ground: true,
                    hits_air: true,
                }),
                fuel_capacity: 110.0,
                ammo_capacity: 16,
            },

            UnitType::Artillery => UnitProperties {
                category: UnitCategory::Combat,
                max_health: 280.0,
                speed: 1.4,
                weapon: Some(Weapon {
                    range: 12.0,
                    min_range: 3.0,
                    damage: 80.0,
                    cooldown_ms: 3500,
                    hits_ground: true,
                    hits_air: false,
                }),
                fuel_capacity: 100.0,
                ammo_capacity: 12,
            },

            UnitType::Harvester => UnitProperties {
                category: UnitCategory::Harvester,
                max_health: 700.0,
                speed: 1.6,
                weapon: None,
                fuel_capacity: 200.0,
                ammo_capacity: 0,
            },

            UnitType::FuelTanker => service(ServiceRole::Fuel, 350.0),
            UnitType::AmmoTruck => service(ServiceRole::Ammunition, 300.0),
            UnitType::RecoveryTank => service(ServiceRole::Recovery, 800.0),
            UnitType::Ambulance => service(ServiceRole::Medical, 250.0),

            UnitType::Helicopter => UnitProperties {
                category: UnitCategory::Aerial,
                max_health: 400.0,
                speed: 4.5,
                weapon: Some(Weapon {
                    range: 6.0,
                    min_range: 0.0,
                    damage: 35.0,
                    cooldown_ms: 1000,
                    hits_ground: true,
                    hits_air: false,
                }),
                fuel_capacity: 80.0,
                ammo_capacity: 20,
            },
        }
    }

    pub fn category(&self) -> UnitCategory {
        self.default_properties().category
    }

    pub fn is_harvester(&self) -> bool {
        matches!(self, UnitType::Harvester)
    }

    pub fn is_aerial(&self) -> bool {
        matches!(self, UnitType::Helicopter)
    }

    /// Armed ground units that take part in general combat
    pub fn is_combat(&self) -> bool {
        matches!(self.category(), UnitCategory::Combat)
    }

    pub fn service_role(&self) -> Option<ServiceRole> {
        match self.category() {
            UnitCategory::Service(role) => Some(role),
            _ => None,
        }
    }
}

fn service(role: ServiceRole, max_health: f32) -> UnitProperties {
    UnitProperties {
        category: UnitCategory::Service(role),
        max_health,
        speed: 2.0,
        weapon: None,
        fuel_capacity: 150.0,
        ammo_capacity: 0,
    }
}
