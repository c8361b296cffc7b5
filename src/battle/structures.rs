//! Structures: buildings, defenses and support facilities

use serde::{Deserialize, Serialize};

use crate::core::types::{Cell, GameTime, PlayerId, StructureId, Vec2};

/// Type of structure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StructureKind {
    // Economy and production
    ConstructionYard, // Primary base structure
    VehicleFactory,
    Refinery,
    PowerPlant,
    Radar,

    // Defenses
    GunTurret,       // Works without power
    RocketTurret,    // Hits ground and air
    ArtilleryTurret, // Long range with a blind spot
    AntiAirSite,     // Air only

    // Support
    Workshop, // Repairs vehicles
    Hospital, // Restores crews
}

impl StructureKind {
    /// Targeting importance, lower is more important. None for structures
    /// that are never picked as a priority target.
    pub fn priority_rank(&self) -> Option<u8> {
        match self {
            StructureKind::ConstructionYard => Some(0),
            StructureKind::VehicleFactory => Some(1),
            StructureKind::Refinery => Some(2),
            StructureKind::PowerPlant => Some(3),
            StructureKind::Radar => Some(4),
            _ => None,
        }
    }

    /// Does this structure stop working without power?
    pub fn requires_power(&self) -> bool {
        matches!(
            self,
            StructureKind::RocketTurret
                | StructureKind::ArtilleryTurret
                | StructureKind::AntiAirSite
                | StructureKind::Radar
        )
    }

    pub fn is_defense(&self) -> bool {
        matches!(
            self,
            StructureKind::GunTurret
                | StructureKind::RocketTurret
                | StructureKind::ArtilleryTurret
                | StructureKind::AntiAirSite
        )
    }

    /// Footprint (width, height) in cells
    pub fn footprint(&self) -> (u32, u32) {
        match self {
            StructureKind::ConstructionYard => (3, 3),
            StructureKind::VehicleFactory | StructureKind::Refinery => (3, 2),
            StructureKind::PowerPlant | StructureKind::Workshop | StructureKind::Hospital => (2, 2),
            StructureKind::Radar => (2, 2),
            _ => (1, 1),
        }
    }

    pub fn max_health(&self) -> f32 {
        match self {
            StructureKind::ConstructionYard => 3000.0,
            StructureKind::VehicleFactory => 2000.0,
            StructureKind::Refinery => 1800.0,
            StructureKind::PowerPlant => 1200.0,
            StructureKind::Radar => 1000.0,
            StructureKind::Workshop | StructureKind::Hospital => 1200.0,
            StructureKind::GunTurret => 800.0,
            StructureKind::RocketTurret => 700.0,
            StructureKind::ArtilleryTurret => 900.0,
            StructureKind::AntiAirSite => 600.0,
        }
    }

    /// Default weapon of defensive structures
    pub fn default_defense(&self) -> Option<DefenseStats> {
        let stats = match self {
            StructureKind::GunTurret => DefenseStats {
                range: 6.0,
                min_range: 0.0,
                damage: 25.0,
                cooldown_ms: 1000,
                burst_count: 1,
                hits_ground: true,
                hits_air: false,
            },
            StructureKind::RocketTurret => DefenseStats {
                range: 8.0,
                min_range: 1.0,
                damage: 30.0,
                cooldown_ms: 2000,
                burst_count: 2,
                hits_ground: true,
                hits_air: true,
            },
            StructureKind::ArtilleryTurret => DefenseStats {
                range: 14.0,
                min_range: 4.0,
                damage: 90.0,
                cooldown_ms: 4000,
                burst_count: 1,
                hits_ground: true,
                hits_air: false,
            },
            StructureKind::AntiAirSite => DefenseStats {
                range: 10.0,
                min_range: 0.0,
                damage: 20.0,
                cooldown_ms: 500,
                burst_count: 3,
                hits_ground: false,
                hits_air: true,
            },
            _ => return None,
        };
        Some(stats)
    }
}

/// Weapon of a defensive structure (distances in cells)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DefenseStats {
    pub range: f32,
    /// Blind spot radius
    pub min_range: f32,
    pub damage: f32,
    pub cooldown_ms: GameTime,
    /// Shots per volley; 1 when the weapon does not burst
    pub burst_count: u32,
    pub hits_ground: bool,
    pub hits_air: bool,
}

impl DefenseStats {
    /// Simple single-shot ground defense
    pub fn new(range: f32, damage: f32, cooldown_ms: GameTime) -> Self {
        Self {
            range,
            min_range: 0.0,
            damage,
            cooldown_ms,
            burst_count: 1,
            hits_ground: true,
            hits_air: false,
        }
    }

    /// damage × burst / cooldown in seconds; zero for incomplete stats
    pub fn dps(&self) -> f32 {
        if self.range <= 0.0 || self.damage <= 0.0 || self.cooldown_ms == 0 {
            return 0.0;
        }
        self.damage * self.burst_count.max(1) as f32 / (self.cooldown_ms as f32 / 1000.0)
    }

    pub fn covers(&self, distance: f32) -> bool {
        distance >= self.min_range && distance <= self.range
    }
}

/// A placed structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Structure {
    pub id: StructureId,
    pub owner: PlayerId,
    pub kind: StructureKind,
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
    pub health: f32,
    pub max_health: f32,
    pub powered: bool,
    pub defense: Option<DefenseStats>,
}

impl Structure {
    /// Create a powered structure at full health with the kind's defaults
    pub fn new(id: StructureId, owner: PlayerId, kind: StructureKind, x: i32, y: i32) -> Self {
        let (width, height) = kind.footprint();
        let max_health = kind.max_health();
        Self {
            id,
            owner,
            kind,
            x,
            y,
            width,
            height,
            health: max_health,
            max_health,
            powered: true,
            defense: kind.default_defense(),
        }
    }

    /// Replace the default weapon
    pub fn with_defense(mut self, defense: DefenseStats) -> Self {
        self.defense = Some(defense);
        self
    }

    pub fn with_power(mut self, powered: bool) -> Self {
        self.powered = powered;
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

    /// Geometric center in cell units
    pub fn center(&self) -> Vec2 {
        Vec2::new(
            self.x as f32 + self.width as f32 / 2.0,
            self.y as f32 + self.height as f32 / 2.0,
        )
    }

    /// Cell containing the center
    pub fn center_cell(&self) -> Cell {
        self.center().cell()
    }

    /// Distance from the structure center to a cell center
    pub fn distance_to(&self, cell: Cell) -> f32 {
        self.center().distance(&cell.center())
    }

    pub fn contains(&self, cell: Cell) -> bool {
        cell.x >= self.x
            && cell.y >= self.y
            && cell.x < self.x + self.width as i32
            && cell.y < self.y + self.height as i32
    }

    /// Cells bordering the footprint (8-connected)
    pub fn adjacent_cells(&self) -> Vec<Cell> {
        let mut cells = Vec::new();
        let (x0, y0) = (self.x - 1, self.y - 1);
        let (x1, y1) = (self.x + self.width as i32, self.y + self.height as i32);
        for x in x0..=x1 {
            cells.push(Cell::new(x, y0));
            cells.push(Cell::new(x, y1));
        }
        for y in (y0 + 1)..y1 {
            cells.push(Cell::new(x0, y));
            cells.push(Cell::new(x1, y));
        }
        cells
    }

    /// Weapon that is currently able to fire: alive, powered if required,
    /// positive range, damage and cooldown
    pub fn active_defense(&self) -> Option<&DefenseStats> {
        if !self.is_alive() {
            return None;
        }
        if self.kind.requires_power() && !self.powered {
            return None;
        }
        self.defense.as_ref().filter(|d| d.dps() > 0.0)
    }

    /// Can this structure currently shoot at a ground target `distance` away?
    pub fn threatens_ground(&self, distance: f32) -> bool {
        self.active_defense()
            .map(|d| d.hits_ground && d.covers(distance))
            .unwrap_or(false)
    }

    /// Can this structure currently shoot at an aircraft `distance` away?
    pub fn threatens_air(&self, distance: f32) -> bool {
        self.active_defense()
            .map(|d| d.hits_air && d.covers(distance))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_order() {
        let ranks: Vec<_> = [
            StructureKind::ConstructionYard,
            StructureKind::VehicleFactory,
            StructureKind::Refinery,
            StructureKind::PowerPlant,
            StructureKind::Radar,
        ]
        .iter()
        .map(|k| k.priority_rank().unwrap())
        .collect();
        assert!(ranks.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(StructureKind::GunTurret.priority_rank(), None);
    }

    #[test]
    fn test_burst_dps() {
        let mut stats = DefenseStats::new(5.0, 10.0, 1000);
        assert_eq!(stats.dps(), 10.0);
        stats.burst_count = 3;
        assert_eq!(stats.dps(), 30.0);
        stats.cooldown_ms = 0;
        assert_eq!(stats.dps(), 0.0);
    }

    #[test]
    fn test_unpowered_defense_inactive() {
        let turret = Structure::new(StructureId(1), PlayerId(0), StructureKind::RocketTurret, 0, 0)
            .with_power(false);
        assert!(turret.active_defense().is_none());

        let gun = Structure::new(StructureId(2), PlayerId(0), StructureKind::GunTurret, 0, 0)
            .with_power(false);
        assert!(gun.active_defense().is_some());
    }

    #[test]
    fn test_destroyed_defense_inactive() {
        let mut gun = Structure::new(StructureId(1), PlayerId(0), StructureKind::GunTurret, 0, 0);
        gun.health = 0.0;
        assert!(gun.active_defense().is_none());
    }

    #[test]
    fn test_center_and_contains() {
        let yard = Structure::new(StructureId(1), PlayerId(0), StructureKind::ConstructionYard, 4, 4);
        assert_eq!(yard.center(), Vec2::new(5.5, 5.5));
        assert_eq!(yard.center_cell(), Cell::new(5, 5));
        assert!(yard.contains(Cell::new(6, 6)));
        assert!(!yard.contains(Cell::new(7, 6)));
        assert_eq!(yard.adjacent_cells().len(), 16);
        assert!(yard.adjacent_cells().iter().all(|c| !yard.contains(*c)));
    }

    #[test]
    fn test_threat_layers() {
        let aa = Structure::new(StructureId(1), PlayerId(0), StructureKind::AntiAirSite, 0, 0);
        assert!(aa.threatens_air(5.0));
        assert!(!aa.threatens_ground(5.0));
    }
}
