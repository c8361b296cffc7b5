//! Battle system - tactical AI for a grid-based real-time skirmish
//!
//! The core never moves units or fires weapons itself. It reads a world
//! snapshot and writes intent back onto units: state, target, path, flags.
//!
//! Each tick:
//! - Danger fields are recomputed when structures change
//! - Throttled units re-evaluate their decision state
//! - Service vehicles are paired with units that need them

pub mod ai;
pub mod attack;
pub mod danger;
pub mod execution;
pub mod logistics;
pub mod navigation;
pub mod occupancy;
pub mod path_cache;
pub mod pathfinding;
pub mod structures;
pub mod terrain;
pub mod throttle;
pub mod unit_type;
pub mod units;
pub mod world;

// Re-exports for convenient access
pub use ai::{AiCommander, BattleAI, DecisionContext};
pub use danger::{DangerField, DangerFields, DangerLayer};
pub use execution::{TacticalCore, TacticalEvent, TacticalEventKind, TacticalEventLog};
pub use logistics::LogisticsDispatcher;
pub use navigation::Navigator;
pub use occupancy::OccupancyMap;
pub use path_cache::{PathCache, PathCacheStats, PathKey};
pub use pathfinding::{path_cost, GridAStar, PathOptions, Pathfinder};
pub use structures::{DefenseStats, Structure, StructureKind};
pub use terrain::{TerrainClass, TerrainMap};
pub use throttle::{Cooldown, DecisionThrottle};
pub use unit_type::{ServiceRole, UnitCategory, UnitProperties, UnitType, Weapon};
pub use units::{
    CombatRole, Crew, CrewRole, DecisionState, ServiceTarget, ServiceTask, Supply, TargetRef, Unit,
    UnitFlags, UnitKind,
};
pub use world::{BattleWorld, IncomingFire, PlayerRoster, Wreck};
