//! Attack coordination: engagement gate, siege placement and formations

pub mod engagement;
pub mod formation;
pub mod siege;

pub use engagement::{engage_reason, required_group_size, should_engage, EngageReason};
pub use formation::{FormationGroup, FormationRegistry, GroupMember};
pub use siege::{defensive_strength, global_attack_point, CompassDirection, SiegePlanner, SiegePosition};
