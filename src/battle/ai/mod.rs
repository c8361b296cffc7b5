//! Enemy AI system for unit decision-making
//!
//! Architecture: Trait + Data hybrid
//! - BattleAI trait defines interface for swappable implementations
//! - TacticalConfig holds TOML-loaded thresholds
//! - DecisionContext provides the player's view of the battle

pub mod aerial;
pub mod base_defense;
pub mod commander;
pub mod decision_context;
pub mod hunter;
pub mod retreat;
pub mod targeting;

pub use commander::AiCommander;
pub use decision_context::DecisionContext;
pub use targeting::{TargetChoice, TargetReason};

use crate::battle::navigation::Navigator;
use crate::battle::pathfinding::Pathfinder;
use crate::battle::units::Unit;

/// Trait for battle AI implementations
pub trait BattleAI {
    /// Re-evaluate one unit if the throttle allows it; returns whether a
    /// decision was made
    fn decide_unit<P: Pathfinder + ?Sized>(
        &mut self,
        ctx: &DecisionContext,
        nav: &mut Navigator<P>,
        unit: &mut Unit,
    ) -> bool;

    /// Drop any bookkeeping held for a unit that left the battle
    fn forget_unit(&mut self, unit: &Unit);
}
