//! Decision throttling shared by every tactical component
//!
//! A unit may re-decide once per decision interval, or immediately after
//! taking fresh damage. Target switches and path recalculation have their own
//! intervals. Only damage newer than the last decision opens the immediate
//! window, so asking twice in the same instant never yields two decisions.

use crate::battle::units::Unit;
use crate::core::config::ThrottleConfig;
use crate::core::types::GameTime;

/// Last-fired time plus interval
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cooldown {
    pub interval: GameTime,
}

impl Cooldown {
    pub fn new(interval: GameTime) -> Self {
        Self { interval }
    }

    /// Never fired, or the interval has fully elapsed
    pub fn ready(&self, last: Option<GameTime>, now: GameTime) -> bool {
        match last {
            None => true,
            Some(t) => now.saturating_sub(t) >= self.interval,
        }
    }

    /// `ready`, or forced by an override predicate
    pub fn ready_or(&self, last: Option<GameTime>, now: GameTime, force: bool) -> bool {
        force || self.ready(last, now)
    }
}

/// Per-unit timing policy built from the throttle configuration
#[derive(Debug, Clone)]
pub struct DecisionThrottle {
    decision: Cooldown,
    retarget: Cooldown,
    movement_path: Cooldown,
    attack_path: Cooldown,
    immediate_window: GameTime,
    recent_damage_window: GameTime,
}

impl DecisionThrottle {
    pub fn new(config: &ThrottleConfig) -> Self {
        Self {
            decision: Cooldown::new(config.decision_interval_ms),
            retarget: Cooldown::new(config.retarget_cooldown_ms),
            movement_path: Cooldown::new(config.path_recalc_interval_ms),
            attack_path: Cooldown::new(config.attack_path_interval_ms),
            immediate_window: config.immediate_response_window_ms,
            recent_damage_window: config.recent_damage_window_ms,
        }
    }

    /// Hit within the immediate window and not yet reacted to
    ///
    /// The override applies once per hit: a decision taken after the hit
    /// consumes it until the unit is struck again.
    pub fn has_fresh_damage(&self, unit: &Unit, now: GameTime) -> bool {
        let Some(hit) = unit.timers.last_damaged else {
            return false;
        };
        if now.saturating_sub(hit) > self.immediate_window {
            return false;
        }
        match unit.timers.last_decision {
            None => true,
            Some(decided) => hit > decided,
        }
    }

    /// Hit within the longer "recently damaged" window
    pub fn recently_damaged(&self, unit: &Unit, now: GameTime) -> bool {
        unit.damaged_within(now, self.recent_damage_window)
    }

    pub fn can_decide(&self, unit: &Unit, now: GameTime) -> bool {
        self.decision
            .ready_or(unit.timers.last_decision, now, self.has_fresh_damage(unit, now))
    }

    pub fn mark_decided(&self, unit: &mut Unit, now: GameTime) {
        unit.timers.last_decision = Some(now);
    }

    /// May the unit switch to a different target?
    pub fn can_retarget(&self, unit: &Unit, now: GameTime) -> bool {
        unit.target.is_none()
            || self
                .retarget
                .ready_or(unit.timers.last_retarget, now, self.has_fresh_damage(unit, now))
    }

    pub fn mark_retargeted(&self, unit: &mut Unit, now: GameTime) {
        unit.timers.last_retarget = Some(now);
    }

    /// Is a path recalculation due? Chasing uses the shorter interval.
    pub fn path_due(&self, unit: &Unit, now: GameTime, chasing: bool) -> bool {
        let cooldown = if chasing {
            self.attack_path
        } else {
            self.movement_path
        };
        cooldown.ready(unit.timers.last_path_calc, now)
    }

    pub fn mark_path(&self, unit: &mut Unit, now: GameTime) {
        unit.timers.last_path_calc = Some(now);
    }
}
