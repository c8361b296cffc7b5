//! Tactical configuration with documented constants
//!
//! All tunable numbers of the tactical core live here. Sections can be loaded
//! from TOML presets in `data/tactics/`; every section falls back to its
//! defaults when omitted.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::core::error::{Result, TacticalError};
use crate::core::types::GameTime;

/// Timing policy shared by every decision-making component
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ThrottleConfig {
    /// Minimum time between two decisions of the same unit (ms)
    ///
    /// Stops units from wiggling between two nearly equal choices.
    pub decision_interval_ms: GameTime,

    /// Damage taken within this window lets a unit decide immediately (ms)
    ///
    /// Must be shorter than `decision_interval_ms`.
    pub immediate_response_window_ms: GameTime,

    /// Minimum time between two target switches (ms)
    ///
    /// Must be longer than `decision_interval_ms`.
    pub retarget_cooldown_ms: GameTime,

    /// Path recalculation interval for ordinary movement (ms)
    ///
    /// Also the path cache TTL.
    pub path_recalc_interval_ms: GameTime,

    /// Path recalculation interval while chasing or attacking (ms)
    ///
    /// Chased targets move, so this is shorter than `path_recalc_interval_ms`.
    pub attack_path_interval_ms: GameTime,

    /// How long a hit counts as "recently damaged" for engagement and
    /// harvester flight decisions (ms)
    pub recent_damage_window_ms: GameTime,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            decision_interval_ms: 500,
            immediate_response_window_ms: 250,
            retarget_cooldown_ms: 2000,
            path_recalc_interval_ms: 2000,
            attack_path_interval_ms: 800,
            recent_damage_window_ms: 3000,
        }
    }
}

/// Per-unit combat behavior thresholds (distances in cells)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    /// Health fraction at or below which a unit retreats
    pub retreat_health_ratio: f32,
    /// Health fraction a retreating unit needs before it rejoins combat
    pub resume_health_ratio: f32,
    /// Lost crew roles before a unit evacuates to a hospital
    pub hospital_crew_losses: u32,
    /// Radius in which the last attacker is hunted down
    pub retaliation_radius: f32,
    /// Hostiles this close to a harvester count as a threat to it
    pub harvester_threat_radius: f32,
    /// How far a unit travels to protect a threatened own harvester
    pub harvester_guard_radius: f32,
    /// How far a unit travels to engage an enemy harvester
    pub harvester_engage_range: f32,
    /// Hostiles this close to an own structure trigger base defense
    pub base_defense_radius: f32,
    /// Only units this close to the threatened structure are recruited
    pub defender_recruit_radius: f32,
    /// Defenders recruited per attacking unit
    pub defenders_per_threat: u32,
    /// Hard cap on simultaneous base defenders
    pub max_base_defenders: u32,
    /// A current target is kept while within weapon range times this factor
    pub engagement_range_factor: f32,
    /// Lone units and pairs only engage targets within weapon range plus this
    pub close_engage_margin: f32,
    /// Distance from a predicted impact that triggers a dodge
    pub dodge_radius: f32,
    /// Only impacts arriving within this window are dodged (ms)
    pub dodge_window_ms: GameTime,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            retreat_health_ratio: 0.25,
            resume_health_ratio: 0.6,
            hospital_crew_losses: 2,
            retaliation_radius: 10.0,
            harvester_threat_radius: 6.0,
            harvester_guard_radius: 12.0,
            harvester_engage_range: 14.0,
            base_defense_radius: 10.0,
            defender_recruit_radius: 20.0,
            defenders_per_threat: 2,
            max_base_defenders: 6,
            engagement_range_factor: 2.0,
            close_engage_margin: 2.0,
            dodge_radius: 1.5,
            dodge_window_ms: 600,
        }
    }
}

/// Group attack and siege placement parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AttackConfig {
    /// Smallest group allowed to push into defended territory
    pub min_group_size: u32,
    /// Allies within this radius count toward the local group
    pub formation_radius: f32,
    /// Targets at or below this health fraction are always engaged
    pub heavily_damaged_ratio: f32,
    /// Units this close to an own structure always engage
    pub base_perimeter_radius: f32,
    /// Defensive structures within this radius of a siege target add to its
    /// estimated strength
    pub siege_scan_radius: f32,
    /// Rings searched around an approach cell for a free standing cell
    pub siege_ring_max: u32,
    /// Allow the lowest-danger cell next to the enemy base to override
    /// directional siege assignment
    pub use_global_attack_point: bool,
}

impl Default for AttackConfig {
    fn default() -> Self {
        Self {
            min_group_size: 3,
            formation_radius: 6.0,
            heavily_damaged_ratio: 0.4,
            base_perimeter_radius: 8.0,
            siege_scan_radius: 10.0,
            siege_ring_max: 6,
            use_global_attack_point: true,
        }
    }
}

/// Harvester-hunter role parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HunterConfig {
    /// Combat units closer than this force the hunter to defend itself
    pub self_defense_radius: f32,
    /// Radius searched for a cell outside enemy defensive fire
    pub standoff_search_radius: u32,
}

impl Default for HunterConfig {
    fn default() -> Self {
        Self {
            self_defense_radius: 5.0,
            standoff_search_radius: 10,
        }
    }
}

/// Aerial unit parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AerialConfig {
    /// Extra distance added to mobile air-defense ranges
    pub air_defense_margin: f32,
}

impl Default for AerialConfig {
    fn default() -> Self {
        Self {
            air_defense_margin: 2.0,
        }
    }
}

/// Service vehicle dispatch parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogisticsConfig {
    /// Supply fraction below which a unit is in the low tier
    pub low_supply_ratio: f32,
    /// Minimum time between two scans of the low tier (ms)
    pub low_scan_cooldown_ms: GameTime,
    /// Distance at which a vehicle can serve its recipient
    pub service_range: f32,
    /// Pending requests a single vehicle accepts
    pub max_queue_len: usize,
}

impl Default for LogisticsConfig {
    fn default() -> Self {
        Self {
            low_supply_ratio: 0.3,
            low_scan_cooldown_ms: 3000,
            service_range: 1.5,
            max_queue_len: 4,
        }
    }
}

/// Complete tactical configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TacticalConfig {
    /// Name of this preset (set from filename)
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub throttle: ThrottleConfig,
    #[serde(default)]
    pub combat: CombatConfig,
    #[serde(default)]
    pub attack: AttackConfig,
    #[serde(default)]
    pub hunter: HunterConfig,
    #[serde(default)]
    pub aerial: AerialConfig,
    #[serde(default)]
    pub logistics: LogisticsConfig,
}

impl TacticalConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self {
            name: "default".to_string(),
            ..Self::default()
        }
    }

    /// Parse a config from TOML text and validate it
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: TacticalConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        let t = &self.throttle;
        if t.immediate_response_window_ms >= t.decision_interval_ms {
            return Err(TacticalError::InvalidConfig(format!(
                "immediate_response_window_ms ({}) should be < decision_interval_ms ({})",
                t.immediate_response_window_ms, t.decision_interval_ms
            )));
        }
        if t.decision_interval_ms >= t.retarget_cooldown_ms {
            return Err(TacticalError::InvalidConfig(format!(
                "decision_interval_ms ({}) should be < retarget_cooldown_ms ({})",
                t.decision_interval_ms, t.retarget_cooldown_ms
            )));
        }
        if t.attack_path_interval_ms >= t.path_recalc_interval_ms {
            return Err(TacticalError::InvalidConfig(format!(
                "attack_path_interval_ms ({}) should be < path_recalc_interval_ms ({})",
                t.attack_path_interval_ms, t.path_recalc_interval_ms
            )));
        }

        let ratios = [
            ("retreat_health_ratio", self.combat.retreat_health_ratio),
            ("resume_health_ratio", self.combat.resume_health_ratio),
            ("heavily_damaged_ratio", self.attack.heavily_damaged_ratio),
            ("low_supply_ratio", self.logistics.low_supply_ratio),
        ];
        for (name, value) in ratios {
            if !(value > 0.0 && value <= 1.0) {
                return Err(TacticalError::InvalidConfig(format!(
                    "{} ({}) must be in (0, 1]",
                    name, value
                )));
            }
        }

        if self.combat.resume_health_ratio < self.combat.retreat_health_ratio {
            return Err(TacticalError::InvalidConfig(
                "resume_health_ratio must not be below retreat_health_ratio".into(),
            ));
        }
        if self.combat.max_base_defenders < self.combat.defenders_per_threat {
            return Err(TacticalError::InvalidConfig(
                "max_base_defenders must be >= defenders_per_threat".into(),
            ));
        }
        if self.attack.min_group_size == 0 {
            return Err(TacticalError::InvalidConfig(
                "min_group_size must be at least 1".into(),
            ));
        }

        Ok(())
    }
}

/// Load a config preset from TOML
///
/// Loads from `data/tactics/{name}.toml`
pub fn load_config(name: &str) -> Result<TacticalConfig> {
    let path = config_path(name);
    let contents = fs::read_to_string(&path)?;
    let mut config = TacticalConfig::from_toml_str(&contents)?;
    config.name = name.to_string();
    Ok(config)
}

/// Get path to a config preset
fn config_path(name: &str) -> PathBuf {
    PathBuf::from("data/tactics").join(format!("{}.toml", name))
}
