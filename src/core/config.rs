//! Game configuration document and the immutable site context
//!
//! A level is described by one document (JSON or TOML) that deserializes into
//! [`GameConfig`]. Enum-valued strings are parsed while the document is read,
//! so an unknown behaviour, strategy, door type or direction is rejected before
//! any entity exists.
//!
//! Units follow the level files: dwell times and periods are minutes, the day
//! is given in hours, speeds and radii are in tiles. Entities convert to ticks
//! and pixels when they are constructed.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::error::{IntrusionError, Result};
use crate::core::types::{hours_to_ticks, Tick, Vec2};

/// Which estimator the run is meant to produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum TestType {
    #[serde(rename = "p-test")]
    PTest,
    #[serde(rename = "q-test")]
    QTest,
}

/// How the attacker ends (or does not end) a trial
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum Strategy {
    #[serde(rename = "normal")]
    Normal,
    #[serde(rename = "p-test")]
    PTest,
    #[serde(rename = "q-test")]
    QTest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum AttackerBehaviour {
    #[serde(rename = "jump")]
    Jump,
    #[serde(rename = "walk")]
    Walk,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum EmployeeBehaviour {
    #[serde(rename = "stay")]
    Stay,
    #[serde(rename = "walk")]
    Walk,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum GuardBehaviour {
    #[serde(rename = "reset")]
    Reset,
    #[serde(rename = "stroll")]
    Stroll,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum DoorType {
    #[serde(rename = "intra_level")]
    IntraLevel,
    #[serde(rename = "inter_level")]
    InterLevel,
}

/// Side of the door the coverage area sits on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum DoorDirection {
    #[serde(rename = "up")]
    Up,
    #[serde(rename = "down")]
    Down,
    #[serde(rename = "left")]
    Left,
    #[serde(rename = "right")]
    Right,
}

impl TestType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TestType::PTest => "p-test",
            TestType::QTest => "q-test",
        }
    }
}

impl FromStr for TestType {
    type Err = IntrusionError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "p-test" => Ok(TestType::PTest),
            "q-test" => Ok(TestType::QTest),
            other => Err(IntrusionError::invalid_value("test_type", other)),
        }
    }
}

impl FromStr for Strategy {
    type Err = IntrusionError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "normal" => Ok(Strategy::Normal),
            "p-test" => Ok(Strategy::PTest),
            "q-test" => Ok(Strategy::QTest),
            other => Err(IntrusionError::invalid_value("attacker.strategy", other)),
        }
    }
}

impl FromStr for AttackerBehaviour {
    type Err = IntrusionError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "jump" => Ok(AttackerBehaviour::Jump),
            "walk" => Ok(AttackerBehaviour::Walk),
            other => Err(IntrusionError::invalid_value("attacker.behaviour", other)),
        }
    }
}

impl FromStr for EmployeeBehaviour {
    type Err = IntrusionError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "stay" => Ok(EmployeeBehaviour::Stay),
            "walk" => Ok(EmployeeBehaviour::Walk),
            other => Err(IntrusionError::invalid_value("employees.behaviour", other)),
        }
    }
}

impl FromStr for GuardBehaviour {
    type Err = IntrusionError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "reset" => Ok(GuardBehaviour::Reset),
            "stroll" => Ok(GuardBehaviour::Stroll),
            other => Err(IntrusionError::invalid_value("guard.behaviour", other)),
        }
    }
}

impl FromStr for DoorType {
    type Err = IntrusionError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "intra_level" => Ok(DoorType::IntraLevel),
            "inter_level" => Ok(DoorType::InterLevel),
            other => Err(IntrusionError::invalid_value("door.type", other)),
        }
    }
}

impl FromStr for DoorDirection {
    type Err = IntrusionError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "up" => Ok(DoorDirection::Up),
            "down" => Ok(DoorDirection::Down),
            "left" => Ok(DoorDirection::Left),
            "right" => Ok(DoorDirection::Right),
            other => Err(IntrusionError::invalid_value("door.direction", other)),
        }
    }
}

impl TryFrom<String> for TestType {
    type Error = IntrusionError;
    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl TryFrom<String> for Strategy {
    type Error = IntrusionError;
    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl TryFrom<String> for AttackerBehaviour {
    type Error = IntrusionError;
    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl TryFrom<String> for EmployeeBehaviour {
    type Error = IntrusionError;
    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl TryFrom<String> for GuardBehaviour {
    type Error = IntrusionError;
    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl TryFrom<String> for DoorType {
    type Error = IntrusionError;
    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl TryFrom<String> for DoorDirection {
    type Error = IntrusionError;
    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl fmt::Display for TestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One door of the site
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoorConfig {
    /// Horizontal position as a fraction of the site width
    pub x: f64,
    /// Vertical position as a fraction of the site height
    pub y: f64,
    #[serde(rename = "type")]
    pub door_type: DoorType,
    pub direction: DoorDirection,
    /// Mean closed time in minutes
    pub inter_opening_time: f64,
    /// Probability that an opening uses the short range
    pub short_opening_probability: f64,
    pub max_open_time: f64,
    pub min_open_time: f64,
    pub max_short_open_time: f64,
    pub min_short_open_time: f64,
    /// Upper bound (minutes) of a triangular closed time; gaussian when absent
    #[serde(default)]
    pub max_close_time: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttackerConfig {
    /// Start position in site coordinates
    pub x: f64,
    pub y: f64,
    pub behaviour: AttackerBehaviour,
    pub strategy: Strategy,
    /// Travel speed in tiles per tick
    pub speed: f64,
    /// Speed used while approaching a door, defaults to `speed`
    #[serde(default)]
    pub attack_speed: Option<f64>,
    /// Minutes spent in place after an attempt
    pub stay_period: f64,
    /// Minutes between attempts
    pub attack_period: f64,
    /// Uniform jitter (tiles) applied to the start position
    #[serde(default)]
    pub randomization: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmployeeConfig {
    pub number_of_employees: u32,
    pub behaviour: EmployeeBehaviour,
    pub max_stay_time: f64,
    pub min_stay_time: f64,
    pub speed: f64,
    /// Spawn jitter (tiles) around the site centre
    pub randomization: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuardConfig {
    pub behaviour: GuardBehaviour,
    /// Check radius in tiles
    pub check_radius: f64,
    pub max_check_time: f64,
    pub min_check_time: f64,
    pub number_of_missions: u32,
    pub max_mission_time: f64,
    pub min_mission_time: f64,
    pub stroll_speed: f64,
    pub check_speed: f64,
    pub entities_per_check: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuardsConfig {
    pub number_of_guards: u32,
    /// Guard templates, assigned round-robin
    pub config: Vec<GuardConfig>,
}

impl GuardsConfig {
    /// Template used by the guard at `index`
    pub fn template(&self, index: usize) -> Option<&GuardConfig> {
        if self.config.is_empty() {
            None
        } else {
            self.config.get(index % self.config.len())
        }
    }
}

fn default_one() -> u32 {
    1
}

fn default_confidence() -> f64 {
    0.75
}

/// Complete level document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameConfig {
    #[serde(default)]
    pub level: Option<String>,
    /// Length of a simulated day in hours
    pub day_duration: f64,
    pub tile_size: u32,
    /// Site width in tiles
    pub width: u32,
    /// Site height in tiles
    pub height: u32,
    pub test_type: TestType,
    pub iterations: u32,
    #[serde(default = "default_one")]
    pub batches: u32,
    #[serde(default = "default_one")]
    pub cycles_per_frame: u32,
    #[serde(default)]
    pub log_debug: bool,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub observed_mean: Option<f64>,
    #[serde(default = "default_confidence")]
    pub confidence: f64,
    pub doors: Vec<DoorConfig>,
    pub attacker: AttackerConfig,
    pub employees: EmployeeConfig,
    pub guards: GuardsConfig,
}

impl GameConfig {
    /// Parse a JSON document
    pub fn from_json(content: &str) -> Result<Self> {
        let config: GameConfig = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML document
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: GameConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a level file, picking the format from the extension (JSON unless `.toml`)
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Self::from_toml(&content),
            _ => Self::from_json(&content),
        }
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        if self.tile_size == 0 || self.width == 0 || self.height == 0 {
            return Err(IntrusionError::InvalidConfig(
                "tile_size, width and height must be positive".into(),
            ));
        }
        check_finite("day_duration", self.day_duration, HOUR)?;
        if self.day_duration <= 0.0 {
            return Err(IntrusionError::InvalidConfig(format!(
                "day_duration must be positive, got {}",
                self.day_duration
            )));
        }
        if let Some(observed) = self.observed_mean {
            check_finite("observed_mean", observed, 1.0)?;
        }
        let tile = f64::from(self.tile_size);
        if self.cycles_per_frame == 0 || self.batches == 0 {
            return Err(IntrusionError::InvalidConfig(
                "cycles_per_frame and batches must be at least 1".into(),
            ));
        }
        if !(self.confidence > 0.0 && self.confidence < 1.0) {
            return Err(IntrusionError::InvalidConfig(format!(
                "confidence must be in (0, 1), got {}",
                self.confidence
            )));
        }

        for (i, door) in self.doors.iter().enumerate() {
            check_finite("door.x", door.x, f64::from(self.width) * tile)?;
            check_finite("door.y", door.y, f64::from(self.height) * tile)?;
            check_finite("door.inter_opening_time", door.inter_opening_time, MINUTE)?;
            check_finite(
                "door.short_opening_probability",
                door.short_opening_probability,
                1.0,
            )?;
            if !(0.0..=1.0).contains(&door.short_opening_probability) {
                return Err(IntrusionError::InvalidConfig(format!(
                    "door {} short_opening_probability {} outside [0, 1]",
                    i, door.short_opening_probability
                )));
            }
            check_range("door.open_time", door.min_open_time, door.max_open_time)?;
            check_range(
                "door.short_open_time",
                door.min_short_open_time,
                door.max_short_open_time,
            )?;
            if let Some(max_close_time) = door.max_close_time {
                check_range("door.close_time", 0.0, max_close_time)?;
            }
        }

        let attacker = &self.attacker;
        check_finite("attacker.x", attacker.x, 1.0)?;
        check_finite("attacker.y", attacker.y, 1.0)?;
        check_finite("attacker.speed", attacker.speed, tile)?;
        if let Some(attack_speed) = attacker.attack_speed {
            check_finite("attacker.attack_speed", attack_speed, tile)?;
        }
        check_finite("attacker.stay_period", attacker.stay_period, MINUTE)?;
        check_finite("attacker.attack_period", attacker.attack_period, MINUTE)?;
        if let Some(randomization) = attacker.randomization {
            // Jitter spans twice the distance on each axis
            check_finite("attacker.randomization", randomization, 2.0 * tile)?;
        }

        check_finite("employees.speed", self.employees.speed, tile)?;
        check_finite(
            "employees.randomization",
            self.employees.randomization,
            2.0 * tile,
        )?;
        check_range(
            "employees.stay_time",
            self.employees.min_stay_time,
            self.employees.max_stay_time,
        )?;

        if self.guards.number_of_guards > 0 && self.guards.config.is_empty() {
            return Err(IntrusionError::InvalidConfig(
                "guards requested but no guard config given".into(),
            ));
        }
        for guard in &self.guards.config {
            check_finite("guard.check_radius", guard.check_radius, tile)?;
            check_finite("guard.stroll_speed", guard.stroll_speed, tile)?;
            check_finite("guard.check_speed", guard.check_speed, tile)?;
            check_range("guard.check_time", guard.min_check_time, guard.max_check_time)?;
            check_range(
                "guard.mission_time",
                guard.min_mission_time,
                guard.max_mission_time,
            )?;
            if guard.number_of_missions == 0 {
                return Err(IntrusionError::InvalidConfig(
                    "guard.number_of_missions must be at least 1".into(),
                ));
            }
        }

        Ok(())
    }

    /// Build the immutable site context shared by every entity of a trial
    pub fn site(&self) -> Site {
        let tile_size = self.tile_size as f64;
        Site {
            tile_size,
            half_tile: tile_size / 2.0,
            width: self.width as f64 * tile_size,
            height: self.height as f64 * tile_size,
            day_ticks: hours_to_ticks(self.day_duration),
            cycles_per_frame: self.cycles_per_frame,
        }
    }

    /// Name used for result files and log lines
    pub fn name(&self) -> &str {
        self.level.as_deref().unwrap_or("level")
    }
}

const MINUTE: f64 = 60.0;
const HOUR: f64 = 3600.0;

/// `value` must be finite and stay finite once scaled to ticks or site units
fn check_finite(field: &str, value: f64, scale: f64) -> Result<()> {
    if !value.is_finite() || !(value * scale).is_finite() {
        return Err(IntrusionError::InvalidConfig(format!(
            "{} must be a finite number, got {}",
            field, value
        )));
    }
    Ok(())
}

fn check_range(field: &str, min: f64, max: f64) -> Result<()> {
    check_finite(field, min, MINUTE)?;
    check_finite(field, max, MINUTE)?;
    if min < 0.0 || min > max {
        return Err(IntrusionError::InvalidConfig(format!(
            "{} range [{}, {}] is invalid",
            field, min, max
        )));
    }
    Ok(())
}

/// Geometry and timing shared by all entities of a trial
///
/// Built once from [`GameConfig::site`] and passed by reference; nothing in the
/// simulation mutates it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Site {
    pub tile_size: f64,
    pub half_tile: f64,
    /// Width in site units (tiles × tile size)
    pub width: f64,
    /// Height in site units (tiles × tile size)
    pub height: f64,
    /// Length of one simulated day
    pub day_ticks: Tick,
    /// Ticks processed between two stop-flag polls
    pub cycles_per_frame: u32,
}

impl Site {
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width / 2.0, self.height / 2.0)
    }

    pub fn contains(&self, p: &Vec2) -> bool {
        p.x >= 0.0 && p.x <= self.width && p.y >= 0.0 && p.y <= self.height
    }

    /// Pull a point that left the site back inside, half a tile from the edge
    pub fn constrain(&self, p: Vec2) -> Vec2 {
        let x = if p.x > self.width {
            (self.width - self.half_tile).max(0.0)
        } else if p.x < 0.0 {
            self.half_tile.min(self.width)
        } else {
            p.x
        };
        let y = if p.y > self.height {
            (self.height - self.half_tile).max(0.0)
        } else if p.y < 0.0 {
            self.half_tile.min(self.height)
        } else {
            p.y
        };
        Vec2::new(x, y)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) const LEVEL_JSON: &str = r#"{
        "level": "level_1",
        "day_duration": 8,
        "tile_size": 16,
        "width": 40,
        "height": 30,
        "test_type": "p-test",
        "iterations": 10,
        "cycles_per_frame": 100,
        "doors": [
            {
                "x": 0.5, "y": 1.0, "type": "inter_level", "direction": "down",
                "inter_opening_time": 30, "short_opening_probability": 0.8,
                "max_open_time": 10, "min_open_time": 5,
                "max_short_open_time": 1, "min_short_open_time": 0.5
            }
        ],
        "attacker": {
            "x": 320, "y": 240, "behaviour": "walk", "strategy": "p-test",
            "speed": 1, "stay_period": 5, "attack_period": 10
        },
        "employees": {
            "number_of_employees": 5, "behaviour": "walk", "max_stay_time": 30,
            "min_stay_time": 10, "speed": 0.5, "randomization": 4
        },
        "guards": {
            "number_of_guards": 2,
            "config": [{
                "behaviour": "stroll", "check_radius": 3, "max_check_time": 3,
                "min_check_time": 1, "number_of_missions": 4, "max_mission_time": 30,
                "min_mission_time": 15, "stroll_speed": 0.2, "check_speed": 0.5,
                "entities_per_check": 2
            }]
        }
    }"#;

    #[test]
    fn test_parse_level_json() {
        let config = GameConfig::from_json(LEVEL_JSON).unwrap();
        assert_eq!(config.test_type, TestType::PTest);
        assert_eq!(config.doors[0].door_type, DoorType::InterLevel);
        assert_eq!(config.doors[0].direction, DoorDirection::Down);
        assert_eq!(config.attacker.strategy, Strategy::PTest);
        assert_eq!(config.batches, 1);
        assert_eq!(config.confidence, 0.75);
        assert!(config.attacker.attack_speed.is_none());
    }

    #[test]
    fn test_site_converts_units() {
        let site = GameConfig::from_json(LEVEL_JSON).unwrap().site();
        assert_eq!(site.width, 640.0);
        assert_eq!(site.height, 480.0);
        assert_eq!(site.half_tile, 8.0);
        assert_eq!(site.day_ticks, 8 * 3600);
    }

    #[test]
    fn test_invalid_strategy_is_rejected() {
        let bad = LEVEL_JSON.replace("\"strategy\": \"p-test\"", "\"strategy\": \"sneaky\"");
        let err = GameConfig::from_json(&bad).unwrap_err();
        assert!(err.to_string().contains("sneaky"), "{}", err);
    }

    #[test]
    fn test_invalid_door_direction_is_rejected() {
        let bad = LEVEL_JSON.replace("\"direction\": \"down\"", "\"direction\": \"north\"");
        assert!(GameConfig::from_json(&bad).is_err());
    }

    #[test]
    fn test_missing_key_is_rejected() {
        let bad = LEVEL_JSON.replace("\"day_duration\": 8,", "");
        let err = GameConfig::from_json(&bad).unwrap_err();
        assert!(err.to_string().contains("day_duration"), "{}", err);
    }

    #[test]
    fn test_inverted_range_is_rejected() {
        let bad = LEVEL_JSON.replace("\"min_open_time\": 5", "\"min_open_time\": 50");
        assert!(matches!(
            GameConfig::from_json(&bad),
            Err(IntrusionError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_overflowing_value_is_rejected() {
        let bad = LEVEL_JSON.replace("\"randomization\": 4", "\"randomization\": 1e308");
        assert!(matches!(
            GameConfig::from_json(&bad),
            Err(IntrusionError::InvalidConfig(_))
        ));

        // Finite on its own, infinite once scaled by the tile size
        let bad = LEVEL_JSON.replace("\"check_radius\": 3", "\"check_radius\": 1.5e307");
        assert!(matches!(
            GameConfig::from_json(&bad),
            Err(IntrusionError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_nan_is_rejected() {
        let mut config = GameConfig::from_json(LEVEL_JSON).unwrap();
        config.employees.min_stay_time = f64::NAN;
        config.employees.max_stay_time = f64::NAN;
        assert!(matches!(
            config.validate(),
            Err(IntrusionError::InvalidConfig(_))
        ));

        let mut config = GameConfig::from_json(LEVEL_JSON).unwrap();
        config.day_duration = f64::INFINITY;
        assert!(config.validate().is_err());

        let mut config = GameConfig::from_json(LEVEL_JSON).unwrap();
        config.attacker.attack_speed = Some(f64::NAN);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_enum_from_str() {
        assert_eq!("jump".parse::<AttackerBehaviour>().unwrap(), AttackerBehaviour::Jump);
        assert_eq!("reset".parse::<GuardBehaviour>().unwrap(), GuardBehaviour::Reset);
        assert!("run".parse::<AttackerBehaviour>().is_err());
        assert!("patrol".parse::<GuardBehaviour>().is_err());
        assert!("outer".parse::<DoorType>().is_err());
    }

    #[test]
    fn test_guard_templates_round_robin() {
        let config = GameConfig::from_json(LEVEL_JSON).unwrap();
        assert!(config.guards.template(0).is_some());
        assert!(config.guards.template(5).is_some());
    }

    #[test]
    fn test_constrain_pulls_inside() {
        let site = GameConfig::from_json(LEVEL_JSON).unwrap().site();
        let p = site.constrain(Vec2::new(-3.0, 900.0));
        assert_eq!(p, Vec2::new(8.0, 472.0));
        assert!(site.contains(&p));
    }
}
