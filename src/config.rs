/// Tuning for a session, loadable from TOML.
///
/// `Default` carries the stock tuning; a file only needs the fields it wants
/// to change.  All structs validate themselves before any component is built.

use std::path::Path;

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::entities::{EntityRole, FlightDirection, Heading, Template};
use crate::error::{check_non_negative, check_range, ConfigError};
use crate::state_machine::DEFAULT_COUNTDOWN_SECONDS;

// ── Level generator ──────────────────────────────────────────────────────────

/// One tile stream (floor, ceiling or debris).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StreamConfig {
    pub templates: Vec<Template>,
    pub anchor: Vector3<f32>,
    pub heading: Heading,
    /// New tiles are shifted vertically by up to ± this much.
    pub vertical_offset: f32,
    /// Horizontal distance the last tile must cover before the next spawn.
    pub initial_gap: f32,
    /// When set, the gap is redrawn from `[0, max_gap]` after every spawn.
    pub max_gap: Option<f32>,
    /// When set, tiles spin at a rate drawn from `[min, max]` degrees/s.
    pub rotation: Option<(f32, f32)>,
    /// Tiles laid down behind the anchor before play starts.
    #[serde(default)]
    pub prefill_count: usize,
    #[serde(default)]
    pub tile_spacing: f32,
}

impl StreamConfig {
    pub fn validate(&self, name: &str) -> Result<(), ConfigError> {
        if self.templates.is_empty() {
            return Err(ConfigError::EmptyTemplatePool {
                spawner: name.to_string(),
            });
        }
        check_non_negative(&format!("{name}.vertical_offset"), self.vertical_offset)?;
        check_non_negative(&format!("{name}.initial_gap"), self.initial_gap)?;
        check_non_negative(&format!("{name}.tile_spacing"), self.tile_spacing)?;
        if let Some(max_gap) = self.max_gap {
            check_non_negative(&format!("{name}.max_gap"), max_gap)?;
        }
        if let Some((min, max)) = self.rotation {
            check_range(&format!("{name}.rotation"), min, max)?;
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelConfig {
    pub floor: StreamConfig,
    pub ceiling: StreamConfig,
    pub debris: StreamConfig,
    pub h_speed_min: f32,
    pub h_speed_max: f32,
    /// Constant downward drift applied to every tile.
    pub v_speed: f32,
    pub destroy_distance: f32,
}

impl LevelConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.floor.validate("floor")?;
        self.ceiling.validate("ceiling")?;
        self.debris.validate("debris")?;
        check_range("level.h_speed", self.h_speed_min, self.h_speed_max)?;
        check_non_negative("level.destroy_distance", self.destroy_distance)?;
        Ok(())
    }
}

impl Default for LevelConfig {
    fn default() -> Self {
        Self {
            floor: StreamConfig {
                templates: vec![
                    Template::new("rock", '▀', EntityRole::Scenery),
                    Template::new("crater", '▔', EntityRole::Scenery),
                ],
                anchor: Vector3::new(24.0, -11.0, 0.0),
                heading: Heading::Left,
                vertical_offset: 0.5,
                initial_gap: 1.0,
                max_gap: Some(3.0),
                rotation: None,
                prefill_count: 16,
                tile_spacing: 3.0,
            },
            ceiling: StreamConfig {
                templates: vec![Template::new("stalactite", '▄', EntityRole::Scenery)],
                anchor: Vector3::new(-24.0, 11.0, 0.0),
                heading: Heading::Right,
                vertical_offset: 0.5,
                initial_gap: 1.0,
                max_gap: Some(3.0),
                rotation: None,
                prefill_count: 16,
                tile_spacing: 3.0,
            },
            debris: StreamConfig {
                templates: vec![
                    Template::new("scrap", '%', EntityRole::Hazard { damage: 1 }),
                    Template::new("bolt", '+', EntityRole::Hazard { damage: 1 }),
                ],
                anchor: Vector3::new(-24.0, 4.0, 0.0),
                heading: Heading::Right,
                vertical_offset: 6.0,
                initial_gap: 12.0,
                max_gap: None,
                rotation: Some((1.0, 2.0)),
                prefill_count: 0,
                tile_spacing: 0.0,
            },
            h_speed_min: 0.5,
            h_speed_max: 5.0,
            v_speed: 0.2,
            destroy_distance: 48.0,
        }
    }
}

// ── Flying objects ───────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FlyingSpawnerConfig {
    pub name: String,
    pub templates: Vec<Template>,
    pub anchor: Vector3<f32>,
    /// Per-axis bound of the random spawn offset.
    pub offset_range: Vector3<f32>,
    pub interval_min: f32,
    pub interval_max: f32,
    pub speed: f32,
    pub max_travel: f32,
    /// Vertical scale of the diagonal direction modes.
    pub downward_speed: f32,
    pub direction: FlightDirection,
    /// Loop along a figure eight while travelling instead of flying straight.
    #[serde(default)]
    pub figure_eight: Option<FigureEightConfig>,
    /// Top spin rate in degrees per second.  Each object draws its own rate
    /// from the upper half of the range.
    #[serde(default)]
    pub spin: Option<f32>,
}

/// Shape of a figure-eight flight path.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FigureEightConfig {
    /// Radians of curve parameter per second.
    pub speed: f32,
    pub scale_x: f32,
    pub scale_y: f32,
}

impl FlyingSpawnerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.templates.is_empty() {
            return Err(ConfigError::EmptyTemplatePool {
                spawner: self.name.clone(),
            });
        }
        for (axis, value) in ["x", "y", "z"].iter().zip(self.offset_range.iter()) {
            check_non_negative(&format!("{}.offset_range.{axis}", self.name), *value)?;
        }
        check_non_negative(&format!("{}.interval_min", self.name), self.interval_min)?;
        check_range(
            &format!("{}.interval", self.name),
            self.interval_min,
            self.interval_max,
        )?;
        check_non_negative(&format!("{}.max_travel", self.name), self.max_travel)?;
        if let Some(shape) = &self.figure_eight {
            check_non_negative(&format!("{}.figure_eight.speed", self.name), shape.speed)?;
            check_non_negative(&format!("{}.figure_eight.scale_x", self.name), shape.scale_x)?;
            check_non_negative(&format!("{}.figure_eight.scale_y", self.name), shape.scale_y)?;
        }
        if let Some(spin) = self.spin {
            check_non_negative(&format!("{}.spin", self.name), spin)?;
        }
        Ok(())
    }

    fn birds() -> Self {
        Self {
            name: "birds".to_string(),
            templates: vec![
                Template::new("gull", 'v', EntityRole::Hazard { damage: 1 }),
                Template::new("drone", 'x', EntityRole::Hazard { damage: 1 }),
            ],
            anchor: Vector3::new(24.0, 2.0, 0.0),
            offset_range: Vector3::new(0.0, 6.0, 0.0),
            interval_min: 1.0,
            interval_max: 2.5,
            speed: 5.0,
            max_travel: 48.0,
            downward_speed: 0.1,
            direction: FlightDirection::LeftDown,
            figure_eight: None,
            spin: None,
        }
    }

    fn stars() -> Self {
        Self {
            name: "stars".to_string(),
            templates: vec![Template::new("star", '*', EntityRole::Collectible { points: 1 })],
            anchor: Vector3::new(0.0, 12.0, 0.0),
            offset_range: Vector3::new(18.0, 0.0, 0.0),
            interval_min: 0.8,
            interval_max: 1.6,
            speed: 3.0,
            max_travel: 24.0,
            downward_speed: 1.0,
            direction: FlightDirection::Down,
            figure_eight: None,
            spin: Some(300.0),
        }
    }
}

// ── Player ───────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub health: i32,
    pub start_position: Vector3<f32>,
    pub follow_speed: f32,
    /// The player hovers this far above the input target.
    pub touch_offset_y: f32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            health: 1,
            start_position: Vector3::new(0.0, -7.0, 0.0),
            follow_speed: 5.0,
            touch_offset_y: 1.0,
        }
    }
}

// ── Launch pad ───────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LaunchPadConfig {
    pub position: Vector3<f32>,
    pub initial_speed: f32,
    pub acceleration: f32,
    pub max_speed: f32,
    pub max_travel: f32,
}

impl LaunchPadConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_non_negative("launch_pad.acceleration", self.acceleration)?;
        check_non_negative("launch_pad.max_speed", self.max_speed)?;
        check_non_negative("launch_pad.max_travel", self.max_travel)?;
        Ok(())
    }
}

impl Default for LaunchPadConfig {
    fn default() -> Self {
        Self {
            position: Vector3::new(0.0, -8.5, 0.0),
            initial_speed: 0.0,
            acceleration: 10.0,
            max_speed: 100.0,
            max_travel: 15.0,
        }
    }
}

// ── Whole session ────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub countdown_seconds: f32,
    /// Player/entity distance (in the xy plane) that counts as contact.
    pub contact_radius: f32,
    pub level: LevelConfig,
    pub flying: Vec<FlyingSpawnerConfig>,
    pub player: PlayerConfig,
    pub launch_pad: LaunchPadConfig,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            countdown_seconds: DEFAULT_COUNTDOWN_SECONDS,
            contact_radius: 0.8,
            level: LevelConfig::default(),
            flying: vec![FlyingSpawnerConfig::birds(), FlyingSpawnerConfig::stars()],
            player: PlayerConfig::default(),
            launch_pad: LaunchPadConfig::default(),
        }
    }
}

impl GameConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_non_negative("countdown_seconds", self.countdown_seconds)?;
        check_non_negative("contact_radius", self.contact_radius)?;
        self.level.validate()?;
        for spawner in &self.flying {
            spawner.validate()?;
        }
        if self.player.health <= 0 {
            return Err(ConfigError::NotPositive {
                field: "player.health".to_string(),
                value: self.player.health.into(),
            });
        }
        check_non_negative("player.follow_speed", self.player.follow_speed)?;
        self.launch_pad.validate()?;
        Ok(())
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: GameConfig =
            toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        log::info!("Loading configuration from {}", path.display());
        Self::from_toml_str(&contents)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))
    }
}
