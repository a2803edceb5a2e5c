//! Engine tuning parameters.
//!
//! Every margin, interval and capacity used by the handlers lives here so an
//! embedding application can load them from JSON instead of patching constants.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Default pixel margin around borders and corners for hit-testing.
pub const BORDER_MARGIN: f64 = 6.0;
/// Minimum width/height a resized rectangle may reach.
pub const MIN_SHAPE_SIZE: f64 = 25.0;
/// Distance under which the last path point snaps onto the first one.
pub const CLOSE_MARGIN: f64 = 10.0;
/// Freehand points closer than this to the previous one are discarded.
pub const MIN_POINT_DISTANCE: f64 = 3.0;
/// Perpendicular distance under which a freehand corner is drawn straight.
pub const SMOOTHING_MARGIN: f64 = 5.0;
/// Rotation applied by a single click on a rotate button (π/16).
pub const ROTATION_STEP_DEGREES: f64 = 11.25;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid configuration value: {0}")]
    Invalid(String),
}

/// Tunables shared by the canvas engine and its handlers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum number of history snapshots kept.
    pub history_capacity: usize,
    /// Minimum delay between two effective undo operations, in milliseconds.
    pub undo_debounce_ms: u64,
    /// Minimum delay between two processed drag moves, in milliseconds.
    pub drag_throttle_ms: u64,
    /// How long a path vertex hit stays cached, in milliseconds.
    pub hit_cache_ms: u64,
    /// Pixel margin for border/corner classification.
    pub border_margin: f64,
    /// Minimum size of a resized shape.
    pub min_shape_size: f64,
    /// Default size of a shape created by a simple click.
    pub default_shape_size: f64,
    /// Distance under which a path closes on its first point.
    pub close_margin: f64,
    /// Minimum distance between two freehand points.
    pub min_point_distance: f64,
    /// Straight-segment tolerance for freehand smoothing.
    pub smoothing_margin: f64,
    /// Degrees added or removed by the rotate buttons.
    pub rotation_step_degrees: f64,
    /// Angle increment used by line angle snapping.
    pub angle_snap_increment: f64,
    /// Angular distance under which a line snaps to the increment.
    pub angle_snap_margin: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            history_capacity: 20,
            undo_debounce_ms: 300,
            drag_throttle_ms: 25,
            hit_cache_ms: 100,
            border_margin: BORDER_MARGIN,
            min_shape_size: MIN_SHAPE_SIZE,
            default_shape_size: 100.0,
            close_margin: CLOSE_MARGIN,
            min_point_distance: MIN_POINT_DISTANCE,
            smoothing_margin: SMOOTHING_MARGIN,
            rotation_step_degrees: ROTATION_STEP_DEGREES,
            angle_snap_increment: 15.0,
            angle_snap_margin: 4.0,
        }
    }
}

impl EngineConfig {
    /// Parse a configuration from JSON; missing keys keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the engine cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.history_capacity == 0 {
            return Err(ConfigError::Invalid("history_capacity must be at least 1".into()));
        }
        let margins = [
            ("border_margin", self.border_margin),
            ("min_shape_size", self.min_shape_size),
            ("default_shape_size", self.default_shape_size),
            ("close_margin", self.close_margin),
            ("min_point_distance", self.min_point_distance),
            ("smoothing_margin", self.smoothing_margin),
        ];
        for (name, value) in margins {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Invalid(format!("{name} must be a non-negative number")));
            }
        }
        if self.angle_snap_increment <= 0.0 || !self.angle_snap_increment.is_finite() {
            return Err(ConfigError::Invalid("angle_snap_increment must be positive".into()));
        }
        Ok(())
    }

    /// Delay between two effective undos.
    pub fn undo_debounce(&self) -> Duration {
        Duration::from_millis(self.undo_debounce_ms)
    }

    /// Minimum interval between two applied drag moves.
    pub fn drag_throttle(&self) -> Duration {
        Duration::from_millis(self.drag_throttle_ms)
    }

    /// How long a path vertex hit stays cached.
    pub fn hit_cache(&self) -> Duration {
        Duration::from_millis(self.hit_cache_ms)
    }
}
