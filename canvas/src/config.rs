//! Engine tuning loaded from JSON.
//!
//! Every field has a default, so `{}` is a valid config and unknown keys are
//! ignored. [`EngineConfig::validate`] rejects values that would break the
//! camera or brush invariants.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use serde::{Deserialize, Serialize};

use crate::brush::Color;
use crate::camera::ScaleLimits;
use crate::consts::{BRUSH_MAX_SIZE, BRUSH_MIN_SIZE, DEFAULT_BRUSH_SIZE, MAX_SCALE, MIN_SCALE, ZOOM_IN_FACTOR, ZOOM_OUT_FACTOR};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Brush diameter at session start, `1..=50`.
    pub brush_size: f64,
    pub color: Color,
    /// Scale multiplier per zoom-in step, `> 1`.
    pub zoom_in_factor: f64,
    /// Scale multiplier per zoom-out step, `0 < f < 1`.
    pub zoom_out_factor: f64,
    pub min_scale: f64,
    pub max_scale: f64,
    /// Maximum history entries kept; `None` keeps everything.
    pub history_limit: Option<usize>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            brush_size: DEFAULT_BRUSH_SIZE,
            color: Color::default(),
            zoom_in_factor: ZOOM_IN_FACTOR,
            zoom_out_factor: ZOOM_OUT_FACTOR,
            min_scale: MIN_SCALE,
            max_scale: MAX_SCALE,
            history_limit: None,
        }
    }
}

impl EngineConfig {
    /// Parse and validate a JSON config.
    ///
    /// # Errors
    ///
    /// Returns `Parse` for malformed JSON or wrongly typed fields and
    /// `Invalid` for out-of-range values.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// Returns `Invalid` naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(BRUSH_MIN_SIZE..=BRUSH_MAX_SIZE).contains(&self.brush_size) {
            return Err(invalid(format!(
                "brush_size must be within {BRUSH_MIN_SIZE}..={BRUSH_MAX_SIZE}, got {}",
                self.brush_size
            )));
        }
        if !(self.zoom_in_factor.is_finite() && self.zoom_in_factor > 1.0) {
            return Err(invalid(format!("zoom_in_factor must be > 1, got {}", self.zoom_in_factor)));
        }
        if !(self.zoom_out_factor > 0.0 && self.zoom_out_factor < 1.0) {
            return Err(invalid(format!("zoom_out_factor must be in (0, 1), got {}", self.zoom_out_factor)));
        }
        if !(self.min_scale.is_finite() && self.min_scale > 0.0) {
            return Err(invalid(format!("min_scale must be > 0, got {}", self.min_scale)));
        }
        if !(self.max_scale.is_finite() && self.max_scale >= self.min_scale) {
            return Err(invalid(format!(
                "max_scale must be finite and >= min_scale ({}), got {}",
                self.min_scale, self.max_scale
            )));
        }
        if !(self.min_scale..=self.max_scale).contains(&1.0) {
            return Err(invalid("scale range must include 1.0".to_owned()));
        }
        if self.history_limit == Some(0) {
            return Err(invalid("history_limit must be at least 1".to_owned()));
        }
        Ok(())
    }

    #[must_use]
    pub fn scale_limits(&self) -> ScaleLimits {
        ScaleLimits { min: self.min_scale, max: self.max_scale }
    }
}

fn invalid(message: String) -> ConfigError {
    ConfigError::Invalid(message)
}
