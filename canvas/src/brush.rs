//! Brush state: diameter from the size slider and the paint colour.

#[cfg(test)]
#[path = "brush_test.rs"]
mod brush_test;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::consts::{BRUSH_MAX_SIZE, BRUSH_MIN_SIZE, DEFAULT_BRUSH_SIZE, DEFAULT_COLOR};

/// Errors from parsing a colour string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ColorError {
    #[error("colour string is empty")]
    Empty,
    #[error("colour must have 3 or 6 hex digits, got {0}")]
    InvalidLength(usize),
    #[error("invalid hex digits in colour `{0}`")]
    InvalidHex(String),
}

/// An opaque sRGB colour.
///
/// Serialized as a lowercase `#rrggbb` string, the format colour pickers emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Channels as `[r, g, b, 255]`.
    #[must_use]
    pub fn to_rgba(self) -> [u8; 4] {
        [self.r, self.g, self.b, u8::MAX]
    }
}

impl Default for Color {
    fn default() -> Self {
        DEFAULT_COLOR
    }
}

impl FromStr for Color {
    type Err = ColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(ColorError::Empty);
        }
        let hex = trimmed.strip_prefix('#').unwrap_or(trimmed);
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ColorError::InvalidHex(trimmed.to_owned()));
        }
        let invalid = || ColorError::InvalidHex(trimmed.to_owned());
        match hex.len() {
            3 => {
                let mut channels = [0u8; 3];
                for (slot, digit) in channels.iter_mut().zip(hex.chars()) {
                    let v = digit.to_digit(16).ok_or_else(invalid)?;
                    let v = u8::try_from(v).map_err(|_| invalid())?;
                    *slot = v * 17;
                }
                Ok(Self::rgb(channels[0], channels[1], channels[2]))
            }
            6 => {
                let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid());
                Ok(Self::rgb(channel(0)?, channel(2)?, channel(4)?))
            }
            n => Err(ColorError::InvalidLength(n)),
        }
    }
}

impl TryFrom<String> for Color {
    type Error = ColorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Color> for String {
    fn from(value: Color) -> Self {
        value.to_string()
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Current brush: diameter (in screen pixels) and colour.
///
/// The diameter is driven by a normalized slider position so the two stay in
/// sync: `size = 1 + percent * 49`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Brush {
    size: f64,
    percent: f64,
    color: Color,
}

impl Default for Brush {
    fn default() -> Self {
        Self::new(DEFAULT_BRUSH_SIZE, Color::default())
    }
}

impl Brush {
    /// Brush of the given diameter, clamped to the slider range.
    #[must_use]
    pub fn new(size: f64, color: Color) -> Self {
        let mut brush = Self { size: BRUSH_MIN_SIZE, percent: 0.0, color };
        brush.set_from_percent(percent_for_size(size));
        brush
    }

    /// Map a slider position to a diameter.
    ///
    /// `percent` is clamped to `[0, 1]` (NaN counts as 0). Returns the clamped
    /// value for positioning the slider thumb and fill.
    pub fn set_from_percent(&mut self, percent: f64) -> f64 {
        let p = if percent.is_nan() { 0.0 } else { percent.clamp(0.0, 1.0) };
        self.percent = p;
        self.size = BRUSH_MIN_SIZE + p * (BRUSH_MAX_SIZE - BRUSH_MIN_SIZE);
        p
    }

    /// Brush diameter in screen pixels, `1..=50`.
    #[must_use]
    pub fn size(&self) -> f64 {
        self.size
    }

    /// Slider position, `0..=1`.
    #[must_use]
    pub fn percent(&self) -> f64 {
        self.percent
    }

    #[must_use]
    pub fn color(&self) -> Color {
        self.color
    }

    pub fn set_color(&mut self, color: Color) {
        self.color = color;
    }
}

/// Slider position that produces `size`.
#[must_use]
pub fn percent_for_size(size: f64) -> f64 {
    (size - BRUSH_MIN_SIZE) / (BRUSH_MAX_SIZE - BRUSH_MIN_SIZE)
}
