//! Shared numeric constants for the canvas crate.

use crate::brush::Color;

// ── Brush ───────────────────────────────────────────────────────

/// Smallest brush diameter in canvas pixels (slider at the bottom).
pub const BRUSH_MIN_SIZE: f64 = 1.0;

/// Largest brush diameter in canvas pixels (slider at the top).
pub const BRUSH_MAX_SIZE: f64 = 50.0;

/// Brush diameter at session start.
pub const DEFAULT_BRUSH_SIZE: f64 = 10.0;

/// Brush colour at session start, `#009dff`.
pub const DEFAULT_COLOR: Color = Color::rgb(0x00, 0x9d, 0xff);

// ── Zoom ────────────────────────────────────────────────────────

/// Scale multiplier for one zoom-in step (wheel tick or key press).
pub const ZOOM_IN_FACTOR: f64 = 1.1;

/// Scale multiplier for one zoom-out step.
pub const ZOOM_OUT_FACTOR: f64 = 0.9;

/// Lower scale bound.
pub const MIN_SCALE: f64 = 0.05;

/// Upper scale bound.
pub const MAX_SCALE: f64 = 40.0;

/// Floor applied to the scale when it is used as a divisor.
pub const SCALE_DIVISOR_FLOOR: f64 = 0.0001;

// ── Stroke geometry ─────────────────────────────────────────────

/// Thinnest line a stroke will be painted with, in canvas pixels.
pub const MIN_LINE_WIDTH: f64 = 1.0;

/// Smallest radius for a single-click dab, in canvas pixels.
pub const MIN_DOT_RADIUS: f64 = 0.5;

// ── Export ──────────────────────────────────────────────────────

/// File name suggested to the host for the download link.
pub const EXPORT_FILE_NAME: &str = "edited-image.png";
