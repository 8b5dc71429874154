//! Viewport camera: screen ↔ canvas coordinate mapping under pan and zoom.
//!
//! The canvas is laid out centred in the viewport and then translated by the
//! pan offset and scaled by the zoom factor. Centring is a layout fact, not
//! stored state, so every conversion takes the current [`Layout`].

#[cfg(test)]
#[path = "camera_test.rs"]
mod camera_test;

use serde::{Deserialize, Serialize};

use crate::consts::{MIN_DOT_RADIUS, MIN_LINE_WIDTH, SCALE_DIVISOR_FLOOR};

/// A point in either screen or canvas space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Point halfway between `self` and `other`.
    #[must_use]
    pub fn midpoint(self, other: Self) -> Self {
        Self {
            x: (self.x + other.x) * 0.5,
            y: (self.y + other.y) * 0.5,
        }
    }

    /// Euclidean distance to `other`.
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }
}

/// Sizes the coordinate mapping depends on.
///
/// `viewport_*` are CSS pixels of the area the canvas is centred in;
/// `canvas_*` are raster pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Layout {
    pub viewport_width: f64,
    pub viewport_height: f64,
    pub canvas_width: f64,
    pub canvas_height: f64,
}

impl Layout {
    /// Centre of the viewport in screen space.
    #[must_use]
    pub fn viewport_center(&self) -> Point {
        Point::new(self.viewport_width * 0.5, self.viewport_height * 0.5)
    }
}

/// Inclusive scale bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleLimits {
    pub min: f64,
    pub max: f64,
}

impl ScaleLimits {
    #[must_use]
    pub fn clamp(&self, scale: f64) -> f64 {
        scale.clamp(self.min, self.max)
    }
}

/// Camera state for pan/zoom over a centred canvas.
///
/// `offset_x` / `offset_y` are in CSS pixels and applied after centring.
/// `scale` is the canvas-to-screen magnification (1.0 = unmodified size).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub offset_x: f64,
    pub offset_y: f64,
    pub scale: f64,
}

impl Default for Camera {
    fn default() -> Self {
        Self { offset_x: 0.0, offset_y: 0.0, scale: 1.0 }
    }
}

impl Camera {
    /// Back to `scale = 1`, `offset = (0, 0)`.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Top-left corner of the canvas in screen space.
    #[must_use]
    pub fn canvas_origin(&self, layout: &Layout) -> Point {
        origin_for(self.scale, self.offset_x, self.offset_y, layout)
    }

    /// Convert a screen-space point (CSS pixels) to canvas pixel coordinates.
    #[must_use]
    pub fn screen_to_canvas(&self, screen: Point, layout: &Layout) -> Point {
        let origin = self.canvas_origin(layout);
        let scale = self.divisor();
        Point {
            x: (screen.x - origin.x) / scale,
            y: (screen.y - origin.y) / scale,
        }
    }

    /// Convert a canvas pixel coordinate to screen space.
    #[must_use]
    pub fn canvas_to_screen(&self, canvas: Point, layout: &Layout) -> Point {
        let origin = self.canvas_origin(layout);
        Point {
            x: canvas.x * self.scale + origin.x,
            y: canvas.y * self.scale + origin.y,
        }
    }

    /// Multiply the scale by `factor` while keeping the canvas point under
    /// `screen` fixed on screen.
    ///
    /// Returns `false` when the clamped scale is unchanged.
    pub fn zoom_at(&mut self, screen: Point, factor: f64, layout: &Layout, limits: ScaleLimits) -> bool {
        let new_scale = limits.clamp(self.scale * factor);
        if !new_scale.is_finite() || (new_scale - self.scale).abs() <= f64::EPSILON {
            return false;
        }

        let anchor = self.screen_to_canvas(screen, layout);
        let base_new = origin_for(new_scale, 0.0, 0.0, layout);
        let desired_left = screen.x - anchor.x * new_scale;
        let desired_top = screen.y - anchor.y * new_scale;

        self.scale = new_scale;
        self.offset_x = desired_left - base_new.x;
        self.offset_y = desired_top - base_new.y;
        true
    }

    /// Multiply the scale by `factor` about the canvas centre.
    ///
    /// The centred layout keeps the canvas centre at `viewport_centre + offset`
    /// for every scale, so the offset is left alone.
    pub fn zoom_centered(&mut self, factor: f64, limits: ScaleLimits) -> bool {
        let new_scale = limits.clamp(self.scale * factor);
        if !new_scale.is_finite() || (new_scale - self.scale).abs() <= f64::EPSILON {
            return false;
        }
        self.scale = new_scale;
        true
    }

    /// Anchor for a pan gesture starting at `screen`.
    #[must_use]
    pub fn pan_anchor(&self, screen: Point) -> Point {
        Point::new(screen.x - self.offset_x, screen.y - self.offset_y)
    }

    /// Move the offset so that the pan anchor stays under `screen`.
    pub fn pan_to(&mut self, screen: Point, anchor: Point) {
        self.offset_x = screen.x - anchor.x;
        self.offset_y = screen.y - anchor.y;
    }

    /// Translate the offset by a screen-space delta.
    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        self.offset_x += dx;
        self.offset_y += dy;
    }

    /// Canvas-space line width that appears `brush_size` CSS pixels wide.
    #[must_use]
    pub fn stroke_width(&self, brush_size: f64) -> f64 {
        (brush_size / self.divisor()).max(MIN_LINE_WIDTH)
    }

    /// Canvas-space radius of a single-click dab.
    #[must_use]
    pub fn dot_radius(&self, brush_size: f64) -> f64 {
        ((brush_size / self.divisor()) * 0.5).max(MIN_DOT_RADIUS)
    }

    /// CSS `transform` for the element wrapping the canvas.
    #[must_use]
    pub fn css_transform(&self) -> String {
        format!(
            "translate(calc(-50% + {}px), calc(-50% + {}px)) scale({})",
            self.offset_x, self.offset_y, self.scale
        )
    }

    fn divisor(&self) -> f64 {
        self.scale.max(SCALE_DIVISOR_FLOOR)
    }
}

fn origin_for(scale: f64, offset_x: f64, offset_y: f64, layout: &Layout) -> Point {
    let center = layout.viewport_center();
    Point {
        x: center.x - (layout.canvas_width * scale) * 0.5 + offset_x,
        y: center.y - (layout.canvas_height * scale) * 0.5 + offset_y,
    }
}
