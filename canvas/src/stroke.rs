//! Freehand stroke smoothing.
//!
//! Points arrive in canvas space. Each new point extends the path with a
//! quadratic curve whose control point is the previous sample and whose end
//! is the midpoint between the previous and new samples; the path cursor then
//! sits on that midpoint. Finishing the stroke flushes a straight segment to
//! the last sample. A stroke that never moved becomes a single round dab.

#[cfg(test)]
#[path = "stroke_test.rs"]
mod stroke_test;

use crate::camera::Point;
use crate::surface::{RasterSurface, StrokeStyle};

/// A piece of a stroke ready to paint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Segment {
    Quadratic { from: Point, ctrl: Point, to: Point },
    Line { from: Point, to: Point },
    Dot { center: Point, radius: f64 },
}

/// A stroke in progress.
#[derive(Debug, Clone, PartialEq)]
pub struct Stroke {
    points: Vec<Point>,
    cursor: Point,
    style: StrokeStyle,
    dot_radius: f64,
}

impl Stroke {
    /// Start a stroke at `start` with a width and dab radius fixed for its lifetime.
    #[must_use]
    pub fn begin(start: Point, style: StrokeStyle, dot_radius: f64) -> Self {
        Self { points: vec![start], cursor: start, style, dot_radius }
    }

    /// Add a sample and return the curve segment it completes.
    pub fn extend(&mut self, point: Point) -> Segment {
        let last = self.last();
        let mid = last.midpoint(point);
        let segment = Segment::Quadratic { from: self.cursor, ctrl: last, to: mid };
        self.cursor = mid;
        self.points.push(point);
        segment
    }

    /// Close the stroke: a dab for a single sample, otherwise the straight
    /// flush from the path cursor to the last sample.
    #[must_use]
    pub fn finish(self) -> Segment {
        let last = self.last();
        if self.points.len() == 1 {
            Segment::Dot { center: last, radius: self.dot_radius }
        } else {
            Segment::Line { from: self.cursor, to: last }
        }
    }

    #[must_use]
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    #[must_use]
    pub fn style(&self) -> StrokeStyle {
        self.style
    }

    /// Line width in canvas pixels.
    #[must_use]
    pub fn width(&self) -> f64 {
        self.style.width
    }

    #[must_use]
    pub fn dot_radius(&self) -> f64 {
        self.dot_radius
    }

    fn last(&self) -> Point {
        self.points.last().copied().unwrap_or(self.cursor)
    }
}

/// Paint one segment.
///
/// # Errors
///
/// Returns the surface's error if the draw call fails.
pub fn paint<S: RasterSurface>(surface: &mut S, segment: &Segment, style: &StrokeStyle) -> Result<(), S::Error> {
    match *segment {
        Segment::Quadratic { from, ctrl, to } => surface.stroke_quadratic(from, ctrl, to, style),
        Segment::Line { from, to } => surface.stroke_line(from, to, style),
        Segment::Dot { center, radius } => surface.fill_disc(center, radius, style.color),
    }
}
