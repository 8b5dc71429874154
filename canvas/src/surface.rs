//! The raster the engine paints on.
//!
//! [`RasterSurface`] is the only thing the engine knows about pixels: it can
//! stroke round-capped segments, fill discs, and take/restore whole-canvas
//! snapshots. The browser implementation lives in [`crate::render`]; the
//! in-memory one in [`crate::pixmap`].

use std::fmt;

use crate::brush::Color;
use crate::camera::Point;

/// Line width (canvas pixels) and colour of a stroke. Caps and joins are round.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeStyle {
    pub width: f64,
    pub color: Color,
}

/// A 2D pixel buffer with a fixed size.
pub trait RasterSurface {
    /// Immutable full-canvas copy of the pixels.
    type Snapshot;
    type Error: fmt::Debug;

    /// Width and height in pixels.
    fn size(&self) -> (u32, u32);

    /// Stroke a straight segment.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the backing surface rejects the draw call.
    fn stroke_line(&mut self, from: Point, to: Point, style: &StrokeStyle) -> Result<(), Self::Error>;

    /// Stroke a quadratic Bézier segment as one path, so anti-aliased edge
    /// pixels are covered once.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the backing surface rejects the draw call.
    fn stroke_quadratic(&mut self, from: Point, ctrl: Point, to: Point, style: &StrokeStyle) -> Result<(), Self::Error>;

    /// Fill a disc.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the backing surface rejects the draw call.
    fn fill_disc(&mut self, center: Point, radius: f64, color: Color) -> Result<(), Self::Error>;

    /// Copy every pixel.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the pixels cannot be read back.
    fn snapshot(&self) -> Result<Self::Snapshot, Self::Error>;

    /// Overwrite every pixel with a snapshot taken from this surface.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the snapshot does not fit or cannot be written.
    fn restore(&mut self, snapshot: &Self::Snapshot) -> Result<(), Self::Error>;
}
