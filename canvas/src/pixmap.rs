//! In-memory raster implementing [`RasterSurface`] on `tiny_skia`.
//!
//! Used for headless sessions and tests. Strokes and dabs are built as
//! `tiny_skia` paths and painted anti-aliased with source-over blending. Caps
//! and joins are round, as in [`crate::render`].
//!
//! `tiny_skia` keeps pixels premultiplied. The public byte accessors work in
//! straight RGBA8, the layout image decoders produce.

#[cfg(test)]
#[path = "pixmap_test.rs"]
mod pixmap_test;

use std::fmt;

use tiny_skia::{ColorU8, FillRule, LineCap, LineJoin, Paint, Path, PathBuilder, Transform};

use crate::brush::Color;
use crate::camera::Point;
use crate::surface::{RasterSurface, StrokeStyle};

/// Bytes per pixel.
const CHANNELS: usize = 4;

/// Errors from constructing or restoring a [`Pixmap`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PixmapError {
    #[error("pixmap dimensions must be non-zero, got {width}x{height}")]
    EmptyDimensions { width: u32, height: u32 },
    #[error("pixmap of {width}x{height} cannot be allocated")]
    TooLarge { width: u32, height: u32 },
    #[error("pixel buffer has {actual} bytes, expected {expected}")]
    BufferLength { expected: usize, actual: usize },
    #[error("snapshot is {actual:?}, surface is {expected:?}")]
    SizeMismatch { expected: (u32, u32), actual: (u32, u32) },
}

/// Full copy of a pixmap's premultiplied pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixmapSnapshot {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl PixmapSnapshot {
    /// Size of the pixel payload in bytes.
    #[must_use]
    pub fn byte_len(&self) -> usize {
        self.data.len()
    }
}

/// RGBA8 raster with a fixed size.
#[derive(Clone)]
pub struct Pixmap {
    inner: tiny_skia::Pixmap,
}

impl fmt::Debug for Pixmap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pixmap")
            .field("width", &self.width())
            .field("height", &self.height())
            .finish_non_exhaustive()
    }
}

impl PartialEq for Pixmap {
    fn eq(&self, other: &Self) -> bool {
        self.size() == other.size() && self.inner.data() == other.inner.data()
    }
}

impl Pixmap {
    /// A pixmap filled with one straight-alpha colour.
    ///
    /// # Errors
    ///
    /// Returns `EmptyDimensions` if either side is zero and `TooLarge` if the
    /// buffer cannot be allocated.
    pub fn new(width: u32, height: u32, fill: [u8; 4]) -> Result<Self, PixmapError> {
        let mut inner = allocate(width, height)?;
        inner.fill(tiny_skia::Color::from_rgba8(fill[0], fill[1], fill[2], fill[3]));
        Ok(Self { inner })
    }

    /// Wrap decoded straight-alpha RGBA8 pixels.
    ///
    /// # Errors
    ///
    /// Returns `EmptyDimensions` for a zero side, `TooLarge` if the buffer
    /// cannot be allocated, and `BufferLength` when `data` is not
    /// `width * height * 4` bytes.
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> Result<Self, PixmapError> {
        let mut inner = allocate(width, height)?;
        let expected = inner.data().len();
        if data.len() != expected {
            return Err(PixmapError::BufferLength { expected, actual: data.len() });
        }
        for (dst, px) in inner.pixels_mut().iter_mut().zip(data.chunks_exact(CHANNELS)) {
            *dst = ColorU8::from_rgba(px[0], px[1], px[2], px[3]).premultiply();
        }
        Ok(Self { inner })
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.inner.width()
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.inner.height()
    }

    /// Straight-alpha pixel at `(x, y)`, or `None` outside the pixmap.
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        let px = self.inner.pixel(x, y)?.demultiply();
        Some([px.red(), px.green(), px.blue(), px.alpha()])
    }

    /// Every pixel as straight-alpha RGBA8, row-major.
    #[must_use]
    pub fn to_rgba(&self) -> Vec<u8> {
        self.inner
            .pixels()
            .iter()
            .flat_map(|px| {
                let c = px.demultiply();
                [c.red(), c.green(), c.blue(), c.alpha()]
            })
            .collect()
    }

    fn stroke_path(&mut self, path: Option<Path>, style: &StrokeStyle) {
        let Some(path) = path else {
            return;
        };
        #[allow(clippy::cast_possible_truncation)]
        let stroke = tiny_skia::Stroke {
            width: style.width as f32,
            line_cap: LineCap::Round,
            line_join: LineJoin::Round,
            ..tiny_skia::Stroke::default()
        };
        self.inner.stroke_path(&path, &solid(style.color), &stroke, Transform::identity(), None);
    }
}

impl RasterSurface for Pixmap {
    type Snapshot = PixmapSnapshot;
    type Error = PixmapError;

    fn size(&self) -> (u32, u32) {
        (self.inner.width(), self.inner.height())
    }

    fn stroke_line(&mut self, from: Point, to: Point, style: &StrokeStyle) -> Result<(), Self::Error> {
        let mut pb = PathBuilder::new();
        pb.move_to(f32c(from.x), f32c(from.y));
        pb.line_to(f32c(to.x), f32c(to.y));
        self.stroke_path(pb.finish(), style);
        Ok(())
    }

    fn stroke_quadratic(&mut self, from: Point, ctrl: Point, to: Point, style: &StrokeStyle) -> Result<(), Self::Error> {
        let mut pb = PathBuilder::new();
        pb.move_to(f32c(from.x), f32c(from.y));
        pb.quad_to(f32c(ctrl.x), f32c(ctrl.y), f32c(to.x), f32c(to.y));
        self.stroke_path(pb.finish(), style);
        Ok(())
    }

    fn fill_disc(&mut self, center: Point, radius: f64, color: Color) -> Result<(), Self::Error> {
        // None for non-finite or non-positive input.
        if let Some(path) = PathBuilder::from_circle(f32c(center.x), f32c(center.y), f32c(radius)) {
            self.inner.fill_path(&path, &solid(color), FillRule::Winding, Transform::identity(), None);
        }
        Ok(())
    }

    fn snapshot(&self) -> Result<Self::Snapshot, Self::Error> {
        Ok(PixmapSnapshot {
            width: self.inner.width(),
            height: self.inner.height(),
            data: self.inner.data().to_vec(),
        })
    }

    fn restore(&mut self, snapshot: &Self::Snapshot) -> Result<(), Self::Error> {
        let expected = self.size();
        if (snapshot.width, snapshot.height) != expected {
            return Err(PixmapError::SizeMismatch { expected, actual: (snapshot.width, snapshot.height) });
        }
        self.inner.data_mut().copy_from_slice(&snapshot.data);
        Ok(())
    }
}

fn allocate(width: u32, height: u32) -> Result<tiny_skia::Pixmap, PixmapError> {
    if width == 0 || height == 0 {
        return Err(PixmapError::EmptyDimensions { width, height });
    }
    tiny_skia::Pixmap::new(width, height).ok_or(PixmapError::TooLarge { width, height })
}

fn solid(color: Color) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color_rgba8(color.r, color.g, color.b, 255);
    paint.anti_alias = true;
    paint
}

#[allow(clippy::cast_possible_truncation)]
fn f32c(value: f64) -> f32 {
    value as f32
}
