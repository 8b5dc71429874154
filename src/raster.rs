//! Conversion between encoded image files and the engine's in-memory raster.

#[cfg(test)]
#[path = "raster_test.rs"]
mod raster_test;

use std::path::Path;

use canvas::pixmap::{Pixmap, PixmapError};
use image::{ImageFormat, RgbaImage};

#[derive(Debug, thiserror::Error)]
pub enum RasterError {
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("pixmap error: {0}")]
    Pixmap(#[from] PixmapError),
    #[error("decoded image does not fit in memory")]
    Overflow,
}

/// Decode encoded image bytes into a pixmap.
///
/// # Errors
///
/// Returns `Image` for undecodable input and `Pixmap` for zero-sized images.
pub fn decode(bytes: &[u8]) -> Result<Pixmap, RasterError> {
    let rgba = image::load_from_memory(bytes)?.into_rgba8();
    let (width, height) = rgba.dimensions();
    Ok(Pixmap::from_rgba(width, height, rgba.into_raw())?)
}

/// Encode a pixmap as PNG into `path`.
///
/// # Errors
///
/// Returns `Image` if the file cannot be written.
pub fn save_png(pixmap: &Pixmap, path: &Path) -> Result<(), RasterError> {
    let image = to_image(pixmap)?;
    image.save_with_format(path, ImageFormat::Png)?;
    Ok(())
}

fn to_image(pixmap: &Pixmap) -> Result<RgbaImage, RasterError> {
    RgbaImage::from_raw(pixmap.width(), pixmap.height(), pixmap.to_rgba()).ok_or(RasterError::Overflow)
}
