//! The heightmap handed to downstream consumers.

use std::fmt::Write as _;
use std::path::Path;

use image::{GrayImage, Luma};
use serde::Serialize;
use thiserror::Error;

/// Errors that can occur while exporting a heightmap.
#[derive(Debug, Error)]
pub enum HeightmapError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image encoding failed: {0}")]
    Image(#[from] image::ImageError),
}

/// Final 8-bit heightmap with its real-world elevation range.
///
/// `pixels` is row-major and top-down (row 0 is the northern edge).
/// `elev_min`/`elev_max` are meters, measured on the cropped area before
/// normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct HeightmapResult {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
    pub elev_min: f32,
    pub elev_max: f32,
}

/// Metadata describing a heightmap, for JSON output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeightmapSummary {
    pub width: u32,
    pub height: u32,
    pub elev_min: f32,
    pub elev_max: f32,
    /// Meters represented by one gray level.
    pub meters_per_level: f32,
}

impl HeightmapResult {
    /// Wraps a gray image and the elevation range it was normalized from.
    pub fn from_gray(image: GrayImage, elev_min: f32, elev_max: f32) -> Self {
        let (width, height) = image.dimensions();
        Self {
            width,
            height,
            pixels: image.into_raw(),
            elev_min,
            elev_max,
        }
    }

    /// Gray level at (`x`, `y`).
    pub fn get(&self, x: u32, y: u32) -> u8 {
        self.pixels[y as usize * self.width as usize + x as usize]
    }

    /// Rows in top-down order.
    pub fn rows(&self) -> impl DoubleEndedIterator<Item = &[u8]> + '_ {
        self.pixels.chunks(self.width.max(1) as usize)
    }

    /// Copies the pixels into an `image` gray buffer.
    pub fn to_gray_image(&self) -> GrayImage {
        GrayImage::from_fn(self.width, self.height, |x, y| Luma([self.get(x, y)]))
    }

    /// Writes the heightmap as an 8-bit grayscale PNG.
    pub fn save_png(&self, path: impl AsRef<Path>) -> Result<(), HeightmapError> {
        self.to_gray_image().save(path.as_ref())?;
        Ok(())
    }

    /// Renders the whitespace-delimited text grid consumed by mesh
    /// generators: one row per line, rows bottom-up.
    pub fn to_text_grid(&self) -> String {
        let mut out = String::with_capacity(self.pixels.len() * 4);
        for row in self.rows().rev() {
            for (i, level) in row.iter().enumerate() {
                if i > 0 {
                    out.push(' ');
                }
                let _ = write!(out, "{}", level);
            }
            out.push('\n');
        }
        out
    }

    /// Writes [`to_text_grid`](Self::to_text_grid) to a file.
    pub fn save_text_grid(&self, path: impl AsRef<Path>) -> Result<(), HeightmapError> {
        std::fs::write(path, self.to_text_grid())?;
        Ok(())
    }

    pub fn summary(&self) -> HeightmapSummary {
        HeightmapSummary {
            width: self.width,
            height: self.height,
            elev_min: self.elev_min,
            elev_max: self.elev_max,
            meters_per_level: (self.elev_max - self.elev_min) / 255.0,
        }
    }
}
