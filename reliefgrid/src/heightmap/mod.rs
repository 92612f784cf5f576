//! Heightmap normalization, resampling and export.
//!
//! A cropped elevation raster is rescaled linearly into `0..=255` and then
//! resampled to a square output grid. The real-world elevation range found
//! during cropping travels with the result unchanged.

mod result;

pub use result::{HeightmapError, HeightmapResult, HeightmapSummary};

use image::imageops::{self, FilterType};
use image::{GrayImage, Luma};

use crate::raster::CroppedRaster;

/// Smallest elevation span used as a divisor, so flat terrain normalizes to
/// a constant instead of dividing by zero.
pub const NORMALIZE_EPSILON: f32 = 1e-6;

/// Filter used for resampling. Bilinear on upscale, area-weighted on
/// downscale, and deterministic for fixed input.
pub const RESAMPLE_FILTER: FilterType = FilterType::Triangle;

/// Maps one elevation onto the 8-bit gray scale.
#[inline]
pub fn normalize_value(v: f32, elev_min: f32, elev_max: f32) -> u8 {
    let span = (elev_max - elev_min).max(NORMALIZE_EPSILON);
    (((v - elev_min) / span).clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Normalizes a cropped raster to an 8-bit grid of the same dimensions.
///
/// The crop's minimum maps to 0 and its maximum to 255.
pub fn normalize(cropped: &CroppedRaster) -> GrayImage {
    let width = cropped.width;
    GrayImage::from_fn(cropped.width, cropped.height, |x, y| {
        let v = cropped.data[y as usize * width as usize + x as usize];
        Luma([normalize_value(v, cropped.elev_min, cropped.elev_max)])
    })
}

/// Resamples a gray grid to `output_px × output_px`.
pub fn resample(image: &GrayImage, output_px: u32) -> GrayImage {
    imageops::resize(image, output_px, output_px, RESAMPLE_FILTER)
}

/// Normalizes and resamples a cropped raster into the final heightmap.
pub fn build_heightmap(cropped: &CroppedRaster, output_px: u32) -> HeightmapResult {
    let gray = resample(&normalize(cropped), output_px);
    HeightmapResult::from_gray(gray, cropped.elev_min, cropped.elev_max)
}
