//! Cropping a tile-aligned raster down to an exact bounding box.

use thiserror::Error;

use crate::coord::GeoBoundingBox;

use super::RasterBuffer;

/// Errors that can occur while cropping.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CropError {
    /// The bounding box maps to less than one pixel on some axis.
    #[error(
        "Crop region collapses to {width}×{height} pixels; \
         increase the zoom level or the area"
    )]
    DegenerateCrop { width: u32, height: u32 },

    /// The window reaches past the raster edge.
    #[error(
        "Crop window [{left}, {right})×[{top}, {bottom}) exceeds \
         {raster_width}×{raster_height} raster"
    )]
    OutOfBounds {
        left: u32,
        right: u32,
        top: u32,
        bottom: u32,
        raster_width: u32,
        raster_height: u32,
    },
}

/// Pixel window `[left, right) × [top, bottom)` inside a raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropWindow {
    pub left: u32,
    pub right: u32,
    pub top: u32,
    pub bottom: u32,
}

impl CropWindow {
    /// Maps `bbox` onto pixel offsets of a `full_width × full_height` raster
    /// spanning `grid_bounds`.
    ///
    /// Edges are linearly interpolated and rounded, then clamped to the
    /// raster.
    pub fn locate(
        grid_bounds: &GeoBoundingBox,
        bbox: &GeoBoundingBox,
        full_width: u32,
        full_height: u32,
    ) -> Self {
        let grid_w = grid_bounds.east - grid_bounds.west;
        let grid_h = grid_bounds.north - grid_bounds.south;

        let x = |lon: f64| {
            let px = ((lon - grid_bounds.west) / grid_w * full_width as f64).round();
            px.clamp(0.0, full_width as f64) as u32
        };
        let y = |lat: f64| {
            let px = ((grid_bounds.north - lat) / grid_h * full_height as f64).round();
            px.clamp(0.0, full_height as f64) as u32
        };

        Self {
            left: x(bbox.west),
            right: x(bbox.east),
            top: y(bbox.north),
            bottom: y(bbox.south),
        }
    }

    pub fn width(&self) -> u32 {
        self.right.saturating_sub(self.left)
    }

    pub fn height(&self) -> u32 {
        self.bottom.saturating_sub(self.top)
    }
}

/// Sub-raster extracted by the cropper, with the elevation range found in
/// it.
#[derive(Debug, Clone, PartialEq)]
pub struct CroppedRaster {
    pub width: u32,
    pub height: u32,
    pub data: Vec<f32>,
    pub elev_min: f32,
    pub elev_max: f32,
}

/// Extracts `window` from `raster` in a single pass, tracking the minimum and
/// maximum elevation of the extracted samples only.
///
/// # Errors
///
/// - `CropError::OutOfBounds` if the window extends past the raster
/// - `CropError::DegenerateCrop` if the window is empty on either axis
pub fn crop_window(raster: &RasterBuffer, window: CropWindow) -> Result<CroppedRaster, CropError> {
    if window.right > raster.width() || window.bottom > raster.height() {
        return Err(CropError::OutOfBounds {
            left: window.left,
            right: window.right,
            top: window.top,
            bottom: window.bottom,
            raster_width: raster.width(),
            raster_height: raster.height(),
        });
    }

    let width = window.width();
    let height = window.height();
    if width == 0 || height == 0 {
        return Err(CropError::DegenerateCrop { width, height });
    }

    let mut data = Vec::with_capacity(width as usize * height as usize);
    let mut elev_min = f32::INFINITY;
    let mut elev_max = f32::NEG_INFINITY;

    let (left, right) = (window.left as usize, window.right as usize);
    for y in window.top..window.bottom {
        for &v in &raster.row(y)[left..right] {
            elev_min = elev_min.min(v);
            elev_max = elev_max.max(v);
            data.push(v);
        }
    }

    Ok(CroppedRaster {
        width,
        height,
        data,
        elev_min,
        elev_max,
    })
}

/// Crops a stitched raster spanning `grid_bounds` to exactly `bbox`.
pub fn crop_to_bbox(
    raster: &RasterBuffer,
    grid_bounds: &GeoBoundingBox,
    bbox: &GeoBoundingBox,
) -> Result<CroppedRaster, CropError> {
    let window = CropWindow::locate(grid_bounds, bbox, raster.width(), raster.height());
    crop_window(raster, window)
}
