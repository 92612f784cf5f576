//! Elevation rasters
//!
//! The stitched [`RasterBuffer`] covers whole tiles; [`crop_to_bbox`] cuts it
//! down to the caller's exact bounding box and reports the elevation range of
//! what remains.

mod buffer;
mod crop;

pub use buffer::{RasterBuffer, TileRegionMut};
pub use crop::{crop_to_bbox, crop_window, CropError, CropWindow, CroppedRaster};
