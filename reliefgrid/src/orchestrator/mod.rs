//! Tile download orchestration
//!
//! Coordinates concurrent downloading of every tile covering a bounding box
//! and assembles them into one contiguous elevation raster.

mod stitch;
mod types;

pub use stitch::TileStitcher;
pub use types::{
    StitchError, StitchStats, StitchedRaster, StitcherConfig, DEFAULT_MAX_CONCURRENT_FETCHES,
    DEFAULT_MAX_RASTER_PIXELS,
};
