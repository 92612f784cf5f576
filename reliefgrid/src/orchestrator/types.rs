//! Orchestrator types and errors

use std::time::Duration;

use thiserror::Error;

use crate::coord::{TileCoord, TileGrid};
use crate::provider::ProviderError;
use crate::raster::RasterBuffer;

/// Default cap on tile requests in flight at once.
pub const DEFAULT_MAX_CONCURRENT_FETCHES: usize = 16;

/// Default cap on stitched raster size: 2^28 samples, 1 GiB of `f32`.
pub const DEFAULT_MAX_RASTER_PIXELS: u64 = 1 << 28;

/// Errors that can occur while stitching tiles.
#[derive(Debug, Error)]
pub enum StitchError {
    /// A tile could not be fetched or decoded. Aborts the whole stitch.
    #[error("Failed to fetch tile {tile}: {source}")]
    TileFetch {
        tile: TileCoord,
        source: ProviderError,
    },

    /// The cancellation token fired before every tile arrived.
    #[error("Tile fetch cancelled after {completed}/{total} tiles")]
    Cancelled { completed: usize, total: usize },

    /// The tile source does not serve this zoom level.
    #[error("{provider} does not serve zoom level {zoom}")]
    UnsupportedZoom { zoom: u8, provider: String },

    /// The covering tiles would not fit in the configured raster budget.
    #[error(
        "Stitched raster would be {width}×{height} pixels, over the \
         {max_pixels} pixel limit; reduce the area or the zoom level"
    )]
    RasterTooLarge {
        width: u64,
        height: u64,
        max_pixels: u64,
    },
}

impl StitchError {
    /// The tile that failed, if this is a fetch failure.
    pub fn tile(&self) -> Option<TileCoord> {
        match self {
            StitchError::TileFetch { tile, .. } => Some(*tile),
            _ => None,
        }
    }

    /// The HTTP status of the failed request, if the server sent one.
    pub fn status(&self) -> Option<u16> {
        match self {
            StitchError::TileFetch { source, .. } => source.status(),
            _ => None,
        }
    }
}

/// Stitcher settings.
#[derive(Debug, Clone)]
pub struct StitcherConfig {
    /// Maximum tile requests in flight.
    pub max_concurrent_fetches: usize,
    /// Largest stitched raster, in samples, the stitcher will allocate.
    pub max_raster_pixels: u64,
}

impl Default for StitcherConfig {
    fn default() -> Self {
        Self {
            max_concurrent_fetches: DEFAULT_MAX_CONCURRENT_FETCHES,
            max_raster_pixels: DEFAULT_MAX_RASTER_PIXELS,
        }
    }
}

/// Statistics about a stitch operation.
#[derive(Debug, Clone)]
pub struct StitchStats {
    /// Number of tiles fetched
    pub tiles_total: usize,
    /// Wall time from the first request to the barrier
    pub elapsed: Duration,
}

/// A tile-aligned raster together with the grid it was built from.
#[derive(Debug)]
pub struct StitchedRaster {
    pub grid: TileGrid,
    pub raster: RasterBuffer,
    pub stats: StitchStats,
}
