//! Concurrent tile fetching and stitching.

use std::time::Instant;

use futures::stream::{self, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::coord::{GeoBoundingBox, TileCoord, TileGrid, TILE_SIZE};
use crate::progress::{PipelineProgress, ProgressSender};
use crate::provider::TileSource;
use crate::raster::RasterBuffer;

use super::types::{StitchError, StitchStats, StitchedRaster, StitcherConfig};

/// Fetches every tile covering a bounding box and assembles one raster.
///
/// Tile requests run concurrently, up to
/// [`StitcherConfig::max_concurrent_fetches`] at a time. Each request owns
/// the raster region of its own tile, so tiles can complete in any order and
/// the result is the same.
pub struct TileStitcher<S: TileSource> {
    source: S,
    config: StitcherConfig,
    progress: ProgressSender,
}

impl<S: TileSource> TileStitcher<S> {
    /// Creates a stitcher with default settings and no progress reporting.
    pub fn new(source: S) -> Self {
        Self::with_config(source, StitcherConfig::default())
    }

    /// Creates a stitcher with custom settings.
    pub fn with_config(source: S, config: StitcherConfig) -> Self {
        Self {
            source,
            config,
            progress: ProgressSender::disabled(),
        }
    }

    /// Routes progress events to `progress`.
    pub fn with_progress(mut self, progress: ProgressSender) -> Self {
        self.progress = progress;
        self
    }

    /// The underlying tile source.
    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn config(&self) -> &StitcherConfig {
        &self.config
    }

    fn check_raster_budget(&self, grid: &TileGrid) -> Result<(), StitchError> {
        let tile = TILE_SIZE as u64;
        let width = grid.tiles_wide as u64 * tile;
        let height = grid.tiles_high as u64 * tile;
        let max_pixels = self.config.max_raster_pixels;

        match width.checked_mul(height) {
            Some(pixels) if pixels <= max_pixels => Ok(()),
            _ => {
                warn!(width, height, max_pixels, "Stitched raster over budget");
                Err(StitchError::RasterTooLarge {
                    width,
                    height,
                    max_pixels,
                })
            }
        }
    }

    /// Fetches and stitches all tiles covering `bbox` at `zoom`.
    ///
    /// Waits until every tile has landed. The first failure aborts the
    /// remaining requests and is returned; no partial raster is produced.
    ///
    /// # Arguments
    ///
    /// * `bbox` - Area the stitched tiles must cover
    /// * `zoom` - Tile zoom level
    /// * `cancellation` - Token that aborts outstanding requests
    ///
    /// # Returns
    ///
    /// The tile-aligned raster and the grid it covers, or:
    ///
    /// - `StitchError::UnsupportedZoom` if the source does not serve `zoom`
    /// - `StitchError::RasterTooLarge` if the covering tiles exceed
    ///   [`StitcherConfig::max_raster_pixels`]
    /// - `StitchError::TileFetch` naming the first tile that failed
    /// - `StitchError::Cancelled` if `cancellation` fires first
    ///
    /// The first two are checked before any request or allocation.
    pub async fn stitch(
        &self,
        bbox: &GeoBoundingBox,
        zoom: u8,
        cancellation: &CancellationToken,
    ) -> Result<StitchedRaster, StitchError> {
        if !self.source.supports_zoom(zoom) {
            return Err(StitchError::UnsupportedZoom {
                zoom,
                provider: self.source.name().to_string(),
            });
        }

        let grid = TileGrid::covering(bbox, zoom);
        self.check_raster_budget(&grid)?;
        let total = grid.tile_count();
        let (width, height) = grid.pixel_size();

        info!(
            tiles = total,
            zoom,
            tiles_wide = grid.tiles_wide,
            tiles_high = grid.tiles_high,
            source = self.source.name(),
            "Fetching tiles"
        );
        self.progress
            .emit(PipelineProgress::TileFetchStarted { tiles: total, zoom });

        let start = Instant::now();
        let mut raster = RasterBuffer::new(width, height);
        {
            let source = &self.source;
            let origin = grid.origin;
            let regions = raster.tile_regions_mut(TILE_SIZE);

            let mut pending = stream::iter(grid.tiles().zip(regions))
                .map(move |(tile, mut region)| async move {
                    debug_assert_eq!(
                        (region.col(), region.row()),
                        (tile.x - origin.x, tile.y - origin.y)
                    );
                    let fetch_error = |e| StitchError::TileFetch { tile, source: e };
                    let decoded = source.fetch_tile(tile).await.map_err(fetch_error)?;
                    region.write_tile(&decoded).map_err(fetch_error)?;
                    Ok::<TileCoord, StitchError>(tile)
                })
                .buffer_unordered(self.config.max_concurrent_fetches.max(1));

            let mut completed = 0usize;
            loop {
                tokio::select! {
                    biased;

                    _ = cancellation.cancelled() => {
                        warn!(completed, total, "Tile fetch cancelled");
                        return Err(StitchError::Cancelled { completed, total });
                    }

                    next = pending.next() => match next {
                        Some(Ok(tile)) => {
                            completed += 1;
                            debug!(tile = %tile, completed, total, "Tile stitched");
                            self.progress.emit(PipelineProgress::TileFetched {
                                tile,
                                completed,
                                total,
                            });
                        }
                        Some(Err(e)) => {
                            warn!(error = %e, completed, total, "Tile fetch failed, aborting");
                            return Err(e);
                        }
                        None => break,
                    }
                }
            }
        }

        let elapsed = start.elapsed();
        info!(
            tiles = total,
            elapsed_ms = elapsed.as_millis() as u64,
            width,
            height,
            "Tiles stitched"
        );
        self.progress.emit(PipelineProgress::TileFetchCompleted {
            tiles: total,
            elapsed,
        });

        Ok(StitchedRaster {
            grid,
            raster,
            stats: StitchStats {
                tiles_total: total,
                elapsed,
            },
        })
    }
}
