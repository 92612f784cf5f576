//! Heightmap generation pipeline.
//!
//! Sequences the stages for one request:
//!
//! ```text
//! HeightmapRequest ──► bbox ──► TileStitcher ──► crop_to_bbox ──► normalize ──► resample
//!                               (concurrent)     (min/max)                      HeightmapResult
//! ```
//!
//! Nothing is shared between runs; every raster is created and dropped
//! inside a single [`HeightmapPipeline::generate`] call.

mod request;

pub use request::{HeightmapRequest, KM_PER_DEGREE};

use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::TilesConfig;
use crate::coord::TileCoord;
use crate::heightmap::{build_heightmap, HeightmapResult};
use crate::orchestrator::{StitchError, StitcherConfig, TileStitcher};
use crate::progress::{PipelineProgress, ProgressSender};
use crate::provider::{
    AsyncHttpClient, ProviderError, ReqwestClient, TerrariumTileSource, TileSource,
};
use crate::raster::{crop_to_bbox, CropError};

/// Errors that can end a pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The request is out of range or not finite.
    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    /// A tile could not be fetched, or the run was cancelled.
    #[error(transparent)]
    Stitch(#[from] StitchError),

    /// The area is smaller than one pixel at the chosen zoom.
    #[error(transparent)]
    Crop(#[from] CropError),
}

impl PipelineError {
    /// The tile whose fetch failed, if any.
    pub fn tile(&self) -> Option<TileCoord> {
        match self {
            PipelineError::Stitch(e) => e.tile(),
            _ => None,
        }
    }

    /// HTTP status of the failed tile request, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            PipelineError::Stitch(e) => e.status(),
            _ => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, PipelineError::Stitch(StitchError::Cancelled { .. }))
    }
}

/// Turns [`HeightmapRequest`]s into [`HeightmapResult`]s using one tile
/// source.
pub struct HeightmapPipeline<S: TileSource> {
    stitcher: TileStitcher<S>,
    progress: ProgressSender,
}

impl<S: TileSource> HeightmapPipeline<S> {
    pub fn new(source: S) -> Self {
        Self::with_config(source, StitcherConfig::default())
    }

    pub fn with_config(source: S, config: StitcherConfig) -> Self {
        Self {
            stitcher: TileStitcher::with_config(source, config),
            progress: ProgressSender::disabled(),
        }
    }

    /// Routes progress events from every stage to `progress`.
    pub fn with_progress(mut self, progress: ProgressSender) -> Self {
        self.stitcher = self.stitcher.with_progress(progress.clone());
        self.progress = progress;
        self
    }

    pub fn source(&self) -> &S {
        self.stitcher.source()
    }

    /// Generates the heightmap for `request`.
    ///
    /// # Arguments
    ///
    /// * `request` - Center, area, zoom and output size
    /// * `cancellation` - Cancelling it stops outstanding tile requests
    ///
    /// # Returns
    ///
    /// The normalized, resampled heightmap with the elevation range of the
    /// cropped area.
    ///
    /// # Errors
    ///
    /// - `InvalidParameters` for out-of-range input, before any request
    /// - `Stitch` with the first tile failure, on cancellation, or when the
    ///   zoom or raster size is refused before any request
    /// - `Crop` if the area maps to zero pixels at this zoom
    pub async fn generate(
        &self,
        request: &HeightmapRequest,
        cancellation: &CancellationToken,
    ) -> Result<HeightmapResult, PipelineError> {
        let bbox = request.bounding_box()?;
        info!(
            lat = request.center_lat,
            lon = request.center_lon,
            area_km = request.area_km,
            zoom = request.zoom,
            output_px = request.output_px,
            "Generating heightmap"
        );
        debug!(
            west = bbox.west,
            east = bbox.east,
            south = bbox.south,
            north = bbox.north,
            "Request bounding box"
        );

        let stitched = self
            .stitcher
            .stitch(&bbox, request.zoom, cancellation)
            .await?;

        let cropped = crop_to_bbox(&stitched.raster, &stitched.grid.bounds(), &bbox)?;
        drop(stitched);
        debug!(
            width = cropped.width,
            height = cropped.height,
            elev_min = cropped.elev_min,
            elev_max = cropped.elev_max,
            "Raster cropped"
        );

        self.progress.emit(PipelineProgress::ResizeStarted {
            from_width: cropped.width,
            from_height: cropped.height,
            to: request.output_px,
        });
        let heightmap = build_heightmap(&cropped, request.output_px);

        self.progress.emit(PipelineProgress::ElevationRange {
            min: heightmap.elev_min,
            max: heightmap.elev_max,
        });
        info!(
            width = heightmap.width,
            height = heightmap.height,
            elev_min = heightmap.elev_min,
            elev_max = heightmap.elev_max,
            "Heightmap generated"
        );

        Ok(heightmap)
    }
}

/// Pipeline backed by a Terrarium HTTP endpoint.
pub type TerrariumPipeline = HeightmapPipeline<TerrariumTileSource<ReqwestClient>>;

impl TerrariumPipeline {
    /// Builds a pipeline from the `[tiles]` configuration.
    pub fn from_tiles_config(config: &TilesConfig) -> Result<Self, ProviderError> {
        let client = ReqwestClient::with_timeout(config.timeout_secs)?;
        Ok(Self::with_config(
            terrarium_source(client, config),
            StitcherConfig {
                max_concurrent_fetches: config.max_concurrent,
                ..Default::default()
            },
        ))
    }
}

/// Terrarium source for `config`'s endpoint and zoom limit.
fn terrarium_source<C: AsyncHttpClient>(
    client: C,
    config: &TilesConfig,
) -> TerrariumTileSource<C> {
    let source = TerrariumTileSource::with_base_url(client, config.base_url.as_str());
    match config.max_zoom {
        Some(max_zoom) => {
            let (min_zoom, _) = source.zoom_range();
            source.with_zoom_range(min_zoom, max_zoom)
        }
        None => source,
    }
}

/// Runs one request against `source`.
///
/// Convenience wrapper around [`HeightmapPipeline`] for one-off use.
pub async fn generate_heightmap<S: TileSource>(
    source: S,
    request: &HeightmapRequest,
    progress: ProgressSender,
    cancellation: &CancellationToken,
) -> Result<HeightmapResult, PipelineError> {
    HeightmapPipeline::new(source)
        .with_progress(progress)
        .generate(request, cancellation)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{StaticMockClient, DEFAULT_TERRARIUM_MAX_ZOOM, DEFAULT_TERRARIUM_URL};

    fn mock() -> StaticMockClient {
        StaticMockClient {
            response: Ok(Vec::new()),
        }
    }

    #[test]
    fn test_public_bucket_stops_at_default_zoom() {
        let source = terrarium_source(mock(), &TilesConfig::default());
        assert_eq!(source.zoom_range(), (0, DEFAULT_TERRARIUM_MAX_ZOOM));
    }

    #[test]
    fn test_configured_max_zoom_applies() {
        let config = TilesConfig {
            base_url: "http://dem.local/terrarium".to_string(),
            max_zoom: Some(17),
            ..Default::default()
        };
        let source = terrarium_source(mock(), &config);
        assert_eq!(source.zoom_range(), (0, 17));
        assert!(source.supports_zoom(17));
        assert!(!source.supports_zoom(18));
    }

    #[test]
    fn test_configured_max_zoom_raises_public_bucket_limit() {
        let config = TilesConfig {
            base_url: DEFAULT_TERRARIUM_URL.to_string(),
            max_zoom: Some(16),
            ..Default::default()
        };
        assert_eq!(terrarium_source(mock(), &config).zoom_range(), (0, 16));
    }
}
