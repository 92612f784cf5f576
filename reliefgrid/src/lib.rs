//! reliefgrid - terrain heightmaps from web-mercator elevation tiles
//!
//! Given a center point, an area size and a zoom level, this library fetches
//! every Terrarium elevation tile covering the area, stitches them into one
//! raster, crops it to the requested box, and produces a square 8-bit
//! heightmap together with the real-world elevation range it represents.
//!
//! # Example
//!
//! ```no_run
//! use reliefgrid::pipeline::{HeightmapPipeline, HeightmapRequest};
//! use reliefgrid::provider::{ReqwestClient, TerrariumTileSource};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let source = TerrariumTileSource::new(ReqwestClient::new()?);
//! let pipeline = HeightmapPipeline::new(source);
//!
//! let request = HeightmapRequest::new(45.8326, 6.8652, 20.0, 200, 12);
//! let heightmap = pipeline.generate(&request, &CancellationToken::new()).await?;
//! heightmap.save_png("mont_blanc.png")?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod coord;
pub mod heightmap;
pub mod logging;
pub mod orchestrator;
pub mod pipeline;
pub mod progress;
pub mod provider;
pub mod raster;

pub use heightmap::{HeightmapResult, HeightmapSummary};
pub use pipeline::{generate_heightmap, HeightmapPipeline, HeightmapRequest, PipelineError};
pub use progress::{progress_channel, PipelineProgress, ProgressSender};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
