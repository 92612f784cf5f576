//! Typed progress events for heightmap generation.
//!
//! Pipeline stages push [`PipelineProgress`] events into a [`ProgressSender`];
//! the consumer on the other end of the channel decides how to surface them
//! (progress bar, log lines, nothing at all). Every event also renders as a
//! human-readable line via `Display`.

use std::fmt;
use std::time::Duration;

use tokio::sync::mpsc;

use crate::coord::TileCoord;

/// A progress event emitted while generating a heightmap.
///
/// Events arrive in pipeline order: `TileFetchStarted`, zero or more
/// `TileFetched`, `TileFetchCompleted`, `ResizeStarted`, `ElevationRange`.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineProgress {
    /// Tile requests are about to fire.
    TileFetchStarted { tiles: usize, zoom: u8 },
    /// One tile has been fetched and placed in the raster.
    TileFetched {
        tile: TileCoord,
        completed: usize,
        total: usize,
    },
    /// Every tile has been fetched.
    TileFetchCompleted { tiles: usize, elapsed: Duration },
    /// The cropped grid is about to be resampled.
    ResizeStarted {
        from_width: u32,
        from_height: u32,
        to: u32,
    },
    /// Real-world elevation range of the cropped area, in meters.
    ElevationRange { min: f32, max: f32 },
}

impl fmt::Display for PipelineProgress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineProgress::TileFetchStarted { tiles, zoom } => {
                write!(f, "Fetching {} tiles at zoom {}...", tiles, zoom)
            }
            PipelineProgress::TileFetched {
                tile,
                completed,
                total,
            } => write!(f, "Fetched tile {} ({}/{})", tile, completed, total),
            PipelineProgress::TileFetchCompleted { tiles, elapsed } => write!(
                f,
                "Fetched {} tiles in {:.2}s",
                tiles,
                elapsed.as_secs_f64()
            ),
            PipelineProgress::ResizeStarted {
                from_width,
                from_height,
                to,
            } => write!(
                f,
                "Resizing {}×{} to {}×{}...",
                from_width, from_height, to, to
            ),
            PipelineProgress::ElevationRange { min, max } => {
                write!(f, "Elevation range: {:.1} m to {:.1} m", min, max)
            }
        }
    }
}

/// Sending half of a progress channel.
///
/// A disabled sender drops every event. Sends never block and never fail
/// the pipeline; a closed receiver is ignored.
#[derive(Debug, Clone, Default)]
pub struct ProgressSender {
    tx: Option<mpsc::UnboundedSender<PipelineProgress>>,
}

impl ProgressSender {
    /// Wraps an existing channel sender.
    pub fn new(tx: mpsc::UnboundedSender<PipelineProgress>) -> Self {
        Self { tx: Some(tx) }
    }

    /// A sender that discards all events.
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Emits an event.
    pub fn emit(&self, event: PipelineProgress) {
        if let Some(tx) = &self.tx {
            let _ = tx.send(event);
        }
    }
}

/// Creates a connected progress sender/receiver pair.
pub fn progress_channel() -> (ProgressSender, mpsc::UnboundedReceiver<PipelineProgress>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (ProgressSender::new(tx), rx)
}
