//! Provider traits, tile payloads and errors.

use thiserror::Error;

use crate::coord::TileCoord;

/// Errors that can occur while fetching or decoding a tile.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// Transport-level failure (connection refused, timeout, body read).
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// The server answered with a non-success status code.
    #[error("HTTP {status} from {url}")]
    HttpStatus { status: u16, url: String },

    /// The payload could not be decoded as an elevation image.
    #[error("Decode error: {0}")]
    DecodeError(String),

    /// The decoded image does not have the expected tile dimensions.
    #[error("Unexpected tile dimensions {width}×{height} (expected {expected}×{expected})")]
    InvalidDimensions {
        width: u32,
        height: u32,
        expected: u32,
    },

    /// The provider does not serve the requested zoom level.
    #[error("Unsupported zoom level: {0}")]
    UnsupportedZoom(u8),
}

impl ProviderError {
    /// HTTP status code carried by this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            ProviderError::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// A decoded elevation tile: one value in meters per pixel, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct ElevationTile {
    pub width: u32,
    pub height: u32,
    pub data: Vec<f32>,
}

impl ElevationTile {
    /// Creates a tile where every pixel has the same elevation.
    pub fn filled(width: u32, height: u32, elevation: f32) -> Self {
        Self {
            width,
            height,
            data: vec![elevation; width as usize * height as usize],
        }
    }

    /// One row of elevations.
    pub fn row(&self, y: u32) -> &[f32] {
        let w = self.width as usize;
        let start = y as usize * w;
        &self.data[start..start + w]
    }
}

/// Source of decoded elevation tiles.
///
/// Implementations must be thread-safe; the stitcher polls many
/// `fetch_tile` futures concurrently against one shared source.
pub trait TileSource: Send + Sync {
    /// Fetches and decodes a single tile.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError` if the request fails, the server returns a
    /// non-success status, or the payload cannot be decoded.
    async fn fetch_tile(&self, tile: TileCoord) -> Result<ElevationTile, ProviderError>;

    /// Human-readable source name for logging.
    fn name(&self) -> &str;

    /// Whether this source serves tiles at `zoom`.
    ///
    /// Checked before any tile of a run is requested. Sources serve every
    /// zoom level unless they say otherwise.
    fn supports_zoom(&self, zoom: u8) -> bool {
        let _ = zoom;
        true
    }
}
