//! Elevation tile provider abstraction
//!
//! This module provides the [`TileSource`] trait for fetching decoded
//! elevation tiles, the HTTP client seam used by network-backed sources,
//! and the Terrarium implementation.
//!
//! ```ignore
//! use reliefgrid::provider::{ReqwestClient, TerrariumTileSource};
//!
//! let http_client = ReqwestClient::with_timeout(30)?;
//! let source = TerrariumTileSource::with_base_url(http_client, base_url);
//! ```

mod http;
mod terrarium;
mod types;

pub use http::{AsyncHttpClient, ReqwestClient, DEFAULT_TIMEOUT_SECS};
pub use terrarium::{
    decode_elevation, decode_terrarium, encode_elevation, TerrariumTileSource,
    DEFAULT_TERRARIUM_MAX_ZOOM, DEFAULT_TERRARIUM_URL,
};
pub use types::{ElevationTile, ProviderError, TileSource};

#[cfg(test)]
pub use http::tests::{StaticMockClient, RoutingMockClient};
