//! Terrarium elevation tile provider.
//!
//! Terrarium tiles are 256×256 PNG images where each pixel packs an
//! elevation in meters into its color channels:
//!
//! ```text
//! elevation = R * 256 + G + B / 256 - 32768
//! ```
//!
//! # URL Pattern
//!
//! `{base}/{z}/{x}/{y}.png`
//!
//! The default base is the public AWS Open Data bucket, which needs no
//! authentication and serves zoom levels 0 through 15. Other endpoints are
//! assumed to serve every zoom level unless narrowed with
//! [`TerrariumTileSource::with_zoom_range`].

use image::RgbImage;
use tracing::debug;

use crate::coord::{TileCoord, MAX_ZOOM, MIN_ZOOM, TILE_SIZE};
use crate::provider::{AsyncHttpClient, ElevationTile, ProviderError, TileSource};

/// Base URL of the public Terrarium tile set.
pub const DEFAULT_TERRARIUM_URL: &str = "https://s3.amazonaws.com/elevation-tiles-prod/terrarium";

/// Offset subtracted from the packed channel value.
const TERRARIUM_OFFSET: f32 = 32768.0;

/// Maximum zoom level served by the public Terrarium bucket.
pub const DEFAULT_TERRARIUM_MAX_ZOOM: u8 = 15;

/// Decodes one Terrarium pixel into meters.
#[inline]
pub fn decode_elevation(r: u8, g: u8, b: u8) -> f32 {
    r as f32 * 256.0 + g as f32 + b as f32 / 256.0 - TERRARIUM_OFFSET
}

/// Encodes an elevation in meters into a Terrarium pixel.
///
/// Values outside the representable range saturate.
pub fn encode_elevation(elevation: f32) -> [u8; 3] {
    let packed = (elevation + TERRARIUM_OFFSET).clamp(0.0, 65535.996);
    let whole = packed.floor();
    let r = (whole / 256.0).floor();
    let g = whole - r * 256.0;
    let b = ((packed - whole) * 256.0).floor();
    [r as u8, g as u8, b as u8]
}

/// Decodes an encoded Terrarium image (PNG bytes) into an elevation tile.
///
/// # Errors
///
/// `ProviderError::DecodeError` if the bytes are not a readable image,
/// `ProviderError::InvalidDimensions` if it is not `TILE_SIZE` square.
pub fn decode_terrarium(bytes: &[u8]) -> Result<ElevationTile, ProviderError> {
    let rgb: RgbImage = image::load_from_memory(bytes)
        .map_err(|e| ProviderError::DecodeError(e.to_string()))?
        .to_rgb8();

    let (width, height) = rgb.dimensions();
    if width != TILE_SIZE || height != TILE_SIZE {
        return Err(ProviderError::InvalidDimensions {
            width,
            height,
            expected: TILE_SIZE,
        });
    }

    let data = rgb
        .pixels()
        .map(|p| decode_elevation(p[0], p[1], p[2]))
        .collect();

    Ok(ElevationTile {
        width,
        height,
        data,
    })
}

/// Terrarium tile source backed by an async HTTP client.
///
/// # Example
///
/// ```ignore
/// use reliefgrid::provider::{ReqwestClient, TerrariumTileSource};
///
/// let client = ReqwestClient::new()?;
/// let source = TerrariumTileSource::new(client);
/// let tile = source.fetch_tile(TileCoord::new(12, 2126, 1459)).await?;
/// ```
pub struct TerrariumTileSource<C: AsyncHttpClient> {
    http_client: C,
    base_url: String,
    min_zoom: u8,
    max_zoom: u8,
}

impl<C: AsyncHttpClient> TerrariumTileSource<C> {
    /// Creates a source against the public Terrarium bucket.
    pub fn new(http_client: C) -> Self {
        Self::with_base_url(http_client, DEFAULT_TERRARIUM_URL)
    }

    /// Creates a source against a custom tile endpoint.
    ///
    /// A trailing slash on `base_url` is ignored. The public bucket keeps
    /// its 0–15 zoom range; any other endpoint starts with the full
    /// 0–20 range.
    pub fn with_base_url(http_client: C, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let max_zoom = if base_url == DEFAULT_TERRARIUM_URL {
            DEFAULT_TERRARIUM_MAX_ZOOM
        } else {
            MAX_ZOOM
        };
        Self {
            http_client,
            base_url,
            min_zoom: MIN_ZOOM,
            max_zoom,
        }
    }

    /// Restricts the zoom levels requested from this endpoint.
    ///
    /// Bounds are clamped to 0–20; `min_zoom > max_zoom` serves nothing.
    pub fn with_zoom_range(mut self, min_zoom: u8, max_zoom: u8) -> Self {
        self.min_zoom = min_zoom.min(MAX_ZOOM);
        self.max_zoom = max_zoom.min(MAX_ZOOM);
        self
    }

    /// Inclusive zoom range served by the endpoint.
    pub fn zoom_range(&self) -> (u8, u8) {
        (self.min_zoom, self.max_zoom)
    }

    /// The endpoint tiles are requested from.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Builds the tile URL: `{base}/{z}/{x}/{y}.png`.
    pub fn tile_url(&self, tile: TileCoord) -> String {
        format!("{}/{}/{}/{}.png", self.base_url, tile.zoom, tile.x, tile.y)
    }
}

impl<C: AsyncHttpClient> TileSource for TerrariumTileSource<C> {
    async fn fetch_tile(&self, tile: TileCoord) -> Result<ElevationTile, ProviderError> {
        if !self.supports_zoom(tile.zoom) {
            return Err(ProviderError::UnsupportedZoom(tile.zoom));
        }

        let url = self.tile_url(tile);
        debug!(tile = %tile, url = %url, "Fetching terrarium tile");

        let bytes = self.http_client.get(&url).await?;
        decode_terrarium(&bytes)
    }

    fn name(&self) -> &str {
        "Terrarium"
    }

    fn supports_zoom(&self, zoom: u8) -> bool {
        (self.min_zoom..=self.max_zoom).contains(&zoom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{StaticMockClient, RoutingMockClient};
    use image::{ImageFormat, Rgb};
    use std::io::Cursor;

    fn encode_png(img: &RgbImage) -> Vec<u8> {
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    fn flat_tile_png(elevation: f32) -> Vec<u8> {
        let img = RgbImage::from_pixel(TILE_SIZE, TILE_SIZE, Rgb(encode_elevation(elevation)));
        encode_png(&img)
    }

    #[test]
    fn test_decode_sea_level() {
        // 128 * 256 = 32768
        assert_eq!(decode_elevation(128, 0, 0), 0.0);
    }

    #[test]
    fn test_decode_known_values() {
        assert_eq!(decode_elevation(0, 0, 0), -32768.0);
        assert_eq!(decode_elevation(146, 248, 128), 4856.5);
        assert_eq!(decode_elevation(127, 255, 0), -1.0);
    }

    #[test]
    fn test_encode_matches_decode() {
        for elevation in [-410.25_f32, 0.0, 1234.5, 4808.75] {
            let [r, g, b] = encode_elevation(elevation);
            assert_eq!(decode_elevation(r, g, b), elevation);
        }
    }

    #[test]
    fn test_decode_terrarium_png() {
        let mut img = RgbImage::from_pixel(TILE_SIZE, TILE_SIZE, Rgb(encode_elevation(100.0)));
        img.put_pixel(3, 7, Rgb(encode_elevation(2500.0)));

        let tile = decode_terrarium(&encode_png(&img)).unwrap();
        assert_eq!(tile.width, TILE_SIZE);
        assert_eq!(tile.height, TILE_SIZE);
        assert_eq!(tile.data[0], 100.0);
        assert_eq!(tile.row(7)[3], 2500.0);
    }

    #[test]
    fn test_decode_rejects_wrong_dimensions() {
        let img = RgbImage::from_pixel(128, 256, Rgb([128, 0, 0]));
        let result = decode_terrarium(&encode_png(&img));
        assert!(matches!(
            result,
            Err(ProviderError::InvalidDimensions {
                width: 128,
                height: 256,
                ..
            })
        ));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let result = decode_terrarium(&[0xDE, 0xAD, 0xBE, 0xEF]);
        assert!(matches!(result, Err(ProviderError::DecodeError(_))));
    }

    #[test]
    fn test_url_construction() {
        let source = TerrariumTileSource::new(StaticMockClient {
            response: Ok(vec![]),
        });
        assert_eq!(
            source.tile_url(TileCoord::new(12, 2126, 1459)),
            "https://s3.amazonaws.com/elevation-tiles-prod/terrarium/12/2126/1459.png"
        );
    }

    #[test]
    fn test_custom_base_url_trailing_slash() {
        let source = TerrariumTileSource::with_base_url(
            StaticMockClient {
                response: Ok(vec![]),
            },
            "http://localhost:8080/tiles/",
        );
        assert_eq!(
            source.tile_url(TileCoord::new(3, 1, 2)),
            "http://localhost:8080/tiles/3/1/2.png"
        );
    }

    #[tokio::test]
    async fn test_fetch_tile_success() {
        let source = TerrariumTileSource::new(StaticMockClient {
            response: Ok(flat_tile_png(812.0)),
        });

        let tile = source.fetch_tile(TileCoord::new(10, 1, 1)).await.unwrap();
        assert!(tile.data.iter().all(|&v| v == 812.0));
    }

    #[tokio::test]
    async fn test_fetch_tile_unsupported_zoom() {
        let source = TerrariumTileSource::new(StaticMockClient {
            response: Ok(flat_tile_png(0.0)),
        });

        let result = source.fetch_tile(TileCoord::new(16, 0, 0)).await;
        assert_eq!(result, Err(ProviderError::UnsupportedZoom(16)));
    }

    #[tokio::test]
    async fn test_custom_endpoint_serves_high_zoom() {
        let client = RoutingMockClient::default()
            .with_route("http://dem.local/terrarium/18/5/9.png", flat_tile_png(42.0));
        let source = TerrariumTileSource::with_base_url(client, "http://dem.local/terrarium");

        assert_eq!(source.zoom_range(), (0, 20));
        let tile = source.fetch_tile(TileCoord::new(18, 5, 9)).await.unwrap();
        assert!(tile.data.iter().all(|&v| v == 42.0));
        assert_eq!(source.http_client.request_count(), 1);
    }

    #[tokio::test]
    async fn test_zoom_range_limits_requests() {
        let client = RoutingMockClient::default();
        let source = TerrariumTileSource::with_base_url(client, "http://dem.local/terrarium")
            .with_zoom_range(2, 16);

        assert!(!source.supports_zoom(1));
        assert!(source.supports_zoom(16));
        let result = source.fetch_tile(TileCoord::new(17, 0, 0)).await;
        assert_eq!(result, Err(ProviderError::UnsupportedZoom(17)));
        assert_eq!(source.http_client.request_count(), 0);
    }

    #[test]
    fn test_public_bucket_keeps_default_range() {
        let explicit = TerrariumTileSource::with_base_url(
            RoutingMockClient::default(),
            format!("{}/", DEFAULT_TERRARIUM_URL),
        );
        assert_eq!(explicit.zoom_range(), (0, DEFAULT_TERRARIUM_MAX_ZOOM));
        assert!(!explicit.supports_zoom(16));
    }

    #[tokio::test]
    async fn test_fetch_tile_not_found() {
        let client = RoutingMockClient::default();
        let source = TerrariumTileSource::with_base_url(client, "http://tiles");

        let err = source.fetch_tile(TileCoord::new(4, 2, 3)).await.unwrap_err();
        assert_eq!(err.status(), Some(404));
        assert_eq!(err.to_string(), "HTTP 404 from http://tiles/4/2/3.png");
    }
}
