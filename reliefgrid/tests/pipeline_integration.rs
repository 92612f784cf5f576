//! Integration tests for the heightmap pipeline.
//!
//! These tests drive the full flow with in-memory tile sources:
//! - request → bounding box → concurrent stitch → crop → heightmap
//! - failure and cancellation behavior
//! - zoom and raster-size limits enforced before any fetch
//! - progress event ordering
//! - Terrarium decoding through a fake HTTP client
//!
//! Run with: `cargo test --test pipeline_integration`
//! The live-network test is ignored by default; run it with `--ignored`.

use std::collections::{HashMap, HashSet};
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use image::{ImageFormat, Rgb, RgbImage};
use tokio_util::sync::CancellationToken;

use reliefgrid::coord::{tile_x_to_lon, tile_y_to_lat, TileCoord, TileGrid, TILE_SIZE};
use reliefgrid::orchestrator::{StitchError, DEFAULT_MAX_RASTER_PIXELS};
use reliefgrid::pipeline::{generate_heightmap, HeightmapPipeline, HeightmapRequest, PipelineError};
use reliefgrid::progress::{progress_channel, PipelineProgress, ProgressSender};
use reliefgrid::provider::{
    encode_elevation, AsyncHttpClient, ElevationTile, ProviderError, ReqwestClient,
    TerrariumTileSource, TileSource,
};
use reliefgrid::raster::CropWindow;

// ============================================================================
// Helpers
// ============================================================================

/// Elevation as a function of the global pixel position at a zoom level.
type Terrain = fn(u64, u64) -> f32;

/// In-memory tile source generating tiles from a terrain function.
struct MemorySource {
    terrain: Terrain,
    failing: HashSet<TileCoord>,
    /// Tiles with this x coordinate are delayed, to shuffle completion order.
    slow_column: Option<u32>,
    max_zoom: Option<u8>,
    calls: AtomicUsize,
    requested: Mutex<Vec<TileCoord>>,
}

impl MemorySource {
    fn new(terrain: Terrain) -> Self {
        Self {
            terrain,
            failing: HashSet::new(),
            slow_column: None,
            max_zoom: None,
            calls: AtomicUsize::new(0),
            requested: Mutex::new(Vec::new()),
        }
    }

    fn failing(mut self, tile: TileCoord) -> Self {
        self.failing.insert(tile);
        self
    }

    fn slow_column(mut self, x: u32) -> Self {
        self.slow_column = Some(x);
        self
    }

    fn max_zoom(mut self, zoom: u8) -> Self {
        self.max_zoom = Some(zoom);
        self
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl TileSource for MemorySource {
    async fn fetch_tile(&self, tile: TileCoord) -> Result<ElevationTile, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requested.lock().unwrap().push(tile);

        if self.slow_column == Some(tile.x) {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        if self.failing.contains(&tile) {
            return Err(ProviderError::HttpStatus {
                status: 404,
                url: format!("memory://{}", tile),
            });
        }

        let origin_x = tile.x as u64 * TILE_SIZE as u64;
        let origin_y = tile.y as u64 * TILE_SIZE as u64;
        let mut data = Vec::with_capacity((TILE_SIZE * TILE_SIZE) as usize);
        for py in 0..TILE_SIZE as u64 {
            for px in 0..TILE_SIZE as u64 {
                data.push((self.terrain)(origin_x + px, origin_y + py));
            }
        }
        Ok(ElevationTile {
            width: TILE_SIZE,
            height: TILE_SIZE,
            data,
        })
    }

    fn name(&self) -> &str {
        "memory"
    }

    fn supports_zoom(&self, zoom: u8) -> bool {
        self.max_zoom.map_or(true, |max| zoom <= max)
    }
}

fn flat(_: u64, _: u64) -> f32 {
    1000.0
}

/// Higher to the north: elevation falls by 0.5 m per pixel row.
fn north_slope(_: u64, y: u64) -> f32 {
    (1_000_000.0 - y as f64 * 0.5) as f32
}

/// Diagonal ramp, distinct in both directions.
fn ramp(x: u64, y: u64) -> f32 {
    ((x % 4096) as f64 * 0.25 + (y % 4096) as f64 * 0.75) as f32
}

/// Center of a tile, in (lat, lon).
fn tile_center(tile: TileCoord) -> (f64, f64) {
    let bounds = tile.bounds();
    (
        (bounds.north + bounds.south) / 2.0,
        (bounds.west + bounds.east) / 2.0,
    )
}

/// Corner shared by tiles (x, y), (x+1, y), (x, y+1) and (x+1, y+1).
fn tile_corner(zoom: u8, x: u32, y: u32) -> (f64, f64) {
    (tile_y_to_lat(y + 1, zoom), tile_x_to_lon(x + 1, zoom))
}

fn drain(rx: &mut tokio::sync::mpsc::UnboundedReceiver<PipelineProgress>) -> Vec<PipelineProgress> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

// ============================================================================
// Pipeline behavior
// ============================================================================

/// Flat terrain normalizes to a uniform zero image and a zero-width range.
#[tokio::test]
async fn test_flat_terrain_yields_uniform_zero() {
    let request = HeightmapRequest::new(45.8326, 6.8652, 20.0, 64, 12);
    let heightmap = generate_heightmap(
        MemorySource::new(flat),
        &request,
        ProgressSender::disabled(),
        &CancellationToken::new(),
    )
    .await
    .unwrap();

    assert_eq!(heightmap.elev_min, 1000.0);
    assert_eq!(heightmap.elev_max, 1000.0);
    assert!(heightmap.pixels.iter().all(|&p| p == 0));
}

/// An area inside one tile needs one fetch, and the crop stays inside it.
#[tokio::test]
async fn test_area_inside_single_tile() {
    let tile = TileCoord::new(12, 2126, 1459);
    let (lat, lon) = tile_center(tile);
    let request = HeightmapRequest::new(lat, lon, 1.0, 32, 12);

    let source = MemorySource::new(ramp);
    let pipeline = HeightmapPipeline::new(source);
    let heightmap = pipeline
        .generate(&request, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(pipeline.source().calls(), 1);
    assert_eq!(*pipeline.source().requested.lock().unwrap(), vec![tile]);
    assert_eq!((heightmap.width, heightmap.height), (32, 32));

    let bbox = request.bounding_box().unwrap();
    let grid = TileGrid::covering(&bbox, 12);
    assert_eq!(grid.tile_count(), 1);

    let window = CropWindow::locate(&grid.bounds(), &bbox, TILE_SIZE, TILE_SIZE);
    assert!(window.left < window.right && window.right <= TILE_SIZE);
    assert!(window.top < window.bottom && window.bottom <= TILE_SIZE);
    assert!(window.left > 0 && window.top > 0);
}

/// One failing tile in a 2×2 grid fails the whole run and names the tile.
#[tokio::test]
async fn test_missing_tile_fails_whole_run() {
    let (lat, lon) = tile_corner(12, 2126, 1459);
    let request = HeightmapRequest::new(lat, lon, 2.0, 64, 12);
    let missing = TileCoord::new(12, 2127, 1460);

    let bbox = request.bounding_box().unwrap();
    assert_eq!(TileGrid::covering(&bbox, 12).tile_count(), 4);

    let err = generate_heightmap(
        MemorySource::new(ramp).failing(missing),
        &request,
        ProgressSender::disabled(),
        &CancellationToken::new(),
    )
    .await
    .unwrap_err();

    assert_eq!(err.tile(), Some(missing));
    assert_eq!(err.status(), Some(404));
    match err {
        PipelineError::Stitch(StitchError::TileFetch { tile, .. }) => assert_eq!(tile, missing),
        other => panic!("Expected TileFetch, got {:?}", other),
    }
}

/// North is up: the top image row is the high northern edge, and the text
/// grid lists the southern row first.
#[tokio::test]
async fn test_orientation_north_up() {
    let request = HeightmapRequest::new(45.8326, 6.8652, 10.0, 16, 11);
    let heightmap = generate_heightmap(
        MemorySource::new(north_slope),
        &request,
        ProgressSender::disabled(),
        &CancellationToken::new(),
    )
    .await
    .unwrap();

    let rows: Vec<&[u8]> = heightmap.rows().collect();
    let top = rows.first().unwrap();
    let bottom = rows.last().unwrap();
    assert!(top[8] > 200, "top row {:?}", top);
    assert!(bottom[8] < 55, "bottom row {:?}", bottom);

    let grid = heightmap.to_text_grid();
    let first_line: Vec<u8> = grid
        .lines()
        .next()
        .unwrap()
        .split_whitespace()
        .map(|v| v.parse().unwrap())
        .collect();
    assert_eq!(first_line.len(), 16);
    assert_eq!(first_line.as_slice(), *bottom);
}

/// Completion order does not affect the result.
#[tokio::test]
async fn test_output_is_deterministic() {
    let (lat, lon) = tile_corner(12, 2126, 1459);
    let request = HeightmapRequest::new(lat, lon, 3.0, 48, 12);

    let in_order = generate_heightmap(
        MemorySource::new(ramp),
        &request,
        ProgressSender::disabled(),
        &CancellationToken::new(),
    )
    .await
    .unwrap();
    let shuffled = generate_heightmap(
        MemorySource::new(ramp).slow_column(2126),
        &request,
        ProgressSender::disabled(),
        &CancellationToken::new(),
    )
    .await
    .unwrap();

    assert_eq!(in_order, shuffled);
    assert_eq!(in_order.pixels.len(), 48 * 48);
}

#[tokio::test]
async fn test_invalid_request_fetches_nothing() {
    let pipeline = HeightmapPipeline::new(MemorySource::new(flat));
    let request = HeightmapRequest::new(45.0, 7.0, -1.0, 64, 12);

    let err = pipeline
        .generate(&request, &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::InvalidParameters(_)));
    assert_eq!(pipeline.source().calls(), 0);
}

#[tokio::test]
async fn test_area_too_small_for_zoom_rejected() {
    let request = HeightmapRequest::new(45.8326, 6.8652, 0.001, 64, 2);
    let err = generate_heightmap(
        MemorySource::new(flat),
        &request,
        ProgressSender::disabled(),
        &CancellationToken::new(),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, PipelineError::Crop(_)));
}

#[tokio::test]
async fn test_cancelled_run_reports_cancellation() {
    let token = CancellationToken::new();
    token.cancel();

    let request = HeightmapRequest::new(45.8326, 6.8652, 20.0, 64, 12);
    let err = generate_heightmap(
        MemorySource::new(flat),
        &request,
        ProgressSender::disabled(),
        &token,
    )
    .await
    .unwrap_err();

    assert!(err.is_cancelled());
}

// ============================================================================
// Limits checked before fetching
// ============================================================================

/// A zoom the source cannot serve fails without a single fetch.
#[tokio::test]
async fn test_zoom_above_source_range_fetches_nothing() {
    let (progress, mut rx) = progress_channel();
    let pipeline =
        HeightmapPipeline::new(MemorySource::new(flat).max_zoom(15)).with_progress(progress);
    let request = HeightmapRequest::new(45.8326, 6.8652, 2.0, 64, 16);

    let err = pipeline
        .generate(&request, &CancellationToken::new())
        .await
        .unwrap_err();

    match err {
        PipelineError::Stitch(StitchError::UnsupportedZoom { zoom, provider }) => {
            assert_eq!(zoom, 16);
            assert_eq!(provider, "memory");
        }
        other => panic!("Expected UnsupportedZoom, got {:?}", other),
    }
    assert_eq!(pipeline.source().calls(), 0);
    assert!(drain(&mut rx).is_empty());
}

/// A large area at a high zoom is refused before the raster is allocated.
#[tokio::test]
async fn test_oversized_raster_fetches_nothing() {
    let pipeline = HeightmapPipeline::new(MemorySource::new(flat));
    let request = HeightmapRequest::new(45.8326, 6.8652, 20.0, 200, 18);

    let err = pipeline
        .generate(&request, &CancellationToken::new())
        .await
        .unwrap_err();

    match err {
        PipelineError::Stitch(StitchError::RasterTooLarge {
            width,
            height,
            max_pixels,
        }) => {
            assert_eq!(max_pixels, DEFAULT_MAX_RASTER_PIXELS);
            assert!(width.saturating_mul(height) > max_pixels);
            assert_eq!(width % TILE_SIZE as u64, 0);
        }
        other => panic!("Expected RasterTooLarge, got {:?}", other),
    }
    assert_eq!(pipeline.source().calls(), 0);
}

/// The public Terrarium bucket stops at zoom 15; nothing is requested above it.
#[tokio::test]
async fn test_public_terrarium_rejects_zoom_16() {
    let server = FakeTerrariumServer::new();
    let requests = server.request_counter();
    let request = HeightmapRequest::new(45.8326, 6.8652, 1.0, 64, 16);

    let err = generate_heightmap(
        TerrariumTileSource::new(server),
        &request,
        ProgressSender::disabled(),
        &CancellationToken::new(),
    )
    .await
    .unwrap_err();

    assert!(matches!(
        err,
        PipelineError::Stitch(StitchError::UnsupportedZoom { zoom: 16, .. })
    ));
    assert_eq!(requests.load(Ordering::SeqCst), 0);
}

/// Events arrive as: started, one per tile, completed, resize, range.
#[tokio::test]
async fn test_progress_event_order() {
    let (lat, lon) = tile_corner(12, 2126, 1459);
    let request = HeightmapRequest::new(lat, lon, 2.0, 20, 12);
    let (progress, mut rx) = progress_channel();

    let heightmap = generate_heightmap(
        MemorySource::new(ramp),
        &request,
        progress,
        &CancellationToken::new(),
    )
    .await
    .unwrap();

    let events = drain(&mut rx);
    assert_eq!(events.len(), 8);

    assert!(matches!(
        events[0],
        PipelineProgress::TileFetchStarted { tiles: 4, zoom: 12 }
    ));
    for (i, event) in events[1..5].iter().enumerate() {
        match event {
            PipelineProgress::TileFetched {
                completed, total, ..
            } => {
                assert_eq!(*completed, i + 1);
                assert_eq!(*total, 4);
            }
            other => panic!("Expected TileFetched, got {:?}", other),
        }
    }
    assert!(matches!(
        events[5],
        PipelineProgress::TileFetchCompleted { tiles: 4, .. }
    ));
    assert!(matches!(
        events[6],
        PipelineProgress::ResizeStarted { to: 20, .. }
    ));
    match events[7] {
        PipelineProgress::ElevationRange { min, max } => {
            assert_eq!(min, heightmap.elev_min);
            assert_eq!(max, heightmap.elev_max);
        }
        ref other => panic!("Expected ElevationRange, got {:?}", other),
    }
}

// ============================================================================
// Terrarium over a fake HTTP client
// ============================================================================

/// Serves Terrarium PNGs of a constant elevation per tile URL.
struct FakeTerrariumServer {
    tiles: HashMap<String, Vec<u8>>,
    requests: Arc<AtomicUsize>,
}

impl FakeTerrariumServer {
    fn new() -> Self {
        Self {
            tiles: HashMap::new(),
            requests: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Shared count of GETs, readable after the server moves into a source.
    fn request_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.requests)
    }

    fn with_tile(mut self, base: &str, tile: TileCoord, elevation: f32) -> Self {
        let [r, g, b] = encode_elevation(elevation);
        let image = RgbImage::from_pixel(TILE_SIZE, TILE_SIZE, Rgb([r, g, b]));
        let mut bytes = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        self.tiles.insert(
            format!("{}/{}/{}/{}.png", base, tile.zoom, tile.x, tile.y),
            bytes,
        );
        self
    }
}

impl AsyncHttpClient for FakeTerrariumServer {
    async fn get(&self, url: &str) -> Result<Vec<u8>, ProviderError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        self.tiles
            .get(url)
            .cloned()
            .ok_or_else(|| ProviderError::HttpStatus {
                status: 404,
                url: url.to_string(),
            })
    }
}

#[tokio::test]
async fn test_terrarium_tiles_decode_through_pipeline() {
    let base = "http://tiles.test/terrarium";
    let (lat, lon) = tile_corner(10, 531, 364);
    let request = HeightmapRequest::new(lat, lon, 4.0, 8, 10);

    let server = FakeTerrariumServer::new()
        .with_tile(base, TileCoord::new(10, 531, 364), 100.0)
        .with_tile(base, TileCoord::new(10, 532, 364), 200.0)
        .with_tile(base, TileCoord::new(10, 531, 365), 300.0)
        .with_tile(base, TileCoord::new(10, 532, 365), 400.0);
    let source = TerrariumTileSource::with_base_url(server, base);

    let heightmap = generate_heightmap(
        source,
        &request,
        ProgressSender::disabled(),
        &CancellationToken::new(),
    )
    .await
    .unwrap();

    assert_eq!(heightmap.elev_min, 100.0);
    assert_eq!(heightmap.elev_max, 400.0);
    // Northwest quadrant is the lowest, southeast the highest.
    assert_eq!(heightmap.get(0, 0), 0);
    assert_eq!(heightmap.get(7, 7), 255);
}

// ============================================================================
// Live network
// ============================================================================

/// Mont Blanc summit area against the public tile set.
#[tokio::test]
#[ignore = "requires network access"]
async fn test_mont_blanc_live() {
    let source = TerrariumTileSource::new(ReqwestClient::new().unwrap());
    let request = HeightmapRequest::new(45.8326, 6.8652, 20.0, 200, 12);

    let heightmap = generate_heightmap(
        source,
        &request,
        ProgressSender::disabled(),
        &CancellationToken::new(),
    )
    .await
    .unwrap();

    assert_eq!((heightmap.width, heightmap.height), (200, 200));
    assert!(heightmap.elev_max > 4500.0, "max {}", heightmap.elev_max);
    assert!(heightmap.elev_min < 1500.0, "min {}", heightmap.elev_min);
}
