//! Coordinate types and errors.

use thiserror::Error;

/// Minimum latitude addressable by Web Mercator tiles.
pub const MIN_LAT: f64 = -85.05112878;

/// Maximum latitude addressable by Web Mercator tiles.
pub const MAX_LAT: f64 = 85.05112878;

/// Minimum longitude.
pub const MIN_LON: f64 = -180.0;

/// Maximum longitude.
pub const MAX_LON: f64 = 180.0;

/// Minimum supported zoom level.
pub const MIN_ZOOM: u8 = 0;

/// Maximum supported zoom level.
pub const MAX_ZOOM: u8 = 20;

/// Edge length of a slippy-map tile in pixels.
pub const TILE_SIZE: u32 = 256;

/// Errors that can occur during coordinate conversion.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoordError {
    /// Latitude outside the Web Mercator range.
    #[error("Invalid latitude: {0} (must be between {MIN_LAT} and {MAX_LAT})")]
    InvalidLatitude(f64),

    /// Longitude outside [-180, 180].
    #[error("Invalid longitude: {0} (must be between -180 and 180)")]
    InvalidLongitude(f64),

    /// Zoom level beyond `MAX_ZOOM`.
    #[error("Invalid zoom level: {0} (must be at most {MAX_ZOOM})")]
    InvalidZoom(u8),

    /// Bounding box edges are not ordered or not finite.
    #[error("Invalid bounding box: west={west} east={east} south={south} north={north}")]
    InvalidBoundingBox {
        west: f64,
        east: f64,
        south: f64,
        north: f64,
    },
}

/// Tile coordinates in the Web Mercator slippy-map scheme.
///
/// `x` increases eastward from 180°W, `y` increases southward from the
/// northern mercator limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileCoord {
    /// Zoom level
    pub zoom: u8,
    /// Tile column
    pub x: u32,
    /// Tile row
    pub y: u32,
}

impl TileCoord {
    /// Creates a tile coordinate.
    pub fn new(zoom: u8, x: u32, y: u32) -> Self {
        Self { zoom, x, y }
    }

    /// Whether `x` and `y` are inside the `2^zoom` grid.
    pub fn is_valid(&self) -> bool {
        let n = 1u64 << self.zoom;
        (self.x as u64) < n && (self.y as u64) < n
    }

    /// Geographic bounds covered by this tile.
    pub fn bounds(&self) -> GeoBoundingBox {
        GeoBoundingBox {
            west: super::tile_x_to_lon(self.x, self.zoom),
            east: super::tile_x_to_lon(self.x + 1, self.zoom),
            south: super::tile_y_to_lat(self.y + 1, self.zoom),
            north: super::tile_y_to_lat(self.y, self.zoom),
        }
    }
}

impl std::fmt::Display for TileCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.zoom, self.x, self.y)
    }
}

/// Rectangular geographic region in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoBoundingBox {
    pub west: f64,
    pub east: f64,
    pub south: f64,
    pub north: f64,
}

impl GeoBoundingBox {
    /// Creates a bounding box, requiring finite edges with `west < east` and
    /// `south < north`.
    pub fn new(west: f64, east: f64, south: f64, north: f64) -> Result<Self, CoordError> {
        let finite = [west, east, south, north].iter().all(|v| v.is_finite());
        if !finite || west >= east || south >= north {
            return Err(CoordError::InvalidBoundingBox {
                west,
                east,
                south,
                north,
            });
        }
        Ok(Self {
            west,
            east,
            south,
            north,
        })
    }

    /// Width in degrees of longitude.
    pub fn width(&self) -> f64 {
        self.east - self.west
    }

    /// Height in degrees of latitude.
    pub fn height(&self) -> f64 {
        self.north - self.south
    }

    /// Whether the point lies inside the box (edges inclusive).
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        (self.west..=self.east).contains(&lon) && (self.south..=self.north).contains(&lat)
    }

    /// Whether `other` lies entirely inside this box (edges inclusive).
    pub fn contains_box(&self, other: &GeoBoundingBox) -> bool {
        self.west <= other.west
            && self.east >= other.east
            && self.south <= other.south
            && self.north >= other.north
    }
}

/// The rectangular block of tiles covering a bounding box at one zoom level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileGrid {
    /// North-west tile of the grid
    pub origin: TileCoord,
    /// Number of tile columns
    pub tiles_wide: u32,
    /// Number of tile rows
    pub tiles_high: u32,
}

impl TileGrid {
    /// Computes the grid of tiles intersecting `bbox` at `zoom`.
    pub fn covering(bbox: &GeoBoundingBox, zoom: u8) -> Self {
        let x_min = super::lon_to_tile_x(bbox.west, zoom);
        let x_max = super::lon_to_tile_x(bbox.east, zoom);
        let y_min = super::lat_to_tile_y(bbox.north, zoom);
        let y_max = super::lat_to_tile_y(bbox.south, zoom);

        Self {
            origin: TileCoord::new(zoom, x_min, y_min),
            tiles_wide: x_max - x_min + 1,
            tiles_high: y_max - y_min + 1,
        }
    }

    /// Zoom level of every tile in the grid.
    pub fn zoom(&self) -> u8 {
        self.origin.zoom
    }

    /// Number of tiles in the grid.
    pub fn tile_count(&self) -> usize {
        self.tiles_wide as usize * self.tiles_high as usize
    }

    /// Pixel dimensions of the stitched raster for this grid.
    pub fn pixel_size(&self) -> (u32, u32) {
        (self.tiles_wide * TILE_SIZE, self.tiles_high * TILE_SIZE)
    }

    /// Geographic extent spanned by the outer edges of the grid.
    pub fn bounds(&self) -> GeoBoundingBox {
        let zoom = self.zoom();
        let x_end = self.origin.x + self.tiles_wide;
        let y_end = self.origin.y + self.tiles_high;
        GeoBoundingBox {
            west: super::tile_x_to_lon(self.origin.x, zoom),
            east: super::tile_x_to_lon(x_end, zoom),
            south: super::tile_y_to_lat(y_end, zoom),
            north: super::tile_y_to_lat(self.origin.y, zoom),
        }
    }

    /// Returns an iterator over the grid's tiles in row-major order.
    pub fn tiles(&self) -> TileGridIterator {
        TileGridIterator {
            grid: *self,
            current: 0,
        }
    }
}

/// Iterator over the tiles of a [`TileGrid`].
///
/// Yields tiles in row-major order, so the n-th item is the tile whose
/// raster region is the n-th region returned by
/// [`RasterBuffer::tile_regions_mut`](crate::raster::RasterBuffer::tile_regions_mut).
#[derive(Debug, Clone)]
pub struct TileGridIterator {
    grid: TileGrid,
    current: usize,
}

impl Iterator for TileGridIterator {
    type Item = TileCoord;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current >= self.grid.tile_count() {
            return None;
        }

        let wide = self.grid.tiles_wide as usize;
        let col = (self.current % wide) as u32;
        let row = (self.current / wide) as u32;
        self.current += 1;

        Some(TileCoord::new(
            self.grid.zoom(),
            self.grid.origin.x + col,
            self.grid.origin.y + row,
        ))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.grid.tile_count().saturating_sub(self.current);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for TileGridIterator {}
