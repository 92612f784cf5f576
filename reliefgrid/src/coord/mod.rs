//! Web-mercator tile math.
//!
//! Maps latitude/longitude onto slippy-map tile indices and back, and
//! describes the rectangular block of tiles covering a bounding box.

mod types;

pub use types::{
    CoordError, GeoBoundingBox, TileCoord, TileGrid, TileGridIterator, MAX_LAT, MAX_LON,
    MAX_ZOOM, MIN_LAT, MIN_LON, MIN_ZOOM, TILE_SIZE,
};

use std::f64::consts::PI;

/// Number of tiles along one axis at `zoom`.
#[inline]
fn tiles_at_zoom(zoom: u8) -> f64 {
    2.0_f64.powi(zoom as i32)
}

/// Clamps a fractional tile index into `[0, 2^zoom - 1]`.
#[inline]
fn clamp_index(index: f64, zoom: u8) -> u32 {
    index.clamp(0.0, tiles_at_zoom(zoom) - 1.0) as u32
}

/// Converts a longitude to the column of the tile containing it.
///
/// `floor(((lon + 180) / 360) * 2^zoom)`, clamped so that `lon = 180` maps to
/// the last column.
#[inline]
pub fn lon_to_tile_x(lon: f64, zoom: u8) -> u32 {
    let x = ((lon + 180.0) / 360.0 * tiles_at_zoom(zoom)).floor();
    clamp_index(x, zoom)
}

/// Converts a latitude to the row of the tile containing it.
///
/// Latitudes beyond the mercator limit are clamped to it first.
#[inline]
pub fn lat_to_tile_y(lat: f64, zoom: u8) -> u32 {
    let lat_rad = lat.clamp(MIN_LAT, MAX_LAT).to_radians();
    let merc = (lat_rad.tan() + 1.0 / lat_rad.cos()).ln();
    let y = ((1.0 - merc / PI) / 2.0 * tiles_at_zoom(zoom)).floor();
    clamp_index(y, zoom)
}

/// Longitude of the western edge of tile column `x`.
#[inline]
pub fn tile_x_to_lon(x: u32, zoom: u8) -> f64 {
    x as f64 / tiles_at_zoom(zoom) * 360.0 - 180.0
}

/// Latitude of the northern edge of tile row `y` (inverse Gudermannian).
#[inline]
pub fn tile_y_to_lat(y: u32, zoom: u8) -> f64 {
    let n = tiles_at_zoom(zoom);
    (PI - 2.0 * PI * y as f64 / n).sinh().atan().to_degrees()
}

/// The tile containing (`lat`, `lon`) at `zoom`.
///
/// Unlike [`lon_to_tile_x`] and [`lat_to_tile_y`], out-of-range input is an
/// error rather than clamped.
///
/// # Arguments
///
/// * `lat` - Latitude in degrees, within the web mercator limit
/// * `lon` - Longitude in degrees, -180 to 180
/// * `zoom` - Zoom level, 0 to [`MAX_ZOOM`]
///
/// # Returns
///
/// The tile column and row at `zoom`, or a [`CoordError`] naming the first
/// argument out of range.
pub fn to_tile_coords(lat: f64, lon: f64, zoom: u8) -> Result<TileCoord, CoordError> {
    if !(MIN_LAT..=MAX_LAT).contains(&lat) {
        return Err(CoordError::InvalidLatitude(lat));
    }
    if !(MIN_LON..=MAX_LON).contains(&lon) {
        return Err(CoordError::InvalidLongitude(lon));
    }
    if zoom > MAX_ZOOM {
        return Err(CoordError::InvalidZoom(zoom));
    }

    Ok(TileCoord::new(
        zoom,
        lon_to_tile_x(lon, zoom),
        lat_to_tile_y(lat, zoom),
    ))
}
