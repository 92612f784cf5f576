//! Heightmap requests and the area they cover.

use crate::coord::{GeoBoundingBox, MAX_LAT, MAX_LON, MAX_ZOOM, MIN_LAT, MIN_LON, MIN_ZOOM};

use super::PipelineError;

/// Kilometers per degree of latitude (and of longitude at the equator).
pub const KM_PER_DEGREE: f64 = 111.32;

/// What to generate: a square area around a center point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeightmapRequest {
    /// Center latitude in degrees
    pub center_lat: f64,
    /// Center longitude in degrees
    pub center_lon: f64,
    /// Side length of the square area in kilometers
    pub area_km: f64,
    /// Output width and height in pixels
    pub output_px: u32,
    /// Tile zoom level
    pub zoom: u8,
}

impl HeightmapRequest {
    pub fn new(center_lat: f64, center_lon: f64, area_km: f64, output_px: u32, zoom: u8) -> Self {
        Self {
            center_lat,
            center_lon,
            area_km,
            output_px,
            zoom,
        }
    }

    /// Checks that every parameter is finite and in range.
    pub fn validate(&self) -> Result<(), PipelineError> {
        let invalid = |msg: String| Err(PipelineError::InvalidParameters(msg));

        if !self.center_lat.is_finite() || !(MIN_LAT..=MAX_LAT).contains(&self.center_lat) {
            return invalid(format!(
                "center latitude {} outside [{}, {}]",
                self.center_lat, MIN_LAT, MAX_LAT
            ));
        }
        if !self.center_lon.is_finite() || !(MIN_LON..=MAX_LON).contains(&self.center_lon) {
            return invalid(format!(
                "center longitude {} outside [{}, {}]",
                self.center_lon, MIN_LON, MAX_LON
            ));
        }
        if !self.area_km.is_finite() || self.area_km <= 0.0 {
            return invalid(format!("area {} km must be positive", self.area_km));
        }
        if self.output_px == 0 {
            return invalid("output size must be at least 1 pixel".to_string());
        }
        if !(MIN_ZOOM..=MAX_ZOOM).contains(&self.zoom) {
            return invalid(format!(
                "zoom {} outside [{}, {}]",
                self.zoom, MIN_ZOOM, MAX_ZOOM
            ));
        }
        Ok(())
    }

    /// Half the area's extent in degrees, as (latitude, longitude).
    ///
    /// Flat-earth approximation: one degree of latitude is `KM_PER_DEGREE`
    /// km, one degree of longitude is `KM_PER_DEGREE * cos(lat)` km.
    pub fn half_extent_degrees(&self) -> (f64, f64) {
        let half_km = self.area_km / 2.0;
        let d_lat = half_km / KM_PER_DEGREE;
        let d_lon = half_km / (KM_PER_DEGREE * self.center_lat.to_radians().cos());
        (d_lat, d_lon)
    }

    /// The bounding box of the requested area.
    ///
    /// # Errors
    ///
    /// `PipelineError::InvalidParameters` if the request is invalid or the
    /// area would cross the antimeridian or the mercator latitude limit.
    pub fn bounding_box(&self) -> Result<GeoBoundingBox, PipelineError> {
        self.validate()?;

        let (d_lat, d_lon) = self.half_extent_degrees();
        let west = self.center_lon - d_lon;
        let east = self.center_lon + d_lon;
        let south = self.center_lat - d_lat;
        let north = self.center_lat + d_lat;

        if west < MIN_LON || east > MAX_LON {
            return Err(PipelineError::InvalidParameters(format!(
                "area spans longitudes {:.4}..{:.4}, crossing the antimeridian",
                west, east
            )));
        }
        if south < MIN_LAT || north > MAX_LAT {
            return Err(PipelineError::InvalidParameters(format!(
                "area spans latitudes {:.4}..{:.4}, beyond the mercator limit",
                south, north
            )));
        }

        GeoBoundingBox::new(west, east, south, north)
            .map_err(|e| PipelineError::InvalidParameters(e.to_string()))
    }
}
