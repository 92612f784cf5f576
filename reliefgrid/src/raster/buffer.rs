//! Stitched elevation raster and per-tile write regions.

use crate::provider::{ElevationTile, ProviderError};

/// Contiguous row-major elevation raster in meters.
///
/// Produced by the stitcher, consumed by the cropper.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterBuffer {
    width: u32,
    height: u32,
    data: Vec<f32>,
}

impl RasterBuffer {
    /// Creates a zero-filled raster.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0.0; width as usize * height as usize],
        }
    }

    /// Wraps existing row-major data.
    ///
    /// Returns `None` if `data.len() != width * height`.
    pub fn from_vec(width: u32, height: u32, data: Vec<f32>) -> Option<Self> {
        (data.len() == width as usize * height as usize).then_some(Self {
            width,
            height,
            data,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Raw row-major samples.
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Elevation at pixel (`x`, `y`).
    pub fn get(&self, x: u32, y: u32) -> f32 {
        self.data[y as usize * self.width as usize + x as usize]
    }

    /// One row of samples.
    pub fn row(&self, y: u32) -> &[f32] {
        let w = self.width as usize;
        let start = y as usize * w;
        &self.data[start..start + w]
    }

    /// Splits the raster into disjoint, mutable, tile-sized regions.
    ///
    /// Regions are returned in row-major tile order, matching
    /// [`TileGrid::tiles`](crate::coord::TileGrid::tiles). Each region only
    /// exposes its own `tile_size × tile_size` window, so regions can be
    /// handed to concurrent fetches without any locking.
    ///
    /// The raster dimensions must be multiples of `tile_size`.
    pub fn tile_regions_mut(&mut self, tile_size: u32) -> Vec<TileRegionMut<'_>> {
        debug_assert!(tile_size > 0);
        debug_assert_eq!(self.width % tile_size, 0);
        debug_assert_eq!(self.height % tile_size, 0);

        let tile = tile_size as usize;
        let width = self.width as usize;
        let tiles_wide = width / tile;
        let tiles_high = self.height as usize / tile;

        let mut regions: Vec<TileRegionMut<'_>> = (0..tiles_wide * tiles_high)
            .map(|index| TileRegionMut {
                col: (index % tiles_wide) as u32,
                row: (index / tiles_wide) as u32,
                size: tile_size,
                rows: Vec::with_capacity(tile),
            })
            .collect();

        for (band_index, band) in self.data.chunks_mut(width * tile).enumerate() {
            for line in band.chunks_mut(width) {
                for (col, segment) in line.chunks_mut(tile).enumerate() {
                    regions[band_index * tiles_wide + col].rows.push(segment);
                }
            }
        }

        regions
    }
}

/// Exclusive write access to one tile-sized window of a [`RasterBuffer`].
#[derive(Debug)]
pub struct TileRegionMut<'a> {
    col: u32,
    row: u32,
    size: u32,
    rows: Vec<&'a mut [f32]>,
}

impl TileRegionMut<'_> {
    /// Tile column of this region within the grid.
    pub fn col(&self) -> u32 {
        self.col
    }

    /// Tile row of this region within the grid.
    pub fn row(&self) -> u32 {
        self.row
    }

    /// Copies a decoded tile into this region.
    ///
    /// # Errors
    ///
    /// `ProviderError::InvalidDimensions` if the tile is not exactly the
    /// region's size.
    pub fn write_tile(&mut self, tile: &ElevationTile) -> Result<(), ProviderError> {
        if tile.width != self.size || tile.height != self.size {
            return Err(ProviderError::InvalidDimensions {
                width: tile.width,
                height: tile.height,
                expected: self.size,
            });
        }

        for (y, row) in self.rows.iter_mut().enumerate() {
            row.copy_from_slice(tile.row(y as u32));
        }
        Ok(())
    }
}
