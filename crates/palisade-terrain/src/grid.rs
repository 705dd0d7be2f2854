//! TerrainGrid: heightmap with elevation queries by latitude/longitude.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TerrainError {
    #[error("terrain grid has {found} elevations, header needs {expected}")]
    SizeMismatch { expected: usize, found: usize },

    #[error("terrain grid must have positive dimensions and cell size")]
    EmptyGrid,

    #[error("failed to parse terrain grid: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Terrain grid header metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerrainHeader {
    /// Southwest corner latitude (degrees).
    pub origin_lat: f64,
    /// Southwest corner longitude (degrees).
    pub origin_lon: f64,
    /// Arc-seconds per grid cell.
    pub cell_size: f64,
    /// Number of columns (west to east).
    pub width: u32,
    /// Number of rows (north to south).
    pub height: u32,
}

impl TerrainHeader {
    /// North edge latitude (degrees).
    pub fn north_lat(&self) -> f64 {
        self.origin_lat + (self.height as f64 * self.cell_size) / 3600.0
    }

    /// East edge longitude (degrees).
    pub fn east_lon(&self) -> f64 {
        self.origin_lon + (self.width as f64 * self.cell_size) / 3600.0
    }

    fn cell_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

/// Heightmap grid. Immutable after load and safe to share between assets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawGrid", into = "RawGrid")]
pub struct TerrainGrid {
    header: TerrainHeader,
    /// Elevation values in meters, row-major (north-to-south, west-to-east).
    elevations: Vec<i16>,
}

#[derive(Serialize, Deserialize)]
struct RawGrid {
    header: TerrainHeader,
    elevations: Vec<i16>,
}

impl TryFrom<RawGrid> for TerrainGrid {
    type Error = TerrainError;

    fn try_from(raw: RawGrid) -> Result<Self, Self::Error> {
        TerrainGrid::new(raw.header, raw.elevations)
    }
}

impl From<TerrainGrid> for RawGrid {
    fn from(grid: TerrainGrid) -> Self {
        RawGrid {
            header: grid.header,
            elevations: grid.elevations,
        }
    }
}

impl TerrainGrid {
    pub fn new(header: TerrainHeader, elevations: Vec<i16>) -> Result<Self, TerrainError> {
        if header.width == 0 || header.height == 0 || header.cell_size <= 0.0 {
            return Err(TerrainError::EmptyGrid);
        }
        if elevations.len() != header.cell_count() {
            return Err(TerrainError::SizeMismatch {
                expected: header.cell_count(),
                found: elevations.len(),
            });
        }
        Ok(Self { header, elevations })
    }

    pub fn from_json(json: &str) -> Result<Self, TerrainError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn header(&self) -> &TerrainHeader {
        &self.header
    }

    /// Highest elevation in the grid (meters).
    pub fn max_elevation(&self) -> i16 {
        self.elevations.iter().copied().max().unwrap_or(0)
    }

    /// Convert lat/lon to grid row/col (fractional).
    fn geo_to_grid(&self, lat: f64, lon: f64) -> Option<(f64, f64)> {
        let h = &self.header;

        // Column: west-to-east
        let col = (lon - h.origin_lon) * 3600.0 / h.cell_size;
        // Row: north-to-south (row 0 = north edge)
        let row = (h.north_lat() - lat) * 3600.0 / h.cell_size;

        if col < 0.0 || row < 0.0 || col >= h.width as f64 || row >= h.height as f64 {
            return None;
        }

        Some((row, col))
    }

    fn raw_elevation(&self, row: usize, col: usize) -> i16 {
        let h = &self.header;
        if row >= h.height as usize || col >= h.width as usize {
            return 0;
        }
        self.elevations[row * h.width as usize + col]
    }

    /// Elevation at lat/lon (degrees) with bilinear interpolation.
    /// Returns None outside the grid.
    pub fn elevation_at_geo(&self, lat: f64, lon: f64) -> Option<f64> {
        let (row, col) = self.geo_to_grid(lat, lon)?;
        Some(self.bilinear(row, col))
    }

    fn bilinear(&self, row: f64, col: f64) -> f64 {
        let r0 = row.floor() as usize;
        let c0 = col.floor() as usize;
        let r1 = (r0 + 1).min(self.header.height as usize - 1);
        let c1 = (c0 + 1).min(self.header.width as usize - 1);

        let fr = row - r0 as f64;
        let fc = col - c0 as f64;

        let e00 = self.raw_elevation(r0, c0) as f64;
        let e01 = self.raw_elevation(r0, c1) as f64;
        let e10 = self.raw_elevation(r1, c0) as f64;
        let e11 = self.raw_elevation(r1, c1) as f64;

        let top = e00 * (1.0 - fc) + e01 * fc;
        let bot = e10 * (1.0 - fc) + e11 * fc;
        top * (1.0 - fr) + bot * fr
    }
}
