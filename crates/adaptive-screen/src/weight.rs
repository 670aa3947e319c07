//! 6x6 weight-threshold maps for the tile shapes.
//!
//! Six base patterns are rotated into the twenty oriented geometries at
//! compile time by build.rs. A sub-pixel of a tile is inked when its weight
//! is less than or equal to the tile's coverage.

use crate::tile::TileShape;

include!(concat!(env!("OUT_DIR"), "/weight_maps.rs"));

/// Tile edge length in output pixels.
pub const TILE_SIDE: usize = 6;

/// Sub-pixels per tile.
pub const TILE_PIXELS: usize = TILE_SIDE * TILE_SIDE;

/// The weight map of a shape, row-major.
#[inline]
pub fn weight_map(shape: TileShape) -> &'static [u8; TILE_PIXELS] {
    &WEIGHT_MAPS[shape.code() as usize - 1]
}

/// A thresholded 6x6 tile, row-major.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TilePattern([bool; TILE_PIXELS]);

impl TilePattern {
    pub const BLANK: TilePattern = TilePattern([false; TILE_PIXELS]);

    /// Slice the shape's weight map at `coverage`.
    ///
    /// Empty tiles and zero coverage produce a blank pattern.
    pub fn slice(shape: Option<TileShape>, coverage: u8) -> TilePattern {
        let Some(shape) = shape else {
            return Self::BLANK;
        };
        if coverage == 0 {
            return Self::BLANK;
        }
        let weights = weight_map(shape);
        let mut cells = [false; TILE_PIXELS];
        for (cell, weight) in cells.iter_mut().zip(weights.iter()) {
            *cell = *weight <= coverage;
        }
        TilePattern(cells)
    }

    #[inline]
    pub fn is_set(&self, x: usize, y: usize) -> bool {
        self.0[y * TILE_SIDE + x]
    }

    pub fn count(&self) -> usize {
        self.0.iter().filter(|c| **c).count()
    }

    pub fn cells(&self) -> &[bool; TILE_PIXELS] {
        &self.0
    }
}
