//! Tile usage statistics.

use std::io::{self, Write};

use crate::tile::{Polarity, TileShape, TILE_SHAPE_COUNT};

/// Counts of stationary pixels and of each shape per polarity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TileHistogram {
    empty: u64,
    stroke: [u64; TILE_SHAPE_COUNT],
    mask: [u64; TILE_SHAPE_COUNT],
}

impl TileHistogram {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_empty(&mut self) {
        self.empty += 1;
    }

    pub fn record(&mut self, shape: TileShape, polarity: Polarity) {
        let slot = shape.code() as usize - 1;
        match polarity {
            Polarity::Stroke => self.stroke[slot] += 1,
            Polarity::Mask => self.mask[slot] += 1,
        }
    }

    pub fn empty(&self) -> u64 {
        self.empty
    }

    pub fn count(&self, shape: TileShape, polarity: Polarity) -> u64 {
        let slot = shape.code() as usize - 1;
        match polarity {
            Polarity::Stroke => self.stroke[slot],
            Polarity::Mask => self.mask[slot],
        }
    }

    /// Total tiles of one polarity.
    pub fn tiles(&self, polarity: Polarity) -> u64 {
        match polarity {
            Polarity::Stroke => self.stroke.iter().sum(),
            Polarity::Mask => self.mask.iter().sum(),
        }
    }

    /// Every classified pixel, empty or not.
    pub fn total(&self) -> u64 {
        self.empty + self.tiles(Polarity::Stroke) + self.tiles(Polarity::Mask)
    }

    pub fn merge(&mut self, other: &TileHistogram) {
        self.empty += other.empty;
        for (a, b) in self.stroke.iter_mut().zip(other.stroke.iter()) {
            *a += b;
        }
        for (a, b) in self.mask.iter_mut().zip(other.mask.iter()) {
            *a += b;
        }
    }

    /// Write the `#code: count` listing: `#0` for stationary pixels,
    /// `#1`..`#20` for stroke tiles and `#-1`..`#-20` for mask tiles.
    pub fn write_to<W: Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, "#0: {}", self.empty)?;
        for (i, count) in self.stroke.iter().enumerate() {
            writeln!(out, "#{}: {}", i + 1, count)?;
        }
        for (i, count) in self.mask.iter().enumerate() {
            writeln!(out, "#-{}: {}", i + 1, count)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listing_format() {
        let mut hist = TileHistogram::new();
        hist.record_empty();
        hist.record_empty();
        hist.record(TileShape::NorthLine, Polarity::Stroke);
        hist.record(TileShape::SouthWestCorner, Polarity::Mask);

        let mut out = Vec::new();
        hist.write_to(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 41);
        assert_eq!(lines[0], "#0: 2");
        assert_eq!(lines[1], "#1: 1");
        assert_eq!(lines[20], "#20: 0");
        assert_eq!(lines[21], "#-1: 0");
        assert_eq!(lines[40], "#-20: 1");
    }

    #[test]
    fn test_merge_and_totals() {
        let mut a = TileHistogram::new();
        a.record(TileShape::EastSide, Polarity::Stroke);
        let mut b = TileHistogram::new();
        b.record(TileShape::EastSide, Polarity::Stroke);
        b.record(TileShape::EastSide, Polarity::Mask);
        b.record_empty();
        a.merge(&b);
        assert_eq!(a.count(TileShape::EastSide, Polarity::Stroke), 2);
        assert_eq!(a.count(TileShape::EastSide, Polarity::Mask), 1);
        assert_eq!(a.empty(), 1);
        assert_eq!(a.total(), 4);
    }
}
