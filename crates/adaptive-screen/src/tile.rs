//! Tile geometries and polarity.
//!
//! A tile is the classified local geometry of one pixel. There are twenty
//! oriented shapes, grouped into lines, contour sides and corners. The
//! absence of a tile (a stationary pixel) is represented as `None` wherever
//! an `Option<TileShape>` appears; on the wire it is code `0`.

use std::fmt;

/// Number of distinct non-empty tile shapes.
pub const TILE_SHAPE_COUNT: usize = 20;

/// One of the twenty oriented tile geometries.
///
/// The discriminants are the wire codes written by the stream codecs and
/// used to index the weight-map table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum TileShape {
    /// Vertical line.
    NorthLine = 1,
    /// Horizontal line.
    WestLine = 2,
    /// Diagonal line running NW to SE.
    NorthWestLine = 3,
    /// Diagonal line running NE to SW.
    NorthEastLine = 4,
    WestSide = 5,
    NorthSide = 6,
    EastSide = 7,
    SouthSide = 8,
    NorthEastSide = 9,
    SouthEastSide = 10,
    SouthWestSide = 11,
    NorthWestSide = 12,
    WestCorner = 13,
    NorthCorner = 14,
    EastCorner = 15,
    SouthCorner = 16,
    NorthWestCorner = 17,
    NorthEastCorner = 18,
    SouthEastCorner = 19,
    SouthWestCorner = 20,
}

impl TileShape {
    /// All shapes in wire-code order.
    pub const ALL: [TileShape; TILE_SHAPE_COUNT] = [
        TileShape::NorthLine,
        TileShape::WestLine,
        TileShape::NorthWestLine,
        TileShape::NorthEastLine,
        TileShape::WestSide,
        TileShape::NorthSide,
        TileShape::EastSide,
        TileShape::SouthSide,
        TileShape::NorthEastSide,
        TileShape::SouthEastSide,
        TileShape::SouthWestSide,
        TileShape::NorthWestSide,
        TileShape::WestCorner,
        TileShape::NorthCorner,
        TileShape::EastCorner,
        TileShape::SouthCorner,
        TileShape::NorthWestCorner,
        TileShape::NorthEastCorner,
        TileShape::SouthEastCorner,
        TileShape::SouthWestCorner,
    ];

    /// Wire code, `1..=20`.
    #[inline]
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Shape for a wire code. Code `0` (empty) and anything above 20 map to `None`.
    pub fn from_code(code: u8) -> Option<TileShape> {
        match code {
            1..=20 => Some(Self::ALL[code as usize - 1]),
            _ => None,
        }
    }

    pub fn is_line(self) -> bool {
        matches!(
            self,
            TileShape::NorthLine
                | TileShape::WestLine
                | TileShape::NorthWestLine
                | TileShape::NorthEastLine
        )
    }

    /// Thin shapes are dropped when their coverage is below the minimum
    /// stroke area: the four lines and the four orthogonal contour sides.
    pub fn is_thin(self) -> bool {
        self.is_line()
            || matches!(
                self,
                TileShape::WestSide | TileShape::NorthSide | TileShape::EastSide | TileShape::SouthSide
            )
    }

    /// Short mnemonic used in diagnostics (`NL`, `SEC`, ...).
    pub fn mnemonic(self) -> &'static str {
        match self {
            TileShape::NorthLine => "NL",
            TileShape::WestLine => "WL",
            TileShape::NorthWestLine => "NWL",
            TileShape::NorthEastLine => "NEL",
            TileShape::WestSide => "WS",
            TileShape::NorthSide => "NS",
            TileShape::EastSide => "ES",
            TileShape::SouthSide => "SS",
            TileShape::NorthEastSide => "NES",
            TileShape::SouthEastSide => "SES",
            TileShape::SouthWestSide => "SWS",
            TileShape::NorthWestSide => "NWS",
            TileShape::WestCorner => "WC",
            TileShape::NorthCorner => "NC",
            TileShape::EastCorner => "EC",
            TileShape::SouthCorner => "SC",
            TileShape::NorthWestCorner => "NWC",
            TileShape::NorthEastCorner => "NEC",
            TileShape::SouthEastCorner => "SEC",
            TileShape::SouthWestCorner => "SWC",
        }
    }
}

impl fmt::Display for TileShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

/// Whether a tile adds ink (stroke) or removes it from the background (mask).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Polarity {
    #[default]
    Stroke,
    Mask,
}

impl Polarity {
    pub fn opposite(self) -> Polarity {
        match self {
            Polarity::Stroke => Polarity::Mask,
            Polarity::Mask => Polarity::Stroke,
        }
    }
}

impl fmt::Display for Polarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Polarity::Stroke => f.write_str("stroke"),
            Polarity::Mask => f.write_str("mask"),
        }
    }
}
