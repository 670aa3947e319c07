//! adaptive-screen: tile-geometry classification for adaptive screening
//!
//! This library decides, for every pixel of a continuous-tone channel,
//! whether it sits on a stroke, a contour side or a corner, how much of a
//! 6x6 output cell that geometry covers, and which smoothed background tone
//! remains once the geometry is taken out.
//!
//! # Pipeline
//!
//! ```text
//! scanlines -> ScanWindow -> Window -> classify -> resolve -> TileMapper -> TileSink
//!                                                                  |
//!                                                            background row
//! ```
//!
//! - [`ScanWindow`] keeps five padded rows so every pixel has a full 5x5
//!   neighbourhood, with the image border duplicated outward.
//! - [`classify`] computes eight directional sums and maps the strongest to
//!   one of twenty [`TileShape`]s with a [`Polarity`].
//! - [`resolve`] turns the classification into a coverage value and the
//!   background sample left for the tone plane.
//! - [`TileMapper`] run-length encodes blank slots and rows between tiles
//!   and feeds each polarity to its own [`TileSink`].
//! - [`TilePattern`] slices a shape's 6x6 weight map at a coverage value to
//!   obtain the sub-pixels a renderer should ink.
//!
//! # Sample convention
//!
//! All samples are light intensities: 0 is black and 255 is unmarked paper.
//! Callers working in ink density invert on the way in and out.
//!
//! # Example
//!
//! ```
//! use adaptive_screen::{classify, resolve, ScreenOptions, TileShape, Window};
//!
//! // A bright horizontal line through a darker field.
//! let window = Window::from_grid([
//!     [100; 5],
//!     [100; 5],
//!     [200; 5],
//!     [100; 5],
//!     [100; 5],
//! ]);
//! let options = ScreenOptions::default();
//! let class = classify(&window, &options);
//! let tile = resolve(&window, class.shape, class.inverse(), &options);
//! assert_eq!(tile.shape, Some(TileShape::WestLine));
//! assert!(tile.coverage > 0);
//! ```

pub mod classify;
pub mod error;
pub mod histogram;
pub mod mapper;
pub mod options;
pub mod resolve;
pub mod tile;
pub mod weight;
pub mod window;


pub use classify::{classify, Classification, Direction, DirectionalSums};
pub use error::ScreenError;
pub use histogram::TileHistogram;
pub use mapper::{ChannelPass, TileMapper, TilePlanes, TileSink};
pub use options::ScreenOptions;
pub use resolve::{resolve, Resolution};
pub use tile::{Polarity, TileShape, TILE_SHAPE_COUNT};
pub use weight::{weight_map, TilePattern, TILE_PIXELS, TILE_SIDE};
pub use window::{ScanWindow, Window};
