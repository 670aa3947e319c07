//! Stream codecs for stage artifacts.
//!
//! Two backends implement [`StreamCodec`]: the symbolic one writes ASCII85
//! PostScript fragments that the EPS assembler embeds verbatim, the raster
//! one writes PNG planes. A stage picks its backend once from `-t` and
//! opens one context per (colorant, artifact class).

pub mod ascii85;
pub mod raster;
pub mod symbolic;

use std::io;
use std::path::Path;

use adaptive_screen::{Polarity, TileSink};

use crate::error::Result;
use crate::models::{Convention, ImageGeometry, OutputFormat};

pub use raster::RasterCodec;
pub use symbolic::SymbolicCodec;

/// An open tile-plane context.
///
/// `close` flushes pending state and writes the trailer. It is idempotent,
/// and dropping an unclosed context closes it while discarding the error.
pub trait TileStream: TileSink {
    fn close(&mut self) -> io::Result<()>;

    fn as_sink(&mut self) -> &mut dyn TileSink;
}

/// An open tone-plane context.
pub trait ToneStream {
    /// One row of `width` samples in the stage convention.
    fn write_tone_row(&mut self, samples: &[u8]) -> io::Result<()>;

    fn close(&mut self) -> io::Result<()>;
}

/// Factory for artifact contexts of one backend.
pub trait StreamCodec {
    fn format(&self) -> OutputFormat;

    fn open_tile_stream(&self, path: &Path, polarity: Polarity) -> Result<Box<dyn TileStream>>;

    fn open_tone_stream(&self, path: &Path) -> Result<Box<dyn ToneStream>>;

    /// A uniform tone plane with ink fraction `ink` in `0..=1`.
    fn write_background(&self, path: &Path, ink: f64) -> Result<()>;
}

/// What every context needs to know about the image.
#[derive(Debug, Clone, Copy)]
pub struct CodecParams {
    pub geometry: ImageGeometry,
    pub convention: Convention,
}

pub fn codec_for(format: OutputFormat, params: CodecParams) -> Box<dyn StreamCodec> {
    match format {
        OutputFormat::Eps => Box::new(SymbolicCodec::new(params)),
        OutputFormat::Raster => Box::new(RasterCodec::new(params)),
    }
}
