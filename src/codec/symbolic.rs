//! Symbolic backend: ASCII85 PostScript fragments.
//!
//! A tile artifact is a `drawtiles` program whose data is the binary record
//! stream below, ASCII85-encoded:
//!
//! | bytes            | record                                  |
//! |------------------|-----------------------------------------|
//! | `00`             | one blank slot                          |
//! | `01`..`14` `cc`  | tile of shape code 1..=20, coverage `cc` |
//! | `FF hi lo`       | `hi lo` (> 3) blank slots               |
//! | `FF FF hi lo`    | `hi lo` row ends                        |
//! | `FF FF FF`       | end of stream                           |
//!
//! Counts never exceed `0xFEFF`, so the high byte of a count is never
//! `FF` and the end marker stays unambiguous.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use adaptive_screen::{Polarity, TileShape, TileSink};
use serde::Serialize;

use super::ascii85::{self, Ascii85Writer};
use super::{CodecParams, StreamCodec, TileStream, ToneStream};
use crate::error::{EngraveError, Result};
use crate::models::{Convention, OutputFormat};

const ESCAPE: u8 = 0xFF;
const MAX_RUN: u32 = 0xFEFF;
/// Runs up to this length are cheaper as literal blank slots.
const LITERAL_SLOTS: u32 = 3;

const VERSION: &str = env!("CARGO_PKG_VERSION");

const FOOTER: &str = "%%EndData\ngrestore\t% Restore previous graphic state\n";

#[derive(Debug, Clone, Copy)]
pub struct SymbolicCodec {
    params: CodecParams,
}

impl SymbolicCodec {
    pub fn new(params: CodecParams) -> Self {
        Self { params }
    }

    fn tile_header(&self, polarity: Polarity) -> String {
        let g = self.params.geometry;
        let (color, kind) = match polarity {
            Polarity::Stroke => ("1.0", "positive"),
            Polarity::Mask => ("0.0", "negative"),
        };
        format!(
            "% Filter: tile32 filter from engrave {VERSION}\n\
             %%LanguageLevel 2\n\
             gsave\t% Save grafics state\n\
             {color} setcolor\n\
             % Drawing {kind} tiles:\n\
             0 {:.6} translate\n\
             {:.6} {:.6} scale\n\
             currentfile /ASCII85Decode filter\n\
             %%BeginData\n\
             drawtiles\n",
            g.height_pt(),
            72.0 / g.hres,
            72.0 / g.vres,
        )
    }

    fn tone_header(&self) -> String {
        let g = self.params.geometry;
        let decode = match self.params.convention {
            Convention::Density => "[0 1]",
            Convention::Intensity => "[1 0]",
        };
        format!(
            "% Filter: ct filter from engrave {VERSION}\n\
             %%LanguageLevel 2\n\
             gsave\t% Save graphics state\n\
             1.0 setcolor\n\
             {:.6} {:.6} scale\n\
             % Image operator:\n\
             <<\n\
             \t/ImageType 1\n\
             \t/Width {w}\n\
             \t/Height {h}\n\
             \t/BitsPerComponent 8\n\
             \t/Decode {decode}\n\
             \t/ImageMatrix [ {w} 0 0 -{h} 0 {h} ]\n\
             \t/DataSource currentfile /ASCII85Decode filter\n\
             >>\n\
             %%BeginData\n\
             image\n",
            g.width_pt(),
            g.height_pt(),
            w = g.width,
            h = g.height,
        )
    }
}

fn create(path: &Path) -> Result<BufWriter<File>> {
    let file = File::create(path)
        .map_err(|e| EngraveError::io(format!("creating {}", path.display()), e))?;
    Ok(BufWriter::new(file))
}

impl StreamCodec for SymbolicCodec {
    fn format(&self) -> OutputFormat {
        OutputFormat::Eps
    }

    fn open_tile_stream(&self, path: &Path, polarity: Polarity) -> Result<Box<dyn TileStream>> {
        let mut out = create(path)?;
        out.write_all(self.tile_header(polarity).as_bytes())?;
        Ok(Box::new(SymbolicTileStream {
            data: Ascii85Writer::new(out),
            closed: false,
        }))
    }

    fn open_tone_stream(&self, path: &Path) -> Result<Box<dyn ToneStream>> {
        let mut out = create(path)?;
        out.write_all(self.tone_header().as_bytes())?;
        Ok(Box::new(SymbolicToneStream {
            data: Ascii85Writer::new(out),
            closed: false,
        }))
    }

    fn write_background(&self, path: &Path, ink: f64) -> Result<()> {
        let g = self.params.geometry;
        let mut out = create(path)?;
        write!(
            out,
            "% Filter: bg filter from engrave {VERSION}\n\
             %%LanguageLevel 2\n\
             gsave\t% Save graphics state\n\
             {ink:.6} setcolor\n\
             {:.6} {:.6} scale\n\
             0 0 1 1 rectfill\n\
             grestore\t% Restore previous graphic state\n",
            g.width_pt(),
            g.height_pt(),
        )?;
        out.flush()?;
        Ok(())
    }
}

/// Write one ASCII85 stream's terminator, the fragment footer, and flush.
fn finish_fragment(data: &mut Ascii85Writer<BufWriter<File>>) -> io::Result<()> {
    data.finish()?;
    let out = data.get_mut();
    out.write_all(FOOTER.as_bytes())?;
    out.flush()
}

struct SymbolicTileStream {
    data: Ascii85Writer<BufWriter<File>>,
    closed: bool,
}

impl SymbolicTileStream {
    fn run(&mut self, prefix: &[u8], count: u32) -> io::Result<()> {
        self.data.write_all(prefix)?;
        self.data.write_all(&(count as u16).to_be_bytes())
    }
}

impl TileSink for SymbolicTileStream {
    fn write_blank_rows(&mut self, mut rows: u32) -> io::Result<()> {
        while rows > 0 {
            let chunk = rows.min(MAX_RUN);
            self.run(&[ESCAPE, ESCAPE], chunk)?;
            rows -= chunk;
        }
        Ok(())
    }

    fn write_blank_slots(&mut self, mut slots: u32) -> io::Result<()> {
        while slots > LITERAL_SLOTS {
            let chunk = slots.min(MAX_RUN);
            self.run(&[ESCAPE], chunk)?;
            slots -= chunk;
        }
        for _ in 0..slots {
            self.data.push(0)?;
        }
        Ok(())
    }

    fn write_tile(&mut self, shape: TileShape, coverage: u8) -> io::Result<()> {
        self.data.write_all(&[shape.code(), coverage])
    }
}

impl TileStream for SymbolicTileStream {
    fn close(&mut self) -> io::Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.data.write_all(&[ESCAPE; 3])?;
        finish_fragment(&mut self.data)
    }

    fn as_sink(&mut self) -> &mut dyn TileSink {
        self
    }
}

impl Drop for SymbolicTileStream {
    fn drop(&mut self) {
        let _ = TileStream::close(self);
    }
}

struct SymbolicToneStream {
    data: Ascii85Writer<BufWriter<File>>,
    closed: bool,
}

impl ToneStream for SymbolicToneStream {
    fn write_tone_row(&mut self, samples: &[u8]) -> io::Result<()> {
        self.data.write_all(samples)
    }

    fn close(&mut self) -> io::Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        finish_fragment(&mut self.data)
    }
}

impl Drop for SymbolicToneStream {
    fn drop(&mut self) {
        let _ = ToneStream::close(self);
    }
}

/// One decoded tile-stream record. Consecutive blank records are merged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TileRecord {
    BlankRows { count: u32 },
    BlankSlots { count: u32 },
    Tile {
        #[serde(serialize_with = "serialize_shape")]
        shape: TileShape,
        coverage: u8,
    },
}

fn serialize_shape<S: serde::Serializer>(shape: &TileShape, s: S) -> std::result::Result<S::Ok, S::Error> {
    s.serialize_str(shape.mnemonic())
}

/// A tile artifact read back from disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedTiles {
    /// From the `setcolor` line of the header.
    pub polarity: Option<Polarity>,
    pub records: Vec<TileRecord>,
}

/// Decode a tile artifact written by [`SymbolicCodec::open_tile_stream`].
pub fn decode_tile_artifact(text: &str) -> Result<DecodedTiles> {
    let polarity = if text.contains("% Drawing positive tiles:") {
        Some(Polarity::Stroke)
    } else if text.contains("% Drawing negative tiles:") {
        Some(Polarity::Mask)
    } else {
        None
    };

    const DATA_START: &str = "drawtiles\n";
    let start = text
        .find(DATA_START)
        .map(|i| i + DATA_START.len())
        .ok_or_else(|| EngraveError::Codec("No drawtiles data in artifact".to_string()))?;
    let bytes = ascii85::decode(&text[start..])?;
    Ok(DecodedTiles {
        polarity,
        records: decode_records(&bytes)?,
    })
}

/// Parse the binary record stream up to its end marker.
pub fn decode_records(bytes: &[u8]) -> Result<Vec<TileRecord>> {
    let truncated = || EngraveError::Codec("Tile stream truncated".to_string());
    let mut records: Vec<TileRecord> = Vec::new();
    let mut it = bytes.iter().copied();

    let count = |hi: u8, lo: u8| u32::from(u16::from_be_bytes([hi, lo]));

    loop {
        let b = it.next().ok_or_else(|| {
            EngraveError::Codec("Tile stream ends without end marker".to_string())
        })?;
        let record = match b {
            0 => TileRecord::BlankSlots { count: 1 },
            ESCAPE => {
                let first = it.next().ok_or_else(truncated)?;
                if first == ESCAPE {
                    let hi = it.next().ok_or_else(truncated)?;
                    if hi == ESCAPE {
                        break;
                    }
                    let lo = it.next().ok_or_else(truncated)?;
                    TileRecord::BlankRows {
                        count: count(hi, lo),
                    }
                } else {
                    let lo = it.next().ok_or_else(truncated)?;
                    TileRecord::BlankSlots {
                        count: count(first, lo),
                    }
                }
            }
            code => {
                let shape = TileShape::from_code(code).ok_or_else(|| {
                    EngraveError::Codec(format!("Unknown tile code 0x{code:02x}"))
                })?;
                let coverage = it.next().ok_or_else(truncated)?;
                TileRecord::Tile { shape, coverage }
            }
        };
        push_merged(&mut records, record);
    }
    Ok(records)
}

fn push_merged(records: &mut Vec<TileRecord>, record: TileRecord) {
    match (records.last_mut(), record) {
        (Some(TileRecord::BlankRows { count }), TileRecord::BlankRows { count: more })
        | (Some(TileRecord::BlankSlots { count }), TileRecord::BlankSlots { count: more }) => {
            *count += more;
        }
        _ => records.push(record),
    }
}
