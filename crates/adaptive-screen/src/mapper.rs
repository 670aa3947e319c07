//! Run-length tile mapping for one channel.
//!
//! The mapper walks a scanline, classifies and resolves every pixel, writes
//! the background sample into the outgoing row and hands non-empty tiles to
//! the sink of their polarity. Between tiles it counts blank slots within
//! the row and wholly blank rows, so a sink only sees a tile preceded by the
//! gap that separates it from the previous one.

use std::io;

use crate::classify::classify;
use crate::histogram::TileHistogram;
use crate::options::ScreenOptions;
use crate::resolve::resolve;
use crate::tile::{Polarity, TileShape};
use crate::window::ScanWindow;

/// Receiver of one polarity's tile stream.
pub trait TileSink {
    /// `rows` (>= 1) row ends since the previous tile.
    fn write_blank_rows(&mut self, rows: u32) -> io::Result<()>;
    /// `slots` (>= 1) empty positions before the next tile in this row.
    fn write_blank_slots(&mut self, slots: u32) -> io::Result<()>;
    fn write_tile(&mut self, shape: TileShape, coverage: u8) -> io::Result<()>;
}

/// The stroke and mask sinks of one channel. A missing sink drops its
/// records while the counters keep running.
pub struct TilePlanes<'a> {
    pub stroke: Option<&'a mut dyn TileSink>,
    pub mask: Option<&'a mut dyn TileSink>,
}

impl<'a> TilePlanes<'a> {
    fn sink(&mut self, polarity: Polarity) -> Option<&mut (dyn TileSink + 'a)> {
        match polarity {
            Polarity::Stroke => self.stroke.as_deref_mut(),
            Polarity::Mask => self.mask.as_deref_mut(),
        }
    }
}

/// Where in the sample the channel lives and how it is processed.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChannelPass {
    /// Byte offset of the channel inside an interleaved sample.
    pub offset: usize,
    /// Skip classification and forward the samples unchanged.
    pub passthrough: bool,
    /// Classify only the left half of each row.
    pub left_half_only: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct RunLength {
    slots: u32,
    rows: u32,
}

/// Per-channel classification state, carried across scanlines.
#[derive(Debug)]
pub struct TileMapper {
    options: ScreenOptions,
    stroke: RunLength,
    mask: RunLength,
    histogram: TileHistogram,
}

impl TileMapper {
    pub fn new(options: ScreenOptions) -> Self {
        Self {
            options,
            stroke: RunLength::default(),
            mask: RunLength::default(),
            histogram: TileHistogram::new(),
        }
    }

    pub fn histogram(&self) -> &TileHistogram {
        &self.histogram
    }

    fn run(&mut self, polarity: Polarity) -> &mut RunLength {
        match polarity {
            Polarity::Stroke => &mut self.stroke,
            Polarity::Mask => &mut self.mask,
        }
    }

    /// Map the centre row of `scan`.
    ///
    /// `background` is the outgoing interleaved scanline; this channel's
    /// samples in it are overwritten with the resolved background.
    pub fn map_row(
        &mut self,
        scan: &ScanWindow,
        pass: ChannelPass,
        background: &mut [u8],
        planes: &mut TilePlanes<'_>,
    ) -> io::Result<()> {
        let width = scan.width();
        let ss = scan.sample_size();
        let half = width / 2;

        self.stroke.slots = 0;
        self.mask.slots = 0;

        for x in 0..width {
            let window = scan.window(x, pass.offset);
            let (shape, polarity, coverage, bg) = if pass.passthrough || (pass.left_half_only && x > half) {
                (None, Polarity::Stroke, 0, window.e)
            } else {
                let class = classify(&window, &self.options);
                let res = resolve(&window, class.shape, class.inverse(), &self.options);
                (res.shape, class.polarity, res.coverage, res.background)
            };
            background[x * ss + pass.offset] = bg;

            let Some(shape) = shape else {
                self.stroke.slots += 1;
                self.mask.slots += 1;
                self.histogram.record_empty();
                continue;
            };

            self.histogram.record(shape, polarity);
            let pending = *self.run(polarity);
            if let Some(sink) = planes.sink(polarity) {
                if pending.rows > 0 {
                    sink.write_blank_rows(pending.rows)?;
                }
                if pending.slots > 0 {
                    sink.write_blank_slots(pending.slots)?;
                }
                sink.write_tile(shape, coverage)?;
            }
            *self.run(polarity) = RunLength::default();
            self.run(polarity.opposite()).slots += 1;
        }

        self.stroke.rows += 1;
        self.mask.rows += 1;
        Ok(())
    }

    /// Flush the blank rows that follow the last tile of each plane.
    pub fn finish(&mut self, planes: &mut TilePlanes<'_>) -> io::Result<()> {
        for polarity in [Polarity::Stroke, Polarity::Mask] {
            let pending = *self.run(polarity);
            if pending.rows > 0 {
                if let Some(sink) = planes.sink(polarity) {
                    sink.write_blank_rows(pending.rows)?;
                }
            }
            *self.run(polarity) = RunLength::default();
        }
        Ok(())
    }
}
