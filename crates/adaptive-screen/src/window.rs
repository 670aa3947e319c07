//! The 3x3 classification window and the five-row scan buffer it is cut from.
//!
//! ```text
//!            B1
//!        A   B   C
//!   D1   D   E   F   F1
//!        G   H   I
//!            H1
//! ```
//!
//! The scan buffer keeps five padded rows. Each row carries two duplicated
//! samples on either side, and the rows above the first scanline and below
//! the last one duplicate their nearest neighbour, so the window never needs
//! to special-case the image border.

use crate::error::ScreenError;

/// Padding samples on each side of a buffered row.
const PAD: usize = 2;

/// Rows kept by the scan buffer; the centre row is index 2.
const ROWS: usize = 5;

/// A 3x3 neighbourhood plus the four outer cardinal samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Window {
    pub a: u8,
    pub b: u8,
    pub c: u8,
    pub d: u8,
    pub e: u8,
    pub f: u8,
    pub g: u8,
    pub h: u8,
    pub i: u8,
    /// Two rows above the centre.
    pub b1: u8,
    /// Two columns left of the centre.
    pub d1: u8,
    /// Two columns right of the centre.
    pub f1: u8,
    /// Two rows below the centre.
    pub h1: u8,
}

impl Window {
    /// Window over a uniform area.
    pub fn uniform(value: u8) -> Self {
        Self::from_grid([[value; 5]; 5])
    }

    /// Build a window from a 5x5 grid (row-major, centre at `[2][2]`).
    /// The four corners of each 2-ring are ignored.
    pub fn from_grid(grid: [[u8; 5]; 5]) -> Self {
        Window {
            a: grid[1][1],
            b: grid[1][2],
            c: grid[1][3],
            d: grid[2][1],
            e: grid[2][2],
            f: grid[2][3],
            g: grid[3][1],
            h: grid[3][2],
            i: grid[3][3],
            b1: grid[0][2],
            d1: grid[2][0],
            f1: grid[2][4],
            h1: grid[4][2],
        }
    }

    /// The nine samples of the 3x3 core.
    pub fn core(&self) -> [u8; 9] {
        [
            self.a, self.b, self.c, self.d, self.e, self.f, self.g, self.h, self.i,
        ]
    }
}

/// Rolling five-row buffer over an interleaved scanline stream.
#[derive(Debug)]
pub struct ScanWindow {
    width: usize,
    sample_size: usize,
    rows: [Vec<u8>; ROWS],
    primed: bool,
}

impl ScanWindow {
    /// Allocate buffers for `width` pixels of `sample_size` bytes each.
    pub fn new(width: usize, sample_size: usize) -> Result<Self, ScreenError> {
        if width == 0 {
            return Err(ScreenError::EmptyScanline);
        }
        if sample_size != 1 && sample_size != 4 {
            return Err(ScreenError::UnsupportedSampleSize(sample_size));
        }
        let row_bytes = (width + 2 * PAD) * sample_size;
        let mut rows: [Vec<u8>; ROWS] = Default::default();
        for row in rows.iter_mut() {
            row.try_reserve_exact(row_bytes)
                .map_err(|_| ScreenError::Allocation {
                    bytes: row_bytes * ROWS,
                })?;
            row.resize(row_bytes, 0);
        }
        Ok(Self {
            width,
            sample_size,
            rows,
            primed: false,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn sample_size(&self) -> usize {
        self.sample_size
    }

    /// Bytes in one unpadded scanline.
    pub fn row_bytes(&self) -> usize {
        self.width * self.sample_size
    }

    /// Advance the buffer by one row.
    ///
    /// The first call fills every slot with `row`. Later calls shift the
    /// rows up and place `row` at the bottom; `None` repeats the current
    /// bottom row, which is how the last scanlines get their lower
    /// neighbours.
    pub fn push(&mut self, row: Option<&[u8]>) -> Result<(), ScreenError> {
        if let Some(row) = row {
            if row.len() != self.row_bytes() {
                return Err(ScreenError::RowLength {
                    expected: self.row_bytes(),
                    actual: row.len(),
                });
            }
        }

        if !self.primed {
            let Some(row) = row else {
                return Err(ScreenError::RowLength {
                    expected: self.row_bytes(),
                    actual: 0,
                });
            };
            for slot in 0..ROWS {
                self.load(slot, row);
            }
            self.primed = true;
            return Ok(());
        }

        self.rows.rotate_left(1);
        match row {
            Some(row) => self.load(ROWS - 1, row),
            None => {
                let (head, tail) = self.rows.split_at_mut(ROWS - 1);
                tail[0].copy_from_slice(&head[ROWS - 2]);
            }
        }
        Ok(())
    }

    /// Copy `row` into a slot and duplicate its edge samples.
    fn load(&mut self, slot: usize, row: &[u8]) {
        let ss = self.sample_size;
        let buf = &mut self.rows[slot];
        buf[PAD * ss..PAD * ss + row.len()].copy_from_slice(row);
        let (first, last) = (PAD * ss, PAD * ss + row.len() - ss);
        for k in 0..ss {
            let left = buf[first + k];
            let right = buf[last + k];
            for p in 0..PAD {
                buf[p * ss + k] = left;
                buf[last + (p + 1) * ss + k] = right;
            }
        }
    }

    /// The window centred on pixel `x` of the middle row for one channel.
    ///
    /// `channel` is the byte offset inside a sample.
    pub fn window(&self, x: usize, channel: usize) -> Window {
        debug_assert!(x < self.width && channel < self.sample_size);
        let ss = self.sample_size;
        let at = |row: usize, dx: isize| -> u8 {
            let px = (x + PAD) as isize + dx;
            self.rows[row][px as usize * ss + channel]
        };
        Window {
            b1: at(0, 0),
            a: at(1, -1),
            b: at(1, 0),
            c: at(1, 1),
            d1: at(2, -2),
            d: at(2, -1),
            e: at(2, 0),
            f: at(2, 1),
            f1: at(2, 2),
            g: at(3, -1),
            h: at(3, 0),
            i: at(3, 1),
            h1: at(4, 0),
        }
    }

    /// Check a channel offset against the sample size.
    pub fn check_channel(&self, channel: usize) -> Result<(), ScreenError> {
        if channel >= self.sample_size {
            return Err(ScreenError::ChannelOutOfRange {
                offset: channel,
                sample_size: self.sample_size,
            });
        }
        Ok(())
    }
}
