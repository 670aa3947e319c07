//! Raw scanline I/O for stage processes.

use std::io::{self, Read, Write};

use crate::error::{EngraveError, Result};

/// Reads fixed-size rows, optionally inverting every sample.
pub struct ScanlineReader<R: Read> {
    inner: R,
    row: Vec<u8>,
    invert: bool,
    line: u32,
    height: u32,
    decile: u32,
}

impl<R: Read> ScanlineReader<R> {
    pub fn new(inner: R, row_bytes: usize, height: u32, invert: bool) -> Self {
        Self {
            inner,
            row: vec![0; row_bytes],
            invert,
            line: 0,
            height,
            decile: 0,
        }
    }

    /// Rows read so far.
    pub fn line(&self) -> u32 {
        self.line
    }

    /// The next row; a short read is fatal.
    pub fn read_row(&mut self) -> Result<&[u8]> {
        if !self.fill()? {
            return Err(EngraveError::ShortRead { line: self.line });
        }
        Ok(&self.row)
    }

    /// The next row, or `None` at end of stream (a trailing partial row
    /// counts as end of stream).
    pub fn try_read_row(&mut self) -> Result<Option<&[u8]>> {
        if !self.fill()? {
            return Ok(None);
        }
        Ok(Some(&self.row))
    }

    fn fill(&mut self) -> Result<bool> {
        match self.inner.read_exact(&mut self.row) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(false),
            Err(e) => {
                return Err(EngraveError::io(format!("reading scanline {}", self.line), e))
            }
        }
        self.advance();
        Ok(true)
    }

    fn advance(&mut self) {
        if self.invert {
            for v in self.row.iter_mut() {
                *v = 255 - *v;
            }
        }
        self.line += 1;
        if self.height > 0 {
            let decile = self.line * 10 / self.height;
            if decile != self.decile {
                self.decile = decile;
                tracing::debug!(line = self.line, "{}% of scanlines read", decile * 10);
            }
        }
    }
}

/// Writes rows, optionally inverting them back.
pub struct ScanlineWriter<W: Write> {
    inner: W,
    invert: bool,
    scratch: Vec<u8>,
}

impl<W: Write> ScanlineWriter<W> {
    pub fn new(inner: W, invert: bool) -> Self {
        Self {
            inner,
            invert,
            scratch: Vec::new(),
        }
    }

    pub fn write_row(&mut self, row: &[u8]) -> Result<()> {
        let out = if self.invert {
            self.scratch.clear();
            self.scratch.extend(row.iter().map(|v| 255 - v));
            &self.scratch[..]
        } else {
            row
        };
        self.inner
            .write_all(out)
            .map_err(|e| EngraveError::io("forwarding scanline", e))
    }

    pub fn flush(&mut self) -> Result<()> {
        self.inner
            .flush()
            .map_err(|e| EngraveError::io("flushing scanlines", e))
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}
