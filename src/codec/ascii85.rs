//! ASCII85 (base-85) encoding as read by PostScript's `/ASCII85Decode`.

use std::io::{self, Write};

use crate::error::{EngraveError, Result};

/// Output line width.
pub const LINE_WIDTH: usize = 75;

/// Streaming ASCII85 encoder.
///
/// Lines are wrapped at [`LINE_WIDTH`] columns. A line never starts with
/// `%`, which a DSC reader would take for a comment; a leading space is
/// inserted instead (the decoder skips white space).
#[derive(Debug)]
pub struct Ascii85Writer<W: Write> {
    inner: W,
    group: [u8; 4],
    filled: usize,
    column: usize,
    finished: bool,
}

impl<W: Write> Ascii85Writer<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            group: [0; 4],
            filled: 0,
            column: 0,
            finished: false,
        }
    }

    pub fn get_mut(&mut self) -> &mut W {
        &mut self.inner
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn push(&mut self, byte: u8) -> io::Result<()> {
        self.group[self.filled] = byte;
        self.filled += 1;
        if self.filled == 4 {
            self.flush_group()?;
        }
        Ok(())
    }

    pub fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        for &b in bytes {
            self.push(b)?;
        }
        Ok(())
    }

    /// Flush the partial group and write the `~>` terminator.
    pub fn finish(&mut self) -> io::Result<()> {
        if self.finished {
            return Ok(());
        }
        if self.filled > 0 {
            self.flush_group()?;
        }
        self.emit(b'~')?;
        self.emit(b'>')?;
        self.inner.write_all(b"\n")?;
        self.column = 0;
        self.finished = true;
        Ok(())
    }

    fn flush_group(&mut self) -> io::Result<()> {
        let n = self.filled;
        for b in &mut self.group[n..] {
            *b = 0;
        }
        let value = u32::from_be_bytes(self.group);
        self.filled = 0;

        if n == 4 && value == 0 {
            return self.emit(b'z');
        }
        let mut digits = [0u8; 5];
        let mut v = value;
        for d in digits.iter_mut().rev() {
            *d = (v % 85) as u8 + b'!';
            v /= 85;
        }
        for &d in &digits[..n + 1] {
            self.emit(d)?;
        }
        Ok(())
    }

    fn emit(&mut self, ch: u8) -> io::Result<()> {
        if self.column >= LINE_WIDTH {
            self.inner.write_all(b"\n")?;
            self.column = 0;
        }
        if self.column == 0 && ch == b'%' {
            self.inner.write_all(b" ")?;
            self.column = 1;
        }
        self.inner.write_all(&[ch])?;
        self.column += 1;
        Ok(())
    }
}

/// Encode `bytes` as one terminated ASCII85 block.
pub fn encode(bytes: &[u8]) -> String {
    let mut writer = Ascii85Writer::new(Vec::new());
    // Writing into a Vec cannot fail.
    let _ = writer.write_all(bytes);
    let _ = writer.finish();
    String::from_utf8_lossy(&writer.inner).into_owned()
}

/// Decode an ASCII85 block up to its `~>` terminator.
pub fn decode(text: &str) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(text.len() * 4 / 5);
    let mut group = [0u8; 5];
    let mut filled = 0;
    let mut chars = text.bytes();

    loop {
        let Some(ch) = chars.next() else {
            return Err(EngraveError::Codec(
                "ASCII85 data ends without ~> terminator".to_string(),
            ));
        };
        match ch {
            b' ' | b'\t' | b'\r' | b'\n' | b'\x0c' | b'\0' => {}
            b'~' => {
                if chars.next() != Some(b'>') {
                    return Err(EngraveError::Codec("Malformed ASCII85 terminator".to_string()));
                }
                break;
            }
            b'z' if filled == 0 => out.extend_from_slice(&[0; 4]),
            b'!'..=b'u' => {
                group[filled] = ch - b'!';
                filled += 1;
                if filled == 5 {
                    out.extend_from_slice(&group_value(&group)?.to_be_bytes());
                    filled = 0;
                }
            }
            other => {
                return Err(EngraveError::Codec(format!(
                    "Invalid ASCII85 character 0x{other:02x}"
                )))
            }
        }
    }

    match filled {
        0 => {}
        1 => {
            return Err(EngraveError::Codec(
                "ASCII85 data ends with a single-character group".to_string(),
            ))
        }
        n => {
            for d in &mut group[n..] {
                *d = 84;
            }
            let bytes = group_value(&group)?.to_be_bytes();
            out.extend_from_slice(&bytes[..n - 1]);
        }
    }
    Ok(out)
}

fn group_value(digits: &[u8; 5]) -> Result<u32> {
    let value = digits.iter().fold(0u64, |acc, &d| acc * 85 + u64::from(d));
    u32::try_from(value).map_err(|_| EngraveError::Codec("ASCII85 group out of range".to_string()))
}
