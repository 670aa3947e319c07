//! Raster backend: PNG planes.
//!
//! Tile planes are 1-bit at six times the image size; every tile is drawn
//! by slicing its weight map at the tile's coverage. PNG grayscale is
//! min-is-black, so polarity is expressed by value: stroke planes draw ink
//! as black on white, mask planes draw knocked-out area as white on black.
//! Tone planes are 8-bit at native size, stored as display intensity.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use adaptive_screen::{Polarity, TilePattern, TileShape, TileSink, TILE_SIDE};

use super::{CodecParams, StreamCodec, TileStream, ToneStream};
use crate::error::{EngraveError, Result};
use crate::models::{Convention, OutputFormat};

const METERS_PER_INCH: f64 = 0.0254;

type PngStream = png::StreamWriter<'static, BufWriter<File>>;

#[derive(Debug, Clone, Copy)]
pub struct RasterCodec {
    params: CodecParams,
}

impl RasterCodec {
    pub fn new(params: CodecParams) -> Self {
        Self { params }
    }

    /// `scale` multiplies both the pixel size and the resolution.
    fn open_png(
        &self,
        path: &Path,
        scale: u32,
        depth: png::BitDepth,
    ) -> Result<png::Writer<BufWriter<File>>> {
        let g = self.params.geometry;
        let file = File::create(path)
            .map_err(|e| EngraveError::io(format!("creating {}", path.display()), e))?;
        let mut encoder = png::Encoder::new(BufWriter::new(file), g.width * scale, g.height * scale);
        encoder.set_color(png::ColorType::Grayscale);
        encoder.set_depth(depth);
        encoder.set_compression(png::Compression::Fast);
        encoder.set_pixel_dims(Some(png::PixelDimensions {
            xppu: pixels_per_meter(g.hres * f64::from(scale)),
            yppu: pixels_per_meter(g.vres * f64::from(scale)),
            unit: png::Unit::Meter,
        }));
        Ok(encoder.write_header()?)
    }
}

fn pixels_per_meter(dpi: f64) -> u32 {
    (dpi / METERS_PER_INCH).round() as u32
}

fn encode_error(e: png::EncodingError) -> io::Error {
    io::Error::other(e)
}

impl StreamCodec for RasterCodec {
    fn format(&self) -> OutputFormat {
        OutputFormat::Raster
    }

    fn open_tile_stream(&self, path: &Path, polarity: Polarity) -> Result<Box<dyn TileStream>> {
        let width = self.params.geometry.width as usize;
        let writer = self
            .open_png(path, TILE_SIDE as u32, png::BitDepth::One)?
            .into_stream_writer()?;
        let stride = (width * TILE_SIDE).div_ceil(8);
        let blank = match polarity {
            Polarity::Stroke => 0xFF,
            Polarity::Mask => 0x00,
        };
        Ok(Box::new(RasterTileStream {
            writer: Some(writer),
            block: vec![blank; stride * TILE_SIDE],
            stride,
            blank,
            width,
            height: self.params.geometry.height,
            x: 0,
            blocks_written: 0,
        }))
    }

    fn open_tone_stream(&self, path: &Path) -> Result<Box<dyn ToneStream>> {
        let writer = self
            .open_png(path, 1, png::BitDepth::Eight)?
            .into_stream_writer()?;
        Ok(Box::new(RasterToneStream {
            writer: Some(writer),
            width: self.params.geometry.width as usize,
            height: self.params.geometry.height,
            invert: self.params.convention == Convention::Density,
            rows_written: 0,
        }))
    }

    fn write_background(&self, path: &Path, ink: f64) -> Result<()> {
        let g = self.params.geometry;
        let value = (255.0 * (1.0 - ink.clamp(0.0, 1.0))).round() as u8;
        let mut writer = self.open_png(path, 1, png::BitDepth::Eight)?;
        let plane = vec![value; g.width as usize * g.height as usize];
        writer.write_image_data(&plane)?;
        writer.finish()?;
        Ok(())
    }
}

struct RasterTileStream {
    writer: Option<PngStream>,
    /// One row of tiles: `TILE_SIDE` pixel rows of `stride` bytes.
    block: Vec<u8>,
    stride: usize,
    /// Fill byte of an empty block.
    blank: u8,
    width: usize,
    height: u32,
    /// Next slot in the current block.
    x: usize,
    blocks_written: u32,
}

impl RasterTileStream {
    fn emit_block(&mut self) -> io::Result<()> {
        if self.blocks_written >= self.height {
            return Ok(());
        }
        if let Some(writer) = self.writer.as_mut() {
            writer.write_all(&self.block)?;
        }
        self.block.fill(self.blank);
        self.blocks_written += 1;
        Ok(())
    }

    fn mark(&mut self, px: usize, py: usize) {
        let byte = &mut self.block[py * self.stride + px / 8];
        let bit = 0x80 >> (px % 8);
        if self.blank == 0 {
            *byte |= bit;
        } else {
            *byte &= !bit;
        }
    }
}

impl TileSink for RasterTileStream {
    fn write_blank_rows(&mut self, rows: u32) -> io::Result<()> {
        for _ in 0..rows {
            if self.blocks_written >= self.height {
                break;
            }
            self.emit_block()?;
        }
        self.x = 0;
        Ok(())
    }

    fn write_blank_slots(&mut self, slots: u32) -> io::Result<()> {
        self.x += slots as usize;
        Ok(())
    }

    fn write_tile(&mut self, shape: TileShape, coverage: u8) -> io::Result<()> {
        if self.x >= self.width {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("tile slot {} beyond image width {}", self.x, self.width),
            ));
        }
        let pattern = TilePattern::slice(Some(shape), coverage);
        let left = self.x * TILE_SIDE;
        for ty in 0..TILE_SIDE {
            for tx in 0..TILE_SIDE {
                if pattern.is_set(tx, ty) {
                    self.mark(left + tx, ty);
                }
            }
        }
        self.x += 1;
        Ok(())
    }
}

impl TileStream for RasterTileStream {
    fn close(&mut self) -> io::Result<()> {
        if self.writer.is_none() {
            return Ok(());
        }
        while self.blocks_written < self.height {
            self.emit_block()?;
        }
        if let Some(writer) = self.writer.take() {
            writer.finish().map_err(encode_error)?;
        }
        Ok(())
    }

    fn as_sink(&mut self) -> &mut dyn TileSink {
        self
    }
}

impl Drop for RasterTileStream {
    fn drop(&mut self) {
        let _ = TileStream::close(self);
    }
}

struct RasterToneStream {
    writer: Option<PngStream>,
    width: usize,
    height: u32,
    invert: bool,
    rows_written: u32,
}

impl ToneStream for RasterToneStream {
    fn write_tone_row(&mut self, samples: &[u8]) -> io::Result<()> {
        if samples.len() != self.width {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("tone row of {} samples, expected {}", samples.len(), self.width),
            ));
        }
        if self.rows_written >= self.height {
            return Ok(());
        }
        let Some(writer) = self.writer.as_mut() else {
            return Ok(());
        };
        if self.invert {
            let row: Vec<u8> = samples.iter().map(|v| 255 - v).collect();
            writer.write_all(&row)?;
        } else {
            writer.write_all(samples)?;
        }
        self.rows_written += 1;
        Ok(())
    }

    fn close(&mut self) -> io::Result<()> {
        let Some(mut writer) = self.writer.take() else {
            return Ok(());
        };
        let white = vec![0xFF; self.width];
        while self.rows_written < self.height {
            writer.write_all(&white)?;
            self.rows_written += 1;
        }
        writer.finish().map_err(encode_error)
    }
}

impl Drop for RasterToneStream {
    fn drop(&mut self) {
        let _ = ToneStream::close(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ImageGeometry;
    use pretty_assertions::assert_eq;

    struct Plane {
        width: u32,
        height: u32,
        stride: usize,
        data: Vec<u8>,
        dims: Option<png::PixelDimensions>,
    }

    impl Plane {
        fn bit(&self, x: usize, y: usize) -> u8 {
            (self.data[y * self.stride + x / 8] >> (7 - x % 8)) & 1
        }

        fn byte(&self, x: usize, y: usize) -> u8 {
            self.data[y * self.stride + x]
        }
    }

    fn read_png(path: &Path) -> Plane {
        let mut decoder = png::Decoder::new(File::open(path).unwrap());
        decoder.set_transformations(png::Transformations::IDENTITY);
        let mut reader = decoder.read_info().unwrap();
        let mut data = vec![0; reader.output_buffer_size()];
        let frame = reader.next_frame(&mut data).unwrap();
        Plane {
            width: frame.width,
            height: frame.height,
            stride: frame.line_size,
            data,
            dims: reader.info().pixel_dims,
        }
    }

    fn codec(convention: Convention) -> RasterCodec {
        RasterCodec::new(CodecParams {
            geometry: ImageGeometry::new(3, 2, 300.0, 150.0),
            convention,
        })
    }

    fn shape(code: u8) -> TileShape {
        TileShape::from_code(code).unwrap()
    }

    #[test]
    fn test_stroke_tile_matches_sliced_weights() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("1.0.s.k");
        let mut stream = codec(Convention::Intensity)
            .open_tile_stream(&path, Polarity::Stroke)
            .unwrap();
        stream.write_blank_slots(1).unwrap();
        stream.write_tile(shape(5), 128).unwrap();
        stream.write_blank_rows(2).unwrap();
        stream.close().unwrap();
        drop(stream);

        let plane = read_png(&path);
        assert_eq!((plane.width, plane.height), (18, 12));
        let pattern = TilePattern::slice(Some(shape(5)), 128);
        for y in 0..12 {
            for x in 0..18 {
                let inked = (6..12).contains(&x) && y < 6 && pattern.is_set(x - 6, y);
                assert_eq!(plane.bit(x, y), u8::from(!inked), "pixel {x},{y}");
            }
        }
        let dims = plane.dims.unwrap();
        assert_eq!(dims.unit, png::Unit::Meter);
        assert_eq!(dims.xppu, pixels_per_meter(1800.0));
        assert_eq!(dims.yppu, pixels_per_meter(900.0));
    }

    #[test]
    fn test_mask_plane_is_padded_on_close() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("1.0.m.k");
        let mut stream = codec(Convention::Intensity)
            .open_tile_stream(&path, Polarity::Mask)
            .unwrap();
        stream.write_tile(shape(1), 255).unwrap();
        stream.close().unwrap();
        drop(stream);

        let plane = read_png(&path);
        assert_eq!(plane.height, 12);
        for y in 0..12 {
            for x in 0..18 {
                let knocked_out = x < 6 && y < 6;
                assert_eq!(plane.bit(x, y), u8::from(knocked_out), "pixel {x},{y}");
            }
        }
    }

    #[test]
    fn test_tile_beyond_width_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut stream = codec(Convention::Intensity)
            .open_tile_stream(&dir.path().join("x"), Polarity::Stroke)
            .unwrap();
        stream.write_blank_slots(3).unwrap();
        assert!(stream.write_tile(shape(1), 10).is_err());
    }

    #[test]
    fn test_density_tone_plane_is_inverted_and_padded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("1.1.ct.c");
        let mut stream = codec(Convention::Density).open_tone_stream(&path).unwrap();
        stream.write_tone_row(&[0, 255, 10]).unwrap();
        assert!(stream.write_tone_row(&[1, 2]).is_err());
        stream.close().unwrap();
        drop(stream);

        let plane = read_png(&path);
        assert_eq!((plane.width, plane.height), (3, 2));
        let rows: Vec<Vec<u8>> = (0..2)
            .map(|y| (0..3).map(|x| plane.byte(x, y)).collect())
            .collect();
        assert_eq!(rows, vec![vec![255, 0, 245], vec![255, 255, 255]]);
        assert_eq!(plane.dims.unwrap().xppu, pixels_per_meter(300.0));
    }

    #[test]
    fn test_intensity_tone_plane_is_stored_as_is() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("1.1.ct.k");
        let mut stream = codec(Convention::Intensity).open_tone_stream(&path).unwrap();
        stream.write_tone_row(&[0, 128, 255]).unwrap();
        stream.write_tone_row(&[1, 2, 3]).unwrap();
        stream.close().unwrap();
        drop(stream);

        let plane = read_png(&path);
        assert_eq!(plane.byte(1, 0), 128);
        assert_eq!(plane.byte(2, 1), 3);
    }

    #[test]
    fn test_background_plane() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("1.0.ct.y");
        codec(Convention::Density).write_background(&path, 0.25).unwrap();
        let plane = read_png(&path);
        assert!(plane.data.iter().all(|v| *v == 191));
    }
}
