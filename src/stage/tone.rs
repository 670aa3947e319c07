//! The `ct` stage: one continuous-tone plane per channel.

use std::io::{Read, Write};

use super::scanline::{ScanlineReader, ScanlineWriter};
use super::{remove_on_failure, StageContext};
use crate::cleanup::CleanupStack;
use crate::codec::ToneStream;
use crate::error::Result;
use crate::models::{ArtifactClass, Colorant};

pub fn run_tone<R: Read, W: Write>(ctx: &StageContext, input: R, output: W) -> Result<()> {
    let mut cleanup = CleanupStack::new("ct");
    let codec = ctx.codec();

    let mut planes: Vec<(Colorant, usize, Box<dyn ToneStream>)> = Vec::new();
    for &colorant in ctx.mode.colorants() {
        let path = ctx.artifact_path(ArtifactClass::Tone, colorant);
        remove_on_failure(&mut cleanup, path.clone());
        let stream = codec.open_tone_stream(&path)?;
        planes.push((colorant, ctx.mode.offset_of(colorant), stream));
    }

    let ss = ctx.mode.sample_size();
    let width = ctx.geometry.width as usize;
    let mut samples = vec![0u8; width];
    let mut reader = ScanlineReader::new(input, ctx.row_bytes(), ctx.geometry.height, false);
    let mut writer = ScanlineWriter::new(output, false);

    for _ in 0..ctx.geometry.height {
        let row = reader.read_row()?;
        for (_, offset, stream) in planes.iter_mut() {
            for (x, sample) in samples.iter_mut().enumerate() {
                *sample = row[x * ss + *offset];
            }
            stream.write_tone_row(&samples)?;
        }
        writer.write_row(row)?;
    }

    for (colorant, _, stream) in planes.iter_mut() {
        stream.close()?;
        tracing::debug!(stage = ctx.index, channel = %colorant, "Tone plane written");
    }
    writer.flush()?;
    tracing::info!(stage = ctx.index, rows = reader.line(), "ct finished");
    cleanup.succeed();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ColorMode, Convention, ImageGeometry, OutputFormat};
    use std::path::Path;

    fn context(dir: &Path, mode: ColorMode, format: OutputFormat) -> StageContext {
        StageContext {
            pid: 3,
            index: 1,
            geometry: ImageGeometry::new(2, 2, 72.0, 72.0),
            mode,
            convention: Convention::Density,
            format,
            verbose: 0,
            tmp_dir: dir.to_path_buf(),
        }
    }

    #[test]
    fn test_splits_channels_and_forwards_rows() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path(), ColorMode::Cmyk, OutputFormat::Eps);
        // Two CMYK rows; cyan is 'M','a','n',' '.
        let input: Vec<u8> = vec![
            b'M', 0, 0, 9, b'a', 0, 0, 9, //
            b'n', 0, 0, 9, b' ', 0, 0, 9,
        ];
        let mut output = Vec::new();
        run_tone(&ctx, &input[..], &mut output).unwrap();

        assert_eq!(output, input);
        let cyan = std::fs::read_to_string(ctx.artifact_path(ArtifactClass::Tone, Colorant::Cyan))
            .unwrap();
        assert!(cyan.contains("image\n9jqo^~>\n"));
        let magenta =
            std::fs::read_to_string(ctx.artifact_path(ArtifactClass::Tone, Colorant::Magenta))
                .unwrap();
        assert!(magenta.contains("image\nz~>\n"));
    }

    #[test]
    fn test_short_read_removes_planes() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path(), ColorMode::Gray, OutputFormat::Raster);
        let err = run_tone(&ctx, &[1u8, 2, 3][..], Vec::new()).unwrap_err();
        assert!(matches!(err, crate::error::EngraveError::ShortRead { line: 1 }));
        assert!(!ctx.artifact_path(ArtifactClass::Tone, Colorant::Black).exists());
    }
}
