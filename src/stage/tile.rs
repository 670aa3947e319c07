//! The `tile32` stage: classify every channel and write its stroke and
//! mask tile planes.

use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use adaptive_screen::{
    ChannelPass, Polarity, ScanWindow, ScreenOptions, TileHistogram, TileMapper, TilePlanes,
};

use super::scanline::{ScanlineReader, ScanlineWriter};
use super::{remove_on_failure, StageContext};
use crate::cleanup::CleanupStack;
use crate::cli::Tile32Args;
use crate::codec::{StreamCodec, TileStream};
use crate::error::{EngraveError, Result};
use crate::models::{ArtifactClass, Colorant, ColorantSet};

/// Tile planes a `tile32` run writes (`--select-mask`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaneSelection {
    /// `B`
    pub stroke: bool,
    /// `W`
    pub mask: bool,
}

impl Default for PlaneSelection {
    fn default() -> Self {
        Self {
            stroke: true,
            mask: true,
        }
    }
}

impl FromStr for PlaneSelection {
    type Err = EngraveError;

    fn from_str(s: &str) -> Result<Self> {
        let mut selection = PlaneSelection {
            stroke: false,
            mask: false,
        };
        for ch in s.chars() {
            match ch.to_ascii_uppercase() {
                'B' => selection.stroke = true,
                'W' => selection.mask = true,
                other => {
                    return Err(EngraveError::Config(format!(
                        "Unknown correction image '{other}' in --select-mask (use B and/or W)"
                    )))
                }
            }
        }
        if !selection.stroke && !selection.mask {
            return Err(EngraveError::Config(
                "--select-mask must name at least one of B, W".to_string(),
            ));
        }
        Ok(selection)
    }
}

/// Settings of one `tile32` run.
#[derive(Debug, Clone, Default)]
pub struct TileStage {
    pub options: ScreenOptions,
    pub passthrough: ColorantSet,
    pub planes: PlaneSelection,
    pub half: bool,
    pub histogram_path: Option<PathBuf>,
}

struct ChannelOutput {
    colorant: Colorant,
    pass: ChannelPass,
    mapper: TileMapper,
    stroke: Option<Box<dyn TileStream>>,
    mask: Option<Box<dyn TileStream>>,
}

impl ChannelOutput {
    fn map_row(&mut self, scan: &ScanWindow, background: &mut [u8]) -> Result<()> {
        let mut planes = TilePlanes {
            stroke: self.stroke.as_deref_mut().map(|s| s.as_sink()),
            mask: self.mask.as_deref_mut().map(|s| s.as_sink()),
        };
        self.mapper.map_row(scan, self.pass, background, &mut planes)?;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        let mut planes = TilePlanes {
            stroke: self.stroke.as_deref_mut().map(|s| s.as_sink()),
            mask: self.mask.as_deref_mut().map(|s| s.as_sink()),
        };
        self.mapper.finish(&mut planes)?;
        for stream in [self.stroke.as_mut(), self.mask.as_mut()].into_iter().flatten() {
            stream.close()?;
        }
        Ok(())
    }
}

impl TileStage {
    pub fn from_args(args: &Tile32Args) -> Result<Self> {
        let mut options = ScreenOptions::new().crossing_test(!args.ignore_outtest);
        if let Some(v) = args.value_thr {
            options = options.value_threshold(v);
        }
        if let Some(v) = args.sum_thr {
            options = options.summary_threshold(v);
        }
        if let Some(v) = args.dia_corr {
            options = options.diagonal_correlation(v);
        }
        if let Some(v) = args.minarea {
            options = options.min_area(v);
        }
        options.validate()?;

        Ok(Self {
            options,
            passthrough: match &args.passthrough {
                Some(letters) => letters.parse()?,
                None => ColorantSet::EMPTY,
            },
            planes: match &args.select_mask {
                Some(letters) => letters.parse()?,
                None => PlaneSelection::default(),
            },
            half: args.half,
            histogram_path: args.hist.clone(),
        })
    }

    /// Screen `input` into the artifacts of `ctx` and forward the resolved
    /// background rows to `output`.
    pub fn run<R: Read, W: Write>(
        &self,
        ctx: &StageContext,
        input: R,
        output: W,
    ) -> Result<TileHistogram> {
        let mut cleanup = CleanupStack::new("tile32");
        self.log_settings(ctx);

        let codec = ctx.codec();
        let mut channels = Vec::new();
        for &colorant in ctx.mode.colorants() {
            let stroke = self
                .planes
                .stroke
                .then(|| open_plane(&mut cleanup, codec.as_ref(), ctx, Polarity::Stroke, colorant))
                .transpose()?;
            let mask = self
                .planes
                .mask
                .then(|| open_plane(&mut cleanup, codec.as_ref(), ctx, Polarity::Mask, colorant))
                .transpose()?;
            channels.push(ChannelOutput {
                colorant,
                pass: ChannelPass {
                    offset: ctx.mode.offset_of(colorant),
                    passthrough: self.passthrough.contains(colorant),
                    left_half_only: self.half,
                },
                mapper: TileMapper::new(self.options.clone()),
                stroke,
                mask,
            });
        }

        let height = ctx.geometry.height;
        let mut scan = ScanWindow::new(ctx.geometry.width as usize, ctx.mode.sample_size())?;
        let mut reader = ScanlineReader::new(input, ctx.row_bytes(), height, ctx.inverts());
        let mut writer = ScanlineWriter::new(output, ctx.inverts());
        let mut background = vec![0u8; ctx.row_bytes()];

        scan.push(Some(reader.read_row()?))?;
        for _ in 1..3 {
            push_next(&mut scan, &mut reader, height)?;
        }
        for y in 0..height {
            for channel in channels.iter_mut() {
                channel.map_row(&scan, &mut background)?;
            }
            writer.write_row(&background)?;
            if y + 1 < height {
                push_next(&mut scan, &mut reader, height)?;
            }
        }

        let mut histogram = TileHistogram::new();
        for channel in channels.iter_mut() {
            channel.finish()?;
            let h = channel.mapper.histogram();
            tracing::debug!(
                stage = ctx.index,
                channel = %channel.colorant,
                stroke = h.tiles(Polarity::Stroke),
                mask = h.tiles(Polarity::Mask),
                "Channel screened"
            );
            histogram.merge(h);
        }
        writer.flush()?;

        if let Some(path) = &self.histogram_path {
            if let Err(e) = write_histogram(path, &histogram) {
                tracing::warn!(path = %path.display(), error = %e, "Can't write histogram");
            }
        }

        tracing::info!(
            stage = ctx.index,
            empty = histogram.empty(),
            stroke = histogram.tiles(Polarity::Stroke),
            mask = histogram.tiles(Polarity::Mask),
            "tile32 finished"
        );
        cleanup.succeed();
        Ok(histogram)
    }

    fn log_settings(&self, ctx: &StageContext) {
        let o = &self.options;
        tracing::info!(
            stage = ctx.index,
            value_threshold = o.value_threshold,
            summary_threshold = o.summary_threshold,
            diagonal_correlation = o.diagonal_correlation,
            min_area = o.min_area,
            crossing_test = o.crossing_test,
            passthrough = %self.passthrough,
            stroke = self.planes.stroke,
            mask = self.planes.mask,
            "tile32 settings"
        );
    }
}

fn open_plane(
    cleanup: &mut CleanupStack,
    codec: &dyn StreamCodec,
    ctx: &StageContext,
    polarity: Polarity,
    colorant: Colorant,
) -> Result<Box<dyn TileStream>> {
    let path = ctx.artifact_path(ArtifactClass::for_polarity(polarity), colorant);
    remove_on_failure(cleanup, path.clone());
    tracing::debug!(path = %path.display(), %polarity, "Opening tile plane");
    codec.open_tile_stream(&path, polarity)
}

/// Advance the window by one row; past the last scanline the bottom row
/// repeats.
fn push_next<R: Read>(
    scan: &mut ScanWindow,
    reader: &mut ScanlineReader<R>,
    height: u32,
) -> Result<()> {
    if reader.line() < height {
        scan.push(Some(reader.read_row()?))?;
    } else {
        scan.push(None)?;
    }
    Ok(())
}

fn write_histogram(path: &Path, histogram: &TileHistogram) -> std::io::Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    histogram.write_to(&mut out)?;
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::symbolic::{decode_tile_artifact, TileRecord};
    use crate::models::{ColorMode, Convention, ImageGeometry, OutputFormat};
    use adaptive_screen::TileShape;
    use pretty_assertions::assert_eq;

    fn context(dir: &Path, width: u32, height: u32, mode: ColorMode) -> StageContext {
        StageContext {
            pid: 9,
            index: 0,
            geometry: ImageGeometry::new(width, height, 300.0, 300.0),
            mode,
            convention: Convention::Intensity,
            format: OutputFormat::Eps,
            verbose: 0,
            tmp_dir: dir.to_path_buf(),
        }
    }

    fn records(ctx: &StageContext, class: ArtifactClass, colorant: Colorant) -> Vec<TileRecord> {
        let text = std::fs::read_to_string(ctx.artifact_path(class, colorant)).unwrap();
        decode_tile_artifact(&text).unwrap().records
    }

    fn tiles(records: &[TileRecord]) -> Vec<TileShape> {
        records
            .iter()
            .filter_map(|r| match r {
                TileRecord::Tile { shape, .. } => Some(*shape),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_flat_image_has_no_tiles() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path(), 4, 4, ColorMode::Gray);
        let input = vec![128u8; 16];
        let mut output = Vec::new();

        let histogram = TileStage::default().run(&ctx, &input[..], &mut output).unwrap();

        assert_eq!(histogram.empty(), 16);
        assert_eq!(output, input);
        for class in [ArtifactClass::Stroke, ArtifactClass::Mask] {
            assert_eq!(
                records(&ctx, class, Colorant::Black),
                vec![TileRecord::BlankRows { count: 4 }]
            );
        }
    }

    #[test]
    fn test_bright_line_becomes_line_tiles() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path(), 4, 4, ColorMode::Gray);
        let input: Vec<u8> = [100u8, 100, 200, 100]
            .iter()
            .flat_map(|v| [*v; 4])
            .collect();
        let mut output = Vec::new();

        TileStage::default().run(&ctx, &input[..], &mut output).unwrap();

        let stroke = records(&ctx, ArtifactClass::Stroke, Colorant::Black);
        let mask = records(&ctx, ArtifactClass::Mask, Colorant::Black);
        let mut shapes = tiles(&stroke);
        shapes.extend(tiles(&mask));
        assert_eq!(shapes, vec![TileShape::WestLine; 4]);

        let lined = if tiles(&stroke).is_empty() { &mask } else { &stroke };
        assert_eq!(lined[0], TileRecord::BlankRows { count: 2 });
        assert_eq!(lined.last(), Some(&TileRecord::BlankRows { count: 2 }));
        assert_eq!(output.len(), 16);
    }

    #[test]
    fn test_passthrough_channel_stays_empty() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path(), 4, 4, ColorMode::Cmyk);
        let input: Vec<u8> = [100u8, 100, 200, 100]
            .iter()
            .flat_map(|v| [*v; 16])
            .collect();
        let mut output = Vec::new();
        let stage = TileStage {
            passthrough: "C".parse().unwrap(),
            ..TileStage::default()
        };

        stage.run(&ctx, &input[..], &mut output).unwrap();

        for colorant in Colorant::ALL {
            let mut count = tiles(&records(&ctx, ArtifactClass::Stroke, colorant)).len();
            count += tiles(&records(&ctx, ArtifactClass::Mask, colorant)).len();
            let expected = if colorant == Colorant::Cyan { 0 } else { 4 };
            assert_eq!(count, expected, "{colorant}");
        }
        for (out, inp) in output.chunks(4).zip(input.chunks(4)) {
            assert_eq!(out[0], inp[0]);
        }
    }

    #[test]
    fn test_select_mask_writes_only_chosen_plane() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path(), 2, 2, ColorMode::Gray);
        let stage = TileStage {
            planes: "B".parse().unwrap(),
            ..TileStage::default()
        };
        stage.run(&ctx, &[50u8; 4][..], Vec::new()).unwrap();
        assert!(ctx.artifact_path(ArtifactClass::Stroke, Colorant::Black).exists());
        assert!(!ctx.artifact_path(ArtifactClass::Mask, Colorant::Black).exists());
    }

    #[test]
    fn test_short_read_removes_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path(), 4, 4, ColorMode::Gray);
        let err = TileStage::default()
            .run(&ctx, &[128u8; 10][..], Vec::new())
            .unwrap_err();
        assert!(matches!(err, EngraveError::ShortRead { line: 2 }));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_histogram_file() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path(), 2, 2, ColorMode::Gray);
        let hist = dir.path().join("hist.txt");
        let stage = TileStage {
            histogram_path: Some(hist.clone()),
            ..TileStage::default()
        };
        stage.run(&ctx, &[50u8; 4][..], Vec::new()).unwrap();
        let text = std::fs::read_to_string(hist).unwrap();
        assert!(text.starts_with("#0: 4\n#1: 0\n"));
    }

    #[test]
    fn test_unwritable_histogram_only_warns() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path(), 2, 2, ColorMode::Gray);
        let stage = TileStage {
            histogram_path: Some(dir.path().join("missing/hist.txt")),
            ..TileStage::default()
        };
        assert!(stage.run(&ctx, &[50u8; 4][..], Vec::new()).is_ok());
    }

    #[test]
    fn test_options_from_args() {
        let args = Tile32Args {
            ignore_outtest: true,
            minarea: Some(5),
            value_thr: Some(20),
            passthrough: Some("cm".to_string()),
            select_mask: Some("w".to_string()),
            ..Tile32Args::default()
        };
        let stage = TileStage::from_args(&args).unwrap();
        assert!(!stage.options.crossing_test);
        assert_eq!(stage.options.min_area, 5);
        assert_eq!(stage.options.value_threshold, 20);
        assert_eq!(stage.passthrough.to_string(), "CM");
        assert_eq!(
            stage.planes,
            PlaneSelection {
                stroke: false,
                mask: true
            }
        );

        let bad = Tile32Args {
            select_mask: Some("BX".to_string()),
            ..Tile32Args::default()
        };
        assert!(TileStage::from_args(&bad).unwrap_err().is_config());

        let bad = Tile32Args {
            value_thr: Some(400),
            ..Tile32Args::default()
        };
        assert!(TileStage::from_args(&bad).unwrap_err().is_config());
    }
}
