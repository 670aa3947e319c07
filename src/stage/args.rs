use std::path::PathBuf;

use crate::artifact::ArtifactKey;
use crate::cli::StageArgs;
use crate::codec::{codec_for, CodecParams, StreamCodec};
use crate::error::{EngraveError, Result};
use crate::models::{ArtifactClass, ColorMode, Colorant, Convention, ImageGeometry, OutputFormat};

/// Validated arguments shared by every stage process.
#[derive(Debug, Clone)]
pub struct StageContext {
    pub pid: u32,
    pub index: usize,
    pub geometry: ImageGeometry,
    pub mode: ColorMode,
    pub convention: Convention,
    pub format: OutputFormat,
    pub verbose: u8,
    /// Artifact directory; the orchestrator points `TMPDIR` at it.
    pub tmp_dir: PathBuf,
}

impl StageContext {
    pub fn from_args(args: &StageArgs) -> Result<Self> {
        let geometry = ImageGeometry::new(args.width, args.height, args.hres, args.vres);
        geometry.validate()?;
        let mode = if args.cmyk {
            ColorMode::Cmyk
        } else {
            ColorMode::Gray
        };
        let convention = Convention::from_flags(args.density, args.intensity, mode)?;
        let pid = args.pid.ok_or_else(|| {
            EngraveError::Config("Can't create temp. file: parent PID isn't set".to_string())
        })?;
        Ok(Self {
            pid,
            index: args.index,
            geometry,
            mode,
            convention,
            format: args.format.parse()?,
            verbose: args.verbose,
            tmp_dir: std::env::temp_dir(),
        })
    }

    /// Where this stage writes one artifact.
    pub fn artifact_path(&self, class: ArtifactClass, colorant: Colorant) -> PathBuf {
        ArtifactKey::new(self.pid, self.index, class, colorant).path_in(&self.tmp_dir)
    }

    pub fn codec(&self) -> Box<dyn StreamCodec> {
        codec_for(
            self.format,
            CodecParams {
                geometry: self.geometry,
                convention: self.convention,
            },
        )
    }

    /// Bytes in one interleaved scanline.
    pub fn row_bytes(&self) -> usize {
        self.geometry.width as usize * self.mode.sample_size()
    }

    /// Stage input arrives in density convention and must be inverted.
    pub fn inverts(&self) -> bool {
        self.convention == Convention::Density
    }
}
