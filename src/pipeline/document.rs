//! Final document assembly from the stage artifacts.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

use super::chain::StageDescriptor;
use crate::artifact::ArtifactKey;
use crate::cleanup::CleanupStack;
use crate::error::{EngraveError, Result};
use crate::models::{
    ArtifactClass, ColorMode, Colorant, EngraveConfig, OutputFormat, OutputTarget,
};

const VERSION: &str = env!("CARGO_PKG_VERSION");

const PAGE_SETUP: &str = "%%EndProlog\n%%Page: 1 1\ngsave\t% Save grafics state\ntrue setoverprint\n";
const TRAILER: &str = "end\ngrestore\t% Restore previous graphic state\nshowpage\n%%EOF\n";

/// Everything the assembler reads besides the configuration.
pub struct Document<'a> {
    config: &'a EngraveConfig,
    pid: u32,
    stages: &'a [StageDescriptor],
}

impl<'a> Document<'a> {
    pub fn new(config: &'a EngraveConfig, pid: u32, stages: &'a [StageDescriptor]) -> Self {
        Self {
            config,
            pid,
            stages,
        }
    }

    fn artifact(&self, stage: usize, class: ArtifactClass, colorant: Colorant) -> PathBuf {
        ArtifactKey::new(self.pid, stage, class, colorant).path_in(&self.config.tmp_dir)
    }

    fn title(&self) -> String {
        match &self.config.input {
            Some(path) => path.display().to_string(),
            None => "stdin".to_string(),
        }
    }

    /// Write the document to its target. A file target is written next to
    /// its final name and renamed into place only when complete.
    pub fn assemble(&self) -> Result<()> {
        match &self.config.output {
            OutputTarget::Stdout => {
                let mut out = BufWriter::new(io::stdout().lock());
                self.write_eps(&mut out, Local::now())?;
                out.flush()
                    .map_err(|e| EngraveError::io("writing the document to stdout", e))
            }
            OutputTarget::File(path) => match self.config.format {
                OutputFormat::Eps => {
                    persist_with(path, |out| self.write_eps(out, Local::now()))
                }
                OutputFormat::Raster => self.assemble_raster(path),
            },
        }
    }

    /// The EPS document: DSC header, prolog, one section per colorant.
    pub fn write_eps<W: Write>(&self, out: &mut W, created: DateTime<Local>) -> Result<()> {
        let io_err = |e| EngraveError::io("writing the EPS document", e);
        let g = self.config.geometry;
        let process_colors = match self.config.mode {
            ColorMode::Cmyk => "Cyan Magenta Yellow Black",
            ColorMode::Gray => "Black",
        };

        write!(
            out,
            "%!PS-Adobe-3.0 EPSF-3.0\n\
             %%Creator: engrave {VERSION}. Adaptive Screening Technology.\n\
             %%Title: {}\n\
             %%CreationDate: {}\n\
             %%DocumentData: Clean7Bit\n\
             %%LanguageLevel: 2\n\
             %%Pages: 1\n\
             %%BoundingBox: 0 0 {:.0} {:.0}\n\
             %%DocumentProcessColors: {process_colors}\n\
             %%EndComments\n\
             %%BeginProlog\n\
             % Use own dictionary to avoid conflicts\n\
             40 dict begin\n",
            self.title(),
            created.format("%Y-%m-%d %H:%M:%S"),
            g.width_pt(),
            g.height_pt(),
        )
        .map_err(io_err)?;

        for library in self.prolog_files() {
            tracing::info!(path = %library.display(), "Including file");
            append_file(out, &library)?;
        }
        out.write_all(PAGE_SETUP.as_bytes()).map_err(io_err)?;

        for colorant in self.config.selected_colorants() {
            write!(
                out,
                "% Painting '{}' image color\n{}\n",
                colorant.name(),
                colorant.separation()
            )
            .map_err(io_err)?;
            for class in ArtifactClass::MERGE_ORDER {
                writeln!(out, "% Painting {} images", class.heading()).map_err(io_err)?;
                for stage in self.stages {
                    let path = self.artifact(stage.index, class, colorant);
                    if path.exists() {
                        append_file(out, &path)?;
                    } else {
                        tracing::debug!(path = %path.display(), "No artifact, skipped");
                    }
                }
            }
        }

        out.write_all(TRAILER.as_bytes()).map_err(io_err)?;
        Ok(())
    }

    /// `<psdir>/<filter>.ps` for every distinct filter that has one.
    fn prolog_files(&self) -> Vec<PathBuf> {
        let Some(dir) = &self.config.ps_dir else {
            return Vec::new();
        };
        let mut seen: Vec<&str> = Vec::new();
        let mut files = Vec::new();
        for stage in self.stages {
            if seen.contains(&stage.name.as_str()) {
                continue;
            }
            seen.push(&stage.name);
            let path = dir.join(format!("{}.ps", stage.name));
            if path.is_file() {
                files.push(path);
            }
        }
        files
    }

    /// Copy every raster plane next to `manifest_path` and list them there.
    fn assemble_raster(&self, manifest_path: &Path) -> Result<()> {
        let dir = parent_dir(manifest_path);
        let stem = manifest_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "output".to_string());

        let mut cleanup = CleanupStack::new("raster document");
        let mut entries = Vec::new();
        for colorant in self.config.selected_colorants() {
            for class in ArtifactClass::MERGE_ORDER {
                for stage in self.stages {
                    let source = self.artifact(stage.index, class, colorant);
                    if !source.exists() {
                        continue;
                    }
                    let name = format!(
                        "{stem}.{}.{}.{}.png",
                        stage.index,
                        class.suffix(),
                        colorant.suffix()
                    );
                    let target = dir.join(&name);
                    let copied = target.clone();
                    cleanup.defer_on_failure(format!("remove {}", target.display()), move || {
                        let _ = std::fs::remove_file(&copied);
                    });
                    std::fs::copy(&source, &target).map_err(|e| {
                        EngraveError::io(format!("copying {} to {}", source.display(), target.display()), e)
                    })?;
                    tracing::debug!(path = %target.display(), "Raster plane placed");
                    entries.push((stage.index, class, colorant, name));
                }
            }
        }

        let g = self.config.geometry;
        persist_with(manifest_path, |out| {
            let io_err = |e| EngraveError::io("writing the raster manifest", e);
            write!(
                out,
                "# engrave {VERSION} raster planes\n\
                 # image {}x{} at {:.2}x{:.2} dpi\n\
                 # stage\tclass\tcolorant\tfile\n",
                g.width, g.height, g.hres, g.vres
            )
            .map_err(io_err)?;
            for (stage, class, colorant, name) in &entries {
                writeln!(out, "{stage}\t{}\t{}\t{name}", class.suffix(), colorant.name())
                    .map_err(io_err)?;
            }
            Ok(())
        })?;

        tracing::info!(planes = entries.len(), path = %manifest_path.display(), "Raster manifest written");
        cleanup.succeed();
        Ok(())
    }
}

fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn append_file<W: Write>(out: &mut W, path: &Path) -> Result<()> {
    let mut file =
        File::open(path).map_err(|e| EngraveError::io(format!("opening {}", path.display()), e))?;
    io::copy(&mut file, out)
        .map_err(|e| EngraveError::io(format!("embedding {}", path.display()), e))?;
    Ok(())
}

/// Write through a temporary file in the target's directory, then rename.
fn persist_with<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut BufWriter<&mut File>) -> Result<()>,
{
    let dir = parent_dir(path);
    let mut tmp = tempfile::Builder::new()
        .prefix(".engrave-")
        .suffix(".part")
        .tempfile_in(&dir)
        .map_err(|e| EngraveError::io(format!("creating a temporary file in {}", dir.display()), e))?;
    {
        let mut out = BufWriter::new(tmp.as_file_mut());
        write(&mut out)?;
        out.flush()
            .map_err(|e| EngraveError::io(format!("writing {}", path.display()), e))?;
    }
    tmp.persist(path)
        .map_err(|e| EngraveError::io(format!("writing {}", path.display()), e.error))?;
    tracing::info!(path = %path.display(), "Output written");
    Ok(())
}
