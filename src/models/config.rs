use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::cli::{FilterSpec, RunArgs};
use crate::error::{EngraveError, Result};
use crate::models::geometry::{
    ColorMode, Colorant, ColorantSet, Convention, ImageGeometry, OutputFormat,
};

/// Filters this executable implements itself.
pub const BUILTIN_FILTERS: [&str; 3] = ["tile32", "ct", "bg"];

/// Optional YAML configuration (`--config FILE`). Every field may be
/// overridden on the command line.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub hres: Option<f64>,
    #[serde(default)]
    pub vres: Option<f64>,

    /// Colour mode of the raw input.
    #[serde(default)]
    pub mode: Option<ColorMode>,

    /// Colorant inclusion filter, as letters.
    #[serde(default)]
    pub colorants: Option<String>,

    /// Convention of the raw input.
    #[serde(default)]
    pub source: Option<Convention>,

    /// Convention handed to the stages.
    #[serde(default)]
    pub convention: Option<Convention>,

    #[serde(default)]
    pub format: Option<OutputFormat>,

    /// Filter chain used when none is given with `-f`.
    #[serde(default = "default_filters")]
    pub filters: Vec<FilterSpec>,

    #[serde(default)]
    pub filter_dir: Option<PathBuf>,
    #[serde(default)]
    pub ps_dir: Option<PathBuf>,
    #[serde(default)]
    pub tmp_dir: Option<PathBuf>,

    /// Seconds before still-running stages are killed.
    #[serde(default)]
    pub stage_timeout: Option<u64>,

    #[serde(default)]
    pub test_run: bool,
}

fn default_filters() -> Vec<FilterSpec> {
    vec![FilterSpec::new("tile32"), FilterSpec::new("ct")]
}

impl ConfigFile {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| EngraveError::io(format!("reading {}", path.display()), e))?;
        let config: Self = serde_yaml::from_str(&content)?;
        tracing::info!(
            path = %path.display(),
            filters = config.filters.len(),
            "Loaded configuration"
        );
        Ok(config)
    }

    fn empty() -> Self {
        Self {
            filters: default_filters(),
            ..Self::default()
        }
    }
}

/// Where the finished document goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    File(PathBuf),
    Stdout,
}

/// Immutable settings of one `engrave run` invocation.
#[derive(Debug, Clone)]
pub struct EngraveConfig {
    pub geometry: ImageGeometry,
    pub mode: ColorMode,
    /// Colorants included in the document.
    pub colorants: ColorantSet,
    /// Convention of the raw input.
    pub source: Convention,
    /// Convention the stages work in.
    pub convention: Convention,
    pub format: OutputFormat,
    pub filters: Vec<FilterSpec>,
    pub filter_dir: Option<PathBuf>,
    pub ps_dir: Option<PathBuf>,
    pub tmp_dir: PathBuf,
    pub stage_timeout: Option<Duration>,
    pub test_run: bool,
    pub verbose: u8,
    /// `None` reads stdin.
    pub input: Option<PathBuf>,
    pub output: OutputTarget,
}

impl EngraveConfig {
    /// Merge defaults, the optional YAML file and the command line.
    pub fn from_args(args: &RunArgs, chain: Vec<FilterSpec>) -> Result<Self> {
        let file = match &args.config {
            Some(path) => ConfigFile::load(path)?,
            None => ConfigFile::empty(),
        };
        Self::merge(args, chain, file)
    }

    pub fn merge(args: &RunArgs, chain: Vec<FilterSpec>, file: ConfigFile) -> Result<Self> {
        let geometry = ImageGeometry {
            width: args.width.or(file.width).unwrap_or(0),
            height: args.height.or(file.height).unwrap_or(0),
            hres: args.hres.or(file.hres).unwrap_or(0.0),
            vres: args.vres.or(file.vres).unwrap_or(0.0),
        };
        geometry.validate()?;

        let mode = match (&args.cmyk, file.mode) {
            (Some(_), _) => ColorMode::Cmyk,
            (None, Some(mode)) => mode,
            (None, None) => ColorMode::Gray,
        };

        let letters = args.cmyk.as_deref().or(file.colorants.as_deref()).unwrap_or("");
        let mut colorants: ColorantSet = letters.parse()?;
        if colorants.is_empty() {
            colorants = ColorantSet::ALL;
        }

        let source = match &args.source {
            Some(s) => s.parse()?,
            None => file.source.unwrap_or(Convention::default_for(mode)),
        };
        let convention = match (args.density, args.intensity) {
            (false, false) => file.convention.unwrap_or(source),
            (density, intensity) => Convention::from_flags(density, intensity, mode)?,
        };

        let format = match &args.format {
            Some(s) => s.parse()?,
            None => file.format.unwrap_or_default(),
        };

        let filters = if chain.is_empty() { file.filters } else { chain };
        let filter_dir = args.filter_path.clone().or(file.filter_dir);
        validate_filters(&filters, filter_dir.is_some())?;

        // -F points at a directory that also carries the PostScript library.
        let ps_dir = args
            .ps_path
            .clone()
            .or(file.ps_dir)
            .or_else(|| filter_dir.clone());

        let tmp_dir = args
            .tmp_dir
            .clone()
            .or(file.tmp_dir)
            .unwrap_or_else(std::env::temp_dir);

        let suffix = args
            .output_suffix
            .clone()
            .unwrap_or_else(|| format.default_suffix().to_string());
        let input = args.input.clone().filter(|p| p.as_os_str() != "-");
        let output = match &args.output {
            Some(p) if p.as_os_str() == "-" => OutputTarget::Stdout,
            Some(p) => OutputTarget::File(p.clone()),
            None => OutputTarget::File(with_suffix(
                input.as_deref().unwrap_or(Path::new("output")),
                &suffix,
            )),
        };
        if format == OutputFormat::Raster && output == OutputTarget::Stdout {
            return Err(EngraveError::Config(
                "Raster output needs an output file to place the planes next to".to_string(),
            ));
        }

        Ok(Self {
            geometry,
            mode,
            colorants,
            source,
            convention,
            format,
            filters,
            filter_dir,
            ps_dir,
            tmp_dir,
            stage_timeout: args
                .stage_timeout
                .or(file.stage_timeout)
                .map(Duration::from_secs),
            test_run: args.test_run || file.test_run,
            verbose: args.verbose,
            input,
            output,
        })
    }

    /// Whether the raw input must be inverted before the first stage.
    pub fn invert_source(&self) -> bool {
        self.source != self.convention
    }

    /// Channels that end up in the document. The inclusion filter only
    /// applies to CMYK.
    pub fn selected_colorants(&self) -> Vec<Colorant> {
        self.mode
            .colorants()
            .iter()
            .copied()
            .filter(|c| self.mode == ColorMode::Gray || self.colorants.contains(*c))
            .collect()
    }
}

fn validate_filters(filters: &[FilterSpec], external: bool) -> Result<()> {
    if filters.is_empty() {
        return Err(EngraveError::Config(
            "It is necessary to specify filter(s) to process image through".to_string(),
        ));
    }
    if external {
        return Ok(());
    }
    for filter in filters {
        if !BUILTIN_FILTERS.contains(&filter.name.as_str()) {
            return Err(EngraveError::Config(format!(
                "Unknown filter '{}' (available: {})",
                filter.name,
                BUILTIN_FILTERS.join(", ")
            )));
        }
    }
    Ok(())
}

/// `dir/name.raw` -> `dir/name.SUFFIX`.
fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    path.with_extension(suffix.trim_start_matches('.'))
}
