//! Command-line surface.
//!
//! `engrave run` drives the whole pipeline, `engrave filter <kind>` is the
//! stage process it spawns, and `engrave inspect` decodes a tile artifact.
//! Both `run` and the filters use `-h` for the image height, so their help
//! flag is `-H`.

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};
use serde::{Deserialize, Serialize};

use crate::error::{EngraveError, Result};

#[derive(Parser, Debug)]
#[command(name = "engrave")]
#[command(version)]
#[command(about = "Engrave - adaptive screening of continuous-tone images")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Screen an image through a chain of filter stages and assemble the output document
    #[command(disable_help_flag = true)]
    #[command(after_help = "Filter chain:\n  -f FILTER [options] [-f FILTER [options]...] [FILE]\n\
                            The chain defaults to `-f tile32 -f ct`.")]
    Run(RunArgs),

    /// Run one filter stage over a raw scanline stream (spawned by `run`)
    #[command(subcommand)]
    Filter(FilterCommand),

    /// Decode a symbolic tile artifact and summarise its records
    Inspect(InspectArgs),
}

#[derive(Args, Debug, Default, Clone)]
pub struct RunArgs {
    /// RAW image width
    #[arg(short = 'w', long)]
    pub width: Option<u32>,

    /// RAW image height
    #[arg(short = 'h', long)]
    pub height: Option<u32>,

    /// Horizontal resolution (dpi)
    #[arg(short = 'x', long)]
    pub hres: Option<f64>,

    /// Vertical resolution (dpi)
    #[arg(short = 'y', long)]
    pub vres: Option<f64>,

    /// Image is CMYK; optionally selects individual colorants (e.g. --cmyk=CK)
    #[arg(short = 'c', long, num_args = 0..=1, require_equals = true, default_missing_value = "")]
    pub cmyk: Option<String>,

    /// Stages receive DENSITY values
    #[arg(short = 'D', long)]
    pub density: bool,

    /// Stages receive INTENSITY values
    #[arg(short = 'I', long)]
    pub intensity: bool,

    /// Convention of the raw input: density or intensity
    #[arg(short = 's', long)]
    pub source: Option<String>,

    /// Output file (`-` for stdout)
    #[arg(short = 'o', long)]
    pub output: Option<PathBuf>,

    /// Output file suffix (default `eps`, or `txt` for raster)
    #[arg(short = 'O', long = "output-suffix")]
    pub output_suffix: Option<String>,

    /// Output format: eps or raster
    #[arg(short = 't', long)]
    pub format: Option<String>,

    /// Keep temporary files
    #[arg(short = 'T', long = "test-run")]
    pub test_run: bool,

    /// Directory with external filter executables
    #[arg(short = 'F', long = "filter-path")]
    pub filter_path: Option<PathBuf>,

    /// Directory with PostScript library files
    #[arg(short = 'P', long = "ps-path")]
    pub ps_path: Option<PathBuf>,

    /// Directory for temporary artifacts
    #[arg(long = "tmp-dir")]
    pub tmp_dir: Option<PathBuf>,

    /// Kill stages still running after this many seconds
    #[arg(long = "stage-timeout")]
    pub stage_timeout: Option<u64>,

    /// YAML configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Verbose messages (repeat for more)
    #[arg(short = 'v', long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Print help
    #[arg(short = 'H', long, action = ArgAction::Help)]
    pub help: Option<bool>,

    /// RAW image file; stdin when absent or `-`
    pub input: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum FilterCommand {
    /// Classify tiles and write stroke/mask artifacts
    #[command(disable_help_flag = true)]
    Tile32(Tile32Args),

    /// Write the continuous-tone plane of every channel
    #[command(disable_help_flag = true)]
    Ct(CtArgs),

    /// Write a uniform background tone
    #[command(disable_help_flag = true)]
    Bg(BgArgs),
}

impl FilterCommand {
    pub fn name(&self) -> &'static str {
        match self {
            FilterCommand::Tile32(_) => "tile32",
            FilterCommand::Ct(_) => "ct",
            FilterCommand::Bg(_) => "bg",
        }
    }

    pub fn stage(&self) -> &StageArgs {
        match self {
            FilterCommand::Tile32(a) => &a.stage,
            FilterCommand::Ct(a) => &a.stage,
            FilterCommand::Bg(a) => &a.stage,
        }
    }
}

/// Arguments every stage receives from the orchestrator.
#[derive(Args, Debug, Default, Clone)]
pub struct StageArgs {
    /// PID of the parent process
    #[arg(short = 'p', long)]
    pub pid: Option<u32>,

    /// Filter index
    #[arg(short = 'i', long, default_value_t = 0)]
    pub index: usize,

    /// RAW image width
    #[arg(short = 'w', long, default_value_t = 0)]
    pub width: u32,

    /// RAW image height
    #[arg(short = 'h', long, default_value_t = 0)]
    pub height: u32,

    /// Horizontal resolution (dpi)
    #[arg(short = 'x', long, default_value_t = 0.0)]
    pub hres: f64,

    /// Vertical resolution (dpi)
    #[arg(short = 'y', long, default_value_t = 0.0)]
    pub vres: f64,

    /// RAW image is CMYK
    #[arg(short = 'c', long)]
    pub cmyk: bool,

    /// Input and output data is DENSITY values
    #[arg(short = 'D', long)]
    pub density: bool,

    /// Input and output data is INTENSITY values
    #[arg(short = 'I', long)]
    pub intensity: bool,

    /// Artifact format: eps or raster
    #[arg(short = 't', long, default_value = "eps")]
    pub format: String,

    /// Verbose messages
    #[arg(short = 'v', long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Print help
    #[arg(short = 'H', long, action = ArgAction::Help)]
    pub help: Option<bool>,
}

#[derive(Args, Debug, Default, Clone)]
pub struct Tile32Args {
    #[command(flatten)]
    pub stage: StageArgs,

    /// Classify only the left half of the image
    #[arg(long)]
    pub half: bool,

    /// Write the tile histogram to FILE
    #[arg(long, value_name = "FILE")]
    pub hist: Option<PathBuf>,

    /// Skip the edge crossing test
    #[arg(long = "ignore-outtest")]
    pub ignore_outtest: bool,

    /// Minimum coverage of lines and sides
    #[arg(long)]
    pub minarea: Option<u8>,

    /// Per-sample threshold
    #[arg(long = "value-thr")]
    pub value_thr: Option<i32>,

    /// Directional sum threshold
    #[arg(long = "sum-thr")]
    pub sum_thr: Option<f64>,

    /// Diagonal correlation coefficient
    #[arg(long = "dia-corr")]
    pub dia_corr: Option<f64>,

    /// Colorants passed through unclassified (e.g. CM)
    #[arg(long)]
    pub passthrough: Option<String>,

    /// Planes to write: B (stroke), W (mask)
    #[arg(long = "select-mask")]
    pub select_mask: Option<String>,
}

#[derive(Args, Debug, Default, Clone)]
pub struct CtArgs {
    #[command(flatten)]
    pub stage: StageArgs,
}

#[derive(Args, Debug, Default, Clone)]
pub struct BgArgs {
    #[command(flatten)]
    pub stage: StageArgs,

    /// Background ink value, 0..1
    #[arg(long)]
    pub value: f64,
}

#[derive(Args, Debug, Clone)]
pub struct InspectArgs {
    /// Symbolic tile artifact (`*.s.*` or `*.m.*`)
    pub file: PathBuf,

    /// Print the summary as JSON
    #[arg(long)]
    pub json: bool,
}

/// One `-f NAME [options]` element of the filter chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSpec {
    pub name: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl FilterSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
        }
    }

    pub fn with_args(name: impl Into<String>, args: &[&str]) -> Self {
        Self {
            name: name.into(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }
}

fn filter_name_inline(arg: &str) -> Option<&str> {
    arg.strip_prefix("--filter=")
        .or_else(|| arg.strip_prefix("-f").filter(|rest| !rest.is_empty()))
}

/// Cut the filter chain out of a `run` command line.
///
/// Everything from the first `-f`/`--filter` on belongs to the chain: each
/// `-f NAME` opens a filter and following dash arguments are its options.
/// The first argument not starting with `-` (or a lone `-`) ends the chain;
/// it and the rest are handed back to the regular parser as input files.
pub fn split_filter_chain(args: Vec<String>) -> Result<(Vec<String>, Vec<FilterSpec>)> {
    let is_run = args.get(1).is_some_and(|a| a == "run");
    if !is_run {
        return Ok((args, Vec::new()));
    }

    let start = args.iter().enumerate().skip(2).find_map(|(i, a)| {
        (a == "-f" || a == "--filter" || filter_name_inline(a).is_some()).then_some(i)
    });
    let Some(start) = start else {
        return Ok((args, Vec::new()));
    };

    let mut head: Vec<String> = args[..start].to_vec();
    let mut chain: Vec<FilterSpec> = Vec::new();
    let mut rest = args[start..].iter();

    while let Some(arg) = rest.next() {
        if arg == "-f" || arg == "--filter" {
            let name = rest
                .next()
                .ok_or_else(|| EngraveError::Config("No filter name specified".to_string()))?;
            chain.push(FilterSpec::new(name.clone()));
        } else if let Some(name) = filter_name_inline(arg) {
            chain.push(FilterSpec::new(name));
        } else if arg == "-" || !arg.starts_with('-') {
            head.push(arg.clone());
            head.extend(rest.cloned());
            break;
        } else if let Some(current) = chain.last_mut() {
            current.args.push(arg.clone());
        }
    }

    Ok((head, chain))
}
