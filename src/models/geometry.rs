use std::fmt;
use std::str::FromStr;

use adaptive_screen::Polarity;
use serde::{Deserialize, Serialize};

use crate::error::{EngraveError, Result};

/// Pixel size and resolution of the processed image.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ImageGeometry {
    pub width: u32,
    pub height: u32,
    /// Horizontal resolution in dots per inch.
    pub hres: f64,
    /// Vertical resolution in dots per inch.
    pub vres: f64,
}

impl ImageGeometry {
    pub fn new(width: u32, height: u32, hres: f64, vres: f64) -> Self {
        Self {
            width,
            height,
            hres,
            vres,
        }
    }

    /// All four values must be present and positive.
    pub fn validate(&self) -> Result<()> {
        let resolution_ok = |r: f64| r.is_finite() && r > 0.0;
        if self.width == 0 || self.height == 0 || !resolution_ok(self.hres) || !resolution_ok(self.vres)
        {
            return Err(EngraveError::Config(
                "WIDTH, HEIGHT, HRES & VRES should be specified".to_string(),
            ));
        }
        Ok(())
    }

    /// Page width in PostScript points.
    pub fn width_pt(&self) -> f64 {
        f64::from(self.width) / self.hres * 72.0
    }

    /// Page height in PostScript points.
    pub fn height_pt(&self) -> f64 {
        f64::from(self.height) / self.vres * 72.0
    }
}

/// Color model of the scanline stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    #[default]
    Gray,
    Cmyk,
}

impl ColorMode {
    /// Bytes per pixel.
    pub fn sample_size(self) -> usize {
        match self {
            ColorMode::Gray => 1,
            ColorMode::Cmyk => 4,
        }
    }

    /// Channels in sample order. A gray image is a single black channel.
    pub fn colorants(self) -> &'static [Colorant] {
        match self {
            ColorMode::Gray => &[Colorant::Black],
            ColorMode::Cmyk => &Colorant::ALL,
        }
    }

    /// Byte offset of `colorant` inside one sample.
    pub fn offset_of(self, colorant: Colorant) -> usize {
        match self {
            ColorMode::Gray => 0,
            ColorMode::Cmyk => colorant.index(),
        }
    }
}

/// One process colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Colorant {
    Cyan,
    Magenta,
    Yellow,
    Black,
}

impl Colorant {
    pub const ALL: [Colorant; 4] = [
        Colorant::Cyan,
        Colorant::Magenta,
        Colorant::Yellow,
        Colorant::Black,
    ];

    pub fn index(self) -> usize {
        match self {
            Colorant::Cyan => 0,
            Colorant::Magenta => 1,
            Colorant::Yellow => 2,
            Colorant::Black => 3,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Colorant::Cyan => "Cyan",
            Colorant::Magenta => "Magenta",
            Colorant::Yellow => "Yellow",
            Colorant::Black => "Black",
        }
    }

    /// Temp-file suffix.
    pub fn suffix(self) -> &'static str {
        match self {
            Colorant::Cyan => "c",
            Colorant::Magenta => "m",
            Colorant::Yellow => "y",
            Colorant::Black => "k",
        }
    }

    pub fn letter(self) -> char {
        match self {
            Colorant::Cyan => 'C',
            Colorant::Magenta => 'M',
            Colorant::Yellow => 'Y',
            Colorant::Black => 'K',
        }
    }

    /// PostScript separation colour space selecting this colorant.
    pub fn separation(self) -> &'static str {
        match self {
            Colorant::Cyan => "[ /Separation (Cyan) /DeviceCMYK { 0 0 0 } ] setcolorspace",
            Colorant::Magenta => {
                "[ /Separation (Magenta) /DeviceCMYK { 0 0 0 4 1 roll } ] setcolorspace"
            }
            Colorant::Yellow => {
                "[ /Separation (Yellow) /DeviceCMYK { 0 0 0 4 2 roll } ] setcolorspace"
            }
            Colorant::Black => {
                "[ /Separation (Black) /DeviceCMYK { 0 0 0 4 3 roll } ] setcolorspace"
            }
        }
    }
}

impl fmt::Display for Colorant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A subset of the four process colours, written as letters (`"CMK"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ColorantSet([bool; 4]);

impl ColorantSet {
    pub const EMPTY: ColorantSet = ColorantSet([false; 4]);
    pub const ALL: ColorantSet = ColorantSet([true; 4]);

    pub fn contains(&self, colorant: Colorant) -> bool {
        self.0[colorant.index()]
    }

    pub fn insert(&mut self, colorant: Colorant) {
        self.0[colorant.index()] = true;
    }

    pub fn is_empty(&self) -> bool {
        !self.0.iter().any(|v| *v)
    }
}

impl FromStr for ColorantSet {
    type Err = EngraveError;

    fn from_str(s: &str) -> Result<Self> {
        let mut set = ColorantSet::EMPTY;
        for ch in s.chars() {
            let colorant = Colorant::ALL
                .into_iter()
                .find(|c| c.letter() == ch.to_ascii_uppercase())
                .ok_or_else(|| {
                    EngraveError::Config(format!("Unknown colorant letter '{ch}' in \"{s}\""))
                })?;
            set.insert(colorant);
        }
        Ok(set)
    }
}

impl fmt::Display for ColorantSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for c in Colorant::ALL {
            if self.contains(c) {
                write!(f, "{}", c.letter())?;
            }
        }
        Ok(())
    }
}

/// Meaning of a sample value on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Convention {
    /// Ink coverage: 0 is paper white.
    Density,
    /// Light intensity: 0 is black.
    Intensity,
}

impl Convention {
    /// Resolve the `-D` / `-I` pair. With neither flag, CMYK data is
    /// density and gray data is intensity.
    pub fn from_flags(density: bool, intensity: bool, mode: ColorMode) -> Result<Self> {
        match (density, intensity) {
            (true, true) => Err(EngraveError::ConflictingOptions {
                first: "INTENSITY",
                second: "DENSITY",
            }),
            (true, false) => Ok(Convention::Density),
            (false, true) => Ok(Convention::Intensity),
            (false, false) => Ok(Convention::default_for(mode)),
        }
    }

    pub fn default_for(mode: ColorMode) -> Self {
        match mode {
            ColorMode::Cmyk => Convention::Density,
            ColorMode::Gray => Convention::Intensity,
        }
    }

    /// Stage flag carrying this convention.
    pub fn flag(self) -> &'static str {
        match self {
            Convention::Density => "-D",
            Convention::Intensity => "-I",
        }
    }
}

impl FromStr for Convention {
    type Err = EngraveError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "density" | "d" => Ok(Convention::Density),
            "intensity" | "i" => Ok(Convention::Intensity),
            other => Err(EngraveError::Config(format!(
                "Unknown sample convention: {other}"
            ))),
        }
    }
}

/// Artifact encoding and final document kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// ASCII85 PostScript fragments assembled into an EPS document.
    #[default]
    Eps,
    /// PNG planes passed through next to a manifest.
    Raster,
}

impl OutputFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            OutputFormat::Eps => "eps",
            OutputFormat::Raster => "raster",
        }
    }

    /// Default output file suffix.
    pub fn default_suffix(self) -> &'static str {
        match self {
            OutputFormat::Eps => "eps",
            OutputFormat::Raster => "txt",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = EngraveError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "eps" => Ok(OutputFormat::Eps),
            "raster" | "png" => Ok(OutputFormat::Raster),
            other => Err(EngraveError::Config(format!("Unknown output format: {other}"))),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of per-channel artifact a stage writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArtifactClass {
    /// 8-bit background tone plane.
    Tone,
    /// Knock-out tiles.
    Mask,
    /// Ink tiles.
    Stroke,
}

impl ArtifactClass {
    /// Merge order inside one colorant.
    pub const MERGE_ORDER: [ArtifactClass; 3] =
        [ArtifactClass::Tone, ArtifactClass::Mask, ArtifactClass::Stroke];

    pub fn suffix(self) -> &'static str {
        match self {
            ArtifactClass::Tone => "ct",
            ArtifactClass::Mask => "m",
            ArtifactClass::Stroke => "s",
        }
    }

    pub fn for_polarity(polarity: Polarity) -> Self {
        match polarity {
            Polarity::Stroke => ArtifactClass::Stroke,
            Polarity::Mask => ArtifactClass::Mask,
        }
    }

    /// Heading of this class's section in the EPS body.
    pub fn heading(self) -> &'static str {
        match self {
            ArtifactClass::Tone => "CT",
            ArtifactClass::Mask => "mask",
            ArtifactClass::Stroke => "stroke",
        }
    }
}

impl fmt::Display for ArtifactClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix())
    }
}
