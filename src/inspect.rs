//! `engrave inspect`: summarise a symbolic tile artifact.

use std::fmt::Write as _;
use std::path::Path;

use adaptive_screen::TileShape;
use serde::Serialize;

use crate::cli::InspectArgs;
use crate::codec::symbolic::{decode_tile_artifact, DecodedTiles, TileRecord};
use crate::error::{EngraveError, Result};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShapeSummary {
    pub shape: String,
    pub count: u32,
    pub mean_coverage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InspectReport {
    pub file: String,
    pub polarity: Option<String>,
    /// Row ends in the stream; equals the image height for a complete pass.
    pub rows: u32,
    pub blank_slots: u32,
    pub tiles: u32,
    pub shapes: Vec<ShapeSummary>,
    pub records: Vec<TileRecord>,
}

impl InspectReport {
    pub fn from_decoded(file: &Path, decoded: DecodedTiles) -> Self {
        let mut rows = 0;
        let mut blank_slots = 0;
        let mut per_shape = [(0u32, 0u64); adaptive_screen::TILE_SHAPE_COUNT];

        for record in &decoded.records {
            match *record {
                TileRecord::BlankRows { count } => rows += count,
                TileRecord::BlankSlots { count } => blank_slots += count,
                TileRecord::Tile { shape, coverage } => {
                    let slot = &mut per_shape[usize::from(shape.code()) - 1];
                    slot.0 += 1;
                    slot.1 += u64::from(coverage);
                }
            }
        }

        let shapes: Vec<ShapeSummary> = TileShape::ALL
            .iter()
            .zip(per_shape.iter())
            .filter(|(_, (count, _))| *count > 0)
            .map(|(shape, &(count, sum))| ShapeSummary {
                shape: shape.mnemonic().to_string(),
                count,
                mean_coverage: sum as f64 / f64::from(count),
            })
            .collect();

        Self {
            file: file.display().to_string(),
            polarity: decoded.polarity.map(|p| p.to_string()),
            rows,
            blank_slots,
            tiles: shapes.iter().map(|s| s.count).sum(),
            shapes,
            records: decoded.records,
        }
    }

    pub fn to_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "file:        {}", self.file);
        let _ = writeln!(
            out,
            "polarity:    {}",
            self.polarity.as_deref().unwrap_or("unknown")
        );
        let _ = writeln!(out, "rows:        {}", self.rows);
        let _ = writeln!(out, "tiles:       {}", self.tiles);
        let _ = writeln!(out, "blank slots: {}", self.blank_slots);
        if !self.shapes.is_empty() {
            let _ = writeln!(out, "\nshape  count  mean coverage");
            for s in &self.shapes {
                let _ = writeln!(out, "{:<5} {:>6}  {:>13.1}", s.shape, s.count, s.mean_coverage);
            }
        }
        out
    }
}

pub fn inspect_file(path: &Path) -> Result<InspectReport> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| EngraveError::io(format!("reading {}", path.display()), e))?;
    let decoded = decode_tile_artifact(&text)?;
    tracing::debug!(path = %path.display(), records = decoded.records.len(), "Decoded tile artifact");
    Ok(InspectReport::from_decoded(path, decoded))
}

pub fn run(args: &InspectArgs) -> Result<()> {
    let report = inspect_file(&args.file)?;
    if args.json {
        let json = serde_json::to_string_pretty(&report)
            .map_err(|e| EngraveError::Codec(format!("JSON encoding failed: {e}")))?;
        println!("{json}");
    } else {
        print!("{}", report.to_text());
    }
    Ok(())
}
