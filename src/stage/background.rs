//! The `bg` stage: a uniform background tone under every channel.

use std::io::{Read, Write};

use super::scanline::{ScanlineReader, ScanlineWriter};
use super::{remove_on_failure, StageContext};
use crate::cleanup::CleanupStack;
use crate::error::{EngraveError, Result};
use crate::models::ArtifactClass;

pub fn run_background<R: Read, W: Write>(
    ctx: &StageContext,
    ink: f64,
    input: R,
    output: W,
) -> Result<()> {
    if !(0.0..=1.0).contains(&ink) {
        return Err(EngraveError::Config(format!(
            "Background value {ink} is outside 0..1"
        )));
    }
    let mut cleanup = CleanupStack::new("bg");
    let codec = ctx.codec();
    for &colorant in ctx.mode.colorants() {
        let path = ctx.artifact_path(ArtifactClass::Tone, colorant);
        remove_on_failure(&mut cleanup, path.clone());
        codec.write_background(&path, ink)?;
    }

    // The tone does not depend on the image; pass whatever arrives.
    let mut reader = ScanlineReader::new(input, ctx.row_bytes(), ctx.geometry.height, false);
    let mut writer = ScanlineWriter::new(output, false);
    while let Some(row) = reader.try_read_row()? {
        writer.write_row(row)?;
    }
    writer.flush()?;

    tracing::info!(stage = ctx.index, ink, rows = reader.line(), "bg finished");
    cleanup.succeed();
    Ok(())
}
