//! Stage processes spawned by the orchestrator (`engrave filter <kind>`).
//!
//! Every stage reads raw interleaved scanlines on stdin, writes its
//! artifacts into the temporary directory and forwards a scanline per input
//! row on stdout for the next stage.

pub mod args;
pub mod background;
pub mod scanline;
pub mod tile;
pub mod tone;

use std::path::PathBuf;

use crate::cleanup::CleanupStack;
use crate::cli::FilterCommand;
use crate::error::Result;

pub use args::StageContext;

/// Run the stage named on the command line.
pub fn run(command: &FilterCommand) -> Result<()> {
    let ctx = StageContext::from_args(command.stage())?;
    tracing::debug!(
        stage = ctx.index,
        filter = command.name(),
        width = ctx.geometry.width,
        height = ctx.geometry.height,
        mode = ?ctx.mode,
        convention = ?ctx.convention,
        format = %ctx.format,
        "Stage starting"
    );

    let input = std::io::stdin().lock();
    let output = std::io::BufWriter::new(std::io::stdout().lock());
    let outcome = match command {
        FilterCommand::Tile32(args) => tile::TileStage::from_args(args)?
            .run(&ctx, input, output)
            .map(|_| ()),
        FilterCommand::Ct(_) => tone::run_tone(&ctx, input, output),
        FilterCommand::Bg(args) => background::run_background(&ctx, args.value, input, output),
    };
    if let Err(e) = &outcome {
        tracing::error!(stage = ctx.index, filter = command.name(), "Finished with error: {e}");
    }
    outcome
}

/// Delete `path` if the owning stage fails.
pub(crate) fn remove_on_failure(cleanup: &mut CleanupStack, path: PathBuf) {
    cleanup.defer_on_failure(format!("remove {}", path.display()), move || {
        if path.exists() {
            tracing::warn!("Delete temporary file: {}", path.display());
            if let Err(e) = std::fs::remove_file(&path) {
                tracing::warn!(path = %path.display(), error = %e, "Can't remove temporary file");
            }
        }
    });
}
