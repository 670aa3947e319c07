//! Temporary artifact naming shared by the orchestrator and the stages.

use std::path::{Path, PathBuf};

use crate::models::{ArtifactClass, Colorant};

/// Identity of one temporary artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ArtifactKey {
    /// PID of the orchestrator process.
    pub pid: u32,
    pub stage: usize,
    pub class: ArtifactClass,
    pub colorant: Colorant,
}

impl ArtifactKey {
    pub fn new(pid: u32, stage: usize, class: ArtifactClass, colorant: Colorant) -> Self {
        Self {
            pid,
            stage,
            class,
            colorant,
        }
    }

    /// `<pid>.<stage>.<class>.<colorant>`, e.g. `4711.0.s.k`.
    pub fn file_name(&self) -> String {
        format!(
            "{}.{}.{}.{}",
            self.pid,
            self.stage,
            self.class.suffix(),
            self.colorant.suffix()
        )
    }

    pub fn path_in(&self, dir: &Path) -> PathBuf {
        dir.join(self.file_name())
    }
}

/// Remove an artifact unless temporaries are kept. A missing file is fine:
/// stages only write the planes they were asked for.
pub fn discard(path: &Path, keep: bool) {
    if !path.exists() {
        return;
    }
    if keep {
        tracing::warn!("Test run: temporary file {} not deleted.", path.display());
        return;
    }
    match std::fs::remove_file(path) {
        Ok(()) => tracing::debug!(path = %path.display(), "Removed temporary file"),
        Err(e) => tracing::warn!(path = %path.display(), error = %e, "Can't remove temporary file"),
    }
}
