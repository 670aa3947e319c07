//! Drives the real `engrave` binary inside throwaway directories.

use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};

use tempfile::TempDir;

/// A work directory for inputs and outputs plus a separate directory for
/// the stages' temporary artifacts.
pub struct TestRun {
    pub work: TempDir,
    pub tmp: TempDir,
}

/// What one invocation left behind on its streams.
pub struct RunOutput {
    pub status: ExitStatus,
    pub stdout: Vec<u8>,
    pub stderr: String,
}

impl RunOutput {
    pub fn stdout_text(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }
}

impl TestRun {
    pub fn new() -> Self {
        Self {
            work: tempfile::tempdir().expect("Failed to create work dir"),
            tmp: tempfile::tempdir().expect("Failed to create tmp dir"),
        }
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.work.path().join(name)
    }

    /// Write a raw image into the work directory.
    pub fn write_input(&self, name: &str, bytes: &[u8]) -> PathBuf {
        let path = self.path(name);
        std::fs::write(&path, bytes).expect("Failed to write input");
        path
    }

    /// Install an executable shell script as an external filter.
    #[cfg(unix)]
    pub fn write_filter(&self, dir: &str, name: &str, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let dir = self.path(dir);
        std::fs::create_dir_all(&dir).expect("Failed to create filter dir");
        let path = dir.join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).expect("Failed to write filter");
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
            .expect("Failed to mark filter executable");
        dir
    }

    /// Run `engrave` with raw arguments.
    pub fn engrave(&self, args: &[&str]) -> RunOutput {
        let output = Command::new(env!("CARGO_BIN_EXE_engrave"))
            .args(args)
            .current_dir(self.work.path())
            .env_remove("RUST_LOG")
            .stdin(Stdio::null())
            .output()
            .expect("Failed to run engrave");
        RunOutput {
            status: output.status,
            stdout: output.stdout,
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
    }

    /// `engrave run` with the artifacts directed into [`TestRun::tmp`].
    pub fn run(&self, args: &[&str]) -> RunOutput {
        let tmp = self.tmp.path().display().to_string();
        let mut full = vec!["run", "--tmp-dir", tmp.as_str()];
        full.extend_from_slice(args);
        self.engrave(&full)
    }

    /// File names currently in the artifact directory, sorted.
    pub fn temp_files(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(self.tmp.path())
            .expect("Failed to list tmp dir")
            .map(|e| e.expect("Bad dir entry").file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    /// The kept artifact whose name ends in `suffix`, e.g. `.0.s.k`.
    pub fn artifact(&self, suffix: &str) -> PathBuf {
        let name = self
            .temp_files()
            .into_iter()
            .find(|n| n.ends_with(suffix))
            .unwrap_or_else(|| panic!("No artifact *{suffix} in {:?}", self.temp_files()));
        self.tmp.path().join(name)
    }

    pub fn has_artifact(&self, suffix: &str) -> bool {
        self.temp_files().iter().any(|n| n.ends_with(suffix))
    }
}

pub fn read_text(path: &Path) -> String {
    std::fs::read_to_string(path)
        .unwrap_or_else(|e| panic!("Failed to read {}: {e}", path.display()))
}
