//! The `engrave run` orchestrator.
//!
//! One invocation moves through `Configuring -> Streaming -> Merging -> Done`;
//! any error moves it to `Failed`. Temporary artifacts are discarded on every
//! exit path unless the run keeps them for inspection.

pub mod chain;
pub mod document;

use std::fs::File;
use std::io::{self, BufReader, ErrorKind, Read, Write};
use std::path::PathBuf;

use crate::artifact::{self, ArtifactKey};
use crate::cleanup::CleanupStack;
use crate::error::{EngraveError, Result};
use crate::models::{ArtifactClass, EngraveConfig};

pub use chain::{StageChain, StageDescriptor};
pub use document::Document;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Configuring,
    Streaming,
    Merging,
    Done,
    Failed,
}

pub struct Orchestrator {
    config: EngraveConfig,
    pid: u32,
    stage_program: Option<PathBuf>,
    state: PipelineState,
}

impl Orchestrator {
    pub fn new(config: EngraveConfig) -> Self {
        Self {
            config,
            pid: std::process::id(),
            stage_program: None,
            state: PipelineState::Configuring,
        }
    }

    /// Executable that runs the built-in filters (default: this one).
    pub fn with_stage_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.stage_program = Some(program.into());
        self
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    pub fn config(&self) -> &EngraveConfig {
        &self.config
    }

    pub fn run(&mut self) -> Result<()> {
        match self.execute() {
            Ok(()) => {
                self.transition(PipelineState::Done);
                Ok(())
            }
            Err(e) => {
                self.transition(PipelineState::Failed);
                Err(e)
            }
        }
    }

    fn transition(&mut self, next: PipelineState) {
        tracing::info!(from = ?self.state, to = ?next, "Pipeline state");
        self.state = next;
    }

    fn execute(&mut self) -> Result<()> {
        let program = match &self.stage_program {
            Some(p) => p.clone(),
            None => std::env::current_exe()
                .map_err(|e| EngraveError::io("locating the engrave executable", e))?,
        };
        let stages = StageDescriptor::chain(&self.config, self.pid, &program);
        std::fs::create_dir_all(&self.config.tmp_dir).map_err(|e| {
            EngraveError::io(format!("creating {}", self.config.tmp_dir.display()), e)
        })?;

        // Declared before the chain so stages are reaped before their
        // artifacts are removed.
        let mut cleanup = CleanupStack::new("engrave");
        self.register_artifacts(&mut cleanup, &stages);

        self.transition(PipelineState::Streaming);
        let mut chain = StageChain::spawn(&stages, &self.config.tmp_dir)?;
        if let Err(e) = self.stream_source(&mut chain) {
            let broken_pipe = matches!(
                &e,
                EngraveError::Io { source, .. } if source.kind() == ErrorKind::BrokenPipe
            );
            if broken_pipe {
                // A stage went away; its exit status says more than the pipe.
                tracing::debug!("First stage closed its input early");
                return Err(chain.wait(self.config.stage_timeout).err().unwrap_or(e));
            }
            return Err(e);
        }
        chain.wait(self.config.stage_timeout)?;

        self.transition(PipelineState::Merging);
        Document::new(&self.config, self.pid, &stages).assemble()?;
        cleanup.run();
        Ok(())
    }

    /// Every artifact any stage may write, discarded LIFO on exit.
    fn register_artifacts(&self, cleanup: &mut CleanupStack, stages: &[StageDescriptor]) {
        let keep = self.config.test_run;
        for stage in stages {
            for &colorant in self.config.mode.colorants() {
                for class in ArtifactClass::MERGE_ORDER {
                    let path = ArtifactKey::new(self.pid, stage.index, class, colorant)
                        .path_in(&self.config.tmp_dir);
                    cleanup.defer(format!("discard {}", path.display()), move || {
                        artifact::discard(&path, keep)
                    });
                }
            }
        }
    }

    fn open_source(&self) -> Result<Box<dyn Read>> {
        match &self.config.input {
            Some(path) => {
                let file = File::open(path)
                    .map_err(|e| EngraveError::io(format!("opening {}", path.display()), e))?;
                Ok(Box::new(BufReader::new(file)))
            }
            None => Ok(Box::new(io::stdin().lock())),
        }
    }

    /// Push `height` scanlines into the first stage.
    fn stream_source(&self, chain: &mut StageChain) -> Result<()> {
        let g = self.config.geometry;
        let row_bytes = g.width as usize * self.config.mode.sample_size();
        let invert = self.config.invert_source();
        let mut source = self.open_source()?;
        let mut row = vec![0u8; row_bytes];

        let Some(sink) = chain.input() else {
            return Err(EngraveError::io(
                "feeding the first stage",
                io::Error::new(ErrorKind::BrokenPipe, "stage input is closed"),
            ));
        };
        for line in 0..g.height {
            source.read_exact(&mut row).map_err(|e| match e.kind() {
                ErrorKind::UnexpectedEof => EngraveError::ShortRead { line },
                _ => EngraveError::io("reading the source image", e),
            })?;
            if invert {
                row.iter_mut().for_each(|v| *v = !*v);
            }
            sink.write_all(&row)
                .map_err(|e| EngraveError::io(format!("feeding line {}", line + 1), e))?;
        }
        sink.flush()
            .map_err(|e| EngraveError::io("feeding the first stage", e))?;
        tracing::debug!(lines = g.height, invert, "Source streamed");
        Ok(())
    }
}
