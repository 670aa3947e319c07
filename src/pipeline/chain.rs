//! Stage processes wired stdout to stdin.

use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};

use crate::error::{EngraveError, Result};
use crate::models::{ColorMode, EngraveConfig};

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// One element of the processing chain.
#[derive(Debug, Clone, PartialEq)]
pub struct StageDescriptor {
    pub index: usize,
    pub name: String,
    pub program: PathBuf,
    pub args: Vec<String>,
}

impl StageDescriptor {
    /// Build the chain for one invocation.
    ///
    /// With a filter directory every stage is `<dir>/<name>`; otherwise
    /// `stage_program` (this executable) runs `filter <name>`.
    pub fn chain(config: &EngraveConfig, pid: u32, stage_program: &Path) -> Vec<StageDescriptor> {
        config
            .filters
            .iter()
            .enumerate()
            .map(|(index, filter)| {
                let mut args = Vec::new();
                let program = match &config.filter_dir {
                    Some(dir) => dir.join(&filter.name),
                    None => {
                        args.push("filter".to_string());
                        args.push(filter.name.clone());
                        stage_program.to_path_buf()
                    }
                };
                args.extend(base_args(config, pid, index));
                args.extend(filter.args.iter().cloned());
                StageDescriptor {
                    index,
                    name: filter.name.clone(),
                    program,
                    args,
                }
            })
            .collect()
    }

    pub fn command_line(&self) -> String {
        let mut line = self.program.display().to_string();
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }
}

/// Arguments every stage receives.
fn base_args(config: &EngraveConfig, pid: u32, index: usize) -> Vec<String> {
    let g = config.geometry;
    let mut args = vec![
        "-p".to_string(),
        pid.to_string(),
        "-w".to_string(),
        g.width.to_string(),
        "-h".to_string(),
        g.height.to_string(),
        "-x".to_string(),
        format!("{:.2}", g.hres),
        "-y".to_string(),
        format!("{:.2}", g.vres),
        "-t".to_string(),
        config.format.as_str().to_string(),
    ];
    if config.mode == ColorMode::Cmyk {
        args.push("-c".to_string());
    }
    args.push(config.convention.flag().to_string());
    for _ in 0..config.verbose {
        args.push("-v".to_string());
    }
    args.push("-i".to_string());
    args.push(index.to_string());
    args
}

struct Running {
    stage: StageDescriptor,
    child: Child,
    status: Option<ExitStatus>,
}

/// The spawned chain. Dropping it kills and reaps every stage still running.
pub struct StageChain {
    running: Vec<Running>,
    input: Option<ChildStdin>,
}

impl StageChain {
    /// Spawn all stages with `TMPDIR` pointing at `tmp_dir`. The last
    /// stage's output is discarded.
    pub fn spawn(stages: &[StageDescriptor], tmp_dir: &Path) -> Result<Self> {
        let mut chain = StageChain {
            running: Vec::with_capacity(stages.len()),
            input: None,
        };
        let mut upstream: Option<Stdio> = None;

        for (i, stage) in stages.iter().enumerate() {
            let last = i + 1 == stages.len();
            let stdin = upstream.take().unwrap_or_else(Stdio::piped);
            let stdout = if last { Stdio::null() } else { Stdio::piped() };

            tracing::debug!(stage = stage.index, command = %stage.command_line(), "Spawning stage");
            let mut child = Command::new(&stage.program)
                .args(&stage.args)
                .env("TMPDIR", tmp_dir)
                .stdin(stdin)
                .stdout(stdout)
                .stderr(Stdio::inherit())
                .spawn()
                .map_err(|source| EngraveError::StageSpawn {
                    stage: stage.index,
                    program: stage.program.display().to_string(),
                    source,
                })?;

            if i == 0 {
                chain.input = child.stdin.take();
            }
            if let Some(out) = child.stdout.take() {
                upstream = Some(Stdio::from(out));
            }
            chain.running.push(Running {
                stage: stage.clone(),
                child,
                status: None,
            });
        }
        Ok(chain)
    }

    /// Stdin of the first stage, until [`StageChain::close_input`].
    pub fn input(&mut self) -> Option<&mut ChildStdin> {
        self.input.as_mut()
    }

    /// Signal end of stream to the first stage.
    pub fn close_input(&mut self) {
        self.input = None;
    }

    pub fn len(&self) -> usize {
        self.running.len()
    }

    pub fn is_empty(&self) -> bool {
        self.running.is_empty()
    }

    /// Wait for every stage to exit; without a deadline this blocks for as
    /// long as the stages run. The first stage (in chain order) that did not
    /// exit successfully is reported.
    pub fn wait(&mut self, timeout: Option<Duration>) -> Result<()> {
        self.close_input();
        match timeout {
            None => {
                for running in self.running.iter_mut() {
                    let status = running.child.wait().map_err(|e| {
                        EngraveError::io(format!("waiting for stage {}", running.stage.index), e)
                    })?;
                    running.status = Some(status);
                }
            }
            Some(limit) => self.wait_until(Instant::now() + limit, limit)?,
        }
        self.check_statuses()
    }

    fn wait_until(&mut self, deadline: Instant, limit: Duration) -> Result<()> {
        loop {
            let mut pending = None;
            for running in self.running.iter_mut().filter(|r| r.status.is_none()) {
                match running.child.try_wait() {
                    Ok(Some(status)) => running.status = Some(status),
                    Ok(None) => {
                        pending.get_or_insert(running.stage.index);
                    }
                    Err(e) => {
                        return Err(EngraveError::io(
                            format!("waiting for stage {}", running.stage.index),
                            e,
                        ))
                    }
                }
            }
            let Some(stage) = pending else {
                return Ok(());
            };
            if Instant::now() >= deadline {
                tracing::error!(stage, "Stage deadline passed, killing the chain");
                self.kill_all();
                return Err(EngraveError::Timeout {
                    stage,
                    seconds: limit.as_secs(),
                });
            }
            std::thread::sleep(POLL_INTERVAL);
        }
    }

    fn check_statuses(&self) -> Result<()> {
        for running in &self.running {
            if let Some(status) = running.status {
                if !status.success() {
                    return Err(EngraveError::StageFailed {
                        stage: running.stage.index,
                        name: running.stage.name.clone(),
                        status: status.to_string(),
                    });
                }
                tracing::debug!(stage = running.stage.index, "Stage exited");
            }
        }
        Ok(())
    }

    fn kill_all(&mut self) {
        self.close_input();
        for running in self.running.iter_mut().filter(|r| r.status.is_none()) {
            if let Err(e) = running.child.kill() {
                tracing::debug!(stage = running.stage.index, error = %e, "Kill failed");
            }
            running.status = running.child.wait().ok();
        }
    }
}

impl Drop for StageChain {
    fn drop(&mut self) {
        self.kill_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{FilterSpec, RunArgs};
    use crate::models::ConfigFile;
    use pretty_assertions::assert_eq;

    fn config(args: RunArgs, filters: Vec<FilterSpec>) -> EngraveConfig {
        let args = RunArgs {
            width: Some(4),
            height: Some(3),
            hres: Some(300.0),
            vres: Some(150.5),
            ..args
        };
        EngraveConfig::merge(&args, filters, ConfigFile::default()).unwrap()
    }

    #[test]
    fn test_builtin_chain_arguments() {
        let config = config(
            RunArgs {
                cmyk: Some(String::new()),
                verbose: 1,
                ..RunArgs::default()
            },
            vec![
                FilterSpec::with_args("tile32", &["--minarea=3"]),
                FilterSpec::new("ct"),
            ],
        );
        let chain = StageDescriptor::chain(&config, 42, Path::new("/usr/bin/engrave"));
        assert_eq!(chain.len(), 2);
        assert_eq!(
            chain[0].command_line(),
            "/usr/bin/engrave filter tile32 -p 42 -w 4 -h 3 -x 300.00 -y 150.50 -t eps -c -D -v -i 0 --minarea=3"
        );
        assert_eq!(chain[1].name, "ct");
        assert_eq!(chain[1].args.last().map(String::as_str), Some("1"));
    }

    #[test]
    fn test_external_chain_uses_filter_dir() {
        let config = config(
            RunArgs {
                filter_path: Some(PathBuf::from("/opt/engrave/filters")),
                intensity: true,
                ..RunArgs::default()
            },
            vec![FilterSpec::new("sharpen")],
        );
        let chain = StageDescriptor::chain(&config, 7, Path::new("/unused"));
        assert_eq!(chain[0].program, PathBuf::from("/opt/engrave/filters/sharpen"));
        assert_eq!(chain[0].args[0], "-p");
        assert!(chain[0].args.contains(&"-I".to_string()));
    }

    #[cfg(unix)]
    fn shell_stage(index: usize, script: &str) -> StageDescriptor {
        StageDescriptor {
            index,
            name: format!("sh{index}"),
            program: PathBuf::from("/bin/sh"),
            args: vec!["-c".to_string(), script.to_string()],
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_chain_pipes_and_reports_failure() {
        use std::io::Write;

        let dir = tempfile::tempdir().unwrap();
        let stages = vec![
            shell_stage(0, "cat"),
            shell_stage(1, "cat > \"$TMPDIR/seen\""),
        ];
        let mut chain = StageChain::spawn(&stages, dir.path()).unwrap();
        chain.input().unwrap().write_all(b"scanlines").unwrap();
        chain.wait(None).unwrap();
        assert_eq!(std::fs::read(dir.path().join("seen")).unwrap(), b"scanlines");

        let stages = vec![shell_stage(0, "cat >/dev/null; exit 3")];
        let mut chain = StageChain::spawn(&stages, dir.path()).unwrap();
        let err = chain.wait(None).unwrap_err();
        assert!(matches!(err, EngraveError::StageFailed { stage: 0, .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_deadline_kills_hung_stage() {
        let dir = tempfile::tempdir().unwrap();
        let stages = vec![shell_stage(0, "exec sleep 30")];
        let mut chain = StageChain::spawn(&stages, dir.path()).unwrap();
        let started = Instant::now();
        let err = chain.wait(Some(Duration::from_millis(200))).unwrap_err();
        assert!(matches!(err, EngraveError::Timeout { stage: 0, .. }));
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[test]
    fn test_missing_program() {
        let dir = tempfile::tempdir().unwrap();
        let stages = vec![StageDescriptor {
            index: 0,
            name: "nope".to_string(),
            program: dir.path().join("nope"),
            args: Vec::new(),
        }];
        let err = StageChain::spawn(&stages, dir.path()).err().unwrap();
        assert!(matches!(err, EngraveError::StageSpawn { stage: 0, .. }));
    }
}
