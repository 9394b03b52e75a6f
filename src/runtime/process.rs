//! External processes: executor jobs and captured tool runs.
//!
//! Executors describe what to run as [`ExternalJob`]s and hand them to a [`JobRunner`].
//! Discoverers and filters that shell out to tools (`knife`, `aws`, filter programs) go
//! through a [`CommandRunner`] and get the output back. Both are traits so tests can
//! record instead of spawning.

use std::env;
use std::fmt;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use tracing::{error, info, warn};

use crate::EasysshError;

// ============================================================================
// LINE SINKS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    Stdout,
    Stderr,
}

impl fmt::Display for Stream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stream::Stdout => "STDOUT",
            Stream::Stderr => "STDERR",
        })
    }
}

/// Receives captured output of non-interactive jobs, one line at a time.
///
/// Called concurrently from pump threads; each call must emit its line atomically.
pub trait LineSink: Send + Sync {
    fn emit(&self, label: &str, stream: Stream, line: &str);
}

/// Parent `tracing` target of captured job output.
pub const JOB_TARGET: &str = "easyssh::job";
/// Target of lines a job wrote to stdout.
pub const JOB_STDOUT_TARGET: &str = "easyssh::job::stdout";
/// Target of lines a job wrote to stderr.
pub const JOB_STDERR_TARGET: &str = "easyssh::job::stderr";

/// Logs every line as `[label] (STDOUT) line` through `tracing`, under
/// [`JOB_STDOUT_TARGET`] or [`JOB_STDERR_TARGET`] depending on the stream.
pub struct TracingSink;

impl LineSink for TracingSink {
    fn emit(&self, label: &str, stream: Stream, line: &str) {
        match stream {
            Stream::Stdout => info!(target: JOB_STDOUT_TARGET, "[{label}] ({stream}) {line}"),
            Stream::Stderr => info!(target: JOB_STDERR_TARGET, "[{label}] ({stream}) {line}"),
        }
    }
}

/// Collects formatted lines in memory.
#[derive(Default)]
pub struct MemorySink {
    lines: Mutex<Vec<String>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl LineSink for MemorySink {
    fn emit(&self, label: &str, stream: Stream, line: &str) {
        self.lines
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(format!("[{label}] ({stream}) {line}"));
    }
}

// ============================================================================
// JOBS
// ============================================================================

/// One process an executor wants started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalJob {
    /// Interactive jobs inherit the terminal; others have their output captured.
    pub interactive: bool,
    /// Prefix for captured lines.
    pub label: String,
    pub argv: Vec<String>,
}

impl fmt::Display for ExternalJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.label, self.argv.join(" "))
    }
}

pub trait JobRunner: Send + Sync {
    /// Runs one job to completion. A non-zero exit is an `ExternalFailure`.
    fn run(&self, job: &ExternalJob) -> Result<(), EasysshError>;

    /// Starts every job, then waits for each in order.
    ///
    /// Jobs that fail once started are logged and do not stop the others. Every program
    /// is resolved before the first start, so `ExecutableNotFound` starts nothing.
    fn run_parallel(&self, jobs: &[ExternalJob]) -> Result<(), EasysshError>;
}

/// Spawns real processes, sending captured output to a [`LineSink`].
pub struct SystemJobRunner {
    sink: Arc<dyn LineSink>,
}

impl SystemJobRunner {
    pub fn new(sink: Arc<dyn LineSink>) -> Self {
        Self { sink }
    }

    fn spawn(&self, job: &ExternalJob, program: PathBuf) -> Result<RunningJob, EasysshError> {
        let mut cmd = Command::new(&program);
        cmd.args(job.argv.iter().skip(1)).stdin(Stdio::inherit());
        if job.interactive {
            cmd.stdout(Stdio::inherit()).stderr(Stdio::inherit());
        } else {
            cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
        }

        let mut child = cmd.spawn().map_err(|e| {
            EasysshError::external_with(format!("Failed to start {}", program.display()), e)
        })?;

        let mut pumps = Vec::new();
        if let Some(stdout) = child.stdout.take() {
            pumps.push(pump(stdout, &job.label, Stream::Stdout, &self.sink));
        }
        if let Some(stderr) = child.stderr.take() {
            pumps.push(pump(stderr, &job.label, Stream::Stderr, &self.sink));
        }

        Ok(RunningJob {
            label: job.label.clone(),
            child,
            pumps,
        })
    }
}

impl JobRunner for SystemJobRunner {
    fn run(&self, job: &ExternalJob) -> Result<(), EasysshError> {
        let program = resolve_job(job)?;
        self.spawn(job, program)?.wait()
    }

    fn run_parallel(&self, jobs: &[ExternalJob]) -> Result<(), EasysshError> {
        let programs = jobs
            .iter()
            .map(resolve_job)
            .collect::<Result<Vec<_>, _>>()?;

        let mut running = Vec::with_capacity(jobs.len());
        for (job, program) in jobs.iter().zip(programs) {
            match self.spawn(job, program) {
                Ok(handle) => running.push(handle),
                Err(e) => error!("[{}] {e}", job.label),
            }
        }
        for handle in running {
            if let Err(e) = handle.wait() {
                error!("{e}");
            }
        }
        Ok(())
    }
}

struct RunningJob {
    label: String,
    child: Child,
    pumps: Vec<JoinHandle<()>>,
}

impl RunningJob {
    fn wait(mut self) -> Result<(), EasysshError> {
        let status = self.child.wait().map_err(|e| {
            EasysshError::external_with(format!("[{}] waiting for the command failed", self.label), e)
        });
        // Output is drained before the exit status is reported.
        for pump in self.pumps {
            if pump.join().is_err() {
                warn!("[{}] output reader panicked", self.label);
            }
        }
        let status = status?;
        if status.success() {
            Ok(())
        } else {
            Err(EasysshError::external(format!(
                "[{}] command exited with {status}",
                self.label
            )))
        }
    }
}

fn pump<R>(reader: R, label: &str, stream: Stream, sink: &Arc<dyn LineSink>) -> JoinHandle<()>
where
    R: Read + Send + 'static,
{
    let label = label.to_string();
    let sink = Arc::clone(sink);
    thread::spawn(move || {
        for line in BufReader::new(reader).split(b'\n') {
            match line {
                Ok(bytes) => {
                    let text = String::from_utf8_lossy(&bytes);
                    sink.emit(&label, stream, text.trim_end_matches('\r'));
                }
                Err(e) => {
                    warn!("[{label}] reading {stream} failed: {e}");
                    break;
                }
            }
        }
    })
}

fn resolve_job(job: &ExternalJob) -> Result<PathBuf, EasysshError> {
    let program = job
        .argv
        .first()
        .ok_or_else(|| EasysshError::internal(format!("job '{}' has an empty argv", job.label)))?;
    lookup_executable(program)
}

// ============================================================================
// CAPTURED COMMANDS
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub success: bool,
    pub exit_code: i32,
}

/// Runs helper tools whose output feeds discovery and filtering.
///
/// Errors are reserved for programs that cannot be found or started; a tool that runs and
/// fails reports it through [`CommandOutput::success`].
pub trait CommandRunner: Send + Sync {
    /// Runs with stdin closed, capturing stdout and stderr.
    fn output(&self, program: &str, args: &[String]) -> Result<CommandOutput, EasysshError>;

    /// Runs sharing this process's stdin and stderr, capturing stdout only.
    fn output_with_terminal(
        &self,
        program: &str,
        args: &[String],
    ) -> Result<CommandOutput, EasysshError>;
}

pub struct SystemCommandRunner;

impl SystemCommandRunner {
    fn run(mut cmd: Command, program: &str) -> Result<CommandOutput, EasysshError> {
        let out = cmd
            .output()
            .map_err(|e| EasysshError::external_with(format!("Failed to run {program}"), e))?;
        Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&out.stdout).to_string(),
            stderr: String::from_utf8_lossy(&out.stderr).to_string(),
            success: out.status.success(),
            exit_code: out.status.code().unwrap_or(-1),
        })
    }
}

impl CommandRunner for SystemCommandRunner {
    fn output(&self, program: &str, args: &[String]) -> Result<CommandOutput, EasysshError> {
        let mut cmd = Command::new(lookup_executable(program)?);
        cmd.args(args).stdin(Stdio::null());
        Self::run(cmd, program)
    }

    fn output_with_terminal(
        &self,
        program: &str,
        args: &[String],
    ) -> Result<CommandOutput, EasysshError> {
        let mut cmd = Command::new(lookup_executable(program)?);
        cmd.args(args)
            .stdin(Stdio::inherit())
            .stderr(Stdio::inherit());
        Self::run(cmd, program)
    }
}

// ============================================================================
// PATH LOOKUP
// ============================================================================

/// Resolves a program name against `PATH`; names containing a separator are used as is.
pub fn lookup_executable(name: &str) -> Result<PathBuf, EasysshError> {
    let not_found = || EasysshError::ExecutableNotFound {
        name: name.to_string(),
    };
    if name.is_empty() {
        return Err(not_found());
    }

    let candidate = Path::new(name);
    if candidate.components().count() > 1 {
        return if is_executable(candidate) {
            Ok(candidate.to_path_buf())
        } else {
            Err(not_found())
        };
    }

    let search_path = env::var_os("PATH").ok_or_else(not_found)?;
    env::split_paths(&search_path)
        .map(|dir| dir.join(name))
        .find(|path| is_executable(path))
        .ok_or_else(not_found)
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn job(label: &str, argv: &[&str]) -> ExternalJob {
        ExternalJob {
            interactive: false,
            label: label.to_string(),
            argv: argv.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn runner() -> (Arc<MemorySink>, SystemJobRunner) {
        let sink = Arc::new(MemorySink::new());
        let runner = SystemJobRunner::new(sink.clone());
        (sink, runner)
    }

    #[test]
    fn captured_lines_are_prefixed() {
        let (sink, runner) = runner();
        runner
            .run(&job("web-1", &["sh", "-c", "echo one; echo two; echo oops >&2"]))
            .unwrap();
        let mut lines = sink.lines();
        lines.sort();
        assert_eq!(
            lines,
            vec![
                "[web-1] (STDERR) oops",
                "[web-1] (STDOUT) one",
                "[web-1] (STDOUT) two",
            ]
        );
    }

    #[test]
    fn non_zero_exit_is_an_external_failure() {
        let (_, runner) = runner();
        let err = runner.run(&job("web-1", &["sh", "-c", "exit 3"])).unwrap_err();
        assert!(err.is_external_failure(), "{err}");
        assert!(err.to_string().contains("[web-1]"));
    }

    #[test]
    fn missing_executable_is_reported_by_name() {
        let (_, runner) = runner();
        let err = runner
            .run(&job("x", &["definitely-not-installed-easyssh-tool"]))
            .unwrap_err();
        assert!(matches!(
            err,
            EasysshError::ExecutableNotFound { ref name } if name == "definitely-not-installed-easyssh-tool"
        ));
    }

    #[test]
    fn parallel_failures_do_not_stop_siblings() {
        let (sink, runner) = runner();
        let jobs = vec![
            job("a", &["sh", "-c", "exit 1"]),
            job("b", &["sh", "-c", "echo done"]),
        ];
        runner.run_parallel(&jobs).unwrap();
        assert_eq!(sink.lines(), vec!["[b] (STDOUT) done"]);
    }

    #[test]
    fn parallel_checks_every_program_before_starting() {
        let (sink, runner) = runner();
        let jobs = vec![
            job("a", &["sh", "-c", "echo started"]),
            job("b", &["definitely-not-installed-easyssh-tool"]),
        ];
        let err = runner.run_parallel(&jobs).unwrap_err();
        assert!(matches!(err, EasysshError::ExecutableNotFound { .. }));
        assert!(sink.lines().is_empty());
    }

    #[test]
    fn lookup_accepts_explicit_paths() {
        assert_eq!(lookup_executable("/bin/sh").unwrap(), PathBuf::from("/bin/sh"));
        assert!(lookup_executable("sh").is_ok());
        assert!(lookup_executable("/nonexistent/sh").is_err());
        assert!(lookup_executable("").is_err());
    }

    #[test]
    fn command_output_reports_failure_without_erroring() {
        let out = SystemCommandRunner
            .output("sh", &["-c".to_string(), "echo hi; exit 2".to_string()])
            .unwrap();
        assert_eq!(out.stdout, "hi\n");
        assert!(!out.success);
        assert_eq!(out.exit_code, 2);
    }
}
