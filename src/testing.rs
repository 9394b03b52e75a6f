//! In-process stand-ins for the process runners, for unit tests.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Mutex;

use crate::runtime::process::{CommandOutput, CommandRunner, ExternalJob, JobRunner};
use crate::EasysshError;

/// Answers tool invocations from canned output and records them.
#[derive(Default)]
pub struct FakeCommands {
    responses: Mutex<HashMap<String, CommandOutput>>,
    calls: Mutex<Vec<String>>,
    files: Mutex<Vec<String>>,
}

impl FakeCommands {
    pub fn respond(&self, program: &str, stdout: &str, success: bool) {
        self.responses.lock().unwrap().insert(
            program.to_string(),
            CommandOutput {
                stdout: stdout.to_string(),
                stderr: String::new(),
                success,
                exit_code: if success { 0 } else { 1 },
            },
        );
    }

    /// Every call as `program arg...`.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Contents of the file named by the last argument of each terminal call.
    pub fn files(&self) -> Vec<String> {
        self.files.lock().unwrap().clone()
    }

    fn answer(&self, program: &str, args: &[String]) -> Result<CommandOutput, EasysshError> {
        let mut call = vec![program.to_string()];
        call.extend(args.iter().cloned());
        self.calls.lock().unwrap().push(call.join(" "));
        self.responses
            .lock()
            .unwrap()
            .get(program)
            .cloned()
            .ok_or_else(|| EasysshError::ExecutableNotFound {
                name: program.to_string(),
            })
    }
}

impl CommandRunner for FakeCommands {
    fn output(&self, program: &str, args: &[String]) -> Result<CommandOutput, EasysshError> {
        self.answer(program, args)
    }

    fn output_with_terminal(
        &self,
        program: &str,
        args: &[String],
    ) -> Result<CommandOutput, EasysshError> {
        if let Some(path) = args.last() {
            if let Ok(contents) = fs::read_to_string(Path::new(path)) {
                self.files.lock().unwrap().push(contents);
            }
        }
        self.answer(program, args)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Run {
    One(ExternalJob),
    Parallel(Vec<ExternalJob>),
}

/// Records jobs instead of running them; jobs whose label is listed in `failing` fail.
#[derive(Default)]
pub struct RecordingJobs {
    pub failing: Vec<String>,
    runs: Mutex<Vec<Run>>,
}

impl RecordingJobs {
    pub fn failing(labels: &[&str]) -> Self {
        Self {
            failing: labels.iter().map(|l| l.to_string()).collect(),
            runs: Mutex::default(),
        }
    }

    pub fn runs(&self) -> Vec<Run> {
        self.runs.lock().unwrap().clone()
    }

    /// Flattened argv of every recorded job.
    pub fn argvs(&self) -> Vec<Vec<String>> {
        self.runs()
            .into_iter()
            .flat_map(|run| match run {
                Run::One(job) => vec![job],
                Run::Parallel(jobs) => jobs,
            })
            .map(|job| job.argv)
            .collect()
    }
}

impl JobRunner for RecordingJobs {
    fn run(&self, job: &ExternalJob) -> Result<(), EasysshError> {
        self.runs.lock().unwrap().push(Run::One(job.clone()));
        if self.failing.contains(&job.label) {
            return Err(EasysshError::external(format!(
                "[{}] command exited with exit status: 1",
                job.label
            )));
        }
        Ok(())
    }

    fn run_parallel(&self, jobs: &[ExternalJob]) -> Result<(), EasysshError> {
        self.runs.lock().unwrap().push(Run::Parallel(jobs.to_vec()));
        Ok(())
    }
}
