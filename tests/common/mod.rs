//! Shared helpers for the integration tests: recording process runners and target helpers.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use easyssh::runtime::process::{CommandOutput, CommandRunner, ExternalJob, JobRunner};
use easyssh::runtime::Context;
use easyssh::target::Target;
use easyssh::EasysshError;

/// Canned tool output keyed by program name.
#[derive(Default)]
pub struct CannedCommands {
    responses: Mutex<HashMap<String, CommandOutput>>,
}

impl CannedCommands {
    pub fn respond(&self, program: &str, stdout: &str) {
        self.responses.lock().unwrap().insert(
            program.to_string(),
            CommandOutput {
                stdout: stdout.to_string(),
                success: true,
                ..CommandOutput::default()
            },
        );
    }

    fn answer(&self, program: &str) -> Result<CommandOutput, EasysshError> {
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

impl CommandRunner for CannedCommands {
    fn output(&self, program: &str, _args: &[String]) -> Result<CommandOutput, EasysshError> {
        self.answer(program)
    }

    fn output_with_terminal(
        &self,
        program: &str,
        _args: &[String],
    ) -> Result<CommandOutput, EasysshError> {
        self.answer(program)
    }
}

/// Records every job instead of starting it.
#[derive(Default)]
pub struct JobLog {
    jobs: Mutex<Vec<ExternalJob>>,
}

impl JobLog {
    pub fn jobs(&self) -> Vec<ExternalJob> {
        self.jobs.lock().unwrap().clone()
    }

    pub fn argvs(&self) -> Vec<Vec<String>> {
        self.jobs().into_iter().map(|job| job.argv).collect()
    }
}

impl JobRunner for JobLog {
    fn run(&self, job: &ExternalJob) -> Result<(), EasysshError> {
        self.jobs.lock().unwrap().push(job.clone());
        Ok(())
    }

    fn run_parallel(&self, jobs: &[ExternalJob]) -> Result<(), EasysshError> {
        self.jobs.lock().unwrap().extend(jobs.iter().cloned());
        Ok(())
    }
}

/// A context whose tools answer from `commands` and whose jobs land in the returned log.
pub fn recording_context(commands: CannedCommands) -> (Context, Arc<JobLog>) {
    let jobs = Arc::new(JobLog::default());
    (Context::new(Arc::new(commands), jobs.clone()), jobs)
}

pub fn targets(names: &[&str]) -> Vec<Target> {
    names
        .iter()
        .map(|name| name.parse().expect("test target parses"))
        .collect()
}

pub fn words(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
}
