//! Services handed to every node operation.

use std::sync::Arc;

use crate::runtime::process::{
    CommandRunner, JobRunner, LineSink, SystemCommandRunner, SystemJobRunner, TracingSink,
};

/// Process runners used by discoverers, filters and executors.
#[derive(Clone)]
pub struct Context {
    commands: Arc<dyn CommandRunner>,
    jobs: Arc<dyn JobRunner>,
}

impl Context {
    pub fn new(commands: Arc<dyn CommandRunner>, jobs: Arc<dyn JobRunner>) -> Self {
        Self { commands, jobs }
    }

    /// Real processes, with captured job output logged through `tracing`.
    pub fn system() -> Self {
        Self::with_sink(Arc::new(TracingSink))
    }

    /// Real processes, with captured job output sent to `sink`.
    pub fn with_sink(sink: Arc<dyn LineSink>) -> Self {
        Self::new(
            Arc::new(SystemCommandRunner),
            Arc::new(SystemJobRunner::new(sink)),
        )
    }

    pub fn commands(&self) -> &dyn CommandRunner {
        self.commands.as_ref()
    }

    pub fn jobs(&self) -> &dyn JobRunner {
        self.jobs.as_ref()
    }
}
