//! Command-line arguments for easyssh.
//!
//! Every definition flag falls back to an environment variable, then to the built-in
//! default from [`crate::engine`].

use clap::{ArgAction, Parser};

use crate::engine::{DEFAULT_DISCOVERER, DEFAULT_EXECUTOR, DEFAULT_FILTER, PipelineDefinition};

#[derive(Debug, Parser)]
#[command(
    name = "easyssh",
    version,
    about = "Discover hosts, filter them, and run ssh-family tools against them."
)]
pub struct EasysshArgs {
    /// Discoverer definition, e.g. "(comma-separated)".
    #[arg(short, long, env = "EASYSSH_DISCOVERER", default_value = DEFAULT_DISCOVERER)]
    pub discoverer: String,

    /// Filter definition, e.g. "(list (ec2-instance-id us-east-1) (first))".
    #[arg(short, long, env = "EASYSSH_FILTER", default_value = DEFAULT_FILTER)]
    pub filter: String,

    /// Executor definition, e.g. "(ssh-exec-parallel)".
    #[arg(short, long, env = "EASYSSH_EXECUTOR", default_value = DEFAULT_EXECUTOR)]
    pub executor: String,

    /// User to log in as on every target.
    #[arg(short, long, env = "EASYSSH_LOGIN")]
    pub login: Option<String>,

    /// More logging (-v debug, -vv trace).
    #[arg(short, long, action = ArgAction::Count, conflicts_with = "quiet")]
    pub verbose: u8,

    /// Only log warnings and errors.
    #[arg(short, long)]
    pub quiet: bool,

    /// Print the supported node names of every family and exit.
    #[arg(long)]
    pub list_nodes: bool,

    /// Print how each definition is rewritten and built, then exit.
    #[arg(long)]
    pub explain: bool,

    /// What the discoverer looks up: host names, a knife query, ...
    #[arg(required_unless_present_any = ["list_nodes", "explain"])]
    pub targets: Option<String>,

    /// Command to run on the targets.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub command: Vec<String>,
}

impl EasysshArgs {
    pub fn definition(&self) -> PipelineDefinition {
        PipelineDefinition {
            discoverer: self.discoverer.clone(),
            filter: self.filter.clone(),
            executor: self.executor.clone(),
        }
    }

    /// Log level used when `RUST_LOG` is not set.
    pub fn log_level(&self) -> &'static str {
        if self.quiet {
            return "warn";
        }
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}
