//! The easyssh command-line interface.
//!
//! Parses arguments, sets up logging, builds the pipeline and runs it once.

use std::process;

use clap::Parser;
use tracing::Metadata;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::EnvFilter;

use crate::cli::args::EasysshArgs;
use crate::engine::{self, print_error, Pipeline};
use crate::runtime::process::{JOB_STDERR_TARGET, JOB_TARGET};
use crate::runtime::{Context, Registries};
use crate::EasysshError;

pub mod args;
pub mod output;

/// The main entry point for the CLI.
pub fn run() {
    let args = EasysshArgs::parse();
    init_tracing(args.log_level());

    if let Err(e) = dispatch(args) {
        print_error(e);
        process::exit(1);
    }
}

/// `RUST_LOG` wins over the level picked by `-v`/`-q`. Captured job output is always
/// logged at info; lines a job wrote to stderr go to stderr.
fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let filter = match format!("{JOB_TARGET}=info").parse::<Directive>() {
        Ok(directive) => filter.add_directive(directive),
        Err(_) => filter,
    };
    let writer = std::io::stdout
        .with_filter(|meta: &Metadata<'_>| !is_job_stderr(meta))
        .and(std::io::stderr.with_filter(is_job_stderr));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_target(false)
        .with_ansi(atty::is(atty::Stream::Stdout))
        .without_time()
        .try_init();
}

fn is_job_stderr(meta: &Metadata<'_>) -> bool {
    meta.target() == JOB_STDERR_TARGET
}

fn dispatch(args: EasysshArgs) -> Result<(), EasysshError> {
    let registries = Registries::build()?;
    if args.list_nodes {
        output::print_supported_names(&registries);
        return Ok(());
    }

    let definition = args.definition();
    if args.explain {
        let explanations = engine::explain(&definition, &registries)?;
        output::print_explanations(&explanations);
        return Ok(());
    }

    let input = args
        .targets
        .as_deref()
        .ok_or_else(|| EasysshError::internal("no targets were given"))?;
    let pipeline = Pipeline::build(&definition, &registries)?;
    pipeline.run(input, &args.command, args.login.as_deref(), &Context::system())
}
