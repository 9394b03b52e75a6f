//! Pipeline assembly: one discoverer, one filter and one executor built from definitions,
//! then run once against the user's input.

use miette::Report;
use tracing::debug;

use crate::diagnostics::Family;
use crate::macros::RewriteStep;
use crate::nodes::{Discoverer, Executor, Filter, Node};
use crate::runtime::{construct, construct_from_str, Context, NodeRegistry, Registries};
use crate::syntax::{parse, Term};
use crate::target::{display_targets, Target};
use crate::EasysshError;

pub const DEFAULT_DISCOVERER: &str = "(first-matching (knife) (comma-separated))";
pub const DEFAULT_FILTER: &str = "(id)";
pub const DEFAULT_EXECUTOR: &str =
    "(if-command (ssh-exec-parallel) (if-one-target (ssh-login) (tmux-cssh)))";

// ============================================================================
// PIPELINE
// ============================================================================

/// The three definitions a pipeline is built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineDefinition {
    pub discoverer: String,
    pub filter: String,
    pub executor: String,
}

impl Default for PipelineDefinition {
    fn default() -> Self {
        Self {
            discoverer: DEFAULT_DISCOVERER.to_string(),
            filter: DEFAULT_FILTER.to_string(),
            executor: DEFAULT_EXECUTOR.to_string(),
        }
    }
}

/// Configured node trees, ready to run.
#[derive(Debug)]
pub struct Pipeline {
    discoverer: Discoverer,
    filter: Filter,
    executor: Executor,
}

impl Pipeline {
    /// Constructs all three trees; the first failing definition aborts the build.
    pub fn build(
        definition: &PipelineDefinition,
        registries: &Registries,
    ) -> Result<Self, EasysshError> {
        Ok(Self {
            discoverer: construct_from_str(&definition.discoverer, &registries.discoverers)?,
            filter: construct_from_str(&definition.filter, &registries.filters)?,
            executor: construct_from_str(&definition.executor, &registries.executors)?,
        })
    }

    pub fn discoverer(&self) -> &Discoverer {
        &self.discoverer
    }

    pub fn filter(&self) -> &Filter {
        &self.filter
    }

    pub fn executor(&self) -> &Executor {
        &self.executor
    }

    /// Discovers targets for `input`, applies the login user, then filters.
    ///
    /// Fails with `NoTargets` when discovery finds nothing or the filter removes everything.
    pub fn resolve_targets(
        &self,
        input: &str,
        login: Option<&str>,
        ctx: &Context,
    ) -> Result<Vec<Target>, EasysshError> {
        let mut targets = self.discoverer.discover(input, ctx)?;
        debug!("Discovered targets: {}", display_targets(&targets));
        if targets.is_empty() {
            return Err(EasysshError::NoTargets {
                input: input.to_string(),
            });
        }

        if let Some(user) = login {
            targets = targets
                .into_iter()
                .map(|target| target.with_user(user))
                .collect();
        }

        let targets = self.filter.filter(targets, ctx)?;
        debug!("Filtered targets: {}", display_targets(&targets));
        if targets.is_empty() {
            return Err(EasysshError::NoTargets {
                input: input.to_string(),
            });
        }
        Ok(targets)
    }

    /// Resolves targets and hands them with `command` to the executor.
    pub fn run(
        &self,
        input: &str,
        command: &[String],
        login: Option<&str>,
        ctx: &Context,
    ) -> Result<(), EasysshError> {
        let targets = self.resolve_targets(input, login, ctx)?;
        debug!("Running {} on {}", self.executor, display_targets(&targets));
        self.executor.execute(&targets, command, ctx)
    }
}

// ============================================================================
// EXPLAIN
// ============================================================================

/// How one definition was rewritten and what it built.
#[derive(Debug, Clone)]
pub struct Explanation {
    pub family: Family,
    pub definition: String,
    /// Rewrites applied to the root list, in order.
    pub steps: Vec<RewriteStep>,
    pub description: String,
}

/// Builds every tree of `definition` without running anything.
pub fn explain(
    definition: &PipelineDefinition,
    registries: &Registries,
) -> Result<Vec<Explanation>, EasysshError> {
    Ok(vec![
        explain_one(&definition.discoverer, &registries.discoverers)?,
        explain_one(&definition.filter, &registries.filters)?,
        explain_one(&definition.executor, &registries.executors)?,
    ])
}

fn explain_one<N: Node>(
    definition: &str,
    registry: &NodeRegistry<N>,
) -> Result<Explanation, EasysshError> {
    let term = parse(definition)?;
    let steps = match &term {
        Term::List(items) => registry.rules().expand_with_trace(items.clone())?.1,
        Term::Atom(_) => Vec::new(),
    };
    let node = construct(term, registry)?;
    Ok(Explanation {
        family: N::FAMILY,
        definition: definition.to_string(),
        steps,
        description: node.to_string(),
    })
}

/// Prints an EasysshError with full miette diagnostics
pub fn print_error(error: EasysshError) {
    let report = Report::new(error);
    eprintln!("{report:?}");
}
