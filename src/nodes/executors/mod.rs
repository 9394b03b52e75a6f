//! Executors run the trailing command against the final target list.
//!
//! Leaf executors ([`External`]) turn targets into external jobs. The combinators
//! ([`AssertCommand`], [`IfOneTarget`], [`IfCommand`]) only check preconditions or pick a
//! child; they never start processes themselves. The familiar tool names (`ssh-login`,
//! `ssh-exec`, `csshx`, ...) are aliases that rewrite into these.

use std::fmt;

use crate::diagnostics::Family;
use crate::macros::RewriteRule;
use crate::nodes::{Arg, Node};
use crate::runtime::{Context, NodeRegistry};
use crate::target::Target;
use crate::EasysshError;

mod control;
mod external;

pub use control::{AssertCommand, IfCommand, IfOneTarget};
pub use external::{External, Mode};

#[derive(Debug)]
pub enum Executor {
    External(External),
    AssertCommand(AssertCommand),
    IfOneTarget(IfOneTarget),
    IfCommand(IfCommand),
}

impl Executor {
    pub fn execute(
        &self,
        targets: &[Target],
        command: &[String],
        ctx: &Context,
    ) -> Result<(), EasysshError> {
        match self {
            Executor::External(e) => e.execute(targets, command, ctx),
            Executor::AssertCommand(e) => e.execute(targets, command, ctx),
            Executor::IfOneTarget(e) => e.execute(targets, command, ctx),
            Executor::IfCommand(e) => e.execute(targets, command, ctx),
        }
    }
}

impl Node for Executor {
    const FAMILY: Family = Family::Executor;

    fn configure(&mut self, args: Vec<Arg<Self>>) -> Result<(), EasysshError> {
        match self {
            Executor::External(e) => e.configure(args),
            Executor::AssertCommand(e) => e.configure(args),
            Executor::IfOneTarget(e) => e.configure(args),
            Executor::IfCommand(e) => e.configure(args),
        }
    }
}

impl fmt::Display for Executor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Executor::External(e) => fmt::Display::fmt(e, f),
            Executor::AssertCommand(e) => fmt::Display::fmt(e, f),
            Executor::IfOneTarget(e) => fmt::Display::fmt(e, f),
            Executor::IfCommand(e) => fmt::Display::fmt(e, f),
        }
    }
}

/// Built-in executors and the tool aliases built from them.
pub fn registry() -> Result<NodeRegistry<Executor>, EasysshError> {
    let mut registry = NodeRegistry::new();
    registry.register("external", || {
        Executor::External(External::new(Mode::Single, false))
    })?;
    registry.register("external-interactive", || {
        Executor::External(External::new(Mode::Single, true))
    })?;
    registry.register("external-sequential", || {
        Executor::External(External::new(Mode::Sequential, false))
    })?;
    registry.register("external-sequential-interactive", || {
        Executor::External(External::new(Mode::Sequential, true))
    })?;
    registry.register("external-parallel", || {
        Executor::External(External::new(Mode::Parallel, false))
    })?;
    registry.register("assert-command", || {
        Executor::AssertCommand(AssertCommand::new(true))
    })?;
    registry.register("assert-no-command", || {
        Executor::AssertCommand(AssertCommand::new(false))
    })?;
    registry.register("if-one-target", || {
        Executor::IfOneTarget(IfOneTarget::default())
    })?;
    registry.register("if-command", || Executor::IfCommand(IfCommand::default()))?;

    registry
        .add_rule(RewriteRule::rename("if-args", "if-command"))
        .add_rule(RewriteRule::replace(
            "(ssh-login)",
            "(assert-no-command (external-sequential-interactive ssh))",
        )?)
        .add_rule(RewriteRule::rename("ssh-exec", "ssh-exec-sequential"))
        .add_rule(RewriteRule::replace(
            "(ssh-exec-sequential)",
            "(assert-command (external-sequential ssh))",
        )?)
        .add_rule(RewriteRule::replace(
            "(ssh-exec-parallel)",
            "(assert-command (external-parallel ssh))",
        )?)
        .add_rule(RewriteRule::replace(
            "(csshx)",
            "(assert-no-command (external-interactive csshx))",
        )?)
        .add_rule(RewriteRule::replace(
            "(tmux-cssh)",
            "(assert-no-command (external-interactive tmux-cssh))",
        )?);
    Ok(registry)
}
