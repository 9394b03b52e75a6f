use std::fmt;

use tracing::debug;

use crate::diagnostics::Arity;
use crate::nodes::{check_arity, child_nodes, describe, Arg, Executor};
use crate::runtime::Context;
use crate::target::Target;
use crate::EasysshError;

fn single_child(owner: &str, args: Vec<Arg<Executor>>) -> Result<Box<Executor>, EasysshError> {
    check_arity(owner, Arity::Exactly(1), &args)?;
    let mut children = child_nodes(owner, args)?;
    children
        .pop()
        .map(Box::new)
        .ok_or_else(|| EasysshError::internal(format!("{owner} lost its child")))
}

fn two_children(
    owner: &str,
    args: Vec<Arg<Executor>>,
) -> Result<(Box<Executor>, Box<Executor>), EasysshError> {
    check_arity(owner, Arity::Exactly(2), &args)?;
    let mut children = child_nodes(owner, args)?.into_iter().map(Box::new);
    match (children.next(), children.next()) {
        (Some(first), Some(second)) => Ok((first, second)),
        _ => Err(EasysshError::internal(format!("{owner} lost its children"))),
    }
}

/// `(assert-command e)` / `(assert-no-command e)`: checks whether a command was given.
#[derive(Debug)]
pub struct AssertCommand {
    required: bool,
    inner: Option<Box<Executor>>,
}

impl AssertCommand {
    pub fn new(required: bool) -> Self {
        Self {
            required,
            inner: None,
        }
    }

    fn name(&self) -> &'static str {
        if self.required {
            "assert-command"
        } else {
            "assert-no-command"
        }
    }

    pub(crate) fn configure(&mut self, args: Vec<Arg<Executor>>) -> Result<(), EasysshError> {
        self.inner = Some(single_child(&self.to_string(), args)?);
        Ok(())
    }

    pub(crate) fn execute(
        &self,
        targets: &[Target],
        command: &[String],
        ctx: &Context,
    ) -> Result<(), EasysshError> {
        let inner = self
            .inner
            .as_deref()
            .ok_or_else(|| EasysshError::unconfigured(self))?;
        if self.required && command.is_empty() {
            return Err(EasysshError::precondition(self, "requires a command"));
        }
        if !self.required && !command.is_empty() {
            return Err(EasysshError::precondition(
                self,
                format!("doesn't accept a command, got: [{}]", command.join(" ")),
            ));
        }
        inner.execute(targets, command, ctx)
    }
}

impl fmt::Display for AssertCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        describe(f, self.name(), [self.inner.as_deref()])
    }
}

/// `(if-one-target one more)`: `one` for exactly one target, `more` otherwise.
#[derive(Debug, Default)]
pub struct IfOneTarget {
    one: Option<Box<Executor>>,
    more: Option<Box<Executor>>,
}

impl IfOneTarget {
    pub(crate) fn configure(&mut self, args: Vec<Arg<Executor>>) -> Result<(), EasysshError> {
        let (one, more) = two_children(&self.to_string(), args)?;
        self.one = Some(one);
        self.more = Some(more);
        Ok(())
    }

    pub(crate) fn execute(
        &self,
        targets: &[Target],
        command: &[String],
        ctx: &Context,
    ) -> Result<(), EasysshError> {
        let (Some(one), Some(more)) = (self.one.as_deref(), self.more.as_deref()) else {
            return Err(EasysshError::unconfigured(self));
        };
        if targets.len() == 1 {
            debug!("Got one target, using {one}");
            one.execute(targets, command, ctx)
        } else {
            debug!("Got {} targets, using {more}", targets.len());
            more.execute(targets, command, ctx)
        }
    }
}

impl fmt::Display for IfOneTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        describe(f, "if-one-target", [self.one.as_deref(), self.more.as_deref()])
    }
}

/// `(if-command with without)`: `with` when a command was given, `without` otherwise.
#[derive(Debug, Default)]
pub struct IfCommand {
    with_command: Option<Box<Executor>>,
    without_command: Option<Box<Executor>>,
}

impl IfCommand {
    pub(crate) fn configure(&mut self, args: Vec<Arg<Executor>>) -> Result<(), EasysshError> {
        let (with_command, without_command) = two_children(&self.to_string(), args)?;
        self.with_command = Some(with_command);
        self.without_command = Some(without_command);
        Ok(())
    }

    pub(crate) fn execute(
        &self,
        targets: &[Target],
        command: &[String],
        ctx: &Context,
    ) -> Result<(), EasysshError> {
        let (Some(with_command), Some(without_command)) = (
            self.with_command.as_deref(),
            self.without_command.as_deref(),
        ) else {
            return Err(EasysshError::unconfigured(self));
        };
        if command.is_empty() {
            debug!("Got no command, using {without_command}");
            without_command.execute(targets, command, ctx)
        } else {
            debug!("Got a command, using {with_command}");
            with_command.execute(targets, command, ctx)
        }
    }
}

impl fmt::Display for IfCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        describe(
            f,
            "if-command",
            [self.with_command.as_deref(), self.without_command.as_deref()],
        )
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::runtime::construct_from_str;
    use crate::testing::{FakeCommands, RecordingJobs};

    fn make(definition: &str) -> Result<Executor, EasysshError> {
        let registry = crate::nodes::executors::registry()?;
        construct_from_str(definition, &registry)
    }

    fn targets(names: &[&str]) -> Vec<Target> {
        names.iter().map(|n| n.parse().unwrap()).collect()
    }

    fn command(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    fn programs(
        definition: &str,
        targets: &[Target],
        command: &[String],
    ) -> Result<Vec<String>, EasysshError> {
        let jobs = Arc::new(RecordingJobs::default());
        let ctx = Context::new(Arc::new(FakeCommands::default()), jobs.clone());
        make(definition)?.execute(targets, command, &ctx)?;
        Ok(jobs.argvs().into_iter().map(|argv| argv[0].clone()).collect())
    }

    #[test]
    fn assert_command_requires_a_command() {
        let err = programs("(assert-command (external ssh))", &targets(&["a"]), &[]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "<assert-command <external [ssh]>> requires a command"
        );
        assert_eq!(
            programs("(assert-command (external ssh))", &targets(&["a"]), &command(&["ls"])).unwrap(),
            vec!["ssh"]
        );
    }

    #[test]
    fn assert_no_command_rejects_a_command() {
        let err = programs(
            "(assert-no-command (external-interactive csshx))",
            &targets(&["a", "b"]),
            &command(&["ls", "-l"]),
        )
        .unwrap_err();
        assert!(matches!(err, EasysshError::Precondition { .. }));
        assert_eq!(
            err.to_string(),
            "<assert-no-command <external-interactive [csshx]>> doesn't accept a command, got: [ls -l]"
        );
    }

    #[test]
    fn if_one_target_routes_on_count() {
        let definition = "(if-one-target (external one) (external more))";
        assert_eq!(programs(definition, &targets(&["a"]), &[]).unwrap(), vec!["one"]);
        assert_eq!(programs(definition, &targets(&["a", "b"]), &[]).unwrap(), vec!["more"]);
        assert_eq!(programs(definition, &[], &[]).unwrap(), vec!["more"]);
    }

    #[test]
    fn if_command_routes_on_command() {
        let definition = "(if-command (external with) (external without))";
        assert_eq!(
            programs(definition, &targets(&["a"]), &command(&["uptime"])).unwrap(),
            vec!["with"]
        );
        assert_eq!(programs(definition, &targets(&["a"]), &[]).unwrap(), vec!["without"]);
    }

    #[test]
    fn if_args_is_an_alias() {
        let executor = make("(if-args (external a) (external b))").unwrap();
        assert_eq!(
            executor.to_string(),
            "<if-command <external [a]> <external [b]>>"
        );
    }

    #[test]
    fn control_nodes_check_their_arity() {
        let err = make("(if-one-target (external ssh))").unwrap_err();
        assert_eq!(
            err.to_string(),
            "<if-one-target> requires exactly 2 argument(s), got 1: [<external [ssh]>]"
        );
        let err = make("(assert-command)").unwrap_err();
        assert!(matches!(err, EasysshError::Arity { received: 0, .. }));
        let err = make("(if-command (external a) (external b) (external c))").unwrap_err();
        assert!(matches!(err, EasysshError::Arity { received: 3, .. }));
        let err = make("(assert-command ssh)").unwrap_err();
        assert!(matches!(err, EasysshError::InvalidArgument { .. }));
    }

    #[test]
    fn unconfigured_nodes_refuse_to_run() {
        let ctx = Context::new(
            Arc::new(FakeCommands::default()),
            Arc::new(RecordingJobs::default()),
        );
        let err = IfOneTarget::default()
            .execute(&targets(&["a"]), &[], &ctx)
            .unwrap_err();
        assert_eq!(err.to_string(), "<if-one-target> was used before being configured");
    }
}
