use std::fmt;

use tracing::{error, info};

use crate::diagnostics::Arity;
use crate::nodes::{atom_strings, check_arity, Arg, Executor};
use crate::runtime::process::ExternalJob;
use crate::runtime::Context;
use crate::target::{display_targets, Target};
use crate::EasysshError;

/// How many processes an [`External`] executor starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// One process receiving every target.
    Single,
    /// One process per target, each waited for before the next starts.
    Sequential,
    /// One process per target, all started before any is waited for.
    Parallel,
}

/// `(external[-sequential|-parallel][-interactive] program arg...)`.
///
/// Each job's argv is the configured prefix, then the ssh address(es), then the command.
#[derive(Debug)]
pub struct External {
    mode: Mode,
    interactive: bool,
    argv: Vec<String>,
}

impl External {
    pub fn new(mode: Mode, interactive: bool) -> Self {
        Self {
            mode,
            interactive,
            argv: Vec::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        match (self.mode, self.interactive) {
            (Mode::Single, false) => "external",
            (Mode::Single, true) => "external-interactive",
            (Mode::Sequential, false) => "external-sequential",
            (Mode::Sequential, true) => "external-sequential-interactive",
            (Mode::Parallel, _) => "external-parallel",
        }
    }

    pub(crate) fn configure(&mut self, args: Vec<Arg<Executor>>) -> Result<(), EasysshError> {
        let owner = self.to_string();
        check_arity(&owner, Arity::AtLeast(1), &args)?;
        self.argv = atom_strings(&owner, args)?;
        Ok(())
    }

    /// The jobs a run against `targets` would start.
    pub fn jobs(&self, targets: &[Target], command: &[String]) -> Vec<ExternalJob> {
        match self.mode {
            Mode::Single => {
                let mut argv = self.argv.clone();
                argv.extend(targets.iter().map(Target::ssh_target));
                argv.extend(command.iter().cloned());
                let names: Vec<String> = targets.iter().map(Target::friendly_name).collect();
                vec![ExternalJob {
                    interactive: self.interactive,
                    label: names.join(" "),
                    argv,
                }]
            }
            Mode::Sequential | Mode::Parallel => targets
                .iter()
                .map(|target| {
                    let mut argv = self.argv.clone();
                    argv.push(target.ssh_target());
                    argv.extend(command.iter().cloned());
                    ExternalJob {
                        interactive: self.interactive,
                        label: target.friendly_name(),
                        argv,
                    }
                })
                .collect(),
        }
    }

    pub(crate) fn execute(
        &self,
        targets: &[Target],
        command: &[String],
        ctx: &Context,
    ) -> Result<(), EasysshError> {
        if self.argv.is_empty() {
            return Err(EasysshError::unconfigured(self));
        }
        let jobs = self.jobs(targets, command);
        match self.mode {
            Mode::Single => jobs.iter().try_for_each(|job| {
                info!("Executing {}", job.argv.join(" "));
                ctx.jobs().run(job)
            }),
            Mode::Sequential => {
                for job in &jobs {
                    info!("Executing {}", job.argv.join(" "));
                    match ctx.jobs().run(job) {
                        Err(e) if e.is_external_failure() => error!("{e}"),
                        other => other?,
                    }
                }
                Ok(())
            }
            Mode::Parallel => {
                info!(
                    "Parallelly executing {:?} on {}",
                    command,
                    display_targets(targets)
                );
                ctx.jobs().run_parallel(&jobs)
            }
        }
    }
}

impl fmt::Display for External {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{} [{}]>", self.name(), self.argv.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::runtime::construct_from_str;
    use crate::testing::{FakeCommands, RecordingJobs, Run};

    fn make(definition: &str) -> Executor {
        let registry = crate::nodes::executors::registry().unwrap();
        construct_from_str(definition, &registry).unwrap()
    }

    fn targets() -> Vec<Target> {
        vec![
            Target::from_host("web-1.internal").unwrap().with_hostname("web-1"),
            "root@10.0.0.2".parse().unwrap(),
        ]
    }

    fn command(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    fn run(definition: &str, jobs: &Arc<RecordingJobs>, command: &[String]) -> Result<(), EasysshError> {
        let ctx = Context::new(Arc::new(FakeCommands::default()), jobs.clone());
        make(definition).execute(&targets(), command, &ctx)
    }

    #[test]
    fn single_mode_passes_every_target_to_one_job() {
        let jobs = Arc::new(RecordingJobs::default());
        run("(external-interactive tmux-cssh -q)", &jobs, &[]).unwrap();
        assert_eq!(
            jobs.runs(),
            vec![Run::One(ExternalJob {
                interactive: true,
                label: "web-1 root@10.0.0.2".to_string(),
                argv: command(&["tmux-cssh", "-q", "web-1.internal", "root@10.0.0.2"]),
            })]
        );
    }

    #[test]
    fn sequential_mode_runs_one_job_per_target() {
        let jobs = Arc::new(RecordingJobs::default());
        run("(external-sequential ssh)", &jobs, &command(&["uptime"])).unwrap();
        assert_eq!(
            jobs.runs(),
            vec![
                Run::One(ExternalJob {
                    interactive: false,
                    label: "web-1".to_string(),
                    argv: command(&["ssh", "web-1.internal", "uptime"]),
                }),
                Run::One(ExternalJob {
                    interactive: false,
                    label: "root@10.0.0.2".to_string(),
                    argv: command(&["ssh", "root@10.0.0.2", "uptime"]),
                }),
            ]
        );
    }

    #[test]
    fn sequential_mode_continues_after_a_failure() {
        let jobs = Arc::new(RecordingJobs::failing(&["web-1"]));
        run("(external-sequential ssh)", &jobs, &command(&["uptime"])).unwrap();
        assert_eq!(jobs.runs().len(), 2);
    }

    #[test]
    fn single_mode_propagates_a_failure() {
        let jobs = Arc::new(RecordingJobs::failing(&["web-1 root@10.0.0.2"]));
        let err = run("(external echo)", &jobs, &[]).unwrap_err();
        assert!(err.is_external_failure());
    }

    #[test]
    fn parallel_mode_hands_over_one_batch() {
        let jobs = Arc::new(RecordingJobs::default());
        run("(external-parallel ssh -t)", &jobs, &command(&["ls", "-l"])).unwrap();
        let runs = jobs.runs();
        assert_eq!(runs.len(), 1);
        let Run::Parallel(batch) = &runs[0] else {
            panic!("expected a parallel batch, got {runs:?}");
        };
        assert_eq!(batch[0].argv, command(&["ssh", "-t", "web-1.internal", "ls", "-l"]));
        assert_eq!(batch[1].argv, command(&["ssh", "-t", "root@10.0.0.2", "ls", "-l"]));
    }

    #[test]
    fn descriptions_name_the_variant() {
        assert_eq!(
            make("(external-sequential-interactive ssh)").to_string(),
            "<external-sequential-interactive [ssh]>"
        );
        assert_eq!(make("(external a b)").to_string(), "<external [a b]>");
    }

    #[test]
    fn needs_a_program() {
        let registry = crate::nodes::executors::registry().unwrap();
        let err = construct_from_str("(external-parallel)", &registry).unwrap_err();
        assert_eq!(
            err.to_string(),
            "<external-parallel []> requires at least 1 argument(s), got 0: []"
        );
    }
}
