use std::fmt;
use std::io::Write;

use tracing::debug;

use crate::diagnostics::Arity;
use crate::nodes::{atom_strings, check_arity, Arg, Filter};
use crate::runtime::Context;
use crate::target::Target;
use crate::EasysshError;

/// `(external program arg...)`: lets another program pick the targets.
///
/// The ssh addresses are written one per line to a temporary file whose path is appended
/// to the command line. The program shares the terminal (stdin and stderr) so it can be
/// interactive; each non-blank line it prints on stdout is a resulting target. Lines
/// matching an input address keep that input target with all its fields.
#[derive(Debug, Default)]
pub struct ExternalFilter {
    argv: Vec<String>,
}

impl ExternalFilter {
    pub(crate) fn configure(&mut self, args: Vec<Arg<Filter>>) -> Result<(), EasysshError> {
        let owner = self.to_string();
        check_arity(&owner, Arity::AtLeast(1), &args)?;
        self.argv = atom_strings(&owner, args)?;
        Ok(())
    }

    pub(crate) fn filter(
        &self,
        targets: Vec<Target>,
        ctx: &Context,
    ) -> Result<Vec<Target>, EasysshError> {
        let (program, rest) = self
            .argv
            .split_first()
            .ok_or_else(|| EasysshError::unconfigured(self))?;

        let mut file = tempfile::Builder::new()
            .prefix("easyssh")
            .tempfile()
            .map_err(|e| EasysshError::external_with("Failed to create a temporary file", e))?;
        let listing: Vec<String> = targets.iter().map(Target::ssh_target).collect();
        file.write_all(listing.join("\n").as_bytes())
            .and_then(|_| file.flush())
            .map_err(|e| EasysshError::external_with("Failed to write the target list", e))?;

        let mut args = rest.to_vec();
        args.push(file.path().to_string_lossy().into_owned());
        debug!("Running filter {program} {}", args.join(" "));
        let out = ctx.commands().output_with_terminal(program, &args)?;
        if !out.success {
            return Err(EasysshError::external(format!(
                "Filter {self} failed with exit code {}",
                out.exit_code
            )));
        }

        out.stdout
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| match targets.iter().find(|t| t.ssh_target() == line) {
                Some(known) => Ok(known.clone()),
                None => line.parse::<Target>(),
            })
            .collect()
    }
}

impl fmt::Display for ExternalFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<external [{}]>", self.argv.join(" "))
    }
}
