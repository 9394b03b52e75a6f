use std::fmt;

use crate::diagnostics::Arity;
use crate::nodes::{atom_strings, check_arity, Arg, Discoverer};
use crate::target::Target;
use crate::EasysshError;

/// `(fixed host...)`: always the configured targets, whatever the input.
#[derive(Debug, Default)]
pub struct Fixed {
    targets: Vec<Target>,
}

impl Fixed {
    pub(crate) fn configure(&mut self, args: Vec<Arg<Discoverer>>) -> Result<(), EasysshError> {
        let owner = self.to_string();
        check_arity(&owner, Arity::AtLeast(1), &args)?;
        let targets = atom_strings(&owner, args)?
            .iter()
            .map(|s| {
                s.parse::<Target>()
                    .map_err(|e| EasysshError::invalid_argument(&owner, e.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        self.targets = targets;
        Ok(())
    }

    pub(crate) fn discover(&self) -> Result<Vec<Target>, EasysshError> {
        if self.targets.is_empty() {
            return Err(EasysshError::unconfigured(self));
        }
        Ok(self.targets.clone())
    }
}

impl fmt::Display for Fixed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self.targets.iter().map(Target::ssh_target).collect();
        write!(f, "<fixed [{}]>", names.join(" "))
    }
}
