use std::fmt;

use tracing::debug;

use crate::diagnostics::Arity;
use crate::nodes::{check_arity, child_nodes, describe, Arg, Discoverer};
use crate::runtime::Context;
use crate::target::Target;
use crate::EasysshError;

/// `(first-matching d...)`: the first child with a non-empty result wins.
#[derive(Debug, Default)]
pub struct FirstMatching {
    discoverers: Vec<Discoverer>,
}

impl FirstMatching {
    pub(crate) fn configure(&mut self, args: Vec<Arg<Discoverer>>) -> Result<(), EasysshError> {
        let owner = self.to_string();
        check_arity(&owner, Arity::AtLeast(1), &args)?;
        self.discoverers = child_nodes(&owner, args)?;
        Ok(())
    }

    pub(crate) fn discover(&self, input: &str, ctx: &Context) -> Result<Vec<Target>, EasysshError> {
        if self.discoverers.is_empty() {
            return Err(EasysshError::unconfigured(self));
        }
        for discoverer in &self.discoverers {
            debug!("Trying discoverer {discoverer}");
            let targets = discoverer.discover(input, ctx)?;
            if !targets.is_empty() {
                return Ok(targets);
            }
        }
        Ok(Vec::new())
    }
}

impl fmt::Display for FirstMatching {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        describe(f, "first-matching", self.discoverers.iter().map(Some))
    }
}
