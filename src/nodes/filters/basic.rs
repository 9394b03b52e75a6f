use std::fmt;

use tracing::debug;

use crate::diagnostics::Arity;
use crate::nodes::{check_arity, child_nodes, describe, Arg, Filter};
use crate::runtime::Context;
use crate::target::{display_targets, Target};
use crate::EasysshError;

/// `(id)`: passes targets through untouched.
#[derive(Debug, Default)]
pub struct Id;

impl Id {
    pub(crate) fn configure(&mut self, args: Vec<Arg<Filter>>) -> Result<(), EasysshError> {
        check_arity(&self.to_string(), Arity::None, &args)
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<id>")
    }
}

/// `(first)`: keeps only the first target.
#[derive(Debug, Default)]
pub struct First;

impl First {
    pub(crate) fn configure(&mut self, args: Vec<Arg<Filter>>) -> Result<(), EasysshError> {
        check_arity(&self.to_string(), Arity::None, &args)
    }
}

impl fmt::Display for First {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<first>")
    }
}

/// `(list f...)`: applies each child in order.
#[derive(Debug, Default)]
pub struct ListFilter {
    filters: Vec<Filter>,
}

impl ListFilter {
    pub(crate) fn configure(&mut self, args: Vec<Arg<Filter>>) -> Result<(), EasysshError> {
        let owner = self.to_string();
        check_arity(&owner, Arity::AtLeast(1), &args)?;
        self.filters = child_nodes(&owner, args)?;
        Ok(())
    }

    pub(crate) fn filter(
        &self,
        targets: Vec<Target>,
        ctx: &Context,
    ) -> Result<Vec<Target>, EasysshError> {
        if self.filters.is_empty() {
            return Err(EasysshError::unconfigured(self));
        }
        let mut targets = targets;
        for filter in &self.filters {
            targets = filter.filter(targets, ctx)?;
            debug!("Targets after filter {filter}: {}", display_targets(&targets));
        }
        Ok(targets)
    }
}

impl fmt::Display for ListFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        describe(f, "list", self.filters.iter().map(Some))
    }
}
