use std::fmt;

use crate::diagnostics::Arity;
use crate::nodes::{atom_strings, check_arity, Arg, Discoverer};
use crate::target::Target;
use crate::EasysshError;

/// `(separated-by SEP)`: splits the input on `SEP`.
///
/// Pieces are trimmed and empty pieces dropped, so `a,,b,` yields two targets.
#[derive(Debug, Default)]
pub struct SeparatedBy {
    separator: Option<String>,
}

impl SeparatedBy {
    pub(crate) fn configure(&mut self, args: Vec<Arg<Discoverer>>) -> Result<(), EasysshError> {
        let owner = self.to_string();
        check_arity(&owner, Arity::Exactly(1), &args)?;
        let separator = atom_strings(&owner, args)?.remove(0);
        if separator.is_empty() {
            return Err(EasysshError::invalid_argument(
                &owner,
                "the separator must not be empty",
            ));
        }
        self.separator = Some(separator);
        Ok(())
    }

    pub(crate) fn discover(&self, input: &str) -> Result<Vec<Target>, EasysshError> {
        let separator = self
            .separator
            .as_deref()
            .ok_or_else(|| EasysshError::unconfigured(self))?;
        input
            .split(separator)
            .map(str::trim)
            .filter(|piece| !piece.is_empty())
            .map(str::parse::<Target>)
            .collect()
    }
}

impl fmt::Display for SeparatedBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.separator {
            Some(separator) => write!(f, "<separated-by {separator}>"),
            None => f.write_str("<separated-by>"),
        }
    }
}
