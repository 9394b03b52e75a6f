//! Runnable node families: discoverers, filters and executors.
//!
//! Every family is a closed enum whose variants are configured once from a definition and
//! then run any number of times. The registries in [`crate::runtime::registry`] map names to
//! factories; [`crate::runtime::construct`] builds and configures the tree.

use std::fmt;

use crate::diagnostics::{Arity, Family};
use crate::syntax::Term;
use crate::EasysshError;

pub mod discoverers;
pub mod executors;
pub mod filters;

pub use discoverers::Discoverer;
pub use executors::Executor;
pub use filters::Filter;

/// Common contract of all node families.
///
/// `Display` renders the node's description (`<name args...>`), used only in logs and
/// error messages.
pub trait Node: fmt::Display + Sized {
    const FAMILY: Family;

    /// Validates and stores the arguments. On error the node must be discarded.
    fn configure(&mut self, args: Vec<Arg<Self>>) -> Result<(), EasysshError>;
}

/// A configuration value: a raw atom or an already constructed child node.
#[derive(Debug)]
pub enum Arg<N> {
    Atom(Vec<u8>),
    Node(N),
}

impl<N: fmt::Display> fmt::Display for Arg<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arg::Atom(bytes) => write!(f, "{}", Term::Atom(bytes.clone())),
            Arg::Node(node) => write!(f, "{node}"),
        }
    }
}

// ============================================================================
// CONFIGURATION HELPERS
// ============================================================================

pub(crate) fn check_arity<N: fmt::Display>(
    owner: &str,
    expected: Arity,
    args: &[Arg<N>],
) -> Result<(), EasysshError> {
    if expected.accepts(args.len()) {
        return Ok(());
    }
    Err(EasysshError::arity(
        &owner,
        expected,
        args.iter().map(ToString::to_string).collect(),
    ))
}

/// Takes every argument as a UTF-8 atom.
pub(crate) fn atom_strings<N>(owner: &str, args: Vec<Arg<N>>) -> Result<Vec<String>, EasysshError> {
    args.into_iter()
        .enumerate()
        .map(|(index, arg)| match arg {
            Arg::Atom(bytes) => String::from_utf8(bytes).map_err(|_| {
                EasysshError::invalid_argument(
                    &owner,
                    format!("argument {index} is not valid UTF-8"),
                )
            }),
            Arg::Node(_) => Err(EasysshError::invalid_argument(
                &owner,
                format!("argument {index} must be an atom, not a list"),
            )),
        })
        .collect()
}

/// Takes every argument as a constructed child node.
pub(crate) fn child_nodes<N>(owner: &str, args: Vec<Arg<N>>) -> Result<Vec<N>, EasysshError> {
    args.into_iter()
        .enumerate()
        .map(|(index, arg)| match arg {
            Arg::Node(node) => Ok(node),
            Arg::Atom(bytes) => Err(EasysshError::invalid_argument(
                &owner,
                format!(
                    "argument {index} must be a node definition, got atom {}",
                    Term::Atom(bytes)
                ),
            )),
        })
        .collect()
}

/// Writes `<name child child>`, skipping children that are not configured yet.
pub(crate) fn describe<'a, N, I>(f: &mut fmt::Formatter<'_>, name: &str, children: I) -> fmt::Result
where
    N: fmt::Display + 'a,
    I: IntoIterator<Item = Option<&'a N>>,
{
    write!(f, "<{name}")?;
    for child in children.into_iter().flatten() {
        write!(f, " {child}")?;
    }
    f.write_str(">")
}
