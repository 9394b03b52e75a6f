//! Unified, `miette`-based diagnostics for easyssh.
//!
//! Every failure in the pipeline (parsing DSL text, rewriting and constructing node trees,
//! running external tools) is an [`EasysshError`]. The CLI renders them with
//! `miette::Report`; library callers can match on the variant.
//!
//! Construct errors through the helper constructors on [`EasysshError`] rather than by hand;
//! they keep the message formats consistent across node families.

use std::fmt;

use miette::{Diagnostic, LabeledSpan, NamedSource, SourceCode};
use thiserror::Error;

/// Boxed error carried as the cause of an [`EasysshError::ExternalFailure`].
pub type BoxedCause = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The node family a registry or error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Family {
    Discoverer,
    Filter,
    Executor,
}

impl Family {
    pub fn as_str(&self) -> &'static str {
        match self {
            Family::Discoverer => "discoverer",
            Family::Filter => "filter",
            Family::Executor => "executor",
        }
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accepted argument count of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exactly(usize),
    AtLeast(usize),
    None,
}

impl Arity {
    pub fn accepts(&self, received: usize) -> bool {
        match *self {
            Arity::Exactly(n) => received == n,
            Arity::AtLeast(n) => received >= n,
            Arity::None => received == 0,
        }
    }
}

/// Unified error type for all easyssh failure modes.
#[derive(Debug, Error)]
pub enum EasysshError {
    #[error("Unexpected byte at {offset} near '{near}': {message}")]
    Syntax {
        message: String,
        offset: usize,
        near: String,
        src: NamedSource<String>,
    },

    #[error("Unknown {family} '{name}'")]
    UnknownNode {
        family: Family,
        name: String,
        supported: Vec<String>,
    },

    #[error("{}", format_arity(.node, .expected, .received, .args))]
    Arity {
        node: String,
        expected: Arity,
        received: usize,
        args: Vec<String>,
    },

    #[error("{node}: {message}")]
    InvalidArgument { node: String, message: String },

    #[error("Malformed node definition {term}: {message}")]
    MalformedTerm { term: String, message: String },

    #[error("Rewriting {term} did not settle after {steps} steps")]
    RewriteLimit { term: String, steps: usize },

    #[error("{node} {message}")]
    Precondition { node: String, message: String },

    #[error("Executable '{name}' not found in PATH")]
    ExecutableNotFound { name: String },

    #[error("{message}")]
    ExternalFailure {
        message: String,
        #[source]
        source: Option<BoxedCause>,
    },

    #[error("Invalid target: {message}")]
    InvalidTarget { message: String },

    #[error("No targets found for '{input}'")]
    NoTargets { input: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

fn format_arity(node: &str, expected: &Arity, received: &usize, args: &[String]) -> String {
    let args = args.join(" ");
    match expected {
        Arity::Exactly(n) => {
            format!("{node} requires exactly {n} argument(s), got {received}: [{args}]")
        }
        Arity::AtLeast(n) => {
            format!("{node} requires at least {n} argument(s), got {received}: [{args}]")
        }
        Arity::None => format!("{node} doesn't take any arguments, got {received}: [{args}]"),
    }
}

// ============================================================================
// CONSTRUCTORS
// ============================================================================

impl EasysshError {
    /// Builds a syntax error pointing at `offset` in `source`, quoting up to 10 bytes of it.
    pub fn syntax(source: &str, offset: usize, message: impl Into<String>) -> Self {
        let bytes = source.as_bytes();
        let start = offset.min(bytes.len());
        let end = (start + 10).min(bytes.len());
        EasysshError::Syntax {
            message: message.into(),
            offset,
            near: String::from_utf8_lossy(&bytes[start..end]).into_owned(),
            src: NamedSource::new("definition", source.to_string()),
        }
    }

    pub fn arity(node: &impl fmt::Display, expected: Arity, args: Vec<String>) -> Self {
        EasysshError::Arity {
            node: node.to_string(),
            expected,
            received: args.len(),
            args,
        }
    }

    pub fn invalid_argument(node: &impl fmt::Display, message: impl Into<String>) -> Self {
        EasysshError::InvalidArgument {
            node: node.to_string(),
            message: message.into(),
        }
    }

    pub fn precondition(node: &impl fmt::Display, message: impl Into<String>) -> Self {
        EasysshError::Precondition {
            node: node.to_string(),
            message: message.into(),
        }
    }

    /// The node was used before a successful `configure`.
    pub fn unconfigured(node: &impl fmt::Display) -> Self {
        Self::precondition(node, "was used before being configured")
    }

    pub fn external(message: impl Into<String>) -> Self {
        EasysshError::ExternalFailure {
            message: message.into(),
            source: None,
        }
    }

    pub fn external_with<E>(message: impl Into<String>, cause: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        EasysshError::ExternalFailure {
            message: message.into(),
            source: Some(Box::new(cause)),
        }
    }

    pub fn invalid_target(message: impl Into<String>) -> Self {
        EasysshError::InvalidTarget {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        EasysshError::Internal {
            message: message.into(),
        }
    }

    /// True for failures of an external process itself, as opposed to misconfiguration.
    pub fn is_external_failure(&self) -> bool {
        matches!(self, EasysshError::ExternalFailure { .. })
    }

    fn code_str(&self) -> &'static str {
        match self {
            EasysshError::Syntax { .. } => "easyssh::syntax",
            EasysshError::UnknownNode { .. } => "easyssh::unknown_node",
            EasysshError::Arity { .. } => "easyssh::arity",
            EasysshError::InvalidArgument { .. } => "easyssh::invalid_argument",
            EasysshError::MalformedTerm { .. } => "easyssh::malformed_term",
            EasysshError::RewriteLimit { .. } => "easyssh::rewrite_limit",
            EasysshError::Precondition { .. } => "easyssh::precondition",
            EasysshError::ExecutableNotFound { .. } => "easyssh::executable_not_found",
            EasysshError::ExternalFailure { .. } => "easyssh::external",
            EasysshError::InvalidTarget { .. } => "easyssh::target",
            EasysshError::NoTargets { .. } => "easyssh::no_targets",
            EasysshError::Internal { .. } => "easyssh::internal",
        }
    }
}

// ============================================================================
// DIAGNOSTIC IMPLEMENTATION
// ============================================================================

impl Diagnostic for EasysshError {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new(self.code_str()))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let help = match self {
            EasysshError::UnknownNode {
                family, supported, ..
            } => format!("supported {family}s: {}", supported.join(", ")),
            EasysshError::ExecutableNotFound { name } => {
                format!("install '{name}' or add its directory to PATH")
            }
            EasysshError::NoTargets { .. } => {
                "check the discoverer (-d) and filter (-f) definitions".to_string()
            }
            _ => return None,
        };
        Some(Box::new(help))
    }

    fn source_code(&self) -> Option<&dyn SourceCode> {
        match self {
            EasysshError::Syntax { src, .. } => Some(src as &dyn SourceCode),
            _ => None,
        }
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        match self {
            EasysshError::Syntax {
                message, offset, ..
            } => {
                let label = LabeledSpan::new(Some(message.clone()), *offset, 1);
                Some(Box::new(std::iter::once(label)))
            }
            _ => None,
        }
    }
}
