//! Alias and macro rules applied to definitions before construction.
//!
//! A [`RuleSet`] rewrites the root list of a definition until no rule matches. Children are
//! rewritten later, when the constructor recurses into them, so a rule only ever sees the
//! list it is triggered by.
//!
//! Two rule shapes exist:
//!
//! - [`RewriteRule::Replace`] fires on a list structurally equal to a fixed pattern and
//!   yields a fixed replacement, e.g. `(comma-separated)` to `(separated-by ,)`.
//! - [`RewriteRule::Rename`] fires on a head name and swaps it, keeping the arguments,
//!   e.g. `(const a b)` to `(fixed a b)`.

use tracing::debug;

use crate::syntax::{display_list, parse, Term};
use crate::EasysshError;

/// Upper bound on rule firings for one list; reaching it means the rules form a cycle.
pub const MAX_REWRITE_STEPS: usize = 128;

// ============================================================================
// RULES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RewriteRule {
    Replace {
        pattern: Vec<Term>,
        replacement: Vec<Term>,
    },
    Rename {
        from: String,
        to: String,
    },
}

impl RewriteRule {
    /// Builds a replace rule from two definitions, e.g. `("(csshx)", "(assert-no-command ...)")`.
    pub fn replace(pattern: &str, replacement: &str) -> Result<Self, EasysshError> {
        Ok(RewriteRule::Replace {
            pattern: into_items(parse(pattern)?),
            replacement: into_items(parse(replacement)?),
        })
    }

    pub fn rename(from: impl Into<String>, to: impl Into<String>) -> Self {
        RewriteRule::Rename {
            from: from.into(),
            to: to.into(),
        }
    }

    /// The head name this rule reacts to, if it has one.
    pub fn trigger_name(&self) -> Option<String> {
        match self {
            RewriteRule::Replace { pattern, .. } => pattern
                .first()
                .and_then(Term::as_atom)
                .map(|b| String::from_utf8_lossy(b).into_owned()),
            RewriteRule::Rename { from, .. } => Some(from.clone()),
        }
    }

    pub fn matches(&self, list: &[Term]) -> bool {
        match self {
            RewriteRule::Replace { pattern, .. } => pattern.as_slice() == list,
            RewriteRule::Rename { from, .. } => {
                list.first().and_then(Term::as_atom) == Some(from.as_bytes())
            }
        }
    }

    /// Applies the rule; callers check [`RewriteRule::matches`] first.
    pub fn apply(&self, list: &[Term]) -> Vec<Term> {
        match self {
            RewriteRule::Replace { replacement, .. } => replacement.clone(),
            RewriteRule::Rename { to, .. } => {
                let mut out = Vec::with_capacity(list.len().max(1));
                out.push(Term::atom(to.as_bytes()));
                out.extend(list.iter().skip(1).cloned());
                out
            }
        }
    }
}

fn into_items(term: Term) -> Vec<Term> {
    match term {
        Term::List(items) => items,
        atom => vec![atom],
    }
}

// ============================================================================
// RULE SET
// ============================================================================

/// One rule firing, recorded for `--explain`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteStep {
    /// Head name of the rule that fired.
    pub rule: String,
    pub input: Vec<Term>,
    pub output: Vec<Term>,
}

/// Ordered rules of one node family.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<RewriteRule>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, rule: RewriteRule) -> &mut Self {
        self.rules.push(rule);
        self
    }

    pub fn rules(&self) -> &[RewriteRule] {
        &self.rules
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn trigger_names(&self) -> impl Iterator<Item = String> + '_ {
        self.rules.iter().filter_map(RewriteRule::trigger_name)
    }

    /// Rewrites `list` at the root until no rule matches.
    pub fn rewrite(&self, list: Vec<Term>) -> Result<Vec<Term>, EasysshError> {
        self.expand(list, None)
    }

    /// Like [`RuleSet::rewrite`], also returning every step taken.
    pub fn expand_with_trace(
        &self,
        list: Vec<Term>,
    ) -> Result<(Vec<Term>, Vec<RewriteStep>), EasysshError> {
        let mut trace = Vec::new();
        let out = self.expand(list, Some(&mut trace))?;
        Ok((out, trace))
    }

    fn expand(
        &self,
        mut list: Vec<Term>,
        mut trace: Option<&mut Vec<RewriteStep>>,
    ) -> Result<Vec<Term>, EasysshError> {
        let mut steps = 0;
        while let Some(rule) = self.rules.iter().find(|rule| rule.matches(&list)) {
            if steps == MAX_REWRITE_STEPS {
                return Err(EasysshError::RewriteLimit {
                    term: display_list(&list),
                    steps,
                });
            }
            steps += 1;
            let output = rule.apply(&list);
            debug!(
                "Transform: {} -> {}",
                display_list(&list),
                display_list(&output)
            );
            if let Some(trace) = trace.as_deref_mut() {
                trace.push(RewriteStep {
                    rule: rule.trigger_name().unwrap_or_default(),
                    input: list,
                    output: output.clone(),
                });
            }
            list = output;
        }
        Ok(list)
    }
}
