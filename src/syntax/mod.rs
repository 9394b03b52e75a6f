//! The untyped term tree produced from DSL text.
//!
//! A [`Term`] is either an atom (an opaque byte string) or a list of terms. Terms carry no
//! semantics of their own; the registries in [`crate::runtime`] give them meaning.

use std::fmt;

use once_cell::sync::Lazy;
use regex::bytes::Regex;

pub mod parser;

pub use parser::parse;

/// A parsed node of the definition language.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Term {
    Atom(Vec<u8>),
    List(Vec<Term>),
}

impl Term {
    pub fn atom(bytes: impl Into<Vec<u8>>) -> Self {
        Term::Atom(bytes.into())
    }

    pub fn list(items: Vec<Term>) -> Self {
        Term::List(items)
    }

    pub fn as_atom(&self) -> Option<&[u8]> {
        match self {
            Term::Atom(bytes) => Some(bytes),
            Term::List(_) => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Term]> {
        match self {
            Term::Atom(_) => None,
            Term::List(items) => Some(items),
        }
    }

    /// Serializes with every atom in verbatim `len:bytes` form.
    ///
    /// The output parses back into an identical term whatever bytes the atoms hold.
    pub fn to_canonical(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.write_canonical(&mut out);
        out
    }

    fn write_canonical(&self, out: &mut Vec<u8>) {
        match self {
            Term::Atom(bytes) => {
                out.extend_from_slice(bytes.len().to_string().as_bytes());
                out.push(b':');
                out.extend_from_slice(bytes);
            }
            Term::List(items) => {
                out.push(b'(');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push(b' ');
                    }
                    item.write_canonical(out);
                }
                out.push(b')');
            }
        }
    }
}

/// Renders a list body the way it reads in a definition: `(a b (c))`.
pub fn display_list(items: &[Term]) -> String {
    Term::List(items.to_vec()).to_string()
}

// Atoms that would lex as something other than a bare token need quoting.
static LENGTH_PREFIXED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+[:\x22]").expect("length prefix regex is valid"));

fn is_bare(bytes: &[u8]) -> bool {
    !bytes.is_empty()
        && !LENGTH_PREFIXED.is_match(bytes)
        && bytes.iter().all(|b| {
            !b.is_ascii_whitespace() && !matches!(b, b'(' | b')' | b'\\' | b'"')
        })
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Atom(bytes) if is_bare(bytes) => {
                write!(f, "{}", String::from_utf8_lossy(bytes))
            }
            Term::Atom(bytes) => match std::str::from_utf8(bytes) {
                Ok(text) => {
                    f.write_str("\"")?;
                    for ch in text.chars() {
                        match ch {
                            '"' => f.write_str("\\\"")?,
                            '\\' => f.write_str("\\\\")?,
                            '\n' => f.write_str("\\n")?,
                            '\t' => f.write_str("\\t")?,
                            '\r' => f.write_str("\\r")?,
                            other => write!(f, "{other}")?,
                        }
                    }
                    f.write_str("\"")
                }
                Err(_) => write!(
                    f,
                    "{}:{}",
                    bytes.len(),
                    String::from_utf8_lossy(bytes)
                ),
            },
            Term::List(items) => {
                f.write_str("(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str(")")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefers_bare_atoms() {
        let term = Term::list(vec![
            Term::atom("external"),
            Term::atom("ssh"),
            Term::list(vec![Term::atom("-l"), Term::atom("root")]),
        ]);
        assert_eq!(term.to_string(), "(external ssh (-l root))");
    }

    #[test]
    fn display_quotes_ambiguous_atoms() {
        let term = Term::list(vec![
            Term::atom("a b"),
            Term::atom(""),
            Term::atom("3:abc"),
            Term::atom("say \"hi\""),
        ]);
        assert_eq!(
            term.to_string(),
            r#"("a b" "" "3:abc" "say \"hi\"")"#
        );
    }

    #[test]
    fn canonical_form_is_verbatim() {
        let term = Term::list(vec![
            Term::atom("sep"),
            Term::atom(","),
            Term::list(vec![]),
        ]);
        assert_eq!(term.to_canonical(), b"(3:sep 1:, ())".to_vec());
    }
}
