//! Definition parser: DSL text to a single root [`Term`] list.
//!
//! Lexical forms, tried in order at each position:
//!
//! - whitespace, skipped
//! - `(` and `)`
//! - quoted strings, `"..."` with an optional advisory length prefix (`5"hello"`)
//! - verbatim atoms, `len:` followed by exactly `len` raw bytes
//! - bare tokens, runs of anything but whitespace, parens and backslash; `\x` escapes a byte
//!
//! The length-prefixed forms must be tried before bare tokens, which would otherwise
//! swallow them.
//!
//! Lists nest at most [`MAX_NESTING`] deep.

use once_cell::sync::Lazy;
use regex::bytes::Regex;

use crate::syntax::Term;
use crate::EasysshError;

static WHITESPACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?-u)^\s+").expect("whitespace regex is valid"));
static QUOTED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?s-u)^(\d+)?"((?:[^\\"]|\\.)*)""#).expect("quoted regex is valid")
});
static VERBATIM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?-u)^(\d+):").expect("verbatim regex is valid"));
static BARE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s-u)^(?:[^\s()\\]|\\.)+").expect("bare token regex is valid"));

/// Deepest list nesting a definition may use, the root list counting as 1.
pub const MAX_NESTING: usize = 256;

// ============================================================================
// PUBLIC API
// ============================================================================

/// Parses a definition such as `(first-matching (knife) (comma-separated))`.
///
/// The input must hold exactly one list, optionally surrounded by whitespace.
pub fn parse(text: &str) -> Result<Term, EasysshError> {
    parse_bytes(text.as_bytes())
}

/// Byte-level variant of [`parse`]; verbatim atoms may hold arbitrary bytes.
pub fn parse_bytes(input: &[u8]) -> Result<Term, EasysshError> {
    let mut lexer = Lexer::new(input);
    let root = match lexer.next_token()? {
        Some((_, Token::Open)) => parse_list(&mut lexer)?,
        Some((offset, _)) => return Err(lexer.error(offset, "a definition must start with '('")),
        None => return Err(lexer.error(input.len(), "unexpected end of input, expected '('")),
    };
    if let Some((offset, _)) = lexer.next_token()? {
        return Err(lexer.error(offset, "unexpected input after the closing ')'"));
    }
    Ok(root)
}

// ============================================================================
// LIST BUILDER
// ============================================================================

// Called after the opening paren of the root list was consumed.
fn parse_list(lexer: &mut Lexer<'_>) -> Result<Term, EasysshError> {
    let mut current: Vec<Term> = Vec::new();
    let mut parents: Vec<Vec<Term>> = Vec::new();
    loop {
        match lexer.next_token()? {
            Some((offset, Token::Open)) => {
                if parents.len() + 1 == MAX_NESTING {
                    return Err(lexer.error(
                        offset,
                        &format!("lists nest deeper than {MAX_NESTING} levels"),
                    ));
                }
                parents.push(std::mem::take(&mut current));
            }
            Some((_, Token::Close)) => {
                let done = Term::List(std::mem::take(&mut current));
                match parents.pop() {
                    Some(mut parent) => {
                        parent.push(done);
                        current = parent;
                    }
                    None => return Ok(done),
                }
            }
            Some((_, Token::Atom(bytes))) => current.push(Term::Atom(bytes)),
            None => {
                return Err(lexer.error(lexer.input.len(), "unexpected end of input, missing ')'"))
            }
        }
    }
}

// ============================================================================
// LEXER
// ============================================================================

#[derive(Debug, PartialEq)]
enum Token {
    Open,
    Close,
    Atom(Vec<u8>),
}

struct Lexer<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a [u8]) -> Self {
        Self { input, pos: 0 }
    }

    fn error(&self, offset: usize, message: &str) -> EasysshError {
        EasysshError::syntax(&String::from_utf8_lossy(self.input), offset, message)
    }

    /// Returns the next token with the byte offset it starts at.
    fn next_token(&mut self) -> Result<Option<(usize, Token)>, EasysshError> {
        if let Some(m) = WHITESPACE.find(&self.input[self.pos..]) {
            self.pos += m.end();
        }
        let start = self.pos;
        let rest = &self.input[start..];
        let Some(&first) = rest.first() else {
            return Ok(None);
        };

        match first {
            b'(' => {
                self.pos += 1;
                return Ok(Some((start, Token::Open)));
            }
            b')' => {
                self.pos += 1;
                return Ok(Some((start, Token::Close)));
            }
            _ => {}
        }

        if let Some(caps) = QUOTED.captures(rest) {
            let whole = caps.get(0).map_or(0, |m| m.end());
            let body = caps.get(2).map_or(&[][..], |m| m.as_bytes());
            self.pos += whole;
            return Ok(Some((start, Token::Atom(unescape_quoted(body)))));
        }

        if let Some(caps) = VERBATIM.captures(rest) {
            let header = caps.get(0).map_or(0, |m| m.end());
            let digits = caps.get(1).map_or(&[][..], |m| m.as_bytes());
            let len = std::str::from_utf8(digits)
                .ok()
                .and_then(|d| d.parse::<usize>().ok())
                .ok_or_else(|| self.error(start, "verbatim length is too large"))?;
            let available = rest.len() - header;
            if len > available {
                return Err(self.error(
                    start,
                    &format!("verbatim atom declares {len} bytes but only {available} remain"),
                ));
            }
            let body = rest[header..header + len].to_vec();
            self.pos += header + len;
            return Ok(Some((start, Token::Atom(body))));
        }

        if let Some(m) = BARE.find(rest) {
            self.pos += m.end();
            return Ok(Some((start, Token::Atom(unescape_bare(m.as_bytes())))));
        }

        Err(self.error(start, "unexpected byte"))
    }
}

fn unescape_quoted(raw: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(raw.len());
    let mut bytes = raw.iter();
    while let Some(&b) = bytes.next() {
        if b != b'\\' {
            out.push(b);
            continue;
        }
        // The regex guarantees a byte follows every backslash.
        match bytes.next() {
            Some(b'n') => out.push(b'\n'),
            Some(b't') => out.push(b'\t'),
            Some(b'r') => out.push(b'\r'),
            Some(&other) => out.push(other),
            None => out.push(b'\\'),
        }
    }
    out
}

fn unescape_bare(raw: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(raw.len());
    let mut bytes = raw.iter();
    while let Some(&b) = bytes.next() {
        if b == b'\\' {
            if let Some(&escaped) = bytes.next() {
                out.push(escaped);
                continue;
            }
        }
        out.push(b);
    }
    out
}
