//! Nested-list literal syntax used by descriptor text and template files.
//!
//! The grammar accepts integers, floats, quoted strings, lists `[...]`,
//! tuples `(...)` and dicts `{key: value}`. Trailing commas are allowed and
//! `#` starts a comment running to the end of the line.

use std::fmt;

use crate::error::{TopologyError, TopologyResult};

/// Maximum nesting depth accepted by the parser.
const MAX_DEPTH: usize = 64;

/// One literal value.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    /// Integer.
    Int(i64),
    /// Floating point number.
    Float(f64),
    /// Quoted string.
    Str(String),
    /// `[a, b, ...]`
    List(Vec<Literal>),
    /// `(a, b, ...)`
    Tuple(Vec<Literal>),
    /// `{k: v, ...}`, in source order.
    Dict(Vec<(Literal, Literal)>),
}

impl Literal {
    /// Numeric value of an `Int` or `Float`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Float(x) => Some(*x),
            _ => None,
        }
    }

    /// Contents of a `Str`.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Elements of a `List` or `Tuple`.
    #[must_use]
    pub fn as_sequence(&self) -> Option<&[Literal]> {
        match self {
            Self::List(items) | Self::Tuple(items) => Some(items),
            _ => None,
        }
    }

    /// Looks up a string key in a `Dict`.
    #[must_use]
    pub fn dict_get(&self, key: &str) -> Option<&Literal> {
        match self {
            Self::Dict(entries) => entries
                .iter()
                .find(|(k, _)| k.as_str() == Some(key))
                .map(|(_, v)| v),
            _ => None,
        }
    }
}

impl From<f64> for Literal {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<i64> for Literal {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<&str> for Literal {
    fn from(value: &str) -> Self {
        Self::Str(value.to_owned())
    }
}

fn write_items(f: &mut fmt::Formatter<'_>, items: &[Literal]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(i) => write!(f, "{i}"),
            // Debug keeps a decimal point and round-trips exactly
            Self::Float(x) => write!(f, "{x:?}"),
            Self::Str(s) => {
                f.write_str("'")?;
                for c in s.chars() {
                    match c {
                        '\'' => f.write_str("\\'")?,
                        '\\' => f.write_str("\\\\")?,
                        '\n' => f.write_str("\\n")?,
                        '\t' => f.write_str("\\t")?,
                        _ => write!(f, "{c}")?,
                    }
                }
                f.write_str("'")
            }
            Self::List(items) => {
                f.write_str("[")?;
                write_items(f, items)?;
                f.write_str("]")
            }
            Self::Tuple(items) => {
                f.write_str("(")?;
                write_items(f, items)?;
                if items.len() == 1 {
                    f.write_str(",")?;
                }
                f.write_str(")")
            }
            Self::Dict(entries) => {
                f.write_str("{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                f.write_str("}")
            }
        }
    }
}

/// Parses exactly one literal.
///
/// # Errors
///
/// Returns [`TopologyError::Parse`] if the text is not a single literal.
pub fn parse(text: &str) -> TopologyResult<Literal> {
    let mut parser = Parser::new(text);
    parser.skip_trivia();
    let value = parser.value(0)?;
    parser.skip_trivia();
    if parser.pos < parser.input.len() {
        return Err(parser.error("unexpected trailing input"));
    }
    Ok(value)
}

/// Parses a comma separated sequence of literals, as found in template files
/// and serialized configurations. Empty text yields an empty sequence.
///
/// # Errors
///
/// Returns [`TopologyError::Parse`] on malformed input.
pub fn parse_sequence(text: &str) -> TopologyResult<Vec<Literal>> {
    let mut parser = Parser::new(text);
    let mut values = Vec::new();
    loop {
        parser.skip_trivia();
        if parser.pos >= parser.input.len() {
            break;
        }
        values.push(parser.value(0)?);
        parser.skip_trivia();
        match parser.peek() {
            None => break,
            Some(b',') => parser.pos += 1,
            Some(_) => return Err(parser.error("expected ',' between literals")),
        }
    }
    Ok(values)
}

struct Parser<'a> {
    input: &'a [u8],
    text: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            input: text.as_bytes(),
            text,
            pos: 0,
        }
    }

    fn error(&self, message: impl Into<String>) -> TopologyError {
        TopologyError::parse(self.pos, message)
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn skip_trivia(&mut self) {
        while let Some(b) = self.peek() {
            match b {
                b' ' | b'\t' | b'\n' | b'\r' => self.pos += 1,
                b'#' => {
                    while let Some(c) = self.peek() {
                        if c == b'\n' {
                            break;
                        }
                        self.pos += 1;
                    }
                }
                _ => break,
            }
        }
    }

    fn value(&mut self, depth: usize) -> TopologyResult<Literal> {
        if depth > MAX_DEPTH {
            return Err(self.error("literal nested too deeply"));
        }
        match self.peek() {
            None => Err(self.error("unexpected end of input")),
            Some(b'[') => {
                self.pos += 1;
                let (items, _) = self.items(b']', depth)?;
                Ok(Literal::List(items))
            }
            Some(b'(') => {
                self.pos += 1;
                let (mut items, trailing_comma) = self.items(b')', depth)?;
                // `(x)` is just a parenthesized value
                if items.len() == 1 && !trailing_comma {
                    return Ok(items.remove(0));
                }
                Ok(Literal::Tuple(items))
            }
            Some(b'{') => {
                self.pos += 1;
                self.dict(depth)
            }
            Some(quote @ (b'\'' | b'"')) => {
                self.pos += 1;
                self.string(quote).map(Literal::Str)
            }
            Some(b'+' | b'-' | b'.' | b'0'..=b'9') => self.number(),
            Some(other) => Err(self.error(format!("unexpected character '{}'", other as char))),
        }
    }

    /// Items up to `close`; also reports whether a trailing comma was seen.
    fn items(&mut self, close: u8, depth: usize) -> TopologyResult<(Vec<Literal>, bool)> {
        let mut items = Vec::new();
        let mut trailing_comma = false;
        loop {
            self.skip_trivia();
            if self.peek() == Some(close) {
                self.pos += 1;
                return Ok((items, trailing_comma));
            }
            items.push(self.value(depth + 1)?);
            trailing_comma = false;
            self.skip_trivia();
            match self.peek() {
                Some(b',') => {
                    self.pos += 1;
                    trailing_comma = true;
                }
                Some(c) if c == close => {}
                _ => return Err(self.error(format!("expected ',' or '{}'", close as char))),
            }
        }
    }

    fn dict(&mut self, depth: usize) -> TopologyResult<Literal> {
        let mut entries = Vec::new();
        loop {
            self.skip_trivia();
            if self.peek() == Some(b'}') {
                self.pos += 1;
                return Ok(Literal::Dict(entries));
            }
            let key = self.value(depth + 1)?;
            self.skip_trivia();
            if self.peek() != Some(b':') {
                return Err(self.error("expected ':' after dict key"));
            }
            self.pos += 1;
            self.skip_trivia();
            let value = self.value(depth + 1)?;
            entries.push((key, value));
            self.skip_trivia();
            match self.peek() {
                Some(b',') => self.pos += 1,
                Some(b'}') => {}
                _ => return Err(self.error("expected ',' or '}'")),
            }
        }
    }

    fn string(&mut self, quote: u8) -> TopologyResult<String> {
        let start = self.pos;
        let mut out = String::new();
        let mut chars = self.text[start..].char_indices();
        while let Some((offset, c)) = chars.next() {
            if c == quote as char {
                self.pos = start + offset + 1;
                return Ok(out);
            }
            if c == '\\' {
                let Some((_, escaped)) = chars.next() else {
                    break;
                };
                out.push(match escaped {
                    'n' => '\n',
                    't' => '\t',
                    'r' => '\r',
                    other => other,
                });
            } else {
                out.push(c);
            }
        }
        self.pos = self.input.len();
        Err(TopologyError::parse(start - 1, "unterminated string"))
    }

    fn number(&mut self) -> TopologyResult<Literal> {
        let start = self.pos;
        let mut is_float = false;
        if matches!(self.peek(), Some(b'+' | b'-')) {
            self.pos += 1;
        }
        while let Some(b) = self.peek() {
            match b {
                b'0'..=b'9' | b'_' => self.pos += 1,
                b'.' => {
                    is_float = true;
                    self.pos += 1;
                }
                b'e' | b'E' => {
                    is_float = true;
                    self.pos += 1;
                    if matches!(self.peek(), Some(b'+' | b'-')) {
                        self.pos += 1;
                    }
                }
                _ => break,
            }
        }
        let raw: String = self.text[start..self.pos]
            .chars()
            .filter(|&c| c != '_')
            .collect();
        let parsed = if is_float {
            raw.parse::<f64>().ok().map(Literal::Float)
        } else {
            raw.parse::<i64>().ok().map(Literal::Int)
        };
        parsed.ok_or_else(|| TopologyError::parse(start, format!("invalid number '{raw}'")))
    }
}
