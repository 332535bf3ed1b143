//! The s-expression reader.
//!
//! Produces plain Value trees; no source positions are attached, so the
//! evaluator stays reader-agnostic. Syntax covered: integers (decimal and
//! `0x` hex), floats, strings with escapes, characters (`#\a`, `#\space`,
//! `#\newline`, `#\tab`), booleans `#t`/`#f`, symbols, `'` quote sugar,
//! proper and dotted lists, and `;` line comments.

use std::fmt;

use crate::{intern::StaticSymbols, interp::Interp, list, value::Value};

/// A reader failure: what went wrong and the character offset it happened
/// at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadError {
    pub message: String,
    pub position: usize,
}

impl ReadError {
    fn new(message: impl Into<String>, position: usize) -> Self {
        Self {
            message: message.into(),
            position,
        }
    }
}

impl fmt::Display for ReadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at offset {}", self.message, self.position)
    }
}

impl std::error::Error for ReadError {}

/// Reads every form in `source` into Value trees.
pub fn read_source(source: &str, interp: &mut Interp) -> Result<Vec<Value>, ReadError> {
    let mut reader = Reader {
        chars: source.chars().collect(),
        pos: 0,
        interp,
    };
    let mut forms = Vec::new();
    loop {
        reader.skip_blank();
        if reader.at_end() {
            return Ok(forms);
        }
        forms.push(reader.read_form()?);
    }
}

struct Reader<'i> {
    chars: Vec<char>,
    pos: usize,
    interp: &'i mut Interp,
}

impl Reader<'_> {
    fn at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn next(&mut self) -> Option<char> {
        let c = self.peek();
        if c.is_some() {
            self.pos += 1;
        }
        c
    }

    fn skip_blank(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.pos += 1;
            } else if c == ';' {
                while let Some(c) = self.peek() {
                    self.pos += 1;
                    if c == '\n' {
                        break;
                    }
                }
            } else {
                return;
            }
        }
    }

    fn read_form(&mut self) -> Result<Value, ReadError> {
        self.skip_blank();
        let start = self.pos;
        match self.peek() {
            None => Err(ReadError::new("unexpected end of input", start)),
            Some('(') => {
                self.pos += 1;
                self.read_list(start)
            }
            Some(')') => Err(ReadError::new("unexpected )", start)),
            Some('\'') => {
                self.pos += 1;
                let quoted = self.read_form()?;
                let quote = Value::Symbol(StaticSymbols::Quote.into());
                let items = [quote, quoted];
                Ok(list::array_to_list(&mut self.interp.heap, &items))
            }
            Some('"') => {
                self.pos += 1;
                self.read_string(start)
            }
            Some('#') => self.read_hash(start),
            Some(_) => self.read_atom(),
        }
    }

    fn read_list(&mut self, start: usize) -> Result<Value, ReadError> {
        let mut items = Vec::new();
        loop {
            self.skip_blank();
            match self.peek() {
                None => return Err(ReadError::new("unterminated list", start)),
                Some(')') => {
                    self.pos += 1;
                    return Ok(list::array_to_list(&mut self.interp.heap, &items));
                }
                Some('.') if self.dot_is_standalone() => {
                    if items.is_empty() {
                        return Err(ReadError::new("dotted tail requires a preceding element", self.pos));
                    }
                    self.pos += 1;
                    let tail = self.read_form()?;
                    self.skip_blank();
                    if self.peek() != Some(')') {
                        return Err(ReadError::new("dotted tail allows exactly one form", self.pos));
                    }
                    self.pos += 1;
                    return Ok(list::array_to_list_with_tail(&mut self.interp.heap, &items, tail));
                }
                Some(_) => items.push(self.read_form()?),
            }
        }
    }

    /// A `.` only ends a list when it stands alone; `.5` or `.foo` is an
    /// atom.
    fn dot_is_standalone(&self) -> bool {
        match self.chars.get(self.pos + 1) {
            None => true,
            Some(&c) => c.is_whitespace() || c == '(' || c == ')' || c == ';',
        }
    }

    fn read_string(&mut self, start: usize) -> Result<Value, ReadError> {
        let mut text = String::new();
        loop {
            match self.next() {
                None => return Err(ReadError::new("unterminated string literal", start)),
                Some('"') => return Ok(self.interp.string(&text)),
                Some('\\') => match self.next() {
                    Some('n') => text.push('\n'),
                    Some('t') => text.push('\t'),
                    Some('r') => text.push('\r'),
                    Some('\\') => text.push('\\'),
                    Some('"') => text.push('"'),
                    Some(other) => {
                        return Err(ReadError::new(format!("unknown string escape \\{other}"), self.pos - 1));
                    }
                    None => return Err(ReadError::new("unterminated string literal", start)),
                },
                Some(c) => text.push(c),
            }
        }
    }

    fn read_hash(&mut self, start: usize) -> Result<Value, ReadError> {
        self.pos += 1;
        match self.next() {
            Some('t') => Ok(Value::Boolean(true)),
            Some('f') => Ok(Value::Boolean(false)),
            Some('\\') => self.read_character(start),
            Some(other) => Err(ReadError::new(format!("unknown # syntax: #{other}"), start)),
            None => Err(ReadError::new("unexpected end of input after #", start)),
        }
    }

    fn read_character(&mut self, start: usize) -> Result<Value, ReadError> {
        let mut name = String::new();
        while let Some(c) = self.peek() {
            if name.is_empty() || c.is_alphabetic() {
                name.push(c);
                self.pos += 1;
            } else {
                break;
            }
        }
        match name.as_str() {
            "space" => Ok(Value::Character(' ')),
            "newline" => Ok(Value::Character('\n')),
            "tab" => Ok(Value::Character('\t')),
            _ => {
                let mut chars = name.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Ok(Value::Character(c)),
                    _ => Err(ReadError::new(format!("unknown character literal #\\{name}"), start)),
                }
            }
        }
    }

    fn read_atom(&mut self) -> Result<Value, ReadError> {
        let mut token = String::new();
        while let Some(c) = self.peek() {
            if c.is_whitespace() || matches!(c, '(' | ')' | '"' | ';' | '\'') {
                break;
            }
            token.push(c);
            self.pos += 1;
        }
        debug_assert!(!token.is_empty(), "read_atom called at a token start");

        let (digits, negative) = match token.strip_prefix('-') {
            Some(rest) => (rest, true),
            None => (token.as_str(), false),
        };
        if let Some(hex) = digits.strip_prefix("0x")
            && let Ok(magnitude) = i64::from_str_radix(hex, 16)
        {
            return Ok(Value::Integer(if negative { -magnitude } else { magnitude }));
        }
        if let Ok(n) = token.parse::<i64>() {
            return Ok(Value::Integer(n));
        }
        // Only numeric-looking tokens become floats: symbols like `e` or
        // `inf` must stay symbols even though f64 parsing accepts them.
        if token.starts_with(|c: char| c.is_ascii_digit() || c == '-' || c == '+' || c == '.')
            && token.contains(|c: char| c.is_ascii_digit())
            && let Ok(f) = token.parse::<f64>()
        {
            return Ok(Value::Float(f));
        }
        Ok(self.interp.symbol(&token))
    }
}
