//! Placeholder scanner.
//!
//! A minimal lexer over raw SQL that finds bind-parameter markers (`:name`
//! and `?`) while skipping quoted strings, quoted identifiers, comments and,
//! for dialects that have them, dollar-quoted bodies.

use std::ops::Range;

/// A placeholder found in SQL text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placeholder<'a> {
    /// The marker text: `:name` including the colon, or `?`.
    pub text: &'a str,
    /// Byte offset of the first character of the marker.
    pub offset: usize,
}

impl Placeholder<'_> {
    /// Returns true for a positional `?` marker.
    #[must_use]
    pub fn is_positional(&self) -> bool {
        self.text == "?"
    }

    /// Byte offset just past the marker.
    #[must_use]
    pub fn end(&self) -> usize {
        self.offset + self.text.len()
    }
}

/// Iterates placeholders of a SQL string left to right.
pub struct PlaceholderScanner<'a> {
    /// The input SQL.
    input: &'a str,
    /// The current byte position.
    pos: usize,
    /// Whether `$tag$ ... $tag$` bodies are treated as quoted.
    dollar_quoting: bool,
}

impl<'a> PlaceholderScanner<'a> {
    /// Creates a scanner starting at the beginning of `input`.
    #[must_use]
    pub const fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            dollar_quoting: false,
        }
    }

    /// Creates a scanner starting at byte offset `from`.
    ///
    /// An offset past the end yields nothing; an offset inside a multi-byte
    /// character is moved forward to the next character boundary.
    #[must_use]
    pub fn starting_at(input: &'a str, from: usize) -> Self {
        let mut pos = from.min(input.len());
        while !input.is_char_boundary(pos) {
            pos += 1;
        }
        Self {
            input,
            pos,
            dollar_quoting: false,
        }
    }

    /// Enables or disables dollar-quote awareness.
    #[must_use]
    pub const fn dollar_quoting(mut self, enabled: bool) -> Self {
        self.dollar_quoting = enabled;
        self
    }

    /// Returns the current byte without advancing.
    fn peek(&self) -> Option<u8> {
        self.input.as_bytes().get(self.pos).copied()
    }

    /// Returns the byte after the current one.
    fn peek_next(&self) -> Option<u8> {
        self.input.as_bytes().get(self.pos + 1).copied()
    }

    /// Moves past the next occurrence of `close`, or to the end of input.
    fn skip_until(&mut self, close: &str) {
        match self.input[self.pos..].find(close) {
            Some(idx) => self.pos += idx + close.len(),
            None => self.pos = self.input.len(),
        }
    }

    /// Tries to read a dollar-quote opening tag (`$$` or `$tag$`) at the
    /// current position and returns it.
    fn dollar_tag(&self) -> Option<&'a str> {
        let rest = &self.input[self.pos..];
        let body = rest.strip_prefix('$')?;
        let tag_len = body
            .bytes()
            .take_while(|b| b.is_ascii_alphanumeric() || *b == b'_')
            .count();
        let tag = &body[..tag_len];
        if tag.as_bytes().first().is_some_and(u8::is_ascii_digit) {
            // `$1` is a positional parameter, not a quote
            return None;
        }
        if body[tag_len..].starts_with('$') {
            Some(&rest[..tag_len + 2])
        } else {
            None
        }
    }

    /// Reads a named placeholder starting at the current `:`.
    fn scan_named(&mut self) -> Placeholder<'a> {
        let start = self.pos;
        self.pos += 1;
        while self
            .peek()
            .is_some_and(|b| b.is_ascii_alphanumeric() || b == b'_')
        {
            self.pos += 1;
        }
        Placeholder {
            text: &self.input[start..self.pos],
            offset: start,
        }
    }
}

impl<'a> Iterator for PlaceholderScanner<'a> {
    type Item = Placeholder<'a>;

    fn next(&mut self) -> Option<Placeholder<'a>> {
        while let Some(b) = self.peek() {
            match b {
                b'\'' | b'"' | b'`' => {
                    self.pos += 1;
                    let close = match b {
                        b'\'' => "'",
                        b'"' => "\"",
                        _ => "`",
                    };
                    self.skip_until(close);
                }
                b'[' => {
                    self.pos += 1;
                    self.skip_until("]");
                }
                b'-' if self.peek_next() == Some(b'-') => self.skip_until("\n"),
                b'/' if self.peek_next() == Some(b'*') => {
                    self.pos += 2;
                    self.skip_until("*/");
                }
                b'$' if self.dollar_quoting => match self.dollar_tag() {
                    Some(tag) => {
                        self.pos += tag.len();
                        self.skip_until(tag);
                    }
                    None => self.pos += 1,
                },
                b':' if self.peek_next() == Some(b':') => self.pos += 2,
                b':' if self
                    .peek_next()
                    .is_some_and(|n| n.is_ascii_alphabetic() || n == b'_') =>
                {
                    return Some(self.scan_named());
                }
                b'?' => {
                    let offset = self.pos;
                    self.pos += 1;
                    return Some(Placeholder {
                        text: &self.input[offset..self.pos],
                        offset,
                    });
                }
                _ => self.pos += 1,
            }
        }
        None
    }
}

/// Finds the first placeholder at or after byte offset `from`.
#[must_use]
pub fn next_placeholder(sql: &str, from: usize, dollar_quoting: bool) -> Option<Placeholder<'_>> {
    PlaceholderScanner::starting_at(sql, from)
        .dollar_quoting(dollar_quoting)
        .next()
}

/// Byte ranges of the string literals in `sql`.
///
/// Single-quoted strings count, and so do `$tag$ ... $tag$` bodies when
/// `dollar_quoting` is set. Quoted identifiers and comments are stepped over
/// so a quote inside them does not open a literal. A doubled `''` yields two
/// adjacent ranges.
#[must_use]
pub fn string_literal_spans(sql: &str, dollar_quoting: bool) -> Vec<Range<usize>> {
    let mut scanner = PlaceholderScanner::new(sql).dollar_quoting(dollar_quoting);
    let mut spans = Vec::new();
    while let Some(b) = scanner.peek() {
        let start = scanner.pos;
        match b {
            b'\'' => {
                scanner.pos += 1;
                scanner.skip_until("'");
                spans.push(start..scanner.pos);
            }
            b'"' | b'`' => {
                scanner.pos += 1;
                scanner.skip_until(if b == b'"' { "\"" } else { "`" });
            }
            b'-' if scanner.peek_next() == Some(b'-') => scanner.skip_until("\n"),
            b'/' if scanner.peek_next() == Some(b'*') => {
                scanner.pos += 2;
                scanner.skip_until("*/");
            }
            b'$' if dollar_quoting => match scanner.dollar_tag() {
                Some(tag) => {
                    scanner.pos += tag.len();
                    scanner.skip_until(tag);
                    spans.push(start..scanner.pos);
                }
                None => scanner.pos += 1,
            },
            _ => scanner.pos += 1,
        }
    }
    spans
}
