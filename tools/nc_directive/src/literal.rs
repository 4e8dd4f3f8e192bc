//! Parser for the bracketed string-list literal in expectation comments.
//!
//! Accepted grammar:
//!
//! ```text
//! list    := '[' ( string ( ',' string )* ','? )? ']'
//! string  := ( 'r' | 'R' )? ( '\'' chars '\'' | '"' chars '"' )
//! ```
//!
//! In raw strings a backslash is kept verbatim together with the character
//! that follows it (so `r'\''` is a backslash and a quote). In plain strings
//! the escapes `\\ \' \" \a \b \f \n \r \t \v`, octal `\ooo`, `\xhh`,
//! `\uhhhh` and `\Uhhhhhhhh` are decoded; any other escape is kept as written,
//! so `'\.'` stays `\.`. Use a raw string when a pattern needs `\b` as a word
//! boundary.

/// Error produced while parsing a string-list literal. Offsets are byte
/// offsets into the parsed text.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum LiteralError {
    #[error("expected '[' at offset {0}")]
    ExpectedOpenBracket(usize),
    #[error("expected a string literal at offset {0}")]
    ExpectedString(usize),
    #[error("unterminated string literal starting at offset {0}")]
    UnterminatedString(usize),
    #[error("expected ',' or ']' at offset {0}")]
    ExpectedSeparator(usize),
    #[error("unexpected text after the closing ']' at offset {0}")]
    TrailingText(usize),
    #[error("invalid escape sequence at offset {0}")]
    InvalidEscape(usize),
}

/// Parse a literal such as `[r'foo', "bar\\.baz"]` into its strings.
pub fn parse_string_list(text: &str) -> Result<Vec<String>, LiteralError> {
    let mut cursor = Cursor::new(text);
    cursor.skip_whitespace();
    if !cursor.eat('[') {
        return Err(LiteralError::ExpectedOpenBracket(cursor.pos));
    }

    let mut items = Vec::new();
    loop {
        cursor.skip_whitespace();
        if cursor.eat(']') {
            break;
        }
        items.push(cursor.string_literal()?);
        cursor.skip_whitespace();
        if cursor.eat(',') {
            continue;
        }
        if cursor.eat(']') {
            break;
        }
        return Err(LiteralError::ExpectedSeparator(cursor.pos));
    }

    cursor.skip_whitespace();
    if cursor.peek().is_some() {
        return Err(LiteralError::TrailingText(cursor.pos));
    }
    Ok(items)
}

struct Cursor<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(text: &'a str) -> Self {
        Cursor { text, pos: 0 }
    }

    fn peek(&self) -> Option<char> {
        self.text[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += expected.len_utf8();
            true
        } else {
            false
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    fn string_literal(&mut self) -> Result<String, LiteralError> {
        let start = self.pos;
        let raw = self.eat('r') || self.eat('R');
        let quote = match self.peek() {
            Some(q @ ('\'' | '"')) => q,
            _ => return Err(LiteralError::ExpectedString(start)),
        };
        self.bump();

        let mut value = String::new();
        loop {
            let escape_at = self.pos;
            let Some(c) = self.bump() else {
                return Err(LiteralError::UnterminatedString(start));
            };
            if c == quote {
                return Ok(value);
            }
            if c != '\\' {
                value.push(c);
                continue;
            }
            let Some(escaped) = self.bump() else {
                return Err(LiteralError::UnterminatedString(start));
            };
            if raw {
                value.push('\\');
                value.push(escaped);
            } else {
                self.escape(&mut value, escaped, escape_at)?;
            }
        }
    }

    /// Decode the escape whose backslash sits at `at`; `escaped` is the
    /// character after it, already consumed.
    fn escape(&mut self, value: &mut String, escaped: char, at: usize) -> Result<(), LiteralError> {
        let decoded = match escaped {
            '\\' | '\'' | '"' => escaped,
            'a' => '\u{7}',
            'b' => '\u{8}',
            'f' => '\u{c}',
            'n' => '\n',
            'r' => '\r',
            't' => '\t',
            'v' => '\u{b}',
            '0'..='7' => {
                let mut code = escaped.to_digit(8).unwrap_or(0);
                for _ in 0..2 {
                    match self.peek().and_then(|c| c.to_digit(8)) {
                        Some(digit) => {
                            code = code * 8 + digit;
                            self.bump();
                        }
                        None => break,
                    }
                }
                char::from_u32(code).ok_or(LiteralError::InvalidEscape(at))?
            }
            'x' => self.hex_escape(2, at)?,
            'u' => self.hex_escape(4, at)?,
            'U' => self.hex_escape(8, at)?,
            other => {
                value.push('\\');
                other
            }
        };
        value.push(decoded);
        Ok(())
    }

    /// Exactly `digits` hex digits naming a Unicode scalar value.
    fn hex_escape(&mut self, digits: usize, at: usize) -> Result<char, LiteralError> {
        let mut code: u32 = 0;
        for _ in 0..digits {
            let digit = self
                .peek()
                .and_then(|c| c.to_digit(16))
                .ok_or(LiteralError::InvalidEscape(at))?;
            code = code * 16 + digit;
            self.bump();
        }
        char::from_u32(code).ok_or(LiteralError::InvalidEscape(at))
    }
}
