//! The lexer (or scanner) for Uni.

use std::borrow::Cow;

use crate::syntax::error::{SyntaxError, SyntaxErrorKind, SyntaxResult};
use crate::syntax::token::{SpannedToken, Token};

/// Our lexical analyzer that breaks source text into tokens
///
/// The lexer is a lazy iterator: each call to `next` scans exactly one token.
/// It yields a single `EOF` token at the end, or a single error if it meets
/// something it cannot scan, and then stops.
pub struct Lexer<'input> {
    pub src: &'input str, // Original source text (kept for slicing)
    pub pos: usize,       // Current byte position in the source
    done: bool,
}

impl<'input> Lexer<'input> {
    #[inline]
    pub fn new(src: &'input str) -> Self {
        Lexer { src, pos: 0, done: false }
    }

    /// Returns the next token and its span from the input.
    ///
    /// Whitespace and `#` comments are skipped first, then the next character
    /// decides what kind of token to produce. At the end of input this keeps
    /// returning `EOF`.
    pub fn next_token(&mut self) -> SyntaxResult<SpannedToken<'input>> {
        self.skip_trivia();

        let start = self.pos;
        let Some(c) = self.peek() else {
            return Ok(SpannedToken { token: Token::EOF, span: start..start });
        };

        let token = if c == '"' {
            self.scan_string(start)?
        } else if c.is_ascii_digit() {
            self.scan_number(start)?
        } else if Self::is_ident_start(c) {
            self.scan_identifier_or_keyword(start)
        } else {
            self.scan_symbol(start, c)?
        };
        Ok(SpannedToken { token, span: start..self.pos })
    }

    #[inline(always)]
    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    #[inline(always)]
    fn bump(&mut self) {
        if let Some(c) = self.peek() {
            self.pos += c.len_utf8();
        }
    }

    #[inline(always)]
    fn is_ident_start(c: char) -> bool {
        c.is_alphabetic() || c == '_'
    }

    #[inline(always)]
    fn is_ident_continue(c: char) -> bool {
        c.is_alphanumeric() || c == '_'
    }

    fn skip_trivia(&mut self) {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => self.bump(),
                Some('#') => {
                    while self.peek().is_some_and(|c| c != '\n') {
                        self.bump();
                    }
                }
                _ => break,
            }
        }
    }

    fn eat_digits(&mut self) {
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.bump();
        }
    }

    fn scan_string(&mut self, start: usize) -> SyntaxResult<Token<'input>> {
        self.bump(); // Skip the opening quote
        let content_start = self.pos;
        // Only allocated once the first escape shows up
        let mut owned: Option<String> = None;
        loop {
            let Some(c) = self.peek() else {
                return Err(SyntaxError::new(
                    SyntaxErrorKind::UnterminatedString,
                    start..self.pos,
                    "string is missing its closing quote",
                ));
            };
            match c {
                '"' => {
                    let content = &self.src[content_start..self.pos];
                    self.bump();
                    return Ok(Token::String(match owned {
                        Some(s) => Cow::Owned(s),
                        None => Cow::Borrowed(content),
                    }));
                }
                '\\' => {
                    let escape_start = self.pos;
                    if owned.is_none() {
                        owned = Some(self.src[content_start..self.pos].to_string());
                    }
                    self.bump();
                    let escaped = match self.peek() {
                        Some('n') => '\n',
                        Some('t') => '\t',
                        Some('"') => '"',
                        Some('\\') => '\\',
                        Some(other) => {
                            self.bump();
                            return Err(SyntaxError::new(
                                SyntaxErrorKind::InvalidStringEscape,
                                escape_start..self.pos,
                                format!("`\\{other}` is not a known escape"),
                            ));
                        }
                        None => {
                            return Err(SyntaxError::new(
                                SyntaxErrorKind::UnterminatedString,
                                start..self.pos,
                                "string is missing its closing quote",
                            ));
                        }
                    };
                    self.bump();
                    if let Some(buf) = owned.as_mut() {
                        buf.push(escaped);
                    }
                }
                _ => {
                    self.bump();
                    if let Some(buf) = owned.as_mut() {
                        buf.push(c);
                    }
                }
            }
        }
    }

    fn scan_number(&mut self, start: usize) -> SyntaxResult<Token<'input>> {
        self.eat_digits();

        let mut is_float = false;
        if self.peek() == Some('.') {
            is_float = true;
            self.bump();
            if !self.peek().is_some_and(|c| c.is_ascii_digit()) {
                return Err(SyntaxError::new(
                    SyntaxErrorKind::InvalidNumber,
                    start..self.pos,
                    "expected a digit after the decimal point",
                ));
            }
            self.eat_digits();
            if self.peek() == Some('.') {
                self.bump();
                return Err(SyntaxError::new(
                    SyntaxErrorKind::InvalidNumber,
                    start..self.pos,
                    "number has more than one decimal point",
                ));
            }
        }

        // Something like "1foo" is neither a number nor an identifier
        if self.peek().is_some_and(Self::is_ident_continue) {
            while self.peek().is_some_and(Self::is_ident_continue) {
                self.bump();
            }
            return Err(SyntaxError::new(
                SyntaxErrorKind::InvalidNumber,
                start..self.pos,
                "names cannot start with a digit",
            ));
        }

        // The text is kept as-is; the parser turns it into a number
        let text = &self.src[start..self.pos];
        Ok(if is_float { Token::Float(text) } else { Token::Int(text) })
    }

    fn scan_identifier_or_keyword(&mut self, start: usize) -> Token<'input> {
        while self.peek().is_some_and(Self::is_ident_continue) {
            self.bump();
        }
        let word = &self.src[start..self.pos];
        Token::keyword(word).unwrap_or(Token::Identifier(word))
    }

    fn scan_symbol(&mut self, start: usize, c: char) -> SyntaxResult<Token<'input>> {
        self.bump();
        // Two-character operators win over their one-character prefix
        if let Some(next) = self.peek() {
            let end = self.pos + next.len_utf8();
            if let Some(token) = Token::symbol(&self.src[start..end]) {
                self.pos = end;
                return Ok(token);
            }
        }
        Token::symbol(&self.src[start..self.pos]).ok_or_else(|| {
            SyntaxError::new(
                SyntaxErrorKind::UnexpectedChar,
                start..self.pos,
                format!("`{c}` is not part of the language"),
            )
        })
    }
}

impl<'input> Iterator for Lexer<'input> {
    type Item = SyntaxResult<SpannedToken<'input>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let result = self.next_token();
        if matches!(result, Ok(SpannedToken { token: Token::EOF, .. }) | Err(_)) {
            self.done = true;
        }
        Some(result)
    }
}
