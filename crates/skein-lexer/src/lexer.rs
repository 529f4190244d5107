//! Condition lexer — converts condition text to tokens on demand.
//!
//! Features:
//! - Longest-match operators (`&&`, `||`, `==`, `!=`, `<=`, `>=`, `<`, `>`, `!`)
//! - Double-quoted strings with `\n`, `\t`, `\"`, `\\` escapes
//! - Decimal numbers with optional fraction and exponent
//! - Case-insensitive `true` / `false` / `null`
//! - One token of lookahead via [`Lexer::peek`]
//!
//! Lexing is fail-fast: the first bad character ends the scan with an
//! [`ExprError`] carrying its position.

use skein_types::ExprError;

use crate::token::{Token, TokenKind};

/// The condition lexer.
pub struct Lexer {
    chars: Vec<char>,
    /// Current character offset into `chars`.
    pos: usize,
    /// Token scanned ahead by `peek`.
    peeked: Option<Token>,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            pos: 0,
            peeked: None,
        }
    }

    /// Return the next token without consuming it.
    pub fn peek(&mut self) -> Result<&Token, ExprError> {
        let token = match self.peeked.take() {
            Some(token) => token,
            None => self.scan()?,
        };
        Ok(self.peeked.insert(token))
    }

    /// Consume and return the next token. Returns `Eof` forever once the
    /// input is exhausted.
    pub fn next_token(&mut self) -> Result<Token, ExprError> {
        match self.peeked.take() {
            Some(token) => Ok(token),
            None => self.scan(),
        }
    }

    /// Lex the whole input. The result always ends with [`TokenKind::Eof`].
    pub fn tokenize(mut self) -> Result<Vec<Token>, ExprError> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                return Ok(tokens);
            }
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Character-level helpers
    // ─────────────────────────────────────────────────────────────

    fn peek_char(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek_char()?;
        self.pos += 1;
        Some(ch)
    }

    fn eat_char(&mut self, expected: char) -> bool {
        if self.peek_char() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn text_from(&self, start: usize) -> String {
        self.chars[start..self.pos].iter().collect()
    }

    fn skip_whitespace(&mut self) {
        while self.peek_char().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Scanning
    // ─────────────────────────────────────────────────────────────

    fn scan(&mut self) -> Result<Token, ExprError> {
        self.skip_whitespace();

        let start = self.pos;
        let Some(ch) = self.advance() else {
            return Ok(Token::new(TokenKind::Eof, start));
        };

        let kind = match ch {
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,

            '&' => self.double_char('&', TokenKind::AndAnd, start)?,
            '|' => self.double_char('|', TokenKind::OrOr, start)?,
            '=' => self.double_char('=', TokenKind::EqEq, start)?,

            '!' => {
                if self.eat_char('=') {
                    TokenKind::BangEq
                } else {
                    TokenKind::Bang
                }
            }
            '<' => {
                if self.eat_char('=') {
                    TokenKind::LessEq
                } else {
                    TokenKind::Less
                }
            }
            '>' => {
                if self.eat_char('=') {
                    TokenKind::GreaterEq
                } else {
                    TokenKind::Greater
                }
            }

            '"' => self.scan_string(start)?,

            '0'..='9' => self.scan_number(start)?,

            c if c.is_alphabetic() || c == '_' => self.scan_identifier(start),

            other => {
                return Err(ExprError::UnexpectedCharacter {
                    ch: other,
                    pos: start,
                })
            }
        };

        Ok(Token::new(kind, start))
    }

    /// Operators that only exist doubled (`&&`, `||`, `==`).
    fn double_char(
        &mut self,
        ch: char,
        kind: TokenKind,
        start: usize,
    ) -> Result<TokenKind, ExprError> {
        if self.eat_char(ch) {
            Ok(kind)
        } else {
            Err(ExprError::UnknownOperator {
                op: ch.to_string(),
                pos: start,
            })
        }
    }

    fn scan_string(&mut self, start: usize) -> Result<TokenKind, ExprError> {
        let mut buf = String::new();
        loop {
            match self.advance() {
                None => return Err(ExprError::UnterminatedString { pos: start }),
                Some('"') => return Ok(TokenKind::String(buf)),
                Some('\\') => match self.advance() {
                    Some('n') => buf.push('\n'),
                    Some('t') => buf.push('\t'),
                    Some('"') => buf.push('"'),
                    Some('\\') => buf.push('\\'),
                    // Unknown escapes are kept verbatim.
                    Some(other) => {
                        buf.push('\\');
                        buf.push(other);
                    }
                    None => return Err(ExprError::UnterminatedString { pos: start }),
                },
                Some(ch) => buf.push(ch),
            }
        }
    }

    fn scan_number(&mut self, start: usize) -> Result<TokenKind, ExprError> {
        // First digit already consumed
        self.skip_digits();

        if self.eat_char('.') && !self.require_digits() {
            return Err(self.invalid_number(start));
        }

        if matches!(self.peek_char(), Some('e' | 'E')) {
            self.advance();
            if matches!(self.peek_char(), Some('+' | '-')) {
                self.advance();
            }
            if !self.require_digits() {
                return Err(self.invalid_number(start));
            }
        }

        // `12abc` is a malformed number, not a number followed by a name
        if self
            .peek_char()
            .is_some_and(|c| c.is_alphanumeric() || c == '_' || c == '.')
        {
            while self
                .peek_char()
                .is_some_and(|c| c.is_alphanumeric() || c == '_' || c == '.')
            {
                self.advance();
            }
            return Err(self.invalid_number(start));
        }

        let text = self.text_from(start);
        text.parse::<f64>()
            .map(TokenKind::Number)
            .map_err(|_| ExprError::InvalidNumber { text, pos: start })
    }

    fn skip_digits(&mut self) {
        while self.peek_char().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }
    }

    /// Consume one or more digits; `false` if there were none.
    fn require_digits(&mut self) -> bool {
        let before = self.pos;
        self.skip_digits();
        self.pos > before
    }

    fn invalid_number(&self, start: usize) -> ExprError {
        ExprError::InvalidNumber {
            text: self.text_from(start),
            pos: start,
        }
    }

    fn scan_identifier(&mut self, start: usize) -> TokenKind {
        while self
            .peek_char()
            .is_some_and(|c| c.is_alphanumeric() || c == '_')
        {
            self.advance();
        }
        let text = self.text_from(start);
        TokenKind::from_keyword(&text).unwrap_or(TokenKind::Identifier(text))
    }
}
