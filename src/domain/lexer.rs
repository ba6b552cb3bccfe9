//! Lexer for the strategy DSL.
//!
//! Turns raw source text into a token stream terminated by an `Eof` token.
//! Whitespace and `//` line comments are discarded. Words are read with
//! maximal munch and then classified: keyword, timeframe literal, ticker
//! symbol (`[A-Z]+` with an optional `-[A-Z]+` suffix), otherwise identifier.

use crate::domain::error::{CompileError, Span};
use crate::domain::token::{Comparator, Keyword, Punct, Token, TokenKind};

const TIMEFRAMES: [&str; 3] = ["daily", "weekly", "monthly"];

struct Lexer<'a> {
    input: &'a str,
    pos: usize,
    line: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            line: 1,
            column: 1,
        }
    }

    fn remaining(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.remaining().chars().next()
    }

    fn peek_nth(&self, n: usize) -> Option<char> {
        self.remaining().chars().nth(n)
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    fn span(&self) -> Span {
        Span::new(self.pos, self.line, self.column)
    }

    fn skip_trivia(&mut self) {
        loop {
            match self.peek() {
                Some(ch) if ch.is_whitespace() => {
                    self.advance();
                }
                Some('/') if self.peek_nth(1) == Some('/') => {
                    while let Some(ch) = self.peek() {
                        if ch == '\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                _ => break,
            }
        }
    }

    fn consume_digits(&mut self) -> usize {
        let mut count = 0;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
            count += 1;
        }
        count
    }

    fn token(&self, kind: TokenKind, start: Span) -> Token {
        Token {
            kind,
            text: self.input[start.offset..self.pos].to_string(),
            span: start,
        }
    }

    fn lex_string(&mut self, start: Span) -> Result<Token, CompileError> {
        self.advance();
        let mut value = String::new();
        loop {
            match self.peek() {
                None | Some('\n') | Some('\r') => {
                    return Err(CompileError::lexical(
                        "unterminated string literal",
                        start,
                    ));
                }
                Some('"') => {
                    self.advance();
                    break;
                }
                Some('\\') => {
                    self.advance();
                    match self.advance() {
                        Some('n') => value.push('\n'),
                        Some('t') => value.push('\t'),
                        Some(ch) if ch != '\n' && ch != '\r' => value.push(ch),
                        _ => {
                            return Err(CompileError::lexical(
                                "unterminated string literal",
                                start,
                            ));
                        }
                    }
                }
                Some(ch) => {
                    value.push(ch);
                    self.advance();
                }
            }
        }
        Ok(self.token(TokenKind::Str(value), start))
    }

    fn lex_dollar(&mut self, start: Span) -> Result<Token, CompileError> {
        self.advance();
        let digits_start = self.pos;
        if self.consume_digits() == 0 {
            return Err(CompileError::lexical(
                "expected digits after '$'",
                start,
            ));
        }
        let digits = &self.input[digits_start..self.pos];
        let amount = digits.parse::<u64>().map_err(|_| {
            CompileError::lexical(format!("dollar amount out of range: ${}", digits), start)
        })?;
        Ok(self.token(TokenKind::Dollar(amount), start))
    }

    fn lex_number(&mut self, start: Span) -> Result<Token, CompileError> {
        let negative = self.peek() == Some('-');
        if negative {
            self.advance();
        }
        self.consume_digits();
        if self.peek() == Some('.') && self.peek_nth(1).is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
            self.consume_digits();
        }

        let num_str = &self.input[start.offset..self.pos];
        let value = num_str.parse::<f64>().map_err(|_| {
            CompileError::lexical(format!("invalid number: {}", num_str), start)
        })?;

        if !negative && self.peek() == Some('%') {
            self.advance();
            return Ok(self.token(TokenKind::Percent(value), start));
        }
        Ok(self.token(TokenKind::Number(value), start))
    }

    fn lex_word(&mut self, start: Span) -> Token {
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            self.advance();
        }
        let word = &self.input[start.offset..self.pos];

        if let Some(keyword) = Keyword::from_word(word) {
            return self.token(TokenKind::Keyword(keyword), start);
        }
        if TIMEFRAMES.contains(&word) {
            return self.token(TokenKind::Timeframe(word.to_string()), start);
        }
        if is_ticker(word) {
            if self.peek() == Some('-') && self.peek_nth(1).is_some_and(|c| c.is_ascii_uppercase())
            {
                self.advance();
                while self.peek().is_some_and(|c| c.is_ascii_uppercase()) {
                    self.advance();
                }
            }
            let symbol = self.input[start.offset..self.pos].to_string();
            return self.token(TokenKind::Symbol(symbol), start);
        }
        self.token(TokenKind::Identifier(word.to_string()), start)
    }

    fn lex_operator(&mut self, start: Span) -> Option<Token> {
        let rest = self.remaining();
        let comparator = Comparator::ALL
            .into_iter()
            .find(|c| rest.starts_with(c.as_str()))?;
        for _ in 0..comparator.as_str().len() {
            self.advance();
        }
        Some(self.token(TokenKind::Comparator(comparator), start))
    }

    fn next_token(&mut self) -> Result<Token, CompileError> {
        self.skip_trivia();
        let start = self.span();

        let ch = match self.peek() {
            Some(ch) => ch,
            None => return Ok(self.token(TokenKind::Eof, start)),
        };

        let punct = match ch {
            '{' => Some(Punct::LBrace),
            '}' => Some(Punct::RBrace),
            '(' => Some(Punct::LParen),
            ')' => Some(Punct::RParen),
            ',' => Some(Punct::Comma),
            ':' => Some(Punct::Colon),
            _ => None,
        };
        if let Some(p) = punct {
            self.advance();
            return Ok(self.token(TokenKind::Punct(p), start));
        }

        match ch {
            '"' => self.lex_string(start),
            '$' => self.lex_dollar(start),
            c if c.is_ascii_digit() => self.lex_number(start),
            '-' if self.peek_nth(1).is_some_and(|c| c.is_ascii_digit()) => {
                self.lex_number(start)
            }
            c if c.is_ascii_alphabetic() || c == '_' => Ok(self.lex_word(start)),
            _ => self.lex_operator(start).ok_or_else(|| {
                CompileError::lexical(format!("unexpected character '{}'", ch), start)
            }),
        }
    }

    fn tokenize(&mut self) -> Result<Vec<Token>, CompileError> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let done = token.kind == TokenKind::Eof;
            tokens.push(token);
            if done {
                return Ok(tokens);
            }
        }
    }
}

fn is_ticker(word: &str) -> bool {
    !word.is_empty() && word.chars().all(|c| c.is_ascii_uppercase())
}

/// Tokenize the full source text. The returned stream always ends with an
/// `Eof` token.
pub fn tokenize(input: &str) -> Result<Vec<Token>, CompileError> {
    Lexer::new(input).tokenize()
}
