//! Token types produced by the lexer.

use crate::domain::error::Span;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    Strategy,
    If,
    Buy,
    Sell,
    Or,
    And,
    Use,
    Symbols,
    Capital,
    Timeframe,
    Period,
    To,
    RiskPerTrade,
}

impl Keyword {
    pub const ALL: [Keyword; 13] = [
        Keyword::Strategy,
        Keyword::If,
        Keyword::Buy,
        Keyword::Sell,
        Keyword::Or,
        Keyword::And,
        Keyword::Use,
        Keyword::Symbols,
        Keyword::Capital,
        Keyword::Timeframe,
        Keyword::Period,
        Keyword::To,
        Keyword::RiskPerTrade,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Keyword::Strategy => "strategy",
            Keyword::If => "if",
            Keyword::Buy => "buy",
            Keyword::Sell => "sell",
            Keyword::Or => "or",
            Keyword::And => "and",
            Keyword::Use => "use",
            Keyword::Symbols => "symbols",
            Keyword::Capital => "capital",
            Keyword::Timeframe => "timeframe",
            Keyword::Period => "period",
            Keyword::To => "to",
            Keyword::RiskPerTrade => "risk_per_trade",
        }
    }

    pub fn from_word(word: &str) -> Option<Keyword> {
        Keyword::ALL.into_iter().find(|k| k.as_str() == word)
    }

    /// Keywords that open a config statement inside a strategy block.
    pub fn starts_config(&self) -> bool {
        matches!(
            self,
            Keyword::Use
                | Keyword::Symbols
                | Keyword::Capital
                | Keyword::Timeframe
                | Keyword::Period
                | Keyword::RiskPerTrade
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Punct {
    LBrace,
    RBrace,
    LParen,
    RParen,
    Comma,
    Colon,
}

impl Punct {
    pub fn as_char(&self) -> char {
        match self {
            Punct::LBrace => '{',
            Punct::RBrace => '}',
            Punct::LParen => '(',
            Punct::RParen => ')',
            Punct::Comma => ',',
            Punct::Colon => ':',
        }
    }
}

/// Comparison operators, in the order they are tried by the lexer
/// (two-character forms first).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Comparator {
    Le,
    Ge,
    Eq,
    Ne,
    Lt,
    Gt,
}

impl Comparator {
    pub const ALL: [Comparator; 6] = [
        Comparator::Le,
        Comparator::Ge,
        Comparator::Eq,
        Comparator::Ne,
        Comparator::Lt,
        Comparator::Gt,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Comparator::Lt => "<",
            Comparator::Gt => ">",
            Comparator::Le => "<=",
            Comparator::Ge => ">=",
            Comparator::Eq => "==",
            Comparator::Ne => "!=",
        }
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Keyword(Keyword),
    Punct(Punct),
    Comparator(Comparator),
    /// Decoded contents of a double-quoted literal.
    Str(String),
    /// Uppercase ticker, optionally hyphenated (`BRK-A`).
    Symbol(String),
    /// `$` followed by digits; holds the digits.
    Dollar(u64),
    /// Digits followed by `%`; holds the numeric part.
    Percent(f64),
    /// `daily`, `weekly` or `monthly`.
    Timeframe(String),
    Number(f64),
    Identifier(String),
    Eof,
}

impl TokenKind {
    /// Short description used in "expected X, found Y" messages.
    pub fn describe(&self) -> String {
        match self {
            TokenKind::Keyword(k) => format!("'{}'", k.as_str()),
            TokenKind::Punct(p) => format!("'{}'", p.as_char()),
            TokenKind::Comparator(c) => format!("'{}'", c.as_str()),
            TokenKind::Str(s) => format!("string \"{}\"", s),
            TokenKind::Symbol(s) => format!("symbol '{}'", s),
            TokenKind::Dollar(d) => format!("dollar amount '${}'", d),
            TokenKind::Percent(p) => format!("percentage '{}%'", p),
            TokenKind::Timeframe(t) => format!("timeframe '{}'", t),
            TokenKind::Number(n) => format!("number '{}'", n),
            TokenKind::Identifier(i) => format!("identifier '{}'", i),
            TokenKind::Eof => "end of input".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// Source text the token was read from.
    pub text: String,
    pub span: Span,
}
