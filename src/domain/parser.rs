//! Strategy DSL parser.
//!
//! Recursive descent over the token stream. No error recovery: the first
//! mismatch is returned as a syntax error carrying the position of the
//! offending token and an expected/found description.
//!
//! ```text
//! Program       := StrategyBlock+ EOF
//! StrategyBlock := 'strategy' STRING '{' Statement* '}'
//! Statement     := ConfigStatement | Rule
//! Rule          := 'if' Expression '{' Action+ '}'
//! Action        := ('buy' | 'sell') SYMBOL
//! Expression    := Term ('or' Term)*
//! Term          := Comparison ('and' Comparison)*
//! Comparison    := Primary (Comparator Primary)?
//! Primary       := FunctionCall | NUMBER | IDENTIFIER | SYMBOL | '(' Expression ')'
//! FunctionCall  := (IDENTIFIER | SYMBOL) '(' (Expression (',' Expression)*)? ')'
//! ```

use crate::domain::ast::{
    Action, ActionKind, Comparison, ConfigStatement, Expression, FunctionCall, Primary, Program,
    Rule, Statement, StrategyBlock, Symbol, Term, Timeframe,
};
use crate::domain::error::CompileError;
use crate::domain::lexer;
use crate::domain::token::{Keyword, Punct, Token, TokenKind};

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [Token]) -> Self {
        Self { tokens, pos: 0 }
    }

    fn current(&self) -> &'a Token {
        // The stream always ends in Eof and we never advance past it.
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) -> &'a Token {
        let token = self.current();
        if token.kind != TokenKind::Eof {
            self.pos += 1;
        }
        token
    }

    fn check_keyword(&self, keyword: Keyword) -> bool {
        self.current().kind == TokenKind::Keyword(keyword)
    }

    fn check_punct(&self, punct: Punct) -> bool {
        self.current().kind == TokenKind::Punct(punct)
    }

    fn consume_keyword(&mut self, keyword: Keyword) -> bool {
        if self.check_keyword(keyword) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn consume_punct(&mut self, punct: Punct) -> bool {
        if self.check_punct(punct) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn error(&self, expected: &str) -> CompileError {
        let token = self.current();
        CompileError::syntax(
            format!("expected {}, found {}", expected, token.kind.describe()),
            token.span,
        )
    }

    fn expect_keyword(&mut self, keyword: Keyword) -> Result<(), CompileError> {
        if self.consume_keyword(keyword) {
            Ok(())
        } else {
            Err(self.error(&format!("'{}'", keyword.as_str())))
        }
    }

    fn expect_punct(&mut self, punct: Punct) -> Result<(), CompileError> {
        if self.consume_punct(punct) {
            Ok(())
        } else {
            Err(self.error(&format!("'{}'", punct.as_char())))
        }
    }

    fn expect_string(&mut self) -> Result<String, CompileError> {
        match &self.current().kind {
            TokenKind::Str(s) => {
                let s = s.clone();
                self.advance();
                Ok(s)
            }
            _ => Err(self.error("string literal")),
        }
    }

    fn expect_symbol(&mut self) -> Result<Symbol, CompileError> {
        match &self.current().kind {
            TokenKind::Symbol(s) => {
                let symbol = Symbol(s.clone());
                self.advance();
                Ok(symbol)
            }
            _ => Err(self.error("ticker symbol")),
        }
    }

    fn parse_program(&mut self) -> Result<Program, CompileError> {
        let mut blocks = vec![self.parse_strategy_block()?];
        while self.check_keyword(Keyword::Strategy) {
            blocks.push(self.parse_strategy_block()?);
        }
        if self.current().kind != TokenKind::Eof {
            return Err(self.error("'strategy' or end of input"));
        }
        Ok(Program { blocks })
    }

    fn parse_strategy_block(&mut self) -> Result<StrategyBlock, CompileError> {
        self.expect_keyword(Keyword::Strategy)?;
        let name_span = self.current().span;
        let name = self.expect_string()?;
        self.expect_punct(Punct::LBrace)?;

        let mut statements = Vec::new();
        while !self.consume_punct(Punct::RBrace) {
            statements.push(self.parse_statement()?);
        }

        Ok(StrategyBlock {
            name,
            name_span,
            statements,
        })
    }

    fn parse_statement(&mut self) -> Result<Statement, CompileError> {
        let keyword = match self.current().kind {
            TokenKind::Keyword(Keyword::If) => return Ok(Statement::Rule(self.parse_rule()?)),
            TokenKind::Keyword(k) if k.starts_config() => k,
            _ => return Err(self.error("config statement, 'if' or '}'")),
        };
        self.advance();
        Ok(Statement::Config(self.parse_config_statement(keyword)?))
    }

    /// Parse the rest of a config statement whose keyword was just consumed.
    fn parse_config_statement(&mut self, keyword: Keyword) -> Result<ConfigStatement, CompileError> {
        if keyword == Keyword::Use {
            return Ok(ConfigStatement::UseImport(self.expect_string()?));
        }

        self.expect_punct(Punct::Colon)?;
        match keyword {
            Keyword::Symbols => {
                let mut symbols = vec![self.expect_symbol()?];
                while self.consume_punct(Punct::Comma) {
                    symbols.push(self.expect_symbol()?);
                }
                Ok(ConfigStatement::Symbols(symbols))
            }
            Keyword::Capital => match self.current().kind {
                TokenKind::Dollar(amount) => {
                    self.advance();
                    Ok(ConfigStatement::Capital(amount))
                }
                _ => Err(self.error("dollar amount")),
            },
            Keyword::Timeframe => match &self.current().kind {
                TokenKind::Timeframe(word) => {
                    let timeframe = Timeframe::parse(word).ok_or_else(|| self.error("timeframe"))?;
                    self.advance();
                    Ok(ConfigStatement::Timeframe(timeframe))
                }
                _ => Err(self.error("timeframe ('daily', 'weekly' or 'monthly')")),
            },
            Keyword::Period => {
                let start = self.expect_string()?;
                self.expect_keyword(Keyword::To)?;
                let end = self.expect_string()?;
                Ok(ConfigStatement::Period { start, end })
            }
            Keyword::RiskPerTrade => match self.current().kind {
                TokenKind::Percent(pct) => {
                    self.advance();
                    Ok(ConfigStatement::RiskPerTrade(pct))
                }
                _ => Err(self.error("percentage")),
            },
            _ => Err(self.error("config statement, 'if' or '}'")),
        }
    }

    fn parse_rule(&mut self) -> Result<Rule, CompileError> {
        let span = self.current().span;
        self.expect_keyword(Keyword::If)?;
        let condition = self.parse_expression()?;
        self.expect_punct(Punct::LBrace)?;

        let mut actions = vec![self.parse_action()?];
        while !self.consume_punct(Punct::RBrace) {
            actions.push(self.parse_action()?);
        }

        Ok(Rule {
            condition,
            actions,
            span,
        })
    }

    fn parse_action(&mut self) -> Result<Action, CompileError> {
        let kind = if self.consume_keyword(Keyword::Buy) {
            ActionKind::Buy
        } else if self.consume_keyword(Keyword::Sell) {
            ActionKind::Sell
        } else {
            return Err(self.error("'buy' or 'sell'"));
        };
        let symbol = self.expect_symbol()?;
        Ok(Action { kind, symbol })
    }

    fn parse_expression(&mut self) -> Result<Expression, CompileError> {
        let mut terms = vec![self.parse_term()?];
        while self.consume_keyword(Keyword::Or) {
            terms.push(self.parse_term()?);
        }
        Ok(Expression { terms })
    }

    fn parse_term(&mut self) -> Result<Term, CompileError> {
        let mut comparisons = vec![self.parse_comparison()?];
        while self.consume_keyword(Keyword::And) {
            comparisons.push(self.parse_comparison()?);
        }
        Ok(Term { comparisons })
    }

    fn parse_comparison(&mut self) -> Result<Comparison, CompileError> {
        let left = self.parse_primary()?;
        if let TokenKind::Comparator(op) = self.current().kind {
            self.advance();
            let right = self.parse_primary()?;
            return Ok(Comparison::Binary { left, op, right });
        }
        Ok(Comparison::Bare(left))
    }

    fn parse_primary(&mut self) -> Result<Primary, CompileError> {
        let token = self.current();
        let is_call = matches!(
            self.tokens.get(self.pos + 1).map(|t| &t.kind),
            Some(TokenKind::Punct(Punct::LParen))
        );

        match &token.kind {
            TokenKind::Identifier(name) | TokenKind::Symbol(name) if is_call => {
                self.advance();
                Ok(Primary::Call(self.parse_call_args(name.clone(), token)?))
            }
            TokenKind::Number(value) => {
                self.advance();
                Ok(Primary::Number {
                    value: *value,
                    text: token.text.clone(),
                })
            }
            TokenKind::Identifier(name) => {
                self.advance();
                Ok(Primary::Identifier {
                    name: name.clone(),
                    span: token.span,
                })
            }
            TokenKind::Symbol(s) => {
                self.advance();
                Ok(Primary::Symbol(Symbol(s.clone())))
            }
            TokenKind::Punct(Punct::LParen) => {
                self.advance();
                let inner = self.parse_expression()?;
                self.expect_punct(Punct::RParen)?;
                Ok(Primary::Group(Box::new(inner)))
            }
            _ => Err(self.error("expression")),
        }
    }

    fn parse_call_args(
        &mut self,
        callee: String,
        callee_token: &Token,
    ) -> Result<FunctionCall, CompileError> {
        self.expect_punct(Punct::LParen)?;
        let mut args = Vec::new();
        if !self.consume_punct(Punct::RParen) {
            args.push(self.parse_expression()?);
            while self.consume_punct(Punct::Comma) {
                args.push(self.parse_expression()?);
            }
            self.expect_punct(Punct::RParen)?;
        }
        Ok(FunctionCall {
            callee,
            args,
            span: callee_token.span,
        })
    }
}

/// Parse an already tokenized stream. The stream must end with `Eof`.
pub fn parse_tokens(tokens: &[Token]) -> Result<Program, CompileError> {
    if tokens.is_empty() {
        return Err(CompileError::syntax(
            "expected 'strategy', found end of input",
            Default::default(),
        ));
    }
    Parser::new(tokens).parse_program()
}

/// Tokenize and parse source text into a program.
pub fn parse(input: &str) -> Result<Program, CompileError> {
    let tokens = lexer::tokenize(input)?;
    parse_tokens(&tokens)
}
