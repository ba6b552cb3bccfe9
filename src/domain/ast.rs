//! Abstract syntax tree for strategy programs.
//!
//! - `Program`: one or more strategy blocks
//! - `StrategyBlock`: a quoted name plus config statements and rules
//! - `ConfigStatement`: one `key: value` setting inside a block
//! - `Rule`: `if <expression> { actions }`
//! - `Expression` / `Term` / `Comparison` / `Primary`: boolean expressions,
//!   precedence low to high (`or`, `and`, comparator, leaf)

use crate::domain::error::Span;
use crate::domain::token::Comparator;

#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub blocks: Vec<StrategyBlock>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StrategyBlock {
    pub name: String,
    pub name_span: Span,
    pub statements: Vec<Statement>,
}

impl StrategyBlock {
    pub fn rules(&self) -> impl Iterator<Item = &Rule> {
        self.statements.iter().filter_map(|s| match s {
            Statement::Rule(rule) => Some(rule),
            Statement::Config(_) => None,
        })
    }

    pub fn config_statements(&self) -> impl Iterator<Item = &ConfigStatement> {
        self.statements.iter().filter_map(|s| match s {
            Statement::Config(cfg) => Some(cfg),
            Statement::Rule(_) => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Config(ConfigStatement),
    Rule(Rule),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Timeframe {
    Daily,
    Weekly,
    Monthly,
}

impl Timeframe {
    pub fn parse(word: &str) -> Option<Timeframe> {
        match word {
            "daily" => Some(Timeframe::Daily),
            "weekly" => Some(Timeframe::Weekly),
            "monthly" => Some(Timeframe::Monthly),
            _ => None,
        }
    }

    /// History interval understood by the runtime data fetcher.
    pub fn interval(&self) -> &'static str {
        match self {
            Timeframe::Daily => "1d",
            Timeframe::Weekly => "1wk",
            Timeframe::Monthly => "1mo",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigStatement {
    UseImport(String),
    Symbols(Vec<Symbol>),
    Capital(u64),
    Timeframe(Timeframe),
    Period { start: String, end: String },
    /// Percentage as written, e.g. `2` for `2%`.
    RiskPerTrade(f64),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Symbol(pub String);

impl Symbol {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    pub condition: Expression,
    pub actions: Vec<Action>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    Buy,
    Sell,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Buy => "buy",
            ActionKind::Sell => "sell",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Action {
    pub kind: ActionKind,
    pub symbol: Symbol,
}

/// `term ('or' term)*`
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    pub terms: Vec<Term>,
}

/// `comparison ('and' comparison)*`
#[derive(Debug, Clone, PartialEq)]
pub struct Term {
    pub comparisons: Vec<Comparison>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Comparison {
    /// A leaf used in boolean context without a comparator.
    Bare(Primary),
    Binary {
        left: Primary,
        op: Comparator,
        right: Primary,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Primary {
    Call(FunctionCall),
    /// Numeric literal; `text` keeps the source spelling for emission.
    Number { value: f64, text: String },
    Identifier { name: String, span: Span },
    Symbol(Symbol),
    Group(Box<Expression>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCall {
    pub callee: String,
    pub args: Vec<Expression>,
    pub span: Span,
}

impl Expression {
    /// Wrap a single primary as a one-term, one-comparison expression.
    pub fn from_primary(primary: Primary) -> Self {
        Expression {
            terms: vec![Term {
                comparisons: vec![Comparison::Bare(primary)],
            }],
        }
    }

    /// The primary this expression consists of, when it is nothing more than
    /// a bare leaf.
    pub fn as_primary(&self) -> Option<&Primary> {
        match self.terms.as_slice() {
            [term] => match term.comparisons.as_slice() {
                [Comparison::Bare(p)] => Some(p),
                _ => None,
            },
            _ => None,
        }
    }
}
