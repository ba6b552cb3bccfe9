//! Per-block configuration resolution.
//!
//! Folds a block's config statements, in source order with the last write
//! per kind winning, into one immutable [`StrategyConfig`]. Kinds the block
//! does not declare take the defaults from [`CompilerOptions`]; under
//! [`MissingConfigPolicy::Error`] an absent capital, symbols or period is
//! reported instead.

use crate::domain::ast::{ConfigStatement, StrategyBlock, Symbol, Timeframe};
use crate::domain::error::{CompileError, CompileErrors};
use crate::domain::options::{CompilerOptions, MissingConfigPolicy};

#[derive(Debug, Clone, PartialEq)]
pub struct StrategyConfig {
    pub name: String,
    pub symbols: Vec<Symbol>,
    pub capital: u64,
    pub timeframe: Timeframe,
    pub start_date: String,
    pub end_date: String,
    /// Fraction of capital risked per buy (`2%` becomes `0.02`).
    pub risk_per_trade: Option<f64>,
    pub import: Option<String>,
}

#[derive(Default)]
struct Folded {
    symbols: Option<Vec<Symbol>>,
    capital: Option<u64>,
    timeframe: Option<Timeframe>,
    period: Option<(String, String)>,
    risk_per_trade: Option<f64>,
    import: Option<String>,
}

fn fold<'a>(statements: impl Iterator<Item = &'a ConfigStatement>) -> Folded {
    statements.fold(Folded::default(), |mut acc, stmt| {
        match stmt {
            ConfigStatement::UseImport(name) => acc.import = Some(name.clone()),
            ConfigStatement::Symbols(symbols) => acc.symbols = Some(symbols.clone()),
            ConfigStatement::Capital(amount) => acc.capital = Some(*amount),
            ConfigStatement::Timeframe(tf) => acc.timeframe = Some(*tf),
            ConfigStatement::Period { start, end } => {
                acc.period = Some((start.clone(), end.clone()))
            }
            ConfigStatement::RiskPerTrade(pct) => acc.risk_per_trade = Some(pct / 100.0),
        }
        acc
    })
}

pub fn resolve(
    block: &StrategyBlock,
    options: &CompilerOptions,
) -> Result<StrategyConfig, CompileErrors> {
    let folded = fold(block.config_statements());

    if options.missing_config == MissingConfigPolicy::Error {
        let missing: Vec<CompileError> = [
            ("capital", folded.capital.is_none()),
            ("symbols", folded.symbols.is_none()),
            ("period", folded.period.is_none()),
        ]
        .into_iter()
        .filter(|(_, absent)| *absent)
        .map(|(field, _)| {
            CompileError::semantic(
                format!("strategy \"{}\" does not declare {}", block.name, field),
                block.name_span,
            )
        })
        .collect();
        if !missing.is_empty() {
            return Err(CompileErrors(missing));
        }
    }

    let defaults = &options.defaults;
    let (start_date, end_date) = folded
        .period
        .unwrap_or_else(|| (defaults.start_date.clone(), defaults.end_date.clone()));

    Ok(StrategyConfig {
        name: block.name.clone(),
        symbols: folded.symbols.unwrap_or_default(),
        capital: folded.capital.unwrap_or(defaults.capital),
        timeframe: folded.timeframe.unwrap_or(defaults.timeframe),
        start_date,
        end_date,
        risk_per_trade: folded.risk_per_trade,
        import: folded.import,
    })
}
