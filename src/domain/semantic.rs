//! Semantic gap detection.
//!
//! Walks a parsed block and reports references the runtime scaffold cannot
//! resolve: identifiers outside the indicator vocabulary, unknown function
//! names, `sma` lengths outside the whitelist, malformed `crossover` calls,
//! unusable import names and malformed periods. Emission still proceeds for
//! all of these; the caller decides whether they are fatal.

use crate::domain::ast::{Comparison, Expression, FunctionCall, Primary, StrategyBlock};
use crate::domain::error::CompileError;
use crate::domain::indicator::{resolve_primary, resolve_sma};
use crate::domain::options::CompilerOptions;
use crate::domain::strategy_config::StrategyConfig;
use chrono::NaiveDate;

/// Function names the code generator knows how to translate.
pub const KNOWN_FUNCTIONS: [&str; 6] = ["sma", "crossover", "price", "volume", "rsi", "zscore"];

pub fn check_block(
    block: &StrategyBlock,
    config: &StrategyConfig,
    options: &CompilerOptions,
) -> Vec<CompileError> {
    let mut gaps = Vec::new();
    for rule in block.rules() {
        check_expression(&rule.condition, options, &mut gaps);
    }
    check_period(config, block, &mut gaps);
    if let Some(name) = &config.import {
        if !is_module_path(name) {
            gaps.push(CompileError::semantic(
                format!("'{}' is not an importable module name", name),
                block.name_span,
            ));
        }
    }
    gaps
}

fn check_expression(expr: &Expression, options: &CompilerOptions, gaps: &mut Vec<CompileError>) {
    for term in &expr.terms {
        for comparison in &term.comparisons {
            match comparison {
                Comparison::Bare(p) => check_primary(p, options, gaps),
                Comparison::Binary { left, right, .. } => {
                    check_primary(left, options, gaps);
                    check_primary(right, options, gaps);
                }
            }
        }
    }
}

fn check_primary(primary: &Primary, options: &CompilerOptions, gaps: &mut Vec<CompileError>) {
    match primary {
        Primary::Identifier { name, span } => {
            if resolve_primary(primary, &options.sma_lengths).is_none() {
                gaps.push(CompileError::semantic(
                    format!("unsupported indicator '{}'", name),
                    *span,
                ));
            }
        }
        Primary::Call(call) => check_call(call, options, gaps),
        Primary::Group(inner) => check_expression(inner, options, gaps),
        Primary::Number { .. } | Primary::Symbol(_) => {}
    }
}

fn check_call(call: &FunctionCall, options: &CompilerOptions, gaps: &mut Vec<CompileError>) {
    let name = call.callee.to_ascii_lowercase();
    match name.as_str() {
        "sma" => match call.args.get(1).and_then(|a| a.as_primary()) {
            Some(Primary::Number { value, text }) if call.args.len() == 2 => {
                if resolve_sma(*value, &options.sma_lengths).is_none() {
                    gaps.push(CompileError::semantic(
                        format!(
                            "sma length {} has no precomputed column (supported: {})",
                            text,
                            join_lengths(&options.sma_lengths)
                        ),
                        call.span,
                    ));
                }
            }
            _ => gaps.push(CompileError::semantic(
                "sma expects (SYMBOL, LENGTH) with a numeric length",
                call.span,
            )),
        },
        "crossover" if call.args.len() != 2 => gaps.push(CompileError::semantic(
            format!("crossover expects 2 arguments, found {}", call.args.len()),
            call.span,
        )),
        "crossover" => {
            // Both sides are read as columns on the current and previous row.
            for (position, arg) in call.args.iter().enumerate() {
                let column = arg
                    .as_primary()
                    .and_then(|p| resolve_primary(p, &options.sma_lengths));
                if column.is_none() {
                    gaps.push(CompileError::semantic(
                        format!(
                            "crossover argument {} has no precomputed column",
                            position + 1
                        ),
                        call.span,
                    ));
                }
            }
            return;
        }
        n if KNOWN_FUNCTIONS.contains(&n) => {}
        _ => gaps.push(CompileError::semantic(
            format!("unknown function '{}'", call.callee),
            call.span,
        )),
    }
    for arg in &call.args {
        check_expression(arg, options, gaps);
    }
}

fn check_period(config: &StrategyConfig, block: &StrategyBlock, gaps: &mut Vec<CompileError>) {
    let parse = |s: &str| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok();
    match (parse(&config.start_date), parse(&config.end_date)) {
        (Some(start), Some(end)) if start < end => {}
        (Some(_), Some(_)) => gaps.push(CompileError::semantic(
            format!(
                "period start {} is not before end {}",
                config.start_date, config.end_date
            ),
            block.name_span,
        )),
        _ => gaps.push(CompileError::semantic(
            format!(
                "period \"{}\" to \"{}\" is not in YYYY-MM-DD format",
                config.start_date, config.end_date
            ),
            block.name_span,
        )),
    }
}

fn join_lengths(lengths: &[usize]) -> String {
    lengths
        .iter()
        .map(|n| n.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Dotted identifier path such as `numpy` or `scipy.stats`.
pub fn is_module_path(name: &str) -> bool {
    !name.is_empty()
        && name.split('.').all(|part| {
            let mut chars = part.chars();
            chars
                .next()
                .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        })
}
