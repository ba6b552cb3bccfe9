//! Reference interpreter for strategy blocks.
//!
//! Runs a block's rules over in-memory rows with the semantics of the
//! emitted script, so behaviour can be checked without a Python runtime.
//!
//! # Evaluation Semantics
//!
//! - Rows are visited from index 1; row 0 only feeds `crossover`
//! - Every rule is evaluated on every row, in source order; several rules
//!   may fire on the same row
//! - `and`/`or` short-circuit and return an operand, as Python does
//! - Bare leaves use Python truthiness (non-zero numbers, non-empty strings)
//! - Comparisons involving NaN are false
//! - Actions trade at the current row's `price`

use std::cmp::Ordering;

use tracing::debug;

use crate::domain::ast::{
    ActionKind, Comparison, Expression, FunctionCall, Primary, StrategyBlock, Term,
};
use crate::domain::error::StockDslError;
use crate::domain::indicator::resolve_primary;
use crate::domain::options::CompilerOptions;
use crate::domain::portfolio::Portfolio;
use crate::domain::row::Row;
use crate::domain::strategy_config::StrategyConfig;
use crate::domain::token::Comparator;
use crate::ports::data_port::DataPort;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Num(f64),
    Bool(bool),
    Str(String),
}

impl Value {
    pub fn truthy(&self) -> bool {
        match self {
            Value::Num(n) => *n != 0.0,
            Value::Bool(b) => *b,
            Value::Str(s) => !s.is_empty(),
        }
    }

    fn as_number(&self) -> Option<f64> {
        match self {
            Value::Num(n) => Some(*n),
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Value::Str(_) => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SimulationReport {
    pub initial_capital: f64,
    pub portfolio: Portfolio,
    /// Console lines printed while the strategy loop ran.
    pub log: Vec<String>,
}

impl SimulationReport {
    /// The lines the emitted script prints for the same run.
    pub fn transcript(&self) -> Vec<String> {
        let mut lines = vec![
            "--- Starting Backtest ---".to_string(),
            format!("Initial Capital: ${:.2}", self.initial_capital),
            String::new(),
        ];
        lines.extend(self.log.iter().cloned());
        lines.push(String::new());
        lines.push("--- Backtest Finished ---".to_string());
        lines.push("Trade History:".to_string());
        if self.portfolio.history.is_empty() {
            lines.push("No trades were executed.".to_string());
        } else {
            lines.extend(self.portfolio.history.iter().cloned());
        }
        lines.push(String::new());
        lines.push("Final Portfolio:".to_string());
        lines.push(format!("Final Capital: ${:.2}", self.portfolio.capital));
        lines.push(format!("Positions: {}", self.portfolio.positions_display()));
        lines
    }
}

struct Cursor<'a> {
    rows: &'a [Row],
    index: usize,
    symbol: &'a str,
    sma_lengths: &'a [usize],
}

impl Cursor<'_> {
    fn at(&self, index: usize) -> Self {
        Cursor { index, ..*self }
    }

    fn binding(&self, name: &str) -> Result<f64, StockDslError> {
        self.rows[self.index].get(name).ok_or_else(|| StockDslError::Simulation {
            reason: format!(
                "{} row {} has no '{}' value",
                self.symbol, self.index, name
            ),
        })
    }
}

fn eval_expression(expr: &Expression, cur: &Cursor) -> Result<Value, StockDslError> {
    let mut value = Value::Bool(false);
    for (i, term) in expr.terms.iter().enumerate() {
        value = eval_term(term, cur)?;
        if value.truthy() || i + 1 == expr.terms.len() {
            break;
        }
    }
    Ok(value)
}

fn eval_term(term: &Term, cur: &Cursor) -> Result<Value, StockDslError> {
    let mut value = Value::Bool(true);
    for (i, comparison) in term.comparisons.iter().enumerate() {
        value = eval_comparison(comparison, cur)?;
        if !value.truthy() || i + 1 == term.comparisons.len() {
            break;
        }
    }
    Ok(value)
}

fn eval_comparison(comparison: &Comparison, cur: &Cursor) -> Result<Value, StockDslError> {
    match comparison {
        Comparison::Bare(p) => eval_primary(p, cur),
        Comparison::Binary { left, op, right } => {
            let l = eval_primary(left, cur)?;
            let r = eval_primary(right, cur)?;
            compare(&l, *op, &r).map(Value::Bool)
        }
    }
}

fn compare(left: &Value, op: Comparator, right: &Value) -> Result<bool, StockDslError> {
    let ordering = match (left, right) {
        (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
        (Value::Str(_), _) | (_, Value::Str(_)) => {
            return match op {
                Comparator::Eq => Ok(false),
                Comparator::Ne => Ok(true),
                _ => Err(StockDslError::Simulation {
                    reason: format!("'{}' not supported between text and number", op),
                }),
            };
        }
        (a, b) => match (a.as_number(), b.as_number()) {
            (Some(x), Some(y)) => x.partial_cmp(&y),
            _ => None,
        },
    };
    // NaN compares unequal to everything.
    Ok(match ordering {
        None => op == Comparator::Ne,
        Some(o) => match op {
            Comparator::Lt => o == Ordering::Less,
            Comparator::Le => o != Ordering::Greater,
            Comparator::Gt => o == Ordering::Greater,
            Comparator::Ge => o != Ordering::Less,
            Comparator::Eq => o == Ordering::Equal,
            Comparator::Ne => o != Ordering::Equal,
        },
    })
}

fn eval_primary(primary: &Primary, cur: &Cursor) -> Result<Value, StockDslError> {
    if let Some(indicator) = resolve_primary(primary, cur.sma_lengths) {
        return cur.binding(&indicator.binding()).map(Value::Num);
    }
    match primary {
        Primary::Number { value, .. } => Ok(Value::Num(*value)),
        Primary::Symbol(s) => Ok(Value::Str(s.as_str().to_string())),
        Primary::Group(inner) => eval_expression(inner, cur),
        Primary::Identifier { name, .. } => Err(StockDslError::Simulation {
            reason: format!("name '{}' is not defined", name),
        }),
        Primary::Call(call) => eval_call(call, cur),
    }
}

fn eval_call(call: &FunctionCall, cur: &Cursor) -> Result<Value, StockDslError> {
    if call.callee.eq_ignore_ascii_case("crossover") && call.args.len() == 2 {
        if cur.index == 0 {
            return Ok(Value::Bool(false));
        }
        let a = series_binding(&call.args[0], cur.sma_lengths)?;
        let b = series_binding(&call.args[1], cur.sma_lengths)?;
        let prev = cur.at(cur.index - 1);
        let (a_now, b_now) = (Value::Num(cur.binding(&a)?), Value::Num(cur.binding(&b)?));
        let (a_prev, b_prev) = (Value::Num(prev.binding(&a)?), Value::Num(prev.binding(&b)?));
        let crossed = compare(&a_now, Comparator::Gt, &b_now)?
            && compare(&a_prev, Comparator::Le, &b_prev)?;
        return Ok(Value::Bool(crossed));
    }
    Err(StockDslError::Simulation {
        reason: format!("name '{}' is not defined", call.callee.to_ascii_lowercase()),
    })
}

/// Binding a crossover argument reads on each row. The emitted script indexes
/// the data frame by column, so only indicator arguments have a series.
fn series_binding(arg: &Expression, sma_lengths: &[usize]) -> Result<String, StockDslError> {
    arg.as_primary()
        .and_then(|p| resolve_primary(p, sma_lengths))
        .map(|indicator| indicator.binding())
        .ok_or_else(|| StockDslError::Simulation {
            reason: "crossover argument has no precomputed column".to_string(),
        })
}

/// Run one block over the rows `data` provides for each configured symbol.
pub fn simulate(
    block: &StrategyBlock,
    config: &StrategyConfig,
    options: &CompilerOptions,
    data: &dyn DataPort,
) -> Result<SimulationReport, StockDslError> {
    let initial_capital = config.capital as f64;
    let mut portfolio = Portfolio::new(initial_capital, config.risk_per_trade);
    let mut log = Vec::new();

    for symbol in &config.symbols {
        let symbol = symbol.as_str();
        let rows = data.load_rows(symbol)?;
        if rows.is_empty() {
            log.push(format!("Skipping {} due to no data.", symbol));
            continue;
        }
        debug!(symbol, rows = rows.len(), "simulating symbol");

        for index in 1..rows.len() {
            let cur = Cursor {
                rows: &rows,
                index,
                symbol,
                sma_lengths: &options.sma_lengths,
            };
            for rule in block.rules() {
                if !eval_expression(&rule.condition, &cur)?.truthy() {
                    continue;
                }
                let price = cur.binding("price")?;
                for action in &rule.actions {
                    let before = portfolio.notices.len();
                    match action.kind {
                        ActionKind::Buy => portfolio.buy(action.symbol.as_str(), price),
                        ActionKind::Sell => portfolio.sell(action.symbol.as_str(), price),
                    }
                    log.extend(portfolio.notices[before..].iter().cloned());
                }
            }
        }
    }

    Ok(SimulationReport {
        initial_capital,
        portfolio,
        log,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::parser::parse;
    use crate::domain::strategy_config::resolve;
    use std::collections::HashMap;

    struct Rows(HashMap<String, Vec<Row>>);

    impl DataPort for Rows {
        fn load_rows(&self, symbol: &str) -> Result<Vec<Row>, StockDslError> {
            Ok(self.0.get(symbol).cloned().unwrap_or_default())
        }
    }

    fn row(price: f64, rsi: f64) -> Row {
        Row::new().with("price", price).with("rsi", rsi).with("volume", 1000.0)
    }

    fn run(src: &str, rows: Vec<Row>) -> Result<SimulationReport, StockDslError> {
        let options = CompilerOptions::default();
        let program = parse(src).unwrap();
        let block = &program.blocks[0];
        let config = resolve(block, &options).unwrap();
        let data = Rows(HashMap::from([("AAPL".to_string(), rows)]));
        simulate(block, &config, &options, &data)
    }

    #[test]
    fn first_row_is_skipped() {
        let report = run(
            "strategy \"t\" { symbols: AAPL if rsi < 30 { buy AAPL } }",
            vec![row(100.0, 10.0), row(101.0, 50.0)],
        )
        .unwrap();
        assert!(report.portfolio.history.is_empty());
    }

    #[test]
    fn rule_fires_per_row() {
        let report = run(
            "strategy \"t\" { symbols: AAPL if rsi < 30 { buy AAPL } }",
            vec![row(100.0, 10.0), row(101.0, 20.0), row(102.0, 25.0)],
        )
        .unwrap();
        assert_eq!(
            report.portfolio.history,
            vec!["BOUGHT 1 AAPL @ 101.00", "BOUGHT 1 AAPL @ 102.00"]
        );
    }

    #[test]
    fn logic_returns_operands() {
        let cur_rows = [row(1.0, 0.0), row(5.0, 0.0)];
        let cur = Cursor {
            rows: &cur_rows,
            index: 1,
            symbol: "AAPL",
            sma_lengths: &[50, 200],
        };
        let eval = |cond: &str| {
            let src = format!("strategy \"t\" {{ if {} {{ buy AAPL }} }}", cond);
            let program = parse(&src).unwrap();
            let rule = program.blocks[0].rules().next().unwrap().clone();
            eval_expression(&rule.condition, &cur).unwrap()
        };
        assert_eq!(eval("rsi or price"), Value::Num(5.0));
        assert_eq!(eval("price and rsi"), Value::Num(0.0));
        assert_eq!(eval("AAPL"), Value::Str("AAPL".into()));
        assert_eq!(eval("rsi or 0"), Value::Num(0.0));
        assert_eq!(eval("price > 4 and (rsi == 0)"), Value::Bool(true));
    }

    #[test]
    fn nan_comparisons_are_false() {
        assert!(!compare(&Value::Num(f64::NAN), Comparator::Lt, &Value::Num(1.0)).unwrap());
        assert!(!compare(&Value::Num(f64::NAN), Comparator::Eq, &Value::Num(f64::NAN)).unwrap());
        assert!(compare(&Value::Num(f64::NAN), Comparator::Ne, &Value::Num(1.0)).unwrap());
        assert!(compare(&Value::Bool(true), Comparator::Eq, &Value::Num(1.0)).unwrap());
        assert!(compare(&Value::Str("A".into()), Comparator::Lt, &Value::Num(1.0)).is_err());
    }

    #[test]
    fn crossover_uses_previous_row() {
        let src = "strategy \"t\" { symbols: AAPL if crossover(sma(AAPL, 50), sma(AAPL, 200)) { buy AAPL } }";
        let rows = vec![
            Row::new().with("price", 10.0).with("sma50", 9.0).with("sma200", 10.0),
            Row::new().with("price", 11.0).with("sma50", 11.0).with("sma200", 10.0),
            Row::new().with("price", 12.0).with("sma50", 12.0).with("sma200", 10.0),
        ];
        let report = run(src, rows).unwrap();
        assert_eq!(report.portfolio.history, vec!["BOUGHT 1 AAPL @ 11.00"]);
    }

    #[test]
    fn crossover_of_bare_bindings() {
        let src = "strategy \"t\" { symbols: AAPL if crossover(sma50, SMA200) { buy AAPL } }";
        let rows = vec![
            Row::new().with("price", 10.0).with("sma50", 9.0).with("sma200", 10.0),
            Row::new().with("price", 11.0).with("sma50", 11.0).with("sma200", 10.0),
        ];
        let report = run(src, rows).unwrap();
        assert_eq!(report.portfolio.history, vec!["BOUGHT 1 AAPL @ 11.00"]);
    }

    #[test]
    fn bare_sma_binding_reads_row_value() {
        let src = "strategy \"t\" { symbols: AAPL if price > sma50 { buy AAPL } }";
        let rows = vec![
            Row::new().with("price", 10.0).with("sma50", 9.0),
            Row::new().with("price", 8.0).with("sma50", 9.0),
            Row::new().with("price", 12.0).with("sma50", 9.0),
        ];
        let report = run(src, rows).unwrap();
        assert_eq!(report.portfolio.history, vec!["BOUGHT 1 AAPL @ 12.00"]);
    }

    #[test]
    fn crossover_against_a_constant_fails() {
        let err = run(
            "strategy \"t\" { symbols: AAPL if crossover(rsi, 30) { buy AAPL } }",
            vec![row(1.0, 20.0), row(1.0, 40.0)],
        )
        .unwrap_err();
        assert!(matches!(err, StockDslError::Simulation { .. }));
        assert!(err.to_string().contains("crossover argument has no precomputed column"));
    }

    #[test]
    fn unknown_names_fail() {
        let err = run(
            "strategy \"t\" { symbols: AAPL if macd > 0 { buy AAPL } }",
            vec![row(1.0, 1.0), row(1.0, 1.0)],
        )
        .unwrap_err();
        assert!(err.to_string().contains("name 'macd' is not defined"));
    }

    #[test]
    fn missing_data_is_skipped() {
        let report = run(
            "strategy \"t\" { symbols: MSFT if rsi < 30 { buy MSFT } }",
            vec![row(1.0, 1.0)],
        )
        .unwrap();
        assert_eq!(report.log, vec!["Skipping MSFT due to no data."]);
    }

    #[test]
    fn transcript_matches_script_output() {
        let report = run(
            "strategy \"t\" { symbols: AAPL capital: $100 if rsi < 30 { buy AAPL } if rsi > 70 { sell AAPL } }",
            vec![row(60.0, 50.0), row(60.0, 20.0), row(60.0, 20.0), row(70.0, 80.0)],
        )
        .unwrap();
        assert_eq!(
            report.transcript(),
            vec![
                "--- Starting Backtest ---",
                "Initial Capital: $100.00",
                "",
                "Insufficient capital to buy AAPL",
                "",
                "--- Backtest Finished ---",
                "Trade History:",
                "BOUGHT 1 AAPL @ 60.00",
                "SOLD 1 AAPL @ 70.00",
                "",
                "Final Portfolio:",
                "Final Capital: $110.00",
                "Positions: {}",
            ]
        );
    }
}
