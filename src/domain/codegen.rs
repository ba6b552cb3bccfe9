//! Python code generation.
//!
//! Emits one self-contained script per program in three layers:
//! 1. the runtime scaffold (`Portfolio` and `Backtest`), once;
//! 2. one strategy class per block, whose per-row loop binds the indicator
//!    locals and then tests every rule independently, in source order;
//! 3. one entry section per block wiring its resolved config into a
//!    `Backtest` run.
//!
//! The generator trusts its input: it never fails, and anything it cannot
//! map onto the scaffold is emitted as written.

use std::collections::HashSet;

use crate::domain::ast::{
    Action, Comparison, Expression, FunctionCall, Primary, Program, Rule, Term,
};
use crate::domain::indicator::{resolve_primary, Indicator, RSI_LENGTH, ZSCORE_LENGTH};
use crate::domain::options::CompilerOptions;
use crate::domain::semantic::is_module_path;
use crate::domain::strategy_config::StrategyConfig;

const HEADER: &str = "# Generated by stockdsl. Do not edit.\n";

const BASE_IMPORTS: &str = "\
import yahooquery as yq
import pandas as pd
import pandas_ta as ta
";

const RUNTIME_SCAFFOLD: &str = r#"
class Portfolio:
    def __init__(self, capital, risk_per_trade=None):
        self.capital = capital
        self.risk_per_trade = risk_per_trade
        self.positions = {}
        self.history = []

    def quantity_for(self, price):
        if self.risk_per_trade is None or price <= 0:
            return 1
        return max(1, int(self.capital * self.risk_per_trade / price))

    def buy(self, symbol, price, quantity=None):
        if quantity is None:
            quantity = self.quantity_for(price)
        cost = price * quantity
        if self.capital >= cost:
            self.capital -= cost
            self.positions[symbol] = self.positions.get(symbol, 0) + quantity
            self.history.append(f"BOUGHT {quantity} {symbol} @ {price:.2f}")
        else:
            print(f"Insufficient capital to buy {symbol}")

    def sell(self, symbol, price, quantity=None):
        held = self.positions.get(symbol, 0)
        if quantity is None:
            quantity = held if self.risk_per_trade is not None and held > 0 else 1
        if held >= quantity:
            self.capital += price * quantity
            self.positions[symbol] = held - quantity
            self.history.append(f"SOLD {quantity} {symbol} @ {price:.2f}")
            if self.positions[symbol] == 0:
                del self.positions[symbol]
        else:
            print(f"Not enough shares to sell {symbol}")

class Backtest:
    def __init__(self, symbols, start_date, end_date, capital, interval="1d", risk_per_trade=None):
        self.symbols = symbols
        self.start_date = start_date
        self.end_date = end_date
        self.interval = interval
        self.portfolio = Portfolio(capital, risk_per_trade)
        self.data = self._fetch_data()

    def _fetch_data(self):
        data = {}
        if not self.symbols:
            print("Warning: no symbols configured.")
            return data
        try:
            ticker_obj = yq.Ticker(self.symbols)
            hist = ticker_obj.history(start=self.start_date, end=self.end_date, interval=self.interval)
            if isinstance(hist, pd.DataFrame):
                for symbol in self.symbols:
                    if symbol in hist.index:
                        data[symbol] = hist.loc[symbol].copy()
            else:
                print(f"Warning: Unexpected data type returned from API: {type(hist)}")
        except Exception as e:
            print(f"Error fetching data with yahooquery: {e}")
        return data

    def run(self, strategy):
        print("--- Starting Backtest ---")
        print(f"Initial Capital: ${self.portfolio.capital:.2f}\n")
        strategy.execute()
        print("\n--- Backtest Finished ---")
        print("Trade History:")
        if not self.portfolio.history:
            print("No trades were executed.")
        else:
            for trade in self.portfolio.history:
                print(trade)
        print("\nFinal Portfolio:")
        print(f"Final Capital: ${self.portfolio.capital:.2f}")
        print("Positions:", self.portfolio.positions)
"#;

const CROSSOVER_HELPER: &str = "    def crossover(self, series1, series2, i):
        if i == 0:
            return False
        return series1.iloc[i] > series2.iloc[i] and series1.iloc[i-1] <= series2.iloc[i-1]
";

/// Module-level names the scaffold defines or looks up at run time.
const SCAFFOLD_NAMES: [&str; 3] = ["Portfolio", "Backtest", "Exception"];

/// Python keywords a capitalised title can collide with.
const PYTHON_KEYWORDS: [&str; 3] = ["False", "None", "True"];

const RULE_INDENT: usize = 16;
const ACTION_INDENT: usize = 20;

pub struct CodeGenerator<'a> {
    options: &'a CompilerOptions,
    out: String,
}

impl<'a> CodeGenerator<'a> {
    pub fn new(options: &'a CompilerOptions) -> Self {
        Self {
            options,
            out: String::new(),
        }
    }

    fn line(&mut self, indent: usize, text: &str) {
        self.out.push_str(&" ".repeat(indent));
        self.out.push_str(text);
        self.out.push('\n');
    }

    /// Emit the full script. `configs[i]` must be the resolved config of
    /// `program.blocks[i]`.
    pub fn generate(mut self, program: &Program, configs: &[StrategyConfig]) -> String {
        let class_names = class_names(program.blocks.iter().map(|b| b.name.as_str()));

        self.out.push_str(HEADER);
        self.out.push_str(BASE_IMPORTS);
        self.emit_user_imports(configs);
        self.out.push_str(RUNTIME_SCAFFOLD);

        for (block, class_name) in program.blocks.iter().zip(&class_names) {
            self.out.push('\n');
            self.emit_strategy_class(class_name, block.rules());
        }

        for (config, class_name) in configs.iter().zip(&class_names) {
            self.out.push('\n');
            self.emit_entry(config, class_name);
        }

        self.out
    }

    fn emit_user_imports(&mut self, configs: &[StrategyConfig]) {
        let mut seen = HashSet::new();
        for name in configs.iter().filter_map(|c| c.import.as_deref()) {
            if is_module_path(name) && seen.insert(name) {
                self.line(0, &format!("import {}", name));
            }
        }
    }

    fn emit_strategy_class<'r>(&mut self, class_name: &str, rules: impl Iterator<Item = &'r Rule>) {
        self.line(0, &format!("class {}:", class_name));
        self.line(4, "def __init__(self, portfolio, data):");
        self.line(8, "self.portfolio = portfolio");
        self.line(8, "self.data = data");
        self.out.push('\n');
        self.out.push_str(CROSSOVER_HELPER);
        self.out.push('\n');
        self.line(4, "def execute(self):");
        self.line(8, "for symbol in self.data:");
        self.line(12, "df = self.data[symbol]");
        self.line(12, "if df is None or df.empty:");
        self.line(16, "print(f\"Skipping {symbol} due to no data.\")");
        self.line(16, "continue");
        self.line(
            12,
            &format!(
                "df['{}'] = df.ta.rsi(close=df['close'], length={})",
                Indicator::Rsi.column(),
                RSI_LENGTH
            ),
        );
        let sma_lengths = self.options.sma_lengths.clone();
        for n in &sma_lengths {
            self.line(
                12,
                &format!(
                    "df['{}'] = df.ta.sma(close=df['close'], length={})",
                    Indicator::Sma(*n).column(),
                    n
                ),
            );
        }
        self.line(
            12,
            &format!(
                "df['{}'] = df.ta.zscore(close=df['close'], length={})",
                Indicator::Zscore.column(),
                ZSCORE_LENGTH
            ),
        );
        self.out.push('\n');
        self.line(12, "for i in range(1, len(df)):");
        for indicator in Indicator::row_bindings(&sma_lengths) {
            self.line(
                16,
                &format!(
                    "{} = df['{}'].iloc[i]",
                    indicator.binding(),
                    indicator.column()
                ),
            );
        }

        let mut first = true;
        for rule in rules {
            if first {
                self.out.push('\n');
                first = false;
            }
            self.emit_rule(rule);
        }
    }

    fn emit_rule(&mut self, rule: &Rule) {
        let condition = translate_expression(&rule.condition, self.options);
        self.line(RULE_INDENT, &format!("if {}:", condition));
        for action in &rule.actions {
            self.line(ACTION_INDENT, &translate_action(action));
        }
    }

    fn emit_entry(&mut self, config: &StrategyConfig, class_name: &str) {
        let symbols = config
            .symbols
            .iter()
            .map(|s| py_string(s.as_str()))
            .collect::<Vec<_>>()
            .join(", ");
        let risk = config
            .risk_per_trade
            .map(|r| r.to_string())
            .unwrap_or_else(|| "None".to_string());

        self.line(
            0,
            &format!("# --- Main Execution Block: {} ---", comment_text(&config.name)),
        );
        self.line(0, &format!("symbols = [{}]", symbols));
        self.line(0, &format!("start_date = {}", py_string(&config.start_date)));
        self.line(0, &format!("end_date = {}", py_string(&config.end_date)));
        self.line(0, &format!("capital = {}", config.capital));
        self.line(0, &format!("interval = {}", py_string(config.timeframe.interval())));
        self.line(0, &format!("risk_per_trade = {}", risk));
        self.out.push('\n');
        self.line(
            0,
            "backtest = Backtest(symbols, start_date, end_date, capital, interval, risk_per_trade)",
        );
        self.line(
            0,
            &format!("strategy = {}(backtest.portfolio, backtest.data)", class_name),
        );
        self.line(0, "backtest.run(strategy)");
    }
}

pub fn translate_expression(expr: &Expression, options: &CompilerOptions) -> String {
    expr.terms
        .iter()
        .map(|t| translate_term(t, options))
        .collect::<Vec<_>>()
        .join(" or ")
}

fn translate_term(term: &Term, options: &CompilerOptions) -> String {
    term.comparisons
        .iter()
        .map(|c| translate_comparison(c, options))
        .collect::<Vec<_>>()
        .join(" and ")
}

fn translate_comparison(comparison: &Comparison, options: &CompilerOptions) -> String {
    match comparison {
        Comparison::Bare(p) => translate_primary(p, options),
        Comparison::Binary { left, op, right } => format!(
            "{} {} {}",
            translate_primary(left, options),
            op,
            translate_primary(right, options)
        ),
    }
}

pub fn translate_primary(primary: &Primary, options: &CompilerOptions) -> String {
    match primary {
        Primary::Number { text, .. } => text.clone(),
        Primary::Symbol(s) => format!("'{}'", s.as_str()),
        Primary::Group(inner) => format!("({})", translate_expression(inner, options)),
        Primary::Identifier { name, .. } => match resolve_primary(primary, &options.sma_lengths) {
            Some(indicator) => indicator.binding(),
            None => name.clone(),
        },
        Primary::Call(call) => translate_call(primary, call, options),
    }
}

fn translate_call(primary: &Primary, call: &FunctionCall, options: &CompilerOptions) -> String {
    if let Some(indicator) = resolve_primary(primary, &options.sma_lengths) {
        return indicator.binding();
    }

    let name = call.callee.to_ascii_lowercase();
    if name == "crossover" && call.args.len() == 2 {
        return format!(
            "self.crossover(df[{}], df[{}], i)",
            series_column(&call.args[0], options),
            series_column(&call.args[1], options)
        );
    }

    let args = call
        .args
        .iter()
        .map(|a| translate_expression(a, options))
        .collect::<Vec<_>>()
        .join(", ");
    format!("{}({})", name, args)
}

/// Quoted column key a crossover argument reads from: the indicator's column
/// when the argument names one, otherwise its translation upper-cased.
fn series_column(arg: &Expression, options: &CompilerOptions) -> String {
    match arg
        .as_primary()
        .and_then(|p| resolve_primary(p, &options.sma_lengths))
    {
        Some(indicator) => format!("'{}'", indicator.column()),
        None => py_string(&translate_expression(arg, options).to_uppercase()),
    }
}

pub fn translate_action(action: &Action) -> String {
    format!(
        "self.portfolio.{}('{}', price)",
        action.kind.as_str(),
        action.symbol.as_str()
    )
}

/// Class name for a strategy title: each whitespace-separated word gets an
/// upper-cased first character, non-identifier characters are dropped.
/// Names Python cannot use as a class get a `Strategy` prefix.
pub fn class_name(title: &str) -> String {
    let mut name = String::new();
    for word in title.split_whitespace() {
        let mut chars = word
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '_');
        if let Some(first) = chars.next() {
            name.push(first.to_ascii_uppercase());
            name.extend(chars);
        }
    }
    if name.is_empty()
        || name.starts_with(|c: char| c.is_ascii_digit())
        || PYTHON_KEYWORDS.contains(&name.as_str())
    {
        name.insert_str(0, "Strategy");
    }
    name
}

/// Class names for a sequence of titles, with numeric suffixes on repeats
/// and on names the runtime scaffold already binds.
pub fn class_names<'t>(titles: impl Iterator<Item = &'t str>) -> Vec<String> {
    let mut used: HashSet<String> = SCAFFOLD_NAMES.iter().map(|n| n.to_string()).collect();
    let mut names = Vec::new();
    for title in titles {
        let base = class_name(title);
        let mut candidate = base.clone();
        let mut suffix = 2;
        while !used.insert(candidate.clone()) {
            candidate = format!("{}{}", base, suffix);
            suffix += 1;
        }
        names.push(candidate);
    }
    names
}

/// Double-quoted Python string literal.
pub fn py_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for ch in s.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

fn comment_text(s: &str) -> String {
    s.chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect()
}
