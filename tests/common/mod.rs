#![allow(dead_code)]

use std::collections::HashMap;
use std::io::Write;

use stockdsl::domain::compiler::{compile, CompileOutput};
use stockdsl::domain::error::{CompileErrors, StockDslError};
use stockdsl::domain::options::CompilerOptions;
use stockdsl::domain::parser::parse;
use stockdsl::domain::simulate::{simulate, SimulationReport};
use stockdsl::domain::strategy_config::resolve;
pub use stockdsl::domain::row::Row;
use stockdsl::ports::data_port::DataPort;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<Row>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_rows(mut self, symbol: &str, rows: Vec<Row>) -> Self {
        self.data.insert(symbol.to_string(), rows);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn load_rows(&self, symbol: &str) -> Result<Vec<Row>, StockDslError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(StockDslError::Data {
                symbol: symbol.to_string(),
                reason: reason.clone(),
            });
        }
        Ok(self.data.get(symbol).cloned().unwrap_or_default())
    }
}

pub fn make_row(price: f64, rsi: f64) -> Row {
    Row::new()
        .with("price", price)
        .with("volume", 1_000.0)
        .with("rsi", rsi)
        .with("zscore", 0.0)
}

pub fn compile_default(source: &str) -> Result<CompileOutput, CompileErrors> {
    compile(source, &CompilerOptions::default())
}

/// Compile-free path: parse, resolve and simulate the first block.
pub fn simulate_first(
    source: &str,
    data: &MockDataPort,
) -> Result<SimulationReport, StockDslError> {
    let options = CompilerOptions::default();
    let program = parse(source).map_err(|e| StockDslError::Compile(e.into()))?;
    let block = &program.blocks[0];
    let config = resolve(block, &options)?;
    simulate(block, &config, &options, data)
}

pub fn write_temp(content: &str, suffix: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

pub const RSI_STRATEGY: &str = r#"strategy "t" {
  symbols: AAPL
  capital: $10000
  if rsi < 30 { buy AAPL }
  if rsi > 70 { sell AAPL }
}
"#;
