//! CSV file data adapter.
//!
//! One `<SYMBOL>.csv` per symbol under a base directory. Header names are
//! the row binding names (`price`, `volume`, `rsi`, `zscore`, `sma50`, ...);
//! a `date` column is allowed and ignored, and empty cells read as NaN.

use crate::domain::error::StockDslError;
use crate::domain::row::Row;
use crate::ports::data_port::DataPort;
use std::fs;
use std::path::PathBuf;

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", symbol))
    }
}

fn data_error(symbol: &str, reason: String) -> StockDslError {
    StockDslError::Data {
        symbol: symbol.to_string(),
        reason,
    }
}

impl DataPort for CsvAdapter {
    fn load_rows(&self, symbol: &str) -> Result<Vec<Row>, StockDslError> {
        let path = self.csv_path(symbol);
        let content = fs::read_to_string(&path)
            .map_err(|e| data_error(symbol, format!("failed to read {}: {}", path.display(), e)))?;

        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(content.as_bytes());
        let headers: Vec<String> = rdr
            .headers()
            .map_err(|e| data_error(symbol, format!("CSV header error: {}", e)))?
            .iter()
            .map(|h| h.to_ascii_lowercase())
            .collect();

        let mut rows = Vec::new();
        for (line, result) in rdr.records().enumerate() {
            let record =
                result.map_err(|e| data_error(symbol, format!("CSV parse error: {}", e)))?;
            let mut row = Row::new();
            for (name, field) in headers.iter().zip(record.iter()) {
                if name == "date" {
                    continue;
                }
                let value = if field.is_empty() {
                    f64::NAN
                } else {
                    field.parse::<f64>().map_err(|e| {
                        data_error(
                            symbol,
                            format!("invalid {} value '{}' on row {}: {}", name, field, line + 1, e),
                        )
                    })?
                };
                row.set(name, value);
            }
            rows.push(row);
        }

        Ok(rows)
    }
}
