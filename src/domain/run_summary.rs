//! Summary of a generated script's console output.

use crate::domain::error::StockDslError;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub initial_capital: Option<f64>,
    pub final_capital: Option<f64>,
    pub trades: Vec<String>,
}

impl RunSummary {
    pub fn total_trades(&self) -> usize {
        self.trades.len()
    }

    /// Final minus initial capital, when both are known and positive.
    pub fn profit_loss(&self) -> Option<f64> {
        match (self.initial_capital, self.final_capital) {
            (Some(initial), Some(fin)) if initial > 0.0 && fin > 0.0 => Some(fin - initial),
            _ => None,
        }
    }

    pub fn profit_loss_pct(&self) -> Option<f64> {
        let initial = self.initial_capital?;
        self.profit_loss().map(|pl| pl / initial * 100.0)
    }
}

fn parse_capital(line: &str) -> Result<f64, StockDslError> {
    let digits: String = line
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    digits.parse::<f64>().map_err(|_| StockDslError::OutputParse {
        reason: format!("no capital amount in line '{}'", line.trim()),
    })
}

/// Scan output lines for the capital lines and the trade log.
pub fn parse_output<'a>(
    lines: impl IntoIterator<Item = &'a str>,
) -> Result<RunSummary, StockDslError> {
    let mut summary = RunSummary::default();
    for line in lines {
        if line.contains("Final Capital:") {
            summary.final_capital = Some(parse_capital(line)?);
        }
        if line.contains("Initial Capital:") {
            summary.initial_capital = Some(parse_capital(line)?);
        }
        if line.contains("BOUGHT") || line.contains("SOLD") {
            summary.trades.push(line.trim().to_string());
        }
    }
    Ok(summary)
}
