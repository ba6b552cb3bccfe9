//! In-memory portfolio with the same buy/sell rules as the emitted
//! scaffold's `Portfolio` class.

use std::collections::BTreeMap;
use std::fmt::Write as _;

#[derive(Debug, Clone, PartialEq)]
pub struct Portfolio {
    pub capital: f64,
    pub risk_per_trade: Option<f64>,
    pub positions: BTreeMap<String, u64>,
    /// Executed trades, `BOUGHT 1 AAPL @ 101.50` style.
    pub history: Vec<String>,
    /// Rejected orders, in the order they were attempted.
    pub notices: Vec<String>,
}

impl Portfolio {
    pub fn new(capital: f64, risk_per_trade: Option<f64>) -> Self {
        Portfolio {
            capital,
            risk_per_trade,
            positions: BTreeMap::new(),
            history: Vec::new(),
            notices: Vec::new(),
        }
    }

    /// Shares per buy: one, or `floor(capital * risk / price)` (at least
    /// one) when risk sizing is configured.
    pub fn quantity_for(&self, price: f64) -> u64 {
        match self.risk_per_trade {
            Some(risk) if price > 0.0 => ((self.capital * risk / price).floor() as u64).max(1),
            _ => 1,
        }
    }

    pub fn held(&self, symbol: &str) -> u64 {
        self.positions.get(symbol).copied().unwrap_or(0)
    }

    pub fn buy(&mut self, symbol: &str, price: f64) {
        let quantity = self.quantity_for(price);
        let cost = price * quantity as f64;
        if self.capital >= cost {
            self.capital -= cost;
            *self.positions.entry(symbol.to_string()).or_insert(0) += quantity;
            self.history
                .push(format!("BOUGHT {} {} @ {:.2}", quantity, symbol, price));
        } else {
            self.notices
                .push(format!("Insufficient capital to buy {}", symbol));
        }
    }

    /// Sells one share, or the whole holding when risk sizing is configured.
    pub fn sell(&mut self, symbol: &str, price: f64) {
        let held = self.held(symbol);
        let quantity = if self.risk_per_trade.is_some() && held > 0 {
            held
        } else {
            1
        };
        if held >= quantity {
            self.capital += price * quantity as f64;
            let remaining = held - quantity;
            if remaining == 0 {
                self.positions.remove(symbol);
            } else {
                self.positions.insert(symbol.to_string(), remaining);
            }
            self.history
                .push(format!("SOLD {} {} @ {:.2}", quantity, symbol, price));
        } else {
            self.notices
                .push(format!("Not enough shares to sell {}", symbol));
        }
    }

    /// Positions rendered like a Python dict literal.
    pub fn positions_display(&self) -> String {
        let mut out = String::from("{");
        for (i, (symbol, quantity)) in self.positions.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            let _ = write!(out, "'{}': {}", symbol, quantity);
        }
        out.push('}');
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_portfolio() {
        let p = Portfolio::new(10_000.0, None);
        assert!((p.capital - 10_000.0).abs() < f64::EPSILON);
        assert!(p.positions.is_empty());
        assert!(p.history.is_empty());
        assert_eq!(p.positions_display(), "{}");
    }

    #[test]
    fn buy_single_share() {
        let mut p = Portfolio::new(1_000.0, None);
        p.buy("AAPL", 150.0);
        assert!((p.capital - 850.0).abs() < f64::EPSILON);
        assert_eq!(p.held("AAPL"), 1);
        assert_eq!(p.history, vec!["BOUGHT 1 AAPL @ 150.00"]);
    }

    #[test]
    fn buy_without_capital_is_noop() {
        let mut p = Portfolio::new(100.0, None);
        p.buy("AAPL", 150.0);
        assert!((p.capital - 100.0).abs() < f64::EPSILON);
        assert_eq!(p.held("AAPL"), 0);
        assert!(p.history.is_empty());
        assert_eq!(p.notices, vec!["Insufficient capital to buy AAPL"]);
    }

    #[test]
    fn sell_without_shares_is_noop() {
        let mut p = Portfolio::new(100.0, None);
        p.sell("AAPL", 150.0);
        assert!((p.capital - 100.0).abs() < f64::EPSILON);
        assert_eq!(p.notices, vec!["Not enough shares to sell AAPL"]);
    }

    #[test]
    fn sell_returns_capital() {
        let mut p = Portfolio::new(1_000.0, None);
        p.buy("AAPL", 100.0);
        p.buy("AAPL", 100.0);
        p.sell("AAPL", 110.0);
        assert_eq!(p.held("AAPL"), 1);
        assert!((p.capital - 910.0).abs() < 1e-9);
        assert_eq!(p.history.last().unwrap(), "SOLD 1 AAPL @ 110.00");
        assert_eq!(p.positions_display(), "{'AAPL': 1}");
    }

    #[test]
    fn risk_sizing() {
        let mut p = Portfolio::new(10_000.0, Some(0.02));
        assert_eq!(p.quantity_for(30.0), 6);
        assert_eq!(p.quantity_for(500.0), 1);
        assert_eq!(p.quantity_for(0.0), 1);

        p.buy("MSFT", 30.0);
        assert_eq!(p.held("MSFT"), 6);
        p.sell("MSFT", 35.0);
        assert_eq!(p.held("MSFT"), 0);
        assert!(!p.positions.contains_key("MSFT"));
        assert_eq!(p.history[1], "SOLD 6 MSFT @ 35.00");
    }
}
