//! One row of per-symbol market data as seen by a strategy loop.

use std::collections::HashMap;

/// Values keyed by local binding name (`price`, `rsi`, `sma50`, ...).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    values: HashMap<String, f64>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, value: f64) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: &str, value: f64) {
        self.values.insert(name.to_string(), value);
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }
}
