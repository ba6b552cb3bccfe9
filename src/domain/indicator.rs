//! Built-in indicator vocabulary.
//!
//! The compiler never computes indicator values. It only maps names used in
//! conditions onto the columns and per-row local bindings that the runtime
//! scaffold precomputes:
//! - `Indicator`: one supported built-in and its binding/column names
//! - `Resolved`: result of looking up an identifier, `Unsupported` for
//!   anything outside the vocabulary

use crate::domain::ast::Primary;

pub const RSI_LENGTH: usize = 14;
pub const ZSCORE_LENGTH: usize = 20;
pub const DEFAULT_SMA_LENGTHS: [usize; 2] = [50, 200];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Indicator {
    Price,
    Volume,
    Rsi,
    Zscore,
    Sma(usize),
}

impl Indicator {
    /// Name of the local variable bound on every row.
    pub fn binding(&self) -> String {
        match self {
            Indicator::Price => "price".to_string(),
            Indicator::Volume => "volume".to_string(),
            Indicator::Rsi => "rsi".to_string(),
            Indicator::Zscore => "zscore".to_string(),
            Indicator::Sma(n) => format!("sma{}", n),
        }
    }

    /// Name of the data frame column the binding reads from.
    pub fn column(&self) -> String {
        match self {
            Indicator::Price => "close".to_string(),
            Indicator::Volume => "volume".to_string(),
            Indicator::Rsi => format!("RSI_{}", RSI_LENGTH),
            Indicator::Zscore => format!("ZSCORE_{}", ZSCORE_LENGTH),
            Indicator::Sma(n) => format!("SMA_{}", n),
        }
    }

    /// Bindings available on every row, in emission order.
    pub fn row_bindings(sma_lengths: &[usize]) -> Vec<Indicator> {
        let mut out = vec![Indicator::Price, Indicator::Volume, Indicator::Rsi];
        out.extend(sma_lengths.iter().map(|&n| Indicator::Sma(n)));
        out.push(Indicator::Zscore);
        out
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved {
    Builtin(Indicator),
    Unsupported(String),
}

/// Resolve a bare identifier, case-insensitively.
pub fn resolve_identifier(name: &str) -> Resolved {
    match name.to_ascii_lowercase().as_str() {
        "price" => Resolved::Builtin(Indicator::Price),
        "volume" => Resolved::Builtin(Indicator::Volume),
        "rsi" => Resolved::Builtin(Indicator::Rsi),
        "zscore" => Resolved::Builtin(Indicator::Zscore),
        _ => Resolved::Unsupported(name.to_string()),
    }
}

/// Resolve an `sma(SYMBOL, LENGTH)` length against the whitelist.
pub fn resolve_sma(length: f64, whitelist: &[usize]) -> Option<Indicator> {
    if length.fract() != 0.0 || length < 1.0 {
        return None;
    }
    let n = length as usize;
    whitelist.contains(&n).then_some(Indicator::Sma(n))
}

/// Resolve a bare per-row binding such as `sma50` against the whitelist.
pub fn resolve_sma_binding(name: &str, whitelist: &[usize]) -> Option<Indicator> {
    let lower = name.to_ascii_lowercase();
    let digits = lower.strip_prefix("sma")?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let n: usize = digits.parse().ok()?;
    whitelist.contains(&n).then_some(Indicator::Sma(n))
}

/// The built-in a leaf refers to, if any: a vocabulary identifier, a
/// whitelisted `sma<n>` binding, a whitelisted `sma(SYMBOL, LENGTH)` call, a built-in called as a function
/// (`rsi(AAPL)`), or a group wrapping one of these.
pub fn resolve_primary(primary: &Primary, sma_lengths: &[usize]) -> Option<Indicator> {
    match primary {
        Primary::Identifier { name, .. } => match resolve_identifier(name) {
            Resolved::Builtin(indicator) => Some(indicator),
            Resolved::Unsupported(_) => resolve_sma_binding(name, sma_lengths),
        },
        Primary::Call(call) => match call.callee.to_ascii_lowercase().as_str() {
            "sma" if call.args.len() == 2 => match call.args[1].as_primary() {
                Some(Primary::Number { value, .. }) => resolve_sma(*value, sma_lengths),
                _ => None,
            },
            "price" | "volume" | "rsi" | "zscore" => match resolve_identifier(&call.callee) {
                Resolved::Builtin(indicator) => Some(indicator),
                Resolved::Unsupported(_) => None,
            },
            _ => None,
        },
        Primary::Group(inner) => inner
            .as_primary()
            .and_then(|p| resolve_primary(p, sma_lengths)),
        Primary::Number { .. } | Primary::Symbol(_) => None,
    }
}
