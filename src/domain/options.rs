//! Compiler options and their validation.
//!
//! Options are read from an optional INI file through [`ConfigPort`]:
//!
//! ```ini
//! [compiler]
//! ; semantic gaps become fatal
//! strict = false
//! ; "default" or "error"
//! missing_config = default
//!
//! [defaults]
//! capital = 10000
//! start_date = 2023-01-01
//! end_date = 2024-01-01
//! timeframe = daily
//!
//! [indicators]
//! sma_lengths = 50, 200
//! ```

use crate::domain::ast::Timeframe;
use crate::domain::error::StockDslError;
use crate::domain::indicator::DEFAULT_SMA_LENGTHS;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

pub const DEFAULT_CAPITAL: u64 = 10_000;
pub const DEFAULT_START_DATE: &str = "2023-01-01";
pub const DEFAULT_END_DATE: &str = "2024-01-01";

/// What to do when a block omits capital, symbols or period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingConfigPolicy {
    /// Fill in the documented defaults silently.
    Default,
    /// Report each absent field as a semantic error.
    Error,
}

/// Values used for config kinds a strategy block does not declare.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigDefaults {
    pub capital: u64,
    pub start_date: String,
    pub end_date: String,
    pub timeframe: Timeframe,
}

impl Default for ConfigDefaults {
    fn default() -> Self {
        ConfigDefaults {
            capital: DEFAULT_CAPITAL,
            start_date: DEFAULT_START_DATE.to_string(),
            end_date: DEFAULT_END_DATE.to_string(),
            timeframe: Timeframe::Daily,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompilerOptions {
    pub strict: bool,
    pub missing_config: MissingConfigPolicy,
    pub defaults: ConfigDefaults,
    /// SMA lengths with a precomputed column, in emission order.
    pub sma_lengths: Vec<usize>,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        CompilerOptions {
            strict: false,
            missing_config: MissingConfigPolicy::Default,
            defaults: ConfigDefaults::default(),
            sma_lengths: DEFAULT_SMA_LENGTHS.to_vec(),
        }
    }
}

impl CompilerOptions {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, StockDslError> {
        let base = CompilerOptions::default();

        let missing_config = match config.get_string("compiler", "missing_config") {
            None => base.missing_config,
            Some(s) => match s.trim().to_lowercase().as_str() {
                "default" => MissingConfigPolicy::Default,
                "error" => MissingConfigPolicy::Error,
                _ => {
                    return Err(invalid(
                        "compiler",
                        "missing_config",
                        "missing_config must be 'default' or 'error'",
                    ));
                }
            },
        };

        let capital = match config.get_string("defaults", "capital") {
            None => base.defaults.capital,
            Some(s) => match s.trim().parse::<u64>() {
                Ok(v) if v > 0 => v,
                _ => return Err(invalid("defaults", "capital", "capital must be a positive integer")),
            },
        };

        let start_date = read_date(config, "start_date", &base.defaults.start_date)?;
        let end_date = read_date(config, "end_date", &base.defaults.end_date)?;
        if start_date >= end_date {
            return Err(invalid(
                "defaults",
                "start_date",
                "start_date must be before end_date",
            ));
        }

        let timeframe = match config.get_string("defaults", "timeframe") {
            None => base.defaults.timeframe,
            Some(s) => Timeframe::parse(s.trim()).ok_or_else(|| {
                invalid(
                    "defaults",
                    "timeframe",
                    "timeframe must be daily, weekly or monthly",
                )
            })?,
        };

        let sma_lengths = match config.get_list("indicators", "sma_lengths") {
            None => base.sma_lengths,
            Some(items) => parse_sma_lengths(&items)?,
        };

        Ok(CompilerOptions {
            strict: config.get_bool("compiler", "strict", base.strict),
            missing_config,
            defaults: ConfigDefaults {
                capital,
                start_date: start_date.format("%Y-%m-%d").to_string(),
                end_date: end_date.format("%Y-%m-%d").to_string(),
                timeframe,
            },
            sma_lengths,
        })
    }
}

fn invalid(section: &str, key: &str, reason: &str) -> StockDslError {
    StockDslError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

fn read_date(
    config: &dyn ConfigPort,
    key: &str,
    default: &str,
) -> Result<NaiveDate, StockDslError> {
    let raw = config
        .get_string("defaults", key)
        .unwrap_or_else(|| default.to_string());
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| {
        invalid(
            "defaults",
            key,
            &format!("invalid {} format, expected YYYY-MM-DD", key),
        )
    })
}

fn parse_sma_lengths(items: &[String]) -> Result<Vec<usize>, StockDslError> {
    if items.is_empty() {
        return Err(invalid(
            "indicators",
            "sma_lengths",
            "sma_lengths must list at least one length",
        ));
    }
    let mut lengths = Vec::with_capacity(items.len());
    for item in items {
        let n = match item.parse::<usize>() {
            Ok(n) if n > 0 => n,
            _ => {
                return Err(invalid(
                    "indicators",
                    "sma_lengths",
                    &format!("'{}' is not a positive integer", item),
                ));
            }
        };
        if !lengths.contains(&n) {
            lengths.push(n);
        }
    }
    Ok(lengths)
}
