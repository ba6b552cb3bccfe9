//! stockdsl: compiler from a trading strategy DSL to Python backtest scripts.
//!
//! Hexagonal architecture: the compiler and reference interpreter live in
//! [`domain`], port traits in [`ports`], file and CSV implementations in
//! [`adapters`], command dispatch in [`cli`].

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod cli;
