//! Compiler pipeline, reference interpreter and shared domain types.

pub mod error;
pub mod token;
pub mod lexer;
pub mod ast;
pub mod parser;
pub mod indicator;
pub mod options;
pub mod strategy_config;
pub mod semantic;
pub mod codegen;
pub mod compiler;
pub mod row;
pub mod portfolio;
pub mod simulate;
pub mod run_summary;
