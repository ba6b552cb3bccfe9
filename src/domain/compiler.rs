//! Compilation pipeline: source text to Python script.
//!
//! Each call builds fresh lexer, parser and generator state, so `compile`
//! can run concurrently from any number of threads.

use tracing::{debug, warn};

use crate::domain::ast::Program;
use crate::domain::codegen::CodeGenerator;
use crate::domain::error::{CompileError, CompileErrors};
use crate::domain::lexer::tokenize;
use crate::domain::options::CompilerOptions;
use crate::domain::parser::parse_tokens;
use crate::domain::semantic::check_block;
use crate::domain::strategy_config::{resolve, StrategyConfig};

/// Successful compilation: the script plus any non-fatal diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct CompileOutput {
    pub script: String,
    pub warnings: Vec<CompileError>,
    /// The parsed program and one resolved config per block, in block order.
    pub program: Program,
    pub configs: Vec<StrategyConfig>,
}

pub fn compile(source: &str, options: &CompilerOptions) -> Result<CompileOutput, CompileErrors> {
    let tokens = tokenize(source)?;
    debug!(tokens = tokens.len(), "lexed source");

    let program = parse_tokens(&tokens)?;
    debug!(blocks = program.blocks.len(), "parsed program");

    let mut configs: Vec<StrategyConfig> = Vec::with_capacity(program.blocks.len());
    let mut errors = Vec::new();
    for block in &program.blocks {
        match resolve(block, options) {
            Ok(config) => configs.push(config),
            Err(errs) => errors.extend(errs),
        }
    }
    if !errors.is_empty() {
        return Err(CompileErrors(errors));
    }

    let mut gaps = Vec::new();
    for (block, config) in program.blocks.iter().zip(&configs) {
        let block_gaps = check_block(block, config, options);
        debug!(
            strategy = %block.name,
            rules = block.rules().count(),
            gaps = block_gaps.len(),
            "checked block"
        );
        gaps.extend(block_gaps);
    }

    if options.strict && !gaps.is_empty() {
        return Err(CompileErrors(gaps));
    }
    for gap in &gaps {
        warn!(line = gap.span.line, column = gap.span.column, "{}", gap.message);
    }

    let script = CodeGenerator::new(options).generate(&program, &configs);
    debug!(bytes = script.len(), "generated script");

    Ok(CompileOutput {
        script,
        warnings: gaps,
        program,
        configs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::ErrorKind;
    use crate::domain::options::MissingConfigPolicy;

    #[test]
    fn compiles_minimal_block() {
        let out = compile(
            "strategy \"t\" { symbols: AAPL if rsi < 30 { buy AAPL } }",
            &CompilerOptions::default(),
        )
        .unwrap();
        assert!(out.script.contains("if rsi < 30:"));
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn output_carries_program_and_configs() {
        let out = compile(
            "strategy \"a\" { symbols: AAPL } strategy \"b\" { capital: $500 }",
            &CompilerOptions::default(),
        )
        .unwrap();
        assert_eq!(out.program.blocks.len(), 2);
        assert_eq!(out.configs.len(), 2);
        assert_eq!(out.program.blocks[1].name, "b");
        assert_eq!(out.configs[0].symbols.len(), 1);
        assert_eq!(out.configs[1].capital, 500);
    }

    #[test]
    fn lexical_error_aborts() {
        let errs = compile("strategy \"t\" { capital: $ }", &CompilerOptions::default())
            .unwrap_err();
        assert_eq!(errs.len(), 1);
        assert_eq!(errs.0[0].kind, ErrorKind::Lexical);
    }

    #[test]
    fn syntax_error_aborts() {
        let errs = compile("strategy \"t\" { if rsi < 30 { buy AAPL }", &CompilerOptions::default())
            .unwrap_err();
        assert_eq!(errs.0[0].kind, ErrorKind::Syntax);
    }

    #[test]
    fn gaps_are_warnings_when_lenient() {
        let out = compile(
            "strategy \"t\" { if macd > 0 { buy AAPL } }",
            &CompilerOptions::default(),
        )
        .unwrap();
        assert_eq!(out.warnings.len(), 1);
        assert!(out.script.contains("if macd > 0:"));
    }

    #[test]
    fn gaps_are_errors_when_strict() {
        let options = CompilerOptions {
            strict: true,
            ..CompilerOptions::default()
        };
        let errs = compile("strategy \"t\" { if sma(AAPL, 13) > 1 { buy AAPL } }", &options)
            .unwrap_err();
        assert_eq!(errs.len(), 1);
        assert_eq!(errs.0[0].kind, ErrorKind::Semantic);
    }

    #[test]
    fn missing_config_errors_collect_across_blocks() {
        let options = CompilerOptions {
            missing_config: MissingConfigPolicy::Error,
            ..CompilerOptions::default()
        };
        let errs = compile("strategy \"a\" { } strategy \"b\" { capital: $5 }", &options)
            .unwrap_err();
        assert_eq!(errs.len(), 5);
    }
}
