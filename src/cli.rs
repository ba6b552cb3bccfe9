//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::compiler::{compile, CompileOutput};
use crate::domain::error::StockDslError;
use crate::domain::options::CompilerOptions;
use crate::domain::run_summary::parse_output;
use crate::domain::simulate::simulate;

#[derive(Parser, Debug)]
#[command(name = "stockdsl", about = "Trading strategy DSL compiler")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compile a strategy file to a Python backtest script
    Compile {
        input: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Compile and report diagnostics without writing a script
    Check {
        input: PathBuf,
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Run strategies over per-symbol CSV files
    Simulate {
        input: PathBuf,
        #[arg(long)]
        data: PathBuf,
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Only run the strategy with this name
        #[arg(long)]
        strategy: Option<String>,
    },
    /// Summarize the console output of a generated script
    Summarize { log: PathBuf },
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Compile {
            input,
            output,
            config,
        } => run_compile(&input, output.as_deref(), config.as_deref()),
        Command::Check { input, config } => run_check(&input, config.as_deref()),
        Command::Simulate {
            input,
            data,
            config,
            strategy,
        } => run_simulate(&input, &data, config.as_deref(), strategy.as_deref()),
        Command::Summarize { log } => run_summarize(&log),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => code,
    }
}

fn fail(err: StockDslError) -> ExitCode {
    eprintln!("error: {err}");
    ExitCode::from(&err)
}

pub fn load_options(path: Option<&Path>) -> Result<CompilerOptions, ExitCode> {
    let Some(path) = path else {
        return Ok(CompilerOptions::default());
    };
    eprintln!("Loading config from {}", path.display());
    let adapter = FileConfigAdapter::from_file(path).map_err(|e| {
        fail(StockDslError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        })
    })?;
    CompilerOptions::from_config(&adapter).map_err(fail)
}

fn read_source(path: &Path) -> Result<String, ExitCode> {
    fs::read_to_string(path).map_err(|e| fail(StockDslError::Io(e)))
}

/// Compile `source`, printing diagnostics with context to stderr.
fn compile_reporting(source: &str, options: &CompilerOptions) -> Result<CompileOutput, ExitCode> {
    match compile(source, options) {
        Ok(out) => {
            for warning in &out.warnings {
                eprintln!("warning: {}", warning.display_with_context(source));
            }
            Ok(out)
        }
        Err(errors) => {
            eprintln!("{}", errors.display_with_context(source));
            let err = StockDslError::Compile(errors);
            eprintln!("error: {err}");
            Err(ExitCode::from(&err))
        }
    }
}

fn run_compile(input: &Path, output: Option<&Path>, config: Option<&Path>) -> Result<(), ExitCode> {
    let options = load_options(config)?;
    eprintln!("Compiling {}", input.display());
    let source = read_source(input)?;
    let script = compile_reporting(&source, &options)?.script;

    match output {
        Some(path) => {
            fs::write(path, &script).map_err(|e| fail(StockDslError::Io(e)))?;
            eprintln!("Wrote {}", path.display());
        }
        None => print!("{script}"),
    }
    Ok(())
}

fn run_check(input: &Path, config: Option<&Path>) -> Result<(), ExitCode> {
    let options = load_options(config)?;
    let source = read_source(input)?;
    compile_reporting(&source, &options)?;
    eprintln!("{}: ok", input.display());
    Ok(())
}

fn run_simulate(
    input: &Path,
    data_dir: &Path,
    config: Option<&Path>,
    only: Option<&str>,
) -> Result<(), ExitCode> {
    let options = load_options(config)?;
    let source = read_source(input)?;
    let compiled = compile_reporting(&source, &options)?;
    let data = CsvAdapter::new(data_dir.to_path_buf());

    let mut ran = 0;
    for (block, config) in compiled.program.blocks.iter().zip(&compiled.configs) {
        if only.is_some_and(|name| name != block.name) {
            continue;
        }
        if config.symbols.is_empty() {
            return Err(fail(StockDslError::ConfigMissing {
                section: block.name.clone(),
                key: "symbols".to_string(),
            }));
        }
        eprintln!("Simulating strategy: {}", block.name);
        let report = simulate(block, config, &options, &data).map_err(fail)?;
        for line in report.transcript() {
            println!("{line}");
        }
        ran += 1;
    }

    if ran == 0 {
        if let Some(name) = only {
            eprintln!("error: no strategy named \"{name}\"");
            return Err(ExitCode::from(2));
        }
    }
    Ok(())
}

fn run_summarize(log: &Path) -> Result<(), ExitCode> {
    let content = read_source(log)?;
    let summary = parse_output(content.lines()).map_err(fail)?;

    let money = |v: Option<f64>| v.map_or_else(|| "n/a".to_string(), |v| format!("${v:.2}"));
    println!("Initial capital: {}", money(summary.initial_capital));
    println!("Final capital:   {}", money(summary.final_capital));
    match (summary.profit_loss(), summary.profit_loss_pct()) {
        (Some(pl), Some(pct)) => println!("Profit/loss:     {pl:.2} ({pct:.2}%)"),
        _ => println!("Profit/loss:     n/a"),
    }
    println!("Trades:          {}", summary.total_trades());
    for trade in &summary.trades {
        println!("  {trade}");
    }
    Ok(())
}
