//! CLI integration tests with real files on disk.

mod common;

use clap::Parser;
use common::*;
use std::fs;
use std::path::Path;
use std::process::ExitCode;
use stockdsl::cli::{self, Cli};

fn run_args(args: &[&str]) -> ExitCode {
    let cli = Cli::try_parse_from(args).unwrap();
    cli::run(cli)
}

// ExitCode has no PartialEq; its Debug form carries the raw status.
fn assert_exit(code: ExitCode, expected: ExitCode) {
    assert_eq!(format!("{:?}", code), format!("{:?}", expected));
}

fn path_str(path: &Path) -> &str {
    path.to_str().unwrap()
}

const AAPL_CSV: &str = "date,price,volume,rsi,zscore\n\
                        2024-01-01,100,1000,50,0\n\
                        2024-01-02,100,1000,25,0\n\
                        2024-01-03,120,1000,75,0\n";

mod compile_command {
    use super::*;

    #[test]
    fn writes_script_to_output_file() {
        let input = write_temp(RSI_STRATEGY, ".dsl");
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("strategy.py");

        let code = run_args(&[
            "stockdsl",
            "compile",
            path_str(input.path()),
            "-o",
            path_str(&output),
        ]);

        assert_exit(code, ExitCode::SUCCESS);
        let script = fs::read_to_string(&output).unwrap();
        assert!(script.starts_with("# Generated by stockdsl"));
        assert!(script.contains("class T:"));
        assert!(script.contains("if rsi < 30:"));
    }

    #[test]
    fn failed_compile_writes_nothing() {
        let input = write_temp("strategy \"t\" { if rsi < 30 { buy AAPL }", ".dsl");
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("strategy.py");

        let code = run_args(&[
            "stockdsl",
            "compile",
            path_str(input.path()),
            "-o",
            path_str(&output),
        ]);

        assert_exit(code, ExitCode::from(4));
        assert!(!output.exists());
    }

    #[test]
    fn strict_config_blocks_output() {
        let input = write_temp("strategy \"t\" { if macd > 1 { buy AAPL } }", ".dsl");
        let config = write_temp("[compiler]\nstrict = true\n", ".ini");
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("strategy.py");

        let code = run_args(&[
            "stockdsl",
            "compile",
            path_str(input.path()),
            "-o",
            path_str(&output),
            "-c",
            path_str(config.path()),
        ]);

        assert_exit(code, ExitCode::from(4));
        assert!(!output.exists());
    }

    #[test]
    fn lenient_config_keeps_output() {
        let input = write_temp("strategy \"t\" { if macd > 1 { buy AAPL } }", ".dsl");
        let config = write_temp("[compiler]\nstrict = false\n", ".ini");
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("strategy.py");

        let code = run_args(&[
            "stockdsl",
            "compile",
            path_str(input.path()),
            "-o",
            path_str(&output),
            "-c",
            path_str(config.path()),
        ]);

        assert_exit(code, ExitCode::SUCCESS);
        let script = fs::read_to_string(&output).unwrap();
        assert!(script.contains("if macd > 1:"));
    }

    #[test]
    fn missing_input_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.dsl");
        let code = run_args(&["stockdsl", "compile", path_str(&missing)]);
        assert_exit(code, ExitCode::from(1));
    }
}

mod check_command {
    use super::*;

    #[test]
    fn valid_file_passes() {
        let input = write_temp(RSI_STRATEGY, ".dsl");
        let code = run_args(&["stockdsl", "check", path_str(input.path())]);
        assert_exit(code, ExitCode::SUCCESS);
    }

    #[test]
    fn syntax_error_exits_with_compile_status() {
        let input = write_temp("strategy \"t\" { capital: 100 }", ".dsl");
        let code = run_args(&["stockdsl", "check", path_str(input.path())]);
        assert_exit(code, ExitCode::from(4));
    }

    #[test]
    fn missing_config_file_exits_with_config_status() {
        let input = write_temp(RSI_STRATEGY, ".dsl");
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("absent.ini");
        let code = run_args(&[
            "stockdsl",
            "check",
            path_str(input.path()),
            "-c",
            path_str(&config),
        ]);
        assert_exit(code, ExitCode::from(2));
    }

    #[test]
    fn invalid_config_value_exits_with_config_status() {
        let input = write_temp(RSI_STRATEGY, ".dsl");
        let config = write_temp("[compiler]\nmissing_config = sometimes\n", ".ini");
        let code = run_args(&[
            "stockdsl",
            "check",
            path_str(input.path()),
            "-c",
            path_str(config.path()),
        ]);
        assert_exit(code, ExitCode::from(2));
    }
}

mod summarize_command {
    use super::*;

    #[test]
    fn reads_script_output() {
        let log = write_temp(
            "--- Starting Backtest ---\n\
             Initial Capital: $10000.00\n\
             \n\
             --- Backtest Finished ---\n\
             Trade History:\n\
             BOUGHT 1 AAPL @ 100.00\n\
             SOLD 1 AAPL @ 120.00\n\
             \n\
             Final Portfolio:\n\
             Final Capital: $10020.00\n\
             Positions: {}\n",
            ".log",
        );
        let code = run_args(&["stockdsl", "summarize", path_str(log.path())]);
        assert_exit(code, ExitCode::SUCCESS);
    }

    #[test]
    fn garbled_capital_exits_with_output_status() {
        let log = write_temp("Final Capital: $n/a\n", ".log");
        let code = run_args(&["stockdsl", "summarize", path_str(log.path())]);
        assert_exit(code, ExitCode::from(6));
    }
}

mod simulate_command {
    use super::*;

    #[test]
    fn runs_strategy_over_csv_directory() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("AAPL.csv"), AAPL_CSV).unwrap();
        let input = write_temp(RSI_STRATEGY, ".dsl");

        let code = run_args(&[
            "stockdsl",
            "simulate",
            path_str(input.path()),
            "--data",
            path_str(dir.path()),
        ]);
        assert_exit(code, ExitCode::SUCCESS);
    }

    #[test]
    fn missing_csv_exits_with_data_status() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_temp(RSI_STRATEGY, ".dsl");

        let code = run_args(&[
            "stockdsl",
            "simulate",
            path_str(input.path()),
            "--data",
            path_str(dir.path()),
        ]);
        assert_exit(code, ExitCode::from(5));
    }

    #[test]
    fn block_without_symbols_exits_with_config_status() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_temp("strategy \"t\" { if rsi < 30 { buy AAPL } }", ".dsl");

        let code = run_args(&[
            "stockdsl",
            "simulate",
            path_str(input.path()),
            "--data",
            path_str(dir.path()),
        ]);
        assert_exit(code, ExitCode::from(2));
    }

    #[test]
    fn strategy_filter_selects_block() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("AAPL.csv"), AAPL_CSV).unwrap();
        // Only "t" has data; "other" would fail on its missing MSFT file.
        let source = format!(
            "{}\nstrategy \"other\" {{ symbols: MSFT if rsi < 30 {{ buy MSFT }} }}\n",
            RSI_STRATEGY
        );
        let input = write_temp(&source, ".dsl");
        let data = path_str(dir.path());
        let file = path_str(input.path());

        let code = run_args(&["stockdsl", "simulate", file, "--data", data, "--strategy", "t"]);
        assert_exit(code, ExitCode::SUCCESS);

        let code = run_args(&["stockdsl", "simulate", file, "--data", data, "--strategy", "nope"]);
        assert_exit(code, ExitCode::from(2));

        let code = run_args(&["stockdsl", "simulate", file, "--data", data]);
        assert_exit(code, ExitCode::from(5));
    }

    #[test]
    fn csv_rows_drive_the_interpreter() {
        use stockdsl::adapters::csv_adapter::CsvAdapter;
        use stockdsl::domain::options::CompilerOptions;
        use stockdsl::domain::simulate::simulate;

        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("AAPL.csv"), AAPL_CSV).unwrap();

        let out = compile_default(RSI_STRATEGY).unwrap();
        let data = CsvAdapter::new(dir.path().to_path_buf());
        let report = simulate(
            &out.program.blocks[0],
            &out.configs[0],
            &CompilerOptions::default(),
            &data,
        )
        .unwrap();

        assert_eq!(
            report.portfolio.history,
            vec!["BOUGHT 1 AAPL @ 100.00", "SOLD 1 AAPL @ 120.00"]
        );
        assert!(report
            .transcript()
            .contains(&"Final Capital: $10020.00".to_string()));
    }
}

mod argument_parsing {
    use super::*;

    #[test]
    fn all_subcommands_parse() {
        assert!(Cli::try_parse_from(["stockdsl", "check", "a.dsl", "-c", "x.ini"]).is_ok());
        assert!(Cli::try_parse_from(["stockdsl", "summarize", "run.log"]).is_ok());
        assert!(
            Cli::try_parse_from(["stockdsl", "simulate", "a.dsl", "--data", "d", "--strategy", "t"])
                .is_ok()
        );
        assert!(Cli::try_parse_from(["stockdsl", "deploy"]).is_err());
    }
}
