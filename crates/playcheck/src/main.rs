//! Gameplay log checker
//!
//! Command-line entry point: loads the task configuration, checks one
//! log against one task and prints the result byte with its signature
//! code. The exit status is the library return code (0 success, 1 bad
//! parameters, 2 format error); usage errors exit with 99.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use pc_core::Checker;

/// Exit status for malformed invocations.
const USAGE_EXIT: u8 = 99;

/// Check a gameplay log against a configured task
#[derive(Parser, Debug)]
#[command(name = "playcheck", disable_help_flag = true, disable_version_flag = true)]
struct Args {
    /// Top-level configuration file (secret + task table)
    config_file: PathBuf,

    /// Task identifier from the configuration
    task_id: String,

    /// Integer salt mixed into the signature code
    salt: String,

    /// Gameplay log to check
    log_file: PathBuf,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(_) => {
            eprintln!("Usage: playcheck <config-file> <task-id> <salt> <log-file>");
            eprintln!();
            return ExitCode::from(USAGE_EXIT);
        }
    };

    // Lenient salt parsing: a non-numeric salt degrades to zero rather
    // than failing the invocation.
    let salt = args.salt.trim().parse::<i32>().unwrap_or(0);

    let checker = match Checker::from_config(&args.config_file) {
        Ok(checker) => checker,
        Err(e) => {
            error!(config = %args.config_file.display(), "cannot initialize the checker: {e}");
            return ExitCode::from(e.code());
        }
    };

    match checker.check_log(&args.task_id, salt, &args.log_file) {
        Ok(outcome) => {
            println!("Checking completed!");
            println!("Result code: {}", outcome.result);
            println!("Code string: {}", outcome.signature);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(log = %args.log_file.display(), "{e}");
            println!("Program checking error: {}", e.code());
            println!("Result code: 0");
            ExitCode::from(e.code())
        }
    }
}
