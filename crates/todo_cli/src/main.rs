//! Command-line entry point.
//!
//! # Responsibility
//! - Verify `todo_core` linkage (`ping`, `version`).
//! - Dispatch one API procedure with JSON input and print the JSON result.
//!
//! Configuration comes from the environment; see `todo_core::config`.

use clap::{Parser, Subcommand};
use log::error;
use serde_json::Value;
use std::path::PathBuf;
use std::process::ExitCode;
use todo_core::{init_logging, ApiRouter, AppConfig, Procedure};

#[derive(Debug, Parser)]
#[command(name = "todo", version, about = "Todo tracker core probe")]
struct Cli {
    /// Absolute directory for rolling log files (overrides TODO_LOG_DIR).
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Health check.
    Ping,
    /// Print the core crate version.
    Version,
    /// List every procedure name.
    Procedures,
    /// Call one procedure, e.g. `todo call todo.find`.
    Call {
        procedure: String,
        /// JSON input for the procedure.
        #[arg(default_value = "{}")]
        input: String,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Command::Ping => {
            println!("todo_core ping={}", todo_core::ping());
            ExitCode::SUCCESS
        }
        Command::Version => {
            println!("todo_core version={}", todo_core::core_version());
            ExitCode::SUCCESS
        }
        Command::Procedures => {
            for procedure in Procedure::ALL {
                println!("{}", procedure.name());
            }
            ExitCode::SUCCESS
        }
        Command::Call { procedure, input } => match call(cli.log_dir, &procedure, &input).await {
            Ok(output) => {
                println!("{output}");
                ExitCode::SUCCESS
            }
            Err(message) => {
                eprintln!("error: {message}");
                ExitCode::FAILURE
            }
        },
    }
}

async fn call(log_dir: Option<PathBuf>, procedure: &str, input: &str) -> Result<String, String> {
    let mut config = AppConfig::from_env().map_err(|err| err.to_string())?;
    if let Some(dir) = log_dir {
        config = config.with_log_dir(dir);
    }
    if let Some(dir) = &config.log_dir {
        init_logging(&config.log_level, dir).map_err(|err| err.to_string())?;
    }

    let input: Value =
        serde_json::from_str(input).map_err(|err| format!("input is not JSON: {err}"))?;
    let router = ApiRouter::from_config(&config).map_err(|err| {
        error!("event=cli_start module=cli status=error error={err}");
        err.to_string()
    })?;

    let output = router
        .dispatch(procedure, input)
        .await
        .map_err(|err| err.to_string())?;
    serde_json::to_string_pretty(&output).map_err(|err| err.to_string())
}
