//! CLI smoke and inspection entry point.
//!
//! # Responsibility
//! - Verify `staffledger_core` linkage (`ping`, `version`).
//! - Open a ledger database and print overview and headcount as JSON.
//!
//! Environment:
//! - `STAFFLEDGER_LOG_DIR`: absolute directory; enables file logging.
//! - `STAFFLEDGER_AS_OF`: ISO date used instead of today.

use chrono::{Local, NaiveDate};
use log::info;
use staffledger_core::{open_db, StatsService};
use std::process::ExitCode;

const USAGE: &str = "usage: staffledger_cli <ping|version|DB_PATH>";

fn main() -> ExitCode {
    let mut args = std::env::args().skip(1);
    let Some(command) = args.next() else {
        eprintln!("{USAGE}");
        return ExitCode::from(2);
    };

    match command.as_str() {
        "ping" => {
            println!("staffledger_core ping={}", staffledger_core::ping());
            ExitCode::SUCCESS
        }
        "version" => {
            println!(
                "staffledger_core version={}",
                staffledger_core::core_version()
            );
            ExitCode::SUCCESS
        }
        db_path => match report(db_path) {
            Ok(json) => {
                println!("{json}");
                ExitCode::SUCCESS
            }
            Err(message) => {
                eprintln!("error: {message}");
                ExitCode::FAILURE
            }
        },
    }
}

fn report(db_path: &str) -> Result<String, String> {
    if let Ok(log_dir) = std::env::var("STAFFLEDGER_LOG_DIR") {
        staffledger_core::init_logging(staffledger_core::default_log_level(), &log_dir)?;
    }
    let as_of = resolve_as_of()?;

    let conn = open_db(db_path).map_err(|err| err.to_string())?;
    let stats = StatsService::new(&conn);
    let overview = stats.overview(as_of).map_err(|err| err.to_string())?;
    let headcount = stats.headcount(as_of).map_err(|err| err.to_string())?;
    info!(
        "event=cli_report module=cli status=ok as_of={as_of} total={}",
        headcount.total
    );

    serde_json::to_string_pretty(&serde_json::json!({
        "overview": overview,
        "headcount": headcount,
    }))
    .map_err(|err| err.to_string())
}

fn resolve_as_of() -> Result<NaiveDate, String> {
    match std::env::var("STAFFLEDGER_AS_OF") {
        Ok(value) => NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
            .map_err(|err| format!("invalid STAFFLEDGER_AS_OF `{value}`: {err}")),
        Err(_) => Ok(Local::now().date_naive()),
    }
}
