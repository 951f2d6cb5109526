//! Meridian CLI - deterministic code graph ingestion
//!
//! Usage: meridian <command> [arguments]

mod cli;
mod ingest_cmd;
mod query_cmd;

use std::process::ExitCode;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::{parse_args, print_usage, Command};

/// Log to stderr; RUST_LOG overrides the default level
fn init_logging() {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();
}

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        return ExitCode::from(1);
    }

    if args[1] == "--help" || args[1] == "-h" {
        print_usage();
        return ExitCode::SUCCESS;
    }

    init_logging();

    match parse_args() {
        Ok(Command::Ingest {
            input,
            config_path,
            cache_capacity,
            include,
            exclude,
            format,
            output,
            show_diagnostics,
            quiet,
        }) => {
            let options = ingest_cmd::IngestOptions {
                input,
                config_path,
                cache_capacity,
                include,
                exclude,
                format,
                output,
                show_diagnostics,
                quiet,
            };
            match ingest_cmd::run_ingest(options) {
                Ok(code) => ExitCode::from(code),
                Err(e) => {
                    eprintln!("Error: {:#}", e);
                    ExitCode::from(1)
                }
            }
        }
        Ok(Command::Query { db_path, sql }) => {
            if let Err(e) = query_cmd::run_query(db_path, sql) {
                eprintln!("Error: {:#}", e);
                return ExitCode::from(1);
            }
            ExitCode::SUCCESS
        }
        Ok(Command::Version) => {
            println!("{}", meridian::version::version());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            print_usage();
            ExitCode::from(1)
        }
    }
}
