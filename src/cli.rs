//! CLI argument parsing for Meridian
//!
//! Defines the Command enum and parse_args() function for all CLI commands.

use anyhow::Result;
use std::path::PathBuf;

pub fn print_usage() {
    eprintln!("Meridian - code graph ingestion pipeline");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  meridian <command> [arguments]");
    eprintln!("  meridian --help");
    eprintln!();
    eprintln!("  meridian ingest (--root <DIR> | --archive <ZIP>) [--config <FILE>] [--cache-capacity <N>]");
    eprintln!("                  [--include <GLOB>]... [--exclude <GLOB>]... [--format json|jsonl|sqlite]");
    eprintln!("                  [--output <PATH>] [--diagnostics] [--quiet]");
    eprintln!("  meridian query --db <FILE> --sql <TEXT>");
    eprintln!("  meridian version");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  ingest    Build the code graph for a directory or zip archive");
    eprintln!("  query     Run SQL against a graph written with --format sqlite");
    eprintln!("  version   Show version information");
    eprintln!();
    eprintln!("Ingest arguments:");
    eprintln!("  --root <DIR>           Directory to ingest");
    eprintln!("  --archive <ZIP>        Zip archive to ingest");
    eprintln!("  --config <FILE>        JSON config file (flags override it)");
    eprintln!("  --cache-capacity <N>   Parsed trees kept in memory (default: 50)");
    eprintln!("  --include <GLOB>       Only ingest matching paths (repeatable)");
    eprintln!("  --exclude <GLOB>       Skip matching paths (repeatable)");
    eprintln!("  --format <FORMAT>      Output format: json (default), jsonl or sqlite");
    eprintln!("  --output <PATH>        Output file (default: graph.json, graph.jsonl or graph.db)");
    eprintln!("  --diagnostics          Print skipped files and unresolved imports to stderr");
    eprintln!("  --quiet                No progress bar");
    eprintln!();
    eprintln!("Query arguments:");
    eprintln!("  --db <FILE>            Database written by 'ingest --format sqlite'");
    eprintln!("  --sql <TEXT>           SQL statement to run");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  RUST_LOG               Log filter (default: warn)");
}

/// Output target of an ingest run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    Json,
    JsonL,
    Sqlite,
}

impl OutputKind {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "json" => Some(OutputKind::Json),
            "jsonl" => Some(OutputKind::JsonL),
            "sqlite" => Some(OutputKind::Sqlite),
            _ => None,
        }
    }

    pub fn default_output(&self) -> PathBuf {
        PathBuf::from(match self {
            OutputKind::Json => "graph.json",
            OutputKind::JsonL => "graph.jsonl",
            OutputKind::Sqlite => "graph.db",
        })
    }
}

/// What to ingest
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputPath {
    Root(PathBuf),
    Archive(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Ingest {
        input: InputPath,
        config_path: Option<PathBuf>,
        cache_capacity: Option<usize>,
        include: Vec<String>,
        exclude: Vec<String>,
        format: OutputKind,
        output: PathBuf,
        show_diagnostics: bool,
        quiet: bool,
    },
    Query {
        db_path: PathBuf,
        sql: String,
    },
    Version,
}

/// Value following a flag, or an error naming the flag
fn flag_value<'a>(args: &'a [String], i: usize) -> Result<&'a str> {
    args.get(i + 1)
        .map(String::as_str)
        .ok_or_else(|| anyhow::anyhow!("{} requires an argument", args[i]))
}

/// Parse a full argv (program name first)
pub fn parse_args_from(args: &[String]) -> Result<Command> {
    if args.len() < 2 {
        return Err(anyhow::anyhow!("Missing command"));
    }

    match args[1].as_str() {
        "ingest" => {
            let mut root: Option<PathBuf> = None;
            let mut archive: Option<PathBuf> = None;
            let mut config_path: Option<PathBuf> = None;
            let mut cache_capacity: Option<usize> = None;
            let mut include = Vec::new();
            let mut exclude = Vec::new();
            let mut format = OutputKind::Json;
            let mut output: Option<PathBuf> = None;
            let mut show_diagnostics = false;
            let mut quiet = false;

            let mut i = 2;
            while i < args.len() {
                match args[i].as_str() {
                    "--root" => {
                        root = Some(PathBuf::from(flag_value(args, i)?));
                        i += 2;
                    }
                    "--archive" => {
                        archive = Some(PathBuf::from(flag_value(args, i)?));
                        i += 2;
                    }
                    "--config" => {
                        config_path = Some(PathBuf::from(flag_value(args, i)?));
                        i += 2;
                    }
                    "--cache-capacity" => {
                        let value = flag_value(args, i)?;
                        let n: usize = value
                            .parse()
                            .map_err(|_| anyhow::anyhow!("Invalid --cache-capacity: {}", value))?;
                        if n == 0 {
                            return Err(anyhow::anyhow!("--cache-capacity must be at least 1"));
                        }
                        cache_capacity = Some(n);
                        i += 2;
                    }
                    "--include" => {
                        include.push(flag_value(args, i)?.to_string());
                        i += 2;
                    }
                    "--exclude" => {
                        exclude.push(flag_value(args, i)?.to_string());
                        i += 2;
                    }
                    "--format" => {
                        let value = flag_value(args, i)?;
                        format = OutputKind::from_str(value)
                            .ok_or_else(|| anyhow::anyhow!("Invalid output format: {}", value))?;
                        i += 2;
                    }
                    "--output" => {
                        output = Some(PathBuf::from(flag_value(args, i)?));
                        i += 2;
                    }
                    "--diagnostics" => {
                        show_diagnostics = true;
                        i += 1;
                    }
                    "--quiet" | "-q" => {
                        quiet = true;
                        i += 1;
                    }
                    _ => {
                        return Err(anyhow::anyhow!("Unknown argument: {}", args[i]));
                    }
                }
            }

            let input = match (root, archive) {
                (Some(root), None) => InputPath::Root(root),
                (None, Some(archive)) => InputPath::Archive(archive),
                (Some(_), Some(_)) => {
                    return Err(anyhow::anyhow!("--root and --archive are mutually exclusive"))
                }
                (None, None) => return Err(anyhow::anyhow!("--root or --archive is required")),
            };
            let output = output.unwrap_or_else(|| format.default_output());

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
            })
        }
        "query" => {
            let mut db_path: Option<PathBuf> = None;
            let mut sql: Option<String> = None;

            let mut i = 2;
            while i < args.len() {
                match args[i].as_str() {
                    "--db" => {
                        db_path = Some(PathBuf::from(flag_value(args, i)?));
                        i += 2;
                    }
                    "--sql" => {
                        sql = Some(flag_value(args, i)?.to_string());
                        i += 2;
                    }
                    _ => {
                        return Err(anyhow::anyhow!("Unknown argument: {}", args[i]));
                    }
                }
            }

            let db_path = db_path.ok_or_else(|| anyhow::anyhow!("--db is required"))?;
            let sql = sql.ok_or_else(|| anyhow::anyhow!("--sql is required"))?;
            Ok(Command::Query { db_path, sql })
        }
        "version" | "--version" | "-V" => Ok(Command::Version),
        other => Err(anyhow::anyhow!("Unknown command: {}", other)),
    }
}

pub fn parse_args() -> Result<Command> {
    let args: Vec<String> = std::env::args().collect();
    parse_args_from(&args)
}
