//! Ingest command implementation

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;

use meridian::{
    CancellationFlag, ExportFormat, GraphSink, IngestPipeline, IngestSource, JsonExporter,
    PipelineConfig, PipelineError,
};

use crate::cli::{InputPath, OutputKind};

/// Exit code for a run stopped by SIGINT/SIGTERM
const EXIT_CANCELLED: u8 = 130;

pub struct IngestOptions {
    pub input: InputPath,
    pub config_path: Option<PathBuf>,
    pub cache_capacity: Option<usize>,
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    pub format: OutputKind,
    pub output: PathBuf,
    pub show_diagnostics: bool,
    pub quiet: bool,
}

/// Config file first, then command-line overrides
fn build_config(options: &IngestOptions) -> Result<PipelineConfig> {
    let mut config = match &options.config_path {
        Some(path) => PipelineConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => PipelineConfig::default(),
    };
    if let Some(capacity) = options.cache_capacity {
        config.ast_cache_capacity = capacity;
    }
    config.include.extend(options.include.iter().cloned());
    config.exclude.extend(options.exclude.iter().cloned());
    config.validate()?;
    Ok(config)
}

fn progress_bar(quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(100);
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos:>3}% {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    pb.set_style(style);
    pb
}

pub fn run_ingest(options: IngestOptions) -> Result<u8> {
    let config = build_config(&options)?;

    let cancel = CancellationFlag::new();
    let cancel_clone = cancel.clone();

    // Register signal handlers for SIGINT and SIGTERM
    #[cfg(unix)]
    {
        use signal_hook::consts::signal;
        use signal_hook::iterator::Signals;

        let mut signals = Signals::new([signal::SIGTERM, signal::SIGINT])?;

        std::thread::spawn(move || {
            if signals.forever().next().is_some() {
                cancel_clone.cancel();
            }
        });
    }

    let source = match &options.input {
        InputPath::Root(root) => {
            if !root.is_dir() {
                anyhow::bail!("--root {} is not a directory", root.display());
            }
            IngestSource::Directory(root.clone())
        }
        InputPath::Archive(path) => IngestSource::ArchivePath(path.clone()),
    };

    let pb = progress_bar(options.quiet);
    let pb_progress = pb.clone();
    let mut pipeline = IngestPipeline::new(config)
        .with_cancellation(cancel)
        .on_progress(move |p| {
            pb_progress.set_position(p.percent as u64);
            pb_progress.set_message(format!("{} {}/{}", p.phase, p.processed, p.total));
        });

    let output = match pipeline.run(&source) {
        Ok(output) => output,
        Err(PipelineError::Cancelled) => {
            pb.abandon_with_message("cancelled");
            eprintln!("Ingestion cancelled");
            return Ok(EXIT_CANCELLED);
        }
        Err(e) => {
            pb.abandon();
            return Err(e).context("Ingestion failed");
        }
    };
    pb.finish_and_clear();

    if options.show_diagnostics {
        for diagnostic in &output.diagnostics {
            eprintln!("{}", diagnostic.format_stderr());
        }
    }

    let summary = output.summary.clone();
    let (nodes, relations) = output.graph.into_parts();

    match options.format {
        OutputKind::Json | OutputKind::JsonL => {
            let format = if options.format == OutputKind::Json {
                ExportFormat::Json
            } else {
                ExportFormat::JsonL
            };
            JsonExporter::new(&options.output, format)
                .with_summary(summary.clone())
                .bulk_load(&nodes, &relations)
                .with_context(|| format!("Failed to write {}", options.output.display()))?;
        }
        OutputKind::Sqlite => write_sqlite(&options.output, &nodes, &relations)?,
    }

    println!("{}", summary);
    println!("Wrote {}", options.output.display());
    Ok(0)
}

#[cfg(feature = "sqlite-sink")]
fn write_sqlite(
    path: &std::path::Path,
    nodes: &[meridian::CodeNode],
    relations: &[meridian::CodeRelation],
) -> Result<()> {
    let mut sink = meridian::SqliteSink::open(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    // Every run is a full rebuild
    sink.clear()?;
    sink.bulk_load(nodes, relations)?;
    Ok(())
}

#[cfg(not(feature = "sqlite-sink"))]
fn write_sqlite(
    _path: &std::path::Path,
    _nodes: &[meridian::CodeNode],
    _relations: &[meridian::CodeRelation],
) -> Result<()> {
    anyhow::bail!("--format sqlite requires the sqlite-sink feature")
}
