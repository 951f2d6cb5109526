//! Ingestion orchestrator
//!
//! Runs Extract → Structure → Parse → Imports → Calls in strict order over
//! one [`RunContext`]. Between files the orchestrator reports progress and
//! checks the cancellation flag; nothing else interrupts a phase.
//!
//! Per-file problems become diagnostics and the file drops out of later
//! phases. Only whole-input failures, graph invariant violations and
//! cancellation end a run early, and every early end releases the AST cache.

pub mod context;
pub mod progress;

pub use context::{ParsedFile, PhaseCounter, PipelineOutput, RunContext, RunState};
pub use progress::{CancellationFlag, PipelineProgress, ProgressCallback};

use serde::Serialize;
use std::fmt;

use crate::common::span_text;
use crate::config::PipelineConfig;
use crate::diagnostics::{DiagnosticStage, PipelineDiagnostic, SkipReason};
use crate::error::PipelineError;
use crate::extract::{ExtractedFiles, Extractor, FileContent, IngestSource};
use crate::graph::model::file_id;
use crate::graph::{
    AstCache, CallResolver, CodeNode, CodeRelation, ImportResolver, NodeLabel, RelationType,
    StructureBuilder,
};
use crate::ingest::{
    detect_language, extractor_for, Language, ParseCapability, ParseError, SyntaxTree,
    TreeSitterParser,
};

/// Pipeline state machine position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelinePhase {
    Extract,
    Structure,
    Parse,
    Imports,
    Calls,
    Done,
    Aborted,
}

impl PipelinePhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelinePhase::Extract => "extract",
            PipelinePhase::Structure => "structure",
            PipelinePhase::Parse => "parse",
            PipelinePhase::Imports => "imports",
            PipelinePhase::Calls => "calls",
            PipelinePhase::Done => "done",
            PipelinePhase::Aborted => "aborted",
        }
    }

    /// Slice of the overall 0-100 progress scale owned by this phase
    pub fn percent_range(&self) -> (u8, u8) {
        match self {
            PipelinePhase::Extract => (0, 15),
            PipelinePhase::Structure => (15, 30),
            PipelinePhase::Parse => (30, 70),
            PipelinePhase::Imports => (70, 82),
            PipelinePhase::Calls => (82, 100),
            PipelinePhase::Done => (100, 100),
            PipelinePhase::Aborted => (0, 0),
        }
    }

    /// Following phase on the success path
    pub fn next(&self) -> Option<PipelinePhase> {
        match self {
            PipelinePhase::Extract => Some(PipelinePhase::Structure),
            PipelinePhase::Structure => Some(PipelinePhase::Parse),
            PipelinePhase::Parse => Some(PipelinePhase::Imports),
            PipelinePhase::Imports => Some(PipelinePhase::Calls),
            PipelinePhase::Calls => Some(PipelinePhase::Done),
            PipelinePhase::Done | PipelinePhase::Aborted => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelinePhase::Done | PipelinePhase::Aborted)
    }

    fn stage(&self) -> DiagnosticStage {
        match self {
            PipelinePhase::Extract => DiagnosticStage::Extract,
            PipelinePhase::Structure => DiagnosticStage::Structure,
            PipelinePhase::Parse => DiagnosticStage::Parse,
            PipelinePhase::Imports => DiagnosticStage::Imports,
            _ => DiagnosticStage::Calls,
        }
    }
}

impl fmt::Display for PipelinePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ingestion pipeline over a parse capability
///
/// # Example
///
/// ```no_run
/// use meridian::{IngestPipeline, IngestSource, PipelineConfig};
///
/// let mut pipeline = IngestPipeline::new(PipelineConfig::default());
/// let output = pipeline.run(&IngestSource::Directory("src".into()))?;
/// println!("{}", output.summary);
/// # Ok::<(), meridian::PipelineError>(())
/// ```
pub struct IngestPipeline<P: ParseCapability = TreeSitterParser> {
    config: PipelineConfig,
    parser: P,
    progress: Option<Box<ProgressCallback>>,
    cancel: CancellationFlag,
}

impl IngestPipeline<TreeSitterParser> {
    pub fn new(config: PipelineConfig) -> Self {
        Self::with_parser(config, TreeSitterParser::new())
    }
}

impl<P: ParseCapability> IngestPipeline<P> {
    pub fn with_parser(config: PipelineConfig, parser: P) -> Self {
        Self {
            config,
            parser,
            progress: None,
            cancel: CancellationFlag::new(),
        }
    }

    /// Install a progress callback
    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(&PipelineProgress) + Send + Sync + 'static,
    {
        self.progress = Some(Box::new(callback));
        self
    }

    /// Use an externally owned cancellation flag
    pub fn with_cancellation(mut self, flag: CancellationFlag) -> Self {
        self.cancel = flag;
        self
    }

    /// Handle that cancels this pipeline's runs
    pub fn cancellation(&self) -> CancellationFlag {
        self.cancel.clone()
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run all phases over `source` in a fresh context
    pub fn run(&mut self, source: &IngestSource) -> Result<PipelineOutput, PipelineError> {
        let mut ctx = RunContext::new(self.config.clone());
        self.run_with_context(&mut ctx, source)?;
        Ok(ctx.into_output())
    }

    /// Run all phases into a caller-owned context
    ///
    /// On error the context is left in the `Aborted` phase with an empty
    /// AST cache; the partial graph stays for inspection.
    pub fn run_with_context(
        &mut self,
        ctx: &mut RunContext,
        source: &IngestSource,
    ) -> Result<(), PipelineError> {
        let result = self.run_phases(ctx, source);
        match &result {
            Ok(()) => ctx.finish(),
            Err(e) => {
                if e.is_cancelled() {
                    tracing::info!("run cancelled during {}", ctx.phase());
                } else {
                    tracing::error!("run aborted during {}: {}", ctx.phase(), e);
                }
                ctx.abort();
            }
        }
        result
    }

    fn run_phases(&mut self, ctx: &mut RunContext, source: &IngestSource) -> Result<(), PipelineError> {
        ctx.config.validate()?;

        let files = self.extract(ctx, source)?;
        self.advance(ctx, PipelinePhase::Structure);
        self.build_structure(ctx, &files)?;
        self.advance(ctx, PipelinePhase::Parse);
        self.parse_files(ctx, &files)?;
        self.advance(ctx, PipelinePhase::Imports);
        self.resolve_imports(ctx, &files)?;
        self.advance(ctx, PipelinePhase::Calls);
        self.resolve_calls(ctx, &files)?;
        Ok(())
    }

    fn advance(&self, ctx: &mut RunContext, next: PipelinePhase) {
        ctx.state.transition(next);
        tracing::info!("phase {}", next);
    }

    /// Per-file boundary: report progress, then honor cancellation
    ///
    /// `batch` is the progress batch of the run context's config.
    fn checkpoint(
        &self,
        batch: usize,
        phase: PipelinePhase,
        processed: usize,
        total: usize,
    ) -> Result<(), PipelineError> {
        let batch = batch.max(1);
        if processed % batch == 0 || processed == total {
            if let Some(callback) = &self.progress {
                callback(&PipelineProgress::new(phase, processed, total));
            }
        }
        if self.cancel.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }
        Ok(())
    }

    fn extract(&self, ctx: &mut RunContext, source: &IngestSource) -> Result<ExtractedFiles, PipelineError> {
        self.checkpoint(ctx.config.progress_batch, PipelinePhase::Extract, 0, 1)?;

        let files = Extractor::from_config(&ctx.config).extract(source)?;
        tracing::info!(
            "extracted {} files ({} ignored)",
            files.len(),
            files.ignored.len()
        );

        ctx.summary.files_total = files.len();
        ctx.summary.files_ignored = files.ignored.len();
        ctx.diagnostics.extend(files.ignored.iter().cloned());
        ctx.state.record(PipelinePhase::Extract, files.len(), files.len());

        self.checkpoint(ctx.config.progress_batch, PipelinePhase::Extract, 1, 1)?;
        Ok(files)
    }

    fn build_structure(&self, ctx: &mut RunContext, files: &ExtractedFiles) -> Result<(), PipelineError> {
        let phase = PipelinePhase::Structure;
        let total = files.len();
        let mut builder = StructureBuilder::new();
        builder.add_root(&mut ctx.graph);

        for (i, (path, content)) in files.iter().enumerate() {
            self.checkpoint(ctx.config.progress_batch, phase, i, total)?;
            let text = content.as_text().map(str::to_string).unwrap_or_default();
            builder.add_path(&mut ctx.graph, path, text)?;
        }

        tracing::debug!(
            "structure: {} folders, {} files",
            builder.folder_count(),
            builder.file_count()
        );
        ctx.state.record(phase, total, total);
        self.checkpoint(ctx.config.progress_batch, phase, total, total)
    }

    fn parse_files(&mut self, ctx: &mut RunContext, files: &ExtractedFiles) -> Result<(), PipelineError> {
        let phase = PipelinePhase::Parse;
        let total = files.len();

        for (i, (path, content)) in files.iter().enumerate() {
            self.checkpoint(ctx.config.progress_batch, phase, i, total)?;

            let (text, language) = match classify(path, content) {
                Ok(pair) => pair,
                Err(reason) => {
                    tracing::debug!("skipping {}: {}", path, reason);
                    ctx.summary.files_skipped += 1;
                    ctx.diagnostics.push(PipelineDiagnostic::skipped(path, reason));
                    continue;
                }
            };

            let tree = match self.parser.parse(path, text, language) {
                Ok(tree) => tree,
                Err(e) => {
                    tracing::warn!("failed to parse {}: {}", path, e);
                    ctx.summary.files_skipped += 1;
                    ctx.diagnostics
                        .push(PipelineDiagnostic::skipped(path, SkipReason::ParseFailed));
                    ctx.diagnostics
                        .push(PipelineDiagnostic::error(path, DiagnosticStage::Parse, e.to_string()));
                    continue;
                }
            };

            let facts = extractor_for(language).definitions(tree.tree(), text.as_bytes());
            let file_node = file_id(path);
            let mut defined = 0;

            for fact in facts {
                let label = NodeLabel::from(fact.kind);
                let node = CodeNode::definition(
                    label,
                    path,
                    &fact.name,
                    fact.start_line,
                    fact.end_line,
                    span_text(text, fact.byte_start, fact.byte_end),
                );
                let node_id = node.id.clone();

                // Same label, name and line twice in one file is one definition
                if !ctx.graph.add_node(node) {
                    continue;
                }
                ctx.graph.add_relation(CodeRelation::new(
                    file_node.as_str(),
                    node_id.as_str(),
                    RelationType::Defines,
                ))?;
                ctx.symbols.register(path, &fact.name, &node_id, fact.kind);
                defined += 1;
            }

            tracing::debug!("parsed {} ({}): {} definitions", path, language, defined);
            ctx.summary.definitions += defined;
            ctx.summary.files_processed += 1;
            ctx.ast_cache.set(path, tree);
            ctx.parsed.push(ParsedFile {
                path: path.to_string(),
                language,
            });
        }

        ctx.state.record(phase, ctx.parsed.len(), total);
        self.checkpoint(ctx.config.progress_batch, phase, total, total)
    }

    fn resolve_imports(&mut self, ctx: &mut RunContext, files: &ExtractedFiles) -> Result<(), PipelineError> {
        let phase = PipelinePhase::Imports;
        let resolver = ImportResolver::new(files.paths(), &ctx.config.extensions);
        let parsed = std::mem::take(&mut ctx.parsed);
        let total = parsed.len();
        let mut processed = 0;

        for (i, file) in parsed.iter().enumerate() {
            self.checkpoint(ctx.config.progress_batch, phase, i, total)?;

            let Some(text) = files.get(&file.path).and_then(FileContent::as_text) else {
                continue;
            };
            let facts = match with_tree(&mut self.parser, &mut ctx.ast_cache, file, text, |tree| {
                extractor_for(file.language).imports(tree.tree(), text.as_bytes())
            }) {
                Ok(facts) => facts,
                Err(e) => {
                    record_file_error(ctx, &file.path, phase, &e);
                    continue;
                }
            };

            let imports = resolver.resolve_file(&file.path, &facts);
            let from = file_id(&file.path);
            for resolved in &imports.resolved {
                ctx.graph.add_relation(CodeRelation::new(
                    from.as_str(),
                    file_id(&resolved.target_file),
                    RelationType::Imports,
                ))?;
            }
            for fact in &imports.unresolved {
                tracing::debug!("unresolved import {:?} in {}:{}", fact.specifier, file.path, fact.line);
                ctx.diagnostics.push(PipelineDiagnostic::unresolved(
                    file.path.as_str(),
                    DiagnosticStage::Imports,
                    fact.specifier.as_str(),
                    fact.line,
                ));
            }

            ctx.summary.imports_resolved += imports.resolved_facts;
            ctx.summary.imports_unresolved += imports.unresolved.len();
            ctx.import_maps.insert(file.path.clone(), imports.map);
            processed += 1;
        }

        ctx.parsed = parsed;
        ctx.state.record(phase, processed, total);
        self.checkpoint(ctx.config.progress_batch, phase, total, total)
    }

    fn resolve_calls(&mut self, ctx: &mut RunContext, files: &ExtractedFiles) -> Result<(), PipelineError> {
        let phase = PipelinePhase::Calls;
        let parsed = std::mem::take(&mut ctx.parsed);
        let total = parsed.len();
        let mut processed = 0;

        for (i, file) in parsed.iter().enumerate() {
            self.checkpoint(ctx.config.progress_batch, phase, i, total)?;

            let Some(text) = files.get(&file.path).and_then(FileContent::as_text) else {
                continue;
            };
            let calls = match with_tree(&mut self.parser, &mut ctx.ast_cache, file, text, |tree| {
                extractor_for(file.language).calls(tree.tree(), text.as_bytes())
            }) {
                Ok(calls) => calls,
                Err(e) => {
                    record_file_error(ctx, &file.path, phase, &e);
                    continue;
                }
            };

            let resolver = CallResolver::new(&ctx.symbols);
            let imports = ctx.import_maps.get(&file.path);
            let from = file_id(&file.path);

            for call in &calls {
                match resolver.resolve(&file.path, call, imports) {
                    Some(resolution) => {
                        ctx.graph.add_relation(CodeRelation::new(
                            from.as_str(),
                            resolution.node_id,
                            RelationType::Calls,
                        ))?;
                        ctx.summary.calls_resolved.record(resolution.tier);
                    }
                    None => {
                        tracing::trace!("unresolved call {} in {}:{}", call.callee, file.path, call.line);
                        ctx.summary.calls_unresolved += 1;
                    }
                }
            }
            processed += 1;
        }

        ctx.parsed = parsed;
        ctx.state.record(phase, processed, total);
        self.checkpoint(ctx.config.progress_batch, phase, total, total)
    }
}

/// Run `f` over the cached tree of `file`, re-parsing on a cache miss
fn with_tree<P, R, F>(
    parser: &mut P,
    cache: &mut AstCache<SyntaxTree>,
    file: &ParsedFile,
    text: &str,
    f: F,
) -> Result<R, ParseError>
where
    P: ParseCapability,
    F: FnOnce(&SyntaxTree) -> R,
{
    if cache.get(&file.path).is_none() {
        tracing::trace!("cache miss for {}, re-parsing", file.path);
        let tree = parser.parse(&file.path, text, file.language)?;
        cache.set(file.path.as_str(), tree);
    }
    cache.peek(&file.path).map(f).ok_or_else(|| ParseError::NoTree {
        path: file.path.clone(),
    })
}

fn record_file_error(ctx: &mut RunContext, path: &str, phase: PipelinePhase, err: &ParseError) {
    tracing::warn!("{} failed for {}: {}", phase, path, err);
    ctx.diagnostics
        .push(PipelineDiagnostic::error(path, phase.stage(), err.to_string()));
}

/// Source text and language of a parseable file, or why it is not one
fn classify<'a>(path: &str, content: &'a FileContent) -> Result<(&'a str, Language), SkipReason> {
    let text = match content {
        FileContent::Text(text) => text.as_str(),
        FileContent::Binary(_) => return Err(SkipReason::BinaryContent),
        FileContent::Omitted { .. } => return Err(SkipReason::TooLarge),
    };
    let language = detect_language(path).ok_or(SkipReason::UnsupportedLanguage)?;
    Ok((text, language))
}
