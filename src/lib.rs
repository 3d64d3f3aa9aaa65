//! Docsift - confidence-scored project metadata extraction.
//!
//! Docsift reads README-style markdown and extracts structured project
//! metadata: languages, dependencies, commands, testing setup, and document
//! metadata. Nothing is reported as certain; every finding carries a
//! confidence score derived from weighted, deduplicated evidence, and the
//! pipeline degrades instead of failing when a document is malformed or an
//! analyzer breaks.
//!
//! # Architecture
//!
//! - `parser`: Recovering line-oriented markdown parser with a content-hash
//!   AST cache
//! - `evidence`: Evidence kinds, weights, and the confidence scoring rules
//! - `language`: Language context engine (evidence collection, context
//!   spans, boundaries)
//! - `analyzers`: The `Analyzer` trait and the five built-in analyzers
//! - `pipeline`: Registry, dependency-ordered concurrent execution, failure
//!   isolation
//! - `aggregate`: Cross-analyzer merge, data-flow validation, overall
//!   confidence
//! - `project`: The shared data model
//!
//! # Adding an Analyzer
//!
//! Implement [`Analyzer`](analyzers::Analyzer) and pass it to
//! [`DocumentAnalyzer::register_analyzer`]. Declared dependencies are
//! honored by the scheduler; an analyzer whose upstream failed sees that
//! through [`AnalysisContext`](analyzers::AnalysisContext) and should
//! return a degraded result rather than an error.

pub mod aggregate;
pub mod analyzers;
pub mod config;
pub mod error;
pub mod evidence;
pub mod language;
pub mod parser;
pub mod pipeline;
pub mod project;

use std::sync::Arc;

pub use aggregate::Aggregator;
pub use analyzers::{builtin_analyzers, AnalysisContext, AnalysisInput, Analyzer};
pub use config::{AnalyzerConfig, ValidatedConfig};
pub use error::{AnalysisError, RegistrationError};
pub use evidence::{Evidence, EvidenceKind};
pub use language::{LanguageAnalysis, LanguageContext, LanguageContextEngine};
pub use parser::DocumentParser;
pub use pipeline::Pipeline;
pub use project::{AggregatedResult, ParseResult, ProjectInfo};

/// High-level entry point: a pipeline preloaded with the built-in
/// analyzers, plus aggregation into a [`ParseResult`].
pub struct DocumentAnalyzer {
    pipeline: Pipeline,
    config_diagnostics: Vec<String>,
}

impl DocumentAnalyzer {
    pub fn new() -> Self {
        Self::with_config(AnalyzerConfig::default())
    }

    pub fn with_config(config: AnalyzerConfig) -> Self {
        let validated = config.validate();
        let config_diagnostics = validated.diagnostics.clone();
        let mut pipeline = Pipeline::new(validated);
        for analyzer in builtin_analyzers() {
            // Built-in names are distinct and non-empty.
            let _ = pipeline.register(analyzer);
        }
        Self {
            pipeline,
            config_diagnostics,
        }
    }

    /// Analyze a document, blocking until done.
    pub fn analyze(&self, text: &str) -> ParseResult {
        match self.pipeline.execute_blocking(text) {
            Ok(out) => self.finish(out),
            Err(err) => ParseResult::failure(err),
        }
    }

    /// Async flavor of [`analyze`](Self::analyze) for callers already on a
    /// runtime.
    pub async fn analyze_async(&self, text: &str) -> ParseResult {
        match self.pipeline.execute(text).await {
            Ok(out) => self.finish(out),
            Err(err) => ParseResult::failure(err),
        }
    }

    /// Analyze raw bytes. Invalid UTF-8 is an input-contract violation and
    /// yields `success == false` without running any analyzer.
    pub async fn analyze_bytes(&self, bytes: &[u8]) -> ParseResult {
        match self.pipeline.execute_bytes(bytes).await {
            Ok(out) => self.finish(out),
            Err(err) => ParseResult::failure(err),
        }
    }

    /// Full aggregation output, including validation status and
    /// integration metadata.
    pub async fn analyze_full(&self, text: &str) -> Result<AggregatedResult, AnalysisError> {
        let out = self.pipeline.execute(text).await?;
        Ok(Aggregator::aggregate(
            &out.results,
            &out.failures,
            &out.edges,
            self.pipeline.config(),
        ))
    }

    fn finish(&self, out: pipeline::PipelineResult) -> ParseResult {
        let aggregated = Aggregator::aggregate(
            &out.results,
            &out.failures,
            &out.edges,
            self.pipeline.config(),
        );

        let mut warnings = self.config_diagnostics.clone();
        warnings.extend(out.warnings);
        for issue in &aggregated.validation.issues {
            warnings.push(issue.message.clone());
        }

        // Partial success beats hard failure: false only when every
        // analyzer failed.
        let success = !out.results.is_empty() || out.failures.is_empty();

        ParseResult {
            success,
            data: Some(aggregated.project_info),
            errors: out.failures,
            warnings,
        }
    }

    /// Add a custom analyzer to the pipeline.
    pub fn register_analyzer(
        &mut self,
        analyzer: Arc<dyn Analyzer>,
    ) -> Result<(), RegistrationError> {
        self.pipeline.register(analyzer)
    }

    /// Remove an analyzer by name. Returns whether one was removed.
    pub fn unregister_analyzer(&mut self, name: &str) -> bool {
        self.pipeline.unregister(name)
    }

    /// Registered analyzer names, in registration order.
    pub fn analyzer_names(&self) -> Vec<String> {
        self.pipeline.analyzer_names()
    }

    /// Drop custom analyzers and restore the built-in set.
    pub fn reset(&mut self) {
        let config = self.pipeline.config().clone();
        let mut pipeline = Pipeline::new(config);
        for analyzer in builtin_analyzers() {
            let _ = pipeline.register(analyzer);
        }
        self.pipeline = pipeline;
    }

    /// Release analyzer-held resources.
    pub fn cleanup(&self) {
        self.pipeline.cleanup();
    }
}

impl Default for DocumentAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}
