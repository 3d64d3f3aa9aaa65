//! Analyzer contract and the built-in analyzer set.
//!
//! An analyzer is a stateless unit deriving one domain's partial result
//! from the parsed document plus the shared analysis context. Built-in
//! analyzers never return `Err` for any text input; injected third-party
//! analyzers may, and the pipeline isolates them.

mod commands;
mod dependencies;
mod language;
mod metadata;
mod testing;

pub use commands::CommandAnalyzer;
pub use dependencies::DependencyAnalyzer;
pub use language::LanguageDetector;
pub use metadata::MetadataAnalyzer;
pub use testing::TestingAnalyzer;

use std::collections::HashSet;
use std::sync::{Arc, OnceLock, RwLock};

use crate::config::ValidatedConfig;
use crate::language::LanguageAnalysis;
use crate::parser::ParsedDocument;
use crate::project::AnalyzerResult;

/// Well-known analyzer names, used in dependency declarations.
pub mod names {
    pub const LANGUAGE_DETECTOR: &str = "language_detector";
    pub const METADATA: &str = "metadata";
    pub const DEPENDENCIES: &str = "dependencies";
    pub const COMMANDS: &str = "commands";
    pub const TESTING: &str = "testing";
}

/// Shared state threaded through one pipeline invocation.
///
/// Constructed once per `execute()` call and passed by reference into every
/// analyzer, never ambient or global. Values are write-once: the language
/// stage publishes its analysis, downstream stages read it.
pub struct AnalysisContext {
    language: OnceLock<Arc<LanguageAnalysis>>,
    failed_upstreams: RwLock<HashSet<String>>,
}

impl AnalysisContext {
    pub fn new() -> Self {
        Self {
            language: OnceLock::new(),
            failed_upstreams: RwLock::new(HashSet::new()),
        }
    }

    /// Publish the language analysis. First write wins; identical content
    /// produces identical analyses, so a lost race is harmless.
    pub fn publish_language(&self, analysis: Arc<LanguageAnalysis>) {
        let _ = self.language.set(analysis);
    }

    /// The published language analysis, if the language stage has run.
    pub fn language(&self) -> Option<Arc<LanguageAnalysis>> {
        self.language.get().cloned()
    }

    /// Record that an upstream analyzer failed or timed out.
    pub fn mark_failed(&self, name: &str) {
        self.failed_upstreams
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(name.to_string());
    }

    /// Whether a declared upstream is unavailable. Dependents use this to
    /// degrade (empty or lower-confidence result) instead of crashing.
    pub fn upstream_failed(&self, name: &str) -> bool {
        self.failed_upstreams
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .contains(name)
    }
}

impl Default for AnalysisContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Everything an analyzer invocation sees.
#[derive(Clone)]
pub struct AnalysisInput {
    pub doc: Arc<ParsedDocument>,
    pub context: Arc<AnalysisContext>,
    pub config: Arc<ValidatedConfig>,
}

/// The analyzer contract.
///
/// Implementations must be stateless across calls (internal sub-caches
/// aside) and thread-safe; the pipeline runs independent analyzers
/// concurrently.
pub trait Analyzer: Send + Sync {
    /// Unique registry name.
    fn name(&self) -> &str;

    /// Names of analyzers whose output this one consumes.
    fn dependencies(&self) -> Vec<String> {
        Vec::new()
    }

    /// Produce this domain's partial result.
    fn analyze(&self, input: &AnalysisInput) -> anyhow::Result<AnalyzerResult>;

    /// Release any internal resources on pipeline teardown.
    fn cleanup(&self) {}
}

/// The default analyzer set, in registration order.
pub fn builtin_analyzers() -> Vec<Arc<dyn Analyzer>> {
    vec![
        Arc::new(LanguageDetector::new()),
        Arc::new(MetadataAnalyzer::new()),
        Arc::new(DependencyAnalyzer::new()),
        Arc::new(CommandAnalyzer::new()),
        Arc::new(TestingAnalyzer::new()),
    ]
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_language_is_write_once() {
        let ctx = AnalysisContext::new();
        assert!(ctx.language().is_none());
        ctx.publish_language(Arc::new(LanguageAnalysis::default()));
        assert!(ctx.language().is_some());
    }

    #[test]
    fn test_failed_upstream_tracking() {
        let ctx = AnalysisContext::new();
        assert!(!ctx.upstream_failed(names::LANGUAGE_DETECTOR));
        ctx.mark_failed(names::LANGUAGE_DETECTOR);
        assert!(ctx.upstream_failed(names::LANGUAGE_DETECTOR));
    }

    #[test]
    fn test_builtin_set_has_expected_names() {
        let names: Vec<String> = builtin_analyzers()
            .iter()
            .map(|a| a.name().to_string())
            .collect();
        assert_eq!(
            names,
            vec![
                "language_detector",
                "metadata",
                "dependencies",
                "commands",
                "testing"
            ]
        );
    }
}
