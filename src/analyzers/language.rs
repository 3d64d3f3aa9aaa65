//! Language detection stage.
//!
//! Thin pipeline wrapper around the context engine: runs detection, puts
//! the span-based analysis on the shared context for downstream analyzers,
//! and reports the per-language summaries as its own result.

use std::sync::Arc;

use super::{names, AnalysisInput, Analyzer};
use crate::language::LanguageContextEngine;
use crate::project::{AnalyzerData, AnalyzerResult};

pub struct LanguageDetector;

impl LanguageDetector {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LanguageDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl Analyzer for LanguageDetector {
    fn name(&self) -> &str {
        names::LANGUAGE_DETECTOR
    }

    fn analyze(&self, input: &AnalysisInput) -> anyhow::Result<AnalyzerResult> {
        let engine = LanguageContextEngine::new(
            input.config.max_contexts,
            input.config.enable_context_inheritance,
        );
        let analysis = engine.detect(&input.doc);

        let languages = analysis.languages.clone();
        let confidence = analysis.overall_confidence;
        let sources: Vec<String> = languages
            .iter()
            .flat_map(|l| l.sources.iter().cloned())
            .collect();

        input.context.publish_language(Arc::new(analysis));

        Ok(AnalyzerResult::new(
            AnalyzerData::Languages(languages),
            confidence,
            sources,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::test_support;

    #[test]
    fn test_publishes_contexts_to_shared_state() {
        let input = test_support::input("```rust\nfn main() {}\n```\n");
        let result = LanguageDetector::new().analyze(&input).unwrap();
        assert!(result.confidence > 0.0);
        let published = input.context.language().expect("analysis published");
        assert!(!published.all_contexts().is_empty());
    }

    #[test]
    fn test_no_indicators_is_empty_not_error() {
        let input = test_support::input("plain prose only\n");
        let result = LanguageDetector::new().analyze(&input).unwrap();
        assert_eq!(result.confidence, 0.0);
        assert!(result.sources.is_empty());
        match result.data {
            AnalyzerData::Languages(l) => assert!(l.is_empty()),
            other => panic!("unexpected payload {other:?}"),
        }
    }
}
