//! Integration pipeline: analyzer registry, dependency-ordered concurrent
//! execution, per-analyzer failure isolation and timeout handling.
//!
//! One `execute()` call is a bounded unit of work: parse (cached), build
//! the shared analysis context, run analyzers level by level on the tokio
//! runtime, and hand the collected results to the aggregator. An exception
//! inside one analyzer never aborts its siblings; dependents of a failed
//! analyzer observe the failure through the context and degrade.

mod schedule;

pub use schedule::levels;

use std::sync::Arc;
use std::time::Instant;

use futures::future::join_all;

use crate::analyzers::{AnalysisContext, AnalysisInput, Analyzer};
use crate::config::ValidatedConfig;
use crate::error::{AnalysisError, RegistrationError};
use crate::parser::DocumentParser;
use crate::project::{AnalyzerData, EnhancedAnalyzerResult, ResultMetadata};

/// Raw pipeline output, before aggregation.
#[derive(Debug)]
pub struct PipelineResult {
    pub results: Vec<EnhancedAnalyzerResult>,
    pub failures: Vec<AnalysisError>,
    /// Declared producer→consumer edges among scheduled analyzers.
    pub edges: Vec<(String, String)>,
    /// Parse-level recovery notes.
    pub warnings: Vec<String>,
}

/// Analyzer registry plus execution engine.
pub struct Pipeline {
    analyzers: Vec<Arc<dyn Analyzer>>,
    parser: DocumentParser,
    config: Arc<ValidatedConfig>,
}

impl Pipeline {
    pub fn new(config: ValidatedConfig) -> Self {
        let parser = DocumentParser::new(config.enable_caching);
        Self {
            analyzers: Vec::new(),
            parser,
            config: Arc::new(config),
        }
    }

    /// Register an analyzer. The contract is validated structurally up
    /// front; a rejected analyzer is never partially registered.
    pub fn register(&mut self, analyzer: Arc<dyn Analyzer>) -> Result<(), RegistrationError> {
        let name = analyzer.name().to_string();
        if name.trim().is_empty() {
            return Err(RegistrationError::EmptyName);
        }
        if self.analyzers.iter().any(|a| a.name() == name) {
            return Err(RegistrationError::DuplicateName(name));
        }
        if analyzer.dependencies().iter().any(|d| *d == name) {
            return Err(RegistrationError::SelfDependency(name));
        }
        log::debug!("registered analyzer {:?}", name);
        self.analyzers.push(analyzer);
        Ok(())
    }

    /// Remove an analyzer by name. Returns whether one was removed.
    pub fn unregister(&mut self, name: &str) -> bool {
        let before = self.analyzers.len();
        self.analyzers.retain(|a| a.name() != name);
        before != self.analyzers.len()
    }

    /// Registered analyzer names, in registration order.
    pub fn analyzer_names(&self) -> Vec<String> {
        self.analyzers.iter().map(|a| a.name().to_string()).collect()
    }

    pub fn config(&self) -> &ValidatedConfig {
        &self.config
    }

    /// Invoke `cleanup` on every registered analyzer.
    pub fn cleanup(&self) {
        for analyzer in &self.analyzers {
            analyzer.cleanup();
        }
    }

    /// Run the full pipeline over `text`.
    ///
    /// `Err` is reserved for fatal conditions (input contract, dependency
    /// cycle); everything else is isolated inside the result.
    pub async fn execute(&self, text: &str) -> Result<PipelineResult, AnalysisError> {
        if text.contains('\0') {
            return Err(AnalysisError::InvalidInput {
                reason: "content contains NUL bytes; not a text document".to_string(),
            });
        }

        let doc = self.parser.parse(text);
        let warnings: Vec<String> = doc
            .diagnostics
            .iter()
            .map(|d| format!("line {}: {}", d.line, d.message))
            .collect();

        let declared: Vec<(String, Vec<String>)> = self
            .analyzers
            .iter()
            .map(|a| (a.name().to_string(), a.dependencies()))
            .collect();
        let plan = schedule::levels(&declared)?;

        let edges: Vec<(String, String)> = declared
            .iter()
            .flat_map(|(name, deps)| {
                deps.iter().map(move |d| (d.clone(), name.clone()))
            })
            .collect();

        let context = Arc::new(AnalysisContext::new());
        // Dependencies nobody registered behave as failed upstreams.
        for missing in schedule::missing_dependencies(&declared) {
            log::warn!("dependency {:?} is not registered; dependents degrade", missing);
            context.mark_failed(&missing);
        }

        let input = AnalysisInput {
            doc,
            context: Arc::clone(&context),
            config: Arc::clone(&self.config),
        };

        let deadline =
            tokio::time::Instant::now() + std::time::Duration::from_millis(self.config.timeout_ms);
        let mut results = Vec::new();
        let mut failures = Vec::new();

        for level in plan {
            let tasks: Vec<_> = level
                .into_iter()
                .filter_map(|name| {
                    // Scheduled names come from the registry.
                    let analyzer = self.analyzers.iter().find(|a| a.name() == name).cloned()?;
                    let input = input.clone();
                    let monitor = self.config.enable_performance_monitoring;
                    Some(async move {
                        let handle = tokio::task::spawn_blocking(move || {
                            let started = Instant::now();
                            let outcome = analyzer.analyze(&input);
                            (outcome, started.elapsed().as_millis() as u64)
                        });
                        let joined = tokio::time::timeout_at(deadline, handle).await;
                        (name, monitor, joined)
                    })
                })
                .collect();

            for (name, monitor, joined) in join_all(tasks).await {
                match joined {
                    Err(_) => {
                        // The task keeps nothing alive worth waiting for;
                        // the invocation is abandoned and reported.
                        let err = AnalysisError::Timeout {
                            analyzer: name.clone(),
                            elapsed_ms: self.config.timeout_ms,
                        };
                        log::warn!("{}", err);
                        context.mark_failed(&name);
                        failures.push(err);
                    }
                    Ok(Err(join_err)) => {
                        let message = if join_err.is_panic() {
                            "analyzer panicked".to_string()
                        } else {
                            join_err.to_string()
                        };
                        let err = AnalysisError::AnalyzerFailed {
                            analyzer: name.clone(),
                            message,
                        };
                        log::warn!("{}", err);
                        context.mark_failed(&name);
                        failures.push(err);
                    }
                    Ok(Ok((Err(analyze_err), _))) => {
                        let err = AnalysisError::AnalyzerFailed {
                            analyzer: name.clone(),
                            message: analyze_err.to_string(),
                        };
                        log::warn!("{}", err);
                        context.mark_failed(&name);
                        failures.push(err);
                    }
                    Ok(Ok((Ok(result), elapsed_ms))) => {
                        let metadata = ResultMetadata {
                            processing_time_ms: if monitor { elapsed_ms } else { 0 },
                            data_quality: result.confidence,
                            completeness: completeness(&result.data),
                        };
                        results.push(EnhancedAnalyzerResult {
                            analyzer: name,
                            result,
                            metadata,
                        });
                    }
                }
            }
        }

        Ok(PipelineResult {
            results,
            failures,
            edges,
            warnings,
        })
    }

    /// Byte-level entry point. Content that is not valid UTF-8 violates the
    /// input contract the same way interior NUL bytes do.
    pub async fn execute_bytes(&self, bytes: &[u8]) -> Result<PipelineResult, AnalysisError> {
        let text = std::str::from_utf8(bytes).map_err(|e| AnalysisError::InvalidInput {
            reason: format!("content is not valid UTF-8: {}", e),
        })?;
        self.execute(text).await
    }

    /// Synchronous wrapper around [`execute`](Self::execute).
    pub fn execute_blocking(&self, text: &str) -> Result<PipelineResult, AnalysisError> {
        let runtime = tokio::runtime::Runtime::new().map_err(|e| AnalysisError::Runtime {
            message: format!("failed to start runtime: {}", e),
        })?;
        runtime.block_on(self.execute(text))
    }
}

/// Fraction of a payload's result fields that are populated.
fn completeness(data: &AnalyzerData) -> f64 {
    match data {
        AnalyzerData::Metadata(m) => {
            let populated = [
                m.title.is_some(),
                m.description.is_some(),
                !m.env_vars.is_empty(),
                !m.file_mentions.is_empty(),
            ]
            .iter()
            .filter(|p| **p)
            .count();
            populated as f64 / 4.0
        }
        AnalyzerData::Dependencies(d) => {
            let populated = [
                !d.manifests.is_empty(),
                !d.packages.is_empty(),
                !d.install_commands.is_empty(),
            ]
            .iter()
            .filter(|p| **p)
            .count();
            populated as f64 / 3.0
        }
        AnalyzerData::Testing(t) => {
            let populated = [!t.frameworks.is_empty(), !t.config_files.is_empty()]
                .iter()
                .filter(|p| **p)
                .count();
            populated as f64 / 2.0
        }
        AnalyzerData::Languages(l) => {
            if l.is_empty() {
                0.0
            } else {
                1.0
            }
        }
        AnalyzerData::Commands(c) => {
            if c.is_empty() {
                0.0
            } else {
                1.0
            }
        }
        AnalyzerData::Custom(v) => {
            if v.is_null() {
                0.0
            } else {
                1.0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::{builtin_analyzers, names};
    use crate::project::AnalyzerResult;

    fn pipeline() -> Pipeline {
        let mut p = Pipeline::new(ValidatedConfig::default());
        for analyzer in builtin_analyzers() {
            p.register(analyzer).unwrap();
        }
        p
    }

    struct ThrowingAnalyzer;

    impl Analyzer for ThrowingAnalyzer {
        fn name(&self) -> &str {
            "throwing"
        }
        fn analyze(&self, _input: &AnalysisInput) -> anyhow::Result<AnalyzerResult> {
            anyhow::bail!("synthetic failure")
        }
    }

    struct PanickingAnalyzer;

    impl Analyzer for PanickingAnalyzer {
        fn name(&self) -> &str {
            "panicking"
        }
        fn analyze(&self, _input: &AnalysisInput) -> anyhow::Result<AnalyzerResult> {
            panic!("synthetic panic")
        }
    }

    struct SlowAnalyzer;

    impl Analyzer for SlowAnalyzer {
        fn name(&self) -> &str {
            "slow"
        }
        // Scheduled in the last level so its timeout cannot eat the
        // shared deadline out from under earlier levels.
        fn dependencies(&self) -> Vec<String> {
            vec![names::LANGUAGE_DETECTOR.to_string()]
        }
        fn analyze(&self, _input: &AnalysisInput) -> anyhow::Result<AnalyzerResult> {
            std::thread::sleep(std::time::Duration::from_millis(1000));
            Ok(AnalyzerResult::empty(AnalyzerData::Custom(
                serde_json::Value::Null,
            )))
        }
    }

    struct SelfDependent;

    impl Analyzer for SelfDependent {
        fn name(&self) -> &str {
            "selfish"
        }
        fn dependencies(&self) -> Vec<String> {
            vec!["selfish".to_string()]
        }
        fn analyze(&self, _input: &AnalysisInput) -> anyhow::Result<AnalyzerResult> {
            Ok(AnalyzerResult::empty(AnalyzerData::Custom(
                serde_json::Value::Null,
            )))
        }
    }

    #[test]
    fn test_registration_validation() {
        let mut p = Pipeline::new(ValidatedConfig::default());
        assert_eq!(
            p.register(Arc::new(SelfDependent)),
            Err(RegistrationError::SelfDependency("selfish".to_string()))
        );
        p.register(Arc::new(ThrowingAnalyzer)).unwrap();
        assert_eq!(
            p.register(Arc::new(ThrowingAnalyzer)),
            Err(RegistrationError::DuplicateName("throwing".to_string()))
        );
    }

    #[test]
    fn test_register_unregister_round_trip() {
        let mut p = pipeline();
        let original = p.analyzer_names();
        p.register(Arc::new(ThrowingAnalyzer)).unwrap();
        assert_ne!(p.analyzer_names(), original);
        assert!(p.unregister("throwing"));
        assert_eq!(p.analyzer_names(), original);
        assert!(!p.unregister("throwing"));
    }

    #[tokio::test]
    async fn test_nul_input_is_contract_violation() {
        let p = pipeline();
        let err = p.execute("abc\0def").await.unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidInput { .. }));
    }

    #[tokio::test]
    async fn test_invalid_utf8_is_contract_violation() {
        let p = pipeline();
        let err = p.execute_bytes(&[0xff, 0xfe, 0x61]).await.unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidInput { .. }));
        assert!(p.execute_bytes(b"# App\n").await.is_ok());
    }

    #[tokio::test]
    async fn test_failing_analyzer_is_isolated() {
        let mut p = pipeline();
        p.register(Arc::new(ThrowingAnalyzer)).unwrap();
        let out = p
            .execute("# App\n\n```rust\nfn main() {}\n```\n")
            .await
            .unwrap();
        assert_eq!(out.failures.len(), 1);
        assert_eq!(out.failures[0].analyzer(), Some("throwing"));
        // All five built-ins still produced results.
        assert_eq!(out.results.len(), 5);
    }

    #[tokio::test]
    async fn test_panicking_analyzer_is_isolated() {
        let mut p = pipeline();
        p.register(Arc::new(PanickingAnalyzer)).unwrap();
        let out = p.execute("# App\n").await.unwrap();
        assert_eq!(out.failures.len(), 1);
        assert!(matches!(
            out.failures[0],
            AnalysisError::AnalyzerFailed { .. }
        ));
        assert_eq!(out.results.len(), 5);
    }

    #[tokio::test]
    async fn test_slow_analyzer_times_out() {
        let config = crate::config::AnalyzerConfig {
            timeout_ms: 100,
            ..Default::default()
        }
        .validate();
        let mut p = Pipeline::new(config);
        for analyzer in builtin_analyzers() {
            p.register(analyzer).unwrap();
        }
        p.register(Arc::new(SlowAnalyzer)).unwrap();
        let out = p.execute("# App\n").await.unwrap();
        assert!(out.failures.iter().any(
            |f| matches!(f, AnalysisError::Timeout { analyzer, elapsed_ms: 100 } if analyzer.as_str() == "slow")
        ));
        // The deadline is per invocation; siblings that finished in time
        // still report.
        assert_eq!(out.results.len(), 5);
    }

    #[tokio::test]
    async fn test_dependents_degrade_when_upstream_missing() {
        let mut p = pipeline();
        assert!(p.unregister(names::LANGUAGE_DETECTOR));
        let out = p
            .execute("```rust\nfn main() {}\n```\n\n```bash\ncargo build\n```\n")
            .await
            .unwrap();
        let commands = out
            .results
            .iter()
            .find(|r| r.analyzer == names::COMMANDS)
            .expect("commands still ran");
        match &commands.result.data {
            AnalyzerData::Commands(cmds) => {
                assert!(cmds.iter().all(|c| c.language.is_none()));
            }
            other => panic!("unexpected payload {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_empty_input_runs_clean() {
        let p = pipeline();
        let out = p.execute("").await.unwrap();
        assert!(out.failures.is_empty());
        assert_eq!(out.results.len(), 5);
        for r in &out.results {
            assert_eq!(r.result.confidence, 0.0);
        }
    }

    #[test]
    fn test_execute_blocking_matches_async() {
        let p = pipeline();
        let out = p.execute_blocking("# App\n").unwrap();
        assert_eq!(out.results.len(), 5);
    }

    #[tokio::test]
    async fn test_performance_monitoring_toggle() {
        let config = crate::config::AnalyzerConfig {
            enable_performance_monitoring: true,
            ..Default::default()
        }
        .validate();
        let mut p = Pipeline::new(config);
        for analyzer in builtin_analyzers() {
            p.register(analyzer).unwrap();
        }
        let out = p.execute("# App\n").await.unwrap();
        assert_eq!(out.results.len(), 5);
        // Times are recorded (possibly 0ms on fast machines); the off
        // switch is exercised by every other test in this module.
    }
}
