//! Integration tests for the full analysis pipeline.
//!
//! These tests run the whole analyzer set against the markdown fixtures in
//! testdata/ and check the end-to-end properties: bounded confidences,
//! graceful degradation, cache transparency, and analyzer composition.

use std::path::PathBuf;
use std::sync::Arc;

use docsift::analyzers::{names, AnalysisInput, Analyzer};
use docsift::project::{AnalyzerResult, CommandCategory};
use docsift::{AnalyzerConfig, DocumentAnalyzer, ParseResult};

fn testdata_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("testdata")
}

fn fixture(name: &str) -> String {
    std::fs::read_to_string(testdata_path().join(name)).expect("should read fixture")
}

fn analyze_fixture(name: &str) -> ParseResult {
    DocumentAnalyzer::new().analyze(&fixture(name))
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

#[test]
fn test_confidences_within_bounds() {
    let result = analyze_fixture("rust-project.md");
    let info = result.data.expect("should produce data");

    let report = &info.confidence;
    assert!((0.0..=1.0).contains(&report.overall));
    for (domain, value) in &report.per_domain {
        assert!((0.0..=1.0).contains(value), "{domain} out of range: {value}");
    }
    for lang in &info.languages {
        assert!((0.0..=1.0).contains(&lang.confidence));
        assert!(!lang.sources.is_empty(), "confident finding needs sources");
    }
    for cmd in &info.commands {
        assert!((0.0..=1.0).contains(&cmd.confidence));
    }
    for fw in &info.testing.frameworks {
        assert!((0.0..=1.0).contains(&fw.confidence));
    }
}

#[test]
fn test_empty_document_succeeds_with_empty_model() {
    let result = DocumentAnalyzer::new().analyze("");
    assert!(result.success);
    assert!(result.errors.is_empty());

    let info = result.data.expect("empty input still yields a model");
    assert!(info.languages.is_empty());
    assert!(info.commands.is_empty());
    assert!(info.dependencies.manifests.is_empty());
    assert!(info.testing.frameworks.is_empty());
    assert_eq!(info.confidence.overall, 0.0);
}

#[test]
fn test_cache_is_semantically_transparent() {
    let text = fixture("rust-project.md");

    let cached = DocumentAnalyzer::new();
    let first = cached.analyze(&text);
    let second = cached.analyze(&text);
    assert_eq!(first, second);

    let uncached = DocumentAnalyzer::with_config(AnalyzerConfig {
        enable_caching: false,
        ..Default::default()
    });
    assert_eq!(first, uncached.analyze(&text));
}

#[test]
fn test_rust_readme_detection() {
    let result = analyze_fixture("rust-project.md");
    assert!(result.success);
    let info = result.data.expect("should produce data");

    let rust = info
        .languages
        .iter()
        .find(|l| l.name == "Rust")
        .expect("Rust should be detected");
    assert!(rust.confidence > 0.5, "got {}", rust.confidence);

    let build = info
        .commands
        .iter()
        .find(|c| c.command == "cargo build")
        .expect("build command");
    assert_eq!(build.category, CommandCategory::Build);
    assert_eq!(build.language.as_deref(), Some("Rust"));

    let test = info
        .commands
        .iter()
        .find(|c| c.command == "cargo test")
        .expect("test command");
    assert_eq!(test.category, CommandCategory::Test);

    assert!(info
        .dependencies
        .manifests
        .iter()
        .any(|m| m.manager == "cargo"));
}

#[test]
fn test_polyglot_managers_and_languages() {
    let result = analyze_fixture("polyglot.md");
    let info = result.data.expect("should produce data");

    let managers: Vec<&str> = info
        .dependencies
        .manifests
        .iter()
        .map(|m| m.manager.as_str())
        .collect();
    assert!(managers.contains(&"npm"), "managers: {managers:?}");
    assert!(managers.contains(&"pip"), "managers: {managers:?}");

    let languages: Vec<&str> = info.languages.iter().map(|l| l.name.as_str()).collect();
    assert!(languages.contains(&"JavaScript"), "languages: {languages:?}");
    assert!(languages.contains(&"Python"), "languages: {languages:?}");
}

#[test]
fn test_malformed_document_recovers() {
    let result = analyze_fixture("malformed.md");
    assert!(result.success, "malformed input degrades, never fails");
    assert!(
        !result.warnings.is_empty(),
        "recoveries should be reported as warnings"
    );

    // The unterminated fence still contributes language evidence.
    let info = result.data.expect("should produce data");
    assert!(info.languages.iter().any(|l| l.name == "Python"));
}

#[test]
fn test_failing_custom_analyzer_does_not_block_others() {
    let mut analyzer = DocumentAnalyzer::new();
    analyzer
        .register_analyzer(Arc::new(ThrowingAnalyzer))
        .expect("registration should succeed");

    let result = analyzer.analyze(&fixture("rust-project.md"));
    assert!(result.success, "isolated failure keeps partial success");
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].analyzer(), Some("throwing"));

    let info = result.data.expect("other analyzers still ran");
    assert!(info.languages.iter().any(|l| l.name == "Rust"));
}

#[test]
fn test_removing_evidence_never_raises_confidence() {
    let full = fixture("rust-project.md");
    let reduced = full.replace("cargo test\n", "");
    assert_ne!(full, reduced);

    let analyzer = DocumentAnalyzer::new();
    let conf_of = |text: &str| {
        analyzer
            .analyze(text)
            .data
            .and_then(|i| i.languages.iter().find(|l| l.name == "Rust").map(|l| l.confidence))
            .unwrap_or(0.0)
    };

    assert!(conf_of(&full) >= conf_of(&reduced));
}

#[test]
fn test_register_unregister_round_trip() {
    let mut analyzer = DocumentAnalyzer::new();
    let original = analyzer.analyzer_names();

    analyzer
        .register_analyzer(Arc::new(ThrowingAnalyzer))
        .expect("registration should succeed");
    assert!(analyzer.unregister_analyzer("throwing"));
    assert_eq!(analyzer.analyzer_names(), original);

    // reset() rebuilds the default set too.
    analyzer
        .register_analyzer(Arc::new(ThrowingAnalyzer))
        .expect("registration should succeed");
    assert!(analyzer.unregister_analyzer(names::METADATA));
    analyzer.reset();
    assert_eq!(analyzer.analyzer_names(), original);
}

#[test]
fn test_config_file_clamps_out_of_range_values() {
    let config = AnalyzerConfig::parse_file(testdata_path().join("config.yaml"))
        .expect("should parse config");
    let validated = config.validate();

    assert_eq!(validated.confidence_threshold, 1.0);
    assert_eq!(validated.max_contexts, 50);
    assert_eq!(validated.timeout_ms, 30_000);
    assert_eq!(validated.diagnostics.len(), 3);
}
