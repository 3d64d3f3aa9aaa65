//! Testing framework detection.
//!
//! Recognizes named frameworks and tools from prose mentions, commands and
//! config-file references, and ties each to the language it targets. The
//! built-in runners (`cargo test`, `go test`) count as frameworks too so a
//! Rust or Go project is not reported as untested.

use once_cell::sync::Lazy;
use regex::Regex;

use super::{names, AnalysisInput, Analyzer};
use crate::evidence::{self, Evidence, EvidenceKind};
use crate::language::indicators;
use crate::project::{AnalyzerData, AnalyzerResult, TestFramework, TestingInfo};

static WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Za-z][A-Za-z0-9_.-]*").unwrap());
static FILE_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Za-z0-9_.][A-Za-z0-9_./-]*\.[A-Za-z0-9]+").unwrap());
static BUILTIN_RUNNER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(cargo test|go test|mix test)\b").unwrap());

/// Built-in test runners to (framework name, language).
fn builtin_runner(cmd: &str) -> Option<(&'static str, &'static str)> {
    match cmd {
        "cargo test" => Some(("cargo test", "Rust")),
        "go test" => Some(("go testing", "Go")),
        "mix test" => Some(("ExUnit", "Elixir")),
        _ => None,
    }
}

pub struct TestingAnalyzer;

impl TestingAnalyzer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TestingAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

/// Accumulates evidence per framework before scoring.
struct FrameworkEntry {
    name: String,
    language: String,
    evidence: Vec<Evidence>,
}

impl Analyzer for TestingAnalyzer {
    fn name(&self) -> &str {
        names::TESTING
    }

    fn dependencies(&self) -> Vec<String> {
        vec![names::LANGUAGE_DETECTOR.to_string()]
    }

    fn analyze(&self, input: &AnalysisInput) -> anyhow::Result<AnalyzerResult> {
        let mut entries: Vec<FrameworkEntry> = Vec::new();
        let mut config_files: Vec<String> = Vec::new();

        for block in &input.doc.blocks {
            let text = block.text();
            let span = block.span;
            let in_code = block.is_code_fence();

            // Named frameworks, in code or prose.
            for m in WORD.find_iter(&text) {
                let word = m.as_str().to_ascii_lowercase();
                let word = word.trim_end_matches(['.', ',']);
                if let Some((framework, language)) = indicators::TEST_FRAMEWORKS.get(word)
                {
                    let kind = if in_code {
                        EvidenceKind::CommandTool
                    } else {
                        EvidenceKind::TextMention
                    };
                    add_evidence(
                        &mut entries,
                        framework,
                        language,
                        Evidence::new(kind, m.as_str(), span),
                    );
                }
            }

            // Built-in runners are two-word commands, missed by word scan.
            for m in BUILTIN_RUNNER.find_iter(&text) {
                if let Some((framework, language)) = builtin_runner(m.as_str()) {
                    add_evidence(
                        &mut entries,
                        framework,
                        language,
                        Evidence::new(EvidenceKind::CommandTool, m.as_str(), span),
                    );
                }
            }

            // Config files pin down the framework with high precision.
            for m in FILE_TOKEN.find_iter(&text) {
                let base = m
                    .as_str()
                    .rsplit('/')
                    .next()
                    .unwrap_or(m.as_str())
                    .to_ascii_lowercase();
                if let Some((framework, language)) =
                    indicators::TEST_CONFIG_FILES.get(base.as_str())
                {
                    if !config_files.contains(&base) {
                        config_files.push(base.clone());
                    }
                    add_evidence(
                        &mut entries,
                        framework,
                        language,
                        Evidence::new(EvidenceKind::ConfigFile, &base, span),
                    );
                }
            }
        }

        let frameworks: Vec<TestFramework> = entries
            .iter()
            .map(|e| TestFramework {
                name: e.name.clone(),
                language: e.language.clone(),
                confidence: evidence::score(&e.evidence),
                sources: e.evidence.iter().map(|ev| ev.source()).collect(),
            })
            .collect();

        let confidence = evidence::combine(
            &frameworks.iter().map(|f| f.confidence).collect::<Vec<_>>(),
        );
        let sources: Vec<String> = frameworks
            .iter()
            .flat_map(|f| f.sources.iter().cloned())
            .collect();

        let info = TestingInfo {
            frameworks,
            config_files,
            confidence,
            sources: sources.clone(),
        };

        Ok(AnalyzerResult::new(
            AnalyzerData::Testing(info),
            confidence,
            sources,
        ))
    }
}

fn add_evidence(
    entries: &mut Vec<FrameworkEntry>,
    name: &str,
    language: &str,
    evidence: Evidence,
) {
    match entries.iter_mut().find(|e| e.name == name) {
        Some(entry) => entry.evidence.push(evidence),
        None => entries.push(FrameworkEntry {
            name: name.to_string(),
            language: language.to_string(),
            evidence: vec![evidence],
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::test_support;

    fn run(text: &str) -> TestingInfo {
        let result = TestingAnalyzer::new()
            .analyze(&test_support::input(text))
            .unwrap();
        match result.data {
            AnalyzerData::Testing(t) => t,
            other => panic!("unexpected payload {other:?}"),
        }
    }

    #[test]
    fn test_framework_from_command() {
        let info = run("# X\n\n```bash\npytest tests/\n```\n");
        let fw = info.frameworks.iter().find(|f| f.name == "pytest").unwrap();
        assert_eq!(fw.language, "Python");
        assert!(fw.confidence > 0.0);
    }

    #[test]
    fn test_framework_from_config_file() {
        let info = run("# X\n\nTests are configured in jest.config.js.\n");
        let fw = info.frameworks.iter().find(|f| f.name == "Jest").unwrap();
        assert_eq!(fw.language, "JavaScript");
        assert!(info.config_files.contains(&"jest.config.js".to_string()));
    }

    #[test]
    fn test_builtin_runners_recognized() {
        let info = run("# X\n\n```bash\ncargo test\ngo test ./...\n```\n");
        let names: Vec<&str> = info.frameworks.iter().map(|f| f.name.as_str()).collect();
        assert!(names.contains(&"cargo test"));
        assert!(names.contains(&"go testing"));
    }

    #[test]
    fn test_mention_plus_config_beats_mention_alone() {
        let mention_only = run("# X\n\nWe test with Jest.\n");
        let with_config = run("# X\n\nWe test with Jest, see jest.config.js.\n");
        let a = mention_only.frameworks.first().unwrap().confidence;
        let b = with_config.frameworks.first().unwrap().confidence;
        assert!(b > a);
    }

    #[test]
    fn test_no_findings_is_empty_zero() {
        let info = run("# X\n\nNo tests mentioned at all.\n");
        assert_eq!(info.confidence, 0.0);
        assert!(info.frameworks.is_empty());
        assert!(info.config_files.is_empty());
        assert!(info.sources.is_empty());
    }
}
