//! The shared project data model.
//!
//! These are the types that cross the boundary to the CI/CD generation
//! subsystem, plus the per-analyzer result envelopes the aggregator
//! consumes. Everything is serde-serializable; collections are present and
//! empty (never absent) when nothing was found.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::parser::Span;

/// Externally visible language summary, distinct from the span-based
/// `LanguageContext` used internally for sharing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanguageInfo {
    pub name: String,
    pub confidence: f64,
    pub sources: Vec<String>,
    pub frameworks: Vec<String>,
}

/// Command categories for CI/CD step mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandCategory {
    Install,
    Build,
    Test,
    Run,
    Other,
}

impl CommandCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandCategory::Install => "install",
            CommandCategory::Build => "build",
            CommandCategory::Test => "test",
            CommandCategory::Run => "run",
            CommandCategory::Other => "other",
        }
    }
}

impl std::fmt::Display for CommandCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One extracted shell command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandInfo {
    pub command: String,
    pub category: CommandCategory,
    /// Language of the covering context, when one corroborates the command.
    pub language: Option<String>,
    pub confidence: f64,
    pub sources: Vec<String>,
    pub span: Span,
}

/// A package manifest mention (`package.json`, `Cargo.toml`, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestInfo {
    pub file: String,
    pub manager: String,
    pub span: Span,
}

/// A named package, tagged with its package manager when determinable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageInfo {
    pub name: String,
    pub manager: Option<String>,
    pub version: Option<String>,
}

/// Dependency findings for the whole document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DependencyInfo {
    pub manifests: Vec<ManifestInfo>,
    pub packages: Vec<PackageInfo>,
    pub install_commands: Vec<String>,
    pub confidence: f64,
    pub sources: Vec<String>,
}

/// A recognized testing framework tied to its target language.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestFramework {
    pub name: String,
    pub language: String,
    pub confidence: f64,
    pub sources: Vec<String>,
}

/// Testing findings for the whole document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TestingInfo {
    pub frameworks: Vec<TestFramework>,
    pub config_files: Vec<String>,
    pub confidence: f64,
    pub sources: Vec<String>,
}

/// Inferred value type of an environment variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvVarType {
    String,
    Number,
    Boolean,
}

/// An environment variable the documentation says the project reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvVarInfo {
    pub name: String,
    pub default: Option<String>,
    pub value_type: EnvVarType,
    /// True when surrounding prose marks it required (or gives no default).
    pub required: bool,
}

/// Project-level metadata extracted from the document head.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectMetadata {
    pub title: Option<String>,
    pub description: Option<String>,
    pub env_vars: Vec<EnvVarInfo>,
    /// File and directory paths the documentation mentions.
    pub file_mentions: Vec<String>,
    pub confidence: f64,
    pub sources: Vec<String>,
}

/// Per-domain confidence report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceReport {
    pub overall: f64,
    pub per_domain: HashMap<String, f64>,
}

/// The validated project model handed to downstream consumers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectInfo {
    pub metadata: ProjectMetadata,
    pub languages: Vec<LanguageInfo>,
    pub dependencies: DependencyInfo,
    pub commands: Vec<CommandInfo>,
    pub testing: TestingInfo,
    pub confidence: ConfidenceReport,
}

/// Typed payload of one analyzer's partial result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "domain", content = "value", rename_all = "snake_case")]
pub enum AnalyzerData {
    Metadata(ProjectMetadata),
    Languages(Vec<LanguageInfo>),
    Dependencies(DependencyInfo),
    Commands(Vec<CommandInfo>),
    Testing(TestingInfo),
    /// Payload of an injected third-party analyzer.
    Custom(serde_json::Value),
}

impl AnalyzerData {
    /// Whether this payload carries any findings at all.
    pub fn is_empty(&self) -> bool {
        match self {
            AnalyzerData::Metadata(m) => {
                m.title.is_none()
                    && m.description.is_none()
                    && m.env_vars.is_empty()
                    && m.file_mentions.is_empty()
            }
            AnalyzerData::Languages(l) => l.is_empty(),
            AnalyzerData::Dependencies(d) => {
                d.manifests.is_empty() && d.packages.is_empty() && d.install_commands.is_empty()
            }
            AnalyzerData::Commands(c) => c.is_empty(),
            AnalyzerData::Testing(t) => t.frameworks.is_empty() && t.config_files.is_empty(),
            AnalyzerData::Custom(v) => v.is_null(),
        }
    }
}

/// One analyzer's output: data plus its own confidence and sources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzerResult {
    pub data: AnalyzerData,
    pub confidence: f64,
    pub sources: Vec<String>,
}

impl AnalyzerResult {
    pub fn new(data: AnalyzerData, confidence: f64, sources: Vec<String>) -> Self {
        Self {
            data,
            confidence,
            sources,
        }
    }

    /// The uniform "no findings" result: confidence exactly 0, empty data.
    pub fn empty(data: AnalyzerData) -> Self {
        Self {
            data,
            confidence: 0.0,
            sources: Vec::new(),
        }
    }
}

/// Quality metadata attached at pipeline time, used by aggregation-time
/// validation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultMetadata {
    /// Wall-clock time of the analyzer invocation; 0 when performance
    /// monitoring is disabled.
    pub processing_time_ms: u64,
    /// The analyzer's own confidence, echoed for validation.
    pub data_quality: f64,
    /// Fraction of the analyzer's result fields that are populated.
    pub completeness: f64,
}

/// `AnalyzerResult` plus the provenance the aggregator needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnhancedAnalyzerResult {
    pub analyzer: String,
    pub result: AnalyzerResult,
    pub metadata: ResultMetadata,
}

/// Severity split for validation findings: hard issues flip `is_valid`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueSeverity {
    Hard,
    Soft,
}

/// One cross-analyzer validation finding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub severity: IssueSeverity,
    pub message: String,
    /// Analyzer the issue is attributed to, when identifiable.
    pub analyzer: Option<String>,
}

/// Validation outcome of aggregation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationStatus {
    pub is_valid: bool,
    pub issues: Vec<ValidationIssue>,
}

impl Default for ValidationStatus {
    fn default() -> Self {
        Self {
            is_valid: true,
            issues: Vec::new(),
        }
    }
}

/// Data-flow check outcome for one producer→consumer edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataFlowCheck {
    pub producer: String,
    pub consumer: String,
    pub propagated: bool,
}

/// Aggregation provenance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IntegrationMetadata {
    pub data_flow: Vec<DataFlowCheck>,
    pub analyzers_run: Vec<String>,
    pub analyzers_failed: Vec<String>,
    pub total_time_ms: u64,
}

/// Full aggregation output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedResult {
    pub project_info: ProjectInfo,
    pub validation: ValidationStatus,
    pub integration: IntegrationMetadata,
}

/// The top-level result every caller gets.
///
/// `success` is false only for input-contract violations or when zero
/// analyzers produced usable data. Partial success with degraded confidence
/// beats hard failure whenever any signal exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParseResult {
    pub success: bool,
    pub data: Option<ProjectInfo>,
    pub errors: Vec<crate::error::AnalysisError>,
    pub warnings: Vec<String>,
}

impl ParseResult {
    pub fn failure(error: crate::error::AnalysisError) -> Self {
        Self {
            success: false,
            data: None,
            errors: vec![error],
            warnings: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_result_has_zero_confidence() {
        let r = AnalyzerResult::empty(AnalyzerData::Commands(Vec::new()));
        assert_eq!(r.confidence, 0.0);
        assert!(r.sources.is_empty());
        assert!(r.data.is_empty());
    }

    #[test]
    fn test_analyzer_data_emptiness() {
        assert!(AnalyzerData::Languages(Vec::new()).is_empty());
        assert!(AnalyzerData::Custom(serde_json::Value::Null).is_empty());
        let lang = LanguageInfo {
            name: "Rust".into(),
            confidence: 0.9,
            sources: vec!["code_block_tag:rust".into()],
            frameworks: Vec::new(),
        };
        assert!(!AnalyzerData::Languages(vec![lang]).is_empty());
    }

    #[test]
    fn test_command_category_round_trip() {
        let json = serde_json::to_string(&CommandCategory::Build).unwrap();
        assert_eq!(json, "\"build\"");
    }
}
