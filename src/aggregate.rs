//! Result aggregation and cross-analyzer validation.
//!
//! Merges the partial results of all analyzers into one `ProjectInfo`,
//! checks that declared producer→consumer relationships actually exhibit
//! propagation, and computes an overall confidence that is explicitly
//! penalized when validation issues exist. A failed or low-quality analyzer
//! becomes a validation issue, never a silent omission.

use std::collections::HashMap;

use crate::config::ValidatedConfig;
use crate::error::AnalysisError;
use crate::project::{
    AggregatedResult, AnalyzerData, ConfidenceReport, DataFlowCheck, EnhancedAnalyzerResult,
    IntegrationMetadata, IssueSeverity, ProjectInfo, ValidationIssue, ValidationStatus,
};

/// Domain weights for the overall confidence. Languages and commands carry
/// the most signal for CI/CD generation; metadata the least.
mod domain_weights {
    pub const LANGUAGES: f64 = 0.30;
    pub const COMMANDS: f64 = 0.25;
    pub const DEPENDENCIES: f64 = 0.20;
    pub const TESTING: f64 = 0.15;
    pub const METADATA: f64 = 0.10;
    pub const CUSTOM: f64 = 0.10;
}

/// Confidence penalty per validation issue.
pub const SOFT_ISSUE_PENALTY: f64 = 0.05;
pub const HARD_ISSUE_PENALTY: f64 = 0.15;

fn weight_for(data: &AnalyzerData) -> f64 {
    match data {
        AnalyzerData::Languages(_) => domain_weights::LANGUAGES,
        AnalyzerData::Commands(_) => domain_weights::COMMANDS,
        AnalyzerData::Dependencies(_) => domain_weights::DEPENDENCIES,
        AnalyzerData::Testing(_) => domain_weights::TESTING,
        AnalyzerData::Metadata(_) => domain_weights::METADATA,
        AnalyzerData::Custom(_) => domain_weights::CUSTOM,
    }
}

/// Merges analyzer outputs into one validated project model.
pub struct Aggregator;

impl Aggregator {
    /// Aggregate all analyzer outputs.
    ///
    /// `edges` are the declared producer→consumer pairs among analyzers
    /// that were scheduled; `failures` are the isolated per-analyzer
    /// errors recorded by the pipeline.
    pub fn aggregate(
        results: &[EnhancedAnalyzerResult],
        failures: &[AnalysisError],
        edges: &[(String, String)],
        config: &ValidatedConfig,
    ) -> AggregatedResult {
        let mut info = ProjectInfo::default();
        let mut issues: Vec<ValidationIssue> = Vec::new();
        let mut per_domain: HashMap<String, f64> = HashMap::new();

        for enhanced in results {
            let result = &enhanced.result;
            per_domain.insert(enhanced.analyzer.clone(), result.confidence);

            // Invariant: sources non-empty iff confidence > 0.
            if result.confidence > 0.0 && result.sources.is_empty() {
                issues.push(ValidationIssue {
                    severity: IssueSeverity::Soft,
                    message: format!(
                        "analyzer {:?} reported confidence {:.2} with no sources",
                        enhanced.analyzer, result.confidence
                    ),
                    analyzer: Some(enhanced.analyzer.clone()),
                });
            }

            match &result.data {
                AnalyzerData::Metadata(m) => info.metadata = m.clone(),
                AnalyzerData::Languages(langs) => {
                    for lang in langs {
                        if lang.confidence < config.confidence_threshold {
                            issues.push(ValidationIssue {
                                severity: IssueSeverity::Soft,
                                message: format!(
                                    "language {:?} dropped: confidence {:.2} below threshold {:.2}",
                                    lang.name, lang.confidence, config.confidence_threshold
                                ),
                                analyzer: Some(enhanced.analyzer.clone()),
                            });
                        } else {
                            info.languages.push(lang.clone());
                        }
                    }
                }
                AnalyzerData::Dependencies(d) => info.dependencies = d.clone(),
                AnalyzerData::Commands(c) => info.commands = c.clone(),
                AnalyzerData::Testing(t) => info.testing = t.clone(),
                AnalyzerData::Custom(_) => {}
            }
        }

        // Failed analyzers are visible, not silently dropped.
        for failure in failures {
            let name = failure.analyzer().unwrap_or("pipeline").to_string();
            per_domain.entry(name.clone()).or_insert(0.0);
            issues.push(ValidationIssue {
                severity: IssueSeverity::Soft,
                message: failure.to_string(),
                analyzer: Some(name),
            });
        }

        let data_flow = validate_data_flow(results, failures, edges, &info, &mut issues);

        let is_valid = !issues
            .iter()
            .any(|i| i.severity == IssueSeverity::Hard);

        let overall = overall_confidence(results, &issues);
        info.confidence = ConfidenceReport {
            overall,
            per_domain,
        };

        let analyzers_run = results.iter().map(|r| r.analyzer.clone()).collect();
        let analyzers_failed = failures
            .iter()
            .filter_map(|f| f.analyzer().map(|a| a.to_string()))
            .collect();
        let total_time_ms = results.iter().map(|r| r.metadata.processing_time_ms).sum();

        AggregatedResult {
            project_info: info,
            validation: ValidationStatus { is_valid, issues },
            integration: IntegrationMetadata {
                data_flow,
                analyzers_run,
                analyzers_failed,
                total_time_ms,
            },
        }
    }
}

/// Check that each declared producer→consumer edge shows propagation.
fn validate_data_flow(
    results: &[EnhancedAnalyzerResult],
    failures: &[AnalysisError],
    edges: &[(String, String)],
    info: &ProjectInfo,
    issues: &mut Vec<ValidationIssue>,
) -> Vec<DataFlowCheck> {
    let ran = |name: &str| results.iter().any(|r| r.analyzer == name);
    let failed = |name: &str| failures.iter().any(|f| f.analyzer() == Some(name));
    let mut checks = Vec::new();

    for (producer, consumer) in edges {
        if !ran(consumer) {
            continue;
        }

        // A producer that neither ran nor failed is missing from the
        // pipeline entirely; that breaks the declared contract.
        if !ran(producer) && !failed(producer) {
            issues.push(ValidationIssue {
                severity: IssueSeverity::Hard,
                message: format!(
                    "required producer {:?} for {:?} is missing from the pipeline",
                    producer, consumer
                ),
                analyzer: Some(consumer.clone()),
            });
            checks.push(DataFlowCheck {
                producer: producer.clone(),
                consumer: consumer.clone(),
                propagated: false,
            });
            continue;
        }

        let propagated = edge_propagated(producer, consumer, info);
        if !propagated {
            issues.push(ValidationIssue {
                severity: IssueSeverity::Soft,
                message: format!(
                    "output of {:?} shows no propagation into {:?} results",
                    producer, consumer
                ),
                analyzer: Some(consumer.clone()),
            });
        }
        checks.push(DataFlowCheck {
            producer: producer.clone(),
            consumer: consumer.clone(),
            propagated,
        });
    }

    checks
}

/// Whether consumer output observably reflects producer output. Vacuously
/// true when either side found nothing to propagate.
fn edge_propagated(producer: &str, consumer: &str, info: &ProjectInfo) -> bool {
    use crate::analyzers::names;

    if producer != names::LANGUAGE_DETECTOR || info.languages.is_empty() {
        return true;
    }
    match consumer {
        names::COMMANDS => {
            info.commands.is_empty() || info.commands.iter().any(|c| c.language.is_some())
        }
        names::TESTING => {
            info.testing.frameworks.is_empty()
                || info
                    .testing
                    .frameworks
                    .iter()
                    .any(|f| info.languages.iter().any(|l| l.name == f.language))
        }
        _ => true,
    }
}

/// Weighted per-domain average, penalized per validation issue.
///
/// The penalty keeps the overall measurably below the naive average
/// whenever analyzers disagree or upstream data is poor, even if one
/// analyzer individually reports high confidence.
fn overall_confidence(results: &[EnhancedAnalyzerResult], issues: &[ValidationIssue]) -> f64 {
    let mut weighted = 0.0;
    let mut total_weight = 0.0;
    for r in results {
        let w = weight_for(&r.result.data);
        weighted += r.result.confidence * w;
        total_weight += w;
    }
    if total_weight == 0.0 {
        return 0.0;
    }

    let mut overall = weighted / total_weight;
    for issue in issues {
        overall -= match issue.severity {
            IssueSeverity::Hard => HARD_ISSUE_PENALTY,
            IssueSeverity::Soft => SOFT_ISSUE_PENALTY,
        };
    }
    overall.clamp(0.0, 1.0)
}
