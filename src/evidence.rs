//! Evidence records and the shared confidence model.
//!
//! Every analyzer scores its findings through [`score`], never with ad-hoc
//! math, so "confidence 0.6" means the same thing whether it came from the
//! language engine or the testing analyzer.
//!
//! The combining rule, in order:
//! 1. each evidence kind contributes its base weight once, plus damped
//!    weight for repeats of the same kind;
//! 2. distinct kinds corroborating the same subject apply a diversity
//!    multiplier on top of the sum;
//! 3. any non-empty evidence set is lifted to a floor, because the mere
//!    presence of a recognized signal is informative;
//! 4. the result is capped at 1.0.
//!
//! The curve is monotone: adding evidence never lowers a score, and
//! removing evidence never raises one.

use serde::{Deserialize, Serialize};

use crate::parser::Span;

/// Base weights and combining constants.
///
/// These are empirically tuned against the acceptance scenarios (a single
/// tagged fence plus two corroborating commands must clear 0.5; a lone text
/// mention must not). Tune here, not at call sites.
pub mod weights {
    /// A code fence language tag is the strongest single indicator.
    pub const CODE_BLOCK_TAG: f64 = 0.35;
    /// A known manifest or source file reference (`Cargo.toml`, `main.py`).
    pub const FILE_REFERENCE: f64 = 0.30;
    /// A known tool invocation (`cargo build`, `pip install`).
    pub const COMMAND_TOOL: f64 = 0.25;
    /// A framework/test-runner config file (`jest.config.js`).
    pub const CONFIG_FILE: f64 = 0.25;
    /// A framework name tied to a known language.
    pub const FRAMEWORK: f64 = 0.20;
    /// A bare word mention in prose.
    pub const TEXT_MENTION: f64 = 0.15;
    /// Language inherited from an enclosing context (weakest signal).
    pub const INHERITED: f64 = 0.10;

    /// Repeats of one kind add this fraction of the base weight each.
    pub const REPEAT_DAMPING: f64 = 0.3;
    /// Multiplier step per additional distinct evidence kind.
    pub const DIVERSITY_BOOST: f64 = 0.15;
    /// Upper bound on the diversity multiplier (reached at 4 kinds).
    pub const DIVERSITY_CAP: f64 = 1.45;
    /// Minimum confidence once any evidence exists for a known subject.
    pub const CONFIDENCE_FLOOR: f64 = 0.3;
}

/// The kind of signal an evidence record captures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceKind {
    CodeBlockTag,
    FileReference,
    CommandTool,
    ConfigFile,
    Framework,
    TextMention,
    Inherited,
}

impl EvidenceKind {
    /// Base weight for this kind.
    pub fn weight(&self) -> f64 {
        match self {
            EvidenceKind::CodeBlockTag => weights::CODE_BLOCK_TAG,
            EvidenceKind::FileReference => weights::FILE_REFERENCE,
            EvidenceKind::CommandTool => weights::COMMAND_TOOL,
            EvidenceKind::ConfigFile => weights::CONFIG_FILE,
            EvidenceKind::Framework => weights::FRAMEWORK,
            EvidenceKind::TextMention => weights::TEXT_MENTION,
            EvidenceKind::Inherited => weights::INHERITED,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EvidenceKind::CodeBlockTag => "code_block_tag",
            EvidenceKind::FileReference => "file_reference",
            EvidenceKind::CommandTool => "command_tool",
            EvidenceKind::ConfigFile => "config_file",
            EvidenceKind::Framework => "framework",
            EvidenceKind::TextMention => "text_mention",
            EvidenceKind::Inherited => "inherited",
        }
    }
}

impl std::fmt::Display for EvidenceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single located, typed, weighted signal. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    pub kind: EvidenceKind,
    /// What was matched (the fence tag, file name, command line, ...).
    pub value: String,
    pub location: Span,
    pub weight: f64,
}

impl Evidence {
    /// Evidence with the kind's default weight.
    pub fn new(kind: EvidenceKind, value: impl Into<String>, location: Span) -> Self {
        Self {
            kind,
            value: value.into(),
            location,
            weight: kind.weight(),
        }
    }

    /// A human-readable source tag for `sources[]` lists.
    pub fn source(&self) -> String {
        format!("{}:{}", self.kind, self.value)
    }
}

/// Combine evidence into a confidence value in [0, 1].
///
/// Empty evidence is exactly 0.0, never a small epsilon, so "no findings"
/// is uniform across analyzers.
pub fn score(evidence: &[Evidence]) -> f64 {
    if evidence.is_empty() {
        return 0.0;
    }

    let mut base = 0.0;
    let mut seen: Vec<(EvidenceKind, u32)> = Vec::new();
    for ev in evidence {
        match seen.iter_mut().find(|(k, _)| *k == ev.kind) {
            Some((_, count)) => {
                base += ev.weight * weights::REPEAT_DAMPING;
                *count += 1;
            }
            None => {
                base += ev.weight;
                seen.push((ev.kind, 1));
            }
        }
    }

    let kinds = seen.len() as f64;
    let multiplier =
        (1.0 + weights::DIVERSITY_BOOST * (kinds - 1.0)).min(weights::DIVERSITY_CAP);

    (base * multiplier).max(weights::CONFIDENCE_FLOOR).min(1.0)
}

/// Combine per-item confidences into a domain-level confidence.
///
/// The strongest finding dominates; additional findings nudge upward. Used
/// by analyzers whose result is a collection (commands, frameworks).
pub fn combine(confidences: &[f64]) -> f64 {
    if confidences.is_empty() {
        return 0.0;
    }
    let max = confidences.iter().copied().fold(0.0_f64, f64::max);
    let extra = (confidences.len() as f64 - 1.0) * 0.05;
    (max + extra).min(1.0)
}
