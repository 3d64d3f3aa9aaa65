//! Language context engine.
//!
//! Scans the parsed document for language-indicating evidence, groups it
//! into confidence-scored [`LanguageContext`] spans, and detects boundaries
//! where the dominant language or section changes. Contexts are immutable
//! once built; downstream analyzers consume them read-only through the
//! shared analysis context.

pub mod indicators;

use std::time::{SystemTime, UNIX_EPOCH};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::evidence::{self, Evidence, EvidenceKind};
use crate::parser::{BlockKind, ParsedDocument, Span};
use crate::project::LanguageInfo;

/// Two evidence spans for the same language merge into one context when the
/// gap between them is at most this many lines. READMEs interleave prose
/// with code, so a small gap does not mean the language changed.
const MERGE_GAP_LINES: usize = 12;

static FILE_MENTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Za-z0-9_][A-Za-z0-9_./-]*\.[A-Za-z0-9]+").unwrap());
static WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Za-z+#.][A-Za-z0-9+#.]*").unwrap());

/// A confidence-scored span of the document attributed to one dominant
/// language. Never mutated after creation; revision means reconstruction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanguageContext {
    pub language: String,
    pub confidence: f64,
    pub source_range: Span,
    pub evidence: Vec<Evidence>,
    /// Unix millis at creation, for source tracking.
    pub created_at_ms: u64,
    /// Which subsystem created the context. Not round-tripped through
    /// deserialization; a deserialized context reads as unattributed.
    #[serde(skip_deserializing, default)]
    pub source: &'static str,
}

/// Kind of transition at a context boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransitionKind {
    LanguageChange,
    SectionChange,
}

/// A detected transition point between adjacent contexts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextBoundary {
    pub line: usize,
    pub transition: TransitionKind,
}

/// Full output of a detection pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LanguageAnalysis {
    contexts: Vec<LanguageContext>,
    boundaries: Vec<ContextBoundary>,
    /// Per-language summaries, strongest first.
    pub languages: Vec<LanguageInfo>,
    pub overall_confidence: f64,
}

impl LanguageAnalysis {
    /// The context covering `line`, highest-confidence one on overlap.
    pub fn context_at(&self, line: usize) -> Option<&LanguageContext> {
        self.contexts
            .iter()
            .filter(|c| c.source_range.contains_line(line))
            .max_by(|a, b| a.confidence.total_cmp(&b.confidence))
    }

    pub fn all_contexts(&self) -> &[LanguageContext] {
        &self.contexts
    }

    pub fn boundaries(&self) -> &[ContextBoundary] {
        &self.boundaries
    }
}

/// Detects language contexts over a parsed document.
pub struct LanguageContextEngine {
    max_contexts: usize,
    inheritance_enabled: bool,
}

/// One piece of evidence attributed to a language, in document order.
struct Attributed {
    language: String,
    evidence: Evidence,
}

impl LanguageContextEngine {
    pub fn new(max_contexts: usize, inheritance_enabled: bool) -> Self {
        Self {
            max_contexts,
            inheritance_enabled,
        }
    }

    /// Scan the document and build contexts, boundaries and summaries.
    ///
    /// Empty input or input with no language indicators yields an empty
    /// analysis with `overall_confidence == 0.0`, never an error.
    pub fn detect(&self, doc: &ParsedDocument) -> LanguageAnalysis {
        let attributed = self.collect_evidence(doc);
        if attributed.is_empty() {
            return LanguageAnalysis::default();
        }

        let mut contexts = group_contexts(&attributed);
        contexts.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
        if contexts.len() > self.max_contexts {
            log::debug!(
                "dropping {} low-confidence language contexts (max_contexts = {})",
                contexts.len() - self.max_contexts,
                self.max_contexts
            );
            contexts.truncate(self.max_contexts);
        }
        contexts.sort_by_key(|c| c.source_range.start_line);

        let boundaries = detect_boundaries(doc, &contexts);
        let languages = summarize(&attributed);
        let overall_confidence = languages
            .iter()
            .map(|l| l.confidence)
            .fold(0.0_f64, f64::max);

        LanguageAnalysis {
            contexts,
            boundaries,
            languages,
            overall_confidence,
        }
    }

    /// Walk the blocks and attribute evidence to languages.
    fn collect_evidence(&self, doc: &ParsedDocument) -> Vec<Attributed> {
        let mut out = Vec::new();

        for block in &doc.blocks {
            match &block.kind {
                BlockKind::CodeFence { tag, content, .. } => {
                    match tag.as_deref() {
                        Some(t) => {
                            if let Some(lang) = indicators::language_for_tag(t) {
                                out.push(Attributed {
                                    language: lang.to_string(),
                                    evidence: Evidence::new(
                                        EvidenceKind::CodeBlockTag,
                                        t,
                                        block.span,
                                    ),
                                });
                            } else if indicators::is_shell_tag(t) {
                                collect_command_evidence(content, block.span, &mut out);
                            }
                            // Unknown tags are skipped, not penalized.
                        }
                        None => {
                            // Untagged fences still often hold commands.
                            let before = out.len();
                            collect_command_evidence(content, block.span, &mut out);
                            if out.len() == before && self.inheritance_enabled {
                                if let Some(prev) = out.last() {
                                    let language = prev.language.clone();
                                    out.push(Attributed {
                                        language,
                                        evidence: Evidence::new(
                                            EvidenceKind::Inherited,
                                            "untagged fence",
                                            block.span,
                                        ),
                                    });
                                }
                            }
                        }
                    }
                }
                _ => collect_text_evidence(&block.text(), block.span, &mut out),
            }
        }

        out
    }
}

/// Tool-based evidence from shell command content.
fn collect_command_evidence(content: &str, span: Span, out: &mut Vec<Attributed>) {
    for line in content.lines() {
        let cmd = line.trim().trim_start_matches("$ ").trim_start_matches("$");
        let tool = match cmd.split_whitespace().next() {
            Some(t) => t,
            None => continue,
        };
        if let Some(lang) = indicators::language_for_tool(tool) {
            out.push(Attributed {
                language: lang.to_string(),
                evidence: Evidence::new(EvidenceKind::CommandTool, tool, span),
            });
        }
    }
}

/// File-reference, prose-mention and framework evidence from text blocks.
fn collect_text_evidence(text: &str, span: Span, out: &mut Vec<Attributed>) {
    for m in FILE_MENTION.find_iter(text) {
        if let Some(lang) = indicators::language_for_file(m.as_str()) {
            out.push(Attributed {
                language: lang.to_string(),
                evidence: Evidence::new(EvidenceKind::FileReference, m.as_str(), span),
            });
        }
    }
    for m in WORD.find_iter(text) {
        let word = m.as_str().to_ascii_lowercase();
        let word = word.trim_end_matches(['.', ',']);
        if let Some(lang) = indicators::PROSE_NAMES.get(word) {
            out.push(Attributed {
                language: (*lang).to_string(),
                evidence: Evidence::new(EvidenceKind::TextMention, m.as_str(), span),
            });
        }
        if let Some((framework, lang)) = indicators::FRAMEWORKS.get(word) {
            out.push(Attributed {
                language: (*lang).to_string(),
                evidence: Evidence::new(EvidenceKind::Framework, *framework, span),
            });
        }
    }
}

/// Group attributed evidence into per-language contiguous contexts.
///
/// Per language, evidence items within `MERGE_GAP_LINES` of each other share
/// one context; a larger gap starts a new one. Contexts for the same
/// language therefore never overlap, while contexts of different languages
/// may (polyglot documents are legal).
fn group_contexts(attributed: &[Attributed]) -> Vec<LanguageContext> {
    let now_ms = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0);

    // (language, open span, evidence) for the currently open run.
    let mut open: Vec<(String, Span, Vec<Evidence>)> = Vec::new();
    let mut done = Vec::new();

    let mut ordered: Vec<&Attributed> = attributed.iter().collect();
    ordered.sort_by_key(|a| a.evidence.location.start_line);

    for att in ordered {
        let loc = att.evidence.location;
        match open.iter_mut().find(|(lang, _, _)| *lang == att.language) {
            Some((_, span, evidence))
                if loc.start_line <= span.end_line + MERGE_GAP_LINES =>
            {
                *span = span.union(&loc);
                evidence.push(att.evidence.clone());
            }
            Some(entry) => {
                let (lang, span, evidence) = std::mem::replace(
                    entry,
                    (att.language.clone(), loc, vec![att.evidence.clone()]),
                );
                done.push(finish_context(lang, span, evidence, now_ms));
            }
            None => {
                open.push((att.language.clone(), loc, vec![att.evidence.clone()]));
            }
        }
    }
    for (lang, span, evidence) in open {
        done.push(finish_context(lang, span, evidence, now_ms));
    }
    done
}

fn finish_context(
    language: String,
    source_range: Span,
    evidence: Vec<Evidence>,
    created_at_ms: u64,
) -> LanguageContext {
    let confidence = evidence::score(&evidence);
    LanguageContext {
        language,
        confidence,
        source_range,
        evidence,
        created_at_ms,
        source: "language-context-engine",
    }
}

/// Boundaries between adjacent contexts, plus section changes at headings.
fn detect_boundaries(doc: &ParsedDocument, contexts: &[LanguageContext]) -> Vec<ContextBoundary> {
    let mut boundaries = Vec::new();

    for pair in contexts.windows(2) {
        if pair[0].language != pair[1].language {
            boundaries.push(ContextBoundary {
                line: pair[1].source_range.start_line,
                transition: TransitionKind::LanguageChange,
            });
        }
    }

    // Headings that do not coincide with a language flip are section changes.
    for block in &doc.blocks {
        if let BlockKind::Heading { .. } = block.kind {
            let line = block.span.start_line;
            let near_language_change = boundaries
                .iter()
                .any(|b| b.transition == TransitionKind::LanguageChange && b.line.abs_diff(line) <= 1);
            if !near_language_change && line > 1 {
                boundaries.push(ContextBoundary {
                    line,
                    transition: TransitionKind::SectionChange,
                });
            }
        }
    }

    boundaries.sort_by_key(|b| b.line);
    boundaries
}

/// Per-language summaries across all evidence, strongest first.
fn summarize(attributed: &[Attributed]) -> Vec<LanguageInfo> {
    let mut by_language: Vec<(String, Vec<Evidence>)> = Vec::new();
    for att in attributed {
        match by_language.iter_mut().find(|(l, _)| *l == att.language) {
            Some((_, evidence)) => evidence.push(att.evidence.clone()),
            None => by_language.push((att.language.clone(), vec![att.evidence.clone()])),
        }
    }

    let mut languages: Vec<LanguageInfo> = by_language
        .into_iter()
        .map(|(name, evidence)| {
            let confidence = evidence::score(&evidence);
            let mut frameworks: Vec<String> = evidence
                .iter()
                .filter(|e| e.kind == EvidenceKind::Framework)
                .map(|e| e.value.clone())
                .collect();
            frameworks.dedup();
            let mut sources: Vec<String> = evidence.iter().map(|e| e.source()).collect();
            sources.dedup();
            LanguageInfo {
                name,
                confidence,
                sources,
                frameworks,
            }
        })
        .collect();

    languages.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    languages
}
