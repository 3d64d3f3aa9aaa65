//! Project metadata extraction: title, description, environment variables,
//! file/directory structure mentions.

use once_cell::sync::Lazy;
use regex::Regex;

use super::{names, AnalysisInput, Analyzer};
use crate::evidence::{self, Evidence, EvidenceKind};
use crate::parser::{BlockKind, Span};
use crate::project::{AnalyzerData, AnalyzerResult, EnvVarInfo, EnvVarType, ProjectMetadata};

static IMAGE: Lazy<Regex> = Lazy::new(|| Regex::new(r"!\[[^\]]*\]\([^)]*\)").unwrap());
static LINK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[([^\]]*)\]\([^)]*\)").unwrap());
static MARKUP: Lazy<Regex> = Lazy::new(|| Regex::new(r"[*_`~]").unwrap());
static ENV_ASSIGN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:export\s+)?\b([A-Z][A-Z0-9_]{2,})=([^\s`'\x22]+)").unwrap());
static ENV_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b([A-Z][A-Z0-9_]{2,})\b").unwrap());
static ENV_USAGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\{?([A-Z][A-Z0-9_]{2,})\}?").unwrap());
static DEFAULT_VALUE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)defaults?\s*(?:to|:|is)?\s*`?([A-Za-z0-9_./:-]+)`?").unwrap()
});
static PATH_MENTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[\w.-]+(?:/[\w.-]+)+/?\b").unwrap());

/// ALL_CAPS tokens that read like env vars but almost never are.
const CAPS_STOPLIST: &[&str] = &[
    "README", "TODO", "FIXME", "API", "HTTP", "HTTPS", "URL", "URI", "LICENSE", "MIT", "BSD",
    "GPL", "CLI", "JSON", "YAML", "XML", "HTML", "CSS", "SQL", "CI", "CD", "OK", "USA", "FAQ",
    "IMPORTANT", "NOTE", "WARNING",
];

/// Keywords that mark a text block as talking about environment variables.
const ENV_KEYWORDS: &[&str] = &["environment", "env var", "envvar", ".env", "variable"];

pub struct MetadataAnalyzer;

impl MetadataAnalyzer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for MetadataAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl Analyzer for MetadataAnalyzer {
    fn name(&self) -> &str {
        names::METADATA
    }

    fn analyze(&self, input: &AnalysisInput) -> anyhow::Result<AnalyzerResult> {
        let mut evidence_items = Vec::new();

        let title = extract_title(input, &mut evidence_items);
        let description = extract_description(input, &mut evidence_items);
        let env_vars = extract_env_vars(input, &mut evidence_items);
        let file_mentions = extract_file_mentions(input, &mut evidence_items);

        let confidence = evidence::score(&evidence_items);
        let sources: Vec<String> = evidence_items.iter().map(|e| e.source()).collect();

        let metadata = ProjectMetadata {
            title,
            description,
            env_vars,
            file_mentions,
            confidence,
            sources: sources.clone(),
        };

        Ok(AnalyzerResult::new(
            AnalyzerData::Metadata(metadata),
            confidence,
            sources,
        ))
    }
}

/// First H1, with badges, links, markup and emoji stripped.
fn extract_title(input: &AnalysisInput, evidence: &mut Vec<Evidence>) -> Option<String> {
    let (raw, span) = input.doc.first_heading(1)?;
    let title = clean_inline(raw);
    if title.is_empty() {
        return None;
    }
    evidence.push(Evidence::new(EvidenceKind::TextMention, "title", span));
    Some(title)
}

/// First paragraph or blockquote after the title heading.
fn extract_description(input: &AnalysisInput, evidence: &mut Vec<Evidence>) -> Option<String> {
    let title_line = input
        .doc
        .first_heading(1)
        .map(|(_, span)| span.start_line)
        .unwrap_or(0);

    for block in &input.doc.blocks {
        if block.span.start_line <= title_line {
            continue;
        }
        match &block.kind {
            BlockKind::Paragraph { text } | BlockKind::Blockquote { text } => {
                let cleaned = clean_inline(text);
                // Badge-only paragraphs clean down to nothing; skip them.
                if cleaned.len() < 3 {
                    continue;
                }
                evidence.push(Evidence::new(
                    EvidenceKind::TextMention,
                    "description",
                    block.span,
                ));
                return Some(cleaned);
            }
            BlockKind::Heading { .. } => return None,
            _ => continue,
        }
    }
    None
}

/// Strip images, reduce links to their text, drop markup and emoji.
fn clean_inline(text: &str) -> String {
    let text = IMAGE.replace_all(text, "");
    let text = LINK.replace_all(&text, "$1");
    let text = MARKUP.replace_all(&text, "");
    text.chars()
        .filter(|c| c.is_ascii() || c.is_alphabetic())
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Environment variables with inferred defaults and required/optional
/// classification from surrounding prose.
fn extract_env_vars(input: &AnalysisInput, evidence: &mut Vec<Evidence>) -> Vec<EnvVarInfo> {
    let mut vars: Vec<EnvVarInfo> = Vec::new();

    for block in &input.doc.blocks {
        let text = block.text();
        let span = block.span;

        // Explicit assignments are the strongest signal, in any block kind.
        for caps in ENV_ASSIGN.captures_iter(&text) {
            let name = caps[1].to_string();
            if CAPS_STOPLIST.contains(&name.as_str()) {
                continue;
            }
            let default = caps[2].to_string();
            push_var(
                &mut vars,
                evidence,
                span,
                EnvVarInfo {
                    value_type: infer_type(&default),
                    required: false,
                    default: Some(default),
                    name,
                },
            );
        }

        // `$NAME` usages name a variable the program reads; no default known.
        for caps in ENV_USAGE.captures_iter(&text) {
            let name = caps[1].to_string();
            if CAPS_STOPLIST.contains(&name.as_str()) {
                continue;
            }
            push_var(
                &mut vars,
                evidence,
                span,
                EnvVarInfo {
                    value_type: EnvVarType::String,
                    required: true,
                    default: None,
                    name,
                },
            );
        }

        // Bare ALL_CAPS mentions only count in env-flavored prose.
        if block.is_code_fence() || !mentions_env(&text) {
            continue;
        }
        let lower = text.to_ascii_lowercase();
        let required = lower.contains("required") && !lower.contains("optional");
        let default = DEFAULT_VALUE
            .captures(&text)
            .map(|caps| caps[1].to_string());

        for caps in ENV_NAME.captures_iter(&text) {
            let name = caps[1].to_string();
            if CAPS_STOPLIST.contains(&name.as_str()) {
                continue;
            }
            push_var(
                &mut vars,
                evidence,
                span,
                EnvVarInfo {
                    value_type: default
                        .as_deref()
                        .map(infer_type)
                        .unwrap_or(EnvVarType::String),
                    required: required || default.is_none(),
                    default: default.clone(),
                    name,
                },
            );
        }
    }

    vars
}

fn mentions_env(text: &str) -> bool {
    let lower = text.to_ascii_lowercase();
    ENV_KEYWORDS.iter().any(|k| lower.contains(k))
        || lower.contains("required")
        || lower.contains("default")
}

fn push_var(
    vars: &mut Vec<EnvVarInfo>,
    evidence: &mut Vec<Evidence>,
    span: Span,
    var: EnvVarInfo,
) {
    if let Some(existing) = vars.iter_mut().find(|v| v.name == var.name) {
        // An assignment seen later fills in a missing default.
        if existing.default.is_none() && var.default.is_some() {
            existing.default = var.default;
            existing.value_type = var.value_type;
            existing.required = false;
        }
        return;
    }
    evidence.push(Evidence::new(EvidenceKind::TextMention, &var.name, span));
    vars.push(var);
}

fn infer_type(value: &str) -> EnvVarType {
    let lower = value.to_ascii_lowercase();
    if lower == "true" || lower == "false" {
        EnvVarType::Boolean
    } else if value.parse::<f64>().is_ok() {
        EnvVarType::Number
    } else {
        EnvVarType::String
    }
}

/// Path-shaped mentions outside shell commands: directory layout, config
/// locations and similar structure references.
fn extract_file_mentions(input: &AnalysisInput, evidence: &mut Vec<Evidence>) -> Vec<String> {
    let mut mentions = Vec::new();
    for block in &input.doc.blocks {
        // Tagged fences are code or commands; untagged ones are often
        // directory-tree listings and do carry structure paths.
        if let BlockKind::CodeFence { tag: Some(_), .. } = &block.kind {
            continue;
        }
        let text = block.text();
        for m in PATH_MENTION.find_iter(&text) {
            let path = m.as_str().to_string();
            if path.starts_with("http") || mentions.contains(&path) {
                continue;
            }
            evidence.push(Evidence::new(
                EvidenceKind::FileReference,
                &path,
                block.span,
            ));
            mentions.push(path);
        }
    }
    mentions
}
