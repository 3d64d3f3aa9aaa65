//! Shell command extraction and classification.
//!
//! Commands come from shell-tagged and untagged code fences. Each is
//! classified into an install/build/test/run/other bucket by its tool and
//! verb, and associated with the language context covering its source
//! location when the language stage ran. A command whose tool belongs to
//! the covering context's ecosystem gets a corroboration boost.

use phf::phf_map;

use super::{names, AnalysisInput, Analyzer};
use crate::evidence::{self, Evidence, EvidenceKind};
use crate::language::indicators;
use crate::parser::{BlockKind, Span};
use crate::project::{AnalyzerData, AnalyzerResult, CommandCategory, CommandInfo};

/// Single-token classifications that do not depend on the verb.
static TOOL_CATEGORIES: phf::Map<&'static str, CommandCategory> = phf_map! {
    "pytest" => CommandCategory::Test,
    "jest" => CommandCategory::Test,
    "mocha" => CommandCategory::Test,
    "vitest" => CommandCategory::Test,
    "rspec" => CommandCategory::Test,
    "phpunit" => CommandCategory::Test,
    "tox" => CommandCategory::Test,
    "make" => CommandCategory::Build,
    "cmake" => CommandCategory::Build,
    "tsc" => CommandCategory::Build,
    "webpack" => CommandCategory::Build,
    "docker" => CommandCategory::Other,
    "docker-compose" => CommandCategory::Other,
    "kubectl" => CommandCategory::Other,
    "git" => CommandCategory::Other,
};

pub struct CommandAnalyzer;

impl CommandAnalyzer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CommandAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl Analyzer for CommandAnalyzer {
    fn name(&self) -> &str {
        names::COMMANDS
    }

    fn dependencies(&self) -> Vec<String> {
        vec![names::LANGUAGE_DETECTOR.to_string()]
    }

    fn analyze(&self, input: &AnalysisInput) -> anyhow::Result<AnalyzerResult> {
        // Degraded mode: upstream contexts missing means no language
        // association, never a crash.
        let language = input.context.language();
        if language.is_none() && input.context.upstream_failed(names::LANGUAGE_DETECTOR) {
            log::debug!("commands: language stage unavailable, degrading");
        }

        let mut commands: Vec<CommandInfo> = Vec::new();

        for block in &input.doc.blocks {
            let (tag, content) = match &block.kind {
                BlockKind::CodeFence { tag, content, .. } => (tag.as_deref(), content.as_str()),
                _ => continue,
            };
            let shellish = match tag {
                Some(t) => indicators::is_shell_tag(t),
                None => true,
            };
            if !shellish {
                continue;
            }

            for (offset, line) in content.lines().enumerate() {
                let cmd = normalize(line);
                if cmd.is_empty() {
                    continue;
                }
                let tool = match cmd.split_whitespace().next() {
                    Some(t) => t,
                    None => continue,
                };
                // Untagged fences only yield commands for recognized tools;
                // anything else is likely code or output, not a command.
                if tag.is_none()
                    && indicators::language_for_tool(tool).is_none()
                    && !TOOL_CATEGORIES.contains_key(tool)
                {
                    continue;
                }

                let line_no = block.span.start_line + 1 + offset;
                let span = Span::lines(line_no, line_no);
                let category = classify(&cmd);

                let mut evidence_items =
                    vec![Evidence::new(EvidenceKind::CommandTool, &cmd, span)];
                let mut associated = None;
                if let Some(analysis) = language.as_deref() {
                    if let Some(ctx) = analysis.context_at(line_no) {
                        associated = Some(ctx.language.clone());
                        // Corroboration: the tool's ecosystem matches the
                        // covering context's language.
                        if indicators::language_for_tool(tool) == Some(ctx.language.as_str()) {
                            evidence_items.push(Evidence::new(
                                EvidenceKind::CodeBlockTag,
                                &ctx.language,
                                span,
                            ));
                        }
                    }
                }

                if commands.iter().any(|c| c.command == cmd) {
                    continue;
                }
                let confidence = evidence::score(&evidence_items);
                let sources = evidence_items.iter().map(|e| e.source()).collect();
                commands.push(CommandInfo {
                    command: cmd,
                    category,
                    language: associated,
                    confidence,
                    sources,
                    span,
                });
            }
        }

        let confidence =
            evidence::combine(&commands.iter().map(|c| c.confidence).collect::<Vec<_>>());
        let sources: Vec<String> = commands
            .iter()
            .flat_map(|c| c.sources.iter().cloned())
            .collect();

        Ok(AnalyzerResult::new(
            AnalyzerData::Commands(commands),
            confidence,
            sources,
        ))
    }
}

/// Strip prompts and comments; keep the bare command line.
fn normalize(line: &str) -> String {
    let line = line.trim();
    let line = line.strip_prefix("$ ").or_else(|| line.strip_prefix("$")).unwrap_or(line);
    let line = line.strip_prefix("> ").unwrap_or(line);
    if line.starts_with('#') {
        return String::new();
    }
    line.trim().to_string()
}

/// Bucket a command by tool and verb.
fn classify(cmd: &str) -> CommandCategory {
    let mut parts = cmd.split_whitespace();
    let tool = parts.next().unwrap_or("");
    let verb = parts.next().unwrap_or("");
    let third = parts.next().unwrap_or("");

    if let Some(cat) = TOOL_CATEGORIES.get(tool) {
        return *cat;
    }

    match (tool, verb) {
        ("npm" | "yarn" | "pnpm", "install" | "add" | "ci") => CommandCategory::Install,
        ("npm" | "yarn" | "pnpm", "test") => CommandCategory::Test,
        ("npm" | "yarn" | "pnpm", "start") => CommandCategory::Run,
        ("npm" | "yarn" | "pnpm", "run") => match third {
            "build" | "compile" | "dist" => CommandCategory::Build,
            "test" | "lint" | "check" => CommandCategory::Test,
            "dev" | "start" | "serve" => CommandCategory::Run,
            _ => CommandCategory::Other,
        },
        ("pip" | "pip3" | "pipenv" | "poetry" | "gem" | "bundle" | "composer", "install" | "add") => {
            CommandCategory::Install
        }
        ("cargo", "build") | ("cargo", "b") => CommandCategory::Build,
        ("cargo", "test") | ("cargo", "t") => CommandCategory::Test,
        ("cargo", "run") | ("cargo", "r") => CommandCategory::Run,
        ("cargo", "install") => CommandCategory::Install,
        ("go", "build") => CommandCategory::Build,
        ("go", "test") => CommandCategory::Test,
        ("go", "run") => CommandCategory::Run,
        ("go", "get" | "install") => CommandCategory::Install,
        ("mvn", "package" | "compile" | "install") => CommandCategory::Build,
        ("mvn", "test") => CommandCategory::Test,
        ("gradle", "build") => CommandCategory::Build,
        ("gradle", "test") => CommandCategory::Test,
        ("python" | "python3" | "node" | "ruby" | "php", _) => CommandCategory::Run,
        ("mix", "test") => CommandCategory::Test,
        ("mix", "deps.get") => CommandCategory::Install,
        _ => CommandCategory::Other,
    }
}
