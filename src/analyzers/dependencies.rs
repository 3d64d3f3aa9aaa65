//! Dependency extraction: package manifests, install commands and named
//! packages, each tagged with a package manager when determinable.

use once_cell::sync::Lazy;
use regex::Regex;

use super::{names, AnalysisInput, Analyzer};
use crate::evidence::{self, Evidence, EvidenceKind};
use crate::language::indicators;
use crate::parser::{BlockKind, Span};
use crate::project::{AnalyzerData, AnalyzerResult, DependencyInfo, ManifestInfo, PackageInfo};

static FILE_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Za-z0-9_][A-Za-z0-9_./-]*\.[A-Za-z0-9]+|Gemfile|Pipfile").unwrap());
static INSTALL_CMD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?m)^\s*(?:\$\s*)?((?:npm|yarn|pnpm|pip|pip3|pipenv|poetry|cargo|gem|go|composer|bundle)\s+(?:install|add|get)\b[^\n]*)",
    )
    .unwrap()
});
static FLAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"^-").unwrap());
// "the express and lodash npm packages", "serde, tokio and anyhow rust crates"
static PROSE_PACKAGES: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b([a-z0-9@][\w@./-]*(?:,\s*[a-z0-9@][\w@./-]*)*(?:,?\s+and\s+[a-z0-9@][\w@./-]*)?)\s+(npm|node|pip|python|cargo|rust|gem|ruby|go|composer|php)\s+(?:packages?|crates?|gems?|modules?)\b",
    )
    .unwrap()
});
// "the `requests` package", "the `serde` crate"
static QUOTED_PACKAGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)`([a-z0-9@][\w@./-]*)`\s+(package|crate|gem|module)s?\b").unwrap()
});

/// Words a prose package list may carry that are not package names.
const LIST_STOPWORDS: &[&str] = &[
    "and", "the", "a", "an", "these", "those", "this", "following", "several",
    "some", "various", "other", "required", "optional", "usual",
];

/// Which package manager an install command belongs to.
fn manager_for_install(tool: &str) -> Option<&'static str> {
    match tool {
        "npm" | "npx" => Some("npm"),
        "yarn" => Some("yarn"),
        "pnpm" => Some("pnpm"),
        "pip" | "pip3" => Some("pip"),
        "pipenv" => Some("pipenv"),
        "poetry" => Some("pip"),
        "cargo" => Some("cargo"),
        "gem" | "bundle" => Some("bundler"),
        "go" => Some("go"),
        "composer" => Some("composer"),
        _ => None,
    }
}

/// Which package manager an ecosystem word in prose refers to.
fn manager_for_prose_word(word: &str) -> Option<&'static str> {
    match word {
        "npm" | "node" => Some("npm"),
        "pip" | "python" => Some("pip"),
        "cargo" | "rust" => Some("cargo"),
        "gem" | "ruby" => Some("bundler"),
        "go" => Some("go"),
        "composer" | "php" => Some("composer"),
        _ => None,
    }
}

pub struct DependencyAnalyzer;

impl DependencyAnalyzer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DependencyAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl Analyzer for DependencyAnalyzer {
    fn name(&self) -> &str {
        names::DEPENDENCIES
    }

    fn analyze(&self, input: &AnalysisInput) -> anyhow::Result<AnalyzerResult> {
        let mut evidence_items = Vec::new();
        let mut manifests: Vec<ManifestInfo> = Vec::new();
        let mut packages: Vec<PackageInfo> = Vec::new();
        let mut install_commands: Vec<String> = Vec::new();

        for block in &input.doc.blocks {
            let text = block.text();

            // Manifest file mentions anywhere in the document.
            for m in FILE_TOKEN.find_iter(&text) {
                let base = m
                    .as_str()
                    .rsplit('/')
                    .next()
                    .unwrap_or(m.as_str())
                    .to_ascii_lowercase();
                if let Some((manager, _)) = indicators::MANIFESTS.get(base.as_str()) {
                    if manifests.iter().any(|f| f.file.eq_ignore_ascii_case(&base)) {
                        continue;
                    }
                    evidence_items.push(Evidence::new(
                        EvidenceKind::FileReference,
                        &base,
                        block.span,
                    ));
                    manifests.push(ManifestInfo {
                        file: base,
                        manager: (*manager).to_string(),
                        span: block.span,
                    });
                }
            }

            // Install commands, with named packages where present.
            for caps in INSTALL_CMD.captures_iter(&text) {
                let command = caps[1].trim().to_string();
                if install_commands.contains(&command) {
                    continue;
                }
                evidence_items.push(Evidence::new(
                    EvidenceKind::CommandTool,
                    &command,
                    block.span,
                ));
                extract_packages(&command, &mut packages);
                install_commands.push(command);
            }
        }

        // Named package mentions in prose, outside code fences. Runs after
        // the manifest and install-command passes so a bare "`x` package"
        // can borrow the document's sole detected manager.
        let sole_manager = sole_known_manager(&manifests, &packages);
        for block in &input.doc.blocks {
            if matches!(block.kind, BlockKind::CodeFence { .. }) {
                continue;
            }
            let text = block.text();
            for caps in PROSE_PACKAGES.captures_iter(&text) {
                let manager = manager_for_prose_word(&caps[2].to_ascii_lowercase());
                for name in split_package_list(&caps[1]) {
                    push_prose_package(
                        name,
                        manager.map(str::to_string),
                        block.span,
                        &mut packages,
                        &mut evidence_items,
                    );
                }
            }
            for caps in QUOTED_PACKAGE.captures_iter(&text) {
                let manager = match caps[2].to_ascii_lowercase().as_str() {
                    "crate" => Some("cargo".to_string()),
                    "gem" => Some("bundler".to_string()),
                    _ => sole_manager.clone(),
                };
                push_prose_package(
                    &caps[1],
                    manager,
                    block.span,
                    &mut packages,
                    &mut evidence_items,
                );
            }
        }

        let confidence = evidence::score(&evidence_items);
        let sources: Vec<String> = evidence_items.iter().map(|e| e.source()).collect();

        let info = DependencyInfo {
            manifests,
            packages,
            install_commands,
            confidence,
            sources: sources.clone(),
        };

        Ok(AnalyzerResult::new(
            AnalyzerData::Dependencies(info),
            confidence,
            sources,
        ))
    }
}

/// Pull named packages out of one install command.
fn extract_packages(command: &str, packages: &mut Vec<PackageInfo>) {
    let mut parts = command.split_whitespace();
    let tool = match parts.next() {
        Some(t) => t,
        None => return,
    };
    let manager = manager_for_install(tool);
    let verb = parts.next().unwrap_or("");
    if !matches!(verb, "install" | "add" | "get") {
        return;
    }

    for arg in parts {
        if FLAG.is_match(arg) {
            // `-r requirements.txt` and friends name files, not packages.
            return;
        }
        let (name, version) = split_version(arg);
        if name.is_empty() || packages.iter().any(|p| p.name == name) {
            continue;
        }
        packages.push(PackageInfo {
            name: name.to_string(),
            manager: manager.map(|m| m.to_string()),
            version: version.map(|v| v.to_string()),
        });
    }
}

/// Split a prose list like "express, body-parser and lodash" into names.
fn split_package_list(list: &str) -> Vec<&str> {
    list.split(',')
        .flat_map(str::split_whitespace)
        .filter(|token| {
            let lower = token.to_ascii_lowercase();
            !LIST_STOPWORDS.contains(&lower.as_str())
        })
        .collect()
}

/// Record a prose-mentioned package unless already known.
fn push_prose_package(
    name: &str,
    manager: Option<String>,
    span: Span,
    packages: &mut Vec<PackageInfo>,
    evidence_items: &mut Vec<Evidence>,
) {
    if name.is_empty() || packages.iter().any(|p| p.name == name) {
        return;
    }
    evidence_items.push(Evidence::new(EvidenceKind::TextMention, name, span));
    packages.push(PackageInfo {
        name: name.to_string(),
        manager,
        version: None,
    });
}

/// The single manager the document has already committed to, if exactly one.
fn sole_known_manager(manifests: &[ManifestInfo], packages: &[PackageInfo]) -> Option<String> {
    let mut managers: Vec<&str> = manifests
        .iter()
        .map(|m| m.manager.as_str())
        .chain(packages.iter().filter_map(|p| p.manager.as_deref()))
        .collect();
    managers.sort_unstable();
    managers.dedup();
    match managers.as_slice() {
        [only] => Some((*only).to_string()),
        _ => None,
    }
}

/// `serde@1.0` / `flask==2.3` / `lodash` → (name, version).
fn split_version(arg: &str) -> (&str, Option<&str>) {
    for sep in ["==", ">=", "@", "="] {
        if let Some(idx) = arg.find(sep) {
            // A leading @ is an npm scope, not a version separator.
            if sep == "@" && idx == 0 {
                if let Some(idx2) = arg[1..].find('@') {
                    return (&arg[..idx2 + 1], Some(&arg[idx2 + 2..]));
                }
                return (arg, None);
            }
            return (&arg[..idx], Some(&arg[idx + sep.len()..]));
        }
    }
    (arg, None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::test_support;

    fn run(text: &str) -> DependencyInfo {
        let result = DependencyAnalyzer::new()
            .analyze(&test_support::input(text))
            .unwrap();
        match result.data {
            AnalyzerData::Dependencies(d) => d,
            other => panic!("unexpected payload {other:?}"),
        }
    }

    #[test]
    fn test_manifest_to_manager_mapping() {
        let info = run("# X\n\nDeps live in package.json and requirements.txt.\n");
        let managers: Vec<&str> = info.manifests.iter().map(|m| m.manager.as_str()).collect();
        assert!(managers.contains(&"npm"));
        assert!(managers.contains(&"pip"));
    }

    #[test]
    fn test_install_command_extraction() {
        let info = run("# X\n\n```bash\nnpm install express lodash\n```\n");
        assert_eq!(info.install_commands.len(), 1);
        let names: Vec<&str> = info.packages.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["express", "lodash"]);
        assert!(info
            .packages
            .iter()
            .all(|p| p.manager.as_deref() == Some("npm")));
    }

    #[test]
    fn test_pip_version_pin() {
        let info = run("# X\n\n```bash\npip install flask==2.3\n```\n");
        let pkg = info.packages.iter().find(|p| p.name == "flask").unwrap();
        assert_eq!(pkg.manager.as_deref(), Some("pip"));
        assert_eq!(pkg.version.as_deref(), Some("2.3"));
    }

    #[test]
    fn test_requirements_file_not_treated_as_package() {
        let info = run("# X\n\n```bash\npip install -r requirements.txt\n```\n");
        assert!(info.packages.is_empty());
        assert_eq!(info.install_commands.len(), 1);
        // The file itself still registers as a pip manifest.
        assert!(info.manifests.iter().any(|m| m.manager == "pip"));
    }

    #[test]
    fn test_npm_scoped_package() {
        let info = run("# X\n\n```bash\nnpm install @types/node@20\n```\n");
        let pkg = info.packages.iter().find(|p| p.name == "@types/node").unwrap();
        assert_eq!(pkg.version.as_deref(), Some("20"));
    }

    #[test]
    fn test_prose_package_mentions() {
        let info = run("# X\n\nThis service depends on the express and lodash npm packages.\n");
        let names: Vec<&str> = info.packages.iter().map(|p| p.name.as_str()).collect();
        assert!(names.contains(&"express"), "{names:?}");
        assert!(names.contains(&"lodash"), "{names:?}");
        assert!(info
            .packages
            .iter()
            .all(|p| p.manager.as_deref() == Some("npm")));
    }

    #[test]
    fn test_quoted_package_borrows_sole_manager() {
        let info =
            run("# X\n\nInstall from requirements.txt, then grab the `requests` package.\n");
        let pkg = info.packages.iter().find(|p| p.name == "requests").unwrap();
        assert_eq!(pkg.manager.as_deref(), Some("pip"));
    }

    #[test]
    fn test_quoted_crate_keyword_maps_to_cargo() {
        let info = run("# X\n\nSerialization is handled by the `serde` crate.\n");
        let pkg = info.packages.iter().find(|p| p.name == "serde").unwrap();
        assert_eq!(pkg.manager.as_deref(), Some("cargo"));
    }

    #[test]
    fn test_prose_mention_inside_fence_is_ignored() {
        let info = run("# X\n\n```\necho the express and lodash npm packages\n```\n");
        assert!(info.packages.is_empty());
    }

    #[test]
    fn test_no_dependencies_is_empty_zero() {
        let info = run("# X\n\nNothing relevant here.\n");
        assert_eq!(info.confidence, 0.0);
        assert!(info.manifests.is_empty());
        assert!(info.packages.is_empty());
        assert!(info.install_commands.is_empty());
    }
}
