//! Static indicator tables mapping document signals to languages and
//! ecosystems.
//!
//! All tables are compile-time phf maps keyed by lowercase strings. Keys
//! must be lowercased by callers before lookup.

use phf::phf_map;

/// Fence info-string tags to canonical language names.
pub static FENCE_TAGS: phf::Map<&'static str, &'static str> = phf_map! {
    "rust" => "Rust",
    "rs" => "Rust",
    "python" => "Python",
    "py" => "Python",
    "python3" => "Python",
    "javascript" => "JavaScript",
    "js" => "JavaScript",
    "jsx" => "JavaScript",
    "node" => "JavaScript",
    "typescript" => "TypeScript",
    "ts" => "TypeScript",
    "tsx" => "TypeScript",
    "go" => "Go",
    "golang" => "Go",
    "java" => "Java",
    "kotlin" => "Kotlin",
    "ruby" => "Ruby",
    "rb" => "Ruby",
    "php" => "PHP",
    "c" => "C",
    "cpp" => "C++",
    "c++" => "C++",
    "csharp" => "C#",
    "cs" => "C#",
    "swift" => "Swift",
    "scala" => "Scala",
    "elixir" => "Elixir",
    "haskell" => "Haskell",
};

/// Fence tags that are shells, not project languages. Their content is
/// command material, and they never start a language context by themselves.
pub static SHELL_TAGS: phf::Map<&'static str, ()> = phf_map! {
    "bash" => (),
    "sh" => (),
    "shell" => (),
    "console" => (),
    "zsh" => (),
    "terminal" => (),
    "cmd" => (),
    "powershell" => (),
};

/// Package manifest file names to (package manager, language).
pub static MANIFESTS: phf::Map<&'static str, (&'static str, &'static str)> = phf_map! {
    "package.json" => ("npm", "JavaScript"),
    "package-lock.json" => ("npm", "JavaScript"),
    "yarn.lock" => ("yarn", "JavaScript"),
    "pnpm-lock.yaml" => ("pnpm", "JavaScript"),
    "tsconfig.json" => ("npm", "TypeScript"),
    "requirements.txt" => ("pip", "Python"),
    "requirements-dev.txt" => ("pip", "Python"),
    "pipfile" => ("pipenv", "Python"),
    "pyproject.toml" => ("pip", "Python"),
    "setup.py" => ("pip", "Python"),
    "go.mod" => ("go", "Go"),
    "go.sum" => ("go", "Go"),
    "cargo.toml" => ("cargo", "Rust"),
    "cargo.lock" => ("cargo", "Rust"),
    "gemfile" => ("bundler", "Ruby"),
    "gemfile.lock" => ("bundler", "Ruby"),
    "pom.xml" => ("maven", "Java"),
    "build.gradle" => ("gradle", "Java"),
    "build.gradle.kts" => ("gradle", "Kotlin"),
    "composer.json" => ("composer", "PHP"),
    "mix.exs" => ("mix", "Elixir"),
};

/// Source file extensions to languages, for file-reference mentions.
pub static EXTENSIONS: phf::Map<&'static str, &'static str> = phf_map! {
    "rs" => "Rust",
    "py" => "Python",
    "js" => "JavaScript",
    "mjs" => "JavaScript",
    "cjs" => "JavaScript",
    "jsx" => "JavaScript",
    "ts" => "TypeScript",
    "tsx" => "TypeScript",
    "go" => "Go",
    "java" => "Java",
    "kt" => "Kotlin",
    "rb" => "Ruby",
    "php" => "PHP",
    "c" => "C",
    "h" => "C",
    "cpp" => "C++",
    "cc" => "C++",
    "hpp" => "C++",
    "cs" => "C#",
    "swift" => "Swift",
    "scala" => "Scala",
    "ex" => "Elixir",
    "exs" => "Elixir",
    "hs" => "Haskell",
};

/// Command-line tools to the language whose ecosystem they belong to.
pub static TOOLS: phf::Map<&'static str, &'static str> = phf_map! {
    "cargo" => "Rust",
    "rustc" => "Rust",
    "rustup" => "Rust",
    "pip" => "Python",
    "pip3" => "Python",
    "python" => "Python",
    "python3" => "Python",
    "pytest" => "Python",
    "poetry" => "Python",
    "pipenv" => "Python",
    "tox" => "Python",
    "npm" => "JavaScript",
    "npx" => "JavaScript",
    "yarn" => "JavaScript",
    "pnpm" => "JavaScript",
    "node" => "JavaScript",
    "deno" => "TypeScript",
    "tsc" => "TypeScript",
    "go" => "Go",
    "gofmt" => "Go",
    "mvn" => "Java",
    "gradle" => "Java",
    "gem" => "Ruby",
    "bundle" => "Ruby",
    "rake" => "Ruby",
    "composer" => "PHP",
    "dotnet" => "C#",
    "mix" => "Elixir",
    "stack" => "Haskell",
};

/// Language names as they appear in prose, for bare text mentions.
pub static PROSE_NAMES: phf::Map<&'static str, &'static str> = phf_map! {
    "rust" => "Rust",
    "python" => "Python",
    "javascript" => "JavaScript",
    "typescript" => "TypeScript",
    "golang" => "Go",
    "java" => "Java",
    "kotlin" => "Kotlin",
    "ruby" => "Ruby",
    "php" => "PHP",
    "swift" => "Swift",
    "scala" => "Scala",
    "elixir" => "Elixir",
    "haskell" => "Haskell",
};

/// Framework names to the language they target.
pub static FRAMEWORKS: phf::Map<&'static str, (&'static str, &'static str)> = phf_map! {
    "react" => ("React", "JavaScript"),
    "vue" => ("Vue", "JavaScript"),
    "angular" => ("Angular", "TypeScript"),
    "svelte" => ("Svelte", "JavaScript"),
    "next.js" => ("Next.js", "JavaScript"),
    "nextjs" => ("Next.js", "JavaScript"),
    "express" => ("Express", "JavaScript"),
    "nestjs" => ("NestJS", "TypeScript"),
    "django" => ("Django", "Python"),
    "flask" => ("Flask", "Python"),
    "fastapi" => ("FastAPI", "Python"),
    "rails" => ("Rails", "Ruby"),
    "laravel" => ("Laravel", "PHP"),
    "spring" => ("Spring", "Java"),
    "actix" => ("Actix", "Rust"),
    "axum" => ("Axum", "Rust"),
    "rocket" => ("Rocket", "Rust"),
    "tokio" => ("Tokio", "Rust"),
    "gin" => ("Gin", "Go"),
    "echo" => ("Echo", "Go"),
    "phoenix" => ("Phoenix", "Elixir"),
};

/// Testing frameworks and tools to (canonical name, language).
pub static TEST_FRAMEWORKS: phf::Map<&'static str, (&'static str, &'static str)> = phf_map! {
    "jest" => ("Jest", "JavaScript"),
    "mocha" => ("Mocha", "JavaScript"),
    "vitest" => ("Vitest", "JavaScript"),
    "jasmine" => ("Jasmine", "JavaScript"),
    "cypress" => ("Cypress", "JavaScript"),
    "playwright" => ("Playwright", "JavaScript"),
    "pytest" => ("pytest", "Python"),
    "unittest" => ("unittest", "Python"),
    "nose" => ("nose", "Python"),
    "tox" => ("tox", "Python"),
    "junit" => ("JUnit", "Java"),
    "testng" => ("TestNG", "Java"),
    "rspec" => ("RSpec", "Ruby"),
    "minitest" => ("Minitest", "Ruby"),
    "phpunit" => ("PHPUnit", "PHP"),
    "xunit" => ("xUnit", "C#"),
    "nunit" => ("NUnit", "C#"),
    "exunit" => ("ExUnit", "Elixir"),
};

/// Test-runner config files to (framework name, language).
pub static TEST_CONFIG_FILES: phf::Map<&'static str, (&'static str, &'static str)> = phf_map! {
    "jest.config.js" => ("Jest", "JavaScript"),
    "jest.config.ts" => ("Jest", "JavaScript"),
    "vitest.config.ts" => ("Vitest", "JavaScript"),
    "vitest.config.js" => ("Vitest", "JavaScript"),
    ".mocharc.json" => ("Mocha", "JavaScript"),
    ".mocharc.yml" => ("Mocha", "JavaScript"),
    "karma.conf.js" => ("Karma", "JavaScript"),
    "cypress.config.js" => ("Cypress", "JavaScript"),
    "playwright.config.ts" => ("Playwright", "JavaScript"),
    "pytest.ini" => ("pytest", "Python"),
    "tox.ini" => ("tox", "Python"),
    "conftest.py" => ("pytest", "Python"),
    "phpunit.xml" => ("PHPUnit", "PHP"),
    ".rspec" => ("RSpec", "Ruby"),
};

/// Canonical language for a fence tag, ignoring shells and unknowns.
pub fn language_for_tag(tag: &str) -> Option<&'static str> {
    FENCE_TAGS.get(tag).copied()
}

/// Whether a fence tag marks shell/command content.
pub fn is_shell_tag(tag: &str) -> bool {
    SHELL_TAGS.contains_key(tag)
}

/// Language for a file path mention, via manifest name or extension.
pub fn language_for_file(name: &str) -> Option<&'static str> {
    let base = name.rsplit('/').next().unwrap_or(name).to_ascii_lowercase();
    if let Some(&(_, lang)) = MANIFESTS.get(base.as_str()) {
        return Some(lang);
    }
    let ext = base.rsplit('.').next()?;
    if ext == base {
        return None;
    }
    EXTENSIONS.get(ext).copied()
}

/// Language whose ecosystem owns the given command-line tool.
pub fn language_for_tool(tool: &str) -> Option<&'static str> {
    TOOLS.get(tool).copied()
}
