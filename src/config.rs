//! Pipeline configuration.
//!
//! The config is consumed, not owned: the CLI or host application builds
//! one (possibly from YAML) and hands it in. Out-of-range values never
//! crash initialization; they are clamped and the adjustment is recorded as
//! a diagnostic that surfaces in `ParseResult.warnings`.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Default cap on retained language contexts.
pub const DEFAULT_MAX_CONTEXTS: usize = 50;
/// Default invocation deadline.
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;
/// Default confidence threshold applied to the aggregated language list.
pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.0;

/// Raw, possibly out-of-range settings as the caller supplied them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    /// Reuse parsed ASTs across calls on identical content.
    #[serde(default = "default_true")]
    pub enable_caching: bool,
    /// Record per-analyzer processing times.
    #[serde(default)]
    pub enable_performance_monitoring: bool,
    /// Languages below this confidence are dropped from the final list.
    #[serde(default)]
    pub confidence_threshold: f64,
    /// Cap on retained language contexts.
    #[serde(default = "default_max_contexts")]
    pub max_contexts: i64,
    /// Let untagged code fences inherit the enclosing context's language.
    #[serde(default = "default_true")]
    pub enable_context_inheritance: bool,
    /// Deadline for one `execute()` invocation, in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_true() -> bool {
    true
}

fn default_max_contexts() -> i64 {
    DEFAULT_MAX_CONTEXTS as i64
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            enable_caching: true,
            enable_performance_monitoring: false,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            max_contexts: DEFAULT_MAX_CONTEXTS as i64,
            enable_context_inheritance: true,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

impl AnalyzerConfig {
    /// Load a config from a YAML file.
    pub fn parse_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let config: AnalyzerConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Clamp out-of-range values into a usable config. Each adjustment is
    /// recorded as a diagnostic instead of an error.
    pub fn validate(self) -> ValidatedConfig {
        let mut diagnostics = Vec::new();

        let confidence_threshold = if !(0.0..=1.0).contains(&self.confidence_threshold) {
            let clamped = self.confidence_threshold.clamp(0.0, 1.0);
            diagnostics.push(format!(
                "confidence_threshold {} out of range, clamped to {}",
                self.confidence_threshold, clamped
            ));
            clamped
        } else {
            self.confidence_threshold
        };

        let max_contexts = if self.max_contexts <= 0 {
            diagnostics.push(format!(
                "max_contexts {} out of range, using default {}",
                self.max_contexts, DEFAULT_MAX_CONTEXTS
            ));
            DEFAULT_MAX_CONTEXTS
        } else {
            self.max_contexts as usize
        };

        let timeout_ms = if self.timeout_ms == 0 {
            diagnostics.push(format!(
                "timeout_ms 0 would reject every input, using default {}",
                DEFAULT_TIMEOUT_MS
            ));
            DEFAULT_TIMEOUT_MS
        } else {
            self.timeout_ms
        };

        for d in &diagnostics {
            log::warn!("config: {}", d);
        }

        ValidatedConfig {
            enable_caching: self.enable_caching,
            enable_performance_monitoring: self.enable_performance_monitoring,
            confidence_threshold,
            max_contexts,
            enable_context_inheritance: self.enable_context_inheritance,
            timeout_ms,
            diagnostics,
        }
    }
}

/// Settings after clamping, plus what was adjusted.
#[derive(Debug, Clone)]
pub struct ValidatedConfig {
    pub enable_caching: bool,
    pub enable_performance_monitoring: bool,
    pub confidence_threshold: f64,
    pub max_contexts: usize,
    pub enable_context_inheritance: bool,
    pub timeout_ms: u64,
    /// Human-readable notes about clamped values.
    pub diagnostics: Vec<String>,
}

impl Default for ValidatedConfig {
    fn default() -> Self {
        AnalyzerConfig::default().validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = ValidatedConfig::default();
        assert!(config.enable_caching);
        assert!(!config.enable_performance_monitoring);
        assert_eq!(config.confidence_threshold, 0.0);
        assert_eq!(config.max_contexts, DEFAULT_MAX_CONTEXTS);
        assert!(config.enable_context_inheritance);
        assert!(config.diagnostics.is_empty());
    }

    #[test]
    fn test_negative_threshold_is_clamped_not_fatal() {
        let config = AnalyzerConfig {
            confidence_threshold: -0.5,
            ..Default::default()
        }
        .validate();
        assert_eq!(config.confidence_threshold, 0.0);
        assert_eq!(config.diagnostics.len(), 1);
    }

    #[test]
    fn test_negative_max_contexts_uses_default() {
        let config = AnalyzerConfig {
            max_contexts: -3,
            ..Default::default()
        }
        .validate();
        assert_eq!(config.max_contexts, DEFAULT_MAX_CONTEXTS);
        assert!(!config.diagnostics.is_empty());
    }

    #[test]
    fn test_parse_yaml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "enable_caching: false\nconfidence_threshold: 0.4\nmax_contexts: 5"
        )
        .unwrap();
        let config = AnalyzerConfig::parse_file(file.path()).unwrap().validate();
        assert!(!config.enable_caching);
        assert_eq!(config.confidence_threshold, 0.4);
        assert_eq!(config.max_contexts, 5);
    }
}
