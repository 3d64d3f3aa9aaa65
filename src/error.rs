//! Error taxonomy for the analysis pipeline.
//!
//! Only two classes of error abort an analysis up front: input-contract
//! violations (the content is not usable text) and dependency cycles in the
//! analyzer registry. Everything else is isolated per-analyzer and surfaces
//! as a recorded failure inside the pipeline result.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can surface from a pipeline invocation.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnalysisError {
    /// The input violated the content contract (not usable text).
    /// Fatal: the pipeline never starts.
    #[error("invalid input: {reason}")]
    InvalidInput { reason: String },

    /// The registered analyzers form a dependency cycle.
    #[error("analyzer dependency cycle: {}", chain.join(" -> "))]
    DependencyCycle { chain: Vec<String> },

    /// One analyzer failed (panic or error). Isolated; siblings keep running.
    #[error("analyzer {analyzer:?} failed: {message}")]
    AnalyzerFailed { analyzer: String, message: String },

    /// One analyzer exceeded the invocation deadline.
    #[error("analyzer {analyzer:?} timed out after {elapsed_ms}ms")]
    Timeout { analyzer: String, elapsed_ms: u64 },

    /// The execution environment broke (runtime startup). Distinct from
    /// `InvalidInput`; the document itself may be fine.
    #[error("pipeline runtime error: {message}")]
    Runtime { message: String },
}

impl AnalysisError {
    /// The analyzer this error is attributed to, if any.
    pub fn analyzer(&self) -> Option<&str> {
        match self {
            AnalysisError::AnalyzerFailed { analyzer, .. }
            | AnalysisError::Timeout { analyzer, .. } => Some(analyzer),
            _ => None,
        }
    }

    /// Whether this error aborts the whole invocation.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            AnalysisError::InvalidInput { .. }
                | AnalysisError::DependencyCycle { .. }
                | AnalysisError::Runtime { .. }
        )
    }
}

/// Why an analyzer registration was rejected.
///
/// Returned as a typed result rather than panicking so external callers can
/// inject custom analyzers and handle rejection programmatically.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    #[error("analyzer name must not be empty")]
    EmptyName,

    #[error("an analyzer named {0:?} is already registered")]
    DuplicateName(String),

    #[error("analyzer {0:?} declares a dependency on itself")]
    SelfDependency(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_attribution() {
        let err = AnalysisError::Timeout {
            analyzer: "commands".to_string(),
            elapsed_ms: 5000,
        };
        assert_eq!(err.analyzer(), Some("commands"));
        assert!(!err.is_fatal());

        let err = AnalysisError::InvalidInput {
            reason: "interior NUL byte".to_string(),
        };
        assert_eq!(err.analyzer(), None);
        assert!(err.is_fatal());
    }

    #[test]
    fn test_runtime_error_is_fatal_but_not_input() {
        let err = AnalysisError::Runtime {
            message: "failed to start runtime".to_string(),
        };
        assert!(err.is_fatal());
        assert_eq!(err.analyzer(), None);
        assert!(!matches!(err, AnalysisError::InvalidInput { .. }));
    }

    #[test]
    fn test_cycle_message_names_chain() {
        let err = AnalysisError::DependencyCycle {
            chain: vec!["a".into(), "b".into(), "a".into()],
        };
        assert!(err.to_string().contains("a -> b -> a"));
    }
}
