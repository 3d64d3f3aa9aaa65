//! Dependency-ordered scheduling of analyzers.
//!
//! Produces execution levels: every analyzer in level N depends only on
//! analyzers in levels < N, so one level can run concurrently and levels
//! join in order. Dependencies on names not present in the registry are
//! ignored here; the pipeline marks them as failed upstreams so dependents
//! degrade at run time instead of erroring at schedule time.

use std::collections::{HashMap, HashSet};

use crate::error::AnalysisError;

/// Compute execution levels for `(name, dependencies)` pairs.
///
/// Returns `DependencyCycle` when the declared dependencies cannot be
/// ordered.
pub fn levels(
    analyzers: &[(String, Vec<String>)],
) -> Result<Vec<Vec<String>>, AnalysisError> {
    let registered: HashSet<&str> = analyzers.iter().map(|(n, _)| n.as_str()).collect();
    let mut placed: HashMap<&str, usize> = HashMap::new();
    let mut remaining: Vec<&(String, Vec<String>)> = analyzers.iter().collect();

    while !remaining.is_empty() {
        let mut progressed = false;
        remaining.retain(|(name, deps)| {
            let ready = deps.iter().all(|d| {
                // Unregistered dependencies cannot order anything.
                !registered.contains(d.as_str()) || placed.contains_key(d.as_str())
            });
            if ready {
                let level = deps
                    .iter()
                    .filter_map(|d| placed.get(d.as_str()))
                    .max()
                    .map(|l| l + 1)
                    .unwrap_or(0);
                placed.insert(name.as_str(), level);
                progressed = true;
                false
            } else {
                true
            }
        });

        if !progressed {
            let chain: Vec<String> = remaining.iter().map(|(n, _)| n.clone()).collect();
            return Err(AnalysisError::DependencyCycle { chain });
        }
    }

    let depth = placed.values().max().map(|l| l + 1).unwrap_or(0);
    let mut out: Vec<Vec<String>> = vec![Vec::new(); depth];
    // Keep registration order within a level for determinism.
    for (name, _) in analyzers {
        let level = placed[name.as_str()];
        out[level].push(name.clone());
    }
    Ok(out)
}

/// Names a given analyzer set depends on but does not contain.
pub fn missing_dependencies(analyzers: &[(String, Vec<String>)]) -> Vec<String> {
    let registered: HashSet<&str> = analyzers.iter().map(|(n, _)| n.as_str()).collect();
    let mut missing = Vec::new();
    for (_, deps) in analyzers {
        for dep in deps {
            if !registered.contains(dep.as_str()) && !missing.contains(dep) {
                missing.push(dep.clone());
            }
        }
    }
    missing
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph(pairs: &[(&str, &[&str])]) -> Vec<(String, Vec<String>)> {
        pairs
            .iter()
            .map(|(n, d)| {
                (
                    n.to_string(),
                    d.iter().map(|s| s.to_string()).collect(),
                )
            })
            .collect()
    }

    #[test]
    fn test_independent_analyzers_share_a_level() {
        let out = levels(&graph(&[("a", &[]), ("b", &[]), ("c", &[])])).unwrap();
        assert_eq!(out, vec![vec!["a", "b", "c"]]);
    }

    #[test]
    fn test_dependents_run_later() {
        let out = levels(&graph(&[
            ("language", &[]),
            ("metadata", &[]),
            ("commands", &["language"]),
            ("testing", &["language"]),
        ]))
        .unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0], vec!["language", "metadata"]);
        assert_eq!(out[1], vec!["commands", "testing"]);
    }

    #[test]
    fn test_chain_builds_levels() {
        let out = levels(&graph(&[("c", &["b"]), ("b", &["a"]), ("a", &[])])).unwrap();
        assert_eq!(out, vec![vec!["a"], vec!["b"], vec!["c"]]);
    }

    #[test]
    fn test_cycle_detected() {
        let err = levels(&graph(&[("a", &["b"]), ("b", &["a"])])).unwrap_err();
        match err {
            AnalysisError::DependencyCycle { chain } => {
                assert_eq!(chain.len(), 2);
            }
            other => panic!("expected cycle, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_dependency_does_not_block() {
        let out = levels(&graph(&[("a", &["ghost"])])).unwrap();
        assert_eq!(out, vec![vec!["a"]]);
        let missing = missing_dependencies(&graph(&[("a", &["ghost"])]));
        assert_eq!(missing, vec!["ghost"]);
    }
}
