//! The rule engine: a hot-swappable rule set plus evaluation entry points.

use log::{info, warn};
use serde::Serialize;
use std::sync::{Arc, RwLock};

use crate::chart::Chart;
use crate::error::EngineError;
use crate::rules::{evaluate_rule, load_rules, Diagnostic, RawDefinition, RuleSet, Verdict, DEFAULT_ORB_DEG};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReloadSummary {
    pub count: usize,
    pub ids: Vec<String>,
    pub errors: Vec<Diagnostic>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadedRules {
    pub count: usize,
    pub ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleFailure {
    pub id: String,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationReport {
    pub verdicts: Vec<Verdict>,
    pub failures: Vec<RuleFailure>,
}

/// Holds the current rule set. Readers take a snapshot; `reload` replaces it
/// whole, so an evaluation never sees a half-loaded set.
pub struct RuleEngine {
    rules: RwLock<Arc<RuleSet>>,
    default_orb: f64,
}

impl Default for RuleEngine {
    fn default() -> Self {
        Self::new(DEFAULT_ORB_DEG)
    }
}

impl RuleEngine {
    pub fn new(default_orb: f64) -> Self {
        Self {
            rules: RwLock::new(Arc::new(RuleSet::new())),
            default_orb,
        }
    }

    pub fn default_orb(&self) -> f64 {
        self.default_orb
    }

    /// Current rule set. The lock is released before this returns.
    pub fn snapshot(&self) -> Arc<RuleSet> {
        let guard = self.rules.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        Arc::clone(&guard)
    }

    /// Validate `definitions` and replace the loaded set with whatever passed.
    pub fn reload(&self, definitions: &[RawDefinition]) -> ReloadSummary {
        let outcome = load_rules(definitions);
        let ids = outcome.rules.ids();
        let fresh = Arc::new(outcome.rules);
        {
            let mut guard = self.rules.write().unwrap_or_else(|poisoned| poisoned.into_inner());
            *guard = fresh;
        }
        info!(
            "Loaded {} rules from {} definitions ({} diagnostics)",
            ids.len(),
            definitions.len(),
            outcome.diagnostics.len()
        );
        ReloadSummary {
            count: ids.len(),
            ids,
            errors: outcome.diagnostics,
        }
    }

    pub fn list_loaded(&self) -> LoadedRules {
        let ids = self.snapshot().ids();
        LoadedRules { count: ids.len(), ids }
    }

    pub fn evaluate_one(&self, chart: &Chart, id: &str) -> Result<Verdict, EngineError> {
        let rules = self.snapshot();
        let rule = rules
            .get(id)
            .ok_or_else(|| EngineError::RuleNotFound(id.to_string()))?;
        evaluate_rule(chart, rule, self.default_orb).map_err(|source| EngineError::Evaluation {
            rule: id.to_string(),
            source,
        })
    }

    /// Evaluate every loaded rule in load order. A failing rule is reported
    /// and skipped; the rest still run.
    pub fn evaluate_all(&self, chart: &Chart) -> EvaluationReport {
        let rules = self.snapshot();
        let mut verdicts = Vec::with_capacity(rules.len());
        let mut failures = Vec::new();
        for rule in rules.iter() {
            match evaluate_rule(chart, rule, self.default_orb) {
                Ok(verdict) => verdicts.push(verdict),
                Err(e) => {
                    warn!("Rule '{}' failed: {}", rule.id, e);
                    failures.push(RuleFailure {
                        id: rule.id.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }
        EvaluationReport { verdicts, failures }
    }
}
