//! Rule evaluation: signals, weighted score and status.

use log::debug;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

use super::definition::Rule;
use crate::chart::Chart;
use crate::error::EvalError;
use crate::math::round_to;
use crate::predicates;

/// Orb merged into signal params when neither the signal nor the rule sets one.
pub const DEFAULT_ORB_DEG: f64 = 30.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Strong,
    Active,
    Inactive,
}

impl Status {
    /// Higher is better: strong 2, active 1, inactive 0.
    pub fn rank(self) -> u8 {
        match self {
            Status::Strong => 2,
            Status::Active => 1,
            Status::Inactive => 0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Status::Strong => "strong",
            Status::Active => "active",
            Status::Inactive => "inactive",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Signal outcome as reported in a verdict: meta flattened beside the values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignalOutcome {
    #[serde(rename = "bool")]
    pub value: bool,
    pub strength: f64,
    #[serde(flatten)]
    pub meta: Map<String, Value>,
}

/// Signal outcomes in declaration order; serialized as a JSON object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SignalTable(pub Vec<(String, SignalOutcome)>);

impl SignalTable {
    pub fn get(&self, id: &str) -> Option<&SignalOutcome> {
        self.0.iter().find(|(sid, _)| sid == id).map(|(_, outcome)| outcome)
    }

    pub fn iter(&self) -> impl Iterator<Item = &(String, SignalOutcome)> {
        self.0.iter()
    }

    pub fn any_true(&self) -> bool {
        self.0.iter().any(|(_, outcome)| outcome.value)
    }
}

impl Serialize for SignalTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (id, outcome) in &self.0 {
            map.serialize_entry(id, outcome)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Verdict {
    pub id: String,
    pub status: Status,
    /// Weighted score in [0, 1], rounded to 3 decimals.
    pub score: f64,
    pub signals: SignalTable,
    pub weights: BTreeMap<String, f64>,
    pub explain: Vec<String>,
}

/// Evaluate one rule against a chart.
///
/// Any predicate error (missing planet, malformed token) fails the whole call.
pub fn evaluate_rule(chart: &Chart, rule: &Rule, default_orb: f64) -> Result<Verdict, EvalError> {
    let orb = rule.orb_deg.unwrap_or(default_orb);
    let mut signals = Vec::with_capacity(rule.signals.len());
    let mut explain = Vec::with_capacity(rule.signals.len() + 1);

    for spec in &rule.signals {
        let mut params = spec.params.clone();
        params.entry("orb_deg").or_insert_with(|| Value::from(orb));
        let result = predicates::evaluate(&spec.predicate, chart, &Value::Object(params))?;
        explain.push(format!(
            "{}: {} -> {} (strength={:.3})",
            spec.id,
            spec.predicate,
            if result.value { "YES" } else { "NO" },
            result.strength
        ));
        signals.push((
            spec.id.clone(),
            SignalOutcome {
                value: result.value,
                strength: round_to(result.strength, 3),
                meta: result.meta,
            },
        ));
    }
    let signals = SignalTable(signals);

    let mut raw = 0.0;
    let mut total = 0.0;
    for (sid, &weight) in &rule.weights {
        let value = match signals.get(sid) {
            Some(outcome) if rule.strength_weights.get(sid).copied().unwrap_or(false) => outcome.strength,
            Some(outcome) if outcome.value => 1.0,
            _ => 0.0,
        };
        raw += weight * value;
        total += weight;
    }
    let score = if total > 0.0 { raw / total } else { 0.0 };
    explain.push(format!("Weighted score = {:.3}", score));

    let ctx: HashMap<String, bool> = signals
        .iter()
        .map(|(sid, outcome)| (sid.clone(), outcome.value))
        .collect();
    let status = match &rule.strong_if {
        Some(strong_if) => {
            if strong_if.eval(&ctx)? {
                Status::Strong
            } else {
                let active = match &rule.active_if {
                    Some(active_if) => active_if.eval(&ctx)?,
                    None => false,
                };
                if active || signals.any_true() {
                    Status::Active
                } else {
                    Status::Inactive
                }
            }
        }
        None if signals.any_true() => Status::Active,
        None => Status::Inactive,
    };

    debug!("Rule '{}' -> {} (score={:.3})", rule.id, status, score);
    Ok(Verdict {
        id: rule.id.clone(),
        status,
        score: round_to(score, 3),
        signals,
        weights: rule.weights.clone(),
        explain,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::PlanetPosition;
    use crate::rules::definition::RawDefinition;
    use crate::rules::loader::load_rules;
    use serde_json::json;

    fn compile(body: Value) -> Rule {
        let outcome = load_rules(&[RawDefinition::new("test.json", body)]);
        assert!(outcome.diagnostics.is_empty(), "{:?}", outcome.diagnostics);
        let rule = outcome.rules.iter().next().cloned().unwrap();
        rule
    }

    /// Aries rising; Saturn in Capricorn, Jupiter in Cancer.
    fn chart() -> Chart {
        Chart::new(
            3.0,
            vec![
                PlanetPosition::at("Sun", 10.0),
                PlanetPosition::at("Moon", 100.0),
                PlanetPosition::at("Jupiter", 95.0),
                PlanetPosition::at("Saturn", 285.0),
            ],
        )
    }

    #[test]
    fn test_trace_and_echo() {
        let rule = compile(json!({
            "id": "own",
            "signals": [
                {"id": "sat_own", "predicate": "planet_in_own_sign", "params": {"planet": "Saturn"}},
                {"id": "jup_own", "predicate": "planet_in_own_sign", "params": {"planet": "Jupiter"}}
            ],
            "weights": {"sat_own": 2, "jup_own": 1}
        }));
        let verdict = evaluate_rule(&chart(), &rule, DEFAULT_ORB_DEG).unwrap();
        assert_eq!(verdict.status, Status::Active);
        assert!((verdict.score - 0.667).abs() < 1e-9);
        assert_eq!(
            verdict.explain,
            vec![
                "sat_own: planet_in_own_sign -> YES (strength=1.000)",
                "jup_own: planet_in_own_sign -> NO (strength=0.000)",
                "Weighted score = 0.667",
            ]
        );
        assert_eq!(verdict.weights["sat_own"], 2.0);
    }

    #[test]
    fn test_signals_serialize_in_declaration_order() {
        let rule = compile(json!({
            "id": "order",
            "signals": [
                {"id": "zeta", "predicate": "planet_in_house_from_asc", "params": {"planet": "Saturn", "house": 10}},
                {"id": "alpha", "predicate": "any_yogakaraka"}
            ]
        }));
        let verdict = evaluate_rule(&chart(), &rule, DEFAULT_ORB_DEG).unwrap();
        let text = serde_json::to_string(&verdict).unwrap();
        let zeta = text.find("\"zeta\"").unwrap();
        let alpha = text.find("\"alpha\"").unwrap();
        assert!(zeta < alpha);
        let v = serde_json::to_value(&verdict).unwrap();
        assert_eq!(v["signals"]["zeta"]["bool"], json!(true));
        assert_eq!(v["signals"]["zeta"]["target_sign"], json!(10));
        assert_eq!(v["status"], json!("active"));
    }

    #[test]
    fn test_zero_weight_sum_scores_zero() {
        let rule = compile(json!({
            "id": "unweighted",
            "signals": [{"id": "a", "predicate": "planet_in_own_sign", "params": {"planet": "Saturn"}}]
        }));
        let verdict = evaluate_rule(&chart(), &rule, DEFAULT_ORB_DEG).unwrap();
        assert_eq!(verdict.score, 0.0);
        assert_eq!(verdict.status, Status::Active);
    }

    #[test]
    fn test_rule_orb_reaches_predicates() {
        // Sun 10°, Moon 100°: 90° apart; a 95° rule orb makes them "conjunct"
        let rule = compile(json!({
            "id": "orb",
            "orb_deg": 95,
            "signals": [{"id": "c", "predicate": "conjunction", "params": {"a": "Sun", "b": "Moon"}}]
        }));
        let verdict = evaluate_rule(&chart(), &rule, DEFAULT_ORB_DEG).unwrap();
        assert!(verdict.signals.get("c").unwrap().value);

        // without a rule orb the engine default (30) applies, not the predicate's 8
        let rule = compile(json!({
            "id": "default",
            "signals": [{"id": "c", "predicate": "conjunction", "params": {"a": "Sun", "b": "Moon"}}]
        }));
        assert!(!evaluate_rule(&chart(), &rule, DEFAULT_ORB_DEG).unwrap().signals.get("c").unwrap().value);
        assert!(evaluate_rule(&chart(), &rule, 91.0).unwrap().signals.get("c").unwrap().value);
    }

    #[test]
    fn test_missing_planet_fails_call() {
        let rule = compile(json!({
            "id": "venus",
            "signals": [{"id": "v", "predicate": "planet_in_own_sign", "params": {"planet": "Venus"}}]
        }));
        assert_eq!(
            evaluate_rule(&chart(), &rule, DEFAULT_ORB_DEG),
            Err(EvalError::PlanetNotFound("Venus".to_string()))
        );
    }
}
