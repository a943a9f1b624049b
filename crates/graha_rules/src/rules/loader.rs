//! Batch validation of raw rule definitions.
//!
//! Loading never fails as a whole: each definition is either admitted into
//! the rule set or excluded with diagnostics, and the batch continues.

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashSet};

use super::definition::{RawDefinition, Rule, RuleSet, SignalSpec, StatusCondition, RULE_FIELDS, SIGNAL_FIELDS};
use super::expr::StatusExpr;
use crate::predicates;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticKind {
    Invalid,
    Disabled,
}

/// Why one definition was left out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub source: String,
    pub kind: DiagnosticKind,
    pub message: String,
}

#[derive(Debug, Clone, Default)]
pub struct LoadOutcome {
    pub rules: RuleSet,
    pub diagnostics: Vec<Diagnostic>,
}

enum Checked {
    Admit(Rule),
    Disabled,
    Reject(Vec<String>),
}

/// Validate a batch in order. Same input, same rules and diagnostics.
pub fn load_rules(definitions: &[RawDefinition]) -> LoadOutcome {
    let mut outcome = LoadOutcome::default();
    for raw in definitions {
        match check_definition(raw, &outcome.rules) {
            Checked::Admit(rule) => {
                debug!("Admitted rule '{}' from {}", rule.id, raw.source);
                outcome.rules.insert(rule);
            }
            Checked::Disabled => {
                debug!("Skipping disabled rule in {}", raw.source);
                outcome.diagnostics.push(Diagnostic {
                    source: raw.source.clone(),
                    kind: DiagnosticKind::Disabled,
                    message: "Rule disabled via 'disabled': true (skipped)".to_string(),
                });
            }
            Checked::Reject(messages) => {
                for message in messages {
                    warn!("Rejected rule definition {}: {}", raw.source, message);
                    outcome.diagnostics.push(Diagnostic {
                        source: raw.source.clone(),
                        kind: DiagnosticKind::Invalid,
                        message,
                    });
                }
            }
        }
    }
    outcome
}

/// Number given as a JSON number or a numeric string.
fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        _ => None,
    }
}

fn check_definition(raw: &RawDefinition, admitted: &RuleSet) -> Checked {
    let body = match &raw.body {
        Ok(body) => body,
        Err(reason) => return Checked::Reject(vec![format!("JSON parse error: {}", reason)]),
    };
    let Some(obj) = body.as_object() else {
        return Checked::Reject(vec!["Top-level JSON must be an object".to_string()]);
    };
    if obj.get("disabled") == Some(&Value::Bool(true)) {
        return Checked::Disabled;
    }

    let mut errors = Vec::new();
    for key in obj.keys() {
        if !RULE_FIELDS.contains(&key.as_str()) {
            errors.push(format!("Unknown top-level field '{}'", key));
        }
    }
    if let Some(flag) = obj.get("disabled") {
        if !flag.is_boolean() {
            errors.push("'disabled' must be true/false".to_string());
        }
    }

    // id and signals gate everything that follows
    let id = match obj.get("id") {
        None => {
            errors.push("Missing 'id' at top level".to_string());
            None
        }
        Some(Value::String(id)) if !id.trim().is_empty() => Some(id.clone()),
        Some(_) => {
            errors.push("'id' must be a non-empty string".to_string());
            None
        }
    };
    let signals = match obj.get("signals") {
        None => {
            errors.push("Missing 'signals' at top level".to_string());
            None
        }
        Some(Value::Array(items)) if !items.is_empty() => Some(items),
        Some(_) => {
            errors.push("'signals' must be a non-empty list".to_string());
            None
        }
    };
    let (Some(id), Some(signals)) = (id, signals) else {
        return Checked::Reject(errors);
    };

    if admitted.contains(&id) {
        errors.push(format!("Duplicate rule id '{}' (already loaded)", id));
    }

    let (specs, declared) = check_signals(signals, &mut errors);

    let description = match obj.get("description") {
        None | Some(Value::Null) => None,
        Some(Value::String(text)) => Some(text.clone()),
        Some(_) => {
            errors.push("'description' must be a string".to_string());
            None
        }
    };

    let mut weights = BTreeMap::new();
    if let Some(raw_weights) = obj.get("weights") {
        match raw_weights.as_object() {
            None => errors.push("'weights' must be an object".to_string()),
            Some(map) => {
                for (key, value) in map {
                    if !declared.contains(key) {
                        errors.push(format!("'weights' references unknown signal id '{}'", key));
                    } else if let Some(weight) = as_number(value) {
                        weights.insert(key.clone(), weight);
                    } else {
                        errors.push(format!("'weights.{}' must be a number", key));
                    }
                }
            }
        }
    }

    let mut strength_weights = BTreeMap::new();
    if let Some(raw_flags) = obj.get("strength_weights") {
        match raw_flags.as_object() {
            None => errors.push("'strength_weights' must be an object".to_string()),
            Some(map) => {
                for (key, value) in map {
                    if !declared.contains(key) {
                        errors.push(format!(
                            "'strength_weights' references unknown signal id '{}'",
                            key
                        ));
                    }
                    match value.as_bool() {
                        Some(flag) => {
                            strength_weights.insert(key.clone(), flag);
                        }
                        None => errors.push(format!("'strength_weights.{}' must be true/false", key)),
                    }
                }
            }
        }
    }

    let strong_if = check_condition(obj, "strong_if", &declared, &mut errors);
    let active_if = check_condition(obj, "active_if", &declared, &mut errors);

    let orb_deg = match obj.get("orb_deg") {
        None => None,
        Some(value) => {
            let orb = as_number(value);
            if orb.is_none() {
                errors.push("'orb_deg' must be a number".to_string());
            }
            orb
        }
    };

    if !errors.is_empty() {
        return Checked::Reject(errors);
    }
    Checked::Admit(Rule {
        id,
        description,
        signals: specs,
        weights,
        strength_weights,
        strong_if,
        active_if,
        orb_deg,
    })
}

/// Validate the signal list. Returns the well-formed specs and the ids that
/// later fields may reference.
fn check_signals(items: &[Value], errors: &mut Vec<String>) -> (Vec<SignalSpec>, HashSet<String>) {
    let mut specs = Vec::new();
    let mut declared = HashSet::new();

    for (position, item) in items.iter().enumerate() {
        let Some(sig) = item.as_object() else {
            errors.push(format!("Signal item #{} must be an object", position + 1));
            continue;
        };
        let sid = match sig.get("id") {
            Some(Value::String(sid)) if !sid.is_empty() => sid.clone(),
            _ => {
                errors.push(format!("Signal item #{} missing/invalid 'id'", position + 1));
                continue;
            }
        };
        if !declared.insert(sid.clone()) {
            errors.push(format!("Duplicate signal id '{}'", sid));
            continue;
        }
        for key in sig.keys() {
            if !SIGNAL_FIELDS.contains(&key.as_str()) {
                errors.push(format!("Signal '{}' has unknown field '{}'", sid, key));
            }
        }

        let Some(predicate) = sig.get("predicate").and_then(Value::as_str).filter(|p| !p.is_empty()) else {
            errors.push(format!("Signal '{}' missing/invalid 'predicate'", sid));
            continue;
        };
        let Some(entry) = predicates::lookup(predicate) else {
            errors.push(format!("Unknown predicate '{}' on signal '{}'", predicate, sid));
            continue;
        };
        let params = match sig.get("params") {
            None => Map::new(),
            Some(Value::Object(params)) => params.clone(),
            Some(_) => {
                errors.push(format!("Signal '{}' params must be an object", sid));
                continue;
            }
        };
        if let Err(reason) = entry.check(&Value::Object(params.clone())) {
            errors.push(format!("Signal '{}' params rejected: {}", sid, reason));
            continue;
        }
        specs.push(SignalSpec {
            id: sid,
            predicate: predicate.to_string(),
            params,
        });
    }
    (specs, declared)
}

fn check_condition(
    obj: &Map<String, Value>,
    key: &str,
    declared: &HashSet<String>,
    errors: &mut Vec<String>,
) -> Option<StatusCondition> {
    let value = obj.get(key)?;
    let Some(source) = value.as_str() else {
        errors.push(format!("'{}' must be a string boolean expression", key));
        return None;
    };
    match StatusExpr::parse(source, declared) {
        Ok(expr) => Some(StatusCondition {
            source: source.to_string(),
            expr,
        }),
        Err(err) => {
            errors.push(format!("{} invalid: {}", key, err));
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid(id: &str) -> Value {
        json!({
            "id": id,
            "signals": [
                {"id": "a", "predicate": "planet_in_own_sign", "params": {"planet": "Saturn"}},
                {"id": "b", "predicate": "any_yogakaraka"}
            ],
            "weights": {"a": 1, "b": "0.5"},
            "strength_weights": {"a": true},
            "strong_if": "a and b",
            "active_if": "a or b",
            "orb_deg": 12
        })
    }

    fn messages(outcome: &LoadOutcome) -> Vec<&str> {
        outcome.diagnostics.iter().map(|d| d.message.as_str()).collect()
    }

    #[test]
    fn test_valid_definition_is_compiled() {
        let outcome = load_rules(&[RawDefinition::new("r.json", valid("r1"))]);
        assert!(outcome.diagnostics.is_empty());
        let rule = outcome.rules.get("r1").unwrap();
        assert_eq!(rule.weights["b"], 0.5);
        assert_eq!(rule.orb_deg, Some(12.0));
        assert_eq!(rule.strong_if.as_ref().unwrap().source, "a and b");
    }

    #[test]
    fn test_parse_failure_and_structure() {
        let outcome = load_rules(&[
            RawDefinition::from_json("bad.json", "{"),
            RawDefinition::new("list.json", json!([1, 2])),
        ]);
        assert!(outcome.rules.is_empty());
        assert!(messages(&outcome)[0].starts_with("JSON parse error"));
        assert_eq!(messages(&outcome)[1], "Top-level JSON must be an object");
    }

    #[test]
    fn test_disabled_is_reported_not_invalid() {
        let mut body = valid("r1");
        body["disabled"] = json!(true);
        // disabled wins even over other problems
        body["weights"] = json!("nope");
        let outcome = load_rules(&[RawDefinition::new("off.json", body)]);
        assert!(outcome.rules.is_empty());
        assert_eq!(outcome.diagnostics.len(), 1);
        assert_eq!(outcome.diagnostics[0].kind, DiagnosticKind::Disabled);
    }

    #[test]
    fn test_duplicate_id_rejects_later_definition() {
        let outcome = load_rules(&[
            RawDefinition::new("one.json", valid("same")),
            RawDefinition::new("two.json", valid("same")),
        ]);
        assert_eq!(outcome.rules.len(), 1);
        assert_eq!(outcome.diagnostics[0].source, "two.json");
        assert!(outcome.diagnostics[0].message.contains("Duplicate rule id"));
    }

    #[test]
    fn test_all_problems_of_one_definition_are_collected() {
        let body = json!({
            "id": "r",
            "extra": 1,
            "signals": [
                {"id": "a", "predicate": "no_such_predicate"},
                {"id": "a", "predicate": "any_yogakaraka"},
                {"id": "b", "predicate": "planet_in_house_from_asc", "params": {"planet": "lord(x)", "house": 1}}
            ],
            "weights": {"zzz": 1, "a": "heavy"},
            "strength_weights": {"a": "yes"},
            "strong_if": "a and c",
            "orb_deg": "wide"
        });
        let outcome = load_rules(&[RawDefinition::new("r.json", body)]);
        let msgs = messages(&outcome);
        assert_eq!(
            msgs,
            vec![
                "Unknown top-level field 'extra'",
                "Unknown predicate 'no_such_predicate' on signal 'a'",
                "Duplicate signal id 'a'",
                msgs[3],
                "'weights.a' must be a number",
                "'weights' references unknown signal id 'zzz'",
                "'strength_weights.a' must be true/false",
                "strong_if invalid: Unknown identifier 'c' in status expression",
                "'orb_deg' must be a number",
            ]
        );
        assert!(msgs[3].starts_with("Signal 'b' params rejected"));
        assert!(outcome.diagnostics.iter().all(|d| d.kind == DiagnosticKind::Invalid));
    }

    #[test]
    fn test_expression_safety() {
        let mut body = valid("r");
        body["strong_if"] = json!("os.system");
        let outcome = load_rules(&[RawDefinition::new("r.json", body)]);
        assert!(outcome.rules.is_empty());
        assert_eq!(
            messages(&outcome),
            vec!["strong_if invalid: Illegal token 'os.system' in status expression"]
        );
    }

    #[test]
    fn test_runaway_expression_rejects_only_its_definition() {
        let mut deep = valid("deep");
        deep["strong_if"] = json!(format!("{}a{}", "(".repeat(3000), ")".repeat(3000)));
        let mut nots = valid("nots");
        nots["active_if"] = json!(format!("{}a", "not ".repeat(100_000)));
        let mut nested = valid("nested");
        nested["strong_if"] = json!(format!("{}a", "not ".repeat(100)));
        let outcome = load_rules(&[
            RawDefinition::new("deep.json", deep),
            RawDefinition::new("nots.json", nots),
            RawDefinition::new("nested.json", nested),
            RawDefinition::new("ok.json", valid("ok")),
        ]);
        assert_eq!(outcome.rules.ids(), vec!["ok"]);
        assert_eq!(
            messages(&outcome),
            vec![
                "strong_if invalid: status expression has more than 512 tokens",
                "active_if invalid: status expression has more than 512 tokens",
                "strong_if invalid: status expression nests deeper than 64 levels",
            ]
        );
    }

    #[test]
    fn test_same_input_same_diagnostics() {
        let batch = vec![
            RawDefinition::new("a.json", valid("a")),
            RawDefinition::new("b.json", json!({"id": 3, "signals": []})),
        ];
        let first = load_rules(&batch);
        let second = load_rules(&batch);
        assert_eq!(first.diagnostics, second.diagnostics);
        assert_eq!(first.rules.ids(), second.rules.ids());
        assert_eq!(first.diagnostics.len(), 2);
    }
}
