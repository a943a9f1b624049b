//! Rule definitions as accepted by the loader, and the validated form.

use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};

use super::expr::StatusExpr;

/// Top-level fields a rule definition may carry.
pub const RULE_FIELDS: &[&str] = &[
    "id",
    "description",
    "disabled",
    "signals",
    "weights",
    "strength_weights",
    "strong_if",
    "active_if",
    "orb_deg",
];

/// Fields a signal entry may carry.
pub const SIGNAL_FIELDS: &[&str] = &["id", "predicate", "params"];

/// One unvalidated definition as handed over by whoever read it.
#[derive(Debug, Clone)]
pub struct RawDefinition {
    /// Where it came from (a file name, usually).
    pub source: String,
    /// The parsed JSON, or the reason it could not be parsed.
    pub body: Result<Value, String>,
}

impl RawDefinition {
    pub fn new(source: impl Into<String>, body: Value) -> Self {
        Self {
            source: source.into(),
            body: Ok(body),
        }
    }

    /// Parse JSON text, keeping a parse failure as the body.
    pub fn from_json(source: impl Into<String>, text: &str) -> Self {
        Self {
            source: source.into(),
            body: serde_json::from_str(text).map_err(|e| e.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalSpec {
    pub id: String,
    pub predicate: String,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub params: Map<String, Value>,
}

/// A compiled status expression that remembers its source text.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusCondition {
    pub source: String,
    pub expr: StatusExpr,
}

impl StatusCondition {
    pub fn eval(&self, ctx: &HashMap<String, bool>) -> Result<bool, crate::error::EvalError> {
        self.expr.eval(ctx)
    }
}

impl Serialize for StatusCondition {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.source)
    }
}

/// A validated rule. Serializes back to the definition wire format.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rule {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub signals: Vec<SignalSpec>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub weights: BTreeMap<String, f64>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub strength_weights: BTreeMap<String, bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strong_if: Option<StatusCondition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_if: Option<StatusCondition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orb_deg: Option<f64>,
}

/// Validated rules in load order, addressable by id.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<Rule>,
    index: HashMap<String, usize>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a rule. Returns false (and drops it) when the id is taken.
    pub fn insert(&mut self, rule: Rule) -> bool {
        if self.index.contains_key(&rule.id) {
            return false;
        }
        self.index.insert(rule.id.clone(), self.rules.len());
        self.rules.push(rule);
        true
    }

    pub fn get(&self, id: &str) -> Option<&Rule> {
        self.index.get(id).map(|&i| &self.rules[i])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn ids(&self) -> Vec<String> {
        self.rules.iter().map(|r| r.id.clone()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
