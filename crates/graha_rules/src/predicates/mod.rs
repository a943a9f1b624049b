//! Named predicates evaluated against a chart.
//!
//! Every predicate is a pure function `(chart, params) -> SignalResult`. The
//! registry maps rule-facing names to type-erased entries so the loader can
//! check parameter shapes up front and the evaluator can dispatch by name.

use lazy_static::lazy_static;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::chart::{Chart, PlanetPosition};
use crate::error::EvalError;
use crate::math::round_to;
use crate::resolve::PlanetRef;

pub mod composite;
pub mod houses;
pub mod placement;
pub mod relations;
pub mod yogakaraka;

/// Outcome of one signal: a truth value plus a graded strength.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalResult {
    #[serde(rename = "bool")]
    pub value: bool,
    pub strength: f64,
    #[serde(default)]
    pub meta: Map<String, Value>,
}

impl SignalResult {
    pub fn new(value: bool, strength: f64) -> Self {
        Self {
            value,
            strength,
            meta: Map::new(),
        }
    }

    /// Boolean signal whose strength mirrors the truth (1.0 or 0.0).
    pub fn flag(value: bool) -> Self {
        Self::new(value, if value { 1.0 } else { 0.0 })
    }

    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.meta.insert(key.to_string(), value.into());
        self
    }

    /// Clamp strength to [0, 1] and round it to 3 decimals.
    fn finish(mut self) -> Self {
        self.strength = round_to(self.strength.clamp(0.0, 1.0), 3);
        self
    }
}

/// A predicate with a typed parameter bag.
pub trait Predicate {
    /// Parameters, deserialized from the signal's `params` object.
    type Params: DeserializeOwned;

    /// Name used by rule definitions.
    const NAME: &'static str;

    fn evaluate(chart: &Chart, params: &Self::Params) -> Result<SignalResult, EvalError>;
}

/// Type-erased registry entry.
#[derive(Clone, Copy)]
pub struct PredicateEntry {
    pub name: &'static str,
    run: fn(&Chart, &Value) -> Result<SignalResult, EvalError>,
    check: fn(&Value) -> Result<(), String>,
}

impl PredicateEntry {
    fn of<P: Predicate>() -> Self {
        Self {
            name: P::NAME,
            run: run_predicate::<P>,
            check: check_params::<P>,
        }
    }

    /// Parse `params` and evaluate against `chart`.
    pub fn run(&self, chart: &Chart, params: &Value) -> Result<SignalResult, EvalError> {
        (self.run)(chart, params)
    }

    /// Verify the parameter shape without a chart.
    pub fn check(&self, params: &Value) -> Result<(), String> {
        (self.check)(params)
    }
}

impl std::fmt::Debug for PredicateEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PredicateEntry").field("name", &self.name).finish()
    }
}

fn parse_params<P: Predicate>(params: &Value) -> Result<P::Params, EvalError> {
    let bag = match params {
        Value::Null => Value::Object(Map::new()),
        other => other.clone(),
    };
    serde_json::from_value(bag).map_err(|e| EvalError::InvalidParams {
        predicate: P::NAME.to_string(),
        message: e.to_string(),
    })
}

fn run_predicate<P: Predicate>(chart: &Chart, params: &Value) -> Result<SignalResult, EvalError> {
    let params = parse_params::<P>(params)?;
    P::evaluate(chart, &params).map(SignalResult::finish)
}

fn check_params<P: Predicate>(params: &Value) -> Result<(), String> {
    parse_params::<P>(params).map(|_| ()).map_err(|e| e.to_string())
}

lazy_static! {
    static ref REGISTRY: BTreeMap<&'static str, PredicateEntry> = {
        use composite::*;
        use houses::*;
        use placement::*;
        use relations::*;
        use yogakaraka::*;

        [
            PredicateEntry::of::<PlanetInKarakaHousesOf>(),
            PredicateEntry::of::<PlanetInKarakaPlacesOf>(),
            PredicateEntry::of::<PlanetInSigns>(),
            PredicateEntry::of::<PlanetInHouseFromAsc>(),
            PredicateEntry::of::<PlanetInHouseGroupFromAsc>(),
            PredicateEntry::of::<PlanetInOwnSign>(),
            PredicateEntry::of::<PlanetInExaltation>(),
            PredicateEntry::of::<PlanetDebilitated>(),
            PredicateEntry::of::<PlanetInMoolatrikona>(),
            PredicateEntry::of::<PlanetRetrograde>(),
            PredicateEntry::of::<PlanetCombust>(),
            PredicateEntry::of::<MutualAspectHybrid>(),
            PredicateEntry::of::<DegreeAspectPredicate>(),
            PredicateEntry::of::<ConjunctionPredicate>(),
            PredicateEntry::of::<AnyConnection>(),
            PredicateEntry::of::<ExaltationLordSupport>(),
            PredicateEntry::of::<DebilitationLordSupport>(),
            PredicateEntry::of::<LordExchange>(),
            PredicateEntry::of::<KendraFrom>(),
            PredicateEntry::of::<LordExaltationKarakaRelations>(),
            PredicateEntry::of::<AnyYogakaraka>(),
            PredicateEntry::of::<YogakarakaInGroupFromAsc>(),
            PredicateEntry::of::<YogakarakaStrongPlace>(),
            PredicateEntry::of::<BeneficsOccupyHouseFromAsc>(),
            PredicateEntry::of::<BeneficsAspectHouseFromAsc>(),
            PredicateEntry::of::<MaleficsOccupyHouseFromAsc>(),
            PredicateEntry::of::<MaleficsAspectHouseFromAsc>(),
            PredicateEntry::of::<SavLiteThreshold>(),
        ]
        .into_iter()
        .map(|entry| (entry.name, entry))
        .collect()
    };
}

pub fn lookup(name: &str) -> Option<&'static PredicateEntry> {
    REGISTRY.get(name)
}

pub fn is_registered(name: &str) -> bool {
    REGISTRY.contains_key(name)
}

/// Registered predicate names, sorted.
pub fn names() -> Vec<&'static str> {
    REGISTRY.keys().copied().collect()
}

/// Invoke a registered predicate by name.
pub fn evaluate(name: &str, chart: &Chart, params: &Value) -> Result<SignalResult, EvalError> {
    lookup(name)
        .ok_or_else(|| EvalError::UnknownPredicate(name.to_string()))?
        .run(chart, params)
}

// Shared parameter shapes.

/// A house number, 1-12. Rule files may write it as an integer, a whole
/// float (`10.0`) or a numeric string (`"10"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "Value")]
pub struct House(pub u8);

impl TryFrom<u8> for House {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        if (1..=12).contains(&value) {
            Ok(Self(value))
        } else {
            Err(format!("house {} outside 1..12", value))
        }
    }
}

impl TryFrom<Value> for House {
    type Error = String;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        let number = match &value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
        .ok_or_else(|| format!("house must be a number, got {}", value))?;
        if number.fract() != 0.0 || !(1.0..=12.0).contains(&number) {
            return Err(format!("house {} outside 1..12", value));
        }
        Self::try_from(number as u8)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlanetParams {
    pub planet: PlanetRef,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PairParams {
    pub a: PlanetRef,
    pub b: PlanetRef,
}

/// Predicates that take no parameters still accept (and ignore) a bag.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NoParams {}

/// Resolve a token and fetch the planet's position.
pub(crate) fn locate<'c>(chart: &'c Chart, token: &PlanetRef) -> Result<&'c PlanetPosition, EvalError> {
    chart.planet(&token.resolve(chart))
}
