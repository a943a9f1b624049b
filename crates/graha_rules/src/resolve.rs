//! Planet tokens in predicate params: a literal name or `lord(N)`.
//!
//! `lord(N)` is deferred until a chart is known; it names the ruler of the
//! sign sitting in house N from that chart's ascendant.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::chart::Chart;
use crate::error::EvalError;
use crate::math::house_sign_from_ascendant;
use crate::tables::{sign_lord, Planet};

lazy_static! {
    static ref LORD_TOKEN: Regex = Regex::new(r"(?i)^lord\s*\((.*)\)$").unwrap();
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum PlanetRef {
    Named(String),
    LordOf(u8),
}

impl PlanetRef {
    /// Concrete planet name for this chart. Presence in the chart is checked
    /// later by whoever reads the position.
    pub fn resolve(&self, chart: &Chart) -> String {
        match self {
            Self::Named(name) => name.clone(),
            Self::LordOf(house) => {
                let sign = house_sign_from_ascendant(chart.asc_sign(), *house);
                sign_lord(sign).name().to_string()
            }
        }
    }

    /// The graha this token names on a chart, if it is one of the nine.
    pub fn resolve_planet(&self, chart: &Chart) -> Option<Planet> {
        Planet::from_name(&self.resolve(chart))
    }
}

/// Parse a raw token and resolve it in one step.
pub fn resolve_planet(chart: &Chart, token: &str) -> Result<String, EvalError> {
    Ok(token.parse::<PlanetRef>()?.resolve(chart))
}

impl FromStr for PlanetRef {
    type Err = EvalError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let token = raw.trim();
        if token.is_empty() {
            return Err(EvalError::MalformedToken {
                token: raw.to_string(),
                reason: "empty planet token".to_string(),
            });
        }
        let Some(caps) = LORD_TOKEN.captures(token) else {
            return Ok(Self::Named(token.to_string()));
        };

        let digits: String = caps[1].chars().filter(|c| c.is_ascii_digit()).collect();
        if digits.is_empty() {
            return Err(EvalError::MalformedToken {
                token: raw.to_string(),
                reason: "house number must be numeric".to_string(),
            });
        }
        match digits.parse::<u8>() {
            Ok(house) if (1..=12).contains(&house) => Ok(Self::LordOf(house)),
            _ => Err(EvalError::MalformedToken {
                token: raw.to_string(),
                reason: format!("house {} outside 1..12", digits),
            }),
        }
    }
}

impl TryFrom<String> for PlanetRef {
    type Error = EvalError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PlanetRef> for String {
    fn from(value: PlanetRef) -> Self {
        value.to_string()
    }
}

impl fmt::Display for PlanetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => f.write_str(name),
            Self::LordOf(house) => write!(f, "lord({})", house),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::PlanetPosition;

    fn leo_rising() -> Chart {
        Chart::new(125.0, vec![PlanetPosition::at("Moon", 10.0)])
    }

    #[test]
    fn test_parse_tokens() {
        assert_eq!("Saturn".parse::<PlanetRef>().unwrap(), PlanetRef::Named("Saturn".into()));
        assert_eq!("lord(12th)".parse::<PlanetRef>().unwrap(), PlanetRef::LordOf(12));
        assert_eq!(" lord( 9 ) ".parse::<PlanetRef>().unwrap(), PlanetRef::LordOf(9));
    }

    #[test]
    fn test_malformed_lord_token() {
        let err = "lord(twelfth)".parse::<PlanetRef>().unwrap_err();
        assert!(matches!(err, EvalError::MalformedToken { .. }));
        assert!("lord(13)".parse::<PlanetRef>().is_err());
        assert!("".parse::<PlanetRef>().is_err());
    }

    #[test]
    fn test_resolve_against_chart() {
        let chart = leo_rising();
        // Leo rising: 12th = Cancer (Moon), 10th = Taurus (Venus)
        assert_eq!(resolve_planet(&chart, "lord(12)").unwrap(), "Moon");
        assert_eq!(resolve_planet(&chart, "lord(10th)").unwrap(), "Venus");
        assert_eq!(resolve_planet(&chart, "Jupiter").unwrap(), "Jupiter");
    }

    #[test]
    fn test_deserialize_rejects_bad_token() {
        let ok: PlanetRef = serde_json::from_str("\"lord(1)\"").unwrap();
        assert_eq!(ok, PlanetRef::LordOf(1));
        assert!(serde_json::from_str::<PlanetRef>("\"lord(x)\"").is_err());
    }
}
