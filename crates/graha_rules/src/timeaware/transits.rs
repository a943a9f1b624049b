//! Transit snapshots and transit-to-natal aspects.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::aspects::mutual_aspect_hybrid;
use crate::chart::{Chart, PlanetPosition};
use crate::math::round_to;
use crate::tables::sign_name;

/// Orb for transit-to-natal degree closeness.
pub const DEFAULT_TRANSIT_ORB_DEG: f64 = 6.0;

/// When a snapshot was taken, as supplied by the ephemeris caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitMoment {
    pub date: NaiveDate,
    pub time: NaiveTime,
    #[serde(default)]
    pub tz_hours: f64,
    #[serde(default = "lahiri")]
    pub ayanamsha: String,
}

fn lahiri() -> String {
    "Lahiri".to_string()
}

/// Transiting planet positions for one moment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransitSnapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub when: Option<TransitMoment>,
    pub planets: Vec<PlanetPosition>,
}

impl TransitSnapshot {
    pub fn new(planets: Vec<PlanetPosition>) -> Self {
        Self { when: None, planets }
    }

    pub fn planet(&self, name: &str) -> Option<&PlanetPosition> {
        self.planets.iter().find(|p| p.name.eq_ignore_ascii_case(name))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BodyPoint {
    pub name: String,
    pub sign_num: u8,
    pub sign: String,
    pub lon: f64,
}

impl From<&PlanetPosition> for BodyPoint {
    fn from(p: &PlanetPosition) -> Self {
        Self {
            name: p.name.clone(),
            sign_num: p.sign_num,
            sign: sign_name(p.sign_num).to_string(),
            lon: round_to(p.longitude, 2),
        }
    }
}

/// A transit planet and a natal planet in mutual sign aspect.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AspectHit {
    pub transit: BodyPoint,
    pub natal: BodyPoint,
    pub deg_ok: bool,
    pub angle_diff: f64,
    pub strength: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NatalAspects {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub when: Option<TransitMoment>,
    pub asc_sign_num: u8,
    /// Strongest first.
    pub hits: Vec<AspectHit>,
}

impl NatalAspects {
    /// Best strength of `transit` onto any of `natal_targets`, 0.0 if none.
    pub fn max_strength(&self, transit: &str, natal_targets: &[&str]) -> f64 {
        self.hits
            .iter()
            .filter(|h| h.transit.name.eq_ignore_ascii_case(transit))
            .filter(|h| natal_targets.iter().any(|t| h.natal.name.eq_ignore_ascii_case(t)))
            .map(|h| h.strength)
            .fold(0.0, f64::max)
    }
}

/// Every transit x natal pair in mutual sign aspect, scored by degree
/// closeness against `orb`.
pub fn aspects_to_natal(natal: &Chart, snapshot: &TransitSnapshot, orb: f64) -> NatalAspects {
    let mut hits = Vec::new();
    for t in &snapshot.planets {
        for n in &natal.planets {
            let m = mutual_aspect_hybrid(t.into(), n.into(), orb);
            if !m.sign_mutual {
                continue;
            }
            hits.push(AspectHit {
                transit: t.into(),
                natal: n.into(),
                deg_ok: m.deg_ok,
                angle_diff: round_to(m.angle_diff, 2),
                strength: round_to(m.strength, 3),
            });
        }
    }
    // stable: ties keep transit-major order
    hits.sort_by(|a, b| b.strength.total_cmp(&a.strength));
    NatalAspects {
        when: snapshot.when.clone(),
        asc_sign_num: natal.asc_sign(),
        hits,
    }
}
