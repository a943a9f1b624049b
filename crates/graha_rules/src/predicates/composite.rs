//! Multi-step predicate linking a house lord's exaltation to karaka planets.
//!
//! Steps: take the lord of `house`; find its exaltation sign and the house
//! that sign occupies from the ascendant; collect the planets whose natural
//! karaka houses include it; then test every karaka against every target for
//! any-connection, a trine (5th/9th sign) or the 3/11 axis.

use serde::Deserialize;
use serde_json::{json, Value};

use super::relations::any_connection;
use super::{House, Predicate, SignalResult};
use crate::chart::Chart;
use crate::error::EvalError;
use crate::math::{house_of_sign_from_ascendant, house_sign_from_ascendant, round_to, sign_distance};
use crate::resolve::PlanetRef;
use crate::tables::{exaltation_sign, karaka_houses, sign_lord, SEVEN_PLANETS};

const TRIKONA_DISTANCES: [u8; 2] = [5, 9];
const AXIS_3_11_DISTANCES: [u8; 2] = [3, 11];

fn ninth() -> House {
    House(9)
}

fn default_targets() -> Vec<PlanetRef> {
    vec![PlanetRef::LordOf(10), PlanetRef::LordOf(1)]
}

fn orb_8() -> f64 {
    8.0
}

fn yes() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct KarakaRelationParams {
    #[serde(default = "ninth")]
    pub house: House,
    #[serde(default = "default_targets")]
    pub targets: Vec<PlanetRef>,
    #[serde(default = "orb_8")]
    pub orb_deg: f64,
    #[serde(default = "yes")]
    pub include_trikona: bool,
    #[serde(default = "yes")]
    pub include_3_11: bool,
}

/// One karaka/target pair that related in at least one way.
#[derive(Debug, Clone, PartialEq)]
pub struct PairHit {
    pub karaka: String,
    pub target: String,
    pub connection: bool,
    pub trikona: bool,
    pub axis_3_11: bool,
    pub strength: f64,
}

impl From<&PairHit> for Value {
    fn from(hit: &PairHit) -> Self {
        json!({
            "karaka": hit.karaka,
            "target": hit.target,
            "connection": hit.connection,
            "trikona": hit.trikona,
            "axis_3_11": hit.axis_3_11,
            "strength": hit.strength,
        })
    }
}

pub struct LordExaltationKarakaRelations;

impl Predicate for LordExaltationKarakaRelations {
    type Params = KarakaRelationParams;
    const NAME: &'static str = "lord_exaltation_karaka_relations";

    fn evaluate(chart: &Chart, params: &Self::Params) -> Result<SignalResult, EvalError> {
        let asc = chart.asc_sign();
        let lord = sign_lord(house_sign_from_ascendant(asc, params.house.0));
        let Some(exalted) = exaltation_sign(lord) else {
            return Ok(SignalResult::flag(false).with("lord", lord.name()));
        };
        let exaltation_house = house_of_sign_from_ascendant(asc, exalted);

        let mut karakas: Vec<&'static str> = Vec::new();
        for planet in SEVEN_PLANETS.iter().filter(|p| karaka_houses(**p).contains(&exaltation_house)) {
            chart.planet(planet.name())?;
            karakas.push(planet.name());
        }

        let mut hits = Vec::new();
        let mut best = 0.0f64;
        for target in &params.targets {
            let target = target.resolve(chart);
            let target_sign = chart.sign_of(&target)?;
            for karaka in &karakas {
                // a planet does not relate to itself
                if karaka.eq_ignore_ascii_case(&target) {
                    continue;
                }
                let link = any_connection(chart, karaka, &target, params.orb_deg)?;
                let distance = sign_distance(chart.sign_of(karaka)?, target_sign);
                let trikona = params.include_trikona && TRIKONA_DISTANCES.contains(&distance);
                let axis_3_11 = params.include_3_11 && AXIS_3_11_DISTANCES.contains(&distance);
                best = best.max(link.strength);
                if link.value || trikona || axis_3_11 {
                    hits.push(PairHit {
                        karaka: karaka.to_string(),
                        target: target.clone(),
                        connection: link.value,
                        trikona,
                        axis_3_11,
                        strength: round_to(link.strength, 3),
                    });
                }
            }
        }

        let pairs: Vec<Value> = hits.iter().map(Value::from).collect();
        Ok(SignalResult::new(!hits.is_empty(), best)
            .with("lord", lord.name())
            .with("exaltation_sign", exalted)
            .with("exaltation_house", exaltation_house)
            .with("karakas", karakas)
            .with("pairs", pairs))
    }
}
