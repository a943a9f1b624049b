//! Two-planet relations: aspects, conjunction, exchange and kendra placement.

use serde::Deserialize;
use serde_json::Value;

use super::{locate, PairParams, Predicate, SignalResult};
use crate::aspects::{aspect_by_degree, conjunction, mutual_aspect_hybrid, Body};
use crate::chart::Chart;
use crate::error::EvalError;
use crate::math::{closeness, forward_arc, minimal_angular_distance, round_to, signs_from_houses};
use crate::resolve::PlanetRef;
use crate::tables::{debilitation_sign, exaltation_sign, sign_lord, Planet};

/// Smallest aspect orb any-connection grants the mutual-aspect leg.
const MIN_CONNECTION_ASPECT_ORB: f64 = 15.0;
const KENDRA_ANGLES: [f64; 4] = [0.0, 90.0, 180.0, 270.0];

fn orb_30() -> f64 {
    30.0
}

fn orb_8() -> f64 {
    8.0
}

fn orb_12() -> f64 {
    12.0
}

fn yes() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct OrbPairParams {
    pub a: PlanetRef,
    pub b: PlanetRef,
    #[serde(default = "orb_30")]
    pub orb_deg: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TightPairParams {
    pub a: PlanetRef,
    pub b: PlanetRef,
    #[serde(default = "orb_8")]
    pub orb_deg: f64,
}

/// Sign drishti both ways decides truth; degree closeness decides strength.
pub struct MutualAspectHybrid;

impl Predicate for MutualAspectHybrid {
    type Params = OrbPairParams;
    const NAME: &'static str = "mutual_aspect_hybrid";

    fn evaluate(chart: &Chart, params: &Self::Params) -> Result<SignalResult, EvalError> {
        let a = locate(chart, &params.a)?;
        let b = locate(chart, &params.b)?;
        let m = mutual_aspect_hybrid(a.into(), b.into(), params.orb_deg);
        Ok(SignalResult::new(m.sign_mutual, m.strength)
            .with("deg_ok", m.deg_ok)
            .with("angle_diff", round_to(m.angle_diff, 2)))
    }
}

/// Directional: how close `b` sits to one of `a`'s exact aspect angles.
pub struct DegreeAspectPredicate;

impl Predicate for DegreeAspectPredicate {
    type Params = OrbPairParams;
    const NAME: &'static str = "degree_aspect";

    fn evaluate(chart: &Chart, params: &Self::Params) -> Result<SignalResult, EvalError> {
        let a = locate(chart, &params.a)?;
        let b = locate(chart, &params.b)?;
        let hit = aspect_by_degree(&a.name, a.longitude, b.longitude, params.orb_deg);
        Ok(SignalResult::new(hit.within_orb, closeness(hit.diff, params.orb_deg))
            .with("angle_diff", round_to(hit.diff, 2)))
    }
}

pub struct ConjunctionPredicate;

impl Predicate for ConjunctionPredicate {
    type Params = TightPairParams;
    const NAME: &'static str = "conjunction";

    fn evaluate(chart: &Chart, params: &Self::Params) -> Result<SignalResult, EvalError> {
        let a = locate(chart, &params.a)?;
        let b = locate(chart, &params.b)?;
        let c = conjunction(a.longitude, b.longitude, params.orb_deg);
        Ok(SignalResult::new(c.within_orb, c.strength).with("sep_deg", round_to(c.separation, 2)))
    }
}

/// Result of the conjunction-or-mutual-aspect test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Connection {
    pub value: bool,
    pub strength: f64,
    /// Closer of the conjunction separation and the aspect angle difference.
    pub closest_deg: f64,
}

impl Connection {
    fn into_signal(self) -> SignalResult {
        SignalResult::new(self.value, self.strength).with("closest_deg", round_to(self.closest_deg, 2))
    }
}

/// Conjunct within `orb`, or in mutual sign aspect (aspect leg scored with at
/// least a 15° orb). Strength is the stronger of the two mechanisms.
pub fn any_connection(chart: &Chart, a: &str, b: &str, orb: f64) -> Result<Connection, EvalError> {
    let a = chart.planet(a)?;
    let b = chart.planet(b)?;
    let conj = conjunction(a.longitude, b.longitude, orb);
    let mutual = mutual_aspect_hybrid(
        Body::from(a),
        Body::from(b),
        orb.max(MIN_CONNECTION_ASPECT_ORB),
    );
    Ok(Connection {
        value: conj.within_orb || mutual.sign_mutual,
        strength: conj.strength.max(mutual.strength),
        closest_deg: conj.separation.min(mutual.angle_diff),
    })
}

pub struct AnyConnection;

impl Predicate for AnyConnection {
    type Params = TightPairParams;
    const NAME: &'static str = "any_connection";

    fn evaluate(chart: &Chart, params: &Self::Params) -> Result<SignalResult, EvalError> {
        let a = params.a.resolve(chart);
        let b = params.b.resolve(chart);
        Ok(any_connection(chart, &a, &b, params.orb_deg)?.into_signal())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SupportParams {
    pub planet: PlanetRef,
    #[serde(default = "orb_30")]
    pub orb_deg: f64,
}

/// Any-connection between a planet and the lord of one of its dignity signs.
/// Planets without that dignity (the nodes, outer bodies) never qualify.
fn dignity_lord_support(
    chart: &Chart,
    params: &SupportParams,
    dignity_sign: fn(Planet) -> Option<u8>,
    key: &str,
) -> Result<SignalResult, EvalError> {
    let position = locate(chart, &params.planet)?;
    let Some(sign) = Planet::from_name(&position.name).and_then(dignity_sign) else {
        return Ok(SignalResult::flag(false).with(key, Value::Null));
    };
    let lord = sign_lord(sign);
    Ok(any_connection(chart, lord.name(), &position.name, params.orb_deg)?
        .into_signal()
        .with(key, sign)
        .with("lord", lord.name()))
}

pub struct ExaltationLordSupport;

impl Predicate for ExaltationLordSupport {
    type Params = SupportParams;
    const NAME: &'static str = "exaltation_lord_support";

    fn evaluate(chart: &Chart, params: &Self::Params) -> Result<SignalResult, EvalError> {
        dignity_lord_support(chart, params, exaltation_sign, "exaltation_sign")
    }
}

pub struct DebilitationLordSupport;

impl Predicate for DebilitationLordSupport {
    type Params = SupportParams;
    const NAME: &'static str = "debilitation_lord_support";

    fn evaluate(chart: &Chart, params: &Self::Params) -> Result<SignalResult, EvalError> {
        dignity_lord_support(chart, params, debilitation_sign, "debilitation_sign")
    }
}

/// Mutual reception: each planet sits in a sign ruled by the other.
pub struct LordExchange;

impl Predicate for LordExchange {
    type Params = PairParams;
    const NAME: &'static str = "lord_exchange";

    fn evaluate(chart: &Chart, params: &Self::Params) -> Result<SignalResult, EvalError> {
        let a = locate(chart, &params.a)?;
        let b = locate(chart, &params.b)?;
        let exchanged = sign_lord(a.sign_num).name().eq_ignore_ascii_case(&b.name)
            && sign_lord(b.sign_num).name().eq_ignore_ascii_case(&a.name);
        Ok(SignalResult::flag(exchanged)
            .with("a_sign", a.sign_num)
            .with("b_sign", b.sign_num))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct KendraParams {
    pub a: PlanetRef,
    pub b: PlanetRef,
    #[serde(default = "yes")]
    pub include_conjunction: bool,
    #[serde(default = "orb_12")]
    pub orb_deg: f64,
}

/// `a` in the 1st/4th/7th/10th sign from `b`; strength from closeness to the
/// exact 0/90/180/270 angles.
pub struct KendraFrom;

impl Predicate for KendraFrom {
    type Params = KendraParams;
    const NAME: &'static str = "kendra_from";

    fn evaluate(chart: &Chart, params: &Self::Params) -> Result<SignalResult, EvalError> {
        let a = locate(chart, &params.a)?;
        let b = locate(chart, &params.b)?;

        // counted from b the way houses are counted from the ascendant
        let target_signs = signs_from_houses(b.sign_num, &[1, 4, 7, 10]);
        let by_sign = target_signs.contains(&a.sign_num);

        let arc = forward_arc(b.longitude, a.longitude);
        let diff = KENDRA_ANGLES
            .iter()
            .map(|&angle| minimal_angular_distance(arc, angle))
            .fold(f64::INFINITY, f64::min);

        let value = if params.include_conjunction {
            by_sign
        } else {
            by_sign && a.sign_num != b.sign_num
        };
        Ok(SignalResult::new(value, closeness(diff, params.orb_deg))
            .with("b_sign", b.sign_num)
            .with("target_signs", target_signs)
            .with("angle_diff", round_to(diff, 2)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::PlanetPosition;

    fn chart() -> Chart {
        Chart::new(
            3.0,
            vec![
                PlanetPosition::at("Sun", 10.0),
                PlanetPosition::at("Moon", 5.0),
                PlanetPosition::at("Mars", 40.0),    // Taurus
                PlanetPosition::at("Mercury", 14.0),
                PlanetPosition::at("Jupiter", 95.0), // Cancer
                PlanetPosition::at("Venus", 25.0),   // Aries
                PlanetPosition::at("Saturn", 200.0),
            ],
        )
    }

    fn pair(a: &str, b: &str, orb: f64) -> OrbPairParams {
        OrbPairParams {
            a: a.parse().unwrap(),
            b: b.parse().unwrap(),
            orb_deg: orb,
        }
    }

    #[test]
    fn test_conjunction_strength_and_meta() {
        let params = TightPairParams {
            a: "Sun".parse().unwrap(),
            b: "Mercury".parse().unwrap(),
            orb_deg: 8.0,
        };
        let r = ConjunctionPredicate::evaluate(&chart(), &params).unwrap();
        assert!(r.value);
        assert!((r.strength - 0.5).abs() < 1e-9);
        assert_eq!(r.meta["sep_deg"], serde_json::json!(4.0));
    }

    #[test]
    fn test_mutual_aspect_reports_degree_meta() {
        // Sun 10°, Saturn 200°: near-opposition but Aries to Libra is distance 6
        let r = MutualAspectHybrid::evaluate(&chart(), &pair("Sun", "Saturn", 30.0)).unwrap();
        assert!(!r.value);
        assert_eq!(r.meta["angle_diff"], serde_json::json!(10.0));
        assert!(r.strength > 0.6);
    }

    #[test]
    fn test_degree_aspect_is_directional() {
        // Jupiter 95° -> Saturn 200°: arc 105, 15 from 120
        let r = DegreeAspectPredicate::evaluate(&chart(), &pair("Jupiter", "Saturn", 30.0)).unwrap();
        assert!(r.value);
        assert!((r.strength - 0.5).abs() < 1e-9);
        // Saturn 200° -> Jupiter 95°: arc 255, 45 from 300
        let back = DegreeAspectPredicate::evaluate(&chart(), &pair("Saturn", "Jupiter", 30.0)).unwrap();
        assert!(!back.value);
    }

    #[test]
    fn test_any_connection_via_conjunction() {
        let c = any_connection(&chart(), "Sun", "Moon", 8.0).unwrap();
        assert!(c.value);
        assert!((c.closest_deg - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_lord_exchange() {
        // Mars in Taurus (Venus), Venus in Aries (Mars)
        let params = PairParams {
            a: "Mars".parse().unwrap(),
            b: "Venus".parse().unwrap(),
        };
        assert!(LordExchange::evaluate(&chart(), &params).unwrap().value);
        let params = PairParams {
            a: "Mars".parse().unwrap(),
            b: "Sun".parse().unwrap(),
        };
        assert!(!LordExchange::evaluate(&chart(), &params).unwrap().value);
    }

    #[test]
    fn test_kendra_from() {
        let mut params = KendraParams {
            a: "Jupiter".parse().unwrap(),
            b: "Moon".parse().unwrap(),
            include_conjunction: true,
            orb_deg: 12.0,
        };
        let r = KendraFrom::evaluate(&chart(), &params).unwrap();
        assert!(r.value);
        assert_eq!(r.strength, 1.0);
        assert_eq!(r.meta["target_signs"], serde_json::json!([1, 4, 7, 10]));

        params.a = "Sun".parse().unwrap();
        params.include_conjunction = false;
        assert!(!KendraFrom::evaluate(&chart(), &params).unwrap().value);
    }

    #[test]
    fn test_exaltation_lord_support() {
        // Sun exalts in Aries, ruled by Mars at 40°: 30° away, outside a 20° orb
        let params = SupportParams {
            planet: "Sun".parse().unwrap(),
            orb_deg: 20.0,
        };
        let r = ExaltationLordSupport::evaluate(&chart(), &params).unwrap();
        assert_eq!(r.meta["lord"], serde_json::json!("Mars"));
        assert_eq!(r.meta["exaltation_sign"], serde_json::json!(1));
        assert!(!r.value);
    }
}
