//! Placement predicates: where a single planet sits.

use serde::Deserialize;

use super::{locate, House, PlanetParams, Predicate, SignalResult};
use crate::chart::Chart;
use crate::error::EvalError;
use crate::math::{house_sign_from_ascendant, signs_from_houses};
use crate::resolve::PlanetRef;
use crate::tables::{
    debilitation_sign, exaltation_sign, karaka_houses, karaka_places, moolatrikona_sign, own_signs,
    HouseGroup, Planet,
};

#[derive(Debug, Clone, Deserialize)]
pub struct KarakaOfParams {
    pub planet: PlanetRef,
    pub of: PlanetRef,
}

/// Planet sits in a sign holding one of `of`'s natural karaka houses.
pub struct PlanetInKarakaHousesOf;

impl Predicate for PlanetInKarakaHousesOf {
    type Params = KarakaOfParams;
    const NAME: &'static str = "planet_in_karaka_houses_of";

    fn evaluate(chart: &Chart, params: &Self::Params) -> Result<SignalResult, EvalError> {
        let sign = locate(chart, &params.planet)?.sign_num;
        let houses: &[u8] = params.of.resolve_planet(chart).map(karaka_houses).unwrap_or(&[]);
        let target_signs = signs_from_houses(chart.asc_sign(), houses);
        Ok(SignalResult::flag(target_signs.contains(&sign))
            .with("target_houses", houses.to_vec())
            .with("target_signs", target_signs))
    }
}

/// Planet sits in one of `of`'s own, exaltation or moolatrikona signs.
pub struct PlanetInKarakaPlacesOf;

impl Predicate for PlanetInKarakaPlacesOf {
    type Params = KarakaOfParams;
    const NAME: &'static str = "planet_in_karaka_places_of";

    fn evaluate(chart: &Chart, params: &Self::Params) -> Result<SignalResult, EvalError> {
        let sign = locate(chart, &params.planet)?.sign_num;
        let target_signs = params.of.resolve_planet(chart).map(karaka_places).unwrap_or_default();
        Ok(SignalResult::flag(target_signs.contains(&sign)).with("target_signs", target_signs))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SignsParams {
    pub planet: PlanetRef,
    pub signs: Vec<u8>,
}

pub struct PlanetInSigns;

impl Predicate for PlanetInSigns {
    type Params = SignsParams;
    const NAME: &'static str = "planet_in_signs";

    fn evaluate(chart: &Chart, params: &Self::Params) -> Result<SignalResult, EvalError> {
        let sign = locate(chart, &params.planet)?.sign_num;
        Ok(SignalResult::flag(params.signs.contains(&sign)))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct HouseParams {
    pub planet: PlanetRef,
    pub house: House,
}

pub struct PlanetInHouseFromAsc;

impl Predicate for PlanetInHouseFromAsc {
    type Params = HouseParams;
    const NAME: &'static str = "planet_in_house_from_asc";

    fn evaluate(chart: &Chart, params: &Self::Params) -> Result<SignalResult, EvalError> {
        let sign = locate(chart, &params.planet)?.sign_num;
        let target_sign = house_sign_from_ascendant(chart.asc_sign(), params.house.0);
        Ok(SignalResult::flag(sign == target_sign).with("target_sign", target_sign))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GroupParams {
    pub planet: PlanetRef,
    pub group: HouseGroup,
}

pub struct PlanetInHouseGroupFromAsc;

impl Predicate for PlanetInHouseGroupFromAsc {
    type Params = GroupParams;
    const NAME: &'static str = "planet_in_house_group_from_asc";

    fn evaluate(chart: &Chart, params: &Self::Params) -> Result<SignalResult, EvalError> {
        let sign = locate(chart, &params.planet)?.sign_num;
        let houses = params.group.houses();
        let target_signs = signs_from_houses(chart.asc_sign(), houses);
        Ok(SignalResult::flag(target_signs.contains(&sign))
            .with("houses", houses.to_vec())
            .with("target_signs", target_signs))
    }
}

/// Shared body of the single-sign dignity checks.
fn dignity(
    chart: &Chart,
    params: &PlanetParams,
    signs_for: fn(Planet) -> Vec<u8>,
) -> Result<SignalResult, EvalError> {
    let position = locate(chart, &params.planet)?;
    let signs = Planet::from_name(&position.name).map(signs_for).unwrap_or_default();
    Ok(SignalResult::flag(signs.contains(&position.sign_num)))
}

pub struct PlanetInOwnSign;

impl Predicate for PlanetInOwnSign {
    type Params = PlanetParams;
    const NAME: &'static str = "planet_in_own_sign";

    fn evaluate(chart: &Chart, params: &Self::Params) -> Result<SignalResult, EvalError> {
        dignity(chart, params, own_signs)
    }
}

pub struct PlanetInExaltation;

impl Predicate for PlanetInExaltation {
    type Params = PlanetParams;
    const NAME: &'static str = "planet_in_exaltation";

    fn evaluate(chart: &Chart, params: &Self::Params) -> Result<SignalResult, EvalError> {
        dignity(chart, params, |p| exaltation_sign(p).into_iter().collect())
    }
}

pub struct PlanetDebilitated;

impl Predicate for PlanetDebilitated {
    type Params = PlanetParams;
    const NAME: &'static str = "planet_debilitated";

    fn evaluate(chart: &Chart, params: &Self::Params) -> Result<SignalResult, EvalError> {
        dignity(chart, params, |p| debilitation_sign(p).into_iter().collect())
    }
}

pub struct PlanetInMoolatrikona;

impl Predicate for PlanetInMoolatrikona {
    type Params = PlanetParams;
    const NAME: &'static str = "planet_in_moolatrikona";

    fn evaluate(chart: &Chart, params: &Self::Params) -> Result<SignalResult, EvalError> {
        dignity(chart, params, |p| moolatrikona_sign(p).into_iter().collect())
    }
}

/// Reads the ephemeris retrograde flag; absent means direct.
pub struct PlanetRetrograde;

impl Predicate for PlanetRetrograde {
    type Params = PlanetParams;
    const NAME: &'static str = "planet_retrograde";

    fn evaluate(chart: &Chart, params: &Self::Params) -> Result<SignalResult, EvalError> {
        let position = locate(chart, &params.planet)?;
        Ok(SignalResult::flag(position.retro.unwrap_or(false)))
    }
}

pub struct PlanetCombust;

impl Predicate for PlanetCombust {
    type Params = PlanetParams;
    const NAME: &'static str = "planet_combust";

    fn evaluate(chart: &Chart, params: &Self::Params) -> Result<SignalResult, EvalError> {
        let position = locate(chart, &params.planet)?;
        Ok(SignalResult::flag(position.combust.unwrap_or(false)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::PlanetPosition;

    /// Aries rising: house N is sign N.
    fn aries_chart() -> Chart {
        let mut saturn = PlanetPosition::at("Saturn", 285.0); // Capricorn
        saturn.retro = Some(true);
        Chart::new(
            3.0,
            vec![
                PlanetPosition::at("Sun", 15.0),    // Aries
                PlanetPosition::at("Moon", 200.0),  // Libra
                PlanetPosition::at("Mars", 40.0),   // Taurus
                PlanetPosition::at("Jupiter", 95.0), // Cancer
                PlanetPosition::at("Venus", 340.0), // Pisces
                saturn,
                PlanetPosition::at("Rahu", 50.0),
            ],
        )
    }

    fn planet(name: &str) -> PlanetParams {
        PlanetParams {
            planet: name.parse().unwrap(),
        }
    }

    #[test]
    fn test_saturn_in_own_sign() {
        let r = PlanetInOwnSign::evaluate(&aries_chart(), &planet("Saturn")).unwrap();
        assert!(r.value);
        assert_eq!(r.strength, 1.0);
        assert!(!PlanetInOwnSign::evaluate(&aries_chart(), &planet("Mars")).unwrap().value);
    }

    #[test]
    fn test_dignities() {
        let chart = aries_chart();
        assert!(PlanetInExaltation::evaluate(&chart, &planet("Sun")).unwrap().value);
        assert!(PlanetInExaltation::evaluate(&chart, &planet("Jupiter")).unwrap().value);
        assert!(PlanetInExaltation::evaluate(&chart, &planet("Venus")).unwrap().value);
        assert!(!PlanetDebilitated::evaluate(&chart, &planet("Sun")).unwrap().value);
        assert!(PlanetDebilitated::evaluate(&chart, &planet("Moon")).is_ok());
        assert!(!PlanetInMoolatrikona::evaluate(&chart, &planet("Mars")).unwrap().value);
        // nodes carry no dignities
        assert!(!PlanetInOwnSign::evaluate(&chart, &planet("Rahu")).unwrap().value);
    }

    #[test]
    fn test_karaka_houses_via_lord_token() {
        // Aries rising: 12th is Pisces, lord Jupiter, karaka houses 2/5/9
        let params = KarakaOfParams {
            planet: "Saturn".parse().unwrap(),
            of: "lord(12th)".parse().unwrap(),
        };
        let r = PlanetInKarakaHousesOf::evaluate(&aries_chart(), &params).unwrap();
        assert!(!r.value);
        assert_eq!(r.meta["target_signs"], serde_json::json!([2, 5, 9]));

        let params = KarakaOfParams {
            planet: "Mars".parse().unwrap(),
            of: "lord(12)".parse().unwrap(),
        };
        assert!(PlanetInKarakaHousesOf::evaluate(&aries_chart(), &params).unwrap().value);
    }

    #[test]
    fn test_karaka_places() {
        // Jupiter places: own 9, 12 + exalted 4 (moola 9)
        let params = KarakaOfParams {
            planet: "Venus".parse().unwrap(),
            of: "Jupiter".parse().unwrap(),
        };
        let r = PlanetInKarakaPlacesOf::evaluate(&aries_chart(), &params).unwrap();
        assert!(r.value);
        assert_eq!(r.meta["target_signs"], serde_json::json!([4, 9, 12]));
    }

    #[test]
    fn test_house_and_group() {
        let chart = aries_chart();
        let params = HouseParams {
            planet: "Saturn".parse().unwrap(),
            house: House(10),
        };
        assert!(PlanetInHouseFromAsc::evaluate(&chart, &params).unwrap().value);

        let params = GroupParams {
            planet: "Jupiter".parse().unwrap(),
            group: HouseGroup::Kendra,
        };
        assert!(PlanetInHouseGroupFromAsc::evaluate(&chart, &params).unwrap().value);
        let params = GroupParams {
            planet: "Mars".parse().unwrap(),
            group: HouseGroup::Dusthana,
        };
        assert!(!PlanetInHouseGroupFromAsc::evaluate(&chart, &params).unwrap().value);
    }

    #[test]
    fn test_flags() {
        let chart = aries_chart();
        assert!(PlanetRetrograde::evaluate(&chart, &planet("Saturn")).unwrap().value);
        assert!(!PlanetRetrograde::evaluate(&chart, &planet("Mars")).unwrap().value);
        assert!(!PlanetCombust::evaluate(&chart, &planet("Sun")).unwrap().value);
        assert!(PlanetCombust::evaluate(&chart, &planet("Mercury")).is_err());
    }

    #[test]
    fn test_missing_planet_errors() {
        let err = PlanetInSigns::evaluate(
            &aries_chart(),
            &SignsParams {
                planet: "Ketu".parse().unwrap(),
                signs: vec![1],
            },
        )
        .unwrap_err();
        assert_eq!(err, EvalError::PlanetNotFound("Ketu".to_string()));
    }
}
