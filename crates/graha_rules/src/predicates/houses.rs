//! Benefic and malefic influence on houses counted from the ascendant.

use serde::Deserialize;

use super::{House, Predicate, SignalResult};
use crate::ashtakavarga::house_score;
use crate::aspects::{aspect_strength_to_sign, does_aspect_sign};
use crate::chart::Chart;
use crate::error::EvalError;
use crate::math::{forward_arc, house_sign_from_ascendant, round_to};

/// Moon ahead of the Sun by less than 180°. Both must be in the chart.
pub fn is_moon_waxing(chart: &Chart) -> Result<bool, EvalError> {
    let sun = chart.longitude_of("Sun")?;
    let moon = chart.longitude_of("Moon")?;
    Ok(forward_arc(sun, moon) < 180.0)
}

/// Jupiter, Venus, the waxing Moon and (optionally) Mercury.
pub fn benefics(chart: &Chart, treat_mercury_benefic: bool) -> Result<Vec<&'static str>, EvalError> {
    let mut group = vec!["Jupiter", "Venus"];
    if is_moon_waxing(chart)? {
        group.push("Moon");
    }
    if treat_mercury_benefic {
        group.push("Mercury");
    }
    Ok(group)
}

/// Sun, Mars, Saturn, the waning Moon and (optionally) the nodes.
pub fn malefics(chart: &Chart, include_nodes: bool) -> Result<Vec<&'static str>, EvalError> {
    let mut group = vec!["Sun", "Mars", "Saturn"];
    if !is_moon_waxing(chart)? {
        group.push("Moon");
    }
    if include_nodes {
        group.extend(["Rahu", "Ketu"]);
    }
    Ok(group)
}

/// Any member of `group` occupies `sign`. Every member must be in the chart.
pub fn any_planet_in_sign(chart: &Chart, group: &[&str], sign: u8) -> Result<bool, EvalError> {
    let mut found = false;
    for name in group {
        found |= chart.sign_of(name)? == sign;
    }
    Ok(found)
}

/// Whether any member of `group` aspects `sign` by drishti, and the best
/// degree closeness to the sign midpoint among those that do. Every member
/// must be in the chart.
pub fn planets_aspect_sign(chart: &Chart, group: &[&str], sign: u8) -> Result<(bool, f64), EvalError> {
    let mut hit = false;
    let mut best = 0.0f64;
    for name in group {
        let position = chart.planet(name)?;
        if !does_aspect_sign(&position.name, position.sign_num, sign) {
            continue;
        }
        hit = true;
        best = best.max(aspect_strength_to_sign(
            &position.name,
            position.longitude,
            position.sign_num,
            sign,
        ));
    }
    Ok((hit, round_to(best, 3)))
}

fn yes() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct BeneficHouseParams {
    pub house: House,
    #[serde(default = "yes")]
    pub treat_mercury_benefic: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MaleficHouseParams {
    pub house: House,
    #[serde(default = "yes")]
    pub include_nodes: bool,
}

pub struct BeneficsOccupyHouseFromAsc;

impl Predicate for BeneficsOccupyHouseFromAsc {
    type Params = BeneficHouseParams;
    const NAME: &'static str = "benefics_occupy_house_from_asc";

    fn evaluate(chart: &Chart, params: &Self::Params) -> Result<SignalResult, EvalError> {
        let target_sign = house_sign_from_ascendant(chart.asc_sign(), params.house.0);
        let group = benefics(chart, params.treat_mercury_benefic)?;
        Ok(SignalResult::flag(any_planet_in_sign(chart, &group, target_sign)?)
            .with("benefics", group)
            .with("target_sign", target_sign))
    }
}

pub struct BeneficsAspectHouseFromAsc;

impl Predicate for BeneficsAspectHouseFromAsc {
    type Params = BeneficHouseParams;
    const NAME: &'static str = "benefics_aspect_house_from_asc";

    fn evaluate(chart: &Chart, params: &Self::Params) -> Result<SignalResult, EvalError> {
        let target_sign = house_sign_from_ascendant(chart.asc_sign(), params.house.0);
        let group = benefics(chart, params.treat_mercury_benefic)?;
        let (hit, strength) = planets_aspect_sign(chart, &group, target_sign)?;
        Ok(SignalResult::new(hit, strength)
            .with("benefics", group)
            .with("target_sign", target_sign))
    }
}

pub struct MaleficsOccupyHouseFromAsc;

impl Predicate for MaleficsOccupyHouseFromAsc {
    type Params = MaleficHouseParams;
    const NAME: &'static str = "malefics_occupy_house_from_asc";

    fn evaluate(chart: &Chart, params: &Self::Params) -> Result<SignalResult, EvalError> {
        let target_sign = house_sign_from_ascendant(chart.asc_sign(), params.house.0);
        let group = malefics(chart, params.include_nodes)?;
        Ok(SignalResult::flag(any_planet_in_sign(chart, &group, target_sign)?)
            .with("malefics", group)
            .with("target_sign", target_sign))
    }
}

pub struct MaleficsAspectHouseFromAsc;

impl Predicate for MaleficsAspectHouseFromAsc {
    type Params = MaleficHouseParams;
    const NAME: &'static str = "malefics_aspect_house_from_asc";

    fn evaluate(chart: &Chart, params: &Self::Params) -> Result<SignalResult, EvalError> {
        let target_sign = house_sign_from_ascendant(chart.asc_sign(), params.house.0);
        let group = malefics(chart, params.include_nodes)?;
        let (hit, strength) = planets_aspect_sign(chart, &group, target_sign)?;
        Ok(SignalResult::new(hit, strength)
            .with("malefics", group)
            .with("target_sign", target_sign))
    }
}

fn half() -> f64 {
    0.5
}

#[derive(Debug, Clone, Deserialize)]
pub struct SavThresholdParams {
    pub house: House,
    #[serde(default = "half")]
    pub min: f64,
}

/// SAV-lite score of a house at or above `min`. The score (roughly -2..2) is
/// mapped onto [0, 1] for strength.
pub struct SavLiteThreshold;

impl Predicate for SavLiteThreshold {
    type Params = SavThresholdParams;
    const NAME: &'static str = "sav_lite_threshold";

    fn evaluate(chart: &Chart, params: &Self::Params) -> Result<SignalResult, EvalError> {
        let value = house_score(chart, params.house.0)?;
        Ok(SignalResult::new(value >= params.min, (value + 2.0) / 4.0)
            .with("value", round_to(value, 3))
            .with("threshold", params.min))
    }
}
