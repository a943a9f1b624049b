//! Yogakaraka predicates, driven by the ascendant table.

use serde::Deserialize;

use super::{NoParams, Predicate, SignalResult};
use crate::chart::Chart;
use crate::error::EvalError;
use crate::math::signs_from_houses;
use crate::tables::{exaltation_sign, moolatrikona_sign, own_signs, yogakarakas_for_ascendant, HouseGroup};

fn names(chart: &Chart) -> Vec<&'static str> {
    yogakarakas_for_ascendant(chart.asc_sign())
        .iter()
        .map(|p| p.name())
        .collect()
}

pub struct AnyYogakaraka;

impl Predicate for AnyYogakaraka {
    type Params = NoParams;
    const NAME: &'static str = "any_yogakaraka";

    fn evaluate(chart: &Chart, _params: &Self::Params) -> Result<SignalResult, EvalError> {
        let yk = names(chart);
        Ok(SignalResult::flag(!yk.is_empty()).with("yogakarakas", yk))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct YogakarakaGroupParams {
    pub group: HouseGroup,
}

pub struct YogakarakaInGroupFromAsc;

impl Predicate for YogakarakaInGroupFromAsc {
    type Params = YogakarakaGroupParams;
    const NAME: &'static str = "yogakaraka_in_group_from_asc";

    fn evaluate(chart: &Chart, params: &Self::Params) -> Result<SignalResult, EvalError> {
        let yk = names(chart);
        let target_signs = signs_from_houses(chart.asc_sign(), params.group.houses());
        let mut hits = Vec::new();
        for name in &yk {
            if target_signs.contains(&chart.sign_of(name)?) {
                hits.push(*name);
            }
        }
        Ok(SignalResult::flag(!hits.is_empty())
            .with("yogakarakas", yk)
            .with("hits", hits)
            .with("target_signs", target_signs))
    }
}

/// A yogakaraka in its own, exaltation or moolatrikona sign.
pub struct YogakarakaStrongPlace;

impl Predicate for YogakarakaStrongPlace {
    type Params = NoParams;
    const NAME: &'static str = "yogakaraka_strong_place";

    fn evaluate(chart: &Chart, _params: &Self::Params) -> Result<SignalResult, EvalError> {
        let mut hits = Vec::new();
        for &planet in yogakarakas_for_ascendant(chart.asc_sign()) {
            let sign = chart.sign_of(planet.name())?;
            let strong = own_signs(planet).contains(&sign)
                || exaltation_sign(planet) == Some(sign)
                || moolatrikona_sign(planet) == Some(sign);
            if strong {
                hits.push(planet.name());
            }
        }
        Ok(SignalResult::flag(!hits.is_empty()).with("hits", hits))
    }
}
