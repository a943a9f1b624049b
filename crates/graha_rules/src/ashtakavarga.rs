//! SAV-lite: a simplified per-house benefic/malefic balance.
//!
//! Each house scores +1 when a benefic occupies it, plus the best benefic
//! aspect strength onto it, and the mirror image for malefics. Scores land
//! roughly in -2..2.

use serde::{Deserialize, Serialize};

use crate::chart::Chart;
use crate::error::EvalError;
use crate::math::{house_sign_from_ascendant, round_to};
use crate::predicates::houses::{any_planet_in_sign, benefics, malefics, planets_aspect_sign};
use crate::tables::sign_name;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HouseScore {
    pub house: u8,
    pub sign_num: u8,
    pub sign: String,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavLite {
    pub asc_sign_num: u8,
    pub houses: Vec<HouseScore>,
}

/// Score all twelve houses. Every benefic and malefic, nodes included, must be
/// in the chart.
pub fn sav_lite(chart: &Chart) -> Result<SavLite, EvalError> {
    let good = benefics(chart, true)?;
    let bad = malefics(chart, true)?;

    let mut houses = Vec::with_capacity(12);
    for house in 1..=12u8 {
        let sign = house_sign_from_ascendant(chart.asc_sign(), house);
        let mut score = 0.0;
        if any_planet_in_sign(chart, &good, sign)? {
            score += 1.0;
        }
        let (hit, strength) = planets_aspect_sign(chart, &good, sign)?;
        if hit {
            score += strength;
        }
        if any_planet_in_sign(chart, &bad, sign)? {
            score -= 1.0;
        }
        let (hit, strength) = planets_aspect_sign(chart, &bad, sign)?;
        if hit {
            score -= strength;
        }
        houses.push(HouseScore {
            house,
            sign_num: sign,
            sign: sign_name(sign).to_string(),
            score: round_to(score, 3),
        });
    }

    Ok(SavLite {
        asc_sign_num: chart.asc_sign(),
        houses,
    })
}

/// SAV-lite score of one house; 0.0 outside 1..12.
pub fn house_score(chart: &Chart, house: u8) -> Result<f64, EvalError> {
    Ok(sav_lite(chart)?
        .houses
        .iter()
        .find(|row| row.house == house)
        .map_or(0.0, |row| row.score))
}
