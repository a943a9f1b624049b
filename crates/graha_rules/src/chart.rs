//! Chart data consumed from the ephemeris collaborator.
//!
//! The engine never computes positions; it only reads what arrives here.

use serde::{Deserialize, Serialize};

use crate::error::EvalError;
use crate::math::{normalize, sign_index};
use crate::tables::sign_name;

/// Rising sign and degree; defines house 1.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ascendant {
    /// Longitude in degrees (0-360)
    pub degree: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sign: Option<String>,
    /// Sign number 1-12
    pub sign_num: u8,
}

/// One body as delivered by the ephemeris.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanetPosition {
    pub name: String,
    /// Sidereal longitude in degrees (0-360)
    pub longitude: f64,
    pub sign_num: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub house: Option<u8>,
    #[serde(default, alias = "retrograde", skip_serializing_if = "Option::is_none")]
    pub retro: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub combust: Option<bool>,
}

impl PlanetPosition {
    /// Position with the sign derived from the longitude and no optional flags.
    pub fn at(name: &str, longitude: f64) -> Self {
        Self {
            name: name.to_string(),
            longitude: normalize(longitude),
            sign_num: sign_index(longitude),
            house: None,
            retro: None,
            combust: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chart {
    pub ascendant: Ascendant,
    pub planets: Vec<PlanetPosition>,
}

impl Chart {
    /// Build a chart from an ascendant longitude and planet positions.
    pub fn new(asc_degree: f64, planets: Vec<PlanetPosition>) -> Self {
        let sign_num = sign_index(asc_degree);
        Self {
            ascendant: Ascendant {
                degree: normalize(asc_degree),
                sign: Some(sign_name(sign_num).to_string()),
                sign_num,
            },
            planets,
        }
    }

    pub fn asc_sign(&self) -> u8 {
        self.ascendant.sign_num
    }

    /// Look a planet up by name (ASCII case-insensitive).
    pub fn planet(&self, name: &str) -> Result<&PlanetPosition, EvalError> {
        self.planets
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| EvalError::PlanetNotFound(name.to_string()))
    }

    pub fn sign_of(&self, name: &str) -> Result<u8, EvalError> {
        self.planet(name).map(|p| p.sign_num)
    }

    pub fn longitude_of(&self, name: &str) -> Result<f64, EvalError> {
        self.planet(name).map(|p| p.longitude)
    }
}
