//! Classical reference tables: rulership, dignities, karakas and drishti.
//!
//! Everything here is a fixed domain constant. Sign numbers are 1-indexed.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const SIGN_NAMES: [&str; 12] = [
    "Aries", "Taurus", "Gemini", "Cancer", "Leo", "Virgo",
    "Libra", "Scorpio", "Sagittarius", "Capricorn", "Aquarius", "Pisces",
];

/// The nine grahas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Planet {
    Sun,
    Moon,
    Mars,
    Mercury,
    Jupiter,
    Venus,
    Saturn,
    Rahu,
    Ketu,
}

/// The seven classical planets that carry dignities and karaka houses.
pub const SEVEN_PLANETS: [Planet; 7] = [
    Planet::Sun,
    Planet::Moon,
    Planet::Mars,
    Planet::Mercury,
    Planet::Jupiter,
    Planet::Venus,
    Planet::Saturn,
];

impl Planet {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Sun => "Sun",
            Self::Moon => "Moon",
            Self::Mars => "Mars",
            Self::Mercury => "Mercury",
            Self::Jupiter => "Jupiter",
            Self::Venus => "Venus",
            Self::Saturn => "Saturn",
            Self::Rahu => "Rahu",
            Self::Ketu => "Ketu",
        }
    }

    /// Case-insensitive lookup; `None` for bodies outside the nine grahas.
    pub fn from_name(name: &str) -> Option<Self> {
        let all = [
            Self::Sun,
            Self::Moon,
            Self::Mars,
            Self::Mercury,
            Self::Jupiter,
            Self::Venus,
            Self::Saturn,
            Self::Rahu,
            Self::Ketu,
        ];
        all.into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(name.trim()))
    }
}

impl fmt::Display for Planet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Planet {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| format!("unknown planet '{}'", s))
    }
}

/// Display name of a sign number (1-12).
pub fn sign_name(sign: u8) -> &'static str {
    SIGN_NAMES[(sign as usize + 11) % 12]
}

/// Planetary lord of a sign number (1-12).
pub fn sign_lord(sign: u8) -> Planet {
    const LORDS: [Planet; 12] = [
        Planet::Mars,    // Aries
        Planet::Venus,   // Taurus
        Planet::Mercury, // Gemini
        Planet::Moon,    // Cancer
        Planet::Sun,     // Leo
        Planet::Mercury, // Virgo
        Planet::Venus,   // Libra
        Planet::Mars,    // Scorpio
        Planet::Jupiter, // Sagittarius
        Planet::Saturn,  // Capricorn
        Planet::Saturn,  // Aquarius
        Planet::Jupiter, // Pisces
    ];
    LORDS[(sign as usize + 11) % 12]
}

/// Signs ruled by a planet, ascending. Empty for the nodes.
pub fn own_signs(planet: Planet) -> Vec<u8> {
    (1..=12).filter(|&s| sign_lord(s) == planet).collect()
}

pub fn exaltation_sign(planet: Planet) -> Option<u8> {
    match planet {
        Planet::Sun => Some(1),
        Planet::Moon => Some(2),
        Planet::Mars => Some(10),
        Planet::Mercury => Some(6),
        Planet::Jupiter => Some(4),
        Planet::Venus => Some(12),
        Planet::Saturn => Some(7),
        Planet::Rahu | Planet::Ketu => None,
    }
}

pub fn debilitation_sign(planet: Planet) -> Option<u8> {
    match planet {
        Planet::Sun => Some(7),
        Planet::Moon => Some(8),
        Planet::Mars => Some(4),
        Planet::Mercury => Some(12),
        Planet::Jupiter => Some(10),
        Planet::Venus => Some(6),
        Planet::Saturn => Some(1),
        Planet::Rahu | Planet::Ketu => None,
    }
}

pub fn moolatrikona_sign(planet: Planet) -> Option<u8> {
    match planet {
        Planet::Sun => Some(5),
        Planet::Moon => Some(2),
        Planet::Mars => Some(1),
        Planet::Mercury => Some(6),
        Planet::Jupiter => Some(9),
        Planet::Venus => Some(7),
        Planet::Saturn => Some(11),
        Planet::Rahu | Planet::Ketu => None,
    }
}

/// Natural karaka houses (counted from the ascendant).
pub fn karaka_houses(planet: Planet) -> &'static [u8] {
    match planet {
        Planet::Sun => &[1, 9, 10],
        Planet::Moon => &[4],
        Planet::Mars => &[3, 6],
        Planet::Mercury => &[3, 5, 10],
        Planet::Jupiter => &[2, 5, 9],
        Planet::Venus => &[4, 7, 12],
        Planet::Saturn => &[6, 8, 12],
        Planet::Rahu | Planet::Ketu => &[],
    }
}

/// Own signs plus exaltation and moolatrikona, sorted and deduplicated.
pub fn karaka_places(planet: Planet) -> Vec<u8> {
    let mut places = own_signs(planet);
    places.extend(exaltation_sign(planet));
    places.extend(moolatrikona_sign(planet));
    places.sort_unstable();
    places.dedup();
    places
}

/// Sign distances a planet aspects (graha drishti). Default is the 7th only.
pub fn special_sign_aspects(planet: Option<Planet>) -> &'static [u8] {
    match planet {
        Some(Planet::Mars) => &[4, 7, 8],
        Some(Planet::Jupiter) => &[5, 7, 9],
        Some(Planet::Saturn) => &[3, 7, 10],
        _ => &[7],
    }
}

/// Exact aspect angles used for degree closeness. Default is opposition.
pub fn aspect_angles(planet: Option<Planet>) -> &'static [f64] {
    match planet {
        Some(Planet::Mars) => &[90.0, 180.0, 240.0],
        Some(Planet::Jupiter) => &[120.0, 180.0, 240.0],
        Some(Planet::Saturn) => &[60.0, 180.0, 300.0],
        _ => &[180.0],
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HouseGroup {
    Kendra,
    Trikona,
    Dusthana,
    Upachaya,
}

impl HouseGroup {
    pub fn houses(self) -> &'static [u8] {
        match self {
            Self::Kendra => &[1, 4, 7, 10],
            Self::Trikona => &[1, 5, 9],
            Self::Dusthana => &[6, 8, 12],
            Self::Upachaya => &[3, 6, 10, 11],
        }
    }
}

/// Yogakaraka (single planet ruling both a kendra and a trikona) by ascendant sign.
pub fn yogakarakas_for_ascendant(asc_sign: u8) -> &'static [Planet] {
    match asc_sign {
        2 | 7 => &[Planet::Saturn],  // Taurus, Libra
        4 | 5 => &[Planet::Mars],    // Cancer, Leo
        10 | 11 => &[Planet::Venus], // Capricorn, Aquarius
        _ => &[],
    }
}
