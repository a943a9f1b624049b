//! Angular and sign arithmetic on the 360° zodiac.
//!
//! Signs are 1-indexed (1 = Aries .. 12 = Pisces) and houses are counted
//! whole-sign from the ascendant.

/// Normalize degrees to [0, 360).
pub fn normalize(deg: f64) -> f64 {
    let mut normalized = deg % 360.0;
    if normalized < 0.0 {
        normalized += 360.0;
    }
    // -1e-15 % 360 + 360 rounds to exactly 360.0
    if normalized >= 360.0 {
        normalized -= 360.0;
    }
    normalized
}

/// Shorter arc between two longitudes, in [0, 180].
pub fn minimal_angular_distance(a: f64, b: f64) -> f64 {
    let d = normalize(a - b);
    if d <= 180.0 {
        d
    } else {
        360.0 - d
    }
}

/// Directional arc travelling forward from `from` to `to`, in [0, 360).
pub fn forward_arc(from: f64, to: f64) -> f64 {
    normalize(normalize(to) - normalize(from))
}

/// Sign number (1-12) containing a longitude.
pub fn sign_index(longitude: f64) -> u8 {
    ((normalize(longitude) / 30.0) as u8).min(11) + 1
}

/// Whole-sign: house 1 is the ascendant's sign, house N is N-1 signs later.
pub fn house_sign_from_ascendant(asc_sign: u8, house: u8) -> u8 {
    let offset = (asc_sign as i32 - 1) + (house as i32 - 1);
    (offset.rem_euclid(12) + 1) as u8
}

/// Signs occupied by a list of houses, sorted ascending.
pub fn signs_from_houses(asc_sign: u8, houses: &[u8]) -> Vec<u8> {
    let mut signs: Vec<u8> = houses
        .iter()
        .map(|&h| house_sign_from_ascendant(asc_sign, h))
        .collect();
    signs.sort_unstable();
    signs
}

/// House number (1-12) a sign falls in, counted from the ascendant's sign.
pub fn house_of_sign_from_ascendant(asc_sign: u8, sign: u8) -> u8 {
    ((sign as i32 - asc_sign as i32).rem_euclid(12) + 1) as u8
}

/// Forward count of signs from `from` to `to`, 1..=12.
///
/// The same sign maps to 12, never 0; every sign-aspect test depends on this.
pub fn sign_distance(from: u8, to: u8) -> u8 {
    let d = (to as i32 - from as i32).rem_euclid(12) as u8;
    if d == 0 {
        12
    } else {
        d
    }
}

/// Representative point of a sign: its start plus 15°.
pub fn sign_midpoint(sign: u8) -> f64 {
    (sign as f64 - 1.0) * 30.0 + 15.0
}

/// Round to a fixed number of decimals, the way verdicts are reported.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Linear closeness in [0, 1]: 1 at `diff == 0`, 0 once `diff >= orb`.
pub fn closeness(diff: f64, orb: f64) -> f64 {
    (1.0 - diff / orb.max(1e-6)).clamp(0.0, 1.0)
}
