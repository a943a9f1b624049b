//! Aspect primitives shared by predicates and the transit layer.
//!
//! Two models live side by side: classical sign drishti (categorical,
//! directional) and degree closeness to a planet's exact aspect angles
//! (continuous, scored against an orb).

use crate::chart::PlanetPosition;
use crate::math::{closeness, forward_arc, minimal_angular_distance, sign_distance, sign_midpoint};
use crate::tables::{aspect_angles, special_sign_aspects, Planet};

/// Orb used when scoring an aspect onto a whole sign via its midpoint.
pub const SIGN_TARGET_ORB: f64 = 30.0;

/// Sign drishti: does `planet` in `from_sign` aspect `to_sign`?
pub fn does_aspect_sign(planet: &str, from_sign: u8, to_sign: u8) -> bool {
    special_sign_aspects(Planet::from_name(planet)).contains(&sign_distance(from_sign, to_sign))
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DegreeAspect {
    pub within_orb: bool,
    /// Distance in degrees to the nearest exact aspect angle.
    pub diff: f64,
}

/// Closeness of `to_lon` to any of `planet`'s exact aspect angles from `from_lon`.
pub fn aspect_by_degree(planet: &str, from_lon: f64, to_lon: f64, orb: f64) -> DegreeAspect {
    let arc = forward_arc(from_lon, to_lon);
    let diff = aspect_angles(Planet::from_name(planet))
        .iter()
        .map(|&angle| minimal_angular_distance(arc, angle))
        .fold(f64::INFINITY, f64::min);
    DegreeAspect {
        within_orb: diff <= orb,
        diff,
    }
}

/// One side of an aspect relationship.
#[derive(Debug, Clone, Copy)]
pub struct Body<'a> {
    pub name: &'a str,
    pub longitude: f64,
    pub sign: u8,
}

impl<'a> From<&'a PlanetPosition> for Body<'a> {
    fn from(position: &'a PlanetPosition) -> Self {
        Self {
            name: &position.name,
            longitude: position.longitude,
            sign: position.sign_num,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MutualAspect {
    /// Both directions aspect by sign.
    pub sign_mutual: bool,
    /// Both directions are within the orb by degree.
    pub deg_ok: bool,
    /// Smaller of the two directional degree differences.
    pub angle_diff: f64,
    pub strength: f64,
}

/// Truth from sign drishti in both directions; strength from the closer of
/// the two degree differences scaled by the orb, regardless of the truth.
pub fn mutual_aspect_hybrid(a: Body<'_>, b: Body<'_>, orb: f64) -> MutualAspect {
    let sign_mutual = does_aspect_sign(a.name, a.sign, b.sign) && does_aspect_sign(b.name, b.sign, a.sign);
    let forward = aspect_by_degree(a.name, a.longitude, b.longitude, orb);
    let backward = aspect_by_degree(b.name, b.longitude, a.longitude, orb);
    let angle_diff = forward.diff.min(backward.diff);
    MutualAspect {
        sign_mutual,
        deg_ok: forward.within_orb && backward.within_orb,
        angle_diff,
        strength: closeness(angle_diff, orb),
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Conjunction {
    pub within_orb: bool,
    pub separation: f64,
    pub strength: f64,
}

pub fn conjunction(a_lon: f64, b_lon: f64, orb: f64) -> Conjunction {
    let separation = minimal_angular_distance(a_lon, b_lon);
    Conjunction {
        within_orb: separation <= orb,
        separation,
        strength: closeness(separation, orb),
    }
}

/// Strength (0-1) with which a planet aspects a whole sign: zero without sign
/// drishti, otherwise degree closeness to the sign's midpoint.
pub fn aspect_strength_to_sign(planet: &str, longitude: f64, sign: u8, target_sign: u8) -> f64 {
    if !does_aspect_sign(planet, sign, target_sign) {
        return 0.0;
    }
    let degree = aspect_by_degree(planet, longitude, sign_midpoint(target_sign), SIGN_TARGET_ORB);
    closeness(degree.diff, SIGN_TARGET_ORB)
}

#[cfg(test)]
mod tests {
    use super::*;

    // sign_distance counts forward exclusively: distance 7 from Aries is Scorpio.

    #[test]
    fn test_sign_aspect_is_asymmetric() {
        // Saturn in Aries reaches Cancer (distance 3); Mercury in Cancer back to Aries is 9
        assert!(does_aspect_sign("Saturn", 1, 4));
        assert!(!does_aspect_sign("Mercury", 4, 1));
        assert!(does_aspect_sign("Venus", 1, 8));
        assert!(does_aspect_sign("Mars", 1, 9));
        assert!(!does_aspect_sign("Mars", 1, 10));
        assert!(does_aspect_sign("Pluto", 1, 8));
    }

    #[test]
    fn test_degree_aspect_picks_nearest_angle() {
        // Saturn at 0°, target at 65°: 5° from the 60° aspect
        let hit = aspect_by_degree("Saturn", 0.0, 65.0, 10.0);
        assert!((hit.diff - 5.0).abs() < 1e-9);
        assert!(hit.within_orb);
        let miss = aspect_by_degree("Venus", 0.0, 65.0, 10.0);
        assert!((miss.diff - 115.0).abs() < 1e-9);
        assert!(!miss.within_orb);
    }

    #[test]
    fn test_mutual_hybrid_strength_is_decoupled() {
        // 2° from Saturn's 60° aspect, but no sign drishti either way
        let sat = Body { name: "Saturn", longitude: 0.0, sign: 1 };
        let sun = Body { name: "Sun", longitude: 62.0, sign: 3 };
        let m = mutual_aspect_hybrid(sat, sun, 30.0);
        assert!(!m.sign_mutual);
        assert!((m.angle_diff - 2.0).abs() < 1e-9);
        assert!(m.strength > 0.9);
    }

    #[test]
    fn test_mutual_hybrid_sign_truth_without_strength() {
        // Jupiter sees Virgo at distance 5, the Moon sees Aries back at 7
        let jup = Body { name: "Jupiter", longitude: 15.0, sign: 1 };
        let moon = Body { name: "Moon", longitude: 165.0, sign: 6 };
        let m = mutual_aspect_hybrid(jup, moon, 30.0);
        assert!(m.sign_mutual);
        assert!((m.angle_diff - 30.0).abs() < 1e-9);
        assert_eq!(m.strength, 0.0);
        assert!(m.deg_ok);
    }

    #[test]
    fn test_mutual_hybrid_strength_boundaries() {
        let sun = Body { name: "Sun", longitude: 10.0, sign: 1 };
        let exact = Body { name: "Moon", longitude: 190.0, sign: 7 };
        assert_eq!(mutual_aspect_hybrid(sun, exact, 30.0).strength, 1.0);

        let far = Body { name: "Moon", longitude: 230.0, sign: 8 };
        assert_eq!(mutual_aspect_hybrid(sun, far, 30.0).strength, 0.0);
    }

    #[test]
    fn test_conjunction() {
        let c = conjunction(100.0, 104.0, 8.0);
        assert!(c.within_orb);
        assert!((c.strength - 0.5).abs() < 1e-9);
        assert!(!conjunction(100.0, 120.0, 8.0).within_orb);
    }

    #[test]
    fn test_aspect_strength_to_sign() {
        // Jupiter at 0° Aries, Virgo midpoint 165°: 15° from the 180° aspect
        assert!((aspect_strength_to_sign("Jupiter", 0.0, 1, 6) - 0.5).abs() < 1e-9);
        assert_eq!(aspect_strength_to_sign("Venus", 0.0, 1, 6), 0.0);
    }
}
