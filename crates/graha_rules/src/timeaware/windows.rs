//! Day-by-day transit scoring over a run of dated snapshots.

use chrono::{Duration, NaiveDate};
use serde::Serialize;

use super::boosts::PressurePoints;
use super::transits::{aspects_to_natal, TransitSnapshot};
use crate::aspects::aspect_strength_to_sign;
use crate::chart::Chart;
use crate::math::{house_sign_from_ascendant, round_to};

pub const MAX_SCAN_DAYS: usize = 365;
const DAY_LIMIT: f64 = 0.3;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayScore {
    pub date: NaiveDate,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WindowScan {
    pub start: NaiveDate,
    pub days: usize,
    pub top: Vec<DayScore>,
    pub bottom: Vec<DayScore>,
    pub all: Vec<DayScore>,
}

/// Best aspect strength of a transit planet onto any of the 9th/10th/11th signs.
fn best_to_key_houses(snapshot: &TransitSnapshot, planet: &str, key_signs: &[u8; 3]) -> f64 {
    let Some(p) = snapshot.planet(planet) else {
        return 0.0;
    };
    key_signs
        .iter()
        .map(|&sign| aspect_strength_to_sign(&p.name, p.longitude, p.sign_num, sign))
        .fold(0.0, f64::max)
}

fn score_day(natal: &Chart, snapshot: &TransitSnapshot, orb: f64) -> f64 {
    let asc = natal.asc_sign();
    let key_signs = [
        house_sign_from_ascendant(asc, 9),
        house_sign_from_ascendant(asc, 10),
        house_sign_from_ascendant(asc, 11),
    ];
    let plus = 0.12 * best_to_key_houses(snapshot, "Jupiter", &key_signs)
        + 0.08 * best_to_key_houses(snapshot, "Venus", &key_signs);

    let aspects = aspects_to_natal(natal, snapshot, orb);
    let points = PressurePoints::of(natal);
    let minus = 0.12 * points.saturn(&aspects) + 0.10 * points.mars(&aspects);

    round_to((plus - minus).clamp(-DAY_LIMIT, DAY_LIMIT), 3)
}

/// Score consecutive days starting at `start`; snapshot `i` is day `start + i`.
/// At most [`MAX_SCAN_DAYS`] snapshots are read.
pub fn scan_transit_windows(
    natal: &Chart,
    start: NaiveDate,
    snapshots: &[TransitSnapshot],
    orb: f64,
    top_n: usize,
) -> WindowScan {
    let all: Vec<DayScore> = snapshots
        .iter()
        .take(MAX_SCAN_DAYS)
        .enumerate()
        .map(|(offset, snapshot)| DayScore {
            date: start + Duration::days(offset as i64),
            score: score_day(natal, snapshot, orb),
        })
        .collect();

    let mut best = all.clone();
    best.sort_by(|a, b| b.score.total_cmp(&a.score));
    best.truncate(top_n);
    let mut worst = all.clone();
    worst.sort_by(|a, b| a.score.total_cmp(&b.score));
    worst.truncate(top_n);

    WindowScan {
        start,
        days: all.len(),
        top: best,
        bottom: worst,
        all,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::PlanetPosition;

    /// Sagittarius rising (asc lord Jupiter, natal in Cancer at 91°).
    /// Key houses: Leo, Virgo, Libra.
    fn natal() -> Chart {
        Chart::new(245.0, vec![PlanetPosition::at("Jupiter", 91.0)])
    }

    fn day(planets: Vec<PlanetPosition>) -> TransitSnapshot {
        TransitSnapshot::new(planets)
    }

    #[test]
    fn test_scores_rank_days() {
        let start = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let snapshots = vec![
            day(vec![]),
            // Jupiter at 0° Aries sees Virgo at 5, 15° off an exact trine: 0.5
            day(vec![PlanetPosition::at("Jupiter", 0.0)]),
            // Saturn at 29° Aries and natal Jupiter see each other at 3/9; 2° off sextile
            day(vec![PlanetPosition::at("Saturn", 29.0)]),
        ];
        let scan = scan_transit_windows(&natal(), start, &snapshots, 6.0, 1);
        assert_eq!(scan.days, 3);
        let scores: Vec<f64> = scan.all.iter().map(|d| d.score).collect();
        assert_eq!(scores, vec![0.0, 0.06, -0.08]);
        assert_eq!(scan.top[0].date, NaiveDate::from_ymd_opt(2025, 1, 2).unwrap());
        assert_eq!(scan.bottom[0].date, NaiveDate::from_ymd_opt(2025, 1, 3).unwrap());
    }

    #[test]
    fn test_scan_is_capped_at_a_year() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let snapshots = vec![TransitSnapshot::default(); 400];
        let scan = scan_transit_windows(&natal(), start, &snapshots, 6.0, 7);
        assert_eq!(scan.days, MAX_SCAN_DAYS);
        assert_eq!(scan.top.len(), 7);
        assert_eq!(scan.all.last().unwrap().date, NaiveDate::from_ymd_opt(2024, 12, 30).unwrap());
    }
}
