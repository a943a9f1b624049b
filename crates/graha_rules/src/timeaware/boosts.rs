//! Transit boosts and penalties applied on top of static rule scores.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::transits::{aspects_to_natal, NatalAspects, TransitSnapshot};
use crate::aspects::aspect_strength_to_sign;
use crate::chart::Chart;
use crate::math::{house_sign_from_ascendant, round_to};
use crate::rules::{Status, Verdict};
use crate::tables::{sign_lord, sign_name};

const BOOST_LIMIT: f64 = 0.25;
const NOTE_THRESHOLD: f64 = 0.4;

/// Rule categories, inferred from the rule id. Ordered alphabetically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Career,
    General,
    Wealth,
}

pub fn infer_categories(rule_id: &str) -> BTreeSet<Category> {
    let id = rule_id.to_lowercase();
    let mut categories = BTreeSet::new();
    if ["career_", "rajayoga", "yogakaraka"].iter().any(|k| id.contains(k)) {
        categories.insert(Category::Career);
    }
    if ["dhana", "fortune", "l9"].iter().any(|k| id.contains(k)) {
        categories.insert(Category::Wealth);
    }
    if categories.is_empty() {
        categories.insert(Category::General);
    }
    categories
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Boosts {
    pub career: f64,
    pub wealth: f64,
    pub general: f64,
    pub global: f64,
}

impl Boosts {
    /// Total delta for a rule in the given categories. `general` always applies.
    pub fn delta_for(&self, categories: &BTreeSet<Category>) -> f64 {
        let mut delta = self.general;
        if categories.contains(&Category::Career) {
            delta += self.career;
        }
        if categories.contains(&Category::Wealth) {
            delta += self.wealth;
        }
        delta
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeyHouses {
    #[serde(rename = "9")]
    pub ninth: u8,
    #[serde(rename = "10")]
    pub tenth: u8,
    #[serde(rename = "11")]
    pub eleventh: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoostContext {
    pub asc_sign: String,
    pub asc_lord: String,
    pub houses: KeyHouses,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeBoosts {
    pub boosts: Boosts,
    pub notes: Vec<String>,
    pub context: BoostContext,
}

/// How strongly a transit planet occupies or aspects `target_sign`.
/// A planet missing from the snapshot contributes nothing.
pub(crate) fn transit_to_sign(snapshot: &TransitSnapshot, planet: &str, target_sign: u8) -> f64 {
    match snapshot.planet(planet) {
        Some(p) if p.sign_num == target_sign => 1.0,
        Some(p) => aspect_strength_to_sign(&p.name, p.longitude, p.sign_num, target_sign),
        None => 0.0,
    }
}

/// Natal points that transit malefics press on.
pub(crate) struct PressurePoints {
    pub asc_lord: String,
    pub tenth_lord: String,
}

impl PressurePoints {
    pub fn of(natal: &Chart) -> Self {
        let asc = natal.asc_sign();
        Self {
            asc_lord: sign_lord(asc).to_string(),
            tenth_lord: sign_lord(house_sign_from_ascendant(asc, 10)).to_string(),
        }
    }

    pub fn saturn(&self, aspects: &NatalAspects) -> f64 {
        aspects.max_strength("Saturn", &["Moon", &self.asc_lord])
    }

    pub fn mars(&self, aspects: &NatalAspects) -> f64 {
        aspects.max_strength("Mars", &["Moon", &self.asc_lord, &self.tenth_lord])
    }
}

fn bounded(value: f64) -> f64 {
    round_to(value.clamp(-BOOST_LIMIT, BOOST_LIMIT), 3)
}

pub fn time_boosts(natal: &Chart, snapshot: &TransitSnapshot, orb: f64) -> TimeBoosts {
    let asc = natal.asc_sign();
    let h9 = house_sign_from_ascendant(asc, 9);
    let h10 = house_sign_from_ascendant(asc, 10);
    let h11 = house_sign_from_ascendant(asc, 11);

    let j_to_10 = transit_to_sign(snapshot, "Jupiter", h10);
    let j_to_9 = transit_to_sign(snapshot, "Jupiter", h9);
    let j_to_11 = transit_to_sign(snapshot, "Jupiter", h11);
    let v_to_10 = transit_to_sign(snapshot, "Venus", h10);

    let aspects = aspects_to_natal(natal, snapshot, orb);
    let points = PressurePoints::of(natal);
    let saturn_hard = points.saturn(&aspects);
    let mars_hard = points.mars(&aspects);
    let nodes_hard = aspects
        .max_strength("Rahu", &["Sun", "Moon"])
        .max(aspects.max_strength("Ketu", &["Sun", "Moon"]));

    let career = 0.10 * j_to_10 + 0.05 * v_to_10 - 0.10 * saturn_hard - 0.08 * mars_hard;
    let wealth = 0.06 * j_to_9 + 0.06 * j_to_11 - 0.06 * nodes_hard;
    let general = 0.04 * j_to_10 + 0.03 * j_to_9 + 0.03 * j_to_11 - 0.03 * saturn_hard;
    let global = 0.5 * career + 0.5 * wealth;

    let notes = [
        (j_to_10, "Transit Jupiter favorably influences career (10th)."),
        (j_to_9, "Transit Jupiter supports dharma/fortune (9th)."),
        (j_to_11, "Transit Jupiter supports gains/network (11th)."),
        (v_to_10, "Transit Venus adds polish to career (10th)."),
        (saturn_hard, "Transit Saturn is pressing Moon/Asc-lord; pace yourself."),
        (mars_hard, "Transit Mars is edgy to Moon/Asc/10L; avoid impulsive moves."),
        (nodes_hard, "Nodes are tight to luminaries; keep clarity."),
    ]
    .into_iter()
    .filter(|(component, _)| *component > NOTE_THRESHOLD)
    .map(|(_, note)| note.to_string())
    .collect();

    TimeBoosts {
        boosts: Boosts {
            career: bounded(career),
            wealth: bounded(wealth),
            general: bounded(general),
            global: bounded(global),
        },
        notes,
        context: BoostContext {
            asc_sign: sign_name(asc).to_string(),
            asc_lord: points.asc_lord,
            houses: KeyHouses {
                ninth: h9,
                tenth: h10,
                eleventh: h11,
            },
        },
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdjustedRule {
    pub id: String,
    pub base_score: f64,
    pub adjusted_score: f64,
    pub status: Status,
    pub categories: BTreeSet<Category>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeAwareSummary {
    pub time_boosts: TimeBoosts,
    /// Every verdict, best adjusted score first.
    pub ranked: Vec<AdjustedRule>,
    pub top_rules: Vec<AdjustedRule>,
    pub summary_lines: Vec<String>,
}

/// Shift each verdict's score by the boosts of its categories and rank.
pub fn summarize_timeaware(
    verdicts: &[Verdict],
    natal: &Chart,
    snapshot: &TransitSnapshot,
    orb: f64,
    top_n: usize,
) -> TimeAwareSummary {
    let time_boosts = time_boosts(natal, snapshot, orb);
    let mut ranked: Vec<AdjustedRule> = verdicts
        .iter()
        .map(|verdict| {
            let categories = infer_categories(&verdict.id);
            let adjusted = (verdict.score + time_boosts.boosts.delta_for(&categories)).clamp(0.0, 1.0);
            AdjustedRule {
                id: verdict.id.clone(),
                base_score: verdict.score,
                adjusted_score: round_to(adjusted, 3),
                status: verdict.status,
                categories,
            }
        })
        .collect();
    ranked.sort_by(|a, b| b.adjusted_score.total_cmp(&a.adjusted_score));

    let top_rules: Vec<AdjustedRule> = ranked.iter().take(top_n).cloned().collect();
    let summary_lines = top_rules
        .iter()
        .map(|r| {
            format!(
                "{}: adj {:.2} (base {:.2})",
                r.id.replace('_', " "),
                r.adjusted_score,
                r.base_score
            )
        })
        .collect();

    TimeAwareSummary {
        time_boosts,
        ranked,
        top_rules,
        summary_lines,
    }
}
