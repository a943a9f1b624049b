//! Static summary of verdicts, without transits.

use serde::Serialize;

use crate::rules::{Status, Verdict};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Highlights {
    pub strong: Vec<String>,
    pub active: Vec<String>,
    /// Debilitation rules that did not come out strong.
    pub cautions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub top_rules: Vec<Verdict>,
    pub summary_lines: Vec<String>,
    pub highlights: Highlights,
}

/// Best `top_n` verdicts by score, then by status.
pub fn pick_top_rules(verdicts: &[Verdict], top_n: usize) -> Vec<Verdict> {
    let mut ranked = verdicts.to_vec();
    ranked.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| b.status.rank().cmp(&a.status.rank()))
    });
    ranked.truncate(top_n);
    ranked
}

pub fn summarize(verdicts: &[Verdict], top_n: usize) -> Summary {
    let top_rules = pick_top_rules(verdicts, top_n);
    let summary_lines = top_rules
        .iter()
        .map(|v| format!("{}: {} (score {:.2})", v.id.replace('_', " "), v.status, v.score))
        .collect();

    let mut highlights = Highlights::default();
    for verdict in &top_rules {
        match verdict.status {
            Status::Strong => highlights.strong.push(verdict.id.clone()),
            Status::Active => highlights.active.push(verdict.id.clone()),
            Status::Inactive => {}
        }
        if verdict.id.contains("debil") && verdict.status != Status::Strong {
            highlights.cautions.push(verdict.id.clone());
        }
    }

    Summary {
        top_rules,
        summary_lines,
        highlights,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::SignalTable;
    use std::collections::BTreeMap;

    fn verdict(id: &str, status: Status, score: f64) -> Verdict {
        Verdict {
            id: id.to_string(),
            status,
            score,
            signals: SignalTable::default(),
            weights: BTreeMap::new(),
            explain: Vec::new(),
        }
    }

    #[test]
    fn test_ties_break_on_status() {
        let verdicts = vec![
            verdict("a_rule", Status::Active, 0.5),
            verdict("b_rule", Status::Strong, 0.5),
            verdict("c_rule", Status::Inactive, 0.9),
        ];
        let top = pick_top_rules(&verdicts, 2);
        let ids: Vec<&str> = top.iter().map(|v| v.id.as_str()).collect();
        assert_eq!(ids, vec!["c_rule", "b_rule"]);
    }

    #[test]
    fn test_lines_and_highlights() {
        let verdicts = vec![
            verdict("venus_debil_cancel", Status::Active, 0.4),
            verdict("grand_success", Status::Strong, 0.8),
            verdict("saturn_debil", Status::Strong, 0.3),
        ];
        let summary = summarize(&verdicts, 5);
        assert_eq!(summary.summary_lines[0], "grand success: strong (score 0.80)");
        assert_eq!(summary.highlights.strong, vec!["grand_success", "saturn_debil"]);
        assert_eq!(summary.highlights.active, vec!["venus_debil_cancel"]);
        assert_eq!(summary.highlights.cautions, vec!["venus_debil_cancel"]);
    }
}
