//! Ranking and top-N selection, with optional urgency tiering.

use rand::seq::SliceRandom;

use crate::models::ScoredLead;

/// Score bands for tiered selection. A lead is high above `high`, medium
/// above `medium`, low otherwise.
#[derive(Debug, Clone, Copy)]
pub struct TierThresholds {
    pub high: f64,
    pub medium: f64,
}

impl Default for TierThresholds {
    fn default() -> Self {
        Self { high: 75.0, medium: 50.0 }
    }
}

/// Stable descending sort by rank score; ties keep input order.
pub fn sort_by_score(leads: &mut [ScoredLead]) {
    leads.sort_by(|a, b| {
        b.rank_score().partial_cmp(&a.rank_score()).unwrap_or(std::cmp::Ordering::Equal)
    });
}

/// Select up to `n` leads. In tiered mode the tiers are independently
/// shuffled (no fixed seed, intentionally varying across runs) so that
/// same-tier leads rotate between runs while high-urgency leads always
/// precede lower tiers.
pub fn select_top_n(
    mut leads: Vec<ScoredLead>,
    n: usize,
    tiering: bool,
    thresholds: TierThresholds,
) -> Vec<ScoredLead> {
    if !tiering {
        sort_by_score(&mut leads);
        leads.truncate(n);
        return leads;
    }

    let mut high = Vec::new();
    let mut medium = Vec::new();
    let mut low = Vec::new();
    for lead in leads {
        let score = lead.rank_score();
        if score > thresholds.high {
            high.push(lead);
        } else if score > thresholds.medium {
            medium.push(lead);
        } else {
            low.push(lead);
        }
    }

    let mut rng = rand::thread_rng();
    high.shuffle(&mut rng);
    medium.shuffle(&mut rng);
    low.shuffle(&mut rng);

    let mut out = high;
    out.extend(medium);
    out.extend(low);
    out.truncate(n);
    out
}
