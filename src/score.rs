//! Lead scoring: the multi-signal composite model and the posting-age
//! urgency ramp. Both clamp to [0, 100] and score missing inputs as 0
//! rather than erroring.

use crate::models::GrowthSignal;

/// Signals feeding the composite score. Every field is optional in
/// spirit: defaults mean "signal absent".
#[derive(Debug, Clone, Default)]
pub struct LeadSignals {
    pub active_jobs: u32,
    pub growth: Option<GrowthSignal>,
    pub has_news: bool,
    pub contact_count: usize,
    pub headcount: Option<u32>,
}

/// Weighted-bucket composite score.
///
/// Buckets: job velocity 30, headcount growth 25, news/funding 20,
/// contact availability 15, company-size fit 10. Summed and clamped.
pub fn composite_score(signals: &LeadSignals) -> f64 {
    let mut score: f64 = 0.0;

    score += match signals.active_jobs {
        n if n >= 5 => 30.0,
        n if n >= 3 => 20.0,
        n if n >= 1 => 10.0,
        _ => 0.0,
    };

    if let Some(growth) = &signals.growth {
        if growth.is_growing {
            score += match growth.growth_rate {
                r if r >= 30.0 => 25.0,
                r if r >= 20.0 => 20.0,
                r if r >= 10.0 => 15.0,
                _ => 0.0,
            };
        }
    }

    if signals.has_news {
        score += 20.0;
    }

    if signals.contact_count > 0 {
        score += 15.0;
    }

    if let Some(headcount) = signals.headcount {
        if (20..=200).contains(&headcount) {
            score += 10.0;
        } else if (10..=500).contains(&headcount) {
            score += 5.0;
        }
    }

    score.clamp(0.0, 100.0)
}

/// Posting-age urgency: 0 at 14 days or younger, 100 at 90 days or older,
/// linear in between. Unknown age scores 0.
pub fn urgency_score(days_open: Option<i64>) -> f64 {
    let Some(days) = days_open else {
        return 0.0;
    };
    if days <= 14 {
        0.0
    } else if days >= 90 {
        100.0
    } else {
        (days - 14) as f64 / 76.0 * 100.0
    }
}
