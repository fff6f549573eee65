//! Duplicate collapsing within and across source batches.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::identity::normalize_field;
use crate::models::NormalizedLead;

/// Cross-run dedup policy. The two modes are mutually exclusive: either a
/// surfaced lead is excluded forever, or leads may reappear and variety
/// comes from tier shuffling at selection time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DedupePolicy {
    /// Never resurface a lead whose id is in the persisted seen set.
    ExcludeSeen,
    /// Leads may reappear across runs.
    #[default]
    Reshuffle,
}

impl std::str::FromStr for DedupePolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "exclude-seen" | "exclude_seen" => Ok(Self::ExcludeSeen),
            "reshuffle" => Ok(Self::Reshuffle),
            other => anyhow::bail!("unknown dedupe policy '{other}' (use exclude-seen or reshuffle)"),
        }
    }
}

/// Retain the first occurrence of each lead id, preserving input order.
/// Idempotent: running it on its own output is a no-op.
pub fn deduplicate(leads: Vec<NormalizedLead>) -> Vec<NormalizedLead> {
    let mut seen = HashSet::new();
    leads
        .into_iter()
        .filter(|lead| seen.insert(lead.lead_id.clone()))
        .collect()
}

/// Drop leads whose id was already surfaced in a previous run.
pub fn exclude_seen(leads: Vec<NormalizedLead>, seen: &HashSet<String>) -> Vec<NormalizedLead> {
    leads
        .into_iter()
        .filter(|lead| !seen.contains(&lead.lead_id))
        .collect()
}

/// Keep only the highest-urgency lead per normalized company name, so the
/// contact-lookup budget is spent once per company rather than once per
/// posting. Leads with an empty company name are unclusterable singletons
/// and all pass through.
pub fn one_per_company(leads: Vec<NormalizedLead>) -> Vec<NormalizedLead> {
    let mut best: HashMap<String, usize> = HashMap::new();
    let mut singletons: Vec<usize> = Vec::new();

    for (i, lead) in leads.iter().enumerate() {
        let key = normalize_field(&lead.company);
        if key.is_empty() {
            singletons.push(i);
            continue;
        }
        match best.get(&key) {
            Some(&j) if leads[j].urgency_score >= lead.urgency_score => {}
            _ => {
                best.insert(key, i);
            }
        }
    }

    let mut keep: Vec<usize> = best.into_values().chain(singletons).collect();
    keep.sort_unstable();

    let mut keep_iter = keep.into_iter().peekable();
    leads
        .into_iter()
        .enumerate()
        .filter_map(|(i, lead)| {
            if keep_iter.peek() == Some(&i) {
                keep_iter.next();
                Some(lead)
            } else {
                None
            }
        })
        .collect()
}
