use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One posting as returned by an upstream source. Every field may be
/// missing or junk; nothing here survives past a single pipeline run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawRecord {
    pub title: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub posted_date: Option<String>,
    pub source: Option<String>,
}

/// A RawRecord after classification and field normalization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedLead {
    pub lead_id: String,
    pub title: String,
    pub company: String,
    pub location: String,
    pub url: String,
    pub source: String,
    /// None when the upstream date string could not be parsed.
    pub posted_date: Option<NaiveDate>,
    pub days_open: Option<i64>,
    pub urgency_score: f64,
}

/// A contact as returned by the enrichment capability. Any field may be
/// empty when the upstream withholds it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Contact {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub linkedin: String,
}

/// Enrichment result for a company.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompanyInfo {
    pub employee_count: Option<u32>,
    pub website: Option<String>,
    pub phone: Option<String>,
    pub industry: Option<String>,
    pub contacts: Vec<Contact>,
}

/// Persisted headcount observation, at most one per company identifier.
/// Overwritten (never appended) on every observation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanySnapshot {
    pub name: String,
    pub headcount: u32,
    pub last_check: chrono::DateTime<chrono::Utc>,
}

/// Headcount delta derived from the snapshot store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrowthSignal {
    pub is_growing: bool,
    pub growth_rate: f64,
    pub previous_headcount: u32,
    pub current_headcount: u32,
    pub days_tracked: i64,
}

impl GrowthSignal {
    /// Zero-growth signal used when no history exists or the tracking
    /// window has not elapsed.
    pub fn flat(headcount: u32) -> Self {
        Self {
            is_growing: false,
            growth_rate: 0.0,
            previous_headcount: headcount,
            current_headcount: headcount,
            days_tracked: 0,
        }
    }
}

/// A lead with all signals attached, ready for ranking and publishing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredLead {
    pub lead: NormalizedLead,
    pub composite_score: f64,
    pub growth: Option<GrowthSignal>,
    pub active_job_count: u32,
    pub company: CompanyInfo,
}

impl ScoredLead {
    /// Score used for ordering: composite when any multi-signal data is
    /// present, otherwise the posting-age urgency ramp.
    pub fn rank_score(&self) -> f64 {
        if self.composite_score > 0.0 {
            self.composite_score
        } else {
            self.lead.urgency_score
        }
    }
}
