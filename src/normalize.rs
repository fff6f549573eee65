//! Normalization adapters: one per upstream schema, mapping raw scraper
//! items onto [`RawRecord`] so the rest of the pipeline never guesses
//! field names.

use chrono::{NaiveDate, NaiveDateTime};
use serde_json::Value;

use crate::identity::lead_id;
use crate::models::{NormalizedLead, RawRecord};
use crate::score::urgency_score;

/// Upstream schemas we know how to map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SourceSchema {
    /// Apify Indeed actor output (jobTitle/companyName/jobLocation/...).
    ApifyIndeed,
    /// JobSpy scraper output (title/company/location/job_url/...).
    #[default]
    JobSpy,
}

impl std::str::FromStr for SourceSchema {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "apify-indeed" | "apify_indeed" => Ok(Self::ApifyIndeed),
            "jobspy" => Ok(Self::JobSpy),
            other => anyhow::bail!("unknown source schema '{other}' (use apify-indeed or jobspy)"),
        }
    }
}

fn text(item: &Value, keys: &[&str]) -> Option<String> {
    for key in keys {
        if let Some(v) = item.get(key) {
            if let Some(s) = v.as_str() {
                let s = s.trim();
                if !s.is_empty() {
                    return Some(s.to_string());
                }
            }
        }
    }
    None
}

/// Map one raw scraper item onto the shared record shape.
pub fn adapt(item: &Value, schema: SourceSchema) -> RawRecord {
    match schema {
        SourceSchema::ApifyIndeed => RawRecord {
            title: text(item, &["jobTitle", "title"]),
            company: text(item, &["companyName", "company"]),
            location: text(item, &["jobLocation", "location"]),
            description: text(item, &["jobDescription", "description"]),
            url: text(item, &["url", "jobUrl"]),
            posted_date: text(item, &["datePosted", "postedDate"]),
            source: Some("indeed".to_string()),
        },
        SourceSchema::JobSpy => RawRecord {
            title: text(item, &["title"]),
            company: text(item, &["company"]),
            location: text(item, &["location"]),
            description: text(item, &["description"]),
            url: text(item, &["job_url", "url"]),
            posted_date: text(item, &["date_posted", "posted_date"]),
            source: text(item, &["site", "source"]),
        },
    }
}

/// Parse the free-text posted date the upstream gives us. Accepts plain
/// dates and ISO datetimes (with or without fractional seconds); anything
/// else is "unknown age".
pub fn parse_posted_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(d) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(d);
    }

    // ISO datetimes: drop a fractional-seconds suffix first.
    let candidate = raw.split('.').next().unwrap_or(raw);
    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(candidate, fmt) {
            return Some(dt.date());
        }
    }

    None
}

/// Build a [`NormalizedLead`] from a raw record, deriving identity, age
/// and the urgency score. `today` is the run date, injected so tests are
/// deterministic.
pub fn normalize(record: &RawRecord, today: NaiveDate) -> NormalizedLead {
    let title = record.title.clone().unwrap_or_default();
    let company = record.company.clone().unwrap_or_default();
    let location = record.location.clone().unwrap_or_default();

    let posted_date = record.posted_date.as_deref().and_then(parse_posted_date);
    let days_open = posted_date.map(|d| (today - d).num_days());

    NormalizedLead {
        lead_id: lead_id(&company, &title, &location),
        urgency_score: urgency_score(days_open),
        title,
        company,
        location,
        url: record.url.clone().unwrap_or_default(),
        source: record.source.clone().unwrap_or_else(|| "unknown".to_string()),
        posted_date,
        days_open,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_apify_indeed_field_mapping() {
        let item = json!({
            "jobTitle": "Commercial Insurance Underwriter",
            "companyName": "Acme Insurance",
            "jobLocation": "Austin, TX",
            "jobDescription": "Underwrite commercial lines.",
            "url": "https://indeed.com/viewjob?jk=1",
            "datePosted": "2026-07-01"
        });
        let record = adapt(&item, SourceSchema::ApifyIndeed);
        assert_eq!(record.title.as_deref(), Some("Commercial Insurance Underwriter"));
        assert_eq!(record.company.as_deref(), Some("Acme Insurance"));
        assert_eq!(record.posted_date.as_deref(), Some("2026-07-01"));
        assert_eq!(record.source.as_deref(), Some("indeed"));
    }

    #[test]
    fn test_jobspy_field_mapping() {
        let item = json!({
            "title": "Commercial Lines Producer",
            "company": "Beta Brokers",
            "location": "Dallas, TX",
            "job_url": "https://linkedin.com/jobs/view/2",
            "date_posted": "2026-08-01",
            "site": "linkedin"
        });
        let record = adapt(&item, SourceSchema::JobSpy);
        assert_eq!(record.title.as_deref(), Some("Commercial Lines Producer"));
        assert_eq!(record.url.as_deref(), Some("https://linkedin.com/jobs/view/2"));
        assert_eq!(record.source.as_deref(), Some("linkedin"));
    }

    #[test]
    fn test_missing_fields_become_none() {
        let record = adapt(&json!({}), SourceSchema::JobSpy);
        assert!(record.title.is_none());
        assert!(record.company.is_none());
        assert!(record.posted_date.is_none());
    }

    #[test]
    fn test_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2026, 7, 15).unwrap();
        assert_eq!(parse_posted_date("2026-07-15"), Some(expected));
        assert_eq!(parse_posted_date("2026-07-15T09:30:00"), Some(expected));
        assert_eq!(parse_posted_date("2026-07-15T09:30:00.123456"), Some(expected));
        assert_eq!(parse_posted_date("2026-07-15 09:30:00"), Some(expected));
        assert_eq!(parse_posted_date("3 days ago"), None);
        assert_eq!(parse_posted_date(""), None);
    }

    #[test]
    fn test_normalize_derives_age_and_urgency() {
        let record = RawRecord {
            title: Some("Commercial Insurance Underwriter".to_string()),
            company: Some("Acme Insurance".to_string()),
            location: Some("Austin, TX".to_string()),
            posted_date: Some("2026-07-17".to_string()),
            ..Default::default()
        };
        let today = NaiveDate::from_ymd_opt(2026, 8, 26).unwrap(); // 40 days later
        let lead = normalize(&record, today);
        assert_eq!(lead.days_open, Some(40));
        assert!((lead.urgency_score - 34.21).abs() < 0.01);
        assert_eq!(lead.lead_id.len(), 32);
    }

    #[test]
    fn test_normalize_unparseable_date_is_unknown_age() {
        let record = RawRecord {
            title: Some("Producer".to_string()),
            company: Some("Acme".to_string()),
            posted_date: Some("just now".to_string()),
            ..Default::default()
        };
        let lead = normalize(&record, NaiveDate::from_ymd_opt(2026, 8, 26).unwrap());
        assert!(lead.posted_date.is_none());
        assert_eq!(lead.days_open, None);
        assert_eq!(lead.urgency_score, 0.0);
    }
}
