//! Artifact publishing: flat CSV and JSON files the dashboards consume.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;
use tracing::info;

use crate::models::ScoredLead;

/// Flat per-lead record for CSV/JSON/dashboard rendering.
#[derive(Debug, Serialize)]
pub struct FlatLead {
    pub title: String,
    pub company: String,
    pub location: String,
    pub url: String,
    pub source: String,
    pub posted_date: String,
    pub days_open: Option<i64>,
    pub urgency_score: f64,
    pub composite_score: f64,
    pub growth_rate: f64,
    pub active_jobs: u32,
    pub company_size: Option<u32>,
    pub website: String,
    pub phone: String,
    pub contacts: Vec<crate::models::Contact>,
}

impl From<&ScoredLead> for FlatLead {
    fn from(scored: &ScoredLead) -> Self {
        Self {
            title: scored.lead.title.clone(),
            company: scored.lead.company.clone(),
            location: scored.lead.location.clone(),
            url: scored.lead.url.clone(),
            source: scored.lead.source.clone(),
            posted_date: scored
                .lead
                .posted_date
                .map(|d| d.to_string())
                .unwrap_or_default(),
            days_open: scored.lead.days_open,
            urgency_score: scored.lead.urgency_score,
            composite_score: scored.composite_score,
            growth_rate: scored.growth.as_ref().map(|g| g.growth_rate).unwrap_or(0.0),
            active_jobs: scored.active_job_count,
            company_size: scored.company.employee_count,
            website: scored.company.website.clone().unwrap_or_default(),
            phone: scored.company.phone.clone().unwrap_or_default(),
            contacts: scored.company.contacts.clone(),
        }
    }
}

fn escape_csv(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Render leads as CSV with up to three contact columns per lead.
pub fn to_csv(leads: &[FlatLead]) -> String {
    let mut csv = String::from(
        "Job Title,Company Name,Location,Job URL,Posted Date,Days Open,Source,\
         Urgency Score,Composite Score,Growth Rate %,Active Jobs,Company Size,\
         Company Website,Phone Number",
    );
    for i in 1..=3 {
        csv.push_str(&format!(
            ",Contact {i} Name,Contact {i} Title,Contact {i} Email,Contact {i} Phone,Contact {i} LinkedIn"
        ));
    }
    csv.push('\n');

    for lead in leads {
        csv.push_str(&format!(
            "{},{},{},{},{},{},{},{:.2},{:.1},{},{},{},{},{}",
            escape_csv(&lead.title),
            escape_csv(&lead.company),
            escape_csv(&lead.location),
            escape_csv(&lead.url),
            lead.posted_date,
            lead.days_open.map(|d| d.to_string()).unwrap_or_default(),
            escape_csv(&lead.source),
            lead.urgency_score,
            lead.composite_score,
            lead.growth_rate,
            lead.active_jobs,
            lead.company_size.map(|s| s.to_string()).unwrap_or_default(),
            escape_csv(&lead.website),
            escape_csv(&lead.phone),
        ));
        for i in 0..3 {
            match lead.contacts.get(i) {
                Some(c) => csv.push_str(&format!(
                    ",{},{},{},{},{}",
                    escape_csv(&c.name),
                    escape_csv(&c.title),
                    escape_csv(&c.email),
                    escape_csv(&c.phone),
                    escape_csv(&c.linkedin),
                )),
                None => csv.push_str(",,,,,"),
            }
        }
        csv.push('\n');
    }
    csv
}

/// Write timestamped CSV and JSON artifacts; returns the CSV path.
pub fn publish(leads: &[ScoredLead], output_dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create output dir {}", output_dir.display()))?;

    let flat: Vec<FlatLead> = leads.iter().map(FlatLead::from).collect();
    let stamp = Utc::now().format("%Y%m%d_%H%M%S");

    let csv_path = output_dir.join(format!("insurance_leads_{stamp}.csv"));
    std::fs::write(&csv_path, to_csv(&flat))
        .with_context(|| format!("failed to write {}", csv_path.display()))?;

    let json_path = output_dir.join(format!("insurance_leads_{stamp}.json"));
    std::fs::write(&json_path, serde_json::to_string_pretty(&flat)?)
        .with_context(|| format!("failed to write {}", json_path.display()))?;

    info!("wrote {} leads to {}", leads.len(), csv_path.display());
    Ok(csv_path)
}
