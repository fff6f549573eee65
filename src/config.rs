//! Pipeline configuration: environment secrets plus tunables that differ
//! between deployments. Only the missing enrichment credential is fatal.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::info;

use crate::dedupe::DedupePolicy;
use crate::enrich::SizeBand;
use crate::rank::TierThresholds;

/// Search terms issued to the job source, one fetch per term.
pub const DEFAULT_SEARCH_TERMS: &[&str] = &[
    "Commercial Insurance Underwriter",
    "Commercial Lines Manager",
    "Insurance Risk Manager",
    "Commercial P&C Specialist",
    "Commercial Insurance Broker",
    "Risk Assessment Manager",
];

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub apollo_token: String,
    pub apify_token: Option<String>,
    pub apify_actor_id: String,

    pub search_terms: Vec<String>,
    pub max_items_per_search: u32,

    pub top_n: usize,
    pub tiering: bool,
    pub tier_thresholds: TierThresholds,
    pub dedupe_policy: DedupePolicy,
    pub one_per_company: bool,
    pub size_band: Option<SizeBand>,
    /// Pause between external enrichment calls.
    pub pace: Duration,

    pub snapshot_path: PathBuf,
    pub seen_leads_path: PathBuf,
    pub output_dir: PathBuf,
}

impl PipelineConfig {
    /// Load from the environment. `APOLLO_API_TOKEN` is required; its
    /// absence is the one fatal startup error.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let apollo_token = std::env::var("APOLLO_API_TOKEN")
            .context("APOLLO_API_TOKEN environment variable not set")?;

        let size_band = match std::env::var("MAX_COMPANY_SIZE").ok() {
            Some(raw) => {
                let max: u32 = raw.parse().context("MAX_COMPANY_SIZE must be an integer")?;
                let min: u32 = std::env::var("MIN_COMPANY_SIZE")
                    .ok()
                    .map(|v| v.parse())
                    .transpose()
                    .context("MIN_COMPANY_SIZE must be an integer")?
                    .unwrap_or(1);
                Some(SizeBand { min, max })
            }
            // The target band for contact-lookup budget; override or
            // disable via the environment.
            None => Some(SizeBand { min: 1, max: 500 }),
        };

        let dedupe_policy = std::env::var("DEDUPE_POLICY")
            .ok()
            .map(|v| v.parse())
            .transpose()?
            .unwrap_or_default();

        let pace_ms: u64 = std::env::var("ENRICH_PACE_MS")
            .ok()
            .map(|v| v.parse())
            .transpose()
            .context("ENRICH_PACE_MS must be an integer")?
            .unwrap_or(600);

        let config = Self {
            apollo_token,
            apify_token: std::env::var("APIFY_API_TOKEN").ok(),
            apify_actor_id: std::env::var("APIFY_ACTOR_ID")
                .unwrap_or_else(|_| "databro~indeedjobsscraper".to_string()),
            search_terms: DEFAULT_SEARCH_TERMS.iter().map(|s| s.to_string()).collect(),
            max_items_per_search: 50,
            top_n: 20,
            tiering: true,
            tier_thresholds: TierThresholds::default(),
            dedupe_policy,
            one_per_company: false,
            size_band,
            pace: Duration::from_millis(pace_ms),
            snapshot_path: PathBuf::from("company_history.json"),
            seen_leads_path: PathBuf::from("collected_leads.json"),
            output_dir: PathBuf::from("leads_output"),
        };

        info!(
            "config: policy={:?}, top_n={}, size_band={:?}, pace={:?}",
            config.dedupe_policy, config.top_n, config.size_band, config.pace
        );
        Ok(config)
    }
}
