//! Job sources. The pipeline treats scraping as an opaque collaborator:
//! a source hands back raw JSON items and an adapter schema, nothing more.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::normalize::SourceSchema;

const APIFY_BASE_URL: &str = "https://api.apify.com/v2";
const POLL_INTERVAL: Duration = Duration::from_secs(5);
const MAX_RUN_WAIT: Duration = Duration::from_secs(300);

pub trait JobSource {
    /// Fetch raw items for one search term.
    fn fetch(&self, search_term: &str) -> Result<Vec<Value>>;
    /// Which adapter maps this source's items.
    fn schema(&self) -> SourceSchema;
}

/// Reads raw items from a local JSON file (an array of scraper items).
/// Used for offline runs and tests; ignores the search term.
pub struct JsonFileSource {
    path: PathBuf,
    schema: SourceSchema,
}

impl JsonFileSource {
    pub fn new(path: PathBuf, schema: SourceSchema) -> Self {
        Self { path, schema }
    }
}

impl JobSource for JsonFileSource {
    fn fetch(&self, _search_term: &str) -> Result<Vec<Value>> {
        let raw = std::fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read input file {}", self.path.display()))?;
        let items: Vec<Value> = serde_json::from_str(&raw)
            .with_context(|| format!("input file {} is not a JSON array", self.path.display()))?;
        Ok(items)
    }

    fn schema(&self) -> SourceSchema {
        self.schema
    }
}

/// Starts an Apify actor run, polls it to completion and downloads the
/// dataset items.
pub struct ApifySource {
    token: String,
    actor_id: String,
    max_items: u32,
    client: reqwest::blocking::Client,
}

#[derive(Deserialize)]
struct RunEnvelope {
    data: RunData,
}

#[derive(Deserialize)]
struct RunData {
    id: String,
    #[serde(rename = "defaultDatasetId")]
    default_dataset_id: String,
    #[serde(default)]
    status: String,
}

impl ApifySource {
    pub fn new(token: String, actor_id: String, max_items: u32) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self { token, actor_id, max_items, client })
    }

    fn start_run(&self, search_term: &str) -> Result<RunData> {
        let input = serde_json::json!({
            "searchKeyword": search_term,
            "location": "United States",
            "maxItems": self.max_items,
        });
        let response = self
            .client
            .post(format!("{APIFY_BASE_URL}/acts/{}/runs", self.actor_id))
            .bearer_auth(&self.token)
            .json(&input)
            .send()
            .context("failed to start actor run")?;
        if response.status().as_u16() != 201 {
            bail!("actor run request returned status {}", response.status());
        }
        let envelope: RunEnvelope = response.json().context("bad actor run response")?;
        Ok(envelope.data)
    }

    fn wait_for_run(&self, run_id: &str) -> Result<String> {
        let start = Instant::now();
        loop {
            if start.elapsed() > MAX_RUN_WAIT {
                bail!("timed out waiting for actor run {run_id}");
            }
            std::thread::sleep(POLL_INTERVAL);

            let response = self
                .client
                .get(format!("{APIFY_BASE_URL}/actor-runs/{run_id}"))
                .bearer_auth(&self.token)
                .send();
            let status = match response {
                Ok(r) if r.status().is_success() => {
                    let envelope: RunEnvelope = r.json().context("bad run status response")?;
                    envelope.data.status
                }
                Ok(r) => {
                    warn!("run status check returned {}", r.status());
                    continue;
                }
                Err(e) => {
                    warn!("run status check failed: {e}");
                    continue;
                }
            };

            match status.as_str() {
                "SUCCEEDED" => return Ok(status),
                "FAILED" | "ABORTED" | "TIMED-OUT" => {
                    bail!("actor run {run_id} ended with status {status}")
                }
                _ => {}
            }
        }
    }
}

impl JobSource for ApifySource {
    fn fetch(&self, search_term: &str) -> Result<Vec<Value>> {
        info!("fetching jobs for '{search_term}'");
        let run = self.start_run(search_term)?;
        self.wait_for_run(&run.id)?;

        let items: Vec<Value> = self
            .client
            .get(format!("{APIFY_BASE_URL}/datasets/{}/items", run.default_dataset_id))
            .bearer_auth(&self.token)
            .send()
            .context("failed to fetch dataset items")?
            .json()
            .context("bad dataset response")?;
        info!("retrieved {} items for '{search_term}'", items.len());
        Ok(items)
    }

    fn schema(&self) -> SourceSchema {
        SourceSchema::ApifyIndeed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_json_file_source_reads_items() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"[{{"title": "Underwriter", "company": "Acme"}}]"#).unwrap();
        let source = JsonFileSource::new(file.path().to_path_buf(), SourceSchema::JobSpy);
        let items = source.fetch("ignored").unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["title"], "Underwriter");
    }

    #[test]
    fn test_json_file_source_rejects_non_array() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"not": "an array"}}"#).unwrap();
        let source = JsonFileSource::new(file.path().to_path_buf(), SourceSchema::JobSpy);
        assert!(source.fetch("ignored").is_err());
    }
}
