//! Cross-run persistence: company headcount snapshots and the set of
//! previously surfaced lead ids. Both are small JSON files; a corrupt or
//! missing file means "no history" and is recreated on the next save.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::models::{CompanySnapshot, GrowthSignal};

/// Keyed store of headcount snapshots, one per company identifier.
pub trait SnapshotStore {
    fn get(&self, company_id: &str) -> Option<CompanySnapshot>;
    fn put(&mut self, company_id: &str, snapshot: CompanySnapshot);
    /// Flush to durable storage.
    fn persist(&self) -> Result<()>;
}

/// JSON-file backed implementation of [`SnapshotStore`].
pub struct JsonSnapshotStore {
    path: PathBuf,
    snapshots: HashMap<String, CompanySnapshot>,
}

impl JsonSnapshotStore {
    pub fn open(path: &Path) -> Self {
        let snapshots = match std::fs::read_to_string(path) {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(map) => map,
                Err(e) => {
                    warn!("snapshot store {} is corrupt ({e}), starting fresh", path.display());
                    HashMap::new()
                }
            },
            Err(_) => HashMap::new(),
        };
        info!("loaded {} company snapshots from {}", snapshots.len(), path.display());
        Self { path: path.to_path_buf(), snapshots }
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &CompanySnapshot)> {
        self.snapshots.iter()
    }
}

impl SnapshotStore for JsonSnapshotStore {
    fn get(&self, company_id: &str) -> Option<CompanySnapshot> {
        self.snapshots.get(company_id).cloned()
    }

    fn put(&mut self, company_id: &str, snapshot: CompanySnapshot) {
        self.snapshots.insert(company_id.to_string(), snapshot);
    }

    fn persist(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let raw = serde_json::to_string_pretty(&self.snapshots)?;
        std::fs::write(&self.path, raw)
            .with_context(|| format!("failed to write snapshot store {}", self.path.display()))?;
        Ok(())
    }
}

/// Persisted set of lead ids that have already been surfaced, used by the
/// exclude-seen dedup policy.
pub struct SeenLeads {
    path: PathBuf,
    ids: HashSet<String>,
}

impl SeenLeads {
    pub fn open(path: &Path) -> Self {
        let ids = match std::fs::read_to_string(path) {
            Ok(raw) => match serde_json::from_str::<Vec<String>>(&raw) {
                Ok(list) => list.into_iter().collect(),
                Err(e) => {
                    warn!("seen-leads file {} is corrupt ({e}), starting fresh", path.display());
                    HashSet::new()
                }
            },
            Err(_) => HashSet::new(),
        };
        Self { path: path.to_path_buf(), ids }
    }

    pub fn ids(&self) -> &HashSet<String> {
        &self.ids
    }

    pub fn mark(&mut self, lead_id: &str) {
        self.ids.insert(lead_id.to_string());
    }

    pub fn persist(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let mut list: Vec<&String> = self.ids.iter().collect();
        list.sort();
        let raw = serde_json::to_string_pretty(&list)?;
        std::fs::write(&self.path, raw)
            .with_context(|| format!("failed to write seen-leads file {}", self.path.display()))?;
        Ok(())
    }
}

/// Derives a growth signal by diffing the current headcount against the
/// stored snapshot, then unconditionally overwrites the snapshot so the
/// next run has a baseline.
pub struct GrowthTracker {
    /// Growth is only meaningful across this many days; below it the
    /// signal reports zero regardless of the actual delta.
    min_window_days: i64,
    /// Rate (percent) at or above which a company counts as growing.
    growth_threshold: f64,
}

impl Default for GrowthTracker {
    fn default() -> Self {
        Self { min_window_days: 7, growth_threshold: 10.0 }
    }
}

impl GrowthTracker {
    pub fn update_and_diff(
        &self,
        store: &mut impl SnapshotStore,
        company_id: &str,
        name: &str,
        current_headcount: u32,
        now: DateTime<Utc>,
    ) -> GrowthSignal {
        let mut signal = GrowthSignal::flat(current_headcount);

        if let Some(prev) = store.get(company_id) {
            let days_tracked = (now - prev.last_check).num_days();
            if days_tracked >= self.min_window_days && prev.headcount > 0 {
                let delta = current_headcount as f64 - prev.headcount as f64;
                let rate = (delta / prev.headcount as f64 * 100.0 * 100.0).round() / 100.0;
                signal.previous_headcount = prev.headcount;
                signal.growth_rate = rate;
                signal.days_tracked = days_tracked;
                signal.is_growing = rate >= self.growth_threshold;
                if signal.is_growing {
                    debug!(
                        "growth signal: {name} +{rate}% ({} -> {current_headcount})",
                        prev.headcount
                    );
                }
            }
        }

        store.put(
            company_id,
            CompanySnapshot { name: name.to_string(), headcount: current_headcount, last_check: now },
        );

        signal
    }
}
