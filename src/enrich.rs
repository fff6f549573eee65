//! Contact enrichment: looks up companies and decision-maker contacts via
//! an external directory (Apollo), behind a trait so the pipeline can run
//! against stubs. Per-lead failures degrade to "no enrichment" and never
//! abort the batch.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::models::{CompanyInfo, Contact, NormalizedLead};

const APOLLO_BASE_URL: &str = "https://api.apollo.io/v1";
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Titles requested from the directory, in the original outreach order.
const CONTACT_TITLES: &[&str] = &[
    "CEO", "CFO", "President", "VP", "Vice President", "Director", "Manager", "Owner", "Partner",
    "HR Manager", "HR Director", "Talent Acquisition", "Recruiter", "Hiring Manager",
];

#[derive(Debug, Error)]
pub enum EnrichmentError {
    /// Upstream quota exhausted; retrying this run will not help.
    #[error("enrichment quota exhausted")]
    Quota,
    /// The bounded request timeout elapsed.
    #[error("enrichment request timed out")]
    Timeout,
    /// Non-2xx response that is not a quota signal.
    #[error("enrichment API returned status {0}")]
    Http(u16),
    /// Connection-level failure.
    #[error("enrichment transport error: {0}")]
    Transport(#[source] reqwest::Error),
}

impl From<reqwest::Error> for EnrichmentError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            EnrichmentError::Timeout
        } else {
            EnrichmentError::Transport(e)
        }
    }
}

/// One company candidate returned by the directory search.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompanyCandidate {
    pub id: String,
    pub name: String,
    pub website: Option<String>,
    pub phone: Option<String>,
    pub industry: Option<String>,
    pub employee_count: Option<u32>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
}

/// External contact-directory capability. An empty candidate/contact list
/// is a valid answer ("no match"), not an error.
pub trait ContactDirectory {
    fn search_companies(&self, name: &str) -> Result<Vec<CompanyCandidate>, EnrichmentError>;
    fn lookup_contacts(&self, company_id: &str, max: usize)
    -> Result<Vec<Contact>, EnrichmentError>;
}

// --- Apollo implementation ---

#[derive(Serialize)]
struct OrgSearchRequest<'a> {
    q_organization_name: &'a str,
    page: u32,
    per_page: u32,
}

#[derive(Deserialize)]
struct OrgSearchResponse {
    #[serde(default)]
    organizations: Vec<ApolloOrg>,
}

#[derive(Deserialize)]
struct ApolloOrg {
    #[serde(default)]
    id: String,
    #[serde(default)]
    name: String,
    website_url: Option<String>,
    phone: Option<String>,
    industry: Option<String>,
    estimated_num_employees: Option<u32>,
    city: Option<String>,
    state: Option<String>,
    country: Option<String>,
}

#[derive(Serialize)]
struct PeopleSearchRequest<'a> {
    organization_ids: Vec<&'a str>,
    person_titles: Vec<&'a str>,
    page: u32,
    per_page: usize,
}

#[derive(Deserialize)]
struct PeopleSearchResponse {
    #[serde(default)]
    people: Vec<ApolloPerson>,
}

#[derive(Deserialize)]
struct ApolloPerson {
    #[serde(default)]
    name: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    phone_numbers: Vec<ApolloPhone>,
    #[serde(default)]
    linkedin_url: String,
}

#[derive(Deserialize)]
struct ApolloPhone {
    #[serde(default)]
    sanitized_number: String,
}

pub struct ApolloClient {
    api_key: String,
    client: reqwest::blocking::Client,
}

impl ApolloClient {
    pub fn new(api_key: String) -> Result<Self, EnrichmentError> {
        let client = reqwest::blocking::Client::builder().timeout(HTTP_TIMEOUT).build()?;
        Ok(Self { api_key, client })
    }

    fn post<B: Serialize, R: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<R, EnrichmentError> {
        let response = self
            .client
            .post(format!("{APOLLO_BASE_URL}{path}"))
            .header("X-Api-Key", &self.api_key)
            .json(body)
            .send()?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(EnrichmentError::Quota);
        }
        if !status.is_success() {
            return Err(EnrichmentError::Http(status.as_u16()));
        }
        Ok(response.json()?)
    }
}

impl ContactDirectory for ApolloClient {
    fn search_companies(&self, name: &str) -> Result<Vec<CompanyCandidate>, EnrichmentError> {
        let request = OrgSearchRequest { q_organization_name: name, page: 1, per_page: 5 };
        let response: OrgSearchResponse = self.post("/organizations/search", &request)?;
        Ok(response
            .organizations
            .into_iter()
            .map(|org| CompanyCandidate {
                id: org.id,
                name: org.name,
                website: org.website_url,
                phone: org.phone,
                industry: org.industry,
                employee_count: org.estimated_num_employees,
                city: org.city,
                state: org.state,
                country: org.country,
            })
            .collect())
    }

    fn lookup_contacts(
        &self,
        company_id: &str,
        max: usize,
    ) -> Result<Vec<Contact>, EnrichmentError> {
        let request = PeopleSearchRequest {
            organization_ids: vec![company_id],
            person_titles: CONTACT_TITLES.to_vec(),
            page: 1,
            per_page: max,
        };
        let response: PeopleSearchResponse = self.post("/mixed_people/search", &request)?;
        Ok(response
            .people
            .into_iter()
            .take(max)
            .map(|p| Contact {
                name: p.name,
                title: p.title,
                email: p.email,
                phone: p
                    .phone_numbers
                    .first()
                    .map(|n| n.sanitized_number.clone())
                    .unwrap_or_default(),
                linkedin: p.linkedin_url,
            })
            .collect())
    }
}

// --- Orchestrator ---

/// Acceptable employee-count band for spending contact-lookup budget.
#[derive(Debug, Clone, Copy)]
pub struct SizeBand {
    pub min: u32,
    pub max: u32,
}

impl SizeBand {
    pub fn admits(&self, headcount: u32) -> bool {
        (self.min..=self.max).contains(&headcount)
    }
}

/// Result of enriching one lead. `admitted` is false when the company
/// matched but fell outside the size band; the headcount is still
/// reported so the snapshot store gets its baseline.
#[derive(Debug, Default)]
pub struct Enrichment {
    pub company_id: Option<String>,
    pub info: CompanyInfo,
    pub admitted: bool,
}

pub struct Enricher<D: ContactDirectory> {
    directory: D,
    /// Mandatory inter-call pacing; the upstream enforces quotas, so this
    /// is a sequencing constraint, not an optimization.
    pace: Duration,
    size_band: Option<SizeBand>,
    max_contacts: usize,
}

impl<D: ContactDirectory> Enricher<D> {
    pub fn new(directory: D, pace: Duration, size_band: Option<SizeBand>) -> Self {
        Self { directory, pace, size_band, max_contacts: 3 }
    }

    fn pace(&self) {
        if !self.pace.is_zero() {
            std::thread::sleep(self.pace);
        }
    }

    /// Attach company and contact data to a lead. Never fails: lookup
    /// errors and non-matches degrade to an empty enrichment.
    pub fn enrich(&self, lead: &NormalizedLead) -> Enrichment {
        let mut out = Enrichment { admitted: true, ..Default::default() };

        if is_null_company(&lead.company) {
            debug!("skipping enrichment for '{}': no usable company name", lead.title);
            return out;
        }

        let candidates = match self.directory.search_companies(&lead.company) {
            Ok(candidates) => candidates,
            Err(e) => {
                warn!("company lookup failed for '{}': {e}", lead.company);
                self.pace();
                return out;
            }
        };
        self.pace();

        let Some(candidate) = best_candidate(&candidates, &lead.company, &lead.location) else {
            debug!("no directory match for '{}'", lead.company);
            return out;
        };

        out.company_id = Some(candidate.id.clone());
        out.info.employee_count = candidate.employee_count;
        out.info.industry = candidate.industry.clone();

        if let (Some(band), Some(headcount)) = (self.size_band, candidate.employee_count) {
            if !band.admits(headcount) {
                debug!(
                    "'{}' outside size band ({headcount} employees), skipping contacts",
                    lead.company
                );
                out.admitted = false;
                return out;
            }
        }

        out.info.website = candidate.website.clone();
        out.info.phone = candidate.phone.clone();

        match self.directory.lookup_contacts(&candidate.id, self.max_contacts) {
            Ok(contacts) => {
                if !contacts.is_empty() {
                    info!("found {} contacts for '{}'", contacts.len(), lead.company);
                }
                out.info.contacts = contacts;
            }
            Err(e) => {
                warn!("contact lookup failed for '{}': {e}", lead.company);
            }
        }
        self.pace();

        out
    }
}

/// Company names that mean "unknown" upstream.
fn is_null_company(name: &str) -> bool {
    let name = name.trim();
    name.is_empty() || name.eq_ignore_ascii_case("n/a") || name.eq_ignore_ascii_case("nan")
        || name.eq_ignore_ascii_case("null")
        || name.eq_ignore_ascii_case("none")
}

fn name_matches(candidate: &str, query: &str) -> bool {
    let c = candidate.trim().to_lowercase();
    let q = query.trim().to_lowercase();
    if c.is_empty() || q.is_empty() {
        return false;
    }
    c == q || c.contains(&q) || q.contains(&c)
}

/// State code from a "City, ST" location string.
fn location_state(location: &str) -> Option<String> {
    let tail = location.rsplit(',').next()?.trim();
    // Strip a trailing "(Remote)"-style qualifier.
    let tail = tail.split('(').next().unwrap_or(tail).trim();
    if tail.is_empty() { None } else { Some(tail.to_lowercase()) }
}

fn is_us_coded(candidate: &CompanyCandidate) -> bool {
    if let Some(country) = &candidate.country {
        let c = country.trim().to_lowercase();
        if c == "united states" || c == "usa" || c == "us" {
            return true;
        }
    }
    candidate
        .website
        .as_deref()
        .map(|w| {
            let host = w.trim_end_matches('/');
            host.ends_with(".com") || host.ends_with(".us")
        })
        .unwrap_or(false)
}

/// Pick the best directory match for a lead: name+state match first, then
/// name match in a US-coded record, then the directory's own first-ranked
/// candidate. The first full match short-circuits.
pub fn best_candidate<'a>(
    candidates: &'a [CompanyCandidate],
    company: &str,
    location: &str,
) -> Option<&'a CompanyCandidate> {
    if candidates.is_empty() {
        return None;
    }

    let state = location_state(location);

    if let Some(state) = &state {
        if let Some(hit) = candidates.iter().find(|c| {
            name_matches(&c.name, company)
                && c.state.as_deref().map(|s| s.trim().to_lowercase() == *state).unwrap_or(false)
        }) {
            return Some(hit);
        }
    }

    if let Some(hit) =
        candidates.iter().find(|c| name_matches(&c.name, company) && is_us_coded(c))
    {
        return Some(hit);
    }

    candidates.first()
}
