//! Keyword classification: decides whether a raw posting belongs to the
//! commercial-insurance vertical before any budget is spent on it.

/// Why a record was accepted or rejected. Callers log this; the
/// classifier itself has no side effects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Accept,
    /// Title contained a term from an adjacent, commonly-confused domain.
    RejectedTerm(String),
    /// Title contained none of the required domain terms.
    NoRequiredTerm,
    /// Description was long enough to judge and proved off-domain.
    OffDomainDescription,
}

impl Verdict {
    pub fn is_accept(&self) -> bool {
        matches!(self, Verdict::Accept)
    }
}

pub struct Classifier {
    reject_terms: Vec<String>,
    required_terms: Vec<String>,
    context_terms: Vec<String>,
    /// Descriptions shorter than this are not judged at all.
    min_description_len: usize,
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(
            &[
                // Entry level / support roles
                "entry level",
                "entry-level",
                "junior",
                "intern",
                "trainee",
                "customer service",
                "call center",
                "claims adjuster",
                "claims rep",
                "claims examiner",
                "claims processor",
                "administrative",
                "clerk",
                // Brokers of things that are not insurance
                "pawn broker",
                "real estate broker",
                "mortgage broker",
                "freight broker",
                "customs broker",
                "data broker",
                "loan broker",
                "lending broker",
                // Producers of things that are not insurance
                "podcast",
                "tv producer",
                "webinar producer",
                "video producer",
                // Adjacent tech titles that pattern-match on "risk"/"broker"
                "software engineer",
                "software developer",
                "web developer",
                "data engineer",
            ],
            &[
                "insurance",
                "producer",
                "underwriter",
                "broker",
                "agent",
                "commercial lines",
                "commercial insurance",
                "risk",
                "p&c",
                "casualty",
                "surety",
                "actuary",
            ],
            &[
                "insurance",
                "commercial lines",
                "underwriting",
                "policy",
                "premium",
                "coverage",
                "risk",
                "broker",
                "casualty",
                "claims",
            ],
            200,
        )
    }
}

impl Classifier {
    pub fn new(
        reject_terms: &[&str],
        required_terms: &[&str],
        context_terms: &[&str],
        min_description_len: usize,
    ) -> Self {
        let lower = |terms: &[&str]| terms.iter().map(|t| t.to_lowercase()).collect();
        Self {
            reject_terms: lower(reject_terms),
            required_terms: lower(required_terms),
            context_terms: lower(context_terms),
            min_description_len,
        }
    }

    /// Full verdict with the reject reason, for logging.
    ///
    /// Order is fixed: reject-terms strictly before required-terms before
    /// the description context check. Missing fields are treated as "".
    pub fn evaluate(
        &self,
        title: Option<&str>,
        _company: Option<&str>,
        description: Option<&str>,
    ) -> Verdict {
        let title = title.unwrap_or("").to_lowercase();
        let description = description.unwrap_or("").to_lowercase();

        if let Some(term) = self.reject_terms.iter().find(|t| title.contains(t.as_str())) {
            return Verdict::RejectedTerm(term.clone());
        }

        if !self.required_terms.iter().any(|t| title.contains(t)) {
            return Verdict::NoRequiredTerm;
        }

        // A long description that never mentions the domain outweighs a
        // title that happened to pattern-match.
        if description.len() >= self.min_description_len
            && !self.context_terms.iter().any(|t| description.contains(t))
        {
            return Verdict::OffDomainDescription;
        }

        Verdict::Accept
    }

    /// Pure predicate form of [`evaluate`](Self::evaluate).
    pub fn classify(
        &self,
        title: Option<&str>,
        company: Option<&str>,
        description: Option<&str>,
    ) -> bool {
        self.evaluate(title, company, description).is_accept()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reject_terms_short_circuit() {
        let c = Classifier::default();
        // Even with a required term present and an on-domain description,
        // a reject term in the title wins.
        let verdict = c.evaluate(
            Some("Junior Commercial Insurance Underwriter"),
            Some("Acme Insurance"),
            Some(&"commercial insurance underwriting policy coverage ".repeat(10)),
        );
        assert_eq!(verdict, Verdict::RejectedTerm("junior".to_string()));
    }

    #[test]
    fn test_software_titles_rejected() {
        let c = Classifier::default();
        assert!(!c.classify(Some("Software Engineer"), Some("TechCo"), None));
        assert!(!c.classify(Some("Senior Software Developer - Risk Platform"), None, None));
    }

    #[test]
    fn test_requires_domain_term_in_title() {
        let c = Classifier::default();
        assert!(!c.classify(Some("Office Manager"), Some("Acme Insurance"), None));
        assert!(c.classify(Some("Commercial Insurance Underwriter"), Some("Acme Insurance"), None));
    }

    #[test]
    fn test_empty_title_always_fails() {
        let c = Classifier::default();
        assert!(!c.classify(None, Some("Acme Insurance"), None));
        assert!(!c.classify(Some(""), Some("Acme Insurance"), None));
    }

    #[test]
    fn test_short_description_not_judged() {
        let c = Classifier::default();
        // Under the length threshold the context check is skipped.
        assert!(c.classify(
            Some("Commercial Insurance Producer"),
            None,
            Some("great opportunity")
        ));
    }

    #[test]
    fn test_long_offdomain_description_rejects() {
        let c = Classifier::default();
        let body = "We build distributed systems in Go and Kubernetes, shipping \
                    microservices to production daily. You will own CI/CD tooling \
                    and observability stacks across multiple cloud regions with a \
                    focus on developer experience and platform reliability."
            .to_string();
        assert!(body.len() >= 200);
        let verdict = c.evaluate(Some("Risk Manager"), None, Some(&body));
        assert_eq!(verdict, Verdict::OffDomainDescription);
    }

    #[test]
    fn test_long_ondomain_description_accepts() {
        let c = Classifier::default();
        let body = "Our commercial lines team places property and casualty \
                    coverage for mid-market accounts. You will manage policy \
                    renewals, negotiate premium terms with carriers, and advise \
                    clients on risk transfer strategy across their book of business.";
        assert!(c.classify(Some("Risk Manager"), None, Some(body)));
    }

    #[test]
    fn test_case_insensitive() {
        let c = Classifier::default();
        assert!(c.classify(Some("COMMERCIAL INSURANCE BROKER"), None, None));
        assert!(!c.classify(Some("SOFTWARE ENGINEER"), None, None));
    }
}
