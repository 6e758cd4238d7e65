//! DOI resolution over the strategy table
//!
//! The resolver walks its strategies once, in priority order, and stops at the
//! first one that yields an accepted identifier. There is no scoring or merging
//! of hits from different strategies.

use serde::{Deserialize, Serialize};

use crate::error::ResolveError;
use crate::identifier::Identifier;
use crate::page::{DomQuery, HostPageAccessor};
use crate::strategy::{default_strategies, AttemptOutcome, PageContext, Strategy};

/// The best-guess identifier for a page and the strategy that found it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "uniffi", derive(uniffi::Record))]
pub struct Resolution {
    pub doi: Identifier,
    pub source_strategy: String,
}

/// One strategy consulted during a resolution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyAttempt {
    pub strategy: String,
    #[serde(flatten)]
    pub outcome: AttemptOutcome,
}

/// Resolution plus the per-strategy diagnostics that led to it
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ResolutionTrace {
    pub resolution: Option<Resolution>,
    pub attempts: Vec<StrategyAttempt>,
}

impl ResolutionTrace {
    /// True when some strategy saw conflicting candidates
    pub fn saw_ambiguity(&self) -> bool {
        self.attempts.iter().any(|attempt| match &attempt.outcome {
            AttemptOutcome::Ambiguous { .. } => true,
            AttemptOutcome::Matched { conflicting, .. } => !conflicting.is_empty(),
            _ => false,
        })
    }
}

/// Finds the DOI embedded in a publisher page
#[derive(Debug, Clone)]
pub struct DoiResolver {
    strategies: Vec<Strategy>,
}

impl Default for DoiResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl DoiResolver {
    /// Resolver over the built-in strategy table
    pub fn new() -> Self {
        Self::with_strategies(default_strategies())
    }

    pub fn with_strategies(strategies: Vec<Strategy>) -> Self {
        Self { strategies }
    }

    pub fn strategies(&self) -> &[Strategy] {
        &self.strategies
    }

    /// Resolve a page's identifier.
    ///
    /// `Ok(None)` means no strategy matched. Errors only come from the DOM
    /// accessor.
    pub fn resolve(
        &self,
        page_url: &str,
        page_markup: &str,
        dom: &dyn DomQuery,
    ) -> Result<Option<Resolution>, ResolveError> {
        Ok(self.explain(page_url, page_markup, dom)?.resolution)
    }

    /// Resolve a page that supplies its own URL and markup
    pub fn resolve_page<P>(&self, page: &P) -> Result<Option<Resolution>, ResolveError>
    where
        P: HostPageAccessor + DomQuery,
    {
        Ok(self.explain_page(page)?.resolution)
    }

    pub fn explain_page<P>(&self, page: &P) -> Result<ResolutionTrace, ResolveError>
    where
        P: HostPageAccessor + DomQuery,
    {
        let url = page.current_url()?;
        let markup = page.serialized_markup()?;
        self.explain(&url, &markup, page)
    }

    /// Like [`resolve`](Self::resolve), but records every strategy consulted.
    pub fn explain(
        &self,
        page_url: &str,
        page_markup: &str,
        dom: &dyn DomQuery,
    ) -> Result<ResolutionTrace, ResolveError> {
        let page = PageContext {
            url: page_url,
            markup: page_markup,
            dom,
        };
        let mut trace = ResolutionTrace::default();

        for strategy in &self.strategies {
            let outcome = strategy.evaluate(&page)?;
            match &outcome {
                AttemptOutcome::Skipped => {}
                AttemptOutcome::Ambiguous { values } => {
                    tracing::debug!(
                        strategy = strategy.name,
                        ?values,
                        "Conflicting candidates, strategy declined"
                    );
                }
                AttemptOutcome::Matched { conflicting, .. } if !conflicting.is_empty() => {
                    tracing::warn!(
                        strategy = strategy.name,
                        ?conflicting,
                        "Page declares disagreeing DOIs, keeping the first"
                    );
                }
                other => tracing::debug!(strategy = strategy.name, outcome = ?other, "Strategy attempted"),
            }

            let resolved = outcome.identifier().cloned();
            trace.attempts.push(StrategyAttempt {
                strategy: strategy.name.to_string(),
                outcome,
            });

            if let Some(doi) = resolved {
                tracing::info!(strategy = strategy.name, doi = %doi, "Resolved identifier");
                trace.resolution = Some(Resolution {
                    doi,
                    source_strategy: strategy.name.to_string(),
                });
                return Ok(trace);
            }
        }

        tracing::debug!(url = page_url, "No DOI detected");
        Ok(trace)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PageError;
    use crate::page::{DomElement, HtmlPage};

    struct DetachedPage;

    impl DomQuery for DetachedPage {
        fn query_all(&self, _selector: &str) -> Result<Vec<DomElement>, PageError> {
            Err(PageError::Detached)
        }
    }

    #[test]
    fn test_meta_tag_resolution() {
        let page = HtmlPage::parse(
            "https://journals.example.org/article/1",
            r#"<html><head><meta name="citation_doi" content="10.1000/xyz123"></head></html>"#,
        );
        let resolution = DoiResolver::new().resolve_page(&page).unwrap().unwrap();
        assert_eq!(resolution.doi.as_str(), "10.1000/xyz123");
        assert_eq!(resolution.source_strategy, "Meta Tags");
    }

    #[test]
    fn test_no_doi_is_none() {
        let page = HtmlPage::parse("https://example.org/", "<p>Nothing here</p>");
        assert_eq!(DoiResolver::new().resolve_page(&page).unwrap(), None);
    }

    #[test]
    fn test_accessor_fault_propagates() {
        let err = DoiResolver::new()
            .resolve("https://example.org/", "", &DetachedPage)
            .unwrap_err();
        assert_eq!(err, ResolveError::Accessor(PageError::Detached));
    }

    #[test]
    fn test_trace_stops_at_first_match() {
        let page = HtmlPage::parse("https://arxiv.org/abs/2301.01234", "<p></p>");
        let trace = DoiResolver::new().explain_page(&page).unwrap();
        let last = trace.attempts.last().unwrap();
        assert_eq!(last.strategy, "arXiv");
        assert_eq!(trace.attempts.len(), DoiResolver::new().strategies().len());
        assert_eq!(trace.resolution.unwrap().source_strategy, "arXiv");
    }

    #[test]
    fn test_trace_records_ambiguity() {
        let page = HtmlPage::parse(
            "https://example.org/",
            r#"<div data-doi="10.1/a"></div><div data-doi="10.1/b"></div>"#,
        );
        let trace = DoiResolver::new().explain_page(&page).unwrap();
        assert!(trace.resolution.is_none());
        assert!(trace.saw_ambiguity());
    }

    #[test]
    fn test_custom_strategy_table() {
        let resolver = DoiResolver::with_strategies(vec![]);
        let page = HtmlPage::parse(
            "https://example.org/",
            r#"<meta name="citation_doi" content="10.1000/xyz123">"#,
        );
        assert!(resolver.resolve_page(&page).unwrap().is_none());
    }
}
