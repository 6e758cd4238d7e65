//! The extraction strategy table
//!
//! Each publisher quirk is one [`Strategy`]: a name, an optional host gate,
//! and an ordered list of [`Extractor`]s tried until one yields an accepted
//! identifier. The resolver walks [`default_strategies`] in order.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::PageError;
use crate::identifier::{Identifier, IdentifierKind, ARXIV_ABS_URL};
use crate::page::DomQuery;

/// Meta tag names that carry a DOI on most publisher pages
pub const DOI_META_NAMES: &[&str] = &[
    "citation_doi",
    "doi",
    "dc.doi",
    "dc.identifier",
    "dc.identifier.doi",
    "bepress_citation_doi",
    "rft_id",
    "dcsext.wt_doi",
];

// Rejected candidates kept per attempt for diagnostics
const MAX_REPORTED_CANDIDATES: usize = 5;

lazy_static! {
    static ref SCIENCEDIRECT_SDM_DOI: Regex = Regex::new(r"SDM\.doi\s*=\s*'([^']+)'").unwrap();
    static ref DOI_ORG_SUFFIX: Regex = Regex::new(r"doi\.org/(.+)").unwrap();
    static ref IEEE_JSON_DOI: Regex = Regex::new(r#""doi":"([^"]+)""#).unwrap();
    static ref WHOLE_TEXT: Regex = Regex::new(r"(?s)(.+)").unwrap();
    static ref SPRINGER_JSON_DOI: Regex = Regex::new(r#""doi"\s*:\s*"([^"]+)""#).unwrap();
    static ref PSYCNET_DOI_HREF: Regex = Regex::new(r#"href="/doi/(10\..+?)""#).unwrap();
    static ref AFTER_DOI_ORG: Regex = Regex::new(r"^(?:.*doi\.org/)?(.+)$").unwrap();
    static ref INDERSCIENCE_PB_CONTEXT: Regex =
        Regex::new(r"article:article:(10\.\d+[^;]*)").unwrap();
    static ref CAIRN_DOI_HREF: Regex = Regex::new(r"https?://doi\.org/(10\.\d+/.*)").unwrap();
}

/// Restricts a strategy to pages served from one publisher domain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostFilter {
    domain: &'static str,
}

impl HostFilter {
    pub const fn new(domain: &'static str) -> Self {
        Self { domain }
    }

    /// True when the page host contains the domain, which also covers
    /// subdomains and institutional proxies such as
    /// `www.sciencedirect.com.ezproxy.example.edu`.
    ///
    /// URLs that do not parse fall back to a substring test.
    pub fn matches(&self, page_url: &str) -> bool {
        match Url::parse(page_url) {
            Ok(url) => url
                .host_str()
                .is_some_and(|host| host.to_ascii_lowercase().contains(self.domain)),
            Err(_) => page_url.contains(self.domain),
        }
    }
}

/// Which part of a matched element an anchor scan reads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementField {
    Text,
    Href,
}

/// One way of pulling a candidate out of a page
#[derive(Debug, Clone)]
pub enum Extractor {
    /// `<meta>` elements whose `name` is in `names`; `content_pattern`
    /// narrows the content to its first capture group.
    MetaTag {
        names: &'static [&'static str],
        content_pattern: Option<Regex>,
        check_scheme: bool,
    },
    /// Every element carrying `attribute` must agree on one value.
    DataAttribute { attribute: &'static str },
    /// First capture group over the serialized markup.
    RegexOnMarkup { pattern: Regex },
    /// First capture group over the page URL.
    RegexOnUrl { pattern: Regex },
    /// Elements matching `selector` (optionally with exact visible text),
    /// first capture group of the chosen field.
    DomAnchorScan {
        selector: &'static str,
        exact_text: Option<&'static str>,
        field: ElementField,
        pattern: Regex,
    },
}

/// Page inputs shared by every strategy in one resolution
pub struct PageContext<'a> {
    pub url: &'a str,
    pub markup: &'a str,
    pub dom: &'a dyn DomQuery,
}

/// Result of consulting a single strategy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AttemptOutcome {
    /// Host gate did not match the page
    Skipped,
    /// Nothing resembling a candidate was found
    NoCandidate,
    /// Candidates were found but none normalized to an identifier
    Rejected { candidates: Vec<String> },
    /// Candidates disagreed, so the strategy declined to pick one
    Ambiguous { values: Vec<String> },
    /// Accepted identifier; `conflicting` lists other accepted values that
    /// lost to document order
    Matched {
        identifier: Identifier,
        conflicting: Vec<String>,
    },
}

impl AttemptOutcome {
    pub fn identifier(&self) -> Option<&Identifier> {
        match self {
            AttemptOutcome::Matched { identifier, .. } => Some(identifier),
            _ => None,
        }
    }
}

/// A named extraction rule
#[derive(Debug, Clone)]
pub struct Strategy {
    pub name: &'static str,
    pub host: Option<HostFilter>,
    pub kind: IdentifierKind,
    pub extractors: Vec<Extractor>,
}

impl Strategy {
    /// A DOI strategy that runs on every page
    pub fn new(name: &'static str, extractors: Vec<Extractor>) -> Self {
        Self {
            name,
            host: None,
            kind: IdentifierKind::Doi,
            extractors,
        }
    }

    pub fn for_host(mut self, domain: &'static str) -> Self {
        self.host = Some(HostFilter::new(domain));
        self
    }

    pub fn accepting(mut self, kind: IdentifierKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn applies_to(&self, page_url: &str) -> bool {
        self.host.map_or(true, |host| host.matches(page_url))
    }

    /// Run the extractors in order, stopping at the first accepted identifier.
    pub fn evaluate(&self, page: &PageContext<'_>) -> Result<AttemptOutcome, PageError> {
        if !self.applies_to(page.url) {
            return Ok(AttemptOutcome::Skipped);
        }

        let mut ambiguous: Vec<String> = Vec::new();
        let mut rejected: Vec<String> = Vec::new();
        for extractor in &self.extractors {
            match extractor.extract(page, self.kind)? {
                AttemptOutcome::Matched {
                    identifier,
                    conflicting,
                } => {
                    return Ok(AttemptOutcome::Matched {
                        identifier,
                        conflicting,
                    })
                }
                AttemptOutcome::Ambiguous { values } => ambiguous.extend(values),
                AttemptOutcome::Rejected { candidates } => rejected.extend(candidates),
                AttemptOutcome::NoCandidate | AttemptOutcome::Skipped => {}
            }
        }

        Ok(if !ambiguous.is_empty() {
            AttemptOutcome::Ambiguous { values: ambiguous }
        } else if !rejected.is_empty() {
            rejected.truncate(MAX_REPORTED_CANDIDATES);
            AttemptOutcome::Rejected {
                candidates: rejected,
            }
        } else {
            AttemptOutcome::NoCandidate
        })
    }
}

impl Extractor {
    pub fn extract(
        &self,
        page: &PageContext<'_>,
        kind: IdentifierKind,
    ) -> Result<AttemptOutcome, PageError> {
        match self {
            Extractor::MetaTag {
                names,
                content_pattern,
                check_scheme,
            } => extract_meta(page, kind, names, content_pattern.as_ref(), *check_scheme),
            Extractor::DataAttribute { attribute } => extract_data_attribute(page, kind, attribute),
            Extractor::RegexOnMarkup { pattern } => Ok(first_capture(pattern, page.markup, kind)),
            Extractor::RegexOnUrl { pattern } => Ok(first_capture(pattern, page.url, kind)),
            Extractor::DomAnchorScan {
                selector,
                exact_text,
                field,
                pattern,
            } => extract_from_elements(page, kind, selector, *exact_text, *field, pattern),
        }
    }
}

fn extract_meta(
    page: &PageContext<'_>,
    kind: IdentifierKind,
    names: &[&str],
    content_pattern: Option<&Regex>,
    check_scheme: bool,
) -> Result<AttemptOutcome, PageError> {
    let mut accepted: Vec<Identifier> = Vec::new();
    let mut rejected: Vec<String> = Vec::new();

    for meta in page.dom.query_all("meta")? {
        let Some(name) = meta.attr("name") else {
            continue;
        };
        if !names.iter().any(|n| n.eq_ignore_ascii_case(name)) {
            continue;
        }
        if check_scheme {
            if let Some(scheme) = meta.attr("scheme") {
                if !scheme.is_empty() && !scheme.eq_ignore_ascii_case("doi") {
                    continue;
                }
            }
        }
        let Some(content) = meta.attr("content") else {
            continue;
        };
        let raw = match content_pattern {
            Some(pattern) => match pattern.captures(content).and_then(|caps| caps.get(1)) {
                Some(m) => m.as_str(),
                None => {
                    rejected.push(content.to_string());
                    continue;
                }
            },
            None => content,
        };
        match Identifier::parse(raw, kind) {
            Some(id) => accepted.push(id),
            None => rejected.push(raw.to_string()),
        }
    }

    let mut accepted = accepted.into_iter();
    match accepted.next() {
        Some(first) => {
            let mut conflicting: Vec<String> = Vec::new();
            for other in accepted {
                if other != first && !conflicting.iter().any(|c| c == other.as_str()) {
                    conflicting.push(other.into_string());
                }
            }
            Ok(AttemptOutcome::Matched {
                identifier: first,
                conflicting,
            })
        }
        None => Ok(rejected_or_nothing(rejected)),
    }
}

fn extract_data_attribute(
    page: &PageContext<'_>,
    kind: IdentifierKind,
    attribute: &str,
) -> Result<AttemptOutcome, PageError> {
    let mut values: Vec<String> = Vec::new();
    for element in page.dom.query_all(&format!("[{}]", attribute))? {
        if let Some(value) = element.attr(attribute) {
            if !values.iter().any(|v| v == value) {
                values.push(value.to_string());
            }
        }
    }

    if values.len() > 1 {
        return Ok(AttemptOutcome::Ambiguous { values });
    }
    Ok(match values.pop() {
        None => AttemptOutcome::NoCandidate,
        Some(single) => match Identifier::parse(&single, kind) {
            Some(identifier) => AttemptOutcome::Matched {
                identifier,
                conflicting: Vec::new(),
            },
            None => AttemptOutcome::Rejected {
                candidates: vec![single],
            },
        },
    })
}

fn first_capture(pattern: &Regex, haystack: &str, kind: IdentifierKind) -> AttemptOutcome {
    let mut rejected: Vec<String> = Vec::new();
    for caps in pattern.captures_iter(haystack) {
        let Some(m) = caps.get(1) else {
            continue;
        };
        match Identifier::parse(m.as_str(), kind) {
            Some(identifier) => {
                return AttemptOutcome::Matched {
                    identifier,
                    conflicting: Vec::new(),
                }
            }
            None if rejected.len() < MAX_REPORTED_CANDIDATES => {
                rejected.push(m.as_str().to_string())
            }
            None => {}
        }
    }
    rejected_or_nothing(rejected)
}

fn extract_from_elements(
    page: &PageContext<'_>,
    kind: IdentifierKind,
    selector: &str,
    exact_text: Option<&str>,
    field: ElementField,
    pattern: &Regex,
) -> Result<AttemptOutcome, PageError> {
    let mut rejected: Vec<String> = Vec::new();
    for element in page.dom.query_all(selector)? {
        if let Some(expected) = exact_text {
            if element.text_content() != expected {
                continue;
            }
        }
        let value = match field {
            ElementField::Text => element.text_content(),
            ElementField::Href => match element.attr("href") {
                Some(href) => href,
                None => continue,
            },
        };
        let Some(raw) = pattern.captures(value).and_then(|caps| caps.get(1)) else {
            continue;
        };
        match Identifier::parse(raw.as_str(), kind) {
            Some(identifier) => {
                return Ok(AttemptOutcome::Matched {
                    identifier,
                    conflicting: Vec::new(),
                })
            }
            None => rejected.push(raw.as_str().to_string()),
        }
    }
    Ok(rejected_or_nothing(rejected))
}

fn rejected_or_nothing(mut rejected: Vec<String>) -> AttemptOutcome {
    if rejected.is_empty() {
        AttemptOutcome::NoCandidate
    } else {
        rejected.truncate(MAX_REPORTED_CANDIDATES);
        AttemptOutcome::Rejected {
            candidates: rejected,
        }
    }
}

/// The built-in strategy table, in priority order
pub fn default_strategies() -> Vec<Strategy> {
    vec![
        Strategy::new(
            "Meta Tags",
            vec![Extractor::MetaTag {
                names: DOI_META_NAMES,
                content_pattern: None,
                check_scheme: true,
            }],
        ),
        Strategy::new(
            "Data Attributes",
            vec![Extractor::DataAttribute {
                attribute: "data-doi",
            }],
        ),
        Strategy::new(
            "ScienceDirect",
            vec![
                Extractor::RegexOnMarkup {
                    pattern: SCIENCEDIRECT_SDM_DOI.clone(),
                },
                Extractor::DomAnchorScan {
                    selector: "a.doi",
                    exact_text: None,
                    field: ElementField::Text,
                    pattern: DOI_ORG_SUFFIX.clone(),
                },
            ],
        )
        .for_host("sciencedirect.com"),
        // The positional DOM path is brittle, so it only runs after the regex
        Strategy::new(
            "IEEE",
            vec![
                Extractor::RegexOnMarkup {
                    pattern: IEEE_JSON_DOI.clone(),
                },
                Extractor::DomAnchorScan {
                    selector: ".stats-document-abstract-doi > :nth-child(2)",
                    exact_text: None,
                    field: ElementField::Text,
                    pattern: WHOLE_TEXT.clone(),
                },
            ],
        )
        .for_host("ieeexplore.ieee.org"),
        Strategy::new(
            "Springer",
            vec![Extractor::RegexOnMarkup {
                pattern: SPRINGER_JSON_DOI.clone(),
            }],
        )
        .for_host("springer.com"),
        Strategy::new(
            "PubMed",
            vec![
                Extractor::DomAnchorScan {
                    selector: "a[ref='aid_type=doi']",
                    exact_text: None,
                    field: ElementField::Text,
                    pattern: WHOLE_TEXT.clone(),
                },
                Extractor::MetaTag {
                    names: &["citation_doi"],
                    content_pattern: None,
                    check_scheme: false,
                },
            ],
        )
        .for_host("ncbi.nlm.nih.gov"),
        Strategy::new(
            "PsycNet",
            vec![Extractor::RegexOnMarkup {
                pattern: PSYCNET_DOI_HREF.clone(),
            }],
        )
        .for_host("psycnet.apa.org"),
        Strategy::new(
            "Epistemonikos",
            vec![Extractor::DomAnchorScan {
                selector: "a",
                exact_text: Some("DOI"),
                field: ElementField::Href,
                pattern: AFTER_DOI_ORG.clone(),
            }],
        )
        .for_host("epistemonikos.org"),
        Strategy::new(
            "InderScience",
            vec![Extractor::MetaTag {
                names: &["pbContext"],
                content_pattern: Some(INDERSCIENCE_PB_CONTEXT.clone()),
                check_scheme: false,
            }],
        )
        .for_host("inderscienceonline.com"),
        Strategy::new(
            "Cairn",
            vec![Extractor::DomAnchorScan {
                selector: "#article-details a",
                exact_text: None,
                field: ElementField::Href,
                pattern: CAIRN_DOI_HREF.clone(),
            }],
        )
        .for_host("cairn.info"),
        Strategy::new(
            "arXiv",
            vec![Extractor::RegexOnUrl {
                pattern: ARXIV_ABS_URL.clone(),
            }],
        )
        .for_host("arxiv.org")
        .accepting(IdentifierKind::Arxiv),
    ]
}
