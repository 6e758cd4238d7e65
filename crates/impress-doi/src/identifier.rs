//! Normalized identifiers and the manual-entry normalizer
//!
//! Every candidate found on a page, and every string a user pastes, goes
//! through the same prefix stripping before it becomes an [`Identifier`].

use std::borrow::Cow;
use std::fmt;
use std::hash::{Hash, Hasher};

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

lazy_static! {
    // "doi:" scheme prefix, with or without a space after the colon
    static ref DOI_SCHEME_PREFIX: Regex = Regex::new(r"(?i)^doi:\s*").unwrap();

    // Resolver URL prefix: https://doi.org/, http://www.doi.org/, dx.doi.org/ ...
    static ref DOI_URL_PREFIX: Regex =
        Regex::new(r"(?i)^(?:https?://)?(?:www\.|dx\.)?doi\.org/").unwrap();

    // arXiv abstract page; the captured id drops any version suffix
    pub(crate) static ref ARXIV_ABS_URL: Regex = Regex::new(r"arxiv\.org/abs/(\d+\.\d+)").unwrap();

    // Bare new-style arXiv id as typed by a user, e.g. "arXiv:2301.01234v2"
    static ref ARXIV_BARE_ID: Regex =
        Regex::new(r"(?i)^(?:arxiv:\s*)?(\d{4}\.\d{4,5})(?:v\d+)?$").unwrap();

    static ref ARXIV_NUMERIC_ID: Regex = Regex::new(r"^\d+\.\d+$").unwrap();
}

/// Literal prefix shared by every DOI.
pub const DOI_PREFIX: &str = "10.";

/// What kind of identifier a normalized value is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "uniffi", derive(uniffi::Enum))]
pub enum IdentifierKind {
    /// Digital Object Identifier, `10.<registrant>/<suffix>`
    Doi,
    /// arXiv id, used in place of a DOI on arxiv.org pages
    Arxiv,
}

/// A normalized DOI (or arXiv id).
///
/// Equality and hashing only look at the normalized string.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "uniffi", derive(uniffi::Record))]
pub struct Identifier {
    value: String,
    kind: IdentifierKind,
}

impl Identifier {
    /// Normalize a raw DOI candidate. Returns `None` unless the stripped value
    /// starts with `10.`.
    pub fn doi(raw: &str) -> Option<Self> {
        let value = strip_doi_prefixes(raw);
        if value.starts_with(DOI_PREFIX) {
            Some(Self {
                value: value.to_string(),
                kind: IdentifierKind::Doi,
            })
        } else {
            None
        }
    }

    /// Accept a numeric arXiv id such as `2301.01234`.
    pub fn arxiv(raw: &str) -> Option<Self> {
        let value = raw.trim();
        if ARXIV_NUMERIC_ID.is_match(value) {
            Some(Self {
                value: value.to_string(),
                kind: IdentifierKind::Arxiv,
            })
        } else {
            None
        }
    }

    /// Normalize a candidate according to the kind a strategy expects.
    pub fn parse(raw: &str, kind: IdentifierKind) -> Option<Self> {
        match kind {
            IdentifierKind::Doi => Self::doi(raw),
            IdentifierKind::Arxiv => Self::arxiv(raw),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }

    pub fn kind(&self) -> IdentifierKind {
        self.kind
    }

    pub fn is_arxiv(&self) -> bool {
        self.kind == IdentifierKind::Arxiv
    }

    pub fn into_string(self) -> String {
        self.value
    }

    /// The value with `#` and `?` percent-encoded, so it can be appended to
    /// a URL path without starting a fragment or query.
    pub fn path_escaped(&self) -> Cow<'_, str> {
        if self.value.contains(['#', '?']) {
            Cow::Owned(self.value.replace('#', "%23").replace('?', "%3F"))
        } else {
            Cow::Borrowed(&self.value)
        }
    }
}

impl PartialEq for Identifier {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl Eq for Identifier {}

impl Hash for Identifier {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.value)
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.value
    }
}

/// Strip `doi:` and `doi.org/` URL prefixes (in any order, repeatedly) and
/// surrounding whitespace.
pub fn strip_doi_prefixes(raw: &str) -> &str {
    let mut value = raw.trim();
    loop {
        let prefix_end = DOI_SCHEME_PREFIX
            .find(value)
            .or_else(|| DOI_URL_PREFIX.find(value))
            .map(|m| m.end());
        match prefix_end {
            Some(end) => value = value[end..].trim(),
            None => return value,
        }
    }
}

/// Errors for text typed or pasted by the user
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ManualInputError {
    #[error("Please enter a DOI or URL")]
    Empty,

    #[error("Invalid DOI format: {input}")]
    Malformed { input: String },
}

/// Turn free-form user input (a DOI, a doi.org link, an arXiv abstract URL or
/// a bare arXiv id) into an [`Identifier`].
pub fn normalize_manual_input(input: &str) -> Result<Identifier, ManualInputError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ManualInputError::Empty);
    }

    let arxiv_id = ARXIV_ABS_URL
        .captures(trimmed)
        .or_else(|| ARXIV_BARE_ID.captures(trimmed))
        .and_then(|caps| caps.get(1))
        .and_then(|m| Identifier::arxiv(m.as_str()));
    if let Some(id) = arxiv_id {
        return Ok(id);
    }

    Identifier::doi(trimmed).ok_or_else(|| ManualInputError::Malformed {
        input: trimmed.to_string(),
    })
}

#[cfg(feature = "uniffi")]
#[uniffi::export]
pub fn normalize_manual_input_ffi(input: String) -> Option<Identifier> {
    normalize_manual_input(&input).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_prefixes() {
        assert_eq!(strip_doi_prefixes("  doi:10.1000/xyz "), "10.1000/xyz");
        assert_eq!(strip_doi_prefixes("DOI: 10.1000/xyz"), "10.1000/xyz");
        assert_eq!(
            strip_doi_prefixes("https://www.doi.org/10.1000/xyz"),
            "10.1000/xyz"
        );
        assert_eq!(strip_doi_prefixes("http://dx.doi.org/10.1000/xyz"), "10.1000/xyz");
        assert_eq!(
            strip_doi_prefixes("doi: https://doi.org/10.1000/xyz"),
            "10.1000/xyz"
        );
        assert_eq!(strip_doi_prefixes("10.1000/xyz"), "10.1000/xyz");
    }

    #[test]
    fn test_doi_requires_prefix() {
        assert!(Identifier::doi("11.1000/xyz").is_none());
        assert!(Identifier::doi("https://example.org/10.1000/xyz").is_none());
        assert!(Identifier::doi("").is_none());
        let id = Identifier::doi("10.1000/xyz").unwrap();
        assert_eq!(id.kind(), IdentifierKind::Doi);
    }

    #[test]
    fn test_arxiv_identifier() {
        let id = Identifier::arxiv("2301.01234").unwrap();
        assert!(id.is_arxiv());
        assert!(Identifier::arxiv("cond-mat/9901001").is_none());
    }

    #[test]
    fn test_equality_ignores_kind() {
        let a = Identifier::parse("2301.01234", IdentifierKind::Arxiv).unwrap();
        let b = Identifier::arxiv(" 2301.01234 ").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_path_escaped() {
        let plain = Identifier::doi("10.1000/xyz").unwrap();
        assert!(matches!(plain.path_escaped(), Cow::Borrowed("10.1000/xyz")));
        let id = Identifier::doi("10.1002/(SICI)1097;2-#?x").unwrap();
        assert_eq!(id.path_escaped(), "10.1002/(SICI)1097;2-%23%3Fx");
    }

    #[test]
    fn test_manual_doi_url() {
        let id = normalize_manual_input("https://doi.org/10.1037/stl0000104").unwrap();
        assert_eq!(id.as_str(), "10.1037/stl0000104");
    }

    #[test]
    fn test_manual_arxiv_url() {
        let id = normalize_manual_input("https://arxiv.org/abs/2301.01234v3").unwrap();
        assert_eq!(id.as_str(), "2301.01234");
        assert!(id.is_arxiv());
    }

    #[test]
    fn test_manual_bare_arxiv() {
        let id = normalize_manual_input("arXiv:2301.01234").unwrap();
        assert_eq!(id.as_str(), "2301.01234");
    }

    #[test]
    fn test_manual_rejects() {
        assert_eq!(normalize_manual_input("   "), Err(ManualInputError::Empty));
        assert_eq!(
            normalize_manual_input("not a doi"),
            Err(ManualInputError::Malformed {
                input: "not a doi".to_string()
            })
        );
    }
}
