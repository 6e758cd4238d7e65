//! Source templates: where a resolved identifier can be looked up
//!
//! A template is a URL prefix, an optional suffix, and whether the identifier
//! is percent-encoded in between. The arXiv entry is a search, not a direct
//! document link.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::identifier::Identifier;

pub const SOURCE_SCIHUB: &str = "scihub";
pub const SOURCE_ANNAS: &str = "annas";
pub const SOURCE_DOI: &str = "doi";
pub const SOURCE_ARXIV_SEARCH: &str = "arxiv-search";

// Identifier used to check that every template yields an absolute URL
const PROBE_DOI: &str = "10.1000/182";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LinkError {
    #[error("Unknown source: {key}")]
    UnknownSource { key: String },

    #[error("Source `{key}` produced an invalid URL `{url}`: {message}")]
    InvalidUrl {
        key: String,
        url: String,
        message: String,
    },
}

/// URL template for one external source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceTemplate {
    pub display_name: String,
    pub prefix: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub suffix: String,
    /// Percent-encode the identifier before inserting it
    #[serde(default)]
    pub encode: bool,
}

impl SourceTemplate {
    pub fn new(display_name: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            prefix: prefix.into(),
            suffix: String::new(),
            encode: false,
        }
    }

    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = suffix.into();
        self
    }

    pub fn encoded(mut self) -> Self {
        self.encode = true;
        self
    }

    /// Concatenate prefix, identifier and suffix. Without `encode` the
    /// identifier keeps its slashes, and only `#` and `?` are escaped.
    pub fn render(&self, identifier: &Identifier) -> String {
        let value = if self.encode {
            urlencoding::encode(identifier.as_str())
        } else {
            identifier.path_escaped()
        };
        format!("{}{}{}", self.prefix, value, self.suffix)
    }

    fn build(&self, key: &str, identifier: &Identifier) -> Result<Url, LinkError> {
        let raw = self.render(identifier);
        let invalid = |message: String| LinkError::InvalidUrl {
            key: key.to_string(),
            url: raw.clone(),
            message,
        };
        let url = Url::parse(&raw).map_err(|e| invalid(e.to_string()))?;
        let absolute = matches!(url.scheme(), "http" | "https") && url.has_host();
        if absolute {
            Ok(url)
        } else {
            Err(invalid("expected an absolute http(s) URL".to_string()))
        }
    }
}

/// Immutable set of source templates handed to the link builder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Source used when the caller does not pick one
    pub default_source: String,
    /// Built-in sources
    pub templates: BTreeMap<String, SourceTemplate>,
    /// User-defined sources; these shadow built-ins with the same key
    pub custom: BTreeMap<String, SourceTemplate>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        let mut templates = BTreeMap::new();
        templates.insert(
            SOURCE_SCIHUB.to_string(),
            SourceTemplate::new("Sci-Hub", "https://sci-hub.se/"),
        );
        templates.insert(
            SOURCE_ANNAS.to_string(),
            SourceTemplate::new("Anna's Archive", "https://annas-archive.li/scidb/"),
        );
        templates.insert(
            SOURCE_DOI.to_string(),
            SourceTemplate::new("DOI.org", "https://doi.org/"),
        );
        templates.insert(
            SOURCE_ARXIV_SEARCH.to_string(),
            SourceTemplate::new("arXiv", "https://arxiv.org/search/?query=")
                .with_suffix("&searchtype=all")
                .encoded(),
        );

        Self {
            default_source: SOURCE_SCIHUB.to_string(),
            templates,
            custom: BTreeMap::new(),
        }
    }
}

impl SourceConfig {
    pub fn with_custom(mut self, key: impl Into<String>, template: SourceTemplate) -> Self {
        self.custom.insert(key.into(), template);
        self
    }

    pub fn get(&self, key: &str) -> Option<&SourceTemplate> {
        self.custom.get(key).or_else(|| self.templates.get(key))
    }

    /// All source keys, custom entries included, sorted
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self
            .templates
            .keys()
            .chain(self.custom.keys())
            .map(String::as_str)
            .collect();
        keys.sort_unstable();
        keys.dedup();
        keys
    }

    /// Check that the default source exists and every template yields an
    /// absolute URL.
    pub fn validate(&self) -> Result<(), LinkError> {
        if self.get(&self.default_source).is_none() {
            return Err(LinkError::UnknownSource {
                key: self.default_source.clone(),
            });
        }
        let probe = Identifier::doi(PROBE_DOI).ok_or_else(|| LinkError::InvalidUrl {
            key: String::new(),
            url: PROBE_DOI.to_string(),
            message: "probe identifier failed to normalize".to_string(),
        })?;
        for key in self.keys() {
            if let Some(template) = self.get(key) {
                template.build(key, &probe)?;
            }
        }
        Ok(())
    }
}

/// A link to one source, ready for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceLink {
    pub key: String,
    pub display_name: String,
    pub url: String,
}

/// Builds source URLs for identifiers
#[derive(Debug, Clone, Default)]
pub struct LinkBuilder {
    config: SourceConfig,
}

impl LinkBuilder {
    pub fn new(config: SourceConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SourceConfig {
        &self.config
    }

    pub fn build(&self, key: &str, identifier: &Identifier) -> Result<Url, LinkError> {
        let template = self.config.get(key).ok_or_else(|| LinkError::UnknownSource {
            key: key.to_string(),
        })?;
        template.build(key, identifier)
    }

    pub fn build_default(&self, identifier: &Identifier) -> Result<Url, LinkError> {
        self.build(&self.config.default_source, identifier)
    }

    /// Links for every configured source
    pub fn links(&self, identifier: &Identifier) -> Result<Vec<SourceLink>, LinkError> {
        self.config
            .keys()
            .into_iter()
            .filter_map(|key| self.config.get(key).map(|template| (key, template)))
            .map(|(key, template)| -> Result<SourceLink, LinkError> {
                Ok(SourceLink {
                    key: key.to_string(),
                    display_name: template.display_name.clone(),
                    url: template.build(key, identifier)?.to_string(),
                })
            })
            .collect()
    }
}
