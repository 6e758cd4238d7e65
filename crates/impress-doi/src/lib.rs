//! DOI detection in publisher web pages
//!
//! This crate provides:
//! - A prioritized, host-aware strategy table for finding the DOI in a page
//! - Identifier normalization shared by page resolution and manual entry
//! - Source templates and link dispatch (Sci-Hub, Anna's Archive, doi.org, arXiv search)
//! - Best-effort title lookup via Crossref
//! - A bounded history of recent lookups
//!
//! ```
//! use impress_doi::{DoiResolver, HtmlPage};
//!
//! let page = HtmlPage::parse(
//!     "https://journals.example.org/article/1",
//!     r#"<meta name="citation_doi" content="doi:10.1000/xyz123">"#,
//! );
//! let resolution = DoiResolver::new().resolve_page(&page).unwrap().unwrap();
//! assert_eq!(resolution.doi.as_str(), "10.1000/xyz123");
//! assert_eq!(resolution.source_strategy, "Meta Tags");
//! ```

pub mod config;
pub mod dispatch;
pub mod error;
pub mod history;
pub mod identifier;
pub mod metadata;
pub mod page;
pub mod resolver;
pub mod sources;
pub mod strategy;

pub use config::{ConfigError, HistoryConfig, ImdoiConfig, MetadataConfig};
pub use dispatch::{DispatchError, LinkDispatcher, LinkOpener, RecordingOpener, WriterOpener};
pub use error::{PageError, ResolveError};
pub use history::{History, HistoryEntry, HistoryError};
pub use identifier::{normalize_manual_input, Identifier, IdentifierKind, ManualInputError};
#[cfg(feature = "native")]
pub use metadata::CrossrefClient;
pub use metadata::{crossref_work_url, parse_crossref_title, title_or_placeholder, MetadataError};
pub use page::{DomElement, DomQuery, HostPageAccessor, HtmlPage};
pub use resolver::{DoiResolver, Resolution, ResolutionTrace, StrategyAttempt};
pub use sources::{LinkBuilder, LinkError, SourceConfig, SourceLink, SourceTemplate};
pub use strategy::{AttemptOutcome, Extractor, HostFilter, Strategy};

// Setup UniFFI when the feature is enabled
#[cfg(feature = "uniffi")]
uniffi::setup_scaffolding!();
