//! Faults raised while reading a page
//!
//! A page without a DOI is not an error: the resolver returns `Ok(None)`.
//! These types cover the case where the page itself cannot be read.

use thiserror::Error;

/// Failure of the page accessor or DOM query capability
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PageError {
    #[error("Document is detached or no longer available")]
    Detached,

    #[error("Invalid selector `{selector}`: {message}")]
    InvalidSelector { selector: String, message: String },

    #[error("Page unavailable: {message}")]
    Unavailable { message: String },
}

/// Errors returned by the resolver
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("Page accessor failed: {0}")]
    Accessor(#[from] PageError),
}
