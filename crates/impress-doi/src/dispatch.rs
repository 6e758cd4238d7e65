//! Link dispatch: build a source URL and hand it to an opener

use std::cell::RefCell;
use std::io::Write;

use thiserror::Error;
use url::Url;

use crate::identifier::Identifier;
use crate::sources::{LinkBuilder, LinkError, SourceConfig};

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Link(#[from] LinkError),

    #[error("Failed to open {url}: {message}")]
    Open { url: String, message: String },
}

/// Something that can show a URL to the user (a browser tab, a terminal)
pub trait LinkOpener {
    fn open(&self, url: &Url) -> Result<(), DispatchError>;
}

/// Writes each URL on its own line
pub struct WriterOpener<W: Write> {
    writer: RefCell<W>,
}

impl<W: Write> WriterOpener<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: RefCell::new(writer),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }
}

impl<W: Write> LinkOpener for WriterOpener<W> {
    fn open(&self, url: &Url) -> Result<(), DispatchError> {
        writeln!(self.writer.borrow_mut(), "{}", url).map_err(|e| DispatchError::Open {
            url: url.to_string(),
            message: e.to_string(),
        })
    }
}

/// Keeps opened URLs in memory
#[derive(Debug, Default)]
pub struct RecordingOpener {
    opened: RefCell<Vec<Url>>,
}

impl RecordingOpener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn opened(&self) -> Vec<Url> {
        self.opened.borrow().clone()
    }
}

impl LinkOpener for RecordingOpener {
    fn open(&self, url: &Url) -> Result<(), DispatchError> {
        self.opened.borrow_mut().push(url.clone());
        Ok(())
    }
}

/// Builds links from an immutable source configuration and opens them
pub struct LinkDispatcher<O: LinkOpener> {
    builder: LinkBuilder,
    opener: O,
}

impl<O: LinkOpener> LinkDispatcher<O> {
    pub fn new(config: SourceConfig, opener: O) -> Self {
        Self {
            builder: LinkBuilder::new(config),
            opener,
        }
    }

    pub fn builder(&self) -> &LinkBuilder {
        &self.builder
    }

    pub fn opener(&self) -> &O {
        &self.opener
    }

    pub fn into_opener(self) -> O {
        self.opener
    }

    /// Build the URL for `source_key` and open it
    pub fn dispatch(&self, source_key: &str, identifier: &Identifier) -> Result<Url, DispatchError> {
        let url = self.builder.build(source_key, identifier)?;
        tracing::debug!(source = source_key, %url, "Opening link");
        self.opener.open(&url)?;
        Ok(url)
    }

    pub fn dispatch_default(&self, identifier: &Identifier) -> Result<Url, DispatchError> {
        let key = self.builder.config().default_source.clone();
        self.dispatch(&key, identifier)
    }
}
