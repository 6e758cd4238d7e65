//! Page access: the URL/markup accessor and the DOM query capability
//!
//! Strategies never touch `scraper` directly. They go through [`DomQuery`],
//! which hands back owned [`DomElement`] snapshots, so a host application can
//! plug in its own DOM (a browser bridge, a headless engine) in place of
//! [`HtmlPage`].

use scraper::{ElementRef, Html, Selector};

use crate::error::PageError;

/// Snapshot of one element returned by a DOM query
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DomElement {
    pub tag: String,
    pub attributes: Vec<(String, String)>,
    pub text: String,
}

impl DomElement {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Default::default()
        }
    }

    /// Builder-style attribute setter, mostly for test doubles
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Attribute value by name (ASCII case-insensitive)
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn text_content(&self) -> &str {
        &self.text
    }

    fn from_element_ref(element: ElementRef<'_>) -> Self {
        let value = element.value();
        Self {
            tag: value.name().to_string(),
            attributes: value
                .attrs()
                .map(|(name, value)| (name.to_string(), value.to_string()))
                .collect(),
            text: element.text().collect(),
        }
    }
}

/// Structured queries over the loaded document
pub trait DomQuery {
    /// All elements matching a CSS selector, in document order
    fn query_all(&self, selector: &str) -> Result<Vec<DomElement>, PageError>;

    /// First `<meta>` whose `name` matches (ASCII case-insensitive)
    fn query_meta(&self, name: &str) -> Result<Option<DomElement>, PageError> {
        Ok(self
            .query_all("meta")?
            .into_iter()
            .find(|meta| meta.attr("name").is_some_and(|n| n.eq_ignore_ascii_case(name))))
    }
}

/// Supplies the current page's URL and serialized markup
pub trait HostPageAccessor {
    fn current_url(&self) -> Result<String, PageError>;

    fn serialized_markup(&self) -> Result<String, PageError>;
}

/// An HTML document parsed from a string
pub struct HtmlPage {
    url: String,
    markup: String,
    document: Html,
}

impl HtmlPage {
    pub fn parse(url: impl Into<String>, markup: impl Into<String>) -> Self {
        let markup = markup.into();
        let document = Html::parse_document(&markup);
        Self {
            url: url.into(),
            markup,
            document,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn markup(&self) -> &str {
        &self.markup
    }
}

impl DomQuery for HtmlPage {
    fn query_all(&self, selector: &str) -> Result<Vec<DomElement>, PageError> {
        let parsed = Selector::parse(selector).map_err(|e| PageError::InvalidSelector {
            selector: selector.to_string(),
            message: format!("{:?}", e),
        })?;
        Ok(self
            .document
            .select(&parsed)
            .map(DomElement::from_element_ref)
            .collect())
    }
}

impl HostPageAccessor for HtmlPage {
    fn current_url(&self) -> Result<String, PageError> {
        Ok(self.url.clone())
    }

    fn serialized_markup(&self) -> Result<String, PageError> {
        Ok(self.markup.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<html><head>
        <meta name="Citation_DOI" content="10.1000/xyz123">
        <meta name="dc.title" content="A title">
        </head><body>
        <a class="doi" href="https://doi.org/10.1000/xyz123">https://doi.org/10.1000/xyz123</a>
        <div id="box"><span data-doi="10.1/a">one</span></div>
        </body></html>"#;

    #[test]
    fn test_query_all_in_document_order() {
        let page = HtmlPage::parse("https://example.org/a", PAGE);
        let metas = page.query_all("meta").unwrap();
        assert_eq!(metas.len(), 2);
        assert_eq!(metas[0].attr("content"), Some("10.1000/xyz123"));
        assert_eq!(metas[1].attr("name"), Some("dc.title"));
    }

    #[test]
    fn test_query_meta_case_insensitive() {
        let page = HtmlPage::parse("https://example.org/a", PAGE);
        let meta = page.query_meta("citation_doi").unwrap().unwrap();
        assert_eq!(meta.attr("CONTENT"), Some("10.1000/xyz123"));
        assert!(page.query_meta("citation_title").unwrap().is_none());
    }

    #[test]
    fn test_text_content() {
        let page = HtmlPage::parse("https://example.org/a", PAGE);
        let spans = page.query_all("#box [data-doi]").unwrap();
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].text_content(), "one");
        assert_eq!(spans[0].tag, "span");
    }

    #[test]
    fn test_invalid_selector_is_fault() {
        let page = HtmlPage::parse("https://example.org/a", PAGE);
        let err = page.query_all("a[").unwrap_err();
        assert!(matches!(err, PageError::InvalidSelector { .. }));
    }

    #[test]
    fn test_accessor() {
        let page = HtmlPage::parse("https://example.org/a", PAGE);
        assert_eq!(page.current_url().unwrap(), "https://example.org/a");
        assert!(page.serialized_markup().unwrap().contains("data-doi"));
    }
}
