//! Test fixture loading utilities

use std::path::PathBuf;

use impress_doi::HtmlPage;

/// Get the path to a fixture file
pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("test_fixtures")
        .join(name)
}

/// Load a fixture file as a string
#[allow(dead_code)]
pub fn load_fixture(name: &str) -> String {
    std::fs::read_to_string(fixture_path(name))
        .unwrap_or_else(|_| panic!("Failed to load fixture: {}", name))
}

/// Load a saved publisher page
#[allow(dead_code)]
pub fn load_page_fixture(name: &str) -> String {
    load_fixture(&format!("pages/{}", name))
}

/// Parse a saved publisher page as if it were served from `url`
#[allow(dead_code)]
pub fn page_fixture(name: &str, url: &str) -> HtmlPage {
    HtmlPage::parse(url, load_page_fixture(name))
}

/// Load a mock API response fixture
#[allow(dead_code)]
pub fn load_response_fixture(name: &str) -> String {
    load_fixture(&format!("responses/{}", name))
}
