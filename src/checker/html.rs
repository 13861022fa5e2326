// src/checker/html.rs
// =============================================================================
// This module extracts links from (rendered) HTML pages.
//
// We use the `scraper` crate which:
// - Parses HTML into a DOM (Document Object Model)
// - Supports CSS selectors for finding elements
//
// We also use the `url` crate to resolve relative links against the page URL.
//
// Links come back in document order with repeats on the same page dropped,
// so the crawler's discovery order is stable from run to run.
// =============================================================================

use scraper::{Html, Selector};
use std::collections::HashSet;
use url::Url;

// Extracts all checkable links from HTML content
//
// Parameters:
//   html: the HTML content to parse
//   base: the URL of the page (for resolving relative links)
//
// Returns: absolute http(s) URLs, first occurrence order
//
// Example:
//   html = "<a href='/docs'>Docs</a>"
//   base = "https://example.com"
//   result = ["https://example.com/docs"]
pub fn extract_html_links(html: &str, base: &Url) -> Vec<Url> {
    let mut links = Vec::new();
    let mut seen = HashSet::new();

    let document = Html::parse_document(html);

    // "a[href]" is a constant, valid selector; parse failure would mean a
    // scraper bug, in which case the page simply yields no links
    let Ok(selector) = Selector::parse("a[href]") else {
        return links;
    };

    for element in document.select(&selector) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };

        if let Some(url) = resolve_link(base, href) {
            if seen.insert(url.to_string()) {
                links.push(url);
            }
        }
    }

    links
}

// Resolves a possibly-relative href to an absolute, checkable URL
//
// Examples:
//   base = "https://example.com/page"
//   href = "/docs" -> Some("https://example.com/docs")
//   href = "../other" -> Some("https://example.com/other")
//   href = "https://other.com" -> Some("https://other.com/")
//   href = "javascript:void(0)" -> None (not HTTP)
//   href = "#section" -> None (same page)
fn resolve_link(base: &Url, href: &str) -> Option<Url> {
    let href = href.trim();

    if href.is_empty()
        || href.starts_with('#')
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("javascript:")
        || href.starts_with("data:")
    {
        return None;
    }

    // join() handles both absolute and relative hrefs
    let url = base.join(href).ok()?;

    if is_checkable_link(&url) {
        Some(url)
    } else {
        None
    }
}

// Only HTTP/HTTPS links can be validated with a request
fn is_checkable_link(url: &Url) -> bool {
    matches!(url.scheme(), "http" | "https")
}

/// Whether `link` lives on the same host as the seed (eligible for recursion).
pub fn is_in_domain(link: &Url, seed_host: Option<&str>) -> bool {
    match (link.host_str(), seed_host) {
        (Some(host), Some(seed)) => host.eq_ignore_ascii_case(seed),
        _ => false,
    }
}

// -----------------------------------------------------------------------------
// NOTES:
//
// 1. Why `let ... else`?
//    - It binds the value on success and forces an early exit otherwise
//    - Keeps the happy path unindented
//
// 2. Why a HashSet next to the Vec?
//    - The Vec keeps discovery order (reports must be reproducible)
//    - The HashSet makes "have we seen this on this page?" O(1)
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn base(url: &str) -> Url {
        Url::parse(url).unwrap()
    }

    fn strings(links: Vec<Url>) -> Vec<String> {
        links.into_iter().map(|u| u.to_string()).collect()
    }

    #[test]
    fn test_extract_absolute_link() {
        let html = r#"<a href="https://www.rust-lang.org">Rust</a>"#;
        let links = extract_html_links(html, &base("https://example.com"));
        assert_eq!(strings(links), vec!["https://www.rust-lang.org/"]);
    }

    #[test]
    fn test_resolve_relative_link() {
        let html = r#"<a href="/docs">Docs</a>"#;
        let links = extract_html_links(html, &base("https://example.com/page"));
        assert_eq!(strings(links), vec!["https://example.com/docs"]);
    }

    #[test]
    fn test_skip_non_http_schemes() {
        let html = r##"
            <a href="mailto:test@example.com">Email</a>
            <a href="tel:+441234">Call</a>
            <a href="javascript:void(0)">Nothing</a>
            <a href="#top">Top</a>
            <a href="ftp://files.example.com/a">FTP</a>
        "##;
        let links = extract_html_links(html, &base("https://example.com"));
        assert!(links.is_empty());
    }

    #[test]
    fn test_repeated_links_on_a_page_are_dropped() {
        let html = r#"
            <a href="https://b.test/">B</a>
            <a href="https://a.test/">A</a>
            <a href="https://b.test/">B again</a>
        "#;
        let links = extract_html_links(html, &base("https://example.com"));
        assert_eq!(strings(links), vec!["https://b.test/", "https://a.test/"]);
    }

    #[test]
    fn test_multiple_links() {
        let html = r#"
            <a href="https://rust-lang.org">Rust</a>
            <a href="/docs">Docs</a>
            <a href="../about">About</a>
        "#;
        let links = extract_html_links(html, &base("https://example.com/page/"));
        assert_eq!(links.len(), 3);
    }

    #[test]
    fn test_in_domain_compares_hosts() {
        let link = base("https://Example.com/a");
        assert!(is_in_domain(&link, Some("example.com")));
        assert!(!is_in_domain(&link, Some("other.com")));
        assert!(!is_in_domain(&link, None));
    }
}
