use scraper::{Html, Selector};

use crate::url_utils;

/// Capability to pull link targets out of an HTML body.
pub trait LinkExtractor: Send + Sync {
    /// Extract absolute URLs from the document in source order. Duplicates
    /// are allowed; the frontier dedupes on enqueue.
    fn extract(&self, html: &[u8], base_url: &str) -> Vec<String>;
}

/// Extractor that walks every element carrying an `href` attribute and
/// resolves the raw value against the page URL.
///
/// This intentionally covers more than `<a>` tags: stylesheet and canonical
/// links carry downloadable assets on the sites this crawler archives, and
/// the domain/extension filters downstream discard the rest.
#[derive(Debug, Default, Clone, Copy)]
pub struct HrefExtractor;

impl LinkExtractor for HrefExtractor {
    fn extract(&self, html: &[u8], base_url: &str) -> Vec<String> {
        let text = String::from_utf8_lossy(html);
        let document = Html::parse_document(&text);
        let selector = Selector::parse("[href]").expect("Invalid CSS selector");

        let mut links = Vec::new();
        for element in document.select(&selector) {
            if let Some(href) = element.value().attr("href") {
                if let Some(absolute) = url_utils::resolve(base_url, href) {
                    links.push(absolute);
                }
            }
        }
        links
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(html: &str, base: &str) -> Vec<String> {
        HrefExtractor.extract(html.as_bytes(), base)
    }

    #[test]
    fn test_extract_resolves_relative_links() {
        let html = r#"<html><body><a href="/a">A</a><a href="b.html">B</a></body></html>"#;
        let links = extract(html, "https://ex.test/dir/page");
        assert_eq!(
            links,
            vec![
                "https://ex.test/a".to_string(),
                "https://ex.test/dir/b.html".to_string(),
            ]
        );
    }

    #[test]
    fn test_extract_preserves_document_order_and_duplicates() {
        let html = r#"<a href="/x">1</a><a href="/y">2</a><a href="/x">3</a>"#;
        let links = extract(html, "https://ex.test/");
        assert_eq!(
            links,
            vec![
                "https://ex.test/x".to_string(),
                "https://ex.test/y".to_string(),
                "https://ex.test/x".to_string(),
            ]
        );
    }

    #[test]
    fn test_extract_skips_non_navigational_hrefs() {
        let html = r#"<a href="mailto:a@ex.test">m</a><a href="javascript:void(0)">j</a><a href="">e</a>"#;
        assert!(extract(html, "https://ex.test/").is_empty());
    }

    #[test]
    fn test_extract_includes_link_elements() {
        let html = r#"<head><link rel="stylesheet" href="/style.css"></head><body><a href="/p">p</a></body>"#;
        let links = extract(html, "https://ex.test/");
        assert_eq!(
            links,
            vec![
                "https://ex.test/style.css".to_string(),
                "https://ex.test/p".to_string(),
            ]
        );
    }

    #[test]
    fn test_extract_strips_fragments() {
        let html = r#"<a href="/page#section">s</a>"#;
        assert_eq!(
            extract(html, "https://ex.test/"),
            vec!["https://ex.test/page".to_string()]
        );
    }

    #[test]
    fn test_extract_empty_document() {
        assert!(extract("", "https://ex.test/").is_empty());
    }
}
