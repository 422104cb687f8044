//! HTML document wrapper used by the extractors
//!
//! `scraper::Html` is not `Send`, so a `ParsedPage` is built, queried and
//! dropped inside synchronous code; it never lives across an `.await`.

use crate::TrawlError;
use scraper::{ElementRef, Html, Node, Selector};
use url::Url;

/// A fetched page parsed into a queryable document
pub struct ParsedPage {
    url: Url,
    document: Html,
}

impl ParsedPage {
    /// Parses a fetched body into a queryable document
    ///
    /// # Errors
    ///
    /// Returns `TrawlError::HtmlParse` if the body is blank or contains no
    /// markup at all.
    ///
    /// # Example
    ///
    /// ```
    /// use sumi_trawl::extract::ParsedPage;
    /// use url::Url;
    ///
    /// let url = Url::parse("https://example.com/").unwrap();
    /// let html = "<html><head><title>Test</title></head><body></body></html>";
    /// let page = ParsedPage::parse(url, html).unwrap();
    /// assert_eq!(page.title(), Some("Test".to_string()));
    /// ```
    pub fn parse(url: Url, body: &str) -> Result<Self, TrawlError> {
        if body.trim().is_empty() {
            return Err(TrawlError::HtmlParse {
                url: url.to_string(),
                message: "empty document".to_string(),
            });
        }

        if !body.contains('<') {
            return Err(TrawlError::HtmlParse {
                url: url.to_string(),
                message: "no markup found".to_string(),
            });
        }

        let document = Html::parse_document(body);
        Ok(Self { url, document })
    }

    /// The URL the page was fetched from
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Selects all elements matching a CSS selector, in document order
    pub fn select(&self, css: &str) -> Vec<ElementRef<'_>> {
        match Selector::parse(css) {
            Ok(selector) => self.document.select(&selector).collect(),
            Err(_) => {
                tracing::warn!("Invalid CSS selector: {}", css);
                Vec::new()
            }
        }
    }

    /// Extracts the page title from the `<title>` element
    pub fn title(&self) -> Option<String> {
        self.select("title")
            .into_iter()
            .next()
            .map(|element| element_text(&element))
            .filter(|s| !s.is_empty())
    }

    /// Returns the lowercased visible text of the document body
    ///
    /// Text inside `script`, `style`, `noscript` and `template` elements is
    /// left out.
    pub fn body_text_lowercase(&self) -> String {
        let body = self.select("body");
        let root = body
            .first()
            .copied()
            .unwrap_or_else(|| self.document.root_element());

        let text = root
            .descendants()
            .filter(|node| !node.ancestors().any(|a| is_hidden(a.value())))
            .filter_map(|node| node.value().as_text().map(|t| &**t))
            .collect::<Vec<_>>()
            .join(" ");
        text.to_lowercase()
    }

    /// Returns the raw `href` of every anchor, trimmed, in document order
    pub fn anchor_hrefs(&self, css: &str) -> Vec<String> {
        self.select(css)
            .into_iter()
            .filter_map(|element| element.value().attr("href"))
            .map(|href| href.trim().to_string())
            .filter(|href| !href.is_empty())
            .collect()
    }
}

/// Elements whose text never renders as page content
const HIDDEN_ELEMENTS: [&str; 4] = ["script", "style", "noscript", "template"];

fn is_hidden(node: &Node) -> bool {
    node.as_element()
        .is_some_and(|element| HIDDEN_ELEMENTS.contains(&element.name()))
}

/// Returns the trimmed text content of an element
pub fn element_text(element: &ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_url() -> Url {
        Url::parse("https://example.com/page").unwrap()
    }

    #[test]
    fn test_extract_title_with_whitespace() {
        let html = r#"<html><head><title>  Test Page  </title></head><body></body></html>"#;
        let page = ParsedPage::parse(base_url(), html).unwrap();
        assert_eq!(page.title(), Some("Test Page".to_string()));
    }

    #[test]
    fn test_no_title() {
        let html = r#"<html><head></head><body></body></html>"#;
        let page = ParsedPage::parse(base_url(), html).unwrap();
        assert_eq!(page.title(), None);
    }

    #[test]
    fn test_empty_body_is_parse_error() {
        assert!(matches!(
            ParsedPage::parse(base_url(), "   \n"),
            Err(TrawlError::HtmlParse { .. })
        ));
    }

    #[test]
    fn test_plain_text_is_parse_error() {
        assert!(ParsedPage::parse(base_url(), "just some words").is_err());
    }

    #[test]
    fn test_body_text_lowercase() {
        let html = r#"<html><head><title>Skip</title></head><body><p>Rust AND</p><div>Tokio</div></body></html>"#;
        let page = ParsedPage::parse(base_url(), html).unwrap();
        let text = page.body_text_lowercase();
        assert!(text.contains("rust and"));
        assert!(text.contains("tokio"));
        assert!(!text.contains("skip"));
    }

    #[test]
    fn test_body_text_skips_scripts_and_styles() {
        let html = r#"<html><body>
            <p>Cooking tips</p>
            <script>var topic = "machine learning";</script>
            <style>.ai { color: red }</style>
            <noscript>enable javascript for ai</noscript>
            <div>Soup <span>recipes</span></div>
            </body></html>"#;
        let page = ParsedPage::parse(base_url(), html).unwrap();
        let text = page.body_text_lowercase();
        assert!(text.contains("cooking tips"));
        assert!(text.contains("recipes"));
        assert!(!text.contains("machine learning"));
        assert!(!text.contains(".ai"));
        assert!(!text.contains("javascript"));
    }

    #[test]
    fn test_anchor_hrefs() {
        let html = r#"<body><a href=" /a ">A</a><a href="">Empty</a><a>None</a><a href="/b">B</a></body>"#;
        let page = ParsedPage::parse(base_url(), html).unwrap();
        assert_eq!(page.anchor_hrefs("a[href]"), vec!["/a", "/b"]);
    }
}
