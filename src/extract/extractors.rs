//! The extractor registry and the pipeline that runs it
//!
//! Each extractor reads the parsed page and fills exactly one optional field
//! of the record. Gather jobs apply stricter filtering and caps so search
//! hits stay compact.

use crate::extract::page::{element_text, ParsedPage};
use crate::extract::record::{
    ExtractedRecord, ImageRef, PageMeta, SelectorKind, SelectorSet, SourceType,
};
use crate::job::JobMode;
use crate::url::is_absolute_http;
use std::collections::HashSet;

/// Minimum paragraph length kept for Gather records (characters)
pub const GATHER_MIN_PARAGRAPH_CHARS: usize = 20;
/// Maximum paragraphs kept for Gather records
pub const GATHER_MAX_PARAGRAPHS: usize = 10;
/// Maximum images kept for Gather records
pub const GATHER_MAX_IMAGES: usize = 10;
/// Maximum links kept for Gather records
pub const GATHER_MAX_LINKS: usize = 20;

type Extractor = fn(&ParsedPage, JobMode, &mut ExtractedRecord);

/// Looks up the extractor registered for a kind
fn extractor_for(kind: SelectorKind) -> Extractor {
    match kind {
        SelectorKind::Headings => extract_headings,
        SelectorKind::Text => extract_text,
        SelectorKind::Meta => extract_meta,
        SelectorKind::Images => extract_images,
        SelectorKind::Links => extract_links,
    }
}

/// Runs every requested extractor against a page and assembles the record
///
/// The record's title falls back to the page URL when the document has no
/// `<title>`.
pub fn run_pipeline(page: &ParsedPage, selectors: &SelectorSet, mode: JobMode) -> ExtractedRecord {
    let url = page.url().to_string();
    let title = page.title().unwrap_or_else(|| url.clone());
    let source_type = match mode {
        JobMode::Site => SourceType::Page,
        JobMode::Gather => SourceType::Gathered,
    };

    let mut record = ExtractedRecord::new(url, title, source_type);
    for kind in selectors.iter() {
        extractor_for(kind)(page, mode, &mut record);
    }
    record
}

fn extract_headings(page: &ParsedPage, _mode: JobMode, record: &mut ExtractedRecord) {
    let mut seen = HashSet::new();
    let headings = page
        .select("h1, h2, h3")
        .into_iter()
        .map(|element| element_text(&element))
        .filter(|text| !text.is_empty())
        .filter(|text| seen.insert(text.clone()))
        .collect();
    record.headings = Some(headings);
}

fn extract_text(page: &ParsedPage, mode: JobMode, record: &mut ExtractedRecord) {
    let paragraphs = page
        .select("p")
        .into_iter()
        .map(|element| element_text(&element))
        .filter(|text| !text.is_empty());

    let text = match mode {
        JobMode::Site => paragraphs.collect(),
        JobMode::Gather => paragraphs
            .filter(|text| text.chars().count() >= GATHER_MIN_PARAGRAPH_CHARS)
            .take(GATHER_MAX_PARAGRAPHS)
            .collect(),
    };
    record.text = Some(text);
}

fn extract_meta(page: &ParsedPage, _mode: JobMode, record: &mut ExtractedRecord) {
    let mut meta = PageMeta::default();

    for element in page.select("meta[name][content]") {
        let attrs = element.value();
        let (Some(name), Some(content)) = (attrs.attr("name"), attrs.attr("content")) else {
            continue;
        };
        let content = content.trim();
        if content.is_empty() {
            continue;
        }

        if name.eq_ignore_ascii_case("description") && meta.description.is_none() {
            meta.description = Some(content.to_string());
        } else if name.eq_ignore_ascii_case("keywords") && meta.keywords.is_none() {
            meta.keywords = Some(content.to_string());
        }
    }

    record.meta = Some(meta);
}

fn extract_images(page: &ParsedPage, mode: JobMode, record: &mut ExtractedRecord) {
    let mut seen = HashSet::new();
    let images = page.select("img[src]").into_iter().filter_map(|element| {
        let src = element.value().attr("src")?.trim();
        if src.is_empty() || (mode == JobMode::Gather && !is_absolute_http(src)) {
            return None;
        }
        if !seen.insert(src.to_string()) {
            return None;
        }
        let alt = element
            .value()
            .attr("alt")
            .map(str::trim)
            .filter(|alt| !alt.is_empty())
            .map(str::to_string);
        Some(ImageRef {
            src: src.to_string(),
            alt,
        })
    });

    record.images = Some(match mode {
        JobMode::Site => images.collect(),
        JobMode::Gather => images.take(GATHER_MAX_IMAGES).collect(),
    });
}

fn extract_links(page: &ParsedPage, mode: JobMode, record: &mut ExtractedRecord) {
    let mut seen = HashSet::new();
    let links = page
        .anchor_hrefs("a[href]")
        .into_iter()
        .filter(|href| mode == JobMode::Site || is_absolute_http(href))
        .filter(|href| seen.insert(href.clone()));

    record.links = Some(match mode {
        JobMode::Site => links.collect(),
        JobMode::Gather => links.take(GATHER_MAX_LINKS).collect(),
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    fn page(html: &str) -> ParsedPage {
        ParsedPage::parse(Url::parse("https://a.test/").unwrap(), html).unwrap()
    }

    fn only(kind: SelectorKind) -> SelectorSet {
        SelectorSet::from_names([kind.as_str()])
    }

    #[test]
    fn test_only_requested_fields_present() {
        let page = page("<html><body><p>Hello</p><p></p><a href='/b'>b</a><a href='/b'>b</a></body></html>");
        let selectors = SelectorSet::from_csv("text,links");
        let record = run_pipeline(&page, &selectors, JobMode::Site);

        assert_eq!(record.text, Some(vec!["Hello".to_string()]));
        assert_eq!(record.links, Some(vec!["/b".to_string()]));
        assert!(record.headings.is_none());
        assert!(record.meta.is_none());
        assert!(record.images.is_none());
        assert_eq!(record.source_type, SourceType::Page);
    }

    #[test]
    fn test_title_falls_back_to_url() {
        let record = run_pipeline(&page("<p>x</p>"), &only(SelectorKind::Text), JobMode::Site);
        assert_eq!(record.title, "https://a.test/");
    }

    #[test]
    fn test_headings_deduplicated_in_order() {
        let html = "<h1> Intro </h1><h2>Usage</h2><h4>Skipped</h4><h3>Intro</h3><h2></h2><h3>End</h3>";
        let record = run_pipeline(&page(html), &only(SelectorKind::Headings), JobMode::Site);
        assert_eq!(
            record.headings,
            Some(vec!["Intro".to_string(), "Usage".to_string(), "End".to_string()])
        );
    }

    #[test]
    fn test_gather_text_filters_short_and_truncates() {
        let long = "a paragraph that is comfortably long";
        let mut html = String::from("<p>too short</p>");
        for i in 0..12 {
            html.push_str(&format!("<p>{} {}</p>", long, i));
        }
        let record = run_pipeline(&page(&html), &only(SelectorKind::Text), JobMode::Gather);
        let text = record.text.unwrap();
        assert_eq!(text.len(), GATHER_MAX_PARAGRAPHS);
        assert!(text.iter().all(|t| t.starts_with(long)));

        let record = run_pipeline(&page(&html), &only(SelectorKind::Text), JobMode::Site);
        assert_eq!(record.text.unwrap().len(), 13);
    }

    #[test]
    fn test_site_text_keeps_inline_markup_text() {
        let html = "<p> Hello <b>world</b> </p><div><p>\n</p></div><p>Bye</p>";
        let record = run_pipeline(&page(html), &only(SelectorKind::Text), JobMode::Site);
        assert_eq!(
            record.text,
            Some(vec!["Hello world".to_string(), "Bye".to_string()])
        );
    }

    #[test]
    fn test_meta_fields_optional() {
        let html = r#"<head><meta name="Description" content=" About us "><meta name="viewport" content="w"></head>"#;
        let record = run_pipeline(&page(html), &only(SelectorKind::Meta), JobMode::Site);
        let meta = record.meta.unwrap();
        assert_eq!(meta.description.as_deref(), Some("About us"));
        assert_eq!(meta.keywords, None);
    }

    #[test]
    fn test_images_deduplicated_by_src() {
        let html = r#"<img src="/a.png" alt="A"><img src="/a.png" alt="again"><img src=""><img src="https://cdn.test/b.png">"#;
        let record = run_pipeline(&page(html), &only(SelectorKind::Images), JobMode::Site);
        let images = record.images.unwrap();
        assert_eq!(
            images,
            vec![
                ImageRef {
                    src: "/a.png".to_string(),
                    alt: Some("A".to_string())
                },
                ImageRef {
                    src: "https://cdn.test/b.png".to_string(),
                    alt: None
                },
            ]
        );

        let record = run_pipeline(&page(html), &only(SelectorKind::Images), JobMode::Gather);
        assert_eq!(record.images.unwrap().len(), 1);
    }

    #[test]
    fn test_gather_links_absolute_and_capped() {
        let mut html = String::from("<a href='/relative'>r</a>");
        for i in 0..25 {
            html.push_str(&format!("<a href='https://x.test/{}'>x</a>", i));
        }
        html.push_str("<a href='https://x.test/0'>dup</a>");

        let record = run_pipeline(&page(&html), &only(SelectorKind::Links), JobMode::Gather);
        let links = record.links.unwrap();
        assert_eq!(links.len(), GATHER_MAX_LINKS);
        assert!(links.iter().all(|l| l.starts_with("https://")));

        let record = run_pipeline(&page(&html), &only(SelectorKind::Links), JobMode::Site);
        assert_eq!(record.links.unwrap().len(), 26);
    }

    #[test]
    fn test_gather_source_type() {
        let record = run_pipeline(&page("<p>x</p>"), &only(SelectorKind::Text), JobMode::Gather);
        assert_eq!(record.source_type, SourceType::Gathered);
    }
}
