//! Record and selector types produced by the extraction pipeline

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// One kind of extractor a job may request
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectorKind {
    Text,
    Headings,
    Meta,
    Images,
    Links,
}

impl SelectorKind {
    /// Returns all extractor kinds
    pub fn all() -> [Self; 5] {
        [
            Self::Text,
            Self::Headings,
            Self::Meta,
            Self::Images,
            Self::Links,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Headings => "headings",
            Self::Meta => "meta",
            Self::Images => "images",
            Self::Links => "links",
        }
    }
}

impl FromStr for SelectorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "headings" => Ok(Self::Headings),
            "meta" => Ok(Self::Meta),
            "images" => Ok(Self::Images),
            "links" => Ok(Self::Links),
            other => Err(format!("unknown selector '{}'", other)),
        }
    }
}

impl fmt::Display for SelectorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The set of extractor kinds requested by a job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorSet(BTreeSet<SelectorKind>);

impl SelectorSet {
    /// Builds a set from raw selector names
    ///
    /// Names are trimmed and case-folded; empty names are skipped and unknown
    /// ones are logged and ignored. If nothing valid remains, every kind is
    /// selected.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut kinds = BTreeSet::new();
        for name in names {
            let name = name.as_ref().trim();
            if name.is_empty() {
                continue;
            }
            match name.parse::<SelectorKind>() {
                Ok(kind) => {
                    kinds.insert(kind);
                }
                Err(e) => tracing::warn!("Ignoring selector: {}", e),
            }
        }

        if kinds.is_empty() {
            Self::all()
        } else {
            Self(kinds)
        }
    }

    /// Parses a comma-separated selector list such as `"Text, links"`
    pub fn from_csv(csv: &str) -> Self {
        Self::from_names(csv.split(','))
    }

    /// Selects every extractor kind
    pub fn all() -> Self {
        Self(SelectorKind::all().into_iter().collect())
    }

    pub fn contains(&self, kind: SelectorKind) -> bool {
        self.0.contains(&kind)
    }

    pub fn iter(&self) -> impl Iterator<Item = SelectorKind> + '_ {
        self.0.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for SelectorSet {
    fn default() -> Self {
        Self::all()
    }
}

/// Whether a record came from a crawled site page or a gathered search hit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    Page,
    Gathered,
}

/// Description and keywords meta tags
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PageMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keywords: Option<String>,
}

/// An image reference found on a page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageRef {
    pub src: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
}

/// One page's extraction result
///
/// Optional fields are present only when the matching [`SelectorKind`] was
/// requested for the job.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractedRecord {
    pub url: String,
    pub title: String,
    #[serde(rename = "type")]
    pub source_type: SourceType,
    pub timestamp: DateTime<Utc>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub headings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<PageMeta>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<ImageRef>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub links: Option<Vec<String>>,
}

impl ExtractedRecord {
    /// Creates a record with no extractor output
    pub fn new(url: String, title: String, source_type: SourceType) -> Self {
        Self {
            url,
            title,
            source_type,
            timestamp: Utc::now(),
            headings: None,
            text: None,
            meta: None,
            images: None,
            links: None,
        }
    }
}
