//! Keyword relevance filter
//!
//! A record is accepted when at least one keyword occurs in the page text.
//! Matching is a case-insensitive substring test with OR semantics.

/// Ordered list of lowercase keywords; empty accepts everything
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeywordFilter {
    keywords: Vec<String>,
}

impl KeywordFilter {
    /// Builds a filter from a comma-separated keyword string
    ///
    /// # Examples
    ///
    /// ```
    /// use sumi_trawl::filter::KeywordFilter;
    ///
    /// let filter = KeywordFilter::from_csv(" AI, ml ,,");
    /// assert_eq!(filter.keywords(), ["ai", "ml"]);
    /// ```
    pub fn from_csv(csv: &str) -> Self {
        Self::new(csv.split(','))
    }

    /// Builds a filter from individual keywords, lowercased and trimmed
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut filter = Self::default();
        for keyword in keywords {
            let keyword = keyword.as_ref().trim().to_lowercase();
            if !keyword.is_empty() && !filter.keywords.contains(&keyword) {
                filter.keywords.push(keyword);
            }
        }
        filter
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }

    /// Tests lowercased page text, plus an optional lowercased title
    pub fn accepts(&self, body_lowercase: &str, title_lowercase: Option<&str>) -> bool {
        if self.keywords.is_empty() {
            return true;
        }

        self.keywords.iter().any(|keyword| {
            body_lowercase.contains(keyword.as_str())
                || title_lowercase.is_some_and(|title| title.contains(keyword.as_str()))
        })
    }
}
