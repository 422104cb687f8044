//! Job requests and their validated form

use crate::config::CrawlerConfig;
use crate::extract::SelectorSet;
use crate::filter::KeywordFilter;
use crate::job::JobMode;
use crate::TrawlError;
use serde::Deserialize;
use url::Url;

/// Multiplier from a Gather job's record limit to its request budget
pub const GATHER_REQUEST_FACTOR: u32 = 5;

/// A limit as supplied by a caller: a number or numeric text
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum LimitInput {
    Number(i64),
    Text(String),
}

/// Selectors as supplied by a caller: a list or comma-separated text
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum SelectorInput {
    List(Vec<String>),
    Csv(String),
}

/// Unvalidated job configuration, as received from a caller
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobRequest {
    #[serde(default)]
    pub mode: JobMode,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub topic: Option<String>,
    /// Comma-separated keywords
    #[serde(default)]
    pub keywords: Option<String>,
    #[serde(default)]
    pub limit: Option<LimitInput>,
    #[serde(default)]
    pub selectors: Option<SelectorInput>,
}

impl JobRequest {
    /// A Site job starting from `url`
    pub fn site(url: impl Into<String>) -> Self {
        Self {
            mode: JobMode::Site,
            url: Some(url.into()),
            ..Self::default()
        }
    }

    /// A Gather job searching for `topic`
    pub fn gather(topic: impl Into<String>) -> Self {
        Self {
            mode: JobMode::Gather,
            topic: Some(topic.into()),
            ..Self::default()
        }
    }

    pub fn with_keywords(mut self, keywords: impl Into<String>) -> Self {
        self.keywords = Some(keywords.into());
        self
    }

    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = Some(LimitInput::Number(limit));
        self
    }

    pub fn with_selectors(mut self, selectors: impl Into<String>) -> Self {
        self.selectors = Some(SelectorInput::Csv(selectors.into()));
        self
    }

    /// Validates the request and applies defaults
    ///
    /// # Errors
    ///
    /// Returns `TrawlError::InvalidConfig` if a Site job has no usable URL or
    /// a Gather job has neither topic nor keywords.
    pub fn into_spec(self, crawler: &CrawlerConfig) -> Result<JobSpec, TrawlError> {
        let keywords_raw = self.keywords.unwrap_or_default();

        let seed = match self.mode {
            JobMode::Site => {
                let raw = self.url.unwrap_or_default();
                let raw = raw.trim();
                if raw.is_empty() {
                    return Err(TrawlError::InvalidConfig(
                        "site jobs require a URL".to_string(),
                    ));
                }
                let url = Url::parse(raw).map_err(|e| {
                    TrawlError::InvalidConfig(format!("invalid seed URL '{}': {}", raw, e))
                })?;
                if url.scheme() != "http" && url.scheme() != "https" {
                    return Err(TrawlError::InvalidConfig(format!(
                        "seed URL must be http or https, got '{}'",
                        raw
                    )));
                }
                SeedSpec::Site(url)
            }
            JobMode::Gather => {
                let topic = self.topic.unwrap_or_default().trim().to_string();
                if topic.is_empty() && keywords_raw.trim().is_empty() {
                    return Err(TrawlError::InvalidConfig(
                        "gather jobs require a topic or keywords".to_string(),
                    ));
                }
                SeedSpec::Gather {
                    topic,
                    keywords: keywords_raw.trim().to_string(),
                }
            }
        };

        let selectors = match self.selectors {
            Some(SelectorInput::List(names)) => SelectorSet::from_names(names),
            Some(SelectorInput::Csv(csv)) => SelectorSet::from_csv(&csv),
            None => SelectorSet::all(),
        };

        Ok(JobSpec {
            mode: self.mode,
            seed,
            selectors,
            keywords: KeywordFilter::from_csv(&keywords_raw),
            limit: resolve_limit(self.limit.as_ref(), crawler.default_limit),
        })
    }
}

/// Resolves a caller-supplied limit, falling back to the default
///
/// Anything that is not a positive integer fitting in `u32` yields the default.
pub fn resolve_limit(limit: Option<&LimitInput>, default: u32) -> u32 {
    let parsed = match limit {
        Some(LimitInput::Number(n)) => Some(*n),
        Some(LimitInput::Text(text)) => text.trim().parse::<i64>().ok(),
        None => None,
    };

    parsed
        .filter(|n| *n > 0)
        .and_then(|n| u32::try_from(n).ok())
        .unwrap_or(default)
}

/// Where a job starts from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeedSpec {
    Site(Url),
    Gather { topic: String, keywords: String },
}

/// A validated job configuration
#[derive(Debug, Clone)]
pub struct JobSpec {
    pub mode: JobMode,
    pub seed: SeedSpec,
    pub selectors: SelectorSet,
    pub keywords: KeywordFilter,
    pub limit: u32,
}

impl JobSpec {
    /// Total fetches the job may perform
    pub fn max_requests(&self) -> u32 {
        match self.mode {
            JobMode::Site => self.limit,
            JobMode::Gather => self.limit.saturating_mul(GATHER_REQUEST_FACTOR),
        }
    }
}
