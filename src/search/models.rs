//! Search query and related data models

use chrono::{Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Smallest number of results a query may ask for
pub const MIN_RESULT_COUNT: u32 = 5;
/// Largest number of results a query may ask for
pub const MAX_RESULT_COUNT: u32 = 50;
/// Result count used when none is given
pub const DEFAULT_RESULT_COUNT: u32 = 15;
/// Length of the default date range, ending today
pub const DEFAULT_RANGE_DAYS: i64 = 30;

/// Rejected query
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum QueryError {
    #[error("search term is empty")]
    EmptyTerm,

    #[error("start date {start} is after end date {end}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },
}

/// Inclusive publication date window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// The last `days` days, ending today (UTC)
    pub fn last_days(days: i64) -> Self {
        let end = Utc::now().date_naive();
        Self {
            start: end - Duration::days(days),
            end,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.start <= self.end
    }
}

impl Default for DateRange {
    fn default() -> Self {
        Self::last_days(DEFAULT_RANGE_DAYS)
    }
}

/// Search mode of the neural provider
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NeuralSearchType {
    #[default]
    Neural,
    Keyword,
    Semantic,
    Auto,
}

impl NeuralSearchType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Neural => "neural",
            Self::Keyword => "keyword",
            Self::Semantic => "semantic",
            Self::Auto => "auto",
        }
    }
}

/// Options only the neural provider understands
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NeuralOptions {
    pub search_type: NeuralSearchType,
    /// Category filter such as "company" or "news"
    pub category: Option<String>,
    pub use_autoprompt: bool,
    pub highlights: bool,
    /// Body text is cut to this many characters
    pub max_characters: u32,
    pub include_html_tags: bool,
}

impl Default for NeuralOptions {
    fn default() -> Self {
        Self {
            search_type: NeuralSearchType::default(),
            category: None,
            use_autoprompt: true,
            highlights: true,
            max_characters: 300,
            include_html_tags: true,
        }
    }
}

/// Ordering of news articles
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NewsSortBy {
    #[default]
    #[serde(rename = "relevancy")]
    Relevancy,
    #[serde(rename = "popularity")]
    Popularity,
    #[serde(rename = "publishedAt")]
    PublishedAt,
}

impl NewsSortBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Relevancy => "relevancy",
            Self::Popularity => "popularity",
            Self::PublishedAt => "publishedAt",
        }
    }
}

/// Options only the news provider understands
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NewsOptions {
    /// Source identifiers; empty means all sources
    pub sources: Vec<String>,
    pub language: String,
    pub sort_by: NewsSortBy,
    pub page_size: u32,
    pub page: u32,
}

impl Default for NewsOptions {
    fn default() -> Self {
        Self {
            sources: Vec::new(),
            language: "en".to_string(),
            sort_by: NewsSortBy::default(),
            page_size: 100,
            page: 1,
        }
    }
}

impl NewsOptions {
    /// Parse a comma-separated source list, dropping blanks
    pub fn parse_sources(list: &str) -> Vec<String> {
        list.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// Complete search query with all parameters
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SearchQuery {
    /// Company domain or free-text term
    pub term: String,
    /// Results requested from each provider
    pub result_count: u32,
    /// Publication window
    pub date_range: DateRange,
    pub neural: NeuralOptions,
    pub news: NewsOptions,
}

impl SearchQuery {
    /// Create a query with default options
    pub fn new(term: impl Into<String>) -> Self {
        Self {
            term: term.into().trim().to_string(),
            result_count: DEFAULT_RESULT_COUNT,
            date_range: DateRange::default(),
            neural: NeuralOptions::default(),
            news: NewsOptions::default(),
        }
    }

    /// Set result count, clamped to the supported bounds
    pub fn with_result_count(mut self, count: u32) -> Self {
        self.result_count = count.clamp(MIN_RESULT_COUNT, MAX_RESULT_COUNT);
        self
    }

    /// Set date range
    pub fn with_date_range(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.date_range = DateRange::new(start, end);
        self
    }

    /// Set neural search mode
    pub fn with_search_type(mut self, search_type: NeuralSearchType) -> Self {
        self.neural.search_type = search_type;
        self
    }

    /// Set neural category filter
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        let category = category.into();
        self.neural.category = if category.trim().is_empty() {
            None
        } else {
            Some(category.trim().to_string())
        };
        self
    }

    /// Set news sources
    pub fn with_sources(mut self, sources: Vec<String>) -> Self {
        self.news.sources = sources;
        self
    }

    /// Set news language
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.news.language = language.into();
        self
    }

    /// Set news ordering
    pub fn with_sort_by(mut self, sort_by: NewsSortBy) -> Self {
        self.news.sort_by = sort_by;
        self
    }

    /// Check the query before it is sent anywhere
    pub fn validate(&self) -> Result<(), QueryError> {
        if self.is_empty() {
            return Err(QueryError::EmptyTerm);
        }
        if !self.date_range.is_valid() {
            return Err(QueryError::InvalidDateRange {
                start: self.date_range.start,
                end: self.date_range.end,
            });
        }
        Ok(())
    }

    /// Check if query is empty
    pub fn is_empty(&self) -> bool {
        self.term.trim().is_empty()
    }
}

impl fmt::Display for SearchQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "'{}' ({} results, {}..{})",
            self.term, self.result_count, self.date_range.start, self.date_range.end
        )
    }
}
