use chrono::NaiveDate;
use nr_core::dates::display_timestamp;
use nr_core::{Article, ArticleSource, Error, Result, SearchRequest};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::debug;

use crate::LogError;

/// Category value meaning "no category filter".
pub const ALL_CATEGORIES: &str = "All Categories";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortPolicy {
    /// Source order, untouched.
    #[default]
    Relevance,
    Newest,
    Oldest,
}

impl FromStr for SortPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "" | "relevance" => Ok(SortPolicy::Relevance),
            "newest" => Ok(SortPolicy::Newest),
            "oldest" => Ok(SortPolicy::Oldest),
            other => Err(Error::Validation(format!("unknown sort order: {}", other))),
        }
    }
}

impl fmt::Display for SortPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortPolicy::Relevance => f.write_str("relevance"),
            SortPolicy::Newest => f.write_str("newest"),
            SortPolicy::Oldest => f.write_str("oldest"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SearchQuery {
    pub text: String,
    pub category: Option<String>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub sort: SortPolicy,
}

fn parse_date(value: Option<&str>, name: &str) -> Result<Option<NaiveDate>> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(v) => NaiveDate::parse_from_str(v, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| Error::Validation(format!("{} must be YYYY-MM-DD, got {:?}", name, v))),
        None => Ok(None),
    }
}

impl SearchQuery {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into(), ..Default::default() }
    }

    pub fn with_sort(mut self, sort: SortPolicy) -> Self {
        self.sort = sort;
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Builds a query from `/search?q&category&from&to&sort` parameters.
    pub fn from_params(
        q: Option<&str>,
        category: Option<&str>,
        from: Option<&str>,
        to: Option<&str>,
        sort: Option<&str>,
    ) -> Result<Self> {
        Ok(Self {
            text: q.unwrap_or_default().to_string(),
            category: category.map(str::to_string).filter(|c| !c.trim().is_empty()),
            date_from: parse_date(from, "from")?,
            date_to: parse_date(to, "to")?,
            sort: sort.map(SortPolicy::from_str).transpose()?.unwrap_or_default(),
        })
    }

    /// The category to constrain to, unless it is the "All Categories" sentinel.
    pub fn effective_category(&self) -> Option<String> {
        self.category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty() && !c.eq_ignore_ascii_case(ALL_CATEGORIES))
            .map(str::to_lowercase)
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Orders results in place. Dates that do not parse count as the epoch.
pub fn sort_articles(articles: &mut [Article], policy: SortPolicy) {
    match policy {
        SortPolicy::Relevance => {}
        SortPolicy::Newest => articles.sort_by_key(|a| std::cmp::Reverse(display_timestamp(&a.published_at_display))),
        SortPolicy::Oldest => articles.sort_by_key(|a| display_timestamp(&a.published_at_display)),
    }
}

#[derive(Clone)]
pub struct SearchPipeline {
    source: Arc<dyn ArticleSource>,
}

impl SearchPipeline {
    pub fn new(source: Arc<dyn ArticleSource>) -> Self {
        Self { source }
    }

    pub async fn run_search(&self, query: &SearchQuery) -> Result<Vec<Article>> {
        if query.is_blank() {
            return Ok(Vec::new());
        }

        let request = SearchRequest {
            text: query.text.trim().to_string(),
            category: query.effective_category(),
            date_from: query.date_from,
            date_to: query.date_to,
            size: None,
        };
        let mut results = self.source.search(&request).await.log_error("Error searching news")?;
        sort_articles(&mut results, query.sort);
        debug!("🔍 {:?} -> {} results ({})", request.text, results.len(), query.sort);
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dated(id: &str, date: &str) -> Article {
        Article {
            id: id.to_string(),
            source: "test".to_string(),
            published_at_display: date.to_string(),
            title: id.to_string(),
            lead: String::new(),
            body: vec![],
            image: None,
            category: None,
            likes_count: 0,
            comments_count: 0,
            link: None,
            sentiment: None,
            source_url: None,
        }
    }

    fn ids(articles: &[Article]) -> Vec<&str> {
        articles.iter().map(|a| a.id.as_str()).collect()
    }

    #[test]
    fn test_sort_by_date() {
        let fixture = vec![dated("jan", "2024-01-01"), dated("bad", "not-a-date"), dated("jun", "2024-06-01")];

        let mut newest = fixture.clone();
        sort_articles(&mut newest, SortPolicy::Newest);
        assert_eq!(ids(&newest), vec!["jun", "jan", "bad"]);

        let mut oldest = fixture.clone();
        sort_articles(&mut oldest, SortPolicy::Oldest);
        assert_eq!(ids(&oldest), vec!["bad", "jan", "jun"]);

        let mut relevance = fixture.clone();
        sort_articles(&mut relevance, SortPolicy::Relevance);
        assert_eq!(ids(&relevance), vec!["jan", "bad", "jun"]);
    }

    #[test]
    fn test_effective_category() {
        assert_eq!(SearchQuery::new("x").with_category("All Categories").effective_category(), None);
        assert_eq!(SearchQuery::new("x").with_category("all categories").effective_category(), None);
        assert_eq!(
            SearchQuery::new("x").with_category("Technology").effective_category(),
            Some("technology".to_string())
        );
    }

    #[test]
    fn test_from_params() {
        let query =
            SearchQuery::from_params(Some("quantum"), Some(""), Some("2024-01-01"), None, Some("Newest")).unwrap();
        assert_eq!(query.text, "quantum");
        assert_eq!(query.category, None);
        assert_eq!(query.date_from, NaiveDate::from_ymd_opt(2024, 1, 1));
        assert_eq!(query.sort, SortPolicy::Newest);

        assert!(SearchQuery::from_params(Some("q"), None, Some("yesterday"), None, None).is_err());
        assert!(SearchQuery::from_params(Some("q"), None, None, None, Some("popular")).is_err());
    }

    #[test]
    fn test_sort_policy_round_trip_names() {
        assert_eq!("oldest".parse::<SortPolicy>().unwrap(), SortPolicy::Oldest);
        assert_eq!(SortPolicy::Newest.to_string(), "newest");
        assert_eq!("".parse::<SortPolicy>().unwrap(), SortPolicy::Relevance);
    }
}
