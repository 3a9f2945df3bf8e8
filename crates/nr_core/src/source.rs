use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::types::Article;
use crate::Result;

/// Parameters for the "latest" endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LatestRequest {
    pub category: Option<String>,
    pub country: Option<String>,
    pub text: Option<String>,
    pub size: Option<u32>,
    /// Cursor from a previous page's `next_page`.
    pub page: Option<String>,
}

impl LatestRequest {
    pub fn category(category: Option<&str>) -> Self {
        Self { category: category.map(str::to_lowercase), ..Default::default() }
    }
}

/// What the search pipeline hands to a source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchRequest {
    pub text: String,
    pub category: Option<String>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub size: Option<u32>,
}

impl SearchRequest {
    pub fn text(text: impl Into<String>) -> Self {
        Self { text: text.into(), ..Default::default() }
    }

    pub fn has_date_range(&self) -> bool {
        self.date_from.is_some() || self.date_to.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticlePage {
    pub total_results: u64,
    pub articles: Vec<Article>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page: Option<String>,
}

/// Where articles come from. One implementation is chosen at startup.
#[async_trait]
pub trait ArticleSource: Send + Sync {
    fn name(&self) -> &str;

    async fn fetch_latest_page(&self, request: &LatestRequest) -> Result<ArticlePage>;

    /// Latest articles, optionally restricted to one category.
    async fn fetch_latest(&self, category: Option<&str>) -> Result<Vec<Article>> {
        Ok(self.fetch_latest_page(&LatestRequest::category(category)).await?.articles)
    }

    async fn search(&self, request: &SearchRequest) -> Result<Vec<Article>>;

    /// `None` when the source has no article with that id.
    async fn fetch_by_id(&self, id: &str) -> Result<Option<Article>>;
}
