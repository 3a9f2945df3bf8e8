use nr_core::{Article, ArticleSource, Result};
use std::sync::Arc;
use tracing::warn;

use crate::LogError;

/// Category label that means the unfiltered feed.
pub const ALL_LABEL: &str = "All";
pub const RELATED_LIMIT: usize = 5;

pub const FEED_CATEGORIES: &[&str] = &[ALL_LABEL, "Technology", "Politics", "World", "Business"];

#[derive(Clone)]
pub struct FeedService {
    source: Arc<dyn ArticleSource>,
}

impl FeedService {
    pub fn new(source: Arc<dyn ArticleSource>) -> Self {
        Self { source }
    }

    pub fn source(&self) -> &Arc<dyn ArticleSource> {
        &self.source
    }

    /// Latest articles for a category label as shown in the category picker.
    pub async fn latest(&self, label: Option<&str>) -> Result<Vec<Article>> {
        let category = label
            .map(str::trim)
            .filter(|c| !c.is_empty() && !c.eq_ignore_ascii_case(ALL_LABEL))
            .map(str::to_lowercase);
        self.source
            .fetch_latest(category.as_deref())
            .await
            .log_error("Error fetching news")
    }

    pub async fn article(&self, id: &str) -> Result<Option<Article>> {
        self.source
            .fetch_by_id(id)
            .await
            .log_error(&format!("Error fetching news by ID {}", id))
    }

    /// Other recent articles from the article's first category. Failures only
    /// cost the sidebar, so they are logged and yield nothing.
    pub async fn related_articles(&self, article: &Article, limit: usize) -> Vec<Article> {
        let Some(category) = article.primary_category() else {
            return Vec::new();
        };
        match self.source.fetch_latest(Some(&category.to_lowercase())).await {
            Ok(articles) => articles.into_iter().filter(|a| a.id != article.id).take(limit).collect(),
            Err(e) => {
                warn!("Error fetching related articles: {}", e);
                Vec::new()
            }
        }
    }
}
