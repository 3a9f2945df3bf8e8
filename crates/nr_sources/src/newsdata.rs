//! Wire types of the NewsData.io REST API.

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct NewsArticle {
    pub article_id: String,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub category: Option<Vec<String>>,
    #[serde(default, rename = "pubDate")]
    pub pub_date: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub source_name: Option<String>,
    #[serde(default)]
    pub source_url: Option<String>,
    #[serde(default)]
    pub sentiment: Option<String>,
    #[serde(default)]
    pub ai_summary: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsApiResponse {
    pub status: String,
    #[serde(default)]
    pub total_results: u64,
    #[serde(default)]
    pub results: Vec<NewsArticle>,
    #[serde(default)]
    pub next_page: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct NewsApiErrorDetail {
    pub message: String,
    #[serde(default)]
    pub code: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct NewsApiError {
    #[serde(default)]
    pub status: Option<String>,
    pub results: NewsApiErrorDetail,
}

/// Endpoints used by the reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Latest,
    News,
    Archive,
}

impl Endpoint {
    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::Latest => "/api/1/latest",
            Endpoint::News => "/api/1/news",
            Endpoint::Archive => "/api/1/archive",
        }
    }
}
