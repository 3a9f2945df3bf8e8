use async_trait::async_trait;
use nr_core::{Article, ArticlePage, ArticleSource, Error, LatestRequest, ReaderConfig, Result, SearchRequest};
use reqwest::Client;
use std::fmt;
use tracing::{debug, error};

use crate::newsdata::{Endpoint, NewsApiError, NewsApiResponse};
use crate::normalize::to_article;

/// Client for the NewsData.io API. The key travels as the `apikey` query parameter.
pub struct LiveNewsSource {
    client: Client,
    api_key: String,
    base_url: String,
    language: String,
    page_size: u32,
}

impl fmt::Debug for LiveNewsSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LiveNewsSource")
            .field("client", &"<reqwest::Client>")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("language", &self.language)
            .finish()
    }
}

impl LiveNewsSource {
    pub fn new(config: &ReaderConfig) -> Result<Self> {
        let api_key = config
            .api_key()
            .ok_or_else(|| Error::Config("news API key is required for the live source".to_string()))?;
        url::Url::parse(&config.news_api_base_url)
            .map_err(|e| Error::InvalidUrl(format!("{}: {}", config.news_api_base_url, e)))?;

        Ok(Self {
            client: Client::new(),
            api_key: api_key.to_string(),
            base_url: config.news_api_base_url.trim_end_matches('/').to_string(),
            language: config.language.clone(),
            page_size: config.page_size,
        })
    }

    async fn get(&self, endpoint: Endpoint, mut params: Vec<(&'static str, String)>) -> Result<NewsApiResponse> {
        params.push(("apikey", self.api_key.clone()));
        debug!("📡 GET {} {:?}", endpoint.path(), params.iter().map(|(k, _)| *k).collect::<Vec<_>>());

        let response = self
            .client
            .get(format!("{}{}", self.base_url, endpoint.path()))
            .query(&params)
            .send()
            .await
            .map_err(|e| {
                error!("No response received from the news API: {}", e);
                Error::Http(e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<NewsApiError>(&body)
                .map(|e| e.results.message)
                .unwrap_or_else(|_| status.canonical_reason().unwrap_or("request failed").to_string());
            match status.as_u16() {
                401 | 403 => error!("Invalid news API key: {}", message),
                429 => error!("News API rate limit exceeded: {}", message),
                _ => error!("News API error {}: {}", status, message),
            }
            return Err(Error::RemoteApi { status: status.as_u16(), message });
        }

        Ok(response.json::<NewsApiResponse>().await?)
    }

    fn into_page(response: NewsApiResponse) -> ArticlePage {
        ArticlePage {
            total_results: response.total_results,
            articles: response.results.into_iter().map(to_article).collect(),
            next_page: response.next_page,
        }
    }
}

#[async_trait]
impl ArticleSource for LiveNewsSource {
    fn name(&self) -> &str {
        "newsdata.io"
    }

    async fn fetch_latest_page(&self, request: &LatestRequest) -> Result<ArticlePage> {
        let mut params = vec![
            ("language", self.language.clone()),
            ("size", request.size.unwrap_or(self.page_size).to_string()),
        ];
        if let Some(category) = &request.category {
            params.push(("category", category.to_lowercase()));
        }
        if let Some(country) = &request.country {
            params.push(("country", country.clone()));
        }
        if let Some(text) = &request.text {
            params.push(("q", text.clone()));
        }
        if let Some(page) = &request.page {
            params.push(("page", page.clone()));
        }
        Ok(Self::into_page(self.get(Endpoint::Latest, params).await?))
    }

    async fn search(&self, request: &SearchRequest) -> Result<Vec<Article>> {
        let mut params = vec![("q", request.text.clone()), ("language", self.language.clone())];
        if let Some(category) = &request.category {
            params.push(("category", category.to_lowercase()));
        }

        let endpoint = if request.has_date_range() {
            if let Some(from) = request.date_from {
                params.push(("from_date", from.format("%Y-%m-%d").to_string()));
            }
            if let Some(to) = request.date_to {
                params.push(("to_date", to.format("%Y-%m-%d").to_string()));
            }
            Endpoint::Archive
        } else {
            params.push(("size", request.size.unwrap_or(self.page_size).to_string()));
            Endpoint::Latest
        };

        Ok(Self::into_page(self.get(endpoint, params).await?).articles)
    }

    async fn fetch_by_id(&self, id: &str) -> Result<Option<Article>> {
        let response = self.get(Endpoint::News, vec![("id", id.to_string())]).await?;
        Ok(response.results.into_iter().next().map(to_article))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::Query;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::{json, Value};
    use std::collections::HashMap;

    type Params = Query<HashMap<String, String>>;

    fn article(id: &str, title: &str) -> Value {
        json!({
            "article_id": id,
            "title": title,
            "description": format!("About {}", title),
            "content": "ONLY AVAILABLE IN PAID PLANS",
            "pubDate": "2024-06-01 10:00:00",
            "source_name": "Reuters",
            "category": ["technology"]
        })
    }

    async fn latest(Query(params): Params) -> impl IntoResponse {
        if params.get("apikey").map(String::as_str) != Some("good-key") {
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({"status": "error", "results": {"message": "API key is invalid", "code": "Unauthorized"}})),
            );
        }
        let title = format!(
            "{}|{}|{}",
            params.get("q").cloned().unwrap_or_default(),
            params.get("category").cloned().unwrap_or_default(),
            params.get("language").cloned().unwrap_or_default()
        );
        let body = json!({
            "status": "success",
            "totalResults": 1,
            "results": [article("l1", &title)],
            "nextPage": "cursor-2"
        });
        (StatusCode::OK, Json(body))
    }

    async fn news(Query(params): Params) -> Json<Value> {
        let results = match params.get("id").map(String::as_str) {
            Some("known") => vec![article("known", "Known article")],
            _ => vec![],
        };
        Json(json!({"status": "success", "totalResults": results.len(), "results": results}))
    }

    async fn archive(Query(params): Params) -> Json<Value> {
        let title = format!(
            "{}..{}",
            params.get("from_date").cloned().unwrap_or_default(),
            params.get("to_date").cloned().unwrap_or_default()
        );
        Json(json!({"status": "success", "totalResults": 1, "results": [article("a1", &title)]}))
    }

    async fn rate_limited() -> impl IntoResponse {
        (StatusCode::TOO_MANY_REQUESTS, "slow down")
    }

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    async fn source(key: &str) -> LiveNewsSource {
        let router = Router::new()
            .route("/api/1/latest", get(latest))
            .route("/api/1/news", get(news))
            .route("/api/1/archive", get(archive));
        let config = ReaderConfig {
            news_api_key: Some(key.to_string()),
            news_api_base_url: serve(router).await,
            ..Default::default()
        };
        LiveNewsSource::new(&config).unwrap()
    }

    #[test]
    fn test_requires_api_key() {
        assert!(matches!(LiveNewsSource::new(&ReaderConfig::default()), Err(Error::Config(_))));
    }

    #[tokio::test]
    async fn test_fetch_latest_page() {
        let source = source("good-key").await;
        let page = source
            .fetch_latest_page(&LatestRequest::category(Some("Technology")))
            .await
            .unwrap();

        assert_eq!(page.total_results, 1);
        assert_eq!(page.next_page.as_deref(), Some("cursor-2"));
        assert_eq!(page.articles[0].title, "|technology|en");
        assert_eq!(page.articles[0].lead, "About |technology|en");
    }

    #[tokio::test]
    async fn test_search_uses_archive_for_date_range() {
        let source = source("good-key").await;

        let plain = source.search(&SearchRequest::text("quantum")).await.unwrap();
        assert_eq!(plain[0].title, "quantum||en");

        let ranged = SearchRequest {
            text: "quantum".to_string(),
            date_from: chrono::NaiveDate::from_ymd_opt(2024, 1, 1),
            date_to: chrono::NaiveDate::from_ymd_opt(2024, 2, 1),
            ..Default::default()
        };
        let archived = source.search(&ranged).await.unwrap();
        assert_eq!(archived[0].title, "2024-01-01..2024-02-01");
    }

    #[tokio::test]
    async fn test_fetch_by_id() {
        let source = source("good-key").await;
        assert_eq!(source.fetch_by_id("known").await.unwrap().unwrap().id, "known");
        assert!(source.fetch_by_id("unknown").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unauthorized_surfaces_status() {
        let source = source("bad-key").await;
        match source.fetch_latest(None).await {
            Err(Error::RemoteApi { status, message }) => {
                assert_eq!(status, 401);
                assert_eq!(message, "API key is invalid");
            }
            other => panic!("expected RemoteApi error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_rate_limit_surfaces_status() {
        let base = serve(Router::new().route("/api/1/latest", get(rate_limited))).await;
        let config = ReaderConfig {
            news_api_key: Some("k".to_string()),
            news_api_base_url: base,
            ..Default::default()
        };
        let source = LiveNewsSource::new(&config).unwrap();
        let err = source.search(&SearchRequest::text("x")).await.unwrap_err();
        assert!(err.is_rate_limited());
    }
}
