use chrono::{DateTime, SecondsFormat, Utc};
use nr_core::{Article, Bookmark, CollectionPath, DocumentPath, DocumentStore, Error, OrderBy, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

use crate::LogError;

const SAVED_TIMESTAMP: &str = "savedTimestamp";

/// On-disk shape: the article snapshot with the save time next to it.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredBookmark {
    #[serde(flatten)]
    article: Article,
    saved_at: String,
    saved_timestamp: i64,
}

fn require_user(user_id: &str) -> Result<()> {
    if user_id.trim().is_empty() {
        return Err(Error::Unauthenticated);
    }
    Ok(())
}

#[derive(Clone)]
pub struct BookmarkManager {
    store: Arc<dyn DocumentStore>,
}

impl BookmarkManager {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Saving again replaces the previous bookmark and refreshes its time.
    pub async fn save(&self, user_id: &str, article: &Article) -> Result<Bookmark> {
        require_user(user_id)?;
        let path = DocumentPath::bookmark(user_id, &article.id)?;
        let saved_at = Utc::now();
        let stored = StoredBookmark {
            article: article.clone(),
            saved_at: saved_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            saved_timestamp: saved_at.timestamp_millis(),
        };
        let data = match serde_json::to_value(&stored)? {
            Value::Object(map) => map,
            _ => return Err(Error::Validation("article did not serialize to an object".to_string())),
        };

        self.store
            .set_document(&path, data, false)
            .await
            .log_error("Error saving bookmark")?;
        info!("🔖 {} saved {}", user_id, article.id);
        Ok(Bookmark { user_id: user_id.to_string(), article: article.clone(), saved_at })
    }

    /// Removing something that was never saved is fine.
    pub async fn remove(&self, user_id: &str, article_id: &str) -> Result<()> {
        require_user(user_id)?;
        let path = DocumentPath::bookmark(user_id, article_id)?;
        self.store
            .delete_document(&path)
            .await
            .log_error("Error removing bookmark")
    }

    pub async fn is_saved(&self, user_id: &str, article_id: &str) -> Result<bool> {
        require_user(user_id)?;
        let path = DocumentPath::bookmark(user_id, article_id)?;
        let doc = self
            .store
            .get_document(&path)
            .await
            .log_error("Error checking bookmark status")?;
        Ok(doc.is_some())
    }

    /// Most recently saved first.
    pub async fn list_saved(&self, user_id: &str) -> Result<Vec<Bookmark>> {
        require_user(user_id)?;
        let collection = CollectionPath::bookmarks(user_id)?;
        let docs = self
            .store
            .list_documents(&collection, &OrderBy::desc(SAVED_TIMESTAMP))
            .await
            .log_error("Error fetching bookmarks")?;

        docs.iter()
            .map(|doc| {
                let stored: StoredBookmark = doc.decode()?;
                let saved_at = DateTime::parse_from_rfc3339(&stored.saved_at)
                    .map(|d| d.with_timezone(&Utc))
                    .or_else(|_| {
                        DateTime::<Utc>::from_timestamp_millis(stored.saved_timestamp)
                            .ok_or_else(|| Error::Storage(format!("bad savedAt in {}", doc.path)))
                    })?;
                Ok(Bookmark { user_id: user_id.to_string(), article: stored.article, saved_at })
            })
            .collect()
    }
}
