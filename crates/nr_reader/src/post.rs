use nr_core::{Article, Error, Interaction, Result, Session};
use serde::Serialize;

use crate::bookmarks::BookmarkManager;
use crate::feed::{FeedService, RELATED_LIMIT};
use crate::interactions::InteractionReconciler;
use crate::optimistic::LikeState;
use crate::sequence::RequestSequencer;

/// Everything the post screen shows.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostView {
    pub article: Article,
    pub interaction: Interaction,
    pub like: LikeState,
    pub saved: bool,
    pub related: Vec<Article>,
}

#[derive(Clone)]
pub struct PostLoader {
    feed: FeedService,
    interactions: InteractionReconciler,
    bookmarks: BookmarkManager,
    sequencer: RequestSequencer,
}

impl PostLoader {
    pub fn new(feed: FeedService, interactions: InteractionReconciler, bookmarks: BookmarkManager) -> Self {
        Self { feed, interactions, bookmarks, sequencer: RequestSequencer::new() }
    }

    /// Loads a post for the given viewer. Returns `Ok(None)` when another load
    /// of the same post started after this one and made it obsolete.
    pub async fn load(&self, post_id: &str, viewer: Option<&Session>) -> Result<Option<PostView>> {
        let key = format!("post:{}", post_id);
        let loaded = self.sequencer.run(&key, self.fetch(post_id, viewer)).await;
        loaded.transpose()
    }

    /// Loads a post without sequencing, for callers where every request is
    /// its own view and none can supersede another.
    pub async fn fetch(&self, post_id: &str, viewer: Option<&Session>) -> Result<PostView> {
        let article = self
            .feed
            .article(post_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("article {}", post_id)))?;

        let (interaction, related) = futures::join!(
            self.interactions.load_interactions(post_id),
            self.feed.related_articles(&article, RELATED_LIMIT)
        );
        let interaction = interaction?;

        let uid = viewer.map(|s| s.uid.as_str());
        let saved = match uid {
            Some(uid) => self.bookmarks.is_saved(uid, post_id).await?,
            None => false,
        };

        Ok(PostView {
            like: LikeState::from_interaction(&interaction, uid),
            article,
            interaction,
            saved,
            related,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nr_core::{CommentAuthor, DocumentStore};
    use nr_sources::MockNewsSource;
    use nr_storage::MemoryDocumentStore;
    use std::sync::Arc;
    use std::time::Duration;

    fn loader(latency: Duration) -> (PostLoader, InteractionReconciler, BookmarkManager) {
        let store: Arc<dyn DocumentStore> = Arc::new(MemoryDocumentStore::new());
        let feed = FeedService::new(Arc::new(MockNewsSource::new(latency)));
        let interactions = InteractionReconciler::new(store.clone());
        let bookmarks = BookmarkManager::new(store);
        (PostLoader::new(feed, interactions.clone(), bookmarks.clone()), interactions, bookmarks)
    }

    fn viewer(uid: &str) -> Session {
        Session {
            uid: uid.to_string(),
            display_name: Some("Viewer".to_string()),
            email: None,
            avatar_url: None,
            is_anonymous: false,
        }
    }

    #[tokio::test]
    async fn test_load_post_for_viewer() {
        let (loader, interactions, bookmarks) = loader(Duration::ZERO);
        let me = viewer("u1");

        interactions.toggle_like("mock-tech-1", "u1").await.unwrap();
        interactions
            .add_comment("mock-tech-1", "nice", &CommentAuthor::from(&me))
            .await
            .unwrap();
        let article = loader.feed.article("mock-tech-1").await.unwrap().unwrap();
        bookmarks.save("u1", &article).await.unwrap();

        let view = loader.load("mock-tech-1", Some(&me)).await.unwrap().unwrap();
        assert_eq!(view.article.id, "mock-tech-1");
        assert_eq!(view.like, LikeState { liked: true, count: 1 });
        assert_eq!(view.interaction.comments_count(), 1);
        assert!(view.saved);
        assert!(view.related.iter().all(|a| a.id != "mock-tech-1"));

        let anonymous = loader.load("mock-tech-1", None).await.unwrap().unwrap();
        assert!(!anonymous.like.liked);
        assert!(!anonymous.saved);
    }

    #[tokio::test]
    async fn test_unknown_post_is_not_found() {
        let (loader, _, _) = loader(Duration::ZERO);
        assert!(matches!(loader.load("missing", None).await, Err(Error::NotFound(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_superseded_load_is_discarded() {
        let (loader, _, _) = loader(Duration::from_millis(500));
        let first = loader.load("mock-2", None);
        let second = async {
            tokio::time::sleep(Duration::from_millis(100)).await;
            loader.load("mock-2", None).await
        };
        let (first, second) = tokio::join!(first, second);
        assert!(first.unwrap().is_none());
        assert!(second.unwrap().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_overlapping_fetches_both_complete() {
        let (loader, _, _) = loader(Duration::from_millis(500));
        let first = loader.fetch("mock-2", None);
        let second = async {
            tokio::time::sleep(Duration::from_millis(100)).await;
            loader.fetch("mock-2", None).await
        };
        let (first, second) = tokio::join!(first, second);
        assert_eq!(first.unwrap().article.id, "mock-2");
        assert_eq!(second.unwrap().article.id, "mock-2");
    }
}
