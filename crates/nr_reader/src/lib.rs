use nr_core::{
    Article, ArticleSource, Bookmark, Comment, CommentAuthor, DocumentStore, Error, IdentityProvider, ReaderConfig,
    Result,
};
use std::sync::Arc;
use tracing::{error, info};

pub mod bookmarks;
pub mod debounce;
pub mod feed;
pub mod identity;
pub mod interactions;
pub mod optimistic;
pub mod post;
pub mod search;
pub mod sequence;
pub mod session;

pub use bookmarks::BookmarkManager;
pub use debounce::{SearchDebouncer, SearchOutcome};
pub use feed::{FeedService, ALL_LABEL, FEED_CATEGORIES, RELATED_LIMIT};
pub use identity::LocalIdentityProvider;
pub use interactions::{InteractionReconciler, ANONYMOUS_AUTHOR};
pub use optimistic::{LikeState, Optimistic, UndoToken};
pub use post::{PostLoader, PostView};
pub use search::{sort_articles, SearchPipeline, SearchQuery, SortPolicy, ALL_CATEGORIES};
pub use sequence::{RequestSequencer, RequestTicket};
pub use session::{SessionState, SessionStore};

/// Logs a failed service call before handing the error back to the caller.
pub(crate) trait LogError {
    fn log_error(self, context: &str) -> Self;
}

impl<T> LogError for Result<T> {
    fn log_error(self, context: &str) -> Self {
        if let Err(e) = &self {
            error!("{}: {}", context, e);
        }
        self
    }
}

/// The service layer wired together: one source, one store, one session.
#[derive(Clone)]
pub struct Reader {
    config: ReaderConfig,
    store: Arc<dyn DocumentStore>,
    session: Arc<SessionStore>,
    pub feed: FeedService,
    pub search: SearchPipeline,
    pub interactions: InteractionReconciler,
    pub bookmarks: BookmarkManager,
    pub posts: PostLoader,
}

impl Reader {
    /// Opens the configured store and source, with the in-process identity provider.
    pub async fn new(config: ReaderConfig) -> Result<Self> {
        let store = nr_storage::create_store(&config).await?;
        let source = nr_sources::create_source(&config)?;
        Ok(Self::with_parts(config, store, source, Arc::new(LocalIdentityProvider::new())))
    }

    /// Must be called from within a tokio runtime.
    pub fn with_parts(
        config: ReaderConfig,
        store: Arc<dyn DocumentStore>,
        source: Arc<dyn ArticleSource>,
        provider: Arc<dyn IdentityProvider>,
    ) -> Self {
        let feed = FeedService::new(source.clone());
        let interactions = InteractionReconciler::new(store.clone());
        let bookmarks = BookmarkManager::new(store.clone());
        let posts = PostLoader::new(feed.clone(), interactions.clone(), bookmarks.clone());
        info!("📚 Reader ready ({} articles, {} store)", source.name(), store.name());
        Self {
            config,
            session: Arc::new(SessionStore::init(provider)),
            search: SearchPipeline::new(source),
            store,
            feed,
            interactions,
            bookmarks,
            posts,
        }
    }

    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    /// A debouncer over this reader's search pipeline with the configured window.
    pub fn debouncer(&self) -> SearchDebouncer {
        SearchDebouncer::new(self.search.clone(), self.config.search_debounce)
    }

    async fn article(&self, article_id: &str) -> Result<Article> {
        self.feed
            .article(article_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("article {}", article_id)))
    }

    /// Toggles the signed-in user's like; returns whether the post is now liked.
    pub async fn toggle_like(&self, post_id: &str) -> Result<bool> {
        let session = self.session.require_session()?;
        self.interactions.toggle_like(post_id, &session.uid).await
    }

    pub async fn add_comment(&self, post_id: &str, text: &str) -> Result<Comment> {
        let session = self.session.require_session()?;
        self.interactions
            .add_comment(post_id, text, &CommentAuthor::from(&session))
            .await
    }

    pub async fn save_bookmark(&self, article_id: &str) -> Result<Bookmark> {
        let session = self.session.require_session()?;
        let article = self.article(article_id).await?;
        self.bookmarks.save(&session.uid, &article).await
    }

    pub async fn remove_bookmark(&self, article_id: &str) -> Result<()> {
        let session = self.session.require_session()?;
        self.bookmarks.remove(&session.uid, article_id).await
    }

    pub async fn saved_bookmarks(&self) -> Result<Vec<Bookmark>> {
        let session = self.session.require_session()?;
        self.bookmarks.list_saved(&session.uid).await
    }

    /// Sequenced load for a long-lived view; `None` once a newer load of the
    /// same post has started.
    pub async fn load_post(&self, post_id: &str) -> Result<Option<PostView>> {
        let viewer = self.session.current();
        self.posts.load(post_id, viewer.as_ref()).await
    }

    /// One-shot load, as used by request/response callers.
    pub async fn fetch_post(&self, post_id: &str) -> Result<PostView> {
        let viewer = self.session.current();
        self.posts.fetch(post_id, viewer.as_ref()).await
    }
}

pub mod prelude {
    pub use super::{Reader, SearchQuery, SessionState, SortPolicy};
    pub use nr_core::{Article, Bookmark, Error, ReaderConfig, Result, Session};
}
