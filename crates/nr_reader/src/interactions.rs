use chrono::{SecondsFormat, Utc};
use nr_core::{
    Comment, CommentAuthor, DocumentPath, DocumentStore, Error, FieldTransform, Interaction, Like, Precondition, Result,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::optimistic::{LikeState, Optimistic};
use crate::LogError;

pub const ANONYMOUS_AUTHOR: &str = "Anonymous";

fn require(value: &str, what: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::Validation(format!("{} must not be empty", what)));
    }
    Ok(())
}

/// Keeps likes and comments of posts in step with the document store.
#[derive(Clone)]
pub struct InteractionReconciler {
    store: Arc<dyn DocumentStore>,
}

impl InteractionReconciler {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// A post nobody interacted with yet has an empty interaction.
    pub async fn load_interactions(&self, post_id: &str) -> Result<Interaction> {
        require(post_id, "post id")?;
        let path = DocumentPath::post_interactions(post_id)?;
        let doc = self
            .store
            .get_document(&path)
            .await
            .log_error("Error fetching post interactions")?;

        match doc {
            Some(doc) => {
                let mut interaction: Interaction = doc.decode()?;
                interaction.post_id = post_id.to_string();
                Ok(interaction)
            }
            None => Ok(Interaction::empty(post_id)),
        }
    }

    /// Likes the post for `user_id`, or unlikes it if already liked.
    /// Returns whether the post ends up liked.
    ///
    /// The write is conditional on the version that was read; if another
    /// writer got in between, the call fails with [`Error::Conflict`].
    pub async fn toggle_like(&self, post_id: &str, user_id: &str) -> Result<bool> {
        require(post_id, "post id")?;
        if user_id.trim().is_empty() {
            return Err(Error::Unauthenticated);
        }
        let path = DocumentPath::post_interactions(post_id)?;

        let current = self.store.get_document(&path).await.log_error("Error toggling like")?;
        let expected = Precondition::of(current.as_ref());
        let mut likes: Vec<Like> = match &current {
            Some(doc) => doc.decode::<Interaction>()?.likes,
            None => Vec::new(),
        };

        let liked = if likes.iter().any(|l| l.user_id == user_id) {
            likes.retain(|l| l.user_id != user_id);
            false
        } else {
            likes.push(Like { id: Uuid::new_v4().to_string(), user_id: user_id.to_string() });
            true
        };

        let mut data = current.map(|d| d.data).unwrap_or_default();
        data.insert("id".to_string(), json!(post_id));
        data.insert("likes".to_string(), serde_json::to_value(&likes)?);

        self.store
            .set_document_if(&path, data, expected)
            .await
            .log_error("Error toggling like")?;
        debug!("👍 {} {} post {}", user_id, if liked { "liked" } else { "unliked" }, post_id);
        Ok(liked)
    }

    /// Appends a comment. Blank text is rejected before the store is touched.
    pub async fn add_comment(&self, post_id: &str, text: &str, author: &CommentAuthor) -> Result<Comment> {
        let text = text.trim();
        require(text, "comment")?;
        require(post_id, "post id")?;
        if author.user_id.trim().is_empty() {
            return Err(Error::Unauthenticated);
        }
        let path = DocumentPath::post_interactions(post_id)?;

        let user_name = if author.user_name.trim().is_empty() {
            ANONYMOUS_AUTHOR.to_string()
        } else {
            author.user_name.clone()
        };
        let comment = Comment {
            id: Uuid::new_v4().to_string(),
            text: text.to_string(),
            author: CommentAuthor { user_name, ..author.clone() },
            date: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        };

        self.store
            .update_document(
                &path,
                vec![
                    FieldTransform::Set("id".to_string(), Value::String(post_id.to_string())),
                    FieldTransform::ArrayUnion("comments".to_string(), vec![serde_json::to_value(&comment)?]),
                ],
            )
            .await
            .log_error("Error adding comment")?;
        Ok(comment)
    }

    /// Flips `state` right away, writes the like, and rolls `state` back if
    /// the write fails. On success `state` is refreshed from the store.
    pub async fn toggle_like_optimistic(
        &self,
        state: &mut Optimistic<LikeState>,
        post_id: &str,
        user_id: &str,
    ) -> Result<bool> {
        let token = state.apply_optimistic(LikeState::toggled);
        match self.toggle_like(post_id, user_id).await {
            Ok(liked) => {
                state.commit(token);
                match self.load_interactions(post_id).await {
                    Ok(interaction) => state.reconcile(LikeState::from_interaction(&interaction, Some(user_id))),
                    Err(e) => warn!("Could not refresh interactions of {}: {}", post_id, e),
                }
                Ok(liked)
            }
            Err(e) => {
                state.undo(token);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nr_storage::MemoryDocumentStore;

    fn author(uid: &str, name: &str) -> CommentAuthor {
        CommentAuthor { user_id: uid.to_string(), user_name: name.to_string(), user_avatar: String::new() }
    }

    fn reconciler() -> (InteractionReconciler, MemoryDocumentStore) {
        let store = MemoryDocumentStore::new();
        (InteractionReconciler::new(Arc::new(store.clone())), store)
    }

    #[tokio::test]
    async fn test_missing_document_is_empty() {
        let (reconciler, _) = reconciler();
        let interaction = reconciler.load_interactions("post-1").await.unwrap();
        assert_eq!(interaction, Interaction::empty("post-1"));
    }

    #[tokio::test]
    async fn test_toggle_like_twice() {
        let (reconciler, _) = reconciler();
        assert!(reconciler.toggle_like("post-1", "u1").await.unwrap());
        assert_eq!(reconciler.load_interactions("post-1").await.unwrap().likes_count(), 1);

        assert!(!reconciler.toggle_like("post-1", "u1").await.unwrap());
        assert_eq!(reconciler.load_interactions("post-1").await.unwrap().likes_count(), 0);
    }

    #[tokio::test]
    async fn test_like_keeps_comments() {
        let (reconciler, _) = reconciler();
        reconciler.add_comment("post-1", "First!", &author("u2", "Bea")).await.unwrap();
        reconciler.toggle_like("post-1", "u1").await.unwrap();

        let interaction = reconciler.load_interactions("post-1").await.unwrap();
        assert_eq!(interaction.comments_count(), 1);
        assert!(interaction.is_liked_by("u1"));
        assert!(!interaction.is_liked_by("u2"));
    }

    #[tokio::test]
    async fn test_add_comment() {
        let (reconciler, _) = reconciler();
        let first = reconciler.add_comment("post-1", "  Great piece  ", &author("u1", "")).await.unwrap();
        let second = reconciler.add_comment("post-1", "Agreed", &author("u2", "Bea")).await.unwrap();

        assert_eq!(first.text, "Great piece");
        assert_eq!(first.author.user_name, ANONYMOUS_AUTHOR);
        assert_ne!(first.id, second.id);

        let interaction = reconciler.load_interactions("post-1").await.unwrap();
        let texts: Vec<&str> = interaction.comments.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["Great piece", "Agreed"]);
    }

    #[tokio::test]
    async fn test_empty_comment_rejected_before_write() {
        let (reconciler, store) = reconciler();
        store.set_offline(true);
        let err = reconciler.add_comment("post-1", "   ", &author("u1", "Ana")).await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[tokio::test]
    async fn test_unauthenticated_like() {
        let (reconciler, _) = reconciler();
        assert!(matches!(reconciler.toggle_like("post-1", "").await, Err(Error::Unauthenticated)));
    }

    #[tokio::test]
    async fn test_optimistic_like_reverts_on_failure() {
        let (reconciler, store) = reconciler();
        let mut state = Optimistic::new(LikeState { liked: false, count: 3 });

        store.set_offline(true);
        let err = reconciler.toggle_like_optimistic(&mut state, "post-1", "u1").await.unwrap_err();
        assert!(matches!(err, Error::Storage(_)));
        assert_eq!(*state.get(), LikeState { liked: false, count: 3 });

        store.set_offline(false);
        assert!(reconciler.toggle_like_optimistic(&mut state, "post-1", "u1").await.unwrap());
        // refreshed from the store, which only knows about this one like
        assert_eq!(*state.get(), LikeState { liked: true, count: 1 });
    }
}
