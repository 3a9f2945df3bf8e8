use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockKind {
    Paragraph,
    #[serde(alias = "blockquote")]
    Quote,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BodyBlock {
    pub kind: BlockKind,
    pub text: String,
}

impl BodyBlock {
    pub fn paragraph(text: impl Into<String>) -> Self {
        Self { kind: BlockKind::Paragraph, text: text.into() }
    }

    pub fn quote(text: impl Into<String>) -> Self {
        Self { kind: BlockKind::Quote, text: text.into() }
    }
}

/// A news item in canonical shape, whichever source produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub id: String,
    pub source: String,
    /// Publication time as the provider rendered it ("2024-06-01 10:00:00", "2h ago", ...).
    pub published_at_display: String,
    pub title: String,
    pub lead: String,
    #[serde(default)]
    pub body: Vec<BodyBlock>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Vec<String>>,
    #[serde(default)]
    pub likes_count: u32,
    #[serde(default)]
    pub comments_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentiment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
}

impl Article {
    pub fn in_category(&self, category: &str) -> bool {
        self.category
            .as_ref()
            .map(|cats| cats.iter().any(|c| c.eq_ignore_ascii_case(category)))
            .unwrap_or(false)
    }

    pub fn primary_category(&self) -> Option<&str> {
        self.category
            .as_ref()
            .and_then(|cats| cats.first())
            .map(String::as_str)
            .filter(|c| !c.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Like {
    pub id: String,
    pub user_id: String,
}

/// Who wrote a comment, captured at write time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentAuthor {
    pub user_id: String,
    pub user_name: String,
    #[serde(default)]
    pub user_avatar: String,
}

impl From<&Session> for CommentAuthor {
    fn from(session: &Session) -> Self {
        Self {
            user_id: session.uid.clone(),
            user_name: session.display_name.clone().unwrap_or_default(),
            user_avatar: session.avatar_url.clone().unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    #[serde(rename = "comment")]
    pub text: String,
    #[serde(flatten)]
    pub author: CommentAuthor,
    /// RFC 3339 timestamp.
    pub date: String,
}

/// Likes and comments attached to one post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interaction {
    #[serde(rename = "id", default)]
    pub post_id: String,
    #[serde(default)]
    pub likes: Vec<Like>,
    #[serde(default)]
    pub comments: Vec<Comment>,
}

impl Interaction {
    pub fn empty(post_id: impl Into<String>) -> Self {
        Self { post_id: post_id.into(), likes: Vec::new(), comments: Vec::new() }
    }

    pub fn is_liked_by(&self, user_id: &str) -> bool {
        self.likes.iter().any(|l| l.user_id == user_id)
    }

    pub fn likes_count(&self) -> usize {
        self.likes.len()
    }

    pub fn comments_count(&self) -> usize {
        self.comments.len()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bookmark {
    pub user_id: String,
    pub article: Article,
    pub saved_at: DateTime<Utc>,
}

/// The signed-in identity, anonymous or not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub uid: String,
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub is_anonymous: bool,
}
