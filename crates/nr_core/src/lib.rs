pub mod config;
pub mod dates;
pub mod error;
pub mod identity;
pub mod source;
pub mod store;
pub mod types;

pub use config::{ReaderConfig, SourceMode, StorageKind};
pub use error::{Error, Result};
pub use identity::{FederatedCredential, IdentityProvider, ProfileUpdate};
pub use source::{ArticlePage, ArticleSource, LatestRequest, SearchRequest};
pub use store::{
    CollectionPath, Direction, Document, DocumentData, DocumentPath, DocumentStore, FieldTransform, OrderBy,
    Precondition,
};
pub use types::{Article, BlockKind, BodyBlock, Bookmark, Comment, CommentAuthor, Interaction, Like, Session};
