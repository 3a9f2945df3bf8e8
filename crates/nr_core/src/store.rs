use async_trait::async_trait;
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::fmt;

use crate::{Error, Result};

pub type DocumentData = Map<String, Value>;

/// Path to a single document: an even number of non-empty segments.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentPath {
    segments: Vec<String>,
}

/// Path to a collection: an odd number of non-empty segments.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CollectionPath {
    segments: Vec<String>,
}

fn check_segments(segments: &[String]) -> Result<()> {
    if segments.is_empty() {
        return Err(Error::Validation("empty document path".to_string()));
    }
    if let Some(bad) = segments.iter().find(|s| s.is_empty() || s.contains('/')) {
        return Err(Error::Validation(format!("invalid path segment: {:?}", bad)));
    }
    Ok(())
}

impl DocumentPath {
    pub fn new<I, S>(segments: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments: Vec<String> = segments.into_iter().map(Into::into).collect();
        check_segments(&segments)?;
        if segments.len() % 2 != 0 {
            return Err(Error::Validation(format!(
                "document path needs an even number of segments: {}",
                segments.join("/")
            )));
        }
        Ok(Self { segments })
    }

    pub fn parse(path: &str) -> Result<Self> {
        Self::new(path.split('/'))
    }

    /// `users/{uid}/bookmarks/{articleId}`
    pub fn bookmark(user_id: &str, article_id: &str) -> Result<Self> {
        Self::new(["users", user_id, "bookmarks", article_id])
    }

    /// `post_interactions/{postId}`
    pub fn post_interactions(post_id: &str) -> Result<Self> {
        Self::new(["post_interactions", post_id])
    }

    pub fn id(&self) -> &str {
        // non-empty by construction
        self.segments.last().map(String::as_str).unwrap_or_default()
    }

    pub fn parent(&self) -> CollectionPath {
        CollectionPath { segments: self.segments[..self.segments.len() - 1].to_vec() }
    }
}

impl CollectionPath {
    pub fn new<I, S>(segments: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments: Vec<String> = segments.into_iter().map(Into::into).collect();
        check_segments(&segments)?;
        if segments.len() % 2 != 1 {
            return Err(Error::Validation(format!(
                "collection path needs an odd number of segments: {}",
                segments.join("/")
            )));
        }
        Ok(Self { segments })
    }

    /// `users/{uid}/bookmarks`
    pub fn bookmarks(user_id: &str) -> Result<Self> {
        Self::new(["users", user_id, "bookmarks"])
    }

    pub fn doc(&self, id: &str) -> Result<DocumentPath> {
        DocumentPath::new(self.segments.iter().cloned().chain(std::iter::once(id.to_string())))
    }
}

impl fmt::Display for DocumentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("/"))
    }
}

impl fmt::Display for CollectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("/"))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub path: DocumentPath,
    pub data: DocumentData,
    /// Bumped on every write; starts at 1.
    pub version: u64,
}

impl Document {
    pub fn id(&self) -> &str {
        self.path.id()
    }

    pub fn decode<T: serde::de::DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_value(Value::Object(self.data.clone()))?)
    }
}

/// Expected state of a document for a conditional write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precondition {
    Missing,
    Version(u64),
}

impl Precondition {
    pub fn of(doc: Option<&Document>) -> Self {
        match doc {
            Some(d) => Precondition::Version(d.version),
            None => Precondition::Missing,
        }
    }

    pub fn holds(&self, current: Option<u64>) -> bool {
        match (self, current) {
            (Precondition::Missing, None) => true,
            (Precondition::Version(expected), Some(actual)) => *expected == actual,
            _ => false,
        }
    }
}

/// Field-level operations the store applies atomically.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldTransform {
    Set(String, Value),
    /// Append values not already present.
    ArrayUnion(String, Vec<Value>),
    /// Drop every element equal to one of the values.
    ArrayRemove(String, Vec<Value>),
}

impl FieldTransform {
    pub fn apply(&self, data: &mut DocumentData) {
        match self {
            FieldTransform::Set(field, value) => {
                data.insert(field.clone(), value.clone());
            }
            FieldTransform::ArrayUnion(field, values) => {
                let entry = data.entry(field.clone()).or_insert_with(|| Value::Array(Vec::new()));
                if !entry.is_array() {
                    *entry = Value::Array(Vec::new());
                }
                if let Value::Array(items) = entry {
                    for v in values {
                        if !items.contains(v) {
                            items.push(v.clone());
                        }
                    }
                }
            }
            FieldTransform::ArrayRemove(field, values) => {
                if let Some(Value::Array(items)) = data.get_mut(field) {
                    items.retain(|item| !values.contains(item));
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub field: String,
    pub direction: Direction,
}

impl OrderBy {
    pub fn asc(field: impl Into<String>) -> Self {
        Self { field: field.into(), direction: Direction::Ascending }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self { field: field.into(), direction: Direction::Descending }
    }

    /// Orders two documents by the field. Documents missing the field sort last
    /// in either direction.
    pub fn compare(&self, a: &DocumentData, b: &DocumentData) -> Ordering {
        match (a.get(&self.field), b.get(&self.field)) {
            (Some(x), Some(y)) => {
                let ord = compare_values(x, y);
                match self.direction {
                    Direction::Ascending => ord,
                    Direction::Descending => ord.reverse(),
                }
            }
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    }
}

fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            let x = x.as_f64().unwrap_or(0.0);
            let y = y.as_f64().unwrap_or(0.0);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => Ordering::Equal,
    }
}

/// Remote key-value document access, keyed by `(collection, id)` paths.
///
/// Every call is remote I/O. Implementations keep no client-side cache and
/// never retry; failures surface as [`Error::Storage`].
#[async_trait]
pub trait DocumentStore: Send + Sync {
    fn name(&self) -> &str;

    /// Returns `None` when nothing is stored at `path`.
    async fn get_document(&self, path: &DocumentPath) -> Result<Option<Document>>;

    /// Writes `data`, replacing the document or, with `merge`, overlaying its top-level fields.
    async fn set_document(&self, path: &DocumentPath, data: DocumentData, merge: bool) -> Result<()>;

    /// Replaces the document only if `expected` still holds; returns the new version.
    async fn set_document_if(
        &self,
        path: &DocumentPath,
        data: DocumentData,
        expected: Precondition,
    ) -> Result<u64>;

    /// Applies the transforms in one step, creating the document if needed.
    async fn update_document(&self, path: &DocumentPath, transforms: Vec<FieldTransform>) -> Result<()>;

    /// Deleting a missing document succeeds.
    async fn delete_document(&self, path: &DocumentPath) -> Result<()>;

    async fn list_documents(&self, collection: &CollectionPath, order_by: &OrderBy) -> Result<Vec<Document>>;
}
