pub mod memory;

#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use memory::MemoryDocumentStore;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDocumentStore;
