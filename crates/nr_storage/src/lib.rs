use async_trait::async_trait;
use nr_core::{DocumentStore, Error, ReaderConfig, Result, StorageKind};
use std::sync::Arc;
use tracing::info;

pub mod backends;

pub use backends::*;

/// A document store that can be built from the reader configuration.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    fn get_error_message() -> &'static str;
    async fn new(config: &ReaderConfig) -> Result<Self>
    where
        Self: Sized;
}

async fn open<T: StorageBackend + DocumentStore + 'static>(config: &ReaderConfig) -> Result<Arc<dyn DocumentStore>> {
    let store = T::new(config)
        .await
        .map_err(|e| Error::Storage(format!("{} ({})", T::get_error_message(), e)))?;
    let store = Arc::new(store) as Arc<dyn DocumentStore>;
    info!("🏦 Document store initialized (using {})", store.name());
    Ok(store)
}

/// Opens the backend selected by `config.storage`.
pub async fn create_store(config: &ReaderConfig) -> Result<Arc<dyn DocumentStore>> {
    match config.storage {
        StorageKind::Memory => open::<MemoryDocumentStore>(config).await,
        #[cfg(feature = "sqlite")]
        StorageKind::Sqlite => open::<SqliteDocumentStore>(config).await,
        #[cfg(not(feature = "sqlite"))]
        StorageKind::Sqlite => Err(Error::Config("nr_storage was built without the sqlite feature".to_string())),
    }
}

pub mod prelude {
    pub use super::backends::*;
    pub use super::{create_store, StorageBackend};
}
