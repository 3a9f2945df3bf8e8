use nr_core::{ArticleSource, ReaderConfig, Result, SourceMode};
use std::sync::Arc;
use tracing::{info, warn};

pub mod live;
pub mod mock;
pub mod newsdata;
pub mod normalize;

pub use live::LiveNewsSource;
pub use mock::MockNewsSource;

/// Picks the live API when a key is configured, the mock dataset otherwise.
pub fn create_source(config: &ReaderConfig) -> Result<Arc<dyn ArticleSource>> {
    let source: Arc<dyn ArticleSource> = match config.source_mode() {
        SourceMode::Live => Arc::new(LiveNewsSource::new(config)?),
        SourceMode::Mock => {
            warn!("News API key not found, serving mock articles");
            Arc::new(MockNewsSource::new(config.mock_latency))
        }
    };
    info!("📰 Article source initialized (using {})", source.name());
    Ok(source)
}

pub mod prelude {
    pub use super::{create_source, LiveNewsSource, MockNewsSource};
    pub use nr_core::{Article, ArticleSource, Error, Result};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_source_by_mode() {
        let mock = create_source(&ReaderConfig::default()).unwrap();
        assert_eq!(mock.name(), "mock");

        let live = create_source(&ReaderConfig::default().with_api_key(Some("pub_1".to_string()))).unwrap();
        assert_eq!(live.name(), "newsdata.io");
    }
}
