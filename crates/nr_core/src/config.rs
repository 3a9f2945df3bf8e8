use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::{Error, Result};

pub const DEFAULT_NEWS_API_BASE_URL: &str = "https://newsdata.io";
pub const DEFAULT_LANGUAGE: &str = "en";
pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const DEFAULT_MOCK_LATENCY: Duration = Duration::from_millis(500);
pub const DEFAULT_SEARCH_DEBOUNCE: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageKind {
    #[default]
    Memory,
    Sqlite,
}

impl FromStr for StorageKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "memory" => Ok(StorageKind::Memory),
            "sqlite" => Ok(StorageKind::Sqlite),
            other => Err(Error::Config(format!("unknown storage backend: {}", other))),
        }
    }
}

impl fmt::Display for StorageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageKind::Memory => f.write_str("memory"),
            StorageKind::Sqlite => f.write_str("sqlite"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceMode {
    Live,
    Mock,
}

#[derive(Clone)]
pub struct ReaderConfig {
    pub news_api_key: Option<String>,
    pub news_api_base_url: String,
    pub language: String,
    pub page_size: u32,
    pub mock_latency: Duration,
    pub search_debounce: Duration,
    pub storage: StorageKind,
    pub database_path: PathBuf,
}

impl fmt::Debug for ReaderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReaderConfig")
            .field("news_api_key", &self.news_api_key.as_deref().map(|_| "<redacted>"))
            .field("news_api_base_url", &self.news_api_base_url)
            .field("language", &self.language)
            .field("page_size", &self.page_size)
            .field("mock_latency", &self.mock_latency)
            .field("search_debounce", &self.search_debounce)
            .field("storage", &self.storage)
            .field("database_path", &self.database_path)
            .finish()
    }
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            news_api_key: None,
            news_api_base_url: DEFAULT_NEWS_API_BASE_URL.to_string(),
            language: DEFAULT_LANGUAGE.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            mock_latency: DEFAULT_MOCK_LATENCY,
            search_debounce: DEFAULT_SEARCH_DEBOUNCE,
            storage: StorageKind::default(),
            database_path: PathBuf::from("nr.db"),
        }
    }
}

impl ReaderConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        config.news_api_key = lookup("NEWS_API_KEY");
        if let Some(url) = lookup("NEWS_API_BASE_URL") {
            url::Url::parse(&url).map_err(|e| Error::InvalidUrl(format!("{}: {}", url, e)))?;
            config.news_api_base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(storage) = lookup("NR_STORAGE") {
            config.storage = storage.parse()?;
        }
        if let Some(path) = lookup("NR_DATABASE_PATH") {
            config.database_path = PathBuf::from(path);
        }
        Ok(config)
    }

    pub fn with_api_key(mut self, key: Option<String>) -> Self {
        if key.is_some() {
            self.news_api_key = key;
        }
        self
    }

    /// A blank key counts as no key.
    pub fn api_key(&self) -> Option<&str> {
        self.news_api_key.as_deref().map(str::trim).filter(|k| !k.is_empty())
    }

    pub fn source_mode(&self) -> SourceMode {
        if self.api_key().is_some() {
            SourceMode::Live
        } else {
            SourceMode::Mock
        }
    }
}
