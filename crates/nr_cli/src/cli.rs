use clap::{Parser, Subcommand};
use nr_core::{ReaderConfig, Result, StorageKind};
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "nr", author, version, about = "Read, search and bookmark the news", long_about = None)]
pub struct Cli {
    /// NewsData.io API key. Without one the mock articles are served.
    #[arg(long, env = "NEWS_API_KEY", hide_env_values = true)]
    pub news_api_key: Option<String>,
    #[arg(long, env = "NR_STORAGE")]
    pub storage: Option<StorageKind>,
    #[arg(long, env = "NR_DATABASE_PATH")]
    pub database_path: Option<PathBuf>,
    #[arg(short, long)]
    pub verbose: bool,
    /// Sign in with this account instead of as a guest.
    #[arg(long, requires = "password")]
    pub email: Option<String>,
    #[arg(long, requires = "email", hide = true, env = "NR_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Latest articles, optionally in one category.
    Feed {
        #[arg(long)]
        category: Option<String>,
    },
    Search {
        query: String,
        #[arg(long)]
        category: Option<String>,
        /// YYYY-MM-DD
        #[arg(long)]
        from: Option<String>,
        /// YYYY-MM-DD
        #[arg(long)]
        to: Option<String>,
        /// relevance, newest or oldest
        #[arg(long)]
        sort: Option<String>,
    },
    /// An article with its likes, comments and related articles.
    Post {
        id: String,
    },
    Like {
        id: String,
    },
    Comment {
        id: String,
        text: String,
    },
    Bookmarks {
        #[command(subcommand)]
        command: BookmarkCommands,
    },
    /// Serve the JSON API.
    Serve {
        #[arg(long, default_value = "127.0.0.1:3000")]
        addr: SocketAddr,
    },
}

#[derive(Subcommand, Debug)]
pub enum BookmarkCommands {
    List,
    Add { id: String },
    Remove { id: String },
}

impl Cli {
    /// Environment first, then whatever was given on the command line.
    pub fn reader_config(&self) -> Result<ReaderConfig> {
        let mut config = ReaderConfig::from_env()?.with_api_key(self.news_api_key.clone());
        if let Some(storage) = self.storage {
            config.storage = storage;
        }
        if let Some(path) = &self.database_path {
            config.database_path = path.clone();
        }
        Ok(config)
    }

    /// Whether the command acts as a user and needs a session first.
    pub fn needs_session(&self) -> bool {
        !matches!(self.command, Commands::Feed { .. } | Commands::Search { .. } | Commands::Serve { .. })
    }
}
