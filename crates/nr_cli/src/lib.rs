pub mod cli;
pub mod logging;
pub mod output;

pub use cli::{BookmarkCommands, Cli, Commands};
