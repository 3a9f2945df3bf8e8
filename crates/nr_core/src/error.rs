use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The document store could not be reached or refused the operation.
    #[error("Storage error: {0}")]
    Storage(String),

    /// The news provider answered with a non-success status.
    #[error("News API error ({status}): {message}")]
    RemoteApi { status: u16, message: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Sign in required")]
    Unauthenticated,

    /// A conditional write lost against a concurrent writer.
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("External error: {0}")]
    External(#[from] anyhow::Error),
}

impl Error {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }

    /// HTTP status carried by a provider error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::RemoteApi { status, .. } => Some(*status),
            Error::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        self.status() == Some(429)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_api_status() {
        let err = Error::RemoteApi { status: 429, message: "Rate limit exceeded".to_string() };
        assert_eq!(err.status(), Some(429));
        assert!(err.is_rate_limited());
        assert_eq!(err.to_string(), "News API error (429): Rate limit exceeded");
    }

    #[test]
    fn test_not_found() {
        assert!(Error::NotFound("post_interactions/abc".to_string()).is_not_found());
        assert!(!Error::Unauthenticated.is_not_found());
        assert_eq!(Error::Storage("down".to_string()).status(), None);
    }
}
