use async_trait::async_trait;
use tokio::sync::watch;

use crate::types::Session;
use crate::Result;

/// A sign-in assertion from an external provider (e.g. "google").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FederatedCredential {
    pub provider: String,
    /// Provider-side stable user id.
    pub subject: String,
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn sign_in_with_email(&self, email: &str, password: &str) -> Result<Session>;

    async fn sign_up(&self, name: Option<&str>, email: &str, password: &str) -> Result<Session>;

    async fn sign_in_with_provider(&self, credential: &FederatedCredential) -> Result<Session>;

    async fn sign_in_anonymously(&self) -> Result<Session>;

    async fn sign_out(&self) -> Result<()>;

    /// Updates the signed-in user's profile and returns the refreshed identity.
    async fn update_profile(&self, update: &ProfileUpdate) -> Result<Session>;

    /// Auth state changes. The current value is the signed-in identity, if any.
    fn subscribe(&self) -> watch::Receiver<Option<Session>>;
}
