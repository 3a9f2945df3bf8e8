use async_trait::async_trait;
use nr_core::{Error, FederatedCredential, IdentityProvider, ProfileUpdate, Result, Session};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt;
use tokio::sync::{watch, Mutex};
use uuid::Uuid;

pub const MIN_PASSWORD_LEN: usize = 6;
pub const GUEST_NAME: &str = "Guest";

struct Account {
    session: Session,
    salt: String,
    password_hash: String,
}

fn hash_password(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[derive(Default)]
struct Directory {
    /// keyed by lowercase email
    accounts: HashMap<String, Account>,
    /// `provider:subject` -> session
    federated: HashMap<String, Session>,
}

/// Identity provider that keeps its accounts in process. Stands behind the
/// same trait a hosted provider would.
pub struct LocalIdentityProvider {
    directory: Mutex<Directory>,
    current: watch::Sender<Option<Session>>,
}

impl fmt::Debug for LocalIdentityProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalIdentityProvider")
            .field("current", &self.current.borrow().as_ref().map(|s| s.uid.clone()))
            .finish()
    }
}

impl Default for LocalIdentityProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalIdentityProvider {
    pub fn new() -> Self {
        let (current, _) = watch::channel(None);
        Self { directory: Mutex::new(Directory::default()), current }
    }

    fn publish(&self, session: &Session) {
        self.current.send_replace(Some(session.clone()));
    }
}

fn validate_credentials(email: &str, password: &str) -> Result<String> {
    let email = email.trim().to_lowercase();
    if !email.contains('@') || email.starts_with('@') || email.ends_with('@') {
        return Err(Error::Auth(format!("invalid email: {}", email)));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(Error::Auth(format!("password must be at least {} characters", MIN_PASSWORD_LEN)));
    }
    Ok(email)
}

#[async_trait]
impl IdentityProvider for LocalIdentityProvider {
    fn name(&self) -> &str {
        "local"
    }

    async fn sign_in_with_email(&self, email: &str, password: &str) -> Result<Session> {
        let email = email.trim().to_lowercase();
        let directory = self.directory.lock().await;
        let account = directory
            .accounts
            .get(&email)
            .filter(|a| a.password_hash == hash_password(&a.salt, password))
            .ok_or_else(|| Error::Auth("invalid email or password".to_string()))?;
        let session = account.session.clone();
        drop(directory);
        self.publish(&session);
        Ok(session)
    }

    async fn sign_up(&self, name: Option<&str>, email: &str, password: &str) -> Result<Session> {
        let email = validate_credentials(email, password)?;
        let mut directory = self.directory.lock().await;
        if directory.accounts.contains_key(&email) {
            return Err(Error::Auth(format!("email already in use: {}", email)));
        }

        let salt = Uuid::new_v4().to_string();
        let session = Session {
            uid: Uuid::new_v4().to_string(),
            display_name: name.map(str::trim).filter(|n| !n.is_empty()).map(str::to_string),
            email: Some(email.clone()),
            avatar_url: None,
            is_anonymous: false,
        };
        directory.accounts.insert(
            email,
            Account { session: session.clone(), password_hash: hash_password(&salt, password), salt },
        );
        drop(directory);
        self.publish(&session);
        Ok(session)
    }

    async fn sign_in_with_provider(&self, credential: &FederatedCredential) -> Result<Session> {
        if credential.provider.trim().is_empty() || credential.subject.trim().is_empty() {
            return Err(Error::Auth("federated credential is incomplete".to_string()));
        }
        let key = format!("{}:{}", credential.provider.to_lowercase(), credential.subject);
        let mut directory = self.directory.lock().await;
        let session = directory
            .federated
            .entry(key)
            .or_insert_with(|| Session {
                uid: Uuid::new_v4().to_string(),
                display_name: None,
                email: None,
                avatar_url: None,
                is_anonymous: false,
            });
        // the provider's profile wins over what we saw last time
        if credential.display_name.is_some() {
            session.display_name = credential.display_name.clone();
        }
        if credential.email.is_some() {
            session.email = credential.email.clone();
        }
        if credential.avatar_url.is_some() {
            session.avatar_url = credential.avatar_url.clone();
        }
        let session = session.clone();
        drop(directory);
        self.publish(&session);
        Ok(session)
    }

    async fn sign_in_anonymously(&self) -> Result<Session> {
        let session = Session {
            uid: Uuid::new_v4().to_string(),
            display_name: Some(GUEST_NAME.to_string()),
            email: None,
            avatar_url: None,
            is_anonymous: true,
        };
        self.publish(&session);
        Ok(session)
    }

    async fn sign_out(&self) -> Result<()> {
        self.current.send_replace(None);
        Ok(())
    }

    async fn update_profile(&self, update: &ProfileUpdate) -> Result<Session> {
        let mut session = self
            .current
            .borrow()
            .clone()
            .ok_or(Error::Unauthenticated)?;
        if let Some(name) = &update.display_name {
            session.display_name = Some(name.clone());
        }
        if let Some(avatar) = &update.avatar_url {
            session.avatar_url = Some(avatar.clone());
        }

        let mut directory = self.directory.lock().await;
        if let Some(account) = directory.accounts.values_mut().find(|a| a.session.uid == session.uid) {
            account.session = session.clone();
        }
        if let Some(federated) = directory.federated.values_mut().find(|s| s.uid == session.uid) {
            *federated = session.clone();
        }
        drop(directory);
        self.publish(&session);
        Ok(session)
    }

    fn subscribe(&self) -> watch::Receiver<Option<Session>> {
        self.current.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sign_up_then_sign_in() {
        let provider = LocalIdentityProvider::new();
        let created = provider.sign_up(Some("Ana"), "Ana@Example.com", "hunter22").await.unwrap();
        assert_eq!(created.display_name.as_deref(), Some("Ana"));
        assert_eq!(created.email.as_deref(), Some("ana@example.com"));

        provider.sign_out().await.unwrap();
        assert!(provider.subscribe().borrow().is_none());

        let signed_in = provider.sign_in_with_email("ana@example.com", "hunter22").await.unwrap();
        assert_eq!(signed_in.uid, created.uid);
        assert_eq!(provider.subscribe().borrow().as_ref().map(|s| s.uid.clone()), Some(created.uid));
    }

    #[tokio::test]
    async fn test_rejects_bad_credentials() {
        let provider = LocalIdentityProvider::new();
        provider.sign_up(None, "bo@example.com", "secret1").await.unwrap();

        assert!(matches!(provider.sign_in_with_email("bo@example.com", "wrong!!").await, Err(Error::Auth(_))));
        assert!(matches!(provider.sign_up(None, "bo@example.com", "another1").await, Err(Error::Auth(_))));
        assert!(matches!(provider.sign_up(None, "not-an-email", "secret1").await, Err(Error::Auth(_))));
        assert!(matches!(provider.sign_up(None, "cy@example.com", "123").await, Err(Error::Auth(_))));
    }

    #[tokio::test]
    async fn test_anonymous_and_federated() {
        let provider = LocalIdentityProvider::new();
        let guest = provider.sign_in_anonymously().await.unwrap();
        assert!(guest.is_anonymous);
        assert_eq!(guest.display_name.as_deref(), Some(GUEST_NAME));

        let credential = FederatedCredential {
            provider: "google".to_string(),
            subject: "1234".to_string(),
            display_name: Some("Dee".to_string()),
            email: Some("dee@example.com".to_string()),
            avatar_url: None,
        };
        let first = provider.sign_in_with_provider(&credential).await.unwrap();
        let second = provider.sign_in_with_provider(&credential).await.unwrap();
        assert_eq!(first.uid, second.uid);
        assert!(!first.is_anonymous);
    }

    #[tokio::test]
    async fn test_update_profile() {
        let provider = LocalIdentityProvider::new();
        assert!(matches!(provider.update_profile(&ProfileUpdate::default()).await, Err(Error::Unauthenticated)));

        provider.sign_up(None, "ed@example.com", "secret1").await.unwrap();
        let update = ProfileUpdate { display_name: Some("Ed".to_string()), avatar_url: None };
        provider.update_profile(&update).await.unwrap();
        provider.sign_out().await.unwrap();

        let again = provider.sign_in_with_email("ed@example.com", "secret1").await.unwrap();
        assert_eq!(again.display_name.as_deref(), Some("Ed"));
    }
}
