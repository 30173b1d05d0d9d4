//! Auth module.
//!
//! Credentials are obtained through the [`CredentialProvider`]
//! capability. The OAuth implementation caches tokens on disk,
//! refreshes them when they expire and falls back to the interactive
//! authorization flow when nothing usable is cached.

mod error;
pub mod flow;
pub mod provider;
pub mod token;

use async_trait::async_trait;
use log::{debug, info};

pub use self::error::{Error, Result};
use self::flow::OAuthFlow;
pub use self::token::{Credential, TokenStore};

/// Capability of obtaining a valid credential.
#[async_trait]
pub trait CredentialProvider {
    async fn obtain_credential(&self) -> Result<Credential>;
}

/// OAuth 2.0 credential provider backed by a token file.
pub struct OAuthCredentialProvider {
    flow: OAuthFlow,
    store: TokenStore,
}

impl OAuthCredentialProvider {
    pub fn new(flow: OAuthFlow, store: TokenStore) -> Self {
        Self { flow, store }
    }
}

#[async_trait]
impl CredentialProvider for OAuthCredentialProvider {
    async fn obtain_credential(&self) -> Result<Credential> {
        let credential = match self.store.load()? {
            Some(credential) if !credential.is_expired() => {
                debug!("using cached credential from {}", self.store.path().display());
                return Ok(credential);
            }
            Some(credential) if credential.refresh_token.is_some() => {
                info!("access token expired, refreshing it");
                self.flow.refresh(&credential).await?
            }
            _ => {
                info!("no valid credential found, starting authorization flow");
                self.flow.execute().await?
            }
        };

        self.store.save(&credential)?;
        Ok(credential)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use tempfile::tempdir;

    use super::{
        flow::OAuthFlow, provider::AuthProvider, Credential, CredentialProvider,
        OAuthCredentialProvider, TokenStore,
    };

    #[tokio::test]
    async fn test_obtain_cached_credential() {
        let dir = tempdir().unwrap();
        let store = TokenStore::new(dir.path().join("token.json"));

        let credential = Credential {
            access_token: "at".into(),
            refresh_token: Some("rt".into()),
            expires_at: Some(Utc::now() + Duration::hours(1)),
        };
        store.save(&credential).unwrap();

        let flow = OAuthFlow::new(AuthProvider::Gmail, "id".into(), "secret".into());
        let provider = OAuthCredentialProvider::new(flow, store);

        assert_eq!(provider.obtain_credential().await.unwrap(), credential);
    }
}
