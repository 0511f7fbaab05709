use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use tabmark_core::{AuthProvider, CredentialStore, StorageError, StoredCredential};
use tracing::{debug, info, instrument, warn};

use crate::client::DriveClient;

/// A cached credential is trusted only while it has more than this left.
pub const EXPIRY_BUFFER_MS: i64 = 5 * 60 * 1000;

/// Lifetime assumed when the identity flow does not report one.
pub const DEFAULT_EXPIRES_IN_SECS: u64 = 3600;

/// Access token handed out by an interactive identity flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenGrant {
    pub access_token: String,
    /// Seconds until expiry, if reported.
    pub expires_in: Option<u64>,
}

/// The interactive consent flow that yields a bearer token.
#[async_trait]
pub trait TokenSource: Send + Sync {
    /// Prompt the user and return a fresh grant.
    async fn request_token(&self) -> Result<TokenGrant, StorageError>;
}

/// Token source backed by a pre-issued token (e.g. from configuration).
#[derive(Debug, Clone, Default)]
pub struct StaticTokenSource {
    grant: Option<TokenGrant>,
}

impl StaticTokenSource {
    pub fn new(access_token: Option<String>, expires_in: Option<u64>) -> Self {
        Self {
            grant: access_token.map(|access_token| TokenGrant {
                access_token,
                expires_in,
            }),
        }
    }
}

#[async_trait]
impl TokenSource for StaticTokenSource {
    async fn request_token(&self) -> Result<TokenGrant, StorageError> {
        self.grant
            .clone()
            .ok_or_else(|| StorageError::Auth("no access token configured".to_string()))
    }
}

/// OAuth bearer-token lifecycle for Google Drive.
///
/// The token lives in memory while signed in and is cached in a
/// `CredentialStore` with its expiry so the next session can re-authenticate
/// silently.
pub struct DriveAuth {
    client: DriveClient,
    credentials: Arc<dyn CredentialStore>,
    token_source: Arc<dyn TokenSource>,
    access_token: RwLock<Option<String>>,
}

impl std::fmt::Debug for DriveAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DriveAuth")
            .field("client", &self.client)
            .field("signed_in", &self.is_authenticated())
            .finish_non_exhaustive()
    }
}

impl DriveAuth {
    pub fn new(
        client: DriveClient,
        credentials: Arc<dyn CredentialStore>,
        token_source: Arc<dyn TokenSource>,
    ) -> Self {
        Self {
            client,
            credentials,
            token_source,
            access_token: RwLock::new(None),
        }
    }

    /// Current bearer token, if signed in.
    pub fn bearer(&self) -> Option<String> {
        self.access_token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set_bearer(&self, token: Option<String>) -> Option<String> {
        let mut guard = self
            .access_token
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *guard, token)
    }

    fn clear_cached(&self) {
        if let Err(e) = self.credentials.clear_credential() {
            warn!("Failed to clear cached credential: {}", e);
        }
    }

    /// Cached token with more than the expiry buffer left. Stale ones are dropped.
    fn load_cached_token(&self) -> Option<String> {
        let credential = self.credentials.load_credential()?;
        let now = chrono::Utc::now().timestamp_millis();
        if credential.is_valid_for(now, EXPIRY_BUFFER_MS) {
            Some(credential.token)
        } else {
            debug!("Cached credential expired, removing it");
            self.clear_cached();
            None
        }
    }
}

#[async_trait]
impl AuthProvider for DriveAuth {
    #[instrument(skip(self), level = "debug")]
    async fn authenticate(&self) -> bool {
        let Some(token) = self.load_cached_token() else {
            debug!("No usable cached credential");
            return false;
        };

        match self.client.validate_token(&token).await {
            Ok(()) => {
                self.set_bearer(Some(token));
                info!("Restored cached Drive credential");
                true
            }
            Err(StorageError::Auth(msg)) => {
                warn!("Cached credential rejected, removing it: {}", msg);
                self.clear_cached();
                false
            }
            Err(e) => {
                warn!("Could not validate cached credential: {}", e);
                false
            }
        }
    }

    #[instrument(skip(self), level = "debug")]
    async fn sign_in(&self) -> bool {
        let grant = match self.token_source.request_token().await {
            Ok(grant) => grant,
            Err(e) => {
                warn!("Sign-in failed: {}", e);
                return false;
            }
        };

        let credential = StoredCredential::from_grant(
            grant.access_token.clone(),
            grant.expires_in.unwrap_or(DEFAULT_EXPIRES_IN_SECS),
            chrono::Utc::now().timestamp_millis(),
        );
        if let Err(e) = self.credentials.save_credential(&credential) {
            warn!("Signed in, but failed to cache the credential: {}", e);
        }

        self.set_bearer(Some(grant.access_token));
        info!("Signed in to Google Drive");
        true
    }

    #[instrument(skip(self), level = "debug")]
    async fn sign_out(&self) {
        if let Some(token) = self.set_bearer(None) {
            if let Err(e) = self.client.revoke(&token).await {
                warn!("Failed to revoke token: {}", e);
            }
        }
        self.clear_cached();
        info!("Signed out of Google Drive");
    }

    fn is_authenticated(&self) -> bool {
        self.bearer().is_some()
    }
}
