use std::sync::Arc;

use async_trait::async_trait;
use tabmark_core::{BookmarkDocument, RemoteStore, StorageError};
use tracing::{debug, instrument};

use crate::auth::DriveAuth;
use crate::client::DriveClient;

/// Remote store keeping each document as one JSON file in Drive's app data.
///
/// Layout in the `appDataFolder` space:
/// ```text
/// appDataFolder/
///   BookmarkerApp/
///     {key}              # e.g. bookmarks.json
/// ```
#[derive(Debug, Clone)]
pub struct DriveRemoteStore {
    client: DriveClient,
    auth: Arc<DriveAuth>,
}

impl DriveRemoteStore {
    pub fn new(client: DriveClient, auth: Arc<DriveAuth>) -> Self {
        Self { client, auth }
    }

    fn token(&self) -> Result<String, StorageError> {
        self.auth.bearer().ok_or(StorageError::Unauthenticated)
    }
}

#[async_trait]
impl RemoteStore for DriveRemoteStore {
    fn backend_name(&self) -> &'static str {
        "google-drive"
    }

    #[instrument(skip(self), level = "debug")]
    async fn load(&self, key: &str) -> Result<Option<BookmarkDocument>, StorageError> {
        let token = self.token()?;

        let Some(folder_id) = self.client.find_app_folder(&token).await? else {
            debug!("No app folder yet, remote is empty");
            return Ok(None);
        };
        let Some(file_id) = self.client.find_file(&token, &folder_id, key).await? else {
            debug!("No {} in app folder, remote is empty", key);
            return Ok(None);
        };

        let body = self.client.download(&token, &file_id).await?;
        // A file created without its content (interrupted first save) holds nothing yet.
        if body.trim().is_empty() {
            debug!("Remote {} is empty", key);
            return Ok(None);
        }
        let doc = BookmarkDocument::decode(&body)?;
        debug!("Loaded remote {} with {} tabs", key, doc.tabs.len());
        Ok(Some(doc))
    }

    #[instrument(skip(self, doc), level = "debug", fields(tabs = doc.tabs.len()))]
    async fn save(&self, key: &str, doc: &BookmarkDocument) -> Result<(), StorageError> {
        let token = self.token()?;
        let body = doc.encode()?;

        let folder_id = self.client.ensure_app_folder(&token).await?;
        let file_id = match self.client.find_file(&token, &folder_id, key).await? {
            Some(id) => id,
            None => self.client.create_file(&token, &folder_id, key).await?,
        };

        self.client.upload(&token, &file_id, body).await?;
        debug!("Saved remote {} with {} tabs", key, doc.tabs.len());
        Ok(())
    }
}
