use reqwest::Client as HttpClient;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, instrument};

use crate::config::DriveConfig;
use crate::error::{check_status, read_json, request_failed, StorageError};

const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";
const APP_DATA_SPACE: &str = "appDataFolder";

#[derive(Debug, Deserialize)]
struct FileList {
    #[serde(default)]
    files: Vec<DriveFile>,
}

#[derive(Debug, Deserialize)]
struct DriveFile {
    id: String,
}

/// Search query for the application folder.
pub(crate) fn folder_query(folder_name: &str) -> String {
    format!(
        "name='{}' and '{}' in parents and mimeType='{}'",
        folder_name, APP_DATA_SPACE, FOLDER_MIME_TYPE
    )
}

/// Search query for a named file inside a folder.
pub(crate) fn file_query(folder_id: &str, name: &str) -> String {
    format!("name='{}' and '{}' in parents", name, folder_id)
}

/// Google Drive v3 REST client scoped to the `appDataFolder` space.
///
/// Every call takes the bearer token explicitly; token lifecycle lives in
/// [`crate::DriveAuth`].
#[derive(Debug, Clone)]
pub struct DriveClient {
    http_client: HttpClient,
    config: DriveConfig,
}

impl DriveClient {
    /// Create a new Drive client.
    pub fn new(config: DriveConfig) -> Self {
        Self {
            http_client: HttpClient::new(),
            config,
        }
    }

    pub fn config(&self) -> &DriveConfig {
        &self.config
    }

    /// Return the id of the first file matching `query`.
    async fn find_one(&self, token: &str, query: &str) -> Result<Option<String>, StorageError> {
        let response = self
            .http_client
            .get(self.config.files_url())
            .bearer_auth(token)
            .query(&[
                ("q", query),
                ("spaces", APP_DATA_SPACE),
                ("fields", "files(id,name)"),
            ])
            .send()
            .await
            .map_err(|e| request_failed("Drive file search", e))?;

        let list: FileList = read_json("Drive file search", response).await?;
        Ok(list.files.into_iter().next().map(|f| f.id))
    }

    /// Look up the application folder.
    #[instrument(skip(self, token), level = "debug")]
    pub async fn find_app_folder(&self, token: &str) -> Result<Option<String>, StorageError> {
        let folder = self
            .find_one(token, &folder_query(&self.config.app_folder_name))
            .await?;
        debug!("App folder lookup: {:?}", folder);
        Ok(folder)
    }

    /// Look up the application folder, creating it when missing.
    #[instrument(skip(self, token), level = "debug")]
    pub async fn ensure_app_folder(&self, token: &str) -> Result<String, StorageError> {
        if let Some(id) = self.find_app_folder(token).await? {
            return Ok(id);
        }

        let metadata = json!({
            "name": self.config.app_folder_name,
            "mimeType": FOLDER_MIME_TYPE,
            "parents": [APP_DATA_SPACE],
        });

        let response = self
            .http_client
            .post(self.config.files_url())
            .bearer_auth(token)
            .json(&metadata)
            .send()
            .await
            .map_err(|e| request_failed("Drive folder create", e))?;

        let created: DriveFile = read_json("Drive folder create", response).await?;
        debug!("Created app folder {}", created.id);
        Ok(created.id)
    }

    /// Look up a named file inside a folder.
    #[instrument(skip(self, token), level = "debug")]
    pub async fn find_file(
        &self,
        token: &str,
        folder_id: &str,
        name: &str,
    ) -> Result<Option<String>, StorageError> {
        self.find_one(token, &file_query(folder_id, name)).await
    }

    /// Create an empty JSON file inside a folder and return its id.
    #[instrument(skip(self, token), level = "debug")]
    pub async fn create_file(
        &self,
        token: &str,
        folder_id: &str,
        name: &str,
    ) -> Result<String, StorageError> {
        let metadata = json!({
            "name": name,
            "parents": [folder_id],
            "mimeType": "application/json",
        });

        let response = self
            .http_client
            .post(self.config.files_url())
            .bearer_auth(token)
            .json(&metadata)
            .send()
            .await
            .map_err(|e| request_failed("Drive file create", e))?;

        let created: DriveFile = read_json("Drive file create", response).await?;
        debug!("Created file {} ({})", name, created.id);
        Ok(created.id)
    }

    /// Download a file's content.
    #[instrument(skip(self, token), level = "debug")]
    pub async fn download(&self, token: &str, file_id: &str) -> Result<String, StorageError> {
        let response = self
            .http_client
            .get(self.config.file_url(file_id))
            .bearer_auth(token)
            .query(&[("alt", "media")])
            .send()
            .await
            .map_err(|e| request_failed("Drive download", e))?;

        let body = check_status("Drive download", response)
            .await?
            .text()
            .await
            .map_err(|e| request_failed("Drive download", e))?;

        debug!("Downloaded {} ({} bytes)", file_id, body.len());
        Ok(body)
    }

    /// Replace a file's content.
    #[instrument(skip(self, token, body), level = "debug", fields(body_len = body.len()))]
    pub async fn upload(&self, token: &str, file_id: &str, body: String) -> Result<(), StorageError> {
        let len = body.len();
        let response = self
            .http_client
            .patch(self.config.upload_url(file_id))
            .bearer_auth(token)
            .query(&[("uploadType", "media")])
            .header("Content-Type", "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| request_failed("Drive upload", e))?;

        check_status("Drive upload", response).await?;
        debug!("Uploaded {} ({} bytes)", file_id, len);
        Ok(())
    }

    /// Check that the token is accepted by the account endpoint.
    #[instrument(skip(self, token), level = "debug")]
    pub async fn validate_token(&self, token: &str) -> Result<(), StorageError> {
        let response = self
            .http_client
            .get(self.config.about_url())
            .bearer_auth(token)
            .query(&[("fields", "user")])
            .send()
            .await
            .map_err(|e| request_failed("Token validation", e))?;

        check_status("Token validation", response).await?;
        Ok(())
    }

    /// Revoke a token at the OAuth server.
    #[instrument(skip(self, token), level = "debug")]
    pub async fn revoke(&self, token: &str) -> Result<(), StorageError> {
        let response = self
            .http_client
            .post(&self.config.revoke_url)
            .query(&[("token", token)])
            .send()
            .await
            .map_err(|e| request_failed("Token revoke", e))?;

        check_status("Token revoke", response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const TOKEN: &str = "ya29.test";

    async fn setup() -> (DriveClient, MockServer) {
        let server = MockServer::start().await;
        let client = DriveClient::new(DriveConfig::with_base(&server.uri()));
        (client, server)
    }

    #[tokio::test]
    async fn test_find_app_folder_sends_scoped_query() {
        let (client, server) = setup().await;

        Mock::given(method("GET"))
            .and(path("/drive/v3/files"))
            .and(header("Authorization", "Bearer ya29.test"))
            .and(query_param("q", folder_query("BookmarkerApp").as_str()))
            .and(query_param("spaces", "appDataFolder"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "files": [{ "id": "folder-1", "name": "BookmarkerApp" }] })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let folder = client.find_app_folder(TOKEN).await.unwrap();
        assert_eq!(folder.as_deref(), Some("folder-1"));
    }

    #[tokio::test]
    async fn test_ensure_app_folder_creates_when_missing() {
        let (client, server) = setup().await;

        Mock::given(method("GET"))
            .and(path("/drive/v3/files"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "files": [] })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/drive/v3/files"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "new-folder" })))
            .expect(1)
            .mount(&server)
            .await;

        let folder = client.ensure_app_folder(TOKEN).await.unwrap();
        assert_eq!(folder, "new-folder");
    }

    #[tokio::test]
    async fn test_download_and_upload() {
        let (client, server) = setup().await;

        Mock::given(method("GET"))
            .and(path("/drive/v3/files/file-1"))
            .and(query_param("alt", "media"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{\"tabs\":[]}"))
            .mount(&server)
            .await;
        Mock::given(method("PATCH"))
            .and(path("/upload/drive/v3/files/file-1"))
            .and(query_param("uploadType", "media"))
            .and(body_string("{\"tabs\":[]}"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "file-1" })))
            .expect(1)
            .mount(&server)
            .await;

        let body = client.download(TOKEN, "file-1").await.unwrap();
        assert_eq!(body, "{\"tabs\":[]}");
        client.upload(TOKEN, "file-1", body).await.unwrap();
    }

    #[tokio::test]
    async fn test_validate_token_rejected() {
        let (client, server) = setup().await;

        Mock::given(method("GET"))
            .and(path("/drive/v3/about"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid credentials"))
            .mount(&server)
            .await;

        let err = client.validate_token(TOKEN).await.unwrap_err();
        assert!(matches!(err, StorageError::Auth(_)));
    }

    #[tokio::test]
    async fn test_server_error_is_remote_error() {
        let (client, server) = setup().await;

        Mock::given(method("GET"))
            .and(path("/drive/v3/files"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = client.find_app_folder(TOKEN).await.unwrap_err();
        assert!(matches!(err, StorageError::Remote(_)));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_network_error() {
        let client = DriveClient::new(DriveConfig::with_base("http://127.0.0.1:1"));
        let err = client.find_app_folder(TOKEN).await.unwrap_err();
        assert!(matches!(err, StorageError::Network(_)));
    }
}
