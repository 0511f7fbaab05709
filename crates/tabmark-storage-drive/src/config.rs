/// Production endpoint of the Drive v3 metadata API.
pub const GOOGLE_API_BASE: &str = "https://www.googleapis.com";
/// Production endpoint of the Drive v3 upload API.
pub const GOOGLE_UPLOAD_BASE: &str = "https://www.googleapis.com/upload";
/// OAuth token revocation endpoint.
pub const GOOGLE_REVOKE_URL: &str = "https://oauth2.googleapis.com/revoke";
/// Folder created inside the `appDataFolder` space.
pub const APP_FOLDER_NAME: &str = "BookmarkerApp";

/// Endpoints and naming for the Drive backend.
///
/// The bases are overridable so tests can point the client at a mock server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriveConfig {
    pub api_base: String,
    pub upload_base: String,
    pub revoke_url: String,
    pub app_folder_name: String,
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            api_base: GOOGLE_API_BASE.to_string(),
            upload_base: GOOGLE_UPLOAD_BASE.to_string(),
            revoke_url: GOOGLE_REVOKE_URL.to_string(),
            app_folder_name: APP_FOLDER_NAME.to_string(),
        }
    }
}

impl DriveConfig {
    /// Point both API bases at one server (metadata under `/drive`, media under `/upload/drive`).
    pub fn with_base(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            api_base: base.to_string(),
            upload_base: format!("{}/upload", base),
            revoke_url: format!("{}/revoke", base),
            ..Self::default()
        }
    }

    /// Metadata collection URL.
    pub fn files_url(&self) -> String {
        format!("{}/drive/v3/files", self.api_base)
    }

    /// Metadata URL of one file.
    pub fn file_url(&self, file_id: &str) -> String {
        format!("{}/{}", self.files_url(), file_id)
    }

    /// Media upload URL of one file.
    pub fn upload_url(&self, file_id: &str) -> String {
        format!("{}/drive/v3/files/{}", self.upload_base, file_id)
    }

    /// Account endpoint used to validate a bearer token.
    pub fn about_url(&self) -> String {
        format!("{}/drive/v3/about", self.api_base)
    }
}
