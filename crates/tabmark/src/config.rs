use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tabmark_storage_drive::{DriveConfig, GOOGLE_API_BASE, GOOGLE_REVOKE_URL, GOOGLE_UPLOAD_BASE};
use tabmark_storage_local::DEFAULT_QUOTA_BYTES;

/// Configuration for the tabmark host.
#[derive(Parser, Debug, Clone)]
#[command(name = "tabmark")]
#[command(about = "Tabbed bookmarks stored locally and synced to Google Drive")]
pub struct Config {
    /// Directory holding the local bookmark and credential slots
    #[arg(long, env = "TABMARK_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Local storage quota in bytes (0 disables the check)
    #[arg(long, default_value_t = DEFAULT_QUOTA_BYTES, env = "TABMARK_QUOTA_BYTES")]
    pub quota_bytes: u64,

    /// Drive metadata API base URL
    #[arg(long, default_value = GOOGLE_API_BASE, env = "TABMARK_DRIVE_API_BASE")]
    pub drive_api_base: String,

    /// Drive media upload base URL
    #[arg(long, default_value = GOOGLE_UPLOAD_BASE, env = "TABMARK_DRIVE_UPLOAD_BASE")]
    pub drive_upload_base: String,

    /// OAuth token revocation URL
    #[arg(long, default_value = GOOGLE_REVOKE_URL, env = "TABMARK_OAUTH_REVOKE_URL")]
    pub oauth_revoke_url: String,

    /// Access token handed over by the identity flow, used by `sign-in`
    #[arg(long, env = "TABMARK_ACCESS_TOKEN", hide_env_values = true)]
    pub access_token: Option<String>,

    /// Lifetime of the access token in seconds
    #[arg(long, env = "TABMARK_EXPIRES_IN")]
    pub expires_in: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Print every tab and its bookmarks
    Show,
    /// Create a tab and make it active
    AddTab { name: String },
    /// Delete a tab and its bookmarks
    DeleteTab { tab_id: String },
    /// Make a tab active
    SelectTab { tab_id: String },
    /// Add a bookmark to the active tab (or to --tab)
    AddBookmark {
        name: String,
        url: String,
        #[arg(long)]
        tab: Option<String>,
    },
    /// Remove a bookmark from the active tab (or from --tab)
    DeleteBookmark {
        bookmark_id: String,
        #[arg(long)]
        tab: Option<String>,
    },
    /// Sign in to Google Drive and sync
    SignIn,
    /// Sign out of Google Drive; local bookmarks are kept
    SignOut,
}

impl Config {
    /// Get the effective data directory.
    pub fn effective_data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(|| {
            dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("tabmark")
        })
    }

    pub fn quota(&self) -> Option<u64> {
        (self.quota_bytes > 0).then_some(self.quota_bytes)
    }

    pub fn drive_config(&self) -> DriveConfig {
        DriveConfig {
            api_base: self.drive_api_base.trim_end_matches('/').to_string(),
            upload_base: self.drive_upload_base.trim_end_matches('/').to_string(),
            revoke_url: self.oauth_revoke_url.clone(),
            ..DriveConfig::default()
        }
    }
}
