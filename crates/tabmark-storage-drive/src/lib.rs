//! Google Drive backend for tabmark.
//!
//! - `DriveClient`: thin REST client over the Drive v3 `appDataFolder` space
//! - `DriveAuth`: `AuthProvider` caching the OAuth bearer token with its expiry
//! - `DriveRemoteStore`: `RemoteStore` keeping the document as one JSON file

mod auth;
mod client;
mod config;
mod error;
mod remote;

pub use auth::{
    DriveAuth, StaticTokenSource, TokenGrant, TokenSource, DEFAULT_EXPIRES_IN_SECS,
    EXPIRY_BUFFER_MS,
};
pub use client::DriveClient;
pub use config::{
    DriveConfig, APP_FOLDER_NAME, GOOGLE_API_BASE, GOOGLE_REVOKE_URL, GOOGLE_UPLOAD_BASE,
};
pub use remote::DriveRemoteStore;
