use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
pub use tabmark_core::StorageError;

/// Convert a transport failure into a `StorageError`.
pub(crate) fn request_failed(operation: &str, err: reqwest::Error) -> StorageError {
    StorageError::Network(format!("{} request failed: {}", operation, err))
}

/// Convert a non-success HTTP status into a `StorageError`.
pub(crate) fn status_error(operation: &str, status: StatusCode, body: &str) -> StorageError {
    let msg = format!("{} failed with status {}: {}", operation, status, body);
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => StorageError::Auth(msg),
        _ => StorageError::Remote(msg),
    }
}

/// Pass successful responses through, turn the rest into errors.
pub(crate) async fn check_status(
    operation: &str,
    response: Response,
) -> Result<Response, StorageError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let text = response.text().await.unwrap_or_default();
    Err(status_error(operation, status, &text))
}

/// Check the status and decode a JSON body.
pub(crate) async fn read_json<T: DeserializeOwned>(
    operation: &str,
    response: Response,
) -> Result<T, StorageError> {
    check_status(operation, response)
        .await?
        .json::<T>()
        .await
        .map_err(|e| StorageError::Parse(format!("{} returned unexpected body: {}", operation, e)))
}
