//! Error types for the WeChat API client.

use mdwx_store::StoreError;

/// Error from WeChat API operations.
#[derive(Debug, thiserror::Error)]
pub enum WeChatError {
    /// HTTP request failed (network error, timeout, etc).
    #[error("HTTP request failed")]
    Request(#[from] ureq::Error),

    /// HTTP response error (server returned error status).
    #[error("HTTP error: {status} - {body}")]
    HttpResponse {
        /// HTTP status code.
        status: u16,
        /// Response body (may contain error details).
        body: String,
    },

    /// WeChat error payload (`errcode`/`errmsg`) in an otherwise successful
    /// response.
    #[error("WeChat API error: {code} - {message}")]
    Api {
        /// WeChat error code.
        code: i64,
        /// WeChat error message.
        message: String,
    },

    /// Client constructed without appid/secret.
    #[error("WeChat appid and secret must be configured")]
    MissingCredentials,

    /// Local media could not be read from the note store.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// JSON serialization/deserialization error.
    #[error("JSON error")]
    Json(#[from] serde_json::Error),
}
