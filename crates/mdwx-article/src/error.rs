//! Error types for article assembly and publishing.

use mdwx_renderer::{RenderError, UploadError};
use mdwx_store::StoreError;
use mdwx_wechat::WeChatError;

/// Error from the article workflow.
#[derive(Debug, thiserror::Error)]
pub enum ArticleError {
    /// Rendering failed.
    #[error(transparent)]
    Render(#[from] RenderError),

    /// WeChat API call failed.
    #[error(transparent)]
    WeChat(#[from] WeChatError),

    /// Cover upload failed.
    #[error(transparent)]
    Upload(#[from] UploadError),

    /// Note store access failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The note does not satisfy the publish invariant.
    #[error("cannot publish: {0}")]
    Validation(String),
}
