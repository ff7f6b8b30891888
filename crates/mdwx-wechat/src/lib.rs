//! WeChat Official Account REST API client.
//!
//! Provides a sync HTTP client for the WeChat `cgi-bin` API surface this
//! workspace publishes through: access-token refresh, image and cover
//! material upload, draft creation, and free-publish submission.
//!
//! The client implements [`mdwx_renderer::MediaUploader`], so it plugs
//! directly into the image extension's before-publish uploads; draft and
//! publish calls are made by the article workflow, never by render
//! extensions.

mod client;
mod error;
mod types;
mod uploader;

pub use client::WeChatClient;
pub use error::WeChatError;
pub use types::{ArticleData, DraftResponse, PublishResponse, TokenResponse, UploadResponse};
