//! Request and response payloads for the WeChat API.

use serde::{Deserialize, Serialize};

/// Response from the access-token endpoint.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    /// Fresh access token on success.
    pub access_token: Option<String>,
    /// Token lifetime in seconds.
    pub expires_in: Option<u64>,
    /// WeChat error code on failure.
    pub errcode: Option<i64>,
    /// WeChat error message on failure.
    pub errmsg: Option<String>,
}

/// Response from image and material upload endpoints.
#[derive(Debug, Deserialize)]
pub struct UploadResponse {
    /// Media id (material uploads).
    pub media_id: Option<String>,
    /// Hosted URL (image uploads).
    pub url: Option<String>,
    /// WeChat error code on failure.
    pub errcode: Option<i64>,
    /// WeChat error message on failure.
    pub errmsg: Option<String>,
}

/// Response from draft creation.
#[derive(Debug, Deserialize)]
pub struct DraftResponse {
    /// Draft media id on success.
    pub media_id: Option<String>,
    /// WeChat error code on failure.
    pub errcode: Option<i64>,
    /// WeChat error message on failure.
    pub errmsg: Option<String>,
}

/// Response from free-publish submission.
#[derive(Debug, Deserialize)]
pub struct PublishResponse {
    /// Publish task id on success.
    pub publish_id: Option<String>,
    /// WeChat result code (`0` means accepted).
    pub errcode: Option<i64>,
    /// WeChat error message on failure.
    pub errmsg: Option<String>,
}

/// One article as submitted to the draft endpoint.
///
/// Field names are the WeChat JSON contract. Built once per publish
/// attempt by the article workflow and not persisted.
#[derive(Clone, Debug, Serialize)]
pub struct ArticleData {
    /// Article title (required, non-empty).
    pub title: String,
    /// Author byline.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// Summary shown in feeds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
    /// Rendered article HTML.
    pub content: String,
    /// "Read the original" source link.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_source_url: Option<String>,
    /// Cover image media id (required).
    pub thumb_media_id: String,
    /// Whether the cover renders inside the article body.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_cover_pic: Option<u8>,
    /// Whether comments are open.
    pub need_open_comment: u8,
    /// Whether only followers may comment.
    pub only_fans_can_comment: u8,
}
