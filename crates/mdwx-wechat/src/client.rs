//! The WeChat API client: token refresh, media upload, drafts, publish.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use rand::RngExt;
use serde::de::DeserializeOwned;
use tracing::info;
use ureq::Agent;

use mdwx_store::NoteStore;

use crate::error::WeChatError;
use crate::types::{ArticleData, DraftResponse, PublishResponse, TokenResponse, UploadResponse};

/// Default HTTP timeout in seconds.
const DEFAULT_TIMEOUT: u64 = 30;

/// WeChat cgi-bin API base.
const DEFAULT_API_BASE: &str = "https://api.weixin.qq.com/cgi-bin";

/// Access token lifetime as documented by WeChat.
const TOKEN_LIFETIME: Duration = Duration::from_secs(7200);

/// Refresh this long before nominal expiry.
const TOKEN_REFRESH_BUFFER: Duration = Duration::from_secs(300);

struct CachedToken {
    token: String,
    fetched_at: Instant,
}

/// WeChat Official Account REST API client.
///
/// The client holds the note store so it can read local media bytes for
/// uploads; HTTP sources are fetched over the same agent. Access tokens
/// are cached and refreshed transparently.
pub struct WeChatClient {
    agent: Agent,
    base_url: String,
    app_id: String,
    secret: String,
    store: Arc<dyn NoteStore>,
    token: Mutex<Option<CachedToken>>,
}

impl WeChatClient {
    /// Create a client from account credentials.
    #[must_use]
    pub fn new(app_id: &str, secret: &str, store: Arc<dyn NoteStore>) -> Self {
        let agent = Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(DEFAULT_TIMEOUT)))
            .http_status_as_error(false)
            .build()
            .into();

        Self {
            agent,
            base_url: DEFAULT_API_BASE.to_owned(),
            app_id: app_id.to_owned(),
            secret: secret.to_owned(),
            store,
            token: Mutex::new(None),
        }
    }

    /// Override the API base URL (tests, proxies).
    #[must_use]
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_owned();
        self
    }

    /// Current access token, refreshing when missing or near expiry.
    fn access_token(&self) -> Result<String, WeChatError> {
        if self.app_id.is_empty() || self.secret.is_empty() {
            return Err(WeChatError::MissingCredentials);
        }

        let mut cached = self.token.lock().expect("token lock poisoned");
        if let Some(state) = cached.as_ref()
            && state.fetched_at.elapsed() < TOKEN_LIFETIME - TOKEN_REFRESH_BUFFER
        {
            return Ok(state.token.clone());
        }

        info!("refreshing access token");
        let url = format!(
            "{}/token?grant_type=client_credential&appid={}&secret={}",
            self.base_url, self.app_id, self.secret
        );
        let response = self.agent.get(&url).call()?;
        let resp: TokenResponse = read_json(response)?;

        match resp.access_token {
            Some(token) => {
                *cached = Some(CachedToken {
                    token: token.clone(),
                    fetched_at: Instant::now(),
                });
                Ok(token)
            }
            None => Err(api_error(resp.errcode, resp.errmsg)),
        }
    }

    /// Check connectivity and credentials with a token round-trip.
    pub fn test_connection(&self) -> Result<(), WeChatError> {
        self.access_token().map(|_| ())
    }

    /// Load media bytes from an HTTP URL or the note store.
    fn media_bytes(&self, source: &str) -> Result<Vec<u8>, WeChatError> {
        if source.starts_with("http") {
            let response = self.agent.get(source).call()?;
            Ok(response.into_body().read_to_vec()?)
        } else {
            let path = source.strip_prefix("./").unwrap_or(source);
            Ok(self.store.read_binary(path)?)
        }
    }

    /// Upload an article-body image. Returns the hosted URL.
    pub fn upload_image(&self, source: &str) -> Result<String, WeChatError> {
        let token = self.access_token()?;
        let data = self.media_bytes(source)?;
        let filename = source.rsplit('/').next().unwrap_or("image.png");

        info!("uploading image '{filename}'");
        let url = format!("{}/media/uploadimg?access_token={token}", self.base_url);
        let (boundary, body) = multipart_body(filename, content_type_for(filename), &data);

        let response = self
            .agent
            .post(&url)
            .header(
                "Content-Type",
                &format!("multipart/form-data; boundary={boundary}"),
            )
            .header("Accept", "application/json")
            .send(&body[..])?;
        let resp: UploadResponse = read_json(response)?;

        resp.url.ok_or_else(|| api_error(resp.errcode, resp.errmsg))
    }

    /// Upload a named permanent material (cover image). Returns the media id.
    pub fn upload_material(&self, source: &str, name: &str) -> Result<String, WeChatError> {
        let token = self.access_token()?;
        let data = self.media_bytes(source)?;
        let filename = format!("{name}.jpg");

        info!("uploading material '{filename}'");
        let url = format!(
            "{}/material/add_material?access_token={token}&type=image",
            self.base_url
        );
        let (boundary, body) = multipart_body(&filename, "image/jpeg", &data);

        let response = self
            .agent
            .post(&url)
            .header(
                "Content-Type",
                &format!("multipart/form-data; boundary={boundary}"),
            )
            .header("Accept", "application/json")
            .send(&body[..])?;
        let resp: UploadResponse = read_json(response)?;

        resp.media_id
            .ok_or_else(|| api_error(resp.errcode, resp.errmsg))
    }

    /// Create a draft from assembled article data. Returns the draft media id.
    pub fn create_draft(&self, article: &ArticleData) -> Result<String, WeChatError> {
        let token = self.access_token()?;
        let url = format!("{}/draft/add?access_token={token}", self.base_url);
        let payload = serde_json::json!({ "articles": [article] });

        info!("creating draft '{}'", article.title);
        // The draft endpoint rejects an explicit JSON content type; the
        // body goes out raw.
        let response = self
            .agent
            .post(&url)
            .send(serde_json::to_vec(&payload)?.as_slice())?;
        let resp: DraftResponse = read_json(response)?;

        resp.media_id
            .ok_or_else(|| api_error(resp.errcode, resp.errmsg))
    }

    /// Submit a draft for publication. Returns the publish task id.
    pub fn publish_draft(&self, media_id: &str) -> Result<String, WeChatError> {
        let token = self.access_token()?;
        let url = format!("{}/freepublish/submit?access_token={token}", self.base_url);

        info!("publishing draft {media_id}");
        let response = self
            .agent
            .post(&url)
            .send_json(serde_json::json!({ "media_id": media_id }))?;
        let resp: PublishResponse = read_json(response)?;

        if resp.errcode == Some(0) {
            Ok(resp.publish_id.unwrap_or_else(|| "success".to_owned()))
        } else {
            Err(api_error(resp.errcode, resp.errmsg))
        }
    }
}

fn read_json<T: DeserializeOwned>(
    response: ureq::http::Response<ureq::Body>,
) -> Result<T, WeChatError> {
    let status = response.status().as_u16();
    let mut body = response.into_body();

    if status >= 400 {
        let error_body = body
            .read_to_string()
            .unwrap_or_else(|_| "(unable to read error body)".to_owned());
        return Err(WeChatError::HttpResponse {
            status,
            body: error_body,
        });
    }

    Ok(body.read_json()?)
}

fn api_error(errcode: Option<i64>, errmsg: Option<String>) -> WeChatError {
    WeChatError::Api {
        code: errcode.unwrap_or(-1),
        message: errmsg.unwrap_or_else(|| "unknown error".to_owned()),
    }
}

/// Build a single-part multipart/form-data body for a media upload.
fn multipart_body(filename: &str, content_type: &str, data: &[u8]) -> (String, Vec<u8>) {
    let boundary = format!("----MdwxFormBoundary{:016x}", rand::rng().random::<u64>());
    let mut body = Vec::with_capacity(data.len() + 256);

    body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
    body.extend_from_slice(
        format!("Content-Disposition: form-data; name=\"media\"; filename=\"{filename}\"\r\n")
            .as_bytes(),
    );
    body.extend_from_slice(format!("Content-Type: {content_type}\r\n\r\n").as_bytes());
    body.extend_from_slice(data);
    body.extend_from_slice(b"\r\n");
    body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());

    (boundary, body)
}

fn content_type_for(filename: &str) -> &'static str {
    let lowered = filename.to_ascii_lowercase();
    match lowered.rsplit('.').next() {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("bmp") => "image/bmp",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mdwx_store::MemoryStore;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_multipart_body_shape() {
        let (boundary, body) = multipart_body("pic.png", "image/png", b"DATA");
        let text = String::from_utf8_lossy(&body);

        assert!(text.starts_with(&format!("--{boundary}\r\n")));
        assert!(text.contains(r#"name="media"; filename="pic.png""#));
        assert!(text.contains("Content-Type: image/png\r\n\r\nDATA\r\n"));
        assert!(text.ends_with(&format!("--{boundary}--\r\n")));
    }

    #[test]
    fn test_multipart_boundaries_unique() {
        let (a, _) = multipart_body("a.png", "image/png", b"x");
        let (b, _) = multipart_body("a.png", "image/png", b"x");
        assert_ne!(a, b);
    }

    #[test]
    fn test_content_type_for() {
        assert_eq!(content_type_for("a.PNG"), "image/png");
        assert_eq!(content_type_for("a.jpeg"), "image/jpeg");
        assert_eq!(content_type_for("a.webp"), "image/webp");
        assert_eq!(content_type_for("a.bin"), "application/octet-stream");
    }

    #[test]
    fn test_api_error_defaults() {
        let err = api_error(None, None);
        assert!(matches!(err, WeChatError::Api { code: -1, .. }));
    }

    #[test]
    fn test_missing_credentials() {
        let client = WeChatClient::new("", "", Arc::new(MemoryStore::new()));
        let err = client.test_connection().unwrap_err();
        assert!(matches!(err, WeChatError::MissingCredentials));
    }

    #[test]
    fn test_media_bytes_from_store() {
        let store = MemoryStore::new();
        store.insert("img/a.png", b"PNGDATA".to_vec());
        let client = WeChatClient::new("id", "secret", Arc::new(store));

        assert_eq!(client.media_bytes("img/a.png").unwrap(), b"PNGDATA");
        assert_eq!(client.media_bytes("./img/a.png").unwrap(), b"PNGDATA");
    }
}
