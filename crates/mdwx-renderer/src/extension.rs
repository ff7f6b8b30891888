//! The render extension contract and its collaborator traits.

/// Error from a render pass.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// A lifecycle hook failed. Fatal to the current parse/publish call;
    /// cleanup still runs.
    #[error("extension '{extension}' failed during {stage}: {message}")]
    Extension {
        /// Extension that raised the error.
        extension: &'static str,
        /// Lifecycle stage (`postprocess` or `before_publish`).
        stage: &'static str,
        /// Failure description.
        message: String,
    },
}

impl RenderError {
    /// Build an extension-stage error.
    #[must_use]
    pub fn extension(extension: &'static str, stage: &'static str, message: impl Into<String>) -> Self {
        Self::Extension {
            extension,
            stage,
            message: message.into(),
        }
    }
}

/// Error from the remote media upload collaborator.
#[derive(Debug)]
pub struct UploadError {
    /// Local path or URL that failed to upload.
    pub source: String,
    /// Failure description from the transport.
    pub message: String,
}

impl std::fmt::Display for UploadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "upload failed for '{}': {}", self.source, self.message)
    }
}

impl std::error::Error for UploadError {}

impl UploadError {
    /// Build an upload error.
    #[must_use]
    pub fn new(source: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            message: message.into(),
        }
    }
}

/// Remote media upload collaborator used by before-publish hooks.
///
/// Implemented by the WeChat API client; tests substitute stubs. Draft and
/// publish calls are deliberately not part of this trait — render
/// extensions only ever upload media.
pub trait MediaUploader {
    /// Upload an image by local store path or URL; returns the hosted URL.
    fn upload_image(&self, source: &str) -> Result<String, UploadError>;

    /// Upload a named material (cover image); returns the media id.
    fn upload_material(&self, source: &str, name: &str) -> Result<String, UploadError>;
}

/// A unit of parse-time behavior plugged into [`MarkdownPipeline`].
///
/// Token hooks return `Some(html)` to take over rendering of that token or
/// `None` to pass through; extensions are tried in registration order and
/// the first taker wins. Lifecycle hooks default to no-ops so extensions
/// implement only what they need.
///
/// Extension instances own per-document state (collected links, the image
/// table). That state is reset in `prepare` and cleared in `cleanup`, and
/// must not be shared between concurrently running document passes — the
/// pipeline's exclusive borrow makes that structural.
///
/// [`MarkdownPipeline`]: crate::MarkdownPipeline
pub trait RenderExtension {
    /// Stable identifier, used in logs and errors.
    fn name(&self) -> &'static str;

    /// Reset per-document state before a pass.
    fn prepare(&mut self) {}

    /// Rewrite the markdown source before parsing (e.g. embed syntax the
    /// engine does not tokenize). Return `None` to leave it unchanged.
    fn preprocess(&mut self, _markdown: &str) -> Option<String> {
        None
    }

    /// Render a heading. `text` is the plain inline text, `inner_html` the
    /// rendered inline content.
    fn heading(&mut self, _level: u8, _text: &str, _inner_html: &str) -> Option<String> {
        None
    }

    /// Render a fenced or indented code block.
    fn code_block(&mut self, _lang: Option<&str>, _source: &str) -> Option<String> {
        None
    }

    /// Render an inline link with its visible text.
    fn link(&mut self, _dest: &str, _title: &str, _text: &str) -> Option<String> {
        None
    }

    /// Render a standard markdown image.
    fn image(&mut self, _dest: &str, _title: &str, _alt: &str) -> Option<String> {
        None
    }

    /// Transform the rendered document. Runs for every extension in
    /// registration order; the output of one is the input of the next.
    fn postprocess(&mut self, html: String) -> Result<String, RenderError> {
        Ok(html)
    }

    /// Perform publish-time side effects and rewrite resource references.
    /// Runs only after a successful parse.
    fn before_publish(&mut self, html: String) -> Result<String, RenderError> {
        Ok(html)
    }

    /// Drop per-document state. Runs unconditionally after
    /// [`parse_for_publish`](crate::MarkdownPipeline::parse_for_publish),
    /// even when an earlier stage failed, and must not fail itself.
    fn cleanup(&mut self) {}
}
