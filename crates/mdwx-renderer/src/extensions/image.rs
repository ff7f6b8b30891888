//! Image rendering: `![[...]]` local embeds and standard markdown images,
//! with deferred upload to the publish platform.

use std::fmt::Write;
use std::sync::{Arc, LazyLock};

use regex::{Captures, Regex};
use tracing::{info, warn};

use mdwx_store::NoteStore;

use crate::extension::{MediaUploader, RenderError, RenderExtension};
use crate::pipeline::FragmentHandle;
use crate::util::{clean_url, escape_html};

/// `![[name|options]]` local embed reference.
static EMBED_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"!\[\[([^\[\]]*?)\]\]").unwrap());

/// File extensions accepted as images.
const IMAGE_EXTENSIONS: &[&str] = &[".png", ".jpg", ".jpeg", ".gif", ".bmp", ".webp", ".svg"];

fn is_image_file(name: &str) -> bool {
    let lowered = name.to_ascii_lowercase();
    IMAGE_EXTENSIONS.iter().any(|ext| lowered.ends_with(ext))
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
enum Align {
    #[default]
    Left,
    Center,
    Right,
}

/// Parsed `![[path|WxH|align]]` reference.
#[derive(Debug, Default)]
struct EmbedRef {
    path: String,
    width: Option<u32>,
    height: Option<u32>,
    align: Align,
}

fn parse_embed(reference: &str) -> EmbedRef {
    let mut parts = reference.split('|');
    let mut embed = EmbedRef {
        path: parts.next().unwrap_or_default().trim().to_owned(),
        ..EmbedRef::default()
    };

    for part in parts {
        let part = part.trim();
        match part {
            "left" => embed.align = Align::Left,
            "center" => embed.align = Align::Center,
            "right" => embed.align = Align::Right,
            _ => {
                if let Some((w, h)) = part.split_once('x') {
                    embed.width = w.parse().ok();
                    embed.height = h.parse().ok();
                } else if !part.is_empty() && part.chars().all(|c| c.is_ascii_digit()) {
                    embed.width = part.parse().ok();
                }
            }
        }
    }

    embed
}

/// One image referenced by the current document.
#[derive(Debug)]
struct ImageRecord {
    /// Element id for deferred update notifications.
    id: String,
    /// The `src` value as rendered (resource URL for local files).
    resource_url: String,
    /// What the uploader receives: store path for local files, the URL
    /// itself for remote images.
    source: String,
    /// Hosted URL once uploaded.
    uploaded_url: Option<String>,
}

/// Resolves and registers document images, uploading them before publish.
///
/// Rendering is a pure tree walk that only records locations; the uploads
/// happen later in `before_publish`, which drains the table and rewrites
/// `src` attributes. Preview passes never upload, so local sources survive
/// there — per-image upload failures are logged and keep the local source
/// too.
pub struct ImageExtension {
    store: Arc<dyn NoteStore>,
    uploader: Arc<dyn MediaUploader>,
    fragments: Option<FragmentHandle>,
    images: Vec<ImageRecord>,
    next_id: usize,
}

impl ImageExtension {
    /// Create the extension over the note store and upload collaborator.
    #[must_use]
    pub fn new(store: Arc<dyn NoteStore>, uploader: Arc<dyn MediaUploader>) -> Self {
        Self {
            store,
            uploader,
            fragments: None,
            images: Vec::new(),
            next_id: 0,
        }
    }

    /// Attach the pipeline's fragment cache for update notifications.
    #[must_use]
    pub fn with_fragments(mut self, fragments: FragmentHandle) -> Self {
        self.fragments = Some(fragments);
        self
    }

    fn register(&mut self, resource_url: String, source: String) {
        if self.images.iter().any(|r| r.resource_url == resource_url) {
            return;
        }
        self.next_id += 1;
        self.images.push(ImageRecord {
            id: format!("img-{}", self.next_id),
            resource_url,
            source,
            uploaded_url: None,
        });
    }

    fn render_embed(&mut self, reference: &str) -> String {
        let embed = parse_embed(reference);

        if !is_image_file(&embed.path) {
            return format!(
                r#"<span style="color: red;">不支持的文件类型: {}</span>"#,
                escape_html(reference)
            );
        }

        let Some(path) = self.store.resolve_attachment(&embed.path) else {
            return format!(
                r#"<span style="color: red;">图片不存在: {}</span>"#,
                escape_html(&embed.path)
            );
        };

        let url = self.store.resource_url(&path);
        self.register(url.clone(), path);

        let mut img = format!(r#"<img src="{url}" alt="{}""#, escape_html(&embed.path));
        if let Some(width) = embed.width {
            write!(img, r#" width="{width}""#).unwrap();
        }
        if let Some(height) = embed.height {
            write!(img, r#" height="{height}""#).unwrap();
        }
        match embed.align {
            Align::Left => {}
            Align::Center => img.push_str(r#" style="display: block; margin: 0 auto;""#),
            Align::Right => img.push_str(r#" style="display: block; margin: 0 0 0 auto;""#),
        }
        img.push('>');
        img
    }

    fn rewrite_sources(&self, mut html: String) -> String {
        for record in &self.images {
            if let Some(uploaded) = &record.uploaded_url {
                html = html.replace(
                    &format!(r#"src="{}""#, record.resource_url),
                    &format!(r#"src="{uploaded}""#),
                );
            }
        }
        html
    }
}

impl RenderExtension for ImageExtension {
    fn name(&self) -> &'static str {
        "image"
    }

    fn prepare(&mut self) {
        self.images.clear();
        self.next_id = 0;
    }

    /// Rewrite `![[...]]` embeds to HTML before parsing; the markdown
    /// engine has no tokenizer for that syntax.
    fn preprocess(&mut self, markdown: &str) -> Option<String> {
        if !markdown.contains("![[") {
            return None;
        }
        Some(
            EMBED_RE
                .replace_all(markdown, |caps: &Captures<'_>| self.render_embed(&caps[1]))
                .into_owned(),
        )
    }

    fn image(&mut self, dest: &str, title: &str, alt: &str) -> Option<String> {
        let Some(href) = clean_url(dest) else {
            return Some(escape_html(alt).into_owned());
        };

        let src = if href.starts_with("http") {
            self.register(href.to_owned(), href.to_owned());
            href.to_owned()
        } else {
            match self.store.resolve_attachment(href) {
                Some(path) => {
                    let url = self.store.resource_url(&path);
                    self.register(url.clone(), path);
                    url
                }
                // Unresolved references keep their source untouched.
                None => href.to_owned(),
            }
        };

        let mut out = format!(r#"<img src="{src}" alt="{}""#, escape_html(alt));
        if !title.is_empty() {
            write!(out, r#" title="{}""#, escape_html(title)).unwrap();
        }
        out.push_str(r#" style="max-width: 100%; height: auto;">"#);
        Some(out)
    }

    fn postprocess(&mut self, html: String) -> Result<String, RenderError> {
        Ok(self.rewrite_sources(html))
    }

    fn before_publish(&mut self, html: String) -> Result<String, RenderError> {
        for record in &mut self.images {
            if record.uploaded_url.is_some() {
                continue;
            }
            match self.uploader.upload_image(&record.source) {
                Ok(url) => {
                    info!("image uploaded: {} -> {url}", record.source);
                    if let Some(fragments) = &self.fragments {
                        fragments
                            .borrow_mut()
                            .update_element(&record.id, &format!(r#"<img src="{url}">"#));
                    }
                    record.uploaded_url = Some(url);
                }
                Err(err) => warn!("{err}"),
            }
        }
        Ok(self.rewrite_sources(html))
    }

    fn cleanup(&mut self) {
        self.images.clear();
        self.next_id = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::UploadError;
    use mdwx_store::MemoryStore;
    use pretty_assertions::assert_eq;

    struct StubUploader {
        fail: bool,
    }

    impl MediaUploader for StubUploader {
        fn upload_image(&self, source: &str) -> Result<String, UploadError> {
            if self.fail {
                return Err(UploadError::new(source, "rejected"));
            }
            let name = source.rsplit('/').next().unwrap_or(source);
            Ok(format!("https://mmbiz.example/{name}"))
        }

        fn upload_material(&self, source: &str, _name: &str) -> Result<String, UploadError> {
            self.upload_image(source).map(|_| "media-id".to_owned())
        }
    }

    fn extension(files: &[&str], fail_uploads: bool) -> ImageExtension {
        let store = MemoryStore::new();
        for file in files {
            store.insert(file, b"bytes".to_vec());
        }
        ImageExtension::new(
            Arc::new(store),
            Arc::new(StubUploader { fail: fail_uploads }),
        )
    }

    #[test]
    fn test_embed_missing_file_renders_marker() {
        let mut ext = extension(&[], false);
        let html = ext.preprocess("![[missing.png]]").unwrap();
        assert!(html.contains("missing.png"));
        assert!(html.contains(r#"<span style="color: red;">"#));
        assert!(!html.contains("<img"));
    }

    #[test]
    fn test_embed_unsupported_type_renders_marker() {
        let mut ext = extension(&["report.pdf"], false);
        let html = ext.preprocess("![[report.pdf]]").unwrap();
        assert!(html.contains("不支持的文件类型"));
        assert!(html.contains("report.pdf"));
        assert!(!html.contains("<img"));
    }

    #[test]
    fn test_embed_resolved_with_size_and_alignment() {
        let mut ext = extension(&["assets/photo.png"], false);
        let html = ext.preprocess("![[photo.png|300x200|center]]").unwrap();
        assert!(html.contains(r#"src="mem://assets/photo.png""#));
        assert!(html.contains(r#"width="300""#));
        assert!(html.contains(r#"height="200""#));
        assert!(html.contains("margin: 0 auto"));
    }

    #[test]
    fn test_embed_bare_width() {
        let mut ext = extension(&["photo.png"], false);
        let html = ext.preprocess("![[photo.png|420]]").unwrap();
        assert!(html.contains(r#"width="420""#));
        assert!(!html.contains("height="));
    }

    #[test]
    fn test_embed_right_alignment() {
        let mut ext = extension(&["photo.png"], false);
        let html = ext.preprocess("![[photo.png|right]]").unwrap();
        assert!(html.contains("margin: 0 0 0 auto"));
    }

    #[test]
    fn test_preprocess_untouched_without_embeds() {
        let mut ext = extension(&[], false);
        assert_eq!(ext.preprocess("plain ![alt](a.png)"), None);
    }

    #[test]
    fn test_standard_image_resolves_local() {
        let mut ext = extension(&["pics/a.png"], false);
        let html = ext.image("a.png", "", "alt text").unwrap();
        assert!(html.contains(r#"src="mem://pics/a.png""#));
        assert!(html.contains(r#"style="max-width: 100%; height: auto;""#));
    }

    #[test]
    fn test_standard_image_unresolved_keeps_source() {
        let mut ext = extension(&[], false);
        let html = ext.image("nowhere.png", "", "alt").unwrap();
        assert!(html.contains(r#"src="nowhere.png""#));
        assert!(ext.images.is_empty());
    }

    #[test]
    fn test_unsafe_url_degrades_to_alt_text() {
        let mut ext = extension(&[], false);
        assert_eq!(ext.image("javascript:alert(1)", "", "alt").unwrap(), "alt");
    }

    #[test]
    fn test_remote_image_registered() {
        let mut ext = extension(&[], false);
        ext.image("https://example.com/x.png", "", "alt").unwrap();
        assert_eq!(ext.images.len(), 1);
        assert_eq!(ext.images[0].source, "https://example.com/x.png");
    }

    #[test]
    fn test_duplicate_references_registered_once() {
        let mut ext = extension(&["a.png"], false);
        ext.image("a.png", "", "one").unwrap();
        ext.image("a.png", "", "two").unwrap();
        assert_eq!(ext.images.len(), 1);
    }

    #[test]
    fn test_before_publish_uploads_and_rewrites() {
        let mut ext = extension(&["a.png"], false);
        let html = ext.image("a.png", "", "alt").unwrap();
        let published = ext.before_publish(html).unwrap();
        assert!(published.contains(r#"src="https://mmbiz.example/a.png""#));
        assert!(!published.contains("mem://"));
    }

    #[test]
    fn test_upload_failure_keeps_local_source() {
        let mut ext = extension(&["a.png"], true);
        let html = ext.image("a.png", "", "alt").unwrap();
        let published = ext.before_publish(html).unwrap();
        assert!(published.contains(r#"src="mem://a.png""#));
    }

    #[test]
    fn test_preview_postprocess_keeps_local_source() {
        let mut ext = extension(&["a.png"], false);
        let html = ext.image("a.png", "", "alt").unwrap();
        let preview = ext.postprocess(html).unwrap();
        assert!(preview.contains("mem://a.png"));
    }

    #[test]
    fn test_cleanup_empties_state_after_failed_uploads() {
        let mut ext = extension(&["a.png"], true);
        ext.prepare();
        ext.preprocess("![[a.png]]").unwrap();
        assert_eq!(ext.images.len(), 1);
        ext.before_publish(String::new()).unwrap();
        ext.cleanup();
        assert!(ext.images.is_empty());
        assert_eq!(ext.next_id, 0);
    }

    #[test]
    fn test_pipeline_embed_end_to_end() {
        let store = MemoryStore::new();
        store.insert("photo.png", b"bytes".to_vec());
        let ext = ImageExtension::new(Arc::new(store), Arc::new(StubUploader { fail: false }));

        let mut pipeline = crate::MarkdownPipeline::new().with_extension(ext);
        let html = pipeline.parse("before\n\n![[photo.png|300x200|center]]\n\nafter").unwrap();
        assert!(html.contains(r#"width="300""#));
        assert!(html.contains(r#"height="200""#));
        assert!(html.contains("margin: 0 auto"));
    }
}
