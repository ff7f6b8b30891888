//! The publish workflow: note → metadata → rendered HTML → WeChat draft.

use std::fmt::Write;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{info, warn};

use mdwx_renderer::{
    CodeExtension, HeadingExtension, ImageExtension, LinkExtension, LinkStyle, MarkdownPipeline,
    MediaUploader,
};
use mdwx_store::NoteStore;
use mdwx_theme::ThemeRegistry;
use mdwx_wechat::{ArticleData, WeChatClient, WeChatError};

use crate::error::ArticleError;
use crate::formatter::{format_for_preview, format_for_publish};
use crate::front_matter::{FieldValue, split_front_matter, update_front_matter};
use crate::metadata::{ArticleMetadata, Flag};

/// Draft and publish surface of the remote API collaborator.
///
/// Media uploads come from the [`MediaUploader`] supertrait; this adds the
/// draft/publish calls made by the article workflow (never by render
/// extensions). Implemented by [`WeChatClient`]; tests substitute stubs.
pub trait PublishApi: MediaUploader {
    /// Create a draft. Returns the draft media id.
    fn create_draft(&self, article: &ArticleData) -> Result<String, WeChatError>;

    /// Submit a draft for publication. Returns the publish task id.
    fn publish_draft(&self, media_id: &str) -> Result<String, WeChatError>;
}

impl PublishApi for WeChatClient {
    fn create_draft(&self, article: &ArticleData) -> Result<String, WeChatError> {
        WeChatClient::create_draft(self, article)
    }

    fn publish_draft(&self, media_id: &str) -> Result<String, WeChatError> {
        WeChatClient::publish_draft(self, media_id)
    }
}

/// Settings the workflow needs beyond its collaborators.
#[derive(Clone, Debug, Default)]
pub struct PublishSettings {
    /// Author used when a note has none.
    pub default_author: String,
    /// Submit the draft for publication right after creating it.
    pub auto_publish: bool,
    /// Render code sections with a line-number gutter.
    pub line_numbers: bool,
    /// External link rendering style.
    pub link_style: LinkStyle,
    /// Default theme name.
    pub theme: String,
    /// Default highlight theme name.
    pub highlight: String,
}

/// Result of a publish run.
#[derive(Debug)]
pub struct PublishOutcome {
    /// Draft media id.
    pub draft_id: String,
    /// Publish task id when auto-publish was on and succeeded.
    pub publish_id: Option<String>,
}

/// Front-matter fields every publishable note carries, with their defaults.
/// The author default comes from settings.
const REQUIRED_FIELDS: &[(&str, &str)] = &[
    ("title", ""),
    ("digest", ""),
    ("banner", ""),
    ("content_source_url", ""),
    ("platform", ""),
    ("theme", ""),
    ("highlight_theme", ""),
];

const REQUIRED_FLAG_FIELDS: &[(&str, bool)] = &[
    ("crop_enabled", false),
    ("need_open_comment", false),
    ("only_fans_can_comment", false),
    ("show_cover", true),
    ("is_original", true),
];

/// Drives one note through preview or publish.
///
/// Owns the render pipeline, so one publisher handles one document pass at
/// a time; construct another for overlapping work.
pub struct ArticlePublisher {
    store: Arc<dyn NoteStore>,
    api: Arc<dyn PublishApi>,
    registry: ThemeRegistry,
    settings: PublishSettings,
    pipeline: MarkdownPipeline,
}

impl ArticlePublisher {
    /// Create a publisher with the standard extension registration order:
    /// heading, code, link, image.
    #[must_use]
    pub fn new(
        store: Arc<dyn NoteStore>,
        api: Arc<dyn PublishApi>,
        registry: ThemeRegistry,
        settings: PublishSettings,
    ) -> Self {
        let pipeline = MarkdownPipeline::new();
        let uploader: Arc<dyn MediaUploader> = api.clone();
        let image = ImageExtension::new(Arc::clone(&store), uploader)
            .with_fragments(pipeline.fragments());
        let pipeline = pipeline
            .with_extension(HeadingExtension::new())
            .with_extension(CodeExtension::new(settings.line_numbers))
            .with_extension(LinkExtension::new(settings.link_style))
            .with_extension(image);

        Self {
            store,
            api,
            registry,
            settings,
            pipeline,
        }
    }

    /// Render a note for the preview surface, with a warnings banner for
    /// metadata problems that would block publishing.
    pub fn preview(&mut self, path: &str) -> Result<String, ArticleError> {
        let content = self.store.read_note(path)?;
        let (block, body) = split_front_matter(&content);
        let metadata = ArticleMetadata::from_front_matter(block);

        let warnings = front_matter_warnings(&metadata);
        let html = self.pipeline.parse(body)?;
        let theme_css = self.theme_css(&metadata);

        Ok(format_for_preview(&format!("{warnings}{html}"), &theme_css))
    }

    /// Publish a note: fill missing front-matter fields, validate, upload
    /// the cover, render with image uploads, create the draft, optionally
    /// submit it, and record the outcome back into the note.
    pub fn publish(&mut self, path: &str) -> Result<PublishOutcome, ArticleError> {
        self.ensure_front_matter(path)?;

        let content = self.store.read_note(path)?;
        let (block, body) = split_front_matter(&content);
        let metadata = ArticleMetadata::from_front_matter(block);
        metadata.validate_for_publish()?;

        let title = metadata.title.clone().unwrap_or_default();
        let thumb_media_id = self.resolve_cover(&metadata, &title)?;

        let html = self.pipeline.parse_for_publish(body)?;
        let theme_css = self.theme_css(&metadata);
        let content_html = format_for_publish(&html, &theme_css);

        let author = metadata
            .author
            .clone()
            .filter(|a| !a.trim().is_empty())
            .or_else(|| {
                (!self.settings.default_author.is_empty())
                    .then(|| self.settings.default_author.clone())
            });
        let article = ArticleData {
            title,
            author,
            digest: metadata.digest.clone().filter(|d| !d.is_empty()),
            content: content_html,
            content_source_url: metadata
                .content_source_url
                .clone()
                .or_else(|| metadata.source_url.clone())
                .filter(|u| !u.is_empty()),
            thumb_media_id,
            show_cover_pic: metadata
                .show_cover_pic
                .or(metadata.show_cover)
                .map(Flag::as_u8),
            need_open_comment: metadata
                .need_open_comment
                .or(metadata.open_comment)
                .map_or(0, Flag::as_u8),
            only_fans_can_comment: metadata.only_fans_can_comment.map_or(0, Flag::as_u8),
        };

        let draft_id = match self.api.create_draft(&article) {
            Ok(id) => id,
            Err(err) => {
                self.record_outcome(path, None, "failed")?;
                return Err(err.into());
            }
        };
        info!("draft created: {draft_id}");

        let mut publish_id = None;
        let status = if self.settings.auto_publish {
            match self.api.publish_draft(&draft_id) {
                Ok(id) => {
                    info!("draft {draft_id} submitted for publication: {id}");
                    publish_id = Some(id);
                    "published"
                }
                Err(err) => {
                    warn!("draft created but publish failed: {err}");
                    "failed"
                }
            }
        } else {
            "draft_created"
        };

        self.record_outcome(path, Some(&draft_id), status)?;
        Ok(PublishOutcome {
            draft_id,
            publish_id,
        })
    }

    fn theme_css(&self, metadata: &ArticleMetadata) -> String {
        let theme = metadata.theme.as_deref().unwrap_or(&self.settings.theme);
        let highlight = metadata
            .highlight_theme
            .as_deref()
            .unwrap_or(&self.settings.highlight);
        self.registry.apply_theme(theme, highlight, None)
    }

    /// Existing cover media id, or the first cover candidate uploaded as
    /// material. Validation guarantees a candidate exists.
    fn resolve_cover(
        &self,
        metadata: &ArticleMetadata,
        title: &str,
    ) -> Result<String, ArticleError> {
        if let Some(id) = &metadata.thumb_media_id
            && !id.trim().is_empty()
        {
            return Ok(id.clone());
        }
        if let Some((source, suffix)) = metadata.cover_candidates().into_iter().next() {
            return Ok(self.api.upload_material(source, &format!("{title}{suffix}"))?);
        }
        Err(ArticleError::Validation(
            "a cover is required: set banner, banner_path, cover, cover_url, or thumb_media_id"
                .to_owned(),
        ))
    }

    /// Add missing front-matter fields with defaults, writing the note
    /// back. Returns whether the note changed.
    pub fn ensure_front_matter(&self, path: &str) -> Result<bool, ArticleError> {
        let content = self.store.read_note(path)?;
        let (block, _) = split_front_matter(&content);
        let existing: serde_yaml::Value = block
            .and_then(|b| serde_yaml::from_str(b).ok())
            .unwrap_or(serde_yaml::Value::Null);

        let has_key = |key: &str| existing.get(key).is_some();

        let mut updates = Vec::new();
        for (key, default) in REQUIRED_FIELDS {
            if !has_key(key) {
                updates.push(((*key).to_owned(), FieldValue::Text((*default).to_owned())));
            }
        }
        for (key, default) in REQUIRED_FLAG_FIELDS {
            if !has_key(key) {
                updates.push(((*key).to_owned(), FieldValue::Bool(*default)));
            }
        }

        // Author gets the configured default, also when present but empty.
        let author_empty = existing
            .get("author")
            .and_then(serde_yaml::Value::as_str)
            .is_none_or(|a| a.trim().is_empty());
        if !has_key("author") || author_empty {
            updates.push((
                "author".to_owned(),
                FieldValue::Text(self.settings.default_author.clone()),
            ));
        }

        if updates.is_empty() {
            return Ok(false);
        }
        info!(
            "filling {} missing front-matter field(s) in {path}",
            updates.len()
        );
        self.store
            .write_note(path, &update_front_matter(&content, &updates))?;
        Ok(true)
    }

    /// Record the publish outcome into the note's front matter.
    fn record_outcome(
        &self,
        path: &str,
        media_id: Option<&str>,
        status: &str,
    ) -> Result<(), ArticleError> {
        let content = self.store.read_note(path)?;
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| i64::try_from(d.as_secs()).unwrap_or(i64::MAX));

        let mut updates = vec![
            ("publish_status".to_owned(), FieldValue::Text(status.to_owned())),
            ("last_publish_time".to_owned(), FieldValue::Int(timestamp)),
        ];
        if let Some(id) = media_id {
            updates.push(("media_id".to_owned(), FieldValue::Text(id.to_owned())));
        }

        self.store
            .write_note(path, &update_front_matter(&content, &updates))?;
        Ok(())
    }
}

/// Warning banner for the preview surface: publish blockers and state
/// notes, empty when the note is ready.
fn front_matter_warnings(metadata: &ArticleMetadata) -> String {
    let mut warnings = String::new();

    if metadata
        .title
        .as_deref()
        .is_none_or(|t| t.trim().is_empty())
    {
        push_warning(
            &mut warnings,
            "#fff2f0",
            "#ff4d4f",
            "⚠️ 标题不能为空",
            "发布到公众号前请填写 title 字段。",
        );
    }

    if !metadata.has_cover() {
        push_warning(
            &mut warnings,
            "#fff2f0",
            "#ff4d4f",
            "⚠️ 封面图片不能为空",
            "请设置 banner、cover 或 thumb_media_id 字段。",
        );
    }

    if let Some(media_id) = &metadata.media_id {
        push_warning(
            &mut warnings,
            "#f6ffed",
            "#52c41a",
            "📝 更新草稿模式",
            &format!("已存在草稿 {media_id}，发布将更新现有草稿。"),
        );
    }

    if matches!(
        metadata.publish_status.as_deref(),
        Some("failed" | "update_failed")
    ) {
        push_warning(
            &mut warnings,
            "#fff1f0",
            "#ff7875",
            "❌ 上次操作失败",
            "请检查网络连接和账号配置后重试。",
        );
    }

    warnings
}

fn push_warning(out: &mut String, background: &str, accent: &str, title: &str, detail: &str) {
    write!(
        out,
        r#"<div style="margin-bottom: 15px; padding: 15px; background: {background}; border-left: 4px solid {accent}; border-radius: 4px;"><strong style="color: {accent};">{title}</strong><br>{detail}</div>"#
    )
    .unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;
    use mdwx_renderer::UploadError;
    use mdwx_store::MemoryStore;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;

    #[derive(Default)]
    struct StubApi {
        drafts: Mutex<Vec<ArticleData>>,
        fail_draft: bool,
        fail_publish: bool,
    }

    impl MediaUploader for StubApi {
        fn upload_image(&self, source: &str) -> Result<String, UploadError> {
            Ok(format!("https://mmbiz.example/{source}"))
        }

        fn upload_material(&self, _source: &str, name: &str) -> Result<String, UploadError> {
            Ok(format!("media-{name}"))
        }
    }

    impl PublishApi for StubApi {
        fn create_draft(&self, article: &ArticleData) -> Result<String, WeChatError> {
            if self.fail_draft {
                return Err(WeChatError::Api {
                    code: 45009,
                    message: "quota exceeded".to_owned(),
                });
            }
            self.drafts.lock().unwrap().push(article.clone());
            Ok("draft-1".to_owned())
        }

        fn publish_draft(&self, _media_id: &str) -> Result<String, WeChatError> {
            if self.fail_publish {
                return Err(WeChatError::Api {
                    code: 53503,
                    message: "draft not ready".to_owned(),
                });
            }
            Ok("publish-1".to_owned())
        }
    }

    fn publisher_with(
        note: &str,
        api: StubApi,
        settings: PublishSettings,
    ) -> (Arc<MemoryStore>, Arc<StubApi>, ArticlePublisher) {
        let store = Arc::new(MemoryStore::new());
        store.insert("note.md", note.as_bytes().to_vec());
        store.insert("cover.png", b"png".to_vec());
        let api = Arc::new(api);
        let publisher = ArticlePublisher::new(
            Arc::clone(&store) as Arc<dyn NoteStore>,
            Arc::clone(&api) as Arc<dyn PublishApi>,
            ThemeRegistry::with_defaults(),
            settings,
        );
        (store, api, publisher)
    }

    const READY_NOTE: &str =
        "---\ntitle: Hello\nauthor: dev\nbanner: cover.png\n---\n\n# Hello\n\nbody text\n";

    #[test]
    fn test_publish_creates_draft_and_records_state() {
        let (store, api, mut publisher) =
            publisher_with(READY_NOTE, StubApi::default(), PublishSettings::default());

        let outcome = publisher.publish("note.md").unwrap();
        assert_eq!(outcome.draft_id, "draft-1");
        assert_eq!(outcome.publish_id, None);

        let drafts = api.drafts.lock().unwrap();
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].title, "Hello");
        assert_eq!(drafts[0].thumb_media_id, "media-Hello_banner");
        assert!(drafts[0].content.contains("wechat-content"));
        assert!(!drafts[0].content.contains('\n'));

        let updated = store.read_note("note.md").unwrap();
        assert!(updated.contains("media_id: draft-1"));
        assert!(updated.contains("publish_status: draft_created"));
        assert!(updated.contains("last_publish_time:"));
    }

    #[test]
    fn test_publish_auto_publish() {
        let settings = PublishSettings {
            auto_publish: true,
            ..PublishSettings::default()
        };
        let (store, _api, mut publisher) = publisher_with(READY_NOTE, StubApi::default(), settings);

        let outcome = publisher.publish("note.md").unwrap();
        assert_eq!(outcome.publish_id.as_deref(), Some("publish-1"));
        assert!(store
            .read_note("note.md")
            .unwrap()
            .contains("publish_status: published"));
    }

    #[test]
    fn test_publish_rejects_missing_title() {
        let note = "---\nbanner: cover.png\n---\n\nbody\n";
        let (_store, api, mut publisher) =
            publisher_with(note, StubApi::default(), PublishSettings::default());

        let err = publisher.publish("note.md").unwrap_err();
        assert!(matches!(err, ArticleError::Validation(_)));
        assert!(api.drafts.lock().unwrap().is_empty());
    }

    #[test]
    fn test_publish_rejects_missing_cover() {
        let note = "---\ntitle: Hello\n---\n\nbody\n";
        let (_store, _api, mut publisher) =
            publisher_with(note, StubApi::default(), PublishSettings::default());
        assert!(matches!(
            publisher.publish("note.md").unwrap_err(),
            ArticleError::Validation(_)
        ));
    }

    #[test]
    fn test_publish_failure_recorded() {
        let api = StubApi {
            fail_draft: true,
            ..StubApi::default()
        };
        let (store, _api, mut publisher) =
            publisher_with(READY_NOTE, api, PublishSettings::default());

        assert!(publisher.publish("note.md").is_err());
        let updated = store.read_note("note.md").unwrap();
        assert!(updated.contains("publish_status: failed"));
        assert!(!updated.contains("media_id:"));
    }

    #[test]
    fn test_existing_thumb_media_id_skips_upload() {
        let note = "---\ntitle: Hello\nthumb_media_id: media-keep\n---\n\nbody\n";
        let (_store, api, mut publisher) =
            publisher_with(note, StubApi::default(), PublishSettings::default());

        publisher.publish("note.md").unwrap();
        assert_eq!(
            api.drafts.lock().unwrap()[0].thumb_media_id,
            "media-keep"
        );
    }

    #[test]
    fn test_ensure_front_matter_fills_defaults() {
        let settings = PublishSettings {
            default_author: "Team".to_owned(),
            ..PublishSettings::default()
        };
        let (store, _api, publisher) = publisher_with("# Just a heading\n", StubApi::default(), settings);

        assert!(publisher.ensure_front_matter("note.md").unwrap());
        let updated = store.read_note("note.md").unwrap();
        assert!(updated.starts_with("---\n"));
        assert!(updated.contains("title: "));
        assert!(updated.contains("author: Team"));
        assert!(updated.contains("show_cover: true"));
        assert!(updated.contains("need_open_comment: false"));

        // Second run is a no-op.
        assert!(!publisher.ensure_front_matter("note.md").unwrap());
    }

    #[test]
    fn test_ensure_front_matter_fills_empty_author() {
        let settings = PublishSettings {
            default_author: "Team".to_owned(),
            ..PublishSettings::default()
        };
        let note = "---\ntitle: Hi\nauthor: \nbanner: cover.png\n---\nbody";
        let (store, _api, publisher) = publisher_with(note, StubApi::default(), settings);

        publisher.ensure_front_matter("note.md").unwrap();
        assert!(store.read_note("note.md").unwrap().contains("author: Team"));
    }

    #[test]
    fn test_preview_contains_theme_and_content() {
        let (_store, _api, mut publisher) =
            publisher_with(READY_NOTE, StubApi::default(), PublishSettings::default());

        let html = publisher.preview("note.md").unwrap();
        assert!(html.contains("<style>"));
        assert!(html.contains(".wechat-content"));
        assert!(html.contains("wechat-heading-1"));
        assert!(html.contains("body text"));
        // No warnings for a complete note.
        assert!(!html.contains("不能为空"));
    }

    #[test]
    fn test_preview_warns_on_missing_metadata() {
        let note = "---\ndigest: x\n---\n\nbody\n";
        let (_store, _api, mut publisher) =
            publisher_with(note, StubApi::default(), PublishSettings::default());

        let html = publisher.preview("note.md").unwrap();
        assert!(html.contains("标题不能为空"));
        assert!(html.contains("封面图片不能为空"));
    }

    #[test]
    fn test_note_theme_override_used() {
        let note = "---\ntitle: Hi\nbanner: cover.png\ntheme: nonexistent\n---\nbody";
        let (_store, _api, mut publisher) =
            publisher_with(note, StubApi::default(), PublishSettings::default());
        // Unknown name falls back to the default theme rather than failing.
        let html = publisher.preview("note.md").unwrap();
        assert!(html.contains(".wechat-content"));
    }
}
