//! Parse lifecycle orchestration.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use tracing::debug;

use crate::extension::{RenderError, RenderExtension};
use crate::renderer::EventRenderer;

/// Shared handle to the pipeline's fragment cache.
///
/// Rendering is single-threaded and cooperative; one document pass owns the
/// pipeline exclusively, so a `Rc<RefCell<_>>` handle is the honest shape
/// for the extension side channel.
pub type FragmentHandle = Rc<RefCell<FragmentCache>>;

/// Keyed fragment storage plus per-element update callbacks.
///
/// Extensions cache rendered fragments under a category namespace
/// (same-category keys are last-write-wins; no ordering exists across
/// categories) and may register callbacks fired when a deferred operation —
/// typically an image upload — resolves an element's final HTML.
#[derive(Default)]
pub struct FragmentCache {
    fragments: HashMap<String, HashMap<String, String>>,
    callbacks: HashMap<String, Box<dyn FnMut(&str)>>,
}

impl FragmentCache {
    /// Store a fragment under `category`/`id`, replacing any previous value.
    pub fn cache_fragment(&mut self, category: &str, id: &str, data: &str) {
        self.fragments
            .entry(category.to_owned())
            .or_default()
            .insert(id.to_owned(), data.to_owned());
    }

    /// Fetch a previously cached fragment.
    #[must_use]
    pub fn cached_fragment(&self, category: &str, id: &str) -> Option<&str> {
        self.fragments
            .get(category)
            .and_then(|c| c.get(id))
            .map(String::as_str)
    }

    /// Register a callback fired when `id`'s rendered HTML is updated.
    pub fn register_update_callback(&mut self, id: &str, callback: Box<dyn FnMut(&str)>) {
        self.callbacks.insert(id.to_owned(), callback);
    }

    /// Notify that an element's HTML changed. Fires the registered callback
    /// when one exists; otherwise the update is only logged.
    pub fn update_element(&mut self, id: &str, html: &str) {
        if let Some(callback) = self.callbacks.get_mut(id) {
            callback(html);
        } else {
            debug!("element '{id}' updated with no registered callback");
        }
    }

    /// Drop all fragments and callbacks.
    pub fn clear(&mut self) {
        self.fragments.clear();
        self.callbacks.clear();
    }
}

/// Drives the parse lifecycle over an ordered extension set.
///
/// Extensions are registered in a fixed order (heading, code, link, image,
/// then any later additions); `postprocess` threads the document through
/// them in that same order, so output of one is input of the next — the
/// ordering is a correctness contract, not an implementation detail.
pub struct MarkdownPipeline {
    extensions: Vec<Box<dyn RenderExtension>>,
    fragments: FragmentHandle,
}

impl MarkdownPipeline {
    /// Create an empty pipeline.
    #[must_use]
    pub fn new() -> Self {
        Self {
            extensions: Vec::new(),
            fragments: Rc::new(RefCell::new(FragmentCache::default())),
        }
    }

    /// Register an extension. Registration order is dispatch and
    /// postprocess order.
    #[must_use]
    pub fn with_extension<E: RenderExtension + 'static>(mut self, extension: E) -> Self {
        self.extensions.push(Box::new(extension));
        self
    }

    /// Handle to the fragment cache, for extensions constructed with one.
    #[must_use]
    pub fn fragments(&self) -> FragmentHandle {
        Rc::clone(&self.fragments)
    }

    /// Render markdown (front matter already stripped) to HTML.
    ///
    /// Runs `prepare` on every extension, threads the source through each
    /// extension's `preprocess`, renders, then threads the HTML through
    /// each extension's `postprocess` in registration order.
    pub fn parse(&mut self, text: &str) -> Result<String, RenderError> {
        for ext in &mut self.extensions {
            ext.prepare();
        }

        let mut markdown = None;
        for ext in &mut self.extensions {
            let source = markdown.as_deref().unwrap_or(text);
            if let Some(rewritten) = ext.preprocess(source) {
                markdown = Some(rewritten);
            }
        }

        let mut html = EventRenderer::new(&mut self.extensions).render(markdown.as_deref().unwrap_or(text));

        for ext in &mut self.extensions {
            html = ext.postprocess(html)?;
        }
        Ok(html)
    }

    /// Render for publishing: `parse`, then every extension's
    /// `before_publish` (uploads and resource rewriting), then `cleanup`
    /// on every extension — unconditionally, even when an earlier stage
    /// failed, so per-document state cannot leak into the next pass.
    pub fn parse_for_publish(&mut self, text: &str) -> Result<String, RenderError> {
        let result = self.parse(text).and_then(|parsed| {
            let mut html = parsed;
            for ext in &mut self.extensions {
                html = ext.before_publish(html)?;
            }
            Ok(html)
        });

        for ext in &mut self.extensions {
            ext.cleanup();
        }
        self.fragments.borrow_mut().clear();

        result
    }
}

impl Default for MarkdownPipeline {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    struct MarkerExtension {
        prepared: Arc<AtomicUsize>,
    }

    impl RenderExtension for MarkerExtension {
        fn name(&self) -> &'static str {
            "marker"
        }

        fn prepare(&mut self) {
            self.prepared.fetch_add(1, Ordering::SeqCst);
        }

        fn postprocess(&mut self, html: String) -> Result<String, RenderError> {
            Ok(format!("{html}<!--marker-->"))
        }
    }

    struct UpperExtension;

    impl RenderExtension for UpperExtension {
        fn name(&self) -> &'static str {
            "upper"
        }

        fn postprocess(&mut self, html: String) -> Result<String, RenderError> {
            Ok(html.replace("<!--marker-->", "<!--MARKER-->"))
        }
    }

    struct FailingExtension;

    impl RenderExtension for FailingExtension {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn before_publish(&mut self, _html: String) -> Result<String, RenderError> {
            Err(RenderError::extension("failing", "before_publish", "upload refused"))
        }
    }

    struct CleanupProbe {
        cleaned: Arc<AtomicBool>,
    }

    impl RenderExtension for CleanupProbe {
        fn name(&self) -> &'static str {
            "probe"
        }

        fn cleanup(&mut self) {
            self.cleaned.store(true, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_parse_without_extensions() {
        let mut pipeline = MarkdownPipeline::new();
        assert_eq!(pipeline.parse("hello").unwrap(), "<p>hello</p>");
    }

    #[test]
    fn test_prepare_runs_each_parse() {
        let prepared = Arc::new(AtomicUsize::new(0));
        let mut pipeline = MarkdownPipeline::new().with_extension(MarkerExtension {
            prepared: Arc::clone(&prepared),
        });
        pipeline.parse("a").unwrap();
        pipeline.parse("b").unwrap();
        assert_eq!(prepared.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_postprocess_threads_in_registration_order() {
        let prepared = Arc::new(AtomicUsize::new(0));
        let mut pipeline = MarkdownPipeline::new()
            .with_extension(MarkerExtension { prepared })
            .with_extension(UpperExtension);
        // UpperExtension only sees the marker if it runs after MarkerExtension.
        let html = pipeline.parse("x").unwrap();
        assert!(html.ends_with("<!--MARKER-->"));
    }

    #[test]
    fn test_cleanup_runs_when_before_publish_fails() {
        let cleaned = Arc::new(AtomicBool::new(false));
        let mut pipeline = MarkdownPipeline::new()
            .with_extension(FailingExtension)
            .with_extension(CleanupProbe {
                cleaned: Arc::clone(&cleaned),
            });

        let err = pipeline.parse_for_publish("x").unwrap_err();
        assert!(err.to_string().contains("upload refused"));
        assert!(cleaned.load(Ordering::SeqCst));
    }

    #[test]
    fn test_fragment_cache_last_write_wins() {
        let mut cache = FragmentCache::default();
        cache.cache_fragment("math", "eq-1", "first");
        cache.cache_fragment("math", "eq-1", "second");
        assert_eq!(cache.cached_fragment("math", "eq-1"), Some("second"));
        assert_eq!(cache.cached_fragment("other", "eq-1"), None);
    }

    #[test]
    fn test_update_callback_fires() {
        let seen: Rc<RefCell<Vec<String>>> = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);

        let mut cache = FragmentCache::default();
        cache.register_update_callback(
            "img-1",
            Box::new(move |html| sink.borrow_mut().push(html.to_owned())),
        );
        cache.update_element("img-1", "<img src=\"new\">");
        cache.update_element("img-2", "ignored");

        assert_eq!(seen.borrow().as_slice(), ["<img src=\"new\">"]);
    }

    #[test]
    fn test_fragment_cache_cleared_after_publish() {
        let mut pipeline = MarkdownPipeline::new();
        pipeline
            .fragments()
            .borrow_mut()
            .cache_fragment("card", "c1", "data");
        pipeline.parse_for_publish("x").unwrap();
        assert_eq!(
            pipeline.fragments().borrow().cached_fragment("card", "c1"),
            None
        );
    }
}
