//! Extension-based markdown renderer producing WeChat article HTML.
//!
//! This crate converts note markdown (front matter already stripped) into
//! the semantic HTML fragment that the article formatter later themes and
//! publishes. The conversion is driven by [`MarkdownPipeline`], which owns
//! an ordered set of [`RenderExtension`]s — heading, code, link, image —
//! each hooking into the parse at token granularity and contributing
//! document-level postprocessing.
//!
//! # Lifecycle
//!
//! One document pass runs `prepare` → `preprocess` (markdown source) →
//! token rendering → `postprocess` (HTML, threaded extension-by-extension).
//! Publishing additionally runs `before_publish` (network side effects such
//! as image upload, plus resource-reference rewriting) and then `cleanup`
//! unconditionally, so per-document extension state never leaks into the
//! next pass.
//!
//! # Example
//!
//! ```
//! use mdwx_renderer::{HeadingExtension, MarkdownPipeline};
//!
//! let mut pipeline = MarkdownPipeline::new().with_extension(HeadingExtension::new());
//! let html = pipeline.parse("# Hello\n\n**Bold** text").unwrap();
//! assert!(html.contains("wechat-heading-1"));
//! ```

mod extension;
mod extensions;
mod pipeline;
mod renderer;
mod state;
mod util;

pub use extension::{MediaUploader, RenderError, RenderExtension, UploadError};
pub use extensions::code::CodeExtension;
pub use extensions::heading::HeadingExtension;
pub use extensions::image::ImageExtension;
pub use extensions::link::{LinkExtension, LinkStyle};
pub use pipeline::{FragmentCache, FragmentHandle, MarkdownPipeline};
pub use util::{clean_url, escape_html, strip_tags};
