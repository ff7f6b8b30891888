//! Article assembly and publishing.
//!
//! Ties the rendering pipeline to the WeChat draft/publish workflow:
//! front-matter parsing and round-tripping, article metadata, preview and
//! publish formatting (CSS inlining, math-container normalization,
//! sanitization), and the [`ArticlePublisher`] that drives a note from
//! markdown to a created draft.

mod error;
mod formatter;
mod front_matter;
mod metadata;
mod publisher;
mod sanitize;

pub use error::ArticleError;
pub use formatter::{format_for_preview, format_for_publish};
pub use front_matter::{FieldValue, split_front_matter, strip_front_matter, update_front_matter};
pub use metadata::{ArticleMetadata, Flag};
pub use publisher::{ArticlePublisher, PublishApi, PublishOutcome, PublishSettings};
pub use sanitize::sanitize_html;
