//! Front-matter-derived article metadata.

use serde::{Deserialize, Deserializer};
use tracing::warn;

use crate::error::ArticleError;

/// A yes/no front-matter field tolerant of the value shapes notes actually
/// contain: YAML booleans, 0/1 numbers, or "true"/"false" strings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Flag(pub bool);

impl<'de> Deserialize<'de> for Flag {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_yaml::Value::deserialize(deserializer)?;
        let flag = match &value {
            serde_yaml::Value::Bool(b) => *b,
            serde_yaml::Value::Number(n) => n.as_i64().is_some_and(|v| v != 0),
            serde_yaml::Value::String(s) => {
                matches!(s.trim().to_ascii_lowercase().as_str(), "true" | "yes" | "1")
            }
            _ => false,
        };
        Ok(Self(flag))
    }
}

impl Flag {
    /// As the 0/1 integer the WeChat payload expects.
    #[must_use]
    pub fn as_u8(self) -> u8 {
        u8::from(self.0)
    }
}

/// Metadata parsed from a note's front matter.
///
/// Every field is optional; Chinese field names used by existing notes are
/// honored as aliases of the canonical English keys. Parsed fresh from each
/// file read and round-tripped back on publish-state updates.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct ArticleMetadata {
    /// Article title.
    #[serde(alias = "标题")]
    pub title: Option<String>,
    /// Author byline.
    #[serde(alias = "作者")]
    pub author: Option<String>,
    /// Summary shown in feeds.
    #[serde(alias = "摘要")]
    pub digest: Option<String>,

    /// Cover reference (primary).
    #[serde(alias = "封面")]
    pub banner: Option<String>,
    /// Cover reference by explicit path.
    pub banner_path: Option<String>,
    /// Cover reference (alias).
    pub cover: Option<String>,
    /// Cover reference by URL.
    pub cover_url: Option<String>,
    /// Pre-uploaded cover media id.
    pub thumb_media_id: Option<String>,
    /// Whether to crop the cover.
    #[serde(alias = "封面裁剪")]
    pub crop_enabled: Option<Flag>,

    /// Source link (alias).
    pub source_url: Option<String>,
    /// "Read the original" source link.
    #[serde(alias = "原文地址")]
    pub content_source_url: Option<String>,

    /// Whether comments are open (alias).
    pub open_comment: Option<Flag>,
    /// Whether comments are open.
    #[serde(alias = "打开评论")]
    pub need_open_comment: Option<Flag>,
    /// Whether only followers may comment.
    #[serde(alias = "仅粉丝可评论")]
    pub only_fans_can_comment: Option<Flag>,
    /// Whether the cover shows in the article body (alias).
    pub show_cover: Option<Flag>,
    /// Whether the cover shows in the article body.
    #[serde(alias = "显示封面")]
    pub show_cover_pic: Option<Flag>,

    /// Original-work declaration.
    #[serde(alias = "原创声明")]
    pub is_original: Option<Flag>,
    /// Whether reprinting is allowed.
    pub can_reprint: Option<Flag>,

    /// Article tags.
    pub tags: Option<Vec<String>>,
    /// Article category.
    pub category: Option<String>,
    /// Scheduled publish time.
    pub publish_time: Option<String>,

    /// Draft media id from a previous publish.
    pub media_id: Option<String>,
    /// Unix timestamp of the last publish attempt.
    pub last_publish_time: Option<i64>,
    /// Outcome of the last publish attempt.
    pub publish_status: Option<String>,

    /// Theme override for this note.
    #[serde(alias = "样式")]
    pub theme: Option<String>,
    /// Highlight theme override for this note.
    #[serde(alias = "代码高亮")]
    pub highlight_theme: Option<String>,
    /// Target account name.
    #[serde(alias = "公众号")]
    pub platform: Option<String>,
}

fn non_empty(value: Option<&String>) -> bool {
    value.is_some_and(|v| !v.trim().is_empty())
}

impl ArticleMetadata {
    /// Parse metadata from a front-matter block.
    ///
    /// Lenient: a missing block or malformed YAML yields empty metadata
    /// with a warning, because a broken header should not break preview.
    #[must_use]
    pub fn from_front_matter(block: Option<&str>) -> Self {
        let Some(block) = block else {
            return Self::default();
        };
        if block.trim().is_empty() {
            return Self::default();
        }
        match serde_yaml::from_str(block) {
            Ok(metadata) => metadata,
            Err(err) => {
                warn!("front matter did not parse, treating as empty: {err}");
                Self::default()
            }
        }
    }

    /// Whether any cover reference is present.
    #[must_use]
    pub fn has_cover(&self) -> bool {
        non_empty(self.thumb_media_id.as_ref())
            || non_empty(self.banner.as_ref())
            || non_empty(self.banner_path.as_ref())
            || non_empty(self.cover.as_ref())
            || non_empty(self.cover_url.as_ref())
    }

    /// Cover upload candidates in priority order, with the material name
    /// suffix each one uploads under.
    #[must_use]
    pub fn cover_candidates(&self) -> Vec<(&str, &'static str)> {
        [
            (self.banner.as_ref(), "_banner"),
            (self.banner_path.as_ref(), "_banner"),
            (self.cover.as_ref(), "_cover"),
            (self.cover_url.as_ref(), "_cover"),
        ]
        .into_iter()
        .filter_map(|(value, suffix)| {
            value
                .filter(|v| !v.trim().is_empty())
                .map(|v| (v.as_str(), suffix))
        })
        .collect()
    }

    /// Validate the publish invariant: non-empty title and at least one
    /// cover reference.
    pub fn validate_for_publish(&self) -> Result<(), ArticleError> {
        let mut problems = Vec::new();
        if !non_empty(self.title.as_ref()) {
            problems.push("title must not be empty");
        }
        if !self.has_cover() {
            problems.push(
                "a cover is required: set banner, banner_path, cover, cover_url, or thumb_media_id",
            );
        }
        if problems.is_empty() {
            Ok(())
        } else {
            Err(ArticleError::Validation(problems.join("; ")))
        }
    }
}
