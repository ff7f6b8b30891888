//! Theme and highlight stylesheet registry.
//!
//! A [`ThemeRegistry`] holds named article themes and code-highlight themes,
//! seeded with one built-in default of each, optionally extended from an
//! assets directory. [`ThemeRegistry::apply_theme`] concatenates theme CSS,
//! highlight CSS, and custom CSS — in that order, because the publish-time
//! inliner gives later rules priority, so concatenation order is a
//! behavioral contract rather than cosmetics.
//!
//! The registry is an explicitly constructed value passed to whoever needs
//! it; preview and publish share one instance by sharing the reference, and
//! tests construct their own.

use std::path::Path;

use serde::Deserialize;
use tracing::warn;

/// Built-in article theme stylesheet.
const DEFAULT_THEME_CSS: &str = include_str!("../assets/default.css");

/// Built-in code highlight stylesheet.
const DEFAULT_HIGHLIGHT_CSS: &str = include_str!("../assets/github.css");

/// Manifest filename for external themes.
const THEMES_MANIFEST: &str = "themes.toml";

/// Manifest filename for external highlights.
const HIGHLIGHTS_MANIFEST: &str = "highlights.toml";

/// A named article theme bundle.
#[derive(Clone, Debug, Deserialize)]
pub struct ThemeDefinition {
    /// Display name.
    pub name: String,
    /// CSS class / filename stem.
    #[serde(rename = "class")]
    pub class_name: String,
    /// Short description.
    #[serde(default)]
    pub description: String,
    /// Author attribution.
    #[serde(default)]
    pub author: String,
    /// Bundle version.
    #[serde(default)]
    pub version: String,
    /// Stylesheet text (loaded from the bundle's CSS file).
    #[serde(skip)]
    pub css: String,
}

/// A named code-highlight theme bundle.
#[derive(Clone, Debug, Deserialize)]
pub struct HighlightDefinition {
    /// Name, also the filename stem.
    pub name: String,
    /// Short description.
    #[serde(default)]
    pub description: String,
    /// Stylesheet text (loaded from the bundle's CSS file).
    #[serde(skip)]
    pub css: String,
}

#[derive(Deserialize)]
struct ThemesManifest {
    #[serde(default)]
    themes: Vec<ThemeDefinition>,
}

#[derive(Deserialize)]
struct HighlightsManifest {
    #[serde(default)]
    highlights: Vec<HighlightDefinition>,
}

/// Error loading external theme assets.
#[derive(Debug, thiserror::Error)]
pub enum ThemeError {
    /// Manifest TOML could not be parsed.
    #[error("invalid theme manifest: {0}")]
    Manifest(#[from] toml::de::Error),

    /// I/O error reading manifest or CSS files.
    #[error("I/O error")]
    Io(#[from] std::io::Error),
}

/// Registry of theme and highlight bundles plus user custom CSS.
pub struct ThemeRegistry {
    themes: Vec<ThemeDefinition>,
    highlights: Vec<HighlightDefinition>,
    custom_css: String,
}

impl ThemeRegistry {
    /// Create a registry containing only the built-in bundles.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self {
            themes: vec![ThemeDefinition {
                name: "default".to_owned(),
                class_name: "default".to_owned(),
                description: "Built-in article theme".to_owned(),
                author: "mdwx".to_owned(),
                version: env!("CARGO_PKG_VERSION").to_owned(),
                css: DEFAULT_THEME_CSS.to_owned(),
            }],
            highlights: vec![HighlightDefinition {
                name: "github".to_owned(),
                description: "GitHub-style code highlighting".to_owned(),
                css: DEFAULT_HIGHLIGHT_CSS.to_owned(),
            }],
            custom_css: String::new(),
        }
    }

    /// Create a registry with defaults, extended from an assets directory
    /// when one is configured.
    ///
    /// Load failures keep the built-ins and log a warning; a missing or
    /// broken assets directory never breaks rendering.
    #[must_use]
    pub fn from_assets_dir(dir: Option<&Path>) -> Self {
        let mut registry = Self::with_defaults();
        if let Some(dir) = dir
            && let Err(err) = registry.load_external(dir)
        {
            warn!("failed to load theme assets from {}: {err}", dir.display());
        }
        registry
    }

    /// Load external bundles from an assets directory.
    ///
    /// Layout: `themes.toml` + `themes/<class>.css`, `highlights.toml` +
    /// `highlights/<name>.css`, and an optional free-form `custom.css`.
    /// Bundles whose CSS file is missing are skipped with a warning.
    pub fn load_external(&mut self, dir: &Path) -> Result<(), ThemeError> {
        let themes_manifest = dir.join(THEMES_MANIFEST);
        if themes_manifest.is_file() {
            let manifest: ThemesManifest =
                toml::from_str(&std::fs::read_to_string(themes_manifest)?)?;
            for mut theme in manifest.themes {
                let css_path = dir.join("themes").join(format!("{}.css", theme.class_name));
                match std::fs::read_to_string(&css_path) {
                    Ok(css) => {
                        theme.css = css;
                        self.themes.push(theme);
                    }
                    Err(err) => warn!(
                        "skipping theme '{}': cannot read {}: {err}",
                        theme.name,
                        css_path.display()
                    ),
                }
            }
        }

        let highlights_manifest = dir.join(HIGHLIGHTS_MANIFEST);
        if highlights_manifest.is_file() {
            let manifest: HighlightsManifest =
                toml::from_str(&std::fs::read_to_string(highlights_manifest)?)?;
            for mut highlight in manifest.highlights {
                let css_path = dir.join("highlights").join(format!("{}.css", highlight.name));
                match std::fs::read_to_string(&css_path) {
                    Ok(css) => {
                        highlight.css = css;
                        self.highlights.push(highlight);
                    }
                    Err(err) => warn!(
                        "skipping highlight '{}': cannot read {}: {err}",
                        highlight.name,
                        css_path.display()
                    ),
                }
            }
        }

        let custom = dir.join("custom.css");
        if custom.is_file() {
            self.custom_css = std::fs::read_to_string(custom)?;
        }

        Ok(())
    }

    /// All registered themes, default first.
    #[must_use]
    pub fn themes(&self) -> &[ThemeDefinition] {
        &self.themes
    }

    /// All registered highlights, default first.
    #[must_use]
    pub fn highlights(&self) -> &[HighlightDefinition] {
        &self.highlights
    }

    /// Look up a theme by name or class, falling back to the default for an
    /// empty or unknown name.
    #[must_use]
    pub fn theme(&self, name: &str) -> &ThemeDefinition {
        if name.is_empty() {
            return &self.themes[0];
        }
        self.themes
            .iter()
            .find(|t| t.name == name || t.class_name == name)
            .unwrap_or(&self.themes[0])
    }

    /// Look up a highlight by name, falling back to the default.
    #[must_use]
    pub fn highlight(&self, name: &str) -> &HighlightDefinition {
        if name.is_empty() {
            return &self.highlights[0];
        }
        self.highlights
            .iter()
            .find(|h| h.name == name)
            .unwrap_or(&self.highlights[0])
    }

    /// Stored user custom CSS.
    #[must_use]
    pub fn custom_css(&self) -> &str {
        &self.custom_css
    }

    /// Replace the stored user custom CSS.
    pub fn set_custom_css(&mut self, css: impl Into<String>) {
        self.custom_css = css.into();
    }

    /// Resolve theme + highlight + custom CSS into one stylesheet.
    ///
    /// Concatenation order (theme, highlight, custom) determines the
    /// inliner's last-write-wins priority for unmarked declarations.
    #[must_use]
    pub fn apply_theme(&self, theme: &str, highlight: &str, custom: Option<&str>) -> String {
        let mut css = String::new();
        css.push_str(&self.theme(theme).css);
        css.push_str("\n\n");
        css.push_str(&self.highlight(highlight).css);
        css.push_str("\n\n");
        match custom {
            Some(custom) if !custom.is_empty() => css.push_str(custom),
            _ => css.push_str(&self.custom_css),
        }
        css
    }
}

impl Default for ThemeRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
