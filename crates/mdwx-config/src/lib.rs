//! Configuration management for mdwx.
//!
//! Parses `mdwx.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! Credential values support environment variable expansion:
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default
//!
//! Expanded fields: `wechat.appid`, `wechat.secret`.

mod expand;

use std::path::{Path, PathBuf};

use serde::Deserialize;

use mdwx_renderer::LinkStyle;

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "mdwx.toml";

/// Error from configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read.
    #[error("cannot read {}: {source}", path.display())]
    Io {
        /// Path that failed.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Config file is not valid TOML.
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Environment variable expansion failed.
    #[error("config field {field}: {message}")]
    EnvVar {
        /// Field being expanded.
        field: String,
        /// What went wrong.
        message: String,
    },
}

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override the note collection root.
    pub store_root: Option<PathBuf>,
    /// Override the theme name.
    pub theme: Option<String>,
    /// Override the highlight theme name.
    pub highlight: Option<String>,
    /// Override auto-publish behavior.
    pub auto_publish: Option<bool>,
}

/// WeChat account configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct WeChatConfig {
    /// Official Account appid (supports `${VAR}` expansion).
    pub appid: String,
    /// Official Account secret (supports `${VAR}` expansion).
    pub secret: String,
    /// Author used when a note has none.
    pub default_author: String,
    /// Submit drafts for publication right after creating them.
    pub auto_publish: bool,
}

/// Rendering configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Render code sections with a line-number gutter.
    pub line_numbers: bool,
    /// External link rendering style (`inline` or `footnote`).
    pub link_style: LinkStyle,
}

/// Theme configuration (paths are relative strings from TOML).
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ThemeConfigRaw {
    theme: Option<String>,
    highlight: Option<String>,
    assets_dir: Option<String>,
}

/// Resolved theme configuration.
#[derive(Debug, Default)]
pub struct ThemeConfig {
    /// Default theme name (empty selects the built-in).
    pub theme: String,
    /// Default highlight theme name (empty selects the built-in).
    pub highlight: String,
    /// External theme assets directory, absolute.
    pub assets_dir: Option<PathBuf>,
}

/// Raw store configuration as parsed from TOML.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct StoreConfigRaw {
    root: Option<String>,
}

/// Resolved store configuration with an absolute root.
#[derive(Debug, Default)]
pub struct StoreConfig {
    /// Note collection root directory.
    pub root: PathBuf,
}

/// Application configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// WeChat account configuration.
    pub wechat: WeChatConfig,
    /// Rendering configuration.
    pub render: RenderConfig,
    theme: ThemeConfigRaw,
    store: StoreConfigRaw,

    /// Resolved theme configuration (set after loading).
    #[serde(skip)]
    pub theme_resolved: ThemeConfig,
    /// Resolved store configuration (set after loading).
    #[serde(skip)]
    pub store_resolved: StoreConfig,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration starting from `dir`, walking parent directories
    /// until an `mdwx.toml` is found. Falls back to defaults when no config
    /// file exists.
    pub fn load(dir: &Path, cli: &CliSettings) -> Result<Self, ConfigError> {
        let (mut config, base) = match Self::discover(dir) {
            Some(path) => {
                let text = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
                    path: path.clone(),
                    source,
                })?;
                let mut config: Self = toml::from_str(&text)?;
                let base = path.parent().unwrap_or(dir).to_path_buf();
                config.config_path = Some(path);
                (config, base)
            }
            None => (Self::default(), dir.to_path_buf()),
        };

        config.wechat.appid = expand::expand_env(&config.wechat.appid, "wechat.appid")?;
        config.wechat.secret = expand::expand_env(&config.wechat.secret, "wechat.secret")?;

        config.theme_resolved = ThemeConfig {
            theme: config.theme.theme.clone().unwrap_or_default(),
            highlight: config.theme.highlight.clone().unwrap_or_default(),
            assets_dir: config.theme.assets_dir.as_ref().map(|d| resolve(&base, d)),
        };
        config.store_resolved = StoreConfig {
            root: config
                .store
                .root
                .as_ref()
                .map_or_else(|| base.clone(), |r| resolve(&base, r)),
        };

        // CLI overrides
        if let Some(root) = &cli.store_root {
            config.store_resolved.root.clone_from(root);
        }
        if let Some(theme) = &cli.theme {
            config.theme_resolved.theme.clone_from(theme);
        }
        if let Some(highlight) = &cli.highlight {
            config.theme_resolved.highlight.clone_from(highlight);
        }
        if let Some(auto_publish) = cli.auto_publish {
            config.wechat.auto_publish = auto_publish;
        }

        Ok(config)
    }

    /// Find the nearest `mdwx.toml` in `dir` or any parent directory.
    #[must_use]
    pub fn discover(dir: &Path) -> Option<PathBuf> {
        dir.ancestors()
            .map(|d| d.join(CONFIG_FILENAME))
            .find(|candidate| candidate.is_file())
    }
}

fn resolve(base: &Path, value: &str) -> PathBuf {
    let path = PathBuf::from(value);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_without_config_file() {
        let dir = TempDir::new().unwrap();
        let config = Config::load(dir.path(), &CliSettings::default()).unwrap();
        assert_eq!(config.config_path, None);
        assert_eq!(config.store_resolved.root, dir.path());
        assert_eq!(config.render.link_style, LinkStyle::Inline);
        assert!(!config.wechat.auto_publish);
    }

    #[test]
    fn test_load_full_config() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("mdwx.toml"),
            r#"
[wechat]
appid = "wx123"
secret = "s3cret"
default_author = "Team"
auto_publish = true

[render]
line_numbers = true
link_style = "footnote"

[theme]
theme = "simple-blue"
assets_dir = "assets"

[store]
root = "notes"
"#,
        )
        .unwrap();

        let config = Config::load(dir.path(), &CliSettings::default()).unwrap();
        assert_eq!(config.wechat.appid, "wx123");
        assert_eq!(config.wechat.default_author, "Team");
        assert!(config.wechat.auto_publish);
        assert!(config.render.line_numbers);
        assert_eq!(config.render.link_style, LinkStyle::Footnote);
        assert_eq!(config.theme_resolved.theme, "simple-blue");
        assert_eq!(
            config.theme_resolved.assets_dir,
            Some(dir.path().join("assets"))
        );
        assert_eq!(config.store_resolved.root, dir.path().join("notes"));
    }

    #[test]
    fn test_discover_in_parent() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("mdwx.toml"), "").unwrap();
        let nested = dir.path().join("a/b");
        std::fs::create_dir_all(&nested).unwrap();

        assert_eq!(
            Config::discover(&nested),
            Some(dir.path().join(CONFIG_FILENAME))
        );
    }

    #[test]
    fn test_env_expansion_in_secret() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::set_var("MDWX_CFG_SECRET", "expanded");
        }
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("mdwx.toml"),
            "[wechat]\nappid = \"wx1\"\nsecret = \"${MDWX_CFG_SECRET}\"\n",
        )
        .unwrap();

        let config = Config::load(dir.path(), &CliSettings::default()).unwrap();
        assert_eq!(config.wechat.secret, "expanded");
        unsafe {
            std::env::remove_var("MDWX_CFG_SECRET");
        }
    }

    #[test]
    fn test_cli_overrides() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("mdwx.toml"), "[theme]\ntheme = \"a\"\n").unwrap();

        let cli = CliSettings {
            theme: Some("b".to_owned()),
            auto_publish: Some(true),
            store_root: Some(PathBuf::from("/elsewhere")),
            highlight: None,
        };
        let config = Config::load(dir.path(), &cli).unwrap();
        assert_eq!(config.theme_resolved.theme, "b");
        assert!(config.wechat.auto_publish);
        assert_eq!(config.store_resolved.root, PathBuf::from("/elsewhere"));
    }

    #[test]
    fn test_invalid_toml_rejected() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("mdwx.toml"), "not [valid").unwrap();
        assert!(matches!(
            Config::load(dir.path(), &CliSettings::default()),
            Err(ConfigError::Parse(_))
        ));
    }
}
