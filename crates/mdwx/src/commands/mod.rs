//! CLI command implementations.

mod preview;
mod publish;

use std::path::Path;
use std::sync::Arc;

pub(crate) use preview::PreviewArgs;
pub(crate) use publish::PublishArgs;

use mdwx_article::{ArticlePublisher, PublishApi, PublishSettings};
use mdwx_config::{CliSettings, Config};
use mdwx_store::{FsStore, NoteStore};
use mdwx_theme::ThemeRegistry;
use mdwx_wechat::WeChatClient;

use crate::error::CliError;
use crate::output::Output;

/// Load config from the working directory with CLI overrides applied.
pub(crate) fn load_config(cli: &CliSettings) -> Result<Config, CliError> {
    let cwd = std::env::current_dir()?;
    Ok(Config::load(&cwd, cli)?)
}

/// Theme registry per configuration: built-ins plus any external assets.
pub(crate) fn build_registry(config: &Config) -> ThemeRegistry {
    ThemeRegistry::from_assets_dir(config.theme_resolved.assets_dir.as_deref())
}

/// Wire up the full publisher from configuration.
pub(crate) fn build_publisher(config: &Config) -> ArticlePublisher {
    let store: Arc<dyn NoteStore> = Arc::new(FsStore::new(&config.store_resolved.root));
    let client: Arc<dyn PublishApi> = Arc::new(WeChatClient::new(
        &config.wechat.appid,
        &config.wechat.secret,
        Arc::clone(&store),
    ));

    let settings = PublishSettings {
        default_author: config.wechat.default_author.clone(),
        auto_publish: config.wechat.auto_publish,
        line_numbers: config.render.line_numbers,
        link_style: config.render.link_style,
        theme: config.theme_resolved.theme.clone(),
        highlight: config.theme_resolved.highlight.clone(),
    };

    ArticlePublisher::new(store, client, build_registry(config), settings)
}

/// Note path relative to the store root, from whatever the user typed.
pub(crate) fn note_path(config: &Config, note: &Path) -> String {
    note.strip_prefix(&config.store_resolved.root)
        .unwrap_or(note)
        .to_string_lossy()
        .replace('\\', "/")
}

/// `check` command: verify credentials with a token round-trip.
pub(crate) fn check(output: &Output) -> Result<(), CliError> {
    let config = load_config(&CliSettings::default())?;
    let store: Arc<dyn NoteStore> = Arc::new(FsStore::new(&config.store_resolved.root));
    let client = WeChatClient::new(&config.wechat.appid, &config.wechat.secret, store);

    client.test_connection()?;
    output.success("Connection OK: credentials accepted");
    Ok(())
}

/// `themes` command: list available bundles.
pub(crate) fn themes(output: &Output) -> Result<(), CliError> {
    let config = load_config(&CliSettings::default())?;
    let registry = build_registry(&config);

    output.highlight("Themes:");
    for theme in registry.themes() {
        let description = if theme.description.is_empty() {
            String::new()
        } else {
            format!(" - {}", theme.description)
        };
        output.info(&format!("  {}{description}", theme.name));
    }

    output.highlight("Highlight themes:");
    for highlight in registry.highlights() {
        output.info(&format!("  {}", highlight.name));
    }
    Ok(())
}
