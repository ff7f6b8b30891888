//! CLI error types.

use mdwx_article::ArticleError;
use mdwx_config::ConfigError;
use mdwx_store::StoreError;
use mdwx_wechat::WeChatError;

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Article(#[from] ArticleError),

    #[error("{0}")]
    WeChat(#[from] WeChatError),

    #[error("{0}")]
    Store(#[from] StoreError),

    #[error("{0}")]
    Io(#[from] std::io::Error),
}
