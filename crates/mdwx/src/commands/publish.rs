//! `publish` command.

use std::path::PathBuf;

use clap::Args;

use mdwx_config::CliSettings;

use super::{build_publisher, load_config, note_path};
use crate::error::CliError;
use crate::output::Output;

/// Render a note and create a WeChat draft.
#[derive(Args)]
pub(crate) struct PublishArgs {
    /// Note to publish (path inside the note collection).
    note: PathBuf,

    /// Create the draft but do not submit it for publication.
    #[arg(long)]
    draft_only: bool,

    /// Theme to render with.
    #[arg(long)]
    theme: Option<String>,

    /// Highlight theme to render with.
    #[arg(long)]
    highlight: Option<String>,
}

impl PublishArgs {
    pub(crate) fn execute(&self, output: &Output) -> Result<(), CliError> {
        let cli = CliSettings {
            theme: self.theme.clone(),
            highlight: self.highlight.clone(),
            auto_publish: self.draft_only.then_some(false),
            ..CliSettings::default()
        };
        let config = load_config(&cli)?;
        let mut publisher = build_publisher(&config);

        let note = note_path(&config, &self.note);
        let outcome = publisher.publish(&note)?;

        output.success(&format!("Draft created: {}", outcome.draft_id));
        match outcome.publish_id {
            Some(publish_id) => {
                output.success(&format!("Submitted for publication: {publish_id}"));
            }
            None => output.info("Draft left unpublished; submit it from the WeChat console."),
        }
        Ok(())
    }
}
