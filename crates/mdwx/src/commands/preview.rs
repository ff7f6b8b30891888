//! `preview` command.

use std::path::PathBuf;

use clap::Args;

use mdwx_config::CliSettings;

use super::{build_publisher, load_config, note_path};
use crate::error::CliError;
use crate::output::Output;

/// Render a note to themed HTML for local inspection.
#[derive(Args)]
pub(crate) struct PreviewArgs {
    /// Note to render (path inside the note collection).
    note: PathBuf,

    /// Output HTML file (defaults to the note name with `.html`).
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Theme to render with.
    #[arg(long)]
    theme: Option<String>,

    /// Highlight theme to render with.
    #[arg(long)]
    highlight: Option<String>,
}

impl PreviewArgs {
    pub(crate) fn execute(&self, output: &Output) -> Result<(), CliError> {
        let cli = CliSettings {
            theme: self.theme.clone(),
            highlight: self.highlight.clone(),
            ..CliSettings::default()
        };
        let config = load_config(&cli)?;
        let mut publisher = build_publisher(&config);

        let note = note_path(&config, &self.note);
        let html = publisher.preview(&note)?;

        let target = self.output.clone().unwrap_or_else(|| {
            let stem = self
                .note
                .file_stem()
                .map_or_else(|| "preview".to_owned(), |s| s.to_string_lossy().into_owned());
            PathBuf::from(format!("{stem}.html"))
        });
        std::fs::write(&target, html)?;

        output.success(&format!("Preview written to {}", target.display()));
        Ok(())
    }
}
