//! Per-construct accumulation state for the event walker.

use pulldown_cmark::{Alignment, HeadingLevel};

/// In-progress heading: plain text for anchor generation, rendered inline
/// HTML for the element body.
#[derive(Debug, Default)]
pub(crate) struct HeadingState {
    pub level: u8,
    pub text: String,
    pub html: String,
}

/// In-progress link: destination plus accumulated visible text.
#[derive(Debug, Default)]
pub(crate) struct LinkState {
    pub dest: String,
    pub title: String,
    pub text: String,
}

/// In-progress image: source plus accumulated alt text.
#[derive(Debug, Default)]
pub(crate) struct ImageState {
    pub dest: String,
    pub title: String,
    pub alt: String,
}

/// In-progress code block.
#[derive(Debug, Default)]
pub(crate) struct CodeState {
    pub lang: Option<String>,
    pub content: String,
}

/// Table rendering state: column alignments and head/body position.
#[derive(Debug, Default)]
pub(crate) struct TableState {
    alignments: Vec<Alignment>,
    in_head: bool,
    cell: usize,
}

impl TableState {
    pub fn start(&mut self, alignments: Vec<Alignment>) {
        self.alignments = alignments;
        self.in_head = false;
        self.cell = 0;
    }

    pub fn start_head(&mut self) {
        self.in_head = true;
        self.cell = 0;
    }

    pub fn end_head(&mut self) {
        self.in_head = false;
    }

    pub fn start_row(&mut self) {
        self.cell = 0;
    }

    pub fn next_cell(&mut self) {
        self.cell += 1;
    }

    pub fn is_in_head(&self) -> bool {
        self.in_head
    }

    /// Inline alignment attribute for the current cell.
    pub fn current_alignment_style(&self) -> &'static str {
        match self.alignments.get(self.cell) {
            Some(Alignment::Left) => r#" style="text-align: left""#,
            Some(Alignment::Center) => r#" style="text-align: center""#,
            Some(Alignment::Right) => r#" style="text-align: right""#,
            _ => "",
        }
    }
}

/// Convert heading level enum to number (1-6).
pub(crate) fn heading_level_to_num(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}
