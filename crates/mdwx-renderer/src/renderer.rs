//! Event walker turning markdown events into HTML with extension dispatch.

use std::fmt::Write;

use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag, TagEnd};

use crate::extension::RenderExtension;
use crate::state::{CodeState, HeadingState, ImageState, LinkState, TableState, heading_level_to_num};
use crate::util::escape_html;

/// Parser options: GFM features on, matching the plugin this replaces.
pub(crate) fn parser_options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
        | Options::ENABLE_GFM
}

/// One rendering pass over a markdown document.
///
/// Borrows the pipeline's extensions for token dispatch: heading, code
/// block, link, and image tokens are offered to each extension in
/// registration order; the first `Some` wins, otherwise the built-in
/// rendering applies. Everything else (lists, tables, inline formatting)
/// renders generically.
pub(crate) struct EventRenderer<'e> {
    extensions: &'e mut [Box<dyn RenderExtension>],
    output: String,
    code: Option<CodeState>,
    heading: Option<HeadingState>,
    link: Option<LinkState>,
    image: Option<ImageState>,
    table: TableState,
}

impl<'e> EventRenderer<'e> {
    pub fn new(extensions: &'e mut [Box<dyn RenderExtension>]) -> Self {
        Self {
            extensions,
            output: String::with_capacity(4096),
            code: None,
            heading: None,
            link: None,
            image: None,
            table: TableState::default(),
        }
    }

    pub fn render(mut self, markdown: &str) -> String {
        for event in Parser::new_ext(markdown, parser_options()) {
            self.process_event(event);
        }
        self.output
    }

    fn process_event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start_tag(tag),
            Event::End(tag) => self.end_tag(tag),
            Event::Text(text) => self.text(&text),
            Event::Code(code) => self.inline_code(&code),
            Event::Html(html) | Event::InlineHtml(html) => self.raw_html(&html),
            Event::SoftBreak | Event::HardBreak => self.line_break(),
            Event::Rule => self.output.push_str("<hr>"),
            Event::TaskListMarker(checked) => self.task_list_marker(checked),
            Event::FootnoteReference(_) | Event::InlineMath(_) | Event::DisplayMath(_) => {
                // Not supported
            }
        }
    }

    /// Write inline markup to whichever buffer is currently collecting.
    /// Links and images collect plain text only, so markup is dropped there.
    fn push_inline(&mut self, content: &str) {
        if self.link.is_some() || self.image.is_some() {
            return;
        }
        if let Some(heading) = &mut self.heading {
            heading.html.push_str(content);
        } else {
            self.output.push_str(content);
        }
    }

    fn start_tag(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph => {
                if self.code.is_none() {
                    self.output.push_str("<p>");
                }
            }
            Tag::Heading { level, .. } => {
                self.heading = Some(HeadingState {
                    level: heading_level_to_num(level),
                    ..HeadingState::default()
                });
            }
            Tag::BlockQuote(_) => self.output.push_str("<blockquote>"),
            Tag::CodeBlock(kind) => {
                let lang = match kind {
                    CodeBlockKind::Fenced(ref info) if !info.is_empty() => {
                        info.split_whitespace().next().map(str::to_owned)
                    }
                    _ => None,
                };
                self.code = Some(CodeState {
                    lang,
                    content: String::new(),
                });
            }
            Tag::List(start) => match start {
                Some(1) => self.output.push_str("<ol>"),
                Some(n) => write!(self.output, r#"<ol start="{n}">"#).unwrap(),
                None => self.output.push_str("<ul>"),
            },
            Tag::Item => self.output.push_str("<li>"),
            Tag::Table(alignments) => {
                self.table.start(alignments.clone());
                self.output.push_str("<table>");
            }
            Tag::TableHead => {
                self.table.start_head();
                self.output.push_str("<thead><tr>");
            }
            Tag::TableRow => {
                self.table.start_row();
                self.output.push_str("<tr>");
            }
            Tag::TableCell => {
                let align = self.table.current_alignment_style();
                let tag = if self.table.is_in_head() { "th" } else { "td" };
                write!(self.output, "<{tag}{align}>").unwrap();
            }
            Tag::Emphasis => self.push_inline("<em>"),
            Tag::Strong => self.push_inline("<strong>"),
            Tag::Strikethrough => self.push_inline("<s>"),
            Tag::Link { dest_url, title, .. } => {
                self.link = Some(LinkState {
                    dest: dest_url.to_string(),
                    title: title.to_string(),
                    text: String::new(),
                });
            }
            Tag::Image { dest_url, title, .. } => {
                self.image = Some(ImageState {
                    dest: dest_url.to_string(),
                    title: title.to_string(),
                    alt: String::new(),
                });
            }
            Tag::DefinitionList => self.output.push_str("<dl>"),
            Tag::DefinitionListTitle => self.output.push_str("<dt>"),
            Tag::DefinitionListDefinition => self.output.push_str("<dd>"),
            Tag::Superscript => self.push_inline("<sup>"),
            Tag::Subscript => self.push_inline("<sub>"),
            Tag::FootnoteDefinition(_) | Tag::HtmlBlock | Tag::MetadataBlock(_) => {}
        }
    }

    fn end_tag(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => {
                if self.code.is_none() {
                    self.output.push_str("</p>");
                }
            }
            TagEnd::Heading(_) => {
                if let Some(heading) = self.heading.take() {
                    let html = self.dispatch_heading(&heading);
                    self.output.push_str(&html);
                }
            }
            TagEnd::BlockQuote(_) => self.output.push_str("</blockquote>"),
            TagEnd::CodeBlock => {
                if let Some(code) = self.code.take() {
                    let html = self.dispatch_code(&code);
                    self.output.push_str(&html);
                }
            }
            TagEnd::List(ordered) => {
                self.output.push_str(if ordered { "</ol>" } else { "</ul>" });
            }
            TagEnd::Item => self.output.push_str("</li>"),
            TagEnd::Table => self.output.push_str("</tbody></table>"),
            TagEnd::TableHead => {
                self.output.push_str("</tr></thead><tbody>");
                self.table.end_head();
            }
            TagEnd::TableRow => self.output.push_str("</tr>"),
            TagEnd::TableCell => {
                self.output.push_str(if self.table.is_in_head() {
                    "</th>"
                } else {
                    "</td>"
                });
                self.table.next_cell();
            }
            TagEnd::Emphasis => self.push_inline("</em>"),
            TagEnd::Strong => self.push_inline("</strong>"),
            TagEnd::Strikethrough => self.push_inline("</s>"),
            TagEnd::Link => {
                if let Some(link) = self.link.take() {
                    let html = self.dispatch_link(&link);
                    self.output.push_str(&html);
                }
            }
            TagEnd::Image => {
                if let Some(image) = self.image.take() {
                    if let Some(link) = &mut self.link {
                        // Image inside a link: only the alt text survives.
                        link.text.push_str(&image.alt);
                    } else {
                        let html = self.dispatch_image(&image);
                        self.output.push_str(&html);
                    }
                }
            }
            TagEnd::DefinitionList => self.output.push_str("</dl>"),
            TagEnd::DefinitionListTitle => self.output.push_str("</dt>"),
            TagEnd::DefinitionListDefinition => self.output.push_str("</dd>"),
            TagEnd::Superscript => self.push_inline("</sup>"),
            TagEnd::Subscript => self.push_inline("</sub>"),
            TagEnd::FootnoteDefinition | TagEnd::HtmlBlock | TagEnd::MetadataBlock(_) => {}
        }
    }

    fn dispatch_heading(&mut self, heading: &HeadingState) -> String {
        let inner = heading.html.trim();
        for ext in self.extensions.iter_mut() {
            if let Some(html) = ext.heading(heading.level, &heading.text, inner) {
                return html;
            }
        }
        format!("<h{0}>{inner}</h{0}>", heading.level)
    }

    fn dispatch_code(&mut self, code: &CodeState) -> String {
        for ext in self.extensions.iter_mut() {
            if let Some(html) = ext.code_block(code.lang.as_deref(), &code.content) {
                return html;
            }
        }
        match &code.lang {
            Some(lang) => format!(
                r#"<pre><code class="language-{}">{}</code></pre>"#,
                escape_html(lang),
                escape_html(&code.content)
            ),
            None => format!("<pre><code>{}</code></pre>", escape_html(&code.content)),
        }
    }

    fn dispatch_link(&mut self, link: &LinkState) -> String {
        for ext in self.extensions.iter_mut() {
            if let Some(html) = ext.link(&link.dest, &link.title, &link.text) {
                return html;
            }
        }
        format!(
            r#"<a href="{}">{}</a>"#,
            escape_html(&link.dest),
            escape_html(&link.text)
        )
    }

    fn dispatch_image(&mut self, image: &ImageState) -> String {
        for ext in self.extensions.iter_mut() {
            if let Some(html) = ext.image(&image.dest, &image.title, &image.alt) {
                return html;
            }
        }
        format!(
            r#"<img src="{}" alt="{}">"#,
            escape_html(&image.dest),
            escape_html(&image.alt)
        )
    }

    fn text(&mut self, text: &str) {
        if let Some(code) = &mut self.code {
            code.content.push_str(text);
        } else if let Some(image) = &mut self.image {
            image.alt.push_str(text);
        } else if let Some(link) = &mut self.link {
            link.text.push_str(text);
        } else if let Some(heading) = &mut self.heading {
            heading.text.push_str(text);
            heading.html.push_str(&escape_html(text));
        } else {
            self.output.push_str(&escape_html(text));
        }
    }

    fn inline_code(&mut self, code: &str) {
        if let Some(image) = &mut self.image {
            image.alt.push_str(code);
        } else if let Some(link) = &mut self.link {
            link.text.push_str(code);
        } else if let Some(heading) = &mut self.heading {
            heading.text.push_str(code);
            write!(heading.html, "<code>{}</code>", escape_html(code)).unwrap();
        } else {
            write!(self.output, "<code>{}</code>", escape_html(code)).unwrap();
        }
    }

    fn raw_html(&mut self, html: &str) {
        if let Some(heading) = &mut self.heading {
            heading.html.push_str(html);
        } else {
            self.output.push_str(html);
        }
    }

    /// Soft and hard breaks both render `<br>`: the publish transport
    /// strips literal newlines, so they must survive as markup.
    fn line_break(&mut self) {
        if let Some(code) = &mut self.code {
            code.content.push('\n');
        } else if let Some(image) = &mut self.image {
            image.alt.push(' ');
        } else if let Some(link) = &mut self.link {
            link.text.push(' ');
        } else {
            self.push_inline("<br>");
        }
    }

    fn task_list_marker(&mut self, checked: bool) {
        self.output.push_str(if checked {
            r#"<input type="checkbox" checked disabled>"#
        } else {
            r#"<input type="checkbox" disabled>"#
        });
    }
}
