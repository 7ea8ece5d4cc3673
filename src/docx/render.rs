//! HTML and plain-text renderings of a DOCX body.
use crate::types::ConversionMessage;
use docx_rust::document::{
    BodyContent, ParagraphContent, RunContent, TableCellContent, TableRowContent,
};
use docx_rust::formatting::CharacterProperty;
use docx_rust::Docx;
use std::collections::BTreeSet;

/// Paragraph styles rendered as plain paragraphs without a warning.
const PLAIN_STYLES: [&str; 8] = [
    "Normal",
    "BodyText",
    "ListParagraph",
    "NoSpacing",
    "Quote",
    "IntenseQuote",
    "Caption",
    "TOC1",
];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Rendering {
    pub html: String,
    /// One block per line, blocks separated by a blank line
    pub text: String,
    pub messages: Vec<ConversionMessage>,
}

/// Render the document body twice: HTML keeps heading structure, the text
/// is what offsets and word counts are measured against.
pub fn render(docx: &Docx) -> Rendering {
    let mut ctx = RenderContext {
        docx,
        html: String::new(),
        blocks: Vec::new(),
        in_list: false,
        unknown_styles: BTreeSet::new(),
        messages: Vec::new(),
    };

    for content in &docx.document.body.content {
        ctx.render_body_content(content);
    }
    ctx.close_list();

    for style in &ctx.unknown_styles {
        ctx.messages.push(ConversionMessage::warning(format!(
            "Unrecognised paragraph style: '{style}'"
        )));
    }

    Rendering {
        html: ctx.html,
        text: ctx.blocks.join("\n\n"),
        messages: ctx.messages,
    }
}

/// Inline content of one paragraph in both renderings.
#[derive(Default)]
struct Inline {
    html: String,
    text: String,
}

struct RenderContext<'a> {
    docx: &'a Docx<'a>,
    html: String,
    blocks: Vec<String>,
    in_list: bool,
    unknown_styles: BTreeSet<String>,
    messages: Vec<ConversionMessage>,
}

impl RenderContext<'_> {
    fn render_body_content(&mut self, content: &BodyContent) {
        match content {
            BodyContent::Paragraph(para) => self.render_paragraph(para),
            BodyContent::Table(table) => self.render_table(table),
            BodyContent::Sdt(sdt) => {
                if let Some(ref sdt_content) = sdt.content {
                    for item in &sdt_content.content {
                        self.render_body_content(item);
                    }
                }
            }
            _ => {}
        }
    }

    fn render_paragraph(&mut self, para: &docx_rust::document::Paragraph) {
        let mut heading_level: Option<u8> = None;
        let mut is_list_item = false;

        if let Some(ref prop) = para.property {
            if let Some(ref style_id) = prop.style_id {
                let id = style_id.value.as_ref();
                heading_level = heading_level_for_style(id);
                if heading_level.is_none() && !PLAIN_STYLES.contains(&id) {
                    self.unknown_styles.insert(id.to_string());
                }
            }
            if let Some(ref num_prop) = prop.numbering {
                is_list_item = num_prop.id.is_some();
            }
        }

        let inline = self.collect_inline(para);
        if inline.text.trim().is_empty() {
            return;
        }

        if let Some(level) = heading_level {
            self.close_list();
            let title = collapse(&inline.text);
            self.html
                .push_str(&format!("<h{level}>{}</h{level}>\n", escape_html(&title)));
            self.blocks.push(title);
            return;
        }

        if is_list_item {
            if !self.in_list {
                self.html.push_str("<ul>\n");
                self.in_list = true;
            }
            self.html
                .push_str(&format!("<li>{}</li>\n", inline.html.trim()));
        } else {
            self.close_list();
            self.html.push_str(&format!("<p>{}</p>\n", inline.html.trim()));
        }
        self.blocks.push(inline.text.trim().to_string());
    }

    fn close_list(&mut self) {
        if self.in_list {
            self.html.push_str("</ul>\n");
            self.in_list = false;
        }
    }

    fn collect_inline(&mut self, para: &docx_rust::document::Paragraph) -> Inline {
        let mut inline = Inline::default();

        for pc in &para.content {
            match pc {
                ParagraphContent::Run(run) => {
                    let text = self.collect_run_text(run);
                    if !text.is_empty() {
                        inline.html.push_str(&format_run_html(&text, &run.property));
                        inline.text.push_str(&text);
                    }
                }
                ParagraphContent::Link(link) => {
                    let display_text = link
                        .content
                        .as_ref()
                        .map(|run| self.collect_run_text(run))
                        .unwrap_or_default();
                    match self.resolve_hyperlink_target(link) {
                        Some(url) => {
                            let label = if display_text.is_empty() {
                                url.clone()
                            } else {
                                display_text
                            };
                            inline.html.push_str(&format!(
                                "<a href=\"{}\">{}</a>",
                                escape_html(&url),
                                escape_html(&label)
                            ));
                            inline.text.push_str(&label);
                        }
                        None => {
                            inline.html.push_str(&escape_html(&display_text));
                            inline.text.push_str(&display_text);
                        }
                    }
                }
                _ => {}
            }
        }
        inline
    }

    fn collect_run_text(&mut self, run: &docx_rust::document::Run) -> String {
        let mut text = String::new();
        for rc in &run.content {
            match rc {
                RunContent::Text(t) => text.push_str(&t.text),
                RunContent::Break(_) => text.push('\n'),
                RunContent::Tab(_) => text.push('\t'),
                RunContent::Drawing(drawing) => self.note_omitted_image(drawing),
                _ => {}
            }
        }
        text
    }

    fn note_omitted_image(&mut self, drawing: &docx_rust::document::Drawing) {
        let embed = drawing
            .inline
            .as_ref()
            .and_then(|inline| inline.graphic.as_ref())
            .or_else(|| {
                drawing
                    .anchor
                    .as_ref()
                    .and_then(|anchor| anchor.graphic.as_ref())
            })
            .and_then(|graphic| graphic.data.children.first())
            .map(|pic| pic.fill.blip.embed.to_string());

        let target = embed.as_deref().and_then(|id| self.relationship_target(id));
        let message = match target {
            Some(target) => format!("Image '{target}' omitted from text"),
            None => "Image omitted from text".to_string(),
        };
        self.messages.push(ConversionMessage::warning(message));
    }

    fn relationship_target(&self, id: &str) -> Option<String> {
        self.docx
            .document_rels
            .as_ref()?
            .relationships
            .iter()
            .find(|r| r.id.as_ref() == id)
            .map(|r| r.target.to_string())
    }

    fn resolve_hyperlink_target(&self, link: &docx_rust::document::Hyperlink) -> Option<String> {
        if let Some(ref anchor) = link.anchor {
            return Some(format!("#{anchor}"));
        }
        let id = link.id.as_ref()?;
        self.relationship_target(id.as_ref())
    }

    fn render_table(&mut self, table: &docx_rust::document::Table) {
        self.close_list();
        let mut rows: Vec<Vec<Inline>> = Vec::new();

        for row in &table.rows {
            let mut cells = Vec::new();
            for cell_content in &row.cells {
                if let TableRowContent::TableCell(cell) = cell_content {
                    cells.push(self.collect_cell(cell));
                }
            }
            if !cells.is_empty() {
                rows.push(cells);
            }
        }
        if rows.is_empty() {
            return;
        }

        self.html.push_str("<table>\n");
        for row in &rows {
            self.html.push_str("<tr>");
            for cell in row {
                self.html.push_str(&format!("<td>{}</td>", cell.html));
            }
            self.html.push_str("</tr>\n");
        }
        self.html.push_str("</table>\n");

        let text = rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(|cell| cell.text.as_str())
                    .collect::<Vec<_>>()
                    .join("\t")
            })
            .collect::<Vec<_>>()
            .join("\n");
        if !text.trim().is_empty() {
            self.blocks.push(text);
        }
    }

    fn collect_cell(&mut self, cell: &docx_rust::document::TableCell) -> Inline {
        let mut html_parts = Vec::new();
        let mut text_parts = Vec::new();

        for tc in &cell.content {
            let TableCellContent::Paragraph(para) = tc;
            let inline = self.collect_inline(para);
            let text = collapse(&inline.text);
            if !text.is_empty() {
                html_parts.push(inline.html.trim().to_string());
                text_parts.push(text);
            }
        }

        Inline {
            html: html_parts.join("<br>"),
            text: text_parts.join(" "),
        }
    }
}

fn heading_level_for_style(id: &str) -> Option<u8> {
    match id {
        "Heading1" | "heading1" | "heading 1" => Some(1),
        "Heading2" | "heading2" | "heading 2" => Some(2),
        "Heading3" | "heading3" | "heading 3" => Some(3),
        "Heading4" | "heading4" | "heading 4" => Some(4),
        "Heading5" | "heading5" | "heading 5" => Some(5),
        "Heading6" | "heading6" | "heading 6" => Some(6),
        "Title" | "title" => Some(1),
        "Subtitle" | "subtitle" => Some(2),
        _ => None,
    }
}

/// Wrap run text in the inline tags its character properties call for.
fn format_run_html(text: &str, props: &Option<CharacterProperty>) -> String {
    let escaped = escape_html(text).replace('\n', "<br>");
    let Some(props) = props else {
        return escaped;
    };
    if text.trim().is_empty() {
        return escaped;
    }

    let is_bold = props
        .bold
        .as_ref()
        .map(|b| b.value != Some(false))
        .unwrap_or(false);
    let is_italic = props
        .italics
        .as_ref()
        .map(|i| i.value != Some(false))
        .unwrap_or(false);
    let is_strike = props.strike.is_some() || props.dstrike.is_some();

    let mut result = escaped;
    if is_strike {
        result = format!("<s>{result}</s>");
    }
    if is_italic {
        result = format!("<em>{result}</em>");
    }
    if is_bold {
        result = format!("<strong>{result}</strong>");
    }
    result
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

fn collapse(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
