// HTML projection
// Renders the document as the markup of the editable surface.
// The surface is rebuilt from the model after every commit.

use super::structured_document::*;
use html_escape::{encode_double_quoted_attribute, encode_text};

/// Render a document to HTML. An empty document shows the placeholder.
pub fn render_html(doc: &StructuredDocument, placeholder: &str) -> String {
    if is_blank(doc) {
        return if placeholder.is_empty() {
            "<p><br></p>".to_string()
        } else {
            format!(
                "<p class=\"placeholder\" data-placeholder=\"{}\"><br></p>",
                encode_double_quoted_attribute(placeholder)
            )
        };
    }

    let mut html = String::new();
    let mut in_list = false;

    for block in doc.blocks() {
        let is_item = block.block_type == BlockType::ListItem;
        if is_item && !in_list {
            html.push_str("<ul>\n");
        } else if !is_item && in_list {
            html.push_str("</ul>\n");
        }
        in_list = is_item;

        render_block(block, &mut html);
        html.push('\n');
    }
    if in_list {
        html.push_str("</ul>\n");
    }

    html
}

/// True for a document holding nothing but one empty paragraph
pub fn is_blank(doc: &StructuredDocument) -> bool {
    match doc.blocks() {
        [] => true,
        [only] => only.block_type == BlockType::Paragraph && only.content.is_empty(),
        _ => false,
    }
}

fn render_block(block: &Block, html: &mut String) {
    let style = match block.alignment {
        Alignment::Left => String::new(),
        other => format!(" style=\"text-align: {}\"", other.as_str()),
    };

    match &block.block_type {
        BlockType::Separator => html.push_str("<hr>"),
        BlockType::ImageEmbed { url, alt_text } => {
            html.push_str(&format!(
                "<figure{}><img src=\"{}\" alt=\"{}\"></figure>",
                style,
                encode_double_quoted_attribute(url),
                encode_double_quoted_attribute(alt_text)
            ));
        }
        BlockType::VideoEmbed { url, title } => {
            html.push_str(&format!(
                "<figure{}><video src=\"{}\" title=\"{}\" controls></video></figure>",
                style,
                encode_double_quoted_attribute(url),
                encode_double_quoted_attribute(title)
            ));
        }
        text_type => {
            let tag = match text_type {
                BlockType::Heading3 => "h3",
                BlockType::Quote => "blockquote",
                BlockType::ListItem => "li",
                _ => "p",
            };
            html.push_str(&format!("<{}{}>", tag, style));
            if block.content.is_empty() {
                html.push_str("<br>");
            } else {
                render_inline(&block.content, html);
            }
            html.push_str(&format!("</{}>", tag));
        }
    }
}

fn render_inline(content: &[InlineContent], html: &mut String) {
    for item in content {
        match item {
            InlineContent::LineBreak => html.push_str("<br>"),
            InlineContent::Text(run) => {
                let tags = mark_tags(run.marks);
                for (open, _) in &tags {
                    html.push_str(open);
                }
                html.push_str(&encode_text(&run.text));
                for (_, close) in tags.iter().rev() {
                    html.push_str(close);
                }
            }
        }
    }
}

/// Opening and closing tags for a mark set, outermost first
fn mark_tags(marks: MarkSet) -> Vec<(&'static str, &'static str)> {
    Mark::ALL
        .iter()
        .filter(|mark| marks.contains(**mark))
        .map(|mark| match mark {
            Mark::Bold => ("<strong>", "</strong>"),
            Mark::Italic => ("<em>", "</em>"),
            Mark::Underline => ("<u>", "</u>"),
            Mark::HighlightSimple => ("<span class=\"highlight-simple\">", "</span>"),
            Mark::HighlightAnimated => ("<span class=\"highlight-animated\">", "</span>"),
        })
        .collect()
}
