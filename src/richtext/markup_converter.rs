// Markup Converter
// Converts between StructuredDocument and the compact markup `value` string.
// The markup is only a storage format; parsing never fails.

use super::structured_document::*;
use regex::Regex;
use std::sync::LazyLock;

pub const HIGHLIGHT_SIMPLE_OPEN: &str = r#"<span class="highlight-simple">"#;
pub const HIGHLIGHT_ANIMATED_OPEN: &str = r#"<span class="highlight-animated">"#;
pub const HIGHLIGHT_CLOSE: &str = "</span>";

const BLOCK_SEPARATOR: &str = "\n\n";
const HEADING_PREFIX: &str = "### ";
const QUOTE_PREFIX: &str = "> ";
const LIST_PREFIX: &str = "• ";
const SEPARATOR_LINE: &str = "---";

static ALIGN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)\A<div style="text-align: ?(left|center|right|justify);?">(.*)</div>\z"#)
        .expect("alignment pattern is valid")
});

static FENCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)\A```(image|video)[ \t]*\n(.*?)\n?```[ \t]*\z")
        .expect("fence pattern is valid")
});

/// Convert a StructuredDocument to markup
pub fn serialize(doc: &StructuredDocument) -> String {
    doc.blocks()
        .iter()
        .map(block_to_markup)
        .collect::<Vec<_>>()
        .join(BLOCK_SEPARATOR)
}

/// Convert markup to a StructuredDocument.
/// The result always holds at least one block.
pub fn deserialize(markup: &str) -> StructuredDocument {
    let markup = markup.replace("\r\n", "\n");
    let mut blocks = Vec::new();

    for chunk in markup.split(BLOCK_SEPARATOR) {
        chunk_to_blocks(chunk, &mut blocks);
    }

    // Ensure at least one block exists
    if blocks.is_empty() {
        blocks.push(Block::paragraph());
    }

    StructuredDocument::from_blocks(blocks)
}

fn block_to_markup(block: &Block) -> String {
    let body = match &block.block_type {
        BlockType::Paragraph => inline_content_to_markup(&block.content, true),
        BlockType::Heading3 => {
            format!("{}{}", HEADING_PREFIX, inline_content_to_markup(&block.content, false))
        }
        BlockType::Quote => {
            format!("{}{}", QUOTE_PREFIX, inline_content_to_markup(&block.content, false))
        }
        BlockType::ListItem => {
            format!("{}{}", LIST_PREFIX, inline_content_to_markup(&block.content, false))
        }
        BlockType::Separator => SEPARATOR_LINE.to_string(),
        BlockType::ImageEmbed { url, alt_text } => {
            format!("```image\nsrc: {}\nalt: {}\n```", url, alt_text)
        }
        BlockType::VideoEmbed { url, title } => {
            format!("```video\nsrc: {}\ntitle: {}\n```", url, title)
        }
    };

    match block.alignment {
        Alignment::Left => body,
        other => format!(
            r#"<div style="text-align: {}">{}</div>"#,
            other.as_str(),
            body
        ),
    }
}

/// Convert inline content to markup. Every run is wrapped on its own, openers in
/// canonical order (bold outermost) and closers in reverse.
fn inline_content_to_markup(content: &[InlineContent], escape_first_line: bool) -> String {
    let mut output = String::new();
    let mut at_line_start = escape_first_line;

    for item in content {
        match item {
            InlineContent::Text(run) => {
                let marks = run.marks;
                if marks.bold {
                    output.push_str("**");
                }
                if marks.italic {
                    output.push('*');
                }
                if marks.underline {
                    output.push_str("__");
                }
                if marks.highlight_simple {
                    output.push_str(HIGHLIGHT_SIMPLE_OPEN);
                }
                if marks.highlight_animated {
                    output.push_str(HIGHLIGHT_ANIMATED_OPEN);
                }

                // A plain run opening a line must not read as a block marker
                if at_line_start && marks.is_plain() && starts_like_block_marker(&run.text) {
                    output.push('\\');
                }
                escape_text(&run.text, &mut output);

                if marks.highlight_animated {
                    output.push_str(HIGHLIGHT_CLOSE);
                }
                if marks.highlight_simple {
                    output.push_str(HIGHLIGHT_CLOSE);
                }
                if marks.underline {
                    output.push_str("__");
                }
                if marks.italic {
                    output.push('*');
                }
                if marks.bold {
                    output.push_str("**");
                }
                at_line_start = false;
            }
            InlineContent::LineBreak => {
                output.push('\n');
                at_line_start = true;
            }
        }
    }

    output
}

fn starts_like_block_marker(text: &str) -> bool {
    text.starts_with(['#', '>', '•', '-'])
}

fn escape_text(text: &str, output: &mut String) {
    for ch in text.chars() {
        if matches!(ch, '\\' | '*' | '_' | '<' | '`') {
            output.push('\\');
        }
        output.push(ch);
    }
}

/// Parse one blank-line separated chunk into blocks
fn chunk_to_blocks(chunk: &str, blocks: &mut Vec<Block>) {
    let (alignment, inner) = match ALIGN_RE.captures(chunk) {
        Some(caps) => {
            let alignment = caps
                .get(1)
                .and_then(|m| Alignment::from_name(m.as_str()))
                .unwrap_or_default();
            let inner = caps.get(2).map(|m| m.as_str()).unwrap_or_default();
            (alignment, inner)
        }
        None => (Alignment::Left, chunk),
    };

    let first_new = blocks.len();
    if let Some(embed) = parse_embed(inner) {
        blocks.push(Block::embed(embed));
    } else {
        lines_to_blocks(inner, blocks);
    }

    for block in &mut blocks[first_new..] {
        block.alignment = alignment;
    }
}

/// Parse a fenced image/video block; None when malformed (falls back to text)
fn parse_embed(chunk: &str) -> Option<Embed> {
    let caps = FENCE_RE.captures(chunk)?;
    let kind = caps.get(1)?.as_str();
    let body = caps.get(2).map(|m| m.as_str()).unwrap_or_default();

    let mut src = None;
    let mut caption = String::new();
    let caption_key = if kind == "image" { "alt:" } else { "title:" };

    for line in body.lines() {
        if let Some(value) = field_value(line, "src:") {
            src = Some(value.trim().to_string());
        } else if let Some(value) = field_value(line, caption_key) {
            caption = value.to_string();
        }
    }

    let url = src.filter(|url| !url.is_empty())?;
    Some(match kind {
        "image" => Embed::Image {
            url,
            alt_text: caption,
        },
        _ => Embed::Video {
            url,
            title: caption,
        },
    })
}

fn field_value<'a>(line: &'a str, key: &str) -> Option<&'a str> {
    let value = line.strip_prefix(key)?;
    Some(value.strip_prefix(' ').unwrap_or(value))
}

/// Detect a block marker at the start of a line
fn line_block_type(line: &str) -> Option<(BlockType, &str)> {
    let prefixes = [
        (HEADING_PREFIX, BlockType::Heading3),
        (QUOTE_PREFIX, BlockType::Quote),
        (LIST_PREFIX, BlockType::ListItem),
    ];
    for (prefix, block_type) in prefixes {
        if let Some(rest) = line.strip_prefix(prefix) {
            return Some((block_type, rest));
        }
        // Trailing whitespace may have been trimmed by an external editor
        if line == prefix.trim_end() {
            return Some((block_type, ""));
        }
    }
    None
}

fn lines_to_blocks(chunk: &str, blocks: &mut Vec<Block>) {
    let mut current: Option<Block> = None;

    for line in chunk.split('\n') {
        if line.trim_end() == SEPARATOR_LINE {
            blocks.extend(current.take());
            blocks.push(Block::separator());
            continue;
        }

        match (line_block_type(line), current.as_mut()) {
            (Some((block_type, rest)), _) => {
                blocks.extend(current.take());
                let mut block = Block::new(block_type);
                parse_inline(rest, &mut block.content);
                current = Some(block);
            }
            (None, Some(block)) => {
                block.content.push(InlineContent::LineBreak);
                parse_inline(line, &mut block.content);
            }
            (None, None) => {
                let mut block = Block::paragraph();
                parse_inline(line, &mut block.content);
                current = Some(block);
            }
        }
    }

    blocks.extend(current);
}

/// Inline parser state for one line
struct InlineParser<'a> {
    content: &'a mut Vec<InlineContent>,
    marks: MarkSet,
    highlights: Vec<Mark>,
    text: String,
}

impl InlineParser<'_> {
    fn flush(&mut self) {
        if !self.text.is_empty() {
            let text = std::mem::take(&mut self.text);
            self.content
                .push(InlineContent::Text(TextRun::new(text, self.marks)));
        }
    }

    /// Resolve a run of `count` asterisks: close the active star marks
    /// (italic, then bold), then open bold and italic with what is left.
    fn resolve_stars(&mut self, count: usize) {
        self.flush();
        let mut left = count;
        let needed = usize::from(self.marks.italic) + 2 * usize::from(self.marks.bold);

        if needed > 0 && left >= needed {
            self.marks.italic = false;
            self.marks.bold = false;
            left -= needed;
        } else if needed > 0 {
            // Fewer stars than a full close: toggle like plain markdown
            match left {
                1 => self.marks.italic = !self.marks.italic,
                _ => self.marks.bold = !self.marks.bold,
            }
            return;
        }

        if left >= 2 {
            self.marks.bold = true;
            left -= 2;
        }
        if left >= 1 {
            self.marks.italic = true;
            left -= 1;
        }
        if left > 0 {
            self.text.push_str(&"*".repeat(left));
        }
    }

    fn open_highlight(&mut self, mark: Mark) {
        self.flush();
        self.marks.set(mark, true);
        self.highlights.push(mark);
    }

    fn close_highlight(&mut self) -> bool {
        let Some(mark) = self.highlights.pop() else {
            return false;
        };
        self.flush();
        self.marks.set(mark, false);
        true
    }
}

/// Parse one line of inline markup, appending runs to `content`
fn parse_inline(line: &str, content: &mut Vec<InlineContent>) {
    let mut parser = InlineParser {
        content,
        marks: MarkSet::plain(),
        highlights: Vec::new(),
        text: String::new(),
    };
    let mut rest = line;

    while let Some(ch) = rest.chars().next() {
        if ch == '\\' {
            let mut chars = rest[1..].chars();
            match chars.next() {
                Some(escaped) => {
                    parser.text.push(escaped);
                    rest = &rest[1 + escaped.len_utf8()..];
                }
                None => {
                    parser.text.push('\\');
                    rest = "";
                }
            }
        } else if ch == '*' {
            let count = rest.chars().take_while(|&c| c == '*').count();
            parser.resolve_stars(count);
            rest = &rest[count..];
        } else if rest.starts_with("__") {
            parser.flush();
            parser.marks.underline = !parser.marks.underline;
            rest = &rest[2..];
        } else if rest.starts_with(HIGHLIGHT_SIMPLE_OPEN) {
            parser.open_highlight(Mark::HighlightSimple);
            rest = &rest[HIGHLIGHT_SIMPLE_OPEN.len()..];
        } else if rest.starts_with(HIGHLIGHT_ANIMATED_OPEN) {
            parser.open_highlight(Mark::HighlightAnimated);
            rest = &rest[HIGHLIGHT_ANIMATED_OPEN.len()..];
        } else if rest.starts_with(HIGHLIGHT_CLOSE) && parser.close_highlight() {
            rest = &rest[HIGHLIGHT_CLOSE.len()..];
        } else {
            parser.text.push(ch);
            rest = &rest[ch.len_utf8()..];
        }
    }

    parser.flush();
}
