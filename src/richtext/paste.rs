// Paste Normalizer
// Turns clipboard plain text into paragraph blocks. Nothing in pasted text is
// interpreted as markup: asterisks and highlight tags stay literal text.

use super::structured_document::{Block, InlineContent, TextRun};

/// How clipboard text is split into paragraphs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasteOptions {
    /// Treat lines holding only whitespace as blank lines
    pub blank_whitespace_lines: bool,
}

impl Default for PasteOptions {
    fn default() -> Self {
        PasteOptions {
            blank_whitespace_lines: true,
        }
    }
}

/// Split clipboard text into paragraphs. Two or more consecutive newlines end a
/// paragraph; a single newline is a line break inside it.
pub fn normalize_paste(text: &str, options: PasteOptions) -> Vec<Block> {
    let text = text.replace("\r\n", "\n").replace('\r', "\n");

    let mut blocks = Vec::new();
    let mut lines: Vec<&str> = Vec::new();

    for line in text.split('\n') {
        let blank = if options.blank_whitespace_lines {
            line.trim().is_empty()
        } else {
            line.is_empty()
        };
        if blank {
            if !lines.is_empty() {
                blocks.push(paragraph_from_lines(&lines));
                lines.clear();
            }
        } else {
            lines.push(line);
        }
    }
    if !lines.is_empty() {
        blocks.push(paragraph_from_lines(&lines));
    }

    blocks
}

fn paragraph_from_lines(lines: &[&str]) -> Block {
    let mut block = Block::paragraph();
    for (i, line) in lines.iter().enumerate() {
        if i > 0 {
            block.content.push(InlineContent::LineBreak);
        }
        block.content.push(InlineContent::Text(TextRun::plain(*line)));
    }
    block
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_double_newline_splits_paragraphs() {
        let blocks = normalize_paste("A\n\nB\nC", PasteOptions::default());
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].to_plain_text(), "A");
        assert_eq!(
            blocks[1].content,
            vec![
                InlineContent::Text(TextRun::plain("B")),
                InlineContent::LineBreak,
                InlineContent::Text(TextRun::plain("C")),
            ]
        );
    }

    #[test]
    fn test_longer_newline_runs_and_crlf() {
        let blocks = normalize_paste("\r\nA\r\n\r\n\r\n\r\nB\n", PasteOptions::default());
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].to_plain_text(), "A");
        assert_eq!(blocks[1].to_plain_text(), "B");
    }

    #[test]
    fn test_whitespace_lines_option() {
        let text = "A\n   \nB";
        assert_eq!(normalize_paste(text, PasteOptions::default()).len(), 2);
        let strict = PasteOptions {
            blank_whitespace_lines: false,
        };
        let blocks = normalize_paste(text, strict);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].to_plain_text(), "A\n   \nB");
    }

    #[test]
    fn test_markup_is_not_interpreted() {
        let blocks = normalize_paste(
            "**not bold** <span class=\"highlight-animated\">x</span> ===",
            PasteOptions::default(),
        );
        assert_eq!(blocks.len(), 1);
        assert_eq!(
            blocks[0].content,
            vec![InlineContent::Text(TextRun::plain(
                "**not bold** <span class=\"highlight-animated\">x</span> ==="
            ))]
        );
    }

    #[test]
    fn test_empty_paste() {
        assert!(normalize_paste("", PasteOptions::default()).is_empty());
        assert!(normalize_paste("\n\n\n", PasteOptions::default()).is_empty());
    }
}
