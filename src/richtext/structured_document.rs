// Structured Document Model
// Blocks of styled text runs plus separators and media embeds.
// The markup string exchanged with the host form is only a serialization of this.

use std::cmp::min;
use std::fmt;
use thiserror::Error;

/// Errors raised by document operations given bad coordinates
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DocumentError {
    #[error("block index {index} out of range (document has {len} blocks)")]
    BlockOutOfRange { index: usize, len: usize },
    #[error("offset {offset} out of range for block {block_index} (length {len})")]
    OffsetOutOfRange {
        block_index: usize,
        offset: usize,
        len: usize,
    },
    #[error("offset {offset} in block {block_index} is not on a character boundary")]
    NotCharBoundary { block_index: usize, offset: usize },
    #[error("block {0} does not hold text")]
    NotTextBlock(usize),
    #[error("embedded media needs a URL")]
    EmptyEmbedUrl,
}

/// An inline attribute that can be toggled on a run of text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mark {
    Bold,
    Italic,
    Underline,
    HighlightSimple,
    HighlightAnimated,
}

impl Mark {
    /// All marks in canonical nesting order (outermost first)
    pub const ALL: [Mark; 5] = [
        Mark::Bold,
        Mark::Italic,
        Mark::Underline,
        Mark::HighlightSimple,
        Mark::HighlightAnimated,
    ];
}

/// The set of marks carried by a run. Flags are independent and may overlap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MarkSet {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub highlight_simple: bool,
    pub highlight_animated: bool,
}

impl MarkSet {
    pub fn plain() -> Self {
        Self::default()
    }

    pub fn with(mut self, mark: Mark) -> Self {
        self.set(mark, true);
        self
    }

    pub fn contains(&self, mark: Mark) -> bool {
        match mark {
            Mark::Bold => self.bold,
            Mark::Italic => self.italic,
            Mark::Underline => self.underline,
            Mark::HighlightSimple => self.highlight_simple,
            Mark::HighlightAnimated => self.highlight_animated,
        }
    }

    pub fn set(&mut self, mark: Mark, on: bool) {
        match mark {
            Mark::Bold => self.bold = on,
            Mark::Italic => self.italic = on,
            Mark::Underline => self.underline = on,
            Mark::HighlightSimple => self.highlight_simple = on,
            Mark::HighlightAnimated => self.highlight_animated = on,
        }
    }

    pub fn is_plain(&self) -> bool {
        *self == Self::plain()
    }
}

/// A run of text with uniform marks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextRun {
    pub text: String,
    pub marks: MarkSet,
}

impl TextRun {
    pub fn new(text: impl Into<String>, marks: MarkSet) -> Self {
        TextRun {
            text: text.into(),
            marks,
        }
    }

    pub fn plain(text: impl Into<String>) -> Self {
        Self::new(text, MarkSet::plain())
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Split this run at the given byte offset
    /// Returns (left_run, right_run)
    pub fn split_at(&self, offset: usize) -> (TextRun, TextRun) {
        let (left, right) = self.text.split_at(offset);
        (
            TextRun::new(left, self.marks),
            TextRun::new(right, self.marks),
        )
    }
}

/// Inline content of a text block
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InlineContent {
    Text(TextRun),
    /// Explicit line break inside the block
    LineBreak,
}

impl InlineContent {
    /// Length in the block's flattened text (a line break counts as one)
    pub fn text_len(&self) -> usize {
        match self {
            InlineContent::Text(run) => run.len(),
            InlineContent::LineBreak => 1,
        }
    }

    pub fn to_plain_text(&self) -> String {
        match self {
            InlineContent::Text(run) => run.text.clone(),
            InlineContent::LineBreak => "\n".to_string(),
        }
    }
}

/// Horizontal alignment of a block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
    Justify,
}

impl Alignment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Alignment::Left => "left",
            Alignment::Center => "center",
            Alignment::Right => "right",
            Alignment::Justify => "justify",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "left" => Some(Alignment::Left),
            "center" => Some(Alignment::Center),
            "right" => Some(Alignment::Right),
            "justify" => Some(Alignment::Justify),
            _ => None,
        }
    }
}

/// Block-level content types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockType {
    Paragraph,
    Heading3,
    Quote,
    ListItem,
    Separator,
    ImageEmbed { url: String, alt_text: String },
    VideoEmbed { url: String, title: String },
}

impl BlockType {
    /// Whether blocks of this type hold inline text
    pub fn is_text(&self) -> bool {
        matches!(
            self,
            BlockType::Paragraph | BlockType::Heading3 | BlockType::Quote | BlockType::ListItem
        )
    }
}

/// The text block types a range can be converted to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextBlockKind {
    Paragraph,
    Heading3,
    Quote,
    ListItem,
}

impl From<TextBlockKind> for BlockType {
    fn from(kind: TextBlockKind) -> Self {
        match kind {
            TextBlockKind::Paragraph => BlockType::Paragraph,
            TextBlockKind::Heading3 => BlockType::Heading3,
            TextBlockKind::Quote => BlockType::Quote,
            TextBlockKind::ListItem => BlockType::ListItem,
        }
    }
}

/// External media referenced by URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Embed {
    Image { url: String, alt_text: String },
    Video { url: String, title: String },
}

/// Strip all whitespace from a media URL. Embed fields live on single fence lines.
pub fn compact_url(url: &str) -> String {
    url.split_whitespace().collect()
}

impl From<Embed> for BlockType {
    fn from(embed: Embed) -> Self {
        match embed {
            Embed::Image { url, alt_text } => BlockType::ImageEmbed { url, alt_text },
            Embed::Video { url, title } => BlockType::VideoEmbed { url, title },
        }
    }
}

/// A block of content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub block_type: BlockType,
    pub alignment: Alignment,
    pub content: Vec<InlineContent>,
}

impl Block {
    pub fn new(block_type: BlockType) -> Self {
        Block {
            block_type,
            alignment: Alignment::Left,
            content: Vec::new(),
        }
    }

    pub fn paragraph() -> Self {
        Self::new(BlockType::Paragraph)
    }

    pub fn heading3() -> Self {
        Self::new(BlockType::Heading3)
    }

    pub fn quote() -> Self {
        Self::new(BlockType::Quote)
    }

    pub fn list_item() -> Self {
        Self::new(BlockType::ListItem)
    }

    pub fn separator() -> Self {
        Self::new(BlockType::Separator)
    }

    pub fn embed(embed: Embed) -> Self {
        Self::new(embed.into())
    }

    pub fn with_text(mut self, text: impl Into<String>, marks: MarkSet) -> Self {
        self.content
            .push(InlineContent::Text(TextRun::new(text, marks)));
        self
    }

    pub fn with_plain_text(mut self, text: impl Into<String>) -> Self {
        self.content.push(InlineContent::Text(TextRun::plain(text)));
        self
    }

    pub fn with_line_break(mut self) -> Self {
        self.content.push(InlineContent::LineBreak);
        self
    }

    pub fn with_alignment(mut self, alignment: Alignment) -> Self {
        self.alignment = alignment;
        self
    }

    pub fn is_text(&self) -> bool {
        self.block_type.is_text()
    }

    /// Get the total flattened text length of this block
    pub fn text_len(&self) -> usize {
        self.content.iter().map(|c| c.text_len()).sum()
    }

    /// Get plain text content (line breaks as '\n')
    pub fn to_plain_text(&self) -> String {
        self.content.iter().map(|c| c.to_plain_text()).collect()
    }

    /// Marks that text typed at `offset` should inherit
    pub fn marks_at(&self, offset: usize) -> MarkSet {
        let mut pos = 0usize;
        for item in &self.content {
            let len = item.text_len();
            if let InlineContent::Text(run) = item
                && offset > pos
                && offset <= pos + len
            {
                return run.marks;
            }
            pos += len;
        }
        MarkSet::plain()
    }

    /// Whether every text run overlapping [start..end) carries `mark`
    pub fn range_has_mark(&self, start: usize, end: usize, mark: Mark) -> bool {
        let mut pos = 0usize;
        for item in &self.content {
            let len = item.text_len();
            if let InlineContent::Text(run) = item
                && pos < end
                && pos + len > start
                && !run.marks.contains(mark)
            {
                return false;
            }
            pos += len;
        }
        true
    }

    /// Apply `f` to every text run inside [start..end), splitting runs at the edges
    pub fn map_runs_in_range<F>(&mut self, start: usize, end: usize, mut f: F)
    where
        F: FnMut(&mut TextRun),
    {
        if start >= end {
            return;
        }
        let after = self.split_content_at(end);
        let mut selected = self.split_content_at(start);
        for item in selected.iter_mut() {
            if let InlineContent::Text(run) = item {
                f(run);
            }
        }
        self.content.extend(selected);
        self.content.extend(after);
    }

    /// Delete text in [start..end) within this block's flattened content
    pub fn delete_text_range(&mut self, start: usize, end: usize) {
        if start >= end {
            return;
        }
        let len = self.text_len();
        let after = self.split_content_at(min(end, len));
        self.split_content_at(min(start, len));
        self.content.extend(after);
    }

    /// Split this block's content at a flattened text offset, returning the right part.
    /// The left part remains in self.
    pub fn split_content_at(&mut self, offset: usize) -> Vec<InlineContent> {
        let offset = min(offset, self.text_len());
        let mut left: Vec<InlineContent> = Vec::new();
        let mut right: Vec<InlineContent> = Vec::new();
        let mut pos = 0usize;

        for item in self.content.drain(..) {
            let len = item.text_len();
            if pos + len <= offset {
                left.push(item);
            } else if pos >= offset {
                right.push(item);
            } else if let InlineContent::Text(run) = &item {
                // offset falls within this run
                let (l, r) = run.split_at(offset - pos);
                left.push(InlineContent::Text(l));
                right.push(InlineContent::Text(r));
            } else {
                right.push(item);
            }
            pos += len;
        }

        self.content = left;
        right
    }

    /// Restore the span-merge invariant: no empty runs, no two adjacent runs with
    /// equal marks, and no leading, trailing or doubled line breaks.
    pub fn normalize(&mut self) {
        if !self.is_text() {
            self.content.clear();
            if let BlockType::ImageEmbed {
                url,
                alt_text: caption,
            }
            | BlockType::VideoEmbed {
                url,
                title: caption,
            } = &mut self.block_type
            {
                *url = compact_url(url);
                *caption = caption.replace(['\r', '\n'], " ");
            }
            return;
        }

        // Raw newlines inside runs become explicit line breaks
        let expanded = self.content.drain(..).flat_map(|item| match item {
            InlineContent::Text(run) if run.text.contains(['\n', '\r']) => {
                let text = run.text.replace("\r\n", "\n").replace('\r', "\n");
                let mut parts = Vec::new();
                for (i, line) in text.split('\n').enumerate() {
                    if i > 0 {
                        parts.push(InlineContent::LineBreak);
                    }
                    parts.push(InlineContent::Text(TextRun::new(line, run.marks)));
                }
                parts
            }
            other => vec![other],
        });

        let mut merged: Vec<InlineContent> = Vec::new();
        for item in expanded.collect::<Vec<_>>() {
            match item {
                InlineContent::Text(run) if run.is_empty() => {}
                InlineContent::Text(run) => {
                    if let Some(InlineContent::Text(prev)) = merged.last_mut()
                        && prev.marks == run.marks
                    {
                        prev.text.push_str(&run.text);
                        continue;
                    }
                    merged.push(InlineContent::Text(run));
                }
                InlineContent::LineBreak => {
                    if matches!(merged.last(), Some(InlineContent::Text(_))) {
                        merged.push(InlineContent::LineBreak);
                    }
                }
            }
        }
        if matches!(merged.last(), Some(InlineContent::LineBreak)) {
            merged.pop();
        }
        self.content = merged;
    }
}

/// Length of flattened text once leading line breaks are dropped and doubled ones
/// collapse. A single trailing break is kept.
fn collapsed_len(text: &str) -> usize {
    let mut len = 0;
    let mut prev_newline = true;
    for ch in text.chars() {
        if ch == '\n' {
            if !prev_newline {
                len += 1;
            }
            prev_newline = true;
        } else {
            len += ch.len_utf8();
            prev_newline = false;
        }
    }
    len
}

/// Position within a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct DocumentPosition {
    pub block_index: usize,
    pub offset: usize, // Byte offset within the block's flattened text
}

impl DocumentPosition {
    pub fn new(block_index: usize, offset: usize) -> Self {
        DocumentPosition {
            block_index,
            offset,
        }
    }

    pub fn start() -> Self {
        DocumentPosition::new(0, 0)
    }
}

/// Anchor/focus pair over the document. Collapsed when both are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub anchor: DocumentPosition,
    pub focus: DocumentPosition,
}

impl Selection {
    pub fn new(anchor: DocumentPosition, focus: DocumentPosition) -> Self {
        Selection { anchor, focus }
    }

    pub fn collapsed(at: DocumentPosition) -> Self {
        Selection::new(at, at)
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.focus
    }

    /// (start, end) in document order
    pub fn ordered(&self) -> (DocumentPosition, DocumentPosition) {
        if self.anchor <= self.focus {
            (self.anchor, self.focus)
        } else {
            (self.focus, self.anchor)
        }
    }
}

/// The structured document
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StructuredDocument {
    blocks: Vec<Block>,
}

impl StructuredDocument {
    pub fn new() -> Self {
        StructuredDocument { blocks: Vec::new() }
    }

    /// Build a document from blocks, normalizing each one
    pub fn from_blocks(blocks: Vec<Block>) -> Self {
        let mut doc = StructuredDocument { blocks };
        doc.normalize();
        doc
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn block(&self, index: usize) -> Option<&Block> {
        self.blocks.get(index)
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Append a block as-is
    pub fn add_block(&mut self, block: Block) {
        self.blocks.push(block);
    }

    /// Check that a position resolves to a valid coordinate
    pub fn validate_position(&self, pos: DocumentPosition) -> Result<(), DocumentError> {
        let block = self
            .blocks
            .get(pos.block_index)
            .ok_or(DocumentError::BlockOutOfRange {
                index: pos.block_index,
                len: self.blocks.len(),
            })?;
        let text = block.to_plain_text();
        if pos.offset > text.len() {
            return Err(DocumentError::OffsetOutOfRange {
                block_index: pos.block_index,
                offset: pos.offset,
                len: text.len(),
            });
        }
        if !text.is_char_boundary(pos.offset) {
            return Err(DocumentError::NotCharBoundary {
                block_index: pos.block_index,
                offset: pos.offset,
            });
        }
        Ok(())
    }

    pub fn validate_selection(&self, selection: &Selection) -> Result<(), DocumentError> {
        self.validate_position(selection.anchor)?;
        self.validate_position(selection.focus)
    }

    fn text_block_at(&self, index: usize) -> Result<&Block, DocumentError> {
        let block = self
            .blocks
            .get(index)
            .ok_or(DocumentError::BlockOutOfRange {
                index,
                len: self.blocks.len(),
            })?;
        if !block.is_text() {
            return Err(DocumentError::NotTextBlock(index));
        }
        Ok(block)
    }

    /// Validate and clamp a position to document bounds
    pub fn clamp_position(&self, pos: DocumentPosition) -> DocumentPosition {
        if self.blocks.is_empty() {
            return DocumentPosition::start();
        }

        let block_index = pos.block_index.min(self.blocks.len() - 1);
        let text = self.blocks[block_index].to_plain_text();
        let mut offset = pos.offset.min(text.len());
        while !text.is_char_boundary(offset) {
            offset -= 1;
        }

        DocumentPosition::new(block_index, offset)
    }

    /// Per-block text ranges covered by [start..end)
    fn text_segments(
        &self,
        start: DocumentPosition,
        end: DocumentPosition,
    ) -> Vec<(usize, usize, usize)> {
        (start.block_index..=end.block_index)
            .filter(|&i| self.blocks[i].is_text())
            .filter_map(|i| {
                let from = if i == start.block_index { start.offset } else { 0 };
                let to = if i == end.block_index {
                    end.offset
                } else {
                    self.blocks[i].text_len()
                };
                (from < to).then_some((i, from, to))
            })
            .collect()
    }

    /// Restore the span-merge invariant on every block
    pub fn normalize(&mut self) {
        for block in self.blocks.iter_mut() {
            block.normalize();
        }
    }

    /// Insert a block at `index` (0..=len)
    pub fn insert_block(&mut self, index: usize, mut block: Block) -> Result<(), DocumentError> {
        if index > self.blocks.len() {
            return Err(DocumentError::BlockOutOfRange {
                index,
                len: self.blocks.len(),
            });
        }
        block.normalize();
        if let BlockType::ImageEmbed { url, .. } | BlockType::VideoEmbed { url, .. } =
            &block.block_type
            && url.is_empty()
        {
            return Err(DocumentError::EmptyEmbedUrl);
        }
        self.blocks.insert(index, block);
        Ok(())
    }

    /// Insert an image or video block at `index` (0..=len)
    pub fn insert_embed(&mut self, index: usize, embed: Embed) -> Result<(), DocumentError> {
        self.insert_block(index, Block::embed(embed))
    }

    /// Split a text block at a position. The right half becomes a new block;
    /// headings continue as paragraphs, other text blocks keep their type.
    pub fn split_block(&mut self, pos: DocumentPosition) -> Result<DocumentPosition, DocumentError> {
        self.validate_position(pos)?;
        let block = self.text_block_at(pos.block_index)?;
        let right_type = match block.block_type {
            BlockType::Heading3 => BlockType::Paragraph,
            ref other => other.clone(),
        };
        self.split_block_unchecked(pos.block_index, pos.offset, right_type);
        self.normalize();
        Ok(DocumentPosition::new(pos.block_index + 1, 0))
    }

    fn split_block_unchecked(&mut self, index: usize, offset: usize, right_type: BlockType) {
        let block = &mut self.blocks[index];
        let alignment = block.alignment;
        let right = block.split_content_at(offset);
        let mut new_block = Block::new(right_type).with_alignment(alignment);
        new_block.content = right;
        self.blocks.insert(index + 1, new_block);
    }

    /// Convert the text blocks covered by the selection to `kind`.
    /// If all of them already are `kind`, they revert to paragraphs.
    pub fn wrap_range(
        &mut self,
        selection: &Selection,
        kind: TextBlockKind,
    ) -> Result<(), DocumentError> {
        self.validate_selection(selection)?;
        let (start, end) = selection.ordered();
        let target: BlockType = kind.into();
        let covered = &mut self.blocks[start.block_index..=end.block_index];

        let already = covered
            .iter()
            .filter(|b| b.is_text())
            .all(|b| b.block_type == target);
        let new_type = if already {
            BlockType::Paragraph
        } else {
            target
        };
        for block in covered.iter_mut().filter(|b| b.is_text()) {
            block.block_type = new_type.clone();
        }
        Ok(())
    }

    /// Toggle a mark over the selection. If every character already carries the
    /// mark it is removed, otherwise the whole range gets it. Collapsed: no-op.
    pub fn toggle_mark(&mut self, selection: &Selection, mark: Mark) -> Result<(), DocumentError> {
        self.validate_selection(selection)?;
        if selection.is_collapsed() {
            return Ok(());
        }
        let (start, end) = selection.ordered();
        let segments = self.text_segments(start, end);

        let apply = !segments
            .iter()
            .all(|&(i, from, to)| self.blocks[i].range_has_mark(from, to, mark));

        for (i, from, to) in segments {
            self.blocks[i].map_runs_in_range(from, to, |run| run.marks.set(mark, apply));
        }
        self.normalize();
        Ok(())
    }

    /// Set the alignment of every block covered by the selection
    pub fn set_alignment(
        &mut self,
        selection: &Selection,
        alignment: Alignment,
    ) -> Result<(), DocumentError> {
        self.validate_selection(selection)?;
        let (start, end) = selection.ordered();
        for block in &mut self.blocks[start.block_index..=end.block_index] {
            block.alignment = alignment;
        }
        Ok(())
    }

    /// Move the selected text into blocks of its own and convert them to `kind`.
    /// Text before and after the selection stays in blocks of the original type.
    /// Returns a selection spanning the isolated blocks.
    pub fn isolate_range(
        &mut self,
        selection: &Selection,
        kind: TextBlockKind,
    ) -> Result<Selection, DocumentError> {
        self.validate_selection(selection)?;
        let (start, end) = selection.ordered();
        if selection.is_collapsed() || self.text_segments(start, end).is_empty() {
            return Ok(*selection);
        }
        let mut first = start.block_index;
        let mut last = end.block_index;
        let mut start_offset = start.offset;

        if first < last && start_offset >= self.blocks[first].text_len() {
            first += 1;
            start_offset = 0;
        }
        if first < last && end.offset == 0 {
            last -= 1;
        } else if self.blocks[last].is_text() && end.offset < self.blocks[last].text_len() {
            let tail_type = self.blocks[last].block_type.clone();
            self.split_block_unchecked(last, end.offset, tail_type);
        }
        if self.blocks[first].is_text() && start_offset > 0 {
            let head_type = self.blocks[first].block_type.clone();
            self.split_block_unchecked(first, start_offset, head_type);
            first += 1;
            last += 1;
        }

        let target: BlockType = kind.into();
        for block in self.blocks[first..=last].iter_mut().filter(|b| b.is_text()) {
            block.block_type = target.clone();
        }
        self.normalize();
        Ok(Selection::new(
            DocumentPosition::new(first, 0),
            DocumentPosition::new(last, self.blocks[last].text_len()),
        ))
    }

    /// Insert a non-text block at a cursor: replaces an empty paragraph, goes
    /// before/after the block at its edges, and splits the block mid-text.
    /// Returns the index of the inserted block.
    pub fn insert_block_at_position(
        &mut self,
        pos: DocumentPosition,
        block: Block,
    ) -> Result<usize, DocumentError> {
        if self.blocks.is_empty() {
            self.insert_block(0, block)?;
            return Ok(0);
        }
        self.validate_position(pos)?;
        let current = &self.blocks[pos.block_index];
        let len = current.text_len();

        let index = if current.block_type == BlockType::Paragraph && current.content.is_empty() {
            self.blocks.remove(pos.block_index);
            pos.block_index
        } else if !current.is_text() || pos.offset >= len {
            pos.block_index + 1
        } else if pos.offset == 0 {
            pos.block_index
        } else {
            let tail_type = current.block_type.clone();
            self.split_block_unchecked(pos.block_index, pos.offset, tail_type);
            pos.block_index + 1
        };
        self.insert_block(index, block)?;
        self.normalize();
        Ok(index)
    }

    /// Insert plain text at a position, inheriting the marks of the preceding run.
    /// Newlines become line breaks. Returns the cursor after the inserted text.
    pub fn insert_text(
        &mut self,
        pos: DocumentPosition,
        text: &str,
    ) -> Result<DocumentPosition, DocumentError> {
        self.validate_position(pos)?;
        self.text_block_at(pos.block_index)?;
        let text = text.replace("\r\n", "\n").replace('\r', "\n");

        let block = &mut self.blocks[pos.block_index];
        let before = block.to_plain_text();
        let cursor = collapsed_len(&format!("{}{}", &before[..pos.offset], text));
        let marks = block.marks_at(pos.offset);
        let right = block.split_content_at(pos.offset);
        for (i, line) in text.split('\n').enumerate() {
            if i > 0 {
                block.content.push(InlineContent::LineBreak);
            }
            block
                .content
                .push(InlineContent::Text(TextRun::new(line, marks)));
        }
        block.content.extend(right);
        self.normalize();

        Ok(self.clamp_position(DocumentPosition::new(pos.block_index, cursor)))
    }

    /// Insert a line break inside a text block. Line breaks never lead, trail or
    /// double up in a block, so at either edge or next to an existing break this
    /// splits the block instead.
    pub fn insert_line_break(
        &mut self,
        pos: DocumentPosition,
    ) -> Result<DocumentPosition, DocumentError> {
        self.validate_position(pos)?;
        let block = self.text_block_at(pos.block_index)?;
        let text = block.to_plain_text();
        if pos.offset == 0
            || pos.offset >= text.len()
            || text[..pos.offset].ends_with('\n')
            || text[pos.offset..].starts_with('\n')
        {
            return self.split_block(pos);
        }
        let block = &mut self.blocks[pos.block_index];
        let right = block.split_content_at(pos.offset);
        block.content.push(InlineContent::LineBreak);
        block.content.extend(right);
        self.normalize();
        Ok(self.clamp_position(DocumentPosition::new(pos.block_index, pos.offset + 1)))
    }

    /// Delete the selected content. A range spanning several blocks merges the
    /// tail of the end block into the start block and removes the blocks between.
    /// Returns the collapsed cursor position.
    pub fn delete_range(
        &mut self,
        selection: &Selection,
    ) -> Result<DocumentPosition, DocumentError> {
        self.validate_selection(selection)?;
        let (a, b) = selection.ordered();

        if a.block_index == b.block_index {
            self.blocks[a.block_index].delete_text_range(a.offset, b.offset);
            self.normalize();
            return Ok(a);
        }

        // Keep the tail of the end block
        let tail: Vec<InlineContent> = if self.blocks[b.block_index].is_text() {
            self.blocks[b.block_index].split_content_at(b.offset)
        } else {
            Vec::new()
        };

        let cursor = if self.blocks[a.block_index].is_text() {
            let start = &mut self.blocks[a.block_index];
            let len = start.text_len();
            start.delete_text_range(a.offset, len);
            start.content.extend(tail);
            self.blocks.drain(a.block_index + 1..=b.block_index);
            a
        } else {
            // Start block cannot absorb text: drop it and keep the end block's tail
            let end = &mut self.blocks[b.block_index];
            end.content = tail;
            let keep_end = end.is_text();
            let remove_to = if keep_end {
                b.block_index
            } else {
                b.block_index + 1
            };
            self.blocks.drain(a.block_index..remove_to);
            if self.blocks.is_empty() {
                self.blocks.push(Block::paragraph());
            }
            DocumentPosition::new(a.block_index.min(self.blocks.len() - 1), 0)
        };

        self.normalize();
        Ok(self.clamp_position(cursor))
    }

    /// Splice blocks in at a cursor. The first block's content merges into the
    /// current block, later blocks follow it, and the text after the cursor moves
    /// to the end of the last inserted block. Returns the cursor after the insert.
    pub fn splice_blocks(
        &mut self,
        pos: DocumentPosition,
        blocks: Vec<Block>,
    ) -> Result<DocumentPosition, DocumentError> {
        if blocks.is_empty() {
            return Ok(pos);
        }
        if self.blocks.is_empty() {
            self.blocks.push(Block::paragraph());
        }
        self.validate_position(pos)?;

        if !self.blocks[pos.block_index].is_text() {
            let count = blocks.len();
            for (i, block) in blocks.into_iter().enumerate() {
                self.insert_block(pos.block_index + 1 + i, block)?;
            }
            let last = pos.block_index + count;
            return Ok(DocumentPosition::new(last, self.blocks[last].text_len()));
        }

        let mut incoming = blocks.into_iter();
        let tail = self.blocks[pos.block_index].split_content_at(pos.offset);
        let mut last_index = pos.block_index;

        if let Some(first) = incoming.next() {
            self.blocks[pos.block_index].content.extend(first.content);
        }
        for block in incoming {
            last_index += 1;
            self.blocks.insert(last_index, block);
        }

        let last = &mut self.blocks[last_index];
        let cursor = DocumentPosition::new(last_index, last.text_len());
        last.content.extend(tail);
        self.normalize();
        Ok(self.clamp_position(cursor))
    }

    /// Convert to plain text
    pub fn to_plain_text(&self) -> String {
        self.blocks
            .iter()
            .map(|b| b.to_plain_text())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

impl fmt::Display for StructuredDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "StructuredDocument ({} blocks):", self.blocks.len())?;
        for (i, block) in self.blocks.iter().enumerate() {
            write!(f, "  [{}] ", i)?;
            match &block.block_type {
                BlockType::Paragraph => write!(f, "Paragraph")?,
                BlockType::Heading3 => write!(f, "Heading3")?,
                BlockType::Quote => write!(f, "Quote")?,
                BlockType::ListItem => write!(f, "ListItem")?,
                BlockType::Separator => write!(f, "Separator")?,
                BlockType::ImageEmbed { url, .. } => write!(f, "Image({})", url)?,
                BlockType::VideoEmbed { url, .. } => write!(f, "Video({})", url)?,
            }
            if block.alignment != Alignment::Left {
                write!(f, " [{}]", block.alignment.as_str())?;
            }
            writeln!(f, ": {:?}", block.to_plain_text())?;
        }
        Ok(())
    }
}
