// Structured Editor
// One editing session: owns the document, the tracked selection and the
// undo history, and reports every committed change to the host.

use super::embed::{ImageDraft, VideoDraft};
use super::format::{FormatApplier, FormatCommand, FormatError, FormatState};
use super::keymap::{EditorAction, KeyEvent, action_for};
use super::markup_converter::{deserialize, serialize};
use super::paste::{PasteOptions, normalize_paste};
use super::render;
use super::selection::{HostSelection, SelectionTracker, word_range_at};
use super::structured_document::*;
use crate::config::EditorConfig;
use crate::history::History;
use unicode_segmentation::UnicodeSegmentation;

/// Result of an editing operation
pub type EditResult = Result<(), FormatError>;

type ChangeHandler = Box<dyn FnMut(&str)>;

/// The editor bound to one form field
pub struct RichTextEditor {
    document: StructuredDocument,
    selection: SelectionTracker,
    applier: FormatApplier,
    history: History,
    value: String,
    placeholder: String,
    paste_options: PasteOptions,
    on_change: Option<ChangeHandler>,
}

impl RichTextEditor {
    /// Mount the editor on an incoming value with the default configuration
    pub fn mount(value: &str, placeholder: &str) -> Self {
        Self::mount_with_config(value, placeholder, &EditorConfig::default())
    }

    /// Mount the editor. An empty `placeholder` falls back to the configured one.
    pub fn mount_with_config(value: &str, placeholder: &str, config: &EditorConfig) -> Self {
        let document = deserialize(value);
        let value = serialize(&document);
        let mut history = History::with_capacity(config.history_capacity);
        history.push(value.clone());

        let placeholder = if placeholder.is_empty() {
            config.placeholder.clone()
        } else {
            placeholder.to_string()
        };

        RichTextEditor {
            document,
            selection: SelectionTracker::new(),
            applier: FormatApplier::new(),
            history,
            value,
            placeholder,
            paste_options: config.paste_options(),
            on_change: None,
        }
    }

    /// Register the host's change callback. It receives the new value after
    /// every commit that changed it.
    pub fn set_on_change<F>(&mut self, handler: F)
    where
        F: FnMut(&str) + 'static,
    {
        self.on_change = Some(Box::new(handler));
    }

    /// The current serialized value
    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn placeholder(&self) -> &str {
        &self.placeholder
    }

    pub fn shows_placeholder(&self) -> bool {
        render::is_blank(&self.document) && !self.placeholder.is_empty()
    }

    pub fn document(&self) -> &StructuredDocument {
        &self.document
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// State the format applier reached with the last command
    pub fn format_state(&self) -> FormatState {
        self.applier.state()
    }

    /// The surface HTML for the current document
    pub fn render_html(&self) -> String {
        render::render_html(&self.document, &self.placeholder)
    }

    /// The tracked selection, None when nothing valid is selected
    pub fn selection(&self) -> Option<Selection> {
        self.selection.current(&self.document)
    }

    /// Take the host's live selection
    pub fn set_host_selection(&mut self, host: Option<HostSelection>) -> Option<Selection> {
        self.selection.update(&self.document, host)
    }

    pub fn set_selection(&mut self, anchor: DocumentPosition, focus: DocumentPosition) {
        self.set_host_selection(Some(HostSelection::new(anchor, focus)));
    }

    pub fn set_cursor(&mut self, pos: DocumentPosition) {
        self.set_selection(pos, pos);
    }

    /// Select the word around a position (double click)
    pub fn select_word_at(&mut self, pos: DocumentPosition) -> Option<Selection> {
        let word = word_range_at(&self.document, pos);
        self.selection.set(word);
        word
    }

    /// Run a formatting command against the tracked selection
    pub fn apply(&mut self, command: FormatCommand) -> EditResult {
        let selection = self.selection();
        let next = self
            .applier
            .apply(&mut self.document, selection, &command)?;
        self.selection.set(next);
        self.commit();
        Ok(())
    }

    /// Insert the image from the dialog. A blank URL is rejected and the
    /// dialog stays open.
    pub fn insert_image(&mut self, draft: &ImageDraft) -> EditResult {
        let command = draft.command().ok_or(FormatError::EmptyUrl)?;
        self.apply(command)
    }

    pub fn insert_video(&mut self, draft: &VideoDraft) -> EditResult {
        let command = draft.command().ok_or(FormatError::EmptyUrl)?;
        self.apply(command)
    }

    /// Paste clipboard text as plain paragraphs, replacing a range selection
    pub fn paste(&mut self, text: &str) -> EditResult {
        let selection = self.selection().ok_or(FormatError::NoCursor)?;
        let blocks = normalize_paste(text, self.paste_options);

        let mut draft = self.document.clone();
        let mut cursor = draft.delete_range(&selection)?;
        cursor = draft.splice_blocks(cursor, blocks)?;

        self.finish_edit(draft, cursor);
        Ok(())
    }

    /// Type text at the cursor, replacing a range selection
    pub fn insert_text(&mut self, text: &str) -> EditResult {
        self.edit_at_cursor(|doc, cursor| doc.insert_text(cursor, text))
    }

    /// Enter: split the current block
    pub fn insert_paragraph_break(&mut self) -> EditResult {
        self.edit_at_cursor(|doc, cursor| doc.split_block(cursor))
    }

    /// Shift+Enter: line break inside the current block
    pub fn insert_line_break(&mut self) -> EditResult {
        self.edit_at_cursor(|doc, cursor| doc.insert_line_break(cursor))
    }

    /// Delete the selected range. A collapsed selection is left alone.
    pub fn delete_selection(&mut self) -> EditResult {
        let selection = self.selection().ok_or(FormatError::NoCursor)?;
        if selection.is_collapsed() {
            return Ok(());
        }
        self.delete(selection)
    }

    /// Backspace: delete the range, or the grapheme before the cursor. At the
    /// start of a block this merges it into the previous one.
    pub fn delete_backward(&mut self) -> EditResult {
        let selection = self.selection().ok_or(FormatError::NoCursor)?;
        if !selection.is_collapsed() {
            return self.delete(selection);
        }

        let cursor = selection.focus;
        let start = if cursor.offset > 0 {
            let text = self.block_text(cursor.block_index);
            let offset = text[..cursor.offset]
                .grapheme_indices(true)
                .next_back()
                .map_or(0, |(i, _)| i);
            DocumentPosition::new(cursor.block_index, offset)
        } else if cursor.block_index > 0 {
            let prev = cursor.block_index - 1;
            DocumentPosition::new(prev, self.block_text(prev).len())
        } else {
            return Ok(());
        };
        self.delete(Selection::new(start, cursor))
    }

    /// Delete: remove the range, or the grapheme after the cursor. At the end
    /// of a block this pulls the next one in.
    pub fn delete_forward(&mut self) -> EditResult {
        let selection = self.selection().ok_or(FormatError::NoCursor)?;
        if !selection.is_collapsed() {
            return self.delete(selection);
        }

        let cursor = selection.focus;
        let text = self.block_text(cursor.block_index);
        let end = if cursor.offset < text.len() {
            let len = text[cursor.offset..]
                .graphemes(true)
                .next()
                .map_or(0, str::len);
            DocumentPosition::new(cursor.block_index, cursor.offset + len)
        } else if cursor.block_index + 1 < self.document.block_count() {
            DocumentPosition::new(cursor.block_index + 1, 0)
        } else {
            return Ok(());
        };
        self.delete(Selection::new(cursor, end))
    }

    /// Step back one history entry. Returns false at the oldest entry.
    pub fn undo(&mut self) -> bool {
        match self.history.undo() {
            Some(value) => {
                let value = value.to_string();
                self.restore(value);
                true
            }
            None => false,
        }
    }

    /// Step forward one history entry. Returns false at the newest entry.
    pub fn redo(&mut self) -> bool {
        match self.history.redo() {
            Some(value) => {
                let value = value.to_string();
                self.restore(value);
                true
            }
            None => false,
        }
    }

    /// Dispatch a key press. Returns Ok(false) for keys the editor leaves to
    /// the host.
    pub fn handle_key(&mut self, event: &KeyEvent) -> Result<bool, FormatError> {
        let Some(action) = action_for(event) else {
            return Ok(false);
        };
        match action {
            EditorAction::Undo => {
                self.undo();
            }
            EditorAction::Redo => {
                self.redo();
            }
            EditorAction::Format(command) => self.apply(command)?,
            EditorAction::ParagraphBreak => self.insert_paragraph_break()?,
            EditorAction::LineBreak => self.insert_line_break()?,
            EditorAction::DeleteBackward => self.delete_backward()?,
            EditorAction::DeleteForward => self.delete_forward()?,
        }
        Ok(true)
    }

    fn block_text(&self, index: usize) -> String {
        self.document
            .block(index)
            .map(|b| b.to_plain_text())
            .unwrap_or_default()
    }

    fn delete(&mut self, selection: Selection) -> EditResult {
        let mut draft = self.document.clone();
        let cursor = draft.delete_range(&selection)?;
        self.finish_edit(draft, cursor);
        Ok(())
    }

    /// Delete any range selection, then run `edit` at the resulting cursor
    fn edit_at_cursor<F>(&mut self, edit: F) -> EditResult
    where
        F: FnOnce(
            &mut StructuredDocument,
            DocumentPosition,
        ) -> Result<DocumentPosition, DocumentError>,
    {
        let selection = self.selection().ok_or(FormatError::NoCursor)?;
        let mut draft = self.document.clone();
        let cursor = if selection.is_collapsed() {
            selection.focus
        } else {
            draft.delete_range(&selection)?
        };
        let cursor = edit(&mut draft, cursor)?;
        self.finish_edit(draft, cursor);
        Ok(())
    }

    fn finish_edit(&mut self, document: StructuredDocument, cursor: DocumentPosition) {
        self.document = document;
        self.selection
            .set(Some(Selection::collapsed(self.document.clamp_position(cursor))));
        self.commit();
    }

    fn restore(&mut self, value: String) {
        self.document = deserialize(&value);
        self.value = value;
        self.emit();
    }

    /// Serialize the document and, when the value changed, record it and
    /// notify the host. Returns whether anything changed.
    fn commit(&mut self) -> bool {
        let value = serialize(&self.document);
        if value == self.value {
            return false;
        }
        self.value = value;
        self.history.push(self.value.clone());
        self.emit();
        true
    }

    fn emit(&mut self) {
        if let Some(handler) = self.on_change.as_mut() {
            handler(&self.value);
        }
    }
}
