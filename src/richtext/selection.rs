// Selection Tracker
// Maps the host's live selection onto document coordinates and drops stale ones

use super::structured_document::{DocumentPosition, Selection, StructuredDocument};
use unicode_segmentation::UnicodeSegmentation;

/// Formatting commands grouped by what they need from the selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatKind {
    Bold,
    Italic,
    Underline,
    Paragraph,
    Heading3,
    Quote,
    ListItem,
    HighlightSimple,
    HighlightAnimated,
    InfoBox,
    Separator,
    Align,
    InsertImage,
    InsertVideo,
}

/// Whether a format only makes sense on a non-collapsed selection.
/// Everything else works on the cursor's block.
pub fn requires_non_empty_selection(kind: FormatKind) -> bool {
    matches!(
        kind,
        FormatKind::HighlightSimple | FormatKind::HighlightAnimated | FormatKind::InfoBox
    )
}

/// The selection as reported by the host surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostSelection {
    pub anchor: DocumentPosition,
    pub focus: DocumentPosition,
    /// False when the host's selection lies outside the editable region
    pub within_editor: bool,
}

impl HostSelection {
    pub fn new(anchor: DocumentPosition, focus: DocumentPosition) -> Self {
        HostSelection {
            anchor,
            focus,
            within_editor: true,
        }
    }

    pub fn caret(at: DocumentPosition) -> Self {
        Self::new(at, at)
    }
}

/// Check that both endpoints resolve inside the document on grapheme boundaries
pub fn is_valid(doc: &StructuredDocument, selection: &Selection) -> bool {
    doc.validate_selection(selection).is_ok()
        && on_grapheme_boundary(doc, selection.anchor)
        && on_grapheme_boundary(doc, selection.focus)
}

fn on_grapheme_boundary(doc: &StructuredDocument, pos: DocumentPosition) -> bool {
    let Some(block) = doc.block(pos.block_index) else {
        return false;
    };
    let text = block.to_plain_text();
    pos.offset == text.len() || text.grapheme_indices(true).any(|(i, _)| i == pos.offset)
}

/// Resolve a host selection to document coordinates. None when nothing is
/// selected, the selection is outside the editor, or it no longer fits the document.
pub fn resolve(doc: &StructuredDocument, host: Option<HostSelection>) -> Option<Selection> {
    let host = host?;
    if !host.within_editor {
        log::debug!("ignoring selection outside the editable region");
        return None;
    }
    let selection = Selection::new(host.anchor, host.focus);
    if !is_valid(doc, &selection) {
        log::debug!("ignoring stale selection {:?}", selection);
        return None;
    }
    Some(selection)
}

/// Select the word around a position
pub fn word_range_at(doc: &StructuredDocument, pos: DocumentPosition) -> Option<Selection> {
    let block = doc.block(pos.block_index)?;
    let text = block.to_plain_text();

    text.split_word_bound_indices()
        .filter(|(_, word)| word.chars().any(char::is_alphanumeric))
        .find(|(start, word)| pos.offset >= *start && pos.offset <= start + word.len())
        .map(|(start, word)| {
            Selection::new(
                DocumentPosition::new(pos.block_index, start),
                DocumentPosition::new(pos.block_index, start + word.len()),
            )
        })
}

/// Keeps the last resolved selection and re-checks it against the document
#[derive(Debug, Clone, Default)]
pub struct SelectionTracker {
    current: Option<Selection>,
}

impl SelectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take a new selection from the host
    pub fn update(
        &mut self,
        doc: &StructuredDocument,
        host: Option<HostSelection>,
    ) -> Option<Selection> {
        self.current = resolve(doc, host);
        self.current
    }

    /// Replace the tracked selection (after a mutation moved the cursor)
    pub fn set(&mut self, selection: Option<Selection>) {
        self.current = selection;
    }

    pub fn clear(&mut self) {
        self.current = None;
    }

    /// The tracked selection, or None when it went stale
    pub fn current(&self, doc: &StructuredDocument) -> Option<Selection> {
        self.current.filter(|selection| {
            let valid = is_valid(doc, selection);
            if !valid {
                log::debug!("tracked selection {:?} is stale", selection);
            }
            valid
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::richtext::structured_document::Block;

    fn doc() -> StructuredDocument {
        StructuredDocument::from_blocks(vec![
            Block::paragraph().with_plain_text("Hello world"),
            Block::paragraph().with_plain_text("e\u{301}tude"),
        ])
    }

    #[test]
    fn test_requirement_table() {
        assert!(requires_non_empty_selection(FormatKind::HighlightSimple));
        assert!(requires_non_empty_selection(FormatKind::HighlightAnimated));
        assert!(requires_non_empty_selection(FormatKind::InfoBox));
        assert!(!requires_non_empty_selection(FormatKind::Bold));
        assert!(!requires_non_empty_selection(FormatKind::Paragraph));
        assert!(!requires_non_empty_selection(FormatKind::Heading3));
        assert!(!requires_non_empty_selection(FormatKind::Align));
        assert!(!requires_non_empty_selection(FormatKind::Separator));
        assert!(!requires_non_empty_selection(FormatKind::InsertImage));
    }

    #[test]
    fn test_resolve_valid_selection() {
        let host = HostSelection::new(DocumentPosition::new(0, 0), DocumentPosition::new(0, 5));
        let selection = resolve(&doc(), Some(host)).unwrap();
        assert_eq!(selection.ordered().1, DocumentPosition::new(0, 5));
    }

    #[test]
    fn test_resolve_rejects_empty_and_outside() {
        assert_eq!(resolve(&doc(), None), None);
        let mut host = HostSelection::caret(DocumentPosition::new(0, 1));
        host.within_editor = false;
        assert_eq!(resolve(&doc(), Some(host)), None);
    }

    #[test]
    fn test_resolve_rejects_stale_coordinates() {
        let past_blocks = HostSelection::caret(DocumentPosition::new(5, 0));
        assert_eq!(resolve(&doc(), Some(past_blocks)), None);
        let past_end = HostSelection::caret(DocumentPosition::new(0, 50));
        assert_eq!(resolve(&doc(), Some(past_end)), None);
    }

    #[test]
    fn test_resolve_rejects_inside_grapheme() {
        // Offset 1 sits between 'e' and its combining accent
        let inside = HostSelection::caret(DocumentPosition::new(1, 1));
        assert_eq!(resolve(&doc(), Some(inside)), None);
        let after = HostSelection::caret(DocumentPosition::new(1, 3));
        assert!(resolve(&doc(), Some(after)).is_some());
    }

    #[test]
    fn test_tracker_drops_selection_after_block_removal() {
        let mut tracker = SelectionTracker::new();
        let full = doc();
        tracker.update(&full, Some(HostSelection::caret(DocumentPosition::new(1, 2))));
        assert!(tracker.current(&full).is_none());

        tracker.update(&full, Some(HostSelection::caret(DocumentPosition::new(1, 3))));
        assert!(tracker.current(&full).is_some());

        let shorter = StructuredDocument::from_blocks(vec![Block::paragraph()]);
        assert_eq!(tracker.current(&shorter), None);
    }

    #[test]
    fn test_word_range_at() {
        let selection = word_range_at(&doc(), DocumentPosition::new(0, 8)).unwrap();
        assert_eq!(
            selection,
            Selection::new(DocumentPosition::new(0, 6), DocumentPosition::new(0, 11))
        );
    }
}
