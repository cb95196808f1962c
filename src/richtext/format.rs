// Format Applier
// Runs toolbar/keyboard formatting commands against the document.
// Idle -> Validating -> Applying -> Committed | Rejected

use super::selection::{FormatKind, requires_non_empty_selection};
use super::structured_document::*;
use thiserror::Error;

/// Why a formatting command was rejected. Nothing is mutated on rejection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("select text first")]
    SelectionRequired,
    #[error("place the cursor in the editor first")]
    NoCursor,
    #[error("a media URL is required")]
    EmptyUrl,
    #[error(transparent)]
    Document(#[from] DocumentError),
}

/// A formatting command from the toolbar or keyboard
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatCommand {
    ToggleMark(Mark),
    SetBlock(TextBlockKind),
    InfoBox,
    Separator,
    Align(Alignment),
    InsertImage { url: String, alt_text: String },
    InsertVideo { url: String, title: String },
}

impl FormatCommand {
    pub fn kind(&self) -> FormatKind {
        match self {
            FormatCommand::ToggleMark(Mark::Bold) => FormatKind::Bold,
            FormatCommand::ToggleMark(Mark::Italic) => FormatKind::Italic,
            FormatCommand::ToggleMark(Mark::Underline) => FormatKind::Underline,
            FormatCommand::ToggleMark(Mark::HighlightSimple) => FormatKind::HighlightSimple,
            FormatCommand::ToggleMark(Mark::HighlightAnimated) => FormatKind::HighlightAnimated,
            FormatCommand::SetBlock(TextBlockKind::Paragraph) => FormatKind::Paragraph,
            FormatCommand::SetBlock(TextBlockKind::Heading3) => FormatKind::Heading3,
            FormatCommand::SetBlock(TextBlockKind::Quote) => FormatKind::Quote,
            FormatCommand::SetBlock(TextBlockKind::ListItem) => FormatKind::ListItem,
            FormatCommand::InfoBox => FormatKind::InfoBox,
            FormatCommand::Separator => FormatKind::Separator,
            FormatCommand::Align(_) => FormatKind::Align,
            FormatCommand::InsertImage { .. } => FormatKind::InsertImage,
            FormatCommand::InsertVideo { .. } => FormatKind::InsertVideo,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormatState {
    #[default]
    Idle,
    Validating,
    Applying,
    Committed,
    Rejected,
}

/// Executes formatting commands. Works on a private copy of the document and
/// only swaps it in once the whole command succeeded.
#[derive(Debug, Default)]
pub struct FormatApplier {
    state: FormatState,
}

impl FormatApplier {
    pub fn new() -> Self {
        Self::default()
    }

    /// State reached by the last command
    pub fn state(&self) -> FormatState {
        self.state
    }

    /// Apply a command. On success returns the selection to track afterwards.
    pub fn apply(
        &mut self,
        doc: &mut StructuredDocument,
        selection: Option<Selection>,
        command: &FormatCommand,
    ) -> Result<Option<Selection>, FormatError> {
        self.state = FormatState::Validating;
        if let Err(err) = Self::validate(selection, command) {
            return Err(self.reject(command, err));
        }

        self.state = FormatState::Applying;
        let mut draft = doc.clone();
        match Self::execute(&mut draft, selection, command) {
            Ok(next) => {
                *doc = draft;
                self.state = FormatState::Committed;
                Ok(next)
            }
            Err(err) => Err(self.reject(command, err.into())),
        }
    }

    fn reject(&mut self, command: &FormatCommand, err: FormatError) -> FormatError {
        log::debug!("rejected {:?}: {}", command.kind(), err);
        self.state = FormatState::Rejected;
        err
    }

    fn validate(selection: Option<Selection>, command: &FormatCommand) -> Result<(), FormatError> {
        let kind = command.kind();
        if requires_non_empty_selection(kind) && selection.is_none_or(|s| s.is_collapsed()) {
            return Err(FormatError::SelectionRequired);
        }
        match command {
            FormatCommand::InsertImage { url, .. } | FormatCommand::InsertVideo { url, .. } => {
                if compact_url(url).is_empty() {
                    return Err(FormatError::EmptyUrl);
                }
            }
            FormatCommand::SetBlock(_) | FormatCommand::Separator | FormatCommand::Align(_) => {
                if selection.is_none() {
                    return Err(FormatError::NoCursor);
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn execute(
        doc: &mut StructuredDocument,
        selection: Option<Selection>,
        command: &FormatCommand,
    ) -> Result<Option<Selection>, DocumentError> {
        match (command, selection) {
            (FormatCommand::ToggleMark(mark), Some(sel)) => {
                doc.toggle_mark(&sel, *mark)?;
                Ok(Some(sel))
            }
            (FormatCommand::ToggleMark(_), None) => Ok(None),
            (FormatCommand::SetBlock(kind), Some(sel)) => {
                doc.wrap_range(&sel, *kind)?;
                Ok(Some(sel))
            }
            (FormatCommand::InfoBox, Some(sel)) => {
                let isolated = doc.isolate_range(&sel, TextBlockKind::Quote)?;
                Ok(Some(isolated))
            }
            (FormatCommand::Align(alignment), Some(sel)) => {
                doc.set_alignment(&sel, *alignment)?;
                Ok(Some(sel))
            }
            (FormatCommand::Separator, Some(sel)) => {
                insert_at_cursor(doc, Some(sel), Block::separator())
            }
            (FormatCommand::InsertImage { url, alt_text }, sel) => {
                let embed = Embed::Image {
                    url: compact_url(url),
                    alt_text: single_line(alt_text),
                };
                insert_at_cursor(doc, sel, Block::embed(embed))
            }
            (FormatCommand::InsertVideo { url, title }, sel) => {
                let embed = Embed::Video {
                    url: compact_url(url),
                    title: single_line(title),
                };
                insert_at_cursor(doc, sel, Block::embed(embed))
            }
            // Unreachable after validation; leave the document alone
            (_, None) => Ok(None),
        }
    }
}

/// Insert a block at the selection's focus, or at the end without a cursor.
/// The cursor moves to the start of the following block when there is one.
fn insert_at_cursor(
    doc: &mut StructuredDocument,
    selection: Option<Selection>,
    block: Block,
) -> Result<Option<Selection>, DocumentError> {
    let at = match selection {
        Some(sel) => sel.focus,
        None => match doc.block_count() {
            0 => DocumentPosition::start(),
            n => DocumentPosition::new(n - 1, doc.blocks()[n - 1].text_len()),
        },
    };
    let index = doc.insert_block_at_position(at, block)?;
    let next = (index + 1).min(doc.block_count() - 1);
    Ok(Some(Selection::collapsed(DocumentPosition::new(next, 0))))
}

fn single_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
