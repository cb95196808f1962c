// Embed drafts
// State behind the image and video dialogs. An upload runs elsewhere; the
// dialog only holds a ticket and accepts the result if it is still current.

use super::format::FormatCommand;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UploadError {
    #[error("upload failed: {0}")]
    Failed(String),
    #[error("upload result arrived for a superseded request")]
    Superseded,
    #[error("upload result arrived after the dialog was closed")]
    DialogClosed,
}

/// Identifies one upload request. Only the most recent ticket of an open
/// dialog is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UploadTicket(u64);

#[derive(Debug, Clone, Default)]
struct UploadSlot {
    generation: u64,
    pending: Option<u64>,
    closed: bool,
}

impl UploadSlot {
    fn start(&mut self) -> UploadTicket {
        self.generation += 1;
        self.pending = Some(self.generation);
        UploadTicket(self.generation)
    }

    fn accept(&mut self, ticket: UploadTicket) -> Result<(), UploadError> {
        if self.closed {
            log::debug!("discarding upload {:?}: dialog closed", ticket);
            return Err(UploadError::DialogClosed);
        }
        if self.pending != Some(ticket.0) {
            log::debug!("discarding upload {:?}: superseded", ticket);
            return Err(UploadError::Superseded);
        }
        self.pending = None;
        Ok(())
    }

    fn close(&mut self) {
        self.closed = true;
        self.pending = None;
    }
}

/// Apply an upload outcome to a draft URL. A failure empties the URL.
fn settle(url: &mut String, outcome: Result<String, String>) -> Result<(), UploadError> {
    match outcome {
        Ok(uploaded) => {
            *url = uploaded.trim().to_string();
            Ok(())
        }
        Err(message) => {
            log::warn!("media upload failed: {}", message);
            url.clear();
            Err(UploadError::Failed(message))
        }
    }
}

/// The image dialog
#[derive(Debug, Clone, Default)]
pub struct ImageDraft {
    pub url: String,
    pub alt_text: String,
    uploads: UploadSlot,
}

impl ImageDraft {
    pub fn new() -> Self {
        Self::default()
    }

    /// The Insert button is enabled only with a URL
    pub fn can_insert(&self) -> bool {
        !self.url.trim().is_empty()
    }

    pub fn is_uploading(&self) -> bool {
        self.uploads.pending.is_some()
    }

    /// Start an upload; any earlier one in flight is superseded
    pub fn start_upload(&mut self) -> UploadTicket {
        self.uploads.start()
    }

    /// Report the result of an upload: Ok(url) or Err(message)
    pub fn complete_upload(
        &mut self,
        ticket: UploadTicket,
        outcome: Result<String, String>,
    ) -> Result<(), UploadError> {
        self.uploads.accept(ticket)?;
        settle(&mut self.url, outcome)
    }

    /// Close the dialog without inserting. Late uploads are discarded.
    pub fn close(&mut self) {
        self.uploads.close();
    }

    /// The insert command for the current draft, None while the URL is blank
    pub fn command(&self) -> Option<FormatCommand> {
        self.can_insert().then(|| FormatCommand::InsertImage {
            url: self.url.clone(),
            alt_text: self.alt_text.clone(),
        })
    }
}

/// The video dialog
#[derive(Debug, Clone, Default)]
pub struct VideoDraft {
    pub url: String,
    pub title: String,
    uploads: UploadSlot,
}

impl VideoDraft {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn can_insert(&self) -> bool {
        !self.url.trim().is_empty()
    }

    pub fn is_uploading(&self) -> bool {
        self.uploads.pending.is_some()
    }

    pub fn start_upload(&mut self) -> UploadTicket {
        self.uploads.start()
    }

    pub fn complete_upload(
        &mut self,
        ticket: UploadTicket,
        outcome: Result<String, String>,
    ) -> Result<(), UploadError> {
        self.uploads.accept(ticket)?;
        settle(&mut self.url, outcome)
    }

    pub fn close(&mut self) {
        self.uploads.close();
    }

    pub fn command(&self) -> Option<FormatCommand> {
        self.can_insert().then(|| FormatCommand::InsertVideo {
            url: self.url.clone(),
            title: self.title.clone(),
        })
    }
}
