// Library exports for pressroom

pub mod config;
pub mod history;
pub mod richtext;

pub use config::{ConfigError, EditorConfig};
pub use history::{History, HistoryEntry};
pub use richtext::format::{FormatCommand, FormatError};
pub use richtext::structured_editor::RichTextEditor;
