pub mod markup_converter;
pub mod paste;
pub mod render;

pub mod embed;
pub mod format;
pub mod keymap;
pub mod selection;
pub mod structured_document;
pub mod structured_editor;
