//! # Formats Module
//!
//! The structured document stored inside a catalogue archive, and the file
//! name rules applied to everything written into the container.

pub mod document;

pub use document::{ConversionRecord, DatabaseDocument, ItemRecord, attachment_name, to_file_name};
