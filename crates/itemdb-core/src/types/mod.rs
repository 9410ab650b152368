//! # Core Type Definitions
//!
//! This module contains the shared vocabulary of the item catalogue:
//! - Entity identifiers (`EffectId`, `ConversionId`, `ItemId`, `TagId`)
//! - Polymorphic node references (`NodeRef`) and relation ids (`RelationId`)
//! - Opaque named byte blobs (`Blob`)
//! - Error types (`ItemDbError`)
//!
//! ## Identity Guarantees
//!
//! Identifiers are allocated from one counter per catalogue and are never
//! reused. A stale identifier therefore resolves to nothing rather than to
//! some newer entity.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

// =============================================================================
// ENTITY IDENTIFIERS
// =============================================================================

/// Identifier of an `Effect` in its catalogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EffectId(pub u64);

/// Identifier of an `EffectConversion` in its catalogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ConversionId(pub u64);

/// Identifier of an `Item` in its catalogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ItemId(pub u64);

/// Identifier of a `Tag`, in either the item-tag or the conversion-tag store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TagId(pub u64);

/// A reference to any graph node, regardless of its concrete type.
///
/// This is what a ledger records as the source of an incoming edge, and
/// what `detach` receives as the target to drop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum NodeRef {
    Tag(TagId),
    Effect(EffectId),
    Conversion(ConversionId),
    Item(ItemId),
}

impl From<TagId> for NodeRef {
    fn from(id: TagId) -> Self {
        Self::Tag(id)
    }
}

impl From<EffectId> for NodeRef {
    fn from(id: EffectId) -> Self {
        Self::Effect(id)
    }
}

impl From<ConversionId> for NodeRef {
    fn from(id: ConversionId) -> Self {
        Self::Conversion(id)
    }
}

impl From<ItemId> for NodeRef {
    fn from(id: ItemId) -> Self {
        Self::Item(id)
    }
}

// =============================================================================
// RELATION IDS
// =============================================================================

/// One token per named relation accessor.
///
/// Relation ids are only compared for equality and used as ledger keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RelationId {
    ConversionTags,
    ConversionInputs,
    ConversionOutputs,
    ItemTags,
    ItemConversions,
}

impl RelationId {
    /// Qualified accessor name, e.g. `EffectConversion.inputs`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            RelationId::ConversionTags => "EffectConversion.tags",
            RelationId::ConversionInputs => "EffectConversion.inputs",
            RelationId::ConversionOutputs => "EffectConversion.outputs",
            RelationId::ItemTags => "Item.tags",
            RelationId::ItemConversions => "Item.conversions",
        }
    }
}

impl fmt::Display for RelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// BLOB
// =============================================================================

/// An opaque, named run of bytes with a declared content type.
///
/// Item images and whole archives both travel as blobs. The payload is
/// shared, so cloning a blob never copies its bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    /// File name, including its extension.
    pub name: String,
    /// Declared content type. Empty when unknown.
    pub content_type: String,
    /// The bytes.
    pub data: Arc<[u8]>,
}

impl Blob {
    /// Create a new blob.
    pub fn new(
        name: impl Into<String>,
        content_type: impl Into<String>,
        data: impl Into<Arc<[u8]>>,
    ) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            data: data.into(),
        }
    }

    /// Payload length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True when the payload is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The extension of `name`, from the last `.` inclusive, or `""`.
    #[must_use]
    pub fn extension(&self) -> &str {
        self.name.rfind('.').map_or("", |pos| &self.name[pos..])
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur while moving a catalogue through an archive.
///
/// Graph mutations never produce these; only the archive codec and the
/// I/O surrounding it do.
#[derive(Debug, Error)]
pub enum ItemDbError {
    /// The declared content type is not an accepted zip content type.
    #[error("Invalid item database file type: {0:?}")]
    InvalidFormat(String),

    /// A required entry is missing from the container.
    #[error("Cannot find item database file: {0}")]
    MissingEntry(String),

    /// A record referenced a name that was never declared.
    #[error("Unresolved reference in {relation}: {name:?}")]
    UnresolvedReference { relation: RelationId, name: String },

    /// The archive or its document exceeds the configured size limit.
    #[error("Archive too large: {size} bytes exceeds maximum {max} bytes")]
    ArchiveTooLarge { size: u64, max: u64 },

    /// The container could not be read or written.
    #[error("Archive error: {0}")]
    Archive(String),

    /// The structured document could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    IoError(String),

    /// A background task failed to complete.
    #[error("Task failed: {0}")]
    Task(String),

    /// A named entity or file does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A caller-supplied argument or setting is invalid.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl From<zip::result::ZipError> for ItemDbError {
    fn from(e: zip::result::ZipError) -> Self {
        Self::Archive(e.to_string())
    }
}

impl From<serde_json::Error> for ItemDbError {
    fn from(e: serde_json::Error) -> Self {
        Self::SerializationError(e.to_string())
    }
}

impl From<std::io::Error> for ItemDbError {
    fn from(e: std::io::Error) -> Self {
        Self::IoError(e.to_string())
    }
}

impl From<tokio::task::JoinError> for ItemDbError {
    fn from(e: tokio::task::JoinError) -> Self {
        Self::Task(e.to_string())
    }
}

// =============================================================================
// TESTS
// =============================================================================
