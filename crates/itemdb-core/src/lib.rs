//! # itemdb-core
//!
//! The reference-tracked graph model for item catalogues, and the archive
//! codec that carries a catalogue through a portable zip container.
//!
//! ## Model
//!
//! - `ItemDatabase` owns five stores: effects, conversions, items, item tags
//!   and conversion tags. It is the only place entities are created or
//!   destroyed.
//! - Every relation is recorded on both sides: the owner's forward set holds
//!   the target's id, and the target's `Ledger` holds `(relation, owner)`.
//! - Deleting a node detaches it from everything that pointed at it, and
//!   deletes nothing else.
//!
//! ## Archive
//!
//! `serialize_item_db` / `deserialize_item_db` turn a catalogue into a
//! `database.json` document plus `images/*` attachments and back.
//!
//! ## Architectural Constraints
//!
//! - Graph mutations are synchronous and never fail
//! - No internal locking: callers serialize mutations
//! - The codec is all-or-nothing

// =============================================================================
// MODULES
// =============================================================================

pub mod archive;
pub mod catalogue;
pub mod formats;
pub mod graph;
pub mod ledger;
pub mod primitives;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{
    Blob, ConversionId, EffectId, ItemDbError, ItemId, NodeRef, RelationId, TagId,
};

// =============================================================================
// RE-EXPORTS: Graph Model
// =============================================================================

pub use catalogue::{CatalogueSummary, ItemDatabase};
pub use graph::{Effect, EffectConversion, Item, Tag};
pub use ledger::{GraphNode, Ledger};

// =============================================================================
// RE-EXPORTS: Archive
// =============================================================================

pub use archive::{
    ArchiveOptions, UnresolvedPolicy, build_document, deserialize_item_db,
    deserialize_item_db_with, rebuild_catalogue, serialize_item_db,
};
pub use formats::{ConversionRecord, DatabaseDocument, ItemRecord};
