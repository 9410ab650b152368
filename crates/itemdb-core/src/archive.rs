//! # Archive Codec
//!
//! Moves an `ItemDatabase` in and out of a zip container holding
//! `database.json` plus one `images/<key>` entry per item image.
//!
//! Export suspends once, while the container bytes are generated. Import
//! suspends while the container index is read, once per image attachment
//! (all attachments load concurrently and are joined all-or-nothing), and
//! once for the document. Rebuilding the graph is synchronous.
//!
//! Both directions are all-or-nothing: an error never yields a partial
//! catalogue.

use crate::formats::{
    ConversionRecord, DatabaseDocument, ItemRecord, attachment_name, to_file_name,
};
use crate::primitives::{
    ARCHIVE_CONTENT_TYPE, ARCHIVE_EXTENSION, DOCUMENT_ENTRY, IMAGES_FOLDER, MAX_ARCHIVE_SIZE,
    MAX_DOCUMENT_SIZE, MAX_IMAGE_SIZE, MAX_IMAGES_TOTAL_SIZE, is_zip_content_type,
};
use crate::{Blob, EffectId, ItemDatabase, ItemDbError, RelationId, TagId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::io::{Cursor, Read, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::task::JoinSet;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

// =============================================================================
// OPTIONS
// =============================================================================

/// What import does with a name that was never declared.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnresolvedPolicy {
    /// Abort the import with `ItemDbError::UnresolvedReference`.
    #[default]
    Reject,
    /// Drop the edge and log a warning.
    Skip,
}

/// Import settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArchiveOptions {
    pub unresolved: UnresolvedPolicy,
    /// Largest archive accepted, checked before the container is opened.
    pub max_archive_size: u64,
    /// Largest decompressed size of a single image attachment.
    pub max_image_size: u64,
}

impl Default for ArchiveOptions {
    fn default() -> Self {
        Self {
            unresolved: UnresolvedPolicy::default(),
            max_archive_size: MAX_ARCHIVE_SIZE,
            max_image_size: MAX_IMAGE_SIZE,
        }
    }
}

// =============================================================================
// EXPORT
// =============================================================================

/// Flatten a catalogue to its document and its image attachments.
///
/// Attachments are keyed by sanitized name. Two items sanitizing to the same
/// key share one slot; the later item in store order wins.
#[must_use]
pub fn build_document(db: &ItemDatabase) -> (DatabaseDocument, BTreeMap<String, Blob>) {
    let mut images = BTreeMap::new();

    let effect_names = |ids: &BTreeSet<EffectId>| -> Vec<String> {
        ids.iter()
            .filter_map(|id| db.effect(*id))
            .map(|e| e.name.clone())
            .collect()
    };
    let tag_names = |ids: &BTreeSet<TagId>| -> Vec<String> {
        ids.iter()
            .filter_map(|id| db.tag(*id))
            .map(|t| t.name.clone())
            .collect()
    };

    let items = db
        .items()
        .map(|(_, item)| {
            let image = item.image.as_ref().map(|blob| {
                let key = attachment_name(&item.name, blob.extension());
                images.insert(key.clone(), blob.clone());
                key
            });

            let conversions = item
                .conversions()
                .iter()
                .filter_map(|id| db.conversion(*id))
                .map(|conversion| ConversionRecord {
                    tags: tag_names(conversion.tags()),
                    inputs: effect_names(conversion.inputs()),
                    outputs: effect_names(conversion.outputs()),
                })
                .collect();

            ItemRecord {
                name: item.name.clone(),
                image,
                tags: tag_names(item.tags()),
                conversions,
            }
        })
        .collect();

    let document = DatabaseDocument {
        name: db.name.clone(),
        effects: db.effects().map(|(_, e)| e.name.clone()).collect(),
        item_tags: db.item_tags().map(|(_, t)| t.name.clone()).collect(),
        conversion_tags: db.conversion_tags().map(|(_, t)| t.name.clone()).collect(),
        items,
    };

    (document, images)
}

/// Write the zip container. Blocking.
fn pack_archive(
    document: &[u8],
    images: &BTreeMap<String, Blob>,
) -> Result<Vec<u8>, ItemDbError> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    zip.start_file(DOCUMENT_ENTRY, options)?;
    zip.write_all(document)?;

    zip.add_directory(format!("{}/", IMAGES_FOLDER), options)?;
    for (key, blob) in images {
        zip.start_file(format!("{}/{}", IMAGES_FOLDER, key), options)?;
        zip.write_all(&blob.data)?;
    }

    Ok(zip.finish()?.into_inner())
}

/// Export a catalogue as a zip archive blob.
///
/// The blob is named `to_file_name(file_name)`, defaulting to the catalogue
/// name plus `.zip`.
pub async fn serialize_item_db(
    db: &ItemDatabase,
    file_name: Option<&str>,
) -> Result<Blob, ItemDbError> {
    let (document, images) = build_document(db);
    let json = serde_json::to_vec(&document)?;

    tracing::debug!(
        effects = document.effects.len(),
        items = document.items.len(),
        images = images.len(),
        "Packing catalogue archive"
    );

    let bytes = tokio::task::spawn_blocking(move || pack_archive(&json, &images)).await??;

    let name = match file_name {
        Some(name) => to_file_name(name),
        None => to_file_name(&format!("{}{}", db.name, ARCHIVE_EXTENSION)),
    };

    Ok(Blob::new(name, ARCHIVE_CONTENT_TYPE, bytes))
}

// =============================================================================
// IMPORT
// =============================================================================

/// Zip reader over a shared archive payload. Cloning it reuses the parsed
/// central directory.
type ArchiveReader = ZipArchive<Cursor<Arc<[u8]>>>;

/// Parse the container's central directory. Blocking.
fn open_archive(data: Arc<[u8]>) -> Result<ArchiveReader, ItemDbError> {
    Ok(ZipArchive::new(Cursor::new(data))?)
}

/// Names of all file entries under `images/`.
fn list_image_entries(archive: &ArchiveReader) -> Vec<String> {
    let prefix = format!("{}/", IMAGES_FOLDER);

    archive
        .file_names()
        .filter(|name| name.starts_with(&prefix) && !name.ends_with('/'))
        .map(str::to_string)
        .collect()
}

/// Read at most `max` bytes. Declared entry sizes are not trusted.
fn read_capped(reader: impl Read, max: u64) -> Result<Vec<u8>, ItemDbError> {
    let mut bytes = Vec::new();
    reader.take(max.saturating_add(1)).read_to_end(&mut bytes)?;
    let size = bytes.len() as u64;
    if size > max {
        return Err(ItemDbError::ArchiveTooLarge { size, max });
    }
    Ok(bytes)
}

/// Decompress one image entry, charging it to the shared `budget`. Blocking.
fn read_image(
    mut archive: ArchiveReader,
    entry: &str,
    max_image_size: u64,
    budget: &AtomicU64,
) -> Result<Vec<u8>, ItemDbError> {
    let file = archive.by_name(entry)?;
    let bytes = read_capped(file, max_image_size)?;

    let len = bytes.len() as u64;
    let total = budget.fetch_add(len, Ordering::Relaxed) + len;
    if total > MAX_IMAGES_TOTAL_SIZE {
        return Err(ItemDbError::ArchiveTooLarge {
            size: total,
            max: MAX_IMAGES_TOTAL_SIZE,
        });
    }
    Ok(bytes)
}

/// Decompress and parse `database.json`. Blocking.
fn read_document(mut archive: ArchiveReader) -> Result<DatabaseDocument, ItemDbError> {
    let file = match archive.by_name(DOCUMENT_ENTRY) {
        Ok(file) => file,
        Err(zip::result::ZipError::FileNotFound) => {
            return Err(ItemDbError::MissingEntry(DOCUMENT_ENTRY.to_string()));
        }
        Err(e) => return Err(e.into()),
    };

    let json = read_capped(file, MAX_DOCUMENT_SIZE)?;
    Ok(serde_json::from_slice(&json)?)
}

/// Load every image attachment concurrently into a name → blob map.
///
/// The first failure aborts the remaining loads.
async fn load_images(
    archive: ArchiveReader,
    max_image_size: u64,
) -> Result<BTreeMap<String, Blob>, ItemDbError> {
    let prefix = format!("{}/", IMAGES_FOLDER);
    let budget = Arc::new(AtomicU64::new(0));
    let mut tasks = JoinSet::new();

    for entry in list_image_entries(&archive) {
        let archive = archive.clone();
        let budget = Arc::clone(&budget);
        let key = entry
            .strip_prefix(&prefix)
            .unwrap_or(entry.as_str())
            .to_string();
        tasks.spawn_blocking(move || {
            read_image(archive, &entry, max_image_size, &budget).map(|bytes| (key, bytes))
        });
    }

    let mut images = BTreeMap::new();
    while let Some(joined) = tasks.join_next().await {
        let (key, bytes) = joined??;
        images.insert(key.clone(), Blob::new(key, "", bytes));
    }
    Ok(images)
}

/// Import a catalogue from an archive blob with default options.
pub async fn deserialize_item_db(blob: &Blob) -> Result<ItemDatabase, ItemDbError> {
    deserialize_item_db_with(blob, ArchiveOptions::default()).await
}

/// Import a catalogue from an archive blob.
///
/// Rejects the blob before opening it if its declared content type is not a
/// zip content type, or if it exceeds `options.max_archive_size`.
pub async fn deserialize_item_db_with(
    blob: &Blob,
    options: ArchiveOptions,
) -> Result<ItemDatabase, ItemDbError> {
    if !is_zip_content_type(&blob.content_type) {
        return Err(ItemDbError::InvalidFormat(blob.content_type.clone()));
    }

    let size = blob.len() as u64;
    if size > options.max_archive_size {
        return Err(ItemDbError::ArchiveTooLarge {
            size,
            max: options.max_archive_size,
        });
    }

    let data = Arc::clone(&blob.data);
    let archive = tokio::task::spawn_blocking(move || open_archive(data)).await??;

    let images = load_images(archive.clone(), options.max_image_size).await?;

    let document = tokio::task::spawn_blocking(move || read_document(archive)).await??;

    tracing::debug!(
        name = %document.name,
        effects = document.effects.len(),
        items = document.items.len(),
        images = images.len(),
        "Rebuilding catalogue from archive"
    );

    rebuild_catalogue(&document, &images, options.unresolved)
}

// =============================================================================
// REBUILD
// =============================================================================

/// Resolve a referenced name through a lookup built from declarations.
fn resolve<T: Copy>(
    lookup: &BTreeMap<&str, T>,
    name: &str,
    relation: RelationId,
    policy: UnresolvedPolicy,
) -> Result<Option<T>, ItemDbError> {
    match lookup.get(name) {
        Some(id) => Ok(Some(*id)),
        None => match policy {
            UnresolvedPolicy::Reject => Err(ItemDbError::UnresolvedReference {
                relation,
                name: name.to_string(),
            }),
            UnresolvedPolicy::Skip => {
                tracing::warn!("Skipping undeclared name {:?} in {}", name, relation);
                Ok(None)
            }
        },
    }
}

/// Rebuild a catalogue from a parsed document and its attachments.
///
/// Order: effects, item tags, conversion tags, then each item with its tags
/// and freshly created conversions. Duplicate declarations each create an
/// entity; the last one wins the name lookup.
pub fn rebuild_catalogue(
    document: &DatabaseDocument,
    images: &BTreeMap<String, Blob>,
    policy: UnresolvedPolicy,
) -> Result<ItemDatabase, ItemDbError> {
    let mut db = ItemDatabase::new(document.name.clone());

    let mut effects = BTreeMap::new();
    for name in &document.effects {
        effects.insert(name.as_str(), db.effects_create(name.clone()));
    }

    let mut item_tags = BTreeMap::new();
    for name in &document.item_tags {
        item_tags.insert(name.as_str(), db.item_tags_create(name.clone()));
    }

    let mut conversion_tags = BTreeMap::new();
    for name in &document.conversion_tags {
        conversion_tags.insert(name.as_str(), db.conversion_tags_create(name.clone()));
    }

    for record in &document.items {
        let image = record
            .image
            .as_ref()
            .and_then(|key| images.get(key))
            .cloned();
        let item = db.items_create(record.name.clone(), image);

        for tag in &record.tags {
            if let Some(tag) = resolve(&item_tags, tag, RelationId::ItemTags, policy)? {
                db.item_tags_add(item, tag);
            }
        }

        for conversion_record in &record.conversions {
            let conversion = db.conversions_create();

            for name in &conversion_record.tags {
                let tag = resolve(&conversion_tags, name, RelationId::ConversionTags, policy)?;
                if let Some(tag) = tag {
                    db.conversion_tags_add(conversion, tag);
                }
            }
            for name in &conversion_record.inputs {
                let effect = resolve(&effects, name, RelationId::ConversionInputs, policy)?;
                if let Some(effect) = effect {
                    db.conversion_inputs_add(conversion, effect);
                }
            }
            for name in &conversion_record.outputs {
                let effect = resolve(&effects, name, RelationId::ConversionOutputs, policy)?;
                if let Some(effect) = effect {
                    db.conversion_outputs_add(conversion, effect);
                }
            }

            db.item_conversions_add(item, conversion);
        }
    }

    Ok(db)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn document(json: &str) -> DatabaseDocument {
        serde_json::from_str(json).expect("valid document")
    }

    #[test]
    fn build_document_preserves_store_order() {
        let mut db = ItemDatabase::new("Order");
        db.effects_create("Zeta");
        db.effects_create("Alpha");
        db.item_tags_create("b");
        db.item_tags_create("a");

        let (doc, images) = build_document(&db);
        assert_eq!(doc.effects, vec!["Zeta".to_string(), "Alpha".to_string()]);
        assert_eq!(doc.item_tags, vec!["b".to_string(), "a".to_string()]);
        assert!(images.is_empty());
    }

    #[test]
    fn colliding_attachment_names_last_write_wins() {
        let mut db = ItemDatabase::new("Clash");
        db.items_create("Ice Wand", Some(Blob::new("a.png", "image/png", vec![1u8])));
        db.items_create("ice wand", Some(Blob::new("b.PNG", "image/png", vec![2u8])));

        let (doc, images) = build_document(&db);
        assert_eq!(images.len(), 1);
        assert_eq!(&*images["ice_wand.png"].data, &[2u8]);
        assert_eq!(doc.items[0].image.as_deref(), Some("ice_wand.png"));
        assert_eq!(doc.items[1].image.as_deref(), Some("ice_wand.png"));
    }

    #[test]
    fn rebuild_duplicate_names_last_wins() {
        let doc = document(
            r#"{"name":"Dup","effects":["Heat","Heat"],"items":[
                {"name":"Torch","conversions":[{"inputs":[],"outputs":["Heat"]}]}]}"#,
        );
        let db = rebuild_catalogue(&doc, &BTreeMap::new(), UnresolvedPolicy::Reject)
            .expect("rebuild");

        let ids: Vec<_> = db.effects().map(|(id, _)| id).collect();
        assert_eq!(ids.len(), 2);
        let (_, conversion) = db.conversions().next().expect("one conversion");
        assert!(conversion.outputs().contains(&ids[1]));
        assert!(!conversion.outputs().contains(&ids[0]));
    }

    #[test]
    fn rebuild_rejects_undeclared_name() {
        let doc = document(
            r#"{"name":"Bad","effects":["Heat"],"items":[
                {"name":"Torch","conversions":[{"inputs":["Smoke"],"outputs":[]}]}]}"#,
        );
        let err = rebuild_catalogue(&doc, &BTreeMap::new(), UnresolvedPolicy::Reject)
            .expect_err("undeclared input");

        match err {
            ItemDbError::UnresolvedReference { relation, name } => {
                assert_eq!(relation, RelationId::ConversionInputs);
                assert_eq!(name, "Smoke");
            }
            other => unreachable!("unexpected error: {other}"),
        }
    }

    #[test]
    fn rebuild_skips_undeclared_name() {
        let doc = document(
            r#"{"name":"Lenient","effects":["Heat"],"item_tags":["Magic"],"items":[
                {"name":"Torch","tags":["Magic","Cursed"],
                 "conversions":[{"inputs":["Smoke"],"outputs":["Heat"]}]}]}"#,
        );
        let db = rebuild_catalogue(&doc, &BTreeMap::new(), UnresolvedPolicy::Skip)
            .expect("rebuild");

        let (_, item) = db.items().next().expect("item");
        assert_eq!(item.tags().len(), 1);
        let (_, conversion) = db.conversions().next().expect("conversion");
        assert!(conversion.inputs().is_empty());
        assert_eq!(conversion.outputs().len(), 1);
    }

    #[test]
    fn rebuild_item_tags_do_not_resolve_conversion_tags() {
        let doc = document(
            r#"{"name":"T","effects":[],"conversion_tags":["Fire"],"items":[
                {"name":"Torch","tags":["Fire"],"conversions":[]}]}"#,
        );
        let err = rebuild_catalogue(&doc, &BTreeMap::new(), UnresolvedPolicy::Reject);
        assert!(matches!(
            err,
            Err(ItemDbError::UnresolvedReference {
                relation: RelationId::ItemTags,
                ..
            })
        ));
    }

    #[test]
    fn rebuild_image_requires_exact_key() {
        let doc = document(
            r#"{"name":"Img","effects":[],"items":[
                {"name":"A","image":"a.png","conversions":[]},
                {"name":"B","image":"B.png","conversions":[]}]}"#,
        );
        let mut images = BTreeMap::new();
        images.insert("a.png".to_string(), Blob::new("a.png", "", vec![7u8]));
        images.insert("b.png".to_string(), Blob::new("b.png", "", vec![8u8]));

        let db = rebuild_catalogue(&doc, &images, UnresolvedPolicy::Reject).expect("rebuild");
        let items: Vec<_> = db.items().map(|(_, i)| i.image.is_some()).collect();
        assert_eq!(items, vec![true, false]);
    }
}
