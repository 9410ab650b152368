//! # CLI Command Implementations
//!
//! Every command works on a whole catalogue: load the archive, apply
//! catalogue operations, write the archive back. Entities are addressed
//! by name on the command line.

use super::{EntityKind, TagKind};
use crate::api;
use crate::config::AppConfig;
use crate::io;
use itemdb_core::{
    ArchiveOptions, ConversionId, EffectId, ItemDatabase, ItemDbError, ItemId, TagId,
    build_document, deserialize_item_db_with, serialize_item_db,
};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

// =============================================================================
// CONTEXT
// =============================================================================

/// Settings shared by every command.
#[derive(Debug, Clone)]
pub struct Context {
    /// Archive file the command reads and writes.
    pub archive: PathBuf,
    /// Codec options applied on load.
    pub options: ArchiveOptions,
    /// Print JSON instead of text.
    pub json_mode: bool,
}

impl Context {
    /// Context for `archive` with default codec options and text output.
    #[must_use]
    pub fn new(archive: impl Into<PathBuf>) -> Self {
        Self {
            archive: archive.into(),
            options: ArchiveOptions::default(),
            json_mode: false,
        }
    }
}

// =============================================================================
// ARCHIVE LOAD / SAVE
// =============================================================================

/// Load the catalogue from the context's archive.
pub async fn load_catalogue(ctx: &Context) -> Result<ItemDatabase, ItemDbError> {
    let blob = io::upload(&ctx.archive).await?.ok_or_else(|| {
        ItemDbError::NotFound(format!(
            "archive '{}' (run `itemdb init` first)",
            ctx.archive.display()
        ))
    })?;
    deserialize_item_db_with(&blob, ctx.options).await
}

/// Write the catalogue to the context's archive.
pub async fn save_catalogue(ctx: &Context, db: &ItemDatabase) -> Result<PathBuf, ItemDbError> {
    let blob = serialize_item_db(db, None).await?;
    let path = io::download(&ctx.archive, &blob).await?;
    tracing::info!(path = %path.display(), bytes = blob.len(), "Catalogue saved");
    Ok(path)
}

fn print_json(value: &serde_json::Value) {
    println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
}

// =============================================================================
// NAME RESOLUTION
// =============================================================================

fn require_effect(db: &ItemDatabase, name: &str) -> Result<EffectId, ItemDbError> {
    db.find_effect(name)
        .ok_or_else(|| ItemDbError::NotFound(format!("effect '{}'", name)))
}

fn require_item(db: &ItemDatabase, name: &str) -> Result<ItemId, ItemDbError> {
    db.find_item(name)
        .ok_or_else(|| ItemDbError::NotFound(format!("item '{}'", name)))
}

fn require_item_tag(db: &ItemDatabase, name: &str) -> Result<TagId, ItemDbError> {
    db.find_item_tag(name)
        .ok_or_else(|| ItemDbError::NotFound(format!("item tag '{}'", name)))
}

fn require_conversion_tag(db: &ItemDatabase, name: &str) -> Result<TagId, ItemDbError> {
    db.find_conversion_tag(name)
        .ok_or_else(|| ItemDbError::NotFound(format!("conversion tag '{}'", name)))
}

/// Names are the only cross-reference in the archive, so they must be
/// unique per store.
fn ensure_unused(taken: bool, what: &str, name: &str) -> Result<(), ItemDbError> {
    if taken {
        return Err(ItemDbError::InvalidInput(format!(
            "{} '{}' already exists",
            what, name
        )));
    }
    Ok(())
}

fn effect_names(db: &ItemDatabase, ids: &BTreeSet<EffectId>) -> Vec<String> {
    ids.iter()
        .filter_map(|id| db.effect(*id))
        .map(|e| e.name.clone())
        .collect()
}

fn join_names<'a>(names: impl Iterator<Item = &'a String>) -> String {
    names.map(String::as_str).collect::<Vec<_>>().join(", ")
}

fn tag_names(db: &ItemDatabase, ids: &BTreeSet<TagId>) -> Vec<String> {
    ids.iter()
        .filter_map(|id| db.tag(*id))
        .map(|t| t.name.clone())
        .collect()
}

// =============================================================================
// INIT COMMAND
// =============================================================================

/// Create a new empty catalogue archive.
pub async fn cmd_init(ctx: &Context, name: &str, force: bool) -> Result<(), ItemDbError> {
    if ctx.archive.exists() && !force {
        return Err(ItemDbError::InvalidInput(format!(
            "'{}' already exists (use --force to overwrite)",
            ctx.archive.display()
        )));
    }

    let db = ItemDatabase::new(name);
    let path = save_catalogue(ctx, &db).await?;

    if ctx.json_mode {
        print_json(&serde_json::json!({
            "archive": path.to_string_lossy(),
            "name": name,
        }));
    } else {
        println!("Initialized catalogue '{}' at {}", name, path.display());
    }
    Ok(())
}

// =============================================================================
// STATUS COMMAND
// =============================================================================

/// Show store counts.
pub async fn cmd_status(ctx: &Context) -> Result<(), ItemDbError> {
    let db = load_catalogue(ctx).await?;
    let summary = db.summary();

    if ctx.json_mode {
        print_json(&serde_json::to_value(&summary)?);
    } else {
        println!("Catalogue: {}", summary.name);
        println!("  Archive:         {}", ctx.archive.display());
        println!("  Effects:         {}", summary.effects);
        println!("  Conversions:     {}", summary.conversions);
        println!("  Items:           {}", summary.items);
        println!("  Item tags:       {}", summary.item_tags);
        println!("  Conversion tags: {}", summary.conversion_tags);
        println!("  Images:          {}", summary.images);
        println!("  Edges:           {}", summary.edges);
    }
    Ok(())
}

// =============================================================================
// SHOW COMMAND
// =============================================================================

/// List items with their tags and conversions.
pub async fn cmd_show(ctx: &Context) -> Result<(), ItemDbError> {
    let db = load_catalogue(ctx).await?;

    if ctx.json_mode {
        let (document, _) = build_document(&db);
        print_json(&serde_json::to_value(&document)?);
        return Ok(());
    }

    println!("Catalogue: {}", db.name);
    println!("Effects: {}", join_names(db.effects().map(|(_, e)| &e.name)));
    println!("Item tags: {}", join_names(db.item_tags().map(|(_, t)| &t.name)));
    println!(
        "Conversion tags: {}",
        join_names(db.conversion_tags().map(|(_, t)| &t.name))
    );
    println!("Items:");
    for (_, item) in db.items() {
        let mut line = format!("  {}", item.name);
        if !item.tags().is_empty() {
            line.push_str(&format!(" [{}]", tag_names(&db, item.tags()).join(", ")));
        }
        if let Some(image) = &item.image {
            line.push_str(&format!(" (image: {}, {} bytes)", image.name, image.len()));
        }
        println!("{}", line);

        for (index, conversion) in item
            .conversions()
            .iter()
            .filter_map(|id| db.conversion(*id))
            .enumerate()
        {
            let mut line = format!(
                "    [{}] {} -> {}",
                index,
                effect_names(&db, conversion.inputs()).join(" + "),
                effect_names(&db, conversion.outputs()).join(" + ")
            );
            if !conversion.tags().is_empty() {
                line.push_str(&format!(" [{}]", tag_names(&db, conversion.tags()).join(", ")));
            }
            println!("{}", line);
        }
    }
    Ok(())
}

// =============================================================================
// ADD COMMANDS
// =============================================================================

/// Add an effect.
pub async fn cmd_add_effect(ctx: &Context, name: &str) -> Result<(), ItemDbError> {
    let mut db = load_catalogue(ctx).await?;
    ensure_unused(db.find_effect(name).is_some(), "effect", name)?;

    let id = db.effects_create(name);
    save_catalogue(ctx, &db).await?;

    if ctx.json_mode {
        print_json(&serde_json::json!({ "effect": name, "id": id.0 }));
    } else {
        println!("Added effect '{}'", name);
    }
    Ok(())
}

/// Add a tag to one of the two tag stores.
pub async fn cmd_add_tag(ctx: &Context, name: &str, kind: TagKind) -> Result<(), ItemDbError> {
    let mut db = load_catalogue(ctx).await?;

    let id = match kind {
        TagKind::Item => {
            ensure_unused(db.find_item_tag(name).is_some(), "item tag", name)?;
            db.item_tags_create(name)
        }
        TagKind::Conversion => {
            ensure_unused(db.find_conversion_tag(name).is_some(), "conversion tag", name)?;
            db.conversion_tags_create(name)
        }
    };
    save_catalogue(ctx, &db).await?;

    if ctx.json_mode {
        print_json(&serde_json::json!({ "tag": name, "kind": format!("{:?}", kind), "id": id.0 }));
    } else {
        println!("Added {:?} tag '{}'", kind, name);
    }
    Ok(())
}

/// Add an item, optionally with an image and item tags.
pub async fn cmd_add_item(
    ctx: &Context,
    name: &str,
    image: Option<&Path>,
    tags: &[String],
) -> Result<(), ItemDbError> {
    let mut db = load_catalogue(ctx).await?;
    ensure_unused(db.find_item(name).is_some(), "item", name)?;

    let tag_ids = tags
        .iter()
        .map(|t| require_item_tag(&db, t))
        .collect::<Result<Vec<_>, _>>()?;

    let image = match image {
        Some(path) => Some(io::upload(path).await?.ok_or_else(|| {
            ItemDbError::NotFound(format!("image '{}'", path.display()))
        })?),
        None => None,
    };

    let id = db.items_create(name, image);
    for tag in tag_ids {
        db.item_tags_add(id, tag);
    }
    save_catalogue(ctx, &db).await?;

    if ctx.json_mode {
        print_json(&serde_json::json!({ "item": name, "id": id.0, "tags": tags }));
    } else {
        println!("Added item '{}'", name);
    }
    Ok(())
}

/// Add a conversion to an item.
pub async fn cmd_add_conversion(
    ctx: &Context,
    item: &str,
    inputs: &[String],
    outputs: &[String],
    tags: &[String],
) -> Result<(), ItemDbError> {
    let mut db = load_catalogue(ctx).await?;

    let item_id = require_item(&db, item)?;
    let input_ids = inputs
        .iter()
        .map(|n| require_effect(&db, n))
        .collect::<Result<Vec<_>, _>>()?;
    let output_ids = outputs
        .iter()
        .map(|n| require_effect(&db, n))
        .collect::<Result<Vec<_>, _>>()?;
    let tag_ids = tags
        .iter()
        .map(|n| require_conversion_tag(&db, n))
        .collect::<Result<Vec<_>, _>>()?;

    let conversion = db.conversions_create();
    for effect in input_ids {
        db.conversion_inputs_add(conversion, effect);
    }
    for effect in output_ids {
        db.conversion_outputs_add(conversion, effect);
    }
    for tag in tag_ids {
        db.conversion_tags_add(conversion, tag);
    }
    db.item_conversions_add(item_id, conversion);
    save_catalogue(ctx, &db).await?;

    if ctx.json_mode {
        print_json(&serde_json::json!({
            "item": item,
            "inputs": inputs,
            "outputs": outputs,
            "tags": tags,
        }));
    } else {
        println!("Added conversion {} -> {} to '{}'", inputs.join(" + "), outputs.join(" + "), item);
    }
    Ok(())
}

// =============================================================================
// DELETE COMMANDS
// =============================================================================

/// Delete a named entity. References to it are detached; nothing else is
/// deleted.
pub async fn cmd_delete(ctx: &Context, kind: EntityKind, name: &str) -> Result<(), ItemDbError> {
    let mut db = load_catalogue(ctx).await?;

    let deleted = match kind {
        EntityKind::Effect => {
            let id = require_effect(&db, name)?;
            db.effects_delete(id)
        }
        EntityKind::Item => {
            let id = require_item(&db, name)?;
            db.items_delete(id)
        }
        EntityKind::ItemTag => {
            let id = require_item_tag(&db, name)?;
            db.item_tags_delete(id)
        }
        EntityKind::ConversionTag => {
            let id = require_conversion_tag(&db, name)?;
            db.conversion_tags_delete(id)
        }
    };
    save_catalogue(ctx, &db).await?;

    if ctx.json_mode {
        print_json(&serde_json::json!({ "kind": format!("{:?}", kind), "name": name, "deleted": deleted }));
    } else {
        println!("Deleted {:?} '{}'", kind, name);
    }
    Ok(())
}

/// Delete the `index`-th conversion of an item.
pub async fn cmd_delete_conversion(
    ctx: &Context,
    item: &str,
    index: usize,
) -> Result<(), ItemDbError> {
    let mut db = load_catalogue(ctx).await?;

    let item_id = require_item(&db, item)?;
    let conversion: ConversionId = db
        .item(item_id)
        .and_then(|i| i.conversions().iter().nth(index).copied())
        .ok_or_else(|| {
            ItemDbError::NotFound(format!("conversion #{} of item '{}'", index, item))
        })?;

    let deleted = db.conversions_delete(conversion);
    save_catalogue(ctx, &db).await?;

    if ctx.json_mode {
        print_json(&serde_json::json!({ "item": item, "index": index, "deleted": deleted }));
    } else {
        println!("Deleted conversion #{} of '{}'", index, item);
    }
    Ok(())
}

// =============================================================================
// DUMP COMMAND
// =============================================================================

/// Print the catalogue document as stored in `database.json`.
pub async fn cmd_dump(ctx: &Context) -> Result<(), ItemDbError> {
    let db = load_catalogue(ctx).await?;
    let (document, _) = build_document(&db);
    println!("{}", serde_json::to_string_pretty(&document)?);
    Ok(())
}

// =============================================================================
// SERVER COMMAND
// =============================================================================

/// Serve the catalogue over HTTP.
///
/// A missing archive starts an empty catalogue named after the file.
pub async fn cmd_server(ctx: &Context, config: &AppConfig) -> Result<(), ItemDbError> {
    let db = if ctx.archive.exists() {
        load_catalogue(ctx).await?
    } else {
        let name = ctx
            .archive
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "catalogue".to_string());
        tracing::info!("No archive at {}, starting empty catalogue '{}'", ctx.archive.display(), name);
        ItemDatabase::new(name)
    };

    println!("itemdb server starting...");
    println!();
    println!("Configuration:");
    println!("  Host:       {}", config.server.host);
    println!("  Port:       {}", config.server.port);
    println!("  Catalogue:  {}", db.name);
    println!("  Max upload: {} bytes", config.server.max_upload_bytes);
    println!();

    api::run_server(&config.bind_addr(), db, api::ApiSettings::from_config(config)).await
}
