//! # itemdb CLI Module
//!
//! Authoring commands over a catalogue archive on disk. Each mutating
//! command loads the archive, applies catalogue operations and writes the
//! archive back.
//!
//! ## Available Commands
//!
//! - `init` - Create a new empty catalogue archive
//! - `status` - Show store counts
//! - `show` - List items with their tags and conversions
//! - `add-effect`, `add-tag`, `add-item`, `add-conversion` - Create entities
//! - `delete`, `delete-conversion` - Remove entities
//! - `dump` - Print the archive's `database.json`
//! - `server` - Serve the catalogue over HTTP

mod commands;

use crate::config::AppConfig;
use clap::{Parser, Subcommand, ValueEnum};
use itemdb_core::ItemDbError;
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// itemdb - item catalogue authoring tool
///
/// Edits a catalogue of effects, conversions, items and tags stored as a
/// zip archive.
#[derive(Parser, Debug)]
#[command(name = "itemdb")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to the catalogue archive
    #[arg(short = 'A', long, global = true, default_value = "catalogue.zip")]
    pub archive: PathBuf,

    /// Path to a TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Which tag store a tag belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum TagKind {
    Item,
    Conversion,
}

/// Named entity kinds that `delete` can remove.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum EntityKind {
    Effect,
    Item,
    ItemTag,
    ConversionTag,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a new empty catalogue archive
    Init {
        /// Catalogue name
        #[arg(short, long)]
        name: String,

        /// Overwrite an existing archive
        #[arg(short, long)]
        force: bool,
    },

    /// Show store counts
    Status,

    /// List items with their tags and conversions
    Show,

    /// Add an effect
    AddEffect {
        /// Effect name
        name: String,
    },

    /// Add a tag to the item or conversion tag store
    AddTag {
        /// Tag name
        name: String,

        /// Target store
        #[arg(short, long, value_enum, default_value = "item")]
        kind: TagKind,
    },

    /// Add an item
    AddItem {
        /// Item name
        name: String,

        /// Image file to attach
        #[arg(short, long)]
        image: Option<PathBuf>,

        /// Item tag names (repeatable)
        #[arg(short, long)]
        tag: Vec<String>,
    },

    /// Add a conversion to an item
    AddConversion {
        /// Owning item name
        #[arg(long)]
        item: String,

        /// Input effect names (repeatable)
        #[arg(short, long)]
        input: Vec<String>,

        /// Output effect names (repeatable)
        #[arg(short, long)]
        output: Vec<String>,

        /// Conversion tag names (repeatable)
        #[arg(short, long)]
        tag: Vec<String>,
    },

    /// Delete a named entity
    Delete {
        /// Entity kind
        #[arg(short, long, value_enum)]
        kind: EntityKind,

        /// Entity name
        #[arg(short, long)]
        name: String,
    },

    /// Delete one of an item's conversions
    DeleteConversion {
        /// Owning item name
        #[arg(long)]
        item: String,

        /// Zero-based position in the item's conversion list
        #[arg(long)]
        index: usize,
    },

    /// Print the archive's database.json
    Dump,

    /// Start HTTP server
    Server {
        /// Host to bind to (overrides config)
        #[arg(short = 'H', long)]
        host: Option<String>,

        /// Port to bind to (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli) -> Result<(), ItemDbError> {
    let mut config = AppConfig::load(cli.config.as_deref())?;
    let ctx = Context {
        archive: cli.archive,
        options: config.archive_options(),
        json_mode: cli.json_mode,
    };

    match cli.command {
        Some(Commands::Init { name, force }) => cmd_init(&ctx, &name, force).await,
        Some(Commands::Status) => cmd_status(&ctx).await,
        Some(Commands::Show) => cmd_show(&ctx).await,
        Some(Commands::AddEffect { name }) => cmd_add_effect(&ctx, &name).await,
        Some(Commands::AddTag { name, kind }) => cmd_add_tag(&ctx, &name, kind).await,
        Some(Commands::AddItem { name, image, tag }) => {
            cmd_add_item(&ctx, &name, image.as_deref(), &tag).await
        }
        Some(Commands::AddConversion {
            item,
            input,
            output,
            tag,
        }) => cmd_add_conversion(&ctx, &item, &input, &output, &tag).await,
        Some(Commands::Delete { kind, name }) => cmd_delete(&ctx, kind, &name).await,
        Some(Commands::DeleteConversion { item, index }) => {
            cmd_delete_conversion(&ctx, &item, index).await
        }
        Some(Commands::Dump) => cmd_dump(&ctx).await,
        Some(Commands::Server { host, port }) => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            cmd_server(&ctx, &config).await
        }
        None => {
            println!("No command specified. Use --help for usage information.");
            Ok(())
        }
    }
}
