//! # itemdb - Item Catalogue Tool
//!
//! The main binary for authoring and serving item catalogues.
//!
//! This application provides:
//! - CLI interface for editing a catalogue archive on disk
//! - HTTP API for uploading and downloading catalogue archives
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │              apps/itemdb (THE BINARY)           │
//! │                                                 │
//! │   ┌─────────────┐          ┌─────────────┐      │
//! │   │    CLI      │          │  HTTP API   │      │
//! │   │   (clap)    │          │   (axum)    │      │
//! │   └──────┬──────┘          └──────┬──────┘      │
//! │          └────────────┬───────────┘             │
//! │                       ▼                         │
//! │               ┌───────────────┐                 │
//! │               │  itemdb-core  │                 │
//! │               │  (THE LOGIC)  │                 │
//! │               └───────────────┘                 │
//! └─────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! itemdb -A alchemy.zip init --name Alchemy
//! itemdb -A alchemy.zip add-effect Heat
//! itemdb -A alchemy.zip add-effect Cold
//! itemdb -A alchemy.zip add-item "Ice Wand"
//! itemdb -A alchemy.zip add-conversion --item "Ice Wand" -i Heat -o Cold
//! itemdb -A alchemy.zip server --port 8080
//! ```

use clap::Parser;
use itemdb::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    let cli = cli::Cli::parse();

    // ITEMDB_LOG_FORMAT=json enables machine-parseable output.
    let log_format = std::env::var("ITEMDB_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let default_filter = if cli.verbose {
        "itemdb=debug,itemdb_core=debug,tower_http=debug"
    } else {
        "itemdb=info,tower_http=debug"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }

    if !cli.quiet && !cli.json_mode {
        print_banner();
    }

    if let Err(e) = cli::execute(cli).await {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Print the startup banner.
fn print_banner() {
    println!(
        r#"
  itemdb v{}
  effects • conversions • items
"#,
        env!("CARGO_PKG_VERSION")
    );
}
