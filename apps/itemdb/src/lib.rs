//! # itemdb - Item Catalogue Application
//!
//! Library half of the `itemdb` binary. The modules are public so the
//! integration tests can drive the router and the command layer directly.
//!
//! - `api` - axum HTTP server exposing archive upload and download
//! - `cli` - clap command definitions and their implementations
//! - `config` - optional `itemdb.toml` settings
//! - `io` - blob transfer to and from the local filesystem

pub mod api;
pub mod cli;
pub mod config;
pub mod io;
