//! # Configuration
//!
//! Optional TOML settings. Every field has a default, so an empty or
//! missing file yields a working configuration.
//!
//! ```toml
//! [import]
//! unresolved = "skip"
//!
//! [server]
//! host = "0.0.0.0"
//! port = 9000
//! max_upload_bytes = 33554432
//! ```

use itemdb_core::primitives::MAX_ARCHIVE_SIZE;
use itemdb_core::{ArchiveOptions, ItemDbError, UnresolvedPolicy};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// File consulted in the working directory when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "itemdb.toml";

// =============================================================================
// SECTIONS
// =============================================================================

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub import: ImportConfig,
    pub server: ServerConfig,
}

/// Settings applied whenever an archive is loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImportConfig {
    /// What to do with names that resolve to nothing.
    pub unresolved: UnresolvedPolicy,
    /// Largest archive accepted, in bytes.
    pub max_archive_bytes: u64,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            unresolved: UnresolvedPolicy::default(),
            max_archive_bytes: MAX_ARCHIVE_SIZE,
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Request body limit for `POST /import`.
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            max_upload_bytes: 32 * 1024 * 1024,
        }
    }
}

// =============================================================================
// LOADING
// =============================================================================

impl AppConfig {
    /// Parse a configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, ItemDbError> {
        toml::from_str(text).map_err(|e| ItemDbError::InvalidInput(format!("Bad config: {}", e)))
    }

    /// Load configuration.
    ///
    /// An explicit path must exist. Without one, `itemdb.toml` in the
    /// working directory is used if present, otherwise defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ItemDbError> {
        let path = match path {
            Some(p) => p,
            None if Path::new(DEFAULT_CONFIG_FILE).is_file() => Path::new(DEFAULT_CONFIG_FILE),
            None => return Ok(Self::default()),
        };

        let text = std::fs::read_to_string(path).map_err(|e| {
            ItemDbError::IoError(format!("Cannot read config '{}': {}", path.display(), e))
        })?;
        let config = Self::from_toml_str(&text)?;
        tracing::debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Codec options derived from the `[import]` section.
    #[must_use]
    pub fn archive_options(&self) -> ArchiveOptions {
        ArchiveOptions {
            unresolved: self.import.unresolved,
            max_archive_size: self.import.max_archive_bytes,
            ..ArchiveOptions::default()
        }
    }

    /// `host:port` for the HTTP listener.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_gives_defaults() {
        let config = AppConfig::from_toml_str("").expect("parse");
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.archive_options(), ArchiveOptions::default());
        assert_eq!(config.bind_addr(), "127.0.0.1:8080");
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = AppConfig::from_toml_str(
            r#"
            [import]
            unresolved = "skip"

            [server]
            port = 9000
            "#,
        )
        .expect("parse");

        assert_eq!(config.import.unresolved, UnresolvedPolicy::Skip);
        assert_eq!(config.import.max_archive_bytes, MAX_ARCHIVE_SIZE);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.bind_addr(), "127.0.0.1:9000");
    }

    #[test]
    fn unknown_policy_rejected() {
        let err = AppConfig::from_toml_str("[import]\nunresolved = \"maybe\"\n")
            .expect_err("bad policy");
        assert!(matches!(err, ItemDbError::InvalidInput(_)));
    }

    #[test]
    fn unknown_key_rejected() {
        assert!(AppConfig::from_toml_str("[server]\nprot = 1\n").is_err());
    }
}
