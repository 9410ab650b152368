//! # Archive Primitives
//!
//! Fixed names and limits of the catalogue archive format.
//!
//! An archive is a zip container with:
//! 1. One structured document at `DOCUMENT_ENTRY`.
//! 2. One binary attachment per item image under `IMAGES_FOLDER/`.

/// Entry holding the JSON catalogue document.
pub const DOCUMENT_ENTRY: &str = "database.json";

/// Compartment holding item image attachments.
pub const IMAGES_FOLDER: &str = "images";

/// Content type given to generated archives.
pub const ARCHIVE_CONTENT_TYPE: &str = "application/zip";

/// Declared content types accepted on import.
///
/// Anything else is rejected before the container is opened.
pub const ZIP_CONTENT_TYPES: [&str; 2] = ["application/zip", "application/x-zip-compressed"];

/// Suffix appended to the catalogue name for the default archive name.
pub const ARCHIVE_EXTENSION: &str = ".zip";

// =============================================================================
// INPUT VALIDATION LIMITS
// =============================================================================

/// Maximum archive size accepted on import (256 MB).
///
/// Checked before the container is opened.
pub const MAX_ARCHIVE_SIZE: u64 = 256 * 1024 * 1024;

/// Maximum decompressed size of the JSON document (64 MB).
pub const MAX_DOCUMENT_SIZE: u64 = 64 * 1024 * 1024;

/// Default maximum decompressed size of one image attachment (32 MB).
pub const MAX_IMAGE_SIZE: u64 = 32 * 1024 * 1024;

/// Maximum decompressed size of all image attachments together (512 MB).
pub const MAX_IMAGES_TOTAL_SIZE: u64 = 512 * 1024 * 1024;

/// True when `content_type` is one of `ZIP_CONTENT_TYPES`.
#[must_use]
pub fn is_zip_content_type(content_type: &str) -> bool {
    ZIP_CONTENT_TYPES.contains(&content_type)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_exactly_two_zip_types() {
        assert!(is_zip_content_type("application/zip"));
        assert!(is_zip_content_type("application/x-zip-compressed"));
        assert!(!is_zip_content_type("text/plain"));
        assert!(!is_zip_content_type("APPLICATION/ZIP"));
        assert!(!is_zip_content_type(""));
    }
}
