//! # Blob Transfer
//!
//! The filesystem side of upload and download. Files are read whole into a
//! `Blob` and written back whole; the content type is inferred from the
//! file extension, the way a browser would declare it.

use itemdb_core::{Blob, ItemDbError};
use std::path::{Path, PathBuf};

/// Largest file read by `upload`, archives and images alike (512 MB).
pub const MAX_UPLOAD_FILE_SIZE: u64 = 512 * 1024 * 1024;

/// Guess a content type from a path's extension.
///
/// Unknown extensions give `application/octet-stream`, which the archive
/// codec rejects.
#[must_use]
pub fn content_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    match ext.as_str() {
        "zip" => "application/zip",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "json" => "application/json",
        _ => "application/octet-stream",
    }
}

/// Read a file into a blob named after the file.
///
/// Returns `Ok(None)` when nothing exists at `path`.
pub async fn upload(path: &Path) -> Result<Option<Blob>, ItemDbError> {
    let metadata = match tokio::fs::metadata(path).await {
        Ok(m) => m,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(ItemDbError::IoError(format!(
                "Cannot read '{}': {}",
                path.display(),
                e
            )));
        }
    };

    if !metadata.is_file() {
        return Err(ItemDbError::IoError(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }
    if metadata.len() > MAX_UPLOAD_FILE_SIZE {
        return Err(ItemDbError::ArchiveTooLarge {
            size: metadata.len(),
            max: MAX_UPLOAD_FILE_SIZE,
        });
    }

    let data = tokio::fs::read(path)
        .await
        .map_err(|e| ItemDbError::IoError(format!("Cannot read '{}': {}", path.display(), e)))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    tracing::debug!(path = %path.display(), bytes = data.len(), "Uploaded blob");
    Ok(Some(Blob::new(name, content_type_for(path), data)))
}

/// Write a blob to disk and return where it landed.
///
/// When `dest` is an existing directory the blob's own name is used inside
/// it; otherwise `dest` is the file path.
pub async fn download(dest: &Path, blob: &Blob) -> Result<PathBuf, ItemDbError> {
    let target = if tokio::fs::metadata(dest).await.is_ok_and(|m| m.is_dir()) {
        dest.join(&blob.name)
    } else {
        dest.to_path_buf()
    };

    tokio::fs::write(&target, &blob.data[..]).await.map_err(|e| {
        ItemDbError::IoError(format!("Cannot write '{}': {}", target.display(), e))
    })?;

    tracing::debug!(path = %target.display(), bytes = blob.len(), "Downloaded blob");
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_types_by_extension() {
        assert_eq!(content_type_for(Path::new("a/b/Catalogue.ZIP")), "application/zip");
        assert_eq!(content_type_for(Path::new("icon.jpeg")), "image/jpeg");
        assert_eq!(content_type_for(Path::new("notes")), "application/octet-stream");
    }
}
