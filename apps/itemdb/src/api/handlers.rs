//! # API Endpoint Handlers
//!
//! `/export` and `/import` are the HTTP download and upload collaborators:
//! the archive travels as the raw request or response body.

use super::{
    AppState,
    types::{ErrorResponse, HealthResponse, ImportResponse},
};
use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};
use itemdb_core::{Blob, ItemDbError, build_document, deserialize_item_db_with, serialize_item_db};

/// Blob name given to uploaded request bodies.
const UPLOAD_NAME: &str = "upload.zip";

/// HTTP status for a codec error.
pub fn status_for(error: &ItemDbError) -> StatusCode {
    match error {
        ItemDbError::InvalidFormat(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
        ItemDbError::ArchiveTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
        ItemDbError::MissingEntry(_)
        | ItemDbError::UnresolvedReference { .. }
        | ItemDbError::Archive(_)
        | ItemDbError::SerializationError(_) => StatusCode::UNPROCESSABLE_ENTITY,
        ItemDbError::NotFound(_) => StatusCode::NOT_FOUND,
        ItemDbError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        ItemDbError::IoError(_) | ItemDbError::Task(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Media type of a `Content-Type` header value, without parameters.
///
/// HTTP media types are case-insensitive, so the result is lowercased
/// before it reaches the archive's content type check.
fn media_type(value: &str) -> String {
    value
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

// =============================================================================
// HEALTH HANDLER
// =============================================================================

/// Health check endpoint.
pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse::default())
}

// =============================================================================
// STATUS HANDLER
// =============================================================================

/// Store counts of the current catalogue.
pub async fn status_handler(State(state): State<AppState>) -> impl IntoResponse {
    let db = state.catalogue.read().await;
    (StatusCode::OK, Json(db.summary()))
}

// =============================================================================
// DOCUMENT HANDLER
// =============================================================================

/// The catalogue as its `database.json` document, without images.
pub async fn document_handler(State(state): State<AppState>) -> impl IntoResponse {
    let db = state.catalogue.read().await;
    let (document, _) = build_document(&db);
    (StatusCode::OK, Json(document))
}

// =============================================================================
// EXPORT HANDLER
// =============================================================================

/// Download the catalogue as a zip archive.
pub async fn export_handler(State(state): State<AppState>) -> Response {
    let db = state.catalogue.read().await;

    match serialize_item_db(&db, None).await {
        Ok(blob) => {
            tracing::info!(name = %blob.name, bytes = blob.len(), "Exported catalogue");
            let disposition = format!("attachment; filename=\"{}\"", blob.name);
            (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, blob.content_type.clone()),
                    (header::CONTENT_DISPOSITION, disposition),
                ],
                blob.data.to_vec(),
            )
                .into_response()
        }
        Err(e) => {
            tracing::error!("Export failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new(format!("Export failed: {}", e))),
            )
                .into_response()
        }
    }
}

// =============================================================================
// IMPORT HANDLER
// =============================================================================

/// Replace the catalogue with an uploaded archive.
///
/// The request `Content-Type` is the archive's declared content type. The
/// current catalogue is left untouched unless the whole import succeeds.
pub async fn import_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(media_type)
        .unwrap_or_default();
    let blob = Blob::new(UPLOAD_NAME, content_type, body.to_vec());

    match deserialize_item_db_with(&blob, state.settings.options).await {
        Ok(db) => {
            let summary = db.summary();
            *state.catalogue.write().await = db;
            tracing::info!(
                name = %summary.name,
                items = summary.items,
                "Imported catalogue"
            );
            (StatusCode::OK, Json(ImportResponse::success(summary))).into_response()
        }
        Err(e) => {
            tracing::warn!("Import rejected: {}", e);
            (status_for(&e), Json(ImportResponse::error(e.to_string()))).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn media_type_drops_parameters() {
        assert_eq!(media_type("application/zip; charset=binary"), "application/zip");
        assert_eq!(media_type(" application/zip "), "application/zip");
    }

    #[test]
    fn media_type_is_lowercased() {
        assert_eq!(media_type("Application/ZIP"), "application/zip");
        assert_eq!(
            media_type("APPLICATION/X-Zip-Compressed; Charset=binary"),
            "application/x-zip-compressed"
        );
    }

    #[test]
    fn codec_errors_map_to_client_statuses() {
        assert_eq!(
            status_for(&ItemDbError::InvalidFormat("text/plain".into())),
            StatusCode::UNSUPPORTED_MEDIA_TYPE
        );
        assert_eq!(
            status_for(&ItemDbError::MissingEntry("database.json".into())),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status_for(&ItemDbError::ArchiveTooLarge { size: 2, max: 1 }),
            StatusCode::PAYLOAD_TOO_LARGE
        );
    }
}
