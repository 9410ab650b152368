//! Unit tests for API types serialization/deserialization.

// Allow unwrap and panic in tests - these are standard for test code
#![allow(clippy::unwrap_used, clippy::panic)]

use itemdb::api::{ErrorResponse, HealthResponse, ImportResponse};
use itemdb_core::ItemDatabase;

// =============================================================================
// HEALTH RESPONSE TESTS
// =============================================================================

#[test]
fn test_health_response_default() {
    let health = HealthResponse::default();
    assert_eq!(health.status, "ok");
    assert!(!health.version.is_empty());
}

#[test]
fn test_health_response_deserialization() {
    let json = r#"{"status":"healthy","version":"1.0.0"}"#;
    let health: HealthResponse = serde_json::from_str(json).unwrap();

    assert_eq!(health.status, "healthy");
    assert_eq!(health.version, "1.0.0");
}

// =============================================================================
// IMPORT RESPONSE TESTS
// =============================================================================

#[test]
fn test_import_response_success_omits_error() {
    let mut db = ItemDatabase::new("Alchemy");
    db.effects_create("Heat");
    let response = ImportResponse::success(db.summary());

    let json = serde_json::to_value(&response).unwrap();
    assert_eq!(json["success"], true);
    assert_eq!(json["summary"]["name"], "Alchemy");
    assert_eq!(json["summary"]["effects"], 1);
    assert!(json.get("error").is_none());
}

#[test]
fn test_import_response_error_omits_summary() {
    let response = ImportResponse::error("Invalid item database file type: \"text/plain\"");

    let json = serde_json::to_string(&response).unwrap();
    assert!(json.contains("\"success\":false"));
    assert!(json.contains("text/plain"));
    assert!(!json.contains("summary"));
}

#[test]
fn test_import_response_roundtrip() {
    let json = r#"{"success":false,"error":"boom"}"#;
    let response: ImportResponse = serde_json::from_str(json).unwrap();

    assert!(!response.success);
    assert!(response.summary.is_none());
    assert_eq!(response.error.as_deref(), Some("boom"));
}

// =============================================================================
// ERROR RESPONSE TESTS
// =============================================================================

#[test]
fn test_error_response_serialization() {
    let json = serde_json::to_string(&ErrorResponse::new("Export failed")).unwrap();
    assert_eq!(json, r#"{"error":"Export failed"}"#);
}
