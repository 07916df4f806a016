//! Schema Parsing Tests
//!
//! Tests for loading schema documents from disk:
//! - Single and multi-version documents
//! - Struct layout offsets are computed at parse time
//! - Failures abort the whole parse with a located error
//! - Configuration drives layout and depth limits
//! - Release is idempotent

use std::io::Write;

use tempfile::{NamedTempFile, TempDir};
use ute::config::Config;
use ute::schema::{FieldKind, SchemaErrorCode, SchemaParser};

// =============================================================================
// Helper Functions
// =============================================================================

const DEVICES_V2: &str = r#"
versions:
  - version: 1
    fields:
      - name: devices
        type: list
        elem:
          type: struct
          fields:
            - { name: id, type: int }
            - { name: name, type: string }
  - version: 2
    fields:
      - name: devices
        type: list
        elem:
          type: struct
          fields:
            - { name: online, type: bool }
            - { name: id, type: int }
            - { name: name, type: string, capacity: 16 }
"#;

fn write_schema(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

// =============================================================================
// Loading Tests
// =============================================================================

/// A multi-version file loads every version in order.
#[test]
fn test_load_multi_version_file() {
    let file = write_schema(DEVICES_V2);
    let schema = SchemaParser::new().parse_file(file.path()).unwrap();

    assert_eq!(schema.len(), 2);
    let numbers: Vec<u32> = schema.versions().iter().map(|v| v.number()).collect();
    assert_eq!(numbers, vec![1, 2]);
    assert_eq!(schema.latest().unwrap().number(), 2);
}

/// Offsets follow the layout rule in each version.
#[test]
fn test_offsets_per_version() {
    let file = write_schema(DEVICES_V2);
    let schema = SchemaParser::new().parse_file(file.path()).unwrap();

    let v1 = schema.version(1).unwrap().field("devices").unwrap();
    let record = v1.element().unwrap();
    assert_eq!(record.children()[0].offset(), Some(0));
    assert_eq!(record.children()[1].offset(), Some(8));
    assert_eq!(record.record_size(), Some(40));

    let v2 = schema.version(2).unwrap().field("devices").unwrap();
    let record = v2.element().unwrap();
    assert_eq!(record.children()[0].offset(), Some(0));
    assert_eq!(record.children()[1].offset(), Some(8));
    assert_eq!(record.children()[2].offset(), Some(16));
    assert_eq!(record.children()[2].capacity(), Some(16));
    assert_eq!(record.record_size(), Some(32));
}

/// Parsing the same document twice yields identical trees.
#[test]
fn test_parse_is_deterministic() {
    let parser = SchemaParser::new();
    let first = parser.parse_str(DEVICES_V2).unwrap();
    let second = parser.parse_str(DEVICES_V2).unwrap();
    assert_eq!(first, second);
}

/// Top-level `fields` becomes version 1.
#[test]
fn test_implicit_version() {
    let file = write_schema("fields:\n  - { name: flag, type: bool }\n");
    let schema = SchemaParser::new().parse_file(file.path()).unwrap();

    assert_eq!(schema.len(), 1);
    let version = schema.version(1).unwrap();
    assert_eq!(version.field("flag").unwrap().kind(), &FieldKind::Bool);
}

// =============================================================================
// Failure Tests
// =============================================================================

/// A missing file reports UTE_SCHEMA_FILE_MISSING.
#[test]
fn test_missing_file() {
    let dir = TempDir::new().unwrap();
    let err = SchemaParser::new()
        .parse_file(&dir.path().join("absent.yaml"))
        .unwrap_err();

    assert_eq!(err.code(), SchemaErrorCode::UteSchemaFileMissing);
    assert!(err.to_string().starts_with("UTE_SCHEMA_FILE_MISSING"));
    assert!(std::error::Error::source(&err).is_some());
}

/// Reading a directory fails as unreadable, not missing.
#[test]
fn test_directory_is_unreadable() {
    let dir = TempDir::new().unwrap();
    let err = SchemaParser::new().parse_file(dir.path()).unwrap_err();
    assert_eq!(err.code(), SchemaErrorCode::UteSchemaUnreadable);
}

/// A bad node deep in a later version reports its full path.
#[test]
fn test_error_path_in_version() {
    let file = write_schema(
        r#"
versions:
  - version: 1
    fields:
      - { name: id, type: int }
  - version: 2
    fields:
      - { name: id, type: int }
      - name: tags
        type: list
"#,
    );
    let err = SchemaParser::new().parse_file(file.path()).unwrap_err();
    assert_eq!(err.code(), SchemaErrorCode::UteSchemaMissingElem);
    assert_eq!(err.path(), Some("versions[1].fields[1]"));
}

/// Version numbers must ascend.
#[test]
fn test_descending_versions() {
    let err = SchemaParser::new()
        .parse_str("versions:\n  - { version: 3, fields: [] }\n  - { version: 1, fields: [] }\n")
        .unwrap_err();
    assert_eq!(err.code(), SchemaErrorCode::UteSchemaInvalidVersion);
    assert_eq!(err.path(), Some("versions[1]"));
}

// =============================================================================
// Configuration Tests
// =============================================================================

/// The configured string slot size drives offsets.
#[test]
fn test_config_drives_layout() {
    let mut config_file = NamedTempFile::new().unwrap();
    config_file
        .write_all(br#"{"string_slot_bytes": 8, "max_depth": 4}"#)
        .unwrap();
    let config = Config::load(config_file.path()).unwrap();

    let parser = SchemaParser::from_config(&config);
    let schema = parser
        .parse_str("fields:\n  - { name: r, type: struct, fields: [{ name: s, type: string }, { name: id, type: int }] }\n")
        .unwrap();
    let record = &schema.versions()[0].fields()[0];
    assert_eq!(record.children()[1].offset(), Some(8));
    assert_eq!(record.record_size(), Some(16));
}

/// The configured depth limit is enforced.
#[test]
fn test_config_depth_limit() {
    let config = Config {
        max_depth: 1,
        ..Config::default()
    };
    let err = SchemaParser::from_config(&config)
        .parse_str("fields:\n  - { name: r, type: struct, fields: [{ name: id, type: int }] }\n")
        .unwrap_err();
    assert_eq!(err.code(), SchemaErrorCode::UteSchemaTooDeep);
}

// =============================================================================
// Lifecycle Tests
// =============================================================================

/// Releasing twice is a no-op the second time.
#[test]
fn test_release_twice() {
    let mut schema = SchemaParser::new().parse_str(DEVICES_V2).unwrap();
    schema.release();
    assert!(schema.is_released());
    assert!(schema.version(1).is_none());

    schema.release();
    assert!(schema.is_released());
}
