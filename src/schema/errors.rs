//! Schema error types
//!
//! Error codes:
//! - UTE_SCHEMA_FILE_MISSING
//! - UTE_SCHEMA_UNREADABLE
//! - UTE_SCHEMA_MALFORMED
//! - UTE_SCHEMA_MISSING_TYPE
//! - UTE_SCHEMA_UNKNOWN_TYPE
//! - UTE_SCHEMA_MISSING_ELEM
//! - UTE_SCHEMA_INVALID_FIELDS
//! - UTE_SCHEMA_INVALID_VERSION
//! - UTE_SCHEMA_TOO_DEEP
//!
//! Every schema error is fatal to the parse that raised it: no partial
//! schema is ever returned.

use std::fmt;
use std::io;

/// Schema-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaErrorCode {
    /// Schema file does not exist
    UteSchemaFileMissing,
    /// Schema file exists but could not be read
    UteSchemaUnreadable,
    /// Document is not well-formed or a node has the wrong shape
    UteSchemaMalformed,
    /// Field entry without a string `type`
    UteSchemaMissingType,
    /// `type` names an unsupported kind
    UteSchemaUnknownType,
    /// List field without `elem`
    UteSchemaMissingElem,
    /// Missing or non-sequence `fields`
    UteSchemaInvalidFields,
    /// Missing, non-positive or out-of-order version number
    UteSchemaInvalidVersion,
    /// Nesting exceeds the configured maximum depth
    UteSchemaTooDeep,
}

impl SchemaErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            SchemaErrorCode::UteSchemaFileMissing => "UTE_SCHEMA_FILE_MISSING",
            SchemaErrorCode::UteSchemaUnreadable => "UTE_SCHEMA_UNREADABLE",
            SchemaErrorCode::UteSchemaMalformed => "UTE_SCHEMA_MALFORMED",
            SchemaErrorCode::UteSchemaMissingType => "UTE_SCHEMA_MISSING_TYPE",
            SchemaErrorCode::UteSchemaUnknownType => "UTE_SCHEMA_UNKNOWN_TYPE",
            SchemaErrorCode::UteSchemaMissingElem => "UTE_SCHEMA_MISSING_ELEM",
            SchemaErrorCode::UteSchemaInvalidFields => "UTE_SCHEMA_INVALID_FIELDS",
            SchemaErrorCode::UteSchemaInvalidVersion => "UTE_SCHEMA_INVALID_VERSION",
            SchemaErrorCode::UteSchemaTooDeep => "UTE_SCHEMA_TOO_DEEP",
        }
    }

    /// True for failures reading the document, as opposed to its content
    pub fn is_io(&self) -> bool {
        matches!(
            self,
            SchemaErrorCode::UteSchemaFileMissing | SchemaErrorCode::UteSchemaUnreadable
        )
    }
}

impl fmt::Display for SchemaErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Schema error with document context
#[derive(Debug)]
pub struct SchemaError {
    /// Error code
    code: SchemaErrorCode,
    /// Human-readable message
    message: String,
    /// Path of the offending node (e.g. "versions[0].fields[2].elem")
    path: Option<String>,
    /// Underlying IO error if applicable
    source: Option<io::Error>,
}

impl SchemaError {
    fn new(code: SchemaErrorCode, message: impl Into<String>, path: Option<String>) -> Self {
        Self {
            code,
            message: message.into(),
            path,
            source: None,
        }
    }

    /// Create an error for a schema file that does not exist
    pub fn file_missing(file: impl Into<String>, source: io::Error) -> Self {
        Self {
            code: SchemaErrorCode::UteSchemaFileMissing,
            message: format!("Schema file '{}' not found", file.into()),
            path: None,
            source: Some(source),
        }
    }

    /// Create an error for a schema file that could not be read
    pub fn unreadable(file: impl Into<String>, source: io::Error) -> Self {
        Self {
            code: SchemaErrorCode::UteSchemaUnreadable,
            message: format!("Failed to read schema file '{}'", file.into()),
            path: None,
            source: Some(source),
        }
    }

    /// Create an error for a malformed document or node
    pub fn malformed(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(SchemaErrorCode::UteSchemaMalformed, reason, Some(path.into()))
    }

    /// Create an error for a field without a usable `type`
    pub fn missing_type(path: impl Into<String>) -> Self {
        Self::new(
            SchemaErrorCode::UteSchemaMissingType,
            "Field is missing a string 'type'",
            Some(path.into()),
        )
    }

    /// Create an error for an unsupported `type`
    pub fn unknown_type(path: impl Into<String>, type_name: &str) -> Self {
        Self::new(
            SchemaErrorCode::UteSchemaUnknownType,
            format!(
                "Unknown type '{}' (expected null, bool, int, string, list or struct)",
                type_name
            ),
            Some(path.into()),
        )
    }

    /// Create an error for a list without `elem`
    pub fn missing_elem(path: impl Into<String>) -> Self {
        Self::new(
            SchemaErrorCode::UteSchemaMissingElem,
            "List field is missing 'elem'",
            Some(path.into()),
        )
    }

    /// Create an error for missing or malformed `fields`
    pub fn invalid_fields(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(SchemaErrorCode::UteSchemaInvalidFields, reason, Some(path.into()))
    }

    /// Create an error for a bad version entry
    pub fn invalid_version(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(SchemaErrorCode::UteSchemaInvalidVersion, reason, Some(path.into()))
    }

    /// Create an error for nesting beyond the maximum depth
    pub fn too_deep(path: impl Into<String>, max_depth: usize) -> Self {
        Self::new(
            SchemaErrorCode::UteSchemaTooDeep,
            format!("Field nesting exceeds maximum depth of {}", max_depth),
            Some(path.into()),
        )
    }

    /// Returns the error code
    pub fn code(&self) -> SchemaErrorCode {
        self.code
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the document path of the offending node
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)?;
        if let Some(ref path) = self.path {
            write!(f, " (at {})", path)?;
        }
        if let Some(ref source) = self.source {
            write!(f, " (caused by: {})", source)?;
        }
        Ok(())
    }
}

impl std::error::Error for SchemaError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|e| e as &(dyn std::error::Error + 'static))
    }
}

/// Result type for schema operations
pub type SchemaResult<T> = Result<T, SchemaError>;
