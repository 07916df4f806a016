//! Codec error types
//!
//! Error codes:
//! - UTE_BUFFER_TOO_SMALL: output buffer cannot hold the next emission
//! - UTE_TRUNCATED: input ended inside a value
//! - UTE_FORMAT_MISMATCH: header tag differs from the schema kind
//! - UTE_SCHEMA_MISMATCH: struct member count differs from the schema
//! - UTE_VARINT_OVERFLOW: varint does not fit in 64 bits
//! - UTE_CAPACITY_EXCEEDED: string longer than its declared capacity
//! - UTE_TARGET_TOO_SMALL: fewer list slots than encoded elements
//! - UTE_VALUE_MISMATCH: value variant differs from the schema kind
//! - UTE_MISSING_VALUE: vacant value where one is required
//! - UTE_LENGTH_OVERFLOW: encoded length does not fit in memory
//!
//! Every error carries the byte offset at which it occurred, relative to the
//! start of the top-level call, and the path of the field being processed.

use std::fmt;

use crate::wire::WireTag;

/// Codec error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecErrorCode {
    /// Output buffer exhausted
    UteBufferTooSmall,
    /// Input exhausted
    UteTruncated,
    /// Unexpected or invalid header tag
    UteFormatMismatch,
    /// Struct member count differs from the schema
    UteSchemaMismatch,
    /// Varint wider than 64 bits
    UteVarintOverflow,
    /// String exceeds declared capacity
    UteCapacityExceeded,
    /// Decode target has too few list slots
    UteTargetTooSmall,
    /// Value variant does not match the field kind
    UteValueMismatch,
    /// Vacant value passed to the encoder
    UteMissingValue,
    /// Length or count does not fit in usize
    UteLengthOverflow,
}

impl CodecErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            CodecErrorCode::UteBufferTooSmall => "UTE_BUFFER_TOO_SMALL",
            CodecErrorCode::UteTruncated => "UTE_TRUNCATED",
            CodecErrorCode::UteFormatMismatch => "UTE_FORMAT_MISMATCH",
            CodecErrorCode::UteSchemaMismatch => "UTE_SCHEMA_MISMATCH",
            CodecErrorCode::UteVarintOverflow => "UTE_VARINT_OVERFLOW",
            CodecErrorCode::UteCapacityExceeded => "UTE_CAPACITY_EXCEEDED",
            CodecErrorCode::UteTargetTooSmall => "UTE_TARGET_TOO_SMALL",
            CodecErrorCode::UteValueMismatch => "UTE_VALUE_MISMATCH",
            CodecErrorCode::UteMissingValue => "UTE_MISSING_VALUE",
            CodecErrorCode::UteLengthOverflow => "UTE_LENGTH_OVERFLOW",
        }
    }

    /// True for errors caused by malformed or hostile input bytes
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            CodecErrorCode::UteTruncated
                | CodecErrorCode::UteFormatMismatch
                | CodecErrorCode::UteVarintOverflow
                | CodecErrorCode::UteLengthOverflow
        )
    }
}

impl fmt::Display for CodecErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Codec error with position context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodecError {
    code: CodecErrorCode,
    message: String,
    /// Byte offset into the buffer being written or read
    offset: usize,
    /// Field path, e.g. "devices[1].name"
    path: Option<String>,
}

impl CodecError {
    fn new(code: CodecErrorCode, offset: usize, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            offset,
            path: None,
        }
    }

    /// Output buffer cannot hold `needed` more bytes
    pub fn buffer_too_small(offset: usize, needed: usize, remaining: usize) -> Self {
        Self::new(
            CodecErrorCode::UteBufferTooSmall,
            offset,
            format!("Need {} bytes, {} remaining", needed, remaining),
        )
    }

    /// Input ended while reading `what`
    pub fn truncated(offset: usize, what: &str) -> Self {
        Self::new(
            CodecErrorCode::UteTruncated,
            offset,
            format!("Input ended while reading {}", what),
        )
    }

    /// Header byte does not carry the expected tag
    pub fn format_mismatch(offset: usize, expected: WireTag, header: u8) -> Self {
        let found = match WireTag::from_header(header) {
            Some(tag) => tag.name().to_string(),
            None => format!("invalid tag {}", header >> crate::wire::TAG_SHIFT),
        };
        Self::new(
            CodecErrorCode::UteFormatMismatch,
            offset,
            format!(
                "Expected {} header, found {} (0x{:02X})",
                expected, found, header
            ),
        )
    }

    /// Struct arity differs from the schema
    pub fn schema_mismatch(offset: usize, expected: usize, found: usize) -> Self {
        Self::new(
            CodecErrorCode::UteSchemaMismatch,
            offset,
            format!("Schema has {} fields, found {}", expected, found),
        )
    }

    /// Varint wider than 64 bits
    pub fn varint_overflow(offset: usize) -> Self {
        Self::new(
            CodecErrorCode::UteVarintOverflow,
            offset,
            "Varint exceeds 64 bits",
        )
    }

    /// String of `len` bytes does not fit `capacity` (terminator included)
    pub fn capacity_exceeded(offset: usize, len: usize, capacity: usize) -> Self {
        Self::new(
            CodecErrorCode::UteCapacityExceeded,
            offset,
            format!(
                "String of {} bytes exceeds capacity {} (terminator included)",
                len, capacity
            ),
        )
    }

    /// Decode target holds fewer list slots than encoded elements
    pub fn target_too_small(offset: usize, count: usize, slots: usize) -> Self {
        Self::new(
            CodecErrorCode::UteTargetTooSmall,
            offset,
            format!("List has {} elements but target has {} slots", count, slots),
        )
    }

    /// Value variant does not match the field kind
    pub fn value_mismatch(offset: usize, expected: &str, found: &str) -> Self {
        Self::new(
            CodecErrorCode::UteValueMismatch,
            offset,
            format!("Expected {} value, found {}", expected, found),
        )
    }

    /// Vacant value where one is required
    pub fn missing_value(offset: usize) -> Self {
        Self::new(
            CodecErrorCode::UteMissingValue,
            offset,
            "Value is vacant",
        )
    }

    /// Encoded length does not fit in usize
    pub fn length_overflow(offset: usize, length: u64) -> Self {
        Self::new(
            CodecErrorCode::UteLengthOverflow,
            offset,
            format!("Length {} does not fit in memory", length),
        )
    }

    /// Prepends a path segment: a field name or an `[index]`
    pub fn within(mut self, segment: &str) -> Self {
        self.path = Some(match self.path.take() {
            None => segment.to_string(),
            Some(rest) if rest.starts_with('[') => format!("{}{}", segment, rest),
            Some(rest) => format!("{}.{}", segment, rest),
        });
        self
    }

    /// Returns the error code
    pub fn code(&self) -> CodecErrorCode {
        self.code
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Byte offset at which the error occurred
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Path of the field being processed
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} (offset {})",
            self.code.code(),
            self.message,
            self.offset
        )?;
        if let Some(ref path) = self.path {
            write!(f, " (at {})", path)?;
        }
        Ok(())
    }
}

impl std::error::Error for CodecError {}

/// Result type for codec operations
pub type CodecResult<T> = Result<T, CodecError>;

/// Path segment for a list element
pub(crate) fn index_segment(index: usize) -> String {
    format!("[{}]", index)
}
