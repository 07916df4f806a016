//! Header byte type discriminants
//!
//! Every encoded value starts with one header byte:
//!
//! ```text
//!   7   6   5   4   3   2   1   0
//! +-----------+-------------------+
//! |    tag    |     reserved      |
//! +-----------+-------------------+
//! ```
//!
//! Reserved bits are written as zero, except bit 4 of a Bool header which
//! carries the boolean value. Decoders ignore reserved bits.

use std::fmt;

use crate::schema::FieldKind;

/// Bit position of the tag within the header byte
pub const TAG_SHIFT: u8 = 5;

/// Payload bit of a Bool header (set for `true`)
pub const BOOL_TRUE_BIT: u8 = 0x10;

/// Mask covering the reserved low bits
pub const RESERVED_MASK: u8 = 0x1F;

/// Wire type discriminant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum WireTag {
    /// Null value, no body
    Null = 0,
    /// Boolean, value carried in the header
    Bool = 1,
    /// Unsigned integer, varint body
    Int = 2,
    /// Byte string, varint length + raw bytes
    String = 3,
    /// List, varint count + elements
    List = 4,
    /// Struct, varint child count + children
    Struct = 5,
}

impl WireTag {
    /// Convert from the 3-bit discriminant, returns None for 6 and 7
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(WireTag::Null),
            1 => Some(WireTag::Bool),
            2 => Some(WireTag::Int),
            3 => Some(WireTag::String),
            4 => Some(WireTag::List),
            5 => Some(WireTag::Struct),
            _ => None,
        }
    }

    /// Convert to the 3-bit discriminant
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Header byte with all reserved bits clear
    pub fn header(self) -> u8 {
        self.as_u8() << TAG_SHIFT
    }

    /// Extracts the tag from a header byte
    pub fn from_header(header: u8) -> Option<Self> {
        Self::from_u8(header >> TAG_SHIFT)
    }

    /// Tag written for a field of the given kind
    pub fn for_kind(kind: &FieldKind) -> Self {
        match kind {
            FieldKind::Null => WireTag::Null,
            FieldKind::Bool => WireTag::Bool,
            FieldKind::Int => WireTag::Int,
            FieldKind::String => WireTag::String,
            FieldKind::List(_) => WireTag::List,
            FieldKind::Struct(_) => WireTag::Struct,
        }
    }

    /// Lowercase name used in error messages
    pub fn name(self) -> &'static str {
        match self {
            WireTag::Null => "null",
            WireTag::Bool => "bool",
            WireTag::Int => "int",
            WireTag::String => "string",
            WireTag::List => "list",
            WireTag::Struct => "struct",
        }
    }
}

impl fmt::Display for WireTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_values() {
        assert_eq!(WireTag::Null.header(), 0x00);
        assert_eq!(WireTag::Bool.header(), 0x20);
        assert_eq!(WireTag::Int.header(), 0x40);
        assert_eq!(WireTag::String.header(), 0x60);
        assert_eq!(WireTag::List.header(), 0x80);
        assert_eq!(WireTag::Struct.header(), 0xA0);
    }

    #[test]
    fn test_reserved_bits_ignored() {
        assert_eq!(WireTag::from_header(0x40 | RESERVED_MASK), Some(WireTag::Int));
        assert_eq!(WireTag::from_header(0x20 | BOOL_TRUE_BIT), Some(WireTag::Bool));
    }

    #[test]
    fn test_invalid_discriminants() {
        assert_eq!(WireTag::from_header(0xC0), None);
        assert_eq!(WireTag::from_header(0xE0), None);
        assert_eq!(WireTag::from_u8(6), None);
    }

    #[test]
    fn test_for_kind() {
        assert_eq!(WireTag::for_kind(&FieldKind::Int), WireTag::Int);
        assert_eq!(WireTag::for_kind(&FieldKind::structure(vec![])), WireTag::Struct);
        assert_eq!(WireTag::for_kind(&FieldKind::Bool).header(), 0x20);
    }

    #[test]
    fn test_u8_roundtrip() {
        for raw in 0..6u8 {
            let tag = WireTag::from_u8(raw).unwrap();
            assert_eq!(tag.as_u8(), raw);
        }
    }
}
