//! Wire primitives for the UTE binary format
//!
//! Every encoded value is one header byte followed by a type-specific body:
//!
//! | Type   | Body                                  |
//! |--------|---------------------------------------|
//! | Null   | none                                  |
//! | Bool   | none (value in header bit 4)          |
//! | Int    | varint(u64)                           |
//! | String | varint(byte length) + raw bytes       |
//! | List   | varint(count) + elements              |
//! | Struct | varint(child count) + children        |

pub mod tag;
pub mod varint;

pub use tag::{WireTag, BOOL_TRUE_BIT, RESERVED_MASK, TAG_SHIFT};
pub use varint::{VarintError, MAX_VARINT_LEN};
