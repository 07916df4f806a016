//! Schema subsystem for ute
//!
//! Schemas describe the tree of values a document carries: scalars, lists
//! with a single element shape, and structs with ordered named children.
//!
//! # Design Principles
//!
//! - Built once by the parser, read-only afterwards
//! - Single-owner tree: dropping (or releasing) a schema frees everything
//! - Versions are positive and strictly ascending
//! - Struct children carry flat record offsets computed at build time

mod errors;
mod layout;
mod parser;
mod types;

pub use errors::{SchemaError, SchemaErrorCode, SchemaResult};
pub use layout::{LayoutRule, StructLayout, DEFAULT_STRING_SLOT_BYTES, INT_SLOT_BYTES};
pub use parser::{SchemaParser, DEFAULT_MAX_DEPTH};
pub use types::{Field, FieldKind, Schema, SchemaVersion, Slot, StructDef, TypeName};
