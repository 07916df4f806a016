//! ute - A schema-driven tag + varint binary codec
//!
//! Schemas are loaded from YAML (or JSON) documents and describe trees of
//! null, bool, int, string, list and struct fields, optionally across several
//! numbered versions. Values shaped by a schema are encoded to a compact
//! header-byte + varint wire format and decoded back into caller-provided
//! targets.

pub mod codec;
pub mod config;
pub mod observability;
pub mod schema;
pub mod wire;
