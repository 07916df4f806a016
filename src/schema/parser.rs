//! Schema parser: builds a schema tree from a YAML (or JSON) document
//!
//! Document shape:
//!
//! ```yaml
//! versions:
//!   - version: 1
//!     fields:
//!       - name: devices
//!         type: list
//!         elem:
//!           type: struct
//!           fields:
//!             - { name: id, type: int }
//!             - { name: name, type: string, capacity: 32 }
//! ```
//!
//! or a top-level `fields` sequence, which becomes the implicit version 1.
//! Any failure aborts the whole parse.

use std::fs;
use std::io;
use std::path::Path;

use serde_yaml::Value;

use super::errors::{SchemaError, SchemaResult};
use super::layout::LayoutRule;
use super::types::{Field, FieldKind, Schema, SchemaVersion, StructDef, TypeName};
use crate::config::Config;
use crate::observability::{log_event_with_fields, Event};

/// Default maximum nesting depth of a field tree
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Builds `Schema` trees from generic document nodes.
#[derive(Debug, Clone)]
pub struct SchemaParser {
    rule: LayoutRule,
    max_depth: usize,
}

impl Default for SchemaParser {
    fn default() -> Self {
        Self {
            rule: LayoutRule::default(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl SchemaParser {
    /// Creates a parser with default layout rule and depth limit.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a parser using the layout and depth settings from `config`.
    pub fn from_config(config: &Config) -> Self {
        Self {
            rule: LayoutRule::new(config.string_slot_bytes),
            max_depth: config.max_depth,
        }
    }

    /// Overrides the maximum nesting depth.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Layout rule used for struct offsets
    pub fn layout_rule(&self) -> &LayoutRule {
        &self.rule
    }

    /// Reads and parses a schema file.
    pub fn parse_file(&self, path: &Path) -> SchemaResult<Schema> {
        let display = path.display().to_string();
        log_event_with_fields(Event::SchemaLoadBegin, &[("path", display.as_str())]);

        let result = fs::read_to_string(path)
            .map_err(|e| match e.kind() {
                io::ErrorKind::NotFound => SchemaError::file_missing(&display, e),
                _ => SchemaError::unreadable(&display, e),
            })
            .and_then(|content| self.parse_str(&content));

        match &result {
            Ok(schema) => {
                let latest = schema
                    .latest()
                    .map(|v| v.number().to_string())
                    .unwrap_or_default();
                log_event_with_fields(
                    Event::SchemaLoaded,
                    &[
                        ("latest", latest.as_str()),
                        ("path", display.as_str()),
                        ("versions", schema.len().to_string().as_str()),
                    ],
                );
            }
            Err(e) => {
                log_event_with_fields(
                    Event::SchemaLoadFailed,
                    &[
                        ("code", e.code().code()),
                        ("path", display.as_str()),
                        ("reason", e.message()),
                    ],
                );
            }
        }

        result
    }

    /// Parses schema document text.
    pub fn parse_str(&self, content: &str) -> SchemaResult<Schema> {
        let root: Value = serde_yaml::from_str(content)
            .map_err(|e| SchemaError::malformed("<document>", format!("Invalid document: {}", e)))?;
        self.parse_document(&root)
    }

    /// Parses an already loaded document tree.
    pub fn parse_document(&self, root: &Value) -> SchemaResult<Schema> {
        if !root.is_mapping() {
            return Err(SchemaError::malformed(
                "<root>",
                "Document root must be a mapping",
            ));
        }

        match root.get("versions") {
            Some(Value::Sequence(entries)) if !entries.is_empty() => {
                let mut versions = Vec::with_capacity(entries.len());
                for (i, entry) in entries.iter().enumerate() {
                    versions.push(self.parse_version(entry, &format!("versions[{}]", i))?);
                }
                Schema::new(versions)
            }
            // An empty list falls back to top-level fields
            Some(Value::Sequence(_)) => self.parse_implicit(root),
            Some(_) => Err(SchemaError::invalid_version(
                "versions",
                "'versions' must be a sequence",
            )),
            None => self.parse_implicit(root),
        }
    }

    /// Parses a single field entry.
    pub fn parse_field(&self, node: &Value) -> SchemaResult<Field> {
        self.parse_field_at(node, "<field>", 1)
    }

    fn parse_implicit(&self, root: &Value) -> SchemaResult<Schema> {
        let fields = self.parse_fields(root.get("fields"), "fields", 1)?;
        Ok(Schema::single(fields))
    }

    fn parse_version(&self, entry: &Value, path: &str) -> SchemaResult<SchemaVersion> {
        if !entry.is_mapping() {
            return Err(SchemaError::invalid_version(
                path,
                "Version entry must be a mapping",
            ));
        }

        let number = entry
            .get("version")
            .and_then(Value::as_u64)
            .ok_or_else(|| {
                SchemaError::invalid_version(
                    format!("{}.version", path),
                    "'version' must be a positive integer",
                )
            })?;
        let number = u32::try_from(number).map_err(|_| {
            SchemaError::invalid_version(
                format!("{}.version", path),
                format!("version {} is out of range", number),
            )
        })?;

        let fields = self.parse_fields(entry.get("fields"), &format!("{}.fields", path), 1)?;
        Ok(SchemaVersion::new(number, fields))
    }

    fn parse_fields(
        &self,
        node: Option<&Value>,
        path: &str,
        depth: usize,
    ) -> SchemaResult<Vec<Field>> {
        let entries = match node {
            Some(Value::Sequence(entries)) => entries,
            Some(_) => {
                return Err(SchemaError::invalid_fields(
                    path,
                    "'fields' must be a sequence",
                ))
            }
            None => return Err(SchemaError::invalid_fields(path, "'fields' is missing")),
        };

        entries
            .iter()
            .enumerate()
            .map(|(i, entry)| self.parse_field_at(entry, &format!("{}[{}]", path, i), depth))
            .collect()
    }

    fn parse_field_at(&self, node: &Value, path: &str, depth: usize) -> SchemaResult<Field> {
        if depth > self.max_depth {
            return Err(SchemaError::too_deep(path, self.max_depth));
        }
        if !node.is_mapping() {
            return Err(SchemaError::malformed(path, "Field entry must be a mapping"));
        }

        let name = match node.get("name") {
            None => None,
            Some(Value::String(name)) => Some(name.clone()),
            Some(_) => return Err(SchemaError::malformed(path, "'name' must be a string")),
        };

        let type_str = match node.get("type") {
            Some(Value::String(type_str)) => type_str.as_str(),
            // An unquoted `type: null` loads as a YAML null
            Some(Value::Null) => "null",
            _ => return Err(SchemaError::missing_type(path)),
        };
        let type_name = FieldKind::from_type_name(type_str)
            .ok_or_else(|| SchemaError::unknown_type(path, type_str))?;

        let kind = match type_name {
            TypeName::Null => FieldKind::Null,
            TypeName::Bool => FieldKind::Bool,
            TypeName::Int => FieldKind::Int,
            TypeName::String => FieldKind::String,
            TypeName::List => {
                let elem_path = format!("{}.elem", path);
                let elem = node
                    .get("elem")
                    .ok_or_else(|| SchemaError::missing_elem(path))?;
                FieldKind::list(self.parse_field_at(elem, &elem_path, depth + 1)?)
            }
            TypeName::Struct => {
                let children =
                    self.parse_fields(node.get("fields"), &format!("{}.fields", path), depth + 1)?;
                let def = StructDef::try_with_rule(children, &self.rule).ok_or_else(|| {
                    SchemaError::malformed(path, "Struct record size exceeds addressable memory")
                })?;
                FieldKind::Struct(def)
            }
        };

        let mut field = Field::new(name, kind);

        if let Some(capacity) = node.get("capacity") {
            if type_name != TypeName::String {
                return Err(SchemaError::malformed(
                    path,
                    "'capacity' is only valid for string fields",
                ));
            }
            let capacity = capacity
                .as_u64()
                .and_then(|c| usize::try_from(c).ok())
                .filter(|c| *c > 0)
                .ok_or_else(|| {
                    SchemaError::malformed(path, "'capacity' must be a positive integer")
                })?;
            field = field.with_capacity(capacity);
        }

        Ok(field)
    }
}
