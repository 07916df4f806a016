//! Schema tree definitions
//!
//! Supported field kinds:
//! - null: no value
//! - bool: true / false
//! - int: 64-bit unsigned integer
//! - string: byte string (optionally capacity-bounded)
//! - list: homogeneous sequence with a single element field
//! - struct: ordered named children
//!
//! A schema is an ordered set of versions, each holding ordered top-level
//! fields. The tree is built once and is read-only afterwards; every parent
//! exclusively owns its children.

use std::fmt;

use super::errors::{SchemaError, SchemaResult};
use super::layout::{LayoutRule, StructLayout};

/// Inline slot of a struct child within its parent's flat record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    /// Byte offset from the start of the parent record
    pub offset: usize,
    /// Slot size in bytes
    pub size: usize,
}

/// Closed set of field kinds
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    /// Null value
    Null,
    /// Boolean
    Bool,
    /// 64-bit unsigned integer
    Int,
    /// Byte string
    String,
    /// Homogeneous list (element boxed to allow recursion)
    List(Box<Field>),
    /// Struct with ordered children
    Struct(StructDef),
}

impl FieldKind {
    /// Creates a list kind with the given element field
    pub fn list(element: Field) -> Self {
        FieldKind::List(Box::new(element))
    }

    /// Creates a struct kind laid out with the default rule
    pub fn structure(children: Vec<Field>) -> Self {
        FieldKind::Struct(StructDef::new(children))
    }

    /// Creates a struct kind laid out with an explicit rule
    pub fn structure_with(children: Vec<Field>, rule: &LayoutRule) -> Self {
        FieldKind::Struct(StructDef::with_rule(children, rule))
    }

    /// Parses a schema document type name
    pub fn from_type_name(name: &str) -> Option<TypeName> {
        match name {
            "null" => Some(TypeName::Null),
            "bool" => Some(TypeName::Bool),
            "int" => Some(TypeName::Int),
            "string" => Some(TypeName::String),
            "list" => Some(TypeName::List),
            "struct" => Some(TypeName::Struct),
            _ => None,
        }
    }

    /// Returns the type name for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldKind::Null => "null",
            FieldKind::Bool => "bool",
            FieldKind::Int => "int",
            FieldKind::String => "string",
            FieldKind::List(_) => "list",
            FieldKind::Struct(_) => "struct",
        }
    }
}

/// Type names accepted in schema documents, before children are resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeName {
    Null,
    Bool,
    Int,
    String,
    List,
    Struct,
}

/// Struct children together with their computed flat layout
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructDef {
    children: Vec<Field>,
    layout: StructLayout,
}

impl StructDef {
    /// Builds a struct definition using the default layout rule
    pub fn new(children: Vec<Field>) -> Self {
        Self::with_rule(children, &LayoutRule::default())
    }

    /// Builds a struct definition, assigning child slots with `rule`
    pub fn with_rule(mut children: Vec<Field>, rule: &LayoutRule) -> Self {
        let layout = rule.assign(&mut children);
        Self { children, layout }
    }

    /// Builds a struct definition, or None when its record size overflows
    pub fn try_with_rule(mut children: Vec<Field>, rule: &LayoutRule) -> Option<Self> {
        let layout = rule.try_assign(&mut children)?;
        Some(Self { children, layout })
    }

    /// Children in declaration (and wire) order
    pub fn children(&self) -> &[Field] {
        &self.children
    }

    /// Number of children
    pub fn len(&self) -> usize {
        self.children.len()
    }

    /// True for a struct without children
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Flat record layout
    pub fn layout(&self) -> StructLayout {
        self.layout
    }

    /// Position of the child named `name`
    pub fn position(&self, name: &str) -> Option<usize> {
        self.children.iter().position(|c| c.name() == Some(name))
    }

    /// Child named `name`
    pub fn child(&self, name: &str) -> Option<&Field> {
        self.position(name).map(|i| &self.children[i])
    }
}

/// One position in the schema tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    name: Option<String>,
    kind: FieldKind,
    slot: Option<Slot>,
    capacity: Option<usize>,
}

impl Field {
    /// Create a field with an optional name
    pub fn new(name: Option<String>, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            slot: None,
            capacity: None,
        }
    }

    /// Create a named field (struct member or top-level field)
    pub fn named(name: impl Into<String>, kind: FieldKind) -> Self {
        Self::new(Some(name.into()), kind)
    }

    /// Create an anonymous field (list element)
    pub fn anonymous(kind: FieldKind) -> Self {
        Self::new(None, kind)
    }

    /// Create a named int field
    pub fn int(name: impl Into<String>) -> Self {
        Self::named(name, FieldKind::Int)
    }

    /// Create a named string field
    pub fn string(name: impl Into<String>) -> Self {
        Self::named(name, FieldKind::String)
    }

    /// Create a named bool field
    pub fn bool(name: impl Into<String>) -> Self {
        Self::named(name, FieldKind::Bool)
    }

    /// Create a named list field
    pub fn list(name: impl Into<String>, element: Field) -> Self {
        Self::named(name, FieldKind::list(element))
    }

    /// Create a named struct field with the default layout rule
    pub fn structure(name: impl Into<String>, children: Vec<Field>) -> Self {
        Self::named(name, FieldKind::structure(children))
    }

    /// Declares a maximum string size in bytes, terminator included.
    ///
    /// Must be set before the field is placed in a struct, since it sizes
    /// the parent's slot.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = Some(capacity);
        self
    }

    /// Field name, absent for list elements
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Field kind
    pub fn kind(&self) -> &FieldKind {
        &self.kind
    }

    /// Byte offset within the parent struct's record
    pub fn offset(&self) -> Option<usize> {
        self.slot.map(|s| s.offset)
    }

    /// Inline slot within the parent struct's record
    pub fn slot(&self) -> Option<Slot> {
        self.slot
    }

    /// Declared string capacity
    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    /// List element, None unless this is a list
    pub fn element(&self) -> Option<&Field> {
        match &self.kind {
            FieldKind::List(element) => Some(element),
            _ => None,
        }
    }

    /// Struct definition, None unless this is a struct
    pub fn struct_def(&self) -> Option<&StructDef> {
        match &self.kind {
            FieldKind::Struct(def) => Some(def),
            _ => None,
        }
    }

    /// Struct children, empty unless this is a struct
    pub fn children(&self) -> &[Field] {
        match &self.kind {
            FieldKind::Struct(def) => def.children(),
            _ => &[],
        }
    }

    /// Size of this struct's flat record
    pub fn record_size(&self) -> Option<usize> {
        self.struct_def().map(|def| def.layout().size)
    }

    /// Depth of the subtree rooted here (a scalar has depth 1)
    pub fn depth(&self) -> usize {
        match &self.kind {
            FieldKind::List(element) => 1 + element.depth(),
            FieldKind::Struct(def) => {
                1 + def.children().iter().map(Field::depth).max().unwrap_or(0)
            }
            _ => 1,
        }
    }

    /// Label used in error paths: the name, or `<elem>` for anonymous fields
    pub fn label(&self) -> &str {
        self.name().unwrap_or("<elem>")
    }

    pub(crate) fn set_slot(&mut self, slot: Option<Slot>) {
        self.slot = slot;
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            FieldKind::List(element) => write!(f, "{}: list<{}>", self.label(), element),
            FieldKind::Struct(def) => {
                write!(f, "{}: struct {{", self.label())?;
                for (i, child) in def.children().iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", child)?;
                }
                write!(f, "}}")
            }
            kind => write!(f, "{}: {}", self.label(), kind.type_name()),
        }
    }
}

/// One schema version: a number and its top-level fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaVersion {
    number: u32,
    fields: Vec<Field>,
}

impl SchemaVersion {
    /// Create a new schema version
    pub fn new(number: u32, fields: Vec<Field>) -> Self {
        Self { number, fields }
    }

    /// Version number
    pub fn number(&self) -> u32 {
        self.number
    }

    /// Top-level fields in declaration order
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Top-level field named `name`
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name() == Some(name))
    }
}

/// Multi-version schema
///
/// Version numbers are positive and strictly ascending in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Schema {
    versions: Vec<SchemaVersion>,
}

impl Schema {
    /// Create a schema, enforcing the version numbering policy
    pub fn new(versions: Vec<SchemaVersion>) -> SchemaResult<Self> {
        let mut previous: Option<u32> = None;
        for (i, version) in versions.iter().enumerate() {
            let path = format!("versions[{}]", i);
            if version.number() == 0 {
                return Err(SchemaError::invalid_version(path, "version must be positive"));
            }
            if let Some(prev) = previous {
                if version.number() <= prev {
                    return Err(SchemaError::invalid_version(
                        path,
                        format!(
                            "version {} does not follow version {} (must be strictly ascending)",
                            version.number(),
                            prev
                        ),
                    ));
                }
            }
            previous = Some(version.number());
        }
        Ok(Self { versions })
    }

    /// Create a single implicit version 1 schema from top-level fields
    pub fn single(fields: Vec<Field>) -> Self {
        Self {
            versions: vec![SchemaVersion::new(1, fields)],
        }
    }

    /// All versions in ascending order
    pub fn versions(&self) -> &[SchemaVersion] {
        &self.versions
    }

    /// Looks up a version by number
    pub fn version(&self, number: u32) -> Option<&SchemaVersion> {
        self.versions.iter().find(|v| v.number() == number)
    }

    /// Highest version
    pub fn latest(&self) -> Option<&SchemaVersion> {
        self.versions.last()
    }

    /// Number of versions
    pub fn len(&self) -> usize {
        self.versions.len()
    }

    /// True when no versions are held (including after release)
    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }

    /// Releases the whole tree.
    ///
    /// Every version, field, element and child is dropped. Calling this on an
    /// already released schema is a no-op.
    pub fn release(&mut self) {
        if self.versions.is_empty() {
            return;
        }
        let released = self.versions.len();
        self.versions = Vec::new();
        crate::observability::log_event_with_fields(
            crate::observability::Event::SchemaReleased,
            &[("versions", released.to_string().as_str())],
        );
    }

    /// True once `release` has run (or for a schema built empty)
    pub fn is_released(&self) -> bool {
        self.versions.is_empty()
    }
}
