//! Structural value model
//!
//! A `Value` mirrors the shape of a schema field. Struct members are
//! positional, in the schema's child order. `Vacant` marks an empty slot in a
//! decode target; the encoder rejects it.

use crate::schema::{Field, FieldKind};

/// A value shaped by a schema field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(u64),
    /// Raw bytes, no terminator
    String(Vec<u8>),
    List(Vec<Value>),
    /// Members in schema child order
    Struct(Vec<Value>),
    /// Empty placeholder slot
    Vacant,
}

impl Value {
    /// Creates a string value from bytes or text
    pub fn string(bytes: impl AsRef<[u8]>) -> Self {
        Value::String(bytes.as_ref().to_vec())
    }

    /// Creates an empty value shaped like `field`.
    ///
    /// Scalars get their zero value, lists start empty and structs get one
    /// skeleton member per child.
    pub fn skeleton(field: &Field) -> Self {
        match field.kind() {
            FieldKind::Null => Value::Null,
            FieldKind::Bool => Value::Bool(false),
            FieldKind::Int => Value::Int(0),
            FieldKind::String => Value::String(Vec::new()),
            FieldKind::List(_) => Value::List(Vec::new()),
            FieldKind::Struct(def) => {
                Value::Struct(def.children().iter().map(Value::skeleton).collect())
            }
        }
    }

    /// Variant name for error messages
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::String(_) => "string",
            Value::List(_) => "list",
            Value::Struct(_) => "struct",
            Value::Vacant => "vacant",
        }
    }

    pub fn is_vacant(&self) -> bool {
        matches!(self, Value::Vacant)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<u64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::String(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// String contents, None if not a string or not valid UTF-8
    pub fn as_str(&self) -> Option<&str> {
        self.as_bytes().and_then(|b| std::str::from_utf8(b).ok())
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_list_mut(&mut self) -> Option<&mut Vec<Value>> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_struct(&self) -> Option<&[Value]> {
        match self {
            Value::Struct(members) => Some(members),
            _ => None,
        }
    }

    pub fn as_struct_mut(&mut self) -> Option<&mut [Value]> {
        match self {
            Value::Struct(members) => Some(members),
            _ => None,
        }
    }

    /// Struct member for the child of `field` named `name`
    pub fn field(&self, field: &Field, name: &str) -> Option<&Value> {
        let position = field.struct_def()?.position(name)?;
        self.as_struct()?.get(position)
    }

    /// Mutable struct member for the child of `field` named `name`
    pub fn field_mut(&mut self, field: &Field, name: &str) -> Option<&mut Value> {
        let position = field.struct_def()?.position(name)?;
        self.as_struct_mut()?.get_mut(position)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Value::Int(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::string(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s.into_bytes())
    }
}

impl From<Vec<u8>> for Value {
    fn from(bytes: Vec<u8>) -> Self {
        Value::String(bytes)
    }
}
