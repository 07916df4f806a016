//! Flat record layout rule
//!
//! Struct children are placed in declaration order with natural alignment,
//! the same way a `#[repr(C)]` struct is laid out:
//!
//! | Kind   | Size                                 | Align            |
//! |--------|--------------------------------------|------------------|
//! | null   | 0                                    | 1                |
//! | bool   | 1                                    | 1                |
//! | int    | 8                                    | 8                |
//! | string | capacity, or the configured slot     | 1                |
//! | struct | nested record size                   | nested alignment |
//! | list   | no inline slot                       | -                |
//!
//! The record size is rounded up to the record's alignment.

use super::types::{Field, FieldKind, Slot};

/// Slot size of an int child
pub const INT_SLOT_BYTES: usize = 8;

/// Default slot size of a string child without declared capacity
pub const DEFAULT_STRING_SLOT_BYTES: usize = 32;

/// Size and alignment of a struct's flat record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StructLayout {
    /// Record size in bytes
    pub size: usize,
    /// Record alignment in bytes
    pub align: usize,
}

impl StructLayout {
    /// Layout of a record too large to address
    pub const OVERSIZED: StructLayout = StructLayout {
        size: usize::MAX,
        align: 1,
    };
}

impl Default for StructLayout {
    fn default() -> Self {
        Self { size: 0, align: 1 }
    }
}

/// Offset assignment rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutRule {
    string_slot_bytes: usize,
}

impl Default for LayoutRule {
    fn default() -> Self {
        Self {
            string_slot_bytes: DEFAULT_STRING_SLOT_BYTES,
        }
    }
}

impl LayoutRule {
    /// Create a rule with a custom default string slot size
    pub fn new(string_slot_bytes: usize) -> Self {
        Self { string_slot_bytes }
    }

    /// Default string slot size
    pub fn string_slot_bytes(&self) -> usize {
        self.string_slot_bytes
    }

    /// Size and alignment of `field` when placed inline, None for lists
    pub fn footprint(&self, field: &Field) -> Option<(usize, usize)> {
        match field.kind() {
            FieldKind::Null => Some((0, 1)),
            FieldKind::Bool => Some((1, 1)),
            FieldKind::Int => Some((INT_SLOT_BYTES, INT_SLOT_BYTES)),
            FieldKind::String => Some((field.capacity().unwrap_or(self.string_slot_bytes), 1)),
            FieldKind::Struct(def) => {
                let layout = def.layout();
                Some((layout.size, layout.align))
            }
            FieldKind::List(_) => None,
        }
    }

    /// Assigns slots to `children` and returns the resulting record layout.
    ///
    /// Returns None when the record size does not fit in `usize`.
    pub fn try_assign(&self, children: &mut [Field]) -> Option<StructLayout> {
        let mut cursor = 0usize;
        let mut align = 1usize;

        for child in children.iter_mut() {
            match self.footprint(child) {
                Some((size, child_align)) => {
                    let offset = align_up(cursor, child_align)?;
                    cursor = offset.checked_add(size)?;
                    child.set_slot(Some(Slot { offset, size }));
                    align = align.max(child_align);
                }
                None => child.set_slot(None),
            }
        }

        Some(StructLayout {
            size: align_up(cursor, align)?,
            align,
        })
    }

    /// Like `try_assign`, but an oversized record gets `StructLayout::OVERSIZED`,
    /// which no region can hold.
    pub fn assign(&self, children: &mut [Field]) -> StructLayout {
        self.try_assign(children).unwrap_or(StructLayout::OVERSIZED)
    }
}

fn align_up(value: usize, align: usize) -> Option<usize> {
    if align <= 1 {
        Some(value)
    } else {
        value.checked_next_multiple_of(align)
    }
}
