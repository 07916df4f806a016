//! Flat record binding
//!
//! Maps struct records stored in caller-owned byte regions to `Value`s using
//! the slot offsets computed by the schema layout rule:
//!
//! - int: 8 bytes, little-endian
//! - bool: 1 byte, non-zero is true
//! - string: NUL-terminated bytes within the slot
//! - null: zero-sized
//! - struct: nested record, inline
//! - list: no inline slot, not supported here

use std::sync::Arc;

use thiserror::Error;

use super::errors::CodecError;
use super::reader::Decoder;
use super::value::Value;
use super::writer::Encoder;
use crate::observability::CodecMetrics;
use crate::schema::{Field, FieldKind};
use crate::wire::WireTag;

/// Record layout violations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    #[error("region of {available} bytes is smaller than the {required}-byte record")]
    RegionTooSmall { required: usize, available: usize },

    #[error("string slot at offset {offset} has no terminator")]
    Unterminated { offset: usize },

    #[error("string of {len} bytes does not fit a {slot}-byte slot")]
    CapacityExceeded { len: usize, slot: usize },

    #[error("field '{0}' has no flat representation")]
    Unsupported(String),

    #[error("flat records must be structs")]
    NotAStruct,

    #[error("expected {expected} value, found {found}")]
    ValueMismatch {
        expected: &'static str,
        found: &'static str,
    },
}

/// Errors from flat record codecs
#[derive(Debug, Error)]
pub enum FlatError {
    #[error(transparent)]
    Layout(#[from] LayoutError),

    #[error(transparent)]
    Codec(#[from] CodecError),
}

pub type LayoutResult<T> = Result<T, LayoutError>;
pub type FlatResult<T> = Result<T, FlatError>;

/// Number of records decoded and bytes consumed by `FlatCodec::read_records`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordsRead {
    pub count: usize,
    pub consumed: usize,
}

fn check_region(field: &Field, region_len: usize) -> LayoutResult<()> {
    let required = field.record_size().ok_or(LayoutError::NotAStruct)?;
    if region_len < required {
        return Err(LayoutError::RegionTooSmall {
            required,
            available: region_len,
        });
    }
    Ok(())
}

/// Reads the struct record of `field` from `region`
pub fn load(field: &Field, region: &[u8]) -> LayoutResult<Value> {
    check_region(field, region.len())?;

    let mut members = Vec::with_capacity(field.children().len());
    for child in field.children() {
        let slot = child
            .slot()
            .ok_or_else(|| LayoutError::Unsupported(child.label().to_string()))?;
        let bytes = &region[slot.offset..slot.offset + slot.size];

        let member = match child.kind() {
            FieldKind::Null => Value::Null,
            FieldKind::Bool => Value::Bool(bytes[0] != 0),
            FieldKind::Int => {
                let mut raw = [0u8; 8];
                raw.copy_from_slice(&bytes[..8]);
                Value::Int(u64::from_le_bytes(raw))
            }
            FieldKind::String => {
                let end = bytes
                    .iter()
                    .position(|&b| b == 0)
                    .ok_or(LayoutError::Unterminated {
                        offset: slot.offset,
                    })?;
                Value::string(&bytes[..end])
            }
            FieldKind::Struct(_) => load(child, bytes)?,
            FieldKind::List(_) => return Err(LayoutError::Unsupported(child.label().to_string())),
        };
        members.push(member);
    }

    Ok(Value::Struct(members))
}

/// Writes `value` into the struct record of `field` in `region`.
///
/// String slots are NUL-filled past the string.
pub fn store(field: &Field, value: &Value, region: &mut [u8]) -> LayoutResult<()> {
    check_region(field, region.len())?;

    let members = match value {
        Value::Struct(members) if members.len() == field.children().len() => members,
        other => {
            return Err(LayoutError::ValueMismatch {
                expected: "struct",
                found: other.kind_name(),
            })
        }
    };

    for (child, member) in field.children().iter().zip(members) {
        let slot = child
            .slot()
            .ok_or_else(|| LayoutError::Unsupported(child.label().to_string()))?;
        let bytes = &mut region[slot.offset..slot.offset + slot.size];

        match (child.kind(), member) {
            (FieldKind::Null, Value::Null) => {}
            (FieldKind::Bool, Value::Bool(b)) => bytes[0] = u8::from(*b),
            (FieldKind::Int, Value::Int(n)) => bytes[..8].copy_from_slice(&n.to_le_bytes()),
            (FieldKind::String, Value::String(s)) => {
                if s.len() + 1 > slot.size {
                    return Err(LayoutError::CapacityExceeded {
                        len: s.len(),
                        slot: slot.size,
                    });
                }
                bytes[..s.len()].copy_from_slice(s);
                bytes[s.len()..].fill(0);
            }
            (FieldKind::Struct(_), member) => store(child, member, bytes)?,
            (FieldKind::List(_), _) => {
                return Err(LayoutError::Unsupported(child.label().to_string()))
            }
            (kind, member) => {
                return Err(LayoutError::ValueMismatch {
                    expected: WireTag::for_kind(kind).name(),
                    found: member.kind_name(),
                })
            }
        }
    }

    Ok(())
}

/// Wire codec over flat records
#[derive(Debug, Clone, Default)]
pub struct FlatCodec {
    encoder: Encoder,
    decoder: Decoder,
}

impl FlatCodec {
    /// Codec whose decoder never grows list targets
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_metrics(metrics: Arc<CodecMetrics>) -> Self {
        Self {
            encoder: Encoder::new().with_metrics(Arc::clone(&metrics)),
            decoder: Decoder::new().with_metrics(metrics),
        }
    }

    /// Encodes the record in `region` as `field`
    pub fn write_record(&self, field: &Field, region: &[u8], out: &mut [u8]) -> FlatResult<usize> {
        let value = load(field, region)?;
        Ok(self.encoder.write(field, &value, out)?)
    }

    /// Decodes one `field` record from `input` into `region`
    pub fn read_record(&self, field: &Field, input: &[u8], region: &mut [u8]) -> FlatResult<usize> {
        check_region(field, region.len())?;
        let mut value = Value::skeleton(field);
        let consumed = self.decoder.read(field, input, &mut value)?;
        store(field, &value, region)?;
        Ok(consumed)
    }

    /// Encodes `records` as the list `list_field`
    pub fn write_records(
        &self,
        list_field: &Field,
        records: &[&[u8]],
        out: &mut [u8],
    ) -> FlatResult<usize> {
        let element = record_element(list_field)?;
        let items = records
            .iter()
            .map(|region| load(element, region))
            .collect::<LayoutResult<Vec<_>>>()?;
        Ok(self.encoder.write(list_field, &Value::List(items), out)?)
    }

    /// Decodes the list `list_field` into `slots`.
    ///
    /// `None` slots are placeholders: their encoded element is consumed but
    /// not stored. Fails with `UteTargetTooSmall` when the encoded count
    /// exceeds `slots.len()`.
    pub fn read_records(
        &self,
        list_field: &Field,
        input: &[u8],
        slots: &mut [Option<&mut [u8]>],
    ) -> FlatResult<RecordsRead> {
        let element = record_element(list_field)?;
        for region in slots.iter().flatten() {
            check_region(element, region.len())?;
        }

        let mut target = Value::List(
            slots
                .iter()
                .map(|slot| match slot {
                    Some(_) => Value::skeleton(element),
                    None => Value::Vacant,
                })
                .collect(),
        );
        let consumed = self.decoder.read(list_field, input, &mut target)?;

        let items = target.as_list().unwrap_or(&[]);
        for (item, slot) in items.iter().zip(slots.iter_mut()) {
            if let Some(region) = slot.as_deref_mut() {
                store(element, item, region)?;
            }
        }

        Ok(RecordsRead {
            count: items.len(),
            consumed,
        })
    }
}

fn record_element(list_field: &Field) -> LayoutResult<&Field> {
    let element = list_field
        .element()
        .ok_or_else(|| LayoutError::Unsupported(list_field.label().to_string()))?;
    if element.struct_def().is_none() {
        return Err(LayoutError::NotAStruct);
    }
    Ok(element)
}
