//! Schema-driven encoder
//!
//! Walks a field and a value together and emits the wire format:
//!
//! | Kind   | Header        | Body                           |
//! |--------|---------------|--------------------------------|
//! | null   | 0x00          | -                              |
//! | bool   | 0x20 / 0x30   | -                              |
//! | int    | 0x40          | varint(value)                  |
//! | string | 0x60          | varint(len) + bytes            |
//! | list   | 0x80          | varint(count) + elements       |
//! | struct | 0xA0          | varint(child count) + children |
//!
//! Remaining capacity is checked before every emission. On failure the bytes
//! already written stay in the buffer and the caller discards the attempt.

use std::sync::Arc;

use super::errors::{index_segment, CodecError, CodecResult};
use super::value::Value;
use crate::observability::{log_event_with_fields, CodecMetrics, Event};
use crate::schema::{Field, FieldKind, SchemaVersion};
use crate::wire::{varint, WireTag, BOOL_TRUE_BIT, MAX_VARINT_LEN};

/// Output cursor. Without a buffer it only counts bytes.
struct Sink<'a> {
    buf: Option<&'a mut [u8]>,
    pos: usize,
}

impl<'a> Sink<'a> {
    fn new(buf: &'a mut [u8]) -> Self {
        Self {
            buf: Some(buf),
            pos: 0,
        }
    }

    fn counting() -> Self {
        Self { buf: None, pos: 0 }
    }

    fn ensure(&self, needed: usize) -> CodecResult<()> {
        if let Some(buf) = &self.buf {
            let remaining = buf.len() - self.pos;
            if needed > remaining {
                return Err(CodecError::buffer_too_small(self.pos, needed, remaining));
            }
        }
        Ok(())
    }

    fn put_bytes(&mut self, bytes: &[u8]) -> CodecResult<()> {
        self.ensure(bytes.len())?;
        if let Some(buf) = self.buf.as_deref_mut() {
            buf[self.pos..self.pos + bytes.len()].copy_from_slice(bytes);
        }
        self.pos += bytes.len();
        Ok(())
    }

    fn put_u8(&mut self, byte: u8) -> CodecResult<()> {
        self.put_bytes(&[byte])
    }

    fn put_varint(&mut self, value: u64) -> CodecResult<()> {
        let mut scratch = [0u8; MAX_VARINT_LEN];
        let len = varint::encode(value, &mut scratch);
        self.put_bytes(&scratch[..len])
    }
}

/// Encoder for schema-shaped values
#[derive(Debug, Clone, Default)]
pub struct Encoder {
    metrics: Option<Arc<CodecMetrics>>,
}

impl Encoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records successes and failures in `metrics`
    pub fn with_metrics(mut self, metrics: Arc<CodecMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Encodes `value` as `field` into `out`, returning bytes written
    pub fn write(&self, field: &Field, value: &Value, out: &mut [u8]) -> CodecResult<usize> {
        let mut sink = Sink::new(out);
        let result = write_field(field, value, &mut sink)
            .map_err(|e| e.within(field.label()))
            .map(|()| sink.pos);
        self.finish(result)
    }

    /// Exact number of bytes `write` would produce
    pub fn encoded_len(&self, field: &Field, value: &Value) -> CodecResult<usize> {
        let mut sink = Sink::counting();
        write_field(field, value, &mut sink).map_err(|e| e.within(field.label()))?;
        Ok(sink.pos)
    }

    /// Encodes into a freshly allocated buffer of the exact size
    pub fn encode_to_vec(&self, field: &Field, value: &Value) -> CodecResult<Vec<u8>> {
        let len = self.encoded_len(field, value)?;
        let mut out = vec![0u8; len];
        self.write(field, value, &mut out)?;
        Ok(out)
    }

    /// Encodes every top-level field of `version` in order.
    ///
    /// `values` holds one value per field.
    pub fn write_version(
        &self,
        version: &SchemaVersion,
        values: &[Value],
        out: &mut [u8],
    ) -> CodecResult<usize> {
        let fields = version.fields();
        if values.len() != fields.len() {
            return self.finish(Err(CodecError::schema_mismatch(
                0,
                fields.len(),
                values.len(),
            )));
        }

        let mut sink = Sink::new(out);
        let mut result = Ok(());
        for (field, value) in fields.iter().zip(values) {
            result = write_field(field, value, &mut sink).map_err(|e| e.within(field.label()));
            if result.is_err() {
                break;
            }
        }
        self.finish(result.map(|()| sink.pos))
    }

    fn finish(&self, result: CodecResult<usize>) -> CodecResult<usize> {
        match &result {
            Ok(written) => {
                if let Some(metrics) = &self.metrics {
                    metrics.record_encode(*written);
                }
            }
            Err(e) => {
                if let Some(metrics) = &self.metrics {
                    metrics.record_encode_failure();
                }
                log_event_with_fields(
                    Event::EncodeFailed,
                    &[
                        ("code", e.code().code()),
                        ("offset", e.offset().to_string().as_str()),
                        ("path", e.path().unwrap_or("")),
                    ],
                );
            }
        }
        result
    }
}

fn write_field(field: &Field, value: &Value, sink: &mut Sink<'_>) -> CodecResult<()> {
    let header = WireTag::for_kind(field.kind()).header();

    match (field.kind(), value) {
        (_, Value::Vacant) => Err(CodecError::missing_value(sink.pos)),

        (FieldKind::Null, Value::Null) => sink.put_u8(header),

        (FieldKind::Bool, Value::Bool(b)) => {
            let header = if *b { header | BOOL_TRUE_BIT } else { header };
            sink.put_u8(header)
        }

        (FieldKind::Int, Value::Int(n)) => {
            sink.put_u8(header)?;
            sink.put_varint(*n)
        }

        (FieldKind::String, Value::String(bytes)) => {
            if let Some(capacity) = field.capacity() {
                if bytes.len() + 1 > capacity {
                    return Err(CodecError::capacity_exceeded(sink.pos, bytes.len(), capacity));
                }
            }
            sink.put_u8(header)?;
            sink.put_varint(bytes.len() as u64)?;
            sink.put_bytes(bytes)
        }

        (FieldKind::List(element), Value::List(items)) => {
            sink.put_u8(header)?;
            sink.put_varint(items.len() as u64)?;
            for (i, item) in items.iter().enumerate() {
                write_field(element, item, sink).map_err(|e| e.within(&index_segment(i)))?;
            }
            Ok(())
        }

        (FieldKind::Struct(def), Value::Struct(members)) => {
            if members.len() != def.len() {
                return Err(CodecError::schema_mismatch(sink.pos, def.len(), members.len()));
            }
            sink.put_u8(header)?;
            sink.put_varint(def.len() as u64)?;
            for (child, member) in def.children().iter().zip(members) {
                write_field(child, member, sink).map_err(|e| e.within(child.label()))?;
            }
            Ok(())
        }

        (kind, value) => Err(CodecError::value_mismatch(
            sink.pos,
            kind.type_name(),
            value.kind_name(),
        )),
    }
}
