//! Schema-driven decoder
//!
//! Reads values back into caller-provided targets:
//! - The header tag must match the field kind, reserved bits are ignored
//! - Every wire length is checked against the remaining input before use
//! - List targets must hold enough slots unless growth is enabled
//! - Vacant list slots still consume their encoded element
//! - Struct member counts must match the schema

use std::mem;
use std::sync::Arc;

use super::errors::{index_segment, CodecError, CodecResult};
use super::value::Value;
use crate::config::Config;
use crate::observability::{log_event_with_fields, CodecMetrics, Event};
use crate::schema::{Field, FieldKind, SchemaVersion};
use crate::wire::{varint, VarintError, WireTag, BOOL_TRUE_BIT};

/// Decoder behaviour switches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DecoderOptions {
    /// Append list slots when the target holds fewer than the encoded count
    pub grow_lists: bool,
}

/// Input cursor
struct Source<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Source<'a> {
    fn new(input: &'a [u8]) -> Self {
        Self { input, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.input.len() - self.pos
    }

    /// Reads a header byte and checks its tag
    fn header(&mut self, expected: WireTag) -> CodecResult<u8> {
        let header = *self
            .input
            .get(self.pos)
            .ok_or_else(|| CodecError::truncated(self.pos, "header"))?;
        if WireTag::from_header(header) != Some(expected) {
            return Err(CodecError::format_mismatch(self.pos, expected, header));
        }
        self.pos += 1;
        Ok(header)
    }

    fn varint(&mut self) -> CodecResult<u64> {
        match varint::decode(&self.input[self.pos..]) {
            Ok((value, used)) => {
                self.pos += used;
                Ok(value)
            }
            Err(VarintError::Truncated { .. }) => Err(CodecError::truncated(self.pos, "varint")),
            Err(VarintError::Overflow) => Err(CodecError::varint_overflow(self.pos)),
        }
    }

    /// Reads a varint length or count that must fit in memory
    fn length(&mut self) -> CodecResult<usize> {
        let at = self.pos;
        let value = self.varint()?;
        usize::try_from(value).map_err(|_| CodecError::length_overflow(at, value))
    }

    /// Reads a string length and checks it against the declared capacity
    fn string_length(&mut self, field: &Field) -> CodecResult<usize> {
        let at = self.pos;
        let len = self.length()?;
        if let Some(capacity) = field.capacity() {
            if len >= capacity {
                return Err(CodecError::capacity_exceeded(at, len, capacity));
            }
        }
        Ok(len)
    }

    fn take(&mut self, len: usize, what: &str) -> CodecResult<&'a [u8]> {
        if len > self.remaining() {
            return Err(CodecError::truncated(self.pos, what));
        }
        let bytes = &self.input[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    /// Reads a list count; every element needs at least its header byte
    fn element_count(&mut self) -> CodecResult<usize> {
        let at = self.pos;
        let count = self.length()?;
        if count > self.remaining() {
            return Err(CodecError::truncated(at, "list elements"));
        }
        Ok(count)
    }

    /// Reads a struct member count and checks it against the schema
    fn member_count(&mut self, expected: usize) -> CodecResult<()> {
        let at = self.pos;
        let count = self.length()?;
        if count != expected {
            return Err(CodecError::schema_mismatch(at, expected, count));
        }
        Ok(())
    }
}

/// Decoder for schema-shaped values
#[derive(Debug, Clone, Default)]
pub struct Decoder {
    options: DecoderOptions,
    metrics: Option<Arc<CodecMetrics>>,
}

impl Decoder {
    /// Decoder that never grows list targets
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: DecoderOptions) -> Self {
        Self {
            options,
            metrics: None,
        }
    }

    /// Decoder configured from `config.grow_lists`
    pub fn from_config(config: &Config) -> Self {
        Self::with_options(DecoderOptions {
            grow_lists: config.grow_lists,
        })
    }

    /// Records successes and failures in `metrics`
    pub fn with_metrics(mut self, metrics: Arc<CodecMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn options(&self) -> DecoderOptions {
        self.options
    }

    /// Decodes one value of `field` from `input` into `target`.
    ///
    /// Returns the number of bytes consumed. On failure `target` may be
    /// partially updated.
    pub fn read(&self, field: &Field, input: &[u8], target: &mut Value) -> CodecResult<usize> {
        let mut src = Source::new(input);
        let result = read_field(field, &mut src, target, self.options.grow_lists)
            .map_err(|e| e.within(field.label()))
            .map(|()| src.pos);
        self.finish(result)
    }

    /// Decodes one value into a new `Value`, growing lists as needed
    pub fn decode(&self, field: &Field, input: &[u8]) -> CodecResult<(Value, usize)> {
        let mut value = Value::skeleton(field);
        let mut src = Source::new(input);
        let result = read_field(field, &mut src, &mut value, true)
            .map_err(|e| e.within(field.label()))
            .map(|()| src.pos);
        let consumed = self.finish(result)?;
        Ok((value, consumed))
    }

    /// Consumes one value of `field` without storing it
    pub fn skip(&self, field: &Field, input: &[u8]) -> CodecResult<usize> {
        let mut src = Source::new(input);
        let result = skip_field(field, &mut src)
            .map_err(|e| e.within(field.label()))
            .map(|()| src.pos);
        self.finish(result)
    }

    /// Decodes every top-level field of `version` in order.
    ///
    /// `targets` needs one slot per field; extra slots are left untouched.
    pub fn read_version(
        &self,
        version: &SchemaVersion,
        input: &[u8],
        targets: &mut [Value],
    ) -> CodecResult<usize> {
        let fields = version.fields();
        if targets.len() < fields.len() {
            return self.finish(Err(CodecError::target_too_small(
                0,
                fields.len(),
                targets.len(),
            )));
        }

        let mut src = Source::new(input);
        let mut result = Ok(());
        for (field, target) in fields.iter().zip(targets.iter_mut()) {
            result = read_field(field, &mut src, target, self.options.grow_lists)
                .map_err(|e| e.within(field.label()));
            if result.is_err() {
                break;
            }
        }
        self.finish(result.map(|()| src.pos))
    }

    /// Decodes every top-level field of `version` into new values
    pub fn decode_version(
        &self,
        version: &SchemaVersion,
        input: &[u8],
    ) -> CodecResult<(Vec<Value>, usize)> {
        let mut values: Vec<Value> = version.fields().iter().map(Value::skeleton).collect();
        let mut src = Source::new(input);
        let mut result = Ok(());
        for (field, value) in version.fields().iter().zip(values.iter_mut()) {
            result = read_field(field, &mut src, value, true).map_err(|e| e.within(field.label()));
            if result.is_err() {
                break;
            }
        }
        let consumed = self.finish(result.map(|()| src.pos))?;
        Ok((values, consumed))
    }

    fn finish(&self, result: CodecResult<usize>) -> CodecResult<usize> {
        match &result {
            Ok(consumed) => {
                if let Some(metrics) = &self.metrics {
                    metrics.record_decode(*consumed);
                }
            }
            Err(e) => {
                if let Some(metrics) = &self.metrics {
                    metrics.record_decode_failure();
                }
                log_event_with_fields(
                    Event::DecodeFailed,
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

fn read_field(field: &Field, src: &mut Source<'_>, target: &mut Value, grow: bool) -> CodecResult<()> {
    let header = src.header(WireTag::for_kind(field.kind()))?;

    match field.kind() {
        FieldKind::Null => *target = Value::Null,

        FieldKind::Bool => *target = Value::Bool(header & BOOL_TRUE_BIT != 0),

        FieldKind::Int => *target = Value::Int(src.varint()?),

        FieldKind::String => {
            let len = src.string_length(field)?;
            let bytes = src.take(len, "string body")?;
            match target {
                Value::String(buf) => {
                    buf.clear();
                    buf.extend_from_slice(bytes);
                }
                other => *other = Value::String(bytes.to_vec()),
            }
        }

        FieldKind::List(element) => {
            let at = src.pos;
            let count = src.element_count()?;
            let mut items = match mem::replace(target, Value::Vacant) {
                Value::List(items) => items,
                _ => Vec::new(),
            };

            let result = read_elements(element, src, &mut items, count, grow, at);
            *target = Value::List(items);
            result?;
        }

        FieldKind::Struct(def) => {
            src.member_count(def.len())?;
            let reshape = match target {
                Value::Struct(members) => members.len() != def.len(),
                _ => true,
            };
            if reshape {
                *target = Value::skeleton(field);
            }
            if let Value::Struct(members) = target {
                for (child, member) in def.children().iter().zip(members.iter_mut()) {
                    read_field(child, src, member, grow).map_err(|e| e.within(child.label()))?;
                }
            }
        }
    }

    Ok(())
}

fn read_elements(
    element: &Field,
    src: &mut Source<'_>,
    items: &mut Vec<Value>,
    count: usize,
    grow: bool,
    at: usize,
) -> CodecResult<()> {
    if items.len() < count {
        if !grow {
            return Err(CodecError::target_too_small(at, count, items.len()));
        }
        items.resize_with(count, || Value::skeleton(element));
    }

    for (i, slot) in items.iter_mut().take(count).enumerate() {
        let result = if slot.is_vacant() {
            skip_field(element, src)
        } else {
            read_field(element, src, slot, grow)
        };
        result.map_err(|e| e.within(&index_segment(i)))?;
    }

    items.truncate(count);
    Ok(())
}

fn skip_field(field: &Field, src: &mut Source<'_>) -> CodecResult<()> {
    src.header(WireTag::for_kind(field.kind()))?;

    match field.kind() {
        FieldKind::Null | FieldKind::Bool => {}

        FieldKind::Int => {
            src.varint()?;
        }

        FieldKind::String => {
            let len = src.string_length(field)?;
            src.take(len, "string body")?;
        }

        FieldKind::List(element) => {
            let count = src.element_count()?;
            for i in 0..count {
                skip_field(element, src).map_err(|e| e.within(&index_segment(i)))?;
            }
        }

        FieldKind::Struct(def) => {
            src.member_count(def.len())?;
            for child in def.children() {
                skip_field(child, src).map_err(|e| e.within(child.label()))?;
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::errors::CodecErrorCode;
    use crate::codec::writer::Encoder;

    fn device() -> Field {
        Field::anonymous(FieldKind::structure(vec![
            Field::int("id"),
            Field::string("name"),
        ]))
    }

    fn devices() -> Field {
        Field::list("devices", device())
    }

    fn device_value(id: u64, name: &str) -> Value {
        Value::Struct(vec![Value::Int(id), Value::string(name)])
    }

    fn encoded_devices(records: &[(u64, &str)]) -> Vec<u8> {
        let value = Value::List(
            records
                .iter()
                .map(|(id, name)| device_value(*id, name))
                .collect(),
        );
        Encoder::new().encode_to_vec(&devices(), &value).unwrap()
    }

    #[test]
    fn test_read_int() {
        let mut target = Value::Int(0);
        let consumed = Decoder::new()
            .read(&Field::int("id"), &[0x40, 0xAC, 0x02], &mut target)
            .unwrap();
        assert_eq!(consumed, 3);
        assert_eq!(target, Value::Int(300));
    }

    #[test]
    fn test_reserved_bits_ignored() {
        let mut target = Value::Int(0);
        Decoder::new()
            .read(&Field::int("id"), &[0x5F, 0x01], &mut target)
            .unwrap();
        assert_eq!(target, Value::Int(1));
    }

    #[test]
    fn test_read_bool_and_null() {
        let decoder = Decoder::new();
        let mut target = Value::Vacant;
        decoder.read(&Field::bool("flag"), &[0x30], &mut target).unwrap();
        assert_eq!(target, Value::Bool(true));
        decoder.read(&Field::bool("flag"), &[0x20], &mut target).unwrap();
        assert_eq!(target, Value::Bool(false));

        let null = Field::named("nothing", FieldKind::Null);
        assert_eq!(decoder.read(&null, &[0x00], &mut target).unwrap(), 1);
        assert_eq!(target, Value::Null);
    }

    #[test]
    fn test_string_buffer_reused() {
        let mut target = Value::String(Vec::with_capacity(64));
        Decoder::new()
            .read(&Field::string("name"), &[0x60, 0x02, b'h', b'i'], &mut target)
            .unwrap();
        assert_eq!(target.as_str(), Some("hi"));
        assert!(target.as_bytes().map(|b| b.len()) == Some(2));
    }

    #[test]
    fn test_list_into_preallocated_slots() {
        let bytes = encoded_devices(&[(1, "device1"), (2, "device2")]);
        let mut target = Value::List(vec![Value::skeleton(&device()); 4]);

        let consumed = Decoder::new().read(&devices(), &bytes, &mut target).unwrap();
        assert_eq!(consumed, bytes.len());
        assert_eq!(
            target,
            Value::List(vec![device_value(1, "device1"), device_value(2, "device2")])
        );
    }

    #[test]
    fn test_target_too_small() {
        let bytes = encoded_devices(&[(1, "a"), (2, "b")]);
        let mut target = Value::List(vec![Value::skeleton(&device())]);

        let err = Decoder::new().read(&devices(), &bytes, &mut target).unwrap_err();
        assert_eq!(err.code(), CodecErrorCode::UteTargetTooSmall);
        assert_eq!(err.offset(), 1);
    }

    #[test]
    fn test_grow_lists() {
        let bytes = encoded_devices(&[(1, "a"), (2, "b")]);
        let decoder = Decoder::with_options(DecoderOptions { grow_lists: true });
        let mut target = Value::List(vec![]);

        decoder.read(&devices(), &bytes, &mut target).unwrap();
        assert_eq!(target.as_list().map(|l| l.len()), Some(2));
    }

    #[test]
    fn test_vacant_slot_consumes_element() {
        let bytes = encoded_devices(&[(1, "first"), (2, "second"), (3, "third")]);
        let mut target = Value::List(vec![
            Value::skeleton(&device()),
            Value::Vacant,
            Value::skeleton(&device()),
        ]);

        let consumed = Decoder::new().read(&devices(), &bytes, &mut target).unwrap();
        assert_eq!(consumed, bytes.len());
        assert_eq!(
            target,
            Value::List(vec![device_value(1, "first"), Value::Vacant, device_value(3, "third")])
        );
    }

    #[test]
    fn test_empty_list_decodes_to_zero() {
        let mut target = Value::List(vec![Value::skeleton(&device())]);
        let consumed = Decoder::new()
            .read(&devices(), &[0x80, 0x00], &mut target)
            .unwrap();
        assert_eq!(consumed, 2);
        assert_eq!(target, Value::List(vec![]));
    }

    #[test]
    fn test_format_mismatch() {
        let mut target = Value::Int(0);
        let err = Decoder::new()
            .read(&Field::int("id"), &[0x60, 0x00], &mut target)
            .unwrap_err();
        assert_eq!(err.code(), CodecErrorCode::UteFormatMismatch);
        assert_eq!(err.offset(), 0);
    }

    #[test]
    fn test_int_header_against_string_field() {
        let mut target = Value::String(vec![]);
        let err = Decoder::new()
            .read(&Field::string("name"), &[0x40, 0x01], &mut target)
            .unwrap_err();
        assert_eq!(err.code(), CodecErrorCode::UteFormatMismatch);
        assert_eq!(err.offset(), 0);
        assert_eq!(err.path(), Some("name"));
    }

    #[test]
    fn test_invalid_tag() {
        let mut target = Value::Int(0);
        let err = Decoder::new()
            .read(&Field::int("id"), &[0xE0], &mut target)
            .unwrap_err();
        assert_eq!(err.code(), CodecErrorCode::UteFormatMismatch);
    }

    #[test]
    fn test_empty_input_truncated() {
        let mut target = Value::Int(0);
        let err = Decoder::new().read(&Field::int("id"), &[], &mut target).unwrap_err();
        assert_eq!(err.code(), CodecErrorCode::UteTruncated);
    }

    #[test]
    fn test_truncated_string_body() {
        let mut target = Value::String(vec![]);
        let err = Decoder::new()
            .read(&Field::string("name"), &[0x60, 0x05, b'a', b'b'], &mut target)
            .unwrap_err();
        assert_eq!(err.code(), CodecErrorCode::UteTruncated);
        assert_eq!(err.offset(), 2);
    }

    #[test]
    fn test_every_truncation_fails() {
        let bytes = encoded_devices(&[(1, "device1"), (2, "device2")]);
        let decoder = Decoder::new();
        for cut in 0..bytes.len() {
            let mut target = Value::List(vec![Value::skeleton(&device()); 2]);
            let err = decoder
                .read(&devices(), &bytes[..cut], &mut target)
                .unwrap_err();
            assert_eq!(err.code(), CodecErrorCode::UteTruncated, "cut at {}", cut);
        }
    }

    #[test]
    fn test_huge_count_rejected_before_allocation() {
        let decoder = Decoder::with_options(DecoderOptions { grow_lists: true });
        let mut target = Value::List(vec![]);
        let err = decoder
            .read(&devices(), &[0x80, 0xFF, 0xFF, 0xFF, 0xFF, 0x0F], &mut target)
            .unwrap_err();
        assert_eq!(err.code(), CodecErrorCode::UteTruncated);
    }

    #[test]
    fn test_varint_overflow() {
        let mut input = vec![0x40];
        input.extend_from_slice(&[0xFF; 10]);
        input.push(0x01);
        let mut target = Value::Int(0);
        let err = Decoder::new().read(&Field::int("id"), &input, &mut target).unwrap_err();
        assert_eq!(err.code(), CodecErrorCode::UteVarintOverflow);
        assert_eq!(err.offset(), 1);
    }

    #[test]
    fn test_struct_count_mismatch() {
        let mut target = Value::skeleton(&device());
        let err = Decoder::new()
            .read(&device(), &[0xA0, 0x03, 0x40, 0x01], &mut target)
            .unwrap_err();
        assert_eq!(err.code(), CodecErrorCode::UteSchemaMismatch);
    }

    #[test]
    fn test_capacity_enforced_on_decode() {
        let field = Field::string("tag").with_capacity(3);
        let mut target = Value::String(vec![]);
        let err = Decoder::new()
            .read(&field, &[0x60, 0x03, b'a', b'b', b'c'], &mut target)
            .unwrap_err();
        assert_eq!(err.code(), CodecErrorCode::UteCapacityExceeded);

        Decoder::new()
            .read(&field, &[0x60, 0x02, b'a', b'b'], &mut target)
            .unwrap();
        assert_eq!(target.as_str(), Some("ab"));
    }

    #[test]
    fn test_capacity_enforced_on_skip() {
        let field = Field::string("tag").with_capacity(3);
        let input = [0x60, 0x03, b'a', b'b', b'c'];

        let err = Decoder::new().skip(&field, &input).unwrap_err();
        assert_eq!(err.code(), CodecErrorCode::UteCapacityExceeded);
        assert_eq!(err.offset(), 1);
    }

    #[test]
    fn test_capacity_enforced_for_vacant_slot() {
        let tags = Field::list("tags", Field::anonymous(FieldKind::String).with_capacity(3));
        let input = [0x80, 0x01, 0x60, 0x03, b'a', b'b', b'c'];

        let mut vacant = Value::List(vec![Value::Vacant]);
        let err = Decoder::new().read(&tags, &input, &mut vacant).unwrap_err();
        assert_eq!(err.code(), CodecErrorCode::UteCapacityExceeded);
        assert_eq!(err.path(), Some("tags[0]"));

        let mut populated = Value::List(vec![Value::String(vec![])]);
        let err = Decoder::new().read(&tags, &input, &mut populated).unwrap_err();
        assert_eq!(err.code(), CodecErrorCode::UteCapacityExceeded);
    }

    #[test]
    fn test_error_path_names_element() {
        let mut bytes = encoded_devices(&[(1, "a"), (2, "b")]);
        // Corrupt the second record's int header
        let second_id = bytes.len() - 5;
        bytes[second_id] = 0x60;
        let mut target = Value::List(vec![Value::skeleton(&device()); 2]);
        let err = Decoder::new().read(&devices(), &bytes, &mut target).unwrap_err();
        assert_eq!(err.path(), Some("devices[1].id"));
    }

    #[test]
    fn test_decode_allocates() {
        let bytes = encoded_devices(&[(7, "x")]);
        let (value, consumed) = Decoder::new().decode(&devices(), &bytes).unwrap();
        assert_eq!(consumed, bytes.len());
        assert_eq!(value, Value::List(vec![device_value(7, "x")]));
    }

    #[test]
    fn test_skip() {
        let mut bytes = encoded_devices(&[(1, "a"), (2, "b")]);
        let list_len = bytes.len();
        bytes.extend_from_slice(&[0x40, 0x09]);

        let decoder = Decoder::new();
        assert_eq!(decoder.skip(&devices(), &bytes).unwrap(), list_len);
        let mut target = Value::Int(0);
        decoder
            .read(&Field::int("after"), &bytes[list_len..], &mut target)
            .unwrap();
        assert_eq!(target, Value::Int(9));
    }

    #[test]
    fn test_version_roundtrip() {
        let version = SchemaVersion::new(2, vec![Field::int("id"), devices()]);
        let values = vec![Value::Int(3), Value::List(vec![device_value(1, "a")])];
        let mut out = [0u8; 64];
        let written = Encoder::new().write_version(&version, &values, &mut out).unwrap();

        let (decoded, consumed) = Decoder::new().decode_version(&version, &out[..written]).unwrap();
        assert_eq!(consumed, written);
        assert_eq!(decoded, values);

        let mut targets = vec![Value::Int(0), Value::List(vec![Value::skeleton(&device())])];
        Decoder::new()
            .read_version(&version, &out[..written], &mut targets)
            .unwrap();
        assert_eq!(targets, values);

        let mut short = vec![Value::Int(0)];
        let err = Decoder::new()
            .read_version(&version, &out[..written], &mut short)
            .unwrap_err();
        assert_eq!(err.code(), CodecErrorCode::UteTargetTooSmall);
    }

    #[test]
    fn test_from_config() {
        let config = Config {
            grow_lists: true,
            ..Config::default()
        };
        assert!(Decoder::from_config(&config).options().grow_lists);
        assert!(!Decoder::new().options().grow_lists);
    }

    #[test]
    fn test_metrics_recorded() {
        let metrics = Arc::new(CodecMetrics::new());
        let decoder = Decoder::new().with_metrics(Arc::clone(&metrics));
        let mut target = Value::Int(0);

        decoder.read(&Field::int("id"), &[0x40, 0x01], &mut target).unwrap();
        let _ = decoder.read(&Field::int("id"), &[0x40], &mut target);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.values_decoded, 1);
        assert_eq!(snapshot.bytes_read, 2);
        assert_eq!(snapshot.decode_failures, 1);
    }

    #[test]
    fn test_skip_recorded_in_metrics() {
        let metrics = Arc::new(CodecMetrics::new());
        let decoder = Decoder::new().with_metrics(Arc::clone(&metrics));

        assert_eq!(decoder.skip(&Field::int("id"), &[0x40, 0x01]).unwrap(), 2);
        assert!(decoder.skip(&Field::int("id"), &[0x60, 0x00]).is_err());

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.values_decoded, 1);
        assert_eq!(snapshot.bytes_read, 2);
        assert_eq!(snapshot.decode_failures, 1);
    }
}
