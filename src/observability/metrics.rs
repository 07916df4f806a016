//! Codec metrics
//!
//! - Counters only
//! - Monotonic increase
//! - Thread-safe, lock-free (relaxed atomics)

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters shared by encoders and decoders
///
/// Share one registry between codecs with `Arc<CodecMetrics>`.
#[derive(Debug, Default)]
pub struct CodecMetrics {
    /// Top-level values encoded successfully
    values_encoded: AtomicU64,
    /// Bytes produced by successful encodes
    bytes_written: AtomicU64,
    /// Failed encodes
    encode_failures: AtomicU64,
    /// Top-level values decoded successfully
    values_decoded: AtomicU64,
    /// Bytes consumed by successful decodes
    bytes_read: AtomicU64,
    /// Failed decodes
    decode_failures: AtomicU64,
}

impl CodecMetrics {
    /// Create a new registry with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a successful encode of `bytes` bytes
    pub fn record_encode(&self, bytes: usize) {
        self.values_encoded.fetch_add(1, Ordering::Relaxed);
        self.bytes_written.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    /// Record a failed encode
    pub fn record_encode_failure(&self) {
        self.encode_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a successful decode of `bytes` bytes
    pub fn record_decode(&self, bytes: usize) {
        self.values_decoded.fetch_add(1, Ordering::Relaxed);
        self.bytes_read.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    /// Record a failed decode
    pub fn record_decode_failure(&self) {
        self.decode_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Get current values as JSON
    pub fn to_json(&self) -> String {
        let s = self.snapshot();
        format!(
            r#"{{"bytes_read":{},"bytes_written":{},"decode_failures":{},"encode_failures":{},"values_decoded":{},"values_encoded":{}}}"#,
            s.bytes_read,
            s.bytes_written,
            s.decode_failures,
            s.encode_failures,
            s.values_decoded,
            s.values_encoded,
        )
    }

    /// Get all counters as a snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            values_encoded: self.values_encoded.load(Ordering::Relaxed),
            bytes_written: self.bytes_written.load(Ordering::Relaxed),
            encode_failures: self.encode_failures.load(Ordering::Relaxed),
            values_decoded: self.values_decoded.load(Ordering::Relaxed),
            bytes_read: self.bytes_read.load(Ordering::Relaxed),
            decode_failures: self.decode_failures.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time snapshot of the codec counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MetricsSnapshot {
    pub values_encoded: u64,
    pub bytes_written: u64,
    pub encode_failures: u64,
    pub values_decoded: u64,
    pub bytes_read: u64,
    pub decode_failures: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_new_registry_is_zero() {
        assert_eq!(CodecMetrics::new().snapshot(), MetricsSnapshot::default());
    }

    #[test]
    fn test_record_encode_and_decode() {
        let metrics = CodecMetrics::new();
        metrics.record_encode(10);
        metrics.record_encode(5);
        metrics.record_decode(15);
        metrics.record_decode_failure();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.values_encoded, 2);
        assert_eq!(snapshot.bytes_written, 15);
        assert_eq!(snapshot.values_decoded, 1);
        assert_eq!(snapshot.bytes_read, 15);
        assert_eq!(snapshot.decode_failures, 1);
        assert_eq!(snapshot.encode_failures, 0);
    }

    #[test]
    fn test_to_json_is_valid() {
        let metrics = CodecMetrics::new();
        metrics.record_encode(7);

        let parsed: serde_json::Value = serde_json::from_str(&metrics.to_json()).unwrap();
        assert_eq!(parsed["bytes_written"], 7);
        assert_eq!(parsed["values_encoded"], 1);
    }

    #[test]
    fn test_shared_across_threads() {
        let metrics = Arc::new(CodecMetrics::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let metrics = Arc::clone(&metrics);
                thread::spawn(move || {
                    for _ in 0..100 {
                        metrics.record_encode(1);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(metrics.snapshot().values_encoded, 400);
    }
}
