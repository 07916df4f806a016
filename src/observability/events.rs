//! Observable events for ute
//!
//! Events are explicit and typed; each has a fixed severity.

use std::fmt;

use super::logger::Severity;

/// Observable events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Configuration
    /// Configuration file loaded
    ConfigLoaded,

    // Schema lifecycle
    /// Schema file load started
    SchemaLoadBegin,
    /// Schema parsed successfully
    SchemaLoaded,
    /// Schema file could not be loaded or parsed
    SchemaLoadFailed,
    /// Schema tree released
    SchemaReleased,

    // Codec
    /// Encoding a value failed
    EncodeFailed,
    /// Decoding a value failed
    DecodeFailed,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",

            Event::SchemaLoadBegin => "SCHEMA_LOAD_BEGIN",
            Event::SchemaLoaded => "SCHEMA_LOADED",
            Event::SchemaLoadFailed => "SCHEMA_LOAD_FAILED",
            Event::SchemaReleased => "SCHEMA_RELEASED",

            Event::EncodeFailed => "ENCODE_FAILED",
            Event::DecodeFailed => "DECODE_FAILED",
        }
    }

    /// Severity the event is logged at
    pub fn severity(&self) -> Severity {
        match self {
            Event::SchemaLoadBegin | Event::SchemaReleased => Severity::Trace,
            Event::ConfigLoaded | Event::SchemaLoaded => Severity::Info,
            Event::EncodeFailed | Event::DecodeFailed => Severity::Info,
            Event::SchemaLoadFailed => Severity::Warn,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names() {
        assert_eq!(Event::SchemaLoaded.as_str(), "SCHEMA_LOADED");
        assert_eq!(Event::DecodeFailed.to_string(), "DECODE_FAILED");
    }

    #[test]
    fn test_schema_failure_outranks_codec_failures() {
        assert!(Event::SchemaLoadFailed.severity() > Event::DecodeFailed.severity());
        assert_eq!(Event::EncodeFailed.severity(), Event::DecodeFailed.severity());
    }
}
