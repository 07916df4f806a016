//! Schema-driven binary codec
//!
//! - `Encoder` writes a `Value` shaped by a schema field
//! - `Decoder` reads it back into caller-provided targets
//! - `flat` binds struct records in byte regions to values via slot offsets
//!
//! The codec trusts the schema: values are checked against the field kind,
//! never inspected for their own type.
//!
//! # Usage
//!
//! ```ignore
//! let schema = SchemaParser::new().parse_file(Path::new("devices.yaml"))?;
//! let devices = schema.latest().and_then(|v| v.field("devices")).unwrap();
//!
//! let bytes = Encoder::new().encode_to_vec(devices, &value)?;
//! let (decoded, _) = Decoder::new().decode(devices, &bytes)?;
//! ```

mod errors;
pub mod flat;
mod reader;
mod value;
mod writer;

pub use errors::{CodecError, CodecErrorCode, CodecResult};
pub use flat::{FlatCodec, FlatError, LayoutError, RecordsRead};
pub use reader::{Decoder, DecoderOptions};
pub use value::Value;
pub use writer::Encoder;
