//! # mbus-codec
//!
//! Variable-data-record codec for the M-Bus (Meter-Bus) protocol,
//! EN 13757-3:2018. This crate implements the bit-level codec and
//! type-matching engine that turns a DIF/DIFE + VIF/VIFE header chain plus
//! its trailing payload bytes into a typed [`record::Record`] — and, for
//! the master-to-slave direction, the inverse: structured fields back into
//! wire bytes.
//!
//! The serial/TCP transport, link-layer framing (start/length/CRC/stop,
//! address/control bytes), session orchestration, CLI and configuration
//! loading all live outside this crate; it consumes anything implementing
//! [`byte_source::ByteSource`] and hands back typed records. See
//! `SPEC_FULL.md` and `DESIGN.md` for the full component breakdown and the
//! grounding for each one.
//!
//! ## Example
//!
//! ```
//! use mbus_codec::byte_source::SliceByteSource;
//! use mbus_codec::direction::Direction;
//! use mbus_codec::record::{self, Record};
//!
//! # async fn run() {
//! // DIB=0x04 (instantaneous, 4-byte data field), VIB=0x03 (Energy, Wh,
//! // 10^0), data = 12345 (little-endian).
//! let mut src = SliceByteSource::new(&[0x04, 0x03, 0x39, 0x30, 0x00, 0x00]);
//! let rec = record::parse(Direction::SLAVE_TO_MASTER, &mut src).await.unwrap();
//! assert!(matches!(rec, Record::Data(_)));
//! # }
//! ```

pub mod ascii_unit;
pub mod byte_source;
pub mod constants;
pub mod data;
pub mod data_rules;
pub mod datatype;
pub mod dib;
pub mod dif;
pub mod direction;
pub mod error;
pub mod logging;
pub mod record;
pub mod value;
pub mod value_transformer;
pub mod vif;
pub mod vif_tables;

pub use byte_source::ByteSource;
pub use data_rules::Requires;
pub use datatype::{DataType, DataTypeSet};
pub use direction::Direction;
pub use error::{CodecError, CodecResult};
pub use record::{parse as parse_record, DataRecord, Record};
pub use value::{ComponentTemporal, EpochTemporal, Temporal, Value};
