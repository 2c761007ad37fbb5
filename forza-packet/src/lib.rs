//! Forza Data Out telemetry decoding.
//!
//! This crate provides:
//! - Static, ordered field layouts for the sled, dash and horizon packet formats
//! - `PacketDecoder` turning a raw datagram into a `DecodedPacket`
//! - `TelemetryRecord`, the stringified record published downstream
//! - `DatagramBuilder` for producing well-formed datagrams (tests, replay)

pub mod layout;
pub mod packet;
pub mod record;
pub mod value;

pub use layout::{FieldDef, FieldKind, Layout, PacketFormat, ParseFormatError};
pub use packet::{DatagramBuilder, DecodeError, DecodedPacket, PacketDecoder, RACE_FLAG_FIELD};
pub use record::{TelemetryRecord, TIMESTAMP_FIELD, TIMESTAMP_FORMAT};
pub use value::FieldValue;
