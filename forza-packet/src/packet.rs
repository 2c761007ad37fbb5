//! Datagram decoding.

use thiserror::Error;

use crate::layout::{FieldDef, FieldKind, Layout, PacketFormat};
use crate::value::FieldValue;

/// Field carrying the race-active flag.
pub const RACE_FLAG_FIELD: &str = "is_race_on";

/// Errors from decoding a datagram or reading its fields.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("{format} datagram too short: expected at least {expected} bytes, got {actual}")]
    TooShort {
        format: PacketFormat,
        expected: usize,
        actual: usize,
    },

    #[error("unknown telemetry field: {0}")]
    UnknownField(String),
}

/// Decoder for one packet format.
///
/// The field layout is resolved once at construction and shared by every
/// decoded packet.
#[derive(Debug, Clone)]
pub struct PacketDecoder {
    layout: Layout,
}

impl PacketDecoder {
    pub fn new(format: PacketFormat) -> Self {
        Self {
            layout: Layout::new(format),
        }
    }

    pub fn format(&self) -> PacketFormat {
        self.layout.format()
    }

    /// Minimum datagram length accepted by `decode`.
    pub fn expected_len(&self) -> usize {
        self.layout.packet_len()
    }

    /// The ordered set of fields this decoder produces.
    ///
    /// Independent of datagram content.
    pub fn available_fields(&self) -> Vec<&'static str> {
        self.layout.field_names()
    }

    /// Decode `bytes` into typed values.
    ///
    /// Bytes past the fixed packet length are ignored.
    pub fn decode(&self, bytes: &[u8]) -> Result<DecodedPacket<'_>, DecodeError> {
        let expected = self.layout.packet_len();
        if bytes.len() < expected {
            return Err(DecodeError::TooShort {
                format: self.layout.format(),
                expected,
                actual: bytes.len(),
            });
        }

        let values = self
            .layout
            .fields()
            .iter()
            .map(|field| read_field(bytes, field))
            .collect();

        Ok(DecodedPacket {
            layout: &self.layout,
            values,
        })
    }
}

/// A decoded datagram.
#[derive(Debug, Clone)]
pub struct DecodedPacket<'a> {
    layout: &'a Layout,
    values: Vec<FieldValue>,
}

impl DecodedPacket<'_> {
    pub fn format(&self) -> PacketFormat {
        self.layout.format()
    }

    /// Look up a single field by name.
    pub fn value(&self, name: &str) -> Option<FieldValue> {
        self.layout.position(name).map(|i| self.values[i])
    }

    /// Values for `fields`, in the same order.
    pub fn values(&self, fields: &[&str]) -> Result<Vec<FieldValue>, DecodeError> {
        fields
            .iter()
            .map(|&name| {
                self.value(name)
                    .ok_or_else(|| DecodeError::UnknownField(name.to_string()))
            })
            .collect()
    }

    /// Whether the game reports an active race (as opposed to menus,
    /// replays or a paused session).
    pub fn is_race_active(&self) -> bool {
        matches!(self.value(RACE_FLAG_FIELD), Some(FieldValue::Int(v)) if v != 0)
    }
}

fn read_field(bytes: &[u8], field: &FieldDef) -> FieldValue {
    let raw = &bytes[field.offset..field.offset + field.kind.size()];
    match field.kind {
        FieldKind::I8 => i8::from_le_bytes(le(raw)).into(),
        FieldKind::U8 => u8::from_le_bytes(le(raw)).into(),
        FieldKind::U16 => u16::from_le_bytes(le(raw)).into(),
        FieldKind::I32 => i32::from_le_bytes(le(raw)).into(),
        FieldKind::U32 => u32::from_le_bytes(le(raw)).into(),
        FieldKind::F32 => f32::from_le_bytes(le(raw)).into(),
    }
}

fn le<const N: usize>(raw: &[u8]) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(&raw[..N]);
    out
}

/// Builds well-formed datagrams for a packet format.
///
/// Every field starts at zero; values are narrowed to the field's wire type.
#[derive(Debug, Clone)]
pub struct DatagramBuilder {
    layout: Layout,
    buf: Vec<u8>,
}

impl DatagramBuilder {
    pub fn new(format: PacketFormat) -> Self {
        let layout = Layout::new(format);
        let buf = vec![0u8; layout.packet_len()];
        Self { layout, buf }
    }

    /// Set a field by name.
    pub fn set(
        &mut self,
        name: &str,
        value: impl Into<FieldValue>,
    ) -> Result<&mut Self, DecodeError> {
        let field = *self
            .layout
            .field(name)
            .ok_or_else(|| DecodeError::UnknownField(name.to_string()))?;
        let value = value.into();
        let whole = match value {
            FieldValue::Int(v) => v,
            FieldValue::UInt(v) => v as i64,
            FieldValue::Float(v) => v as i64,
        };

        let slot = &mut self.buf[field.offset..field.offset + field.kind.size()];
        match field.kind {
            FieldKind::I8 => slot.copy_from_slice(&(whole as i8).to_le_bytes()),
            FieldKind::U8 => slot.copy_from_slice(&(whole as u8).to_le_bytes()),
            FieldKind::U16 => slot.copy_from_slice(&(whole as u16).to_le_bytes()),
            FieldKind::I32 => slot.copy_from_slice(&(whole as i32).to_le_bytes()),
            FieldKind::U32 => slot.copy_from_slice(&(whole as u32).to_le_bytes()),
            FieldKind::F32 => slot.copy_from_slice(&(value.as_f64() as f32).to_le_bytes()),
        }
        Ok(self)
    }

    /// Set the race-active flag.
    pub fn race_on(&mut self, active: bool) -> &mut Self {
        let offset = self.layout.fields()[0].offset;
        self.buf[offset..offset + 4].copy_from_slice(&i32::from(active).to_le_bytes());
        self
    }

    pub fn build(&self) -> Vec<u8> {
        self.buf.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_available_fields_in_wire_order() {
        let decoder = PacketDecoder::new(PacketFormat::Horizon);
        let fields = decoder.available_fields();
        assert_eq!(fields.len(), 85);
        assert_eq!(fields[0], "is_race_on");
        assert_eq!(fields[1], "timestamp_ms");
        assert_eq!(fields[84], "norm_ai_brake_diff");
    }

    #[test]
    fn test_available_fields_stable_across_calls() {
        let decoder = PacketDecoder::new(PacketFormat::Dash);
        assert_eq!(decoder.available_fields(), decoder.available_fields());
    }

    #[test]
    fn test_decode_too_short() {
        let decoder = PacketDecoder::new(PacketFormat::Horizon);
        let err = decoder.decode(&[0u8; 100]).unwrap_err();
        assert_eq!(
            err,
            DecodeError::TooShort {
                format: PacketFormat::Horizon,
                expected: 324,
                actual: 100,
            }
        );
        assert!(err.to_string().contains("324"));
    }

    #[test]
    fn test_decode_empty() {
        let decoder = PacketDecoder::new(PacketFormat::Sled);
        assert!(matches!(
            decoder.decode(&[]),
            Err(DecodeError::TooShort { actual: 0, .. })
        ));
    }

    #[test]
    fn test_decode_exact_length() {
        let decoder = PacketDecoder::new(PacketFormat::Sled);
        let packet = decoder.decode(&[0u8; 232]).expect("decode");
        assert_eq!(packet.format(), PacketFormat::Sled);
        assert!(!packet.is_race_active());
    }

    #[test]
    fn test_decode_ignores_trailing_bytes() {
        let mut builder = DatagramBuilder::new(PacketFormat::Dash);
        builder.set("speed", 12.5f32).unwrap();
        let mut bytes = builder.build();
        bytes.extend_from_slice(&[0xff; 20]);

        let decoder = PacketDecoder::new(PacketFormat::Dash);
        let packet = decoder.decode(&bytes).expect("decode");
        assert_eq!(packet.value("speed"), Some(FieldValue::Float(12.5)));
    }

    #[test]
    fn test_decode_field_types() {
        let mut builder = DatagramBuilder::new(PacketFormat::Horizon);
        builder
            .set("timestamp_ms", 123456u32)
            .unwrap()
            .set("car_ordinal", 3344i32)
            .unwrap()
            .set("lap_no", 4u16)
            .unwrap()
            .set("gear", 5u8)
            .unwrap()
            .set("steer", -127i8)
            .unwrap()
            .set("current_engine_rpm", 7250.5f32)
            .unwrap();

        let decoder = PacketDecoder::new(PacketFormat::Horizon);
        let bytes = builder.build();
        let packet = decoder.decode(&bytes).expect("decode");

        assert_eq!(packet.value("timestamp_ms"), Some(FieldValue::UInt(123456)));
        assert_eq!(packet.value("car_ordinal"), Some(FieldValue::Int(3344)));
        assert_eq!(packet.value("lap_no"), Some(FieldValue::UInt(4)));
        assert_eq!(packet.value("gear"), Some(FieldValue::UInt(5)));
        assert_eq!(packet.value("steer"), Some(FieldValue::Int(-127)));
        assert_eq!(
            packet.value("current_engine_rpm"),
            Some(FieldValue::Float(7250.5))
        );
    }

    #[test]
    fn test_decode_reads_little_endian() {
        let mut bytes = vec![0u8; 232];
        bytes[4..8].copy_from_slice(&[0x01, 0x02, 0x00, 0x00]);

        let decoder = PacketDecoder::new(PacketFormat::Sled);
        let packet = decoder.decode(&bytes).expect("decode");
        assert_eq!(packet.value("timestamp_ms"), Some(FieldValue::UInt(0x0201)));
    }

    #[test]
    fn test_values_follow_requested_order() {
        let mut builder = DatagramBuilder::new(PacketFormat::Horizon);
        builder.set("gear", 3u8).unwrap().set("speed", 40.0f32).unwrap();

        let decoder = PacketDecoder::new(PacketFormat::Horizon);
        let bytes = builder.build();
        let packet = decoder.decode(&bytes).expect("decode");

        let values = packet.values(&["speed", "gear"]).expect("values");
        assert_eq!(values, vec![FieldValue::Float(40.0), FieldValue::UInt(3)]);
    }

    #[test]
    fn test_values_all_fields_same_length() {
        let decoder = PacketDecoder::new(PacketFormat::Horizon);
        let fields = decoder.available_fields();
        let bytes = DatagramBuilder::new(PacketFormat::Horizon).build();
        let packet = decoder.decode(&bytes).expect("decode");
        assert_eq!(packet.values(&fields).expect("values").len(), fields.len());
    }

    #[test]
    fn test_values_unknown_field() {
        let decoder = PacketDecoder::new(PacketFormat::Sled);
        let bytes = DatagramBuilder::new(PacketFormat::Sled).build();
        let packet = decoder.decode(&bytes).expect("decode");

        let err = packet.values(&["yaw", "speed"]).unwrap_err();
        assert_eq!(err, DecodeError::UnknownField("speed".to_string()));
    }

    #[test]
    fn test_race_active_flag() {
        let decoder = PacketDecoder::new(PacketFormat::Horizon);

        let on = DatagramBuilder::new(PacketFormat::Horizon).race_on(true).build();
        assert!(decoder.decode(&on).unwrap().is_race_active());

        let off = DatagramBuilder::new(PacketFormat::Horizon).race_on(false).build();
        assert!(!decoder.decode(&off).unwrap().is_race_active());
    }

    #[test]
    fn test_race_active_any_nonzero() {
        let mut builder = DatagramBuilder::new(PacketFormat::Sled);
        builder.set(RACE_FLAG_FIELD, -1i32).unwrap();

        let decoder = PacketDecoder::new(PacketFormat::Sled);
        let bytes = builder.build();
        assert!(decoder.decode(&bytes).unwrap().is_race_active());
    }

    #[test]
    fn test_builder_unknown_field() {
        let mut builder = DatagramBuilder::new(PacketFormat::Sled);
        assert_eq!(
            builder.set("speed", 1.0f32).unwrap_err(),
            DecodeError::UnknownField("speed".to_string())
        );
    }

    #[test]
    fn test_builder_length_matches_decoder() {
        for format in PacketFormat::ALL {
            let decoder = PacketDecoder::new(format);
            assert_eq!(DatagramBuilder::new(format).build().len(), decoder.expected_len());
        }
    }
}
