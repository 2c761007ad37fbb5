//! Telemetry records published downstream.

use chrono::NaiveDateTime;
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::packet::{DecodeError, DecodedPacket};
use crate::value::FieldValue;

/// Name of the synthesized capture-time field.
pub const TIMESTAMP_FIELD: &str = "timestamp";

/// Format of the capture-time field, e.g. `2024-05-01 18:04:11.250031`.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// One captured datagram: decoded fields in order, plus the capture time.
///
/// Serializes as a JSON object of field name to stringified value, with
/// `timestamp` last.
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryRecord {
    fields: Vec<(&'static str, FieldValue)>,
    timestamp: String,
}

impl TelemetryRecord {
    /// Build a record from `fields` of `packet`, stamped with `captured_at`.
    pub fn capture(
        packet: &DecodedPacket<'_>,
        fields: &[&'static str],
        captured_at: NaiveDateTime,
    ) -> Result<Self, DecodeError> {
        let values = packet.values(fields)?;
        Ok(Self {
            fields: fields.iter().copied().zip(values).collect(),
            timestamp: captured_at.format(TIMESTAMP_FORMAT).to_string(),
        })
    }

    pub fn get(&self, name: &str) -> Option<FieldValue> {
        self.fields
            .iter()
            .find(|(field, _)| *field == name)
            .map(|(_, value)| *value)
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    /// Number of entries, including the timestamp.
    pub fn entry_count(&self) -> usize {
        self.fields.len() + 1
    }

    /// Entries as published: name and stringified value, timestamp last.
    pub fn entries(&self) -> impl Iterator<Item = (&str, String)> + '_ {
        self.fields
            .iter()
            .map(|(name, value)| (*name, value.to_string()))
            .chain(std::iter::once((TIMESTAMP_FIELD, self.timestamp.clone())))
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn to_json_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

impl Serialize for TelemetryRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entry_count()))?;
        for (name, value) in self.entries() {
            map.serialize_entry(name, &value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::PacketFormat;
    use crate::packet::{DatagramBuilder, PacketDecoder};
    use chrono::NaiveDate;

    fn captured_at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_micro_opt(18, 4, 11, 250031)
            .unwrap()
    }

    fn sample_bytes() -> Vec<u8> {
        let mut builder = DatagramBuilder::new(PacketFormat::Horizon);
        builder
            .race_on(true)
            .set("speed", 42.25f32)
            .unwrap()
            .set("gear", 3u8)
            .unwrap();
        builder.build()
    }

    #[test]
    fn test_capture_timestamp_format() {
        let decoder = PacketDecoder::new(PacketFormat::Horizon);
        let bytes = sample_bytes();
        let packet = decoder.decode(&bytes).unwrap();

        let record = TelemetryRecord::capture(&packet, &["speed"], captured_at()).unwrap();
        assert_eq!(record.timestamp(), "2024-05-01 18:04:11.250031");
    }

    #[test]
    fn test_capture_all_fields() {
        let decoder = PacketDecoder::new(PacketFormat::Horizon);
        let fields = decoder.available_fields();
        let bytes = sample_bytes();
        let packet = decoder.decode(&bytes).unwrap();

        let record = TelemetryRecord::capture(&packet, &fields, captured_at()).unwrap();
        assert_eq!(record.entry_count(), fields.len() + 1);
        assert_eq!(record.get("speed"), Some(FieldValue::Float(42.25)));
        assert_eq!(record.get("gear"), Some(FieldValue::UInt(3)));
        assert_eq!(record.get("is_race_on"), Some(FieldValue::Int(1)));
        assert_eq!(record.get(TIMESTAMP_FIELD), None);
    }

    #[test]
    fn test_capture_no_fields_keeps_timestamp() {
        let decoder = PacketDecoder::new(PacketFormat::Sled);
        let bytes = DatagramBuilder::new(PacketFormat::Sled).build();
        let packet = decoder.decode(&bytes).unwrap();

        let record = TelemetryRecord::capture(&packet, &[], captured_at()).unwrap();
        assert_eq!(record.entry_count(), 1);
        assert_eq!(
            record.to_json().unwrap(),
            r#"{"timestamp":"2024-05-01 18:04:11.250031"}"#
        );
    }

    #[test]
    fn test_capture_unknown_field() {
        let decoder = PacketDecoder::new(PacketFormat::Sled);
        let bytes = DatagramBuilder::new(PacketFormat::Sled).build();
        let packet = decoder.decode(&bytes).unwrap();

        let err = TelemetryRecord::capture(&packet, &["lap_no"], captured_at()).unwrap_err();
        assert_eq!(err, DecodeError::UnknownField("lap_no".to_string()));
    }

    #[test]
    fn test_json_preserves_order_and_stringifies() {
        let decoder = PacketDecoder::new(PacketFormat::Horizon);
        let bytes = sample_bytes();
        let packet = decoder.decode(&bytes).unwrap();

        let record =
            TelemetryRecord::capture(&packet, &["speed", "is_race_on", "gear"], captured_at())
                .unwrap();
        assert_eq!(
            record.to_json().unwrap(),
            r#"{"speed":"42.250000","is_race_on":"1","gear":"3","timestamp":"2024-05-01 18:04:11.250031"}"#
        );
    }

    #[test]
    fn test_json_bytes_match_string() {
        let decoder = PacketDecoder::new(PacketFormat::Horizon);
        let bytes = sample_bytes();
        let packet = decoder.decode(&bytes).unwrap();

        let record = TelemetryRecord::capture(&packet, &["gear"], captured_at()).unwrap();
        assert_eq!(
            record.to_json_bytes().unwrap(),
            record.to_json().unwrap().into_bytes()
        );
    }

    #[test]
    fn test_entries_timestamp_last() {
        let decoder = PacketDecoder::new(PacketFormat::Horizon);
        let bytes = sample_bytes();
        let packet = decoder.decode(&bytes).unwrap();

        let record = TelemetryRecord::capture(&packet, &["gear", "speed"], captured_at()).unwrap();
        let names: Vec<&str> = record.entries().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["gear", "speed", "timestamp"]);
    }
}
