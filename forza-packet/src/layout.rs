//! Field layouts for the Forza Data Out packet formats.
//!
//! Every format starts with the "sled" block. The dash format (Forza
//! Motorsport 7) appends the dash block directly; the horizon format
//! (Forza Horizon 4/5) inserts 12 undocumented bytes before the dash block
//! and pads one byte at the end. All values are little-endian.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Primitive encoding of a single field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    I8,
    U8,
    U16,
    I32,
    U32,
    F32,
}

impl FieldKind {
    /// Encoded width in bytes.
    pub const fn size(self) -> usize {
        match self {
            FieldKind::I8 | FieldKind::U8 => 1,
            FieldKind::U16 => 2,
            FieldKind::I32 | FieldKind::U32 | FieldKind::F32 => 4,
        }
    }
}

use FieldKind::{F32, I32, I8, U16, U32, U8};

const SLED_FIELDS: &[(&str, FieldKind)] = &[
    ("is_race_on", I32),
    ("timestamp_ms", U32),
    ("engine_max_rpm", F32),
    ("engine_idle_rpm", F32),
    ("current_engine_rpm", F32),
    ("acceleration_x", F32),
    ("acceleration_y", F32),
    ("acceleration_z", F32),
    ("velocity_x", F32),
    ("velocity_y", F32),
    ("velocity_z", F32),
    ("angular_velocity_x", F32),
    ("angular_velocity_y", F32),
    ("angular_velocity_z", F32),
    ("yaw", F32),
    ("pitch", F32),
    ("roll", F32),
    ("norm_suspension_travel_fl", F32),
    ("norm_suspension_travel_fr", F32),
    ("norm_suspension_travel_rl", F32),
    ("norm_suspension_travel_rr", F32),
    ("tire_slip_ratio_fl", F32),
    ("tire_slip_ratio_fr", F32),
    ("tire_slip_ratio_rl", F32),
    ("tire_slip_ratio_rr", F32),
    ("wheel_rotation_speed_fl", F32),
    ("wheel_rotation_speed_fr", F32),
    ("wheel_rotation_speed_rl", F32),
    ("wheel_rotation_speed_rr", F32),
    ("wheel_on_rumble_strip_fl", I32),
    ("wheel_on_rumble_strip_fr", I32),
    ("wheel_on_rumble_strip_rl", I32),
    ("wheel_on_rumble_strip_rr", I32),
    ("wheel_in_puddle_fl", F32),
    ("wheel_in_puddle_fr", F32),
    ("wheel_in_puddle_rl", F32),
    ("wheel_in_puddle_rr", F32),
    ("surface_rumble_fl", F32),
    ("surface_rumble_fr", F32),
    ("surface_rumble_rl", F32),
    ("surface_rumble_rr", F32),
    ("tire_slip_angle_fl", F32),
    ("tire_slip_angle_fr", F32),
    ("tire_slip_angle_rl", F32),
    ("tire_slip_angle_rr", F32),
    ("tire_combined_slip_fl", F32),
    ("tire_combined_slip_fr", F32),
    ("tire_combined_slip_rl", F32),
    ("tire_combined_slip_rr", F32),
    ("suspension_travel_meters_fl", F32),
    ("suspension_travel_meters_fr", F32),
    ("suspension_travel_meters_rl", F32),
    ("suspension_travel_meters_rr", F32),
    ("car_ordinal", I32),
    ("car_class", I32),
    ("car_performance_index", I32),
    ("drivetrain_type", I32),
    ("num_cylinders", I32),
];

const DASH_FIELDS: &[(&str, FieldKind)] = &[
    ("position_x", F32),
    ("position_y", F32),
    ("position_z", F32),
    ("speed", F32),
    ("power", F32),
    ("torque", F32),
    ("tire_temp_fl", F32),
    ("tire_temp_fr", F32),
    ("tire_temp_rl", F32),
    ("tire_temp_rr", F32),
    ("boost", F32),
    ("fuel", F32),
    ("dist_traveled", F32),
    ("best_lap_time", F32),
    ("last_lap_time", F32),
    ("cur_lap_time", F32),
    ("cur_race_time", F32),
    ("lap_no", U16),
    ("race_pos", U8),
    ("accel", U8),
    ("brake", U8),
    ("clutch", U8),
    ("handbrake", U8),
    ("gear", U8),
    ("steer", I8),
    ("norm_driving_line", I8),
    ("norm_ai_brake_diff", I8),
];

/// Undocumented bytes between the sled and dash blocks in horizon packets.
const HORIZON_GAP: usize = 12;

/// Trailing pad byte in horizon packets.
const HORIZON_TAIL: usize = 1;

/// Error parsing a packet format name.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown packet format '{0}' (expected sled, dash or horizon)")]
pub struct ParseFormatError(pub String);

/// Supported Data Out packet formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PacketFormat {
    /// Sled block only (232 bytes).
    Sled,
    /// Forza Motorsport 7 dash (311 bytes).
    Dash,
    /// Forza Horizon 4/5 dash (324 bytes).
    #[default]
    Horizon,
}

impl PacketFormat {
    pub const ALL: [PacketFormat; 3] = [PacketFormat::Sled, PacketFormat::Dash, PacketFormat::Horizon];

    pub fn name(self) -> &'static str {
        match self {
            PacketFormat::Sled => "sled",
            PacketFormat::Dash => "dash",
            PacketFormat::Horizon => "horizon",
        }
    }
}

impl fmt::Display for PacketFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PacketFormat {
    type Err = ParseFormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PacketFormat::ALL
            .into_iter()
            .find(|format| format.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| ParseFormatError(s.to_string()))
    }
}

/// A field placed at a fixed byte offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDef {
    pub name: &'static str,
    pub kind: FieldKind,
    pub offset: usize,
}

/// Resolved layout of one packet format.
#[derive(Debug, Clone)]
pub struct Layout {
    format: PacketFormat,
    fields: Vec<FieldDef>,
    index: HashMap<&'static str, usize>,
    packet_len: usize,
}

impl Layout {
    /// Build the layout for `format`.
    pub fn new(format: PacketFormat) -> Self {
        let mut fields = Vec::with_capacity(SLED_FIELDS.len() + DASH_FIELDS.len());
        let mut offset = place(&mut fields, SLED_FIELDS, 0);

        match format {
            PacketFormat::Sled => {}
            PacketFormat::Dash => {
                offset = place(&mut fields, DASH_FIELDS, offset);
            }
            PacketFormat::Horizon => {
                offset = place(&mut fields, DASH_FIELDS, offset + HORIZON_GAP) + HORIZON_TAIL;
            }
        }

        let index = fields
            .iter()
            .enumerate()
            .map(|(i, field)| (field.name, i))
            .collect();

        Self {
            format,
            fields,
            index,
            packet_len: offset,
        }
    }

    pub fn format(&self) -> PacketFormat {
        self.format
    }

    /// Fixed datagram length for this format.
    pub fn packet_len(&self) -> usize {
        self.packet_len
    }

    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    /// Field names in wire order.
    pub fn field_names(&self) -> Vec<&'static str> {
        self.fields.iter().map(|field| field.name).collect()
    }

    /// Position of `name` in wire order.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.position(name).map(|i| &self.fields[i])
    }
}

fn place(fields: &mut Vec<FieldDef>, block: &[(&'static str, FieldKind)], start: usize) -> usize {
    block.iter().fold(start, |offset, &(name, kind)| {
        fields.push(FieldDef { name, kind, offset });
        offset + kind.size()
    })
}
