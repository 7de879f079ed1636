//! Sensor data types shared by the format decoders and the slot tracker

use serde::Serialize;

/// Maximum on-air message size in bytes accepted by the receive path.
pub const MSG_BUF_SIZE: usize = 27;

/// Rain gauge accumulator overflow threshold of the 5-in-1 format (mm).
pub const WEATHER0_RAIN_OV: u32 = 1000;

/// Rain gauge accumulator overflow threshold of the 6-in-1/7-in-1 formats (mm).
pub const WEATHER1_RAIN_OV: u32 = 100_000;

/// Sensor type codes as transmitted in the radio messages.
///
/// Code 9 is shared between the professional rain gauge (5-in-1 format)
/// and the lightning sensor; the accepting decoder disambiguates.
pub mod sensor_type {
    pub const WEATHER0: u8 = 0;
    pub const WEATHER1: u8 = 1;
    pub const THERMO_HYGRO: u8 = 2;
    pub const POOL_THERMO: u8 = 3;
    pub const SOIL: u8 = 4;
    pub const LEAKAGE: u8 = 5;
    pub const AIR_PM: u8 = 8;
    pub const RAIN: u8 = 9;
    pub const LIGHTNING: u8 = 9;
}

/// Channel wildcard for type lookups.
pub const CHANNEL_ANY: u8 = 0xff;

/// Result of one decode attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeStatus {
    /// Fully decoded and recorded (for split formats: the half present)
    Ok,
    /// Buffer length matches no known format, or structure unrecognizable
    Invalid,
    /// Per-byte parity/inversion check failed
    ParityError,
    /// CRC-16 or bit-count checksum mismatch
    ChecksumError,
    /// LFSR digest-16 mismatch
    DigestError,
    /// Sensor ID filtered out by policy, or format configured out
    Skip,
    /// Unknown sensor ID and no free slot in the pool
    Full,
}

/// Weather station reading (5-in-1/6-in-1/7-in-1)
///
/// Fields not carried by the transmitting format, or absent from the
/// sub-message at hand, stay `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Weather {
    /// Temperature in degC
    pub temp_c: Option<f32>,
    /// Relative humidity in %
    pub humidity: Option<u8>,
    /// Wind gust speed in m/s
    pub wind_gust_ms: Option<f32>,
    /// Average wind speed in m/s
    pub wind_avg_ms: Option<f32>,
    /// Wind direction in deg
    pub wind_dir_deg: Option<f32>,
    /// Rain gauge level in mm (reported as-is; wraps at the format's
    /// overflow threshold, wraparound detection is the caller's concern)
    pub rain_mm: Option<f32>,
    /// UV index (6-in-1/7-in-1 only)
    pub uv: Option<f32>,
    /// Light in klx (7-in-1 only)
    pub light_klx: Option<f32>,
    /// Light in lux (7-in-1 only)
    pub light_lux: Option<f32>,
}

/// Soil probe reading (6-in-1 format)
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Soil {
    /// Temperature in degC
    pub temp_c: f32,
    /// Moisture in %
    pub moisture: u8,
}

/// Lightning sensor reading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Lightning {
    /// Strike distance in km
    pub distance_km: u8,
    /// Strike counter (12-bit, wraps)
    pub strike_count: u16,
    /// Undocumented field, preserved raw
    pub unknown1: u16,
    /// Undocumented field, preserved raw
    pub unknown2: u16,
}

/// Water leakage sensor reading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Leakage {
    /// Water leakage alarm active
    pub alarm: bool,
}

/// Air quality (particulate matter) sensor reading (7-in-1 format)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AirPm {
    /// PM2.5 concentration in ug/m3
    pub pm_2_5: u16,
    /// PM10 concentration in ug/m3
    pub pm_10: u16,
}

/// Typed payload of a sensor slot, selected by sensor type at decode time.
///
/// Constructed whole by the accepting decoder, so reading a variant that
/// does not match the slot's recorded type is impossible.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Measurement {
    Weather(Weather),
    Soil(Soil),
    Lightning(Lightning),
    Leakage(Leakage),
    AirPm(AirPm),
}

/// One tracked sensor: identity, status flags and the most recent reading
#[derive(Debug, Clone)]
pub struct Slot {
    /// Sensor ID as transmitted (1-4 bytes depending on format)
    pub id: u32,
    /// Sensor type code
    pub s_type: u8,
    /// Channel number
    pub chan: u8,
    /// Signal strength of the most recent accepted message in dBm
    pub rssi: f32,
    /// Sensor reported a power-on/reset event
    pub startup: bool,
    /// Battery o.k.
    pub battery_ok: bool,
    /// Slot holds at least a partially decoded reading
    pub valid: bool,
    /// All sub-messages merged (split formats; always set with `valid`
    /// for single-message formats)
    pub complete: bool,
    /// Typed reading, `None` until the first successful decode
    pub data: Option<Measurement>,
}

impl Slot {
    /// A well-defined empty slot, constructed field by field.
    pub fn empty() -> Self {
        Self {
            id: 0,
            s_type: 0,
            chan: 0,
            rssi: 0.0,
            startup: false,
            battery_ok: false,
            valid: false,
            complete: false,
            data: None,
        }
    }

    /// Drop the validity flags, keeping payload bytes in place.
    ///
    /// Stale values stay invisible to callers relying on `valid` but are
    /// still in memory until overwritten.
    pub fn invalidate(&mut self) {
        self.valid = false;
        self.complete = false;
    }
}

impl Default for Slot {
    fn default() -> Self {
        Self::empty()
    }
}

/// Mapping of a sensor ID to a human-readable name (e.g. for MQTT topics)
#[derive(Debug, Clone)]
pub struct SensorName {
    /// ID of sensor (as transmitted in the radio message)
    pub id: u32,
    /// Name of sensor
    pub name: String,
}
