//! Bresser 5-in-1 weather station decoder
//!
//! 26-byte message. The first 13 bytes are the bit-inverse of the last 13;
//! byte 13 carries the count of set bits in bytes 14..26. Also covers the
//! professional rain gauge, which transmits the same frame with sensor
//! type 9 and meaningful temperature/rain fields only.
//!
//! Data layout (bytes 13..26):
//!
//! ```text
//!     CHK:8d ID:8h STARTUP:1b ?3b STYPE:4h GUST:8h DIR:4h GUST:4h
//!     WAVG:8h ?4h WAVG:4h TEMP:8h ?4h TEMP:4h HUM:8h RAIN:8h8h BATT:1b ?3b SIGN:4h
//! ```
//!
//! Wind gust is plain binary in 0.1 m/s with its top nibble out of
//! sequence; wind average, temperature, humidity and rain are BCD. The
//! temperature sign nibble is separate from the magnitude nibbles. The
//! rain accumulator wraps at 1000 mm and is reported as-is.

use tracing::debug;

use super::types::{sensor_type, DecodeStatus, Measurement, Weather};
use super::{log_payload, PayloadDecoder};
use crate::tracker::SlotTracker;

const MESSAGE_LEN: usize = 26;

pub struct FiveInOneDecoder;

impl PayloadDecoder for FiveInOneDecoder {
    fn name(&self) -> &'static str {
        "5in1"
    }

    fn decode(&self, msg: &[u8], rssi: f32, tracker: &mut SlotTracker) -> DecodeStatus {
        if msg.len() != MESSAGE_LEN {
            return DecodeStatus::Invalid;
        }

        // First 13 bytes must match the inverse of the last 13
        for col in 0..MESSAGE_LEN / 2 {
            if msg[col] ^ msg[col + 13] != 0xff {
                debug!("5in1: parity wrong at column {}", col);
                return DecodeStatus::ParityError;
            }
        }

        // Verify checksum (number of bits set in bytes 14..26)
        let bits_set: u32 = msg[14..].iter().map(|b| b.count_ones()).sum();
        if bits_set != msg[13] as u32 {
            debug!(
                "5in1: checksum wrong - actual [{:02X}] != [{:02X}]",
                bits_set, msg[13]
            );
            return DecodeStatus::ChecksumError;
        }

        log_payload("5in1", msg);

        let id = msg[14] as u32;
        let s_type = msg[15] & 0x0f;

        let mut temp_raw =
            (msg[20] & 0x0f) as i32 + ((msg[20] >> 4) as i32) * 10 + ((msg[21] & 0x0f) as i32) * 100;
        if msg[25] & 0x0f != 0 {
            temp_raw = -temp_raw;
        }
        let temp_c = temp_raw as f32 * 0.1;

        let humidity = (msg[22] & 0x0f) + (msg[22] >> 4) * 10;

        let wind_dir_deg = (msg[17] >> 4) as f32 * 22.5;
        let gust_raw = (((msg[17] & 0x0f) as u32) << 8) | msg[16] as u32;
        let wavg_raw =
            (msg[18] & 0x0f) as u32 + ((msg[18] >> 4) as u32) * 10 + ((msg[19] & 0x0f) as u32) * 100;

        let rain_raw = (msg[23] & 0x0f) as u32
            + ((msg[23] >> 4) as u32) * 10
            + ((msg[24] & 0x0f) as u32) * 100
            + ((msg[24] >> 4) as u32) * 1000;
        let rain_mm = rain_raw as f32 * 0.1;

        let index = match tracker.find_slot(id) {
            Ok(i) => i,
            Err(status) => return status,
        };

        // The rain gauge variant carries no meaningful wind or humidity
        let weather = if s_type == sensor_type::RAIN {
            Weather {
                temp_c: Some(temp_c),
                rain_mm: Some(rain_mm),
                ..Weather::default()
            }
        } else {
            Weather {
                temp_c: Some(temp_c),
                humidity: Some(humidity),
                wind_gust_ms: Some(gust_raw as f32 * 0.1),
                wind_avg_ms: Some(wavg_raw as f32 * 0.1),
                wind_dir_deg: Some(wind_dir_deg),
                rain_mm: Some(rain_mm),
                ..Weather::default()
            }
        };

        let slot = tracker.slot_mut(index);
        slot.id = id;
        slot.s_type = s_type;
        slot.chan = 0; // format carries no channel
        slot.rssi = rssi;
        slot.startup = msg[15] & 0x80 == 0; // cleared until ~1h after reset
        slot.battery_ok = msg[25] & 0x80 == 0;
        slot.data = Some(Measurement::Weather(weather));
        slot.valid = true;
        slot.complete = true; // single-message format

        DecodeStatus::Ok
    }
}
