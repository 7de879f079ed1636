//! Bresser 7-in-1 decoder
//!
//! 23-byte message, whitened with 0xAA on the wire. After de-whitening,
//! bytes 0-1 XORed with an LFSR digest (generator 0x8810, key 0xba95)
//! over bytes 2..23 must equal 0x6df1. The same frame is used by the
//! air quality (particulate matter) sensor, which reuses the rain field
//! positions for its concentrations.
//!
//! Data layout (after de-whitening):
//!
//! ```text
//!     DIGEST:8h8h ID:8h8h DIR:8h4h STARTUP:1b BATT:1b ?2b STYPE:4h ?1b CH:3d
//!     GUST:8h4h WAVG:4h8h RAIN:8h8h8h ?8h TEMP:8h4h ?4h HUM:8h
//!     LIGHT:8h8h8h UV:8h4h ?4h ?8h
//!
//!     PM2.5:8h8h PM10:8h8h in place of RAIN:8h8h8h ?8h for sensor type 8
//! ```
//!
//! All quantities are BCD: wind in 0.1 m/s, rain in 0.1 mm (wraps at
//! 100000 mm, reported as-is), temperature in 0.1 degC with 10's
//! complement for sub-zero readings, light in lux, UV index in 0.1.

use tracing::debug;

use super::checksum;
use super::types::{sensor_type, AirPm, DecodeStatus, Measurement, Weather};
use super::{log_payload, PayloadDecoder};
use crate::tracker::SlotTracker;

const MESSAGE_LEN: usize = 23;

fn bcd2(byte: u8) -> u32 {
    (byte >> 4) as u32 * 10 + (byte & 0x0f) as u32
}

pub struct SevenInOneDecoder;

impl PayloadDecoder for SevenInOneDecoder {
    fn name(&self) -> &'static str {
        "7in1"
    }

    fn decode(&self, msg: &[u8], rssi: f32, tracker: &mut SlotTracker) -> DecodeStatus {
        if msg.len() != MESSAGE_LEN {
            return DecodeStatus::Invalid;
        }

        // An idle carrier decodes to a whitened all-zero tail
        if msg[21] == 0x00 {
            return DecodeStatus::Invalid;
        }

        // Data de-whitening
        let mut d = [0u8; MESSAGE_LEN];
        for (i, &byte) in msg.iter().enumerate() {
            d[i] = byte ^ 0xaa;
        }

        let chk = u16::from_be_bytes([d[0], d[1]]);
        let digest = checksum::lfsr_digest16(&d[2..], 0x8810, 0xba95);
        if chk ^ digest != 0x6df1 {
            debug!(
                "7in1: digest check failed - [{:04X}] vs [{:04X}] ({:04X})",
                chk,
                digest,
                chk ^ digest
            );
            return DecodeStatus::DigestError;
        }

        log_payload("7in1", &d);

        let id = u16::from_be_bytes([d[2], d[3]]) as u32;
        let startup = d[5] & 0x08 != 0;
        let battery_ok = d[5] & 0x04 == 0;
        let s_type = d[6] >> 4;
        let chan = d[6] & 0x07;

        let index = match tracker.find_slot(id) {
            Ok(i) => i,
            Err(status) => return status,
        };

        let data = if s_type == sensor_type::AIR_PM {
            Measurement::AirPm(AirPm {
                pm_2_5: (bcd2(d[10]) * 100 + bcd2(d[11])) as u16,
                pm_10: (bcd2(d[12]) * 100 + bcd2(d[13])) as u16,
            })
        } else {
            let wdir_raw = bcd2(d[4]) * 10 + (d[5] >> 4) as u32;
            let gust_raw = bcd2(d[7]) * 10 + (d[8] >> 4) as u32;
            let wavg_raw = (d[8] & 0x0f) as u32 * 100 + bcd2(d[9]);
            let rain_raw = bcd2(d[10]) * 10_000 + bcd2(d[11]) * 100 + bcd2(d[12]);
            let temp_raw = (bcd2(d[14]) * 10 + (d[15] >> 4) as u32) as i32;
            let temp_c = if temp_raw > 600 {
                (temp_raw - 1000) as f32 * 0.1
            } else {
                temp_raw as f32 * 0.1
            };
            let lght_raw = bcd2(d[17]) * 10_000 + bcd2(d[18]) * 100 + bcd2(d[19]);
            let uv_raw = bcd2(d[20]) * 10 + (d[21] >> 4) as u32;

            Measurement::Weather(Weather {
                temp_c: Some(temp_c),
                humidity: Some(bcd2(d[16]) as u8),
                wind_gust_ms: Some(gust_raw as f32 * 0.1),
                wind_avg_ms: Some(wavg_raw as f32 * 0.1),
                wind_dir_deg: Some(wdir_raw as f32),
                rain_mm: Some(rain_raw as f32 * 0.1),
                uv: Some(uv_raw as f32 * 0.1),
                light_klx: Some(lght_raw as f32 * 0.001),
                light_lux: Some(lght_raw as f32),
            })
        };

        let slot = tracker.slot_mut(index);
        slot.id = id;
        slot.s_type = s_type;
        slot.chan = chan;
        slot.rssi = rssi;
        slot.startup = startup;
        slot.battery_ok = battery_ok;
        slot.data = Some(data);
        slot.valid = true;
        slot.complete = true; // single-message format

        DecodeStatus::Ok
    }
}
