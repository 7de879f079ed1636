//! Bresser 6-in-1 decoder
//!
//! 18-byte message, shared by the 6-in-1 weather station, the professional
//! wind gauge, the thermo-/hygro sensor, the pool thermometer and the soil
//! probe. Bytes 0-1 carry an LFSR digest (generator 0x8810, key 0x5412)
//! over bytes 2..17; the byte sum over bytes 2..18 must end in 0xff.
//!
//! Data layout:
//!
//! ```text
//!     DIGEST:8h8h ID:8h8h8h8h STYPE:4h STARTUP:1b CH:3d
//!     GUST:~8h~4h WAVG:~4h~8h DIR:8h4h ?4h
//!     TEMP:8h4h ?2b BATT:1b ?1b HUM:8h UV:~8h~4h FLAGS:4h CHKSUM:8h
//! ```
//!
//! A weather station splits one logical reading across two messages:
//! bytes 12..15 hold temperature/humidity (FLAGS 0) or the inverted-BCD
//! rain counter (FLAGS 1); wind is carried in every message. The reading
//! is complete once both halves have been merged. Negative temperatures
//! are 10's complement (raw values above 600 fold down by 1000). The rain
//! accumulator wraps at 100000 mm and is reported as-is.
//!
//! The soil probe transmits moisture as an index 1..16 into a fixed
//! percentage table in the humidity field.

use tracing::debug;

use super::checksum;
use super::types::{sensor_type, DecodeStatus, Measurement, Soil, Weather};
use super::{log_payload, PayloadDecoder};
use crate::tracker::SlotTracker;

const MESSAGE_LEN: usize = 18;

/// Moisture percentage by transmitted index (scale is 20/3).
const MOISTURE_MAP: [u8; 16] = [0, 7, 13, 20, 27, 33, 40, 47, 53, 60, 67, 73, 80, 87, 93, 99];

fn bcd_valid(byte: u8) -> bool {
    byte & 0x0f <= 9 && byte >> 4 <= 9
}

pub struct SixInOneDecoder;

impl PayloadDecoder for SixInOneDecoder {
    fn name(&self) -> &'static str {
        "6in1"
    }

    fn decode(&self, msg: &[u8], rssi: f32, tracker: &mut SlotTracker) -> DecodeStatus {
        if msg.len() != MESSAGE_LEN {
            return DecodeStatus::Invalid;
        }

        let chk = u16::from_be_bytes([msg[0], msg[1]]);
        let digest = checksum::lfsr_digest16(&msg[2..17], 0x8810, 0x5412);
        if chk != digest {
            debug!("6in1: digest check failed - [{:04X}] vs [{:04X}]", chk, digest);
            return DecodeStatus::DigestError;
        }

        if checksum::add_bytes(&msg[2..18]) & 0xff != 0xff {
            debug!("6in1: checksum failed");
            return DecodeStatus::ChecksumError;
        }

        log_payload("6in1", msg);

        let id = u32::from_be_bytes([msg[2], msg[3], msg[4], msg[5]]);
        let s_type = msg[6] >> 4;
        let startup = msg[6] & 0x08 != 0;
        let chan = msg[6] & 0x07;
        let flags = msg[16] & 0x0f;

        // Wind is carried in every message, inverted BCD
        let w7 = !msg[7];
        let w8 = !msg[8];
        let w9 = !msg[9];
        let wind_ok = bcd_valid(w7) && bcd_valid(w8) && bcd_valid(w9);
        let gust_raw = (w7 >> 4) as u32 * 100 + (w7 & 0x0f) as u32 * 10 + (w8 >> 4) as u32;
        let wavg_raw = (w9 >> 4) as u32 * 100 + (w9 & 0x0f) as u32 * 10 + (w8 & 0x0f) as u32;
        let wdir_raw =
            (msg[10] >> 4) as u32 * 100 + (msg[10] & 0x0f) as u32 * 10 + (msg[11] >> 4) as u32;

        // Temperature/humidity/UV sub-message, only if the BCD digits hold up
        let temp_ok = flags == 0 && bcd_valid(msg[12]) && msg[13] >> 4 <= 9;
        let mut temp_c = 0.0;
        if temp_ok {
            let temp_raw =
                (msg[12] >> 4) as i32 * 100 + (msg[12] & 0x0f) as i32 * 10 + (msg[13] >> 4) as i32;
            // 10's complement for sub-zero readings
            temp_c = if temp_raw > 600 {
                (temp_raw - 1000) as f32 * 0.1
            } else {
                temp_raw as f32 * 0.1
            };
        }
        let battery_ok = msg[13] & 0x02 != 0;
        let hum_ok = bcd_valid(msg[14]);
        let hum_raw = (msg[14] >> 4) * 10 + (msg[14] & 0x0f);

        // UV is inverted BCD; sensors without UV send patterns whose
        // inverse fails the digit check
        let u15 = !msg[15];
        let u16_hi = !msg[16] >> 4;
        let uv_ok = temp_ok && bcd_valid(u15) && u16_hi <= 9;
        let uv_raw = (u15 >> 4) as u32 * 100 + (u15 & 0x0f) as u32 * 10 + u16_hi as u32;

        // Rain sub-message reuses bytes 12..15, inverted BCD
        let r12 = !msg[12];
        let r13 = !msg[13];
        let r14 = !msg[14];
        let rain_ok = flags == 1 && bcd_valid(r12) && bcd_valid(r13) && bcd_valid(r14);
        let rain_raw = (r12 >> 4) as u32 * 100_000
            + (r12 & 0x0f) as u32 * 10_000
            + (r13 >> 4) as u32 * 1000
            + (r13 & 0x0f) as u32 * 100
            + (r14 >> 4) as u32 * 10
            + (r14 & 0x0f) as u32;

        // Structural sanity for the single-message sensor kinds
        match s_type {
            sensor_type::SOIL => {
                if !temp_ok || !(1..=16).contains(&hum_raw) {
                    return DecodeStatus::Invalid;
                }
            }
            sensor_type::THERMO_HYGRO | sensor_type::POOL_THERMO => {
                if !temp_ok {
                    return DecodeStatus::Invalid;
                }
            }
            _ => {}
        }

        let index = match tracker.find_slot(id) {
            Ok(i) => i,
            Err(status) => return status,
        };
        let slot = tracker.slot_mut(index);
        let fresh = !slot.valid;

        match s_type {
            sensor_type::SOIL => {
                slot.data = Some(Measurement::Soil(Soil {
                    temp_c,
                    moisture: MOISTURE_MAP[hum_raw as usize - 1],
                }));
                slot.complete = true;
            }
            sensor_type::THERMO_HYGRO | sensor_type::POOL_THERMO => {
                slot.data = Some(Measurement::Weather(Weather {
                    temp_c: Some(temp_c),
                    humidity: (s_type == sensor_type::THERMO_HYGRO && hum_ok).then_some(hum_raw),
                    ..Weather::default()
                }));
                slot.complete = true;
            }
            _ => {
                // Weather station: merge this half into whatever the slot
                // already holds for the ID (nothing, after a clear)
                let mut weather = if fresh {
                    Weather::default()
                } else {
                    match &slot.data {
                        Some(Measurement::Weather(w)) => w.clone(),
                        _ => Weather::default(),
                    }
                };

                if wind_ok {
                    weather.wind_gust_ms = Some(gust_raw as f32 * 0.1);
                    weather.wind_avg_ms = Some(wavg_raw as f32 * 0.1);
                    weather.wind_dir_deg = Some(wdir_raw as f32);
                }
                if temp_ok {
                    weather.temp_c = Some(temp_c);
                    if hum_ok {
                        weather.humidity = Some(hum_raw);
                    }
                    if uv_ok {
                        weather.uv = Some(uv_raw as f32 * 0.1);
                    }
                }
                if rain_ok {
                    weather.rain_mm = Some(rain_raw as f32 * 0.1);
                }

                slot.complete = weather.temp_c.is_some() && weather.rain_mm.is_some();
                slot.data = Some(Measurement::Weather(weather));
            }
        }

        slot.id = id;
        slot.s_type = s_type;
        slot.chan = chan;
        slot.rssi = rssi;
        slot.startup = startup;
        if temp_ok {
            // The battery bit shares a byte with the rain counter, so it is
            // only trustworthy in the temperature sub-message
            slot.battery_ok = battery_ok;
        }
        slot.valid = true;

        DecodeStatus::Ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Build a valid frame from bytes 2..17; the checksum byte and the
    /// digest field are stamped with the crate's own primitives.
    fn frame(payload: [u8; 15]) -> Vec<u8> {
        let mut msg = vec![0u8; MESSAGE_LEN];
        msg[2..17].copy_from_slice(&payload);
        msg[17] = 0xff - (checksum::add_bytes(&msg[2..17]) & 0xff) as u8;
        let digest = checksum::lfsr_digest16(&msg[2..17], 0x8810, 0x5412);
        msg[0..2].copy_from_slice(&digest.to_be_bytes());
        msg
    }

    const STATION_ID: u32 = 0x39582a1c;

    /// Temperature/humidity/UV half: 23.1 degC, 45 %, UV 1.3, wind
    /// gust 1.2 m/s, avg 0.8 m/s, direction 135 deg, battery ok.
    fn temp_message() -> Vec<u8> {
        frame([
            0x39, 0x58, 0x2a, 0x1c, // ID
            0x11, // type 1, no startup, channel 1
            !0x01, !0x28, !0x00, // wind, inverted BCD
            0x13, 0x50, // direction 135
            0x23, 0x12, // temp 23.1, battery ok
            0x45, // humidity 45
            !0x01, 0xc0, // UV 1.3 (inverted), flags 0
        ])
    }

    /// Rain half for the same station: 12.3 mm.
    fn rain_message() -> Vec<u8> {
        frame([
            0x39, 0x58, 0x2a, 0x1c, // ID
            0x11, // type 1, no startup, channel 1
            !0x01, !0x28, !0x00, // wind, inverted BCD
            0x13, 0x50, // direction 135
            !0x00, !0x01, !0x23, // rain 12.3 mm, inverted BCD
            0xff, 0xf1, // no UV, flags 1
        ])
    }

    /// Soil probe: 25.9 degC, moisture index 2 (7 %).
    fn soil_message() -> Vec<u8> {
        frame([
            0x18, 0x70, 0x07, 0x93, // ID
            0x42, // type 4, no startup, channel 2
            !0x00, !0x00, !0x00, // no wind
            0x00, 0x00, //
            0x25, 0x92, // temp 25.9, battery ok
            0x02, // moisture index 2
            0x00, 0x00, // no UV, flags 0
        ])
    }

    fn tracker() -> SlotTracker {
        SlotTracker::new(2, vec![], vec![])
    }

    fn close(actual: Option<f32>, expected: f32) -> bool {
        actual.is_some_and(|v| (v - expected).abs() < 0.01)
    }

    #[test]
    fn test_decode_temp_half() {
        let mut tracker = tracker();
        let status = SixInOneDecoder.decode(&temp_message(), -68.0, &mut tracker);
        assert_eq!(status, DecodeStatus::Ok);

        let slot = &tracker.slots()[0];
        assert_eq!(slot.id, STATION_ID);
        assert_eq!(slot.s_type, sensor_type::WEATHER1);
        assert_eq!(slot.chan, 1);
        assert!(slot.valid);
        assert!(!slot.complete, "rain half still missing");
        assert!(slot.battery_ok);

        let Some(Measurement::Weather(w)) = &slot.data else {
            panic!("expected weather payload");
        };
        assert!(close(w.temp_c, 23.1));
        assert_eq!(w.humidity, Some(45));
        assert!(close(w.uv, 1.3));
        assert!(close(w.wind_gust_ms, 1.2));
        assert!(close(w.wind_avg_ms, 0.8));
        assert!(close(w.wind_dir_deg, 135.0));
        assert_eq!(w.rain_mm, None);
    }

    #[test]
    fn test_reassembly_two_halves() {
        let mut tracker = tracker();
        assert_eq!(
            SixInOneDecoder.decode(&temp_message(), 0.0, &mut tracker),
            DecodeStatus::Ok
        );
        assert_eq!(
            SixInOneDecoder.decode(&rain_message(), 0.0, &mut tracker),
            DecodeStatus::Ok
        );

        let slot = &tracker.slots()[0];
        assert!(slot.complete);
        let Some(Measurement::Weather(w)) = &slot.data else {
            panic!("expected weather payload");
        };
        // Fields from the first half survive the merge
        assert!(close(w.temp_c, 23.1));
        assert!(close(w.rain_mm, 12.3));
        assert_eq!(tracker.occupied(), 1);
    }

    #[test]
    fn test_same_half_twice_stays_incomplete() {
        let mut tracker = tracker();
        SixInOneDecoder.decode(&temp_message(), 0.0, &mut tracker);
        SixInOneDecoder.decode(&temp_message(), 0.0, &mut tracker);
        assert!(!tracker.slots()[0].complete);
    }

    #[test]
    fn test_clear_restarts_reassembly() {
        let mut tracker = tracker();
        SixInOneDecoder.decode(&temp_message(), 0.0, &mut tracker);
        tracker.clear_slots(None);

        // Only the rain half after the clear: not complete
        SixInOneDecoder.decode(&rain_message(), 0.0, &mut tracker);
        let slot = &tracker.slots()[0];
        assert!(slot.valid && !slot.complete);
        let Some(Measurement::Weather(w)) = &slot.data else {
            panic!("expected weather payload");
        };
        assert_eq!(w.temp_c, None, "stale half must not leak through a clear");
    }

    #[test]
    fn test_decode_soil_probe() {
        let mut tracker = tracker();
        assert_eq!(
            SixInOneDecoder.decode(&soil_message(), 0.0, &mut tracker),
            DecodeStatus::Ok
        );

        let slot = &tracker.slots()[0];
        assert_eq!(slot.s_type, sensor_type::SOIL);
        assert_eq!(slot.chan, 2);
        assert!(slot.complete, "soil readings fit in one message");
        let Some(Measurement::Soil(soil)) = &slot.data else {
            panic!("expected soil payload");
        };
        assert!((soil.temp_c - 25.9).abs() < 0.01);
        assert_eq!(soil.moisture, 7);
    }

    #[test]
    fn test_negative_temperature_tens_complement() {
        let mut payload = [0u8; 15];
        payload[0..4].copy_from_slice(&STATION_ID.to_be_bytes());
        payload[4] = 0x11;
        payload[5] = !0x00;
        payload[6] = !0x00;
        payload[7] = !0x00;
        payload[10] = 0x98; // raw 988 -> -1.2 degC
        payload[11] = 0x82;
        payload[12] = 0x45;
        payload[13] = !0x00;
        payload[14] = 0xc0;

        let mut tracker = tracker();
        assert_eq!(
            SixInOneDecoder.decode(&frame(payload), 0.0, &mut tracker),
            DecodeStatus::Ok
        );
        let Some(Measurement::Weather(w)) = &tracker.slots()[0].data else {
            panic!("expected weather payload");
        };
        assert!(close(w.temp_c, -1.2));
    }

    #[test]
    fn test_single_bit_flips_never_decode() {
        let good = temp_message();
        let mut tracker = tracker();
        for byte in 0..MESSAGE_LEN {
            for bit in 0..8 {
                let mut msg = good.clone();
                msg[byte] ^= 1 << bit;
                let status = SixInOneDecoder.decode(&msg, 0.0, &mut tracker);
                let expected = if byte == 17 {
                    // Checksum byte is outside the digest range
                    DecodeStatus::ChecksumError
                } else {
                    DecodeStatus::DigestError
                };
                assert_eq!(status, expected, "flip at byte {} bit {}", byte, bit);
            }
        }
        assert_eq!(tracker.occupied(), 0);
    }
}
