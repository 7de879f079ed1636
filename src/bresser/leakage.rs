//! Bresser water leakage sensor decoder
//!
//! 10-byte message, CRC-16 protected (polynomial 0x1021, initial 0x0000)
//! over bytes 2..10, with the expected value in bytes 0-1. Shares its
//! length with the lightning format; the integrity checks disambiguate.
//!
//! Data layout:
//!
//! ```text
//!     CRC:8h8h ID:8h8h8h8h STYPE:4h STARTUP:1b CH:3d
//!     ALARM:1b NOALARM:1b BATT:1b ?5b ?8h8h
//! ```
//!
//! The alarm bit and its inverse must disagree and the channel must be
//! non-zero, otherwise the frame is rejected as foreign traffic.

use tracing::debug;

use super::checksum;
use super::types::{sensor_type, DecodeStatus, Leakage, Measurement};
use super::{log_payload, PayloadDecoder};
use crate::tracker::SlotTracker;

const MESSAGE_LEN: usize = 10;

pub struct LeakageDecoder;

impl PayloadDecoder for LeakageDecoder {
    fn name(&self) -> &'static str {
        "leakage"
    }

    fn decode(&self, msg: &[u8], rssi: f32, tracker: &mut SlotTracker) -> DecodeStatus {
        if msg.len() != MESSAGE_LEN {
            return DecodeStatus::Invalid;
        }

        let chk = u16::from_be_bytes([msg[0], msg[1]]);
        let crc = checksum::crc16(&msg[2..], 0x1021, 0x0000);
        if chk != crc {
            debug!("leakage: CRC16 check failed - [{:04X}] vs [{:04X}]", chk, crc);
            return DecodeStatus::ChecksumError;
        }

        let s_type = msg[6] >> 4;
        let chan = msg[6] & 0x07;
        let alarm = msg[7] & 0x80 != 0;
        let no_alarm = msg[7] & 0x40 != 0;

        // Sanity checks
        if s_type != sensor_type::LEAKAGE || alarm == no_alarm || chan == 0 {
            return DecodeStatus::Invalid;
        }

        log_payload("leakage", msg);

        let id = u32::from_be_bytes([msg[2], msg[3], msg[4], msg[5]]);

        let index = match tracker.find_slot(id) {
            Ok(i) => i,
            Err(status) => return status,
        };

        let slot = tracker.slot_mut(index);
        slot.id = id;
        slot.s_type = s_type;
        slot.chan = chan;
        slot.rssi = rssi;
        slot.startup = msg[6] & 0x08 != 0;
        slot.battery_ok = msg[7] & 0x20 != 0;
        slot.data = Some(Measurement::Leakage(Leakage { alarm }));
        slot.valid = true;
        slot.complete = true; // single-message format

        DecodeStatus::Ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Stamp the CRC into bytes 0-1.
    fn frame(mut msg: [u8; MESSAGE_LEN]) -> Vec<u8> {
        let crc = checksum::crc16(&msg[2..], 0x1021, 0x0000);
        msg[0..2].copy_from_slice(&crc.to_be_bytes());
        msg.to_vec()
    }

    fn alarm_message() -> Vec<u8> {
        frame([
            0x00, 0x00, // CRC, filled by frame()
            0x00, 0x4b, 0x5c, 0x6d, // ID
            0x51, // type 5, no startup, channel 1
            0xa0, // alarm, battery ok
            0x00, 0x00,
        ])
    }

    fn tracker() -> SlotTracker {
        SlotTracker::new(2, vec![], vec![])
    }

    #[test]
    fn test_decode_alarm() {
        let mut tracker = tracker();
        assert_eq!(
            LeakageDecoder.decode(&alarm_message(), -62.0, &mut tracker),
            DecodeStatus::Ok
        );

        let slot = &tracker.slots()[0];
        assert_eq!(slot.id, 0x004b5c6d);
        assert_eq!(slot.s_type, sensor_type::LEAKAGE);
        assert_eq!(slot.chan, 1);
        assert!(slot.valid && slot.complete);
        assert!(slot.battery_ok);
        assert_eq!(slot.data, Some(Measurement::Leakage(Leakage { alarm: true })));
    }

    #[test]
    fn test_decode_all_clear() {
        // Channel 3, no-alarm bit, battery ok
        let msg = frame([
            0x00, 0x00, 0x00, 0x4b, 0x5c, 0x6d, 0x53, 0x60, 0x00, 0x00,
        ]);

        let mut tracker = tracker();
        assert_eq!(
            LeakageDecoder.decode(&msg, 0.0, &mut tracker),
            DecodeStatus::Ok
        );
        assert_eq!(
            tracker.slots()[0].data,
            Some(Measurement::Leakage(Leakage { alarm: false }))
        );
        assert_eq!(tracker.slots()[0].chan, 3);
    }

    #[test]
    fn test_contradictory_alarm_bits_rejected() {
        let msg = frame([
            0x00, 0x00, 0x00, 0x4b, 0x5c, 0x6d, 0x51, 0xc0, 0x00, 0x00,
        ]);
        let mut tracker = tracker();
        assert_eq!(
            LeakageDecoder.decode(&msg, 0.0, &mut tracker),
            DecodeStatus::Invalid
        );
    }

    #[test]
    fn test_corrupted_crc() {
        let mut msg = alarm_message();
        msg[4] ^= 0x01;
        let mut tracker = tracker();
        assert_eq!(
            LeakageDecoder.decode(&msg, 0.0, &mut tracker),
            DecodeStatus::ChecksumError
        );
        assert_eq!(tracker.occupied(), 0);
    }
}
