//! Bresser lightning sensor decoder
//!
//! 10-byte message, whitened with 0xAA like the 7-in-1. After
//! de-whitening, bytes 0-1 XORed with an LFSR digest (generator 0x8810,
//! key 0xabf9) over bytes 2..10 must equal 0x899e.
//!
//! Data layout (after de-whitening):
//!
//! ```text
//!     DIGEST:8h8h ID:8h8h CTR:8h4h ?4h STYPE:4h STARTUP:1b BATT:1b ?2b
//!     KM:8d ?8h8h
//! ```
//!
//! The strike counter is a wrapping 12-bit value; the two undocumented
//! fields are preserved raw.

use tracing::debug;

use super::checksum;
use super::types::{sensor_type, DecodeStatus, Lightning, Measurement};
use super::{log_payload, PayloadDecoder};
use crate::tracker::SlotTracker;

const MESSAGE_LEN: usize = 10;

pub struct LightningDecoder;

impl PayloadDecoder for LightningDecoder {
    fn name(&self) -> &'static str {
        "lightning"
    }

    fn decode(&self, msg: &[u8], rssi: f32, tracker: &mut SlotTracker) -> DecodeStatus {
        if msg.len() != MESSAGE_LEN {
            return DecodeStatus::Invalid;
        }

        // Data de-whitening
        let mut d = [0u8; MESSAGE_LEN];
        for (i, &byte) in msg.iter().enumerate() {
            d[i] = byte ^ 0xaa;
        }

        let chk = u16::from_be_bytes([d[0], d[1]]);
        let digest = checksum::lfsr_digest16(&d[2..], 0x8810, 0xabf9);
        if chk ^ digest != 0x899e {
            debug!(
                "lightning: digest check failed - [{:04X}] vs [{:04X}] ({:04X})",
                chk,
                digest,
                chk ^ digest
            );
            return DecodeStatus::DigestError;
        }

        let s_type = d[6] >> 4;
        if s_type != sensor_type::LIGHTNING {
            return DecodeStatus::Invalid;
        }

        log_payload("lightning", &d);

        let id = u16::from_be_bytes([d[2], d[3]]) as u32;
        let strike_count = ((d[4] as u16) << 4) | (d[5] >> 4) as u16;

        let index = match tracker.find_slot(id) {
            Ok(i) => i,
            Err(status) => return status,
        };

        let slot = tracker.slot_mut(index);
        slot.id = id;
        slot.s_type = s_type;
        slot.chan = 0; // format carries no channel
        slot.rssi = rssi;
        slot.startup = d[6] & 0x08 != 0;
        slot.battery_ok = d[6] & 0x04 == 0;
        slot.data = Some(Measurement::Lightning(Lightning {
            distance_km: d[7],
            strike_count,
            unknown1: (d[5] & 0x0f) as u16,
            unknown2: u16::from_be_bytes([d[8], d[9]]),
        }));
        slot.valid = true;
        slot.complete = true; // single-message format

        DecodeStatus::Ok
    }
}
