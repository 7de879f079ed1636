//! Acquisition loop
//!
//! Drives repeated receive/decode/track cycles against the radio until an
//! application-defined completion condition holds or a timeout expires.
//! Strictly single-threaded and cooperative: the per-cycle callback is the
//! only reentrancy point.

use std::time::{Duration, Instant};

use tracing::{debug, trace};

use crate::bresser::types::{
    sensor_type, AirPm, DecodeStatus, Leakage, Lightning, Measurement, Slot, Soil, Weather,
};
use crate::bresser::PayloadDecoder;
use crate::radio::{RadioError, Transceiver};
use crate::tracker::SlotTracker;

/// Per-attempt receive budget: a small multiple of the expected on-air
/// time of the longest message.
const RX_BUDGET: Duration = Duration::from_millis(60);

/// Condition that ends an acquisition cycle successfully.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// Any successful decode is sufficient
    Any,
    /// At least one slot fully complete
    AnyComplete,
    /// A complete slot of the given sensor type
    OfType(u8),
    /// Every slot in the pool complete
    AllSlots,
}

/// Receive, decode and track Bresser weather sensor data.
pub struct WeatherReceiver<R: Transceiver> {
    radio: R,
    tracker: SlotTracker,
    decoders: Vec<Box<dyn PayloadDecoder + Send>>,
    /// Signal strength of the most recent reception in dBm
    rssi: f32,
}

impl<R: Transceiver> WeatherReceiver<R> {
    pub fn new(
        radio: R,
        tracker: SlotTracker,
        decoders: Vec<Box<dyn PayloadDecoder + Send>>,
    ) -> Self {
        Self {
            radio,
            tracker,
            decoders,
            rssi: 0.0,
        }
    }

    /// Presence check and initialization of the radio module.
    pub fn begin(&mut self) -> Result<(), RadioError> {
        self.radio.begin()
    }

    /// Wait for reception of data or expiry of `timeout`.
    ///
    /// The optional callback runs once per cycle for cooperative yielding;
    /// returning `false` from it cancels the acquisition early.
    pub fn get_data(
        &mut self,
        timeout: Duration,
        completion: Completion,
        mut callback: Option<&mut dyn FnMut() -> bool>,
    ) -> bool {
        let deadline = Instant::now() + timeout;

        while Instant::now() < deadline {
            let status = self.get_message();

            if let Some(cb) = callback.as_mut() {
                if !cb() {
                    debug!("acquisition cancelled by callback");
                    return false;
                }
            }

            if !self.radio.is_running() {
                debug!("radio stopped during acquisition");
                return false;
            }

            if status == DecodeStatus::Ok {
                let done = match completion {
                    Completion::Any => true,
                    Completion::AnyComplete => self.tracker.any_complete(),
                    Completion::OfType(t) => self.tracker.type_complete(t),
                    Completion::AllSlots => self.tracker.all_complete(),
                };
                if done {
                    return true;
                }
            }
        }

        false
    }

    /// Try to receive one radio message and decode it.
    ///
    /// A reception timeout maps to `Invalid`, like any other buffer no
    /// decoder recognizes.
    pub fn get_message(&mut self) -> DecodeStatus {
        match self.radio.receive(RX_BUDGET) {
            Ok(Some(frame)) => {
                self.rssi = frame.rssi;
                self.decode_message(&frame.data)
            }
            Ok(None) => {
                trace!("rx timeout");
                DecodeStatus::Invalid
            }
            Err(e) => {
                debug!("receive failed: {}", e);
                DecodeStatus::Invalid
            }
        }
    }

    /// Try the active decoders in priority order until one accepts the
    /// buffer.
    ///
    /// Acceptance (`Ok`) and policy denials (`Skip`/`Full`) end the
    /// dispatch; integrity failures fall through to the next format, and
    /// the most specific failure is reported if nothing accepts.
    pub fn decode_message(&mut self, msg: &[u8]) -> DecodeStatus {
        let mut result = DecodeStatus::Invalid;

        for decoder in &self.decoders {
            let status = decoder.decode(msg, self.rssi, &mut self.tracker);
            match status {
                DecodeStatus::Ok | DecodeStatus::Skip | DecodeStatus::Full => {
                    debug!("{}: {:?}", decoder.name(), status);
                    return status;
                }
                DecodeStatus::Invalid => {}
                failure => result = failure,
            }
        }

        result
    }

    /// Fabricate a plausible complete slot entry without any radio input,
    /// for offline testing of everything downstream of reception.
    pub fn gen_message(&mut self, index: usize, id: u32, s_type: u8, chan: u8, startup: bool) {
        let data = match s_type {
            sensor_type::SOIL => Measurement::Soil(Soil {
                temp_c: 19.2,
                moisture: 47,
            }),
            sensor_type::LEAKAGE => Measurement::Leakage(Leakage { alarm: false }),
            sensor_type::AIR_PM => Measurement::AirPm(AirPm {
                pm_2_5: 11,
                pm_10: 19,
            }),
            sensor_type::LIGHTNING => Measurement::Lightning(Lightning {
                distance_km: 9,
                strike_count: 3,
                unknown1: 0,
                unknown2: 0,
            }),
            _ => Measurement::Weather(Weather {
                temp_c: Some(22.4),
                humidity: Some(55),
                wind_gust_ms: Some(3.1),
                wind_avg_ms: Some(1.8),
                wind_dir_deg: Some(180.0),
                rain_mm: Some(12.6),
                ..Weather::default()
            }),
        };

        let slot = self.tracker.slot_mut(index);
        slot.id = id;
        slot.s_type = s_type;
        slot.chan = chan;
        slot.rssi = -88.0;
        slot.startup = startup;
        slot.battery_ok = true;
        slot.data = Some(data);
        slot.valid = true;
        slot.complete = true;
    }

    /// Slot currently holding this sensor ID.
    pub fn find_id(&self, id: u32) -> Option<usize> {
        self.tracker.find_id(id)
    }

    /// First valid slot with this sensor type and channel.
    pub fn find_type(&self, s_type: u8, chan: u8) -> Option<usize> {
        self.tracker.find_type(s_type, chan)
    }

    /// Reset validity flags, for all slots or one sensor type.
    pub fn clear_slots(&mut self, s_type: Option<u8>) {
        self.tracker.clear_slots(s_type)
    }

    /// The tracked slot pool.
    pub fn slots(&self) -> &[Slot] {
        self.tracker.slots()
    }

    /// Signal strength of the most recent reception in dBm.
    pub fn rssi(&self) -> f32 {
        self.rssi
    }

    /// The radio behind this receiver.
    pub fn radio(&self) -> &R {
        &self.radio
    }
}
