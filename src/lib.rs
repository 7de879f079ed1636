//! Bresser 5-in-1/6-in-1/7-in-1 868 MHz weather sensor receiver
//!
//! Decodes the proprietary FSK telemetry of the Bresser sensor family and
//! tracks per-sensor state across repeated, lossy transmissions:
//! format-specific decoders validate each raw message with the format's
//! CRC-16 or LFSR digest, a fixed pool of slots keeps the last known good
//! reading per sensor ID, and a polling acquisition loop drives reception
//! until a caller-defined completion condition is met.

pub mod bresser;
pub mod config;
pub mod radio;
pub mod receiver;
pub mod tracker;

pub use bresser::types::DecodeStatus;
pub use receiver::{Completion, WeatherReceiver};
pub use tracker::SlotTracker;
