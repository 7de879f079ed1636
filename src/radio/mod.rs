//! Radio transceiver boundary
//!
//! The decoding core does not talk to radio hardware itself: it only
//! needs something that, within a bounded time budget, yields either
//! "nothing yet" or a raw byte buffer with its signal strength. Anything
//! satisfying [`Transceiver`] will do - a driver for an FSK module, a
//! replay of recorded frames, or a test channel.

pub mod replay;

use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError};
use thiserror::Error;

pub use replay::ReplaySource;

/// One raw message as delivered by the radio: payload bytes plus the
/// received signal strength in dBm.
#[derive(Debug, Clone)]
pub struct RxFrame {
    pub data: Vec<u8>,
    pub rssi: f32,
}

/// Radio driver failures surfaced to the caller
#[derive(Debug, Error)]
pub enum RadioError {
    #[error("radio module initialization failed: {0}")]
    Init(String),
    #[error("frame source disconnected")]
    Disconnected,
}

/// Bounded-time frame source.
pub trait Transceiver {
    /// Presence check and initialization of the radio module.
    fn begin(&mut self) -> Result<(), RadioError>;

    /// Try to receive one frame within `budget`. `Ok(None)` means nothing
    /// arrived in time; the caller decides whether to retry.
    fn receive(&mut self, budget: Duration) -> Result<Option<RxFrame>, RadioError>;

    /// Whether the frame source is still able to deliver data.
    fn is_running(&self) -> bool {
        true
    }
}

/// Channel-backed transceiver: frames are produced elsewhere (a capture
/// thread, a replay reader, a test) and consumed here with a per-call
/// timeout.
pub struct ChannelRadio {
    rx: Receiver<RxFrame>,
    disconnected: bool,
}

impl ChannelRadio {
    pub fn new(rx: Receiver<RxFrame>) -> Self {
        Self {
            rx,
            disconnected: false,
        }
    }
}

impl Transceiver for ChannelRadio {
    fn begin(&mut self) -> Result<(), RadioError> {
        Ok(())
    }

    fn receive(&mut self, budget: Duration) -> Result<Option<RxFrame>, RadioError> {
        match self.rx.recv_timeout(budget) {
            Ok(frame) => Ok(Some(frame)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => {
                self.disconnected = true;
                Err(RadioError::Disconnected)
            }
        }
    }

    fn is_running(&self) -> bool {
        !self.disconnected
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::bounded;

    #[test]
    fn test_channel_radio_delivers_then_times_out() {
        let (tx, rx) = bounded(4);
        let mut radio = ChannelRadio::new(rx);
        radio.begin().unwrap();

        tx.send(RxFrame {
            data: vec![0xab, 0xcd],
            rssi: -70.0,
        })
        .unwrap();

        let frame = radio
            .receive(Duration::from_millis(10))
            .unwrap()
            .expect("frame");
        assert_eq!(frame.data, vec![0xab, 0xcd]);

        // Empty channel: bounded wait, then "nothing yet"
        assert!(radio.receive(Duration::from_millis(5)).unwrap().is_none());
        assert!(radio.is_running());
    }

    #[test]
    fn test_channel_radio_reports_disconnect() {
        let (tx, rx) = bounded::<RxFrame>(1);
        let mut radio = ChannelRadio::new(rx);
        drop(tx);

        assert!(matches!(
            radio.receive(Duration::from_millis(5)),
            Err(RadioError::Disconnected)
        ));
        assert!(!radio.is_running());
    }
}
