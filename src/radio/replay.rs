//! Frame replay source
//!
//! Reads hex-encoded raw messages from any line-oriented input (a capture
//! file, a pipe from an SDR tool) on a background thread and feeds them
//! through a bounded channel to a [`ChannelRadio`]. Lets the whole
//! receive/decode/track path run without radio hardware.

use std::io::BufRead;
use std::thread;

use crossbeam_channel::bounded;
use tracing::{debug, info, warn};

use super::{ChannelRadio, RxFrame};
use crate::bresser::types::MSG_BUF_SIZE;

/// Default RSSI reported for replayed frames without their own value.
const REPLAY_RSSI: f32 = -60.0;

/// Background reader turning hex lines into radio frames.
pub struct ReplaySource;

impl ReplaySource {
    /// Spawn the reader thread and return the consuming radio end.
    ///
    /// The channel is bounded; the reader blocks once the decoder falls
    /// behind, and the radio reports disconnection when the input is
    /// exhausted.
    pub fn spawn<R>(reader: R) -> ChannelRadio
    where
        R: BufRead + Send + 'static,
    {
        let (tx, rx) = bounded::<RxFrame>(64);

        thread::spawn(move || {
            let mut lines_read = 0u64;
            let mut frames_sent = 0u64;

            for line in reader.lines() {
                let line = match line {
                    Ok(line) => line,
                    Err(e) => {
                        warn!("replay input error: {}", e);
                        break;
                    }
                };
                lines_read += 1;

                if let Some(frame) = parse_frame_line(&line) {
                    frames_sent += 1;
                    if tx.send(frame).is_err() {
                        debug!("replay channel closed, stopping reader");
                        break;
                    }
                }
            }

            info!(
                "replay input exhausted: {} lines, {} frames",
                lines_read, frames_sent
            );
        });

        ChannelRadio::new(rx)
    }
}

/// Parse one replay line: `<hex payload> [rssi]`, `#` starts a comment.
/// Returns the frame if the line carries a plausible payload.
fn parse_frame_line(line: &str) -> Option<RxFrame> {
    let line = line.split('#').next().unwrap_or("").trim();
    if line.is_empty() {
        return None;
    }

    let mut parts = line.split_whitespace();
    let data = hex::decode(parts.next()?).ok()?;
    if data.is_empty() || data.len() > MSG_BUF_SIZE {
        return None;
    }

    let rssi = parts
        .next()
        .and_then(|s| s.parse().ok())
        .unwrap_or(REPLAY_RSSI);

    Some(RxFrame { data, rssi })
}
