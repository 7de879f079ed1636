//! Bresser Weather Sensor Capture
//!
//! Reads raw FSK frames (from a capture file or stdin), decodes them with
//! the format decoders, tracks per-sensor state, and emits one JSON line
//! per decoded reading on stdout. Logs go to stderr.

use std::fs::File;
use std::io::{self, BufReader};
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use bresser_capture::bresser::decoder_registry;
use bresser_capture::bresser::types::Measurement;
use bresser_capture::config::Config;
use bresser_capture::radio::{ChannelRadio, ReplaySource, Transceiver};
use bresser_capture::receiver::{Completion, WeatherReceiver};
use bresser_capture::tracker::SlotTracker;

/// Decoded reading, one JSON line per sensor on stdout
#[derive(Serialize)]
struct SensorEvent<'a> {
    timestamp_ms: u64,
    id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
    s_type: u8,
    channel: u8,
    rssi: f32,
    startup: bool,
    battery_ok: bool,
    complete: bool,
    #[serde(flatten)]
    measurement: &'a Measurement,
}

fn main() -> Result<()> {
    // Initialize logging
    FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    info!("===========================================");
    info!("   Bresser Weather Sensor Capture");
    info!("   rtl_433-style FSK decoder");
    info!("===========================================");

    // Load configuration
    let config = Config::from_env();

    info!("Configuration:");
    info!("  Pool size: {}", config.pool_size);
    info!("  Formats: {:?}", config.formats);
    if !config.exclude_ids.is_empty() {
        info!("  Exclude IDs: {:08X?}", config.exclude_ids);
    }
    if !config.include_ids.is_empty() {
        info!("  Include IDs: {:08X?}", config.include_ids);
    }

    // Frame source: replay capture file, or stdin
    let radio: ChannelRadio = match &config.replay_path {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("failed to open replay capture {}", path.display()))?;
            info!("Replaying frames from {}", path.display());
            ReplaySource::spawn(BufReader::new(file))
        }
        None => {
            info!("Reading frames from stdin");
            ReplaySource::spawn(BufReader::new(io::stdin()))
        }
    };

    let tracker = SlotTracker::new(
        config.pool_size,
        config.exclude_ids.clone(),
        config.include_ids.clone(),
    );
    let mut receiver = WeatherReceiver::new(radio, tracker, decoder_registry(&config.formats));
    receiver.begin().context("radio initialization failed")?;

    info!("===========================================");
    info!("  Starting capture...");
    info!("===========================================");

    let window = Duration::from_millis(config.acquire_timeout_ms);
    let mut readings_emitted = 0u64;

    while receiver.radio().is_running() {
        if !receiver.get_data(window, Completion::AnyComplete, None) {
            if receiver.radio().is_running() {
                info!("acquisition window elapsed without a complete reading");
            }
            continue;
        }

        // Report every slot that holds data, then free the pool for the
        // next acquisition window
        let now = Utc::now().timestamp_millis() as u64;
        for slot in receiver.slots().iter().filter(|s| s.valid) {
            let Some(measurement) = &slot.data else {
                continue;
            };

            let event = SensorEvent {
                timestamp_ms: now,
                id: format!("{:08X}", slot.id),
                name: config.sensor_name(slot.id),
                s_type: slot.s_type,
                channel: slot.chan,
                rssi: slot.rssi,
                startup: slot.startup,
                battery_ok: slot.battery_ok,
                complete: slot.complete,
                measurement,
            };

            match serde_json::to_string(&event) {
                Ok(line) => {
                    println!("{}", line);
                    readings_emitted += 1;
                }
                Err(e) => warn!("failed to serialize reading: {}", e),
            }
        }
        receiver.clear_slots(None);
    }

    info!("Shutdown complete. Readings emitted: {}", readings_emitted);
    Ok(())
}
