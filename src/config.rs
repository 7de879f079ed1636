//! Configuration loaded from environment variables

use std::path::PathBuf;

use crate::bresser::types::SensorName;
use crate::bresser::Format;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Number of sensor slots in the tracking pool
    pub pool_size: usize,

    /// Sensor IDs never admitted to the pool
    pub exclude_ids: Vec<u32>,

    /// When non-empty, the only sensor IDs admitted to the pool
    pub include_ids: Vec<u32>,

    /// Wire formats to decode
    pub formats: Vec<Format>,

    /// Sensor ID to name mapping for downstream consumers
    pub sensor_names: Vec<SensorName>,

    /// Replay capture file (stdin when unset)
    pub replay_path: Option<PathBuf>,

    /// Acquisition window per reporting cycle in milliseconds
    pub acquire_timeout_ms: u64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            pool_size: std::env::var("BRESSER_POOL_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(4),

            exclude_ids: std::env::var("BRESSER_EXCLUDE_IDS")
                .map(|s| parse_id_list(&s))
                .unwrap_or_default(),

            include_ids: std::env::var("BRESSER_INCLUDE_IDS")
                .map(|s| parse_id_list(&s))
                .unwrap_or_default(),

            formats: std::env::var("BRESSER_FORMATS")
                .map(|s| parse_format_list(&s))
                .unwrap_or_else(|_| Format::PRIORITY.to_vec()),

            sensor_names: std::env::var("BRESSER_SENSOR_NAMES")
                .map(|s| parse_name_list(&s))
                .unwrap_or_default(),

            replay_path: std::env::var("BRESSER_REPLAY_PATH").ok().map(PathBuf::from),

            acquire_timeout_ms: std::env::var("BRESSER_ACQUIRE_TIMEOUT_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(30_000),
        }
    }

    /// Resolved name for a sensor ID, if configured.
    pub fn sensor_name(&self, id: u32) -> Option<&str> {
        self.sensor_names
            .iter()
            .find(|s| s.id == id)
            .map(|s| s.name.as_str())
    }
}

/// Parse a sensor ID: hex with `0x` prefix, decimal otherwise.
fn parse_id(s: &str) -> Option<u32> {
    let s = s.trim();
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16).ok()
    } else {
        s.parse().ok()
    }
}

/// Parse a comma-separated ID list, skipping anything unparseable.
fn parse_id_list(s: &str) -> Vec<u32> {
    s.split(',').filter_map(parse_id).collect()
}

/// Parse a comma-separated format list, skipping unknown names.
fn parse_format_list(s: &str) -> Vec<Format> {
    s.split(',').filter_map(|f| f.parse().ok()).collect()
}

/// Parse a comma-separated `id:name` list.
fn parse_name_list(s: &str) -> Vec<SensorName> {
    s.split(',')
        .filter_map(|entry| {
            let (id, name) = entry.split_once(':')?;
            Some(SensorName {
                id: parse_id(id)?,
                name: name.trim().to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_id_list() {
        assert_eq!(
            parse_id_list("0x39582A1C, 107, junk, 0xff"),
            vec![0x3958_2a1c, 107, 0xff]
        );
    }

    #[test]
    fn test_parse_format_list() {
        assert_eq!(
            parse_format_list("7in1,lightning"),
            vec![Format::SevenInOne, Format::Lightning]
        );
    }

    #[test]
    fn test_parse_name_list() {
        let names = parse_name_list("0x6a:garden, 0x4f3a: roof");
        assert_eq!(names.len(), 2);
        assert_eq!(names[0].id, 0x6a);
        assert_eq!(names[0].name, "garden");
        assert_eq!(names[1].name, "roof");
    }
}
