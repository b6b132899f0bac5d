//! Crate-wide configuration, loadable from JSON.

use std::path::Path;

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::events::EventConfig;
use crate::report::ReportConfig;
use crate::suppress::SuppressorConfig;
use crate::tracker::TrackerConfig;

/// Settings for every stage. Missing sections and fields take their defaults.
///
/// ```json
/// {
///   "suppressor": { "confidence_threshold": 0.4 },
///   "tracker": { "max_disappeared": 30, "association": "optimal" },
///   "events": { "capture_classes": ["bus", "truck"] },
///   "report": { "dry_run": true }
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub suppressor: SuppressorConfig,
    pub tracker: TrackerConfig,
    pub events: EventConfig,
    pub report: ReportConfig,
}

impl Config {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }
}
