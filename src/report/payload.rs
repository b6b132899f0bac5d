//! Key/value report payloads handed to the event reporter.

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Local, Utc};
use image::RgbImage;
use image::codecs::jpeg::JpegEncoder;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::Result;
use crate::events::{EventKind, VehicleEvent};
use crate::report::location::GpsFix;
use crate::report::session::SessionInfo;

/// `yyyy-MM-dd HH:mm:ss` in local time.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
pub const DEFAULT_JPEG_QUALITY: u8 = 85;

pub fn format_timestamp(instant: DateTime<Utc>) -> String {
    instant.with_timezone(&Local).format(TIMESTAMP_FORMAT).to_string()
}

pub fn encode_jpeg(image: &RgbImage, quality: u8) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    JpegEncoder::new_with_quality(&mut bytes, quality).encode_image(image)?;
    Ok(bytes)
}

pub fn encode_base64(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// A JSON object describing one vehicle event.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct EventPayload(Map<String, Value>);

impl EventPayload {
    /// Shape a payload from an event snapshot.
    ///
    /// GPS fields are present only with a fix, `user_id` only for a signed-in
    /// session. `image_data` is the base64 JPEG of the event image, if any.
    pub fn build(
        event: &VehicleEvent,
        session: &SessionInfo,
        fix: Option<GpsFix>,
        image_data: Option<String>,
    ) -> Self {
        let mut payload = Self::default();
        payload.insert("event", event.kind.as_str());
        payload.insert("session_id", session.session_id.as_str());
        payload.insert("vehicle_type", event.class_name.as_str());
        payload.insert("vehicle_id", event.vehicle_id());
        payload.insert("timestamp", format_timestamp(event.timestamp));
        payload.insert(
            "location",
            format!("{},{}", event.position.x, event.position.y),
        );
        payload.insert("confidence", event.confidence);

        if let Some(fix) = fix {
            payload.insert("gps_location", fix.to_string());
            payload.insert("gps_latitude", fix.latitude);
            payload.insert("gps_longitude", fix.longitude);
        }
        if let Some(user_id) = &session.user_id {
            payload.insert("user_id", user_id.as_str());
        }
        payload.insert("is_public", session.is_public);

        if event.kind == EventKind::Exit {
            payload.insert("entry_timestamp", format_timestamp(event.entry_time));
            payload.insert("entry_position_x", event.entry_position.x);
            payload.insert("entry_position_y", event.entry_position.y);
            if let Some(exit_time) = event.exit_time {
                payload.insert("exit_timestamp", format_timestamp(exit_time));
            }
            if let Some(exit) = event.exit_position {
                payload.insert("exit_position_x", exit.x);
                payload.insert("exit_position_y", exit.y);
            }
            if let Some(heading) = event.heading {
                payload.insert("direction", heading.as_str());
            }
            if let Some(elapsed) = event.time_in_frame() {
                payload.insert("time_in_frame_ms", elapsed.num_milliseconds());
            }
        }

        if let Some(data) = image_data {
            payload.insert("has_image", true);
            payload.insert("image_data", data);
        }

        payload
    }

    pub fn insert(&mut self, key: &str, value: impl Into<Value>) {
        self.0.insert(key.to_string(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }

    /// The payload with `image_data` replaced by its length, for logs.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if let Some(Value::String(data)) = copy.0.remove("image_data") {
            copy.insert("image_data_len", data.len());
        }
        copy
    }
}

impl fmt::Display for EventPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string(&self.0) {
            Ok(json) => f.write_str(&json),
            Err(_) => Err(fmt::Error),
        }
    }
}
