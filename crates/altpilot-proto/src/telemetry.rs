use serde::{Deserialize, Serialize};
use tracing::debug;

/// Field separator of the simulator's status string.
pub const FIELD_DELIM: char = '-';

// 0-based positions inside the split status string
const IDX_X: usize = 1;
const IDX_Y: usize = 3;
const IDX_BAT: usize = 5;
const IDX_SENS: usize = 13;

/// One decoded status message from the flight peer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryRecord {
    pub x: f64,        // horizontal position
    pub y: f64,        // altitude
    pub bat: f64,      // battery percent 0-100
    pub sens: Option<String>,
}

impl TelemetryRecord {
    /// Substituted for anything that does not decode. Full battery and zero
    /// displacement, so a garbled message can never start a landing.
    pub fn fallback() -> Self {
        Self { x: 0.0, y: 0.0, bat: 100.0, sens: None }
    }

    /// Decodes a `-` delimited status string. Never fails: short strings or
    /// non-numeric position/battery fields yield [`TelemetryRecord::fallback`].
    pub fn decode(raw: &str) -> Self {
        match try_decode(raw) {
            Some(rec) => rec,
            None => {
                debug!("telemetry: undecodable status {:?}, using fallback", raw);
                Self::fallback()
            }
        }
    }

    pub fn is_fallback(&self) -> bool {
        self == &Self::fallback()
    }
}

fn try_decode(raw: &str) -> Option<TelemetryRecord> {
    let parts: Vec<&str> = raw.split(FIELD_DELIM).collect();
    if parts.len() <= IDX_SENS {
        return None;
    }
    Some(TelemetryRecord {
        x: parse_num(parts[IDX_X])?,
        y: parse_num(parts[IDX_Y])?,
        bat: parse_num(parts[IDX_BAT])?,
        sens: Some(parts[IDX_SENS].to_string()),
    })
}

fn parse_num(field: &str) -> Option<f64> {
    field.trim().parse().ok()
}

#[derive(Debug, Deserialize)]
struct TelemetryFrame {
    telemetry: String,
}

/// Pulls the status string out of a `{"telemetry": "..."}` text message.
/// Any other shape gives an empty string, which decodes to the fallback record.
pub fn frame_payload(text: &str) -> String {
    match serde_json::from_str::<TelemetryFrame>(text) {
        Ok(frame) => frame.telemetry,
        Err(e) => {
            debug!("telemetry: malformed frame ({}): {:?}", e, text);
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_full_status_string() {
        let rec = TelemetryRecord::decode("a-12.5-b-3.0-c-99.0-d-e-f-g-h-i-j-SENSOK");
        assert_eq!(rec.x, 12.5);
        assert_eq!(rec.y, 3.0);
        assert_eq!(rec.bat, 99.0);
        assert_eq!(rec.sens.as_deref(), Some("SENSOK"));
    }

    #[test]
    fn ignores_fields_past_sensor_slot() {
        let rec = TelemetryRecord::decode("a-1-b-2-c-3-d-e-f-g-h-i-j-S-extra-more");
        assert_eq!((rec.x, rec.y, rec.bat), (1.0, 2.0, 3.0));
        assert_eq!(rec.sens.as_deref(), Some("S"));
    }

    #[test]
    fn short_string_falls_back() {
        // position and battery parse but the sensor slot is missing
        let rec = TelemetryRecord::decode("a-12.5-b-3.0-c-0.2");
        assert_eq!(rec, TelemetryRecord::fallback());
        assert_eq!(TelemetryRecord::decode(""), TelemetryRecord::fallback());
    }

    #[test]
    fn non_numeric_field_falls_back() {
        for raw in [
            "a-abc-b-3.0-c-99.0-d-e-f-g-h-i-j-S",
            "a-1.0-b-high-c-99.0-d-e-f-g-h-i-j-S",
            "a-1.0-b-3.0-c-full-d-e-f-g-h-i-j-S",
            "a-1.0-b--c-99.0-d-e-f-g-h-i-j-S",
        ] {
            let rec = TelemetryRecord::decode(raw);
            assert!(rec.is_fallback(), "{raw}");
            assert_eq!((rec.x, rec.y, rec.bat), (0.0, 0.0, 100.0));
            assert!(rec.sens.is_none());
        }
    }

    #[test]
    fn negative_value_collides_with_delimiter() {
        let rec = TelemetryRecord::decode("a--4.0-b-3.0-c-99.0-d-e-f-g-h-i-j-S");
        assert!(rec.is_fallback());
    }

    #[test]
    fn tolerates_padded_numbers() {
        let rec = TelemetryRecord::decode("a- 7.5 -b-1e1-c-0.5-d-e-f-g-h-i-j-S");
        assert_eq!((rec.x, rec.y, rec.bat), (7.5, 10.0, 0.5));
    }

    #[test]
    fn frame_payload_extracts_status() {
        let s = frame_payload(r#"{"telemetry": "a-1-b-2-c-3-d-e-f-g-h-i-j-S"}"#);
        assert_eq!(s, "a-1-b-2-c-3-d-e-f-g-h-i-j-S");
    }

    #[test]
    fn frame_payload_degrades_on_other_shapes() {
        assert_eq!(frame_payload("not json"), "");
        assert_eq!(frame_payload(r#"{"status": "ok"}"#), "");
        assert_eq!(frame_payload(r#"{"telemetry": 42}"#), "");
        assert_eq!(frame_payload("[]"), "");
        assert!(TelemetryRecord::decode(&frame_payload("{}")).is_fallback());
    }
}
