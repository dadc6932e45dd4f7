use anyhow::Error;
use serde::{Deserialize, Serialize};

/// Signal extractor tuning.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExtractorConfig {
    /// The preview video is rendered mirrored while landmark coordinates are
    /// not. When true, the yaw sign is flipped so "turn left" means the
    /// direction the user sees on screen.
    pub mirrored: bool,
    /// Scale factor mapping the normalized nose-tip offset to a degree-like
    /// range. Not a true 3D angle, a proxy sufficient for thresholding.
    pub angle_scale_deg: f32,
}

impl ExtractorConfig {
    pub fn new() -> Self {
        ExtractorConfig {
            mirrored: true,
            angle_scale_deg: 45.0,
        }
    }
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Thresholds and hold counts for the canonical liveness check sequence.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LivenessConfig {
    /// |yaw| bound for the centered pose, degrees.
    pub center_max_yaw_deg: f32,
    /// |pitch| bound for the centered pose, degrees.
    pub center_max_pitch_deg: f32,
    /// Qualifying ticks required to satisfy the centered pose. The baseline
    /// pose is harder to fake briefly, so this is the longest hold.
    pub center_hold_ticks: u32,
    /// Yaw magnitude that counts as a full sideways turn, degrees.
    pub turn_yaw_deg: f32,
    /// Qualifying ticks per turn extreme. Each extreme is an instantaneous
    /// capture, not a sustained pose, so the streak is short.
    pub turn_hold_ticks: u32,
    /// MAR above this counts as mouth open.
    pub mouth_open_mar: f32,
    /// Ticks the mouth must stay open before the closing edge can complete
    /// the open-then-close cycle.
    pub mouth_debounce_ticks: u32,
    /// EAR below this counts as eyes closed.
    pub blink_ear: f32,
    /// Ticks the eyes must stay closed before the re-opening edge can
    /// complete the close-then-open cycle.
    pub blink_debounce_ticks: u32,
}

impl LivenessConfig {
    pub fn new() -> Self {
        LivenessConfig {
            center_max_yaw_deg: 8.0,
            center_max_pitch_deg: 10.0,
            center_hold_ticks: 12,
            turn_yaw_deg: 18.0,
            turn_hold_ticks: 3,
            mouth_open_mar: 0.45,
            mouth_debounce_ticks: 2,
            blink_ear: 0.22,
            blink_debounce_ticks: 2,
        }
    }
}

impl Default for LivenessConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Session controller tuning.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionConfig {
    pub extractor: ExtractorConfig,
    pub liveness: LivenessConfig,
    /// Detections below this confidence are treated as no-face ticks.
    pub min_confidence: f32,
    /// Minimum bounding-box width over frame width. Below it the face is too
    /// far from the camera and check progress is suppressed for the tick.
    pub min_face_ratio: f32,
    /// Descriptor buffer capacity.
    pub descriptor_capacity: usize,
    /// Target interval between detection ticks, milliseconds.
    pub tick_interval_ms: u64,
    /// Session-level tick budget. `None` leaves the session in progress
    /// indefinitely; hosts that want a timeout set a budget and receive a
    /// failed verdict with a timeout reason when it is exhausted.
    pub max_ticks: Option<u64>,
}

impl SessionConfig {
    pub fn new() -> Self {
        SessionConfig {
            extractor: ExtractorConfig::new(),
            liveness: LivenessConfig::new(),
            min_confidence: 0.5,
            min_face_ratio: 0.18,
            descriptor_capacity: 10,
            tick_interval_ms: 33,
            max_ticks: None,
        }
    }

    /// from_json parses a session config from a JSON document.
    ///
    /// # Arguments
    /// * `raw` - JSON string
    ///
    /// # Returns
    /// * `Result<SessionConfig, Error>`
    pub fn from_json(raw: &str) -> Result<SessionConfig, Error> {
        Ok(serde_json::from_str(raw)?)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_config_json_roundtrip() {
        let cfg = SessionConfig::new();
        let raw = serde_json::to_string(&cfg).unwrap();
        let parsed = SessionConfig::from_json(&raw).unwrap();
        assert_eq!(parsed, cfg);
    }

    #[test]
    fn test_session_config_rejects_bad_json() {
        assert!(SessionConfig::from_json("{not json").is_err());
    }
}
