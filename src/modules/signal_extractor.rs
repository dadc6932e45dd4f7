use serde::{Deserialize, Serialize};

use crate::config::config::ExtractorConfig;
use crate::utils::coordinate::{Coordinate2D, FrameDetection};

/// Normalized geometric signals for one tick.
///
/// Recomputed independently every tick; no smoothing or filtering state
/// lives here. All temporal logic belongs to the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeometricSignals {
    /// Eye aspect ratio, ~0-0.4, lower = more closed.
    pub ear: f32,
    /// Mouth aspect ratio, ~0-1, higher = more open.
    pub mar: f32,
    /// Signed proxy yaw in degrees, 0 = facing the camera.
    pub yaw_deg: f32,
    /// Signed proxy pitch in degrees.
    pub pitch_deg: f32,
    /// Bounding-box width over frame width, 0-1.
    pub face_ratio: f32,
}

/// Pure per-tick mapping from raw landmark geometry to scalar signals.
#[derive(Debug, Clone)]
pub struct SignalExtractor {
    mirrored: bool,
    angle_scale_deg: f32,
}

impl SignalExtractor {
    /// new initializes the extractor from its config.
    pub fn new(config: ExtractorConfig) -> Self {
        SignalExtractor {
            mirrored: config.mirrored,
            angle_scale_deg: config.angle_scale_deg,
        }
    }

    /// extract computes the geometric signals for one detection.
    ///
    /// # Arguments
    /// * `detection` - the current tick's face detection
    /// * `frame_width` - frame width in pixels
    ///
    /// # Returns
    /// * `GeometricSignals`
    pub fn extract(&self, detection: &FrameDetection, frame_width: u32) -> GeometricSignals {
        let lmk = &detection.landmarks;
        let bbox = &detection.bounding_box;

        let ear_left = eye_aspect_ratio(&lmk.left_eye);
        let ear_right = eye_aspect_ratio(&lmk.right_eye);
        let ear = (ear_left + ear_right) / 2.0;

        let mar = mouth_aspect_ratio(&lmk.mouth);

        let (mut yaw_deg, pitch_deg) = self.head_angles(detection);
        if self.mirrored {
            yaw_deg = -yaw_deg;
        }

        let face_ratio = if frame_width > 0 {
            bbox.width / frame_width as f32
        } else {
            0.0
        };

        GeometricSignals {
            ear,
            mar,
            yaw_deg,
            pitch_deg,
            face_ratio,
        }
    }

    /// head_angles estimates proxy yaw and pitch from nose-tip offsets.
    ///
    /// Yaw: horizontal offset of the nose tip from the midpoint of the jaw
    /// boundary points, normalized by half the face width. Pitch: vertical
    /// offset of the nose tip from the eye-line midpoint, normalized by half
    /// the face height. Both scaled to a degree-like range.
    fn head_angles(&self, detection: &FrameDetection) -> (f32, f32) {
        let lmk = &detection.landmarks;
        let bbox = &detection.bounding_box;

        let nose_tip = match lmk.nose_tip() {
            Some(p) => *p,
            None => return (0.0, 0.0),
        };

        let yaw = match (lmk.jawline.first(), lmk.jawline.last()) {
            (Some(left), Some(right)) if bbox.width > 0.0 => {
                let face_mid_x = (left.x + right.x) / 2.0;
                let norm = (nose_tip.x - face_mid_x) / (bbox.width / 2.0);
                norm * self.angle_scale_deg
            }
            _ => 0.0,
        };

        let pitch = match (eye_center(&lmk.left_eye), eye_center(&lmk.right_eye)) {
            (Some(le), Some(re)) if bbox.height > 0.0 => {
                let eye_line_y = le.midpoint(&re).y;
                let norm = (nose_tip.y - eye_line_y) / (bbox.height / 2.0);
                norm * self.angle_scale_deg
            }
            _ => 0.0,
        };

        (yaw, pitch)
    }
}

/// eye_aspect_ratio computes the standard EAR from a 6-point eye ring:
/// the two vertical lid distances averaged over the horizontal corner
/// distance. Returns 0 for malformed input.
fn eye_aspect_ratio(eye: &[Coordinate2D]) -> f32 {
    if eye.len() < 6 {
        return 0.0;
    }
    let horizontal = eye[0].distance(&eye[3]);
    if horizontal <= f32::EPSILON {
        return 0.0;
    }
    let v1 = eye[1].distance(&eye[5]);
    let v2 = eye[2].distance(&eye[4]);
    (v1 + v2) / (2.0 * horizontal)
}

/// mouth_aspect_ratio computes the vertical inner-lip distance over the
/// horizontal mouth-corner distance from an 8-point inner lip ring.
fn mouth_aspect_ratio(mouth: &[Coordinate2D]) -> f32 {
    if mouth.len() < 8 {
        return 0.0;
    }
    let horizontal = mouth[0].distance(&mouth[4]);
    if horizontal <= f32::EPSILON {
        return 0.0;
    }
    mouth[2].distance(&mouth[6]) / horizontal
}

fn eye_center(eye: &[Coordinate2D]) -> Option<Coordinate2D> {
    if eye.len() < 6 {
        return None;
    }
    Some(eye[0].midpoint(&eye[3]))
}
