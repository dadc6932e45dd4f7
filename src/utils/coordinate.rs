use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate2D {
    pub x: f32,
    pub y: f32,
}

impl Coordinate2D {
    pub fn new(x: f32, y: f32) -> Self {
        Coordinate2D { x, y }
    }

    /// distance returns the euclidean distance to another point.
    pub fn distance(&self, other: &Coordinate2D) -> f32 {
        Vector2::new(self.x - other.x, self.y - other.y).norm()
    }

    /// midpoint returns the point halfway between self and another point.
    pub fn midpoint(&self, other: &Coordinate2D) -> Coordinate2D {
        Coordinate2D {
            x: (self.x + other.x) / 2.0,
            y: (self.y + other.y) / 2.0,
        }
    }
}

/// Face bounding box in frame pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Named anatomical landmark groups for one detected face.
///
/// Point conventions:
/// - `left_eye` / `right_eye`: 6 points per eye ring, ordered
///   outer corner, two upper-lid points, inner corner, two lower-lid points
///   (indices 0..=5, corners at 0 and 3).
/// - `mouth`: 8 inner-lip points, left corner at 0, upper-lip midpoint at 2,
///   right corner at 4, lower-lip midpoint at 6.
/// - `nose`: ordered bridge to tip; the tip is the last point.
/// - `jawline`: ordered left to right; first and last points are the face's
///   lateral boundary.
///
/// "Left" and "right" are in image coordinates, not the subject's anatomy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaceLandmarks {
    pub left_eye: Vec<Coordinate2D>,
    pub right_eye: Vec<Coordinate2D>,
    pub mouth: Vec<Coordinate2D>,
    pub nose: Vec<Coordinate2D>,
    pub jawline: Vec<Coordinate2D>,
}

impl FaceLandmarks {
    /// nose_tip returns the nose tip landmark, if present.
    pub fn nose_tip(&self) -> Option<&Coordinate2D> {
        self.nose.last()
    }
}

/// One face detection for the current tick, produced by the external
/// detector. Transient; never persisted across ticks.
#[derive(Debug, Clone)]
pub struct FrameDetection {
    pub bounding_box: BoundingBox,
    pub landmarks: FaceLandmarks,
    /// Fixed-length identity embedding, e.g. 128 dimensions.
    pub descriptor: Vec<f32>,
    pub confidence: f32,
}
