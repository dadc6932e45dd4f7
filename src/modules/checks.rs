use serde::{Deserialize, Serialize};

use crate::config::config::LivenessConfig;
use crate::modules::signal_extractor::GeometricSignals;

/// Declarative predicate over one tick's signals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SignalPredicate {
    /// Facing the camera: |yaw| and |pitch| both within bounds.
    Centered {
        max_yaw_deg: f32,
        max_pitch_deg: f32,
    },
    /// Head turned past a yaw extreme. Negative threshold = left in image
    /// coordinates, positive = right.
    YawBeyond { threshold_deg: f32 },
    /// Mouth open past the MAR threshold.
    MouthOpen { min_mar: f32 },
    /// Eyes closed below the EAR threshold.
    EyesClosed { max_ear: f32 },
}

impl SignalPredicate {
    /// eval returns whether the predicate holds for the given signals.
    pub fn eval(&self, signals: &GeometricSignals) -> bool {
        match *self {
            SignalPredicate::Centered {
                max_yaw_deg,
                max_pitch_deg,
            } => signals.yaw_deg.abs() < max_yaw_deg && signals.pitch_deg.abs() < max_pitch_deg,
            SignalPredicate::YawBeyond { threshold_deg } => {
                if threshold_deg < 0.0 {
                    signals.yaw_deg < threshold_deg
                } else {
                    signals.yaw_deg > threshold_deg
                }
            }
            SignalPredicate::MouthOpen { min_mar } => signals.mar > min_mar,
            SignalPredicate::EyesClosed { max_ear } => signals.ear < max_ear,
        }
    }
}

/// Satisfaction policy for one goal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GoalKind {
    /// Predicate must hold for `hold_ticks` qualifying ticks. The counter
    /// decays one per unsatisfied tick instead of resetting, so a single
    /// noisy frame does not discard progress.
    Hold { hold_ticks: u32 },
    /// Predicate must hold for `debounce_ticks` ticks and then stop holding:
    /// the completed transition cycle is the satisfying event, which a
    /// frozen image can never produce.
    Edge { debounce_ticks: u32 },
}

/// One goal of a liveness check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoalSpec {
    pub label: String,
    pub predicate: SignalPredicate,
    pub kind: GoalKind,
}

/// One liveness challenge. All goals must be satisfied, in any order, before
/// the sequence advances past the check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckDefinition {
    pub id: String,
    pub goals: Vec<GoalSpec>,
}

/// canonical_sequence builds the standard four-check challenge list:
/// centered pose, sideways turn (both extremes), mouth open/close cycle,
/// blink cycle.
pub fn canonical_sequence(config: &LivenessConfig) -> Vec<CheckDefinition> {
    vec![
        CheckDefinition {
            id: "center".to_string(),
            goals: vec![GoalSpec {
                label: "hold-center".to_string(),
                predicate: SignalPredicate::Centered {
                    max_yaw_deg: config.center_max_yaw_deg,
                    max_pitch_deg: config.center_max_pitch_deg,
                },
                kind: GoalKind::Hold {
                    hold_ticks: config.center_hold_ticks,
                },
            }],
        },
        CheckDefinition {
            id: "turn".to_string(),
            goals: vec![
                GoalSpec {
                    label: "turn-left".to_string(),
                    predicate: SignalPredicate::YawBeyond {
                        threshold_deg: -config.turn_yaw_deg,
                    },
                    kind: GoalKind::Hold {
                        hold_ticks: config.turn_hold_ticks,
                    },
                },
                GoalSpec {
                    label: "turn-right".to_string(),
                    predicate: SignalPredicate::YawBeyond {
                        threshold_deg: config.turn_yaw_deg,
                    },
                    kind: GoalKind::Hold {
                        hold_ticks: config.turn_hold_ticks,
                    },
                },
            ],
        },
        CheckDefinition {
            id: "mouth-open".to_string(),
            goals: vec![GoalSpec {
                label: "open-close".to_string(),
                predicate: SignalPredicate::MouthOpen {
                    min_mar: config.mouth_open_mar,
                },
                kind: GoalKind::Edge {
                    debounce_ticks: config.mouth_debounce_ticks,
                },
            }],
        },
        CheckDefinition {
            id: "blink".to_string(),
            goals: vec![GoalSpec {
                label: "close-open".to_string(),
                predicate: SignalPredicate::EyesClosed {
                    max_ear: config.blink_ear,
                },
                kind: GoalKind::Edge {
                    debounce_ticks: config.blink_debounce_ticks,
                },
            }],
        },
    ]
}
