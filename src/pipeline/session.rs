use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use ndarray::Array1;
use serde::{Deserialize, Serialize};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::config::config::SessionConfig;
use crate::error::LivenessError;
use crate::modules::checks::canonical_sequence;
use crate::modules::descriptor::DescriptorAggregator;
use crate::modules::detector::{FrameDetector, FrameSource};
use crate::modules::signal_extractor::{GeometricSignals, SignalExtractor};
use crate::modules::state_machine::{GoalSnapshot, LivenessStateMachine};

/// Terminal verdict of a liveness session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    Passed,
    Failed,
    Cancelled,
    Error,
}

/// The single terminal result of a session.
#[derive(Debug)]
pub struct SessionOutcome {
    pub verdict: Verdict,
    /// The final averaged identity descriptor. Present iff `Passed`.
    pub descriptor: Option<Array1<f32>>,
    /// Failure classification. Present for every verdict except `Passed`.
    pub reason: Option<LivenessError>,
    /// Ids of the checks completed during the session, in completion order.
    pub completed_checks: Vec<String>,
}

/// Guidance hint for the current tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FaceHint {
    /// A usable face is in frame.
    FaceOk,
    /// No face detected, or the detection was below the confidence floor.
    NoFace,
    /// Face detected but too far from the camera; ask the user to move
    /// closer.
    TooFar,
}

/// Per-tick view of the session, suitable for direct rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub tick: u64,
    /// Id of the active check, `None` once all checks are done.
    pub active_check: Option<String>,
    pub check_index: usize,
    pub total_checks: usize,
    pub goals: Vec<GoalSnapshot>,
    pub hint: FaceHint,
    /// Live signal values for progress bars; absent on no-face ticks.
    pub signals: Option<GeometricSignals>,
}

/// Owns the frame source for the session and releases it on drop.
///
/// Terminal transitions drop the controller inside `finish`; a host tearing
/// the session down by dropping the in-flight `run` future takes the same
/// path. Either way the stream cannot outlive the session.
struct CameraGuard<C: FrameSource>(C);

impl<C: FrameSource> Drop for CameraGuard<C> {
    fn drop(&mut self) {
        self.0.release();
    }
}

impl<C: FrameSource> Deref for CameraGuard<C> {
    type Target = C;

    fn deref(&self) -> &C {
        &self.0
    }
}

impl<C: FrameSource> DerefMut for CameraGuard<C> {
    fn deref_mut(&mut self) -> &mut C {
        &mut self.0
    }
}

/// Cheap cloneable handle for cancelling a running session from UI code.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Owner of the liveness verification tick loop.
///
/// Wires the detector, signal extractor, state machine and descriptor
/// aggregator together, and is the sole authority for terminal transitions.
/// The camera is acquired exactly once per session and released on every
/// exit path.
pub struct SessionController<D: FrameDetector, C: FrameSource> {
    detector: D,
    camera: CameraGuard<C>,
    extractor: SignalExtractor,
    machine: LivenessStateMachine,
    aggregator: DescriptorAggregator,
    config: SessionConfig,
    cancel: CancelHandle,
}

impl<D: FrameDetector, C: FrameSource> SessionController<D, C> {
    /// new initializes a session over an injected detector and frame source.
    ///
    /// The detector's model lifecycle belongs to the host; the controller
    /// only borrows the detector for this session.
    pub fn new(detector: D, camera: C, config: SessionConfig) -> Self {
        let extractor = SignalExtractor::new(config.extractor.clone());
        let machine = LivenessStateMachine::new(canonical_sequence(&config.liveness));
        let aggregator = DescriptorAggregator::new(config.descriptor_capacity);
        SessionController {
            detector,
            camera: CameraGuard(camera),
            extractor,
            machine,
            aggregator,
            config,
            cancel: CancelHandle::default(),
        }
    }

    /// cancel_handle returns a handle usable while `run` is in flight.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// run drives the session to its terminal state.
    ///
    /// One detection per tick, awaited; detections are never issued
    /// concurrently, so hold/decay counters stay consistent without locks.
    /// `on_tick` receives one snapshot per processed tick and is never
    /// invoked after cancellation.
    ///
    /// # Arguments
    /// * `on_tick` - per-tick UI feedback callback
    ///
    /// # Returns
    /// * `SessionOutcome`
    pub async fn run(mut self, mut on_tick: impl FnMut(&SessionSnapshot)) -> SessionOutcome {
        let mut completed: Vec<String> = Vec::new();

        if let Err(e) = self.camera.open() {
            return self.finish(Verdict::Error, None, Some(e), completed);
        }

        let mut ticker = interval(Duration::from_millis(self.config.tick_interval_ms.max(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut tick: u64 = 0;

        loop {
            ticker.tick().await;
            if self.cancel.is_cancelled() {
                return self.finish(
                    Verdict::Cancelled,
                    None,
                    Some(LivenessError::Cancelled),
                    completed,
                );
            }
            if let Some(max_ticks) = self.config.max_ticks {
                if tick >= max_ticks {
                    warn!(ticks = tick, "liveness session exceeded its tick budget");
                    return self.finish(
                        Verdict::Failed,
                        None,
                        Some(LivenessError::Timeout(tick)),
                        completed,
                    );
                }
            }
            tick += 1;

            let frame = match self.camera.grab() {
                Ok(frame) => frame,
                Err(e) => {
                    return self.finish(Verdict::Error, None, Some(e), completed);
                }
            };

            // Per-tick detector failures are absorbed as no-face ticks; they
            // never terminate the session.
            let detection = match self.detector.detect(&frame).await {
                Ok(detection) => detection,
                Err(e) => {
                    debug!(error = %e, "transient detection failure, treating as no face");
                    None
                }
            };

            // An in-flight detection result must not mutate state once the
            // session is cancelled.
            if self.cancel.is_cancelled() {
                return self.finish(
                    Verdict::Cancelled,
                    None,
                    Some(LivenessError::Cancelled),
                    completed,
                );
            }

            let mut hint = FaceHint::NoFace;
            let mut signals_out: Option<GeometricSignals> = None;

            match detection {
                None => self.machine.coast(),
                Some(detection) if detection.confidence < self.config.min_confidence => {
                    self.machine.coast();
                }
                Some(detection) => {
                    let signals = self.extractor.extract(&detection, frame.width);
                    signals_out = Some(signals);
                    if signals.face_ratio < self.config.min_face_ratio {
                        hint = FaceHint::TooFar;
                        self.machine.coast();
                    } else {
                        hint = FaceHint::FaceOk;
                        let outcome = self.machine.advance(&signals);
                        if let Err(e) = self.aggregator.offer(&detection.descriptor) {
                            warn!(error = %e, "rejecting per-tick descriptor");
                        }
                        if let Some(check) = outcome.check_completed {
                            completed.push(check);
                        }
                    }
                }
            }

            on_tick(&SessionSnapshot {
                tick,
                active_check: self.machine.current_check_id().map(str::to_owned),
                check_index: self.machine.current_check_index(),
                total_checks: self.machine.check_count(),
                goals: self.machine.goal_snapshots(),
                hint,
                signals: signals_out,
            });

            if self.machine.is_done() {
                return match self.aggregator.finalize() {
                    Ok(descriptor) => {
                        self.finish(Verdict::Passed, Some(descriptor), None, completed)
                    }
                    Err(e) => self.finish(Verdict::Failed, None, Some(e), completed),
                };
            }
        }
    }

    /// finish performs the terminal transition: log and build the single
    /// terminal outcome. Dropping the controller here releases the camera
    /// through its guard, still within this synchronous step.
    fn finish(
        self,
        verdict: Verdict,
        descriptor: Option<Array1<f32>>,
        reason: Option<LivenessError>,
        completed_checks: Vec<String>,
    ) -> SessionOutcome {
        info!(?verdict, checks = completed_checks.len(), "liveness session finished");
        SessionOutcome {
            verdict,
            descriptor,
            reason,
            completed_checks,
        }
    }
}
