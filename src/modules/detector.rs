use crate::error::LivenessResult;
use crate::utils::coordinate::FrameDetection;

/// One video frame handed from the frame source to the detector.
///
/// The engine itself never inspects pixel data; it only needs the frame
/// dimensions to normalize the face-size ratio.
#[derive(Debug, Clone)]
pub struct VideoFrame {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

/// Black-box per-frame face detector.
///
/// The model behind this trait is loaded and torn down by the host,
/// independently of any one session; a controller only borrows it for the
/// session's lifetime. Constructors that load the model report failure as
/// [`LivenessError::ModelLoadFailure`](crate::error::LivenessError), so the
/// host can surface it immediately: the session never starts and no camera
/// is acquired. Implementations may be stateful (tracking across frames),
/// hence `&mut self`. Inference latency is arbitrary; the session controller
/// awaits each call and never issues detections concurrently.
#[allow(async_fn_in_trait)]
pub trait FrameDetector {
    /// detect runs the model on one frame.
    ///
    /// Returns `Ok(None)` when no face is present. A returned error is
    /// absorbed by the session controller as a transient no-face tick, not a
    /// session failure.
    async fn detect(&mut self, frame: &VideoFrame) -> LivenessResult<Option<FrameDetection>>;
}

/// Camera or video stream supplying the current frame.
///
/// Acquired exactly once per session. `release` must be idempotent: the
/// session controller calls it unconditionally on every exit path.
pub trait FrameSource {
    /// open acquires the underlying stream.
    fn open(&mut self) -> LivenessResult<()>;

    /// grab returns the current frame.
    fn grab(&mut self) -> LivenessResult<VideoFrame>;

    /// release stops the underlying stream. Safe to call more than once.
    fn release(&mut self);
}
