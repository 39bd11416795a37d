use crate::{assets::decode::PreparedAudio, foundation::error::ViewerResult};

/// Handle of one playable source created on an [`AudioSurface`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceId(pub u64);

/// Audio output the viewer schedules playback and gain automation on.
///
/// All times are absolute seconds on the surface's own clock ([`AudioSurface::current_time`]);
/// ramps and stops run on that clock, independently of the animation frames.
pub trait AudioSurface {
    /// Current time of the audio clock.
    fn current_time(&self) -> f64;

    /// Create a source for `buffer`, routed through its own gain control.
    fn create_source(&mut self, buffer: &PreparedAudio, looping: bool) -> ViewerResult<SourceId>;

    /// Start playback at `when`, `offset` seconds into the buffer.
    fn start(&mut self, source: SourceId, when: f64, offset: f64) -> ViewerResult<()>;

    /// Stop playback at `when`.
    fn stop(&mut self, source: SourceId, when: f64) -> ViewerResult<()>;

    /// Jump the gain to `value` at `when`.
    fn set_gain_at(&mut self, source: SourceId, value: f64, when: f64) -> ViewerResult<()>;

    /// Ramp the gain linearly from the previous automation point to `value` at `end_time`.
    fn linear_ramp_gain_to(&mut self, source: SourceId, value: f64, end_time: f64)
    -> ViewerResult<()>;
}
