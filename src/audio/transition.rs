use crate::{
    assets::decode::PreparedAudio,
    audio::surface::{AudioSurface, SourceId},
    foundation::core::NodeId,
    foundation::error::ViewerResult,
    graph::model::Node,
};

#[derive(Clone, Debug, PartialEq)]
/// The sound most recently started by a navigation.
pub struct ActiveSound {
    /// Source handle on the audio surface.
    pub source: SourceId,
    /// Node the sound belongs to.
    pub node: NodeId,
    /// Target gain factor of its fade-in.
    pub gain_factor: f64,
    /// Fade-out applied when the next sound takes over.
    pub fade_out_secs: f64,
    /// Audio-clock time playback started.
    pub started_at: f64,
    /// Buffer offset playback started from.
    pub offset: f64,
    /// Whether the source loops.
    pub looping: bool,
    /// Buffer length in seconds.
    pub buffer_secs: f64,
}

impl ActiveSound {
    /// Audio-clock time at which this sound's buffer position was zero.
    pub fn phase_origin(&self) -> f64 {
        self.started_at - self.offset
    }
}

/// Start offset that keeps a synced sound in phase with a loop anchored at `anchor`.
///
/// Without an anchor, or for an empty buffer, playback starts at the top.
pub fn sync_offset(now: f64, anchor: Option<f64>, buffer_secs: f64) -> f64 {
    match anchor {
        Some(anchor) if buffer_secs > 0.0 => (now - anchor).rem_euclid(buffer_secs),
        _ => 0.0,
    }
}

#[derive(Clone, Debug, Default)]
/// Cross-fades node sounds: at most one sound is active, the one it replaces fades out.
pub struct AudioTransitions {
    active: Option<ActiveSound>,
}

impl AudioTransitions {
    /// No active sound.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sound that the next transition will fade out.
    pub fn active(&self) -> Option<&ActiveSound> {
        self.active.as_ref()
    }

    /// Fade the active sound out and start `node`'s sound from `buffer`.
    ///
    /// Both sounds play concurrently during the fade window; the replaced sound gets no
    /// further automation after its stop is scheduled. A failed fade-out is logged and the new
    /// sound still starts. When the new sound fails, a previous sound whose fade-out also
    /// failed stays active so the next transition retries it.
    #[tracing::instrument(skip_all, fields(node = %node.id))]
    pub fn play(
        &mut self,
        surface: &mut dyn AudioSurface,
        node: &Node,
        buffer: &PreparedAudio,
    ) -> ViewerResult<()> {
        let time = surface.current_time();

        let anchor = self
            .active
            .as_ref()
            .filter(|s| s.looping)
            .map(ActiveSound::phase_origin);

        let mut still_playing = None;
        if let Some(prev) = self.active.take() {
            match fade_out(surface, &prev, time) {
                Ok(end) => tracing::debug!(node = %prev.node, until = end, "fading out"),
                Err(err) => {
                    tracing::warn!(node = %prev.node, error = %err, "fade-out failed");
                    still_playing = Some(prev);
                }
            }
        }

        match fade_in(surface, node, buffer, time, anchor) {
            Ok(sound) => {
                self.active = Some(sound);
                Ok(())
            }
            Err(err) => {
                self.active = still_playing;
                Err(err)
            }
        }
    }
}

// Ramp `prev` to silence and schedule its stop; returns the stop time.
fn fade_out(
    surface: &mut dyn AudioSurface,
    prev: &ActiveSound,
    time: f64,
) -> ViewerResult<f64> {
    let end = time + prev.fade_out_secs;
    surface.stop(prev.source, end)?;
    surface.set_gain_at(prev.source, prev.gain_factor, time)?;
    surface.linear_ramp_gain_to(prev.source, 0.0, end)?;
    Ok(end)
}

fn fade_in(
    surface: &mut dyn AudioSurface,
    node: &Node,
    buffer: &PreparedAudio,
    time: f64,
    anchor: Option<f64>,
) -> ViewerResult<ActiveSound> {
    let audio = &node.audio;
    let gain_factor = audio.gain_factor();
    let fade_in = audio.fade_in_secs();
    let buffer_secs = buffer.duration_secs();
    let offset = if audio.sync {
        sync_offset(time, anchor, buffer_secs)
    } else {
        0.0
    };

    let source = surface.create_source(buffer, audio.looping)?;
    surface.set_gain_at(source, 0.0, time)?;
    surface.linear_ramp_gain_to(source, gain_factor, time + fade_in)?;
    surface.start(source, time, offset)?;

    Ok(ActiveSound {
        source,
        node: node.id.clone(),
        gain_factor,
        fade_out_secs: audio.fade_out_secs(),
        started_at: time,
        offset,
        looping: audio.looping,
        buffer_secs,
    })
}

#[cfg(test)]
#[path = "../../tests/unit/audio/transition.rs"]
mod tests;
