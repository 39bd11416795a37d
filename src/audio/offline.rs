use std::path::Path;

use anyhow::Context;

use crate::{
    assets::decode::PreparedAudio,
    audio::surface::{AudioSurface, SourceId},
    foundation::error::{ViewerError, ViewerResult},
};

#[derive(Clone, Copy, Debug, PartialEq)]
enum GainEvent {
    Set { time: f64, value: f64 },
    Ramp { end: f64, value: f64 },
}

impl GainEvent {
    fn time(self) -> f64 {
        match self {
            GainEvent::Set { time, .. } => time,
            GainEvent::Ramp { end, .. } => end,
        }
    }
}

#[derive(Clone, Debug, Default)]
/// Gain automation timeline of one source: jumps and linear ramps, ordered by time.
pub struct GainAutomation {
    events: Vec<GainEvent>,
}

impl GainAutomation {
    /// Gain before any event takes effect.
    pub const INITIAL: f64 = 1.0;

    fn insert(&mut self, event: GainEvent) {
        let at = self
            .events
            .iter()
            .position(|e| e.time() > event.time())
            .unwrap_or(self.events.len());
        self.events.insert(at, event);
    }

    /// Jump to `value` at `time`.
    pub fn set_value_at(&mut self, value: f64, time: f64) {
        self.insert(GainEvent::Set { time, value });
    }

    /// Ramp linearly from the preceding event to `value`, reaching it at `end`.
    pub fn linear_ramp_to(&mut self, value: f64, end: f64) {
        self.insert(GainEvent::Ramp { end, value });
    }

    /// Gain at time `t`.
    pub fn value_at(&self, t: f64) -> f64 {
        let mut value = Self::INITIAL;
        let mut prev_time = f64::NEG_INFINITY;
        for event in &self.events {
            match *event {
                GainEvent::Set { time, value: v } => {
                    if t < time {
                        break;
                    }
                    value = v;
                    prev_time = time;
                }
                GainEvent::Ramp { end, value: v } => {
                    if t >= end {
                        value = v;
                        prev_time = end;
                        continue;
                    }
                    if prev_time.is_finite() && t >= prev_time && end > prev_time {
                        let frac = (t - prev_time) / (end - prev_time);
                        value += (v - value) * frac;
                    }
                    break;
                }
            }
        }
        value
    }
}

#[derive(Clone, Debug)]
struct OfflineSource {
    id: SourceId,
    buffer: PreparedAudio,
    looping: bool,
    start: Option<(f64, f64)>,
    stop_at: Option<f64>,
    gain: GainAutomation,
}

impl OfflineSource {
    // Source playback position at `t`, or None while silent.
    fn position_at(&self, t: f64) -> Option<f64> {
        let (when, offset) = self.start?;
        if t < when || self.stop_at.is_some_and(|s| t >= s) {
            return None;
        }
        let dur = self.buffer.duration_secs();
        if dur <= 0.0 {
            return None;
        }
        let pos = offset + (t - when);
        if self.looping {
            Some(pos.rem_euclid(dur))
        } else if pos < dur {
            Some(pos)
        } else {
            None
        }
    }

    fn finished_by(&self, t: f64) -> bool {
        if self.stop_at.is_some_and(|s| s <= t) {
            return true;
        }
        match self.start {
            Some((when, offset)) if !self.looping => {
                when + (self.buffer.duration_secs() - offset).max(0.0) <= t
            }
            _ => false,
        }
    }
}

/// Software [`AudioSurface`]: a manually advanced clock plus a mixer.
///
/// Sources are resampled linearly to the output rate, mono sources feed every output channel,
/// and the mix is clamped to [-1, 1].
#[derive(Clone, Debug)]
pub struct OfflineAudio {
    sample_rate: u32,
    channels: u16,
    now: f64,
    next_id: u64,
    sources: Vec<OfflineSource>,
}

impl OfflineAudio {
    /// Create a mixer; fails with [`ViewerError::AudioUnavailable`] for a zero rate or channel
    /// count.
    pub fn new(sample_rate: u32, channels: u16) -> ViewerResult<Self> {
        if sample_rate == 0 || channels == 0 {
            return Err(ViewerError::audio_unavailable(format!(
                "cannot open a {channels}-channel output at {sample_rate} Hz"
            )));
        }
        Ok(Self {
            sample_rate,
            channels,
            now: 0.0,
            next_id: 0,
            sources: Vec::new(),
        })
    }

    /// Output sample rate.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Output channel count.
    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// Move the clock forward to `t`. The clock never runs backwards.
    pub fn advance_to(&mut self, t: f64) {
        if t > self.now {
            self.now = t;
        }
    }

    /// Sources audible at time `t`.
    pub fn audible_sources(&self, t: f64) -> Vec<SourceId> {
        self.sources
            .iter()
            .filter(|s| s.position_at(t).is_some())
            .map(|s| s.id)
            .collect()
    }

    /// Number of sources still held by the mixer.
    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    /// Gain of `source` at time `t`.
    pub fn gain_at(&self, source: SourceId, t: f64) -> Option<f64> {
        self.find(source).ok().map(|s| s.gain.value_at(t))
    }

    /// Forget sources that can no longer be heard at or after `t`.
    ///
    /// Stop and gain calls on a forgotten source still succeed and change nothing.
    pub fn drop_finished(&mut self, t: f64) {
        self.sources.retain(|s| !s.finished_by(t));
    }

    /// Mix `frames` output frames starting at time `from`, interleaved.
    pub fn render(&self, from: f64, frames: usize) -> Vec<f32> {
        let ch = usize::from(self.channels);
        let mut out = vec![0.0f32; frames * ch];
        let dt = 1.0 / f64::from(self.sample_rate);

        for src in &self.sources {
            let buf = src.buffer.interleaved_f32.as_ref();
            let src_ch = usize::from(src.buffer.channels.max(1));
            let src_frames = src.buffer.frames();
            if src_frames == 0 {
                continue;
            }

            for i in 0..frames {
                let t = from + (i as f64) * dt;
                let Some(pos) = src.position_at(t) else {
                    continue;
                };
                let src_pos = pos * f64::from(src.buffer.sample_rate);
                let f0 = (src_pos.floor() as usize).min(src_frames - 1);
                let f1 = if src.looping {
                    (f0 + 1) % src_frames
                } else {
                    (f0 + 1).min(src_frames - 1)
                };
                let frac = (src_pos - f0 as f64).clamp(0.0, 1.0) as f32;
                let gain = src.gain.value_at(t) as f32;

                for c in 0..ch {
                    let sc = if src_ch == 1 { 0 } else { c.min(src_ch - 1) };
                    let v0 = buf[f0 * src_ch + sc];
                    let v1 = buf[f1 * src_ch + sc];
                    out[i * ch + c] += (v0 + (v1 - v0) * frac) * gain;
                }
            }
        }

        for s in &mut out {
            *s = s.clamp(-1.0, 1.0);
        }
        out
    }

    fn find(&self, id: SourceId) -> ViewerResult<&OfflineSource> {
        self.sources
            .iter()
            .find(|s| s.id == id)
            .ok_or_else(|| ViewerError::validation(format!("unknown audio source {}", id.0)))
    }

    fn find_mut(&mut self, id: SourceId) -> ViewerResult<&mut OfflineSource> {
        self.sources
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| ViewerError::validation(format!("unknown audio source {}", id.0)))
    }

    // Sources dropped after finishing still accept stop and gain automation, as no-ops.
    fn live_mut(&mut self, id: SourceId) -> ViewerResult<Option<&mut OfflineSource>> {
        if id.0 == 0 || id.0 > self.next_id {
            return Err(ViewerError::validation(format!("unknown audio source {}", id.0)));
        }
        Ok(self.sources.iter_mut().find(|s| s.id == id))
    }
}

impl AudioSurface for OfflineAudio {
    fn current_time(&self) -> f64 {
        self.now
    }

    fn create_source(&mut self, buffer: &PreparedAudio, looping: bool) -> ViewerResult<SourceId> {
        self.next_id += 1;
        let id = SourceId(self.next_id);
        self.sources.push(OfflineSource {
            id,
            buffer: buffer.clone(),
            looping,
            start: None,
            stop_at: None,
            gain: GainAutomation::default(),
        });
        Ok(id)
    }

    fn start(&mut self, source: SourceId, when: f64, offset: f64) -> ViewerResult<()> {
        let src = self.find_mut(source)?;
        if src.start.is_some() {
            return Err(ViewerError::validation(format!(
                "audio source {} already started",
                source.0
            )));
        }
        src.start = Some((when, offset.max(0.0)));
        Ok(())
    }

    fn stop(&mut self, source: SourceId, when: f64) -> ViewerResult<()> {
        if let Some(src) = self.live_mut(source)? {
            src.stop_at = Some(src.stop_at.map_or(when, |s| s.min(when)));
        }
        Ok(())
    }

    fn set_gain_at(&mut self, source: SourceId, value: f64, when: f64) -> ViewerResult<()> {
        if let Some(src) = self.live_mut(source)? {
            src.gain.set_value_at(value, when);
        }
        Ok(())
    }

    fn linear_ramp_gain_to(
        &mut self,
        source: SourceId,
        value: f64,
        end_time: f64,
    ) -> ViewerResult<()> {
        if let Some(src) = self.live_mut(source)? {
            src.gain.linear_ramp_to(value, end_time);
        }
        Ok(())
    }
}

/// Write interleaved `f32` samples as a 32-bit float WAV file.
pub fn write_wav_f32(
    path: &Path,
    samples_interleaved: &[f32],
    sample_rate: u32,
    channels: u16,
) -> ViewerResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create audio output dir '{}'", parent.display()))?;
    }
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let mut writer = hound::WavWriter::create(path, spec)
        .with_context(|| format!("create wav '{}'", path.display()))?;
    for &s in samples_interleaved {
        writer.write_sample(s).context("write wav sample")?;
    }
    writer
        .finalize()
        .with_context(|| format!("finalize wav '{}'", path.display()))?;
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/audio/offline.rs"]
mod tests;
