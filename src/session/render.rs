use std::path::PathBuf;

use anyhow::Context;

use crate::{
    assets::store::LoadedAssets,
    audio::offline::{OfflineAudio, write_wav_f32},
    foundation::core::NodeId,
    foundation::error::{ViewerError, ViewerResult},
    graph::node_graph::NodeGraph,
    present::software::SoftwareSurface,
    session::script::Script,
    viewer::controller::{Viewer, ViewerEvent},
};

/// Options for [`render_session`].
#[derive(Clone, Debug)]
pub struct RenderOpts {
    /// Frames per second of the animation clock.
    pub fps: u32,
    /// Output sample rate of the mix.
    pub sample_rate: u32,
    /// Output channel count of the mix.
    pub channels: u16,
    /// Run without an audio surface.
    pub mute: bool,
    /// Directory receiving `frame_00000.png`, ...; no frames are written when `None`.
    pub frames_dir: Option<PathBuf>,
    /// WAV file receiving the mix; no audio is written when `None` or muted.
    pub audio_out: Option<PathBuf>,
    /// Background behind letterboxed images (RGBA8, straight alpha).
    pub bg_rgba: [u8; 4],
}

impl Default for RenderOpts {
    fn default() -> Self {
        Self {
            fps: 30,
            sample_rate: 48_000,
            channels: 2,
            mute: false,
            frames_dir: None,
            audio_out: None,
            bg_rgba: [0, 0, 0, 255],
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
/// Counters of one rendered session.
pub struct RenderStats {
    /// Animation frames stepped.
    pub frames_total: u64,
    /// PNG frames written.
    pub frames_written: u64,
    /// Script events delivered.
    pub events_delivered: u64,
    /// Navigations started.
    pub navigations: u64,
    /// Audio frames mixed (one sample per channel).
    pub audio_frames: u64,
}

#[derive(Clone, Debug)]
/// Outcome of [`render_session`].
pub struct SessionReport {
    /// Counters.
    pub stats: RenderStats,
    /// Every viewer notification, in order.
    pub events: Vec<ViewerEvent>,
    /// Node current when the session ended.
    pub final_node: NodeId,
}

struct MixTape {
    samples: Vec<f32>,
    cursor: u64,
}

impl MixTape {
    // Mix from the cursor up to `to` seconds, then move the audio clock there.
    fn advance(&mut self, audio: &mut OfflineAudio, to: f64) {
        let sr = f64::from(audio.sample_rate());
        let end = (to * sr).round().max(0.0) as u64;
        if end > self.cursor {
            let from = self.cursor as f64 / sr;
            let frames = (end - self.cursor) as usize;
            self.samples.extend(audio.render(from, frames));
            self.cursor = end;
        }
        audio.advance_to(to);
        audio.drop_finished(to);
    }
}

/// Replay `script` against a software viewer over `graph`, stepping the animation clock at
/// `opts.fps` and mixing the audio offline.
///
/// Each event is delivered at its own time: the audio clock is advanced to it first, so
/// ramps start exactly when the event fires. Frames are stepped at `i / fps`.
#[tracing::instrument(skip_all, fields(fps = opts.fps, duration = script.duration_secs))]
pub fn render_session(
    graph: NodeGraph,
    assets: LoadedAssets,
    script: &Script,
    opts: &RenderOpts,
) -> ViewerResult<SessionReport> {
    if opts.fps == 0 {
        return Err(ViewerError::validation("fps must be > 0"));
    }
    script.validate()?;
    let viewport = script.viewport()?;

    let audio = if opts.mute {
        None
    } else {
        match OfflineAudio::new(opts.sample_rate, opts.channels) {
            Ok(audio) => Some(audio),
            Err(ViewerError::AudioUnavailable(msg)) => {
                tracing::warn!(reason = %msg, "rendering without audio");
                None
            }
            Err(e) => return Err(e),
        }
    };

    if let Some(dir) = &opts.frames_dir {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("create frames dir '{}'", dir.display()))?;
    }

    let surface = SoftwareSurface::new(&graph);
    let mut viewer = Viewer::start(graph, assets, surface, audio, viewport)?;
    let mut tape = MixTape {
        samples: Vec::new(),
        cursor: 0,
    };
    let mut stats = RenderStats::default();
    let mut events = Vec::new();
    let mut pending = script.events.iter().peekable();

    let fps = f64::from(opts.fps);
    let frames_total = ((script.duration_secs * fps).ceil() as u64).max(1);

    for i in 0..frames_total {
        let t = i as f64 / fps;

        while let Some(ev) = pending.next_if(|ev| ev.at <= t) {
            if let Some(audio) = viewer.audio_mut() {
                tape.advance(audio, ev.at);
            }
            viewer.handle(&ev.event, ev.at)?;
            stats.events_delivered += 1;
        }

        viewer.frame(t)?;
        if let Some(audio) = viewer.audio_mut() {
            tape.advance(audio, t);
        }

        if let Some(dir) = &opts.frames_dir {
            let img = viewer
                .presentation()
                .compose(viewer.assets(), viewer.viewport(), opts.bg_rgba)?;
            let path = dir.join(format!("frame_{i:05}.png"));
            img.save(&path)
                .with_context(|| format!("write frame '{}'", path.display()))?;
            stats.frames_written += 1;
        }
        stats.frames_total += 1;
        drain_events(&mut viewer, &mut events, &mut stats);
    }

    for ev in pending {
        if let Some(audio) = viewer.audio_mut() {
            tape.advance(audio, ev.at);
        }
        viewer.handle(&ev.event, ev.at)?;
        stats.events_delivered += 1;
    }
    drain_events(&mut viewer, &mut events, &mut stats);

    if let Some(audio) = viewer.audio_mut() {
        tape.advance(audio, script.duration_secs);
        let channels = audio.channels();
        stats.audio_frames = tape.samples.len() as u64 / u64::from(channels);
        match &opts.audio_out {
            Some(path) => {
                write_wav_f32(path, &tape.samples, audio.sample_rate(), channels)?;
                tracing::info!(path = %path.display(), frames = stats.audio_frames, "wrote mix");
            }
            None => tracing::debug!("audio mixed but not written"),
        }
    }

    tracing::info!(
        frames = stats.frames_total,
        navigations = stats.navigations,
        "session rendered"
    );
    Ok(SessionReport {
        stats,
        events,
        final_node: viewer.current().clone(),
    })
}

fn drain_events(
    viewer: &mut Viewer<SoftwareSurface, OfflineAudio>,
    events: &mut Vec<ViewerEvent>,
    stats: &mut RenderStats,
) {
    for e in viewer.take_events() {
        if matches!(e, ViewerEvent::NavigationStarted { .. }) {
            stats.navigations += 1;
        }
        events.push(e);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/render.rs"]
mod tests;
