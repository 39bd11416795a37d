use std::sync::Arc;

use super::*;
use crate::{
    foundation::error::ViewerError,
    graph::model::{AudioRef, ImageRef},
};

#[derive(Clone, Debug, PartialEq)]
enum Call {
    Create { id: u64, looping: bool },
    Start { id: u64, when: f64, offset: f64 },
    Stop { id: u64, when: f64 },
    Set { id: u64, value: f64, when: f64 },
    Ramp { id: u64, value: f64, end: f64 },
}

#[derive(Default)]
struct Recorder {
    now: f64,
    next: u64,
    calls: Vec<Call>,
    fail_stop: bool,
    fail_create: bool,
}

impl AudioSurface for Recorder {
    fn current_time(&self) -> f64 {
        self.now
    }

    fn create_source(&mut self, _buffer: &PreparedAudio, looping: bool) -> ViewerResult<SourceId> {
        if self.fail_create {
            return Err(ViewerError::validation("device lost"));
        }
        self.next += 1;
        self.calls.push(Call::Create {
            id: self.next,
            looping,
        });
        Ok(SourceId(self.next))
    }

    fn start(&mut self, source: SourceId, when: f64, offset: f64) -> ViewerResult<()> {
        self.calls.push(Call::Start {
            id: source.0,
            when,
            offset,
        });
        Ok(())
    }

    fn stop(&mut self, source: SourceId, when: f64) -> ViewerResult<()> {
        if self.fail_stop {
            return Err(ViewerError::validation(format!("unknown audio source {}", source.0)));
        }
        self.calls.push(Call::Stop { id: source.0, when });
        Ok(())
    }

    fn set_gain_at(&mut self, source: SourceId, value: f64, when: f64) -> ViewerResult<()> {
        self.calls.push(Call::Set {
            id: source.0,
            value,
            when,
        });
        Ok(())
    }

    fn linear_ramp_gain_to(
        &mut self,
        source: SourceId,
        value: f64,
        end_time: f64,
    ) -> ViewerResult<()> {
        self.calls.push(Call::Ramp {
            id: source.0,
            value,
            end: end_time,
        });
        Ok(())
    }
}

fn buffer(secs: f64) -> PreparedAudio {
    let frames = (secs * 100.0) as usize;
    PreparedAudio {
        sample_rate: 100,
        channels: 1,
        interleaved_f32: Arc::new(vec![0.0; frames]),
    }
}

fn node(id: &str, gain_db: f64, looping: bool, sync: bool) -> Node {
    Node {
        id: NodeId::new(id),
        image: ImageRef {
            file_name: format!("{id}.png"),
            fade_secs: None,
        },
        audio: AudioRef {
            file_name: format!("{id}.wav"),
            gain_db,
            looping,
            sync,
            fade_in_secs: Some(2.0),
            fade_out_secs: Some(4.0),
        },
        hotspots: vec![],
    }
}

#[test]
fn first_sound_fades_in_from_silence() {
    let mut surface = Recorder {
        now: 1.0,
        ..Recorder::default()
    };
    let mut sounds = AudioTransitions::new();
    sounds
        .play(&mut surface, &node("a", -20.0, false, false), &buffer(1.0))
        .unwrap();

    assert_eq!(surface.calls.len(), 4);
    assert_eq!(
        surface.calls[0],
        Call::Create {
            id: 1,
            looping: false
        }
    );
    assert_eq!(
        surface.calls[1],
        Call::Set {
            id: 1,
            value: 0.0,
            when: 1.0
        }
    );
    let Call::Ramp { id, value, end } = surface.calls[2] else {
        panic!("expected ramp, got {:?}", surface.calls[2]);
    };
    assert_eq!((id, end), (1, 3.0));
    assert!((value - 0.1).abs() < 1e-12);
    assert_eq!(
        surface.calls[3],
        Call::Start {
            id: 1,
            when: 1.0,
            offset: 0.0
        }
    );

    let active = sounds.active().unwrap();
    assert_eq!(active.source, SourceId(1));
    assert_eq!(active.fade_out_secs, 4.0);
}

#[test]
fn previous_sound_ramps_to_silence_and_stops() {
    let mut surface = Recorder::default();
    let mut sounds = AudioTransitions::new();
    sounds
        .play(&mut surface, &node("a", 0.0, true, false), &buffer(1.0))
        .unwrap();
    surface.calls.clear();
    surface.now = 10.0;

    sounds
        .play(&mut surface, &node("b", 0.0, false, false), &buffer(1.0))
        .unwrap();

    assert_eq!(surface.calls[0], Call::Stop { id: 1, when: 14.0 });
    assert_eq!(
        surface.calls[1],
        Call::Set {
            id: 1,
            value: 1.0,
            when: 10.0
        }
    );
    assert_eq!(
        surface.calls[2],
        Call::Ramp {
            id: 1,
            value: 0.0,
            end: 14.0
        }
    );
    assert!(surface.calls[3..].iter().all(|c| !matches!(
        c,
        Call::Stop { id: 1, .. } | Call::Set { id: 1, .. } | Call::Ramp { id: 1, .. }
    )));
    assert_eq!(sounds.active().unwrap().node.as_str(), "b");
}

#[test]
fn synced_sound_joins_running_loop_in_phase() {
    let mut surface = Recorder {
        now: 2.0,
        ..Recorder::default()
    };
    let mut sounds = AudioTransitions::new();
    sounds
        .play(&mut surface, &node("loop", 0.0, true, false), &buffer(4.0))
        .unwrap();

    surface.now = 11.0;
    sounds
        .play(&mut surface, &node("synced", 0.0, true, true), &buffer(4.0))
        .unwrap();

    let start = surface
        .calls
        .iter()
        .rev()
        .find(|c| matches!(c, Call::Start { .. }))
        .unwrap();
    assert_eq!(
        start,
        &Call::Start {
            id: 2,
            when: 11.0,
            offset: 1.0
        }
    );
    assert_eq!(sounds.active().unwrap().phase_origin(), 10.0);
}

#[test]
fn sync_without_running_loop_starts_at_top() {
    assert_eq!(sync_offset(5.0, None, 4.0), 0.0);
    assert_eq!(sync_offset(5.0, Some(1.0), 0.0), 0.0);
    assert_eq!(sync_offset(9.5, Some(1.0), 4.0), 0.5);
    assert_eq!(sync_offset(0.5, Some(1.0), 4.0), 3.5);
}

#[test]
fn failed_fade_out_still_starts_next_sound() {
    let mut surface = Recorder::default();
    let mut sounds = AudioTransitions::new();
    sounds
        .play(&mut surface, &node("a", 0.0, false, false), &buffer(1.0))
        .unwrap();
    surface.fail_stop = true;
    surface.calls.clear();

    sounds
        .play(&mut surface, &node("b", 0.0, false, false), &buffer(1.0))
        .unwrap();

    assert!(surface.calls.contains(&Call::Create {
        id: 2,
        looping: false
    }));
    assert!(surface.calls.iter().any(|c| matches!(c, Call::Start { id: 2, .. })));
    assert_eq!(sounds.active().unwrap().node.as_str(), "b");
}

#[test]
fn failed_start_keeps_unfaded_sound_active() {
    let mut surface = Recorder::default();
    let mut sounds = AudioTransitions::new();
    sounds
        .play(&mut surface, &node("a", 0.0, true, false), &buffer(1.0))
        .unwrap();

    surface.fail_stop = true;
    surface.fail_create = true;
    assert!(
        sounds
            .play(&mut surface, &node("b", 0.0, false, false), &buffer(1.0))
            .is_err()
    );
    assert_eq!(sounds.active().unwrap().node.as_str(), "a");

    surface.fail_stop = false;
    surface.fail_create = false;
    surface.calls.clear();
    sounds
        .play(&mut surface, &node("b", 0.0, false, false), &buffer(1.0))
        .unwrap();
    assert_eq!(surface.calls[0], Call::Stop { id: 1, when: 4.0 });
    assert_eq!(sounds.active().unwrap().node.as_str(), "b");
}

#[test]
fn failed_start_after_fade_out_leaves_nothing_active() {
    let mut surface = Recorder::default();
    let mut sounds = AudioTransitions::new();
    sounds
        .play(&mut surface, &node("a", 0.0, true, false), &buffer(1.0))
        .unwrap();

    surface.fail_create = true;
    assert!(
        sounds
            .play(&mut surface, &node("b", 0.0, false, false), &buffer(1.0))
            .is_err()
    );
    assert!(surface.calls.contains(&Call::Stop { id: 1, when: 4.0 }));
    assert!(sounds.active().is_none());
}
