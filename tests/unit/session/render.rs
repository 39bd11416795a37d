use std::{collections::HashMap, path::PathBuf, sync::Arc};

use super::*;
use crate::assets::{
    decode::{PreparedAudio, PreparedImage},
    store::NodeAssets,
};

fn temp_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "hotspot_viewer_session_{tag}_{}",
        std::process::id()
    ));
    let _ = std::fs::remove_dir_all(&dir);
    dir
}

fn fixture() -> (NodeGraph, LoadedAssets) {
    let graph = NodeGraph::from_json_str(
        r#"{"nodes": [
            {"id": "a", "image": {"file_name": "a.png"},
             "audio": {"file_name": "a.wav", "gain_db": 0, "loop": false, "sync": false},
             "hotspots": [{"x": 0.5, "y": 0.5, "size": 20, "target": "b"}]},
            {"id": "b", "image": {"file_name": "b.png", "fade_secs": 0.5},
             "audio": {"file_name": "b.wav", "gain_db": 0, "loop": true, "sync": false},
             "hotspots": []}
        ]}"#,
    )
    .unwrap();

    let mut by_node = HashMap::new();
    for (id, color) in [("a", [255u8, 0, 0, 255]), ("b", [0, 0, 255, 255])] {
        by_node.insert(
            NodeId::new(id),
            NodeAssets {
                image: PreparedImage {
                    width: 2,
                    height: 1,
                    rgba8_premul: Arc::new(color.repeat(2)),
                },
                audio: PreparedAudio {
                    sample_rate: 100,
                    channels: 1,
                    interleaved_f32: Arc::new(vec![0.5; 100]),
                },
            },
        );
    }
    (graph, LoadedAssets::from_map(by_node))
}

fn script() -> Script {
    Script::from_json_str(
        r#"{"viewport": [8, 4], "duration_secs": 1.0,
            "events": [{"at": 0.1, "event": {"click_hotspot": {"index": 0}}}]}"#,
    )
    .unwrap()
}

#[test]
fn renders_frames_and_mix() {
    let dir = temp_dir("full");
    let (graph, assets) = fixture();
    let opts = RenderOpts {
        fps: 10,
        sample_rate: 100,
        channels: 1,
        frames_dir: Some(dir.join("frames")),
        audio_out: Some(dir.join("audio.wav")),
        ..RenderOpts::default()
    };

    let report = render_session(graph, assets, &script(), &opts).unwrap();
    assert_eq!(report.stats.frames_total, 10);
    assert_eq!(report.stats.frames_written, 10);
    assert_eq!(report.stats.events_delivered, 1);
    assert_eq!(report.stats.navigations, 1);
    assert_eq!(report.stats.audio_frames, 100);
    assert_eq!(report.final_node.as_str(), "b");
    assert!(report.events.iter().any(|e| matches!(
        e,
        ViewerEvent::HotspotsChanged { node, count: 0 } if node.as_str() == "b"
    )));

    let first = image::open(dir.join("frames/frame_00000.png"))
        .unwrap()
        .to_rgba8();
    assert_eq!(first.dimensions(), (8, 4));
    assert_eq!(first.get_pixel(4, 2).0, [255, 0, 0, 255]);
    let last = image::open(dir.join("frames/frame_00009.png"))
        .unwrap()
        .to_rgba8();
    assert_eq!(last.get_pixel(4, 2).0, [0, 0, 255, 255]);

    let samples: Vec<f32> = hound::WavReader::open(dir.join("audio.wav"))
        .unwrap()
        .into_samples::<f32>()
        .map(|s| s.unwrap())
        .collect();
    assert_eq!(samples.len(), 100);
    assert_eq!(samples[0], 0.0);
    assert!((samples[50] - 0.5).abs() < 1e-6);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn muted_session_writes_no_audio() {
    let dir = temp_dir("mute");
    let (graph, assets) = fixture();
    let opts = RenderOpts {
        fps: 10,
        mute: true,
        audio_out: Some(dir.join("audio.wav")),
        ..RenderOpts::default()
    };

    let report = render_session(graph, assets, &script(), &opts).unwrap();
    assert_eq!(report.stats.frames_written, 0);
    assert_eq!(report.stats.audio_frames, 0);
    assert_eq!(report.final_node.as_str(), "b");
    assert!(!dir.join("audio.wav").exists());
}

#[test]
fn zero_fps_is_rejected() {
    let (graph, assets) = fixture();
    let opts = RenderOpts {
        fps: 0,
        ..RenderOpts::default()
    };
    assert!(matches!(
        render_session(graph, assets, &script(), &opts),
        Err(ViewerError::Validation(_))
    ));
}

#[test]
fn one_shot_sounds_play_on_every_navigation() {
    let graph = NodeGraph::from_json_str(
        r#"{"nodes": [
            {"id": "a", "image": {"file_name": "a.png", "fade_secs": 0.1},
             "audio": {"file_name": "a.wav"},
             "hotspots": [{"x": 0.5, "y": 0.5, "size": 20, "target": "b"}]},
            {"id": "b", "image": {"file_name": "b.png", "fade_secs": 0.1},
             "audio": {"file_name": "b.wav"},
             "hotspots": [{"x": 0.5, "y": 0.5, "size": 20, "target": "a"}]}
        ]}"#,
    )
    .unwrap();
    let mut by_node = HashMap::new();
    for id in ["a", "b"] {
        by_node.insert(
            NodeId::new(id),
            NodeAssets {
                image: PreparedImage {
                    width: 2,
                    height: 1,
                    rgba8_premul: Arc::new(vec![255; 8]),
                },
                audio: PreparedAudio {
                    sample_rate: 100,
                    channels: 1,
                    interleaved_f32: Arc::new(vec![0.5; 20]),
                },
            },
        );
    }
    let script = Script::from_json_str(
        r#"{"viewport": [8, 4], "duration_secs": 1.5,
            "events": [{"at": 0.1, "event": {"click_hotspot": {"index": 0}}},
                       {"at": 1.0, "event": {"click_hotspot": {"index": 0}}}]}"#,
    )
    .unwrap();

    let dir = temp_dir("one_shot");
    let opts = RenderOpts {
        fps: 10,
        sample_rate: 100,
        channels: 1,
        audio_out: Some(dir.join("audio.wav")),
        ..RenderOpts::default()
    };
    let report = render_session(graph, LoadedAssets::from_map(by_node), &script, &opts).unwrap();
    assert_eq!(report.stats.navigations, 2);
    assert_eq!(report.final_node.as_str(), "a");

    let samples: Vec<f32> = hound::WavReader::open(dir.join("audio.wav"))
        .unwrap()
        .into_samples::<f32>()
        .map(|s| s.unwrap())
        .collect();
    assert_eq!(samples.len(), 150);
    let energy = |range: std::ops::Range<usize>| -> f32 {
        samples[range].iter().map(|s| s.abs()).sum()
    };
    assert!(energy(10..30) > 1.0);
    assert_eq!(energy(40..100), 0.0);
    assert!(energy(100..120) > 1.0);

    let _ = std::fs::remove_dir_all(&dir);
}
