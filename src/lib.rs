//! A choose-your-path media viewer.
//!
//! A [`NodeGraph`] binds every node to a full-screen image, a sound and a list of clickable
//! hotspots. The [`Viewer`] shows one node at a time; following a hotspot cross-fades the
//! images with squared easing and hands the sound over through linear gain ramps.
//!
//! - Load and validate a [`NodeGraph`]
//! - Load every asset up front with [`load_all`]
//! - Drive a [`Viewer`] over a [`PresentationSurface`] and an optional [`AudioSurface`]
//!
//! [`SoftwareSurface`] and [`OfflineAudio`] implement both surfaces in memory, and
//! [`render_session`] replays a [`Script`] of input events into PNG frames and a WAV mix.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod foundation;

pub(crate) mod assets;
pub(crate) mod audio;
pub(crate) mod graph;
pub(crate) mod layout;
pub(crate) mod navigation;
pub(crate) mod present;
pub(crate) mod session;
pub(crate) mod viewer;

pub use crate::foundation::core::{NodeId, Point, Rect, Size, Viewport};
pub use crate::foundation::error::{LoadCause, ViewerError, ViewerResult};

pub use crate::assets::decode::{PreparedAudio, PreparedImage, decode_image, decode_wav};
pub use crate::assets::loader::{LoadCountdown, LoadOpts, load_all};
pub use crate::assets::source::{AssetKind, AssetSource, DirAssetSource, normalize_rel_path};
pub use crate::assets::store::{LoadedAssets, NodeAssets};
pub use crate::audio::gain::decibel_to_linear;
pub use crate::audio::offline::{GainAutomation, OfflineAudio, write_wav_f32};
pub use crate::audio::surface::{AudioSurface, SourceId};
pub use crate::audio::transition::{ActiveSound, AudioTransitions, sync_offset};
pub use crate::graph::model::{
    AudioRef, DEFAULT_AUDIO_FADE_SECS, DEFAULT_IMAGE_FADE_SECS, Hotspot, ImageRef, Node,
};
pub use crate::graph::node_graph::NodeGraph;
pub use crate::layout::fit::fit_to_viewport;
pub use crate::layout::hotspots::{
    Marker, format_position, hit_test, normalized_position, place_markers,
};
pub use crate::navigation::crossfade::{CrossFadeSample, crossfade_progress, sample_crossfade};
pub use crate::navigation::state::{Phase, StepOutcome, TransitionToken, ViewerState};
pub use crate::present::software::{LayerState, SoftwareSurface};
pub use crate::present::surface::PresentationSurface;
pub use crate::session::render::{RenderOpts, RenderStats, SessionReport, render_session};
pub use crate::session::script::{Script, ScriptedEvent};
pub use crate::viewer::controller::{ClickOutcome, Viewer, ViewerEvent};
pub use crate::viewer::input::InputEvent;
