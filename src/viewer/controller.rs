use crate::{
    assets::store::LoadedAssets,
    audio::{surface::AudioSurface, transition::AudioTransitions},
    foundation::core::{NodeId, Point, Rect, Viewport},
    foundation::error::ViewerResult,
    graph::node_graph::NodeGraph,
    layout::{
        fit::fit_to_viewport,
        hotspots::{Marker, format_position, hit_test, normalized_position, place_markers},
    },
    navigation::state::{StepOutcome, TransitionToken, ViewerState},
    present::surface::PresentationSurface,
    viewer::input::InputEvent,
};

#[derive(Clone, Debug, PartialEq)]
/// Notifications produced by the viewer, drained with [`Viewer::take_events`].
pub enum ViewerEvent {
    /// The start node was shown after loading.
    Activated {
        /// Start node.
        node: NodeId,
    },
    /// A navigation began a cross-fade.
    NavigationStarted {
        /// Node faded out.
        from: NodeId,
        /// Node faded in.
        to: NodeId,
        /// Token of the new cross-fade.
        token: TransitionToken,
    },
    /// Markers were placed for a node that just became idle.
    HotspotsChanged {
        /// Node whose hotspots are shown.
        node: NodeId,
        /// Number of markers placed.
        count: usize,
    },
    /// A click with the modifier held, as a normalized image position.
    PositionReported {
        /// Node the position refers to.
        node: NodeId,
        /// Normalized position.
        position: Point,
        /// Authoring notation, `[x, y]`.
        text: String,
    },
}

#[derive(Clone, Debug, PartialEq)]
/// What a click did.
pub enum ClickOutcome {
    /// A hotspot was hit and navigation started.
    Navigated {
        /// Node navigated to.
        target: NodeId,
        /// Token of the started cross-fade.
        token: TransitionToken,
    },
    /// The modifier was held; the normalized click position was reported.
    Reported(Point),
    /// Nothing was hit.
    Ignored,
}

/// The interactive viewer: navigation state, cross-fades, sound transitions and hotspot
/// input over a loaded graph.
///
/// The viewer is frame driven: the host calls [`Viewer::frame`] with its animation clock.
/// Audio automation runs on the audio surface's own clock. Without an audio surface the
/// viewer navigates silently.
pub struct Viewer<P, A> {
    graph: NodeGraph,
    assets: LoadedAssets,
    presentation: P,
    audio: Option<A>,
    sounds: AudioTransitions,
    state: ViewerState,
    viewport: Viewport,
    modifier: bool,
    markers: Vec<Marker>,
    events: Vec<ViewerEvent>,
}

impl<P: PresentationSurface, A: AudioSurface> Viewer<P, A> {
    /// Activate the start node of a fully loaded graph.
    ///
    /// The start node is shown fully opaque with its hotspots placed and no sound playing;
    /// the first sound starts with the first navigation.
    #[tracing::instrument(skip_all, fields(start = %graph.start().id))]
    pub fn start(
        graph: NodeGraph,
        assets: LoadedAssets,
        presentation: P,
        audio: Option<A>,
        viewport: Viewport,
    ) -> ViewerResult<Self> {
        assets.ensure_covers(&graph)?;
        let start = graph.start().id.clone();

        let mut viewer = Self {
            graph,
            assets,
            presentation,
            audio,
            sounds: AudioTransitions::new(),
            state: ViewerState::new(start.clone()),
            viewport,
            modifier: false,
            markers: Vec::new(),
            events: Vec::new(),
        };

        if viewer.audio.is_none() {
            tracing::warn!("no audio output, navigating silently");
        }

        viewer.presentation.set_image_opacity(&start, 1.0);
        viewer.presentation.set_markers_visible(false);
        viewer.refit()?;
        viewer.events.push(ViewerEvent::Activated {
            node: start.clone(),
        });
        viewer.show_hotspots()?;
        tracing::info!(node = %start, "viewer activated");
        Ok(viewer)
    }

    /// Make `target` current and start cross-fading into it at `now`.
    ///
    /// Unknown targets fail with [`crate::ViewerError::UnknownNode`] and change nothing.
    /// An in-flight cross-fade is abandoned and its token goes stale.
    #[tracing::instrument(skip(self))]
    pub fn navigate_to(&mut self, target: &str, now: f64) -> ViewerResult<TransitionToken> {
        let node = self.graph.by_id(target)?;
        let target_id = node.id.clone();
        let fade_secs = node.image.fade_secs();

        if let Some(abandoned) = self.state.previous().cloned() {
            if abandoned != target_id && abandoned != *self.state.current() {
                self.presentation.set_image_opacity(&abandoned, 0.0);
            }
        }

        self.presentation.clear_markers();
        self.markers.clear();

        let from = self.state.current().clone();
        let token = self.state.begin(target_id.clone(), now, fade_secs);
        self.refit()?;

        if let Some(audio) = self.audio.as_mut() {
            let node = self.graph.by_id(target)?;
            let buffer = &self.assets.get(target)?.audio;
            if let Err(err) = self.sounds.play(audio, node, buffer) {
                tracing::warn!(node = %target_id, error = %err, "audio transition failed");
            }
        }

        tracing::debug!(%from, to = %target_id, fade_secs, "cross-fade started");
        self.events.push(ViewerEvent::NavigationStarted {
            from,
            to: target_id,
            token,
        });
        Ok(token)
    }

    /// Advance the in-flight cross-fade, if any, to `now`.
    pub fn frame(&mut self, now: f64) -> ViewerResult<StepOutcome> {
        match self.state.live_token() {
            Some(token) => self.step(token, now),
            None => Ok(StepOutcome::Stale),
        }
    }

    /// Advance the cross-fade owned by `token` to `now`. Stale tokens change nothing.
    pub fn step(&mut self, token: TransitionToken, now: f64) -> ViewerResult<StepOutcome> {
        let outcome = self.state.step(token, now);
        match &outcome {
            StepOutcome::Stale => {}
            StepOutcome::Fading {
                incoming,
                outgoing,
                sample,
            } => {
                if incoming != outgoing {
                    self.presentation
                        .set_image_opacity(outgoing, sample.outgoing);
                }
                self.presentation
                    .set_image_opacity(incoming, sample.incoming);
            }
            StepOutcome::Settled { current, outgoing } => {
                if current != outgoing {
                    self.presentation.set_image_opacity(outgoing, 0.0);
                }
                self.presentation.set_image_opacity(current, 1.0);
                tracing::debug!(node = %current, "cross-fade settled");
                self.show_hotspots()?;
            }
        }
        Ok(outcome)
    }

    /// Refit layouts to a new viewport. Markers are re-placed while idle.
    pub fn resize(&mut self, viewport: Viewport) -> ViewerResult<()> {
        self.viewport = viewport;
        self.refit()?;
        if !self.state.is_transitioning() {
            self.place_current_markers()?;
        }
        Ok(())
    }

    /// Press or release the suppression modifier; markers are shown while it is held.
    pub fn set_modifier(&mut self, held: bool) {
        self.modifier = held;
        self.presentation.set_markers_visible(held);
    }

    /// Handle a click at viewport position `p`.
    ///
    /// With the modifier held the click reports its normalized position and never
    /// navigates. Otherwise the topmost marker under `p` is followed.
    pub fn click(&mut self, p: Point, now: f64) -> ViewerResult<ClickOutcome> {
        if self.modifier {
            return Ok(self.report_position(p));
        }
        let Some(target) = hit_test(&self.markers, p).map(|m| m.target.clone()) else {
            return Ok(ClickOutcome::Ignored);
        };
        let token = self.navigate_to(target.as_str(), now)?;
        Ok(ClickOutcome::Navigated { target, token })
    }

    /// Click the current node's marker at `index`, as if clicked at its center.
    pub fn click_hotspot(&mut self, index: usize, now: f64) -> ViewerResult<ClickOutcome> {
        let Some(marker) = self.markers.get(index) else {
            tracing::debug!(index, "no such marker");
            return Ok(ClickOutcome::Ignored);
        };
        if self.modifier {
            let center = marker.center;
            return Ok(self.report_position(center));
        }
        let target = marker.target.clone();
        let token = self.navigate_to(target.as_str(), now)?;
        Ok(ClickOutcome::Navigated { target, token })
    }

    /// Dispatch one input event. Clicks return their outcome.
    pub fn handle(&mut self, event: &InputEvent, now: f64) -> ViewerResult<Option<ClickOutcome>> {
        match *event {
            InputEvent::Click { x, y } => self.click(Point::new(x, y), now).map(Some),
            InputEvent::ClickHotspot { index } => self.click_hotspot(index, now).map(Some),
            InputEvent::ModifierDown => {
                self.set_modifier(true);
                Ok(None)
            }
            InputEvent::ModifierUp => {
                self.set_modifier(false);
                Ok(None)
            }
            InputEvent::Resize { width, height } => {
                self.resize(Viewport::new(width, height)?)?;
                Ok(None)
            }
        }
    }

    /// Drain pending notifications.
    pub fn take_events(&mut self) -> Vec<ViewerEvent> {
        std::mem::take(&mut self.events)
    }

    /// Letterboxed box of node `id` in the current viewport.
    pub fn image_bounds(&self, id: &str) -> ViewerResult<Rect> {
        let image = &self.assets.get(id)?.image;
        Ok(fit_to_viewport(image.size(), self.viewport.size()))
    }

    fn refit(&mut self) -> ViewerResult<()> {
        let current = self.state.current().clone();
        let bounds = self.image_bounds(current.as_str())?;
        self.presentation.set_image_bounds(&current, bounds);
        self.presentation.set_overlay_bounds(bounds);

        if let Some(previous) = self.state.previous().cloned() {
            let bounds = self.image_bounds(previous.as_str())?;
            self.presentation.set_image_bounds(&previous, bounds);
        }
        Ok(())
    }

    fn place_current_markers(&mut self) -> ViewerResult<usize> {
        let current = self.state.current();
        let bounds = self.image_bounds(current.as_str())?;
        let node = self.graph.by_id(current.as_str())?;
        self.markers = place_markers(node, bounds);

        self.presentation.clear_markers();
        for marker in &self.markers {
            self.presentation.add_marker(marker);
        }
        Ok(self.markers.len())
    }

    fn show_hotspots(&mut self) -> ViewerResult<()> {
        let count = self.place_current_markers()?;
        self.events.push(ViewerEvent::HotspotsChanged {
            node: self.state.current().clone(),
            count,
        });
        Ok(())
    }

    fn report_position(&mut self, p: Point) -> ClickOutcome {
        let current = self.state.current().clone();
        let bounds = match self.image_bounds(current.as_str()) {
            Ok(bounds) => bounds,
            Err(err) => {
                tracing::warn!(error = %err, "cannot locate click");
                return ClickOutcome::Ignored;
            }
        };
        let Some(position) = normalized_position(bounds, p) else {
            return ClickOutcome::Ignored;
        };
        let text = format_position(position);
        tracing::info!(node = %current, position = %text, "click position");
        self.events.push(ViewerEvent::PositionReported {
            node: current,
            position,
            text,
        });
        ClickOutcome::Reported(position)
    }
}

impl<P, A> Viewer<P, A> {
    /// The graph being viewed.
    pub fn graph(&self) -> &NodeGraph {
        &self.graph
    }

    /// Decoded assets of every node.
    pub fn assets(&self) -> &LoadedAssets {
        &self.assets
    }

    /// Navigation state.
    pub fn state(&self) -> &ViewerState {
        &self.state
    }

    /// Current node.
    pub fn current(&self) -> &NodeId {
        self.state.current()
    }

    /// Current viewport.
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Markers of the current node; empty while transitioning.
    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    /// Whether the suppression modifier is held.
    pub fn modifier_held(&self) -> bool {
        self.modifier
    }

    /// Sound transition state.
    pub fn sounds(&self) -> &AudioTransitions {
        &self.sounds
    }

    /// Presentation surface.
    pub fn presentation(&self) -> &P {
        &self.presentation
    }

    /// Audio surface, if any.
    pub fn audio(&self) -> Option<&A> {
        self.audio.as_ref()
    }

    /// Mutable audio surface, for hosts that drive its clock.
    pub fn audio_mut(&mut self) -> Option<&mut A> {
        self.audio.as_mut()
    }
}

impl<P, A> std::fmt::Debug for Viewer<P, A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Viewer")
            .field("current", self.state.current())
            .field("phase", self.state.phase())
            .field("viewport", &self.viewport)
            .field("modifier", &self.modifier)
            .field("markers", &self.markers.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/viewer/controller.rs"]
mod tests;
