use crate::{
    foundation::core::{NodeId, Rect},
    layout::hotspots::Marker,
};

/// Visual output the viewer drives: one image layer per node plus a hotspot overlay.
///
/// Layers stack in graph declaration order. The viewer only sets state; when and how the
/// state reaches the screen is up to the host.
pub trait PresentationSurface {
    /// Place node `id`'s image layer.
    fn set_image_bounds(&mut self, id: &NodeId, bounds: Rect);

    /// Set node `id`'s layer opacity in [0, 1].
    fn set_image_opacity(&mut self, id: &NodeId, opacity: f64);

    /// Place the hotspot overlay; it always matches the current image box.
    fn set_overlay_bounds(&mut self, bounds: Rect);

    /// Remove every marker.
    fn clear_markers(&mut self);

    /// Add one marker on top of the existing ones.
    fn add_marker(&mut self, marker: &Marker);

    /// Show or hide the markers without removing them.
    fn set_markers_visible(&mut self, visible: bool);
}
